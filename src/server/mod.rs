use crate::archive::{DirArchive, LogArchive, RouteResolver};
use crate::config::Config;
use crate::params::{FileParamStore, ParamStore};
use anyhow::{Context, Result};
use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use dashreel_av::{get_tool_path, PipelineBuilder, FFMPEG};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower_http::{services::ServeDir, trace::TraceLayer};

pub mod error;
pub mod pages;
pub mod routes_api;
pub mod routes_doors;
pub mod routes_footage;

pub use error::FootageError;

/// Shared application context, built once from configuration.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub resolver: RouteResolver,
    pub params: Arc<dyn ParamStore>,
    pub pipelines: PipelineBuilder,
    /// Parent of every stream's cancellation token; cancelled on shutdown.
    pub shutdown: CancellationToken,
}

impl AppContext {
    /// Assemble a context from explicit collaborators.
    pub fn new(
        config: Config,
        archive: Arc<dyn LogArchive>,
        params: Arc<dyn ParamStore>,
        ffmpeg: PathBuf,
    ) -> Self {
        let pipelines = PipelineBuilder::new(ffmpeg)
            .frame_rate(config.transcoder.frame_rate)
            .chunk_size(config.streaming.default_chunk_size);

        Self {
            config: Arc::new(config),
            resolver: RouteResolver::new(archive),
            params,
            pipelines,
            shutdown: CancellationToken::new(),
        }
    }

    /// Context backed by the directories and transcoder named in `config`.
    pub fn from_config(config: Config) -> Self {
        let ffmpeg = resolve_ffmpeg(&config);
        let archive = Arc::new(DirArchive::new(config.archive.log_root.clone()));
        let params = Arc::new(FileParamStore::new(config.params.dir.clone()));
        Self::new(config, archive, params, ffmpeg)
    }
}

/// Transcoder to spawn: the configured path, else PATH lookup, else the bare name.
pub fn resolve_ffmpeg(config: &Config) -> PathBuf {
    match get_tool_path(FFMPEG, config.transcoder.ffmpeg_path.as_deref()) {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!("{}; footage requests will fail until it is installed", e);
            PathBuf::from(FFMPEG)
        }
    }
}

/// Run a blocking archive lookup off the async executor.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, FootageError>
where
    F: FnOnce() -> dashreel_common::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| FootageError::internal(format!("spawn_blocking join error: {e}")))?
        .map_err(FootageError::from)
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext, static_dir: Option<PathBuf>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health_check))
        .merge(routes_doors::door_routes())
        .merge(routes_footage::footage_routes())
        .nest("/api", routes_api::api_routes());

    if let Some(dir) = static_dir {
        if dir.exists() {
            tracing::info!("Serving static files from {:?}", dir);
            app = app.nest_service("/static", ServeDir::new(dir));
        } else {
            tracing::warn!("Static directory {:?} does not exist", dir);
        }
    }

    app.layer(TraceLayer::new_for_http()).with_state(ctx)
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Start the HTTP server and run until a shutdown signal arrives.
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let static_dir = config.server.static_dir.clone();
    let ctx = AppContext::from_config(config);
    let shutdown = ctx.shutdown.clone();
    let app = create_router(ctx, static_dir);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // End in-flight streams so graceful shutdown doesn't wait on them.
            shutdown.cancel();
        })
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
