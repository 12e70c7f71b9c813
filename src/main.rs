mod cli;

use dashreel::archive::{DirArchive, RouteResolver};
use dashreel::{config, server};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use dashreel_av::{ChunkedStreamer, ProcessSupervisor, TranscodePipeline};
use dashreel_common::{CameraType, SegmentId};
use std::path::{Path, PathBuf};
use std::sync::Arc;

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting dashreel server");
    tracing::info!("Log archive: {:?}", config.archive.log_root);

    server::start_server(config).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "dashreel=trace,dashreel_av=trace,dashreel_common=debug,tower_http=debug".to_string()
        } else {
            "dashreel=info,dashreel_av=info,tower_http=info".to_string()
        }
    });

    // Logs go to stderr so `export` can write video to stdout.
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Export {
            camera,
            route,
            segment,
            output,
            chunk_size,
        } => export(
            cli.config.as_deref(),
            &camera,
            route.as_deref(),
            segment.as_deref(),
            output,
            chunk_size,
        ),
        Commands::Routes => list_routes(cli.config.as_deref()),
        Commands::Segments { route } => list_segments(cli.config.as_deref(), &route),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("dashreel {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn export(
    config_path: Option<&Path>,
    camera: &str,
    route: Option<&str>,
    segment: Option<&str>,
    output: Option<PathBuf>,
    chunk_size: Option<usize>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let camera: CameraType = camera.parse()?;
    let ctx = server::AppContext::from_config(config);

    let (pipeline, label): (TranscodePipeline, String) = match (route, segment) {
        (Some(route), _) => {
            let media = ctx.resolver.media_for_route(route, camera)?;
            tracing::info!("Exporting {} segment(s) of {}", media.segments.len(), route);
            (ctx.pipelines.build(media.paths, camera)?, route.to_string())
        }
        (None, Some(segment)) => {
            let segment = SegmentId::parse(segment)?;
            let path = ctx.resolver.segment_media(&segment, camera)?;
            (ctx.pipelines.single(path, camera)?, segment.to_string())
        }
        (None, None) => anyhow::bail!("Either --route or --segment is required"),
    };

    let streaming = &ctx.config.streaming;
    let chunk_size = streaming.chunk_size(chunk_size);
    let supervisor = ProcessSupervisor::new(streaming.supervisor());

    let rt = tokio::runtime::Runtime::new()?;
    let written = rt.block_on(async {
        let streamer = ChunkedStreamer::new(supervisor.start(pipeline)?, chunk_size);
        let written = match output {
            Some(ref path) => {
                let mut file = tokio::fs::File::create(path)
                    .await
                    .with_context(|| format!("Failed to create output file: {:?}", path))?;
                streamer.pump(&mut file).await?
            }
            None => streamer.pump(&mut tokio::io::stdout()).await?,
        };
        anyhow::Ok(written)
    })?;

    tracing::info!("Exported {} ({}): {} bytes", label, camera, written);
    Ok(())
}

fn archive_resolver(config: &config::Config) -> RouteResolver {
    RouteResolver::new(Arc::new(DirArchive::new(config.archive.log_root.clone())))
}

fn list_routes(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    let routes = archive_resolver(&config).all_routes()?;
    if routes.is_empty() {
        println!("No routes found in {:?}", config.archive.log_root);
    }
    for route in routes {
        println!("{}", route);
    }
    Ok(())
}

fn list_segments(config_path: Option<&Path>, route: &str) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    for summary in archive_resolver(&config).segment_summaries(route)? {
        let cameras: Vec<&str> = summary.cameras.iter().map(|c| c.as_str()).collect();
        println!("{}  {}", summary.id, cameras.join(","));
    }
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    println!("Checking external tools...\n");

    let tools = dashreel_av::check_tools(config.transcoder.ffmpeg_path.as_deref());
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Footage streaming needs ffmpeg.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Log archive: {}", config.archive.log_root.display());
            println!(
                "  Transcoder: {}",
                config
                    .transcoder
                    .ffmpeg_path
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "ffmpeg (PATH)".to_string())
            );
            println!(
                "  Chunk size: {} (allowed {}..={})",
                config.streaming.default_chunk_size,
                config.streaming.min_chunk_size,
                config.streaming.max_chunk_size
            );
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Log archive: {}", config.archive.log_root.display());
        }
    }

    Ok(())
}
