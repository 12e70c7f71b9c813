use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};

use super::{pages, AppContext};

pub fn door_routes() -> Router<AppContext> {
    Router::new()
        .route("/", get(index))
        .route("/lock", get(lock))
        .route("/unlock", get(unlock))
}

async fn index() -> Html<String> {
    Html(pages::index())
}

async fn lock(State(ctx): State<AppContext>) -> impl IntoResponse {
    set_lock(ctx, true, "locked").await
}

async fn unlock(State(ctx): State<AppContext>) -> impl IntoResponse {
    set_lock(ctx, false, "unlocked").await
}

async fn set_lock(ctx: AppContext, locked: bool, reply: &'static str) -> (StatusCode, &'static str) {
    let params = ctx.params.clone();
    let key = ctx.config.params.lock_key.clone();

    let result = tokio::task::spawn_blocking(move || params.put_bool(&key, locked)).await;
    match result {
        Ok(Ok(())) => (StatusCode::OK, reply),
        Ok(Err(e)) => {
            tracing::error!("Failed to set door lock to {}: {:#}", locked, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "failed")
        }
        Err(e) => {
            tracing::error!("spawn_blocking join error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "failed")
        }
    }
}
