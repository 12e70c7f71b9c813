//! Footage routes: streams, the per-route player page, and the route list.

use axum::{
    extract::{Path, Query, RawQuery, State},
    response::{Html, Response},
    routing::get,
    Router,
};
use dashreel_common::{CameraType, RouteId, SegmentId};
use serde::Deserialize;

use super::{blocking, pages, AppContext, FootageError};
use crate::streaming::stream_pipeline;

pub fn footage_routes() -> Router<AppContext> {
    // matchit allows one parameter name per position, so the route page and
    // the single-segment stream share `:key` (a route id or a camera).
    Router::new()
        .route("/footage", get(route_list))
        .route("/footage/full/:camera/:route", get(full_route))
        .route("/footage/:key", get(route_page))
        .route("/footage/:key/:segment", get(single_segment))
}

#[derive(Debug, Default, Deserialize)]
pub struct StreamQuery {
    /// Bytes per chunk read from the transcoder.
    pub chunk_size: Option<usize>,
}

/// Stream every segment of a route, concatenated in index order.
async fn full_route(
    State(ctx): State<AppContext>,
    Path((camera, route)): Path<(String, String)>,
    Query(query): Query<StreamQuery>,
) -> Result<Response, FootageError> {
    let route = RouteId::parse(&route)?;
    let camera: CameraType = camera.parse()?;

    let resolver = ctx.resolver.clone();
    let lookup = route.clone();
    let media = blocking(move || resolver.media_for_route(lookup.as_str(), camera)).await?;

    tracing::info!(
        "Streaming route {} ({}, {} segment(s))",
        route,
        camera,
        media.segments.len()
    );

    let pipeline = ctx.pipelines.build(media.paths, camera)?;
    let name = format!("{}-{}.mp4", route, camera);
    stream_pipeline(&ctx, pipeline, query.chunk_size, Some(name)).await
}

/// Stream a single segment.
async fn single_segment(
    State(ctx): State<AppContext>,
    Path((camera, segment)): Path<(String, String)>,
    Query(query): Query<StreamQuery>,
) -> Result<Response, FootageError> {
    // Validated before anything touches the archive.
    let segment = SegmentId::parse(&segment)?;
    let camera: CameraType = camera.parse()?;

    let resolver = ctx.resolver.clone();
    let lookup = segment.clone();
    let path = blocking(move || resolver.segment_media(&lookup, camera)).await?;

    tracing::info!("Streaming segment {} ({})", segment, camera);

    let pipeline = ctx.pipelines.single(path, camera)?;
    let name = format!("{}-{}.mp4", segment, camera);
    stream_pipeline(&ctx, pipeline, query.chunk_size, Some(name)).await
}

/// Player page for one route. The query is `<segment index>,<camera>`.
async fn route_page(
    State(ctx): State<AppContext>,
    Path(route): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Html<String>, FootageError> {
    let route = RouteId::parse(&route)?;
    let (index, camera) = parse_player_query(query.as_deref())?;

    let resolver = ctx.resolver.clone();
    let lookup = route.clone();
    let segments = blocking(move || resolver.resolve(lookup.as_str())).await?;

    Ok(Html(pages::route_player(&route, &segments, index, camera)))
}

/// List of all routes, newest first.
async fn route_list(State(ctx): State<AppContext>) -> Result<Html<String>, FootageError> {
    let resolver = ctx.resolver.clone();
    let routes = blocking(move || resolver.all_routes()).await?;
    Ok(Html(pages::route_list(&routes)))
}

/// Parse `<index>,<camera>`; both parts are optional.
pub fn parse_player_query(query: Option<&str>) -> Result<(u32, CameraType), FootageError> {
    let Some(query) = query.filter(|q| !q.is_empty()) else {
        return Ok((0, CameraType::QCamera));
    };

    let (index, camera) = query.split_once(',').unwrap_or((query, ""));
    let index = index.parse().unwrap_or(0);
    let camera = if camera.is_empty() {
        CameraType::QCamera
    } else {
        camera.parse()?
    };
    Ok((index, camera))
}
