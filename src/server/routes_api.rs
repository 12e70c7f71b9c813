use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use dashreel_common::RouteId;
use serde::Serialize;

use super::{blocking, AppContext, FootageError};
use crate::archive::SegmentSummary;

pub fn api_routes() -> Router<AppContext> {
    Router::new()
        .route("/routes", get(list_routes))
        .route("/routes/:route", get(get_route))
}

#[derive(Debug, Serialize)]
pub struct RouteDetail {
    pub route: RouteId,
    pub segments: Vec<SegmentSummary>,
}

async fn list_routes(State(ctx): State<AppContext>) -> Result<Json<Vec<RouteId>>, FootageError> {
    let resolver = ctx.resolver.clone();
    let routes = blocking(move || resolver.all_routes()).await?;
    Ok(Json(routes))
}

async fn get_route(
    State(ctx): State<AppContext>,
    Path(route): Path<String>,
) -> Result<Json<RouteDetail>, FootageError> {
    let route = RouteId::parse(&route)?;

    let resolver = ctx.resolver.clone();
    let lookup = route.clone();
    let segments = blocking(move || resolver.segment_summaries(lookup.as_str())).await?;

    Ok(Json(RouteDetail { route, segments }))
}
