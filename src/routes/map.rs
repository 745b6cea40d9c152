use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use tracing::debug;

use crate::{
    db::DbConn,
    error::AppError,
    services::{activities, trips},
    state::AppState,
    views::map::{project, MapView},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/map_view", get(map_all))
        .route("/map_view/:trip_id", get(map_for_trip))
}

#[derive(Template)]
#[template(path = "map.html")]
struct MapTemplate {
    heading: String,
    back_link: String,
    map: MapView,
    skipped: usize,
    api_key: Option<String>,
}

fn render_map(
    heading: String,
    back_link: String,
    activity_count: usize,
    map: MapView,
    api_key: Option<String>,
) -> MapTemplate {
    let skipped = activity_count - map.markers.len();
    if skipped > 0 {
        debug!("{skipped} activities have no coordinates and are left off the map");
    }
    MapTemplate {
        heading,
        back_link,
        map,
        skipped,
        api_key,
    }
}

async fn map_all(
    State(state): State<AppState>,
    DbConn(mut conn): DbConn,
) -> Result<impl IntoResponse, AppError> {
    let items = activities::list(&mut conn, None).await?;
    let map = project(&items, false);
    Ok(AskamaTemplateResponse::into_response(render_map(
        "All trips".into(),
        "/".into(),
        items.len(),
        map,
        state.config.google_maps_api_key.clone(),
    )))
}

async fn map_for_trip(
    State(state): State<AppState>,
    DbConn(mut conn): DbConn,
    Path(trip_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let trip = trips::get(&mut conn, trip_id).await?;
    let items = activities::list(&mut conn, Some(trip_id)).await?;
    let map = project(&items, true);
    Ok(AskamaTemplateResponse::into_response(render_map(
        trip.destination,
        format!("/trips/{trip_id}"),
        items.len(),
        map,
        state.config.google_maps_api_key.clone(),
    )))
}
