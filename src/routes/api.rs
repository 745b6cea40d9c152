//! JSON endpoints under `/api`.

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use tracing::info;

use crate::{
    db::DbConn,
    error::AppError,
    models::{
        activity::{Activity, ActivityPatch},
        todo::{Todo, TodoPatch},
        trip::{NewTrip, Trip, TripPatch},
    },
    services::{activities, todos, trips},
    state::AppState,
    views::map::{project, MapView},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/trips", get(list_trips).post(create_trip))
        .route(
            "/trips/:id",
            get(get_trip).put(update_trip).delete(delete_trip),
        )
        .route("/trips/:id/todos", get(list_todos))
        .route("/activities/:id", put(update_activity).delete(delete_activity))
        .route("/todos/:id", put(update_todo).delete(delete_todo))
        .route("/map", get(map_data))
}

async fn list_trips(DbConn(mut conn): DbConn) -> Result<Json<Vec<Trip>>, AppError> {
    Ok(Json(trips::list(&mut conn).await?))
}

async fn create_trip(
    DbConn(mut conn): DbConn,
    WithRejection(Json(payload), _): WithRejection<Json<NewTrip>, AppError>,
) -> Result<(StatusCode, Json<Trip>), AppError> {
    let trip = trips::insert(&mut conn, &payload.validate()?).await?;
    info!(trip_id = trip.id, "created trip to {}", trip.destination);
    Ok((StatusCode::CREATED, Json(trip)))
}

async fn get_trip(
    DbConn(mut conn): DbConn,
    Path(trip_id): Path<i64>,
) -> Result<Json<Trip>, AppError> {
    Ok(Json(trips::get(&mut conn, trip_id).await?))
}

async fn update_trip(
    DbConn(mut conn): DbConn,
    Path(trip_id): Path<i64>,
    WithRejection(Json(patch), _): WithRejection<Json<TripPatch>, AppError>,
) -> Result<Json<Trip>, AppError> {
    let mut trip = trips::get(&mut conn, trip_id).await?;
    patch.apply(&mut trip)?;
    trips::update(&mut conn, &trip).await?;
    Ok(Json(trip))
}

async fn delete_trip(
    DbConn(mut conn): DbConn,
    Path(trip_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    trips::delete(&mut conn, trip_id).await?;
    info!(trip_id, "deleted trip with its activities and todos");
    Ok(StatusCode::NO_CONTENT)
}

async fn list_todos(
    DbConn(mut conn): DbConn,
    Path(trip_id): Path<i64>,
) -> Result<Json<Vec<Todo>>, AppError> {
    trips::get(&mut conn, trip_id).await?;
    Ok(Json(todos::list_for_trip(&mut conn, trip_id).await?))
}

async fn update_activity(
    DbConn(mut conn): DbConn,
    Path(activity_id): Path<i64>,
    WithRejection(Json(patch), _): WithRejection<Json<ActivityPatch>, AppError>,
) -> Result<Json<Activity>, AppError> {
    let mut activity = activities::get(&mut conn, activity_id).await?;
    patch.apply(&mut activity)?;
    activities::update(&mut conn, &activity).await?;
    Ok(Json(activity))
}

async fn delete_activity(
    DbConn(mut conn): DbConn,
    Path(activity_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    activities::delete(&mut conn, activity_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_todo(
    DbConn(mut conn): DbConn,
    Path(todo_id): Path<i64>,
    WithRejection(Json(patch), _): WithRejection<Json<TodoPatch>, AppError>,
) -> Result<Json<Todo>, AppError> {
    let mut todo = todos::get(&mut conn, todo_id).await?;
    patch.apply(&mut todo)?;
    todos::update(&mut conn, &todo).await?;
    Ok(Json(todo))
}

async fn delete_todo(
    DbConn(mut conn): DbConn,
    Path(todo_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    todos::delete(&mut conn, todo_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct MapQuery {
    trip_id: Option<i64>,
}

async fn map_data(
    DbConn(mut conn): DbConn,
    Query(query): Query<MapQuery>,
) -> Result<Json<MapView>, AppError> {
    if let Some(trip_id) = query.trip_id {
        trips::get(&mut conn, trip_id).await?;
    }
    let items = activities::list(&mut conn, query.trip_id).await?;
    Ok(Json(project(&items, query.trip_id.is_some())))
}
