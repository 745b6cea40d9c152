use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::Path,
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::PrivateCookieJar;
use tracing::info;

use crate::{
    db::DbConn,
    error::AppError,
    models::{
        activity::Activity,
        todo::Todo,
        trip::{NewTrip, Trip},
    },
    routes::flash,
    services::{activities, todos, trips},
    state::AppState,
    views::grouping::{group_by_date, DateGroup},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(trips_index))
        .route("/trips", post(trip_create))
        .route("/trips/:id", get(trip_detail))
        .route("/trips/:id/edit", post(trip_edit))
        .route("/trips/:id/delete", post(trip_delete))
        .route("/itinerary", get(itinerary))
}

#[derive(Clone)]
struct TripSummary {
    trip: Trip,
    activity_count: i64,
}

#[derive(Template)]
#[template(path = "trips/index.html")]
struct TripsIndexTemplate {
    trips: Vec<TripSummary>,
    flash: Option<String>,
}

async fn trips_index(
    DbConn(mut conn): DbConn,
    jar: PrivateCookieJar,
) -> Result<impl IntoResponse, AppError> {
    let (jar, flash) = flash::take(jar);
    let mut summaries = Vec::new();
    for trip in trips::list(&mut conn).await? {
        let activity_count = activities::count_for_trip(&mut conn, trip.id).await?;
        summaries.push(TripSummary {
            trip,
            activity_count,
        });
    }
    Ok((
        jar,
        AskamaTemplateResponse::into_response(TripsIndexTemplate {
            trips: summaries,
            flash,
        }),
    ))
}

async fn trip_create(
    DbConn(mut conn): DbConn,
    jar: PrivateCookieJar,
    Form(form): Form<NewTrip>,
) -> Result<(PrivateCookieJar, Redirect), AppError> {
    let trip = trips::insert(&mut conn, &form.validate()?).await?;
    info!(trip_id = trip.id, "created trip to {}", trip.destination);
    Ok((
        flash::set(jar, format!("Trip to {} created", trip.destination)),
        Redirect::to(&format!("/trips/{}", trip.id)),
    ))
}

#[derive(Template)]
#[template(path = "trips/detail.html")]
struct TripDetailTemplate {
    trip: Trip,
    groups: Vec<DateGroup>,
    todos: Vec<Todo>,
    open_todos: usize,
    total_cost: String,
    flash: Option<String>,
}

async fn trip_detail(
    DbConn(mut conn): DbConn,
    jar: PrivateCookieJar,
    Path(trip_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let trip = trips::get(&mut conn, trip_id).await?;
    let items = activities::list(&mut conn, Some(trip_id)).await?;
    let total_cost: f64 = items.iter().map(|a| a.price).sum();
    let todos = todos::list_for_trip(&mut conn, trip_id).await?;
    let open_todos = todos.iter().filter(|t| !t.is_completed).count();
    let (jar, flash) = flash::take(jar);
    Ok((
        jar,
        AskamaTemplateResponse::into_response(TripDetailTemplate {
            trip,
            groups: group_by_date(items),
            todos,
            open_todos,
            total_cost: format!("${total_cost:.2}"),
            flash,
        }),
    ))
}

/// Full overwrite from the edit form: every field is required.
async fn trip_edit(
    DbConn(mut conn): DbConn,
    jar: PrivateCookieJar,
    Path(trip_id): Path<i64>,
    Form(form): Form<NewTrip>,
) -> Result<(PrivateCookieJar, Redirect), AppError> {
    let form = form.validate()?;
    let mut trip = trips::get(&mut conn, trip_id).await?;
    trip.destination = form.destination;
    trip.start_date = form.start_date;
    trip.end_date = form.end_date;
    trips::update(&mut conn, &trip).await?;
    Ok((
        flash::set(jar, "Trip updated"),
        Redirect::to(&format!("/trips/{trip_id}")),
    ))
}

async fn trip_delete(
    DbConn(mut conn): DbConn,
    jar: PrivateCookieJar,
    Path(trip_id): Path<i64>,
) -> Result<(PrivateCookieJar, Redirect), AppError> {
    let trip = trips::get(&mut conn, trip_id).await?;
    trips::delete(&mut conn, trip_id).await?;
    info!(trip_id, "deleted trip with its activities and todos");
    Ok((
        flash::set(jar, format!("Trip to {} deleted", trip.destination)),
        Redirect::to("/"),
    ))
}

#[derive(Template)]
#[template(path = "itinerary.html")]
struct ItineraryTemplate {
    groups: Vec<DateGroup>,
}

async fn itinerary(DbConn(mut conn): DbConn) -> Result<impl IntoResponse, AppError> {
    let items: Vec<Activity> = activities::list(&mut conn, None).await?;
    Ok(AskamaTemplateResponse::into_response(ItineraryTemplate {
        groups: group_by_date(items),
    }))
}
