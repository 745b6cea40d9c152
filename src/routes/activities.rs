use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::extract::{cookie::PrivateCookieJar, WithRejection};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    db::DbConn,
    error::AppError,
    models::{
        activity::{Activity, ActivityDraft, ActivityForm},
        category::Category,
    },
    routes::flash,
    services::{
        activities,
        import::{self, BulkImportRequest, BulkImportResponse},
        trips,
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/activities", get(list_activities))
        .route("/activities/:id", get(get_activity))
        .route(
            "/add_activity/:trip_id",
            get(add_activity_form).post(add_activity_submit),
        )
        .route(
            "/edit_activity/:id",
            get(edit_activity_form).post(edit_activity_submit),
        )
        .route("/delete_activity/:id", post(delete_activity))
        .route("/bulk_add_activities", post(bulk_add_unscoped))
        .route("/bulk_add_activities/:trip_id", post(bulk_add_for_trip))
}

#[derive(Debug, Deserialize)]
struct ActivityListQuery {
    trip_id: Option<i64>,
}

async fn list_activities(
    DbConn(mut conn): DbConn,
    Query(query): Query<ActivityListQuery>,
) -> Result<Json<Vec<Activity>>, AppError> {
    let items = activities::list(&mut conn, query.trip_id).await?;
    Ok(Json(items))
}

async fn get_activity(
    DbConn(mut conn): DbConn,
    Path(activity_id): Path<i64>,
) -> Result<Json<Activity>, AppError> {
    Ok(Json(activities::get(&mut conn, activity_id).await?))
}

#[derive(Clone)]
struct CategoryOption {
    label: &'static str,
    selected: bool,
}

fn category_options(selected: Option<Category>) -> Vec<CategoryOption> {
    Category::ALL
        .into_iter()
        .map(|category| CategoryOption {
            label: category.as_str(),
            selected: selected == Some(category),
        })
        .collect()
}

/// Prefilled values for the activity form, already rendered as text.
#[derive(Clone, Default)]
struct ActivityFormValues {
    date: String,
    start_time: String,
    end_time: String,
    title: String,
    location: String,
    description: String,
    price: String,
    latitude: String,
    longitude: String,
}

impl From<&Activity> for ActivityFormValues {
    fn from(activity: &Activity) -> Self {
        Self {
            date: activity.date.format("%Y-%m-%d").to_string(),
            start_time: activity.start_time.format("%H:%M").to_string(),
            end_time: activity.end_time.format("%H:%M").to_string(),
            title: activity.title.clone(),
            location: activity.location.clone(),
            description: activity.description_display().to_string(),
            price: format!("{:.2}", activity.price),
            latitude: activity.latitude.map(|v| v.to_string()).unwrap_or_default(),
            longitude: activity.longitude.map(|v| v.to_string()).unwrap_or_default(),
        }
    }
}

#[derive(Template)]
#[template(path = "activities/form.html")]
struct ActivityFormTemplate {
    heading: String,
    action: String,
    trip_id: i64,
    values: ActivityFormValues,
    categories: Vec<CategoryOption>,
}

async fn add_activity_form(
    DbConn(mut conn): DbConn,
    Path(trip_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let trip = trips::get(&mut conn, trip_id).await?;
    let values = ActivityFormValues {
        date: trip.start_date.format("%Y-%m-%d").to_string(),
        price: "0.00".into(),
        ..ActivityFormValues::default()
    };
    Ok(AskamaTemplateResponse::into_response(
        ActivityFormTemplate {
            heading: format!("New activity in {}", trip.destination),
            action: format!("/add_activity/{trip_id}"),
            trip_id,
            values,
            categories: category_options(None),
        },
    ))
}

async fn add_activity_submit(
    DbConn(mut conn): DbConn,
    jar: PrivateCookieJar,
    Path(trip_id): Path<i64>,
    Form(form): Form<ActivityForm>,
) -> Result<(PrivateCookieJar, Redirect), AppError> {
    let trip = trips::get(&mut conn, trip_id).await?;
    let draft = ActivityDraft::try_from(form)?;
    if !trip.covers(draft.date) {
        warn!(trip_id, "activity dated {} falls outside the trip", draft.date);
    }
    let activity = activities::insert(&mut conn, trip_id, &draft).await?;
    Ok((
        flash::set(jar, format!("Added {}", activity.title)),
        Redirect::to(&format!("/trips/{trip_id}")),
    ))
}

async fn edit_activity_form(
    DbConn(mut conn): DbConn,
    Path(activity_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let activity = activities::get(&mut conn, activity_id).await?;
    Ok(AskamaTemplateResponse::into_response(
        ActivityFormTemplate {
            heading: format!("Edit {}", activity.title),
            action: format!("/edit_activity/{activity_id}"),
            trip_id: activity.trip_id,
            values: ActivityFormValues::from(&activity),
            categories: category_options(activity.category),
        },
    ))
}

/// Full overwrite: fields left blank in the form are cleared.
async fn edit_activity_submit(
    DbConn(mut conn): DbConn,
    jar: PrivateCookieJar,
    Path(activity_id): Path<i64>,
    Form(form): Form<ActivityForm>,
) -> Result<(PrivateCookieJar, Redirect), AppError> {
    let mut activity = activities::get(&mut conn, activity_id).await?;
    activity.overwrite(ActivityDraft::try_from(form)?);
    activities::update(&mut conn, &activity).await?;
    Ok((
        flash::set(jar, format!("Updated {}", activity.title)),
        Redirect::to(&format!("/trips/{}", activity.trip_id)),
    ))
}

async fn delete_activity(
    DbConn(mut conn): DbConn,
    jar: PrivateCookieJar,
    Path(activity_id): Path<i64>,
) -> Result<(PrivateCookieJar, Redirect), AppError> {
    let activity = activities::get(&mut conn, activity_id).await?;
    activities::delete(&mut conn, activity_id).await?;
    Ok((
        flash::set(jar, format!("Removed {}", activity.title)),
        Redirect::to(&format!("/trips/{}", activity.trip_id)),
    ))
}

async fn bulk_add_unscoped(
    DbConn(mut conn): DbConn,
    WithRejection(Json(request), _): WithRejection<Json<BulkImportRequest>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let trip_id = request
        .trip_id
        .ok_or_else(|| AppError::bad_request("trip_id is required"))?;
    bulk_add(&mut conn, trip_id, request).await
}

async fn bulk_add_for_trip(
    DbConn(mut conn): DbConn,
    Path(trip_id): Path<i64>,
    WithRejection(Json(request), _): WithRejection<Json<BulkImportRequest>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    bulk_add(&mut conn, trip_id, request).await
}

async fn bulk_add(
    conn: &mut sqlx::SqliteConnection,
    trip_id: i64,
    request: BulkImportRequest,
) -> Result<(StatusCode, Json<BulkImportResponse>), AppError> {
    let trip = trips::get(conn, trip_id).await?;
    let drafts = import::parse_bulk(request.activities).map_err(|err| {
        warn!(trip_id, "bulk import rejected: {err}");
        err
    })?;
    let count = import::insert_batch(conn, &trip, &drafts).await?;
    info!(trip_id, "added {count} activities from bulk request");
    Ok((StatusCode::CREATED, Json(BulkImportResponse::new(count))))
}
