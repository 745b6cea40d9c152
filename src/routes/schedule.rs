use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use axum_extra::extract::Query as MultiQuery;
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_with::{serde_as, NoneAsEmptyString};
use sqlx::SqliteConnection;

use crate::{
    db::DbConn,
    error::AppError,
    models::category::Category,
    services::{activities, trips},
    state::AppState,
    views::weekly::{build_week, summarize, CategoryFilter, WeekGrid, WeekSummary, WeekWindow},
};

/// Pixel height of one hour row in the calendar.
const HOUR_HEIGHT_PX: i32 = 48;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/weekly_view_data", get(week_data_all))
        .route("/weekly_view_data/:trip_id", get(week_data_for_trip))
        .route("/weekly_view", get(week_page_all))
        .route("/weekly_view/:trip_id", get(week_page_for_trip))
}

/// Query of the weekly JSON endpoint.
///
/// Unlike a plain "both bounds or the current week" rule, a lone
/// `start_date` spans the following six days and a lone `end_date` the six
/// days before it. Unknown `categories` labels match nothing.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
struct WeekQuery {
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    start_date: Option<NaiveDate>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    end_date: Option<NaiveDate>,
    #[serde(default)]
    categories: Option<String>,
}

struct Week {
    window: WeekWindow,
    filter: CategoryFilter,
    grid: WeekGrid,
}

async fn load_week(
    conn: &mut SqliteConnection,
    trip_id: Option<i64>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    filter: CategoryFilter,
) -> Result<Week, AppError> {
    if let Some(trip_id) = trip_id {
        trips::get(conn, trip_id).await?;
    }
    let today = Local::now().date_naive();
    let window = WeekWindow::resolve(start, end, today)?;
    let items = activities::list_between(conn, trip_id, window.start, window.end).await?;
    let grid = build_week(&window, items, &filter);
    Ok(Week {
        window,
        filter,
        grid,
    })
}

impl WeekQuery {
    async fn load(self, conn: &mut SqliteConnection, trip_id: Option<i64>) -> Result<Week, AppError> {
        let filter = CategoryFilter::parse(self.categories.as_deref());
        load_week(conn, trip_id, self.start_date, self.end_date, filter).await
    }
}

async fn week_data_all(
    DbConn(mut conn): DbConn,
    Query(query): Query<WeekQuery>,
) -> Result<Json<WeekGrid>, AppError> {
    Ok(Json(query.load(&mut conn, None).await?.grid))
}

async fn week_data_for_trip(
    DbConn(mut conn): DbConn,
    Path(trip_id): Path<i64>,
    Query(query): Query<WeekQuery>,
) -> Result<Json<WeekGrid>, AppError> {
    Ok(Json(query.load(&mut conn, Some(trip_id)).await?.grid))
}

#[derive(Clone)]
struct CalendarEntry {
    activity_id: i64,
    title: String,
    time_text: String,
    location: String,
    category_slug: String,
    price_text: String,
    top_px: i32,
    height_px: i32,
}

#[derive(Clone)]
struct CalendarDay {
    heading: String,
    entries: Vec<CalendarEntry>,
}

#[derive(Clone)]
struct FilterOption {
    label: &'static str,
    checked: bool,
}

#[derive(Template)]
#[template(path = "weekly.html")]
struct WeeklyTemplate {
    heading: String,
    base_path: String,
    range_text: String,
    start_value: String,
    end_value: String,
    previous_query: Option<String>,
    next_query: Option<String>,
    hours: Vec<String>,
    days: Vec<CalendarDay>,
    filters: Vec<FilterOption>,
    summary: WeekSummary,
    grid_height_px: i32,
}

fn render_week(heading: String, base_path: String, week: Week) -> WeeklyTemplate {
    let categories: String = week
        .filter
        .iter()
        .map(|category| format!("&category={category}"))
        .collect();
    let nav_query = |window: Option<WeekWindow>| {
        window.map(|window| {
            format!("start_date={}&end_date={}{categories}", window.start, window.end)
        })
    };
    let summary = summarize(&week.grid);
    let days = week
        .grid
        .into_iter()
        .map(|(date, entries)| CalendarDay {
            heading: date.format("%a %b %-d").to_string(),
            entries: entries
                .into_iter()
                .map(|entry| CalendarEntry {
                    activity_id: entry.activity.id,
                    time_text: entry.activity.time_range_text(),
                    category_slug: entry
                        .activity
                        .category
                        .map(|c| c.slug())
                        .unwrap_or_else(|| "uncategorized".into()),
                    price_text: entry.activity.price_text(),
                    top_px: entry.start_minutes * HOUR_HEIGHT_PX / 60,
                    height_px: (entry.duration_minutes * HOUR_HEIGHT_PX / 60)
                        .max(HOUR_HEIGHT_PX / 4),
                    title: entry.activity.title,
                    location: entry.activity.location,
                })
                .collect(),
        })
        .collect();
    WeeklyTemplate {
        heading,
        base_path,
        range_text: format!(
            "{} – {}",
            week.window.start.format("%B %-d, %Y"),
            week.window.end.format("%B %-d, %Y")
        ),
        start_value: week.window.start.to_string(),
        end_value: week.window.end.to_string(),
        previous_query: nav_query(week.window.previous()),
        next_query: nav_query(week.window.next()),
        hours: (0..24).map(|hour| format!("{hour:02}:00")).collect(),
        days,
        filters: Category::ALL
            .into_iter()
            .map(|category| FilterOption {
                label: category.as_str(),
                checked: week.filter.contains(category),
            })
            .collect(),
        summary,
        grid_height_px: 24 * HOUR_HEIGHT_PX,
    }
}

/// Query of the calendar page. Its checkboxes repeat `category` once per
/// ticked box, hence the multi-value extractor.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
struct WeekPageQuery {
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    start_date: Option<NaiveDate>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    end_date: Option<NaiveDate>,
    #[serde(default)]
    category: Vec<Category>,
}

impl WeekPageQuery {
    async fn load(self, conn: &mut SqliteConnection, trip_id: Option<i64>) -> Result<Week, AppError> {
        let filter = self.category.into_iter().collect();
        load_week(conn, trip_id, self.start_date, self.end_date, filter).await
    }
}

async fn week_page_all(
    DbConn(mut conn): DbConn,
    MultiQuery(query): MultiQuery<WeekPageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let week = query.load(&mut conn, None).await?;
    Ok(AskamaTemplateResponse::into_response(render_week(
        "All trips".into(),
        "/weekly_view".into(),
        week,
    )))
}

async fn week_page_for_trip(
    DbConn(mut conn): DbConn,
    Path(trip_id): Path<i64>,
    MultiQuery(query): MultiQuery<WeekPageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let trip = trips::get(&mut conn, trip_id).await?;
    let week = query.load(&mut conn, Some(trip_id)).await?;
    Ok(AskamaTemplateResponse::into_response(render_week(
        trip.destination,
        format!("/weekly_view/{trip_id}"),
        week,
    )))
}
