use chrono::{NaiveDate, Utc};
use sqlx::SqliteConnection;

use crate::{
    error::AppError,
    models::activity::{Activity, ActivityDraft},
};

const COLUMNS: &str = "id, trip_id, date, start_time, end_time, title, location, description, \
                       category, price, latitude, longitude, created_at";

/// Activities of one trip, or of all trips when `trip_id` is `None`, ordered
/// by `(date, start_time)` with insertion order breaking ties.
pub async fn list(
    conn: &mut SqliteConnection,
    trip_id: Option<i64>,
) -> Result<Vec<Activity>, AppError> {
    let sql = format!(
        "SELECT {COLUMNS} FROM activities WHERE (?1 IS NULL OR trip_id = ?1) \
         ORDER BY date, start_time, id"
    );
    let activities = sqlx::query_as::<_, Activity>(&sql)
        .bind(trip_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(activities)
}

/// Like [`list`], restricted to `start..=end`.
pub async fn list_between(
    conn: &mut SqliteConnection,
    trip_id: Option<i64>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Activity>, AppError> {
    let sql = format!(
        "SELECT {COLUMNS} FROM activities \
         WHERE (?1 IS NULL OR trip_id = ?1) AND date >= ?2 AND date <= ?3 \
         ORDER BY date, start_time, id"
    );
    let activities = sqlx::query_as::<_, Activity>(&sql)
        .bind(trip_id)
        .bind(start)
        .bind(end)
        .fetch_all(&mut *conn)
        .await?;
    Ok(activities)
}

pub async fn get(conn: &mut SqliteConnection, activity_id: i64) -> Result<Activity, AppError> {
    let sql = format!("SELECT {COLUMNS} FROM activities WHERE id = ?1");
    sqlx::query_as::<_, Activity>(&sql)
        .bind(activity_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn count_for_trip(conn: &mut SqliteConnection, trip_id: i64) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activities WHERE trip_id = ?1")
        .bind(trip_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

pub async fn insert(
    conn: &mut SqliteConnection,
    trip_id: i64,
    draft: &ActivityDraft,
) -> Result<Activity, AppError> {
    let sql = format!(
        "INSERT INTO activities (trip_id, date, start_time, end_time, title, location, \
         description, category, price, latitude, longitude, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12) RETURNING {COLUMNS}"
    );
    let activity = sqlx::query_as::<_, Activity>(&sql)
        .bind(trip_id)
        .bind(draft.date)
        .bind(draft.start_time)
        .bind(draft.end_time)
        .bind(&draft.title)
        .bind(&draft.location)
        .bind(&draft.description)
        .bind(draft.category.map(|c| c.as_str()))
        .bind(draft.price)
        .bind(draft.latitude)
        .bind(draft.longitude)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;
    Ok(activity)
}

/// Full-row overwrite of the editable columns.
pub async fn update(conn: &mut SqliteConnection, activity: &Activity) -> Result<(), AppError> {
    let result = sqlx::query(
        "UPDATE activities SET date = ?1, start_time = ?2, end_time = ?3, title = ?4, \
         location = ?5, description = ?6, category = ?7, price = ?8, latitude = ?9, \
         longitude = ?10 WHERE id = ?11",
    )
    .bind(activity.date)
    .bind(activity.start_time)
    .bind(activity.end_time)
    .bind(&activity.title)
    .bind(&activity.location)
    .bind(&activity.description)
    .bind(activity.category.map(|c| c.as_str()))
    .bind(activity.price)
    .bind(activity.latitude)
    .bind(activity.longitude)
    .bind(activity.id)
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

pub async fn delete(conn: &mut SqliteConnection, activity_id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM activities WHERE id = ?1")
        .bind(activity_id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}
