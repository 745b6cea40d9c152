use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::warn;

use crate::{
    error::AppError,
    models::trip::{NewTrip, Trip},
};

const COLUMNS: &str = "id, destination, start_date, end_date, created_at";

pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<Trip>, AppError> {
    let sql = format!("SELECT {COLUMNS} FROM trips ORDER BY start_date, id");
    let trips = sqlx::query_as::<_, Trip>(&sql).fetch_all(&mut *conn).await?;
    Ok(trips)
}

pub async fn get(conn: &mut SqliteConnection, trip_id: i64) -> Result<Trip, AppError> {
    let sql = format!("SELECT {COLUMNS} FROM trips WHERE id = ?1");
    sqlx::query_as::<_, Trip>(&sql)
        .bind(trip_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn insert(conn: &mut SqliteConnection, new_trip: &NewTrip) -> Result<Trip, AppError> {
    let sql = format!(
        "INSERT INTO trips (destination, start_date, end_date, created_at) \
         VALUES (?1, ?2, ?3, ?4) RETURNING {COLUMNS}"
    );
    let trip = sqlx::query_as::<_, Trip>(&sql)
        .bind(&new_trip.destination)
        .bind(new_trip.start_date)
        .bind(new_trip.end_date)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;
    warn_on_reversed_range(&trip);
    Ok(trip)
}

/// Writes every field of `trip` back to its row.
pub async fn update(conn: &mut SqliteConnection, trip: &Trip) -> Result<(), AppError> {
    let result = sqlx::query(
        "UPDATE trips SET destination = ?1, start_date = ?2, end_date = ?3 WHERE id = ?4",
    )
    .bind(&trip.destination)
    .bind(trip.start_date)
    .bind(trip.end_date)
    .bind(trip.id)
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    warn_on_reversed_range(trip);
    Ok(())
}

/// Deletes the trip; its activities and todos go with it via `ON DELETE CASCADE`.
pub async fn delete(conn: &mut SqliteConnection, trip_id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM trips WHERE id = ?1")
        .bind(trip_id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

fn warn_on_reversed_range(trip: &Trip) {
    if trip.has_reversed_range() {
        warn!(
            trip_id = trip.id,
            "trip ends ({}) before it starts ({})", trip.end_date, trip.start_date
        );
    }
}
