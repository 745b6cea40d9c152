use chrono::Utc;
use sqlx::SqliteConnection;

use crate::{
    error::AppError,
    models::todo::{Todo, TodoDraft},
};

const COLUMNS: &str = "id, trip_id, title, description, is_completed, created_at";

pub async fn list_for_trip(
    conn: &mut SqliteConnection,
    trip_id: i64,
) -> Result<Vec<Todo>, AppError> {
    let sql = format!("SELECT {COLUMNS} FROM todos WHERE trip_id = ?1 ORDER BY is_completed, id");
    let todos = sqlx::query_as::<_, Todo>(&sql)
        .bind(trip_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(todos)
}

pub async fn get(conn: &mut SqliteConnection, todo_id: i64) -> Result<Todo, AppError> {
    let sql = format!("SELECT {COLUMNS} FROM todos WHERE id = ?1");
    sqlx::query_as::<_, Todo>(&sql)
        .bind(todo_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn insert(
    conn: &mut SqliteConnection,
    trip_id: i64,
    draft: &TodoDraft,
) -> Result<Todo, AppError> {
    let sql = format!(
        "INSERT INTO todos (trip_id, title, description, is_completed, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5) RETURNING {COLUMNS}"
    );
    let todo = sqlx::query_as::<_, Todo>(&sql)
        .bind(trip_id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.is_completed)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;
    Ok(todo)
}

pub async fn update(conn: &mut SqliteConnection, todo: &Todo) -> Result<(), AppError> {
    let result = sqlx::query(
        "UPDATE todos SET title = ?1, description = ?2, is_completed = ?3 WHERE id = ?4",
    )
    .bind(&todo.title)
    .bind(&todo.description)
    .bind(todo.is_completed)
    .bind(todo.id)
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

/// Flips `is_completed` in place and returns the updated row.
pub async fn toggle(conn: &mut SqliteConnection, todo_id: i64) -> Result<Todo, AppError> {
    let sql = format!(
        "UPDATE todos SET is_completed = NOT is_completed WHERE id = ?1 RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, Todo>(&sql)
        .bind(todo_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn delete(conn: &mut SqliteConnection, todo_id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM todos WHERE id = ?1")
        .bind(todo_id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}
