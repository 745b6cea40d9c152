use axum::{
    extract::Path,
    response::Redirect,
    routing::post,
    Form, Router,
};
use axum_extra::extract::cookie::PrivateCookieJar;

use crate::{
    db::DbConn,
    error::AppError,
    models::todo::{TodoDraft, TodoForm},
    routes::flash,
    services::{todos, trips},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/add_todo/:trip_id", post(add_todo))
        .route("/update_todo/:id", post(update_todo))
        .route("/toggle_todo/:id", post(toggle_todo))
        .route("/delete_todo/:id", post(delete_todo))
}

fn back_to_trip(trip_id: i64) -> Redirect {
    Redirect::to(&format!("/trips/{trip_id}#todos"))
}

async fn add_todo(
    DbConn(mut conn): DbConn,
    jar: PrivateCookieJar,
    Path(trip_id): Path<i64>,
    Form(form): Form<TodoForm>,
) -> Result<(PrivateCookieJar, Redirect), AppError> {
    trips::get(&mut conn, trip_id).await?;
    let todo = todos::insert(&mut conn, trip_id, &TodoDraft::try_from(form)?).await?;
    Ok((
        flash::set(jar, format!("Added to-do \"{}\"", todo.title)),
        back_to_trip(trip_id),
    ))
}

/// Full overwrite from the edit form; an unticked box reopens the todo.
async fn update_todo(
    DbConn(mut conn): DbConn,
    Path(todo_id): Path<i64>,
    Form(form): Form<TodoForm>,
) -> Result<Redirect, AppError> {
    let draft = TodoDraft::try_from(form)?;
    let mut todo = todos::get(&mut conn, todo_id).await?;
    todo.title = draft.title;
    todo.description = draft.description;
    todo.is_completed = draft.is_completed;
    todos::update(&mut conn, &todo).await?;
    Ok(back_to_trip(todo.trip_id))
}

async fn toggle_todo(
    DbConn(mut conn): DbConn,
    Path(todo_id): Path<i64>,
) -> Result<Redirect, AppError> {
    let todo = todos::toggle(&mut conn, todo_id).await?;
    Ok(back_to_trip(todo.trip_id))
}

async fn delete_todo(
    DbConn(mut conn): DbConn,
    Path(todo_id): Path<i64>,
) -> Result<Redirect, AppError> {
    let todo = todos::get(&mut conn, todo_id).await?;
    todos::delete(&mut conn, todo_id).await?;
    Ok(back_to_trip(todo.trip_id))
}
