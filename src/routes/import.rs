use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::{Multipart, Path},
    response::{IntoResponse, Redirect},
    routing::get,
    Router,
};
use axum_extra::extract::cookie::PrivateCookieJar;
use tracing::warn;

use crate::{
    db::DbConn,
    error::AppError,
    models::trip::Trip,
    routes::flash,
    services::{import, trips},
    state::AppState,
};

const FILE_FIELD: &str = "file";

pub fn router() -> Router<AppState> {
    Router::new().route("/import_csv/:trip_id", get(import_form).post(import_submit))
}

#[derive(Template)]
#[template(path = "import.html")]
struct ImportTemplate {
    trip: Trip,
    flash: Option<String>,
}

async fn import_form(
    DbConn(mut conn): DbConn,
    jar: PrivateCookieJar,
    Path(trip_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let trip = trips::get(&mut conn, trip_id).await?;
    let (jar, flash) = flash::take(jar);
    Ok((
        jar,
        AskamaTemplateResponse::into_response(ImportTemplate { trip, flash }),
    ))
}

/// Accepts a multipart upload whose `file` part is a headed CSV.
///
/// Parse failures do not surface as errors: the batch is dropped, nothing is
/// written, and the user is sent back to the form with the failing line.
async fn import_submit(
    DbConn(mut conn): DbConn,
    jar: PrivateCookieJar,
    Path(trip_id): Path<i64>,
    mut multipart: Multipart,
) -> Result<(PrivateCookieJar, Redirect), AppError> {
    let trip = trips::get(&mut conn, trip_id).await?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(FILE_FIELD) {
            upload = Some(field.bytes().await?);
        }
    }
    let Some(upload) = upload else {
        return Err(AppError::bad_request("no file uploaded"));
    };

    let drafts = match import::parse_csv(upload.as_ref()) {
        Ok(drafts) => drafts,
        Err(err) => {
            warn!(trip_id, "csv import rolled back: {err}");
            return Ok((
                flash::set(jar, format!("Import failed, nothing was added. {err}")),
                Redirect::to(&format!("/import_csv/{trip_id}")),
            ));
        }
    };

    let count = import::insert_batch(&mut conn, &trip, &drafts).await?;
    Ok((
        flash::set(jar, format!("Imported {count} activities")),
        Redirect::to(&format!("/trips/{trip_id}")),
    ))
}
