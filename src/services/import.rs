//! Batch activity import from the bulk JSON endpoint and from CSV uploads.
//!
//! Both sources are parsed completely before anything is written, and the
//! rows are inserted inside one transaction. A bad record therefore leaves
//! the trip untouched.

use std::io::Read;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use sqlx::{Connection, SqliteConnection};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    error::AppError,
    models::{
        activity::ActivityDraft,
        category::Category,
        formats::{parse_clock_time, parse_iso_date, parse_meridiem_time, parse_us_date},
        trip::Trip,
    },
    services::activities,
};

#[derive(Debug, Error)]
pub enum ImportError {
    /// Zero-based position in the JSON `activities` array.
    #[error("activity #{index}: {reason}")]
    Record { index: usize, reason: String },
    /// One-based line in the uploaded file, header included.
    #[error("line {line}: {reason}")]
    Line { line: u64, reason: String },
}

impl From<ImportError> for AppError {
    fn from(err: ImportError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct BulkImportRequest {
    #[serde(default)]
    pub trip_id: Option<i64>,
    #[serde(default)]
    pub activities: Vec<BulkActivityRecord>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct BulkImportResponse {
    pub message: String,
    pub count: usize,
}

impl BulkImportResponse {
    pub fn new(count: usize) -> Self {
        Self {
            message: format!("Successfully added {count} activities"),
            count,
        }
    }
}

/// One entry of the bulk JSON body: `MM/DD/YYYY` dates, `H:MM AM` times.
///
/// Price and coordinates may be numbers or numeric strings.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct BulkActivityRecord {
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub title: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    pub price: Option<f64>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl TryFrom<BulkActivityRecord> for ActivityDraft {
    type Error = AppError;

    fn try_from(record: BulkActivityRecord) -> Result<Self, Self::Error> {
        ActivityDraft {
            date: parse_us_date(&record.date)?,
            start_time: parse_meridiem_time(&record.start_time)?,
            end_time: parse_meridiem_time(&record.end_time)?,
            title: record.title,
            location: record.location,
            description: record.description,
            category: parse_category(record.category.as_deref())?,
            price: record.price.unwrap_or(0.0),
            latitude: record.latitude,
            longitude: record.longitude,
        }
        .validate()
    }
}

/// One CSV row: `YYYY-MM-DD` dates and 24-hour times.
#[derive(Debug, Clone, Deserialize)]
pub struct CsvActivityRecord {
    pub title: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl TryFrom<CsvActivityRecord> for ActivityDraft {
    type Error = AppError;

    fn try_from(record: CsvActivityRecord) -> Result<Self, Self::Error> {
        ActivityDraft {
            date: parse_iso_date(&record.date)?,
            start_time: parse_clock_time(&record.start_time)?,
            end_time: parse_clock_time(&record.end_time)?,
            title: record.title,
            location: record.location,
            description: record.description,
            category: parse_category(record.category.as_deref())?,
            price: record.price.unwrap_or(0.0),
            latitude: record.latitude,
            longitude: record.longitude,
        }
        .validate()
    }
}

fn parse_category(raw: Option<&str>) -> Result<Option<Category>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(label) => label
            .parse::<Category>()
            .map(Some)
            .map_err(|err| AppError::bad_request(err.to_string())),
    }
}

fn reason(err: AppError) -> String {
    match err {
        AppError::BadRequest(message) => message,
        other => other.to_string(),
    }
}

pub fn parse_bulk(records: Vec<BulkActivityRecord>) -> Result<Vec<ActivityDraft>, ImportError> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            ActivityDraft::try_from(record).map_err(|err| ImportError::Record {
                index,
                reason: reason(err),
            })
        })
        .collect()
}

/// Reads a headed CSV file. Column order does not matter; unknown columns are
/// ignored.
pub fn parse_csv<R: Read>(input: R) -> Result<Vec<ActivityDraft>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);
    let headers = reader
        .headers()
        .map_err(|err| ImportError::Line {
            line: 1,
            reason: err.to_string(),
        })?
        .clone();

    let mut drafts = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|err| ImportError::Line {
            line: err.position().map(|pos| pos.line()).unwrap_or_default(),
            reason: err.to_string(),
        })?;
        let line = row.position().map(|pos| pos.line()).unwrap_or_default();
        let record: CsvActivityRecord =
            row.deserialize(Some(&headers))
                .map_err(|err| ImportError::Line {
                    line,
                    reason: err.to_string(),
                })?;
        let draft = ActivityDraft::try_from(record).map_err(|err| ImportError::Line {
            line,
            reason: reason(err),
        })?;
        drafts.push(draft);
    }
    Ok(drafts)
}

/// Inserts all drafts into `trip` in a single transaction.
///
/// The transaction is rolled back when it is dropped without a commit, so a
/// failure on any row leaves no partial batch behind. Rows dated outside the
/// trip are accepted and logged.
pub async fn insert_batch(
    conn: &mut SqliteConnection,
    trip: &Trip,
    drafts: &[ActivityDraft],
) -> Result<usize, AppError> {
    let mut tx = conn.begin().await?;
    for draft in drafts {
        if !trip.covers(draft.date) {
            warn!(
                trip_id = trip.id,
                "imported activity {:?} dated {} falls outside the trip",
                draft.title,
                draft.date
            );
        }
        activities::insert(&mut tx, trip.id, draft).await?;
    }
    tx.commit().await?;
    info!(trip_id = trip.id, count = drafts.len(), "imported activities");
    Ok(drafts.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn record(date: &str, start: &str) -> BulkActivityRecord {
        serde_json::from_value(serde_json::json!({
            "date": date,
            "start_time": start,
            "end_time": "5:00 PM",
            "title": "Ha Long Bay Cruise",
            "location": "Ha Long Bay, Vietnam",
            "description": "Overnight cruise",
            "category": "Sightseeing",
            "price": "120.50",
            "latitude": 20.9101,
            "longitude": "107.1839",
        }))
        .unwrap()
    }

    #[test]
    fn bulk_records_accept_numbers_and_numeric_strings() {
        let drafts = parse_bulk(vec![record("10/30/2024", "8:00 AM")]).unwrap();
        let draft = &drafts[0];
        assert_eq!(draft.date, NaiveDate::from_ymd_opt(2024, 10, 30).unwrap());
        assert_eq!(draft.start_time, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(draft.end_time, NaiveTime::from_hms_opt(17, 0, 0).unwrap());
        assert_eq!(draft.price, 120.5);
        assert_eq!(draft.longitude, Some(107.1839));
        assert_eq!(draft.category, Some(Category::Sightseeing));
    }

    #[test]
    fn bulk_optional_fields_default() {
        let minimal: BulkActivityRecord = serde_json::from_value(serde_json::json!({
            "date": "11/01/2024",
            "start_time": "9:00 AM",
            "end_time": "11:00 AM",
            "title": "Hoi An",
        }))
        .unwrap();
        let drafts = parse_bulk(vec![minimal]).unwrap();
        assert_eq!(drafts[0].price, 0.0);
        assert_eq!(drafts[0].category, None);
        assert_eq!(drafts[0].latitude, None);
        assert_eq!(drafts[0].description, None);
    }

    #[test]
    fn bulk_error_names_the_failing_record() {
        let err = parse_bulk(vec![
            record("10/30/2024", "8:00 AM"),
            record("2024-10-31", "8:00 AM"),
        ])
        .unwrap_err();
        assert!(matches!(err, ImportError::Record { index: 1, .. }));
    }

    #[test]
    fn csv_rows_parse_with_optional_columns() {
        let data = "title,date,start_time,end_time,location,category,latitude,longitude\n\
                    Old Quarter,2024-10-29,09:00,11:30,Hanoi,Sightseeing,21.0338,105.85\n\
                    Street food,2024-10-29,18:00,19:30,Hanoi,,,\n";
        let drafts = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].latitude, Some(21.0338));
        assert_eq!(drafts[1].category, None);
        assert_eq!(drafts[1].longitude, None);
        assert_eq!(drafts[1].end_time, NaiveTime::from_hms_opt(19, 30, 0).unwrap());
    }

    #[test]
    fn csv_error_reports_line_number() {
        let data = "title,date,start_time,end_time,location,category,latitude,longitude\n\
                    Old Quarter,2024-10-29,09:00,11:30,Hanoi,Sightseeing,21.0338,105.85\n\
                    Broken,10/29/2024,09:00,11:30,Hanoi,,,\n";
        match parse_csv(data.as_bytes()).unwrap_err() {
            ImportError::Line { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn csv_rejects_unknown_category() {
        let data = "title,date,start_time,end_time,location,category,latitude,longitude\n\
                    Mall,2024-10-29,09:00,11:30,Hanoi,Shopping,,\n";
        assert!(parse_csv(data.as_bytes()).is_err());
    }

    #[test]
    fn response_message_reports_count() {
        assert_eq!(
            BulkImportResponse::new(3).message,
            "Successfully added 3 activities"
        );
    }
}
