use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{error::AppError, models::patch::Patch};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: i64,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Trip {
    /// Reversed ranges are stored as given; callers only log them.
    pub fn has_reversed_range(&self) -> bool {
        self.start_date > self.end_date
    }

    /// Whether `date` lies within the trip, bounds included.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn date_range_text(&self) -> String {
        format!(
            "{} – {}",
            self.start_date.format("%b %-d, %Y"),
            self.end_date.format("%b %-d, %Y")
        )
    }
}

/// Create payload shared by the JSON API and the HTML form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrip {
    #[serde(alias = "name")]
    pub destination: String,
    #[serde(alias = "start_date")]
    pub start_date: NaiveDate,
    #[serde(alias = "end_date")]
    pub end_date: NaiveDate,
}

impl NewTrip {
    pub fn validate(mut self) -> Result<Self, AppError> {
        self.destination = self.destination.trim().to_string();
        if self.destination.is_empty() {
            return Err(AppError::bad_request("destination is required"));
        }
        Ok(self)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripPatch {
    #[serde(default, alias = "name")]
    pub destination: Patch<String>,
    #[serde(default, alias = "start_date")]
    pub start_date: Patch<NaiveDate>,
    #[serde(default, alias = "end_date")]
    pub end_date: Patch<NaiveDate>,
}

impl TripPatch {
    pub fn apply(self, trip: &mut Trip) -> Result<(), AppError> {
        self.destination
            .map(|value| value.trim().to_string())
            .apply_required(&mut trip.destination, "destination")?;
        if trip.destination.is_empty() {
            return Err(AppError::bad_request("destination is required"));
        }
        self.start_date
            .apply_required(&mut trip.start_date, "startDate")?;
        self.end_date.apply_required(&mut trip.end_date, "endDate")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vietnam() -> Trip {
        Trip {
            id: 1,
            destination: "Vietnam".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 10, 28).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 11, 13).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn accepts_camel_and_snake_case_payloads() {
        let camel: NewTrip = serde_json::from_str(
            r#"{"destination": "Vietnam", "startDate": "2024-10-28", "endDate": "2024-11-13"}"#,
        )
        .unwrap();
        let snake: NewTrip = serde_json::from_str(
            r#"{"name": "Vietnam", "start_date": "2024-10-28", "end_date": "2024-11-13"}"#,
        )
        .unwrap();
        assert_eq!(camel.destination, snake.destination);
        assert_eq!(camel.start_date, snake.start_date);
    }

    #[test]
    fn covers_includes_both_ends() {
        let trip = vietnam();
        assert!(trip.covers(trip.start_date));
        assert!(trip.covers(trip.end_date));
        assert!(!trip.covers(NaiveDate::from_ymd_opt(2024, 11, 14).unwrap()));
        assert!(!trip.covers(NaiveDate::from_ymd_opt(2024, 10, 27).unwrap()));
    }

    #[test]
    fn patch_only_touches_sent_fields() {
        let mut trip = vietnam();
        let patch: TripPatch = serde_json::from_str(r#"{"endDate": "2024-11-20"}"#).unwrap();
        patch.apply(&mut trip).unwrap();
        assert_eq!(trip.destination, "Vietnam");
        assert_eq!(trip.end_date, NaiveDate::from_ymd_opt(2024, 11, 20).unwrap());
    }

    #[test]
    fn patch_rejects_clearing_destination() {
        let mut trip = vietnam();
        let patch: TripPatch = serde_json::from_str(r#"{"destination": null}"#).unwrap();
        assert!(patch.apply(&mut trip).is_err());
    }

    #[test]
    fn reversed_range_is_detected_not_rejected() {
        let mut trip = vietnam();
        std::mem::swap(&mut trip.start_date, &mut trip.end_date);
        assert!(trip.has_reversed_range());
    }
}
