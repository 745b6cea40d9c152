use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};
use sqlx::{sqlite::SqliteRow, FromRow, Row};

use crate::{
    error::AppError,
    models::{
        category::Category,
        formats::{parse_clock_time, parse_iso_date},
        patch::Patch,
    },
};

#[derive(Debug, Clone, Serialize)]
pub struct Activity {
    pub id: i64,
    pub trip_id: i64,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub title: String,
    pub location: String,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub price: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for Activity {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let category = row
            .try_get::<Option<String>, _>("category")?
            .map(|raw| raw.parse::<Category>())
            .transpose()
            .map_err(|err| sqlx::Error::ColumnDecode {
                index: "category".into(),
                source: Box::new(err),
            })?;
        Ok(Self {
            id: row.try_get("id")?,
            trip_id: row.try_get("trip_id")?,
            date: row.try_get("date")?,
            start_time: row.try_get("start_time")?,
            end_time: row.try_get("end_time")?,
            title: row.try_get("title")?,
            location: row.try_get("location")?,
            description: row.try_get("description")?,
            category,
            price: row.try_get("price")?,
            latitude: row.try_get("latitude")?,
            longitude: row.try_get("longitude")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Minutes elapsed since midnight.
pub fn minute_of_day(time: NaiveTime) -> i32 {
    (time.hour() * 60 + time.minute()) as i32
}

impl Activity {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }

    pub fn start_minutes(&self) -> i32 {
        minute_of_day(self.start_time)
    }

    pub fn end_minutes(&self) -> i32 {
        minute_of_day(self.end_time)
    }

    /// Negative when the end time precedes the start time; such rows are kept.
    pub fn duration_minutes(&self) -> i32 {
        self.end_minutes() - self.start_minutes()
    }

    pub fn time_range_text(&self) -> String {
        format!(
            "{} – {}",
            self.start_time.format("%-I:%M %p"),
            self.end_time.format("%-I:%M %p")
        )
    }

    pub fn category_label(&self) -> &'static str {
        self.category.map(|c| c.as_str()).unwrap_or("Uncategorized")
    }

    pub fn price_text(&self) -> String {
        format!("${:.2}", self.price)
    }

    pub fn description_display(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    pub fn to_draft(&self) -> ActivityDraft {
        ActivityDraft {
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            title: self.title.clone(),
            location: self.location.clone(),
            description: self.description.clone(),
            category: self.category,
            price: self.price,
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    /// Full-field overwrite from an already validated draft.
    pub fn overwrite(&mut self, draft: ActivityDraft) {
        self.date = draft.date;
        self.start_time = draft.start_time;
        self.end_time = draft.end_time;
        self.title = draft.title;
        self.location = draft.location;
        self.description = draft.description;
        self.category = draft.category;
        self.price = draft.price;
        self.latitude = draft.latitude;
        self.longitude = draft.longitude;
    }
}

/// The user-editable fields of an activity, before it is tied to a row.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityDraft {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub title: String,
    pub location: String,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub price: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl ActivityDraft {
    /// Normalises text fields and checks price and coordinate ranges.
    ///
    /// Start/end ordering is deliberately left unchecked.
    pub fn validate(mut self) -> Result<Self, AppError> {
        self.title = self.title.trim().to_string();
        self.location = self.location.trim().to_string();
        self.description = self
            .description
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        if self.title.is_empty() {
            return Err(AppError::bad_request("title is required"));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(AppError::bad_request(format!(
                "price must be a non-negative amount, got {}",
                self.price
            )));
        }
        if let Some(lat) = self.latitude {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(AppError::bad_request(format!("latitude {lat} out of range")));
            }
        }
        if let Some(lng) = self.longitude {
            if !(-180.0..=180.0).contains(&lng) {
                return Err(AppError::bad_request(format!("longitude {lng} out of range")));
            }
        }
        Ok(self)
    }
}

/// Body of the add/edit activity HTML form. Empty inputs arrive as `""`.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct ActivityForm {
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub title: String,
    #[serde(default)]
    pub location: String,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub description: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub category: Option<Category>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub price: Option<f64>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl TryFrom<ActivityForm> for ActivityDraft {
    type Error = AppError;

    fn try_from(form: ActivityForm) -> Result<Self, Self::Error> {
        ActivityDraft {
            date: parse_iso_date(&form.date)?,
            start_time: parse_clock_time(&form.start_time)?,
            end_time: parse_clock_time(&form.end_time)?,
            title: form.title,
            location: form.location,
            description: form.description,
            category: form.category,
            price: form.price.unwrap_or(0.0),
            latitude: form.latitude,
            longitude: form.longitude,
        }
        .validate()
    }
}

/// Partial JSON update. Times are 24-hour strings (`HH:MM` or `HH:MM:SS`).
#[derive(Debug, Default, Deserialize)]
pub struct ActivityPatch {
    #[serde(default)]
    pub date: Patch<NaiveDate>,
    #[serde(default)]
    pub start_time: Patch<String>,
    #[serde(default)]
    pub end_time: Patch<String>,
    #[serde(default)]
    pub title: Patch<String>,
    #[serde(default)]
    pub location: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default)]
    pub category: Patch<Category>,
    #[serde(default)]
    pub price: Patch<f64>,
    #[serde(default)]
    pub latitude: Patch<f64>,
    #[serde(default)]
    pub longitude: Patch<f64>,
}

impl ActivityPatch {
    pub fn apply(self, activity: &mut Activity) -> Result<(), AppError> {
        let mut draft = activity.to_draft();
        self.date.apply_required(&mut draft.date, "date")?;
        self.start_time
            .try_map(|raw| parse_clock_time(&raw))?
            .apply_required(&mut draft.start_time, "start_time")?;
        self.end_time
            .try_map(|raw| parse_clock_time(&raw))?
            .apply_required(&mut draft.end_time, "end_time")?;
        self.title.apply_required(&mut draft.title, "title")?;
        self.location
            .apply_required(&mut draft.location, "location")?;
        self.description.apply_to(&mut draft.description);
        self.category.apply_to(&mut draft.category);
        self.price.apply_required(&mut draft.price, "price")?;
        self.latitude.apply_to(&mut draft.latitude);
        self.longitude.apply_to(&mut draft.longitude);
        activity.overwrite(draft.validate()?);
        Ok(())
    }
}
