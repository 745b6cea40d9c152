use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};
use sqlx::FromRow;

use crate::{error::AppError, models::patch::Patch};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Todo {
    pub id: i64,
    pub trip_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Todo {
    pub fn description_display(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

/// Form body for creating a todo and for the full-overwrite update form.
///
/// Checkboxes are only sent when ticked, so `is_completed` is present-or-absent.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct TodoForm {
    pub title: String,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_completed: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TodoDraft {
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
}

impl TryFrom<TodoForm> for TodoDraft {
    type Error = AppError;

    fn try_from(form: TodoForm) -> Result<Self, Self::Error> {
        let title = form.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::bad_request("title is required"));
        }
        Ok(Self {
            title,
            description: form
                .description
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty()),
            is_completed: form.is_completed.is_some(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TodoPatch {
    #[serde(default)]
    pub title: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default)]
    pub is_completed: Patch<bool>,
}

impl TodoPatch {
    pub fn apply(self, todo: &mut Todo) -> Result<(), AppError> {
        self.title
            .map(|value| value.trim().to_string())
            .apply_required(&mut todo.title, "title")?;
        if todo.title.is_empty() {
            return Err(AppError::bad_request("title is required"));
        }
        self.description.apply_to(&mut todo.description);
        self.is_completed
            .apply_required(&mut todo.is_completed, "is_completed")?;
        Ok(())
    }
}
