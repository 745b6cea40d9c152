use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::{
    error::AppError,
    models::{activity::Activity, category::Category},
};

/// Longest window the calendar will expand, in days.
pub const MAX_WINDOW_DAYS: i64 = 366;

/// Inclusive date range shown by the weekly calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekWindow {
    /// Monday-to-Sunday week containing `today`.
    pub fn current(today: NaiveDate) -> Self {
        let start = today - Duration::days(today.weekday().num_days_from_monday() as i64);
        Self {
            start,
            end: start + Duration::days(6),
        }
    }

    /// Fills in whichever bound is missing with a 7-day span.
    ///
    /// A lone `start` runs six days forward and a lone `end` six days back;
    /// with neither bound the current week is used.
    pub fn resolve(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Self, AppError> {
        let span = Duration::days(6);
        let out_of_range = || AppError::bad_request("date is out of range");
        let window = match (start, end) {
            (Some(start), Some(end)) => Self { start, end },
            (Some(start), None) => Self {
                start,
                end: start.checked_add_signed(span).ok_or_else(out_of_range)?,
            },
            (None, Some(end)) => Self {
                start: end.checked_sub_signed(span).ok_or_else(out_of_range)?,
                end,
            },
            (None, None) => Self::current(today),
        };
        if window.end < window.start {
            return Err(AppError::bad_request(format!(
                "end_date {} is before start_date {}",
                window.end, window.start
            )));
        }
        if window.len_days() > MAX_WINDOW_DAYS {
            return Err(AppError::bad_request(format!(
                "window of {} days exceeds {MAX_WINDOW_DAYS}",
                window.len_days()
            )));
        }
        Ok(window)
    }

    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        (0..self.len_days()).map(move |offset| start + Duration::days(offset))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Same-length window immediately before this one, if chrono can
    /// represent it.
    pub fn previous(&self) -> Option<Self> {
        let shift = Duration::days(self.len_days());
        Some(Self {
            start: self.start.checked_sub_signed(shift)?,
            end: self.end.checked_sub_signed(shift)?,
        })
    }

    pub fn next(&self) -> Option<Self> {
        let shift = Duration::days(self.len_days());
        Some(Self {
            start: self.start.checked_add_signed(shift)?,
            end: self.end.checked_add_signed(shift)?,
        })
    }
}

/// Category restriction for the calendar. No requested labels means every
/// category.
///
/// Labels outside the known set are kept as "requested" but select nothing,
/// so `categories=Shopping` yields an empty grid rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    selected: BTreeSet<Category>,
    requested: bool,
}

impl CategoryFilter {
    /// Parses the comma separated `categories` query value.
    pub fn parse(raw: Option<&str>) -> Self {
        let mut filter = Self::default();
        for label in raw.unwrap_or_default().split(',').map(str::trim) {
            if label.is_empty() {
                continue;
            }
            filter.requested = true;
            match label.parse::<Category>() {
                Ok(category) => {
                    filter.selected.insert(category);
                }
                Err(err) => debug!("ignoring category filter entry: {err}"),
            }
        }
        filter
    }

    pub fn is_empty(&self) -> bool {
        !self.requested
    }

    pub fn contains(&self, category: Category) -> bool {
        self.selected.contains(&category)
    }

    /// Uncategorized activities only pass an empty filter.
    pub fn matches(&self, activity: &Activity) -> bool {
        self.is_empty() || activity.category.is_some_and(|c| self.selected.contains(&c))
    }

    pub fn iter(&self) -> impl Iterator<Item = Category> + '_ {
        self.selected.iter().copied()
    }
}

impl FromIterator<Category> for CategoryFilter {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        let selected: BTreeSet<Category> = iter.into_iter().collect();
        Self {
            requested: !selected.is_empty(),
            selected,
        }
    }
}

/// An activity placed on the calendar grid.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledActivity {
    #[serde(flatten)]
    pub activity: Activity,
    pub start_minutes: i32,
    pub end_minutes: i32,
    pub duration_minutes: i32,
}

impl From<Activity> for ScheduledActivity {
    fn from(activity: Activity) -> Self {
        Self {
            start_minutes: activity.start_minutes(),
            end_minutes: activity.end_minutes(),
            duration_minutes: activity.duration_minutes(),
            activity,
        }
    }
}

pub type WeekGrid = BTreeMap<NaiveDate, Vec<ScheduledActivity>>;

/// Buckets activities into one entry per day of `window`.
///
/// Every day of the window is present, empty or not. Activities outside the
/// window or rejected by `filter` are dropped. Within a day, entries are
/// ordered by start time, ties keeping their input order.
pub fn build_week(
    window: &WeekWindow,
    activities: Vec<Activity>,
    filter: &CategoryFilter,
) -> WeekGrid {
    let mut grid: WeekGrid = window.days().map(|day| (day, Vec::new())).collect();
    for activity in activities {
        if !window.contains(activity.date) || !filter.matches(&activity) {
            continue;
        }
        if let Some(day) = grid.get_mut(&activity.date) {
            day.push(ScheduledActivity::from(activity));
        }
    }
    for day in grid.values_mut() {
        day.sort_by_key(|entry| entry.activity.start_time);
    }
    grid
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub label: String,
    pub count: usize,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekSummary {
    pub activity_count: usize,
    pub total_cost: f64,
    pub categories: Vec<CategoryTotal>,
}

/// Totals shown beside the calendar: overall cost and a per-category tally.
pub fn summarize(grid: &WeekGrid) -> WeekSummary {
    let mut by_label: BTreeMap<&'static str, (usize, f64)> = BTreeMap::new();
    let mut activity_count = 0;
    let mut total_cost = 0.0;
    for entry in grid.values().flatten() {
        activity_count += 1;
        total_cost += entry.activity.price;
        let slot = by_label
            .entry(entry.activity.category_label())
            .or_insert((0, 0.0));
        slot.0 += 1;
        slot.1 += entry.activity.price;
    }
    WeekSummary {
        activity_count,
        total_cost,
        categories: by_label
            .into_iter()
            .map(|(label, (count, cost))| CategoryTotal {
                label: label.to_string(),
                count,
                cost,
            })
            .collect(),
    }
}
