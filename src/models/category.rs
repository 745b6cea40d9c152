use std::{fmt, str::FromStr};

use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;

/// Label attached to an activity; drives calendar colouring and filtering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr,
)]
pub enum Category {
    Travel,
    Accommodation,
    Sightseeing,
    Cultural,
    Food,
    Entertainment,
    Historical,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown category {0:?}")]
pub struct UnknownCategory(pub String);

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Travel,
        Category::Accommodation,
        Category::Sightseeing,
        Category::Cultural,
        Category::Food,
        Category::Entertainment,
        Category::Historical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Travel => "Travel",
            Category::Accommodation => "Accommodation",
            Category::Sightseeing => "Sightseeing",
            Category::Cultural => "Cultural",
            Category::Food => "Food",
            Category::Entertainment => "Entertainment",
            Category::Historical => "Historical",
        }
    }

    /// Lower-case slug used as a CSS class in the calendar.
    pub fn slug(&self) -> String {
        self.as_str().to_ascii_lowercase()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownCategory(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labels_case_insensitively() {
        assert_eq!("food".parse::<Category>(), Ok(Category::Food));
        assert_eq!(" Sightseeing ".parse::<Category>(), Ok(Category::Sightseeing));
        assert!("Shopping".parse::<Category>().is_err());
    }

    #[test]
    fn serializes_as_label() {
        let json = serde_json::to_string(&Category::Historical).unwrap();
        assert_eq!(json, "\"Historical\"");
        let back: Category = serde_json::from_str("\"travel\"").unwrap();
        assert_eq!(back, Category::Travel);
    }
}
