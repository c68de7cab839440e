use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle the store assigns to every inserted entry. Two items with equal
/// attributes still get distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub(crate) u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TodoItem {
    pub short_description: String,
    #[serde(default)]
    pub details: String,
    pub deadline: NaiveDate,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ItemError {
    #[error("short description is required")]
    MissingDescription,
    #[error("invalid deadline (use YYYY-MM-DD): {0}")]
    InvalidDeadline(String),
}

impl TodoItem {
    pub fn new(
        short_description: impl Into<String>,
        details: impl Into<String>,
        deadline: NaiveDate,
    ) -> Result<Self, ItemError> {
        let short_description = short_description.into().trim().to_string();
        if short_description.is_empty() {
            return Err(ItemError::MissingDescription);
        }
        Ok(TodoItem {
            short_description,
            details: details.into(),
            deadline,
        })
    }

    /// Deadline as shown in the detail pane, e.g. "April 25, 2022".
    pub fn long_deadline(&self) -> String {
        format_long_date(self.deadline)
    }

    pub fn validate(&self) -> Result<(), ItemError> {
        if self.short_description.trim().is_empty() {
            return Err(ItemError::MissingDescription);
        }
        Ok(())
    }
}

pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

pub fn parse_deadline(raw: &str) -> Result<NaiveDate, ItemError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ItemError::InvalidDeadline(raw.trim().to_string()))
}
