use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[cfg(feature = "ts")]
use ts_rs::TS;

/// A single logged workout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct HistoryEntry {
    pub id: i64,
    pub name: String,
    pub group: String,
    /// Time of day the exercise was logged, "HH:MM"
    pub hour: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl HistoryEntry {
    /// When the entry was logged, if the server sent a parseable timestamp
    pub fn logged_at(&self) -> Option<NaiveDateTime> {
        let raw = self.created_at.as_deref()?;
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.fZ"))
            .ok()
    }
}

/// Section of `GET /history`: all entries logged on one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct HistoryByDay {
    pub title: String,
    pub data: Vec<HistoryEntry>,
}

impl HistoryByDay {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
