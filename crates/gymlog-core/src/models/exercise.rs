use serde::{Deserialize, Serialize};

#[cfg(feature = "ts")]
use ts_rs::TS;

use crate::utils::format_sets;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct Exercise {
    pub id: i64,
    pub name: String,
    pub series: u32,
    pub repetitions: u32,
    pub group: String,
    /// Demo animation file name, served under `/exercise/demo/`
    #[serde(default)]
    pub demo: String,
    /// Thumbnail file name, served under `/exercise/thumb/`
    #[serde(default)]
    pub thumb: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Exercise {
    /// "3 sets x 12 reps"
    pub fn sets_display(&self) -> String {
        format_sets(self.series, self.repetitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exercise() {
        let json = r#"{"id": 1, "name": "Puxada frontal", "series": 3, "repetitions": 12, "group": "costas", "demo": "puxada_frontal.gif", "thumb": "puxada_frontal.png", "created_at": "2023-01-10 12:00:00", "updated_at": "2023-01-10 12:00:00"}"#;
        let exercise: Exercise = serde_json::from_str(json).expect("Failed to parse exercise JSON");
        assert_eq!(exercise.id, 1);
        assert_eq!(exercise.group, "costas");
        assert_eq!(exercise.thumb, "puxada_frontal.png");
        assert_eq!(exercise.sets_display(), "3 sets x 12 reps");
    }

    #[test]
    fn test_parse_exercise_without_media() {
        let json = r#"{"id": 2, "name": "Remada", "series": 4, "repetitions": 10, "group": "costas"}"#;
        let exercise: Exercise = serde_json::from_str(json).expect("Failed to parse exercise JSON");
        assert!(exercise.demo.is_empty());
        assert!(exercise.created_at.is_none());
    }
}
