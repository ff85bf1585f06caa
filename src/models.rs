use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

/// Canonical survey columns, in worksheet order.
pub const SURVEY_COLUMNS: [&str; 21] = [
    "SID",
    "System",
    "School",
    "Type",
    "Method",
    "Date",
    "Primary",
    "Secondary",
    "Tertiary",
    "Quaternary",
    "Submitter",
    "ChangeClarity",
    "RoleClarity",
    "GoalConfident",
    "Equipped",
    "Supported",
    "Understanding",
    "Valuable",
    "WorkClarity",
    "Learned",
    "Recommend",
];

pub const SID_COL: usize = 0;
pub const SYSTEM_COL: usize = 1;
pub const SCHOOL_COL: usize = 2;
pub const TYPE_COL: usize = 3;
pub const METHOD_COL: usize = 4;
pub const DATE_COL: usize = 5;
pub const STAFF_COLS: [usize; 4] = [6, 7, 8, 9];
pub const SUBMITTER_COL: usize = 10;
pub const FIRST_RATING_COL: usize = 11;

pub fn column_index(name: &str) -> Option<usize> {
    SURVEY_COLUMNS.iter().position(|column| *column == name)
}

/// One survey row as text, after renaming and blank-to-missing conversion.
pub type TextRow = [Option<String>; SURVEY_COLUMNS.len()];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum RatingField {
    ChangeClarity,
    RoleClarity,
    GoalConfident,
    Equipped,
    Supported,
    Understanding,
    Valuable,
    WorkClarity,
    Learned,
    Recommend,
}

impl RatingField {
    pub const ALL: [RatingField; 10] = [
        RatingField::ChangeClarity,
        RatingField::RoleClarity,
        RatingField::GoalConfident,
        RatingField::Equipped,
        RatingField::Supported,
        RatingField::Understanding,
        RatingField::Valuable,
        RatingField::WorkClarity,
        RatingField::Learned,
        RatingField::Recommend,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn column(self) -> &'static str {
        SURVEY_COLUMNS[FIRST_RATING_COL + self.index()]
    }
}

impl fmt::Display for RatingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurveyRecord {
    pub sid: Option<String>,
    pub system: Option<String>,
    pub school: Option<String>,
    pub survey_type: Option<String>,
    pub method: Option<String>,
    pub date: Option<NaiveDate>,
    /// Primary, secondary, tertiary and quaternary staff names.
    pub staff: [Option<String>; 4],
    pub submitter: Option<String>,
    pub ratings: [Option<u8>; 10],
}

impl SurveyRecord {
    pub fn rating(&self, field: RatingField) -> Option<u8> {
        self.ratings[field.index()]
    }

    pub fn staff_count(&self) -> u8 {
        self.staff.iter().filter(|name| name.is_some()).count() as u8
    }
}

/// Organization metadata, kept as structured text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrgTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_columns_follow_survey_layout() {
        assert_eq!(RatingField::ChangeClarity.column(), "ChangeClarity");
        assert_eq!(RatingField::Recommend.column(), "Recommend");
        assert_eq!(column_index("Recommend"), Some(20));
        assert_eq!(column_index("Date"), Some(DATE_COL));
    }

    #[test]
    fn staff_count_counts_present_names() {
        let record = SurveyRecord {
            sid: Some("7".to_string()),
            system: None,
            school: None,
            survey_type: None,
            method: None,
            date: None,
            staff: [Some("Ana".to_string()), None, Some("Raj".to_string()), None],
            submitter: None,
            ratings: [None; 10],
        };
        assert_eq!(record.staff_count(), 2);
    }
}
