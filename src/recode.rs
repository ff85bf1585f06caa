use chrono::{Datelike, NaiveDate, NaiveTime};

use crate::error::{DashboardError, DashboardResult, DataQualityWarning};
use crate::models::{
    RatingField, SurveyRecord, TextRow, DATE_COL, FIRST_RATING_COL, METHOD_COL, SCHOOL_COL,
    SID_COL, STAFF_COLS, SUBMITTER_COL, SYSTEM_COL, TYPE_COL,
};

pub const LIKERT_SCALE: [(&str, u8); 7] = [
    ("Strongly Agree", 7),
    ("Agree", 6),
    ("Somewhat Agree", 5),
    ("Neutral", 4),
    ("Somewhat Disagree", 3),
    ("Disagree", 2),
    ("Strongly Disagree", 1),
];

const DATE_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y-%m-%d"];
const SHORT_YEAR_FORMAT: &str = "%m/%d/%y";
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];
/// `%Y` takes any digit count, so "21" would otherwise land in year 21.
const MIN_YEAR: i32 = 1000;

#[derive(Debug, Clone, Default)]
pub struct Recoded {
    pub records: Vec<SurveyRecord>,
    pub warnings: Vec<DataQualityWarning>,
}

pub fn likert_score(label: &str) -> Option<u8> {
    LIKERT_SCALE
        .iter()
        .find(|(known, _)| *known == label)
        .map(|(_, score)| *score)
}

/// Parses a sheet date, ignoring any time of day that follows it.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let (date_part, time_part) = match value.split_once(char::is_whitespace) {
        Some((date, time)) => (date, time.trim()),
        None => (value, ""),
    };
    if !time_part.is_empty()
        && !TIME_FORMATS
            .iter()
            .any(|format| NaiveTime::parse_from_str(time_part, format).is_ok())
    {
        return None;
    }

    let date = if has_short_year(date_part) {
        NaiveDate::parse_from_str(date_part, SHORT_YEAR_FORMAT).ok()
    } else {
        DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
    }?;
    (date.year() >= MIN_YEAR).then_some(date)
}

fn has_short_year(date: &str) -> bool {
    date.contains('/') && date.rsplit('/').next().is_some_and(|year| year.len() == 2)
}

/// Converts the text table into typed records.
///
/// Ratings outside the Likert vocabulary become missing and are reported as
/// warnings. A date that is present but unparseable fails the whole load.
pub fn recode(rows: Vec<TextRow>) -> DashboardResult<Recoded> {
    let mut recoded = Recoded::default();

    for mut row in rows {
        let sid = row[SID_COL].take();
        let sid_label = sid.clone().unwrap_or_else(|| "<no sid>".to_string());

        let date = match row[DATE_COL].take() {
            None => None,
            Some(raw) => Some(parse_date(&raw).ok_or_else(|| DashboardError::DateParse {
                sid: sid_label.clone(),
                value: raw.clone(),
            })?),
        };

        let mut ratings = [None; 10];
        for field in RatingField::ALL {
            let Some(raw) = row[FIRST_RATING_COL + field.index()].take() else {
                continue;
            };
            match likert_score(&raw) {
                Some(score) => ratings[field.index()] = Some(score),
                None => {
                    let warning = DataQualityWarning {
                        sid: sid_label.clone(),
                        field: field.column(),
                        value: raw,
                    };
                    tracing::warn!("{warning}");
                    recoded.warnings.push(warning);
                }
            }
        }

        recoded.records.push(SurveyRecord {
            sid,
            system: row[SYSTEM_COL].take(),
            school: row[SCHOOL_COL].take(),
            survey_type: row[TYPE_COL].take(),
            method: row[METHOD_COL].take(),
            date,
            staff: STAFF_COLS.map(|column| row[column].take()),
            submitter: row[SUBMITTER_COL].take(),
            ratings,
        });
    }

    Ok(recoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_row(sid: &str, date: Option<&str>, staff: [Option<&str>; 4], ratings: &[&str]) -> TextRow {
        let mut row: TextRow = Default::default();
        row[SID_COL] = Some(sid.to_string());
        row[TYPE_COL] = Some("Workshop".to_string());
        row[DATE_COL] = date.map(str::to_string);
        for (column, name) in STAFF_COLS.iter().zip(staff) {
            row[*column] = name.map(str::to_string);
        }
        for (offset, rating) in ratings.iter().enumerate() {
            row[FIRST_RATING_COL + offset] = Some(rating.to_string());
        }
        row
    }

    #[test]
    fn maps_every_label_to_its_score() {
        let labels: Vec<&str> = LIKERT_SCALE.iter().map(|(label, _)| *label).collect();
        let recoded = recode(vec![text_row("1", None, [None; 4], &labels)]).unwrap();
        assert_eq!(
            &recoded.records[0].ratings[..7],
            &[Some(7), Some(6), Some(5), Some(4), Some(3), Some(2), Some(1)]
        );
        assert!(recoded.warnings.is_empty());
    }

    #[test]
    fn unknown_labels_become_missing_with_warning() {
        let recoded = recode(vec![text_row("9", None, [None; 4], &["Agree", "agree", "5"])]).unwrap();
        let record = &recoded.records[0];
        assert_eq!(record.rating(RatingField::ChangeClarity), Some(6));
        assert_eq!(record.rating(RatingField::RoleClarity), None);
        assert_eq!(record.rating(RatingField::GoalConfident), None);
        assert_eq!(recoded.warnings.len(), 2);
        assert_eq!(recoded.warnings[0].field, "RoleClarity");
        assert_eq!(recoded.warnings[1].value, "5");
    }

    #[test]
    fn ratings_are_scores_or_missing() {
        let rows = vec![
            text_row("1", None, [None; 4], &["Neutral", "Maybe", "Disagree"]),
            text_row("2", None, [None; 4], &["Strongly Agree"]),
        ];
        let recoded = recode(rows).unwrap();
        for record in &recoded.records {
            for rating in record.ratings.iter().flatten() {
                assert!((1..=7).contains(rating));
            }
        }
    }

    #[test]
    fn parses_sheet_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2021, 7, 15);
        assert_eq!(parse_date("7/15/2021"), expected);
        assert_eq!(parse_date("07/15/2021"), expected);
        assert_eq!(parse_date("2021-07-15"), expected);
        assert_eq!(parse_date("7/15/2021 10:33:01"), expected);
        assert_eq!(parse_date("7/15/2021 9:05"), expected);
        assert_eq!(parse_date("7/15/21"), expected);
        assert_eq!(parse_date("7/15/21 9:05:00"), expected);
        assert_eq!(parse_date("Leader Coaching"), None);
    }

    #[test]
    fn rejects_implausible_years_and_times() {
        assert_eq!(parse_date("7/15/0021"), None);
        assert_eq!(parse_date("7/15/215"), None);
        assert_eq!(parse_date("7/15/2021 noon"), None);
        let err = recode(vec![text_row("12", Some("7/15/0021"), [None; 4], &[])]).unwrap_err();
        assert!(matches!(err, DashboardError::DateParse { .. }));
    }

    #[test]
    fn unparseable_date_fails() {
        let err = recode(vec![text_row("41", Some("Leader Coaching"), [None; 4], &[])]).unwrap_err();
        match err {
            DashboardError::DateParse { sid, value } => {
                assert_eq!(sid, "41");
                assert_eq!(value, "Leader Coaching");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn missing_date_stays_missing() {
        let recoded = recode(vec![text_row("3", None, [None; 4], &[])]).unwrap();
        assert_eq!(recoded.records[0].date, None);
    }

    #[test]
    fn staff_count_is_four_minus_missing() {
        let rows = vec![
            text_row("1", None, [None; 4], &[]),
            text_row("2", None, [Some("Ana"), None, None, None], &[]),
            text_row("3", None, [Some("Ana"), Some("Raj"), None, Some("Lee")], &[]),
            text_row("4", None, [Some("Ana"), Some("Raj"), Some("Kim"), Some("Lee")], &[]),
        ];
        let recoded = recode(rows).unwrap();
        let counts: Vec<u8> = recoded.records.iter().map(SurveyRecord::staff_count).collect();
        assert_eq!(counts, vec![0, 1, 3, 4]);
        for record in &recoded.records {
            let missing = record.staff.iter().filter(|name| name.is_none()).count() as u8;
            assert_eq!(record.staff_count(), 4 - missing);
        }
    }
}
