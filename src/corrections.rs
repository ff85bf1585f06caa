use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::{DashboardError, DashboardResult};
use crate::models::{column_index, TextRow, SID_COL, SURVEY_COLUMNS};

/// A known data-entry fix: set `field` to `value` on the row with this SID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    pub sid: String,
    pub column: usize,
    pub value: String,
}

impl Correction {
    pub fn new(sid: &str, field: &str, value: &str) -> DashboardResult<Self> {
        let column = column_index(field).ok_or_else(|| {
            DashboardError::Config(format!("correction for {sid} names unknown field {field:?}"))
        })?;
        if column == SID_COL {
            return Err(DashboardError::Config(format!(
                "correction for {sid} may not rewrite the SID"
            )));
        }
        Ok(Self {
            sid: sid.to_string(),
            column,
            value: value.to_string(),
        })
    }

    pub fn field(&self) -> &'static str {
        SURVEY_COLUMNS[self.column]
    }
}

pub fn load_csv(path: &Path) -> DashboardResult<Vec<Correction>> {
    let file = std::fs::File::open(path).map_err(|err| {
        DashboardError::Config(format!("cannot open corrections {}: {err}", path.display()))
    })?;
    read_csv(file)
}

/// Loads the configured correction list. Without one, rows whose Date cell
/// holds something other than a date fail the load, so say so up front.
pub fn load_optional(path: Option<&Path>) -> DashboardResult<Vec<Correction>> {
    match path {
        Some(path) => load_csv(path),
        None => {
            tracing::warn!(
                "no corrections file configured; rows with a non-date in the Date column \
                 will fail the load until they are listed in --corrections"
            );
            Ok(Vec::new())
        }
    }
}

pub fn read_csv<R: Read>(input: R) -> DashboardResult<Vec<Correction>> {
    #[derive(Deserialize)]
    struct CsvRow {
        sid: String,
        field: String,
        value: String,
    }

    let mut reader = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .trim(csv::Trim::Headers)
        .from_reader(input);
    let mut corrections = Vec::new();

    for result in reader.deserialize::<CsvRow>() {
        let row = result
            .map_err(|err| DashboardError::Config(format!("malformed corrections: {err}")))?;
        corrections.push(Correction::new(row.sid.trim(), row.field.trim(), &row.value)?);
    }

    Ok(corrections)
}

/// Applies corrections in order and returns how many rows each one touched.
pub fn apply(rows: &mut [TextRow], corrections: &[Correction]) -> Vec<usize> {
    corrections
        .iter()
        .map(|correction| {
            let mut touched = 0;
            for row in rows.iter_mut() {
                if row[SID_COL].as_deref() == Some(correction.sid.as_str()) {
                    row[correction.column] = Some(correction.value.clone());
                    touched += 1;
                }
            }
            if touched == 0 {
                tracing::warn!(
                    sid = %correction.sid,
                    field = correction.field(),
                    "correction matched no survey row"
                );
            } else {
                tracing::debug!(
                    sid = %correction.sid,
                    field = correction.field(),
                    "applied correction"
                );
            }
            touched
        })
        .collect()
}
