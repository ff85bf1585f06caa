use crate::corrections::{self, Correction};
use crate::error::{DashboardError, DashboardResult};
use crate::models::{OrgTable, TextRow, SURVEY_COLUMNS};

/// Splits raw worksheet rows into the column-key row and data rows.
///
/// Row 0 holds the column keys. `header_rows` further rows are skipped as
/// non-data. Data rows are padded with empty text to the header width, since
/// the remote API trims trailing empty cells.
pub fn split_header(rows: &[Vec<String>], header_rows: usize) -> (Vec<String>, Vec<Vec<String>>) {
    let Some((header, rest)) = rows.split_first() else {
        return (Vec::new(), Vec::new());
    };
    let width = header.len();

    for skipped in rest.iter().take(header_rows) {
        tracing::debug!(row = ?skipped, "skipping header row");
    }

    let data = rest
        .iter()
        .skip(header_rows)
        .map(|row| {
            let mut row = row.clone();
            row.resize(width.max(row.len()), String::new());
            row
        })
        .collect();

    (header.clone(), data)
}

fn missing_if_blank(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Renames the survey columns to their canonical names, applies the
/// correction list, then turns blank cells into missing values.
pub fn survey_table(
    rows: &[Vec<String>],
    header_rows: usize,
    corrections: &[Correction],
) -> DashboardResult<Vec<TextRow>> {
    let (header, data) = split_header(rows, header_rows);
    if header.len() != SURVEY_COLUMNS.len() {
        return Err(DashboardError::Schema {
            expected: SURVEY_COLUMNS.len(),
            found: header.len(),
        });
    }

    let mut text_rows: Vec<TextRow> = data
        .into_iter()
        .map(|row| {
            let mut cells = row.into_iter();
            std::array::from_fn(|_| Some(cells.next().unwrap_or_default()))
        })
        .collect();

    corrections::apply(&mut text_rows, corrections);

    for row in text_rows.iter_mut() {
        for cell in row.iter_mut() {
            *cell = cell.take().and_then(missing_if_blank);
        }
    }

    Ok(text_rows)
}

pub fn org_table(rows: &[Vec<String>], header_rows: usize) -> OrgTable {
    let (headers, data) = split_header(rows, header_rows);
    OrgTable {
        headers,
        rows: data
            .into_iter()
            .map(|row| row.into_iter().map(missing_if_blank).collect())
            .collect(),
    }
}
