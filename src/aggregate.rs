use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::dimensions::DimensionSpec;
use crate::error::{DashboardError, DashboardResult};
use crate::models::{RatingField, SurveyRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    #[default]
    Weekly,
    Monthly,
    Quarterly,
}

impl Cadence {
    pub const ALL: [Cadence; 3] = [Cadence::Weekly, Cadence::Monthly, Cadence::Quarterly];

    pub fn label(self) -> &'static str {
        match self {
            Cadence::Weekly => "Weekly",
            Cadence::Monthly => "Monthly",
            Cadence::Quarterly => "Quarterly",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Cadence::Weekly => "weekly",
            Cadence::Monthly => "monthly",
            Cadence::Quarterly => "quarterly",
        }
    }

    /// Last day of the period containing `date`: the Sunday closing a
    /// Monday-to-Sunday week, the month's last day, or the quarter's last day.
    pub fn period_end(self, date: NaiveDate) -> NaiveDate {
        match self {
            Cadence::Weekly => {
                let to_sunday = 6 - u64::from(date.weekday().num_days_from_monday());
                date.checked_add_days(Days::new(to_sunday)).unwrap_or(date)
            }
            Cadence::Monthly => month_end(date.year(), date.month()).unwrap_or(date),
            Cadence::Quarterly => {
                let last_month = (date.month0() / 3) * 3 + 3;
                month_end(date.year(), last_month).unwrap_or(date)
            }
        }
    }
}

fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_months(Months::new(1))?
        .checked_sub_days(Days::new(1))
}

/// The user's choices for one render pass.
#[derive(Debug, Clone)]
pub struct Selection {
    /// Empty means every survey type.
    pub survey_types: BTreeSet<String>,
    pub dimension: &'static DimensionSpec,
    pub cadence: Cadence,
}

impl Selection {
    pub fn includes(&self, record: &SurveyRecord) -> bool {
        if self.survey_types.is_empty() {
            return true;
        }
        record
            .survey_type
            .as_ref()
            .is_some_and(|survey_type| self.survey_types.contains(survey_type))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Period {
    pub end: NaiveDate,
    /// Mean of each field, in the order of `AggregatedSeries::fields`.
    pub values: Vec<Option<f64>>,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedSeries {
    pub dimension: &'static str,
    pub cadence: Cadence,
    pub fields: Vec<RatingField>,
    pub periods: Vec<Period>,
}

#[derive(Default, Clone, Copy)]
struct Accumulator {
    total: u32,
    count: u32,
}

impl Accumulator {
    fn mean(self) -> Option<f64> {
        (self.count > 0).then(|| f64::from(self.total) / f64::from(self.count))
    }
}

fn mean_of(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (total, count) = values.fold((0.0, 0usize), |(total, count), value| (total + value, count + 1));
    (count > 0).then(|| total / count as f64)
}

/// Filters, buckets and averages the records for one selection.
///
/// Each record keeps its own date through the filter. Ratings are never
/// below 1, so a period whose combined mean is not positive holds no
/// observations for the chosen fields and is left out.
pub fn aggregate(records: &[SurveyRecord], selection: &Selection) -> DashboardResult<AggregatedSeries> {
    let fields = selection.dimension.fields;
    let mut buckets: BTreeMap<NaiveDate, Vec<Accumulator>> = BTreeMap::new();

    for record in records.iter().filter(|record| selection.includes(record)) {
        let Some(date) = record.date else {
            continue;
        };
        let bucket = buckets
            .entry(selection.cadence.period_end(date))
            .or_insert_with(|| vec![Accumulator::default(); fields.len()]);
        for (slot, field) in bucket.iter_mut().zip(fields) {
            if let Some(score) = record.rating(*field) {
                slot.total += u32::from(score);
                slot.count += 1;
            }
        }
    }

    let periods: Vec<Period> = buckets
        .into_iter()
        .filter_map(|(end, slots)| {
            let values: Vec<Option<f64>> = slots.into_iter().map(Accumulator::mean).collect();
            let mean = mean_of(values.iter().flatten().copied()).unwrap_or(0.0);
            (mean > 0.0).then_some(Period { end, values, mean })
        })
        .collect();

    if periods.is_empty() {
        return Err(DashboardError::EmptySelection);
    }

    Ok(AggregatedSeries {
        dimension: selection.dimension.name,
        cadence: selection.cadence,
        fields: fields.to_vec(),
        periods,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub fields: Vec<RatingField>,
    /// Row-major; `None` where the correlation is undefined.
    pub values: Vec<Vec<Option<f64>>>,
}

pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in pairs {
        covariance += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }

    let denominator = (var_x * var_y).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return None;
    }
    Some((covariance / denominator).clamp(-1.0, 1.0))
}

/// Pairwise-complete Pearson correlation between the series' field columns.
pub fn correlation(series: &AggregatedSeries) -> CorrelationMatrix {
    let width = series.fields.len();
    let values = (0..width)
        .map(|row| {
            (0..width)
                .map(|column| {
                    let pairs: Vec<(f64, f64)> = series
                        .periods
                        .iter()
                        .filter_map(|period| Some((period.values[row]?, period.values[column]?)))
                        .collect();
                    pearson(&pairs)
                })
                .collect()
        })
        .collect();

    CorrelationMatrix {
        fields: series.fields.clone(),
        values,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
}

impl TrendLine {
    pub fn at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Ordinary least squares fit of `y` on `x`.
pub fn ols(points: &[(f64, f64)]) -> Option<TrendLine> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;
    let sxx: f64 = points.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
    if sxx == 0.0 {
        return None;
    }
    let sxy: f64 = points
        .iter()
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum();
    let slope = sxy / sxx;
    Some(TrendLine {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

pub fn day_number(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

pub fn trend_line(series: &AggregatedSeries) -> Option<TrendLine> {
    let points: Vec<(f64, f64)> = series
        .periods
        .iter()
        .map(|period| (day_number(period.end), period.mean))
        .collect();
    ols(&points)
}

/// Row counts per number of facilitating staff, indexed 0..=4.
pub fn staff_histogram(records: &[SurveyRecord]) -> [usize; 5] {
    let mut counts = [0usize; 5];
    for record in records {
        counts[usize::from(record.staff_count())] += 1;
    }
    counts
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StaffRecommend {
    pub staff_count: u8,
    pub mean_recommend: Option<f64>,
}

/// Mean Recommend score per staff count present in the data.
pub fn recommend_by_staff(records: &[SurveyRecord]) -> Vec<StaffRecommend> {
    let mut groups: BTreeMap<u8, Accumulator> = BTreeMap::new();
    for record in records {
        let slot = groups.entry(record.staff_count()).or_default();
        if let Some(score) = record.rating(RatingField::Recommend) {
            slot.total += u32::from(score);
            slot.count += 1;
        }
    }
    groups
        .into_iter()
        .map(|(staff_count, slot)| StaffRecommend {
            staff_count,
            mean_recommend: slot.mean(),
        })
        .collect()
}

/// Distinct survey types in first-seen order.
pub fn survey_types(records: &[SurveyRecord]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    records
        .iter()
        .filter_map(|record| record.survey_type.as_ref())
        .filter(|survey_type| seen.insert(survey_type.as_str()))
        .cloned()
        .collect()
}
