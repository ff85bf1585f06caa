//! SVG charts for the dashboard page, drawn with plotters.

use std::error::Error;

use chrono::NaiveDate;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::aggregate::{day_number, AggregatedSeries, CorrelationMatrix, StaffRecommend, TrendLine};
use crate::error::{DashboardError, DashboardResult};

pub const CHART_SIZE: (u32, u32) = (640, 420);

const MISSING: RGBColor = RGBColor(210, 210, 210);
const BAR: RGBColor = RGBColor(99, 110, 250);

type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;
type DrawResult = Result<(), Box<dyn Error>>;

fn render_error(err: impl std::fmt::Display) -> DashboardError {
    DashboardError::Render(err.to_string())
}

fn render_svg<F>(draw: F) -> DashboardResult<String>
where
    F: FnOnce(&Area<'_>) -> DrawResult,
{
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;
        draw(&root).map_err(render_error)?;
        root.present().map_err(render_error)?;
    }
    Ok(svg)
}

fn padded(lo: f64, hi: f64, pad: f64) -> (f64, f64) {
    if hi - lo < f64::EPSILON {
        (lo - pad, hi + pad)
    } else {
        (lo, hi)
    }
}

fn day_label(day: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(day.round() as i32)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Mean per period as a line, with the least-squares fit in red.
pub fn trend_chart(series: &AggregatedSeries, fit: Option<TrendLine>) -> DashboardResult<String> {
    let points: Vec<(f64, f64)> = series
        .periods
        .iter()
        .map(|period| (day_number(period.end), period.mean))
        .collect();
    let (x_lo, x_hi) = padded(
        points.iter().map(|(x, _)| *x).fold(f64::INFINITY, f64::min),
        points.iter().map(|(x, _)| *x).fold(f64::NEG_INFINITY, f64::max),
        7.0,
    );
    let y_lo = points.iter().map(|(_, y)| *y).fold(f64::INFINITY, f64::min);
    let y_hi = points.iter().map(|(_, y)| *y).fold(f64::NEG_INFINITY, f64::max);
    let (y_lo, y_hi) = ((y_lo - 0.5).max(0.0), y_hi + 0.5);
    let caption = format!("{} ({})", series.dimension, series.cadence.label());

    render_svg(|root| {
        let mut chart = ChartBuilder::on(root)
            .caption(caption, ("sans-serif", 20).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

        chart
            .configure_mesh()
            .x_labels(6)
            .x_label_formatter(&|x: &f64| day_label(*x))
            .x_desc("Period ending")
            .y_desc("Mean")
            .draw()?;

        chart.draw_series(LineSeries::new(points.iter().copied(), &BLUE))?;
        chart.draw_series(
            points
                .iter()
                .map(|&point| Circle::new(point, 3, BLUE.filled())),
        )?;
        if let Some(line) = fit {
            chart.draw_series(LineSeries::new(
                [(x_lo, line.at(x_lo)), (x_hi, line.at(x_hi))],
                &RED,
            ))?;
        }
        Ok(())
    })
}

/// Diverging blue-white-red scale over [-1, 1].
fn correlation_color(value: Option<f64>) -> RGBColor {
    let Some(value) = value else {
        return MISSING;
    };
    let strength = value.abs().min(1.0);
    let fade = (255.0 * (1.0 - strength)) as u8;
    if value >= 0.0 {
        RGBColor(255, fade, fade)
    } else {
        RGBColor(fade, fade, 255)
    }
}

/// One cell per field pair, annotated with the coefficient.
pub fn correlation_heatmap(matrix: &CorrelationMatrix) -> DashboardResult<String> {
    let size = matrix.fields.len() as i32;
    let labels: Vec<&str> = matrix.fields.iter().map(|field| field.column()).collect();
    let label_of = |value: &SegmentValue<i32>| match value {
        SegmentValue::CenterOf(index) => labels
            .get(*index as usize)
            .map(|label| label.to_string())
            .unwrap_or_default(),
        _ => String::new(),
    };

    render_svg(|root| {
        let mut chart = ChartBuilder::on(root)
            .caption("Correlation between questions", ("sans-serif", 20).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(110)
            .build_cartesian_2d((0..size - 1).into_segmented(), (0..size - 1).into_segmented())?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(labels.len())
            .y_labels(labels.len())
            .x_label_formatter(&label_of)
            .y_label_formatter(&label_of)
            .draw()?;

        let cells: Vec<(i32, i32, Option<f64>)> = matrix
            .values
            .iter()
            .zip(0..)
            .flat_map(|(row, y)| row.iter().zip(0..).map(move |(value, x)| (x, y, *value)))
            .collect();

        chart.draw_series(cells.iter().map(|&(x, y, value)| {
            Rectangle::new(
                [
                    (SegmentValue::Exact(x), SegmentValue::Exact(y)),
                    (SegmentValue::Exact(x + 1), SegmentValue::Exact(y + 1)),
                ],
                correlation_color(value).filled(),
            )
        }))?;

        let centered = TextStyle::from(("sans-serif", 14).into_font()).pos(Pos::new(HPos::Center, VPos::Center));
        chart.draw_series(cells.iter().map(|&(x, y, value)| {
            let text = value.map(|r| format!("{r:.2}")).unwrap_or_else(|| "n/a".to_string());
            Text::new(
                text,
                (SegmentValue::CenterOf(x), SegmentValue::CenterOf(y)),
                centered.clone(),
            )
        }))?;
        Ok(())
    })
}

// Integer segments are inclusive of both ends, hence the `- 1` on each axis.
fn bar_chart(caption: &str, x_desc: &str, y_desc: &str, bars: &[(u32, f64)], y_hi: f64) -> DashboardResult<String> {
    let slots = bars.iter().map(|(x, _)| x + 1).max().unwrap_or(1).max(5);

    render_svg(|root| {
        let mut chart = ChartBuilder::on(root)
            .caption(caption, ("sans-serif", 20).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d((0..slots - 1).into_segmented(), 0.0..y_hi)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(slots as usize)
            .x_label_formatter(&|value: &SegmentValue<u32>| match value {
                SegmentValue::CenterOf(x) => x.to_string(),
                _ => String::new(),
            })
            .x_desc(x_desc)
            .y_desc(y_desc)
            .draw()?;

        chart.draw_series(bars.iter().map(|&(x, y)| {
            let mut bar = Rectangle::new(
                [(SegmentValue::Exact(x), 0.0), (SegmentValue::Exact(x + 1), y)],
                BAR.filled(),
            );
            bar.set_margin(0, 0, 6, 6);
            bar
        }))?;
        Ok(())
    })
}

pub fn staff_histogram(counts: &[usize; 5]) -> DashboardResult<String> {
    let bars: Vec<(u32, f64)> = counts
        .iter()
        .zip(0u32..)
        .map(|(count, staff)| (staff, *count as f64))
        .collect();
    let y_hi = bars.iter().map(|(_, y)| *y).fold(0.0, f64::max) * 1.1 + 1.0;
    bar_chart(
        "Count per number of staff facilitating",
        "Number of Facilitators",
        "count",
        &bars,
        y_hi,
    )
}

pub fn recommend_by_staff(groups: &[StaffRecommend]) -> DashboardResult<String> {
    let bars: Vec<(u32, f64)> = groups
        .iter()
        .filter_map(|group| Some((u32::from(group.staff_count), group.mean_recommend?)))
        .collect();
    bar_chart(
        "Likelihood to Recommend (mean) vs. Number of Facilitators",
        "Number of Facilitators",
        "Likelihood to Recommend (mean)",
        &bars,
        7.5,
    )
}
