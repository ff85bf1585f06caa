use std::fmt::Write;

use crate::aggregate::{self, AggregatedSeries, Cadence, Selection};
use crate::charts;
use crate::dataset::Dataset;
use crate::dimensions::Grouping;
use crate::error::{DashboardError, DashboardResult};

pub const SELECT_MORE: &str = "Select more survey types or a different survey question.";

const INTRO: &str = "How do partners feel about the work? Explore either by individual questions, \
or across similar categories, breaking down main themes, such as the clarity in team communication, \
how well the team is preparing partners for success, or through simple evaluative metrics such as \
whether they found the work valuable or would recommend it to others. Explore change over time and \
where things are headed. For aggregated categories, explore correlation between the different survey questions.";

const STAFF_INTRO: &str = "How are staff being utilized? Is there a relationship between how many \
staff are used, and the likelihood that participants will recommend this to others?";

const STYLE: &str = "body{margin:0;font-family:sans-serif;display:flex}\
aside{width:280px;padding:16px;background:#f0f2f6;min-height:100vh}\
main{flex:1;padding:16px 32px}\
.columns{display:grid;grid-template-columns:1fr 1fr;gap:16px}\
.caption{color:#666;font-size:0.85em}\
.prompt{padding:16px;background:#fff8e1}\
fieldset{border:none;padding:0;margin:8px 0}";

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn checked(on: bool) -> &'static str {
    if on {
        " checked"
    } else {
        ""
    }
}

fn selected(on: bool) -> &'static str {
    if on {
        " selected"
    } else {
        ""
    }
}

fn render_sidebar(output: &mut String, survey_types: &[String], selection: &Selection) {
    let grouping = if selection.dimension.is_aggregate {
        Grouping::Aggregate
    } else {
        Grouping::Direct
    };

    let _ = writeln!(output, "<aside><form method=\"get\" action=\"/\">");
    let _ = writeln!(output, "<label for=\"types\">Survey Type</label>");
    let _ = writeln!(output, "<select id=\"types\" name=\"types\" multiple size=\"6\">");
    for survey_type in survey_types {
        let _ = writeln!(
            output,
            "<option value=\"{0}\"{1}>{0}</option>",
            escape_html(survey_type),
            selected(selection.survey_types.contains(survey_type))
        );
    }
    let _ = writeln!(output, "</select>");
    let _ = writeln!(output, "<p class=\"caption\">Filter by different survey types. Default: all</p><hr>");
    let _ = writeln!(
        output,
        "<p class=\"caption\">Select options for viewing, either inspecting each survey category, \
         or aggregating them across thematic collections.</p>"
    );

    let _ = writeln!(output, "<label for=\"grouping\">Aggregate?</label>");
    let _ = writeln!(
        output,
        "<select id=\"grouping\" name=\"grouping\" onchange=\"this.form.submit()\">"
    );
    for option in Grouping::ALL {
        let _ = writeln!(
            output,
            "<option value=\"{}\"{}>{}</option>",
            option.key(),
            selected(option == grouping),
            option.label()
        );
    }
    let _ = writeln!(output, "</select>");

    let _ = writeln!(output, "<fieldset><legend>Choose Option</legend>");
    for spec in grouping.options() {
        let _ = writeln!(
            output,
            "<label><input type=\"radio\" name=\"option\" value=\"{0}\"{1}> {0}</label><br>",
            escape_html(spec.name),
            checked(spec.name == selection.dimension.name)
        );
    }
    let _ = writeln!(output, "</fieldset><hr>");

    let _ = writeln!(output, "<fieldset><legend>Sampling Rate</legend>");
    for cadence in Cadence::ALL {
        let _ = writeln!(
            output,
            "<label><input type=\"radio\" name=\"cadence\" value=\"{}\"{}> {}</label><br>",
            cadence.key(),
            checked(cadence == selection.cadence),
            cadence.label()
        );
    }
    let _ = writeln!(output, "</fieldset>");
    let _ = writeln!(output, "<button type=\"submit\">Apply</button>");
    let _ = writeln!(output, "</form></aside>");
}

/// Renders the whole dashboard page for one selection.
pub fn build_page(dataset: &Dataset, selection: &Selection) -> DashboardResult<String> {
    let survey_types = aggregate::survey_types(&dataset.surveys);
    let trend = match aggregate::aggregate(&dataset.surveys, selection) {
        Ok(series) => Some(series),
        Err(DashboardError::EmptySelection) => None,
        Err(err) => return Err(err),
    };

    let mut output = String::new();
    let _ = writeln!(output, "<!DOCTYPE html>");
    let _ = writeln!(output, "<html lang=\"en\"><head><meta charset=\"UTF-8\">");
    let _ = writeln!(output, "<title>Survey Pulse</title><style>{STYLE}</style></head><body>");

    render_sidebar(&mut output, &survey_types, selection);

    let _ = writeln!(output, "<main>");
    let _ = writeln!(output, "<p>{}</p>", INTRO);
    let _ = writeln!(output, "<div class=\"columns\">");

    match &trend {
        Some(series) => {
            let chart = charts::trend_chart(series, aggregate::trend_line(series))?;
            let _ = writeln!(output, "<div>{chart}</div>");
            if selection.dimension.is_aggregate {
                let heatmap = charts::correlation_heatmap(&aggregate::correlation(series))?;
                let _ = writeln!(output, "<div>{heatmap}</div>");
            } else {
                let _ = writeln!(output, "<div></div>");
            }
        }
        None => {
            let _ = writeln!(output, "<div class=\"prompt\">{SELECT_MORE}</div><div></div>");
        }
    }
    let _ = writeln!(output, "</div><hr>");

    let _ = writeln!(output, "<p>{}</p>", STAFF_INTRO);
    let histogram = charts::staff_histogram(&aggregate::staff_histogram(&dataset.surveys))?;
    let recommend = charts::recommend_by_staff(&aggregate::recommend_by_staff(&dataset.surveys))?;
    let _ = writeln!(output, "<div class=\"columns\">");
    let _ = writeln!(output, "<div>{histogram}</div><div>{recommend}</div>");
    let _ = writeln!(output, "</div><hr>");

    let _ = writeln!(
        output,
        "<p class=\"caption\">{} responses, {} organizations, {} unrecognized responses. Data fetched {}.</p>",
        dataset.surveys.len(),
        dataset.orgs.rows.len(),
        dataset.warnings.len(),
        dataset.fetched_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output, "</main></body></html>");

    Ok(output)
}

/// Plain-text table of an aggregated series, one period per line.
pub fn series_table(series: &AggregatedSeries) -> String {
    let mut output = String::new();
    let _ = write!(output, "{:<12}", "period");
    for field in &series.fields {
        let _ = write!(output, " {:>14}", field.column());
    }
    let _ = writeln!(output, " {:>8}", "Mean");

    for period in &series.periods {
        let _ = write!(output, "{:<12}", period.end.to_string());
        for value in &period.values {
            match value {
                Some(value) => {
                    let _ = write!(output, " {:>14.2}", value);
                }
                None => {
                    let _ = write!(output, " {:>14}", "-");
                }
            }
        }
        let _ = writeln!(output, " {:>8.2}", period.mean);
    }

    output
}
