use colored::*;
use std::fmt::Write;
use tabled::{settings::Style, Table, Tabled};

use crate::aggregator::{DaySummary, ReportSummary};
use crate::error::Result;
use crate::models::PostureCategory;

#[derive(Tabled)]
struct DayRow {
    #[tabled(rename = "Day")]
    day: String,
    #[tabled(rename = "Sessions")]
    sessions: usize,
    #[tabled(rename = "Hours")]
    hours: String,
    #[tabled(rename = "Good")]
    good: String,
    #[tabled(rename = "Medium")]
    medium: String,
    #[tabled(rename = "Bad")]
    bad: String,
    #[tabled(rename = "Quality")]
    quality: String,
}

impl From<&DaySummary> for DayRow {
    fn from(day: &DaySummary) -> Self {
        let hours = |category: PostureCategory| {
            format!(
                "{:.1}h",
                day.hours_by_category.get(&category).copied().unwrap_or(0.0)
            )
        };

        DayRow {
            day: day.label.clone(),
            sessions: day.sessions,
            hours: format!("{:.1}", day.total_hours),
            good: hours(PostureCategory::Good),
            medium: hours(PostureCategory::Medium),
            bad: hours(PostureCategory::Bad),
            quality: format!("{:.0}%", day.average_quality),
        }
    }
}

/// Render a report summary for the terminal
pub fn render_report(summary: &ReportSummary) -> Result<String> {
    let mut out = String::new();

    writeln!(out, "{}", "POSTURE REPORT".bold())?;
    writeln!(
        out,
        "Generated: {}",
        summary.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(out)?;

    if summary.days.is_empty() {
        writeln!(out, "{}", "No sessions recorded".dimmed())?;
        return Ok(out);
    }

    let rows: Vec<DayRow> = summary.days.iter().map(DayRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    writeln!(out, "{}", table)?;
    writeln!(out)?;

    let counts: Vec<String> = PostureCategory::ALL
        .iter()
        .map(|category| {
            let count = summary.category_counts.get(category).copied().unwrap_or(0);
            let label = format!("{}: {} sess.", category, count);
            match category {
                PostureCategory::Good => label.green().to_string(),
                PostureCategory::Medium => label.yellow().to_string(),
                PostureCategory::Bad => label.red().to_string(),
            }
        })
        .collect();
    writeln!(out, "{}", counts.join("   "))?;

    writeln!(out, "Hours:    {:.1}", summary.total_hours)?;
    writeln!(out, "Quality:  {:.1}%", summary.average_quality)?;
    writeln!(out, "Sessions: {}", summary.total_sessions)?;

    if let Some(best) = &summary.best_day {
        writeln!(out, "Best day:  {}", best.green())?;
    }
    if let Some(worst) = &summary.worst_day {
        writeln!(out, "Worst day: {}", worst.red())?;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::SessionAggregator;
    use crate::demo::sample_day;

    #[test]
    fn test_render_contains_statistics() {
        colored::control::set_override(false);

        let days = vec![sample_day("Today").unwrap()];
        let rendered = render_report(&SessionAggregator::summarize(&days)).unwrap();

        assert!(rendered.contains("Today"));
        assert!(rendered.contains("Good: 1 sess."));
        assert!(rendered.contains("Hours:    4.5"));
        assert!(rendered.contains("Quality:  66.7%"));
        assert!(rendered.contains("Best day:  Today"));
    }

    #[test]
    fn test_render_empty_report() {
        colored::control::set_override(false);

        let rendered = render_report(&SessionAggregator::summarize(&[])).unwrap();
        assert!(rendered.contains("No sessions recorded"));
    }
}
