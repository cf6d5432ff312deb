use crate::aggregator::ReportSummary;
use crate::error::Result;

/// Serialize a report summary to pretty-printed JSON
pub fn render_report(summary: &ReportSummary) -> Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}
