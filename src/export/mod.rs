use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::aggregator::ReportSummary;
use crate::error::Result;

pub mod json;
pub mod text;

/// Report output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Terminal table
    Table,
    /// Pretty-printed JSON
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "text" | "txt" => Ok(ReportFormat::Table),
            "json" => Ok(ReportFormat::Json),
            _ => Err(format!("Unsupported report format: {}", s)),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Table => write!(f, "table"),
            ReportFormat::Json => write!(f, "json"),
        }
    }
}

/// Render a report summary in the requested format
pub fn render(summary: &ReportSummary, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Table => text::render_report(summary),
        ReportFormat::Json => json::render_report(summary),
    }
}

/// Write a rendered report to disk
pub fn export_report<P: AsRef<Path>>(
    summary: &ReportSummary,
    format: ReportFormat,
    output_path: P,
) -> Result<()> {
    let rendered = render(summary, format)?;
    std::fs::write(output_path, rendered)?;
    Ok(())
}
