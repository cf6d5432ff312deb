use tracing::debug;

use crate::models::{DayData, PostureSession};

/// Collects completed sessions into per-day groups for one reporting cycle
///
/// Days keep the order in which their label was first submitted. A builder
/// is meant to be rebuilt for every cycle; nothing is shared across days.
#[derive(Debug, Default, Clone)]
pub struct ReportBuilder {
    days: Vec<DayData>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from days that were already grouped
    pub fn from_days(days: Vec<DayData>) -> Self {
        ReportBuilder { days }
    }

    /// Add a session to the day with the given label, creating it if needed
    pub fn submit_session(&mut self, session: PostureSession, day_label: &str) -> &mut Self {
        debug!(
            day = day_label,
            quality = session.avg_quality(),
            hours = session.duration_hours(),
            "session submitted"
        );

        match self.days.iter_mut().find(|day| day.label == day_label) {
            Some(day) => day.sessions.push(session),
            None => self.days.push(DayData::new(day_label, vec![session])),
        }
        self
    }

    pub fn days(&self) -> &[DayData] {
        &self.days
    }

    pub fn build(self) -> Vec<DayData> {
        self.days
    }
}
