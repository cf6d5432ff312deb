use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{DayData, PostureCategory, PostureSession};

/// Per-day row of a report summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub label: String,
    pub sessions: usize,
    pub total_hours: f64,
    pub average_quality: f64,
    pub hours_by_category: BTreeMap<PostureCategory, f64>,
}

impl From<&DayData> for DaySummary {
    fn from(day: &DayData) -> Self {
        DaySummary {
            label: day.label.clone(),
            sessions: day.sessions.len(),
            total_hours: day.total_hours(),
            average_quality: day.average_quality(),
            hours_by_category: day.hours_by_category(),
        }
    }
}

/// Snapshot of every report statistic for one reporting cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub generated_at: DateTime<Utc>,
    pub total_sessions: usize,
    pub total_hours: f64,
    pub average_quality: f64,
    pub category_counts: BTreeMap<PostureCategory, usize>,
    pub hours_by_category: BTreeMap<PostureCategory, f64>,
    pub best_day: Option<String>,
    pub worst_day: Option<String>,
    pub days: Vec<DaySummary>,
}

/// Report statistics over a collection of days
///
/// Every function is pure and total: an empty input yields zeroes or `None`,
/// never an error.
pub struct SessionAggregator;

impl SessionAggregator {
    fn sessions(days: &[DayData]) -> impl Iterator<Item = &PostureSession> {
        days.iter().flat_map(|day| day.sessions.iter())
    }

    pub fn total_sessions(days: &[DayData]) -> usize {
        days.iter().map(|day| day.sessions.len()).sum()
    }

    pub fn total_hours(days: &[DayData]) -> f64 {
        Self::sessions(days).map(PostureSession::duration_hours).sum()
    }

    /// Duration-weighted mean quality over every session of every day
    pub fn average_quality(days: &[DayData]) -> f64 {
        let total_hours = Self::total_hours(days);
        if total_hours <= 0.0 {
            return 0.0;
        }
        let weighted: f64 = Self::sessions(days).map(PostureSession::weighted_quality).sum();
        weighted / total_hours
    }

    /// Session count per category; all three categories are always present
    pub fn category_counts(days: &[DayData]) -> BTreeMap<PostureCategory, usize> {
        let mut counts: BTreeMap<PostureCategory, usize> =
            PostureCategory::ALL.iter().map(|category| (*category, 0)).collect();

        for session in Self::sessions(days) {
            *counts.entry(session.category()).or_insert(0) += 1;
        }

        counts
    }

    pub fn hours_by_category(days: &[DayData]) -> BTreeMap<PostureCategory, f64> {
        PostureCategory::ALL
            .iter()
            .map(|category| {
                let hours = days.iter().map(|day| day.hours_for(*category)).sum();
                (*category, hours)
            })
            .collect()
    }

    /// Day with the highest average quality; ties go to the earliest day
    pub fn best_day(days: &[DayData]) -> Option<&DayData> {
        Self::pick_day(days, |candidate, current| candidate > current)
    }

    /// Day with the lowest average quality; ties go to the earliest day
    pub fn worst_day(days: &[DayData]) -> Option<&DayData> {
        Self::pick_day(days, |candidate, current| candidate < current)
    }

    fn pick_day(days: &[DayData], replaces: impl Fn(f64, f64) -> bool) -> Option<&DayData> {
        let mut iter = days.iter();
        let first = iter.next()?;

        let (picked, _) = iter.fold((first, first.average_quality()), |(current, quality), day| {
            let candidate = day.average_quality();
            if replaces(candidate, quality) {
                (day, candidate)
            } else {
                (current, quality)
            }
        });

        Some(picked)
    }

    /// Map a normalized horizontal position (0..=1) onto a day
    ///
    /// The index is `floor(position * days)`, clamped into range, so a tap on
    /// the far right edge selects the last day. Non-finite positions select
    /// the first day.
    pub fn select_day_at_position(days: &[DayData], relative_position: f64) -> Option<&DayData> {
        if days.is_empty() {
            return None;
        }

        let position = if relative_position.is_finite() {
            relative_position
        } else {
            0.0
        };
        let raw = (position * days.len() as f64).floor();
        let index = if raw <= 0.0 {
            0
        } else {
            (raw as usize).min(days.len() - 1)
        };

        days.get(index)
    }

    /// Collect every statistic into one serializable report
    pub fn summarize(days: &[DayData]) -> ReportSummary {
        ReportSummary {
            generated_at: Utc::now(),
            total_sessions: Self::total_sessions(days),
            total_hours: Self::total_hours(days),
            average_quality: Self::average_quality(days),
            category_counts: Self::category_counts(days),
            hours_by_category: Self::hours_by_category(days),
            best_day: Self::best_day(days).map(|day| day.label.clone()),
            worst_day: Self::worst_day(days).map(|day| day.label.clone()),
            days: days.iter().map(DaySummary::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn session(quality: u8, hours: f64) -> PostureSession {
        let start = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let end = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        PostureSession::new(start, end, hours, quality).unwrap()
    }

    fn day(label: &str, sessions: &[(u8, f64)]) -> DayData {
        DayData::new(
            label,
            sessions.iter().map(|(q, h)| session(*q, *h)).collect(),
        )
    }

    fn week() -> Vec<DayData> {
        vec![
            day("Monday", &[(88, 1.5), (65, 1.5), (45, 1.5)]),
            day("Tuesday", &[(92, 1.0), (89, 2.0), (75, 1.0)]),
            day("Wednesday", &[(52, 1.0), (62, 2.0), (91, 3.0)]),
            day("Thursday", &[(78, 2.0), (81, 2.0), (55, 1.0)]),
            day("Friday", &[(90, 2.0), (48, 1.0), (72, 3.0)]),
        ]
    }

    #[test]
    fn test_totals() {
        let days = week();

        assert_eq!(SessionAggregator::total_sessions(&days), 15);
        assert!((SessionAggregator::total_hours(&days) - 25.5).abs() < 1e-9);

        let expected = days
            .iter()
            .flat_map(|d| d.sessions.iter())
            .map(|s| f64::from(s.avg_quality()) * s.duration_hours())
            .sum::<f64>()
            / 25.5;
        assert!((SessionAggregator::average_quality(&days) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_average_is_weighted_over_collection() {
        // Per-day averages are 90 and 50; weighting by hours gives 80
        let days = vec![day("A", &[(90, 3.0)]), day("B", &[(50, 1.0)])];
        assert!((SessionAggregator::average_quality(&days) - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_category_counts_include_every_key() {
        let days = vec![day("A", &[(85, 1.0), (95, 1.0)]), day("B", &[(70, 1.0)])];
        let counts = SessionAggregator::category_counts(&days);

        assert_eq!(counts.len(), 3);
        assert_eq!(counts[&PostureCategory::Good], 2);
        assert_eq!(counts[&PostureCategory::Medium], 1);
        assert_eq!(counts[&PostureCategory::Bad], 0);
    }

    #[test]
    fn test_best_and_worst_day() {
        let days = week();

        assert_eq!(SessionAggregator::best_day(&days).unwrap().label, "Tuesday");
        assert_eq!(SessionAggregator::worst_day(&days).unwrap().label, "Monday");
    }

    #[test]
    fn test_ties_resolve_to_first_day() {
        let days = vec![
            day("First", &[(70, 1.0)]),
            day("Second", &[(70, 2.0)]),
            day("Third", &[(70, 0.5)]),
        ];

        assert_eq!(SessionAggregator::best_day(&days).unwrap().label, "First");
        assert_eq!(SessionAggregator::worst_day(&days).unwrap().label, "First");
    }

    #[test]
    fn test_empty_collection() {
        let days: Vec<DayData> = Vec::new();

        assert_eq!(SessionAggregator::total_sessions(&days), 0);
        assert_eq!(SessionAggregator::total_hours(&days), 0.0);
        assert_eq!(SessionAggregator::average_quality(&days), 0.0);
        assert!(SessionAggregator::best_day(&days).is_none());
        assert!(SessionAggregator::worst_day(&days).is_none());
        assert!(SessionAggregator::select_day_at_position(&days, 0.5).is_none());
        assert!(SessionAggregator::category_counts(&days).values().all(|c| *c == 0));
    }

    #[test]
    fn test_days_without_sessions_average_zero() {
        let days = vec![DayData::new("Idle", Vec::new())];

        assert_eq!(SessionAggregator::average_quality(&days), 0.0);
        assert_eq!(SessionAggregator::worst_day(&days).unwrap().label, "Idle");
    }

    #[test]
    fn test_select_day_at_position() {
        let days = week();
        let label = |p: f64| {
            SessionAggregator::select_day_at_position(&days, p)
                .unwrap()
                .label
                .clone()
        };

        assert_eq!(label(0.0), "Monday");
        assert_eq!(label(0.999), "Friday");
        assert_eq!(label(1.0), "Friday");
        assert_eq!(label(0.2), "Tuesday");
        assert_eq!(label(0.39), "Tuesday");
        assert_eq!(label(-0.3), "Monday");
        assert_eq!(label(7.5), "Friday");
        assert_eq!(label(f64::NAN), "Monday");
    }

    #[test]
    fn test_summarize() {
        let days = week();
        let summary = SessionAggregator::summarize(&days);

        assert_eq!(summary.total_sessions, 15);
        assert_eq!(summary.best_day.as_deref(), Some("Tuesday"));
        assert_eq!(summary.worst_day.as_deref(), Some("Monday"));
        assert_eq!(summary.days.len(), 5);
        assert_eq!(summary.days[2].sessions, 3);

        let hours: f64 = summary.hours_by_category.values().sum();
        assert!((hours - summary.total_hours).abs() < 1e-9);
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_selection_always_in_bounds(count in 1usize..12, position in -2.0f64..3.0f64) {
            let days: Vec<DayData> = (0..count)
                .map(|i| DayData::new(format!("Day {}", i), Vec::new()))
                .collect();

            let selected = SessionAggregator::select_day_at_position(&days, position).unwrap();
            let index = days.iter().position(|d| d.id == selected.id).unwrap();

            let expected = ((position * count as f64).floor().max(0.0) as usize).min(count - 1);
            prop_assert_eq!(index, expected);
        }
    }
}
