//! Synthetic session data
//!
//! There is no storage layer for historical sessions; reports are built from
//! generated weeks, the same way the app's report screens are populated.

use chrono::{Duration as ChronoDuration, NaiveTime};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::ingest::ReportBuilder;
use crate::models::{DayData, PostureSession};

/// Days covered by a generated week
pub const WEEKDAYS: [&str; 5] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"];

/// Generates plausible posture sessions
pub struct DemoGenerator {
    rng: StdRng,
}

impl DemoGenerator {
    /// Reproducible generator
    pub fn new(seed: u64) -> Self {
        DemoGenerator {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        DemoGenerator {
            rng: StdRng::from_entropy(),
        }
    }

    /// Monday to Friday, 2-4 sessions a day
    ///
    /// Sessions start on distinct whole hours between 08:00 and 17:00, last
    /// 1-3 hours and score 40-95.
    pub fn week(&mut self) -> Result<Vec<DayData>> {
        let mut builder = ReportBuilder::new();

        for label in WEEKDAYS {
            let session_count = self.rng.gen_range(2..=4);
            let mut start_hours: Vec<u32> = (8..=17).collect();
            start_hours.shuffle(&mut self.rng);

            let mut sessions = start_hours
                .into_iter()
                .take(session_count)
                .map(|hour| self.session_at(hour))
                .collect::<Result<Vec<_>>>()?;
            sessions.sort_by_key(PostureSession::start_time);

            for session in sessions {
                builder.submit_session(session, label);
            }
        }

        Ok(builder.build())
    }

    fn session_at(&mut self, hour: u32) -> Result<PostureSession> {
        let duration_hours: f64 = self.rng.gen_range(1.0..=3.0);
        let quality: u8 = self.rng.gen_range(40..=95);

        let start = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
        let minutes = (duration_hours * 60.0).round() as i64;
        let (end, _) = start.overflowing_add_signed(ChronoDuration::minutes(minutes));

        Ok(PostureSession::new(start, end, duration_hours, quality)?)
    }
}

/// Fixed three-session day: a good morning, a medium afternoon, a bad evening
pub fn sample_day(label: &str) -> Result<DayData> {
    let time = |h: u32, m: u32| NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN);

    Ok(DayData::new(
        label,
        vec![
            PostureSession::new(time(9, 0), time(10, 30), 1.5, 85)?,
            PostureSession::new(time(13, 30), time(15, 0), 1.5, 70)?,
            PostureSession::new(time(16, 0), time(17, 30), 1.5, 45)?,
        ],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostureCategory;

    #[test]
    fn test_week_shape() {
        let days = DemoGenerator::new(7).week().unwrap();

        let labels: Vec<&str> = days.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, WEEKDAYS.to_vec());

        for day in &days {
            assert!((2..=4).contains(&day.sessions.len()));
            for pair in day.sessions.windows(2) {
                assert!(pair[0].start_time() < pair[1].start_time());
            }
            for session in &day.sessions {
                assert!((40..=95).contains(&session.avg_quality()));
                assert!(session.duration_hours() >= 1.0 && session.duration_hours() <= 3.0);
                assert_eq!(
                    session.category(),
                    PostureCategory::from_quality(session.avg_quality())
                );
            }
        }
    }

    #[test]
    fn test_seed_is_reproducible() {
        let first = DemoGenerator::new(42).week().unwrap();
        let second = DemoGenerator::new(42).week().unwrap();

        let qualities = |days: &[DayData]| -> Vec<u8> {
            days.iter()
                .flat_map(|d| d.sessions.iter().map(|s| s.avg_quality()))
                .collect()
        };
        assert_eq!(qualities(&first), qualities(&second));
    }

    #[test]
    fn test_sample_day() {
        let day = sample_day("Today").unwrap();

        assert_eq!(day.sessions.len(), 3);
        assert!((day.average_quality() - 66.666).abs() < 0.01);
    }
}
