use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::error::SessionError;

/// Quality score at or above which a session counts as good posture
pub const GOOD_QUALITY_MIN: u8 = 80;

/// Quality score at or above which a session counts as medium posture
pub const MEDIUM_QUALITY_MIN: u8 = 60;

/// Instantaneous orientation reading from the head-worn sensor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationSample {
    /// Roll angle in degrees
    pub roll_degrees: f64,

    /// Pitch angle in degrees
    pub pitch_degrees: f64,

    /// When the sensor produced the reading
    pub timestamp: DateTime<Utc>,
}

impl OrientationSample {
    pub fn new(roll_degrees: f64, pitch_degrees: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            roll_degrees,
            pitch_degrees,
            timestamp,
        }
    }

    /// Build a sample from an attitude reading expressed in radians
    pub fn from_radians(roll: f64, pitch: f64, timestamp: DateTime<Utc>) -> Self {
        Self::new(roll.to_degrees(), pitch.to_degrees(), timestamp)
    }
}

/// Coarse posture classification published by the monitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostureState {
    /// Monitoring is stopped (initial and terminal state)
    NotMonitoring,
    /// Both angles within the threshold
    Correct,
    /// Roll or pitch beyond the threshold
    Incorrect,
    /// Motion capability absent for this monitoring session
    Unavailable,
    /// The sensor stream reported a fault
    Error(String),
}

impl PostureState {
    /// Whether the monitor is consuming samples in this state
    pub fn is_tracking(&self) -> bool {
        matches!(self, PostureState::Correct | PostureState::Incorrect)
    }

    /// Status line shown to the user
    pub fn message(&self) -> String {
        match self {
            PostureState::NotMonitoring => "Not monitoring".to_string(),
            PostureState::Correct => "Correct Posture!".to_string(),
            PostureState::Incorrect => "Warning! Bad Posture!".to_string(),
            PostureState::Unavailable => "Motion sensor not detected or not supported".to_string(),
            PostureState::Error(message) => format!("Error: {}", message),
        }
    }
}

impl fmt::Display for PostureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostureState::NotMonitoring => write!(f, "not-monitoring"),
            PostureState::Correct => write!(f, "correct"),
            PostureState::Incorrect => write!(f, "incorrect"),
            PostureState::Unavailable => write!(f, "unavailable"),
            PostureState::Error(message) => write!(f, "error({})", message),
        }
    }
}

/// Why an alert was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    BadPosture,
    PostureRestored,
    TrackingError,
    SensorUnavailable,
}

/// User-facing notification handed to the delivery collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
    pub fired_at: DateTime<Utc>,
}

impl AlertEvent {
    pub fn new(
        kind: AlertKind,
        title: impl Into<String>,
        message: impl Into<String>,
        fired_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            fired_at,
        }
    }
}

/// Posture quality bucket derived from a 0-100 score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PostureCategory {
    Good,
    Medium,
    Bad,
}

impl PostureCategory {
    /// Every category, in report order
    pub const ALL: [PostureCategory; 3] = [
        PostureCategory::Good,
        PostureCategory::Medium,
        PostureCategory::Bad,
    ];

    /// Map a quality score onto its category
    pub fn from_quality(quality: u8) -> Self {
        if quality >= GOOD_QUALITY_MIN {
            PostureCategory::Good
        } else if quality >= MEDIUM_QUALITY_MIN {
            PostureCategory::Medium
        } else {
            PostureCategory::Bad
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PostureCategory::Good => "Good",
            PostureCategory::Medium => "Medium",
            PostureCategory::Bad => "Bad",
        }
    }
}

impl fmt::Display for PostureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A contiguous interval with one posture-quality score
///
/// The category is always derived from `avg_quality`; sessions can only be
/// built through the validating constructors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostureSession {
    id: Uuid,
    start_time: NaiveTime,
    end_time: NaiveTime,
    duration_hours: f64,
    avg_quality: u8,
    category: PostureCategory,
}

impl PostureSession {
    /// Create a session from explicit times and duration
    pub fn new(
        start_time: NaiveTime,
        end_time: NaiveTime,
        duration_hours: f64,
        avg_quality: u8,
    ) -> Result<Self, SessionError> {
        if !duration_hours.is_finite() || duration_hours <= 0.0 {
            return Err(SessionError::InvalidDuration {
                hours: duration_hours,
            });
        }
        if avg_quality > 100 {
            return Err(SessionError::InvalidQuality {
                value: avg_quality as u32,
            });
        }

        Ok(Self {
            id: Uuid::new_v4(),
            start_time,
            end_time,
            duration_hours,
            avg_quality,
            category: PostureCategory::from_quality(avg_quality),
        })
    }

    /// Create a session whose duration is the gap between two times of day
    pub fn spanning(
        start_time: NaiveTime,
        end_time: NaiveTime,
        avg_quality: u8,
    ) -> Result<Self, SessionError> {
        let seconds = (end_time - start_time).num_seconds();
        Self::new(start_time, end_time, seconds as f64 / 3600.0, avg_quality)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn start_time(&self) -> NaiveTime {
        self.start_time
    }

    pub fn end_time(&self) -> NaiveTime {
        self.end_time
    }

    pub fn duration_hours(&self) -> f64 {
        self.duration_hours
    }

    pub fn avg_quality(&self) -> u8 {
        self.avg_quality
    }

    pub fn category(&self) -> PostureCategory {
        self.category
    }

    /// Quality weighted by duration, the numerator of every average
    pub(crate) fn weighted_quality(&self) -> f64 {
        f64::from(self.avg_quality) * self.duration_hours
    }
}

/// All sessions recorded within one day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayData {
    pub id: Uuid,
    pub label: String,
    pub sessions: Vec<PostureSession>,
}

impl DayData {
    pub fn new(label: impl Into<String>, sessions: Vec<PostureSession>) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            sessions,
        }
    }

    /// Hours spent in each category; every category is present
    pub fn hours_by_category(&self) -> BTreeMap<PostureCategory, f64> {
        PostureCategory::ALL
            .iter()
            .map(|category| (*category, self.hours_for(*category)))
            .collect()
    }

    pub fn hours_for(&self, category: PostureCategory) -> f64 {
        self.sessions_in(category)
            .map(PostureSession::duration_hours)
            .sum()
    }

    pub fn sessions_in(
        &self,
        category: PostureCategory,
    ) -> impl Iterator<Item = &PostureSession> + '_ {
        self.sessions
            .iter()
            .filter(move |session| session.category() == category)
    }

    pub fn total_hours(&self) -> f64 {
        self.sessions.iter().map(PostureSession::duration_hours).sum()
    }

    /// Duration-weighted mean quality, 0 for a day without sessions
    pub fn average_quality(&self) -> f64 {
        if self.sessions.is_empty() {
            return 0.0;
        }
        let weighted: f64 = self.sessions.iter().map(PostureSession::weighted_quality).sum();
        weighted / self.total_hours()
    }
}
