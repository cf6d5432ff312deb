//! Posture evaluation and alert debouncing
//!
//! [`PostureMonitor`] is a plain state machine: every input returns the new
//! settled state together with the alert (if any) that the host should hand
//! to its delivery collaborator. It never blocks and never sleeps; the
//! suppression window is a timestamp comparison against the last alert.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{PoseGuardError, Result};
use crate::models::{AlertEvent, AlertKind, OrientationSample, PostureState};

/// Upper bound for the suppression window and the notification lead
pub const MAX_DELAY_SECS: f64 = 86_400.0;

/// Monitor tuning, loaded from the `[monitor]` table of the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Maximum absolute roll or pitch still considered correct (default: 15)
    pub threshold_angle_degrees: f64,

    /// Minimum seconds between two consecutive posture alerts (default: 5)
    pub alert_suppression_secs: f64,

    /// Delay applied by the delivery path before an alert is shown (default: 7)
    pub notification_lead_secs: f64,

    /// Also alert when posture returns to correct (off by default)
    pub notify_on_recovery: bool,

    /// Title carried by every alert
    pub alert_title: String,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        MonitorSettings {
            threshold_angle_degrees: 15.0,
            alert_suppression_secs: 5.0,
            notification_lead_secs: 7.0,
            notify_on_recovery: false,
            alert_title: "PoseGuard".to_string(),
        }
    }
}

impl MonitorSettings {
    /// Reject values the monitor cannot work with
    pub fn validate(&self) -> Result<()> {
        if !self.threshold_angle_degrees.is_finite() || self.threshold_angle_degrees <= 0.0 {
            return Err(PoseGuardError::Configuration(format!(
                "threshold_angle_degrees must be positive, got {}",
                self.threshold_angle_degrees
            )));
        }
        for (name, value) in [
            ("alert_suppression_secs", self.alert_suppression_secs),
            ("notification_lead_secs", self.notification_lead_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PoseGuardError::Configuration(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
            if value > MAX_DELAY_SECS {
                return Err(PoseGuardError::Configuration(format!(
                    "{} must be at most {} seconds, got {}",
                    name, MAX_DELAY_SECS, value
                )));
            }
        }
        Ok(())
    }

    pub fn suppression_window(&self) -> ChronoDuration {
        let secs = self.alert_suppression_secs.max(0.0).min(MAX_DELAY_SECS);
        ChronoDuration::milliseconds((secs * 1000.0).round() as i64)
    }

    /// Lead delay, clamped into `0..=MAX_DELAY_SECS` for unvalidated settings
    pub fn notification_lead(&self) -> Duration {
        Duration::from_secs_f64(self.notification_lead_secs.max(0.0).min(MAX_DELAY_SECS))
    }
}

/// Outcome of feeding one input into the monitor
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: PostureState,
    pub alert: Option<AlertEvent>,
}

impl Transition {
    fn quiet(state: PostureState) -> Self {
        Transition { state, alert: None }
    }
}

/// Classify a single sample against the angular threshold
pub fn classify(sample: &OrientationSample, threshold_degrees: f64) -> PostureState {
    if sample.roll_degrees.abs() > threshold_degrees || sample.pitch_degrees.abs() > threshold_degrees
    {
        PostureState::Incorrect
    } else {
        PostureState::Correct
    }
}

/// Debounced posture state machine
#[derive(Debug, Clone)]
pub struct PostureMonitor {
    settings: MonitorSettings,
    state: PostureState,
    last_alert_at: Option<DateTime<Utc>>,
}

impl Default for PostureMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl PostureMonitor {
    /// Create a monitor with default settings
    pub fn new() -> Self {
        Self::from_validated(MonitorSettings::default())
    }

    /// Create a monitor with custom settings, rejecting invalid values
    pub fn with_settings(settings: MonitorSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self::from_validated(settings))
    }

    pub(crate) fn from_validated(settings: MonitorSettings) -> Self {
        PostureMonitor {
            settings,
            state: PostureState::NotMonitoring,
            last_alert_at: None,
        }
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    pub fn state(&self) -> &PostureState {
        &self.state
    }

    /// When the last debounced alert fired; survives stop/start cycles
    pub fn last_alert_at(&self) -> Option<DateTime<Utc>> {
        self.last_alert_at
    }

    /// Begin a monitoring session
    ///
    /// Availability is decided here, once. An absent sensor parks the
    /// monitor in `Unavailable` and reports it with a single alert.
    pub fn start(&mut self, sensor_available: bool, at: DateTime<Utc>) -> Transition {
        if !sensor_available {
            warn!("motion sensor unavailable, monitoring not started");
            self.state = PostureState::Unavailable;
            let alert = self.alert(
                AlertKind::SensorUnavailable,
                PostureState::Unavailable.message(),
                at,
            );
            return Transition {
                state: self.state.clone(),
                alert: Some(alert),
            };
        }

        info!(
            threshold = self.settings.threshold_angle_degrees,
            suppression_secs = self.settings.alert_suppression_secs,
            "posture monitoring started"
        );
        self.state = PostureState::Correct;
        Transition::quiet(self.state.clone())
    }

    /// Evaluate one sample; `None` when the sample is dropped because the
    /// monitor is not tracking
    pub fn evaluate(&mut self, sample: &OrientationSample) -> Option<Transition> {
        if !self.state.is_tracking() {
            debug!(state = %self.state, "dropping sample while not tracking");
            return None;
        }

        let next = classify(sample, self.settings.threshold_angle_degrees);
        let previous = std::mem::replace(&mut self.state, next.clone());

        debug!(
            roll = sample.roll_degrees,
            pitch = sample.pitch_degrees,
            state = %next,
            "sample evaluated"
        );
        if previous != next {
            info!(from = %previous, to = %next, "posture state changed");
        }

        let alert = match &next {
            PostureState::Incorrect => {
                self.debounced_alert(AlertKind::BadPosture, "Bad Posture!", sample.timestamp)
            }
            PostureState::Correct
                if self.settings.notify_on_recovery && previous == PostureState::Incorrect =>
            {
                self.debounced_alert(AlertKind::PostureRestored, "Correct Posture!", sample.timestamp)
            }
            _ => None,
        };

        Some(Transition { state: next, alert })
    }

    /// Record a fault reported by the sensor stream
    ///
    /// The tracking-error alert bypasses the suppression window and does not
    /// count as a debounced alert. `Error` is sticky until the next `start`.
    pub fn fault(&mut self, message: impl Into<String>, at: DateTime<Utc>) -> Option<Transition> {
        if !self.state.is_tracking() {
            return None;
        }

        let message = message.into();
        warn!(error = %message, "sensor stream fault");
        self.state = PostureState::Error(message);
        let alert = self.alert(AlertKind::TrackingError, "Tracking error", at);

        Some(Transition {
            state: self.state.clone(),
            alert: Some(alert),
        })
    }

    /// End the monitoring session
    pub fn stop(&mut self) -> Transition {
        if self.state != PostureState::NotMonitoring {
            info!(from = %self.state, "posture monitoring stopped");
        }
        self.state = PostureState::NotMonitoring;
        Transition::quiet(PostureState::NotMonitoring)
    }

    fn debounced_alert(
        &mut self,
        kind: AlertKind,
        message: &str,
        at: DateTime<Utc>,
    ) -> Option<AlertEvent> {
        if let Some(last) = self.last_alert_at {
            if at - last < self.settings.suppression_window() {
                debug!(?kind, "alert suppressed");
                return None;
            }
        }

        self.last_alert_at = Some(at);
        Some(self.alert(kind, message, at))
    }

    fn alert(&self, kind: AlertKind, message: impl Into<String>, at: DateTime<Utc>) -> AlertEvent {
        AlertEvent::new(kind, self.settings.alert_title.clone(), message, at)
    }
}
