//! Unified error hierarchy for PoseGuard
//!
//! Monitoring failures are surfaced as state plus an alert by the monitor
//! itself; the types here cover the places where an operation genuinely
//! cannot proceed (starting twice, building an invalid session, reading a
//! broken config or replay file).

use thiserror::Error;

/// Top-level error type for all PoseGuard operations
#[derive(Debug, Error)]
pub enum PoseGuardError {
    /// Posture monitoring errors
    #[error("Monitor error: {0}")]
    Monitor(#[from] MonitorError),

    /// Session construction errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Sensor replay parsing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Report serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Report rendering errors
    #[error("Formatting error: {0}")]
    Format(#[from] std::fmt::Error),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised by the monitor service and its sensor collaborator
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Motion capability absent when monitoring was requested
    #[error("Motion sensor not available")]
    SensorUnavailable,

    /// Runtime fault reported by the sensor stream
    #[error("Sensor fault: {message}")]
    SensorFault { message: String },

    /// `start` called while a session is already running
    #[error("Monitoring already active")]
    AlreadyMonitoring,

    /// The consumer task panicked or was aborted
    #[error("Monitor task failed: {reason}")]
    TaskFailed { reason: String },
}

/// Errors raised when building a posture session
#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    /// Quality score outside 0..=100
    #[error("Invalid quality score: {value} (expected 0-100)")]
    InvalidQuality { value: u32 },

    /// Duration not strictly positive or not finite
    #[error("Invalid session duration: {hours} hours")]
    InvalidDuration { hours: f64 },
}

/// Result type alias for PoseGuard operations
pub type Result<T> = std::result::Result<T, PoseGuardError>;

impl PoseGuardError {
    /// Check if error is retryable
    ///
    /// A sensor fault is cleared by restarting monitoring; an unavailable
    /// sensor stays unavailable for the session.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PoseGuardError::Monitor(MonitorError::SensorFault { .. })
                | PoseGuardError::Monitor(MonitorError::TaskFailed { .. })
                | PoseGuardError::Io(_)
        )
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PoseGuardError::Monitor(MonitorError::AlreadyMonitoring) => ErrorSeverity::Info,
            PoseGuardError::Monitor(MonitorError::SensorUnavailable) => ErrorSeverity::Warning,
            PoseGuardError::Session(_) => ErrorSeverity::Warning,
            PoseGuardError::Monitor(_) => ErrorSeverity::Error,
            PoseGuardError::Configuration(_) => ErrorSeverity::Error,
            PoseGuardError::Internal(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            PoseGuardError::Monitor(MonitorError::SensorUnavailable) => {
                "Motion sensor not detected or not supported. Connect your headphones and try again."
                    .to_string()
            }
            PoseGuardError::Monitor(MonitorError::SensorFault { .. }) => {
                "Tracking error. Stop and restart monitoring to continue.".to_string()
            }
            PoseGuardError::Monitor(MonitorError::AlreadyMonitoring) => {
                "Monitoring is already running.".to_string()
            }
            PoseGuardError::Session(SessionError::InvalidQuality { value }) => {
                format!("Session quality must be between 0 and 100 (got {})", value)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message
    Info,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = PoseGuardError::Monitor(MonitorError::SensorUnavailable);
        assert_eq!(err.severity(), ErrorSeverity::Warning);

        let err = PoseGuardError::Internal("test".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_error_retryable() {
        let err = PoseGuardError::Monitor(MonitorError::SensorFault {
            message: "link lost".to_string(),
        });
        assert!(err.is_retryable());

        let err = PoseGuardError::Monitor(MonitorError::SensorUnavailable);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_user_messages() {
        let err: PoseGuardError = SessionError::InvalidQuality { value: 140 }.into();
        assert!(err.user_message().contains("between 0 and 100"));

        let err: PoseGuardError = MonitorError::SensorUnavailable.into();
        assert!(err.user_message().contains("not detected"));
    }

    #[test]
    fn test_format_error_conversion() {
        let err: PoseGuardError = std::fmt::Error.into();
        assert_eq!(err.severity(), ErrorSeverity::Error);
        assert!(!err.is_retryable());
        assert!(err.user_message().starts_with("Formatting error"));
    }
}
