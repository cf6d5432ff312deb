// Library interface for PoseGuard modules
// This allows integration tests to access the core functionality

pub mod aggregator;
pub mod alerts;
pub mod config;
pub mod demo;
pub mod error;
pub mod export;
pub mod ingest;
pub mod logging;
pub mod models;
pub mod monitor;
pub mod sensor;
pub mod service;

// Re-export commonly used types for convenience
pub use models::*;
pub use aggregator::{DaySummary, ReportSummary, SessionAggregator};
pub use alerts::{AlertDispatcher, AlertSink, ChannelAlertSink, TracingAlertSink};
pub use ingest::ReportBuilder;
pub use monitor::{MonitorSettings, PostureMonitor, Transition};
pub use sensor::{CsvReplaySensor, MotionSensor, ScriptedSensor, SensorEvent};
pub use service::MonitorService;
pub use error::{PoseGuardError, Result};
pub use logging::{LogConfig, LogLevel, LogFormat};
