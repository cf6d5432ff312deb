//! Motion sensor collaborator
//!
//! The platform motion API lives outside this crate; it is reached through
//! [`MotionSensor`]. Two implementations ship here: an in-memory script and
//! a CSV replay, both of which feed a channel from a background task.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::Result;
use crate::models::OrientationSample;

const FEED_CAPACITY: usize = 64;

/// One item of the sensor stream
#[derive(Debug, Clone, PartialEq)]
pub enum SensorEvent {
    Sample(OrientationSample),
    Fault(String),
}

/// Source of orientation samples
///
/// `subscribe` is called from within a tokio runtime and may spawn the
/// producer side of the channel.
pub trait MotionSensor: Send + Sync {
    /// Whether the motion capability exists on this device
    fn is_available(&self) -> bool;

    /// Open the sample stream; dropping the receiver unsubscribes
    fn subscribe(&self) -> Result<mpsc::Receiver<SensorEvent>>;
}

/// Push events into a fresh channel, then hold it open until the consumer
/// goes away
fn spawn_feed(events: Vec<SensorEvent>, pace: Option<Duration>) -> mpsc::Receiver<SensorEvent> {
    let (tx, rx) = mpsc::channel(FEED_CAPACITY);

    tokio::spawn(async move {
        for event in events {
            if let Some(pace) = pace {
                tokio::time::sleep(pace).await;
            }
            if tx.send(event).await.is_err() {
                debug!("sensor feed receiver dropped");
                return;
            }
        }
        tx.closed().await;
    });

    rx
}

/// Sensor that plays back a fixed list of events
#[derive(Debug, Clone)]
pub struct ScriptedSensor {
    available: bool,
    events: Vec<SensorEvent>,
    pace: Option<Duration>,
}

impl ScriptedSensor {
    pub fn new(events: Vec<SensorEvent>) -> Self {
        ScriptedSensor {
            available: true,
            events,
            pace: None,
        }
    }

    /// A device without motion capability
    pub fn unavailable() -> Self {
        ScriptedSensor {
            available: false,
            events: Vec::new(),
            pace: None,
        }
    }

    /// Wait this long before each event
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = Some(pace);
        self
    }
}

impl MotionSensor for ScriptedSensor {
    fn is_available(&self) -> bool {
        self.available
    }

    fn subscribe(&self) -> Result<mpsc::Receiver<SensorEvent>> {
        Ok(spawn_feed(self.events.clone(), self.pace))
    }
}

#[derive(Debug, Deserialize)]
struct ReplayRow {
    timestamp: DateTime<Utc>,
    roll: f64,
    pitch: f64,
}

/// Sensor that replays a recording of `timestamp,roll,pitch` rows
///
/// Timestamps are RFC 3339, angles are degrees.
#[derive(Debug, Clone)]
pub struct CsvReplaySensor {
    samples: Vec<OrientationSample>,
    pace: Option<Duration>,
}

impl CsvReplaySensor {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path.as_ref())?;
        Self::from_reader(reader)
    }

    pub fn from_reader<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Self> {
        let samples = reader
            .deserialize::<ReplayRow>()
            .map(|row| row.map(|r| OrientationSample::new(r.roll, r.pitch, r.timestamp)))
            .collect::<std::result::Result<Vec<_>, csv::Error>>()?;

        debug!(samples = samples.len(), "replay recording loaded");
        Ok(CsvReplaySensor {
            samples,
            pace: None,
        })
    }

    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = Some(pace);
        self
    }

    pub fn samples(&self) -> &[OrientationSample] {
        &self.samples
    }
}

impl MotionSensor for CsvReplaySensor {
    fn is_available(&self) -> bool {
        true
    }

    fn subscribe(&self) -> Result<mpsc::Receiver<SensorEvent>> {
        let events = self.samples.iter().copied().map(SensorEvent::Sample).collect();
        Ok(spawn_feed(events, self.pace))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const RECORDING: &str = "timestamp,roll,pitch\n\
        2025-03-11T09:00:00Z, 2.5, -1.0\n\
        2025-03-11T09:00:01Z, 21.0, 3.0\n";

    #[test]
    fn test_replay_parsing() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(RECORDING.as_bytes()).unwrap();

        let sensor = CsvReplaySensor::from_path(file.path()).unwrap();
        assert_eq!(sensor.samples().len(), 2);
        assert_eq!(sensor.samples()[1].roll_degrees, 21.0);
        assert_eq!(sensor.samples()[0].pitch_degrees, -1.0);
    }

    #[test]
    fn test_replay_rejects_bad_rows() {
        let reader = csv::Reader::from_reader("timestamp,roll,pitch\nyesterday,1,2\n".as_bytes());
        assert!(CsvReplaySensor::from_reader(reader).is_err());
    }

    #[tokio::test]
    async fn test_scripted_feed_stays_open() {
        let sample = OrientationSample::new(1.0, 2.0, Utc::now());
        let sensor = ScriptedSensor::new(vec![
            SensorEvent::Sample(sample),
            SensorEvent::Fault("boom".to_string()),
        ]);
        assert!(sensor.is_available());

        let mut rx = sensor.subscribe().unwrap();
        assert_eq!(rx.recv().await, Some(SensorEvent::Sample(sample)));
        assert_eq!(rx.recv().await, Some(SensorEvent::Fault("boom".to_string())));

        let pending = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await;
        assert!(pending.is_err(), "feed should stay open after the script ends");
    }
}
