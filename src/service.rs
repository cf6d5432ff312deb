//! Async host for [`PostureMonitor`]
//!
//! A single consumer task owns the monitor while monitoring is active, so
//! samples are evaluated strictly in arrival order and the last-alert
//! timestamp has exactly one writer. Settled states are published on a
//! `watch` channel after each evaluation completes.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::alerts::{AlertDispatcher, AlertSink};
use crate::error::{MonitorError, Result};
use crate::models::PostureState;
use crate::monitor::{MonitorSettings, PostureMonitor, Transition};
use crate::sensor::{MotionSensor, SensorEvent};

struct RunningMonitor {
    cancel: CancellationToken,
    handle: JoinHandle<PostureMonitor>,
}

/// Connects a sensor, a monitor and an alert sink
pub struct MonitorService {
    settings: MonitorSettings,
    sensor: Arc<dyn MotionSensor>,
    sink: Arc<dyn AlertSink>,
    monitor: Option<PostureMonitor>,
    running: Option<RunningMonitor>,
    dispatcher: Option<AlertDispatcher>,
    state_tx: Arc<watch::Sender<PostureState>>,
}

impl MonitorService {
    /// Build a stopped service; settings are validated here
    pub fn new(
        settings: MonitorSettings,
        sensor: Arc<dyn MotionSensor>,
        sink: Arc<dyn AlertSink>,
    ) -> Result<Self> {
        let monitor = PostureMonitor::with_settings(settings.clone())?;
        let (state_tx, _) = watch::channel(PostureState::NotMonitoring);

        Ok(MonitorService {
            monitor: Some(monitor),
            settings,
            sensor,
            sink,
            running: None,
            dispatcher: None,
            state_tx: Arc::new(state_tx),
        })
    }

    /// Latest settled state
    pub fn state(&self) -> PostureState {
        self.state_tx.borrow().clone()
    }

    /// Observe state changes
    pub fn subscribe_state(&self) -> watch::Receiver<PostureState> {
        self.state_tx.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Start monitoring
    ///
    /// Sensor availability is checked once, here. An unavailable sensor is
    /// reported through state and alert and `Ok(Unavailable)` is returned;
    /// no consumer is started.
    pub async fn start(&mut self) -> Result<PostureState> {
        if self.running.is_some() {
            return Err(MonitorError::AlreadyMonitoring.into());
        }

        let dispatcher = self.dispatcher().clone();
        let mut monitor = self.take_monitor();

        let transition = monitor.start(self.sensor.is_available(), Utc::now());
        publish(&self.state_tx, &dispatcher, transition);

        if !monitor.state().is_tracking() {
            let state = monitor.state().clone();
            self.monitor = Some(monitor);
            return Ok(state);
        }

        let events = match self.sensor.subscribe() {
            Ok(events) => events,
            Err(err) => {
                let message = err.to_string();
                if let Some(transition) = monitor.fault(message.clone(), Utc::now()) {
                    publish(&self.state_tx, &dispatcher, transition);
                }
                self.monitor = Some(monitor);
                return Err(MonitorError::SensorFault { message }.into());
            }
        };

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(consume(
            monitor,
            events,
            cancel.clone(),
            self.state_tx.clone(),
            dispatcher,
        ));
        self.running = Some(RunningMonitor { cancel, handle });

        Ok(self.state())
    }

    /// Stop monitoring
    ///
    /// Returns once the consumer has exited; nothing received after this call
    /// is evaluated. The state is reset to `NotMonitoring`.
    pub async fn stop(&mut self) -> Result<()> {
        let mut result = Ok(());

        if let Some(running) = self.running.take() {
            running.cancel.cancel();
            match running.handle.await {
                Ok(monitor) => self.monitor = Some(monitor),
                Err(err) => {
                    warn!(error = %err, "monitor task did not exit cleanly");
                    result = Err(MonitorError::TaskFailed {
                        reason: err.to_string(),
                    }
                    .into());
                }
            }
        }

        let mut monitor = self.take_monitor();
        let transition = monitor.stop();
        self.state_tx.send_replace(transition.state);
        self.monitor = Some(monitor);

        result
    }

    fn take_monitor(&mut self) -> PostureMonitor {
        self.monitor
            .take()
            .unwrap_or_else(|| PostureMonitor::from_validated(self.settings.clone()))
    }

    fn dispatcher(&mut self) -> &AlertDispatcher {
        let sink = self.sink.clone();
        let lead = self.settings.notification_lead();
        self.dispatcher
            .get_or_insert_with(|| AlertDispatcher::spawn(sink, lead))
    }
}

impl Drop for MonitorService {
    fn drop(&mut self) {
        if let Some(running) = &self.running {
            running.cancel.cancel();
        }
    }
}

fn publish(
    state_tx: &watch::Sender<PostureState>,
    dispatcher: &AlertDispatcher,
    transition: Transition,
) {
    state_tx.send_if_modified(|current| {
        if *current == transition.state {
            false
        } else {
            *current = transition.state.clone();
            true
        }
    });
    if let Some(alert) = transition.alert {
        dispatcher.dispatch(alert);
    }
}

async fn consume(
    mut monitor: PostureMonitor,
    mut events: mpsc::Receiver<SensorEvent>,
    cancel: CancellationToken,
    state_tx: Arc<watch::Sender<PostureState>>,
    dispatcher: AlertDispatcher,
) -> PostureMonitor {
    info!("sensor consumer started");

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!("sensor consumer cancelled");
                break;
            }
            event = events.recv() => {
                match event {
                    Some(SensorEvent::Sample(sample)) => {
                        if let Some(transition) = monitor.evaluate(&sample) {
                            publish(&state_tx, &dispatcher, transition);
                        }
                    }
                    Some(SensorEvent::Fault(message)) => {
                        if let Some(transition) = monitor.fault(message, Utc::now()) {
                            publish(&state_tx, &dispatcher, transition);
                        }
                        break;
                    }
                    None => {
                        if let Some(transition) = monitor.fault("sensor stream closed", Utc::now()) {
                            publish(&state_tx, &dispatcher, transition);
                        }
                        break;
                    }
                }
            }
        }
    }

    info!(state = %monitor.state(), "sensor consumer stopped");
    monitor
}
