//! Heartbeat timer
//!
//! Runs on its own task so heartbeats keep flowing while the receive loop is
//! blocked waiting for a frame.

use crate::connection::{GatewaySender, SequenceTracker};
use crate::protocol::GatewayMessage;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Round-trip bookkeeping shared between the timer and the receive loop
#[derive(Debug, Default)]
pub struct HeartbeatMonitor {
    last_sent: Mutex<Option<Instant>>,
    latency: Mutex<Option<Duration>>,
}

impl HeartbeatMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_sent(&self) {
        *self.last_sent.lock() = Some(Instant::now());
    }

    /// Record an ACK (op 11) against the last heartbeat sent
    pub fn record_ack(&self) {
        if let Some(sent) = self.last_sent.lock().take() {
            *self.latency.lock() = Some(sent.elapsed());
        }
    }

    /// Time between the last acknowledged heartbeat and its ACK
    pub fn latency(&self) -> Option<Duration> {
        *self.latency.lock()
    }
}

/// Periodic heartbeat sender
pub struct HeartbeatTimer {
    interval: Duration,
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl HeartbeatTimer {
    /// Spawn the timer; the first tick fires one interval from now
    pub fn start(
        interval: Duration,
        sender: GatewaySender,
        sequence: SequenceTracker,
        monitor: Arc<HeartbeatMonitor>,
    ) -> Self {
        let (stop_tx, mut stop_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        let last = sequence.get();
                        if let Err(e) = sender.send(&GatewayMessage::heartbeat(last)).await {
                            tracing::warn!(error = %e, "Failed to send heartbeat");
                            break;
                        }
                        monitor.record_sent();
                        tracing::trace!(sequence = ?last, "Heartbeat sent");
                    }
                }
            }
        });

        tracing::debug!(interval_ms = interval.as_millis() as u64, "Heartbeat timer started");

        Self {
            interval,
            stop: Some(stop_tx),
            task: Some(task),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Signal the task and wait for it to finish
    ///
    /// Once this returns no further heartbeat can be written to the socket.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Heartbeat task ended abnormally");
            }
        }
        tracing::debug!("Heartbeat timer stopped");
    }
}

impl Drop for HeartbeatTimer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for HeartbeatTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeartbeatTimer")
            .field("interval", &self.interval)
            .field("running", &self.task.as_ref().is_some_and(|t| !t.is_finished()))
            .finish()
    }
}
