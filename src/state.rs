//! Shared robot state
//!
//! One mutable record, created at bridge construction and never replaced,
//! written by the reader threads and read by external consumers. Every
//! mutation of related fields happens inside a single critical section so a
//! reader can never observe a torn pair (light left/right, frame/frame-time).

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Status marker recorded when a session is torn down
pub const DISCONNECTED_STATUS: &str = "Disconnected";

/// Connection lifecycle phase
///
/// Only path back to `Connecting` is through `Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionPhase {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// The single mutable robot state record
#[derive(Debug, Clone, Default)]
struct RobotState {
    phase: ConnectionPhase,
    address: Option<String>,
    power_percent: Option<u8>,
    ultrasonic_cm: Option<f32>,
    light_left_v: Option<f32>,
    light_right_v: Option<f32>,
    last_command: Option<String>,
    last_status: Option<String>,
    last_frame: Option<Vec<u8>>,
    last_frame_time_us: Option<u64>,
}

/// Copy-out view of the robot state for external consumers
///
/// All sensor fields are `Option` to distinguish "no data yet" from a zero
/// reading. Frame bytes are deliberately not part of the snapshot; fetch them
/// through the bridge's `last_frame` accessor.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub connected: bool,
    pub address: Option<String>,
    pub power_percent: Option<u8>,
    pub ultrasonic_cm: Option<f32>,
    pub light_left_v: Option<f32>,
    pub light_right_v: Option<f32>,
    pub last_command: Option<String>,
    pub last_status: Option<String>,
    pub last_frame_time_us: Option<u64>,
}

/// Mutex-guarded store shared by the worker threads and external consumers
#[derive(Clone, Default)]
pub struct StateStore {
    inner: Arc<Mutex<RobotState>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of a connect attempt.
    pub(crate) fn begin_connect(&self, address: &str) {
        let mut state = self.inner.lock();
        state.phase = ConnectionPhase::Connecting;
        state.address = Some(address.to_string());
        state.last_status = None;
    }

    pub(crate) fn mark_connected(&self) {
        self.inner.lock().phase = ConnectionPhase::Connected;
    }

    /// Record a teardown. Sensor and frame fields keep their last-known
    /// values; only the phase and the status marker change.
    pub(crate) fn mark_disconnected(&self) {
        let mut state = self.inner.lock();
        state.phase = ConnectionPhase::Disconnected;
        state.last_status = Some(DISCONNECTED_STATUS.to_string());
    }

    /// Record a raw status line, parsed or not.
    pub(crate) fn record_status(&self, line: &str) {
        self.inner.lock().last_status = Some(line.to_string());
    }

    pub(crate) fn set_ultrasonic(&self, cm: f32) {
        self.inner.lock().ultrasonic_cm = Some(cm);
    }

    /// Update both light sensors in one critical section.
    pub(crate) fn set_light_pair(&self, left: f32, right: f32) {
        let mut state = self.inner.lock();
        state.light_left_v = Some(left);
        state.light_right_v = Some(right);
    }

    pub(crate) fn set_power_percent(&self, percent: u8) {
        self.inner.lock().power_percent = Some(percent);
    }

    pub(crate) fn set_last_command(&self, command: &str) {
        self.inner.lock().last_command = Some(command.to_string());
    }

    /// Store a frame and its arrival time in one critical section.
    pub(crate) fn set_frame(&self, frame: Vec<u8>) {
        let now_us = timestamp_us();
        let mut state = self.inner.lock();
        state.last_frame = Some(frame);
        state.last_frame_time_us = Some(now_us);
    }

    /// Copy out the scalar fields under one lock acquisition.
    pub fn snapshot(&self) -> StateSnapshot {
        let state = self.inner.lock();
        StateSnapshot {
            connected: state.phase == ConnectionPhase::Connected,
            address: state.address.clone(),
            power_percent: state.power_percent,
            ultrasonic_cm: state.ultrasonic_cm,
            light_left_v: state.light_left_v,
            light_right_v: state.light_right_v,
            last_command: state.last_command.clone(),
            last_status: state.last_status.clone(),
            last_frame_time_us: state.last_frame_time_us,
        }
    }

    /// Copy out the most recent frame, if any.
    pub fn last_frame(&self) -> Option<Vec<u8>> {
        self.inner.lock().last_frame.clone()
    }
}

/// Microseconds since the Unix epoch
fn timestamp_us() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_defaults() {
        let store = StateStore::new();
        let snapshot = store.snapshot();
        assert!(!snapshot.connected);
        assert!(snapshot.address.is_none());
        assert!(snapshot.power_percent.is_none());
        assert!(snapshot.ultrasonic_cm.is_none());
        assert!(snapshot.last_status.is_none());
        assert!(snapshot.last_frame_time_us.is_none());
        assert!(store.last_frame().is_none());
    }

    #[test]
    fn test_connect_phases() {
        let store = StateStore::new();
        store.begin_connect("192.168.4.1");
        let snapshot = store.snapshot();
        assert!(!snapshot.connected);
        assert_eq!(snapshot.address.as_deref(), Some("192.168.4.1"));
        assert!(snapshot.last_status.is_none());

        store.mark_connected();
        assert!(store.snapshot().connected);
    }

    #[test]
    fn test_light_pair_updates_together() {
        let store = StateStore::new();
        store.set_light_pair(1.2, 3.4);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.light_left_v, Some(1.2));
        assert_eq!(snapshot.light_right_v, Some(3.4));
    }

    #[test]
    fn test_disconnect_keeps_stale_readings() {
        let store = StateStore::new();
        store.begin_connect("10.0.0.2");
        store.mark_connected();
        store.set_ultrasonic(42.0);
        store.set_power_percent(80);
        store.set_frame(vec![1, 2, 3]);

        store.mark_disconnected();
        let snapshot = store.snapshot();
        assert!(!snapshot.connected);
        assert_eq!(snapshot.last_status.as_deref(), Some(DISCONNECTED_STATUS));
        // Last-known values are intentionally left in place
        assert_eq!(snapshot.ultrasonic_cm, Some(42.0));
        assert_eq!(snapshot.power_percent, Some(80));
        assert_eq!(store.last_frame(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_frame_and_time_update_together() {
        let store = StateStore::new();
        assert!(store.snapshot().last_frame_time_us.is_none());

        store.set_frame(vec![0xFF, 0xD8]);
        let snapshot = store.snapshot();
        assert_eq!(store.last_frame(), Some(vec![0xFF, 0xD8]));
        assert!(snapshot.last_frame_time_us.is_some());
    }

    #[test]
    fn test_record_status_verbatim() {
        let store = StateStore::new();
        store.record_status("CMD_SONIC#notanumber");
        assert_eq!(
            store.snapshot().last_status.as_deref(),
            Some("CMD_SONIC#notanumber")
        );
    }
}
