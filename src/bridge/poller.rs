//! Battery status poller thread
//!
//! Requests a battery reading on a fixed cadence. Send failures are swallowed
//! and polling continues until the session stop flag is set.

use super::{BridgeInner, Session};
use crate::protocol::POWER_QUERY;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Slice length for interval waits; bounds how long the poller takes to
/// observe the stop flag
const WAIT_SLICE: Duration = Duration::from_millis(250);

pub(super) fn run(inner: Arc<BridgeInner>, session: Arc<Session>, interval: Duration) {
    log::debug!("Power poller started ({:?} interval)", interval);

    while wait_while_running(&session, interval) {
        match inner.send_on(&session, POWER_QUERY) {
            Ok(()) => log::trace!("Power query sent"),
            Err(e) => log::debug!("Power query failed: {}", e),
        }
    }

    log::debug!("Power poller stopped");
}

/// Sleep for `interval` in short slices. Returns false as soon as the
/// session stop flag is observed.
fn wait_while_running(session: &Session, interval: Duration) -> bool {
    let deadline = Instant::now() + interval;
    while session.is_running() {
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep(WAIT_SLICE.min(deadline - now));
    }
    false
}
