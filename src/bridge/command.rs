//! Command/telemetry reader thread
//!
//! Reads newline-terminated status lines from the command transport, records
//! each line verbatim, and applies the parsed update to the shared state.
//! Read timeouts are the stop-flag observation points; a zero-byte read or
//! any other transport error is terminal and forces a disconnect.

use super::{BridgeInner, Session};
use crate::protocol::{self, StatusUpdate};
use std::io::{ErrorKind, Read};
use std::net::TcpStream;
use std::sync::Arc;

/// Read chunk size for the telemetry stream
const READ_CHUNK: usize = 1024;

pub(super) fn run(inner: Arc<BridgeInner>, session: Arc<Session>, mut stream: TcpStream) {
    log::debug!("Command reader started");

    let mut chunk = [0u8; READ_CHUNK];
    let mut buffer: Vec<u8> = Vec::new();

    while session.is_running() {
        match stream.read(&mut chunk) {
            Ok(0) => {
                log::info!("Command transport closed by peer");
                break;
            }
            Ok(n) => {
                buffer.extend_from_slice(&chunk[..n]);
                drain_lines(&inner, &mut buffer);
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                // Timeout: retry, letting the loop observe the stop flag
            }
            Err(e) => {
                log::warn!("Command transport error: {}", e);
                break;
            }
        }
    }

    inner.teardown(&session);
    log::debug!("Command reader stopped");
}

/// Extract every complete line from the buffer and handle it.
fn drain_lines(inner: &BridgeInner, buffer: &mut Vec<u8>) {
    while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
        let segment: Vec<u8> = buffer.drain(..=pos).collect();
        // Device telemetry is ASCII; anything else is decoded lossily
        let text = String::from_utf8_lossy(&segment[..pos]);
        let line = text.trim();
        if line.is_empty() {
            continue;
        }
        handle_status_line(inner, line);
    }
}

fn handle_status_line(inner: &BridgeInner, line: &str) {
    // The raw line is recorded whether or not it parses
    inner.state.record_status(line);

    match protocol::parse_status_line(line) {
        Some(StatusUpdate::Ultrasonic(cm)) => inner.state.set_ultrasonic(cm),
        Some(StatusUpdate::Light { left, right }) => inner.state.set_light_pair(left, right),
        Some(StatusUpdate::Power(percent)) => inner.state.set_power_percent(percent),
        None => log::trace!("Status line not parsed: {}", line),
    }
}
