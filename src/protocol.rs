//! Wire protocol for the rover's two TCP links
//!
//! Command/telemetry port: newline-terminated ASCII in both directions.
//! Inbound status lines have the form `TAG#field1#...#fieldN`.
//!
//! Video port: repeating `[4-byte little-endian length][JPEG payload]`
//! sequence.

/// Default TCP port for commands and telemetry
pub const COMMAND_PORT: u16 = 5000;
/// Default TCP port for the video stream
pub const VIDEO_PORT: u16 = 8000;

/// Ultrasonic distance status tag (one field, centimeters)
pub const TAG_SONIC: &str = "CMD_SONIC";
/// Ambient light status tag (two fields, left/right volts)
pub const TAG_LIGHT: &str = "CMD_LIGHT";
/// Battery status tag (one field, raw pack voltage)
pub const TAG_POWER: &str = "CMD_POWER";

/// Field delimiter inside a status line
pub const FIELD_DELIMITER: char = '#';

/// Command issued by the poller to request a battery reading
pub const POWER_QUERY: &str = "CMD_POWER\n";

/// Size of the video frame length header
pub const FRAME_HEADER_LEN: usize = 4;

/// Upper bound on a single video frame; a larger header means the framing is
/// corrupt and the stream cannot be resynchronized
pub const MAX_FRAME_BYTES: u32 = 8 * 1024 * 1024;

/// Battery voltage at which the pack reads 0%
const POWER_EMPTY_VOLTS: f32 = 7.0;
/// Voltage span between 0% and 100%
const POWER_SPAN_VOLTS: f32 = 1.40;

/// A successfully parsed status line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatusUpdate {
    /// Ultrasonic distance in centimeters
    Ultrasonic(f32),
    /// Ambient light sensor pair, volts
    Light { left: f32, right: f32 },
    /// Battery charge percent, mapped from the raw voltage
    Power(u8),
}

/// Map a raw battery voltage to a 0-100 percentage.
///
/// Linear over the 7.0 V - 8.4 V pack range, clamped at both ends, rounded to
/// the nearest whole percent.
pub fn power_percent(voltage: f32) -> u8 {
    let percent = (voltage - POWER_EMPTY_VOLTS) / POWER_SPAN_VOLTS * 100.0;
    percent.clamp(0.0, 100.0).round() as u8
}

/// Parse one trimmed, non-empty status line.
///
/// Returns `None` for unknown tags, missing fields, and malformed numbers.
/// Callers record the raw line before parsing, so a `None` here has no
/// further effect.
pub fn parse_status_line(line: &str) -> Option<StatusUpdate> {
    let mut parts = line.split(FIELD_DELIMITER);
    let tag = parts.next()?;
    match tag {
        TAG_SONIC => {
            let cm: f32 = parts.next()?.trim().parse().ok()?;
            Some(StatusUpdate::Ultrasonic(cm))
        }
        TAG_LIGHT => {
            // Either both fields parse or neither sensor is updated.
            let left: f32 = parts.next()?.trim().parse().ok()?;
            let right: f32 = parts.next()?.trim().parse().ok()?;
            Some(StatusUpdate::Light { left, right })
        }
        TAG_POWER => {
            let volts: f32 = parts.next()?.trim().parse().ok()?;
            Some(StatusUpdate::Power(power_percent(volts)))
        }
        _ => None,
    }
}
