//! Video reader thread
//!
//! The video transport carries a repeating `[u32 LE length][JPEG payload]`
//! sequence. Header and payload are both read with an exact-read primitive
//! that retries on timeout while the session is running and reports
//! everything else as terminal.

use super::{BridgeInner, Session};
use crate::protocol::{FRAME_HEADER_LEN, MAX_FRAME_BYTES};
use std::io::{self, ErrorKind, Read};
use std::net::TcpStream;
use std::sync::Arc;

pub(super) fn run(inner: Arc<BridgeInner>, session: Arc<Session>, mut stream: TcpStream) {
    log::debug!("Video reader started");

    let mut header = [0u8; FRAME_HEADER_LEN];
    loop {
        if let Err(e) = read_exact_or_stop(&mut stream, &mut header, &session) {
            log_read_end("header", &e);
            break;
        }

        let frame_len = u32::from_le_bytes(header);
        if frame_len == 0 {
            // Empty frame header; nothing to record
            continue;
        }
        if frame_len > MAX_FRAME_BYTES {
            log::warn!(
                "Video frame header claims {} bytes, stream is corrupt",
                frame_len
            );
            break;
        }

        let mut frame = vec![0u8; frame_len as usize];
        if let Err(e) = read_exact_or_stop(&mut stream, &mut frame, &session) {
            log_read_end("payload", &e);
            break;
        }

        log::trace!("Video frame received ({} bytes)", frame.len());
        inner.state.set_frame(frame);
    }

    inner.teardown(&session);
    log::debug!("Video reader stopped");
}

/// Fill `buf` completely or fail.
///
/// Loops over partial reads. A read timeout only retries while the session
/// stop flag is clear; peer close and transport errors are terminal.
fn read_exact_or_stop(
    stream: &mut TcpStream,
    buf: &mut [u8],
    session: &Session,
) -> io::Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        if !session.is_running() {
            return Err(io::Error::new(ErrorKind::Interrupted, "session stopped"));
        }
        match stream.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    ErrorKind::UnexpectedEof,
                    "video transport closed by peer",
                ))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                continue
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn log_read_end(what: &str, err: &io::Error) {
    match err.kind() {
        ErrorKind::UnexpectedEof | ErrorKind::Interrupted => {
            log::info!("Video reader ending during {} read: {}", what, err)
        }
        _ => log::warn!("Video transport error during {} read: {}", what, err),
    }
}
