//! Robot bridge: connection lifecycle and the concurrent session tasks
//!
//! One bridge owns at most one active session at a time. A session bundles
//! the two TCP transports with the stop flag shared by its three worker
//! threads (command reader, video reader, power poller). Teardown is
//! cooperative: the flag is cleared and both sockets are shut down, which
//! forces blocked reads to return within one read timeout.

mod command;
mod poller;
mod video;

use crate::config::{AppConfig, RobotConfig};
use crate::error::{Error, Result};
use crate::state::{StateSnapshot, StateStore};
use parking_lot::Mutex;
use std::io::Write;
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// One established connection pair and the stop flag for its worker threads
struct Session {
    /// Cooperative stop flag checked by all three threads after every
    /// timeout or sleep slice
    running: AtomicBool,
    /// Write direction of the command transport, shared by external callers
    /// and the power poller
    command_writer: Mutex<TcpStream>,
    /// Control handle used to force the command reader out of a blocked read
    command_ctl: TcpStream,
    /// Control handle used to force the video reader out of a blocked read
    video_ctl: TcpStream,
}

impl Session {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Clear the stop flag and close both transports. Idempotent;
    /// already-closed sockets are ignored.
    fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
        let _ = self.command_ctl.shutdown(Shutdown::Both);
        let _ = self.video_ctl.shutdown(Shutdown::Both);
    }

    /// Blocking write of one command on the shared write direction.
    fn send(&self, text: &str) -> Result<()> {
        if !self.is_running() {
            return Err(Error::NotConnected);
        }
        let mut writer = self.command_writer.lock();
        writer.write_all(text.as_bytes())?;
        Ok(())
    }
}

/// Shared bridge internals, owned jointly by the service object, its clones,
/// and the worker threads of the active session
struct BridgeInner {
    config: AppConfig,
    state: StateStore,
    /// Current session; `None` while disconnected
    session: Mutex<Option<Arc<Session>>>,
    /// Serializes connect attempts so two callers cannot race the lifecycle
    lifecycle: Mutex<()>,
}

impl BridgeInner {
    /// Tear down the current session, if any, and mark the state
    /// disconnected. Idempotent and safe to call concurrently.
    fn disconnect(&self) {
        let prior = self.session.lock().take();
        if let Some(session) = prior {
            session.stop();
        }
        self.state.mark_disconnected();
    }

    /// Teardown triggered from inside a worker thread. Only the thread's own
    /// session may be torn down; a newer session installed by a reconnect is
    /// left untouched.
    fn teardown(&self, session: &Arc<Session>) {
        {
            let mut current = self.session.lock();
            match current.as_ref() {
                Some(active) if Arc::ptr_eq(active, session) => {
                    current.take();
                }
                _ => {
                    // Stale session: its sockets still get closed, but the
                    // bridge state belongs to the successor.
                    session.stop();
                    return;
                }
            }
        }
        session.stop();
        self.state.mark_disconnected();
    }

    /// Send on a specific session and record the command on success.
    fn send_on(&self, session: &Session, text: &str) -> Result<()> {
        session.send(text)?;
        self.state.set_last_command(text.trim());
        Ok(())
    }

    /// Send on the currently active session.
    fn send_command(&self, text: &str) -> Result<()> {
        let session = self.session.lock().clone().ok_or(Error::NotConnected)?;
        self.send_on(&session, text)
    }
}

/// Bridge service object
///
/// Cheap to clone; all clones share one state record and at most one active
/// session. Construct it once and hand clones to whatever request layer
/// fronts it.
#[derive(Clone)]
pub struct RobotBridge {
    inner: Arc<BridgeInner>,
}

impl RobotBridge {
    pub fn new(config: AppConfig) -> Self {
        Self {
            inner: Arc::new(BridgeInner {
                config,
                state: StateStore::new(),
                session: Mutex::new(None),
                lifecycle: Mutex::new(()),
            }),
        }
    }

    /// Connect to the robot at `host`, tearing down any prior session first.
    ///
    /// Opens the command transport, then the video transport; if either
    /// fails, whatever opened is closed again and the bridge stays
    /// disconnected. On success the three worker threads are started and the
    /// state reports connected.
    pub fn connect(&self, host: &str) -> Result<()> {
        let inner = &self.inner;
        let _guard = inner.lifecycle.lock();

        inner.disconnect();
        inner.state.begin_connect(host);
        log::info!(
            "Connecting to {} (command port {}, video port {})",
            host,
            inner.config.robot.command_port,
            inner.config.robot.video_port
        );

        let (session, command_reader, video_reader) =
            match open_session(host, &inner.config.robot) {
                Ok(parts) => parts,
                Err(e) => {
                    log::warn!("Connect to {} failed: {}", host, e);
                    inner.disconnect();
                    return Err(Error::Connection(e));
                }
            };

        *inner.session.lock() = Some(Arc::clone(&session));
        inner.state.mark_connected();

        if let Err(e) = self.spawn_workers(&session, command_reader, video_reader) {
            inner.disconnect();
            return Err(e);
        }

        log::info!("Connected to {}", host);
        Ok(())
    }

    /// Tear down the active session. Always succeeds; fire-and-forget with
    /// respect to the worker threads, which self-terminate within one read
    /// timeout once their sockets are closed.
    pub fn disconnect(&self) {
        self.inner.disconnect();
        log::info!("Disconnected");
    }

    /// Send one command over the command transport.
    ///
    /// The caller is responsible for including any required line terminator.
    /// The trimmed text is recorded as the last command on success.
    pub fn send_command(&self, text: &str) -> Result<()> {
        self.inner.send_command(text)
    }

    /// Copy out the current state snapshot.
    pub fn state(&self) -> StateSnapshot {
        self.inner.state.snapshot()
    }

    /// Copy out the most recent video frame, if any.
    pub fn last_frame(&self) -> Option<Vec<u8>> {
        self.inner.state.last_frame()
    }

    fn spawn_workers(
        &self,
        session: &Arc<Session>,
        command_reader: TcpStream,
        video_reader: TcpStream,
    ) -> Result<()> {
        let inner = Arc::clone(&self.inner);
        let sess = Arc::clone(session);
        thread::Builder::new()
            .name("command-reader".to_string())
            .spawn(move || command::run(inner, sess, command_reader))
            .map_err(|e| Error::Other(format!("Failed to spawn command reader: {}", e)))?;

        let inner = Arc::clone(&self.inner);
        let sess = Arc::clone(session);
        thread::Builder::new()
            .name("video-reader".to_string())
            .spawn(move || video::run(inner, sess, video_reader))
            .map_err(|e| Error::Other(format!("Failed to spawn video reader: {}", e)))?;

        let inner = Arc::clone(&self.inner);
        let sess = Arc::clone(session);
        let interval = self.inner.config.robot.power_poll_interval();
        thread::Builder::new()
            .name("power-poller".to_string())
            .spawn(move || poller::run(inner, sess, interval))
            .map_err(|e| Error::Other(format!("Failed to spawn power poller: {}", e)))?;

        Ok(())
    }
}

/// Open both transports and assemble a session.
///
/// Any error mid-setup drops whatever was opened, which closes it.
fn open_session(
    host: &str,
    robot: &RobotConfig,
) -> std::io::Result<(Arc<Session>, TcpStream, TcpStream)> {
    let command = open_stream(
        host,
        robot.command_port,
        robot.connect_timeout(),
        robot.command_read_timeout(),
    )?;
    let video = open_stream(
        host,
        robot.video_port,
        robot.connect_timeout(),
        robot.video_read_timeout(),
    )?;

    let command_reader = command.try_clone()?;
    let video_reader = video.try_clone()?;
    let command_writer = command.try_clone()?;

    let session = Arc::new(Session {
        running: AtomicBool::new(true),
        command_writer: Mutex::new(command_writer),
        command_ctl: command,
        video_ctl: video,
    });

    Ok((session, command_reader, video_reader))
}

/// Open one TCP transport with independent connect and read deadlines.
fn open_stream(
    host: &str,
    port: u16,
    connect_timeout: Duration,
    read_timeout: Duration,
) -> std::io::Result<TcpStream> {
    let mut last_err = None;
    for addr in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, connect_timeout) {
            Ok(stream) => {
                stream.set_read_timeout(Some(read_timeout))?;
                return Ok(stream);
            }
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::AddrNotAvailable,
            format!("no addresses resolved for {}:{}", host, port),
        )
    }))
}
