//! Native Protocol Client
//!
//! Talks the binary challenge-response protocol over one TCP connection per
//! call.
//!
//! ## Session State Machine
//! ```text
//! Disconnected ─▶ Connected ─▶ HandshakeSent ─▶ ChallengeReceived ─▶ SolutionSent
//!                                                                        │
//!      ┌─────────────────────────────────────────────────────────────────┘
//!      ▼
//! FirstStatusReceived ─▶ ControlSent ─▶ SecondStatusReceived ─▶ Disconnected
//! ```
//!
//! A status query and a switch walk the exact same path; a status query just
//! sends a control frame in which every socket is "unchanged".

use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::{PowerStrip, StripStatus};
use crate::config::Config;
use crate::error::{EnergenieError, Result};
use crate::protocol::{
    firmware_revision, ControlFrame, Key, StatusFrame, Task, FRAME_SIZE, HANDSHAKE_START, TASK_SIZE,
};
use crate::socket::Socket;

/// Client for the native TCP protocol
///
/// Holds nothing but the address, the derived key and timeouts, so it can be
/// shared freely between threads. Whether the device copes with concurrent
/// sessions is another matter.
#[derive(Debug, Clone)]
pub struct NativeClient {
    /// Device host name or IP
    address: String,

    /// Device TCP port
    port: u16,

    /// Key derived from the password at construction
    key: Key,

    /// Connect / read / write deadlines
    timeouts: Timeouts,
}

/// Deadlines applied to a session
#[derive(Debug, Clone, Copy)]
pub(crate) struct Timeouts {
    connect: Duration,
    read: Option<Duration>,
    write: Option<Duration>,
}

impl Timeouts {
    fn from_config(config: &Config) -> Self {
        Self {
            connect: Duration::from_millis(config.connect_timeout_ms),
            read: optional_millis(config.read_timeout_ms),
            write: optional_millis(config.write_timeout_ms),
        }
    }
}

fn optional_millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

impl NativeClient {
    /// Create a client with default timeouts
    ///
    /// Fails with `EnergenieError::Config` if the password is longer than
    /// 8 bytes. No network I/O happens here.
    pub fn new(address: impl Into<String>, port: u16, password: &str) -> Result<Self> {
        let config = Config::builder()
            .address(address)
            .port(port)
            .password(password)
            .build();
        Self::from_config(&config)
    }

    /// Create a client from a full configuration
    ///
    /// Fails with `EnergenieError::Config` for an over-long password or a
    /// zero connect timeout.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let key = Key::derive(&config.password)?;
        Ok(Self {
            address: config.address.clone(),
            port: config.port,
            key,
            timeouts: Timeouts::from_config(config),
        })
    }

    /// The key derived from the password
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Deadline for establishing the TCP connection
    pub fn connect_timeout(&self) -> Duration {
        self.timeouts.connect
    }

    /// Per-read deadline, `None` when reads block
    pub fn read_timeout(&self) -> Option<Duration> {
        self.timeouts.read
    }

    /// Per-write deadline, `None` when writes block
    pub fn write_timeout(&self) -> Option<Duration> {
        self.timeouts.write
    }

    /// Run one full session, switching the sockets in `desired` on the way
    ///
    /// Returns the states reported by the second status frame.
    fn run_session(&self, desired: &BTreeMap<Socket, bool>) -> Result<BTreeMap<Socket, bool>> {
        let mut session = Session::open(&self.address, self.port, self.timeouts)?;

        let task = session.handshake(&self.key)?;

        // The device always sends a status frame here; its contents are
        // superseded by the one after the control frame.
        let _ = session.read_status(&task, &self.key)?;

        session.send_control(&ControlFrame::encode(desired, &task, &self.key))?;

        let states = session.read_status(&task, &self.key)?;
        debug_assert_eq!(session.state(), SessionState::SecondStatusReceived);
        session.close();

        Ok(states)
    }
}

impl PowerStrip for NativeClient {
    fn switch(&self, desired: &BTreeMap<Socket, bool>) -> Result<()> {
        tracing::debug!("Switching {:?} on {}:{}", desired, self.address, self.port);
        self.run_session(desired).map(|_| ())
    }

    fn status(&self) -> Result<StripStatus> {
        let states = self.run_session(&BTreeMap::new())?;
        Ok(StripStatus { states, names: None })
    }
}

// =============================================================================
// Session
// =============================================================================

/// Where a session currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionState {
    Disconnected,
    Connected,
    HandshakeSent,
    ChallengeReceived,
    SolutionSent,
    FirstStatusReceived,
    ControlSent,
    SecondStatusReceived,
}

/// One TCP session with the device
///
/// Dropping the session closes the connection, so every early return from a
/// failed step releases the socket.
pub(crate) struct Session {
    stream: TcpStream,
    peer_addr: String,
    state: SessionState,
}

impl Session {
    /// Connect to the device
    pub(crate) fn open(address: &str, port: u16, timeouts: Timeouts) -> Result<Self> {
        let stream = connect(address, port, timeouts.connect)?;
        let peer_addr = format!("{}:{}", address, port);

        stream
            .set_read_timeout(timeouts.read)
            .and_then(|_| stream.set_write_timeout(timeouts.write))
            .map_err(|e| EnergenieError::Connection(format!("{}: {}", peer_addr, e)))?;

        // Frames are tiny; don't let Nagle hold them back
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!("Could not disable Nagle for {}: {}", peer_addr, e);
        }

        tracing::debug!("Session opened to {}", peer_addr);

        let mut session = Self {
            stream,
            peer_addr,
            state: SessionState::Disconnected,
        };
        session.transition(SessionState::Connected);
        Ok(session)
    }

    /// Current state
    pub(crate) fn state(&self) -> SessionState {
        self.state
    }

    /// Send the start byte, receive the task and answer it
    pub(crate) fn handshake(&mut self, key: &Key) -> Result<Task> {
        self.expect_state(SessionState::Connected, "handshake")?;

        self.write_bytes(&[HANDSHAKE_START], "handshake start")?;
        self.transition(SessionState::HandshakeSent);

        let task = Task(self.read_array::<TASK_SIZE>("task")?);
        self.transition(SessionState::ChallengeReceived);
        tracing::trace!("Task from {}: {:02x?}", self.peer_addr, task.as_bytes());

        let solution = task.solve(key);
        self.write_bytes(solution.as_bytes(), "solution")?;
        self.transition(SessionState::SolutionSent);

        Ok(task)
    }

    /// Read and decode the next status frame
    pub(crate) fn read_status(&mut self, task: &Task, key: &Key) -> Result<BTreeMap<Socket, bool>> {
        let next = match self.state {
            SessionState::SolutionSent => SessionState::FirstStatusReceived,
            SessionState::ControlSent => SessionState::SecondStatusReceived,
            other => {
                return Err(EnergenieError::Protocol(format!(
                    "cannot read a status frame in state {:?}",
                    other
                )))
            }
        };

        let frame = StatusFrame(self.read_array::<FRAME_SIZE>("status frame")?);
        self.transition(next);

        let codes = frame.codes(task, key);
        tracing::trace!(
            "Status frame from {}: raw={:02x?} codes={:02x?} firmware={:?}",
            self.peer_addr,
            frame.as_bytes(),
            codes,
            codes.iter().find_map(|code| firmware_revision(*code))
        );

        Ok(frame.decode(task, key))
    }

    /// Send the control frame
    pub(crate) fn send_control(&mut self, frame: &ControlFrame) -> Result<()> {
        self.expect_state(SessionState::FirstStatusReceived, "send a control frame")?;

        tracing::trace!("Control frame to {}: {:02x?}", self.peer_addr, frame.as_bytes());
        self.write_bytes(frame.as_bytes(), "control frame")?;
        self.transition(SessionState::ControlSent);
        Ok(())
    }

    /// Close the connection
    pub(crate) fn close(self) {
        // Drop does the work
    }

    fn expect_state(&self, expected: SessionState, action: &str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(EnergenieError::Protocol(format!(
                "cannot {} in state {:?} (expected {:?})",
                action, self.state, expected
            )))
        }
    }

    fn transition(&mut self, next: SessionState) {
        tracing::trace!("{}: {:?} -> {:?}", self.peer_addr, self.state, next);
        self.state = next;
    }

    fn write_bytes(&mut self, bytes: &[u8], what: &str) -> Result<()> {
        self.stream
            .write_all(bytes)
            .and_then(|_| self.stream.flush())
            .map_err(|e| protocol_io_error(&self.peer_addr, what, e))
    }

    fn read_array<const N: usize>(&mut self, what: &str) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.stream
            .read_exact(&mut buf)
            .map_err(|e| protocol_io_error(&self.peer_addr, what, e))?;
        Ok(buf)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // The peer may already be gone; the socket is released either way
        let _ = self.stream.shutdown(Shutdown::Both);
        self.transition(SessionState::Disconnected);
        tracing::debug!("Session closed to {}", self.peer_addr);
    }
}

/// Resolve and connect, trying each resolved address in turn
fn connect(address: &str, port: u16, timeout: Duration) -> Result<TcpStream> {
    let addrs: Vec<SocketAddr> = (address, port)
        .to_socket_addrs()
        .map_err(|e| EnergenieError::Connection(format!("cannot resolve {}:{}: {}", address, port, e)))?
        .collect();

    let mut last_error = None;
    for addr in addrs {
        tracing::trace!("Connecting to {} (timeout={:?})", addr, timeout);
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                tracing::debug!("Connect to {} failed: {}", addr, e);
                last_error = Some(e);
            }
        }
    }

    Err(EnergenieError::Connection(match last_error {
        Some(e) => format!("cannot connect to {}:{}: {}", address, port, e),
        None => format!("{}:{} resolved to no addresses", address, port),
    }))
}

fn protocol_io_error(peer_addr: &str, what: &str, error: io::Error) -> EnergenieError {
    let detail = match error.kind() {
        io::ErrorKind::UnexpectedEof => "connection closed before it was complete".to_string(),
        // Unix reports an elapsed deadline as WouldBlock, Windows as TimedOut
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => "timed out".to_string(),
        _ => error.to_string(),
    };
    EnergenieError::Protocol(format!("{} from/to {}: {}", what, peer_addr, detail))
}
