//! Manager session lifecycle
//!
//! Owns the TCP connection to the manager interface: connect, log in,
//! stream, and reconnect forever. This process is a permanent resident;
//! transport faults are logged and retried with a configured back-off,
//! never propagated. `next_message` is therefore infallible: it returns
//! the next decoded message however long that takes.

use std::fmt;
use std::time::Duration;

use amibridge_ami_core::frame::READ_CHUNK_SIZE;
use amibridge_ami_core::{Action, Error as AmiError, FrameBuffer, RawMessage};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info};

use crate::config::AmiConfig;

/// Lifecycle of the manager connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Authenticating,
    Streaming,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting",
            Self::Authenticating => "Authenticating",
            Self::Streaming => "Streaming",
        };
        write!(f, "{}", name)
    }
}

/// One live TCP connection with its frame accumulator
struct Connection {
    stream: TcpStream,
    frames: FrameBuffer,
}

impl Connection {
    async fn open(config: &AmiConfig, connect_timeout: Duration) -> Result<Self, AmiError> {
        let connect = TcpStream::connect((config.host.as_str(), config.port));
        let stream = match timeout(connect_timeout, connect).await {
            Ok(connected) => connected?,
            Err(_) => {
                return Err(AmiError::Io(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "connect timed out",
                )))
            }
        };
        Ok(Self {
            stream,
            frames: FrameBuffer::new(),
        })
    }

    async fn send(&mut self, action: &Action) -> Result<(), AmiError> {
        self.stream.write_all(action.to_wire().as_bytes()).await?;
        Ok(())
    }

    /// Read until one complete block is available
    ///
    /// No read timeout here: the manager is silent between calls and a
    /// quiet stream is normal. Read-of-zero means the peer closed.
    async fn next_block(&mut self) -> Result<String, AmiError> {
        loop {
            if let Some(block) = self.frames.next_block() {
                return Ok(block);
            }
            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(AmiError::ConnectionClosed);
            }
            self.frames.push(&chunk[..n]);
        }
    }
}

/// Drives the connection state machine and yields decoded messages
pub struct SessionManager {
    config: AmiConfig,
    reconnect_delay: Duration,
    connect_timeout: Duration,
    state: SessionState,
    connection: Option<Connection>,
}

impl SessionManager {
    /// Create a manager starting in `Disconnected`, owning no socket yet
    pub fn new(config: AmiConfig, reconnect_delay: Duration, connect_timeout: Duration) -> Self {
        Self {
            config,
            reconnect_delay,
            connect_timeout,
            state: SessionState::Disconnected,
            connection: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Yield the next decoded message from the stream
    ///
    /// Connects and logs in on demand. Any connect, write, or read fault
    /// drops the connection, waits the configured back-off, and retries
    /// without bound; the call returns only with a message.
    pub async fn next_message(&mut self) -> RawMessage {
        loop {
            if self.connection.is_none() {
                self.establish().await;
            }
            // Connection is always present after establish returns.
            let Some(conn) = self.connection.as_mut() else {
                continue;
            };
            match conn.next_block().await {
                Ok(block) => return RawMessage::parse(&block),
                Err(e) => {
                    error!("manager stream from {} failed: {}", self.config.endpoint(), e);
                    self.connection = None;
                    self.set_state(SessionState::Disconnected);
                    sleep(self.reconnect_delay).await;
                }
            }
        }
    }

    /// Connect and authenticate, retrying until a session is streaming
    async fn establish(&mut self) {
        loop {
            self.set_state(SessionState::Connecting);
            match Connection::open(&self.config, self.connect_timeout).await {
                Ok(mut conn) => {
                    self.set_state(SessionState::Authenticating);
                    let login = Action::login(&self.config.username, &self.config.secret);
                    match conn.send(&login).await {
                        Ok(()) => {
                            // The login acknowledgment is not awaited; it
                            // arrives as a Response block in the stream and
                            // is discarded downstream.
                            self.connection = Some(conn);
                            self.set_state(SessionState::Streaming);
                            info!(
                                "streaming manager events from {} as {}",
                                self.config.endpoint(),
                                self.config.username
                            );
                            return;
                        }
                        Err(e) => {
                            error!("login write to {} failed: {}", self.config.endpoint(), e)
                        }
                    }
                }
                Err(e) => error!("connect to {} failed: {}", self.config.endpoint(), e),
            }
            self.set_state(SessionState::Disconnected);
            sleep(self.reconnect_delay).await;
        }
    }

    fn set_state(&mut self, next: SessionState) {
        if self.state != next {
            debug!("session state {} -> {}", self.state, next);
            self.state = next;
        }
    }
}
