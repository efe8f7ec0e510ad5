//! Network Listener - TCP Reward Ingestion
//!
//! `TigerStyle`: Bounded connection pool, lenient parsing, deterministic
//! shutdown.
//!
//! # Protocol
//!
//! Plain TCP. A payload is an ASCII comma-separated list of floating-point
//! values terminated by newline or stream end; one bus push per payload.
//! Parsing is lenient: blank tokens are skipped, malformed and non-finite
//! tokens are dropped without aborting the rest of the payload, and a
//! payload yielding zero valid values is discarded entirely (the connection
//! stays open). Reads are capped at the configured line limit; an over-long
//! line is discarded in bounded chunks without ever buffering it whole.
//!
//! # Shutdown
//!
//! [`NetworkListener::stop`] flips a watch channel; the accept loop and
//! every connection task select on it, so pending `accept`/`read` calls
//! unblock promptly and their sockets close on drop. `stop` then joins the
//! accept task, which in turn joins all connection tasks.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::bus::{RewardBus, RewardSample};
use crate::config::ListenerConfig;

// =============================================================================
// Error Types
// =============================================================================

/// Errors from listener setup.
///
/// Per-payload parse failures are recovered locally and never surface here.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// Socket-level failure while binding
    #[error("listener I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for listener operations.
pub type ListenerResult<T> = Result<T, ListenerError>;

// =============================================================================
// Listener
// =============================================================================

/// Accepts reward samples from remote senders and pushes them into the bus.
///
/// Runs entirely off the tick thread; the tick loop never touches sockets.
#[derive(Debug)]
pub struct NetworkListener {
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    accept_task: JoinHandle<()>,
}

impl NetworkListener {
    /// Bind the listening socket and start accepting connections.
    ///
    /// # Errors
    /// Returns [`ListenerError::Io`] if the port cannot be bound.
    pub async fn bind(config: ListenerConfig, bus: Arc<RewardBus>) -> ListenerResult<Self> {
        let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
        let local_addr = listener.local_addr()?;
        let (shutdown, shutdown_rx) = watch::channel(false);

        info!(%local_addr, max_connections = config.max_connections, "reward listener started");
        let accept_task = tokio::spawn(accept_loop(listener, bus, config, shutdown_rx));

        Ok(Self {
            local_addr,
            shutdown,
            accept_task,
        })
    }

    /// The address the listener is bound to (useful with port 0).
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting, unblock every pending accept/read, and join cleanly.
    ///
    /// Callable from any task; idempotent by construction (consumes self).
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(error) = self.accept_task.await {
            warn!(%error, "accept task failed during shutdown");
        }
        info!(local_addr = %self.local_addr, "reward listener stopped");
    }
}

async fn accept_loop(
    listener: TcpListener,
    bus: Arc<RewardBus>,
    config: ListenerConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    let semaphore = Arc::new(Semaphore::new(config.max_connections));
    let mut connections: JoinSet<()> = JoinSet::new();

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => match Arc::clone(&semaphore).try_acquire_owned() {
                    Ok(permit) => {
                        debug!(%peer, "connection accepted");
                        connections.spawn(handle_connection(
                            stream,
                            peer,
                            Arc::clone(&bus),
                            config.line_bytes_max,
                            shutdown.clone(),
                            permit,
                        ));
                    }
                    // Dropping the stream closes the socket.
                    Err(_) => warn!(%peer, "connection pool full, refusing connection"),
                },
                Err(error) => warn!(%error, "accept failed"),
            }
        }
    }

    // Listening socket drops here; connection tasks observe the same
    // shutdown channel and exit, then we join them all.
    while connections.join_next().await.is_some() {}
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    bus: Arc<RewardBus>,
    line_bytes_max: usize,
    mut shutdown: watch::Receiver<bool>,
    _permit: OwnedSemaphorePermit,
) {
    let mut reader = BufReader::new(stream);
    let mut line: Vec<u8> = Vec::new();

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            read = read_payload(&mut reader, &mut line, line_bytes_max) => match read {
                Ok(PayloadRead::Eof) => break,
                Ok(PayloadRead::Oversized) => {
                    warn!(%peer, limit = line_bytes_max, "payload exceeds line limit, dropped");
                }
                Ok(PayloadRead::Line) => {
                    let text = String::from_utf8_lossy(&line);
                    match parse_payload(&text) {
                        Some(sample) => bus.push(sample),
                        None => debug!(%peer, "discarded payload with zero valid values"),
                    }
                }
                Err(error) => {
                    debug!(%peer, %error, "read failed, closing connection");
                    break;
                }
            }
        }
    }

    debug!(%peer, "connection closed");
}

/// Outcome of reading one payload line under the length cap.
#[derive(Debug, PartialEq, Eq)]
enum PayloadRead {
    /// A complete payload (newline- or EOF-terminated) within the limit
    Line,
    /// The line exceeded the limit; its remainder was skipped in bounded
    /// chunks and the stream is positioned at the next payload
    Oversized,
    /// Stream end with nothing pending
    Eof,
}

/// Read one newline-terminated payload into `line`, never holding more than
/// `line_bytes_max + 1` bytes of it in memory at once.
///
/// The cap is enforced *during* the read via [`AsyncReadExt::take`]: an
/// over-long line is detected as soon as it passes the limit and its tail is
/// consumed chunk by chunk, so a sender streaming bytes without a newline
/// cannot grow the buffer without bound.
#[allow(clippy::cast_possible_truncation)]
async fn read_payload<R: AsyncRead + Unpin>(
    reader: &mut BufReader<R>,
    line: &mut Vec<u8>,
    line_bytes_max: usize,
) -> std::io::Result<PayloadRead> {
    line.clear();
    let cap = line_bytes_max as u64 + 1;
    let read = (&mut *reader).take(cap).read_until(b'\n', line).await?;
    if read == 0 {
        return Ok(PayloadRead::Eof);
    }
    if line.len() <= line_bytes_max {
        return Ok(PayloadRead::Line);
    }

    // Skip the rest of the over-long line, reusing `line` as a bounded
    // scratch buffer; EOF mid-skip surfaces as Eof on the next call.
    while !line.ends_with(b"\n") {
        line.clear();
        let skipped = (&mut *reader).take(cap).read_until(b'\n', line).await?;
        if skipped == 0 {
            break;
        }
    }
    line.clear();
    Ok(PayloadRead::Oversized)
}

/// Parse one payload line leniently.
///
/// Blank tokens are skipped, malformed tokens are dropped, and `None` is
/// returned when no valid value remains. Non-finite values (`inf`, `nan`)
/// count as malformed: an infinite reward would pin a slot's salience
/// forever and a NaN would break salience ordering, so they must never
/// reach the bus.
fn parse_payload(line: &str) -> Option<RewardSample> {
    let mut values = Vec::new();
    let mut malformed = 0usize;

    for token in line.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match token.parse::<f32>() {
            Ok(value) if value.is_finite() => values.push(value),
            _ => malformed += 1,
        }
    }

    if malformed > 0 {
        debug!(malformed, "dropped malformed tokens from payload");
    }

    if values.is_empty() {
        None
    } else {
        Some(RewardSample::new(values))
    }
}
