//! Bounded per-peer pool of idle TCP connections.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::net::TcpStream;

use crate::protocol::{Result, TransportError};

/// One live TCP connection, exclusively owned by its holder from
/// `acquire` until `release` or `discard`. Dropping it closes the
/// socket.
#[derive(Debug)]
pub(crate) struct PooledConn {
    addr: String,
    pub(crate) stream: TcpStream,
}

impl PooledConn {
    /// Address this connection dials to, and the pool partition it
    /// returns to on release.
    pub(crate) fn addr(&self) -> &str {
        &self.addr
    }
}

/// Per-address table of idle connections.
///
/// Only idle connections live here; a checked-out connection belongs to
/// exactly one caller and re-enters the table through [`release`]
/// alone. Reuse is LIFO: the most recently released connection is the
/// least likely to have been idle-closed by the peer.
///
/// [`release`]: ConnPool::release
pub(crate) struct ConnPool {
    max_idle: usize,
    dial_timeout: Duration,
    idle: Mutex<HashMap<String, Vec<PooledConn>>>,
}

impl ConnPool {
    pub(crate) fn new(max_idle: usize, dial_timeout: Duration) -> Self {
        ConnPool {
            max_idle,
            dial_timeout,
            idle: Mutex::new(HashMap::new()),
        }
    }

    /// Pops an idle connection for `addr`, or dials a fresh one under
    /// the dial timeout. The table lock is never held across the dial.
    pub(crate) async fn acquire(&self, addr: &str) -> Result<PooledConn> {
        if let Some(conn) = self.pop_idle(addr) {
            tracing::debug!(%addr, "reusing pooled connection");
            return Ok(conn);
        }

        let stream = match tokio::time::timeout(self.dial_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(err)) => {
                return Err(TransportError::Connection(format!(
                    "failed to connect to {}: {}",
                    addr, err
                )))
            }
            Err(_) => {
                return Err(TransportError::Timeout(
                    self.dial_timeout.as_millis() as u64
                ))
            }
        };

        tracing::debug!(%addr, "dialed new connection");
        Ok(PooledConn {
            addr: addr.to_string(),
            stream,
        })
    }

    /// Returns a connection to its idle list if the list is below
    /// capacity; closes it otherwise. Only called after a fully
    /// successful exchange.
    pub(crate) fn release(&self, conn: PooledConn) {
        let mut idle = lock(&self.idle);
        let list = idle.entry(conn.addr.clone()).or_default();
        if list.len() < self.max_idle {
            list.push(conn);
        } else {
            tracing::debug!(addr = %conn.addr, "pool full, closing connection");
        }
    }

    /// Closes a connection without pooling it. Required after any I/O or
    /// codec failure: the stream position is no longer trustworthy.
    pub(crate) fn discard(&self, conn: PooledConn) {
        tracing::debug!(addr = %conn.addr, "discarding connection");
        drop(conn);
    }

    /// Number of idle connections currently resident for `addr`.
    pub(crate) fn idle_count(&self, addr: &str) -> usize {
        lock(&self.idle).get(addr).map(Vec::len).unwrap_or(0)
    }

    /// Drains and closes every idle connection. Used by shutdown.
    pub(crate) fn close_all(&self) {
        lock(&self.idle).clear();
    }

    fn pop_idle(&self, addr: &str) -> Option<PooledConn> {
        lock(&self.idle).get_mut(addr).and_then(Vec::pop)
    }
}

/// The critical sections only push/pop table entries, so a poisoned lock
/// still guards a consistent map; take it back rather than propagate.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
