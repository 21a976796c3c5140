//! Pooled TCP transport.
//!
//! One [`NetTransport`] per process side: it binds a listener, turns
//! every accepted connection into a sequence of request/response
//! exchanges delivered to the engine through a bounded queue, and makes
//! outbound calls over a per-peer pool of reusable connections.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::protocol::{
    EagerSyncRequest, EagerSyncResponse, FastForwardRequest, FastForwardResponse, MessageKind,
    Request, Response, Result, Rpc, SyncRequest, SyncResponse, TransportError,
};

use super::codec;
use super::pool::ConnPool;

/// Transport configuration.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Address the listener binds to.
    pub bind_addr: String,
    /// Address advertised to peers, when it differs from the bound one
    /// (e.g. behind NAT). `None` advertises the bound address.
    pub advertise_addr: Option<String>,
    /// Maximum idle connections kept per peer. Also the capacity of the
    /// inbound delivery queue.
    pub max_pool: usize,
    /// Timeout applied to dialing and to each frame read/write. Also
    /// bounds how long an inbound connection may sit idle between
    /// requests.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:0".to_string(),
            advertise_addr: None,
            max_pool: 4,
            timeout: Duration::from_secs(5),
        }
    }
}

/// Engine-side endpoint of the inbound delivery queue.
///
/// Cloneable; every clone draws from the same queue. Each received
/// [`Rpc`] must be answered exactly once via its responder.
#[derive(Clone)]
pub struct RpcConsumer {
    rx: Arc<Mutex<mpsc::Receiver<Rpc>>>,
}

impl RpcConsumer {
    /// Next inbound RPC, or `None` once the transport has shut down and
    /// the queue is drained.
    pub async fn recv(&self) -> Option<Rpc> {
        self.rx.lock().await.recv().await
    }
}

/// The pooled RPC transport.
///
/// Outbound calls ([`sync`], [`eager_sync`], [`fast_forward`]) hide
/// dial-or-reuse, framing, and timeouts. Inbound requests surface on the
/// queue behind [`consumer`]; the engine answers each envelope and the
/// originating connection worker writes the response back.
///
/// [`sync`]: NetTransport::sync
/// [`eager_sync`]: NetTransport::eager_sync
/// [`fast_forward`]: NetTransport::fast_forward
/// [`consumer`]: NetTransport::consumer
pub struct NetTransport {
    config: TransportConfig,
    bound_addr: SocketAddr,
    pool: ConnPool,
    consumer: RpcConsumer,
    shutdown_tx: watch::Sender<bool>,
    accept_handle: JoinHandle<()>,
}

impl NetTransport {
    /// Binds the listener and starts accepting inbound connections.
    pub async fn bind(config: TransportConfig) -> Result<Self> {
        let listener = TcpListener::bind(&config.bind_addr).await.map_err(|err| {
            TransportError::Connection(format!("failed to bind {}: {}", config.bind_addr, err))
        })?;
        let bound_addr = listener
            .local_addr()
            .map_err(|err| TransportError::Connection(format!("failed to get local addr: {}", err)))?;

        let (queue_tx, queue_rx) = mpsc::channel(config.max_pool.max(1));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let accept_handle = tokio::spawn(accept_loop(
            listener,
            queue_tx,
            shutdown_rx,
            config.timeout,
        ));

        debug!(%bound_addr, "transport listening");

        Ok(NetTransport {
            pool: ConnPool::new(config.max_pool, config.timeout),
            consumer: RpcConsumer {
                rx: Arc::new(Mutex::new(queue_rx)),
            },
            config,
            bound_addr,
            shutdown_tx,
            accept_handle,
        })
    }

    /// The address peers should dial: the advertise address when
    /// configured, otherwise the bound one.
    pub fn local_addr(&self) -> String {
        self.config
            .advertise_addr
            .clone()
            .unwrap_or_else(|| self.bound_addr.to_string())
    }

    /// The delivery-queue endpoint the engine consumes.
    pub fn consumer(&self) -> RpcConsumer {
        self.consumer.clone()
    }

    /// Number of idle pooled connections currently resident for a peer.
    /// Diagnostic only.
    pub fn idle_pool_size(&self, addr: &str) -> usize {
        self.pool.idle_count(addr)
    }

    /// Sync exchange: send what we know, receive missing events plus the
    /// peer's known map.
    pub async fn sync(&self, target: &str, request: SyncRequest) -> Result<SyncResponse> {
        match self.call(target, Request::Sync(request)).await? {
            Response::Sync(resp) => Ok(resp),
            other => Err(kind_mismatch(MessageKind::Sync, other.kind())),
        }
    }

    /// EagerSync exchange: push events the peer is missing.
    pub async fn eager_sync(
        &self,
        target: &str,
        request: EagerSyncRequest,
    ) -> Result<EagerSyncResponse> {
        match self.call(target, Request::EagerSync(request)).await? {
            Response::EagerSync(resp) => Ok(resp),
            other => Err(kind_mismatch(MessageKind::EagerSync, other.kind())),
        }
    }

    /// FastForward exchange: request a full snapshot frame.
    pub async fn fast_forward(
        &self,
        target: &str,
        request: FastForwardRequest,
    ) -> Result<FastForwardResponse> {
        match self.call(target, Request::FastForward(request)).await? {
            Response::FastForward(resp) => Ok(resp),
            other => Err(kind_mismatch(MessageKind::FastForward, other.kind())),
        }
    }

    /// One pooled request/response exchange. The connection returns to
    /// the pool only after a fully successful exchange; any failure
    /// discards it, since its stream position is no longer trustworthy.
    async fn call(&self, target: &str, request: Request) -> Result<Response> {
        if *self.shutdown_tx.borrow() {
            return Err(TransportError::Shutdown);
        }

        let kind = request.kind();
        let mut conn = self.pool.acquire(target).await?;

        match exchange(&mut conn.stream, &request, kind, self.config.timeout).await {
            Ok(response) => {
                self.pool.release(conn);
                Ok(response)
            }
            Err(err) => {
                self.pool.discard(conn);
                Err(err)
            }
        }
    }

    /// Shuts the transport down: stops accepting, unblocks pending
    /// accepts and idle inbound reads, drains the connection pool, and
    /// fails subsequent outbound calls. Idempotent. Connection workers
    /// mid-exchange finish their current response first.
    pub fn close(&self) {
        if self.shutdown_tx.send_replace(true) {
            return;
        }
        self.accept_handle.abort();
        self.pool.close_all();
        debug!(addr = %self.bound_addr, "transport closed");
    }
}

impl Drop for NetTransport {
    fn drop(&mut self) {
        self.close();
    }
}

fn kind_mismatch(want: MessageKind, got: MessageKind) -> TransportError {
    TransportError::Protocol(format!(
        "response kind mismatch: want {:?}, got {:?}",
        want, got
    ))
}

/// Write the request and read the response of the matching kind.
async fn exchange(
    stream: &mut TcpStream,
    request: &Request,
    kind: MessageKind,
    timeout: Duration,
) -> Result<Response> {
    codec::write_request(stream, request, timeout).await?;
    codec::read_response(stream, kind, timeout).await
}

/// Accepts inbound connections until the task is aborted by `close`,
/// spawning one independent worker per connection.
async fn accept_loop(
    listener: TcpListener,
    queue: mpsc::Sender<Rpc>,
    shutdown: watch::Receiver<bool>,
    io_timeout: Duration,
) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                debug!(%peer, "accepted inbound connection");
                let queue = queue.clone();
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle_connection(stream, queue, shutdown, io_timeout).await {
                        debug!(%peer, error = %err, "inbound connection terminated");
                    }
                });
            }
            Err(err) => {
                warn!(error = %err, "accept failed");
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}

/// One inbound connection's request/response loop.
///
/// Reads a request, dispatches it to the engine, waits for the answer,
/// writes the response, and repeats on the same connection. Exchanges
/// are strictly FIFO because the next read does not start until the
/// previous response is fully written. The worker blocks only on its
/// own queue push and its own pending answer, never on state shared
/// with other connections.
async fn handle_connection(
    mut stream: TcpStream,
    queue: mpsc::Sender<Rpc>,
    mut shutdown: watch::Receiver<bool>,
    io_timeout: Duration,
) -> Result<()> {
    loop {
        let request = tokio::select! {
            res = codec::read_request(&mut stream, io_timeout) => match res {
                Ok(request) => request,
                // Also covers idle expiry and clean remote close.
                Err(err) => {
                    debug!(error = %err, "closing inbound connection");
                    return Ok(());
                }
            },
            _ = shutdown.changed() => return Ok(()),
        };

        let kind = request.kind();
        let (rpc, answer) = Rpc::new(request);

        // Blocks when the delivery queue is full, back-pressuring this
        // connection only.
        if queue.send(rpc).await.is_err() {
            return Err(TransportError::Shutdown);
        }

        // No timeout here: the engine is trusted to answer every
        // envelope.
        let outcome = match answer.await {
            Ok(outcome) => outcome,
            Err(_) => return Err(TransportError::Shutdown),
        };

        let response = match outcome {
            Ok(response) if response.kind() == kind => response,
            Ok(response) => {
                warn!(
                    want = ?kind,
                    got = ?response.kind(),
                    "response kind mismatch, writing zero value"
                );
                Response::zero(kind)
            }
            // Engine errors stay local; the remote still gets a
            // well-formed frame so its decode cannot hang.
            Err(err) => {
                warn!(error = %err, "rpc answered with error, writing zero value");
                Response::zero(kind)
            }
        };

        codec::write_response(&mut stream, &response, io_timeout).await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = TransportConfig::default();
        assert_eq!(config.max_pool, 4);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(config.advertise_addr.is_none());
    }

    #[tokio::test]
    async fn bound_addr_resolves_ephemeral_port() {
        let transport = NetTransport::bind(TransportConfig::default())
            .await
            .unwrap();
        assert!(!transport.local_addr().ends_with(":0"));
    }

    #[tokio::test]
    async fn advertise_addr_overrides_bound_addr() {
        let transport = NetTransport::bind(TransportConfig {
            advertise_addr: Some("10.0.0.9:12000".to_string()),
            ..TransportConfig::default()
        })
        .await
        .unwrap();

        assert_eq!(transport.local_addr(), "10.0.0.9:12000");
    }

    #[tokio::test]
    async fn outbound_call_after_close_fails_fast() {
        let transport = NetTransport::bind(TransportConfig::default())
            .await
            .unwrap();
        transport.close();

        let err = transport
            .sync(
                "127.0.0.1:1",
                SyncRequest {
                    from: "A".to_string(),
                    known: Default::default(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Shutdown));
    }
}
