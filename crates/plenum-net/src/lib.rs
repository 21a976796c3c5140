//! Plenum Network Transport
//!
//! The network transport layer for the plenum consensus engine. Peers
//! exchange consensus state ("what do you know", "here are new events",
//! "here is a full snapshot") as typed RPCs over persistent TCP
//! connections.
//!
//! # Architecture
//!
//! - [`protocol`]: request/response kinds, the RPC envelope, errors
//! - [`transport`]: wire codec, bounded per-peer connection pool, and
//!   the [`NetTransport`] facade
//!
//! Outbound, the engine calls [`NetTransport::sync`],
//! [`NetTransport::eager_sync`] or [`NetTransport::fast_forward`];
//! the transport reuses or dials a pooled connection, frames the
//! request, and decodes the paired response. Inbound, every accepted
//! connection gets its own worker that decodes requests into [`Rpc`]
//! envelopes and pushes them onto a bounded delivery queue; the engine
//! consumes the queue and answers each envelope exactly once through its
//! single-use responder.
//!
//! # Example
//!
//! ```no_run
//! use plenum_net::{NetTransport, Request, Response, SyncResponse, TransportConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> plenum_net::Result<()> {
//! let transport = NetTransport::bind(TransportConfig::default()).await?;
//! let consumer = transport.consumer();
//!
//! while let Some(rpc) = consumer.recv().await {
//!     let answer = match rpc.command() {
//!         Request::Sync(_req) => Ok(Response::Sync(SyncResponse::default())),
//!         _ => Err(plenum_net::TransportError::Handler(
//!             "not supported".to_string(),
//!         )),
//!     };
//!     rpc.respond(answer);
//! }
//! # Ok(())
//! # }
//! ```

pub mod protocol;
pub mod transport;

pub use protocol::{
    EagerSyncRequest, EagerSyncResponse, FastForwardRequest, FastForwardResponse, KnownMap,
    MessageKind, Request, Responder, Response, Result, Rpc, RpcOutcome, SyncRequest, SyncResponse,
    TransportError,
};
pub use transport::{NetTransport, RpcConsumer, TransportConfig};
