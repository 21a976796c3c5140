//! Plenum Transport Layer
//!
//! TCP transport for consensus RPC: framing codec, per-peer connection
//! pool, and the pooled transport facade with its inbound dispatcher.
//!
//! # Wire Format
//!
//! ```text
//! request:  [1-byte kind tag] [4-byte length as u32 big-endian] [JSON data]
//! response: [4-byte length as u32 big-endian] [JSON data]
//! ```
//!
//! Connections are reused symmetrically: a dialed connection carries many
//! sequential exchanges and then parks in the pool, and the accepting
//! side keeps reading further requests off the same connection until it
//! idles out, fails, or the transport shuts down.

mod codec;
mod pool;
mod tcp;

pub use tcp::{NetTransport, RpcConsumer, TransportConfig};
