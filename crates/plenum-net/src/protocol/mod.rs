//! Plenum RPC Protocol
//!
//! Typed request/response pairs exchanged between consensus peers, the
//! wire tag that routes them, and the envelope handed to the engine for
//! each inbound call.
//!
//! Three RPC kinds exist, paired one-to-one:
//!
//! - **Sync**: "here is what I know, send me what I'm missing"
//! - **EagerSync**: "here are events you are missing"
//! - **FastForward**: "send me a full snapshot"
//!
//! The kinds are closed enums ([`Request`], [`Response`]) rather than
//! open trait objects, so a dispatcher that forgets a kind fails to
//! compile instead of failing at runtime.

pub mod error;
pub mod requests;
pub mod responses;
pub mod rpc;

pub use error::{Result, TransportError};
pub use requests::{EagerSyncRequest, FastForwardRequest, KnownMap, Request, SyncRequest};
pub use responses::{EagerSyncResponse, FastForwardResponse, Response, SyncResponse};
pub use rpc::{Responder, Rpc, RpcOutcome};

/// Wire discriminator written ahead of every request frame, one value per
/// RPC kind. The response direction carries no tag: a connection answers
/// requests in order, so the kind is implied by the request just sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageKind {
    Sync = 0x01,
    EagerSync = 0x02,
    FastForward = 0x03,
}

impl MessageKind {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for MessageKind {
    type Error = TransportError;

    fn try_from(tag: u8) -> Result<Self> {
        match tag {
            0x01 => Ok(MessageKind::Sync),
            0x02 => Ok(MessageKind::EagerSync),
            0x03 => Ok(MessageKind::FastForward),
            other => Err(TransportError::Protocol(format!(
                "unknown message kind tag: {:#04x}",
                other
            ))),
        }
    }
}
