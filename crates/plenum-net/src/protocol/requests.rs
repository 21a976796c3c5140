use std::collections::BTreeMap;

use plenum_hashgraph::WireEvent;
use serde::{Deserialize, Serialize};

use super::MessageKind;

/// A peer's claimed last-seen event index per participant. A value of
/// `-1` means no event of that participant is known yet.
pub type KnownMap = BTreeMap<u32, i64>;

/// "Here is what I know, send me what I'm missing."
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRequest {
    pub from: String,
    pub known: KnownMap,
}

/// "Here are events you are missing."
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EagerSyncRequest {
    pub from: String,
    pub events: Vec<WireEvent>,
}

/// "Send me a full snapshot."
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FastForwardRequest {
    pub from: String,
}

/// The closed set of request kinds a peer may send.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Sync(SyncRequest),
    EagerSync(EagerSyncRequest),
    FastForward(FastForwardRequest),
}

impl Request {
    pub fn kind(&self) -> MessageKind {
        match self {
            Request::Sync(_) => MessageKind::Sync,
            Request::EagerSync(_) => MessageKind::EagerSync,
            Request::FastForward(_) => MessageKind::FastForward,
        }
    }
}
