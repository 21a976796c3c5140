use plenum_hashgraph::{Frame, WireEvent};
use serde::{Deserialize, Serialize};

use super::requests::KnownMap;
use super::MessageKind;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncResponse {
    pub from: String,
    pub events: Vec<WireEvent>,
    pub known: KnownMap,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EagerSyncResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FastForwardResponse {
    pub from: String,
    pub frame: Frame,
}

/// The closed set of response kinds, paired one-to-one with
/// [`Request`](super::Request) variants.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Sync(SyncResponse),
    EagerSync(EagerSyncResponse),
    FastForward(FastForwardResponse),
}

impl Response {
    pub fn kind(&self) -> MessageKind {
        match self {
            Response::Sync(_) => MessageKind::Sync,
            Response::EagerSync(_) => MessageKind::EagerSync,
            Response::FastForward(_) => MessageKind::FastForward,
        }
    }

    /// The structurally valid zero value for a kind.
    ///
    /// Written to the wire when the engine answers an envelope with an
    /// error: the error itself stays local, but the remote caller still
    /// needs a well-formed frame so its decode does not hang.
    pub fn zero(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Sync => Response::Sync(SyncResponse::default()),
            MessageKind::EagerSync => Response::EagerSync(EagerSyncResponse::default()),
            MessageKind::FastForward => Response::FastForward(FastForwardResponse::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_response_matches_its_kind() {
        for kind in [
            MessageKind::Sync,
            MessageKind::EagerSync,
            MessageKind::FastForward,
        ] {
            assert_eq!(Response::zero(kind).kind(), kind);
        }
    }
}
