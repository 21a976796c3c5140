//! Gossiped consensus events, in full and wire-compact forms.
//!
//! An [`Event`] names its parents by hash and carries its creator's public
//! key, which makes it self-contained but large. Peers that already share
//! most of the DAG exchange [`WireEvent`]s instead: parents collapse to
//! (creator id, index) coordinates that the receiver resolves against its
//! own store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of a full event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventBody {
    /// Transaction payloads. `None` when the creator attached no
    /// transaction list at all, which is distinct from an empty one.
    pub transactions: Option<Vec<Vec<u8>>>,
    /// Hashes of the self-parent and other-parent events.
    pub parents: Vec<String>,
    /// Public key of the creating participant.
    pub creator: Vec<u8>,
    /// Height of this event in its creator's own sequence.
    pub index: i64,
    /// Creator-local creation time.
    pub timestamp: DateTime<Utc>,
}

/// A single unit of the consensus log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub body: EventBody,
}

/// Body of a wire event.
///
/// Parent references are coordinates into the receiver's view of the DAG
/// rather than hashes: `self_parent_index` indexes into the creator's own
/// sequence, and the other-parent is addressed by its creator id plus
/// index. An unknown other-parent is conventionally `-1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireBody {
    pub transactions: Option<Vec<Vec<u8>>>,
    pub self_parent_index: i64,
    pub other_parent_creator_id: i64,
    pub other_parent_index: i64,
    pub creator_id: i64,
}

/// Compact form of an [`Event`] for peers that share DAG context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireEvent {
    pub body: WireBody,
}
