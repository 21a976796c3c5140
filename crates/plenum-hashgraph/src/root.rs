//! Per-participant snapshot anchors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Anchor point marking where one participant's event history begins for
/// the recipient of a frame snapshot.
///
/// `x` and `y` are the hashes of the participant's last self-event and
/// the other-parent it referenced; `index` and `round` position the
/// anchor in the DAG. `others` records older events that later events may
/// still reference, keyed by hash. It is `None` when the participant has
/// no such stragglers, and that absence survives a round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Root {
    pub x: String,
    pub y: String,
    pub index: i64,
    pub round: i64,
    pub others: Option<BTreeMap<String, String>>,
}
