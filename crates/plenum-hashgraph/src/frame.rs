//! Consistent DAG snapshots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::event::Event;
use crate::root::Root;

/// A consistent snapshot of the DAG used to bring a lagging peer up to
/// date without replaying full history: one [`Root`] per participant,
/// keyed by participant id, plus the events above those roots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub roots: BTreeMap<String, Root>,
    pub events: Vec<Event>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventBody;
    use chrono::Utc;

    #[test]
    fn frame_round_trip() {
        let frame = Frame {
            roots: BTreeMap::from([
                (
                    "0".to_string(),
                    Root {
                        x: "x0".to_string(),
                        y: "y0".to_string(),
                        index: 4,
                        round: 2,
                        others: Some(BTreeMap::from([(
                            "o1".to_string(),
                            "oldEvent".to_string(),
                        )])),
                    },
                ),
                (
                    "1".to_string(),
                    Root {
                        x: "x1".to_string(),
                        y: "y1".to_string(),
                        index: 4,
                        round: 2,
                        others: None,
                    },
                ),
            ]),
            events: vec![Event {
                body: EventBody {
                    transactions: None,
                    parents: vec!["p1".to_string(), "p2".to_string()],
                    creator: b"creator".to_vec(),
                    index: 19,
                    timestamp: Utc::now(),
                },
            }],
        };

        let encoded = serde_json::to_vec(&frame).unwrap();
        let decoded: Frame = serde_json::from_slice(&encoded).unwrap();

        assert_eq!(frame, decoded);
    }
}
