//! Plenum Hashgraph Payload Types
//!
//! This crate defines the DAG data structures that plenum peers gossip to
//! each other: individual events, their compact wire form, and the frame
//! snapshots used to fast-forward a lagging peer.
//!
//! The transport layer treats every type here as an opaque serializable
//! payload: nothing in this crate performs I/O or interprets consensus
//! semantics. All types derive `PartialEq` so exchanged values can be
//! compared field for field after a round trip, including the
//! nil-versus-empty distinction on optional collections.

pub mod event;
pub mod frame;
pub mod root;

pub use event::{Event, EventBody, WireBody, WireEvent};
pub use frame::Frame;
pub use root::Root;
