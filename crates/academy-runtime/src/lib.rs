#![deny(warnings)]

//! Session runtime: state transitions and the single-writer game loop.
//!
//! [`actions`] holds the pure transitions: each takes the current snapshot
//! and returns a full replacement, or `None` when a guard rejects the
//! operation (insufficient currency, level at cap, nothing to assign).
//! [`session`] serializes those transitions: one actor owns the snapshot,
//! applies ticks and player commands in arrival order, and broadcasts every
//! committed snapshot to observers.

pub mod actions;
pub mod session;

pub use actions::OfflineReward;
pub use session::{Command, SessionHandle};
