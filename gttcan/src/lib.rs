//! Globally Time-Triggered CAN (GTTCAN) protocol core.
//!
//! A GTTCAN network runs a static, network-wide schedule: every node knows
//! in advance which slot it transmits into and when, so no two nodes ever
//! contend for the bus. One node (the time master) additionally transmits
//! periodic reference frames carrying the network's shared clock; every
//! other node disciplines its own clock against those frames using a
//! fault-tolerant trimmed-mean average, so a single glitched or delayed
//! reading never drags the rest of the network off schedule.
//!
//! This crate is the protocol state machine only. It never touches a CAN
//! controller or a timer peripheral directly — see [`gttcan_hal::Callbacks`]
//! for the contract a host implements to drive a [`Gttcan`] node.
#![cfg_attr(not(test), no_std)]

pub mod bits;
pub mod consts;
pub mod error;
pub mod fta;
#[cfg(feature = "global")]
pub mod global;
mod node;
mod rx;
mod tx;
pub mod schedule;

pub use error::GttcanError;
pub use fta::ErrorAccumulator;
pub use node::Gttcan;
pub use schedule::{GlobalSchedule, LocalSchedule, SlotEntry};

#[cfg(feature = "global")]
pub use global::GlobalNode;

pub use gttcan_hal::{Callbacks, DiagnosticEvent, FrameId, Nut, ReferencePayload};
