//! Capability record and CAN wire layout for the GTTCAN protocol core.
//!
//! A GTTCAN node never touches a CAN controller or a timer peripheral
//! directly — it is driven entirely through [`Callbacks`], a small trait the
//! host implements once over its own state. This mirrors a hardware
//! abstraction layer: the core names an operation ("transmit this frame",
//! "arm the timer"), the host supplies the device-specific code that carries
//! it out.
#![no_std]

pub mod callbacks;
pub mod diag;
pub mod frame;
pub mod time;

pub use callbacks::Callbacks;
pub use diag::DiagnosticEvent;
pub use frame::{FrameId, ReferencePayload};
pub use time::Nut;
