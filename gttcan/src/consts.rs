//! Compile-time tunables. Overridable via Cargo features rather than the
//! original's `#ifndef GTTCAN_MAX_SLOTS` / `#define` pattern.

/// Maximum number of entries the global schedule can hold.
#[cfg(not(feature = "large-schedule"))]
pub const MAX_SLOTS: usize = 512;
#[cfg(feature = "large-schedule")]
pub const MAX_SLOTS: usize = 4096;

/// Maximum number of global-schedule entries a single node may own (i.e.
/// slots this node transmits into).
#[cfg(not(feature = "large-schedule"))]
pub const MAX_LOCAL: usize = 32;
#[cfg(feature = "large-schedule")]
pub const MAX_LOCAL: usize = 512;

/// Default delay, in NUT, between a reference frame's arrival and the
/// first data slot's transmit instant, used when a platform-specific
/// offset isn't supplied. Mirrors `GTTCAN_DEFAULT_SLOT_OFFSET`'s
/// non-STM32 branch; the STM32 target variant (1600 NUT) is selected via
/// the `stm32-offset` feature.
#[cfg(not(feature = "stm32-offset"))]
pub const DEFAULT_SLOT_OFFSET: u32 = 1480;
#[cfg(feature = "stm32-offset")]
pub const DEFAULT_SLOT_OFFSET: u32 = 1600;

/// The `data_id` reserved for the time-master's reference frame.
pub const NETWORK_TIME_SLOT: u16 = 0;
