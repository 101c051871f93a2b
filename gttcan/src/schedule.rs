//! Schedule model: the fixed, compile-time-bounded arrays every node holds
//! to know who transmits what, and when it is this node's own turn.
//!
//! Both schedules use the fixed-array-plus-length-counter shape rather than
//! a heap-backed `Vec`, the same shape a kernel capability table uses for
//! its fixed-size slot array, here applied to a CAN schedule instead of
//! capability handles.

use gttcan_hal::DiagnosticEvent;

use crate::consts::{MAX_LOCAL, MAX_SLOTS};
use crate::error::GttcanError;

/// One entry in the global schedule: which node transmits, carrying which
/// whiteboard data id, at this schedule position. `node_id == 0` denotes an
/// empty slot; `data_id == NETWORK_TIME_SLOT` denotes the reference slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotEntry {
    pub node_id: u8,
    pub data_id: u16,
}

impl SlotEntry {
    #[inline]
    pub const fn new(node_id: u8, data_id: u16) -> Self {
        Self { node_id, data_id }
    }
}

/// The network-wide, statically agreed transmit order every node carries
/// an identical copy of.
///
/// Backed by a fixed `[SlotEntry; MAX_SLOTS]` array sized at compile time;
/// `len` tracks how many of those entries are actually in use for this
/// network. Indexing beyond `len` is a logic error the accessors refuse
/// rather than silently read stale entries.
pub struct GlobalSchedule {
    entries: [SlotEntry; MAX_SLOTS],
    len: u16,
}

impl GlobalSchedule {
    /// Builds a schedule from a caller-provided slice. Fails only if the
    /// slice is empty or longer than `MAX_SLOTS` — there is no partial
    /// construction for the global schedule, unlike the per-node local
    /// schedule, because every node must agree on the full order.
    pub fn new(slots: &[SlotEntry]) -> Result<Self, GttcanError> {
        if slots.is_empty() || slots.len() > MAX_SLOTS {
            return Err(GttcanError::GlobalScheduleOutOfBounds);
        }
        let mut entries = [SlotEntry::default(); MAX_SLOTS];
        entries[..slots.len()].copy_from_slice(slots);
        Ok(Self {
            entries,
            len: slots.len() as u16,
        })
    }

    #[inline]
    pub fn len(&self) -> u16 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn get(&self, index: u16) -> Option<SlotEntry> {
        if index < self.len {
            Some(self.entries[index as usize])
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, SlotEntry)> + '_ {
        self.entries[..self.len as usize]
            .iter()
            .copied()
            .enumerate()
            .map(|(i, e)| (i as u16, e))
    }
}

/// One entry in a node's local schedule: a global schedule position this
/// node owns, paired with the datum it carries (cached off the global
/// schedule so the transmit path never has to look it back up).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocalEntry {
    pub slot_index: u16,
    pub data_id: u16,
}

/// The subset of global schedule positions this node itself transmits
/// into, in schedule order. Capped at `MAX_LOCAL` entries; overflow does
/// not fail construction — the node is still viable with a truncated local
/// schedule, just unable to transmit into every slot addressed to it (the
/// caller is told via [`DiagnosticEvent::LocalScheduleTruncated`]).
pub struct LocalSchedule {
    entries: [LocalEntry; MAX_LOCAL],
    len: u16,
}

impl LocalSchedule {
    /// Scans `global` for entries addressed to `node_id` and records their
    /// positions and data ids, in schedule order. Returns the built
    /// schedule and, if more matching entries existed than `MAX_LOCAL`
    /// could hold, a diagnostic event describing how many were dropped.
    pub fn build(global: &GlobalSchedule, node_id: u8) -> (Self, Option<DiagnosticEvent>) {
        let mut entries = [LocalEntry::default(); MAX_LOCAL];
        let mut len = 0usize;
        let mut dropped = 0u16;
        for (index, entry) in global.iter() {
            if entry.node_id != node_id {
                continue;
            }
            if len < MAX_LOCAL {
                entries[len] = LocalEntry {
                    slot_index: index,
                    data_id: entry.data_id,
                };
                len += 1;
            } else {
                dropped += 1;
            }
        }
        let event = if dropped > 0 {
            Some(DiagnosticEvent::LocalScheduleTruncated { dropped })
        } else {
            None
        };
        (
            Self {
                entries,
                len: len as u16,
            },
            event,
        )
    }

    #[inline]
    pub fn len(&self) -> u16 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn get(&self, index: u16) -> Option<LocalEntry> {
        if index < self.len {
            Some(self.entries[index as usize])
        } else {
            None
        }
    }

    /// True if `global_index` is one of this node's own transmit slots.
    #[inline]
    pub fn owns(&self, global_index: u16) -> bool {
        self.entries[..self.len as usize]
            .iter()
            .any(|e| e.slot_index == global_index)
    }

    pub fn iter(&self) -> impl Iterator<Item = LocalEntry> + '_ {
        self.entries[..self.len as usize].iter().copied()
    }
}

/// Forward distance, in schedule slots, from `current_index` to `target`,
/// wrapping at `schedule_len`. If `current_index == target` the
/// distance is a full wrap (`schedule_len`), never zero — a node already
/// sitting on its own next slot still has to wait a whole revolution, it
/// doesn't get to re-transmit into the same instant.
#[inline]
pub fn slots_to_next_transmit(current_index: u16, target: u16, schedule_len: u16) -> u16 {
    if schedule_len == 0 {
        return 0;
    }
    if current_index == target {
        schedule_len
    } else if current_index > target {
        schedule_len - current_index + target
    } else {
        target - current_index
    }
}

/// Forward distance, in schedule slots, from `last` up to `current_index`,
/// wrapping at `schedule_len`.
#[inline]
pub fn slots_since_last_transmit(last: u16, current_index: u16, schedule_len: u16) -> u16 {
    if schedule_len == 0 {
        return 0;
    }
    if current_index > last {
        current_index - last
    } else {
        schedule_len - last + current_index
    }
}
