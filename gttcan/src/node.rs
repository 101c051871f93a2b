//! The node state machine: owns the schedule, the timing state, and the
//! host's [`Callbacks`] implementation, and dispatches reception and
//! timer-interrupt events into it.

use gttcan_hal::{Callbacks, DiagnosticEvent, Nut};

use crate::consts::DEFAULT_SLOT_OFFSET;
use crate::error::GttcanError;
use crate::fta::ErrorAccumulator;
use crate::schedule::{slots_to_next_transmit, GlobalSchedule, LocalSchedule, SlotEntry};

/// A GTTCAN node: the schedule it was built with, its timing state, and
/// the callback contract it drives transmission, timing, and whiteboard
/// access through.
///
/// Constructed once via [`Gttcan::init`], then driven entirely from two
/// interrupt contexts for the rest of its life: [`Gttcan::on_receive`] from
/// the CAN controller's RX interrupt, [`Gttcan::on_timer_fire`] from the
/// host's timer peripheral. Both take `&mut self`, which is what makes the
/// "never re-entrant" requirement a compile-time fact rather than a
/// convention the host has to honor on its own.
pub struct Gttcan<H: Callbacks> {
    callbacks: H,
    global: GlobalSchedule,
    local: LocalSchedule,
    node_id: u8,
    slot_duration: Nut,
    slot_offset: Nut,
    /// Whether this node owns global schedule index 0 and therefore
    /// originates reference frames.
    is_time_master: bool,

    /// Position within the local schedule that will be transmitted next.
    local_schedule_index: u16,
    /// Whether this node has observed a start-of-schedule frame (or is the
    /// master, which is always considered active) and may transmit.
    is_active: bool,
    /// Whether this node has ever transmitted since boot; guards whether
    /// reception errors are accumulated at all.
    transmitted: bool,
    /// Residual correction carried from the last `fta()` call to the next
    /// timer arming; applied at most once.
    state_correction: i32,
    /// Last fault-tolerant mean produced by `fta()`.
    error_offset: i32,

    accumulator: ErrorAccumulator,
}

impl<H: Callbacks> Gttcan<H> {
    /// Builds a node from a caller-supplied global schedule. Fails only on
    /// the hard invariants from [`GttcanError`]; a local schedule too large
    /// to fit `MAX_LOCAL` still constructs successfully; see
    /// [`crate::schedule::LocalSchedule::build`].
    pub fn init(
        global_slots: &[SlotEntry],
        node_id: u8,
        slot_duration: Nut,
        callbacks: H,
    ) -> Result<Self, GttcanError> {
        if slot_duration.ticks() == 0 {
            return Err(GttcanError::InvalidSlotDuration);
        }
        let global = GlobalSchedule::new(global_slots)?;
        let (local, truncation) = LocalSchedule::build(&global, node_id);

        // Exactly one node owns schedule index 0 and therefore originates
        // reference frames; trusts the configuration rather than scanning
        // the whole schedule for a second claimant.
        let is_time_master = global
            .get(0)
            .map(|entry| entry.node_id == node_id)
            .unwrap_or(false);

        let mut node = Self {
            callbacks,
            global,
            local,
            node_id,
            slot_duration,
            slot_offset: Nut::new(DEFAULT_SLOT_OFFSET),
            is_time_master,
            local_schedule_index: 0,
            // Masters are "always active": `start()` may transmit from a
            // master that never observed its own start-of-schedule frame,
            // since it's the one originating it.
            is_active: is_time_master,
            transmitted: false,
            state_correction: 0,
            error_offset: 0,
            accumulator: ErrorAccumulator::new(),
        };

        if let Some(event) = truncation {
            node.callbacks.on_diagnostic(event);
        }

        // Calling fta() once at init establishes the INT_MAX/INT_MIN
        // outlier bounds; with zero samples accumulated it's a no-op on
        // any observable state.
        node.accumulator.fta();

        Ok(node)
    }

    #[inline]
    pub fn node_id(&self) -> u8 {
        self.node_id
    }

    #[inline]
    pub fn is_time_master(&self) -> bool {
        self.is_time_master
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    #[inline]
    pub fn local_schedule_index(&self) -> u16 {
        self.local_schedule_index
    }

    #[inline]
    pub fn error_offset(&self) -> i32 {
        self.error_offset
    }

    #[inline]
    pub(crate) fn global(&self) -> &GlobalSchedule {
        &self.global
    }

    #[inline]
    pub(crate) fn local(&self) -> &LocalSchedule {
        &self.local
    }

    #[inline]
    pub(crate) fn callbacks_mut(&mut self) -> &mut H {
        &mut self.callbacks
    }

    #[inline]
    pub(crate) fn accumulator_mut(&mut self) -> &mut ErrorAccumulator {
        &mut self.accumulator
    }

    #[inline]
    pub(crate) fn slot_duration(&self) -> Nut {
        self.slot_duration
    }

    #[inline]
    pub(crate) fn transmitted(&self) -> bool {
        self.transmitted
    }

    #[inline]
    pub(crate) fn state_correction(&self) -> i32 {
        self.state_correction
    }

    #[inline]
    pub(crate) fn clear_state_correction(&mut self) {
        self.state_correction = 0;
    }

    #[inline]
    pub(crate) fn set_state_correction(&mut self, value: i32) {
        self.state_correction = value;
    }

    #[inline]
    pub(crate) fn set_error_offset(&mut self, value: i32) {
        self.error_offset = value;
    }

    /// Forward distance, in schedule slots, from `current_index` to the
    /// global-schedule position this node's `local_schedule_index` will
    /// transmit into next. `None` if this node owns no slot at all.
    pub(crate) fn slots_to_next_transmit(&self, current_index: u16) -> Option<u16> {
        let target = self.local.get(self.local_schedule_index)?;
        Some(slots_to_next_transmit(
            current_index,
            target.slot_index,
            self.global.len(),
        ))
    }

    /// Forward distance, in schedule slots, since this node's last
    /// transmission up to `current_index`. A node that has never
    /// transmitted reports `current_index` itself.
    pub(crate) fn slots_since_last_transmit(&self, current_index: u16) -> u16 {
        if !self.transmitted || self.local.is_empty() {
            return current_index;
        }
        let len = self.local.len();
        let last_slot = (self.local_schedule_index + len - 1) % len;
        let last = self
            .local
            .get(last_slot)
            .expect("last_slot is within local schedule bounds")
            .slot_index;
        crate::schedule::slots_since_last_transmit(last, current_index, self.global.len())
    }

    /// Arms the host's timer for a `distance`-slot delay from now, folding
    /// in `state_correction` exactly once: subtracted from the arming
    /// delay, clamped at zero rather than going negative. Clears
    /// `state_correction` afterward so the next arming doesn't reapply it.
    pub(crate) fn arm_timer_for(&mut self, distance: u16) {
        let nominal = self.slot_duration.ticks() as i64 * distance as i64;
        let corrected = nominal - self.state_correction as i64;
        let delay = if corrected < 0 {
            self.callbacks.on_diagnostic(DiagnosticEvent::ClockCorrectionClamped {
                requested: corrected as i32,
                applied: 0,
            });
            0
        } else {
            corrected as u32
        };
        self.callbacks.set_timer(Nut::new(delay));
        self.state_correction = 0;
    }

    /// Starts the node: sets `local_schedule_index = 0`, marks the node
    /// active, and invokes the transmission handler directly. Intended to
    /// be called once, on the master, so its first reference frame goes
    /// out without waiting on a timer interrupt to arrive first.
    pub fn start(&mut self) {
        self.local_schedule_index = 0;
        self.is_active = true;
        self.on_timer_fire();
    }

    pub(crate) fn mark_transmitted(&mut self) {
        self.transmitted = true;
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    pub(crate) fn reset_local_schedule_index(&mut self) {
        self.local_schedule_index = 0;
    }

    pub(crate) fn advance_local_schedule_index(&mut self) {
        let len = self.local.len();
        if len == 0 {
            return;
        }
        self.local_schedule_index += 1;
        if self.local_schedule_index == len {
            self.local_schedule_index = 0;
        }
    }

    #[inline]
    pub(crate) fn slot_offset(&self) -> Nut {
        self.slot_offset
    }
}
