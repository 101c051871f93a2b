//! The capability record a GTTCAN node is driven through.

use crate::diag::DiagnosticEvent;
use crate::time::Nut;

/// Everything a host must provide for `gttcan` to run a node.
///
/// This replaces the four `fp_t` function pointers plus `void *context` the
/// C core is parameterised over: one trait, implemented once over whatever
/// state the host's CAN driver and timer peripheral actually need. The core
/// never reasons about register addresses or interrupt vectors — it only
/// calls these four methods (and, optionally, the fifth diagnostic hook).
pub trait Callbacks {
    /// Transmit one CAN frame: extended identifier `id_field` (already
    /// packed per [`crate::FrameId::to_bits`]) and 64-bit data payload.
    /// Called from the timer-interrupt path; must not block.
    fn transmit(&mut self, id_field: u32, data: u64);

    /// Arm the host's timer peripheral to fire again after `delay` NUT.
    /// Called from both the timer and reception interrupt paths.
    fn set_timer(&mut self, delay: Nut);

    /// Read the current value the node holds for whiteboard entry
    /// `data_id`. Called when this node's turn to transmit that entry
    /// comes up.
    fn read_value(&self, data_id: u16) -> u64;

    /// Store a value received for whiteboard entry `data_id`. Called from
    /// the reception path whenever a non-reference frame arrives.
    fn write_value(&mut self, data_id: u16, value: u64);

    /// Report a non-fatal condition. Default implementation discards it;
    /// hosts that want visibility override this to forward into `log`,
    /// `defmt`, or any sink of their choosing.
    #[inline]
    fn on_diagnostic(&mut self, _event: DiagnosticEvent) {}
}
