//! Diagnostic events the core reports through the host-supplied sink.
//!
//! The core never blocks, allocates, or assumes a logging facade is linked
//! in. Instead it hands the host a small enum describing what happened;
//! the host's [`Callbacks::on_diagnostic`](crate::Callbacks::on_diagnostic)
//! implementation decides whether that becomes a `log::warn!`, a
//! `defmt::warn!`, a blinking LED, or nothing at all.

/// A condition worth reporting but not worth failing an operation over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DiagnosticEvent {
    /// More local-schedule entries were addressed to this node at `init`
    /// than the fixed-capacity local schedule could hold. The node was
    /// still constructed; only the first `MAX_LOCAL` entries are tracked.
    LocalScheduleTruncated {
        /// Number of matching entries that did not fit.
        dropped: u16,
    },
    /// A clock correction computed by [`accumulate`](crate) exceeded the
    /// configured clamp and was saturated rather than applied in full.
    ClockCorrectionClamped {
        /// The correction before clamping, in NUT.
        requested: i32,
        /// The correction actually applied, in NUT.
        applied: i32,
    },
}
