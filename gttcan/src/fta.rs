//! Fault-tolerant averaging: turns a handful of per-frame timing-error
//! samples into a single trimmed-mean correction, so that one misbehaving
//! or momentarily delayed node can't drag the rest of the network's clock
//! with it.
//!
//! Unlike a design that buffers every sample for an eventual sort, this
//! tracks only the running sum plus the single lowest and highest reading
//! seen since the last [`ErrorAccumulator::fta`] call, enough to trim both
//! outliers without storing the middle of the distribution at all.

use gttcan_hal::DiagnosticEvent;

/// Largest correction `fta` will hand back before clamping, in NUT. A
/// clock correction larger than this is almost certainly a glitched
/// sample, not a real drift — clamping rather than looping to fold it
/// into a later cycle, and reporting the clamp via diagnostics.
pub const MAX_CORRECTION: i32 = 10_000;

/// Accumulates per-reception timing-error samples and reduces them to a
/// fault-tolerant mean on demand.
pub struct ErrorAccumulator {
    error_accumulator: i64,
    lower_outlier: i32,
    upper_outlier: i32,
    slots_accumulated: u32,
    #[cfg(feature = "diag")]
    previous_accumulator: i64,
}

impl ErrorAccumulator {
    pub const fn new() -> Self {
        Self {
            error_accumulator: 0,
            lower_outlier: i32::MAX,
            upper_outlier: i32::MIN,
            slots_accumulated: 0,
            #[cfg(feature = "diag")]
            previous_accumulator: 0,
        }
    }

    #[inline]
    pub fn sample_count(&self) -> u32 {
        self.slots_accumulated
    }

    /// Records one timing-error sample, in NUT (expected arrival minus
    /// observed action time — positive means the frame arrived earlier
    /// than expected). This is the caller's responsibility
    /// to gate on `transmitted`; the accumulator itself has no notion of
    /// whether this node has ever transmitted.
    pub fn accumulate(&mut self, error: i32) {
        self.error_accumulator += error as i64;
        self.lower_outlier = self.lower_outlier.min(error);
        self.upper_outlier = self.upper_outlier.max(error);
        self.slots_accumulated += 1;
    }

    /// Computes the fault-tolerant average of the accumulated samples and
    /// unconditionally resets the accumulator state: `lower_outlier` and
    /// `upper_outlier` go back to `i32::MAX`/`i32::MIN` and the sample
    /// count to zero, ready to track the next cycle's arrivals.
    ///
    /// `n == 0`: returns 0, with `state_correction` 0.
    /// `n == 1, 2`: plain arithmetic mean; `state_correction` is the raw
    /// sum (there's nothing to trim with so few samples).
    /// `n >= 3`: trims the single lowest and single highest sample, means
    /// the remainder; `state_correction` is that mean scaled back up by
    /// `n`, so a downstream consumer that wants the *total* residual
    /// (rather than the per-slot mean) doesn't have to re-derive it.
    ///
    /// Returns `(mean, state_correction, clamp_event)`. Clamping applies
    /// to the returned mean only; `clamp_event` is set when the raw mean
    /// exceeded [`MAX_CORRECTION`] and was saturated.
    pub fn fta(&mut self) -> (i32, i32, Option<DiagnosticEvent>) {
        let n = self.slots_accumulated;
        let (raw_mean, state_correction): (i64, i64) = if n == 0 {
            (0, 0)
        } else if n <= 2 {
            (self.error_accumulator / n as i64, self.error_accumulator)
        } else {
            let trimmed_sum =
                self.error_accumulator - self.lower_outlier as i64 - self.upper_outlier as i64;
            let trimmed_n = (n - 2) as i64;
            let mean = trimmed_sum / trimmed_n;
            (mean, mean * n as i64)
        };

        #[cfg(feature = "diag")]
        {
            self.previous_accumulator = self.error_accumulator;
        }

        self.error_accumulator = 0;
        self.lower_outlier = i32::MAX;
        self.upper_outlier = i32::MIN;
        self.slots_accumulated = 0;

        let clamped_mean = raw_mean.clamp(i64::from(-MAX_CORRECTION), i64::from(MAX_CORRECTION)) as i32;
        let event = if clamped_mean as i64 != raw_mean {
            Some(DiagnosticEvent::ClockCorrectionClamped {
                requested: raw_mean as i32,
                applied: clamped_mean,
            })
        } else {
            None
        };

        (clamped_mean, state_correction as i32, event)
    }

    #[cfg(feature = "diag")]
    pub fn previous_accumulator(&self) -> i64 {
        self.previous_accumulator
    }
}

impl Default for ErrorAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Samples `[10, 12, 9, 100, -50]`, n=5, sum=81, min=-50, max=100.
    /// Trimmed mean = (81 - (-50) - 100) / 3 = 31/3 = 10 (integer
    /// division); `state_correction` = 10 * 5 = 50.
    #[test]
    fn fta_trims_outliers_before_averaging() {
        let mut acc = ErrorAccumulator::new();
        for e in [10, 12, 9, 100, -50] {
            acc.accumulate(e);
        }
        let (mean, state_correction, clamped) = acc.fta();
        assert_eq!(mean, 10);
        assert_eq!(state_correction, 50);
        assert!(clamped.is_none());
    }

    /// After any `fta()`, all accumulator state is reset.
    #[test]
    fn fta_resets_state_after_every_call() {
        let mut acc = ErrorAccumulator::new();
        acc.accumulate(5);
        acc.accumulate(-5);
        acc.accumulate(100);
        acc.fta();
        assert_eq!(acc.sample_count(), 0);
        assert_eq!(acc.lower_outlier, i32::MAX);
        assert_eq!(acc.upper_outlier, i32::MIN);
        assert_eq!(acc.error_accumulator, 0);
    }

    #[test]
    fn zero_samples_returns_zero_and_clears_correction() {
        let mut acc = ErrorAccumulator::new();
        let (mean, state_correction, clamped) = acc.fta();
        assert_eq!(mean, 0);
        assert_eq!(state_correction, 0);
        assert!(clamped.is_none());
    }

    #[test]
    fn plain_mean_below_three_samples() {
        let mut acc = ErrorAccumulator::new();
        acc.accumulate(10);
        acc.accumulate(20);
        let (mean, state_correction, _) = acc.fta();
        assert_eq!(mean, 15);
        assert_eq!(state_correction, 30);
    }

    #[test]
    fn clamps_large_corrections() {
        let mut acc = ErrorAccumulator::new();
        for _ in 0..3 {
            acc.accumulate(MAX_CORRECTION * 2);
        }
        let (mean, _, event) = acc.fta();
        assert_eq!(mean, MAX_CORRECTION);
        assert!(matches!(
            event,
            Some(DiagnosticEvent::ClockCorrectionClamped { .. })
        ));
    }
}
