//! Network Unit of Time (NUT) — GTTCAN's native time unit, 0.1 microseconds.

use core::fmt;
use core::ops::{Add, Mul, Sub};

/// A duration or timestamp expressed in Network Units of Time (0.1 us each).
///
/// Wraps a plain `u32` so call sites can't accidentally pass a raw tick
/// count, a millisecond count, or a slot index where a NUT value is
/// expected — the compiler catches the mix-up instead of the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Nut(pub u32);

impl Nut {
    pub const ZERO: Self = Self(0);

    #[inline]
    pub const fn new(ticks: u32) -> Self {
        Self(ticks)
    }

    #[inline]
    pub const fn ticks(self) -> u32 {
        self.0
    }
}

impl Add for Nut {
    type Output = Nut;
    #[inline]
    fn add(self, rhs: Nut) -> Nut {
        Nut(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for Nut {
    type Output = Nut;
    #[inline]
    fn sub(self, rhs: Nut) -> Nut {
        Nut(self.0.wrapping_sub(rhs.0))
    }
}

impl Mul<u16> for Nut {
    type Output = Nut;
    #[inline]
    fn mul(self, rhs: u16) -> Nut {
        Nut(self.0.wrapping_mul(rhs as u32))
    }
}

impl From<u32> for Nut {
    #[inline]
    fn from(ticks: u32) -> Self {
        Nut(ticks)
    }
}

impl From<Nut> for u32 {
    #[inline]
    fn from(nut: Nut) -> Self {
        nut.0
    }
}

impl fmt::Display for Nut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}nut", self.0)
    }
}
