//! Per-element classification bits written by the mask classifier.

use std::fmt;

/// Bit flags classifying a cell, edge or vertex.
///
/// For cells, exactly one of [`NO_ICE`](Mask::NO_ICE),
/// [`GROUNDED`](Mask::GROUNDED) and [`FLOATING`](Mask::FLOATING) holds at any
/// time; the remaining bits are independent refinements.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Mask(pub u8);

impl Mask {
    /// No ice present.
    pub const NO_ICE: Mask = Mask(1 << 0);
    /// Ice resting on the bed.
    pub const GROUNDED: Mask = Mask(1 << 1);
    /// Ice floating in hydrostatic equilibrium.
    pub const FLOATING: Mask = Mask(1 << 2);
    /// Ice thick enough to take part in the velocity solve.
    pub const DYNAMIC: Mask = Mask(1 << 3);
    /// Element on the ice margin.
    pub const MARGIN: Mask = Mask(1 << 4);

    const EXCLUSIVE: u8 = Self::NO_ICE.0 | Self::GROUNDED.0 | Self::FLOATING.0;

    /// A mask with no bits set.
    pub const fn empty() -> Self {
        Mask(0)
    }

    /// Whether every bit of `other` is set in `self`.
    pub const fn contains(self, other: Mask) -> bool {
        self.0 & other.0 == other.0
    }

    /// Return `self` with the bits of `other` added.
    pub const fn with(self, other: Mask) -> Self {
        Mask(self.0 | other.0)
    }

    /// Whether the element carries ice (grounded or floating).
    pub fn has_ice(self) -> bool {
        self.0 & (Self::GROUNDED.0 | Self::FLOATING.0) != 0
    }

    /// Whether the floating bit is set.
    pub fn is_floating(self) -> bool {
        self.contains(Self::FLOATING)
    }

    /// Whether the grounded bit is set.
    pub fn is_grounded(self) -> bool {
        self.contains(Self::GROUNDED)
    }

    /// Whether exactly one of {no-ice, grounded, floating} is set.
    pub fn is_well_formed(self) -> bool {
        (self.0 & Self::EXCLUSIVE).count_ones() == 1
    }

    /// The ice indicator used to zero ice-free columns: 1.0 or 0.0.
    pub fn ice_indicator(self) -> f64 {
        if self.has_ice() {
            1.0
        } else {
            0.0
        }
    }
}

impl std::ops::BitOr for Mask {
    type Output = Mask;

    fn bitor(self, rhs: Mask) -> Mask {
        self.with(rhs)
    }
}

impl fmt::Display for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#07b}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusive_states_are_well_formed() {
        assert!(Mask::NO_ICE.is_well_formed());
        assert!(Mask::GROUNDED.with(Mask::DYNAMIC).is_well_formed());
        assert!((Mask::FLOATING | Mask::MARGIN).is_well_formed());
    }

    #[test]
    fn conflicting_states_are_rejected() {
        assert!(!Mask::empty().is_well_formed());
        assert!(!(Mask::GROUNDED | Mask::FLOATING).is_well_formed());
        assert!(!(Mask::NO_ICE | Mask::GROUNDED).is_well_formed());
    }

    #[test]
    fn ice_indicator_tracks_ice_bits() {
        assert_eq!(Mask::NO_ICE.ice_indicator(), 0.0);
        assert_eq!(Mask::GROUNDED.ice_indicator(), 1.0);
        assert_eq!(Mask::FLOATING.ice_indicator(), 1.0);
        assert!(Mask::FLOATING.is_floating());
        assert!(!Mask::FLOATING.is_grounded());
    }
}
