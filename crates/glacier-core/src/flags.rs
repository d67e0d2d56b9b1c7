//! The aggregate error-flag side channel.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Bitwise-OR aggregate of every block's and every step's error flag.
///
/// A non-empty value at the end of a diagnostic run is a request to abort
/// the simulation. Flags never clear within a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ErrorFlags(u32);

impl ErrorFlags {
    /// No error.
    pub const NONE: ErrorFlags = ErrorFlags(0);
    /// Lower surface below bed elevation in at least one cell.
    pub const GEOMETRY: ErrorFlags = ErrorFlags(1 << 0);
    /// The mask classifier reported a failure.
    pub const MASK: ErrorFlags = ErrorFlags(1 << 1);
    /// The velocity solver reported a failure.
    pub const VELOCITY: ErrorFlags = ErrorFlags(1 << 2);
    /// Cell-centred velocity reconstruction failed.
    pub const RECONSTRUCT: ErrorFlags = ErrorFlags(1 << 3);
    /// A built-in stage could not read or write a field it declared.
    pub const STAGE: ErrorFlags = ErrorFlags(1 << 4);

    const NAMES: [(ErrorFlags, &'static str); 5] = [
        (Self::GEOMETRY, "geometry"),
        (Self::MASK, "mask"),
        (Self::VELOCITY, "velocity"),
        (Self::RECONSTRUCT, "reconstruct"),
        (Self::STAGE, "stage"),
    ];

    /// Raw bit value, for interop with integer error codes.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` if no flag is raised.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether every bit of `other` is raised in `self`.
    pub const fn contains(self, other: ErrorFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ErrorFlags {
    type Output = ErrorFlags;

    fn bitor(self, rhs: ErrorFlags) -> ErrorFlags {
        ErrorFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for ErrorFlags {
    fn bitor_assign(&mut self, rhs: ErrorFlags) {
        self.0 |= rhs.0;
    }
}

impl FromIterator<ErrorFlags> for ErrorFlags {
    fn from_iter<I: IntoIterator<Item = ErrorFlags>>(iter: I) -> Self {
        iter.into_iter().fold(Self::NONE, |acc, f| acc | f)
    }
}

impl fmt::Display for ErrorFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        let mut first = true;
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        Ok(())
    }
}
