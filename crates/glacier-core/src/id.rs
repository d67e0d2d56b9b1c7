//! Strongly-typed identifiers.

use std::fmt;

/// Identifies a mesh block (one partition of the domain) within a run.
///
/// `BlockId(n)` corresponds to the n-th block of the domain's block list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for BlockId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Which of a block's two state snapshots a diagnostic run reads and writes.
///
/// Selected once at the top of the pipeline. Leaf components never see it;
/// they receive the chosen snapshot directly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TimeLevel {
    /// The snapshot holding the state at the start of the current step.
    #[default]
    Current,
    /// The snapshot being filled by the time integrator for the next step.
    Next,
}

impl fmt::Display for TimeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Current => write!(f, "current"),
            Self::Next => write!(f, "next"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_id_display_and_from() {
        let id = BlockId::from(7);
        assert_eq!(id, BlockId(7));
        assert_eq!(id.to_string(), "7");
    }

    #[test]
    fn time_level_defaults_to_current() {
        assert_eq!(TimeLevel::default(), TimeLevel::Current);
        assert_eq!(TimeLevel::Next.to_string(), "next");
    }
}
