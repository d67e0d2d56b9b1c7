//! Mesh-level sigma coordinate: the fixed target layer partition.
//!
//! Sigma runs from 0 at the upper surface to 1 at the bed. Layer 0 is the
//! topmost layer.

use crate::error::MeshError;

/// Tolerance on `Σ fractions == 1`.
const FRACTION_SUM_TOLERANCE: f64 = 1.0e-10;

/// Fixed layer-thickness fractions shared by every column of a mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct SigmaLevels {
    fractions: Vec<f64>,
    interfaces: Vec<f64>,
}

impl SigmaLevels {
    /// Build sigma levels from layer-thickness fractions.
    ///
    /// Fractions must be non-empty, finite, non-negative and sum to 1.0
    /// within 1e-10. The last interface is pinned to exactly 1.0.
    pub fn new(fractions: Vec<f64>) -> Result<Self, MeshError> {
        if fractions.is_empty() {
            return Err(MeshError::InvalidSigma {
                reason: "at least one layer is required".to_string(),
            });
        }
        if let Some((k, &f)) = fractions
            .iter()
            .enumerate()
            .find(|(_, f)| !f.is_finite() || **f < 0.0)
        {
            return Err(MeshError::InvalidSigma {
                reason: format!("fraction {k} is {f}, must be finite and non-negative"),
            });
        }
        let sum: f64 = fractions.iter().sum();
        if (sum - 1.0).abs() > FRACTION_SUM_TOLERANCE {
            return Err(MeshError::InvalidSigma {
                reason: format!("fractions sum to {sum}, expected 1.0"),
            });
        }

        let mut interfaces = Vec::with_capacity(fractions.len() + 1);
        interfaces.push(0.0);
        let mut acc = 0.0;
        for f in &fractions[..fractions.len() - 1] {
            acc += f;
            interfaces.push(acc);
        }
        interfaces.push(1.0);

        Ok(Self {
            fractions,
            interfaces,
        })
    }

    /// Equal-thickness layers.
    pub fn uniform(levels: usize) -> Result<Self, MeshError> {
        if levels == 0 {
            return Err(MeshError::InvalidSigma {
                reason: "at least one layer is required".to_string(),
            });
        }
        Self::new(vec![1.0 / levels as f64; levels])
    }

    /// Number of vertical layers.
    pub fn level_count(&self) -> usize {
        self.fractions.len()
    }

    /// Layer-thickness fractions, top layer first.
    pub fn fractions(&self) -> &[f64] {
        &self.fractions
    }

    /// Interface positions in sigma, `level_count() + 1` values from 0.0 to 1.0.
    pub fn interfaces(&self) -> &[f64] {
        &self.interfaces
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn uniform_interfaces() {
        let s = SigmaLevels::uniform(4).unwrap();
        assert_eq!(s.level_count(), 4);
        assert_eq!(s.interfaces(), &[0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn last_interface_pinned() {
        let s = SigmaLevels::new(vec![0.1; 10]).unwrap();
        assert_eq!(*s.interfaces().last().unwrap(), 1.0);
        assert_eq!(s.interfaces()[0], 0.0);
    }

    #[test]
    fn rejects_bad_sum() {
        assert!(matches!(
            SigmaLevels::new(vec![0.5, 0.4]),
            Err(MeshError::InvalidSigma { .. })
        ));
    }

    #[test]
    fn rejects_negative_and_empty() {
        assert!(SigmaLevels::new(vec![1.5, -0.5]).is_err());
        assert!(SigmaLevels::new(vec![]).is_err());
        assert!(SigmaLevels::uniform(0).is_err());
    }

    proptest! {
        #[test]
        fn interfaces_are_monotone_and_pinned(
            weights in prop::collection::vec(0.01f64..10.0, 1..20),
        ) {
            let total: f64 = weights.iter().sum();
            let fractions: Vec<f64> = weights.iter().map(|w| w / total).collect();
            let s = SigmaLevels::new(fractions).unwrap();
            let iface = s.interfaces();
            prop_assert_eq!(iface.len(), weights.len() + 1);
            prop_assert_eq!(iface[0], 0.0);
            prop_assert_eq!(iface[weights.len()], 1.0);
            for pair in iface.windows(2) {
                prop_assert!(pair[0] <= pair[1]);
            }
        }
    }
}
