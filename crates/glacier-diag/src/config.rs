//! Read-only run configuration and its validation.
//!
//! [`DiagnosticConfig`] is built once by the caller, checked with
//! [`validate()`](DiagnosticConfig::validate), and then passed by reference
//! to every stage and collaborator. Nothing in the pipeline mutates it.

use std::error::Error;
use std::fmt;

// ── AdvectionScheme ────────────────────────────────────────────────

/// Thickness-transport scheme selected for the run.
///
/// Only first-order upwind has a diagnostic counterpart here; any other
/// scheme turns the edge flux-thickness stage into a no-op.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AdvectionScheme {
    /// First-order upwind, configured as `"fo"`.
    #[default]
    FirstOrderUpwind,
    /// Any other scheme, kept by name.
    Other(String),
}

impl AdvectionScheme {
    /// Parse a configured scheme name.
    ///
    /// # Examples
    ///
    /// ```
    /// use glacier_diag::AdvectionScheme;
    ///
    /// assert_eq!(AdvectionScheme::from_name("fo"), AdvectionScheme::FirstOrderUpwind);
    /// assert!(!AdvectionScheme::from_name("fct").is_upwind());
    /// ```
    pub fn from_name(name: &str) -> Self {
        match name {
            "fo" => Self::FirstOrderUpwind,
            other => Self::Other(other.to_string()),
        }
    }

    /// Configured name of the scheme.
    pub fn name(&self) -> &str {
        match self {
            Self::FirstOrderUpwind => "fo",
            Self::Other(name) => name,
        }
    }

    /// Whether edge thickness should be upwinded.
    pub fn is_upwind(&self) -> bool {
        matches!(self, Self::FirstOrderUpwind)
    }
}

impl fmt::Display for AdvectionScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── DiagnosticConfig ───────────────────────────────────────────────

/// Physical constants and switches read by the diagnostic stages.
#[derive(Clone, Debug, PartialEq)]
pub struct DiagnosticConfig {
    /// Sea-level elevation (m). Default: 0.0.
    pub sea_level: f64,
    /// Ice density (kg m⁻³). Default: 910.0.
    pub ice_density: f64,
    /// Ocean water density (kg m⁻³). Default: 1028.0.
    pub ocean_density: f64,
    /// Thickness-transport scheme. Default: first-order upwind.
    pub advection: AdvectionScheme,
    /// Depth (m) the lower surface may sit below the bed before the cell
    /// is reported as a geometry violation. Default: 0.0.
    pub geometry_tolerance: f64,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        Self {
            sea_level: 0.0,
            ice_density: 910.0,
            ocean_density: 1028.0,
            advection: AdvectionScheme::FirstOrderUpwind,
            geometry_tolerance: 0.0,
        }
    }
}

impl DiagnosticConfig {
    /// Ratio ρ_ice / ρ_ocean used by the flotation relation.
    pub fn density_ratio(&self) -> f64 {
        self.ice_density / self.ocean_density
    }

    /// Check structural invariants.
    ///
    /// Densities must be finite and positive, sea level finite, and the
    /// geometry tolerance finite and non-negative. Ice denser than the
    /// ocean is rejected because floating ice would then sit above the
    /// water surface.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("ice_density", self.ice_density),
            ("ocean_density", self.ocean_density),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidDensity { name, value });
            }
        }
        if self.ice_density > self.ocean_density {
            return Err(ConfigError::IceDenserThanOcean {
                ice_density: self.ice_density,
                ocean_density: self.ocean_density,
            });
        }
        if !self.sea_level.is_finite() {
            return Err(ConfigError::InvalidSeaLevel {
                value: self.sea_level,
            });
        }
        if !self.geometry_tolerance.is_finite() || self.geometry_tolerance < 0.0 {
            return Err(ConfigError::InvalidTolerance {
                value: self.geometry_tolerance,
            });
        }
        Ok(())
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`DiagnosticConfig::validate()`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// A density is NaN, infinite, zero, or negative.
    InvalidDensity {
        /// Which density.
        name: &'static str,
        /// The invalid value.
        value: f64,
    },
    /// Ice density exceeds ocean density.
    IceDenserThanOcean {
        /// Configured ice density.
        ice_density: f64,
        /// Configured ocean density.
        ocean_density: f64,
    },
    /// Sea level is NaN or infinite.
    InvalidSeaLevel {
        /// The invalid value.
        value: f64,
    },
    /// Geometry tolerance is NaN, infinite, or negative.
    InvalidTolerance {
        /// The invalid value.
        value: f64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDensity { name, value } => {
                write!(f, "{name} must be finite and positive, got {value}")
            }
            Self::IceDenserThanOcean {
                ice_density,
                ocean_density,
            } => write!(
                f,
                "ice density {ice_density} exceeds ocean density {ocean_density}"
            ),
            Self::InvalidSeaLevel { value } => {
                write!(f, "sea_level must be finite, got {value}")
            }
            Self::InvalidTolerance { value } => {
                write!(
                    f,
                    "geometry_tolerance must be finite and non-negative, got {value}"
                )
            }
        }
    }
}

impl Error for ConfigError {}
