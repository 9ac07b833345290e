//! Solver configuration.
use serde::Deserialize;

use eqfork_algebra::AlgebraConfig;
use eqfork_macros::DocDefault;

/// Configurable parameters used during solving.
#[derive(DocDefault, Clone, Debug, PartialEq)]
pub struct SolverConfig {
    /// Number of passes without reaching a fixed point after which solving fails. (Default: 1000)
    pub max_passes: usize,

    /// Relative tolerance used for numeric equality and zero tests. (Default: 1e-10)
    pub tolerance: f64,

    /// Units are replaced by random values from `1 ± unit_sample_range` when comparing
    /// expressions. (Default: 0.2)
    pub unit_sample_range: f64,

    /// Seed for the random unit values. (Default: 0x5eed)
    pub unit_sample_seed: u64,

    /// Iteration limit of the numeric root finder for polynomials of degree three or more.
    /// (Default: 500)
    pub root_iterations: usize,
}

impl SolverConfig {
    /// The part of the configuration used by the bundled algebra.
    pub fn algebra_config(&self) -> AlgebraConfig {
        AlgebraConfig {
            tolerance: self.tolerance,
            unit_sample_range: self.unit_sample_range,
            unit_sample_seed: self.unit_sample_seed,
            root_iterations: self.root_iterations,
        }
    }
}

/// A partial configuration.
///
/// Every option that is set overrides the corresponding option of a [`SolverConfig`]. This can be
/// deserialized, e.g. from a TOML file.
#[derive(Deserialize, Default, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SolverConfigUpdate {
    pub max_passes: Option<usize>,
    pub tolerance: Option<f64>,
    pub unit_sample_range: Option<f64>,
    pub unit_sample_seed: Option<u64>,
    pub root_iterations: Option<usize>,
}

impl SolverConfigUpdate {
    /// Create an empty config update.
    pub fn new() -> SolverConfigUpdate {
        SolverConfigUpdate::default()
    }

    /// Options set in `other` override those set in `self`.
    pub fn merge(&mut self, other: SolverConfigUpdate) {
        self.max_passes = other.max_passes.or(self.max_passes);
        self.tolerance = other.tolerance.or(self.tolerance);
        self.unit_sample_range = other.unit_sample_range.or(self.unit_sample_range);
        self.unit_sample_seed = other.unit_sample_seed.or(self.unit_sample_seed);
        self.root_iterations = other.root_iterations.or(self.root_iterations);
    }

    /// Overrides the options set in this update.
    pub fn apply(&self, config: &mut SolverConfig) {
        if let Some(value) = self.max_passes {
            config.max_passes = value;
        }
        if let Some(value) = self.tolerance {
            config.tolerance = value;
        }
        if let Some(value) = self.unit_sample_range {
            config.unit_sample_range = value;
        }
        if let Some(value) = self.unit_sample_seed {
            config.unit_sample_seed = value;
        }
        if let Some(value) = self.root_iterations {
            config.root_iterations = value;
        }
    }
}
