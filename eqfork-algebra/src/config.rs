//! Algebra configuration.
use eqfork_macros::DocDefault;

/// Configurable parameters of [`Algebra`](crate::Algebra).
#[derive(DocDefault, Clone, Debug, PartialEq)]
pub struct AlgebraConfig {
    /// Relative tolerance used for numeric equality and zero tests. (Default: 1e-10)
    pub tolerance: f64,

    /// Unit placeholders are sampled from `1 ± unit_sample_range`. (Default: 0.2)
    pub unit_sample_range: f64,

    /// Seed for sampling unit placeholders. (Default: 0x5eed)
    pub unit_sample_seed: u64,

    /// Maximal number of iterations of the numeric polynomial root finder. (Default: 500)
    pub root_iterations: usize,
}
