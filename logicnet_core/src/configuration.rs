//! Process wide defaults for network generation
use std::sync::{LazyLock, RwLock};

use crate::optimize::matcher::CoveragePolicy;

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

/// Defaults picked up by [`crate::network::builder::GeneratorConfigBuilder`]
pub struct Configuration {
    /// How reactions with unequal numbers of input and output combinations are paired
    pub coverage_policy: CoveragePolicy,
    /// Number of combinations above which a decomposition is reported as large
    pub combination_warning_threshold: usize,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            coverage_policy: CoveragePolicy::Cartesian,
            combination_warning_threshold: 1000,
        }
    }
}

pub(crate) fn default_coverage_policy() -> CoveragePolicy {
    CONFIGURATION
        .read()
        .map(|config| config.coverage_policy)
        .unwrap_or_default()
}

pub(crate) fn default_combination_warning_threshold() -> usize {
    CONFIGURATION
        .read()
        .map(|config| config.combination_warning_threshold)
        .unwrap_or(1000)
}
