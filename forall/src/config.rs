//! Configuration types for controlling property runs.

use thiserror::Error;

use crate::shrink::ShrinkingMode;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Invalid number of iterations (must be > 0)
    #[error("Invalid iterations count: {0} (must be > 0)")]
    InvalidIterations(usize),
    /// A bounded shrinking mode with no evaluations at all; use `Off` instead
    #[error("Invalid shrink bound: {0} (must be > 0, use ShrinkingMode::Off to disable)")]
    InvalidShrinkBound(usize),
    /// An empty or inverted collection size range
    #[error("Invalid size range {start}..={end}")]
    InvalidSizeRange { start: usize, end: usize },
}

/// Configuration for individual property runs
#[derive(Debug, Clone, PartialEq)]
pub struct TestConfig {
    /// Number of inputs to evaluate, edge cases included
    pub iterations: usize,
    /// Optional seed for reproducible runs; a fresh one is drawn otherwise
    pub seed: Option<u64>,
    /// How much effort to spend minimizing a counterexample
    pub shrinking: ShrinkingMode,
    /// Record and log every distinct generated input
    pub verbose: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            iterations: 100,
            seed: None,
            shrinking: ShrinkingMode::default(),
            verbose: false,
        }
    }
}

impl TestConfig {
    /// Create a new test configuration with validation
    pub fn new(
        iterations: usize,
        seed: Option<u64>,
        shrinking: ShrinkingMode,
        verbose: bool,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            iterations,
            seed,
            shrinking,
            verbose,
        };
        config.validate()?;
        Ok(config)
    }

    /// Shorthand for the default configuration with a given iteration count
    pub fn with_iterations(iterations: usize) -> Self {
        Self {
            iterations,
            ..Self::default()
        }
    }

    /// Fix the seed, making the run replayable
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the shrinking mode
    pub fn shrinking(mut self, shrinking: ShrinkingMode) -> Self {
        self.shrinking = shrinking;
        self
    }

    /// Enable verbose logging of generated inputs
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Validate the test configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(ConfigError::InvalidIterations(self.iterations));
        }
        if let ShrinkingMode::Bounded(0) = self.shrinking {
            return Err(ConfigError::InvalidShrinkBound(0));
        }
        Ok(())
    }

    /// Merge this configuration with a global configuration; the seed falls
    /// back to the global default when this config has none
    pub fn merge_with_global(self, global: &GlobalConfig) -> Self {
        Self {
            seed: self.seed.or(global.default_seed),
            ..self
        }
    }

    /// Create a test configuration from global defaults
    pub fn from_global(global: &GlobalConfig) -> Self {
        Self {
            iterations: global.default_iterations,
            seed: global.default_seed,
            shrinking: global.default_shrinking,
            verbose: false,
        }
    }
}

/// Defaults shared by a group of property runs
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalConfig {
    /// Default number of iterations for runs
    pub default_iterations: usize,
    /// Default seed for reproducible runs
    pub default_seed: Option<u64>,
    /// Default shrinking mode
    pub default_shrinking: ShrinkingMode,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            default_iterations: 100,
            default_seed: None,
            default_shrinking: ShrinkingMode::default(),
        }
    }
}

impl GlobalConfig {
    /// Create a new global configuration with validation
    pub fn new(
        default_iterations: usize,
        default_seed: Option<u64>,
        default_shrinking: ShrinkingMode,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            default_iterations,
            default_seed,
            default_shrinking,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the global configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        TestConfig::from_global(self).validate()
    }
}
