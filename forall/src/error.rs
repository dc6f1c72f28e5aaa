//! Error types and result handling for property-based testing.

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;
use crate::property::Args;

/// Error type shared by generation, evaluation and configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropertyError {
    /// The property body rejected an input, either by returning an error,
    /// returning `false`, or panicking
    #[error("Property failed: {message}{}", format_iteration(.iteration))]
    PropertyFailed {
        message: String,
        /// Messages of the error's `source()` chain, outermost first
        chain: Vec<String>,
        iteration: Option<usize>,
    },

    /// A sized generator could not reach its target cardinality within budget
    #[error(
        "Generation exhausted: wanted {target} distinct values but produced {achieved} after {attempts} repeated draws"
    )]
    GenerationExhausted {
        target: usize,
        achieved: usize,
        attempts: usize,
    },

    /// Generator code panicked while producing a value
    #[error("Generation failed: {message}")]
    GenerationFailed { message: String },

    /// Invalid test configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Internal error in the testing framework
    #[error("Internal error: {message}")]
    Internal { message: String },
}

fn format_iteration(iteration: &Option<usize>) -> String {
    match iteration {
        Some(iter) => format!(" (iteration: {})", iter),
        None => String::new(),
    }
}

impl PropertyError {
    /// Create a simple property failed error
    pub fn property_failed(message: impl Into<String>) -> Self {
        Self::PropertyFailed {
            message: message.into(),
            chain: Vec::new(),
            iteration: None,
        }
    }

    /// Build a property failure from any error, keeping its source chain
    pub fn from_error(error: &(dyn StdError + 'static)) -> Self {
        let mut chain = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }
        Self::PropertyFailed {
            message: error.to_string(),
            chain,
            iteration: None,
        }
    }

    /// Build a property failure from a caught panic payload
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        Self::property_failed(panic_message(payload))
    }

    /// Create a generation exhausted error
    pub fn generation_exhausted(target: usize, achieved: usize, attempts: usize) -> Self {
        Self::GenerationExhausted {
            target,
            achieved,
            attempts,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Attach the iteration number to a property failure that has none yet
    pub fn at_iteration(self, iteration: usize) -> Self {
        match self {
            Self::PropertyFailed {
                message,
                chain,
                iteration: None,
            } => Self::PropertyFailed {
                message,
                chain,
                iteration: Some(iteration),
            },
            other => other,
        }
    }

    /// The outermost message followed by every cause message
    pub fn message_chain(&self) -> Vec<String> {
        match self {
            Self::PropertyFailed { message, chain, .. } => {
                let mut all = Vec::with_capacity(chain.len() + 1);
                all.push(message.clone());
                all.extend(chain.iter().cloned());
                all
            }
            other => vec![other.to_string()],
        }
    }

    /// Whether this error came from generating values rather than testing them
    pub fn is_generation_error(&self) -> bool {
        matches!(
            self,
            Self::GenerationExhausted { .. } | Self::GenerationFailed { .. }
        )
    }
}

/// Extract a readable message from a panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(e) = payload.downcast_ref::<PropertyError>() {
        e.to_string()
    } else {
        "panic with a non-string payload".to_string()
    }
}

/// Information about a property run in which every input passed
#[derive(Debug, Clone)]
pub struct TestSuccess<T> {
    /// Number of inputs evaluated
    pub iterations: usize,
    /// Seed of the random source used for the run
    pub seed: u64,
    /// Label counts recorded through the property context
    pub classifications: Vec<(String, usize)>,
    /// Distinct generated inputs in draw order, recorded only in verbose mode
    pub generated: Vec<T>,
}

/// Information about a property run that found a counterexample
#[derive(Debug, Clone)]
pub struct TestFailure<T> {
    /// The error raised by the original failing input
    pub error: PropertyError,
    /// The first input that failed
    pub original_input: T,
    /// The smallest failing input the shrink search reached
    pub shrunk_input: T,
    /// The error raised by the shrunk input
    pub shrunk_error: PropertyError,
    /// Seed of the random source used for the run; replays the failure
    pub seed: u64,
    /// Zero-based iteration on which the failure occurred
    pub failed_iteration: usize,
    /// Number of successful shrink descents
    pub shrink_steps: usize,
    /// Number of property evaluations spent shrinking
    pub shrink_evaluations: usize,
    /// False when the shrink budget ran out before reaching a local minimum
    pub shrink_completed: bool,
    /// Distinct generated inputs in draw order, recorded only in verbose mode
    pub generated: Vec<T>,
    /// Total time spent on the run
    pub test_duration: Duration,
    /// Time spent on shrinking
    pub shrink_duration: Duration,
}

impl<T: Args> TestFailure<T> {
    /// Get a detailed report of the test failure
    pub fn detailed_report(&self) -> String {
        let mut report = String::new();

        report.push_str(&format!(
            "Property test failed on iteration {}\n",
            self.failed_iteration
        ));
        report.push_str(&format!("Error: {}\n", self.error));
        report.push_str(&format!("Original input: {}\n", self.original_input.describe()));
        report.push_str(&format!("Shrunk input: {}\n", self.shrunk_input.describe()));
        report.push_str(&format!("Shrunk error: {}\n", self.shrunk_error));
        for cause in self.shrunk_error.message_chain().iter().skip(1) {
            report.push_str(&format!("  caused by: {}\n", cause));
        }
        report.push_str(&format!(
            "Shrinking steps: {} ({} evaluations)\n",
            self.shrink_steps, self.shrink_evaluations
        ));
        if !self.shrink_completed {
            report.push_str("Shrinking stopped early; the shrunk input may not be minimal\n");
        }
        report.push_str(&format!("Shrinking time: {:?}\n", self.shrink_duration));
        report.push_str(&format!("Total test time: {:?}\n", self.test_duration));
        report.push_str(&format!(
            "Seed: {} (use this to reproduce the failure)\n",
            self.seed
        ));

        report
    }

    /// Get a concise summary of the test failure
    pub fn summary(&self) -> String {
        format!(
            "Property failed with input {} (shrunk from {}) on iteration {}, seed {}",
            self.shrunk_input.describe(),
            self.original_input.describe(),
            self.failed_iteration,
            self.seed
        )
    }
}

impl<T: Args> fmt::Display for TestFailure<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}
