//! Failure reports and output formatters.
//!
//! A [`FailureReport`] is a plain-data snapshot of a [`TestFailure`] with the
//! inputs already rendered, so formatters need no knowledge of argument
//! types. Every format names the shrunk input and the seed that replays it.

use std::time::Duration;

use crate::error::{TestFailure, TestSuccess};
use crate::property::Args;

/// Rendered summary of a failed property run
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct FailureReport {
    pub error: String,
    /// Messages of the shrunk input's error, outermost first
    pub chain: Vec<String>,
    pub original_input: String,
    pub shrunk_input: String,
    pub seed: u64,
    pub failed_iteration: usize,
    pub shrink_steps: usize,
    pub shrink_evaluations: usize,
    /// True when the shrink budget ran out before a local minimum
    pub partial: bool,
    #[cfg_attr(feature = "json", serde(skip))]
    pub test_duration: Duration,
}

impl<T: Args> From<&TestFailure<T>> for FailureReport {
    fn from(failure: &TestFailure<T>) -> Self {
        Self {
            error: failure.error.to_string(),
            chain: failure.shrunk_error.message_chain(),
            original_input: failure.original_input.describe(),
            shrunk_input: failure.shrunk_input.describe(),
            seed: failure.seed,
            failed_iteration: failure.failed_iteration,
            shrink_steps: failure.shrink_steps,
            shrink_evaluations: failure.shrink_evaluations,
            partial: !failure.shrink_completed,
            test_duration: failure.test_duration,
        }
    }
}

/// Trait for rendering property results
pub trait OutputFormatter {
    fn format_failure(&self, report: &FailureReport) -> String;

    fn format_success(&self, iterations: usize, seed: u64) -> String;
}

/// Compact single-line output
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFormatter;

impl OutputFormatter for DefaultFormatter {
    fn format_failure(&self, report: &FailureReport) -> String {
        format!(
            "Property test failed: {} with input {} (seed: {})",
            report.error, report.shrunk_input, report.seed
        )
    }

    fn format_success(&self, iterations: usize, seed: u64) -> String {
        format!("ok ({} iterations, seed: {})", iterations, seed)
    }
}

/// Multi-line output with the cause chain and shrink statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct VerboseFormatter;

impl OutputFormatter for VerboseFormatter {
    fn format_failure(&self, report: &FailureReport) -> String {
        let mut output = String::new();

        output.push_str(&format!("Property test failed: {}", report.error));
        output.push_str(&format!(
            "\nOriginal failing input: {}",
            report.original_input
        ));
        output.push_str(&format!(
            "\nMinimal failing input: {} (found after {} shrinking steps, {} evaluations)",
            report.shrunk_input, report.shrink_steps, report.shrink_evaluations
        ));
        if report.partial {
            output.push_str("\nShrinking stopped early; the input may not be minimal");
        }
        for (depth, message) in report.chain.iter().enumerate() {
            if depth == 0 {
                output.push_str(&format!("\nMinimal input error: {}", message));
            } else {
                output.push_str(&format!("\n  caused by: {}", message));
            }
        }
        output.push_str(&format!(
            "\nSeed: {} (use this to reproduce the failure)",
            report.seed
        ));
        output.push_str(&format!("\nTest duration: {:?}", report.test_duration));

        output
    }

    fn format_success(&self, iterations: usize, seed: u64) -> String {
        format!(
            "Property test passed after {} iterations (seed: {})",
            iterations, seed
        )
    }
}

/// Machine-readable JSON output
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

#[cfg(feature = "json")]
impl OutputFormatter for JsonFormatter {
    fn format_failure(&self, report: &FailureReport) -> String {
        let mut value = serde_json::to_value(report).unwrap_or(serde_json::Value::Null);
        if let Some(object) = value.as_object_mut() {
            object.insert("event".to_string(), serde_json::Value::from("failed"));
            object.insert(
                "duration_ms".to_string(),
                serde_json::Value::from(report.test_duration.as_millis() as u64),
            );
        }
        value.to_string()
    }

    fn format_success(&self, iterations: usize, seed: u64) -> String {
        serde_json::json!({
            "event": "ok",
            "iterations": iterations,
            "seed": seed,
        })
        .to_string()
    }
}

/// Panic message raised by the assertion-style runners
pub fn failure_message<T: Args>(failure: &TestFailure<T>) -> String {
    VerboseFormatter.format_failure(&FailureReport::from(failure))
}

/// One-line summary of a passing run
pub fn success_message<T>(success: &TestSuccess<T>) -> String {
    DefaultFormatter.format_success(success.iterations, success.seed)
}
