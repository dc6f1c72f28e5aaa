//! Shrink search: greedy descent through a sample's shrink tree.

use crate::error::{PropertyError, panic_message};
use crate::property::catch_quietly;
use crate::sample::{Sample, Value};

/// Evaluation ceiling applied even in [`ShrinkingMode::Unbounded`], so a
/// shrinker that cycles cannot hang a run
pub const UNBOUNDED_SHRINK_CEILING: usize = 100_000;

/// How much effort to spend minimizing a counterexample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShrinkingMode {
    /// Report the original failing input as is
    Off,
    /// Spend at most this many property evaluations, across all arguments
    Bounded(usize),
    /// Shrink until a local minimum is reached
    Unbounded,
}

impl Default for ShrinkingMode {
    fn default() -> Self {
        Self::Bounded(1000)
    }
}

/// Property evaluations still available to one shrink search
///
/// A single budget is shared by every argument position of a failing input,
/// so the configured bound is a total.
#[derive(Debug, Clone)]
pub struct ShrinkBudget {
    limit: usize,
    used: usize,
    exhausted: bool,
}

impl ShrinkBudget {
    pub fn new(mode: ShrinkingMode) -> Self {
        let limit = match mode {
            ShrinkingMode::Off => 0,
            ShrinkingMode::Bounded(n) => n,
            ShrinkingMode::Unbounded => UNBOUNDED_SHRINK_CEILING,
        };
        Self {
            limit,
            used: 0,
            exhausted: false,
        }
    }

    /// Reserve one evaluation; false once the limit is reached
    pub fn try_spend(&mut self) -> bool {
        if self.used >= self.limit {
            self.exhausted = true;
            return false;
        }
        self.used += 1;
        true
    }

    /// Evaluations spent so far
    pub fn used(&self) -> usize {
        self.used
    }

    /// Whether a search was cut short by this budget
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

/// Result of a shrink search
#[derive(Debug, Clone)]
pub struct ShrinkResult<T> {
    /// Smallest failing value reached
    pub minimal: T,
    /// The error raised by `minimal`
    pub minimal_error: PropertyError,
    /// Number of successful descents
    pub steps: usize,
    /// Number of property evaluations spent
    pub evaluations: usize,
    /// False when the budget ran out before a local minimum was confirmed
    pub completed: bool,
}

/// Walk the shrink tree of a failing sample towards a local minimum
///
/// `fails` evaluates a candidate and returns the error it raises, or `None`
/// when the candidate passes. At each node the first failing child is taken;
/// the search stops at a node none of whose children fail, or when the budget
/// runs out. Generator code that panics while a node's children are expanded
/// costs one evaluation and the offending candidate is skipped.
pub fn minimize<T, F>(
    root: &Sample<T>,
    error: PropertyError,
    budget: &mut ShrinkBudget,
    mut fails: F,
) -> ShrinkResult<T>
where
    T: Value,
    F: FnMut(&T) -> Option<PropertyError>,
{
    let spent_before = budget.used();
    let mut current = root.clone();
    let mut current_error = error;
    let mut steps = 0;

    'descent: loop {
        let mut children = match catch_quietly(|| current.shrinks()) {
            Ok(children) => children,
            Err(payload) => {
                tracing::warn!(
                    message = %panic_message(payload.as_ref()),
                    "shrinker panicked; keeping the current input"
                );
                break;
            }
        };

        loop {
            let candidate = match catch_quietly(|| children.next()) {
                Ok(Some(candidate)) => candidate,
                Ok(None) => break 'descent,
                Err(payload) => {
                    tracing::warn!(
                        message = %panic_message(payload.as_ref()),
                        "generator panicked on a shrink candidate; skipping it"
                    );
                    if !budget.try_spend() {
                        break 'descent;
                    }
                    continue;
                }
            };
            if !budget.try_spend() {
                break 'descent;
            }
            if let Some(candidate_error) = fails(candidate.value()) {
                steps += 1;
                tracing::debug!(
                    step = steps,
                    candidate = ?candidate.value(),
                    "found smaller failing input"
                );
                current = candidate;
                current_error = candidate_error;
                continue 'descent;
            }
        }
    }

    let evaluations = budget.used() - spent_before;
    let completed = !budget.is_exhausted();
    if completed {
        tracing::debug!(steps, evaluations, "shrinking reached a local minimum");
    } else {
        tracing::warn!(
            steps,
            evaluations,
            "shrink budget exhausted; result may not be minimal"
        );
    }

    ShrinkResult {
        minimal: current.into_value(),
        minimal_error: current_error,
        steps,
        evaluations,
        completed,
    }
}
