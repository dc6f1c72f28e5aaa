#![allow(clippy::result_large_err)]
#![allow(clippy::type_complexity)]

//! # Forall - Property-Based Testing with Shrinking
//!
//! Forall generates test inputs from composable generators, checks a property
//! against them, and shrinks the first failing input to a minimal
//! counterexample that can be replayed from a seed.
//!
//! Generators come in two kinds: an [`Arb`] draws random values after first
//! offering a fixed list of edge cases, and an [`Exhaustive`] enumerates a
//! finite set of values in order. Both convert into [`Gen`], which is what
//! the runners accept.
//!
//! ## Quick Start
//!
//! ```rust
//! use forall::{check_all1, list, Arb, TestConfig};
//!
//! let config = TestConfig::with_iterations(200).seed(7);
//!
//! let outcome = check_all1(&config, list(Arb::ints(0i32..=100), 0..=10), |_, xs| {
//!     let mut sorted = xs.clone();
//!     sorted.sort();
//!     sorted.len() == xs.len()
//! })
//! .unwrap();
//! assert!(outcome.is_pass());
//!
//! let outcome = check_all1(&config, Arb::ints(0i64..=10_000), |_, x| x < 100).unwrap();
//! let failure = outcome.into_failure().unwrap();
//! assert_eq!(failure.shrunk_input, (100,));
//! ```

// Public modules
pub mod collections;
pub mod combinators;
pub mod config;
pub mod error;
pub mod execution;
pub mod generator;
pub mod parallel;
pub mod primitives;
pub mod property;
pub mod report;
pub mod rng;
pub mod sample;
pub mod shrink;
pub mod shrinkers;

// Re-export the main public API
pub use collections::{DEFAULT_SLIPPAGE, list, set, set_of_size, set_with_slippage};
pub use combinators::DISTINCT_MAX_MISSES;
pub use config::{ConfigError, GlobalConfig, TestConfig};
pub use error::{PropertyError, TestFailure, TestSuccess};
pub use execution::{
    Outcome, assert_all1, assert_all2, assert_all3, assert_all4, assert_all5, assert_all6,
    check_all1, check_all2, check_all3, check_all4, check_all5, check_all6,
};
pub use generator::{Arb, Exhaustive, Gen, Samples, arbitrary, exhaustive};
pub use parallel::{Job, ParallelConfig, run_parallel};
pub use property::{Args, PropertyContext, TestOutcome};
#[cfg(feature = "json")]
pub use report::JsonFormatter;
pub use report::{
    DefaultFormatter, FailureReport, OutputFormatter, VerboseFormatter, failure_message,
    success_message,
};
pub use rng::RandomSource;
pub use sample::{Sample, Shrinker, Value};
pub use shrink::{ShrinkBudget, ShrinkResult, ShrinkingMode, UNBOUNDED_SHRINK_CEILING, minimize};
pub use shrinkers::{IntShrinker, ListShrinker, SetShrinker, StringShrinker, shrink_sequence};
