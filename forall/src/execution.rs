//! Property runner: an edge-case phase, a random phase, and shrinking of the
//! first failing input.
//!
//! Runners exist for one to six arguments. `check_allN` returns the outcome
//! of a run; `assert_allN` panics with a failure report instead, for use
//! directly inside `#[test]` functions.

use std::time::Instant;

use crate::config::TestConfig;
use crate::error::{PropertyError, TestFailure, TestSuccess, panic_message};
use crate::generator::Gen;
use crate::property::{Args, PropertyContext, TestOutcome, catch_quietly, evaluate};
use crate::report::failure_message;
use crate::rng::RandomSource;
use crate::sample::{Sample, Value};
use crate::shrink::{ShrinkBudget, ShrinkResult, minimize};

/// Result of a completed property run
#[derive(Debug, Clone)]
pub enum Outcome<T> {
    Pass(TestSuccess<T>),
    Fail(TestFailure<T>),
}

impl<T> Outcome<T> {
    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass(_))
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Outcome::Fail(_))
    }

    /// Seed of the random source the run used
    pub fn seed(&self) -> u64 {
        match self {
            Outcome::Pass(success) => success.seed,
            Outcome::Fail(failure) => failure.seed,
        }
    }

    pub fn success(&self) -> Option<&TestSuccess<T>> {
        match self {
            Outcome::Pass(success) => Some(success),
            Outcome::Fail(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&TestFailure<T>> {
        match self {
            Outcome::Pass(_) => None,
            Outcome::Fail(failure) => Some(failure),
        }
    }

    pub fn into_failure(self) -> Option<TestFailure<T>> {
        match self {
            Outcome::Pass(_) => None,
            Outcome::Fail(failure) => Some(failure),
        }
    }
}

/// One sample per argument position of a single input
pub(crate) trait SampleTuple {
    type Values: Args;

    fn values(&self) -> Self::Values;

    /// Shrink each position in turn, left to right, keeping earlier positions
    /// at their shrunk values and later positions at their original values
    fn shrink(
        &self,
        error: PropertyError,
        budget: &mut ShrinkBudget,
        fails: &mut dyn FnMut(&Self::Values) -> Option<PropertyError>,
    ) -> ShrinkResult<Self::Values>;
}

/// Index tuples of the edge-case product, first position varying slowest,
/// truncated to `limit`
pub(crate) fn edgecase_indices(lengths: &[usize], limit: usize) -> Vec<Vec<usize>> {
    if lengths.is_empty() || lengths.contains(&0) {
        return Vec::new();
    }

    let mut product = Vec::new();
    let mut current = vec![0; lengths.len()];
    while product.len() < limit {
        product.push(current.clone());

        let mut position = lengths.len();
        loop {
            if position == 0 {
                return product;
            }
            position -= 1;
            current[position] += 1;
            if current[position] < lengths[position] {
                break;
            }
            current[position] = 0;
        }
    }
    product
}

fn draw_guarded<S, D>(draw: &mut D, rs: &mut RandomSource) -> Result<S, PropertyError>
where
    D: FnMut(&mut RandomSource) -> Result<S, PropertyError>,
{
    match catch_quietly(|| draw(rs)) {
        Ok(result) => result,
        Err(payload) => Err(PropertyError::GenerationFailed {
            message: panic_message(payload.as_ref()),
        }),
    }
}

/// An Exhaustive with no values can never supply its argument position
fn ensure_nonempty<T: Value>(generator: &Gen<T>) -> Result<(), PropertyError> {
    if let Gen::Exhaustive(exhaustive) = generator
        && exhaustive.is_empty()
    {
        tracing::debug!("exhaustive generator has no values; aborting run");
        return Err(PropertyError::generation_exhausted(1, 0, 0));
    }
    Ok(())
}

fn log_generated<V: Args>(generated: &[V]) {
    let values: Vec<String> = generated.iter().map(Args::describe).collect();
    tracing::info!("Property test completed; values = [{}]", values.join(", "));
}

fn run_property<S, D, P>(
    config: &TestConfig,
    rs: &mut RandomSource,
    edge_inputs: Vec<S>,
    mut draw: Option<D>,
    property: P,
) -> Result<Outcome<S::Values>, PropertyError>
where
    S: SampleTuple,
    D: FnMut(&mut RandomSource) -> Result<S, PropertyError>,
    P: Fn(&mut PropertyContext, &S::Values) -> Result<(), PropertyError>,
{
    let started = Instant::now();
    let seed = rs.seed();
    let mut ctx = PropertyContext::new();
    let mut generated: Vec<S::Values> = Vec::new();
    let mut edge_inputs = edge_inputs.into_iter();

    tracing::debug!(seed, iterations = config.iterations, "starting property run");

    for iteration in 0..config.iterations {
        let samples = match edge_inputs.next() {
            Some(samples) => samples,
            None => match draw.as_mut() {
                Some(draw) => draw_guarded(draw, rs)?,
                None => break,
            },
        };

        let values = samples.values();
        if config.verbose && !generated.contains(&values) {
            generated.push(values.clone());
        }
        ctx.mark_attempt();

        let Err(error) = property(&mut ctx, &values) else {
            continue;
        };
        let error = error.at_iteration(iteration);
        tracing::debug!(
            iteration,
            input = %values.describe(),
            %error,
            "property failed, shrinking"
        );

        let shrink_started = Instant::now();
        let mut budget = ShrinkBudget::new(config.shrinking);
        let mut shrink_ctx = PropertyContext::new();
        let shrunk = samples.shrink(
            error.clone(),
            &mut budget,
            &mut |candidate: &S::Values| {
                shrink_ctx.mark_attempt();
                property(&mut shrink_ctx, candidate).err()
            },
        );

        if config.verbose {
            log_generated(&generated);
        }

        let failure = TestFailure {
            error,
            original_input: values,
            shrunk_input: shrunk.minimal,
            shrunk_error: shrunk.minimal_error,
            seed,
            failed_iteration: iteration,
            shrink_steps: shrunk.steps,
            shrink_evaluations: shrunk.evaluations,
            shrink_completed: shrunk.completed,
            generated,
            test_duration: started.elapsed(),
            shrink_duration: shrink_started.elapsed(),
        };
        tracing::debug!(seed, "{}", failure.summary());
        return Ok(Outcome::Fail(failure));
    }

    if config.verbose {
        log_generated(&generated);
    }
    tracing::debug!(seed, iterations = ctx.attempts(), "property run passed");

    Ok(Outcome::Pass(TestSuccess {
        iterations: ctx.attempts(),
        seed,
        generated,
        classifications: ctx.into_classifications(),
    }))
}

macro_rules! property_runner {
    ($arity:literal, $check:ident, $assert:ident; $($T:ident $g:ident $idx:tt),+) => {
        impl<$($T: Value),+> SampleTuple for ($(Sample<$T>,)+) {
            type Values = ($($T,)+);

            fn values(&self) -> Self::Values {
                ($(self.$idx.value().clone(),)+)
            }

            fn shrink(
                &self,
                error: PropertyError,
                budget: &mut ShrinkBudget,
                fails: &mut dyn FnMut(&Self::Values) -> Option<PropertyError>,
            ) -> ShrinkResult<Self::Values> {
                let mut current = self.values();
                let mut error = error;
                let mut steps = 0;
                let mut evaluations = 0;
                $(
                    let result = minimize(&self.$idx, error, budget, |candidate| {
                        let mut args = current.clone();
                        args.$idx = candidate.clone();
                        fails(&args)
                    });
                    current.$idx = result.minimal;
                    error = result.minimal_error;
                    steps += result.steps;
                    evaluations += result.evaluations;
                )+
                ShrinkResult {
                    minimal: current,
                    minimal_error: error,
                    steps,
                    evaluations,
                    completed: !budget.is_exhausted(),
                }
            }
        }

        #[doc = concat!("Check a property of ", stringify!($arity), " argument(s) against the given generators")]
        ///
        /// Runs the edge-case phase, then random draws, up to
        /// `config.iterations` inputs in total. The first failing input is
        /// shrunk before being reported. `Err` is returned only when the
        /// configuration is invalid or a generator fails.
        pub fn $check<$($T,)+ F, R>(
            config: &TestConfig,
            $($g: impl Into<Gen<$T>>,)+
            property: F,
        ) -> Result<Outcome<($($T,)+)>, PropertyError>
        where
            $($T: Value,)+
            F: Fn(&mut PropertyContext, $($T),+) -> R,
            R: TestOutcome,
        {
            config.validate()?;
            $(let $g: Gen<$T> = $g.into();)+
            $(ensure_nonempty(&$g)?;)+
            let mut rs = RandomSource::from_seed_option(config.seed);

            let edges = ($($g.edgecase_samples(),)+);
            let lengths = [$(edges.$idx.len()),+];
            let edge_inputs: Vec<($(Sample<$T>,)+)> = edgecase_indices(&lengths, config.iterations)
                .into_iter()
                .map(|ix| ($(edges.$idx[ix[$idx]].clone(),)+))
                .collect();

            let random_phase = false $(|| $g.is_arb())+;
            let mut streams = ($($g.stream(),)+);
            let draw = move |rs: &mut RandomSource| -> Result<($(Sample<$T>,)+), PropertyError> {
                Ok(($(streams.$idx.next_sample(rs)?,)+))
            };

            run_property(
                config,
                &mut rs,
                edge_inputs,
                random_phase.then_some(draw),
                |ctx, args: &($($T,)+)| evaluate(|| property(ctx, $(args.$idx.clone()),+)),
            )
        }

        #[doc = concat!("Assert a property of ", stringify!($arity), " argument(s) holds for `iterations` inputs")]
        ///
        /// # Panics
        ///
        /// Panics with a failure report naming the shrunk input and the seed
        /// when the property fails, and when the run itself cannot proceed.
        #[track_caller]
        pub fn $assert<$($T,)+ F, R>(
            iterations: usize,
            $($g: impl Into<Gen<$T>>,)+
            property: F,
        ) -> TestSuccess<($($T,)+)>
        where
            $($T: Value,)+
            F: Fn(&mut PropertyContext, $($T),+) -> R,
            R: TestOutcome,
        {
            let config = TestConfig::with_iterations(iterations);
            match $check(&config, $($g,)+ property) {
                Ok(Outcome::Pass(success)) => success,
                Ok(Outcome::Fail(failure)) => panic!("{}", failure_message(&failure)),
                Err(error) => panic!("Property run aborted: {}", error),
            }
        }
    };
}

property_runner!(1, check_all1, assert_all1; A gen_a 0);
property_runner!(2, check_all2, assert_all2; A gen_a 0, B gen_b 1);
property_runner!(3, check_all3, assert_all3; A gen_a 0, B gen_b 1, C gen_c 2);
property_runner!(4, check_all4, assert_all4; A gen_a 0, B gen_b 1, C gen_c 2, D gen_d 3);
property_runner!(5, check_all5, assert_all5; A gen_a 0, B gen_b 1, C gen_c 2, D gen_d 3, E gen_e 4);
property_runner!(
    6, check_all6, assert_all6;
    A gen_a 0, B gen_b 1, C gen_c 2, D gen_d 3, E gen_e 4, G gen_g 5
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use rand::Rng;

    use crate::Arb;
    use crate::generator::{arbitrary, exhaustive};
    use crate::sample::Shrinker;
    use crate::shrink::ShrinkingMode;
    use crate::shrinkers::IntShrinker;

    fn seeded(iterations: usize) -> TestConfig {
        TestConfig::with_iterations(iterations).seed(42)
    }

    #[test]
    fn test_edgecase_indices_product_order() {
        assert_eq!(
            edgecase_indices(&[2, 3], 100),
            vec![
                vec![0, 0],
                vec![0, 1],
                vec![0, 2],
                vec![1, 0],
                vec![1, 1],
                vec![1, 2]
            ]
        );
        assert_eq!(edgecase_indices(&[2, 3], 2), vec![vec![0, 0], vec![0, 1]]);
        assert!(edgecase_indices(&[2, 0], 100).is_empty());
    }

    #[test]
    fn test_passing_property() {
        let outcome = check_all1(&seeded(200), Arb::ints(-1000i64..=1000), |_, x| x + 0 == x).unwrap();
        let success = outcome.success().unwrap();
        assert_eq!(success.iterations, 200);
        assert_eq!(success.seed, 42);
    }

    #[test]
    fn test_failing_property_shrinks_to_boundary() {
        let outcome = check_all1(&seeded(500), Arb::ints(0i64..=10_000), |_, x| x < 100).unwrap();
        let failure = outcome.into_failure().unwrap();
        assert_eq!(failure.shrunk_input, (100,));
        assert!(failure.original_input.0 >= 100);
        assert!(failure.shrink_completed);
    }

    #[test]
    fn test_edge_phase_runs_first() {
        let config = seeded(5).verbose();
        let outcome = check_all1(&config, Arb::ints(-10i32..=10), |_, _| true).unwrap();
        let generated = &outcome.success().unwrap().generated;
        assert_eq!(&generated[..5], &[(-10,), (-1,), (0,), (1,), (10,)]);
    }

    #[test]
    fn test_exhaustive_only_skips_random_phase() {
        let outcome = check_all2(
            &seeded(100),
            exhaustive(vec![1, 2]),
            exhaustive(vec!['a', 'b', 'c']),
            |_, _, _| true,
        )
        .unwrap();
        assert_eq!(outcome.success().unwrap().iterations, 6);
    }

    #[test]
    fn test_multi_argument_shrinking_is_sequential() {
        let outcome = check_all2(
            &seeded(300),
            Arb::ints(0i64..=2000),
            Arb::ints(0i64..=2000),
            |_, a, b| a + b < 1000,
        )
        .unwrap();
        let failure = outcome.into_failure().unwrap();
        let (a, b) = failure.shrunk_input;
        assert!(a + b >= 1000);
        assert!(a <= failure.original_input.0);
        assert!(b <= failure.original_input.1);
    }

    #[test]
    fn test_panics_and_errors_are_failures() {
        let outcome = check_all1(&seeded(50), Arb::ints(0u32..=100), |_, x| {
            assert!(x < 50, "too large: {}", x);
        })
        .unwrap();
        let failure = outcome.into_failure().unwrap();
        assert_eq!(failure.shrunk_input, (50,));
        assert_eq!(
            failure.shrunk_error,
            PropertyError::property_failed("too large: 50")
        );

        let outcome = check_all1(&seeded(50), Arb::ints(0u32..=100), |_, x| {
            if x > 7 { Err(format!("{} exceeds 7", x)) } else { Ok(()) }
        })
        .unwrap();
        assert_eq!(outcome.into_failure().unwrap().shrunk_input, (8,));
    }

    #[test]
    fn test_shrinking_off_reports_original() {
        let config = seeded(100).shrinking(ShrinkingMode::Off);
        let outcome = check_all1(&config, Arb::ints(0i64..=10_000), |_, x| x < 100).unwrap();
        let failure = outcome.into_failure().unwrap();
        assert_eq!(failure.shrunk_input, failure.original_input);
        assert_eq!(failure.shrink_evaluations, 0);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let config = TestConfig::with_iterations(0);
        let result = check_all1(&config, Arb::bools(), |_, _| true);
        assert!(matches!(result, Err(PropertyError::Config(_))));
    }

    #[test]
    fn test_generator_panic_is_generation_failure() {
        let exploding = Arb::ints(0u8..=10).with_edgecases(vec![]).map(|x| {
            if x < 100 {
                panic!("generator exploded");
            }
            x
        });
        let result = check_all1(&seeded(10), exploding, |_, _| true);
        assert_eq!(
            result.unwrap_err(),
            PropertyError::GenerationFailed {
                message: "generator exploded".to_string()
            }
        );
    }

    #[test]
    fn test_empty_exhaustive_aborts_before_evaluating() {
        let evaluated = std::cell::Cell::new(0);
        let nothing = || exhaustive(vec![1, 2, 3]).filter(|v| *v > 10);

        let alone = check_all1(&seeded(10), nothing(), |_, _| {
            evaluated.set(evaluated.get() + 1);
            true
        });
        assert_eq!(alone.unwrap_err(), PropertyError::generation_exhausted(1, 0, 0));

        let paired = check_all2(&seeded(10), Arb::bools(), nothing(), |_, _, _| {
            evaluated.set(evaluated.get() + 1);
            true
        });
        assert_eq!(paired.unwrap_err(), PropertyError::generation_exhausted(1, 0, 0));
        assert_eq!(evaluated.get(), 0);
    }

    #[test]
    fn test_verbose_log_keeps_only_distinct_inputs() {
        let config = TestConfig::with_iterations(30).seed(5).verbose();
        let outcome = check_all1(&config, Arb::bools(), |_, _| true).unwrap();
        let success = outcome.success().unwrap();
        assert_eq!(success.iterations, 30);
        assert_eq!(success.generated, vec![(true,), (false,)]);
    }

    #[test]
    fn test_generator_panic_while_shrinking_is_contained() {
        let shrinker: Arc<dyn Shrinker<i64>> = Arc::new(IntShrinker::<i64>::full());
        // Shrinking reaches 0, where the mapped division panics
        let reciprocal = arbitrary(vec![], Some(shrinker), |rs| rs.gen_range(1..=100i64)).map(|x| 1000 / x);

        let outcome = check_all1(&seeded(20), reciprocal, |_, _| false).unwrap();
        let failure = outcome.into_failure().unwrap();
        assert_eq!(failure.shrunk_input, (1000,));
        assert!(failure.shrink_completed);
    }

    #[test]
    fn test_classifications_are_recorded() {
        let outcome = check_all1(&seeded(100), Arb::ints(-50i32..=50), |ctx, x| {
            ctx.classify(x < 0, "negative");
            ctx.classify(x >= 0, "non-negative");
            true
        })
        .unwrap();
        let success = outcome.success().unwrap();
        let total: usize = success.classifications.iter().map(|(_, n)| n).sum();
        assert_eq!(total, 100);
        assert_eq!(success.classifications[0].0, "negative");
    }

    #[test]
    #[should_panic(expected = "Property test failed")]
    fn test_assert_all_panics_on_failure() {
        assert_all1(100, Arb::ints(0i32..=1000), |_, x| x < 10);
    }

    #[test]
    fn test_assert_all_returns_success() {
        let success = assert_all3(
            50,
            Arb::bools(),
            Arb::ints(0u8..=3),
            Arb::strings(0..=4),
            |_, _, n, s| s.len() <= 4 && n <= 3,
        );
        assert_eq!(success.iterations, 50);
    }
}
