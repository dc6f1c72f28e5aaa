//! Running independent property checks on several threads at once.

use crate::error::{PropertyError, panic_message};

/// Configuration for concurrent runs
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Maximum number of jobs running at the same time
    pub num_threads: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            num_threads: num_cpus::get(),
        }
    }
}

impl ParallelConfig {
    pub fn new(num_threads: usize) -> Self {
        Self {
            num_threads: num_threads.max(1),
        }
    }
}

/// A self-contained property check
///
/// Each job builds its own generators, random source and context; nothing is
/// shared between jobs.
pub type Job<R> = Box<dyn FnOnce() -> R + Send>;

/// Run `jobs` on scoped threads, at most `config.num_threads` at a time
///
/// Results come back in job order. A job that panics is reported as
/// [`PropertyError::Internal`] without affecting the others.
pub fn run_parallel<R: Send>(jobs: Vec<Job<R>>, config: &ParallelConfig) -> Vec<Result<R, PropertyError>> {
    let batch_size = config.num_threads.max(1);
    let mut results = Vec::with_capacity(jobs.len());
    let mut pending = jobs.into_iter().peekable();

    while pending.peek().is_some() {
        let batch: Vec<Job<R>> = pending.by_ref().take(batch_size).collect();
        let batch_len = batch.len();
        tracing::debug!(jobs = batch_len, "starting batch of concurrent property runs");

        let outcome = crossbeam::scope(|s| {
            let handles: Vec<_> = batch.into_iter().map(|job| s.spawn(move |_| job())).collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle.join().map_err(|payload| {
                        let message = panic_message(payload.as_ref());
                        tracing::warn!(%message, "property job panicked");
                        PropertyError::internal(format!("property job panicked: {}", message))
                    })
                })
                .collect::<Vec<_>>()
        });

        match outcome {
            Ok(batch_results) => results.extend(batch_results),
            Err(_) => results.extend(
                (0..batch_len).map(|_| Err(PropertyError::internal("concurrent batch failed to join"))),
            ),
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TestConfig;
    use crate::execution::{Outcome, check_all1};
    use crate::Arb;

    #[test]
    fn test_default_uses_available_cpus() {
        assert_eq!(ParallelConfig::default().num_threads, num_cpus::get());
        assert_eq!(ParallelConfig::new(0).num_threads, 1);
    }

    #[test]
    fn test_results_keep_job_order() {
        let jobs: Vec<Job<usize>> = (0..7usize)
            .map(|i| Box::new(move || i * 10) as Job<usize>)
            .collect();
        let results = run_parallel(jobs, &ParallelConfig::new(3));
        let values: Vec<usize> = results.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(values, vec![0, 10, 20, 30, 40, 50, 60]);
    }

    #[test]
    fn test_panicking_job_is_isolated() {
        let jobs: Vec<Job<u8>> = vec![
            Box::new(|| 1u8),
            Box::new(|| -> u8 { panic!("job blew up") }),
            Box::new(|| 3u8),
        ];
        let results = run_parallel(jobs, &ParallelConfig::new(2));
        assert_eq!(results[0], Ok(1));
        assert_eq!(
            results[1],
            Err(PropertyError::internal("property job panicked: job blew up"))
        );
        assert_eq!(results[2], Ok(3));
    }

    type RunResult = Result<Outcome<(i64,)>, PropertyError>;

    #[test]
    fn test_concurrent_runs_match_sequential_runs() {
        let run = |seed: u64| -> RunResult {
            check_all1(
                &TestConfig::with_iterations(100).seed(seed),
                Arb::ints(0i64..=10_000),
                |_, x| x < 5000,
            )
        };

        let jobs: Vec<Job<RunResult>> = (0..4u64)
            .map(|seed| Box::new(move || run(seed)) as Job<RunResult>)
            .collect();
        let concurrent: Vec<Result<RunResult, PropertyError>> =
            run_parallel(jobs, &ParallelConfig::new(4));

        for (seed, result) in concurrent.into_iter().enumerate() {
            let concurrent = result.unwrap().unwrap();
            let sequential = run(seed as u64).unwrap();
            match (concurrent, sequential) {
                (Outcome::Fail(a), Outcome::Fail(b)) => {
                    assert_eq!(a.original_input, b.original_input);
                    assert_eq!(a.shrunk_input, b.shrunk_input);
                }
                (Outcome::Pass(a), Outcome::Pass(b)) => assert_eq!(a.iterations, b.iterations),
                _ => panic!("concurrent and sequential runs disagree for seed {}", seed),
            }
        }
    }
}
