//! Parallel execution of trial batches.
//!
//! A run of `T` trials on `W` workers is split into `W` batches of
//! `ceil(T / W)` trials, the trailing batches absorbing the remainder (and
//! possibly left empty). Batches execute on a dedicated Rayon pool of exactly
//! `W` threads. Each batch owns the random stream derived from the master
//! seed and its batch index, runs its trials one after another, and results
//! are concatenated in batch order.

use std::{
    num::NonZeroUsize,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use rayon::prelude::*;
use tracing::{info, instrument, warn};

use crate::{
    BatchFailure, ContagionError, RandomSource, Result, TrialConfig, TrialConfigBuilder,
    TrialResult, TrialRunner,
};

/// Deterministic split of a trial count into per-worker batches.
///
/// # Examples
/// ```
/// use ltcascade_core::BatchPlan;
///
/// let plan = BatchPlan::new(10, 4)?;
/// assert_eq!(plan.batch_size(), 3);
/// assert_eq!(plan.sizes(), &[3, 3, 3, 1]);
///
/// // Ceiling division can leave trailing batches empty.
/// assert_eq!(BatchPlan::new(5, 4)?.sizes(), &[2, 2, 1, 0]);
/// # Ok::<(), ltcascade_core::ContagionError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchPlan {
    batch_size: usize,
    sizes: Vec<usize>,
}

impl BatchPlan {
    /// Splits `trials` across `workers` batches.
    ///
    /// # Errors
    /// Returns [`ContagionError::InvalidParameter`] when either count is zero.
    pub fn new(trials: usize, workers: usize) -> Result<Self> {
        let workers = validate_workers(workers)?;
        let trials = validate_trials(trials)?;
        let batch_size = trials.div_ceil(workers.get());
        let sizes = (0..workers.get())
            .map(|batch| {
                let start = batch * batch_size;
                ((batch + 1) * batch_size)
                    .min(trials)
                    .saturating_sub(start)
            })
            .collect();
        Ok(Self { batch_size, sizes })
    }

    /// Trials per full batch, `ceil(trials / workers)`.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Trials assigned to each batch, in batch order.
    #[must_use]
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Number of batches, equal to the worker count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// Always `false`: a plan has at least one batch.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Total trials across all batches.
    #[must_use]
    pub fn total(&self) -> usize {
        self.sizes.iter().sum()
    }
}

fn validate_workers(workers: usize) -> Result<NonZeroUsize> {
    NonZeroUsize::new(workers)
        .ok_or_else(|| ContagionError::invalid_parameter("n_cpu", workers, "at least 1"))
}

fn validate_trials(trials: usize) -> Result<usize> {
    if trials == 0 {
        return Err(ContagionError::invalid_parameter(
            "num_trials",
            trials,
            "at least 1",
        ));
    }
    Ok(trials)
}

/// Fans trials out over a fixed-size worker pool.
///
/// # Examples
/// ```
/// use ltcascade_core::{ParallelAggregator, TrialConfigBuilder};
///
/// let config = TrialConfigBuilder::new().with_nodes(100).build()?;
/// let aggregator = ParallelAggregator::new(config, 2)?;
/// let results = aggregator.run(7, 42)?;
/// assert_eq!(results.len(), 7);
/// # Ok::<(), ltcascade_core::ContagionError>(())
/// ```
#[derive(Clone, Copy, Debug)]
pub struct ParallelAggregator {
    runner: TrialRunner,
    workers: NonZeroUsize,
}

impl ParallelAggregator {
    /// Creates an aggregator running `config` on `workers` threads.
    ///
    /// # Errors
    /// Returns [`ContagionError::InvalidParameter`] when `workers` is zero.
    pub fn new(config: TrialConfig, workers: usize) -> Result<Self> {
        Ok(Self {
            runner: TrialRunner::new(config),
            workers: validate_workers(workers)?,
        })
    }

    /// Number of worker threads.
    #[must_use]
    pub fn workers(&self) -> NonZeroUsize {
        self.workers
    }

    /// Runs `trials` trials and returns their results in batch order.
    ///
    /// The same `master_seed` and worker count always reproduce the same
    /// results.
    ///
    /// # Errors
    /// Returns [`ContagionError::InvalidParameter`] when `trials` is zero,
    /// [`ContagionError::WorkerPool`] when the pool cannot start, and
    /// [`ContagionError::Aggregate`] listing every failed batch otherwise.
    #[instrument(
        name = "core.multi_trials",
        err,
        skip(self),
        fields(
            nodes = self.runner.config().nodes(),
            whole_graph = self.runner.config().whole_graph(),
            workers = self.workers.get(),
        ),
    )]
    pub fn run(&self, trials: usize, master_seed: u64) -> Result<Vec<TrialResult>> {
        let plan = BatchPlan::new(trials, self.workers.get())?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers.get())
            .thread_name(|index| format!("ltcascade-worker-{index}"))
            .build()
            .map_err(|error| ContagionError::WorkerPool {
                message: Arc::from(error.to_string()),
            })?;

        let runner = self.runner;
        let outcomes: Vec<Result<Vec<TrialResult>>> = pool.install(|| {
            plan.sizes()
                .par_iter()
                .enumerate()
                .map(|(batch, &size)| guard_batch(|| run_batch(&runner, batch, size, master_seed)))
                .collect()
        });

        let mut results = Vec::with_capacity(plan.total());
        let mut failures = Vec::new();
        for (batch, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(batch_results) => results.extend(batch_results),
                Err(error) => {
                    warn!(batch, code = %error.code(), error = %error, "batch failed");
                    failures.push(BatchFailure { batch, error });
                }
            }
        }
        if !failures.is_empty() {
            return Err(ContagionError::Aggregate {
                batches: plan.len(),
                failures,
            });
        }

        info!(trials = results.len(), "parallel trials completed");
        Ok(results)
    }
}

/// Converts a panicking batch into [`ContagionError::WorkerPanicked`].
fn guard_batch<F>(batch: F) -> Result<Vec<TrialResult>>
where
    F: FnOnce() -> Result<Vec<TrialResult>>,
{
    panic::catch_unwind(AssertUnwindSafe(batch)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|text| (*text).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_owned());
        Err(ContagionError::WorkerPanicked {
            message: Arc::from(message),
        })
    })
}

#[instrument(
    name = "core.batch",
    err,
    skip(runner),
    fields(seed = tracing::field::Empty),
)]
fn run_batch(
    runner: &TrialRunner,
    batch: usize,
    size: usize,
    master_seed: u64,
) -> Result<Vec<TrialResult>> {
    let mut rng = RandomSource::stream(master_seed, batch);
    tracing::Span::current().record("seed", rng.seed());
    (0..size).map(|_| runner.run(&mut rng)).collect()
}

/// Runs `num_trials` trials on `n` nodes across `n_cpu` workers.
///
/// # Errors
/// Returns [`ContagionError::InvalidParameter`] for `n < 2`,
/// `num_trials < 1`, or `n_cpu < 1`, checked in that order, and
/// [`ContagionError::Aggregate`] when any batch fails.
///
/// # Examples
/// ```
/// use ltcascade_core::multi_trials;
///
/// let results = multi_trials(200, false, 20, 2, 7)?;
/// assert_eq!(results.len(), 20);
/// assert!(results.iter().all(|r| r.infected() <= r.participants()));
/// # Ok::<(), ltcascade_core::ContagionError>(())
/// ```
pub fn multi_trials(
    n: usize,
    all: bool,
    num_trials: usize,
    n_cpu: usize,
    master_seed: u64,
) -> Result<Vec<TrialResult>> {
    let config = TrialConfigBuilder::new()
        .with_nodes(n)
        .with_whole_graph(all)
        .build()?;
    ParallelAggregator::new(config, n_cpu)?.run(num_trials, master_seed)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::{ContagionErrorCode, ProbabilityPolicy};

    #[rstest]
    #[case(20, 2)]
    #[case(10, 3)]
    #[case(5, 4)]
    #[case(1, 8)]
    #[case(7, 7)]
    fn plan_sizes_sum_to_trials(#[case] trials: usize, #[case] workers: usize) {
        let plan = BatchPlan::new(trials, workers).expect("plan is valid");
        assert_eq!(plan.len(), workers);
        assert_eq!(plan.total(), trials);
        assert!(plan.sizes().iter().all(|&size| size <= plan.batch_size()));
        assert!(plan.sizes().windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[rstest]
    #[case::no_trials(0, 2, "num_trials")]
    #[case::no_workers(5, 0, "n_cpu")]
    fn plan_rejects_zero_counts(
        #[case] trials: usize,
        #[case] workers: usize,
        #[case] parameter: &str,
    ) {
        let err = BatchPlan::new(trials, workers).expect_err("zero counts are invalid");
        match err {
            ContagionError::InvalidParameter { parameter: got, .. } => assert_eq!(got, parameter),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn same_master_seed_reproduces_results() {
        let first = multi_trials(150, false, 12, 3, 99).expect("run must succeed");
        let second = multi_trials(150, false, 12, 3, 99).expect("run must succeed");
        assert_eq!(first, second);
    }

    #[test]
    fn failures_are_reported_per_batch() {
        let config = TrialConfigBuilder::new()
            .with_nodes(2)
            .with_whole_graph(true)
            .with_probability_policy(ProbabilityPolicy::Reject)
            .build()
            .expect("configuration is valid");
        let err = ParallelAggregator::new(config, 3)
            .expect("worker count is valid")
            .run(5, 1)
            .expect_err("z / 2 is always above one");
        assert_eq!(err.code(), ContagionErrorCode::Aggregate);
        let failures = err.batch_failures().expect("aggregate error lists batches");
        // Batches 0 and 1 run two trials each, batch 2 runs one.
        let batches: Vec<usize> = failures.iter().map(|failure| failure.batch).collect();
        assert_eq!(batches, vec![0, 1, 2]);
        assert!(
            failures
                .iter()
                .all(|failure| failure.error.code() == ContagionErrorCode::DegenerateProbability)
        );
    }

    #[rstest]
    #[case::nodes_first(1, 0, 0, "nodes")]
    #[case::workers_before_trials(10, 0, 0, "n_cpu")]
    #[case::trials_last(10, 0, 2, "num_trials")]
    fn multi_trials_reports_the_first_invalid_parameter(
        #[case] n: usize,
        #[case] num_trials: usize,
        #[case] n_cpu: usize,
        #[case] parameter: &str,
    ) {
        let err = multi_trials(n, false, num_trials, n_cpu, 0).expect_err("parameters are invalid");
        match err {
            ContagionError::InvalidParameter { parameter: got, .. } => assert_eq!(got, parameter),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_batches_contribute_nothing() {
        let results = multi_trials(50, true, 3, 6, 4).expect("run must succeed");
        assert_eq!(results.len(), 3);
    }

    #[rstest]
    #[case::str_payload(|| panic!("boom"), "boom")]
    #[case::string_payload(|| std::panic::panic_any(String::from("owned boom")), "owned boom")]
    fn panicking_batches_become_worker_errors(
        #[case] batch: fn() -> Result<Vec<TrialResult>>,
        #[case] expected: &str,
    ) {
        let err = guard_batch(batch).expect_err("panics must surface as errors");
        match err {
            ContagionError::WorkerPanicked { message } => assert_eq!(&*message, expected),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_batch_never_runs_a_trial() {
        let config = TrialConfigBuilder::new()
            .with_nodes(4)
            .with_probability_policy(ProbabilityPolicy::Reject)
            .build()
            .expect("configuration is valid");
        let runner = TrialRunner::new(config);
        assert_eq!(guard_batch(|| run_batch(&runner, 0, 0, 0)), Ok(Vec::new()));
    }
}
