//! Trial outcomes and batch statistics.

use std::fmt;

/// Outcome of a single trial: `(infected, N, z)`.
///
/// # Examples
/// ```
/// use ltcascade_core::TrialResult;
///
/// let result = TrialResult::new(25, 100, 3.5);
/// assert_eq!(result.into_tuple(), (25, 100, 3.5));
/// assert!((result.infected_fraction() - 0.25).abs() < f64::EPSILON);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrialResult {
    infected: usize,
    participants: usize,
    mean_degree: f64,
}

impl TrialResult {
    /// Creates a result from its parts.
    #[must_use]
    pub const fn new(infected: usize, participants: usize, mean_degree: f64) -> Self {
        Self {
            infected,
            participants,
            mean_degree,
        }
    }

    /// Active nodes after the final iteration.
    #[rustfmt::skip]
    #[must_use]
    pub const fn infected(&self) -> usize { self.infected }

    /// Nodes considered (`N`): the whole graph or its largest component.
    #[rustfmt::skip]
    #[must_use]
    pub const fn participants(&self) -> usize { self.participants }

    /// Target mean degree `z` drawn for the trial.
    #[rustfmt::skip]
    #[must_use]
    pub const fn mean_degree(&self) -> f64 { self.mean_degree }

    /// `infected / N`; zero when no node participated.
    #[must_use]
    pub fn infected_fraction(&self) -> f64 {
        if self.participants == 0 {
            return 0.0;
        }
        self.infected as f64 / self.participants as f64
    }

    /// Returns `(infected, N, z)`.
    #[must_use]
    pub const fn into_tuple(self) -> (usize, usize, f64) {
        (self.infected, self.participants, self.mean_degree)
    }
}

impl fmt::Display for TrialResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.infected, self.participants, self.mean_degree
        )
    }
}

/// Descriptive statistics over a batch of [`TrialResult`]s.
///
/// # Examples
/// ```
/// use ltcascade_core::{BatchSummary, TrialResult};
///
/// let results = [TrialResult::new(1, 4, 2.0), TrialResult::new(4, 4, 4.0)];
/// let summary = BatchSummary::from_results(&results).expect("non-empty batch");
/// assert_eq!(summary.trials(), 2);
/// assert!((summary.mean_infected_fraction() - 0.625).abs() < 1e-12);
/// assert!((summary.mean_degree() - 3.0).abs() < 1e-12);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BatchSummary {
    trials: usize,
    mean_infected_fraction: f64,
    min_infected_fraction: f64,
    max_infected_fraction: f64,
    mean_participants: f64,
    mean_degree: f64,
}

impl BatchSummary {
    /// Summarises `results`; `None` for an empty batch.
    #[must_use]
    pub fn from_results(results: &[TrialResult]) -> Option<Self> {
        if results.is_empty() {
            return None;
        }
        let count = results.len() as f64;
        let mut fraction_total = 0.0;
        let mut min_fraction = f64::INFINITY;
        let mut max_fraction = f64::NEG_INFINITY;
        let mut participant_total = 0.0;
        let mut degree_total = 0.0;
        for result in results {
            let fraction = result.infected_fraction();
            fraction_total += fraction;
            min_fraction = min_fraction.min(fraction);
            max_fraction = max_fraction.max(fraction);
            participant_total += result.participants as f64;
            degree_total += result.mean_degree;
        }
        Some(Self {
            trials: results.len(),
            mean_infected_fraction: fraction_total / count,
            min_infected_fraction: min_fraction,
            max_infected_fraction: max_fraction,
            mean_participants: participant_total / count,
            mean_degree: degree_total / count,
        })
    }

    /// Number of trials summarised.
    #[must_use]
    pub fn trials(&self) -> usize {
        self.trials
    }

    /// Mean of `infected / N`.
    #[must_use]
    pub fn mean_infected_fraction(&self) -> f64 {
        self.mean_infected_fraction
    }

    /// Smallest `infected / N` observed.
    #[must_use]
    pub fn min_infected_fraction(&self) -> f64 {
        self.min_infected_fraction
    }

    /// Largest `infected / N` observed.
    #[must_use]
    pub fn max_infected_fraction(&self) -> f64 {
        self.max_infected_fraction
    }

    /// Mean number of participating nodes.
    #[must_use]
    pub fn mean_participants(&self) -> f64 {
        self.mean_participants
    }

    /// Mean of the drawn `z` values.
    #[must_use]
    pub fn mean_degree(&self) -> f64 {
        self.mean_degree
    }
}
