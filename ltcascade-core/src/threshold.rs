//! Activation thresholds and seed selection.
//!
//! Trial thresholds are drawn uniformly from `[0, 1/m]` with the normalising
//! factor `m = 2z / (z - 1 + (1 - p)^N)`. The cascade starts from two seed
//! nodes sampled without replacement among the `N` participants.

use rand::{Rng, seq::index};
use tracing::debug;

use crate::{ContagionError, RandomSource, Result};

/// Number of nodes seeded at the start of every trial.
pub const TRIAL_SEED_COUNT: usize = 2;

/// Computes `m = 2z / (z - 1 + (1 - p)^N)`.
///
/// # Examples
/// ```
/// use ltcascade_core::normalizing_factor;
///
/// // p = 1 removes the (1 - p)^N term.
/// let m = normalizing_factor(3.0, 1.0, 10);
/// assert!((m - 3.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn normalizing_factor(mean_degree: f64, edge_probability: f64, participants: usize) -> f64 {
    2.0 * mean_degree
        / (mean_degree - 1.0 + (1.0 - edge_probability).powf(participants as f64))
}

/// Per-node thresholds indexed by original node id, plus the seed fraction.
#[derive(Clone, Debug, PartialEq)]
pub struct ThresholdAssignment {
    thresholds: Vec<f64>,
    upper_bound: f64,
    seed_fraction: f64,
    fixed_seed_count: Option<usize>,
}

impl ThresholdAssignment {
    /// Threshold of every node, indexed by original node id.
    #[must_use]
    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    /// Upper bound of the uniform threshold draw (`1/m` for trials).
    #[must_use]
    pub fn upper_bound(&self) -> f64 {
        self.upper_bound
    }

    /// Fraction of participants seeded at iteration zero.
    #[must_use]
    pub fn seed_fraction(&self) -> f64 {
        self.seed_fraction
    }

    /// Number of seeds for `participants` nodes, kept within
    /// `1..=participants`.
    ///
    /// Trial assignments always seed [`TRIAL_SEED_COUNT`] nodes. Assignments
    /// from [`uniform_thresholds`] truncate `seed_fraction * participants`.
    ///
    /// # Examples
    /// ```
    /// use ltcascade_core::{RandomSource, assign_thresholds, uniform_thresholds};
    ///
    /// let mut rng = RandomSource::seeded(1);
    /// let assignment = assign_thresholds(40, 50, 3.0, 0.06, &mut rng)?;
    /// assert_eq!(assignment.seed_count(40), 2);
    ///
    /// let animated = uniform_thresholds(75, 0.5, 0.02, &mut rng)?;
    /// assert_eq!(animated.seed_count(75), 1);
    /// # Ok::<(), ltcascade_core::ContagionError>(())
    /// ```
    #[must_use]
    pub fn seed_count(&self, participants: usize) -> usize {
        if participants == 0 {
            return 0;
        }
        let count = self.fixed_seed_count.unwrap_or_else(|| {
            // Non-negative and finite: the fraction lies in (0, 1].
            (self.seed_fraction * participants as f64).floor() as usize
        });
        count.clamp(1, participants)
    }

    /// Thresholds of `node_ids`, in order, for a relabelled subgraph.
    #[must_use]
    pub fn restrict(&self, node_ids: &[usize]) -> Vec<f64> {
        node_ids
            .iter()
            .map(|&id| self.thresholds.get(id).copied().unwrap_or(self.upper_bound))
            .collect()
    }
}

/// Draws trial thresholds for all `node_count` nodes.
///
/// `participants` is `N`, the size of the simulated universe. Thresholds are
/// drawn for every node even when only `N` of them take part.
///
/// # Errors
/// Returns [`ContagionError::InvalidParameter`] when `participants < 2`,
/// `participants > node_count`, or the resulting bound is not a finite
/// non-negative number.
pub fn assign_thresholds(
    participants: usize,
    node_count: usize,
    mean_degree: f64,
    edge_probability: f64,
    rng: &mut RandomSource,
) -> Result<ThresholdAssignment> {
    if participants < TRIAL_SEED_COUNT {
        return Err(ContagionError::invalid_parameter(
            "participants",
            participants,
            "at least 2",
        ));
    }
    if participants > node_count {
        return Err(ContagionError::invalid_parameter(
            "participants",
            participants,
            "no more than the node count",
        ));
    }

    let factor = normalizing_factor(mean_degree, edge_probability, participants);
    let upper_bound = factor.recip();
    let seed_fraction = TRIAL_SEED_COUNT as f64 / participants as f64;
    let mut assignment = draw_uniform(node_count, upper_bound, seed_fraction, rng)?;
    assignment.fixed_seed_count = Some(TRIAL_SEED_COUNT);
    debug!(
        participants,
        factor,
        upper_bound,
        seed_fraction,
        "assigned trial thresholds"
    );
    Ok(assignment)
}

/// Draws thresholds uniformly from `[0, upper_bound]` with an explicit seed
/// fraction.
///
/// # Errors
/// Returns [`ContagionError::InvalidParameter`] when `upper_bound` is not in
/// `[0, 1]` or `seed_fraction` is not in `(0, 1]`.
///
/// # Examples
/// ```
/// use ltcascade_core::{RandomSource, uniform_thresholds};
///
/// let mut rng = RandomSource::seeded(9);
/// let assignment = uniform_thresholds(100, 0.5, 0.02, &mut rng)?;
/// assert_eq!(assignment.thresholds().len(), 100);
/// assert!(assignment.thresholds().iter().all(|t| (0.0..=0.5).contains(t)));
/// assert_eq!(assignment.seed_count(100), 2);
/// # Ok::<(), ltcascade_core::ContagionError>(())
/// ```
pub fn uniform_thresholds(
    node_count: usize,
    upper_bound: f64,
    seed_fraction: f64,
    rng: &mut RandomSource,
) -> Result<ThresholdAssignment> {
    if !(0.0..=1.0).contains(&upper_bound) {
        return Err(ContagionError::invalid_parameter(
            "threshold_upper_bound",
            upper_bound,
            "a number in [0, 1]",
        ));
    }
    if !(seed_fraction > 0.0 && seed_fraction <= 1.0) {
        return Err(ContagionError::invalid_parameter(
            "seed_fraction",
            seed_fraction,
            "a number in (0, 1]",
        ));
    }
    draw_uniform(node_count, upper_bound, seed_fraction, rng)
}

fn draw_uniform(
    node_count: usize,
    upper_bound: f64,
    seed_fraction: f64,
    rng: &mut RandomSource,
) -> Result<ThresholdAssignment> {
    if !upper_bound.is_finite() || upper_bound < 0.0 {
        return Err(ContagionError::invalid_parameter(
            "threshold_upper_bound",
            upper_bound,
            "a finite non-negative number",
        ));
    }
    let thresholds = (0..node_count)
        .map(|_| rng.gen_range(0.0..=upper_bound))
        .collect();
    Ok(ThresholdAssignment {
        thresholds,
        upper_bound,
        seed_fraction,
        fixed_seed_count: None,
    })
}

/// Samples `count` distinct seeds from `0..participants`, sorted ascending.
///
/// `count` is capped at `participants`.
#[must_use]
pub fn choose_seeds(participants: usize, count: usize, rng: &mut RandomSource) -> Vec<usize> {
    let mut seeds = index::sample(rng, participants, count.min(participants)).into_vec();
    seeds.sort_unstable();
    seeds
}
