//! Single-trial orchestration.
//!
//! A trial generates a graph, selects the simulated universe, assigns
//! thresholds and seeds, runs the cascade to its iteration budget, and keeps
//! only the summary `(infected, N, z)`.

use tracing::{debug, instrument};

use crate::{
    CascadeSimulator, GraphGenerator, RandomSource, Result, TrialConfig, TrialConfigBuilder,
    TrialResult, assign_thresholds, choose_seeds, select_universe,
};

/// Runs trials for one [`TrialConfig`].
///
/// # Examples
/// ```
/// use ltcascade_core::{RandomSource, TrialConfigBuilder, TrialRunner};
///
/// let config = TrialConfigBuilder::new().with_nodes(200).build()?;
/// let runner = TrialRunner::new(config);
/// let result = runner.run(&mut RandomSource::seeded(1))?;
/// assert!(result.infected() <= result.participants());
/// assert!(result.participants() <= 200);
/// # Ok::<(), ltcascade_core::ContagionError>(())
/// ```
#[derive(Clone, Copy, Debug)]
pub struct TrialRunner {
    config: TrialConfig,
}

impl TrialRunner {
    /// Creates a runner for `config`.
    #[must_use]
    pub fn new(config: TrialConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration this runner uses.
    #[must_use]
    pub fn config(&self) -> TrialConfig {
        self.config
    }

    /// Runs one trial drawing every random choice from `rng`.
    ///
    /// # Errors
    /// Returns [`crate::ContagionError::InvalidParameter`] when the simulated
    /// universe has fewer than two nodes (possible when restricting a small
    /// graph to its largest component) and
    /// [`crate::ContagionError::DegenerateProbability`] under a rejecting
    /// probability policy.
    #[instrument(
        name = "core.trial",
        err,
        skip(self, rng),
        fields(
            nodes = self.config.nodes(),
            whole_graph = self.config.whole_graph(),
            seed = rng.seed(),
        ),
    )]
    pub fn run(&self, rng: &mut RandomSource) -> Result<TrialResult> {
        let nodes = self.config.nodes();
        let generated = GraphGenerator::new(self.config.probability_policy()).generate(nodes, rng)?;
        let mean_degree = generated.mean_degree;
        let edge_probability = generated.edge_probability;

        let universe = select_universe(generated.graph, !self.config.whole_graph());
        let participants = universe.len();

        let assignment =
            assign_thresholds(participants, nodes, mean_degree, edge_probability, rng)?;
        let seeds = choose_seeds(participants, assignment.seed_count(participants), rng);
        let thresholds = assignment.restrict(universe.node_ids());

        let simulator = CascadeSimulator::new(
            universe.graph(),
            thresholds,
            &seeds,
            self.config.iterations(),
        )?;
        let infected = simulator
            .last()
            .map_or(seeds.len(), |snapshot| snapshot.active_count());

        debug!(infected, participants, mean_degree, "trial completed");
        Ok(TrialResult::new(infected, participants, mean_degree))
    }
}

/// Runs one trial on `n` nodes with the default iteration budget.
///
/// `all = true` simulates the whole graph; `false` restricts the cascade to
/// the largest connected component.
///
/// # Errors
/// Returns [`crate::ContagionError::InvalidParameter`] when `n < 2` or the
/// simulated universe has fewer than two nodes.
///
/// # Examples
/// ```
/// use ltcascade_core::{RandomSource, trial};
///
/// let result = trial(2, true, &mut RandomSource::seeded(0))?;
/// assert_eq!(result.into_tuple().0, 2);
/// # Ok::<(), ltcascade_core::ContagionError>(())
/// ```
pub fn trial(n: usize, all: bool, rng: &mut RandomSource) -> Result<TrialResult> {
    let config = TrialConfigBuilder::new()
        .with_nodes(n)
        .with_whole_graph(all)
        .build()?;
    TrialRunner::new(config).run(rng)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::{ContagionError, ProbabilityPolicy};

    #[rstest]
    #[case(10, true)]
    #[case(300, false)]
    #[case(300, true)]
    fn infected_never_exceeds_participants(#[case] n: usize, #[case] all: bool) {
        for seed in 0..10 {
            let result = trial(n, all, &mut RandomSource::seeded(seed)).expect("trial must run");
            assert!(result.infected() <= result.participants());
            assert!(result.infected() >= 2);
            assert!((2.0..=7.0).contains(&result.mean_degree()));
        }
    }

    #[test]
    fn whole_graph_uses_every_node() {
        let result = trial(400, true, &mut RandomSource::seeded(5)).expect("trial must run");
        assert_eq!(result.participants(), 400);
    }

    #[test]
    fn two_nodes_saturate() {
        for seed in 0..25 {
            let result = trial(2, true, &mut RandomSource::seeded(seed)).expect("trial must run");
            assert_eq!(result.into_tuple().0, 2);
        }
    }

    #[test]
    fn identical_seeds_reproduce() {
        let first = trial(500, false, &mut RandomSource::seeded(31)).expect("trial must run");
        let second = trial(500, false, &mut RandomSource::seeded(31)).expect("trial must run");
        assert_eq!(first, second);
    }

    #[test]
    fn rejecting_policy_surfaces_degenerate_probability() {
        let config = TrialConfigBuilder::new()
            .with_nodes(2)
            .with_whole_graph(true)
            .with_probability_policy(ProbabilityPolicy::Reject)
            .build()
            .expect("configuration is valid");
        let err = TrialRunner::new(config)
            .run(&mut RandomSource::seeded(0))
            .expect_err("z / 2 is always above one");
        assert!(matches!(err, ContagionError::DegenerateProbability { .. }));
    }

    #[test]
    fn single_iteration_reports_seeds_only() {
        let config = TrialConfigBuilder::new()
            .with_nodes(100)
            .with_iterations(1)
            .build()
            .expect("configuration is valid");
        let result = TrialRunner::new(config)
            .run(&mut RandomSource::seeded(2))
            .expect("trial must run");
        assert_eq!(result.infected(), 2);
    }
}
