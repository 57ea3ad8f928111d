//! Discrete-time linear-threshold cascade.
//!
//! Each node is either [`NodeState::Inactive`] or [`NodeState::Active`];
//! activation is permanent. At every step an inactive node with degree `d`
//! and `a` active neighbours activates when `a / d >= threshold`. All nodes
//! read the state from the start of the step, so updates are synchronous.
//!
//! [`CascadeSimulator`] is an iterator over [`SimulationSnapshot`]s. The
//! first snapshot is the seeded state; every later one applies one step. The
//! run always produces exactly the configured number of snapshots, even once
//! the active set has stopped growing.

use std::iter::FusedIterator;

use crate::{ContagionError, Graph, Result};

/// Snapshots produced by a standalone trial.
pub const TRIAL_ITERATIONS: usize = 50;

/// Activation state of a single node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NodeState {
    /// Not yet activated.
    #[default]
    Inactive,
    /// Activated; terminal.
    Active,
}

impl NodeState {
    /// Returns `true` for [`NodeState::Active`].
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Activation state of every node at one iteration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulationSnapshot {
    iteration: usize,
    states: Vec<NodeState>,
    active_count: usize,
    newly_active: Vec<usize>,
}

impl SimulationSnapshot {
    /// Zero-based iteration index; iteration zero is the seeded state.
    #[must_use]
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// State of every node, indexed by node id.
    #[must_use]
    pub fn states(&self) -> &[NodeState] {
        &self.states
    }

    /// State of `node`; unknown nodes read as inactive.
    #[must_use]
    pub fn state(&self, node: usize) -> NodeState {
        self.states.get(node).copied().unwrap_or_default()
    }

    /// Number of active nodes.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active_count
    }

    /// Nodes that became active at this iteration, ascending.
    #[must_use]
    pub fn newly_active(&self) -> &[usize] {
        &self.newly_active
    }

    /// Ids of all active nodes, ascending.
    pub fn active_nodes(&self) -> impl Iterator<Item = usize> + '_ {
        self.states
            .iter()
            .enumerate()
            .filter_map(|(node, state)| state.is_active().then_some(node))
    }
}

/// Lazy, finite, non-restartable linear-threshold simulation.
///
/// # Examples
/// ```
/// use ltcascade_core::{CascadeSimulator, Graph};
///
/// // A path 0 - 1 - 2 where every node fires on any active neighbour.
/// let graph = Graph::from_edges(3, [(0, 1), (1, 2)])?;
/// let simulator = CascadeSimulator::new(&graph, vec![0.1; 3], &[0], 4)?;
/// let counts: Vec<usize> = simulator.map(|s| s.active_count()).collect();
/// assert_eq!(counts, vec![1, 2, 3, 3]);
/// # Ok::<(), ltcascade_core::ContagionError>(())
/// ```
#[derive(Clone, Debug)]
pub struct CascadeSimulator<'g> {
    graph: &'g Graph,
    thresholds: Vec<f64>,
    states: Vec<NodeState>,
    active_count: usize,
    pending_seeds: Vec<usize>,
    next_iteration: usize,
    iterations: usize,
}

impl<'g> CascadeSimulator<'g> {
    /// Prepares a run of `iterations` snapshots over `graph`.
    ///
    /// `thresholds[i]` is the threshold of node `i`. Duplicate seeds are
    /// merged.
    ///
    /// # Errors
    /// Returns [`ContagionError::InvalidParameter`] when `iterations` is
    /// zero, the threshold count differs from the node count, or a seed is
    /// not a node of `graph`.
    pub fn new(
        graph: &'g Graph,
        thresholds: Vec<f64>,
        seeds: &[usize],
        iterations: usize,
    ) -> Result<Self> {
        if iterations == 0 {
            return Err(ContagionError::invalid_parameter(
                "iterations",
                iterations,
                "at least 1",
            ));
        }
        let node_count = graph.node_count();
        if thresholds.len() != node_count {
            return Err(ContagionError::invalid_parameter(
                "thresholds",
                thresholds.len(),
                "one threshold per node",
            ));
        }
        if let Some(&seed) = seeds.iter().find(|&&seed| seed >= node_count) {
            return Err(ContagionError::invalid_parameter(
                "seed",
                seed,
                "a node of the graph",
            ));
        }

        let mut pending_seeds = seeds.to_vec();
        pending_seeds.sort_unstable();
        pending_seeds.dedup();

        Ok(Self {
            graph,
            thresholds,
            states: vec![NodeState::Inactive; node_count],
            active_count: 0,
            pending_seeds,
            next_iteration: 0,
            iterations,
        })
    }

    /// The graph being simulated.
    #[must_use]
    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    /// Total number of snapshots this run produces.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Snapshots not yet produced.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.iterations - self.next_iteration
    }

    /// Collects the nodes that activate on this step, without mutating state.
    fn next_activations(&self) -> Vec<usize> {
        let mut activated = Vec::new();
        for (node, state) in self.states.iter().enumerate() {
            if state.is_active() {
                continue;
            }
            let neighbours = self.graph.neighbours(node);
            if neighbours.is_empty() {
                continue;
            }
            let active = neighbours
                .iter()
                .filter(|&&other| self.states[other].is_active())
                .count();
            if active as f64 / neighbours.len() as f64 >= self.thresholds[node] {
                activated.push(node);
            }
        }
        activated
    }

    fn activate(&mut self, nodes: &[usize]) {
        for &node in nodes {
            self.states[node] = NodeState::Active;
        }
        self.active_count += nodes.len();
    }
}

impl Iterator for CascadeSimulator<'_> {
    type Item = SimulationSnapshot;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_iteration >= self.iterations {
            return None;
        }
        let newly_active = if self.next_iteration == 0 {
            std::mem::take(&mut self.pending_seeds)
        } else {
            self.next_activations()
        };
        self.activate(&newly_active);

        let snapshot = SimulationSnapshot {
            iteration: self.next_iteration,
            states: self.states.clone(),
            active_count: self.active_count,
            newly_active,
        };
        self.next_iteration += 1;
        Some(snapshot)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CascadeSimulator<'_> {}

impl FusedIterator for CascadeSimulator<'_> {}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;
    use crate::{GraphGenerator, RandomSource, test_utils::suite_proptest_config, uniform_thresholds};

    fn star(leaves: usize) -> Graph {
        Graph::from_edges(leaves + 1, (1..=leaves).map(|leaf| (0, leaf)))
            .expect("star edges are valid")
    }

    #[test]
    fn produces_exactly_the_budget() {
        let graph = Graph::empty(3);
        let simulator =
            CascadeSimulator::new(&graph, vec![0.5; 3], &[1], 50).expect("valid configuration");
        assert_eq!(simulator.len(), 50);
        let snapshots: Vec<_> = simulator.collect();
        assert_eq!(snapshots.len(), 50);
        assert!(snapshots.iter().all(|s| s.active_count() == 1));
        assert_eq!(snapshots.last().map(SimulationSnapshot::iteration), Some(49));
    }

    #[test]
    fn isolated_nodes_never_activate() {
        let graph = Graph::empty(4);
        let last = CascadeSimulator::new(&graph, vec![0.0; 4], &[0], 10)
            .expect("valid configuration")
            .last()
            .expect("non-empty run");
        assert_eq!(last.active_count(), 1);
        assert_eq!(last.state(0), NodeState::Active);
        assert_eq!(last.state(3), NodeState::Inactive);
    }

    #[test]
    fn updates_are_synchronous() {
        // 0 - 1 - 2: node 2 must wait for the step after node 1 activates.
        let graph = Graph::from_edges(3, [(0, 1), (1, 2)]).expect("valid edges");
        let snapshots: Vec<_> = CascadeSimulator::new(&graph, vec![0.5; 3], &[0], 3)
            .expect("valid configuration")
            .collect();
        assert_eq!(snapshots[0].newly_active(), &[0]);
        assert_eq!(snapshots[1].newly_active(), &[1]);
        assert_eq!(snapshots[2].newly_active(), &[2]);
    }

    #[rstest]
    #[case::exactly_at_threshold(0.5, true)]
    #[case::below_threshold(0.51, false)]
    fn activation_uses_fraction_of_active_neighbours(
        #[case] threshold: f64,
        #[case] activates: bool,
    ) {
        // Node 1 sits between seed 0 and inactive node 2: fraction 1/2.
        let graph = Graph::from_edges(3, [(0, 1), (1, 2)]).expect("valid edges");
        let thresholds = vec![1.0, threshold, 1.0];
        let last = CascadeSimulator::new(&graph, thresholds, &[0], 2)
            .expect("valid configuration")
            .last()
            .expect("non-empty run");
        assert_eq!(last.state(1).is_active(), activates);
    }

    #[test]
    fn hub_activates_once_enough_leaves_are_active() {
        let graph = star(4);
        let thresholds = vec![0.75, 1.0, 1.0, 1.0, 1.0];
        let seeded_two = CascadeSimulator::new(&graph, thresholds.clone(), &[1, 2], 5)
            .expect("valid configuration")
            .last()
            .expect("non-empty run");
        assert_eq!(seeded_two.state(0), NodeState::Inactive);

        let seeded_three = CascadeSimulator::new(&graph, thresholds, &[1, 2, 3], 5)
            .expect("valid configuration")
            .last()
            .expect("non-empty run");
        assert_eq!(seeded_three.state(0), NodeState::Active);
        // Leaf 4 has a single neighbour, now active: 1/1 >= 1.0.
        assert_eq!(seeded_three.active_count(), 5);
    }

    #[test]
    fn active_set_grows_monotonically() {
        let graph = star(6);
        let snapshots: Vec<_> = CascadeSimulator::new(&graph, vec![0.2; 7], &[3], 6)
            .expect("valid configuration")
            .collect();
        for pair in snapshots.windows(2) {
            for node in pair[0].active_nodes() {
                assert!(pair[1].state(node).is_active());
            }
            assert!(pair[1].active_count() >= pair[0].active_count());
        }
    }

    #[test]
    fn duplicate_seeds_are_merged() {
        let graph = Graph::empty(2);
        let first = CascadeSimulator::new(&graph, vec![1.0; 2], &[1, 1], 1)
            .expect("valid configuration")
            .next()
            .expect("one snapshot");
        assert_eq!(first.active_count(), 1);
    }

    #[rstest]
    #[case::zero_budget(vec![0.1; 2], vec![0], 0)]
    #[case::threshold_mismatch(vec![0.1; 3], vec![0], 5)]
    #[case::unknown_seed(vec![0.1; 2], vec![2], 5)]
    fn rejects_invalid_configuration(
        #[case] thresholds: Vec<f64>,
        #[case] seeds: Vec<usize>,
        #[case] iterations: usize,
    ) {
        let graph = Graph::from_edges(2, [(0, 1)]).expect("valid edges");
        assert!(CascadeSimulator::new(&graph, thresholds, &seeds, iterations).is_err());
    }

    proptest! {
        #![proptest_config(suite_proptest_config(64))]

        #[test]
        fn random_cascades_only_grow(
            seed in any::<u64>(),
            nodes in 2usize..120,
            bound in 0.0f64..=1.0,
        ) {
            let mut rng = RandomSource::seeded(seed);
            let generated = GraphGenerator::default()
                .generate(nodes, &mut rng)
                .expect("node count is valid");
            let assignment = uniform_thresholds(nodes, bound, 0.02, &mut rng)
                .expect("bound is valid");
            let seeds = crate::choose_seeds(nodes, assignment.seed_count(nodes), &mut rng);
            let snapshots: Vec<_> = CascadeSimulator::new(
                &generated.graph,
                assignment.thresholds().to_vec(),
                &seeds,
                TRIAL_ITERATIONS,
            )
            .expect("configuration is valid")
            .collect();

            prop_assert_eq!(snapshots.len(), TRIAL_ITERATIONS);
            for pair in snapshots.windows(2) {
                prop_assert!(pair[0].active_nodes().all(|node| pair[1].state(node).is_active()));
                prop_assert_eq!(
                    pair[1].active_count(),
                    pair[0].active_count() + pair[1].newly_active().len()
                );
            }
            let last = snapshots.last().expect("non-empty run");
            prop_assert_eq!(last.active_nodes().count(), last.active_count());
        }
    }
}
