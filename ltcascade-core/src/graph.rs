//! Random graph generation.
//!
//! Graphs are undirected and simple: no self-loops and no parallel edges.
//! [`GraphGenerator`] samples a Gilbert (Erdos-Renyi `G(n, p)`) graph whose
//! expected mean degree `z` is drawn uniformly from [`MEAN_DEGREE_RANGE`].

use std::ops::RangeInclusive;

use rand::Rng;
use tracing::{debug, warn};

use crate::{ContagionError, RandomSource, Result};

/// Interval the expected mean degree `z` is drawn from for each graph.
pub const MEAN_DEGREE_RANGE: RangeInclusive<f64> = 2.0..=7.0;

/// Smallest node count a generated graph may have.
pub const MIN_NODES: usize = 2;

/// An immutable undirected simple graph over nodes `0..node_count`.
///
/// # Examples
/// ```
/// use ltcascade_core::Graph;
///
/// let graph = Graph::from_edges(4, [(0, 1), (1, 2), (2, 1)])?;
/// assert_eq!(graph.edge_count(), 2);
/// assert_eq!(graph.neighbours(1), &[0, 2]);
/// assert_eq!(graph.degree(3), 0);
/// # Ok::<(), ltcascade_core::ContagionError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Graph {
    adjacency: Vec<Vec<usize>>,
    edge_count: usize,
}

impl Graph {
    /// Creates a graph with `node_count` isolated nodes.
    #[must_use]
    pub fn empty(node_count: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); node_count],
            edge_count: 0,
        }
    }

    /// Builds a graph from an undirected edge list.
    ///
    /// Repeated edges (in either orientation) are merged.
    ///
    /// # Errors
    /// Returns [`ContagionError::InvalidParameter`] when an edge is a
    /// self-loop or references a node outside `0..node_count`.
    pub fn from_edges<I>(node_count: usize, edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut adjacency = vec![Vec::new(); node_count];
        for (left, right) in edges {
            if left >= node_count || right >= node_count {
                return Err(ContagionError::invalid_parameter(
                    "edge",
                    format!("({left}, {right})"),
                    "endpoints below the node count",
                ));
            }
            if left == right {
                return Err(ContagionError::invalid_parameter(
                    "edge",
                    format!("({left}, {right})"),
                    "distinct endpoints",
                ));
            }
            adjacency[left].push(right);
            adjacency[right].push(left);
        }

        let mut endpoint_total = 0;
        for neighbours in &mut adjacency {
            neighbours.sort_unstable();
            neighbours.dedup();
            endpoint_total += neighbours.len();
        }

        Ok(Self {
            adjacency,
            edge_count: endpoint_total / 2,
        })
    }

    /// Number of nodes in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of undirected edges in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Returns the sorted neighbours of `node`, or an empty slice for an
    /// unknown node.
    #[must_use]
    pub fn neighbours(&self, node: usize) -> &[usize] {
        self.adjacency
            .get(node)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns the degree of `node`.
    #[must_use]
    pub fn degree(&self, node: usize) -> usize {
        self.neighbours(node).len()
    }

    /// Realised mean degree `2|E| / n`; zero for an empty graph.
    #[must_use]
    pub fn mean_degree(&self) -> f64 {
        if self.adjacency.is_empty() {
            return 0.0;
        }
        2.0 * self.edge_count as f64 / self.adjacency.len() as f64
    }

    /// Iterates over every edge once as `(smaller, larger)`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(node, neighbours)| {
                neighbours
                    .iter()
                    .copied()
                    .filter(move |&other| other > node)
                    .map(move |other| (node, other))
            })
    }

    /// Builds the subgraph induced by `members`, relabelling `members[i]`
    /// to `i`. `members` must be sorted and in range.
    pub(crate) fn induced(&self, members: &[usize]) -> Self {
        let mut local = vec![None; self.adjacency.len()];
        for (index, &node) in members.iter().enumerate() {
            local[node] = Some(index);
        }

        let mut edge_count = 0;
        let adjacency: Vec<Vec<usize>> = members
            .iter()
            .map(|&node| {
                let neighbours: Vec<usize> = self
                    .neighbours(node)
                    .iter()
                    .filter_map(|&other| local[other])
                    .collect();
                edge_count += neighbours.len();
                neighbours
            })
            .collect();

        Self {
            adjacency,
            edge_count: edge_count / 2,
        }
    }
}

/// How [`GraphGenerator`] treats an edge probability `z / n` above one.
///
/// `z / n` exceeds one only when `n < z`, i.e. for graphs with fewer than
/// eight nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProbabilityPolicy {
    /// Clamp the probability into `[0, 1]` and keep going.
    #[default]
    Clamp,
    /// Fail with [`ContagionError::DegenerateProbability`].
    Reject,
}

impl ProbabilityPolicy {
    /// Applies the policy to a raw edge probability.
    ///
    /// # Errors
    /// Returns [`ContagionError::DegenerateProbability`] under
    /// [`ProbabilityPolicy::Reject`] when `probability` is outside `[0, 1]`
    /// or not finite.
    ///
    /// # Examples
    /// ```
    /// use ltcascade_core::ProbabilityPolicy;
    ///
    /// assert_eq!(ProbabilityPolicy::Clamp.resolve(1.5)?, 1.0);
    /// assert!(ProbabilityPolicy::Reject.resolve(1.5).is_err());
    /// assert_eq!(ProbabilityPolicy::Reject.resolve(0.25)?, 0.25);
    /// # Ok::<(), ltcascade_core::ContagionError>(())
    /// ```
    pub fn resolve(self, probability: f64) -> Result<f64> {
        if (0.0..=1.0).contains(&probability) {
            return Ok(probability);
        }
        match self {
            Self::Clamp if !probability.is_nan() => {
                warn!(probability, "edge probability outside [0, 1], clamping");
                Ok(probability.clamp(0.0, 1.0))
            }
            _ => Err(ContagionError::DegenerateProbability { probability }),
        }
    }
}

/// A generated graph together with the parameters it was sampled with.
#[derive(Clone, Debug)]
pub struct GeneratedGraph {
    /// The sampled graph.
    pub graph: Graph,
    /// Target expected mean degree `z`.
    pub mean_degree: f64,
    /// Effective edge probability `p` after the [`ProbabilityPolicy`].
    pub edge_probability: f64,
}

/// Samples random graphs with a random target mean degree.
///
/// # Examples
/// ```
/// use ltcascade_core::{GraphGenerator, ProbabilityPolicy, RandomSource};
///
/// let mut rng = RandomSource::seeded(3);
/// let generated = GraphGenerator::new(ProbabilityPolicy::Clamp).generate(50, &mut rng)?;
/// assert_eq!(generated.graph.node_count(), 50);
/// assert!((2.0..=7.0).contains(&generated.mean_degree));
/// # Ok::<(), ltcascade_core::ContagionError>(())
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GraphGenerator {
    policy: ProbabilityPolicy,
}

impl GraphGenerator {
    /// Creates a generator applying `policy` to out-of-range probabilities.
    #[must_use]
    pub fn new(policy: ProbabilityPolicy) -> Self {
        Self { policy }
    }

    /// Returns the configured probability policy.
    #[must_use]
    pub fn policy(&self) -> ProbabilityPolicy {
        self.policy
    }

    /// Draws `z`, derives `p = z / n`, and samples a graph on `nodes` nodes.
    ///
    /// # Errors
    /// Returns [`ContagionError::InvalidParameter`] when `nodes < 2` and
    /// [`ContagionError::DegenerateProbability`] when `p > 1` under
    /// [`ProbabilityPolicy::Reject`].
    pub fn generate(&self, nodes: usize, rng: &mut RandomSource) -> Result<GeneratedGraph> {
        if nodes < MIN_NODES {
            return Err(ContagionError::invalid_parameter(
                "nodes",
                nodes,
                "at least 2",
            ));
        }
        let mean_degree = rng.gen_range(MEAN_DEGREE_RANGE);
        let edge_probability = self.policy.resolve(mean_degree / nodes as f64)?;
        let graph = gilbert_graph(nodes, edge_probability, rng);
        debug!(
            nodes,
            mean_degree,
            edge_probability,
            edges = graph.edge_count(),
            "generated random graph"
        );
        Ok(GeneratedGraph {
            graph,
            mean_degree,
            edge_probability,
        })
    }
}

/// Samples `G(nodes, probability)`, drawing once per unordered pair.
///
/// `probability` must already lie in `[0, 1]`. Every pair consumes one
/// uniform draw even when `probability` is exactly zero or one.
pub(crate) fn gilbert_graph(nodes: usize, probability: f64, rng: &mut RandomSource) -> Graph {
    let mut adjacency = vec![Vec::new(); nodes];
    let mut edge_count = 0;
    for i in 0..nodes {
        for j in (i + 1)..nodes {
            if rng.r#gen::<f64>() < probability {
                adjacency[i].push(j);
                adjacency[j].push(i);
                edge_count += 1;
            }
        }
    }
    Graph {
        adjacency,
        edge_count,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::RngCore;
    use rstest::rstest;

    use super::*;

    fn assert_simple(graph: &Graph) {
        for node in 0..graph.node_count() {
            let neighbours = graph.neighbours(node);
            assert!(!neighbours.contains(&node), "self-loop on {node}");
            let unique: HashSet<_> = neighbours.iter().collect();
            assert_eq!(unique.len(), neighbours.len(), "parallel edge on {node}");
            for &other in neighbours {
                assert!(graph.neighbours(other).contains(&node), "asymmetric edge");
            }
        }
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    fn generate_rejects_tiny_graphs(#[case] nodes: usize) {
        let mut rng = RandomSource::seeded(1);
        let err = GraphGenerator::default()
            .generate(nodes, &mut rng)
            .expect_err("fewer than two nodes must be rejected");
        assert!(matches!(
            err,
            ContagionError::InvalidParameter {
                parameter: "nodes",
                ..
            }
        ));
    }

    #[rstest]
    #[case(2)]
    #[case(5)]
    #[case(200)]
    fn generated_graphs_are_simple(#[case] nodes: usize) {
        let mut rng = RandomSource::seeded(nodes as u64);
        let generated = GraphGenerator::default()
            .generate(nodes, &mut rng)
            .expect("generation must succeed");
        assert_eq!(generated.graph.node_count(), nodes);
        assert!((0.0..=1.0).contains(&generated.edge_probability));
        assert_simple(&generated.graph);
        assert_eq!(generated.graph.edges().count(), generated.graph.edge_count());
    }

    #[test]
    fn two_node_graph_is_clamped_to_a_single_edge() {
        let mut rng = RandomSource::seeded(11);
        let generated = GraphGenerator::default()
            .generate(2, &mut rng)
            .expect("clamping policy accepts p > 1");
        assert!((generated.edge_probability - 1.0).abs() < f64::EPSILON);
        assert_eq!(generated.graph.edge_count(), 1);
    }

    #[test]
    fn reject_policy_refuses_degenerate_probability() {
        let mut rng = RandomSource::seeded(11);
        let err = GraphGenerator::new(ProbabilityPolicy::Reject)
            .generate(2, &mut rng)
            .expect_err("z / 2 always exceeds one");
        assert_eq!(err.code(), crate::ContagionErrorCode::DegenerateProbability);
    }

    #[rstest]
    #[case(0.0)]
    #[case(0.3)]
    #[case(1.0)]
    fn every_pair_consumes_one_draw(#[case] probability: f64) {
        let nodes = 6;
        let pairs = nodes * (nodes - 1) / 2;
        let mut sampled = RandomSource::seeded(13);
        let _ = gilbert_graph(nodes, probability, &mut sampled);
        let mut reference = RandomSource::seeded(13);
        for _ in 0..pairs {
            let _: f64 = reference.r#gen();
        }
        assert_eq!(sampled.next_u64(), reference.next_u64());
    }

    #[test]
    fn reject_policy_refuses_nan() {
        assert!(ProbabilityPolicy::Clamp.resolve(f64::NAN).is_err());
    }

    #[test]
    fn generation_is_reproducible() {
        let first = GraphGenerator::default()
            .generate(120, &mut RandomSource::seeded(8))
            .expect("generation must succeed");
        let second = GraphGenerator::default()
            .generate(120, &mut RandomSource::seeded(8))
            .expect("generation must succeed");
        assert_eq!(first.graph, second.graph);
        assert_eq!(first.mean_degree.to_bits(), second.mean_degree.to_bits());
    }

    #[test]
    fn realised_degree_tracks_target() {
        let mut rng = RandomSource::seeded(21);
        let generated = GraphGenerator::default()
            .generate(2_000, &mut rng)
            .expect("generation must succeed");
        let realised = generated.graph.mean_degree();
        assert!(
            (realised - generated.mean_degree).abs() < 1.0,
            "realised {realised} far from target {}",
            generated.mean_degree
        );
    }

    #[test]
    fn from_edges_rejects_self_loops_and_unknown_nodes() {
        assert!(Graph::from_edges(3, [(1, 1)]).is_err());
        assert!(Graph::from_edges(3, [(0, 3)]).is_err());
    }

    #[test]
    fn induced_subgraph_relabels_members() {
        let graph = Graph::from_edges(5, [(0, 1), (1, 3), (3, 4), (2, 0)])
            .expect("edges are valid");
        let induced = graph.induced(&[1, 3, 4]);
        assert_eq!(induced.node_count(), 3);
        assert_eq!(induced.edge_count(), 2);
        assert_eq!(induced.neighbours(0), &[1]);
        assert_eq!(induced.neighbours(1), &[0, 2]);
    }
}
