//! Selection of the node universe a cascade runs over.
//!
//! A trial either simulates the whole graph or only its largest connected
//! component. Components are labelled with a union-find pass over the edge
//! list and ordered by their smallest member, so ties on size resolve to the
//! component encountered first.

mod union_find;

use tracing::debug;

use crate::Graph;

use self::union_find::DisjointSet;

/// The graph a cascade runs over, with the mapping back to original ids.
///
/// # Examples
/// ```
/// use ltcascade_core::{Graph, select_universe};
///
/// let graph = Graph::from_edges(5, [(0, 1), (2, 3), (3, 4)])?;
/// let universe = select_universe(graph, true);
/// assert_eq!(universe.len(), 3);
/// assert_eq!(universe.node_ids(), &[2, 3, 4]);
/// # Ok::<(), ltcascade_core::ContagionError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subgraph {
    graph: Graph,
    node_ids: Vec<usize>,
}

impl Subgraph {
    /// The induced graph, with nodes relabelled `0..len()`.
    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// `node_ids()[i]` is the original id of local node `i`.
    #[must_use]
    pub fn node_ids(&self) -> &[usize] {
        &self.node_ids
    }

    /// Number of participating nodes (`N`).
    #[must_use]
    pub fn len(&self) -> usize {
        self.node_ids.len()
    }

    /// Returns `true` when no node participates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.node_ids.is_empty()
    }
}

/// Returns the full graph, or its largest connected component when
/// `restrict_to_largest` is set.
#[must_use]
pub fn select_universe(graph: Graph, restrict_to_largest: bool) -> Subgraph {
    if !restrict_to_largest {
        let node_ids = (0..graph.node_count()).collect();
        return Subgraph { graph, node_ids };
    }

    let members = largest_component(&graph);
    debug!(
        nodes = graph.node_count(),
        component = members.len(),
        "restricted to largest component"
    );
    Subgraph {
        graph: graph.induced(&members),
        node_ids: members,
    }
}

/// Lists connected components, each sorted ascending, ordered by smallest
/// member.
///
/// # Examples
/// ```
/// use ltcascade_core::{Graph, connected_components};
///
/// let graph = Graph::from_edges(4, [(3, 1)])?;
/// assert_eq!(connected_components(&graph), vec![vec![0], vec![1, 3], vec![2]]);
/// # Ok::<(), ltcascade_core::ContagionError>(())
/// ```
#[must_use]
pub fn connected_components(graph: &Graph) -> Vec<Vec<usize>> {
    let node_count = graph.node_count();
    let mut sets = DisjointSet::new(node_count);
    for (left, right) in graph.edges() {
        sets.union(left, right);
    }

    let mut slot_of_root = vec![None; node_count];
    let mut components: Vec<Vec<usize>> = Vec::new();
    for node in 0..node_count {
        let root = sets.find(node);
        let slot = *slot_of_root[root].get_or_insert_with(|| {
            components.push(Vec::new());
            components.len() - 1
        });
        components[slot].push(node);
    }
    components
}

/// Returns the members of the largest connected component.
///
/// Ties go to the component whose smallest member is lowest. Empty for an
/// empty graph.
#[must_use]
pub fn largest_component(graph: &Graph) -> Vec<usize> {
    let mut best: Vec<usize> = Vec::new();
    for component in connected_components(graph) {
        if component.len() > best.len() {
            best = component;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::{GraphGenerator, RandomSource};

    #[test]
    fn full_universe_keeps_every_node() {
        let graph = Graph::from_edges(4, [(0, 1)]).expect("edges are valid");
        let universe = select_universe(graph.clone(), false);
        assert_eq!(universe.len(), 4);
        assert_eq!(universe.graph(), &graph);
        assert_eq!(universe.node_ids(), &[0, 1, 2, 3]);
    }

    #[rstest]
    #[case::first_of_equal_pair(vec![(0, 1), (2, 3)], vec![0, 1])]
    #[case::larger_later(vec![(0, 1), (2, 3), (3, 4)], vec![2, 3, 4])]
    #[case::all_isolated(vec![], vec![0])]
    fn largest_component_breaks_ties_by_first_seen(
        #[case] edges: Vec<(usize, usize)>,
        #[case] expected: Vec<usize>,
    ) {
        let graph = Graph::from_edges(5, edges).expect("edges are valid");
        assert_eq!(largest_component(&graph), expected);
    }

    #[test]
    fn restricted_universe_is_connected_and_non_empty() {
        for seed in 0..20 {
            let mut rng = RandomSource::seeded(seed);
            let generated = GraphGenerator::default()
                .generate(300, &mut rng)
                .expect("generation must succeed");
            let universe = select_universe(generated.graph, true);
            assert!(!universe.is_empty());
            assert_eq!(connected_components(universe.graph()).len(), 1);
        }
    }

    #[test]
    fn components_partition_nodes() {
        let mut rng = RandomSource::seeded(77);
        let generated = GraphGenerator::default()
            .generate(150, &mut rng)
            .expect("generation must succeed");
        let mut seen: Vec<usize> = connected_components(&generated.graph)
            .into_iter()
            .flatten()
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..150).collect::<Vec<_>>());
    }

    #[test]
    fn empty_graph_has_no_components() {
        assert!(largest_component(&Graph::empty(0)).is_empty());
    }
}
