//! Builder utilities for configuring trials.
//!
//! [`TrialConfigBuilder`] collects the knobs of a single trial and validates
//! them once, so [`TrialConfig`] values are always usable.

use crate::{ContagionError, ProbabilityPolicy, Result, TRIAL_ITERATIONS, graph::MIN_NODES};

/// Validated parameters for one trial.
///
/// # Examples
/// ```
/// use ltcascade_core::TrialConfigBuilder;
///
/// let config = TrialConfigBuilder::new()
///     .with_nodes(500)
///     .with_whole_graph(true)
///     .build()?;
/// assert_eq!(config.nodes(), 500);
/// assert!(config.whole_graph());
/// assert_eq!(config.iterations(), 50);
/// # Ok::<(), ltcascade_core::ContagionError>(())
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrialConfig {
    nodes: usize,
    whole_graph: bool,
    iterations: usize,
    probability_policy: ProbabilityPolicy,
}

impl TrialConfig {
    /// Number of nodes `n` in each generated graph.
    #[must_use]
    pub fn nodes(&self) -> usize {
        self.nodes
    }

    /// `true` to simulate the whole graph, `false` to restrict the cascade to
    /// the largest connected component.
    #[must_use]
    pub fn whole_graph(&self) -> bool {
        self.whole_graph
    }

    /// Number of snapshots the cascade produces.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Treatment of edge probabilities above one.
    #[must_use]
    pub fn probability_policy(&self) -> ProbabilityPolicy {
        self.probability_policy
    }
}

/// Configures and constructs [`TrialConfig`] values.
#[derive(Clone, Debug)]
pub struct TrialConfigBuilder {
    nodes: usize,
    whole_graph: bool,
    iterations: usize,
    probability_policy: ProbabilityPolicy,
}

impl Default for TrialConfigBuilder {
    fn default() -> Self {
        Self {
            nodes: 1_000,
            whole_graph: false,
            iterations: TRIAL_ITERATIONS,
            probability_policy: ProbabilityPolicy::Clamp,
        }
    }
}

impl TrialConfigBuilder {
    /// Creates a builder populated with default parameters.
    ///
    /// # Examples
    /// ```
    /// use ltcascade_core::{ProbabilityPolicy, TrialConfigBuilder};
    ///
    /// let builder = TrialConfigBuilder::new();
    /// assert_eq!(builder.nodes(), 1_000);
    /// assert!(!builder.whole_graph());
    /// assert_eq!(builder.probability_policy(), ProbabilityPolicy::Clamp);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the node count.
    #[must_use]
    pub fn with_nodes(mut self, nodes: usize) -> Self {
        self.nodes = nodes;
        self
    }

    /// Returns the configured node count.
    #[must_use]
    pub fn nodes(&self) -> usize {
        self.nodes
    }

    /// Chooses between the whole graph and its largest component.
    #[must_use]
    pub fn with_whole_graph(mut self, whole_graph: bool) -> Self {
        self.whole_graph = whole_graph;
        self
    }

    /// Returns whether the whole graph is simulated.
    #[must_use]
    pub fn whole_graph(&self) -> bool {
        self.whole_graph
    }

    /// Overrides the number of snapshots per cascade.
    #[must_use]
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Returns the configured number of snapshots.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Sets the policy for edge probabilities above one.
    #[must_use]
    pub fn with_probability_policy(mut self, policy: ProbabilityPolicy) -> Self {
        self.probability_policy = policy;
        self
    }

    /// Returns the configured probability policy.
    #[must_use]
    pub fn probability_policy(&self) -> ProbabilityPolicy {
        self.probability_policy
    }

    /// Validates the configuration and constructs a [`TrialConfig`].
    ///
    /// # Errors
    /// Returns [`ContagionError::InvalidParameter`] when fewer than two
    /// nodes or zero iterations are requested.
    ///
    /// # Examples
    /// ```
    /// use ltcascade_core::TrialConfigBuilder;
    ///
    /// assert!(TrialConfigBuilder::new().with_nodes(1).build().is_err());
    /// assert!(TrialConfigBuilder::new().with_iterations(0).build().is_err());
    /// ```
    pub fn build(self) -> Result<TrialConfig> {
        if self.nodes < MIN_NODES {
            return Err(ContagionError::invalid_parameter(
                "nodes",
                self.nodes,
                "at least 2",
            ));
        }
        if self.iterations == 0 {
            return Err(ContagionError::invalid_parameter(
                "iterations",
                self.iterations,
                "at least 1",
            ));
        }
        Ok(TrialConfig {
            nodes: self.nodes,
            whole_graph: self.whole_graph,
            iterations: self.iterations,
            probability_policy: self.probability_policy,
        })
    }
}
