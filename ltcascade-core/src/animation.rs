//! Snapshot producer for animated cascades.
//!
//! [`CascadeAnimation`] prepares one cascade with thresholds drawn from a
//! caller-chosen upper bound and seeds two percent of the graph. Rendering
//! is left to a [`FrameRenderer`]: every call receives a [`FrameContext`]
//! carrying the graph, the largest component, the threshold bound, and the
//! snapshot, so renderers keep no simulation state between frames.

use tracing::{debug, instrument};

use crate::{
    CascadeSimulator, ContagionError, Graph, GraphGenerator, ProbabilityPolicy, RandomSource,
    Result, SimulationSnapshot, choose_seeds, graph::MIN_NODES, largest_component,
    uniform_thresholds,
};

/// Snapshots produced by an animated cascade.
pub const ANIMATION_ITERATIONS: usize = 30;

/// Fraction of all nodes seeded in an animated cascade.
pub const ANIMATION_SEED_FRACTION: f64 = 0.02;

/// Parameters of an animated cascade.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationConfig {
    /// Number of nodes in the generated graph.
    pub nodes: usize,
    /// Upper bound of the uniform threshold draw, within `[0, 1]`.
    pub threshold_upper_bound: f64,
    /// Number of snapshots (frames) to produce.
    pub iterations: usize,
    /// Treatment of edge probabilities above one.
    pub probability_policy: ProbabilityPolicy,
}

impl AnimationConfig {
    /// Configuration with the default frame count and clamping policy.
    #[must_use]
    pub fn new(nodes: usize, threshold_upper_bound: f64) -> Self {
        Self {
            nodes,
            threshold_upper_bound,
            iterations: ANIMATION_ITERATIONS,
            probability_policy: ProbabilityPolicy::Clamp,
        }
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self::new(100, 0.5)
    }
}

/// Everything a renderer needs to draw one frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameContext<'a> {
    /// The full generated graph.
    pub graph: &'a Graph,
    /// Sorted members of the largest connected component.
    pub component: &'a [usize],
    /// Upper bound the thresholds were drawn from.
    pub threshold_upper_bound: f64,
    /// Zero-based iteration of `snapshot`.
    pub iteration: usize,
    /// Total number of frames in the animation.
    pub total_iterations: usize,
    /// Activation state at `iteration`.
    pub snapshot: &'a SimulationSnapshot,
}

impl FrameContext<'_> {
    /// Active members of the largest component.
    #[must_use]
    pub fn infected_in_component(&self) -> usize {
        self.component
            .iter()
            .filter(|&&node| self.snapshot.state(node).is_active())
            .count()
    }

    /// Share of the largest component that is active.
    #[must_use]
    pub fn infected_fraction(&self) -> f64 {
        if self.component.is_empty() {
            return 0.0;
        }
        self.infected_in_component() as f64 / self.component.len() as f64
    }
}

/// Consumer of animation frames.
pub trait FrameRenderer {
    /// Error raised while rendering.
    type Error: From<ContagionError>;

    /// Draws one frame.
    ///
    /// # Errors
    /// Implementations report their own output failures.
    fn render(&mut self, frame: &FrameContext<'_>) -> core::result::Result<(), Self::Error>;
}

/// A prepared animated cascade.
///
/// # Examples
/// ```
/// use ltcascade_core::{AnimationConfig, CascadeAnimation, RandomSource};
///
/// let animation = CascadeAnimation::generate(
///     &AnimationConfig::new(100, 0.5),
///     &mut RandomSource::seeded(4),
/// )?;
/// let frames: Vec<_> = animation.snapshots()?.collect();
/// assert_eq!(frames.len(), 30);
/// assert_eq!(frames[0].active_count(), 2);
/// # Ok::<(), ltcascade_core::ContagionError>(())
/// ```
#[derive(Clone, Debug)]
pub struct CascadeAnimation {
    graph: Graph,
    component: Vec<usize>,
    thresholds: Vec<f64>,
    seeds: Vec<usize>,
    threshold_upper_bound: f64,
    mean_degree: f64,
    iterations: usize,
}

impl CascadeAnimation {
    /// Draws thresholds, a graph, and seeds for an animated cascade.
    ///
    /// # Errors
    /// Returns [`ContagionError::InvalidParameter`] when `nodes < 2`,
    /// `iterations` is zero, or the threshold bound is outside `[0, 1]`, and
    /// [`ContagionError::DegenerateProbability`] under a rejecting policy.
    #[instrument(
        name = "core.animation",
        err,
        skip(config, rng),
        fields(
            nodes = config.nodes,
            threshold_upper_bound = config.threshold_upper_bound,
            seed = rng.seed(),
        ),
    )]
    pub fn generate(config: &AnimationConfig, rng: &mut RandomSource) -> Result<Self> {
        if config.nodes < MIN_NODES {
            return Err(ContagionError::invalid_parameter(
                "nodes",
                config.nodes,
                "at least 2",
            ));
        }
        if config.iterations == 0 {
            return Err(ContagionError::invalid_parameter(
                "iterations",
                config.iterations,
                "at least 1",
            ));
        }

        let assignment = uniform_thresholds(
            config.nodes,
            config.threshold_upper_bound,
            ANIMATION_SEED_FRACTION,
            rng,
        )?;
        let generated = GraphGenerator::new(config.probability_policy).generate(config.nodes, rng)?;
        let seeds = choose_seeds(
            config.nodes,
            assignment.seed_count(config.nodes),
            rng,
        );
        let component = largest_component(&generated.graph);
        debug!(
            component = component.len(),
            seeds = seeds.len(),
            "prepared animated cascade"
        );

        Ok(Self {
            graph: generated.graph,
            component,
            thresholds: assignment.thresholds().to_vec(),
            seeds,
            threshold_upper_bound: config.threshold_upper_bound,
            mean_degree: generated.mean_degree,
            iterations: config.iterations,
        })
    }

    /// The generated graph.
    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Sorted members of the largest connected component.
    #[must_use]
    pub fn component(&self) -> &[usize] {
        &self.component
    }

    /// Initially active nodes.
    #[must_use]
    pub fn seeds(&self) -> &[usize] {
        &self.seeds
    }

    /// Target mean degree `z` of the generated graph.
    #[must_use]
    pub fn mean_degree(&self) -> f64 {
        self.mean_degree
    }

    /// Upper bound the thresholds were drawn from.
    #[must_use]
    pub fn threshold_upper_bound(&self) -> f64 {
        self.threshold_upper_bound
    }

    /// Starts a fresh lazy snapshot stream over the whole graph.
    ///
    /// # Errors
    /// Propagates [`CascadeSimulator::new`] validation failures.
    pub fn snapshots(&self) -> Result<CascadeSimulator<'_>> {
        CascadeSimulator::new(
            &self.graph,
            self.thresholds.clone(),
            &self.seeds,
            self.iterations,
        )
    }

    /// Builds the rendering context for `snapshot`.
    #[must_use]
    pub fn frame<'a>(&'a self, snapshot: &'a SimulationSnapshot) -> FrameContext<'a> {
        FrameContext {
            graph: &self.graph,
            component: &self.component,
            threshold_upper_bound: self.threshold_upper_bound,
            iteration: snapshot.iteration(),
            total_iterations: self.iterations,
            snapshot,
        }
    }

    /// Streams every frame to `renderer` and returns the frame count.
    ///
    /// # Errors
    /// Returns the renderer's error, or a [`ContagionError`] converted into
    /// it when the stream cannot start.
    pub fn play<R: FrameRenderer>(&self, renderer: &mut R) -> core::result::Result<usize, R::Error> {
        let mut frames = 0;
        for snapshot in self.snapshots()? {
            renderer.render(&self.frame(&snapshot))?;
            frames += 1;
        }
        Ok(frames)
    }
}
