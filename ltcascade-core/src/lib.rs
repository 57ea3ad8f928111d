//! Linear-threshold cascade simulation on random graphs.
//!
//! A trial samples a Gilbert random graph with a random target mean degree,
//! optionally restricts it to its largest connected component, draws
//! per-node thresholds, seeds two nodes, and runs a synchronous
//! linear-threshold cascade for a fixed number of iterations. Batches of
//! trials run in parallel on a fixed-size worker pool, each batch drawing
//! from its own seeded random stream.
//!
//! ```
//! use ltcascade_core::{RandomSource, multi_trials, trial};
//!
//! let single = trial(300, false, &mut RandomSource::seeded(1))?;
//! assert!(single.infected() <= single.participants());
//!
//! let batch = multi_trials(300, true, 8, 2, 1)?;
//! assert_eq!(batch.len(), 8);
//! # Ok::<(), ltcascade_core::ContagionError>(())
//! ```

mod aggregate;
mod animation;
mod builder;
mod cascade;
mod component;
mod error;
mod graph;
mod result;
mod rng;
#[cfg(test)]
mod test_utils;
mod threshold;
mod trial;

pub use crate::{
    aggregate::{BatchPlan, ParallelAggregator, multi_trials},
    animation::{
        ANIMATION_ITERATIONS, ANIMATION_SEED_FRACTION, AnimationConfig, CascadeAnimation,
        FrameContext, FrameRenderer,
    },
    builder::{TrialConfig, TrialConfigBuilder},
    cascade::{CascadeSimulator, NodeState, SimulationSnapshot, TRIAL_ITERATIONS},
    component::{Subgraph, connected_components, largest_component, select_universe},
    error::{BatchFailure, ContagionError, ContagionErrorCode, Result},
    graph::{GeneratedGraph, Graph, GraphGenerator, MEAN_DEGREE_RANGE, ProbabilityPolicy},
    result::{BatchSummary, TrialResult},
    rng::RandomSource,
    threshold::{
        TRIAL_SEED_COUNT, ThresholdAssignment, assign_thresholds, choose_seeds,
        normalizing_factor, uniform_thresholds,
    },
    trial::{TrialRunner, trial},
};
