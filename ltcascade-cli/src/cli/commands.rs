//! Command implementations and argument parsing for the ltcascade CLI.

use std::io::{self, Write};

use clap::{Args, Parser, Subcommand};
use ltcascade_core::{
    AnimationConfig, BatchSummary, CascadeAnimation, ContagionError, FrameContext,
    FrameRenderer, ParallelAggregator, RandomSource, TRIAL_ITERATIONS, TrialConfigBuilder,
    TrialResult, TrialRunner,
};
use thiserror::Error;
use tracing::{Span, field, info, instrument};

const DEFAULT_NODES: usize = 1_000;
const DEFAULT_TRIALS: usize = 10;
const DEFAULT_WORKERS: usize = 2;
const DEFAULT_ANIMATION_NODES: usize = 100;
const DEFAULT_THRESHOLD: f64 = 0.5;

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "ltcascade",
    about = "Simulate linear-threshold cascades on random graphs."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run a single trial and print `infected N z`.
    Trial(TrialCommand),
    /// Run a batch of trials across a worker pool.
    Batch(BatchCommand),
    /// Render an animated cascade as text frames.
    Animate(AnimateCommand),
}

/// Graph options shared by `trial` and `batch`.
#[derive(Debug, Args, Clone, Copy)]
pub struct GraphArgs {
    /// Number of nodes in each generated graph.
    #[arg(long, default_value_t = DEFAULT_NODES)]
    pub nodes: usize,

    /// Simulate on the whole graph instead of its largest component.
    #[arg(long)]
    pub whole_graph: bool,

    /// Cascade iterations per trial.
    #[arg(long, default_value_t = TRIAL_ITERATIONS)]
    pub iterations: usize,
}

/// Options accepted by the `trial` command.
#[derive(Debug, Args, Clone, Copy)]
pub struct TrialCommand {
    /// Graph options.
    #[command(flatten)]
    pub graph: GraphArgs,

    /// Seed for the random source; drawn from OS entropy when omitted.
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Options accepted by the `batch` command.
#[derive(Debug, Args, Clone, Copy)]
pub struct BatchCommand {
    /// Graph options.
    #[command(flatten)]
    pub graph: GraphArgs,

    /// Number of trials to run.
    #[arg(long, default_value_t = DEFAULT_TRIALS)]
    pub trials: usize,

    /// Number of worker threads.
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Master seed for the per-batch streams; drawn from OS entropy when
    /// omitted.
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Options accepted by the `animate` command.
#[derive(Debug, Args, Clone, Copy)]
pub struct AnimateCommand {
    /// Number of nodes in the generated graph.
    #[arg(long, default_value_t = DEFAULT_ANIMATION_NODES)]
    pub nodes: usize,

    /// Upper bound of the uniform threshold draw.
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,

    /// Number of frames to render.
    #[arg(long, default_value_t = ltcascade_core::ANIMATION_ITERATIONS)]
    pub iterations: usize,

    /// Seed for the random source; drawn from OS entropy when omitted.
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// The simulation core rejected the request or failed.
    #[error(transparent)]
    Core(#[from] ContagionError),
}

/// Outcome of executing a CLI command.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionSummary {
    /// A single trial.
    Trial {
        /// Seed the trial ran with.
        seed: u64,
        /// Trial outcome.
        result: TrialResult,
    },
    /// A batch of trials in batch order.
    Batch {
        /// Master seed the batch streams were derived from.
        seed: u64,
        /// Per-trial outcomes.
        results: Vec<TrialResult>,
        /// Statistics over `results`.
        summary: Option<BatchSummary>,
    },
    /// Rendered animation frames.
    Animation {
        /// Seed the animation ran with.
        seed: u64,
        /// One rendered line per frame.
        frames: Vec<String>,
    },
}

/// Renders frames as `Threshold: B - Iteration #i Infected P%` lines.
///
/// Iterations are numbered from one and the infected share is measured over
/// the largest connected component.
///
/// # Examples
/// ```
/// use ltcascade_cli::cli::TextFrameRenderer;
/// use ltcascade_core::{AnimationConfig, CascadeAnimation, RandomSource};
///
/// let animation = CascadeAnimation::generate(
///     &AnimationConfig::new(50, 0.5),
///     &mut RandomSource::seeded(3),
/// )?;
/// let mut renderer = TextFrameRenderer::default();
/// animation.play(&mut renderer)?;
/// assert!(renderer.lines()[0].starts_with("Threshold: 0.5 - Iteration #1 Infected "));
/// # Ok::<(), ltcascade_cli::cli::CliError>(())
/// ```
#[derive(Debug, Default, Clone)]
pub struct TextFrameRenderer {
    lines: Vec<String>,
}

impl TextFrameRenderer {
    /// Lines rendered so far.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Consumes the renderer, returning its lines.
    #[must_use]
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl FrameRenderer for TextFrameRenderer {
    type Error = CliError;

    fn render(&mut self, frame: &FrameContext<'_>) -> Result<(), CliError> {
        self.lines.push(format!(
            "Threshold: {} - Iteration #{} Infected {:.2}%",
            frame.threshold_upper_bound,
            frame.iteration + 1,
            frame.infected_fraction() * 100.0,
        ));
        Ok(())
    }
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when the core rejects the parameters or a batch
/// fails.
///
/// # Examples
/// ```
/// use ltcascade_cli::cli::{Cli, Command, ExecutionSummary, GraphArgs, TrialCommand, run_cli};
///
/// let cli = Cli {
///     command: Command::Trial(TrialCommand {
///         graph: GraphArgs { nodes: 200, whole_graph: true, iterations: 50 },
///         seed: Some(9),
///     }),
/// };
/// let ExecutionSummary::Trial { result, .. } = run_cli(cli)? else {
///     panic!("trial command yields a trial summary");
/// };
/// assert_eq!(result.participants(), 200);
/// # Ok::<(), ltcascade_cli::cli::CliError>(())
/// ```
#[instrument(name = "cli.run", err, skip(cli), fields(command = field::Empty))]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    let span = Span::current();
    match cli.command {
        Command::Trial(command) => {
            span.record("command", field::display("trial"));
            run_trial(command)
        }
        Command::Batch(command) => {
            span.record("command", field::display("batch"));
            run_batch(command)
        }
        Command::Animate(command) => {
            span.record("command", field::display("animate"));
            run_animate(command)
        }
    }
}

fn trial_runner(graph: GraphArgs) -> Result<TrialRunner, CliError> {
    let config = TrialConfigBuilder::new()
        .with_nodes(graph.nodes)
        .with_whole_graph(graph.whole_graph)
        .with_iterations(graph.iterations)
        .build()?;
    Ok(TrialRunner::new(config))
}

pub(super) fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| {
        let seed = RandomSource::from_entropy().seed();
        info!(seed, "drew seed from OS entropy");
        seed
    })
}

#[instrument(name = "cli.trial", err, skip(command), fields(seed = field::Empty))]
pub(super) fn run_trial(command: TrialCommand) -> Result<ExecutionSummary, CliError> {
    let runner = trial_runner(command.graph)?;
    let seed = resolve_seed(command.seed);
    Span::current().record("seed", seed);
    let result = runner.run(&mut RandomSource::seeded(seed))?;
    info!(
        infected = result.infected(),
        participants = result.participants(),
        "trial completed"
    );
    Ok(ExecutionSummary::Trial { seed, result })
}

#[instrument(
    name = "cli.batch",
    err,
    skip(command),
    fields(trials = command.trials, workers = command.workers, seed = field::Empty),
)]
pub(super) fn run_batch(command: BatchCommand) -> Result<ExecutionSummary, CliError> {
    let runner = trial_runner(command.graph)?;
    let aggregator = ParallelAggregator::new(runner.config(), command.workers)?;
    let seed = resolve_seed(command.seed);
    Span::current().record("seed", seed);
    let results = aggregator.run(command.trials, seed)?;
    let summary = BatchSummary::from_results(&results);
    info!(trials = results.len(), "batch completed");
    Ok(ExecutionSummary::Batch {
        seed,
        results,
        summary,
    })
}

#[instrument(
    name = "cli.animate",
    err,
    skip(command),
    fields(nodes = command.nodes, threshold = command.threshold, seed = field::Empty),
)]
pub(super) fn run_animate(command: AnimateCommand) -> Result<ExecutionSummary, CliError> {
    let seed = resolve_seed(command.seed);
    Span::current().record("seed", seed);
    let config = AnimationConfig {
        iterations: command.iterations,
        ..AnimationConfig::new(command.nodes, command.threshold)
    };
    let animation = CascadeAnimation::generate(&config, &mut RandomSource::seeded(seed))?;
    let mut renderer = TextFrameRenderer::default();
    let frames = animation.play(&mut renderer)?;
    info!(frames, component = animation.component().len(), "animation rendered");
    Ok(ExecutionSummary::Animation {
        seed,
        frames: renderer.into_lines(),
    })
}

/// Renders `summary` to `writer` as plain text.
///
/// Trial lines use the `infected N z` layout. Batches append a summary line
/// after the per-trial lines.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
///
/// # Examples
/// ```
/// # use std::io::Cursor;
/// use ltcascade_cli::cli::{ExecutionSummary, render_summary};
/// use ltcascade_core::TrialResult;
///
/// let summary = ExecutionSummary::Trial {
///     seed: 1,
///     result: TrialResult::new(12, 40, 3.5),
/// };
/// let mut buffer = Cursor::new(Vec::new());
/// render_summary(&summary, &mut buffer)?;
/// assert_eq!(buffer.into_inner(), b"12 40 3.5\n");
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    match summary {
        ExecutionSummary::Trial { result, .. } => writeln!(writer, "{result}")?,
        ExecutionSummary::Batch {
            results, summary, ..
        } => {
            for result in results {
                writeln!(writer, "{result}")?;
            }
            if let Some(stats) = summary {
                writeln!(
                    writer,
                    "trials: {} mean infected: {:.4} min: {:.4} max: {:.4} mean N: {:.1} mean z: {:.3}",
                    stats.trials(),
                    stats.mean_infected_fraction(),
                    stats.min_infected_fraction(),
                    stats.max_infected_fraction(),
                    stats.mean_participants(),
                    stats.mean_degree(),
                )?;
            }
        }
        ExecutionSummary::Animation { frames, .. } => {
            for frame in frames {
                writeln!(writer, "{frame}")?;
            }
        }
    }
    Ok(())
}
