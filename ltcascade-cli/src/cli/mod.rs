//! Command-line interface for running cascade trials.
//!
//! Three commands mirror the library surface: a single `trial`, a parallel
//! `batch`, and an `animate` command that renders every frame of a cascade
//! as a line of text.

mod commands;

pub use commands::{
    AnimateCommand, BatchCommand, Cli, CliError, Command, ExecutionSummary, GraphArgs,
    TextFrameRenderer, TrialCommand, render_summary, run_cli,
};
