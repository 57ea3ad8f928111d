//! Benchmark support crate for ltcascade.
//!
//! Holds the parameter types Criterion benchmarks use to label their
//! inputs.

pub mod params;
