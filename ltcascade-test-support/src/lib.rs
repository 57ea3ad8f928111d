//! Shared test utilities used across ltcascade crates.

pub mod proptest_profile;
pub mod tracing;
