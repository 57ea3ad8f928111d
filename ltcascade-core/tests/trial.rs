//! End-to-end properties of single trials.

use ltcascade_core::{
    ContagionError, ContagionErrorCode, ProbabilityPolicy, RandomSource, TrialConfigBuilder,
    TrialRunner, trial,
};
use rstest::rstest;

#[rstest]
#[case(5_000, false, 1)]
#[case(5_000, false, 2)]
#[case(1_000, false, 3)]
#[case(1_000, true, 4)]
fn infected_never_exceeds_participants(#[case] n: usize, #[case] all: bool, #[case] seed: u64) {
    let result = trial(n, all, &mut RandomSource::seeded(seed)).expect("trial runs");
    assert!(result.infected() <= result.participants());
    assert!(result.participants() <= n);
    assert!((2.0..=7.0).contains(&result.mean_degree()));
}

#[rstest]
fn whole_graph_mode_uses_every_node() {
    let result = trial(5_000, true, &mut RandomSource::seeded(10)).expect("trial runs");
    assert_eq!(result.participants(), 5_000);
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(99)]
fn two_node_graph_saturates(#[case] seed: u64) {
    let result = trial(2, true, &mut RandomSource::seeded(seed)).expect("trial runs");
    assert_eq!(result.into_tuple().0, 2);
    assert_eq!(result.participants(), 2);
}

#[rstest]
fn same_seed_reproduces_the_trial() {
    let first = trial(2_000, false, &mut RandomSource::seeded(42)).expect("trial runs");
    let second = trial(2_000, false, &mut RandomSource::seeded(42)).expect("trial runs");
    assert_eq!(first.into_tuple(), second.into_tuple());
}

#[rstest]
#[case(0)]
#[case(1)]
fn tiny_graphs_are_rejected(#[case] n: usize) {
    let err = trial(n, true, &mut RandomSource::seeded(0)).expect_err("n < 2 is invalid");
    assert_eq!(err.code(), ContagionErrorCode::InvalidParameter);
    assert_eq!(err.code().as_str(), "LTCASCADE_INVALID_PARAMETER");
}

#[rstest]
fn rejecting_policy_fails_on_small_graphs() {
    // With three nodes every z in [2, 7] beyond 3 gives p > 1; retry seeds
    // until one lands there.
    let runner = TrialRunner::new(
        TrialConfigBuilder::new()
            .with_nodes(3)
            .with_whole_graph(true)
            .with_probability_policy(ProbabilityPolicy::Reject)
            .build()
            .expect("configuration is valid"),
    );
    let err = (0..64)
        .find_map(|seed| runner.run(&mut RandomSource::seeded(seed)).err())
        .expect("some seed draws z > 3");
    assert!(matches!(err, ContagionError::DegenerateProbability { probability } if probability > 1.0));
    assert_eq!(err.code().as_str(), "LTCASCADE_DEGENERATE_PROBABILITY");
}
