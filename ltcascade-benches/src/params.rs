//! Benchmark parameter types.

use std::fmt;

/// Parameters for a single-trial benchmark run.
#[derive(Clone, Copy, Debug)]
pub struct TrialBenchParams {
    /// Number of nodes in the generated graph.
    pub nodes: usize,
    /// Whether the whole graph is simulated.
    pub whole_graph: bool,
}

impl fmt::Display for TrialBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let universe = if self.whole_graph { "all" } else { "lcc" };
        write!(f, "n={},{universe}", self.nodes)
    }
}

/// Parameters for a parallel batch benchmark run.
#[derive(Clone, Copy, Debug)]
pub struct BatchBenchParams {
    /// Number of nodes in each generated graph.
    pub nodes: usize,
    /// Trials per batch run.
    pub trials: usize,
    /// Worker threads.
    pub workers: usize,
}

impl fmt::Display for BatchBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n={},T={},W={}", self.nodes, self.trials, self.workers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_compact() {
        let trial = TrialBenchParams {
            nodes: 1_000,
            whole_graph: false,
        };
        assert_eq!(trial.to_string(), "n=1000,lcc");
        let batch = BatchBenchParams {
            nodes: 500,
            trials: 20,
            workers: 4,
        };
        assert_eq!(batch.to_string(), "n=500,T=20,W=4");
    }
}
