//! Simulation data types.

use serde::{Deserialize, Serialize};

/// Record of a trial at a single step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Current simulation step.
    pub step: usize,

    /// Total number of viruses after the step.
    pub total: usize,

    /// Number of viruses resistant to all the treatment drugs (treated trials only).
    pub resistant: Option<usize>,
}

/// Time series of a single trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    /// Index of the trial within its run.
    pub trial: usize,

    /// Records of every step, in order.
    pub records: Vec<Record>,
}
