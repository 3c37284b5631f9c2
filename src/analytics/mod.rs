//! Derived metrics for comparing experiments.
//!
//! Everything here is computed on demand from the result model; nothing is
//! cached except the winner index kept by [`crate::model::Trial`]. Empty
//! inputs yield zeros, and absent winners yield `None`.

mod efficiency;
mod summary;

pub use efficiency::{AvgWinnerStats, WinnerStats};
pub use summary::{ChampionSummary, ExperimentSummary, PopulationAverages, Spread, WinnerAverages};
