//! Timing, success and efficiency metrics over trials and experiments.

use std::time::Duration;

use serde::Serialize;

use crate::model::stats;
use crate::model::{Experiment, Genome, Organism, Trial};

/// Statistics of the first solved epoch of a trial.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WinnerStats {
    pub nodes: u64,
    pub genes: u64,
    pub evals: u64,
    pub diversity: usize,
}

/// [`WinnerStats`] averaged over the solved trials of an experiment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AvgWinnerStats {
    pub nodes: f64,
    pub genes: f64,
    pub evals: f64,
    pub diversity: f64,
}

/// Mean of durations with truncating integer-nanosecond division.
fn mean_duration(durations: impl ExactSizeIterator<Item = Duration>) -> Duration {
    let n = durations.len() as u128;
    if n == 0 {
        return Duration::ZERO;
    }
    let total: u128 = durations.map(|d| d.as_nanos()).sum();
    Duration::from_nanos(u64::try_from(total / n).unwrap_or(u64::MAX))
}

impl<G> Trial<G> {
    /// Mean evaluation time of an epoch, zero for a trial without epochs.
    pub fn avg_epoch_duration(&self) -> Duration {
        mean_duration(self.generations().iter().map(|g| g.duration))
    }

    /// Node, gene, evaluation and species counts of the first solved epoch.
    pub fn winner_statistics(&self) -> Option<WinnerStats> {
        self.winner_generation().map(|g| WinnerStats {
            nodes: g.winner_nodes,
            genes: g.winner_genes,
            evals: g.winner_evals,
            diversity: g.diversity,
        })
    }
}

impl<G> Experiment<G> {
    /// Zero when there are no trials.
    pub fn avg_trial_duration(&self) -> Duration {
        mean_duration(self.trials.iter().map(|t| t.duration))
    }

    /// Mean of the per-trial mean epoch durations.
    pub fn avg_epoch_duration(&self) -> Duration {
        mean_duration(self.trials.iter().map(Trial::avg_epoch_duration))
    }

    pub fn avg_generations_per_trial(&self) -> f64 {
        stats::mean(&self.epochs_per_trial())
    }

    /// Number of epochs of each trial.
    pub fn epochs_per_trial(&self) -> Vec<f64> {
        self.trials.iter().map(|t| t.len() as f64).collect()
    }

    pub fn trials_solved(&self) -> usize {
        self.trials.iter().filter(|t| t.solved()).count()
    }

    /// Fraction of solved trials, zero when there are no trials.
    pub fn success_rate(&self) -> f64 {
        if self.trials.is_empty() {
            return 0.0;
        }
        self.trials_solved() as f64 / self.trials.len() as f64
    }

    /// Winner statistics averaged over solved trials; `None` if none solved.
    pub fn avg_winner_statistics(&self) -> Option<AvgWinnerStats> {
        let winners: Vec<WinnerStats> = self
            .trials
            .iter()
            .filter_map(Trial::winner_statistics)
            .collect();
        if winners.is_empty() {
            return None;
        }
        let n = winners.len() as f64;
        let sum = |f: fn(&WinnerStats) -> f64| winners.iter().map(f).sum::<f64>() / n;
        Some(AvgWinnerStats {
            nodes: sum(|w| w.nodes as f64),
            genes: sum(|w| w.genes as f64),
            evals: sum(|w| w.evals as f64),
            diversity: sum(|w| w.diversity as f64),
        })
    }

    /// Solved trials paired with the champion of their first solved epoch.
    ///
    /// A solved epoch without a champion is skipped with a warning.
    pub(crate) fn winner_champions(&self) -> Vec<(&Trial<G>, &Organism<G>)> {
        self.trials
            .iter()
            .filter_map(|t| {
                let g = t.winner_generation()?;
                match &g.champion {
                    Some(champion) => Some((t, champion)),
                    None => {
                        log::warn!(
                            "Trial {} solved in epoch {} without a champion, skipped",
                            t.id,
                            g.id
                        );
                        None
                    }
                }
            })
            .collect()
    }
}

impl<G: Genome> Experiment<G> {
    /// Comparative score of the solver: higher success rate and fitness
    /// raise it, longer epochs, more generations and more complex winners
    /// lower it.
    ///
    /// Only comparable between experiments on the same problem. Zero with
    /// fewer than two trials.
    pub fn efficiency_score(&self) -> f64 {
        if self.trials.len() < 2 {
            return 0.0;
        }
        let winners = self.winner_champions();
        let complexity: Vec<f64> = winners
            .iter()
            .map(|(_, org)| org.complexity() as f64)
            .collect();
        let fitness: Vec<f64> = winners.iter().map(|(_, org)| org.fitness).collect();
        let mean_complexity = stats::mean(&complexity);
        let mut fitness_score = stats::mean(&fitness);
        if self.max_fitness_score > 0.0 {
            fitness_score = (fitness_score / self.max_fitness_score) * 100.0;
        }

        let penalty = self.avg_epoch_duration().as_secs_f64()
            * 1000.0
            * self.avg_generations_per_trial()
            * mean_complexity;
        if penalty <= 0.0 {
            return 0.0;
        }
        let log_penalty = penalty.ln();
        if log_penalty == 0.0 {
            return 0.0;
        }
        self.success_rate() * fitness_score / log_penalty
    }

    /// Fitness of each trial's best organism, zero for trials without one.
    pub fn best_fitness(&self) -> Vec<f64> {
        self.best_series(|org| org.fitness)
    }

    /// Species age of each trial's best organism.
    pub fn best_species_age(&self) -> Vec<f64> {
        self.best_series(|org| org.species_age as f64)
    }

    /// Complexity of each trial's best organism.
    pub fn best_complexity(&self) -> Vec<f64> {
        self.best_series(|org| org.complexity() as f64)
    }

    /// Mean number of species per epoch, for each trial.
    pub fn avg_diversity(&self) -> Vec<f64> {
        self.trials
            .iter()
            .map(|t| stats::mean(&t.diversity()))
            .collect()
    }

    fn best_series(&self, f: impl Fn(&Organism<G>) -> f64) -> Vec<f64> {
        self.trials
            .iter()
            .map(|t| t.best_organism(false).map_or(0.0, &f))
            .collect()
    }
}
