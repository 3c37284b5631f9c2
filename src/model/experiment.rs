//! A named collection of trials analyzed together.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use super::organism::Organism;
use super::trial::Trial;

/// All trials of one experiment run.
#[derive(Debug, Clone, PartialEq)]
pub struct Experiment<G> {
    pub id: u32,
    pub name: String,
    /// Seed the collaborators' random source was created from.
    pub rand_seed: i64,
    /// Upper bound of the fitness function, used to normalize the
    /// efficiency score. Zero disables normalization.
    pub max_fitness_score: f64,
    pub trials: Vec<Trial<G>>,
}

impl<G> Experiment<G> {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            rand_seed: 0,
            max_fitness_score: 0.0,
            trials: Vec::new(),
        }
    }

    pub fn with_max_fitness_score(mut self, score: f64) -> Self {
        self.max_fitness_score = score;
        self
    }

    pub fn with_rand_seed(mut self, seed: i64) -> Self {
        self.rand_seed = seed;
        self
    }

    /// True if at least one trial found a solution.
    pub fn solved(&self) -> bool {
        self.trials.iter().any(Trial::solved)
    }

    /// Most fit organism over all trials, with the index of its trial.
    ///
    /// With `only_solvers` only winner-flagged organisms are considered.
    /// Earlier trials win ties.
    pub fn best_organism(&self, only_solvers: bool) -> Option<(&Organism<G>, usize)> {
        self.trials
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.best_organism(only_solvers).map(|org| (org, i)))
            .fold(None, |best, (org, i)| match best {
                Some((b, _)) if b.fitness >= org.fitness => best,
                _ => Some((org, i)),
            })
    }

    /// Evaluation time of the most recent epoch across all trials.
    pub fn most_recent_trial_eval_time(&self) -> Option<DateTime<Utc>> {
        self.trials
            .iter()
            .filter_map(Trial::recent_epoch_eval_time)
            .max()
    }

    /// Order experiments by most recent evaluation, then by id.
    pub fn cmp_recent(&self, other: &Self) -> Ordering {
        self.most_recent_trial_eval_time()
            .cmp(&other.most_recent_trial_eval_time())
            .then(self.id.cmp(&other.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Generation, NetworkGenome};
    use std::time::Duration;

    fn trial(id: u32, champions: &[(f64, bool)], executed: i64) -> Trial<NetworkGenome> {
        let generations = champions
            .iter()
            .enumerate()
            .map(|(i, &(fitness, winner))| {
                let mut g = Generation::new(i as u32, id);
                let mut org = Organism::new(NetworkGenome::new(id as u64 * 100 + i as u64), fitness);
                org.is_winner = winner;
                g.champion = Some(org);
                g.solved = winner;
                g.executed = DateTime::from_timestamp(executed + i as i64, 0).unwrap();
                g
            })
            .collect();
        Trial::from_generations(id, Duration::ZERO, generations)
    }

    #[test]
    fn test_best_organism_across_trials() {
        let mut exp = Experiment::new(0, "xor");
        exp.trials.push(trial(0, &[(0.5, false), (0.8, true)], 0));
        exp.trials.push(trial(1, &[(0.99, false)], 0));

        let (org, idx) = exp.best_organism(false).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(org.fitness, 0.99);

        let (org, idx) = exp.best_organism(true).unwrap();
        assert_eq!(idx, 0);
        assert_eq!(org.fitness, 0.8);
    }

    #[test]
    fn test_best_solver_not_found() {
        let mut exp = Experiment::new(0, "xor");
        exp.trials.push(trial(0, &[(0.5, false)], 0));
        exp.trials.push(trial(1, &[(0.99, false)], 0));
        assert!(exp.best_organism(true).is_none());
        assert!(exp.best_organism(false).is_some());
        assert!(!exp.solved());
    }

    #[test]
    fn test_most_recent_eval_time() {
        let mut exp = Experiment::new(0, "xor");
        assert!(exp.most_recent_trial_eval_time().is_none());
        exp.trials.push(trial(0, &[(0.5, false), (0.6, false)], 100));
        exp.trials.push(trial(1, &[(0.5, false)], 50));
        assert_eq!(
            exp.most_recent_trial_eval_time(),
            DateTime::from_timestamp(101, 0)
        );
    }

    #[test]
    fn test_cmp_recent() {
        let mut a = Experiment::new(2, "a");
        a.trials.push(trial(0, &[(0.5, false)], 10));
        let mut b = Experiment::new(1, "b");
        b.trials.push(trial(0, &[(0.5, false)], 10));
        assert_eq!(a.cmp_recent(&b), Ordering::Greater);

        b.trials.push(trial(1, &[(0.5, false)], 20));
        assert_eq!(a.cmp_recent(&b), Ordering::Less);
    }
}
