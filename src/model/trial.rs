//! One independent run of the optimization process.

use std::sync::OnceLock;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::generation::Generation;
use super::genome::Genome;
use super::organism::Organism;

/// Ordered epochs of a single run.
///
/// The index of the first solved epoch is computed on first request and
/// cached; appending a generation clears the cache.
#[derive(Debug, Clone)]
pub struct Trial<G> {
    /// Trial number within the experiment.
    pub id: u32,
    /// Wall-clock duration of the whole trial.
    pub duration: Duration,
    generations: Vec<Generation<G>>,
    pub(crate) winner: OnceLock<Option<usize>>,
}

impl<G> Trial<G> {
    pub fn new(id: u32) -> Self {
        Self::from_generations(id, Duration::ZERO, Vec::new())
    }

    pub fn from_generations(id: u32, duration: Duration, generations: Vec<Generation<G>>) -> Self {
        Self {
            id,
            duration,
            generations,
            winner: OnceLock::new(),
        }
    }

    /// Append the record of a finished epoch.
    pub fn push(&mut self, generation: Generation<G>) {
        self.generations.push(generation);
        self.winner = OnceLock::new();
    }

    pub fn generations(&self) -> &[Generation<G>] {
        &self.generations
    }

    pub fn len(&self) -> usize {
        self.generations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }

    /// True if any epoch of this trial found a solution.
    pub fn solved(&self) -> bool {
        self.generations.iter().any(|g| g.solved)
    }

    /// Index of the first solved epoch, memoized.
    pub fn winner_index(&self) -> Option<usize> {
        *self
            .winner
            .get_or_init(|| self.generations.iter().position(|g| g.solved))
    }

    /// The first solved epoch, if any.
    pub fn winner_generation(&self) -> Option<&Generation<G>> {
        self.winner_index().map(|i| &self.generations[i])
    }

    /// Most fit epoch champion, optionally restricted to winners.
    ///
    /// Earlier epochs win ties. Returns `None` when no champion qualifies.
    pub fn best_organism(&self, only_solvers: bool) -> Option<&Organism<G>> {
        self.generations
            .iter()
            .filter_map(|g| g.champion.as_ref())
            .filter(|org| !only_solvers || org.is_winner)
            .fold(None, |best: Option<&Organism<G>>, org| match best {
                Some(b) if b.fitness >= org.fitness => Some(b),
                _ => Some(org),
            })
    }

    /// Execution time of the most recently evaluated epoch.
    pub fn recent_epoch_eval_time(&self) -> Option<DateTime<Utc>> {
        self.generations.iter().map(|g| g.executed).max()
    }
}

/// Per-epoch series. Epochs without a champion contribute zero to the
/// champion series.
impl<G: Genome> Trial<G> {
    /// Mean fitness, age and complexity of the species representatives,
    /// one value per epoch.
    pub fn average(&self) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let mut fitness = Vec::with_capacity(self.len());
        let mut age = Vec::with_capacity(self.len());
        let mut complexity = Vec::with_capacity(self.len());
        for g in &self.generations {
            let (f, a, c) = g.average();
            fitness.push(f);
            age.push(a);
            complexity.push(c);
        }
        (fitness, age, complexity)
    }

    pub fn champions_fitness(&self) -> Vec<f64> {
        self.champion_series(|org| org.fitness)
    }

    pub fn champion_species_ages(&self) -> Vec<f64> {
        self.champion_series(|org| org.species_age as f64)
    }

    pub fn champions_complexities(&self) -> Vec<f64> {
        self.champion_series(|org| org.complexity() as f64)
    }

    /// Number of species per epoch.
    pub fn diversity(&self) -> Vec<f64> {
        self.generations.iter().map(|g| g.diversity as f64).collect()
    }

    fn champion_series(&self, f: impl Fn(&Organism<G>) -> f64) -> Vec<f64> {
        self.generations
            .iter()
            .map(|g| g.champion.as_ref().map_or(0.0, &f))
            .collect()
    }
}

impl<G: PartialEq> PartialEq for Trial<G> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.duration == other.duration
            && self.generations == other.generations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NetworkGenome;

    fn epoch(id: u32, fitness: f64, winner: bool) -> Generation<NetworkGenome> {
        let mut g = Generation::new(id, 0);
        let mut champion = Organism::new(NetworkGenome::new(id as u64), fitness);
        champion.is_winner = winner;
        g.champion = Some(champion);
        g.solved = winner;
        g
    }

    #[test]
    fn test_winner_index_is_first_solved() {
        let trial = Trial::from_generations(
            0,
            Duration::ZERO,
            vec![epoch(0, 0.1, false), epoch(1, 0.9, true), epoch(2, 1.0, true)],
        );
        assert!(trial.solved());
        assert_eq!(trial.winner_index(), Some(1));
        // Second call hits the cache.
        assert_eq!(trial.winner_index(), Some(1));
        assert_eq!(trial.winner_generation().unwrap().id, 1);
    }

    #[test]
    fn test_push_clears_winner_cache() {
        let mut trial = Trial::new(0);
        trial.push(epoch(0, 0.1, false));
        assert_eq!(trial.winner_index(), None);

        trial.push(epoch(1, 0.8, true));
        assert_eq!(trial.winner_index(), Some(1));
    }

    #[test]
    fn test_best_organism() {
        let trial = Trial::from_generations(
            0,
            Duration::ZERO,
            vec![epoch(0, 0.95, false), epoch(1, 0.9, true), epoch(2, 0.9, true)],
        );
        assert_eq!(trial.best_organism(false).unwrap().genome.id, 0);
        assert_eq!(trial.best_organism(true).unwrap().genome.id, 1);
    }

    #[test]
    fn test_best_organism_without_winners() {
        let trial = Trial::from_generations(0, Duration::ZERO, vec![epoch(0, 0.95, false)]);
        assert!(trial.best_organism(true).is_none());
        assert!(Trial::<NetworkGenome>::new(1).best_organism(false).is_none());
    }

    #[test]
    fn test_epoch_series() {
        let mut first = epoch(0, 0.4, false);
        first.diversity = 2;
        first.fitness = vec![0.4, 0.2];
        first.age = vec![1.0, 3.0];
        first.complexity = vec![4.0, 6.0];
        first.champion.as_mut().unwrap().species_age = 1;
        let mut second = Generation::new(1, 0);
        second.diversity = 1;
        second.fitness = vec![0.6];
        second.age = vec![2.0];
        second.complexity = vec![9.0];

        let trial = Trial::from_generations(0, Duration::ZERO, vec![first, second]);
        let (fitness, age, complexity) = trial.average();
        assert!((fitness[0] - 0.3).abs() < 1e-12);
        assert_eq!(fitness[1], 0.6);
        assert_eq!(age, vec![2.0, 2.0]);
        assert_eq!(complexity, vec![5.0, 9.0]);

        // The second epoch has no champion.
        assert_eq!(trial.champions_fitness(), vec![0.4, 0.0]);
        assert_eq!(trial.champion_species_ages(), vec![1.0, 0.0]);
        assert_eq!(trial.champions_complexities(), vec![0.0, 0.0]);
        assert_eq!(trial.diversity(), vec![2.0, 1.0]);
    }

    #[test]
    fn test_equality_ignores_cache() {
        let a = Trial::from_generations(3, Duration::from_secs(1), vec![epoch(0, 0.5, true)]);
        let b = a.clone();
        a.winner_index();
        assert_eq!(a, b);
    }
}
