//! Per-epoch result record.

use std::cmp::Ordering;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::genome::Genome;
use super::organism::{Organism, Species};
use super::stats;

/// Execution results of one generation (epoch) of a trial.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation<G> {
    /// Generation number within the trial.
    pub id: u32,
    /// When the epoch was evaluated.
    pub executed: DateTime<Utc>,
    /// Time between epoch start and finish.
    pub duration: Duration,
    /// Best organism of the epoch (the solver if `solved` is set).
    pub champion: Option<Organism<G>>,
    /// Whether the problem was solved in this epoch.
    pub solved: bool,
    /// Fitness of the best organism of each species.
    pub fitness: Vec<f64>,
    /// Age of each species.
    pub age: Vec<f64>,
    /// Complexity of the best organism of each species.
    pub complexity: Vec<f64>,
    /// Number of species at the end of the epoch.
    pub diversity: usize,
    /// Evaluations done before the winner was found.
    pub winner_evals: u64,
    /// Nodes in the winner's phenotype, zero if not solved.
    pub winner_nodes: u64,
    /// Links in the winner's phenotype, zero if not solved.
    pub winner_genes: u64,
    /// Trial this generation was evaluated in.
    pub trial_id: u32,
}

impl<G> Generation<G> {
    /// Create an empty record for epoch `id` of trial `trial_id`.
    pub fn new(id: u32, trial_id: u32) -> Self {
        Self {
            id,
            executed: DateTime::default(),
            duration: Duration::ZERO,
            champion: None,
            solved: false,
            fitness: Vec::new(),
            age: Vec::new(),
            complexity: Vec::new(),
            diversity: 0,
            winner_evals: 0,
            winner_nodes: 0,
            winner_genes: 0,
            trial_id,
        }
    }

    /// Mean fitness, age and complexity over the species representatives.
    ///
    /// Returns `(0, 0, 0)` for an epoch without species.
    pub fn average(&self) -> (f64, f64, f64) {
        if self.diversity == 0 {
            return (0.0, 0.0, 0.0);
        }
        (
            stats::mean(&self.fitness),
            stats::mean(&self.age),
            stats::mean(&self.complexity),
        )
    }

    /// True if the per-species vectors agree with `diversity`.
    pub fn is_consistent(&self) -> bool {
        self.fitness.len() == self.diversity
            && self.age.len() == self.diversity
            && self.complexity.len() == self.diversity
    }

    /// Order by execution time, then by id.
    pub fn cmp_executed(&self, other: &Self) -> Ordering {
        self.executed
            .cmp(&other.executed)
            .then(self.id.cmp(&other.id))
    }
}

impl<G: Genome> Generation<G> {
    /// Collect per-species statistics from a population snapshot.
    ///
    /// Each species is represented by its most fit organism. Unless the epoch
    /// is already marked solved, the representative with the highest fitness
    /// becomes the champion; earlier species win ties.
    pub fn fill_statistics(&mut self, species: &[Species<G>]) {
        self.diversity = species.len();
        self.fitness = Vec::with_capacity(species.len());
        self.age = Vec::with_capacity(species.len());
        self.complexity = Vec::with_capacity(species.len());

        let mut best: Option<(f64, &Organism<G>, u32)> = None;
        for s in species {
            self.age.push(s.age as f64);
            let Some(rep) = s.representative() else {
                self.fitness.push(0.0);
                self.complexity.push(0.0);
                continue;
            };
            self.fitness.push(rep.fitness);
            self.complexity.push(rep.complexity() as f64);

            if !self.solved && best.is_none_or(|(f, _, _)| rep.fitness > f) {
                best = Some((rep.fitness, rep, s.age));
            }
        }

        if let Some((_, org, age)) = best {
            let mut champion = org.clone();
            champion.species_age = age;
            self.champion = Some(champion);
        }
    }

    /// Complexity of the champion, if there is one.
    pub fn champion_complexity(&self) -> Option<usize> {
        self.champion.as_ref().map(Organism::complexity)
    }
}
