//! Organism snapshots and the species view used to collect epoch statistics.

use super::genome::Genome;

/// Snapshot of one evaluated candidate.
///
/// This is a copy taken when an epoch closes, not a live reference into the
/// running population.
#[derive(Debug, Clone, PartialEq)]
pub struct Organism<G> {
    /// Fitness score.
    pub fitness: f64,
    /// Whether this organism solved the problem.
    pub is_winner: bool,
    /// Index of the generation the organism was created in.
    pub generation: u32,
    /// Number of offspring expected from this organism.
    pub expected_offspring: f64,
    /// Error reported by the fitness function.
    pub error: f64,
    /// Age of the organism's species when the snapshot was taken.
    pub species_age: u32,
    /// The encoded candidate.
    pub genome: G,
}

impl<G: Genome> Organism<G> {
    /// Create a snapshot with the given fitness and default metadata.
    pub fn new(genome: G, fitness: f64) -> Self {
        Self {
            fitness,
            is_winner: false,
            generation: 0,
            expected_offspring: 0.0,
            error: 0.0,
            species_age: 0,
            genome,
        }
    }

    /// Phenotype node count plus link count.
    pub fn complexity(&self) -> usize {
        self.genome.node_count() + self.genome.link_count()
    }
}

/// One species of a population snapshot.
#[derive(Debug, Clone)]
pub struct Species<G> {
    /// Generations this species has existed for.
    pub age: u32,
    /// Member organisms.
    pub organisms: Vec<Organism<G>>,
}

impl<G> Species<G> {
    pub fn new(age: u32, organisms: Vec<Organism<G>>) -> Self {
        Self { age, organisms }
    }

    /// Most fit organism; the first one wins a tie.
    pub fn representative(&self) -> Option<&Organism<G>> {
        self.organisms.iter().fold(None, |best, org| match best {
            Some(b) if b.fitness >= org.fitness => Some(b),
            _ => Some(org),
        })
    }
}
