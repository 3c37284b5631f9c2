//! Result model - experiments, trials, generations and organism snapshots.
//!
//! The search loop produces one [`Generation`] per epoch and fills it from a
//! species snapshot with [`Generation::fill_statistics`]. Generations are
//! appended to a [`Trial`], and trials are collected into an [`Experiment`].
//!
//! Ownership is strictly hierarchical: an experiment owns its trials, a
//! trial owns its generations and a generation owns a copy of its champion.

mod experiment;
mod generation;
mod genome;
mod organism;
pub mod stats;
mod trial;

pub use experiment::Experiment;
pub use generation::Generation;
pub use genome::{Activation, Genome, LinkGene, NetworkGenome, NodeGene, NodeKind};
pub use organism::{Organism, Species};
pub use trial::Trial;
