//! Binary result stream for experiments.
//!
//! The stream is strictly positional: there are no field tags, no magic
//! number and no version header. A decoder must read fields in exactly the
//! order they were written, so every record type declares its field order in
//! [`Record::SCHEMA`] and the encoders are checked against it in tests.
//!
//! # Layout
//!
//! All integers and floats are little-endian. Variable-length values carry a
//! `u64` length or count prefix.
//!
//! ```text
//! Experiment:
//!   id: u32, name: str, rand_seed: i64, max_fitness_score: f64,
//!   trials: u64 count + Trial*
//! Trial:
//!   id: u32, duration: u64 ns, generations: u64 count + Generation*
//! Generation:
//!   id: u32, executed: i64 s + u32 ns, solved: u8,
//!   fitness: f64[], age: f64[], complexity: f64[], diversity: u64,
//!   winner_evals: u64, winner_nodes: u64, winner_genes: u64,
//!   duration: u64 ns, trial_id: u32,
//!   champion: u8 presence (0|1) + Organism if 1
//! Organism:
//!   fitness: f64, is_winner: u8, generation: u32,
//!   expected_offspring: f64, error: f64, species_age: u32,
//!   genome_id: u64, genome: u64 length + plain-text genome bytes
//! ```
//!
//! Decoding is all or nothing. A failure anywhere aborts the enclosing
//! records and the error carries the path of field names down to the
//! failure; a partially decoded experiment is never returned.

mod records;
mod wire;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

pub use wire::{Decoder, Encoder, FieldSpec, Record, Wire, WireKind};

use crate::error::CodecResult;
use crate::model::{Experiment, Genome};

impl<G: Genome> Experiment<G> {
    /// Encode the experiment into `w`.
    pub fn write_to<W: Write>(&self, w: W) -> CodecResult<()> {
        let mut enc = Encoder::new(w);
        self.encode(&mut enc)?;
        enc.flush()?;
        log::debug!(
            "Encoded experiment {} ({}) with {} trials",
            self.id,
            self.name,
            self.trials.len()
        );
        Ok(())
    }

    /// Decode an experiment from `r`.
    pub fn read_from<R: Read>(r: R) -> CodecResult<Self> {
        let mut dec = Decoder::new(r);
        let experiment = Self::decode(&mut dec).map_err(|e| e.in_field(Self::NAME))?;
        log::debug!(
            "Decoded experiment {} ({}) with {} trials",
            experiment.id,
            experiment.name,
            experiment.trials.len()
        );
        Ok(experiment)
    }

    /// Write the experiment to a file, replacing any existing one.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> CodecResult<()> {
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))
    }

    /// Read an experiment from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> CodecResult<Self> {
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file))
    }
}
