//! Record schemas and positional encodings of the result model.

use std::io::{Cursor, Read, Write};

use super::wire::{Decoder, Encoder, FieldSpec, Record, WireKind};
use crate::error::{CodecError, CodecResult};
use crate::model::{Experiment, Generation, Genome, Organism, Trial};

const ORGANISM_SCHEMA: &[FieldSpec] = &[
    FieldSpec::new("fitness", WireKind::F64),
    FieldSpec::new("is_winner", WireKind::Bool),
    FieldSpec::new("generation", WireKind::U32),
    FieldSpec::new("expected_offspring", WireKind::F64),
    FieldSpec::new("error", WireKind::F64),
    FieldSpec::new("species_age", WireKind::U32),
    FieldSpec::new("genome_id", WireKind::U64),
    FieldSpec::new("genome", WireKind::Bytes),
];

const GENERATION_SCHEMA: &[FieldSpec] = &[
    FieldSpec::new("id", WireKind::U32),
    FieldSpec::new("executed", WireKind::Timestamp),
    FieldSpec::new("solved", WireKind::Bool),
    FieldSpec::new("fitness", WireKind::F64Vec),
    FieldSpec::new("age", WireKind::F64Vec),
    FieldSpec::new("complexity", WireKind::F64Vec),
    FieldSpec::new("diversity", WireKind::U64),
    FieldSpec::new("winner_evals", WireKind::U64),
    FieldSpec::new("winner_nodes", WireKind::U64),
    FieldSpec::new("winner_genes", WireKind::U64),
    FieldSpec::new("duration", WireKind::Duration),
    FieldSpec::new("trial_id", WireKind::U32),
    FieldSpec::new("champion", WireKind::Optional("organism")),
];

const TRIAL_SCHEMA: &[FieldSpec] = &[
    FieldSpec::new("id", WireKind::U32),
    FieldSpec::new("duration", WireKind::Duration),
    FieldSpec::new("generations", WireKind::Sequence("generation")),
];

const EXPERIMENT_SCHEMA: &[FieldSpec] = &[
    FieldSpec::new("id", WireKind::U32),
    FieldSpec::new("name", WireKind::Str),
    FieldSpec::new("rand_seed", WireKind::I64),
    FieldSpec::new("max_fitness_score", WireKind::F64),
    FieldSpec::new("trials", WireKind::Sequence("trial")),
];

impl<G: Genome> Record for Organism<G> {
    const NAME: &'static str = "organism";
    const SCHEMA: &'static [FieldSpec] = ORGANISM_SCHEMA;

    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> CodecResult<()> {
        enc.field("fitness", &self.fitness)?;
        enc.field("is_winner", &self.is_winner)?;
        enc.field("generation", &self.generation)?;
        enc.field("expected_offspring", &self.expected_offspring)?;
        enc.field("error", &self.error)?;
        enc.field("species_age", &self.species_age)?;

        // The genome is stored as its own plain-text form, verbatim.
        let mut text = Vec::new();
        self.genome.write_plain(&mut text)?;
        enc.field("genome_id", &self.genome.id())?;
        enc.field("genome", &text)
    }

    fn decode<R: Read>(dec: &mut Decoder<R>) -> CodecResult<Self> {
        let fitness = dec.field("fitness")?;
        let is_winner = dec.field("is_winner")?;
        let generation = dec.field("generation")?;
        let expected_offspring = dec.field("expected_offspring")?;
        let error = dec.field("error")?;
        let species_age = dec.field("species_age")?;
        let genome_id: u64 = dec.field("genome_id")?;
        let text: Vec<u8> = dec.field("genome")?;

        let genome = G::read_plain(Cursor::new(text), genome_id)
            .map_err(|e| CodecError::from(e).in_field("genome"))?;
        if genome.id() != genome_id {
            return Err(CodecError::GenomeIdMismatch {
                stored: genome_id,
                parsed: genome.id(),
            }
            .in_field("genome"));
        }

        Ok(Organism {
            fitness,
            is_winner,
            generation,
            expected_offspring,
            error,
            species_age,
            genome,
        })
    }
}

/// Rejects a generation whose per-species vectors disagree with `diversity`.
fn check_consistent<G: Genome>(generation: &Generation<G>) -> CodecResult<()> {
    if generation.is_consistent() {
        return Ok(());
    }
    Err(CodecError::Invariant(format!(
        "diversity {} with {} fitness, {} age and {} complexity values",
        generation.diversity,
        generation.fitness.len(),
        generation.age.len(),
        generation.complexity.len()
    ))
    .in_field("diversity"))
}

impl<G: Genome> Record for Generation<G> {
    const NAME: &'static str = "generation";
    const SCHEMA: &'static [FieldSpec] = GENERATION_SCHEMA;

    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> CodecResult<()> {
        check_consistent(self)?;
        enc.field("id", &self.id)?;
        enc.field("executed", &self.executed)?;
        enc.field("solved", &self.solved)?;
        enc.field("fitness", &self.fitness)?;
        enc.field("age", &self.age)?;
        enc.field("complexity", &self.complexity)?;
        enc.field("diversity", &(self.diversity as u64))?;
        enc.field("winner_evals", &self.winner_evals)?;
        enc.field("winner_nodes", &self.winner_nodes)?;
        enc.field("winner_genes", &self.winner_genes)?;
        enc.field("duration", &self.duration)?;
        enc.field("trial_id", &self.trial_id)?;
        enc.optional("champion", self.champion.as_ref())
    }

    fn decode<R: Read>(dec: &mut Decoder<R>) -> CodecResult<Self> {
        let id = dec.field("id")?;
        let executed = dec.field("executed")?;
        let solved = dec.field("solved")?;
        let fitness = dec.field("fitness")?;
        let age = dec.field("age")?;
        let complexity = dec.field("complexity")?;
        let diversity: u64 = dec.field("diversity")?;
        let winner_evals = dec.field("winner_evals")?;
        let winner_nodes = dec.field("winner_nodes")?;
        let winner_genes = dec.field("winner_genes")?;
        let duration = dec.field("duration")?;
        let trial_id = dec.field("trial_id")?;
        let champion = dec.optional("champion")?;

        let generation = Generation {
            id,
            executed,
            duration,
            champion,
            solved,
            fitness,
            age,
            complexity,
            diversity: usize::try_from(diversity)
                .map_err(|_| CodecError::LengthOverflow(diversity).in_field("diversity"))?,
            winner_evals,
            winner_nodes,
            winner_genes,
            trial_id,
        };
        check_consistent(&generation)?;
        Ok(generation)
    }
}

impl<G: Genome> Record for Trial<G> {
    const NAME: &'static str = "trial";
    const SCHEMA: &'static [FieldSpec] = TRIAL_SCHEMA;

    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> CodecResult<()> {
        enc.field("id", &self.id)?;
        enc.field("duration", &self.duration)?;
        enc.sequence("generations", self.generations())
    }

    fn decode<R: Read>(dec: &mut Decoder<R>) -> CodecResult<Self> {
        let id = dec.field("id")?;
        let duration = dec.field("duration")?;
        let generations = dec.sequence("generations")?;
        Ok(Trial::from_generations(id, duration, generations))
    }
}

impl<G: Genome> Record for Experiment<G> {
    const NAME: &'static str = "experiment";
    const SCHEMA: &'static [FieldSpec] = EXPERIMENT_SCHEMA;

    fn encode<W: Write>(&self, enc: &mut Encoder<W>) -> CodecResult<()> {
        enc.field("id", &self.id)?;
        enc.field("name", &self.name)?;
        enc.field("rand_seed", &self.rand_seed)?;
        enc.field("max_fitness_score", &self.max_fitness_score)?;
        enc.sequence("trials", &self.trials)
    }

    fn decode<R: Read>(dec: &mut Decoder<R>) -> CodecResult<Self> {
        Ok(Experiment {
            id: dec.field("id")?,
            name: dec.field("name")?,
            rand_seed: dec.field("rand_seed")?,
            max_fitness_score: dec.field("max_fitness_score")?,
            trials: dec.sequence("trials")?,
        })
    }
}
