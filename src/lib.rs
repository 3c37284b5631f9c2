//! NEAT results - recording, persistence and analysis of neuro-evolution runs.
//!
//! An experiment repeats a stochastic search several times. Each repetition
//! is a trial, and each trial is a sequence of epochs (generations). This
//! crate records what the search produced per epoch, persists it in a
//! compact positional binary stream, exports the numeric series as a NumPy
//! `.npz` archive, and derives comparative metrics such as the success rate
//! and the efficiency score. It never runs the search itself.
//!
//! # Architecture
//!
//! - `model`: Experiments, trials, generations and organism snapshots
//! - `codec`: Binary result stream (`Experiment::write_to` / `read_from`)
//! - `export`: NumPy `.npz` archive of per-trial statistics
//! - `analytics`: Durations, success rate, efficiency score and summaries
//! - `schema`: Report configuration for the command-line front end
//!
//! # Example
//!
//! ```rust,no_run
//! use neat_results::{Compression, Experiment, Generation, NetworkGenome, Species, Trial};
//! use neat_results::model::Organism;
//!
//! let mut experiment = Experiment::new(1, "xor").with_max_fitness_score(16.0);
//! let mut trial = Trial::new(0);
//!
//! // Record one epoch from a population snapshot.
//! let genome = NetworkGenome::fully_connected(1, 2, 1);
//! let species = vec![Species::new(1, vec![Organism::new(genome, 3.5)])];
//! let mut epoch = Generation::new(0, trial.id);
//! epoch.fill_statistics(&species);
//! trial.push(epoch);
//! experiment.trials.push(trial);
//!
//! experiment.save("xor.dat").unwrap();
//! experiment.save_npz("xor.npz", Compression::Deflate).unwrap();
//! println!("{}", experiment.summary());
//! ```

pub mod analytics;
pub mod codec;
pub mod error;
pub mod export;
pub mod model;
pub mod schema;

// Re-export commonly used types
pub use analytics::{ExperimentSummary, WinnerStats};
pub use error::{CodecError, ConfigError, ExportError};
pub use export::{Compression, NdArray};
pub use model::{Experiment, Generation, Genome, NetworkGenome, Species, Trial};
pub use schema::ReportConfig;
