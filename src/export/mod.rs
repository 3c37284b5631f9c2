//! Numeric export of experiment statistics as a NumPy `.npz` archive.
//!
//! Every array is `<f8` in C order. For an experiment with `T` trials the
//! archive holds `trials_number` (a one-element vector), the `T x 2` summaries
//! `trials_fitness`, `trials_ages` and `trials_complexity`, and seven
//! per-epoch series for each trial `i`, named `trial_{i}_epoch_*`.

mod archive;
mod npy;
mod npz;

pub use npy::NdArray;
pub use npz::{Compression, NpzWriter, read_npz};
