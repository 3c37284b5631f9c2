//! Experiment to `.npz` mapping.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use rayon::prelude::*;

use super::npy::NdArray;
use super::npz::{Compression, NpzWriter};
use crate::error::ExportResult;
use crate::model::stats;
use crate::model::{Experiment, Genome, Trial};

/// Per-epoch series of one trial, in archive order.
struct TrialSeries {
    mean_fitness: Vec<f64>,
    mean_age: Vec<f64>,
    mean_complexity: Vec<f64>,
    best_fitness: Vec<f64>,
    best_age: Vec<f64>,
    best_complexity: Vec<f64>,
    diversity: Vec<f64>,
}

impl TrialSeries {
    fn of<G: Genome>(trial: &Trial<G>) -> Self {
        let (mean_fitness, mean_age, mean_complexity) = trial.average();
        Self {
            mean_fitness,
            mean_age,
            mean_complexity,
            best_fitness: trial.champions_fitness(),
            best_age: trial.champion_species_ages(),
            best_complexity: trial.champions_complexities(),
            diversity: trial.diversity(),
        }
    }

    fn named(self, index: usize) -> [(String, NdArray); 7] {
        let name = |suffix: &str| format!("trial_{}_epoch_{}", index, suffix);
        [
            (name("mean_fitnesses"), NdArray::vector(self.mean_fitness)),
            (name("mean_ages"), NdArray::vector(self.mean_age)),
            (name("mean_complexities"), NdArray::vector(self.mean_complexity)),
            (name("best_fitnesses"), NdArray::vector(self.best_fitness)),
            (name("best_ages"), NdArray::vector(self.best_age)),
            (name("best_complexities"), NdArray::vector(self.best_complexity)),
            (name("diversity"), NdArray::vector(self.diversity)),
        ]
    }
}

impl<G: Genome + Sync> Experiment<G> {
    /// Every array of the numeric archive, in the order it is written.
    ///
    /// `trials_fitness`, `trials_ages` and `trials_complexity` hold one
    /// `(mean, variance)` row per trial, taken over the trial's per-epoch
    /// average series.
    pub fn numeric_arrays(&self) -> Vec<(String, NdArray)> {
        let series: Vec<TrialSeries> = self.trials.par_iter().map(TrialSeries::of).collect();

        let summary = |pick: fn(&TrialSeries) -> &[f64]| {
            let rows: Vec<[f64; 2]> = series
                .iter()
                .map(|s| {
                    let (mean, variance) = stats::mean_variance(pick(s));
                    [mean, variance]
                })
                .collect();
            NdArray::from_rows(&rows)
        };

        let mut arrays = vec![
            (
                "trials_number".to_string(),
                NdArray::vector(vec![self.trials.len() as f64]),
            ),
            ("trials_fitness".to_string(), summary(|s| s.mean_fitness.as_slice())),
            ("trials_ages".to_string(), summary(|s| s.mean_age.as_slice())),
            ("trials_complexity".to_string(), summary(|s| s.mean_complexity.as_slice())),
        ];
        arrays.extend(
            series
                .into_iter()
                .enumerate()
                .flat_map(|(i, s)| s.named(i)),
        );
        arrays
    }

    fn build_npz(&self, compression: Compression) -> ExportResult<NpzWriter> {
        let mut writer = NpzWriter::new(compression);
        for (name, array) in self.numeric_arrays() {
            writer.add(&name, &array)?;
        }
        Ok(writer)
    }

    /// Write the numeric archive to `w`.
    ///
    /// The archive is built completely before the first byte reaches `w`.
    /// Returns the number of bytes written.
    pub fn write_npz<W: Write>(&self, w: &mut W, compression: Compression) -> ExportResult<u64> {
        let writer = self.build_npz(compression)?;
        let arrays = writer.len();
        let written = writer.finish(w)?;
        log::debug!(
            "Exported experiment {} ({}): {} arrays, {} bytes",
            self.id,
            self.name,
            arrays,
            written
        );
        Ok(written)
    }

    /// Write the numeric archive to a file.
    ///
    /// The file is only created once the archive has been built, and it is
    /// removed again if writing fails.
    pub fn save_npz<P: AsRef<Path>>(&self, path: P, compression: Compression) -> ExportResult<u64> {
        let path = path.as_ref();
        let writer = self.build_npz(compression)?;
        let out = BufWriter::new(File::create(path)?);
        finish_or_remove(writer, out, path)
    }
}

/// Flush the archive into `out`, deleting `path` on failure.
fn finish_or_remove<W: Write>(writer: NpzWriter, mut out: W, path: &Path) -> ExportResult<u64> {
    let result = writer.finish(&mut out);
    drop(out);
    if let Err(e) = &result {
        log::warn!("Removing partial archive {}: {}", path.display(), e);
        if let Err(rm) = fs::remove_file(path) {
            log::warn!("Failed to remove {}: {}", path.display(), rm);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportError;
    use crate::export::read_npz;
    use crate::model::{Generation, NetworkGenome, Organism, Species};
    use std::collections::HashMap;
    use std::io;
    use std::time::Duration;
    use tempfile::tempdir;

    fn species(age: u32, fitness: &[f64]) -> Species<NetworkGenome> {
        let organisms = fitness
            .iter()
            .enumerate()
            .map(|(i, &f)| Organism::new(NetworkGenome::fully_connected(i as u64, 2, 1), f))
            .collect();
        Species::new(age, organisms)
    }

    fn experiment(generation_counts: &[u32]) -> Experiment<NetworkGenome> {
        let mut exp = Experiment::new(1, "xor");
        for (t, &count) in generation_counts.iter().enumerate() {
            let t = t as u32;
            let generations = (0..count)
                .map(|g| {
                    let mut generation = Generation::new(g, t);
                    let base = 0.1 * (g + 1) as f64;
                    generation.fill_statistics(&[
                        species(g + 1, &[base, base / 2.0]),
                        species(1, &[base / 4.0]),
                    ]);
                    generation
                })
                .collect();
            exp.trials
                .push(Trial::from_generations(t, Duration::from_secs(1), generations));
        }
        exp
    }

    fn decode(bytes: &[u8]) -> HashMap<String, NdArray> {
        read_npz(bytes).unwrap().into_iter().collect()
    }

    #[test]
    fn test_archive_shapes() {
        let exp = experiment(&[5, 7, 2]);
        let mut buf = Vec::new();
        exp.write_npz(&mut buf, Compression::Stored).unwrap();
        let arrays = decode(&buf);

        assert_eq!(arrays.len(), 4 + 3 * 7);
        assert_eq!(arrays["trials_number"].shape, vec![1]);
        assert_eq!(arrays["trials_number"].data, vec![3.0]);
        for name in ["trials_fitness", "trials_ages", "trials_complexity"] {
            assert_eq!(arrays[name].shape, vec![3, 2], "{}", name);
        }
        for (i, len) in [5, 7, 2].into_iter().enumerate() {
            for suffix in [
                "mean_fitnesses",
                "mean_ages",
                "mean_complexities",
                "best_fitnesses",
                "best_ages",
                "best_complexities",
                "diversity",
            ] {
                let name = format!("trial_{}_epoch_{}", i, suffix);
                assert_eq!(arrays[&name].shape, vec![len], "{}", name);
            }
        }
    }

    #[test]
    fn test_archive_values() {
        let exp = experiment(&[2]);
        let arrays = decode(&{
            let mut buf = Vec::new();
            exp.write_npz(&mut buf, Compression::Deflate).unwrap();
            buf
        });

        // Representatives: (0.1, 0.025) then (0.2, 0.05).
        let means = &arrays["trial_0_epoch_mean_fitnesses"].data;
        assert!((means[0] - 0.0625).abs() < 1e-12);
        assert!((means[1] - 0.125).abs() < 1e-12);
        assert_eq!(arrays["trial_0_epoch_best_fitnesses"].data, vec![0.1, 0.2]);
        assert_eq!(arrays["trial_0_epoch_best_ages"].data, vec![1.0, 2.0]);
        assert_eq!(arrays["trial_0_epoch_diversity"].data, vec![2.0, 2.0]);

        let row = &arrays["trials_fitness"].data;
        assert!((row[0] - 0.09375).abs() < 1e-12);
        assert!(row[1] > 0.0);
    }

    #[test]
    fn test_empty_experiment() {
        let exp: Experiment<NetworkGenome> = Experiment::new(0, "empty");
        let names: Vec<String> = exp.numeric_arrays().into_iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            vec!["trials_number", "trials_fitness", "trials_ages", "trials_complexity"]
        );
        let arrays = exp.numeric_arrays();
        assert_eq!(arrays[0].1, NdArray::vector(vec![0.0]));
        assert_eq!(arrays[1].1.shape, vec![0, 2]);
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::StorageFull, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_sink_error_aborts_export() {
        let err = experiment(&[3])
            .write_npz(&mut FailingWriter, Compression::Stored)
            .unwrap_err();
        assert!(matches!(err, ExportError::Io(ref e) if e.kind() == io::ErrorKind::StorageFull));
    }

    #[test]
    fn test_failed_write_removes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.npz");
        std::fs::write(&path, b"PK").unwrap();

        let writer = experiment(&[2]).build_npz(Compression::Stored).unwrap();
        let err = finish_or_remove(writer, FailingWriter, &path).unwrap_err();
        assert!(matches!(err, ExportError::Io(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_save_npz() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("xor.npz");
        let exp = experiment(&[4, 1]);

        let written = exp.save_npz(&path, Compression::Deflate).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len() as u64, written);
        assert_eq!(decode(&bytes).len(), 4 + 2 * 7);
    }
}
