//! Human-readable and JSON summaries of an experiment.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use super::efficiency::WinnerStats;
use crate::model::stats;
use crate::model::{Experiment, Genome};

/// The most fit winner of the whole experiment.
#[derive(Debug, Clone, Serialize)]
pub struct ChampionSummary {
    /// Index of the trial it was found in.
    pub trial: usize,
    /// Statistics of that trial's first solved epoch.
    pub winner: WinnerStats,
    pub complexity: usize,
    pub species_age: u32,
    pub fitness: f64,
}

/// Averages over the solved trials.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WinnerAverages {
    pub nodes: f64,
    pub genes: f64,
    pub evals: f64,
    pub generations: f64,
    pub diversity: f64,
    pub complexity: f64,
    pub species_age: f64,
    pub fitness: f64,
}

/// Averages of the per-epoch series over all trials.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PopulationAverages {
    pub diversity: f64,
    pub complexity: f64,
    pub age: f64,
    pub fitness: f64,
}

/// Spread of a per-trial quantity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Spread {
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub std_dev: f64,
}

impl Spread {
    pub fn of(values: &[f64]) -> Self {
        Self {
            min: stats::min(values),
            max: stats::max(values),
            median: stats::median(values),
            std_dev: stats::std_dev(values),
        }
    }
}

/// Derived statistics of an experiment.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentSummary {
    pub id: u32,
    pub name: String,
    pub trials: usize,
    pub trials_solved: usize,
    pub success_rate: f64,
    pub rand_seed: i64,
    pub avg_trial_duration: Duration,
    pub avg_epoch_duration: Duration,
    pub avg_generations_per_trial: f64,
    /// Spread of the generation count over trials.
    pub generations: Spread,
    pub champion: Option<ChampionSummary>,
    /// Present only with at least two trials and one winner.
    pub winners: Option<WinnerAverages>,
    pub population: PopulationAverages,
    pub efficiency_score: f64,
}

impl<G: Genome> Experiment<G> {
    pub fn summary(&self) -> ExperimentSummary {
        let champion = self.best_organism(true).map(|(org, trial)| ChampionSummary {
            trial,
            winner: self.trials[trial].winner_statistics().unwrap_or_default(),
            complexity: org.complexity(),
            species_age: org.species_age,
            fitness: org.fitness,
        });

        ExperimentSummary {
            id: self.id,
            name: self.name.clone(),
            trials: self.trials.len(),
            trials_solved: self.trials_solved(),
            success_rate: self.success_rate(),
            rand_seed: self.rand_seed,
            avg_trial_duration: self.avg_trial_duration(),
            avg_epoch_duration: self.avg_epoch_duration(),
            avg_generations_per_trial: self.avg_generations_per_trial(),
            generations: Spread::of(&self.epochs_per_trial()),
            champion,
            winners: self.winner_averages(),
            population: self.population_averages(),
            efficiency_score: self.efficiency_score(),
        }
    }

    fn winner_averages(&self) -> Option<WinnerAverages> {
        if self.trials.len() < 2 {
            return None;
        }
        let winners = self.winner_champions();
        if winners.is_empty() {
            return None;
        }

        let mut avg = WinnerAverages::default();
        for (trial, org) in &winners {
            let stats = trial.winner_statistics().unwrap_or_default();
            avg.nodes += stats.nodes as f64;
            avg.genes += stats.genes as f64;
            avg.evals += stats.evals as f64;
            avg.diversity += stats.diversity as f64;
            avg.generations += trial.len() as f64;
            avg.complexity += org.complexity() as f64;
            avg.species_age += org.species_age as f64;
            avg.fitness += org.fitness;
        }
        let n = winners.len() as f64;
        for v in [
            &mut avg.nodes,
            &mut avg.genes,
            &mut avg.evals,
            &mut avg.generations,
            &mut avg.diversity,
            &mut avg.complexity,
            &mut avg.species_age,
            &mut avg.fitness,
        ] {
            *v /= n;
        }
        Some(avg)
    }

    fn population_averages(&self) -> PopulationAverages {
        let mut diversity = Vec::with_capacity(self.trials.len());
        let mut complexity = Vec::with_capacity(self.trials.len());
        let mut age = Vec::with_capacity(self.trials.len());
        let mut fitness = Vec::with_capacity(self.trials.len());
        for t in &self.trials {
            let (f, a, c) = t.average();
            diversity.push(stats::mean(&t.diversity()));
            complexity.push(stats::mean(&c));
            age.push(stats::mean(&a));
            fitness.push(stats::mean(&f));
        }
        PopulationAverages {
            diversity: stats::mean(&diversity),
            complexity: stats::mean(&complexity),
            age: stats::mean(&age),
            fitness: stats::mean(&fitness),
        }
    }
}

impl fmt::Display for ExperimentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Experiment {} ({})", self.id, self.name)?;
        writeln!(
            f,
            "Solved {} trials from {}, success rate: {:.6}",
            self.trials_solved, self.trials, self.success_rate
        )?;
        writeln!(f, "Random seed: {}", self.rand_seed)?;
        writeln!(f, "Average")?;
        writeln!(f, "  Trial duration:      {:?}", self.avg_trial_duration)?;
        writeln!(f, "  Epoch duration:      {:?}", self.avg_epoch_duration)?;
        writeln!(f, "  Generations/trial:   {:.1}", self.avg_generations_per_trial)?;
        let g = &self.generations;
        writeln!(
            f,
            "  Generations spread:  min {} max {} median {:.1} std {:.3}",
            g.min, g.max, g.median, g.std_dev
        )?;

        writeln!(f)?;
        match &self.champion {
            Some(c) => {
                writeln!(f, "Champion found in trial {}", c.trial)?;
                writeln!(f, "  Nodes:               {}", c.winner.nodes)?;
                writeln!(f, "  Genes:               {}", c.winner.genes)?;
                writeln!(f, "  Evaluations:         {}", c.winner.evals)?;
                writeln!(f, "  Diversity:           {}", c.winner.diversity)?;
                writeln!(f, "  Complexity:          {}", c.complexity)?;
                writeln!(f, "  Age:                 {}", c.species_age)?;
                writeln!(f, "  Fitness:             {:.6}", c.fitness)?;
            }
            None => writeln!(f, "No winner found in the experiment")?,
        }

        if let Some(w) = &self.winners {
            writeln!(f)?;
            writeln!(f, "Averages among winners")?;
            writeln!(f, "  Nodes:               {:.1}", w.nodes)?;
            writeln!(f, "  Genes:               {:.1}", w.genes)?;
            writeln!(f, "  Evaluations:         {:.1}", w.evals)?;
            writeln!(f, "  Generations/trial:   {:.1}", w.generations)?;
            writeln!(f, "  Diversity:           {:.6}", w.diversity)?;
            writeln!(f, "  Complexity:          {:.6}", w.complexity)?;
            writeln!(f, "  Age:                 {:.6}", w.species_age)?;
            writeln!(f, "  Fitness:             {:.6}", w.fitness)?;
        }

        let p = &self.population;
        writeln!(f)?;
        writeln!(f, "Averages of the species representatives")?;
        writeln!(f, "  Diversity:           {:.6}", p.diversity)?;
        writeln!(f, "  Complexity:          {:.6}", p.complexity)?;
        writeln!(f, "  Age:                 {:.6}", p.age)?;
        writeln!(f, "  Fitness:             {:.6}", p.fitness)?;

        writeln!(f)?;
        write!(f, "Efficiency score:      {:.6}", self.efficiency_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Generation, NetworkGenome, Organism, Trial};

    fn experiment() -> Experiment<NetworkGenome> {
        let mut exp = Experiment::new(7, "xor")
            .with_rand_seed(42)
            .with_max_fitness_score(16.0);
        for t in 0..3u32 {
            let mut generations = Vec::new();
            for g in 0..=t {
                let mut generation = Generation::new(g, t);
                generation.duration = Duration::from_millis(500);
                generation.diversity = 2;
                generation.fitness = vec![4.0, 2.0];
                generation.age = vec![1.0, 3.0];
                generation.complexity = vec![6.0, 8.0];
                // Trials 1 and 2 are solved in their last epoch.
                if t > 0 && g == t {
                    let mut champion = Organism::new(NetworkGenome::fully_connected(g as u64, 2, 1), 15.0 + t as f64);
                    champion.is_winner = true;
                    champion.species_age = t;
                    generation.champion = Some(champion);
                    generation.solved = true;
                    generation.winner_nodes = 4;
                    generation.winner_genes = 3 + t as u64;
                    generation.winner_evals = 100 * t as u64;
                }
                generations.push(generation);
            }
            exp.trials
                .push(Trial::from_generations(t, Duration::from_secs(2), generations));
        }
        exp
    }

    #[test]
    fn test_summary_values() {
        let summary = experiment().summary();
        assert_eq!(summary.trials, 3);
        assert_eq!(summary.trials_solved, 2);
        assert!((summary.success_rate - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(summary.avg_epoch_duration, Duration::from_millis(500));
        assert_eq!(summary.avg_generations_per_trial, 2.0);
        assert_eq!(
            summary.generations,
            Spread {
                min: 1.0,
                max: 3.0,
                median: 2.0,
                std_dev: 1.0,
            }
        );

        let champion = summary.champion.unwrap();
        assert_eq!(champion.trial, 2);
        assert_eq!(champion.fitness, 17.0);
        assert_eq!(champion.winner.evals, 200);
        assert_eq!(champion.complexity, 5);

        let winners = summary.winners.unwrap();
        assert_eq!(winners.evals, 150.0);
        assert_eq!(winners.generations, 2.5);
        assert_eq!(winners.species_age, 1.5);

        assert_eq!(summary.population.diversity, 2.0);
        assert_eq!(summary.population.fitness, 3.0);
        assert_eq!(summary.population.complexity, 7.0);
        assert!(summary.efficiency_score > 0.0);
    }

    #[test]
    fn test_summary_without_winner() {
        let mut exp = experiment();
        exp.trials.truncate(1);
        let summary = exp.summary();
        assert!(summary.champion.is_none());
        assert!(summary.winners.is_none());
        assert_eq!(summary.generations.std_dev, 0.0);
        assert_eq!(summary.generations.median, 1.0);
        assert_eq!(summary.efficiency_score, 0.0);

        let report = summary.to_string();
        assert!(report.contains("No winner found in the experiment"));
        assert!(!report.contains("Averages among winners"));
    }

    #[test]
    fn test_report_sections() {
        let report = experiment().summary().to_string();
        assert!(report.starts_with("Experiment 7 (xor)"));
        assert!(report.contains("Solved 2 trials from 3"));
        assert!(report.contains("Random seed: 42"));
        assert!(report.contains("Generations spread:  min 1 max 3 median 2.0 std 1.000"));
        assert!(report.contains("Champion found in trial 2"));
        assert!(report.contains("Averages among winners"));
        assert!(report.contains("Efficiency score:"));
    }

    #[test]
    fn test_summary_serializes() {
        let json = serde_json::to_value(experiment().summary()).unwrap();
        assert_eq!(json["trials_solved"], 2);
        assert_eq!(json["champion"]["trial"], 2);
        assert_eq!(json["winners"]["generations"], 2.5);
        assert_eq!(json["generations"]["max"], 3.0);
    }
}
