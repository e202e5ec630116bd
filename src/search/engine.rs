//! Evolutionary search engine over mix-design genomes.

use std::cmp::Ordering;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;

use crate::schema::{
    BestMix, ConfigError, GaConfig, GenerationStats, SearchConfig, SearchOutcome,
};

use super::constraints::ConstraintChecker;
use super::fitness::FitnessEvaluator;
use super::surrogate::{Surrogate, SurrogateError};

/// Errors that abort a search run.
///
/// Feasibility violations are never errors; they are ordinary fitness
/// outcomes. Only bad configuration (caught before the loop starts) and
/// surrogate failures (which leave a candidate unscorable) surface here.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("surrogate failure at generation {generation}: {source}")]
    Surrogate {
        generation: usize,
        #[source]
        source: SurrogateError,
    },
}

/// A candidate mix design in the population.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Evolved gene values, in declared parameter order.
    pub genes: Vec<f64>,
    /// Fitness, present once evaluated; cleared by crossover and mutation.
    pub fitness: Option<f64>,
    /// Surrogate prediction from the last evaluation.
    pub predicted: Option<f64>,
}

impl Candidate {
    fn fresh(genes: Vec<f64>) -> Self {
        Self {
            genes,
            fitness: None,
            predicted: None,
        }
    }

    fn invalidate(&mut self) {
        self.fitness = None;
        self.predicted = None;
    }
}

/// Generational genetic algorithm: tournament selection, two-point
/// crossover, per-gene Gaussian mutation.
///
/// Mutated genes are not clipped back into their bounds unless
/// `clamp_to_bounds` is set; out-of-range offspring are rejected by the
/// constraint gate at their next evaluation instead.
pub struct SearchEngine<S: Surrogate> {
    config: SearchConfig,
    evaluator: FitnessEvaluator<S>,
    gene_bounds: Vec<(f64, f64)>,
    rng: StdRng,
    noise: Normal<f64>,
    population: Vec<Candidate>,
    history: Vec<GenerationStats>,
}

impl<S: Surrogate> SearchEngine<S> {
    /// Validate the configuration, compile the constraint rules, and seed
    /// the generator. All configuration errors surface here, before any
    /// generation runs.
    pub fn new(config: SearchConfig, surrogate: S) -> Result<Self, SearchError> {
        config.validate()?;
        let checker = ConstraintChecker::compile(&config.space, &config.rules)?;
        let noise = Normal::new(config.ga.mutation_mu, config.ga.mutation_sigma).map_err(|_| {
            ConfigError::InvalidMutationSigma {
                sigma: config.ga.mutation_sigma,
            }
        })?;

        let seed = config.random_seed.unwrap_or_else(rand::random);
        debug!("search rng seed: {seed}");

        let evaluator = FitnessEvaluator::new(
            config.space.clone(),
            checker,
            surrogate,
            config.target,
            config.direction,
        );
        let gene_bounds = config.space.evolved_bounds();

        Ok(Self {
            evaluator,
            gene_bounds,
            rng: StdRng::seed_from_u64(seed),
            noise,
            population: Vec::new(),
            history: Vec::new(),
            config,
        })
    }

    /// Run the configured number of generations and return the best
    /// individual of the final population together with the convergence
    /// history.
    pub fn run(&mut self) -> Result<SearchOutcome, SearchError> {
        info!(
            "starting search: population={}, generations={}, target={}",
            self.config.ga.population_size, self.config.ga.generations, self.config.target
        );

        self.history.clear();
        self.initialize();

        let generations = self.config.ga.generations;
        for generation in 0..generations {
            self.evaluate_population(generation)?;
            self.record_stats(generation);
            if generation + 1 < generations {
                self.next_generation();
            }
        }

        let best = self.best_mix();
        info!("search complete: best fitness {:.4}", best.fitness);
        Ok(SearchOutcome {
            best,
            history: self.history.clone(),
        })
    }

    /// Sample the initial population uniformly within bounds. Fixed
    /// parameters are constants, not genes, so they are never sampled.
    fn initialize(&mut self) {
        self.population = (0..self.config.ga.population_size)
            .map(|_| Candidate::fresh(self.config.space.sample(&mut self.rng)))
            .collect();
    }

    /// Score every candidate currently lacking a fitness value.
    ///
    /// Evaluations within a generation are independent, so they run in
    /// parallel; no RNG is involved, so the result is order-independent
    /// and the run stays deterministic for a fixed seed.
    fn evaluate_population(&mut self, generation: usize) -> Result<(), SearchError> {
        let evaluator = &self.evaluator;
        self.population
            .par_iter_mut()
            .filter(|c| c.fitness.is_none())
            .try_for_each(|candidate| {
                let score = evaluator.evaluate(&candidate.genes)?;
                candidate.fitness = Some(score.fitness);
                candidate.predicted = score.predicted;
                Ok(())
            })
            .map_err(|source| SearchError::Surrogate { generation, source })
    }

    /// Append min/avg fitness for the fully evaluated population.
    fn record_stats(&mut self, generation: usize) {
        let sentinel = self.evaluator.infeasible_score();
        let mut min = f64::INFINITY;
        let mut sum = 0.0;
        for candidate in &self.population {
            let fitness = candidate.fitness.unwrap_or(sentinel);
            min = min.min(fitness);
            sum += fitness;
        }
        let avg = sum / self.population.len() as f64;

        debug!("generation {generation}: min={min:.4} avg={avg:.4}");
        self.history.push(GenerationStats {
            generation,
            min_fitness: min,
            avg_fitness: avg,
        });
    }

    /// Breed the next generation: elites (if any), then tournament-selected
    /// parents recombined pairwise and mutated per gene.
    fn next_generation(&mut self) {
        let ga = self.config.ga.clone();
        let size = ga.population_size;
        let mut next: Vec<Candidate> = Vec::with_capacity(size);

        if ga.elitism > 0 {
            let mut ranked: Vec<usize> = (0..self.population.len()).collect();
            ranked.sort_by(|&a, &b| self.compare(a, b));
            next.extend(
                ranked
                    .iter()
                    .take(ga.elitism.min(size))
                    .map(|&i| self.population[i].clone()),
            );
        }

        let mut offspring: Vec<Candidate> = Vec::with_capacity(size - next.len());
        while offspring.len() < size - next.len() {
            let idx = self.tournament(ga.tournament_size);
            offspring.push(self.population[idx].clone());
        }

        for pair in offspring.chunks_mut(2) {
            if pair.len() == 2 && self.rng.gen_bool(ga.crossover_rate) {
                let (left, right) = pair.split_at_mut(1);
                self.two_point_crossover(&mut left[0], &mut right[0]);
            }
        }

        for child in &mut offspring {
            self.mutate(child, &ga);
        }

        next.append(&mut offspring);
        self.population = next;
    }

    /// Pick the best of `k` uniformly sampled candidates (with
    /// replacement) and return its index.
    fn tournament(&mut self, k: usize) -> usize {
        let mut best = self.rng.gen_range(0..self.population.len());
        for _ in 1..k {
            let idx = self.rng.gen_range(0..self.population.len());
            if self.compare(idx, best) == Ordering::Less {
                best = idx;
            }
        }
        best
    }

    /// Rank two candidates under the configured direction; `Less` means
    /// the first outranks the second.
    fn compare(&self, a: usize, b: usize) -> Ordering {
        let sentinel = self.evaluator.infeasible_score();
        let fa = self.population[a].fitness.unwrap_or(sentinel);
        let fb = self.population[b].fitness.unwrap_or(sentinel);
        if self.config.direction.better(fa, fb) {
            Ordering::Less
        } else if self.config.direction.better(fb, fa) {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }

    /// Two-point recombination: swap the gene segment between two random
    /// cut positions. Offspring may leave their bounds; the constraint
    /// gate, not the operator, enforces feasibility.
    fn two_point_crossover(&mut self, a: &mut Candidate, b: &mut Candidate) {
        let len = a.genes.len().min(b.genes.len());
        if len < 2 {
            return;
        }
        let mut p1 = self.rng.gen_range(1..=len);
        let mut p2 = self.rng.gen_range(1..len);
        if p2 >= p1 {
            p2 += 1;
        } else {
            std::mem::swap(&mut p1, &mut p2);
        }
        for i in p1..p2 {
            std::mem::swap(&mut a.genes[i], &mut b.genes[i]);
        }
        a.invalidate();
        b.invalidate();
    }

    /// Gaussian mutation, applied to each gene independently. No clamping
    /// unless configured.
    fn mutate(&mut self, child: &mut Candidate, ga: &GaConfig) {
        let mut changed = false;
        for (i, gene) in child.genes.iter_mut().enumerate() {
            if self.rng.gen_bool(ga.mutation_rate) {
                *gene += self.noise.sample(&mut self.rng);
                if ga.clamp_to_bounds {
                    let (low, high) = self.gene_bounds[i];
                    *gene = gene.clamp(low, high);
                }
                changed = true;
            }
        }
        if changed {
            child.invalidate();
        }
    }

    /// Best individual of the (fully evaluated) final population.
    fn best_mix(&self) -> BestMix {
        let sentinel = self.evaluator.infeasible_score();
        let mut best = 0;
        for idx in 1..self.population.len() {
            if self.compare(idx, best) == Ordering::Less {
                best = idx;
            }
        }
        let candidate = &self.population[best];
        let features = self
            .config
            .space
            .complete(&candidate.genes)
            .unwrap_or_else(|| candidate.genes.clone());
        BestMix {
            genes: candidate.genes.clone(),
            features,
            fitness: candidate.fitness.unwrap_or(sentinel),
            predicted: candidate.predicted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ConstraintRule, Direction, ParameterSpace, ParameterSpec, Quantity, RuleKind};

    /// Identity surrogate: predicts the first feature unchanged.
    struct FirstFeature;

    impl Surrogate for FirstFeature {
        fn normalize(&self, features: &[f64]) -> Result<Vec<f64>, SurrogateError> {
            Ok(features.to_vec())
        }

        fn predict(&self, normalized: &[f64]) -> Result<f64, SurrogateError> {
            normalized
                .first()
                .copied()
                .ok_or_else(|| SurrogateError::new("empty feature vector"))
        }
    }

    fn config() -> SearchConfig {
        SearchConfig {
            space: ParameterSpace::new(vec![
                ParameterSpec::evolved("Cement", 100.0, 550.0),
                ParameterSpec::evolved("Water", 120.0, 250.0),
            ]),
            rules: vec![ConstraintRule {
                name: "water_cement_ratio".into(),
                kind: RuleKind::Proportion,
                quantity: Quantity::Ratio {
                    numerator: vec!["Water".into()],
                    denominator: vec!["Cement".into()],
                },
                min: Some(0.3),
                max: Some(0.6),
            }],
            ga: GaConfig {
                population_size: 40,
                generations: 20,
                ..GaConfig::default()
            },
            target: 400.0,
            direction: Direction::Minimize,
            random_seed: Some(1234),
        }
    }

    #[test]
    fn test_deterministic_for_fixed_seed() {
        let a = SearchEngine::new(config(), FirstFeature).unwrap().run().unwrap();
        let b = SearchEngine::new(config(), FirstFeature).unwrap().run().unwrap();
        assert_eq!(a.best, b.best);
        assert_eq!(a.history, b.history);
    }

    #[test]
    fn test_history_has_one_record_per_generation() {
        let outcome = SearchEngine::new(config(), FirstFeature).unwrap().run().unwrap();
        assert_eq!(outcome.history.len(), 20);
        for (i, stats) in outcome.history.iter().enumerate() {
            assert_eq!(stats.generation, i);
            assert!(stats.min_fitness <= stats.avg_fitness);
        }
    }

    #[test]
    fn test_best_no_worse_than_worst_of_initial_population() {
        // Same seed, so this engine's initial population is exactly the
        // one a full run starts from.
        let mut sampler = SearchEngine::new(config(), FirstFeature).unwrap();
        sampler.initialize();
        sampler.evaluate_population(0).unwrap();
        let sentinel = sampler.evaluator.infeasible_score();
        let worst_initial = sampler
            .population
            .iter()
            .map(|candidate| candidate.fitness.unwrap_or(sentinel))
            .fold(f64::NEG_INFINITY, f64::max);

        let outcome = SearchEngine::new(config(), FirstFeature).unwrap().run().unwrap();
        assert!(outcome.best.fitness <= worst_initial);
    }

    #[test]
    fn test_zero_population_is_config_error() {
        let mut c = config();
        c.ga.population_size = 0;
        assert!(matches!(
            SearchEngine::new(c, FirstFeature),
            Err(SearchError::Config(ConfigError::ZeroPopulation))
        ));
    }

    #[test]
    fn test_zero_generations_is_config_error() {
        let mut c = config();
        c.ga.generations = 0;
        assert!(matches!(
            SearchEngine::new(c, FirstFeature),
            Err(SearchError::Config(ConfigError::ZeroGenerations))
        ));
    }

    #[test]
    fn test_elitism_makes_min_fitness_non_increasing() {
        let mut c = config();
        c.ga.elitism = 2;
        let outcome = SearchEngine::new(c, FirstFeature).unwrap().run().unwrap();
        for pair in outcome.history.windows(2) {
            assert!(pair[1].min_fitness <= pair[0].min_fitness);
        }
    }

    #[test]
    fn test_clamped_mutation_keeps_genes_in_bounds() {
        let mut c = config();
        c.ga.mutation_rate = 1.0;
        c.ga.mutation_sigma = 100.0;
        c.ga.clamp_to_bounds = true;
        c.ga.generations = 5;

        let mut engine = SearchEngine::new(c, FirstFeature).unwrap();
        engine.run().unwrap();
        for candidate in &engine.population {
            for (gene, (low, high)) in candidate.genes.iter().zip(&engine.gene_bounds) {
                assert!(gene >= low && gene <= high);
            }
        }
    }

    #[test]
    fn test_unclamped_mutation_can_leave_bounds() {
        let mut c = config();
        c.ga.mutation_rate = 1.0;
        c.ga.mutation_sigma = 1000.0;
        c.ga.generations = 5;

        let mut engine = SearchEngine::new(c, FirstFeature).unwrap();
        engine.run().unwrap();
        let escaped = engine.population.iter().any(|candidate| {
            candidate
                .genes
                .iter()
                .zip(&engine.gene_bounds)
                .any(|(gene, (low, high))| gene < low || gene > high)
        });
        assert!(escaped);
    }

    #[test]
    fn test_single_gene_space_runs() {
        // Two-point crossover degenerates gracefully below two genes.
        let c = SearchConfig {
            space: ParameterSpace::new(vec![ParameterSpec::evolved("Cement", 100.0, 550.0)]),
            rules: Vec::new(),
            ga: GaConfig {
                population_size: 10,
                generations: 5,
                ..GaConfig::default()
            },
            target: 300.0,
            direction: Direction::Minimize,
            random_seed: Some(9),
        };
        let outcome = SearchEngine::new(c, FirstFeature).unwrap().run().unwrap();
        assert_eq!(outcome.best.genes.len(), 1);
        assert_eq!(outcome.history.len(), 5);
    }
}
