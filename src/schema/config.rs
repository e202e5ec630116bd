//! Search configuration types and validation.

use serde::{Deserialize, Serialize};

use super::{ConstraintRule, ParameterRole, ParameterSpace};

/// Top-level configuration for a mix-design search run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Ordered parameter space (evolved bounds and fixed values).
    pub space: ParameterSpace,
    /// Engineering constraint rules; empty means unconstrained.
    #[serde(default)]
    pub rules: Vec<ConstraintRule>,
    /// Genetic operator settings.
    #[serde(default)]
    pub ga: GaConfig,
    /// Target predicted outcome (e.g. compressive strength in MPa).
    pub target: f64,
    /// Optimization direction for fitness ranking.
    #[serde(default)]
    pub direction: Direction,
    /// Random seed for reproducibility. `None` draws one from entropy.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

/// Genetic algorithm settings.
///
/// Defaults match the original concrete-mix study: population 100 over 50
/// generations, tournament size 3, two-point crossover at 0.8, per-gene
/// Gaussian mutation at 0.1 with N(0, 1) noise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaConfig {
    /// Number of individuals per generation.
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    /// Number of generations to run.
    #[serde(default = "default_generations")]
    pub generations: usize,
    /// Tournament size for parent selection.
    #[serde(default = "default_tournament_size")]
    pub tournament_size: usize,
    /// Probability of recombining each selected pair (0.0-1.0).
    #[serde(default = "default_crossover_rate")]
    pub crossover_rate: f64,
    /// Per-gene mutation probability (0.0-1.0).
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    /// Mean of the Gaussian mutation noise.
    #[serde(default)]
    pub mutation_mu: f64,
    /// Standard deviation of the Gaussian mutation noise.
    #[serde(default = "default_mutation_sigma")]
    pub mutation_sigma: f64,
    /// Number of best individuals copied unchanged into the next
    /// generation. Default 0: feasibility pressure alone decides survival.
    #[serde(default)]
    pub elitism: usize,
    /// Clip mutated genes back into their declared bounds. Off by default:
    /// out-of-bound offspring are rejected by the constraint gate instead.
    #[serde(default)]
    pub clamp_to_bounds: bool,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: default_population_size(),
            generations: default_generations(),
            tournament_size: default_tournament_size(),
            crossover_rate: default_crossover_rate(),
            mutation_rate: default_mutation_rate(),
            mutation_mu: 0.0,
            mutation_sigma: default_mutation_sigma(),
            elitism: 0,
            clamp_to_bounds: false,
        }
    }
}

fn default_population_size() -> usize {
    100
}
fn default_generations() -> usize {
    50
}
fn default_tournament_size() -> usize {
    3
}
fn default_crossover_rate() -> f64 {
    0.8
}
fn default_mutation_rate() -> f64 {
    0.1
}
fn default_mutation_sigma() -> f64 {
    1.0
}

/// Optimization direction for fitness comparison.
///
/// The fitness value itself is the absolute prediction error; under
/// `Maximize` it is negated so that higher is better. `Minimize` is the
/// default and the convention used throughout the crate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Minimize,
    Maximize,
}

impl Direction {
    /// Whether fitness `a` outranks fitness `b`.
    pub fn better(self, a: f64, b: f64) -> bool {
        match self {
            Direction::Minimize => a < b,
            Direction::Maximize => a > b,
        }
    }
}

impl SearchConfig {
    /// Validate the configuration before a run starts.
    ///
    /// All configuration problems are fatal here; nothing is silently
    /// defaulted once the search loop begins.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.space.is_empty() {
            return Err(ConfigError::EmptyParameterSpace);
        }
        if self.space.evolved_len() == 0 {
            return Err(ConfigError::NoEvolvedParameters);
        }
        for (i, p) in self.space.parameters.iter().enumerate() {
            if self
                .space
                .parameters
                .iter()
                .skip(i + 1)
                .any(|q| q.name == p.name)
            {
                return Err(ConfigError::DuplicateParameter {
                    parameter: p.name.clone(),
                });
            }
            if let ParameterRole::Evolved { low, high } = p.role {
                if !low.is_finite() || !high.is_finite() || low > high {
                    return Err(ConfigError::InvalidBound {
                        parameter: p.name.clone(),
                        low,
                        high,
                    });
                }
            }
        }

        for rule in &self.rules {
            rule.validate(&self.space)?;
        }

        if self.ga.population_size == 0 {
            return Err(ConfigError::ZeroPopulation);
        }
        if self.ga.generations == 0 {
            return Err(ConfigError::ZeroGenerations);
        }
        if self.ga.tournament_size == 0 {
            return Err(ConfigError::ZeroTournament);
        }
        if !(0.0..=1.0).contains(&self.ga.crossover_rate) {
            return Err(ConfigError::InvalidProbability {
                field: "crossover_rate",
                value: self.ga.crossover_rate,
            });
        }
        if !(0.0..=1.0).contains(&self.ga.mutation_rate) {
            return Err(ConfigError::InvalidProbability {
                field: "mutation_rate",
                value: self.ga.mutation_rate,
            });
        }
        if !self.ga.mutation_sigma.is_finite() || self.ga.mutation_sigma < 0.0 {
            return Err(ConfigError::InvalidMutationSigma {
                sigma: self.ga.mutation_sigma,
            });
        }
        if !self.target.is_finite() {
            return Err(ConfigError::InvalidTarget {
                target: self.target,
            });
        }

        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Parameter space is empty")]
    EmptyParameterSpace,
    #[error("Parameter space has no evolved parameters")]
    NoEvolvedParameters,
    #[error("Duplicate parameter name '{parameter}'")]
    DuplicateParameter { parameter: String },
    #[error("Parameter '{parameter}' has invalid bound [{low}, {high}]")]
    InvalidBound {
        parameter: String,
        low: f64,
        high: f64,
    },
    #[error("Rule '{rule}' references unknown parameter '{parameter}'")]
    UnknownParameter { rule: String, parameter: String },
    #[error("Rule '{rule}' has an empty term list")]
    EmptyRuleTerms { rule: String },
    #[error("Rule '{rule}' declares no minimum or maximum")]
    UnboundedRule { rule: String },
    #[error("Rule '{rule}' has invalid range [{min}, {max}]")]
    InvalidRuleRange { rule: String, min: f64, max: f64 },
    #[error("Population size must be non-zero")]
    ZeroPopulation,
    #[error("Generation count must be non-zero")]
    ZeroGenerations,
    #[error("Tournament size must be non-zero")]
    ZeroTournament,
    #[error("{field} must be within [0, 1], got {value}")]
    InvalidProbability { field: &'static str, value: f64 },
    #[error("Mutation sigma must be finite and non-negative, got {sigma}")]
    InvalidMutationSigma { sigma: f64 },
    #[error("Target value must be finite, got {target}")]
    InvalidTarget { target: f64 },
}
