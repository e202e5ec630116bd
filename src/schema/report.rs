//! Result and convergence-history types handed to external reporting.

use serde::{Deserialize, Serialize};

/// Per-generation convergence record, appended once per generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Zero-based generation index.
    pub generation: usize,
    /// Minimum fitness across the population.
    pub min_fitness: f64,
    /// Mean fitness across the population.
    pub avg_fitness: f64,
}

/// Best individual found by a search run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestMix {
    /// Evolved gene values, in declared parameter order.
    pub genes: Vec<f64>,
    /// Full feature vector with fixed parameters spliced in.
    pub features: Vec<f64>,
    /// Fitness of the individual under the configured direction.
    pub fitness: f64,
    /// Surrogate prediction for the mix; `None` if the best individual was
    /// infeasible (possible only when no feasible candidate ever appeared).
    pub predicted: Option<f64>,
}

/// Outcome of a completed search run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub best: BestMix,
    /// Convergence history, one record per generation.
    pub history: Vec<GenerationStats>,
}
