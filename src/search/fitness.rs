//! Fitness function: constraint gate plus surrogate prediction error.

use log::debug;

use crate::schema::{Direction, ParameterSpace};

use super::constraints::ConstraintChecker;
use super::surrogate::{Surrogate, SurrogateError};

/// Fitness sentinel for infeasible individuals (signed per direction).
///
/// Large but finite, so arithmetic on population statistics stays
/// well-defined, and strictly worse than any feasible score a bounded
/// surrogate can produce.
pub const INFEASIBLE_SCORE: f64 = 1.0e9;

/// Scores candidate genomes for the search engine.
///
/// Pipeline per candidate: splice fixed parameters into the full feature
/// vector, gate on constraints, normalize, predict, and score by absolute
/// distance from the target. Reads but never mutates the surrogate or the
/// target, so evaluation is safe to parallelize across a generation.
pub struct FitnessEvaluator<S: Surrogate> {
    space: ParameterSpace,
    checker: ConstraintChecker,
    surrogate: S,
    target: f64,
    direction: Direction,
}

/// Fitness of one candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    /// Ranking value; absolute prediction error under `Minimize`, its
    /// negation under `Maximize`, the signed sentinel when infeasible.
    pub fitness: f64,
    /// Raw surrogate prediction; `None` for infeasible candidates, which
    /// never reach the surrogate.
    pub predicted: Option<f64>,
}

impl<S: Surrogate> FitnessEvaluator<S> {
    pub fn new(
        space: ParameterSpace,
        checker: ConstraintChecker,
        surrogate: S,
        target: f64,
        direction: Direction,
    ) -> Self {
        Self {
            space,
            checker,
            surrogate,
            target,
            direction,
        }
    }

    /// Score a genome.
    ///
    /// Feasibility violations are a normal outcome and yield the sentinel
    /// score; only surrogate failures are errors, since a fitness function
    /// that cannot score a candidate has no safe default.
    pub fn evaluate(&self, genes: &[f64]) -> Result<Score, SurrogateError> {
        let features = match self.space.complete(genes) {
            Some(features) => features,
            None => {
                debug!(
                    "genome length {} does not match {} evolved parameters",
                    genes.len(),
                    self.space.evolved_len()
                );
                return Ok(self.infeasible());
            }
        };

        if !self.checker.check(&features) {
            return Ok(self.infeasible());
        }

        let normalized = self.surrogate.normalize(&features)?;
        let predicted = self.surrogate.predict(&normalized)?;
        let error = (predicted - self.target).abs();

        let fitness = match self.direction {
            Direction::Minimize => error,
            Direction::Maximize => -error,
        };
        Ok(Score {
            fitness,
            predicted: Some(predicted),
        })
    }

    /// Sentinel score guaranteed worse than any feasible candidate under
    /// the configured direction.
    pub fn infeasible_score(&self) -> f64 {
        match self.direction {
            Direction::Minimize => INFEASIBLE_SCORE,
            Direction::Maximize => -INFEASIBLE_SCORE,
        }
    }

    fn infeasible(&self) -> Score {
        Score {
            fitness: self.infeasible_score(),
            predicted: None,
        }
    }
}
