//! External surrogate model contract and a pre-fitted linear implementation.

use serde::{Deserialize, Serialize};

/// A pre-fitted regression model standing in for a physical experiment.
///
/// Both operations are read-only with respect to call-time state: the model
/// and its normalization transform are fitted once, before optimization
/// begins, and are safe for concurrent use across worker threads.
pub trait Surrogate: Send + Sync {
    /// Apply the fitted normalization transform to a raw feature vector.
    fn normalize(&self, features: &[f64]) -> Result<Vec<f64>, SurrogateError>;

    /// Predict the outcome for a normalized feature vector.
    fn predict(&self, normalized: &[f64]) -> Result<f64, SurrogateError>;
}

/// Failure raised by a surrogate implementation.
///
/// These abort the run: a fitness function that cannot score a candidate has
/// no safe default value.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct SurrogateError(String);

impl SurrogateError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub(crate) fn length_mismatch(expected: usize, got: usize) -> Self {
        Self(format!(
            "feature vector length mismatch: expected {expected}, got {got}"
        ))
    }
}

/// Linear model over z-score-normalized features.
///
/// Serves as a serde-loadable artifact honoring the surrogate contract; the
/// means and standard deviations come from fitting a standard scaler on the
/// historical training set, the weights and intercept from whatever
/// regression produced the model. Training itself is out of scope here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearSurrogate {
    /// Per-feature means of the training distribution.
    pub means: Vec<f64>,
    /// Per-feature standard deviations of the training distribution.
    pub stds: Vec<f64>,
    /// Coefficients applied to the normalized features.
    pub weights: Vec<f64>,
    /// Constant offset added to the weighted sum.
    pub intercept: f64,
}

impl LinearSurrogate {
    /// Build from fitted coefficients, checking the shapes agree and every
    /// standard deviation is usable as a divisor.
    pub fn new(
        means: Vec<f64>,
        stds: Vec<f64>,
        weights: Vec<f64>,
        intercept: f64,
    ) -> Result<Self, SurrogateError> {
        if means.len() != stds.len() || means.len() != weights.len() {
            return Err(SurrogateError::new(format!(
                "coefficient shapes disagree: {} means, {} stds, {} weights",
                means.len(),
                stds.len(),
                weights.len()
            )));
        }
        if let Some(i) = stds.iter().position(|s| !s.is_finite() || *s <= 0.0) {
            return Err(SurrogateError::new(format!(
                "standard deviation for feature {i} must be finite and positive, got {}",
                stds[i]
            )));
        }
        Ok(Self {
            means,
            stds,
            weights,
            intercept,
        })
    }

    /// Number of input features the model expects.
    pub fn arity(&self) -> usize {
        self.means.len()
    }
}

impl Surrogate for LinearSurrogate {
    fn normalize(&self, features: &[f64]) -> Result<Vec<f64>, SurrogateError> {
        if features.len() != self.arity() {
            return Err(SurrogateError::length_mismatch(self.arity(), features.len()));
        }
        Ok(features
            .iter()
            .zip(self.means.iter().zip(&self.stds))
            .map(|(x, (mean, std))| (x - mean) / std)
            .collect())
    }

    fn predict(&self, normalized: &[f64]) -> Result<f64, SurrogateError> {
        if normalized.len() != self.arity() {
            return Err(SurrogateError::length_mismatch(
                self.arity(),
                normalized.len(),
            ));
        }
        Ok(self.intercept
            + normalized
                .iter()
                .zip(&self.weights)
                .map(|(z, w)| z * w)
                .sum::<f64>())
    }
}
