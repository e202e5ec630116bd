//! Parameter space types: the ordered gene layout of a mix design.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Ordered set of mix parameters, matching the surrogate's feature order.
///
/// Evolved parameters contribute one gene each to an individual; fixed
/// parameters (e.g. curing age pinned to 28 days) are spliced back into the
/// full feature vector before constraint checking and prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSpace {
    pub parameters: Vec<ParameterSpec>,
}

/// A single named mix parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Parameter name, unique within the space.
    pub name: String,
    #[serde(flatten)]
    pub role: ParameterRole,
}

/// Whether a parameter is searched over or held constant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterRole {
    /// Sampled and mutated within an inclusive `[low, high]` bound.
    Evolved { low: f64, high: f64 },
    /// Held at a constant value for the whole run.
    Fixed { value: f64 },
}

impl ParameterSpec {
    /// Evolved parameter with an inclusive bound.
    pub fn evolved(name: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            name: name.into(),
            role: ParameterRole::Evolved { low, high },
        }
    }

    /// Parameter pinned to a constant.
    pub fn fixed(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            role: ParameterRole::Fixed { value },
        }
    }
}

impl ParameterSpace {
    pub fn new(parameters: Vec<ParameterSpec>) -> Self {
        Self { parameters }
    }

    /// Total number of parameters (full feature vector length).
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Number of evolved parameters (genome length).
    pub fn evolved_len(&self) -> usize {
        self.parameters
            .iter()
            .filter(|p| matches!(p.role, ParameterRole::Evolved { .. }))
            .count()
    }

    /// Position of a named parameter in the full feature vector.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.parameters.iter().position(|p| p.name == name)
    }

    /// Inclusive bounds of each evolved parameter, in gene order.
    pub fn evolved_bounds(&self) -> Vec<(f64, f64)> {
        self.parameters
            .iter()
            .filter_map(|p| match p.role {
                ParameterRole::Evolved { low, high } => Some((low, high)),
                ParameterRole::Fixed { .. } => None,
            })
            .collect()
    }

    /// Sample a genome uniformly within bounds. Fixed parameters are not
    /// sampled and contribute no gene.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Vec<f64> {
        self.parameters
            .iter()
            .filter_map(|p| match p.role {
                ParameterRole::Evolved { low, high } => Some(rng.gen_range(low..=high)),
                ParameterRole::Fixed { .. } => None,
            })
            .collect()
    }

    /// Reconstruct the full feature vector from a genome by splicing fixed
    /// values into their declared positions.
    ///
    /// Returns `None` when the genome length does not match the number of
    /// evolved parameters; callers treat that as infeasible, not fatal.
    pub fn complete(&self, genes: &[f64]) -> Option<Vec<f64>> {
        if genes.len() != self.evolved_len() {
            return None;
        }
        let mut next = genes.iter();
        let features = self
            .parameters
            .iter()
            .map(|p| match p.role {
                ParameterRole::Evolved { .. } => *next.next().expect("gene count checked above"),
                ParameterRole::Fixed { value } => value,
            })
            .collect();
        Some(features)
    }
}
