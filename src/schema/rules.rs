//! Declarative engineering constraint rules for mix designs.

use serde::{Deserialize, Serialize};

use super::{ConfigError, ParameterSpace};

/// A named constraint on a raw or derived quantity of the mix.
///
/// Rules are inclusive on both ends; a missing `min` or `max` leaves that
/// side unbounded (e.g. a minimum-cement rule has no upper limit).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintRule {
    /// Rule name, used in diagnostics.
    pub name: String,
    /// Evaluation category; rules are checked composition-first.
    pub kind: RuleKind,
    /// Quantity the rule constrains.
    pub quantity: Quantity,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

/// Category controlling the fixed evaluation order of rules:
/// chemical composition ratios, then mix proportions, then process
/// parameters such as curing temperature and age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Composition,
    Proportion,
    Process,
}

impl RuleKind {
    pub(crate) fn order(self) -> u8 {
        match self {
            RuleKind::Composition => 0,
            RuleKind::Proportion => 1,
            RuleKind::Process => 2,
        }
    }
}

/// Quantity derived from the full feature vector before range-checking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    /// A raw parameter value.
    Parameter(String),
    /// Sum of the named parameters (e.g. total binder content).
    Sum(Vec<String>),
    /// Ratio of two parameter sums (e.g. water / total binder).
    Ratio {
        numerator: Vec<String>,
        denominator: Vec<String>,
    },
}

impl ConstraintRule {
    /// Check the rule is well-formed against a parameter space: every
    /// referenced name exists, term lists are non-empty, and the range is
    /// non-degenerate.
    pub fn validate(&self, space: &ParameterSpace) -> Result<(), ConfigError> {
        let check_terms = |terms: &[String]| -> Result<(), ConfigError> {
            if terms.is_empty() {
                return Err(ConfigError::EmptyRuleTerms {
                    rule: self.name.clone(),
                });
            }
            for term in terms {
                if space.index_of(term).is_none() {
                    return Err(ConfigError::UnknownParameter {
                        rule: self.name.clone(),
                        parameter: term.clone(),
                    });
                }
            }
            Ok(())
        };

        match &self.quantity {
            Quantity::Parameter(name) => check_terms(std::slice::from_ref(name))?,
            Quantity::Sum(terms) => check_terms(terms)?,
            Quantity::Ratio {
                numerator,
                denominator,
            } => {
                check_terms(numerator)?;
                check_terms(denominator)?;
            }
        }

        match (self.min, self.max) {
            (None, None) => Err(ConfigError::UnboundedRule {
                rule: self.name.clone(),
            }),
            (Some(min), Some(max)) if min > max => Err(ConfigError::InvalidRuleRange {
                rule: self.name.clone(),
                min,
                max,
            }),
            _ => Ok(()),
        }
    }
}
