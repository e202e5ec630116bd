//! Constraint evaluation: feasibility of a mix against its rule set.

use log::debug;

use crate::schema::{ConfigError, ConstraintRule, ParameterSpace, Quantity};

/// Penalty returned by [`ConstraintChecker::penalty`] for infeasible mixes.
pub const CONSTRAINT_PENALTY: f64 = 1.0e3;

/// Compiled constraint rule set, resolved against a parameter space.
///
/// Rules are evaluated in a fixed order regardless of declaration order:
/// composition ratios first, then mix proportions, then process parameters.
pub struct ConstraintChecker {
    rules: Vec<CompiledRule>,
    arity: usize,
}

struct CompiledRule {
    name: String,
    quantity: CompiledQuantity,
    min: Option<f64>,
    max: Option<f64>,
}

enum CompiledQuantity {
    Feature(usize),
    Sum(Vec<usize>),
    Ratio { numerator: Vec<usize>, denominator: Vec<usize> },
}

impl ConstraintChecker {
    /// Resolve rule parameter names to feature-vector indices.
    ///
    /// Name resolution failures are configuration errors; they never occur
    /// during the search loop itself.
    pub fn compile(space: &ParameterSpace, rules: &[ConstraintRule]) -> Result<Self, ConfigError> {
        let resolve = |rule: &ConstraintRule, terms: &[String]| -> Result<Vec<usize>, ConfigError> {
            terms
                .iter()
                .map(|term| {
                    space
                        .index_of(term)
                        .ok_or_else(|| ConfigError::UnknownParameter {
                            rule: rule.name.clone(),
                            parameter: term.clone(),
                        })
                })
                .collect()
        };

        let mut ordered: Vec<&ConstraintRule> = rules.iter().collect();
        ordered.sort_by_key(|rule| rule.kind.order());

        let compiled = ordered
            .into_iter()
            .map(|rule| {
                let quantity = match &rule.quantity {
                    Quantity::Parameter(name) => CompiledQuantity::Feature(
                        space
                            .index_of(name)
                            .ok_or_else(|| ConfigError::UnknownParameter {
                                rule: rule.name.clone(),
                                parameter: name.clone(),
                            })?,
                    ),
                    Quantity::Sum(terms) => CompiledQuantity::Sum(resolve(rule, terms)?),
                    Quantity::Ratio {
                        numerator,
                        denominator,
                    } => CompiledQuantity::Ratio {
                        numerator: resolve(rule, numerator)?,
                        denominator: resolve(rule, denominator)?,
                    },
                };
                Ok(CompiledRule {
                    name: rule.name.clone(),
                    quantity,
                    min: rule.min,
                    max: rule.max,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self {
            rules: compiled,
            arity: space.len(),
        })
    }

    /// Check a full feature vector against every rule.
    ///
    /// Fails closed: a length mismatch or a zero-denominator ratio is
    /// reported as infeasible, never raised. Short-circuits on the first
    /// violated rule. Diagnostics go to the log only and never affect the
    /// verdict.
    pub fn check(&self, mix: &[f64]) -> bool {
        if mix.len() != self.arity {
            debug!(
                "constraint check rejected mix: expected {} features, got {}",
                self.arity,
                mix.len()
            );
            return false;
        }

        for rule in &self.rules {
            let value = match rule.quantity.evaluate(mix) {
                Some(value) => value,
                None => {
                    debug!("rule '{}' violated: zero denominator", rule.name);
                    return false;
                }
            };
            // NaN fails both comparisons and lands here too.
            let below = rule.min.is_some_and(|min| !(value >= min));
            let above = rule.max.is_some_and(|max| !(value <= max));
            if below || above {
                debug!("rule '{}' violated: value {value:.4} outside range", rule.name);
                return false;
            }
        }
        true
    }

    /// Constraint-violation penalty: zero when feasible, a large fixed
    /// positive constant otherwise. Lets callers fold infeasibility into a
    /// fitness score instead of rejecting outright.
    pub fn penalty(&self, mix: &[f64]) -> f64 {
        if self.check(mix) {
            0.0
        } else {
            CONSTRAINT_PENALTY
        }
    }

    /// Expected feature vector length.
    pub fn arity(&self) -> usize {
        self.arity
    }
}

impl CompiledQuantity {
    fn evaluate(&self, mix: &[f64]) -> Option<f64> {
        match self {
            CompiledQuantity::Feature(i) => Some(mix[*i]),
            CompiledQuantity::Sum(indices) => Some(indices.iter().map(|i| mix[*i]).sum()),
            CompiledQuantity::Ratio {
                numerator,
                denominator,
            } => {
                let den: f64 = denominator.iter().map(|i| mix[*i]).sum();
                if den == 0.0 {
                    return None;
                }
                let num: f64 = numerator.iter().map(|i| mix[*i]).sum();
                Some(num / den)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ParameterSpec, RuleKind};
    use proptest::prelude::*;

    /// Concrete mix space and rules from the original study:
    /// W/B ratio 0.3-0.6, total binder 300-600, min cement 100,
    /// fine-aggregate fraction 0.35-0.45.
    fn concrete() -> (ParameterSpace, Vec<ConstraintRule>) {
        let space = ParameterSpace::new(vec![
            ParameterSpec::evolved("Cement", 100.0, 550.0),
            ParameterSpec::evolved("Blast Furnace Slag", 0.0, 360.0),
            ParameterSpec::evolved("Fly Ash", 0.0, 200.0),
            ParameterSpec::evolved("Water", 120.0, 250.0),
            ParameterSpec::evolved("Superplasticizer", 0.0, 32.0),
            ParameterSpec::evolved("Coarse Aggregate", 800.0, 1150.0),
            ParameterSpec::evolved("Fine Aggregate", 590.0, 950.0),
        ]);
        let binder = || {
            vec![
                "Cement".to_string(),
                "Blast Furnace Slag".to_string(),
                "Fly Ash".to_string(),
            ]
        };
        let rules = vec![
            ConstraintRule {
                name: "water_binder_ratio".into(),
                kind: RuleKind::Proportion,
                quantity: Quantity::Ratio {
                    numerator: vec!["Water".into()],
                    denominator: binder(),
                },
                min: Some(0.3),
                max: Some(0.6),
            },
            ConstraintRule {
                name: "total_binder".into(),
                kind: RuleKind::Proportion,
                quantity: Quantity::Sum(binder()),
                min: Some(300.0),
                max: Some(600.0),
            },
            ConstraintRule {
                name: "min_cement".into(),
                kind: RuleKind::Proportion,
                quantity: Quantity::Parameter("Cement".into()),
                min: Some(100.0),
                max: None,
            },
            ConstraintRule {
                name: "fine_aggregate_fraction".into(),
                kind: RuleKind::Proportion,
                quantity: Quantity::Ratio {
                    numerator: vec!["Fine Aggregate".into()],
                    denominator: vec!["Coarse Aggregate".into(), "Fine Aggregate".into()],
                },
                min: Some(0.35),
                max: Some(0.45),
            },
        ];
        (space, rules)
    }

    fn checker() -> ConstraintChecker {
        let (space, rules) = concrete();
        ConstraintChecker::compile(&space, &rules).unwrap()
    }

    #[test]
    fn test_valid_mix_design() {
        // cement, slag, fly ash, water, superplasticizer, coarse, fine
        let mix = [350.0, 100.0, 50.0, 175.0, 5.0, 1000.0, 800.0];
        assert!(checker().check(&mix));
        assert_eq!(checker().penalty(&mix), 0.0);
    }

    #[test]
    fn test_high_water_content_rejected() {
        // Water/binder = 310/500 = 0.62, just past the inclusive 0.6 limit.
        let mix = [350.0, 100.0, 50.0, 310.0, 5.0, 1000.0, 800.0];
        assert!(!checker().check(&mix));
        assert_eq!(checker().penalty(&mix), CONSTRAINT_PENALTY);
    }

    #[test]
    fn test_water_at_binder_ratio_limit_accepted() {
        // Water/binder = 300/500 = 0.6, exactly the inclusive upper endpoint.
        let mix = [350.0, 100.0, 50.0, 300.0, 5.0, 1000.0, 800.0];
        assert!(checker().check(&mix));
    }

    #[test]
    fn test_zero_binder_is_infeasible_not_a_panic() {
        let mix = [0.0, 0.0, 0.0, 175.0, 5.0, 1000.0, 800.0];
        assert!(!checker().check(&mix));
    }

    #[test]
    fn test_length_mismatch_fails_closed() {
        assert!(!checker().check(&[350.0, 100.0]));
        assert!(!checker().check(&[]));
    }

    #[test]
    fn test_rules_are_checked_composition_then_proportion_then_process() {
        let space = ParameterSpace::new(vec![
            ParameterSpec::evolved("Cement", 100.0, 550.0),
            ParameterSpec::evolved("Water", 120.0, 250.0),
        ]);
        // Declared in reverse category order, with two proportion rules
        // so declaration order within a category is pinned too.
        let rules = vec![
            ConstraintRule {
                name: "curing_water_window".into(),
                kind: RuleKind::Process,
                quantity: Quantity::Parameter("Water".into()),
                min: Some(120.0),
                max: Some(250.0),
            },
            ConstraintRule {
                name: "water_cement_ratio".into(),
                kind: RuleKind::Proportion,
                quantity: Quantity::Ratio {
                    numerator: vec!["Water".into()],
                    denominator: vec!["Cement".into()],
                },
                min: Some(0.3),
                max: Some(0.6),
            },
            ConstraintRule {
                name: "min_water".into(),
                kind: RuleKind::Proportion,
                quantity: Quantity::Parameter("Water".into()),
                min: Some(120.0),
                max: None,
            },
            ConstraintRule {
                name: "min_cement".into(),
                kind: RuleKind::Composition,
                quantity: Quantity::Parameter("Cement".into()),
                min: Some(100.0),
                max: None,
            },
        ];
        let checker = ConstraintChecker::compile(&space, &rules).unwrap();
        let order: Vec<&str> = checker.rules.iter().map(|rule| rule.name.as_str()).collect();
        assert_eq!(
            order,
            ["min_cement", "water_cement_ratio", "min_water", "curing_water_window"]
        );
    }

    #[test]
    fn test_range_endpoints_are_inclusive() {
        let space = ParameterSpace::new(vec![ParameterSpec::evolved("Water", 0.0, 1000.0)]);
        let rules = vec![ConstraintRule {
            name: "water_window".into(),
            kind: RuleKind::Proportion,
            quantity: Quantity::Parameter("Water".into()),
            min: Some(120.0),
            max: Some(250.0),
        }];
        let checker = ConstraintChecker::compile(&space, &rules).unwrap();

        assert!(checker.check(&[120.0]));
        assert!(checker.check(&[250.0]));
        assert!(!checker.check(&[119.0]));
        assert!(!checker.check(&[251.0]));
    }

    #[test]
    fn test_unknown_parameter_is_compile_error() {
        let space = ParameterSpace::new(vec![ParameterSpec::evolved("Water", 0.0, 1.0)]);
        let rules = vec![ConstraintRule {
            name: "bad".into(),
            kind: RuleKind::Proportion,
            quantity: Quantity::Parameter("Cement".into()),
            min: Some(0.0),
            max: None,
        }];
        assert!(matches!(
            ConstraintChecker::compile(&space, &rules),
            Err(ConfigError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn test_nan_gene_is_infeasible() {
        let (space, rules) = concrete();
        let checker = ConstraintChecker::compile(&space, &rules).unwrap();
        let mix = [f64::NAN, 100.0, 50.0, 175.0, 5.0, 1000.0, 800.0];
        assert!(!checker.check(&mix));
    }

    proptest! {
        /// A single-parameter window rule agrees with the plain inclusive
        /// range predicate for arbitrary finite values.
        #[test]
        fn prop_window_rule_matches_inclusive_range(value in -1.0e6_f64..1.0e6) {
            let space = ParameterSpace::new(vec![ParameterSpec::evolved("X", -1.0e6, 1.0e6)]);
            let rules = vec![ConstraintRule {
                name: "window".into(),
                kind: RuleKind::Process,
                quantity: Quantity::Parameter("X".into()),
                min: Some(-10.0),
                max: Some(10.0),
            }];
            let checker = ConstraintChecker::compile(&space, &rules).unwrap();
            prop_assert_eq!(checker.check(&[value]), (-10.0..=10.0).contains(&value));
        }

        /// Ratio rules never panic, whatever the denominator works out to.
        #[test]
        fn prop_ratio_never_panics(a in -1.0e3_f64..1.0e3, b in -1.0e3_f64..1.0e3) {
            let space = ParameterSpace::new(vec![
                ParameterSpec::evolved("A", -1.0e3, 1.0e3),
                ParameterSpec::evolved("B", -1.0e3, 1.0e3),
            ]);
            let rules = vec![ConstraintRule {
                name: "ratio".into(),
                kind: RuleKind::Composition,
                quantity: Quantity::Ratio {
                    numerator: vec!["A".into()],
                    denominator: vec!["B".into()],
                },
                min: Some(0.0),
                max: Some(1.0),
            }];
            let checker = ConstraintChecker::compile(&space, &rules).unwrap();
            let _ = checker.check(&[a, b]);
            if b == 0.0 {
                prop_assert!(!checker.check(&[a, b]));
            }
        }
    }
}
