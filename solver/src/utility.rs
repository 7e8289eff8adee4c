//! Boundary to the utility collaborator.
//!
//! The solver consumes a [`UtilityComponents`] table: per state the systematic
//! log wage and the non-pecuniary utility multiplier of every choice. Any
//! implementation of [`UtilityEngine`] can produce it; [`MincerUtility`] is a
//! small parametric reference engine used by the binary and the tests.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::covariates::Covariates;
use crate::error::{ConfigError, ConfigResult};
use crate::model_spec::ModelSpec;
use crate::types::StateSpace;

/// Per-state utility ingredients, indexed by linear state id.
#[derive(Clone, Debug, PartialEq)]
pub struct UtilityComponents {
    pub log_wage_systematic: Vec<f64>,
    /// Multiplicative non-pecuniary utility of each choice (strictly positive
    /// for a CRRA consumption utility with `mu < 0`).
    pub non_consumption_utilities: Vec<[f64; NUM_CHOICES]>,
}

impl UtilityComponents {
    pub fn len(&self) -> usize {
        self.log_wage_systematic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log_wage_systematic.is_empty()
    }
}

pub trait UtilityEngine {
    fn components(&self, space: &StateSpace, covariates: &Covariates) -> UtilityComponents;
}

/// Log-linear Mincer wage with education-specific returns to experience, and
/// non-pecuniary terms additive in type and child age bin.
///
/// `log w = gamma_0[e] + gamma_1[e] · ln(exp_f + g_pt[e] · exp_p + 1)`
///
/// Non-pecuniary multiplier of employment choice `j ∈ {P, F}`:
/// `exp(const_j + theta_j[type] + child_j[child_bin])`, 1 for non-employment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MincerUtility {
    pub gamma_0: Vec<f64>,
    pub gamma_1: Vec<f64>,
    /// Weight of a part-time year relative to a full-time year.
    pub g_pt: Vec<f64>,
    pub const_p: f64,
    pub const_f: f64,
    /// Per disutility type; type 0 is the reference and usually 0.
    pub theta_p: Vec<f64>,
    pub theta_f: Vec<f64>,
    pub child_p: [f64; NUM_CHILD_BINS],
    pub child_f: [f64; NUM_CHILD_BINS],
}

impl MincerUtility {
    pub fn validate(&self, spec: &ModelSpec) -> ConfigResult<()> {
        let levels = spec.num_educ_levels();
        let per_level = [
            ("gamma_0", self.gamma_0.len()),
            ("gamma_1", self.gamma_1.len()),
            ("g_pt", self.g_pt.len()),
        ];
        for (name, actual) in per_level {
            if actual != levels {
                return Err(ConfigError::ShapeMismatch {
                    name,
                    expected: levels,
                    actual,
                });
            }
        }
        for (name, actual) in [("theta_p", self.theta_p.len()), ("theta_f", self.theta_f.len())] {
            if actual != spec.num_types {
                return Err(ConfigError::ShapeMismatch {
                    name,
                    expected: spec.num_types,
                    actual,
                });
            }
        }
        // Negative weights can push the experience index below -1, where the
        // log is undefined.
        for (index, &value) in self.g_pt.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::NegativeParameter {
                    name: "g_pt",
                    index,
                    value,
                });
            }
        }
        Ok(())
    }
}

impl UtilityEngine for MincerUtility {
    fn components(&self, space: &StateSpace, covariates: &Covariates) -> UtilityComponents {
        let mut log_wage_systematic = Vec::with_capacity(space.len());
        let mut non_consumption_utilities = Vec::with_capacity(space.len());

        for (id, state) in space.states.iter().enumerate() {
            let e = state.educ_level;
            let human_capital = state.exp_f as f64 + self.g_pt[e] * state.exp_p as f64;
            let log_wage = self.gamma_0[e] + self.gamma_1[e] * (human_capital + 1.0).ln();
            log_wage_systematic.push(log_wage);

            let bin = covariates.get(id).child_bin;
            let t = state.disutil_type;
            non_consumption_utilities.push([
                1.0,
                (self.const_p + self.theta_p[t] + self.child_p[bin]).exp(),
                (self.const_f + self.theta_f[t] + self.child_f[bin]).exp(),
            ]);
        }

        UtilityComponents {
            log_wage_systematic,
            non_consumption_utilities,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::covariates::construct_covariates;
    use crate::model_spec::tests::small_spec;
    use crate::state_space::create_state_space;

    pub(crate) fn reference_utility(spec: &ModelSpec) -> MincerUtility {
        let levels = spec.num_educ_levels();
        MincerUtility {
            gamma_0: (0..levels).map(|e| 1.5 + 0.2 * e as f64).collect(),
            gamma_1: vec![0.15; levels],
            g_pt: vec![0.5; levels],
            const_p: 0.3,
            const_f: 0.6,
            theta_p: (0..spec.num_types).map(|t| 0.1 * t as f64).collect(),
            theta_f: (0..spec.num_types).map(|t| 0.2 * t as f64).collect(),
            child_p: [0.0, 0.5, 0.3, 0.1, 0.0],
            child_f: [0.0, 0.9, 0.6, 0.3, 0.1],
        }
    }

    #[test]
    fn test_entry_wage_is_education_constant() {
        let spec = small_spec();
        let space = create_state_space(&spec).unwrap();
        let covariates = construct_covariates(&space.states, &spec);
        let utility = reference_utility(&spec);
        let components = utility.components(&space, &covariates);

        assert_eq!(components.len(), space.len());
        for (id, state) in space.states.iter().enumerate() {
            if state.exp_p == 0 && state.exp_f == 0 {
                let expected = utility.gamma_0[state.educ_level];
                assert!((components.log_wage_systematic[id] - expected).abs() < 1e-12);
            }
            assert_eq!(components.non_consumption_utilities[id][CHOICE_NON_EMPLOYMENT], 1.0);
        }
    }

    #[test]
    fn test_validate_rejects_negative_part_time_weight() {
        let spec = small_spec();
        let mut utility = reference_utility(&spec);
        utility.g_pt[1] = -0.5;
        assert_eq!(
            utility.validate(&spec),
            Err(ConfigError::NegativeParameter {
                name: "g_pt",
                index: 1,
                value: -0.5
            })
        );
        utility.g_pt[1] = f64::INFINITY;
        assert!(utility.validate(&spec).is_err());
        utility.g_pt[1] = 0.0;
        assert_eq!(utility.validate(&spec), Ok(()));
    }

    #[test]
    fn test_validate_checks_vector_lengths() {
        let spec = small_spec();
        let mut utility = reference_utility(&spec);
        assert_eq!(utility.validate(&spec), Ok(()));
        utility.theta_f.pop();
        assert_eq!(
            utility.validate(&spec),
            Err(ConfigError::ShapeMismatch {
                name: "theta_f",
                expected: 2,
                actual: 1
            })
        );
    }
}
