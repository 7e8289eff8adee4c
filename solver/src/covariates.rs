//! State-dependent covariates derived once from the state table.
//!
//! [`construct_covariates`] is a pure function of the states and the model
//! specification; its output is cached in the [`crate::types::ModelContext`] and
//! read by the utility collaborator, the budget constraint, and the solver.

use crate::constants::*;
use crate::model_spec::ModelSpec;
use crate::types::State;

/// Derived covariates of a single state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CovariateRow {
    /// Age bin of the youngest child: none, 0-2, 3-5, 6-10, 11+.
    pub child_bin: usize,
    /// Gross earnings of the partner, zero without a partner.
    pub male_wage: f64,
    pub equivalence_scale: f64,
    pub child_benefits: f64,
}

impl CovariateRow {
    /// Row of the child care cost table: children older than five cause no
    /// child care costs and share the row of childless households.
    #[inline(always)]
    pub fn child_care_index(&self) -> usize {
        if self.child_bin >= NUM_CHILD_CARE_BINS {
            0
        } else {
            self.child_bin
        }
    }
}

/// Per-state covariate table, indexed by linear state id.
#[derive(Clone, Debug, PartialEq)]
pub struct Covariates {
    pub rows: Vec<CovariateRow>,
}

impl Covariates {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[inline(always)]
    pub fn get(&self, state_id: usize) -> &CovariateRow {
        &self.rows[state_id]
    }
}

pub fn child_age_bin(child_age: i32) -> usize {
    match child_age {
        NO_CHILD => 0,
        0..=2 => 1,
        3..=5 => 2,
        6..=10 => 3,
        _ => 4,
    }
}

/// Modified OECD scale: 1 for the woman, 0.5 for a partner, 0.3 for a child.
pub fn equivalence_scale(state: &State) -> f64 {
    let mut scale = 1.0;
    if state.partner == 1 {
        scale += 0.5;
    }
    if state.has_child() {
        scale += 0.3;
    }
    scale
}

pub fn partner_earnings(spec: &ModelSpec, state: &State) -> f64 {
    if state.partner == 0 {
        return 0.0;
    }
    let pw = &spec.partner_wage;
    let t = state.period as f64;
    (pw.constant + pw.age * t + pw.age_sq * t * t + pw.educ * state.educ_level as f64).exp()
}

pub fn construct_covariates(states: &[State], spec: &ModelSpec) -> Covariates {
    let rows = states
        .iter()
        .map(|state| CovariateRow {
            child_bin: child_age_bin(state.child_age),
            male_wage: partner_earnings(spec, state),
            equivalence_scale: equivalence_scale(state),
            child_benefits: if state.has_child() {
                spec.child_benefits
            } else {
                0.0
            },
        })
        .collect();
    Covariates { rows }
}
