//! Fixed model specification: dimensions of the state space and the economic
//! constants the solver consumes.
//!
//! A [`ModelSpec`] is deserialized from the `model` section of the JSON
//! configuration (see [`crate::config`]) and checked by [`ModelSpec::validate`]
//! before the state space is enumerated.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{ConfigError, ConfigResult};

fn default_num_choices() -> usize {
    NUM_CHOICES
}

/// Log-wage equation of the partner: `exp(constant + age·t + age_sq·t² + educ·level)`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PartnerWage {
    pub constant: f64,
    pub age: f64,
    pub age_sq: f64,
    pub educ: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Number of model periods (the horizon).
    pub num_periods: usize,
    /// Number of labor supply alternatives; must equal [`NUM_CHOICES`].
    #[serde(default = "default_num_choices")]
    pub num_choices: usize,
    /// Years of schooling per education level. An individual of level `e`
    /// enters the model (makes a first choice) in period `educ_years[e]`.
    pub educ_years: Vec<usize>,
    /// Number of unobserved disutility-of-work types.
    pub num_types: usize,
    /// Oldest tracked age of the youngest child; older children leave the
    /// state (age resets to -1).
    pub child_age_max: i32,
    /// Oldest child age possible at model entry, -1 for childless entry.
    pub child_age_init_max: i32,
    /// Last period in which a newborn can be present.
    pub last_child_bearing_period: usize,

    /// Discount factor δ.
    pub delta: f64,
    /// CRRA curvature of consumption utility.
    pub mu: f64,
    pub num_draws_emax: usize,
    pub seed_emax: u64,
    /// Standard deviation of the log-wage shock.
    pub shock_sd: f64,

    /// Child benefit received whenever a child lives in the household.
    pub child_benefits: f64,
    /// Child care costs by child care bin (none, 0-2, 3-5) and employment
    /// choice (part-time, full-time).
    pub child_care_costs: [[f64; 2]; NUM_CHILD_CARE_BINS],
    pub partner_wage: PartnerWage,
    /// Flat transfer received in non-employment.
    #[serde(default)]
    pub non_employment_benefit: f64,
}

impl ModelSpec {
    pub fn num_educ_levels(&self) -> usize {
        self.educ_years.len()
    }

    /// Period in which individuals of education level `level` enter the model.
    #[inline(always)]
    pub fn entry_period(&self, level: usize) -> usize {
        self.educ_years[level]
    }

    /// Extent of the child-age dimension of the indexer (ages -1..=child_age_max).
    pub fn child_age_dim(&self) -> usize {
        (self.child_age_max + 2) as usize
    }

    /// Check the dimensions and constants. Fails on the first problem found.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.num_periods == 0 {
            return Err(ConfigError::NoPeriods);
        }
        if self.educ_years.is_empty() {
            return Err(ConfigError::NoEducationLevels);
        }
        if self.num_types == 0 {
            return Err(ConfigError::NoTypes);
        }
        if self.num_draws_emax == 0 {
            return Err(ConfigError::NoDraws);
        }
        if self.num_choices != NUM_CHOICES {
            return Err(ConfigError::ChoiceCountMismatch {
                declared: self.num_choices,
                supported: NUM_CHOICES,
            });
        }
        for (level, &entry) in self.educ_years.iter().enumerate() {
            if entry >= self.num_periods {
                return Err(ConfigError::EntryBeyondHorizon {
                    level,
                    entry,
                    num_periods: self.num_periods,
                });
            }
        }
        if self.child_age_max < 0 {
            return Err(ConfigError::InvalidChildAgeMax(self.child_age_max));
        }
        if self.child_age_init_max < NO_CHILD || self.child_age_init_max > self.child_age_max {
            return Err(ConfigError::InvalidChildAgeInitMax {
                init_max: self.child_age_init_max,
                max: self.child_age_max,
            });
        }
        if !self.delta.is_finite() || !(0.0..=1.0).contains(&self.delta) {
            return Err(ConfigError::InvalidDiscountFactor(self.delta));
        }
        if !self.mu.is_finite() || self.mu == 0.0 {
            return Err(ConfigError::InvalidMu(self.mu));
        }
        if !self.shock_sd.is_finite() || self.shock_sd < 0.0 {
            return Err(ConfigError::InvalidShockSd(self.shock_sd));
        }

        let scalars = [
            ("child_benefits", self.child_benefits),
            ("non_employment_benefit", self.non_employment_benefit),
            ("partner_wage.constant", self.partner_wage.constant),
            ("partner_wage.age", self.partner_wage.age),
            ("partner_wage.age_sq", self.partner_wage.age_sq),
            ("partner_wage.educ", self.partner_wage.educ),
        ];
        for (name, value) in scalars {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { name, value });
            }
        }
        for &value in self.child_care_costs.iter().flatten() {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite {
                    name: "child_care_costs",
                    value,
                });
            }
        }
        Ok(())
    }
}
