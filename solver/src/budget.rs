//! Budget constraint and flow utility.
//!
//! The tax and transfer schedule is an external collaborator behind
//! [`TaxSystem`]. Given net household resources, flow utility of choice `j` is
//! CRRA utility of equivalized consumption scaled by the non-pecuniary
//! multiplier of `j`:
//!
//! `u_j = (c_j^μ / μ) · nc_j`, `c_j = max(resources_j, floor) / equivalence`.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::covariates::{CovariateRow, Covariates};
use crate::error::{ConfigError, ConfigResult};

/// Net household income from gross earnings of both partners.
pub trait TaxSystem {
    fn net_household_income(&self, female_gross: f64, male_gross: f64) -> f64;
}

/// No taxes or contributions: net equals gross.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Untaxed;

impl TaxSystem for Untaxed {
    fn net_household_income(&self, female_gross: f64, male_gross: f64) -> f64 {
        female_gross + male_gross
    }
}

/// Flat social security contributions followed by a flat income tax on the
/// remainder.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProportionalTax {
    pub ssc_rate: f64,
    pub income_tax_rate: f64,
}

impl ProportionalTax {
    pub fn validate(&self) -> ConfigResult<()> {
        let rates = [("ssc_rate", self.ssc_rate), ("income_tax_rate", self.income_tax_rate)];
        for (name, value) in rates {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidRate { name, value });
            }
        }
        Ok(())
    }
}

impl TaxSystem for ProportionalTax {
    fn net_household_income(&self, female_gross: f64, male_gross: f64) -> f64 {
        (female_gross + male_gross) * (1.0 - self.ssc_rate) * (1.0 - self.income_tax_rate)
    }
}

/// Tax schedule selected in the configuration file.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaxSpec {
    Untaxed,
    Proportional(ProportionalTax),
}

impl TaxSpec {
    pub fn validate(&self) -> ConfigResult<()> {
        match self {
            TaxSpec::Untaxed => Ok(()),
            TaxSpec::Proportional(tax) => tax.validate(),
        }
    }
}

impl TaxSystem for TaxSpec {
    fn net_household_income(&self, female_gross: f64, male_gross: f64) -> f64 {
        match self {
            TaxSpec::Untaxed => Untaxed.net_household_income(female_gross, male_gross),
            TaxSpec::Proportional(tax) => tax.net_household_income(female_gross, male_gross),
        }
    }
}

/// Household resources in non-employment: the partner's net income plus a flat
/// (untaxed) benefit.
pub fn non_employment_consumption_resources<T: TaxSystem + ?Sized>(
    tax: &T,
    covariates: &Covariates,
    benefit: f64,
) -> Vec<f64> {
    covariates
        .rows
        .iter()
        .map(|row| tax.net_household_income(0.0, row.male_wage) + benefit)
        .collect()
}

#[inline(always)]
pub fn consumption_utility(consumption: f64, mu: f64) -> f64 {
    consumption.powf(mu) / mu
}

/// Draw-invariant ingredients of the flow utilities of one state.
pub struct FlowUtility<'a> {
    pub tax: &'a (dyn TaxSystem + Sync),
    pub mu: f64,
    pub log_wage_systematic: f64,
    pub non_consumption_utilities: [f64; NUM_CHOICES],
    pub covariates: &'a CovariateRow,
    /// Child care costs of part-time and full-time work for this state.
    pub child_care_costs: [f64; 2],
    pub non_employment_resources: f64,
}

impl FlowUtility<'_> {
    #[inline(always)]
    fn utility_of_resources(&self, resources: f64, choice: usize) -> f64 {
        let consumption = resources.max(CONSUMPTION_FLOOR) / self.covariates.equivalence_scale;
        consumption_utility(consumption, self.mu) * self.non_consumption_utilities[choice]
    }

    /// Flow utility of non-employment, which does not depend on the wage shock.
    #[inline(always)]
    pub fn non_employment(&self) -> f64 {
        let resources = self.non_employment_resources + self.covariates.child_benefits;
        self.utility_of_resources(resources, CHOICE_NON_EMPLOYMENT)
    }

    /// Flow utility of employment choice `choice` (part-time or full-time)
    /// under log-wage shock `draw`.
    #[inline(always)]
    pub fn employment(&self, choice: usize, draw: f64) -> f64 {
        debug_assert!(choice != CHOICE_NON_EMPLOYMENT);
        let female_gross = HOURS[choice] * (self.log_wage_systematic + draw).exp();
        let resources = self
            .tax
            .net_household_income(female_gross, self.covariates.male_wage)
            + self.covariates.child_benefits
            - self.child_care_costs[choice - 1];
        self.utility_of_resources(resources, choice)
    }

    /// Flow utilities of all choices under `draw`.
    pub fn evaluate(&self, draw: f64) -> [f64; NUM_CHOICES] {
        [
            self.non_employment(),
            self.employment(CHOICE_PART_TIME, draw),
            self.employment(CHOICE_FULL_TIME, draw),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(male_wage: f64, child_bin: usize) -> CovariateRow {
        CovariateRow {
            child_bin,
            male_wage,
            equivalence_scale: 1.0,
            child_benefits: 0.0,
        }
    }

    #[test]
    fn test_proportional_tax() {
        let tax = ProportionalTax {
            ssc_rate: 0.2,
            income_tax_rate: 0.25,
        };
        assert!((tax.net_household_income(100.0, 60.0) - 96.0).abs() < 1e-12);
        assert!(tax.validate().is_ok());
        let bad = ProportionalTax {
            ssc_rate: 1.5,
            income_tax_rate: 0.0,
        };
        assert_eq!(
            bad.validate(),
            Err(ConfigError::InvalidRate {
                name: "ssc_rate",
                value: 1.5
            })
        );
        let bad = ProportionalTax {
            ssc_rate: 0.1,
            income_tax_rate: f64::NAN,
        };
        assert!(matches!(
            bad.validate(),
            Err(ConfigError::InvalidRate {
                name: "income_tax_rate",
                ..
            })
        ));
    }

    #[test]
    fn test_tax_spec_deserializes() {
        let json = r#"{"kind": "proportional", "ssc_rate": 0.2, "income_tax_rate": 0.1}"#;
        let spec: TaxSpec = serde_json::from_str(json).unwrap();
        assert_eq!(
            spec,
            TaxSpec::Proportional(ProportionalTax {
                ssc_rate: 0.2,
                income_tax_rate: 0.1
            })
        );
        let spec: TaxSpec = serde_json::from_str(r#"{"kind": "untaxed"}"#).unwrap();
        assert_eq!(spec, TaxSpec::Untaxed);
    }

    #[test]
    fn test_non_employment_resources() {
        let covariates = Covariates {
            rows: vec![row(0.0, 0), row(10.0, 0)],
        };
        let resources = non_employment_consumption_resources(&Untaxed, &covariates, 2.0);
        assert_eq!(resources, vec![2.0, 12.0]);
    }

    #[test]
    fn test_flow_utilities() {
        let cov = row(0.0, 1);
        let flow = FlowUtility {
            tax: &Untaxed,
            mu: -1.0,
            log_wage_systematic: 0.0,
            non_consumption_utilities: [1.0, 2.0, 1.0],
            covariates: &cov,
            child_care_costs: [8.0, 18.0],
            non_employment_resources: 5.0,
        };
        let u = flow.evaluate(0.0);
        // c = 5 → -1/5
        assert!((u[0] + 0.2).abs() < 1e-12);
        // c = 18 - 8 = 10 → -1/10 · 2
        assert!((u[1] + 0.2).abs() < 1e-12);
        // c = 38 - 18 = 20 → -1/20
        assert!((u[2] + 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_consumption_is_floored() {
        let cov = row(0.0, 1);
        let flow = FlowUtility {
            tax: &Untaxed,
            mu: 0.5,
            log_wage_systematic: 0.0,
            non_consumption_utilities: [1.0; NUM_CHOICES],
            covariates: &cov,
            child_care_costs: [100.0, 100.0],
            non_employment_resources: 0.0,
        };
        let u = flow.evaluate(0.0);
        assert!(u.iter().all(|v| v.is_finite()));
        assert!(u[1] > 0.0 && u[1] < 1e-6);
    }
}
