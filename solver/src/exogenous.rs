//! Exogenous stochastic processes: child arrival and partner transitions.
//!
//! The probabilities are estimated outside this crate and handed over as
//! nested tables; [`ExogenousProcesses::new`] checks their shape and range and
//! flattens them for O(1) lookup by `(period, educ_level[, partner])`.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{ConfigError, ConfigResult};
use crate::model_spec::ModelSpec;

/// Raw tables as delivered by the exogenous-process estimation.
///
/// - `prob_child[period][educ_level]`: probability that a child arrives
///   between `period` and `period + 1`.
/// - `prob_partner[period][educ_level][status]`: distribution of next-period
///   partner status `[P(absent), P(present)]` given current `status`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExogenousTables {
    pub prob_child: Vec<Vec<f64>>,
    pub prob_partner: Vec<Vec<[[f64; NUM_PARTNER_STATES]; NUM_PARTNER_STATES]>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExogenousProcesses {
    num_educ_levels: usize,
    prob_child: Vec<f64>,
    prob_partner: Vec<[f64; NUM_PARTNER_STATES]>,
}

fn check_probability(name: &'static str, index: usize, value: f64) -> ConfigResult<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidProbability { name, index, value })
    }
}

fn check_len(name: &'static str, expected: usize, actual: usize) -> ConfigResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(ConfigError::ShapeMismatch {
            name,
            expected,
            actual,
        })
    }
}

impl ExogenousProcesses {
    /// Validate and flatten the raw tables.
    ///
    /// Child-arrival probabilities of periods whose successor lies beyond
    /// `last_child_bearing_period` are set to zero: no newborn state exists
    /// there.
    pub fn new(spec: &ModelSpec, tables: &ExogenousTables) -> ConfigResult<Self> {
        let num_periods = spec.num_periods;
        let num_educ_levels = spec.num_educ_levels();

        check_len("prob_child", num_periods, tables.prob_child.len())?;
        check_len("prob_partner", num_periods, tables.prob_partner.len())?;

        let mut prob_child = Vec::with_capacity(num_periods * num_educ_levels);
        let mut prob_partner =
            Vec::with_capacity(num_periods * num_educ_levels * NUM_PARTNER_STATES);

        for period in 0..num_periods {
            let child_row = &tables.prob_child[period];
            check_len("prob_child[period]", num_educ_levels, child_row.len())?;
            let partner_row = &tables.prob_partner[period];
            check_len("prob_partner[period]", num_educ_levels, partner_row.len())?;

            for level in 0..num_educ_levels {
                let flat = period * num_educ_levels + level;
                let p = child_row[level];
                check_probability("prob_child", flat, p)?;
                prob_child.push(if period + 1 > spec.last_child_bearing_period {
                    0.0
                } else {
                    p
                });

                for status in 0..NUM_PARTNER_STATES {
                    let row = partner_row[level][status];
                    for (k, &q) in row.iter().enumerate() {
                        let index = (flat * NUM_PARTNER_STATES + status) * NUM_PARTNER_STATES + k;
                        check_probability("prob_partner", index, q)?;
                    }
                    let sum: f64 = row.iter().sum();
                    if (sum - 1.0).abs() > 1e-6 {
                        return Err(ConfigError::PartnerRowNotNormalized {
                            period,
                            level,
                            status,
                            sum,
                        });
                    }
                    prob_partner.push(row);
                }
            }
        }

        Ok(Self {
            num_educ_levels,
            prob_child,
            prob_partner,
        })
    }

    /// Probability of a child arrival between `period` and `period + 1`.
    #[inline(always)]
    pub fn prob_child(&self, period: usize, educ_level: usize) -> f64 {
        self.prob_child[period * self.num_educ_levels + educ_level]
    }

    /// Next-period partner status distribution given the current `status`.
    #[inline(always)]
    pub fn prob_partner(
        &self,
        period: usize,
        educ_level: usize,
        status: usize,
    ) -> &[f64; NUM_PARTNER_STATES] {
        let cell = period * self.num_educ_levels + educ_level;
        &self.prob_partner[cell * NUM_PARTNER_STATES + status]
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model_spec::tests::small_spec;

    /// Constant tables: child arrival `p_child`, partner keeps status w.p. 0.9.
    pub(crate) fn constant_tables(spec: &ModelSpec, p_child: f64) -> ExogenousTables {
        let levels = spec.num_educ_levels();
        ExogenousTables {
            prob_child: vec![vec![p_child; levels]; spec.num_periods],
            prob_partner: vec![vec![[[0.9, 0.1], [0.1, 0.9]]; levels]; spec.num_periods],
        }
    }

    #[test]
    fn test_lookup() {
        let spec = small_spec();
        let exog = ExogenousProcesses::new(&spec, &constant_tables(&spec, 0.3)).unwrap();
        assert_eq!(exog.prob_child(0, 2), 0.3);
        assert_eq!(exog.prob_partner(1, 1, 1), &[0.1, 0.9]);
    }

    #[test]
    fn test_child_probability_masked_after_last_child_bearing_period() {
        let spec = small_spec();
        let exog = ExogenousProcesses::new(&spec, &constant_tables(&spec, 0.3)).unwrap();
        // last_child_bearing_period = 3: arrivals into period 4 are impossible.
        assert_eq!(exog.prob_child(2, 0), 0.3);
        assert_eq!(exog.prob_child(3, 0), 0.0);
        assert_eq!(exog.prob_child(4, 0), 0.0);
    }

    #[test]
    fn test_rejects_wrong_period_count() {
        let spec = small_spec();
        let mut tables = constant_tables(&spec, 0.3);
        tables.prob_child.pop();
        assert_eq!(
            ExogenousProcesses::new(&spec, &tables).unwrap_err(),
            ConfigError::ShapeMismatch {
                name: "prob_child",
                expected: 5,
                actual: 4
            }
        );
    }

    #[test]
    fn test_rejects_unnormalized_partner_row() {
        let spec = small_spec();
        let mut tables = constant_tables(&spec, 0.3);
        tables.prob_partner[2][1][0] = [0.5, 0.4];
        assert!(matches!(
            ExogenousProcesses::new(&spec, &tables),
            Err(ConfigError::PartnerRowNotNormalized {
                period: 2,
                level: 1,
                status: 0,
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_negative_probability() {
        let spec = small_spec();
        let mut tables = constant_tables(&spec, 0.3);
        tables.prob_child[1][0] = -0.1;
        assert!(matches!(
            ExogenousProcesses::new(&spec, &tables),
            Err(ConfigError::InvalidProbability { name: "prob_child", .. })
        ));
    }
}
