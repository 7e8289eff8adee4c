//! Monte Carlo panel of log-wage shocks used to integrate out the wage
//! disturbance in the EMAX computation.
//!
//! The panel is an explicit immutable buffer of `num_periods × num_draws`
//! values. Row `t` is shared by every state of period `t`, which makes the
//! solution reproducible and independent of how states are scheduled.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::{ConfigError, ConfigResult};

#[derive(Clone, Debug, PartialEq)]
pub struct DrawPanel {
    num_periods: usize,
    num_draws: usize,
    values: Vec<f64>,
}

impl DrawPanel {
    /// Wrap a pre-generated row-major buffer.
    pub fn from_values(
        num_periods: usize,
        num_draws: usize,
        values: Vec<f64>,
    ) -> ConfigResult<Self> {
        if num_draws == 0 {
            return Err(ConfigError::NoDraws);
        }
        if values.len() != num_periods * num_draws {
            return Err(ConfigError::ShapeMismatch {
                name: "draw panel",
                expected: num_periods * num_draws,
                actual: values.len(),
            });
        }
        if let Some(&value) = values.iter().find(|v| !v.is_finite()) {
            return Err(ConfigError::NonFinite {
                name: "draw panel",
                value,
            });
        }
        Ok(Self {
            num_periods,
            num_draws,
            values,
        })
    }

    /// Draw `N(0, shock_sd²)` shocks by inverting the normal CDF on uniforms
    /// from a seeded generator. A zero standard deviation yields a panel of
    /// zeros.
    pub fn generate(
        seed: u64,
        num_periods: usize,
        num_draws: usize,
        shock_sd: f64,
    ) -> ConfigResult<Self> {
        if !shock_sd.is_finite() || shock_sd < 0.0 {
            return Err(ConfigError::InvalidShockSd(shock_sd));
        }
        let len = num_periods * num_draws;
        if shock_sd == 0.0 {
            return Self::from_values(num_periods, num_draws, vec![0.0; len]);
        }

        let normal = Normal::new(0.0, shock_sd).map_err(|_| ConfigError::InvalidShockSd(shock_sd))?;
        let mut rng = SmallRng::seed_from_u64(seed);
        let values = (0..len)
            .map(|_| normal.inverse_cdf(rng.random_range(f64::MIN_POSITIVE..1.0)))
            .collect();
        Self::from_values(num_periods, num_draws, values)
    }

    pub fn num_periods(&self) -> usize {
        self.num_periods
    }

    pub fn num_draws(&self) -> usize {
        self.num_draws
    }

    /// Shocks of period `period`.
    #[inline(always)]
    pub fn period(&self, period: usize) -> &[f64] {
        &self.values[period * self.num_draws..(period + 1) * self.num_draws]
    }
}
