//! JSON model configuration.
//!
//! ```json
//! {
//!   "model":     { "num_periods": 10, "educ_years": [0, 2, 4], ... },
//!   "utility":   { "gamma_0": [...], "gamma_1": [...], ... },
//!   "tax":       { "kind": "proportional", "ssc_rate": 0.2, "income_tax_rate": 0.15 },
//!   "exogenous": { "prob_child": [[...]], "prob_partner": [[[[0.9, 0.1], [0.1, 0.9]]]] }
//! }
//! ```

use std::fs;

use serde::{Deserialize, Serialize};

use crate::budget::TaxSpec;
use crate::error::{ConfigError, ConfigResult};
use crate::exogenous::{ExogenousProcesses, ExogenousTables};
use crate::model_spec::ModelSpec;
use crate::utility::MincerUtility;

fn default_tax() -> TaxSpec {
    TaxSpec::Untaxed
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model: ModelSpec,
    pub utility: MincerUtility,
    #[serde(default = "default_tax")]
    pub tax: TaxSpec,
    pub exogenous: ExogenousTables,
}

impl ModelConfig {
    pub fn from_json_str(path: &str, json: &str) -> ConfigResult<Self> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Read and parse `path`. The result is not validated yet.
    pub fn from_json_file(path: &str) -> ConfigResult<Self> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(path, &json)
    }

    /// Validate every section and build the exogenous processes.
    pub fn validate(&self) -> ConfigResult<ExogenousProcesses> {
        self.model.validate()?;
        self.utility.validate(&self.model)?;
        self.tax.validate()?;
        ExogenousProcesses::new(&self.model, &self.exogenous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::ProportionalTax;
    use crate::exogenous::tests::constant_tables;
    use crate::model_spec::tests::small_spec;
    use crate::utility::tests::reference_utility;

    fn sample_config() -> ModelConfig {
        let model = small_spec();
        ModelConfig {
            utility: reference_utility(&model),
            tax: TaxSpec::Proportional(ProportionalTax {
                ssc_rate: 0.2,
                income_tax_rate: 0.15,
            }),
            exogenous: constant_tables(&model, 0.1),
            model,
        }
    }

    #[test]
    fn test_json_round_trip() {
        let config = sample_config();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed = ModelConfig::from_json_str("inline", &json).unwrap();
        assert_eq!(parsed, config);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_tax_defaults_to_untaxed() {
        let mut value = serde_json::to_value(sample_config()).unwrap();
        value.as_object_mut().unwrap().remove("tax");
        let parsed: ModelConfig = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.tax, TaxSpec::Untaxed);
    }

    #[test]
    fn test_parse_error_names_path() {
        let err = ModelConfig::from_json_str("broken.json", "{ not json").unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => assert_eq!(path, "broken.json"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err =
            ModelConfig::from_json_file("/tmp/nonexistent_lifecycle_config.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_validate_rejects_mis_sized_exogenous_tables() {
        let mut config = sample_config();
        config.exogenous.prob_child.pop();
        assert!(matches!(config.validate(), Err(ConfigError::ShapeMismatch { .. })));
    }
}
