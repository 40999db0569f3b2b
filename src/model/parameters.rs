//! Defines the `ModelParameters` struct, which represents the contents of `model.toml`.
use crate::input::{input_err_msg, read_toml};
use crate::units::Irradiance;
use anyhow::{Context, Result, ensure};
use log::warn;
use serde::Deserialize;
use serde_string_enum::DeserializeLabeledStringEnum;
use std::path::Path;

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

/// Standard test condition irradiance (W/m²)
pub const STANDARD_IRRADIANCE: Irradiance = Irradiance::new(1000.0);

/// Recycled feedstock lags longer than this are almost certainly a typo
const MAX_SENSIBLE_FEEDSTOCK_LAG: u32 = 10;

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_param_default!(default_irradiance_stc, Irradiance, STANDARD_IRRADIANCE);
define_param_default!(default_recycled_feedstock_lag, u32, 0);

/// Represents the contents of the entire model file.
#[derive(Debug, Deserialize, PartialEq)]
pub struct ModelParameters {
    /// Irradiance at standard test conditions, used to convert between power and area
    #[serde(default = "default_irradiance_stc")]
    pub irradiance_stc: Irradiance,
    /// How the yearly share of failing modules is derived from the Weibull CDF
    #[serde(default)]
    pub failure_model: FailureModel,
    /// Which count of years is used as the exponent for power degradation
    #[serde(default)]
    pub degradation_basis: DegradationBasis,
    /// How empty or NaN values in input files are treated
    #[serde(default)]
    pub missing_values: MissingValuePolicy,
    /// Years between end-of-life material being recycled and it offsetting virgin demand
    #[serde(default = "default_recycled_feedstock_lag")]
    pub recycled_feedstock_lag: u32,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            irradiance_stc: default_irradiance_stc(),
            failure_model: FailureModel::default(),
            degradation_basis: DegradationBasis::default(),
            missing_values: MissingValuePolicy::default(),
            recycled_feedstock_lag: default_recycled_feedstock_lag(),
        }
    }
}

/// How the share of a cohort failing in a given year is calculated
#[derive(DeserializeLabeledStringEnum, Debug, PartialEq, Clone, Copy, Default)]
pub enum FailureModel {
    /// Surviving modules fail with the conditional probability of failing during the year, so
    /// that a cohort's active area follows `1 - F(age)` in the absence of repair and repowering
    #[default]
    #[string = "hazard"]
    Hazard,
    /// Each year, the surviving area is reduced by the cumulative failure fraction at its age
    #[string = "cumulative"]
    Cumulative,
}

/// The count of years used as the exponent when compounding power degradation
#[derive(DeserializeLabeledStringEnum, Debug, PartialEq, Clone, Copy, Default)]
pub enum DegradationBasis {
    /// Years since installation
    #[default]
    #[string = "calendar_age"]
    CalendarAge,
    /// Years since installation in which the cohort's failure CDF was non-zero
    #[string = "active_years"]
    ActiveYears,
}

/// How empty or NaN numeric values in input files are treated
#[derive(DeserializeLabeledStringEnum, Debug, PartialEq, Clone, Copy, Default)]
pub enum MissingValuePolicy {
    /// Reject the input file
    #[default]
    #[string = "error"]
    Error,
    /// Treat the value as zero
    #[string = "zero"]
    Zero,
}

/// Check that the `irradiance_stc` parameter is valid
fn check_irradiance_stc(value: Irradiance) -> Result<()> {
    ensure!(
        value.is_finite() && value > Irradiance(0.0),
        "irradiance_stc must be a finite number greater than zero"
    );

    Ok(())
}

impl ModelParameters {
    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        let model_params: ModelParameters = read_toml(&file_path)?;

        model_params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(model_params)
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        check_irradiance_stc(self.irradiance_stc)?;

        if self.recycled_feedstock_lag > MAX_SENSIBLE_FEEDSTOCK_LAG {
            warn!(
                "recycled_feedstock_lag is {} years. Recycled material will offset virgin demand \
                long after it is recovered.",
                self.recycled_feedstock_lag
            );
        }

        if self.missing_values == MissingValuePolicy::Zero {
            warn!("Empty and NaN values in input files will be treated as zero");
        }

        Ok(())
    }
}
