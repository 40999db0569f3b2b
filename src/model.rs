//! The model represents the static input data provided by the user.
use crate::material::{Material, MaterialMap};
use crate::scenario::{Scenario, ScenarioMap};
use std::path::PathBuf;

pub mod parameters;
pub use parameters::{DegradationBasis, FailureModel, MissingValuePolicy, ModelParameters};

/// Model definition
pub struct Model {
    /// Path to model folder
    pub model_path: PathBuf,
    /// Parameters from the model TOML file
    pub parameters: ModelParameters,
    /// Scenarios to simulate
    pub scenarios: ScenarioMap,
    /// Materials contained in the modules
    pub materials: MaterialMap,
}

impl Model {
    /// Iterate over the model's scenarios
    pub fn iter_scenarios(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.values()
    }

    /// Iterate over the model's materials
    pub fn iter_materials(&self) -> impl Iterator<Item = &Material> {
        self.materials.values()
    }
}
