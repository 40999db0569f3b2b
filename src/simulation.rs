//! Functionality for running the mass flow simulation.
use crate::material::MaterialID;
use crate::model::Model;
use crate::output::DataWriter;
use crate::output::metadata::write_metadata;
use crate::scenario::{Scenario, ScenarioID};
use crate::units::{Area, Power};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::{debug, info};
use std::path::Path;

pub mod cohort;
pub mod eol;
use eol::{MaterialYearFlows, ModuleDisposition, route_material};
pub mod projection;
use projection::{cohort_power, installed_area};
pub mod survival;
use survival::{CohortSurvival, SurvivalOptions, simulate_cohorts};

/// Module-level flows for a single year of a scenario
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleYearFlows {
    /// Calendar year
    pub year: u32,
    /// Module area installed this year
    pub new_installed_area: Area,
    /// Module area in service
    pub active_area: Area,
    /// Effective power of all modules in service
    pub installed_capacity: Power,
    /// Area which would have failed but was repaired
    pub area_repaired: Area,
    /// Area disposed of because of random failure
    pub disposed_by_failure: Area,
    /// Area disposed of on reaching the end of its project lifetime
    pub disposed_by_retirement: Area,
    /// Collection and recycling split of the disposed area
    pub disposition: ModuleDisposition<Area>,
}

impl ModuleYearFlows {
    /// Total area disposed of this year
    pub fn disposed(&self) -> Area {
        self.disposed_by_failure + self.disposed_by_retirement
    }
}

/// The results of simulating a single scenario
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioResults {
    /// The scenario simulated
    pub scenario_id: ScenarioID,
    /// Survival history of every cohort
    pub survival: CohortSurvival,
    /// Module-level flows for each year
    pub module_flows: Vec<ModuleYearFlows>,
    /// Flows of each material for each year
    pub material_flows: IndexMap<MaterialID, Vec<MaterialYearFlows>>,
}

/// Simulate a single scenario for every material in the model.
///
/// # Arguments
///
/// * `model` - The model containing the scenario
/// * `scenario` - The scenario to simulate
pub fn simulate_scenario(model: &Model, scenario: &Scenario) -> Result<ScenarioResults> {
    let parameters = &model.parameters;
    let options = SurvivalOptions {
        failure_model: parameters.failure_model,
        degradation_basis: parameters.degradation_basis,
    };

    let new_installed_area = installed_area(scenario, parameters.irradiance_stc)?;
    let survival = simulate_cohorts(scenario, &new_installed_area, &options)?;
    let power = cohort_power(scenario, &survival, parameters.irradiance_stc).year_totals();
    let active_area = survival.active_area.year_totals();
    let repaired = survival.repaired.year_totals();
    let disposed_by_failure = survival.disposed_by_failure.year_totals();
    let disposed_by_retirement = survival.disposed_by_retirement.year_totals();

    let module_flows = scenario
        .iter_years()
        .enumerate()
        .map(|(index, (year, module_parameters))| {
            let disposed = disposed_by_failure[index] + disposed_by_retirement[index];
            ModuleYearFlows {
                year,
                new_installed_area: new_installed_area[index],
                active_area: active_area[index],
                installed_capacity: power[index],
                area_repaired: repaired[index],
                disposed_by_failure: disposed_by_failure[index],
                disposed_by_retirement: disposed_by_retirement[index],
                disposition: ModuleDisposition::route(disposed, module_parameters),
            }
        })
        .collect();

    let mut material_flows = IndexMap::new();
    for material in model.iter_materials() {
        debug!("Routing {} for scenario {}", material.id, scenario.id);
        let flows = route_material(
            scenario,
            &survival,
            &new_installed_area,
            material.parameters_for(&scenario.id)?,
            parameters.recycled_feedstock_lag,
        )
        .with_context(|| format!("Error routing material {}", material.id))?;
        material_flows.insert(material.id.clone(), flows);
    }

    Ok(ScenarioResults {
        scenario_id: scenario.id.clone(),
        survival,
        module_flows,
        material_flows,
    })
}

/// Run the simulation.
///
/// # Arguments:
///
/// * `model` - The model to run
/// * `output_path` - The folder to which output files will be written
/// * `debug_model` - Whether to write additional information (e.g. cohort matrices) to output files
pub fn run(model: &Model, output_path: &Path, debug_model: bool) -> Result<()> {
    write_metadata(output_path, model).context("Failed to save metadata")?;
    let mut writer = DataWriter::create(output_path, debug_model)?;

    for scenario in model.iter_scenarios() {
        info!(
            "Simulating scenario {} ({}-{})",
            scenario.id,
            scenario.years.first().copied().unwrap_or_default(),
            scenario.years.last().copied().unwrap_or_default()
        );

        let results = simulate_scenario(model, scenario)
            .with_context(|| format!("Error simulating scenario {}", scenario.id))?;
        writer.write_scenario(scenario, &results)?;
    }

    writer.flush()?;

    Ok(())
}
