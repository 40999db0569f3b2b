//! The module responsible for writing output data to disk.
use crate::material::MaterialID;
use crate::scenario::{Scenario, ScenarioID};
use crate::simulation::eol::MaterialYearFlows;
use crate::simulation::{ModuleYearFlows, ScenarioResults};
use crate::units::{Area, Mass, Power};
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

pub mod metadata;

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "pvflow_results";

/// The output file name for module-level flows
const MODULE_FLOWS_FILE_NAME: &str = "module_flows.csv";

/// The output file name for material flows
const MATERIAL_FLOWS_FILE_NAME: &str = "material_flows.csv";

/// The output file name for totals over all materials
const SCENARIO_TOTALS_FILE_NAME: &str = "scenario_totals.csv";

/// The output file name for fitted reliability parameters
const WEIBULL_PARAMS_FILE_NAME: &str = "weibull_params.csv";

/// The output file name for per-cohort survival data
const DEBUG_COHORTS_FILE_NAME: &str = "debug_cohorts.csv";

/// Get the default output directory for the model specified at `model_dir`
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // The folder is named after the model directory
    let model_dir = model_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    // Construct path
    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory.
///
/// If the directory already exists and is not empty, it is only replaced if `allow_overwrite` is
/// true.
///
/// # Returns
///
/// True if an existing directory was overwritten, false otherwise.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwrite = if let Ok(mut entries) = fs::read_dir(output_dir) {
        if entries.next().is_none() {
            // Already exists and is empty
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. Please delete the folder or pass the \
            --overwrite command-line option."
        );

        fs::remove_dir_all(output_dir)?;
        true
    } else {
        false
    };

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// Represents a row in the module flows CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct ModuleFlowsRow {
    scenario_id: ScenarioID,
    year: u32,
    new_installed_area: Area,
    active_area: Area,
    installed_capacity: Power,
    area_repaired: Area,
    area_disposed_by_failure: Area,
    area_disposed_by_retirement: Area,
    area_disposed: Area,
    cumulative_area_disposed_by_failure: Area,
    cumulative_area_disposed_by_retirement: Area,
    cumulative_area_disposed: Area,
    area_collected: Area,
    area_not_collected: Area,
    area_sent_to_recycling: Area,
    area_collected_not_recycled: Area,
}

/// Running totals of disposed module area
#[derive(Default)]
struct CumulativeArea {
    by_failure: Area,
    by_retirement: Area,
}

impl ModuleFlowsRow {
    fn new(scenario_id: &ScenarioID, flows: &ModuleYearFlows, cumulative: &CumulativeArea) -> Self {
        Self {
            scenario_id: scenario_id.clone(),
            year: flows.year,
            new_installed_area: flows.new_installed_area,
            active_area: flows.active_area,
            installed_capacity: flows.installed_capacity,
            area_repaired: flows.area_repaired,
            area_disposed_by_failure: flows.disposed_by_failure,
            area_disposed_by_retirement: flows.disposed_by_retirement,
            area_disposed: flows.disposed(),
            cumulative_area_disposed_by_failure: cumulative.by_failure,
            cumulative_area_disposed_by_retirement: cumulative.by_retirement,
            cumulative_area_disposed: cumulative.by_failure + cumulative.by_retirement,
            area_collected: flows.disposition.collected,
            area_not_collected: flows.disposition.not_collected,
            area_sent_to_recycling: flows.disposition.sent_to_recycling,
            area_collected_not_recycled: flows.disposition.collected_not_recycled,
        }
    }
}

/// Represents a row in the material flows CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct MaterialFlowsRow {
    scenario_id: ScenarioID,
    material_id: MaterialID,
    year: u32,
    active_mass: Mass,
    mass_disposed: Mass,
    mass_collected: Mass,
    mass_not_collected: Mass,
    mass_in_modules_sent_to_recycling: Mass,
    mass_collected_not_recycled: Mass,
    eol_sent_to_recycling: Mass,
    eol_not_sent_to_recycling: Mass,
    eol_recycled: Mass,
    eol_recycling_losses: Mass,
    eol_high_quality: Mass,
    eol_other_quality: Mass,
    eol_hq_into_manufacturing: Mass,
    eol_hq_into_other_uses: Mass,
    mass_in_new_modules: Mass,
    entering_module_manufacturing: Mass,
    lost_in_module_manufacturing: Mass,
    manufacturing_input: Mass,
    scrap: Mass,
    scrap_sent_to_recycling: Mass,
    scrap_not_sent_to_recycling: Mass,
    scrap_recycled: Mass,
    scrap_recycling_losses: Mass,
    scrap_high_quality: Mass,
    scrap_other_quality: Mass,
    scrap_hq_into_manufacturing: Mass,
    scrap_hq_into_other_uses: Mass,
    recycled_feedstock: Mass,
    virgin_stock: Mass,
    virgin_stock_raw: Mass,
    landfilled_eol_collection_losses: Mass,
    landfilled_eol_recycling_losses: Mass,
    landfilled_manufacturing_scrap: Mass,
    total_landfilled: Mass,
    total_other_uses: Mass,
    total_reused_for_manufacturing: Mass,
    cumulative_mass_disposed: Mass,
    cumulative_mass_collected: Mass,
    cumulative_mass_not_collected: Mass,
    cumulative_mass_in_modules_sent_to_recycling: Mass,
    cumulative_eol_recycled: Mass,
    cumulative_eol_hq_into_manufacturing: Mass,
    cumulative_scrap: Mass,
    cumulative_scrap_recycled: Mass,
    cumulative_scrap_hq_into_manufacturing: Mass,
    cumulative_virgin_stock: Mass,
    cumulative_virgin_stock_raw: Mass,
    cumulative_landfilled_eol_collection_losses: Mass,
    cumulative_landfilled_eol_recycling_losses: Mass,
    cumulative_landfilled_manufacturing_scrap: Mass,
    cumulative_landfilled: Mass,
    cumulative_other_uses: Mass,
    cumulative_reused_for_manufacturing: Mass,
}

/// Running totals of a material's flows
#[derive(Default, Clone, Copy)]
struct CumulativeMass {
    disposed: Mass,
    collected: Mass,
    not_collected: Mass,
    in_modules_sent_to_recycling: Mass,
    eol_recycled: Mass,
    eol_hq_into_manufacturing: Mass,
    scrap: Mass,
    scrap_recycled: Mass,
    scrap_hq_into_manufacturing: Mass,
    virgin_stock: Mass,
    virgin_stock_raw: Mass,
    eol_collection_losses: Mass,
    eol_recycling_losses: Mass,
    manufacturing_scrap_landfilled: Mass,
    landfilled: Mass,
    other_uses: Mass,
    reused_for_manufacturing: Mass,
}

impl CumulativeMass {
    /// Add a year's flows to the running totals
    fn add(&mut self, flows: &MaterialYearFlows) {
        let eol = &flows.end_of_life;
        let mfg = &flows.manufacturing;

        self.disposed += eol.disposed;
        self.collected += eol.modules.collected;
        self.not_collected += eol.modules.not_collected;
        self.in_modules_sent_to_recycling += eol.modules.sent_to_recycling;
        self.eol_recycled += eol.recycling.recycled;
        self.eol_hq_into_manufacturing += eol.recycling.high_quality_into_manufacturing;
        self.scrap += mfg.scrap;
        self.scrap_recycled += mfg.scrap_recycling.recycled;
        self.scrap_hq_into_manufacturing += mfg.scrap_recycling.high_quality_into_manufacturing;
        self.virgin_stock += flows.virgin_stock;
        self.virgin_stock_raw += flows.virgin_stock_raw;
        self.eol_collection_losses += eol.collection_losses();
        self.eol_recycling_losses += eol.recycling_losses();
        self.manufacturing_scrap_landfilled += mfg.landfilled();
        self.landfilled += flows.total_landfilled();
        self.other_uses += flows.total_other_uses();
        self.reused_for_manufacturing += flows.total_reused_for_manufacturing();
    }
}

impl MaterialFlowsRow {
    fn new(
        scenario_id: &ScenarioID,
        material_id: &MaterialID,
        flows: &MaterialYearFlows,
        cumulative: &CumulativeMass,
    ) -> Self {
        let eol = &flows.end_of_life;
        let mfg = &flows.manufacturing;
        let scrap = &mfg.scrap_recycling;

        Self {
            scenario_id: scenario_id.clone(),
            material_id: material_id.clone(),
            year: flows.year,
            active_mass: flows.active_mass,
            mass_disposed: eol.disposed,
            mass_collected: eol.modules.collected,
            mass_not_collected: eol.modules.not_collected,
            mass_in_modules_sent_to_recycling: eol.modules.sent_to_recycling,
            mass_collected_not_recycled: eol.modules.collected_not_recycled,
            eol_sent_to_recycling: eol.recycling.sent_to_recycling,
            eol_not_sent_to_recycling: eol.recycling.not_sent_to_recycling,
            eol_recycled: eol.recycling.recycled,
            eol_recycling_losses: eol.recycling.recycling_losses,
            eol_high_quality: eol.recycling.high_quality,
            eol_other_quality: eol.recycling.other_quality,
            eol_hq_into_manufacturing: eol.recycling.high_quality_into_manufacturing,
            eol_hq_into_other_uses: eol.recycling.high_quality_into_other_uses,
            mass_in_new_modules: mfg.target,
            entering_module_manufacturing: mfg.entering_module_manufacturing,
            lost_in_module_manufacturing: mfg.lost_in_module_manufacturing,
            manufacturing_input: mfg.input,
            scrap: mfg.scrap,
            scrap_sent_to_recycling: scrap.sent_to_recycling,
            scrap_not_sent_to_recycling: scrap.not_sent_to_recycling,
            scrap_recycled: scrap.recycled,
            scrap_recycling_losses: scrap.recycling_losses,
            scrap_high_quality: scrap.high_quality,
            scrap_other_quality: scrap.other_quality,
            scrap_hq_into_manufacturing: scrap.high_quality_into_manufacturing,
            scrap_hq_into_other_uses: scrap.high_quality_into_other_uses,
            recycled_feedstock: flows.recycled_feedstock,
            virgin_stock: flows.virgin_stock,
            virgin_stock_raw: flows.virgin_stock_raw,
            landfilled_eol_collection_losses: eol.collection_losses(),
            landfilled_eol_recycling_losses: eol.recycling_losses(),
            landfilled_manufacturing_scrap: mfg.landfilled(),
            total_landfilled: flows.total_landfilled(),
            total_other_uses: flows.total_other_uses(),
            total_reused_for_manufacturing: flows.total_reused_for_manufacturing(),
            cumulative_mass_disposed: cumulative.disposed,
            cumulative_mass_collected: cumulative.collected,
            cumulative_mass_not_collected: cumulative.not_collected,
            cumulative_mass_in_modules_sent_to_recycling: cumulative.in_modules_sent_to_recycling,
            cumulative_eol_recycled: cumulative.eol_recycled,
            cumulative_eol_hq_into_manufacturing: cumulative.eol_hq_into_manufacturing,
            cumulative_scrap: cumulative.scrap,
            cumulative_scrap_recycled: cumulative.scrap_recycled,
            cumulative_scrap_hq_into_manufacturing: cumulative.scrap_hq_into_manufacturing,
            cumulative_virgin_stock: cumulative.virgin_stock,
            cumulative_virgin_stock_raw: cumulative.virgin_stock_raw,
            cumulative_landfilled_eol_collection_losses: cumulative.eol_collection_losses,
            cumulative_landfilled_eol_recycling_losses: cumulative.eol_recycling_losses,
            cumulative_landfilled_manufacturing_scrap: cumulative.manufacturing_scrap_landfilled,
            cumulative_landfilled: cumulative.landfilled,
            cumulative_other_uses: cumulative.other_uses,
            cumulative_reused_for_manufacturing: cumulative.reused_for_manufacturing,
        }
    }
}

/// Represents a row in the scenario totals CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct ScenarioTotalsRow {
    scenario_id: ScenarioID,
    year: u32,
    active_mass: Mass,
    virgin_stock: Mass,
    landfilled: Mass,
    reused_for_manufacturing: Mass,
}

/// Represents a row in the Weibull parameters CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct WeibullParamsRow {
    scenario_id: ScenarioID,
    installation_year: u32,
    alpha: f64,
    beta: f64,
}

/// Represents a row in the per-cohort debug CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct DebugCohortRow {
    scenario_id: ScenarioID,
    installation_year: u32,
    year: u32,
    active_area: Area,
    disposed_by_failure: Area,
    disposed_by_retirement: Area,
}

/// For writing extra debug information about the model
struct DebugDataWriter {
    cohorts_writer: csv::Writer<File>,
}

impl DebugDataWriter {
    /// Open CSV files to write debug info to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    fn create(output_path: &Path) -> Result<Self> {
        Ok(Self {
            cohorts_writer: csv::Writer::from_path(output_path.join(DEBUG_COHORTS_FILE_NAME))?,
        })
    }

    /// Write the non-zero cells of the cohort matrices to file
    fn write_cohorts(&mut self, scenario: &Scenario, results: &ScenarioResults) -> Result<()> {
        let survival = &results.survival;
        for (cohort, year, active_area) in survival.active_area.iter_cells() {
            let disposed_by_failure = survival.disposed_by_failure.get(cohort, year);
            let disposed_by_retirement = survival.disposed_by_retirement.get(cohort, year);
            if active_area == Area(0.0)
                && disposed_by_failure == Area(0.0)
                && disposed_by_retirement == Area(0.0)
            {
                continue;
            }

            let row = DebugCohortRow {
                scenario_id: scenario.id.clone(),
                installation_year: scenario.years[cohort],
                year: scenario.years[year],
                active_area,
                disposed_by_failure,
                disposed_by_retirement,
            };
            self.cohorts_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Flush the underlying streams
    fn flush(&mut self) -> Result<()> {
        self.cohorts_writer.flush()?;

        Ok(())
    }
}

/// An object for writing simulation results to file
pub struct DataWriter {
    module_flows_writer: csv::Writer<File>,
    material_flows_writer: csv::Writer<File>,
    scenario_totals_writer: csv::Writer<File>,
    weibull_params_writer: csv::Writer<File>,
    debug_writer: Option<DebugDataWriter>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    /// * `save_debug_info` - Whether to include extra CSV files for debugging model
    pub fn create(output_path: &Path, save_debug_info: bool) -> Result<Self> {
        let new_writer = |file_name| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(file_path)
        };

        let debug_writer = if save_debug_info {
            // Create debug CSV files
            Some(DebugDataWriter::create(output_path)?)
        } else {
            None
        };

        Ok(Self {
            module_flows_writer: new_writer(MODULE_FLOWS_FILE_NAME)?,
            material_flows_writer: new_writer(MATERIAL_FLOWS_FILE_NAME)?,
            scenario_totals_writer: new_writer(SCENARIO_TOTALS_FILE_NAME)?,
            weibull_params_writer: new_writer(WEIBULL_PARAMS_FILE_NAME)?,
            debug_writer,
        })
    }

    /// Write all results for a scenario
    pub fn write_scenario(&mut self, scenario: &Scenario, results: &ScenarioResults) -> Result<()> {
        self.write_module_flows(&scenario.id, &results.module_flows)?;
        self.write_material_flows(scenario, results)?;
        self.write_weibull_params(scenario, results)?;
        if let Some(wtr) = &mut self.debug_writer {
            wtr.write_cohorts(scenario, results)?;
        }

        Ok(())
    }

    /// Write module-level flows to a CSV file
    fn write_module_flows(
        &mut self,
        scenario_id: &ScenarioID,
        module_flows: &[ModuleYearFlows],
    ) -> Result<()> {
        let mut cumulative = CumulativeArea::default();
        for flows in module_flows {
            cumulative.by_failure += flows.disposed_by_failure;
            cumulative.by_retirement += flows.disposed_by_retirement;
            let row = ModuleFlowsRow::new(scenario_id, flows, &cumulative);
            self.module_flows_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Write flows of every material, along with totals over all materials, to CSV files
    fn write_material_flows(
        &mut self,
        scenario: &Scenario,
        results: &ScenarioResults,
    ) -> Result<()> {
        let mut totals: Vec<ScenarioTotalsRow> = scenario
            .years
            .iter()
            .map(|&year| ScenarioTotalsRow {
                scenario_id: scenario.id.clone(),
                year,
                active_mass: Mass(0.0),
                virgin_stock: Mass(0.0),
                landfilled: Mass(0.0),
                reused_for_manufacturing: Mass(0.0),
            })
            .collect();

        for (material_id, material_flows) in &results.material_flows {
            let mut cumulative = CumulativeMass::default();
            for (flows, total) in material_flows.iter().zip(totals.iter_mut()) {
                cumulative.add(flows);
                let row = MaterialFlowsRow::new(&scenario.id, material_id, flows, &cumulative);
                self.material_flows_writer.serialize(row)?;

                total.active_mass += flows.active_mass;
                total.virgin_stock += flows.virgin_stock;
                total.landfilled += flows.total_landfilled();
                total.reused_for_manufacturing += flows.total_reused_for_manufacturing();
            }
        }

        for row in totals {
            self.scenario_totals_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Write the fitted reliability parameters of every cohort to a CSV file
    fn write_weibull_params(
        &mut self,
        scenario: &Scenario,
        results: &ScenarioResults,
    ) -> Result<()> {
        let fitted = scenario
            .years
            .iter()
            .zip(&results.survival.weibull_params)
            .filter_map(|(&year, params)| Some((year, (*params)?)));
        for (installation_year, params) in fitted {
            let row = WeibullParamsRow {
                scenario_id: scenario.id.clone(),
                installation_year,
                alpha: params.alpha,
                beta: params.beta,
            };
            self.weibull_params_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.module_flows_writer.flush()?;
        self.material_flows_writer.flush()?;
        self.scenario_totals_writer.flush()?;
        self.weibull_params_writer.flush()?;
        if let Some(wtr) = &mut self.debug_writer {
            wtr.flush()?;
        }

        Ok(())
    }
}
