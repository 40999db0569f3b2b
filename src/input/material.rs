//! Code for reading materials and their parameters from CSV files.
use super::*;
use crate::id::{IDCollection, define_id_getter};
use crate::material::{Material, MaterialID, MaterialMap, MaterialParameters};
use crate::scenario::{ScenarioID, ScenarioMap, parse_scenario_str};
use crate::units::MassPerArea;
use indexmap::IndexSet;
use serde::Deserialize;
use std::collections::BTreeMap;

const MATERIALS_FILE_NAME: &str = "materials.csv";
const MATERIAL_PARAMETERS_FILE_NAME: &str = "material_parameters.csv";

#[derive(PartialEq, Debug, Deserialize)]
struct MaterialDescription {
    id: MaterialID,
    description: String,
}
define_id_getter! {MaterialDescription, MaterialID}

#[derive(PartialEq, Debug, Clone, Deserialize)]
struct MaterialParametersRaw {
    material_id: String,
    scenario_id: String,
    year: u32,
    mass_per_area: Option<f64>,
    mat_virgin_eff: Option<f64>,
    mat_mfg_eff: Option<f64>,
    mat_mfg_scrap_recycled: Option<f64>,
    mat_mfg_scrap_recycling_eff: Option<f64>,
    mat_mfg_scrap_recycled_into_hq: Option<f64>,
    mat_mfg_scrap_hq_reused_for_mfg: Option<f64>,
    mat_eol_collected_recycled: Option<f64>,
    mat_eol_recycling_eff: Option<f64>,
    mat_eol_recycled_into_hq: Option<f64>,
    mat_eol_hq_reused_for_mfg: Option<f64>,
}

impl MaterialParametersRaw {
    /// Validate the row and convert it into [`MaterialParameters`]
    fn to_parameters(&self, policy: MissingValuePolicy) -> Result<MaterialParameters> {
        let value = |value, column| resolve_missing(value, column, policy);
        let percentage = |value: Option<f64>, column| {
            check_percentage(resolve_missing(value, column, policy)?, column)
        };

        Ok(MaterialParameters {
            mass_per_area: MassPerArea(check_non_negative(
                value(self.mass_per_area, "mass_per_area")?,
                "mass_per_area",
            )?),
            virgin_efficiency: check_yield(
                value(self.mat_virgin_eff, "mat_virgin_eff")?,
                "mat_virgin_eff",
            )?,
            manufacturing_efficiency: check_yield(
                value(self.mat_mfg_eff, "mat_mfg_eff")?,
                "mat_mfg_eff",
            )?,
            scrap_recycled: percentage(self.mat_mfg_scrap_recycled, "mat_mfg_scrap_recycled")?,
            scrap_recycling_efficiency: percentage(
                self.mat_mfg_scrap_recycling_eff,
                "mat_mfg_scrap_recycling_eff",
            )?,
            scrap_recycled_into_hq: percentage(
                self.mat_mfg_scrap_recycled_into_hq,
                "mat_mfg_scrap_recycled_into_hq",
            )?,
            scrap_hq_reused_for_manufacturing: percentage(
                self.mat_mfg_scrap_hq_reused_for_mfg,
                "mat_mfg_scrap_hq_reused_for_mfg",
            )?,
            eol_collected_recycled: percentage(
                self.mat_eol_collected_recycled,
                "mat_eol_collected_recycled",
            )?,
            eol_recycling_efficiency: percentage(
                self.mat_eol_recycling_eff,
                "mat_eol_recycling_eff",
            )?,
            eol_recycled_into_hq: percentage(
                self.mat_eol_recycled_into_hq,
                "mat_eol_recycled_into_hq",
            )?,
            eol_hq_reused_for_manufacturing: percentage(
                self.mat_eol_hq_reused_for_mfg,
                "mat_eol_hq_reused_for_mfg",
            )?,
        })
    }
}

/// Read materials and their parameters from the model directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `scenarios` - All scenarios in the model
/// * `policy` - How to treat empty or NaN numeric values
///
/// # Returns
///
/// A map of materials, each with a parameter time series for every scenario.
pub fn read_materials(
    model_dir: &Path,
    scenarios: &ScenarioMap,
    policy: MissingValuePolicy,
) -> Result<MaterialMap> {
    let descriptions: IndexMap<MaterialID, MaterialDescription> =
        read_csv_id_file(&model_dir.join(MATERIALS_FILE_NAME))?;

    let file_path = model_dir.join(MATERIAL_PARAMETERS_FILE_NAME);
    let iter = read_csv::<MaterialParametersRaw>(&file_path)?;
    read_materials_from_iter(iter, descriptions, scenarios, policy)
        .with_context(|| input_err_msg(&file_path))
}

fn read_materials_from_iter<I>(
    iter: I,
    descriptions: IndexMap<MaterialID, MaterialDescription>,
    scenarios: &ScenarioMap,
    policy: MissingValuePolicy,
) -> Result<MaterialMap>
where
    I: Iterator<Item = MaterialParametersRaw>,
{
    let scenario_ids: IndexSet<ScenarioID> = scenarios.keys().cloned().collect();
    let mut rows: IndexMap<(MaterialID, ScenarioID), BTreeMap<u32, MaterialParameters>> =
        IndexMap::new();

    for raw in iter {
        let material_id = descriptions.get_id(&raw.material_id)?;
        let year = raw.year;
        let parameters = raw.to_parameters(policy).with_context(|| {
            format!("Invalid parameters for material {material_id} in {year}")
        })?;

        for scenario_id in parse_scenario_str(&raw.scenario_id, &scenario_ids)? {
            let series = rows
                .entry((material_id.clone(), scenario_id.clone()))
                .or_default();
            ensure!(
                series.insert(year, parameters.clone()).is_none(),
                "More than one set of parameters provided for material {material_id}, \
                scenario {scenario_id} and year {year}"
            );
        }
    }

    descriptions
        .into_values()
        .map(|description| {
            let mut parameters = IndexMap::new();
            for scenario in scenarios.values() {
                let series = rows
                    .swap_remove(&(description.id.clone(), scenario.id.clone()))
                    .with_context(|| {
                        format!(
                            "Material {} has no parameters for scenario {}",
                            description.id, scenario.id
                        )
                    })?;
                ensure!(
                    series.keys().copied().eq(scenario.years.iter().copied()),
                    "Misaligned time series for material {} and scenario {}: parameters must be \
                    given for every year from {} to {}",
                    description.id,
                    scenario.id,
                    scenario.years.first().copied().unwrap_or_default(),
                    scenario.years.last().copied().unwrap_or_default()
                );
                parameters.insert(scenario.id.clone(), series.into_values().collect());
            }

            let material = Material {
                id: description.id,
                description: description.description,
                parameters,
            };
            Ok((material.id.clone(), material))
        })
        .collect()
}
