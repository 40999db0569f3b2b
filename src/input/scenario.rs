//! Code for reading scenarios and their module parameters from CSV files.
use super::*;
use crate::id::{IDCollection, define_id_getter};
use crate::scenario::{ModuleParameters, Scenario, ScenarioID, ScenarioMap};
use crate::units::{Dimensionless, Power};
use crate::year::check_years_contiguous;
use serde::Deserialize;
use std::collections::BTreeMap;

const SCENARIOS_FILE_NAME: &str = "scenarios.csv";
const MODULE_PARAMETERS_FILE_NAME: &str = "module_parameters.csv";

#[derive(PartialEq, Debug, Deserialize)]
struct ScenarioDescription {
    id: ScenarioID,
    description: String,
}
define_id_getter! {ScenarioDescription, ScenarioID}

#[derive(PartialEq, Debug, Deserialize)]
struct ModuleParametersRaw {
    scenario_id: String,
    year: u32,
    new_installed_capacity: Option<f64>,
    mod_eff: Option<f64>,
    mod_reliability_t50: Option<f64>,
    mod_reliability_t90: Option<f64>,
    mod_degradation: Option<f64>,
    mod_lifetime: Option<f64>,
    mod_repair: Option<f64>,
    mod_repowering: Option<f64>,
    mod_mfg_eff: Option<f64>,
    mod_eol_collection_eff: Option<f64>,
    mod_eol_collected_recycled: Option<f64>,
    #[serde(default)]
    bifaciality_factor: Option<f64>,
}

impl ModuleParametersRaw {
    /// Validate the row and convert it into [`ModuleParameters`]
    fn into_parameters(self, policy: MissingValuePolicy) -> Result<ModuleParameters> {
        let value = |value, column| resolve_missing(value, column, policy);

        let capacity = check_non_negative(
            value(self.new_installed_capacity, "new_installed_capacity")?,
            "new_installed_capacity",
        )?;
        let lifetime = value(self.mod_lifetime, "mod_lifetime")?;
        ensure!(
            lifetime >= 1.0 && lifetime.fract() == 0.0 && lifetime <= f64::from(u32::MAX),
            "mod_lifetime must be a whole number of years greater than zero (got {lifetime})"
        );
        let bifaciality_factor = check_non_negative(
            self.bifaciality_factor.filter(|v| !v.is_nan()).unwrap_or(0.0),
            "bifaciality_factor",
        )?;

        Ok(ModuleParameters {
            installed_capacity: Power::from_megawatts(capacity),
            efficiency: check_percentage(value(self.mod_eff, "mod_eff")?, "mod_eff")?,
            reliability_t50: value(self.mod_reliability_t50, "mod_reliability_t50")?,
            reliability_t90: value(self.mod_reliability_t90, "mod_reliability_t90")?,
            degradation: check_percentage(
                value(self.mod_degradation, "mod_degradation")?,
                "mod_degradation",
            )?,
            lifetime: lifetime as u32,
            repair: check_percentage(value(self.mod_repair, "mod_repair")?, "mod_repair")?,
            repowering: check_percentage(
                value(self.mod_repowering, "mod_repowering")?,
                "mod_repowering",
            )?,
            manufacturing_efficiency: check_yield(
                value(self.mod_mfg_eff, "mod_mfg_eff")?,
                "mod_mfg_eff",
            )?,
            collection_efficiency: check_percentage(
                value(self.mod_eol_collection_eff, "mod_eol_collection_eff")?,
                "mod_eol_collection_eff",
            )?,
            collected_recycled: check_percentage(
                value(self.mod_eol_collected_recycled, "mod_eol_collected_recycled")?,
                "mod_eol_collected_recycled",
            )?,
            bifaciality_factor: Dimensionless(bifaciality_factor),
        })
    }
}

/// Read scenarios and their module parameters from the model directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `policy` - How to treat empty or NaN numeric values
///
/// # Returns
///
/// A map of scenarios, in the order they appear in the scenarios file.
pub fn read_scenarios(model_dir: &Path, policy: MissingValuePolicy) -> Result<ScenarioMap> {
    let descriptions: IndexMap<ScenarioID, ScenarioDescription> =
        read_csv_id_file(&model_dir.join(SCENARIOS_FILE_NAME))?;

    let file_path = model_dir.join(MODULE_PARAMETERS_FILE_NAME);
    let iter = read_csv::<ModuleParametersRaw>(&file_path)?;
    read_scenarios_from_iter(iter, descriptions, policy).with_context(|| input_err_msg(&file_path))
}

fn read_scenarios_from_iter<I>(
    iter: I,
    descriptions: IndexMap<ScenarioID, ScenarioDescription>,
    policy: MissingValuePolicy,
) -> Result<ScenarioMap>
where
    I: Iterator<Item = ModuleParametersRaw>,
{
    let mut rows: IndexMap<ScenarioID, BTreeMap<u32, ModuleParameters>> = descriptions
        .keys()
        .map(|id| (id.clone(), BTreeMap::new()))
        .collect();

    for raw in iter {
        let id = descriptions.get_id(&raw.scenario_id)?;
        let year = raw.year;
        let parameters = raw
            .into_parameters(policy)
            .with_context(|| format!("Invalid module parameters for scenario {id} in {year}"))?;

        let series = &mut rows[&id];
        ensure!(
            series.insert(year, parameters).is_none(),
            "More than one set of module parameters provided for scenario {id} in {year}"
        );
    }

    descriptions
        .into_values()
        .map(|description| {
            let series = rows.swap_remove(&description.id).unwrap_or_default();
            ensure!(
                !series.is_empty(),
                "No module parameters provided for scenario {}",
                description.id
            );

            let years = series.keys().copied().collect_vec();
            check_years_contiguous(&years)
                .with_context(|| format!("Invalid years for scenario {}", description.id))?;

            let scenario = Scenario {
                id: description.id,
                description: description.description,
                years,
                module_parameters: series.into_values().collect(),
            };
            Ok((scenario.id.clone(), scenario))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use indexmap::indexmap;
    use rstest::{fixture, rstest};
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[fixture]
    fn descriptions() -> IndexMap<ScenarioID, ScenarioDescription> {
        indexmap! {
            "baseline".into() => ScenarioDescription {
                id: "baseline".into(),
                description: "Business as usual".into(),
            }
        }
    }

    fn raw(year: u32) -> ModuleParametersRaw {
        ModuleParametersRaw {
            scenario_id: "baseline".into(),
            year,
            new_installed_capacity: Some(1.0),
            mod_eff: Some(20.0),
            mod_reliability_t50: Some(25.0),
            mod_reliability_t90: Some(35.0),
            mod_degradation: Some(0.5),
            mod_lifetime: Some(30.0),
            mod_repair: Some(0.0),
            mod_repowering: Some(0.0),
            mod_mfg_eff: Some(100.0),
            mod_eol_collection_eff: Some(50.0),
            mod_eol_collected_recycled: Some(50.0),
            bifaciality_factor: None,
        }
    }

    #[test]
    fn test_into_parameters() {
        let parameters = raw(2020).into_parameters(MissingValuePolicy::Error).unwrap();
        assert_eq!(parameters.installed_capacity, Power(1e6));
        assert_eq!(parameters.lifetime, 30);
        assert_eq!(parameters.bifaciality_factor, Dimensionless(0.0));
    }

    #[rstest]
    #[case(ModuleParametersRaw { mod_lifetime: Some(0.0), ..raw(2020) },
        "mod_lifetime must be a whole number of years greater than zero (got 0)")]
    #[case(ModuleParametersRaw { mod_lifetime: Some(20.5), ..raw(2020) },
        "mod_lifetime must be a whole number of years greater than zero (got 20.5)")]
    #[case(ModuleParametersRaw { mod_repair: Some(120.0), ..raw(2020) },
        "mod_repair must be a percentage between 0 and 100 (got 120)")]
    #[case(ModuleParametersRaw { mod_mfg_eff: Some(0.0), ..raw(2020) },
        "mod_mfg_eff must be greater than 0 and at most 100 (got 0)")]
    #[case(ModuleParametersRaw { new_installed_capacity: Some(-1.0), ..raw(2020) },
        "new_installed_capacity must be a finite, non-negative number (got -1)")]
    #[case(ModuleParametersRaw { mod_eff: None, ..raw(2020) },
        "Missing or NaN value for mod_eff")]
    fn test_into_parameters_invalid(#[case] raw: ModuleParametersRaw, #[case] msg: &str) {
        assert_error!(raw.into_parameters(MissingValuePolicy::Error), msg);
    }

    #[test]
    fn test_into_parameters_missing_as_zero() {
        let raw = ModuleParametersRaw {
            mod_repair: None,
            mod_eol_collection_eff: Some(f64::NAN),
            ..raw(2020)
        };
        let parameters = raw.into_parameters(MissingValuePolicy::Zero).unwrap();
        assert_eq!(parameters.repair, Percent(0.0));
        assert_eq!(parameters.collection_efficiency, Percent(0.0));
    }

    #[rstest]
    fn test_read_scenarios_from_iter(descriptions: IndexMap<ScenarioID, ScenarioDescription>) {
        // Rows may be given in any order
        let rows = [raw(2021), raw(2020), raw(2022)];
        let scenarios =
            read_scenarios_from_iter(rows.into_iter(), descriptions, MissingValuePolicy::Error)
                .unwrap();

        let scenario = &scenarios["baseline"];
        assert_eq!(scenario.description, "Business as usual");
        assert_eq!(scenario.years, [2020, 2021, 2022]);
        assert_eq!(scenario.module_parameters.len(), 3);
    }

    #[rstest]
    #[case(vec![raw(2020), raw(2020)],
        "More than one set of module parameters provided for scenario baseline in 2020")]
    #[case(vec![raw(2020), raw(2022)], "Invalid years for scenario baseline")]
    #[case(vec![], "No module parameters provided for scenario baseline")]
    #[case(vec![ModuleParametersRaw { scenario_id: "other".into(), ..raw(2020) }],
        "Unknown ID other found")]
    fn test_read_scenarios_from_iter_invalid(
        descriptions: IndexMap<ScenarioID, ScenarioDescription>,
        #[case] rows: Vec<ModuleParametersRaw>,
        #[case] msg: &str,
    ) {
        assert_error!(
            read_scenarios_from_iter(rows.into_iter(), descriptions, MissingValuePolicy::Error),
            msg
        );
    }

    #[test]
    fn test_read_scenarios() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(SCENARIOS_FILE_NAME)).unwrap();
            writeln!(file, "id,description\nbaseline,Business as usual").unwrap();

            let mut file = File::create(dir.path().join(MODULE_PARAMETERS_FILE_NAME)).unwrap();
            writeln!(
                file,
                "scenario_id,year,new_installed_capacity,mod_eff,mod_reliability_t50,\
mod_reliability_t90,mod_degradation,mod_lifetime,mod_repair,mod_repowering,mod_mfg_eff,\
mod_eol_collection_eff,mod_eol_collected_recycled
baseline,2020,10,18,25,35,0.7,30,0,0,98,20,80
baseline,2021,12,19,26,36,0.7,30,,0,98,20,80"
            )
            .unwrap();
        }

        // Empty cells are an error by default
        assert!(read_scenarios(dir.path(), MissingValuePolicy::Error).is_err());

        let scenarios = read_scenarios(dir.path(), MissingValuePolicy::Zero).unwrap();
        let scenario = &scenarios["baseline"];
        assert_eq!(scenario.years, [2020, 2021]);
        assert_eq!(
            scenario.module_parameters[1].installed_capacity,
            Power::from_megawatts(12.0)
        );
        assert_eq!(scenario.module_parameters[1].repair, Percent(0.0));
        assert_eq!(
            scenario.module_parameters[0].bifaciality_factor,
            Dimensionless(0.0)
        );
    }
}
