//! Fixtures for tests

use crate::material::{Material, MaterialMap, MaterialParameters};
use crate::model::{Model, ModelParameters};
use crate::scenario::{ModuleParameters, Scenario, ScenarioMap};
use crate::units::{Dimensionless, MassPerArea, Percent, Power};
use indexmap::IndexMap;
use rstest::fixture;
use std::path::PathBuf;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

#[fixture]
pub fn module_parameters() -> ModuleParameters {
    ModuleParameters {
        installed_capacity: Power::from_megawatts(1.0),
        efficiency: Percent(20.0),
        reliability_t50: 25.0,
        reliability_t90: 35.0,
        degradation: Percent(0.5),
        lifetime: 30,
        repair: Percent(0.0),
        repowering: Percent(0.0),
        manufacturing_efficiency: Percent(100.0),
        collection_efficiency: Percent(75.0),
        collected_recycled: Percent(80.0),
        bifaciality_factor: Dimensionless(0.0),
    }
}

#[fixture]
pub fn material_parameters() -> MaterialParameters {
    MaterialParameters {
        mass_per_area: MassPerArea(100.0),
        virgin_efficiency: Percent(90.0),
        manufacturing_efficiency: Percent(95.0),
        scrap_recycled: Percent(80.0),
        scrap_recycling_efficiency: Percent(90.0),
        scrap_recycled_into_hq: Percent(50.0),
        scrap_hq_reused_for_manufacturing: Percent(50.0),
        eol_collected_recycled: Percent(100.0),
        eol_recycling_efficiency: Percent(85.0),
        eol_recycled_into_hq: Percent(40.0),
        eol_hq_reused_for_manufacturing: Percent(100.0),
    }
}

/// Create a scenario with the same module parameters in every year
pub fn scenario_with(first_year: u32, num_years: u32, parameters: ModuleParameters) -> Scenario {
    Scenario {
        id: "baseline".into(),
        description: "".into(),
        years: (first_year..first_year + num_years).collect(),
        module_parameters: vec![parameters; num_years as usize],
    }
}

#[fixture]
pub fn scenario(module_parameters: ModuleParameters) -> Scenario {
    scenario_with(2020, 10, module_parameters)
}

#[fixture]
pub fn scenarios(scenario: Scenario) -> ScenarioMap {
    let circular = Scenario {
        id: "circular".into(),
        module_parameters: scenario
            .module_parameters
            .iter()
            .map(|parameters| ModuleParameters {
                collection_efficiency: Percent(100.0),
                collected_recycled: Percent(100.0),
                ..parameters.clone()
            })
            .collect(),
        ..scenario.clone()
    };

    [scenario, circular]
        .into_iter()
        .map(|scenario| (scenario.id.clone(), scenario))
        .collect()
}

#[fixture]
pub fn model(scenarios: ScenarioMap, material_parameters: MaterialParameters) -> Model {
    let materials: MaterialMap = ["glass", "silver"]
        .into_iter()
        .map(|id| {
            let parameters: IndexMap<_, _> = scenarios
                .values()
                .map(|scenario| {
                    let series = vec![material_parameters.clone(); scenario.num_years()];
                    (scenario.id.clone(), series)
                })
                .collect();
            let material = Material {
                id: id.into(),
                description: "".into(),
                parameters,
            };
            (material.id.clone(), material)
        })
        .collect();

    Model {
        model_path: PathBuf::from("model"),
        parameters: ModelParameters::default(),
        scenarios,
        materials,
    }
}
