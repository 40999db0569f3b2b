//! Materials make up PV modules. Each material has its own intensity and recycling parameters,
//! which may differ between scenarios.
use crate::id::{define_id_getter, define_id_type};
use crate::scenario::ScenarioID;
use crate::units::{MassPerArea, Percent};
use anyhow::{Context, Result};
use indexmap::IndexMap;

define_id_type! {MaterialID}

/// A map of [`Material`]s, keyed by material ID
pub type MaterialMap = IndexMap<MaterialID, Material>;

/// A material contained in PV modules (e.g. glass, silver)
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// A unique identifier for the material (e.g. "glass")
    pub id: MaterialID,
    /// A text description of the material
    pub description: String,
    /// Parameters for each year, aligned with the years of the scenario they belong to
    pub parameters: IndexMap<ScenarioID, Vec<MaterialParameters>>,
}
define_id_getter! {Material, MaterialID}

impl Material {
    /// Get the parameter time series for the given scenario
    pub fn parameters_for(&self, scenario_id: &ScenarioID) -> Result<&[MaterialParameters]> {
        self.parameters
            .get(scenario_id)
            .map(Vec::as_slice)
            .with_context(|| {
                format!(
                    "Material {} has no parameters for scenario {scenario_id}",
                    self.id
                )
            })
    }
}

/// Material parameters for a single year
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialParameters {
    /// Mass of material per unit module area
    pub mass_per_area: MassPerArea,
    /// Yield of mining and refining virgin material
    pub virgin_efficiency: Percent,
    /// Yield of material manufacturing
    pub manufacturing_efficiency: Percent,
    /// Share of manufacturing scrap sent for recycling
    pub scrap_recycled: Percent,
    /// Yield of manufacturing scrap recycling
    pub scrap_recycling_efficiency: Percent,
    /// Share of successfully recycled scrap which is high quality
    pub scrap_recycled_into_hq: Percent,
    /// Share of high-quality recycled scrap which is reused in manufacturing
    pub scrap_hq_reused_for_manufacturing: Percent,
    /// Share of material in recycled modules which is sent for material recycling
    pub eol_collected_recycled: Percent,
    /// Yield of end-of-life material recycling
    pub eol_recycling_efficiency: Percent,
    /// Share of successfully recycled end-of-life material which is high quality
    pub eol_recycled_into_hq: Percent,
    /// Share of high-quality recycled end-of-life material which is reused in manufacturing
    pub eol_hq_reused_for_manufacturing: Percent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, material_parameters};
    use indexmap::indexmap;
    use rstest::rstest;

    #[rstest]
    fn test_parameters_for(material_parameters: MaterialParameters) {
        let material = Material {
            id: "glass".into(),
            description: "Front glass".into(),
            parameters: indexmap! {"baseline".into() => vec![material_parameters; 3]},
        };

        assert_eq!(material.parameters_for(&"baseline".into()).unwrap().len(), 3);
        assert_error!(
            material.parameters_for(&"circular".into()),
            "Material glass has no parameters for scenario circular"
        );
    }
}
