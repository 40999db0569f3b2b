//! Scenarios describe the PV modules installed each year and how they are treated throughout their
//! lives.
use crate::id::{IDCollection, define_id_getter, define_id_type};
use crate::units::{Dimensionless, Percent, Power};
use anyhow::{Result, ensure};
use indexmap::{IndexMap, IndexSet};

define_id_type! {ScenarioID}

/// A map of [`Scenario`]s, keyed by scenario ID
pub type ScenarioMap = IndexMap<ScenarioID, Scenario>;

/// A named time series of module-level technical parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// A unique identifier for the scenario (e.g. "baseline")
    pub id: ScenarioID,
    /// A text description of the scenario
    pub description: String,
    /// Calendar years covered by the scenario. Contiguous and in order.
    pub years: Vec<u32>,
    /// Module parameters for each year, aligned with `years`
    pub module_parameters: Vec<ModuleParameters>,
}
define_id_getter! {Scenario, ScenarioID}

impl Scenario {
    /// Number of years covered by the scenario
    pub fn num_years(&self) -> usize {
        self.years.len()
    }

    /// Iterate over years along with the module parameters for that year
    pub fn iter_years(&self) -> impl Iterator<Item = (u32, &ModuleParameters)> {
        self.years.iter().copied().zip(self.module_parameters.iter())
    }
}

/// Module parameters for a single year.
///
/// Values relating to a cohort's construction (efficiency, reliability, lifetime, degradation) are
/// taken from the row for the cohort's installation year. Values relating to events (repair,
/// repowering, collection) are taken from the row for the year in which the event happens.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleParameters {
    /// Nameplate capacity installed in this year
    pub installed_capacity: Power,
    /// Module efficiency
    pub efficiency: Percent,
    /// Age (years) at which 50% of modules have failed
    pub reliability_t50: f64,
    /// Age (years) at which 90% of modules have failed
    pub reliability_t90: f64,
    /// Annual degradation of power output
    pub degradation: Percent,
    /// Project lifetime (years) after which modules are retired
    pub lifetime: u32,
    /// Share of failing modules which are repaired instead of disposed of
    pub repair: Percent,
    /// Share of modules reaching the end of their project lifetime which stay in service
    pub repowering: Percent,
    /// Yield of module manufacturing
    pub manufacturing_efficiency: Percent,
    /// Share of disposed modules which are collected
    pub collection_efficiency: Percent,
    /// Share of collected modules which are sent for recycling
    pub collected_recycled: Percent,
    /// Linear boost to effective STC irradiance from the rear face of bifacial modules
    pub bifaciality_factor: Dimensionless,
}

/// Parse a string of scenarios separated by semicolons into a set of [`ScenarioID`]s.
///
/// The string can be either "all" (case-insensitive), a single scenario, or a semicolon-separated
/// list of scenarios (e.g. "baseline;high_recycling").
pub fn parse_scenario_str(
    s: &str,
    scenario_ids: &IndexSet<ScenarioID>,
) -> Result<IndexSet<ScenarioID>> {
    let s = s.trim();
    ensure!(!s.is_empty(), "No scenarios provided");

    if s.eq_ignore_ascii_case("all") {
        return Ok(scenario_ids.clone());
    }

    s.split(';')
        .map(|id| scenario_ids.get_id(id.trim()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, scenario};
    use indexmap::indexset;
    use rstest::rstest;

    fn scenario_ids() -> IndexSet<ScenarioID> {
        indexset! {"baseline".into(), "circular".into()}
    }

    #[rstest]
    #[case("all", &["baseline", "circular"])]
    #[case(" ALL ", &["baseline", "circular"])]
    #[case("circular", &["circular"])]
    #[case("baseline; circular", &["baseline", "circular"])]
    fn test_parse_scenario_str_valid(#[case] input: &str, #[case] expected: &[&str]) {
        let expected: IndexSet<ScenarioID> = expected.iter().map(|&id| id.into()).collect();
        assert_eq!(parse_scenario_str(input, &scenario_ids()).unwrap(), expected);
    }

    #[rstest]
    #[case("", "No scenarios provided")]
    #[case("baseline;nonsense", "Unknown ID nonsense found")]
    fn test_parse_scenario_str_invalid(#[case] input: &str, #[case] msg: &str) {
        assert_error!(parse_scenario_str(input, &scenario_ids()), msg);
    }

    #[rstest]
    fn test_iter_years(scenario: Scenario) {
        let years: Vec<u32> = scenario.iter_years().map(|(year, _)| year).collect();
        assert_eq!(years, scenario.years);
        assert_eq!(scenario.iter_years().count(), scenario.num_years());
    }
}
