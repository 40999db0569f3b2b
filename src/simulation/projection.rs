//! Converts between installed capacity, module area, mass and effective power.
use super::cohort::CohortMatrix;
use super::survival::CohortSurvival;
use crate::scenario::{ModuleParameters, Scenario};
use crate::units::{Area, Dimensionless, Irradiance, Mass, MassPerArea, Power};
use anyhow::{Result, ensure};

/// Irradiance seen by a module at standard test conditions, including the rear-face gain of
/// bifacial modules
pub fn effective_irradiance(
    irradiance_stc: Irradiance,
    parameters: &ModuleParameters,
) -> Irradiance {
    irradiance_stc * (Dimensionless(1.0) + parameters.bifaciality_factor)
}

/// Calculate the module area installed in each year from the installed capacity.
///
/// # Arguments
///
/// * `scenario` - The scenario providing installed capacity and module efficiency
/// * `irradiance_stc` - Irradiance at standard test conditions
pub fn installed_area(scenario: &Scenario, irradiance_stc: Irradiance) -> Result<Vec<Area>> {
    scenario
        .iter_years()
        .map(|(year, parameters)| {
            let capacity = parameters.installed_capacity;
            if capacity == Power(0.0) {
                return Ok(Area(0.0));
            }

            let power_per_area = effective_irradiance(irradiance_stc, parameters)
                * parameters.efficiency.fraction();
            ensure!(
                power_per_area > Irradiance(0.0),
                "Module efficiency must be greater than zero in years with installations \
                (year {year})"
            );

            Ok(capacity / power_per_area)
        })
        .collect()
}

/// Calculate the effective power of every cohort in every year.
///
/// Power is the cohort's active area multiplied by its efficiency and irradiance, compounded by
/// annual degradation over the number of years given by the survival's degradation exponent.
pub fn cohort_power(
    scenario: &Scenario,
    survival: &CohortSurvival,
    irradiance_stc: Irradiance,
) -> CohortMatrix<Power> {
    let num_years = survival.num_years();
    let mut power = CohortMatrix::new(num_years);
    for (cohort, parameters) in scenario.module_parameters.iter().enumerate() {
        if survival.weibull_params[cohort].is_none() {
            continue;
        }

        let power_per_area =
            effective_irradiance(irradiance_stc, parameters) * parameters.efficiency.fraction();
        let retained = parameters.degradation.complement();
        for year in cohort..num_years {
            let exponent = survival.degradation_exponent.get(cohort, year);
            let area = survival.active_area.get(cohort, year);
            power.set(cohort, year, area * power_per_area * retained.powf(exponent));
        }
    }

    power
}

/// Convert a per-cohort area matrix into yearly total mass of a material.
///
/// Each cohort uses the material intensity of its installation year.
pub fn mass_totals(area: &CohortMatrix<Area>, mass_per_area: &[MassPerArea]) -> Vec<Mass> {
    area.weighted_year_totals(mass_per_area)
}

/// Mass of material entering manufacturing-ready modules each year
pub fn manufactured_mass(installed_area: &[Area], mass_per_area: &[MassPerArea]) -> Vec<Mass> {
    installed_area
        .iter()
        .zip(mass_per_area)
        .map(|(&area, &intensity)| area * intensity)
        .collect()
}
