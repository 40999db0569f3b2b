//! Routes disposed modules and manufacturing scrap through collection, recycling and reuse.
//!
//! Every unit of mass entering a stage leaves it in exactly one of the stage's outputs, so the
//! terminal buckets of the whole pipeline always add up to its input.
use super::projection::{manufactured_mass, mass_totals};
use super::survival::CohortSurvival;
use crate::material::MaterialParameters;
use crate::scenario::{ModuleParameters, Scenario};
use crate::units::{Area, Dimensionless, Mass, Percent};
use anyhow::{Result, ensure};
use log::warn;
use std::ops::{Mul, Sub};

/// How disposed modules are split between collection, recycling and landfill.
///
/// The same split applies to module area and to the mass of each material within the modules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModuleDisposition<T> {
    /// Disposed modules which are collected
    pub collected: T,
    /// Disposed modules which are not collected and go straight to landfill
    pub not_collected: T,
    /// Collected modules sent for recycling
    pub sent_to_recycling: T,
    /// Collected modules which are landfilled instead of being recycled
    pub collected_not_recycled: T,
}

impl<T> ModuleDisposition<T>
where
    T: Copy + Mul<Dimensionless, Output = T> + Sub<Output = T>,
{
    /// Split `disposed` according to the collection parameters for the year of disposal
    pub fn route(disposed: T, parameters: &ModuleParameters) -> Self {
        let collected = disposed * parameters.collection_efficiency.fraction();
        let sent_to_recycling = collected * parameters.collected_recycled.fraction();

        Self {
            collected,
            not_collected: disposed - collected,
            sent_to_recycling,
            collected_not_recycled: collected - sent_to_recycling,
        }
    }
}

/// Fractions controlling a [`RecyclingCascade`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeParameters {
    /// Share of the input sent for recycling
    pub sent_to_recycling: Percent,
    /// Yield of the recycling process
    pub recycling_efficiency: Percent,
    /// Share of recycled material which is high quality
    pub into_high_quality: Percent,
    /// Share of high-quality material reused in manufacturing
    pub reused_for_manufacturing: Percent,
}

impl CascadeParameters {
    /// Parameters for recycling material recovered from end-of-life modules
    pub fn end_of_life(parameters: &MaterialParameters) -> Self {
        Self {
            sent_to_recycling: parameters.eol_collected_recycled,
            recycling_efficiency: parameters.eol_recycling_efficiency,
            into_high_quality: parameters.eol_recycled_into_hq,
            reused_for_manufacturing: parameters.eol_hq_reused_for_manufacturing,
        }
    }

    /// Parameters for recycling manufacturing scrap
    pub fn scrap(parameters: &MaterialParameters) -> Self {
        Self {
            sent_to_recycling: parameters.scrap_recycled,
            recycling_efficiency: parameters.scrap_recycling_efficiency,
            into_high_quality: parameters.scrap_recycled_into_hq,
            reused_for_manufacturing: parameters.scrap_hq_reused_for_manufacturing,
        }
    }
}

/// Material flowing through recycling, from being sent to recycling to being reused
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RecyclingCascade {
    /// Material sent for recycling
    pub sent_to_recycling: Mass,
    /// Material landfilled instead of being sent for recycling
    pub not_sent_to_recycling: Mass,
    /// Material recovered by recycling
    pub recycled: Mass,
    /// Material lost in the recycling process
    pub recycling_losses: Mass,
    /// Recycled material of high quality
    pub high_quality: Mass,
    /// Recycled material of other (lower) quality
    pub other_quality: Mass,
    /// High-quality material reused in manufacturing
    pub high_quality_into_manufacturing: Mass,
    /// High-quality material put to other uses
    pub high_quality_into_other_uses: Mass,
}

impl RecyclingCascade {
    /// Route `input` through the recycling cascade
    pub fn route(input: Mass, parameters: &CascadeParameters) -> Self {
        let sent_to_recycling = input * parameters.sent_to_recycling.fraction();
        let recycled = sent_to_recycling * parameters.recycling_efficiency.fraction();
        let high_quality = recycled * parameters.into_high_quality.fraction();
        let high_quality_into_manufacturing =
            high_quality * parameters.reused_for_manufacturing.fraction();

        Self {
            sent_to_recycling,
            not_sent_to_recycling: input - sent_to_recycling,
            recycled,
            recycling_losses: sent_to_recycling - recycled,
            high_quality,
            other_quality: recycled - high_quality,
            high_quality_into_manufacturing,
            high_quality_into_other_uses: high_quality - high_quality_into_manufacturing,
        }
    }

    /// Recycled material put to uses other than manufacturing
    pub fn other_uses(&self) -> Mass {
        self.other_quality + self.high_quality_into_other_uses
    }
}

/// End-of-life flows of a material in a single year
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndOfLifeFlows {
    /// Mass of material in modules disposed of this year
    pub disposed: Mass,
    /// Collection and module recycling split of the disposed mass
    pub modules: ModuleDisposition<Mass>,
    /// Material recycling of the mass in modules sent for recycling
    pub recycling: RecyclingCascade,
}

impl EndOfLifeFlows {
    /// Route the disposed mass of a material
    pub fn route(
        disposed: Mass,
        module_parameters: &ModuleParameters,
        material_parameters: &MaterialParameters,
    ) -> Self {
        let modules = ModuleDisposition::route(disposed, module_parameters);
        let recycling = RecyclingCascade::route(
            modules.sent_to_recycling,
            &CascadeParameters::end_of_life(material_parameters),
        );

        Self {
            disposed,
            modules,
            recycling,
        }
    }

    /// Landfilled because modules or material were not collected or not sent for recycling
    pub fn collection_losses(&self) -> Mass {
        self.modules.not_collected
            + self.modules.collected_not_recycled
            + self.recycling.not_sent_to_recycling
    }

    /// Landfilled because of losses in the recycling process
    pub fn recycling_losses(&self) -> Mass {
        self.recycling.recycling_losses
    }

    /// Recycled material put to other uses
    pub fn other_uses(&self) -> Mass {
        self.recycling.other_uses()
    }

    /// Recycled material reused in manufacturing
    pub fn reused_for_manufacturing(&self) -> Mass {
        self.recycling.high_quality_into_manufacturing
    }
}

/// Manufacturing flows of a material in a single year
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManufacturingFlows {
    /// Material ending up in newly installed modules
    pub target: Mass,
    /// Material entering module manufacturing
    pub entering_module_manufacturing: Mass,
    /// Material lost in module manufacturing
    pub lost_in_module_manufacturing: Mass,
    /// Material entering material manufacturing
    pub input: Mass,
    /// All manufacturing scrap (material and module manufacturing losses)
    pub scrap: Mass,
    /// Recycling of the scrap
    pub scrap_recycling: RecyclingCascade,
}

impl ManufacturingFlows {
    /// Calculate the manufacturing flows needed to produce `target` mass of material in modules
    pub fn route(
        target: Mass,
        module_parameters: &ModuleParameters,
        material_parameters: &MaterialParameters,
    ) -> Self {
        let entering_module_manufacturing =
            target / module_parameters.manufacturing_efficiency.fraction();
        let input =
            entering_module_manufacturing / material_parameters.manufacturing_efficiency.fraction();
        let scrap = input - target;

        Self {
            target,
            entering_module_manufacturing,
            lost_in_module_manufacturing: entering_module_manufacturing - target,
            input,
            scrap,
            scrap_recycling: RecyclingCascade::route(
                scrap,
                &CascadeParameters::scrap(material_parameters),
            ),
        }
    }

    /// Scrap landfilled because it was not recycled or was lost in recycling
    pub fn landfilled(&self) -> Mass {
        self.scrap_recycling.not_sent_to_recycling + self.scrap_recycling.recycling_losses
    }
}

/// All flows of a material in a single year
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialYearFlows {
    /// Calendar year
    pub year: u32,
    /// Mass of material in modules in service
    pub active_mass: Mass,
    /// End-of-life flows
    pub end_of_life: EndOfLifeFlows,
    /// Manufacturing flows
    pub manufacturing: ManufacturingFlows,
    /// High-quality recycled end-of-life material arriving at manufacturing this year
    pub recycled_feedstock: Mass,
    /// Virgin material needed by manufacturing
    pub virgin_stock: Mass,
    /// Virgin material needed before mining and refining losses
    pub virgin_stock_raw: Mass,
}

impl MaterialYearFlows {
    /// Total landfilled mass from end-of-life modules and manufacturing scrap
    pub fn total_landfilled(&self) -> Mass {
        self.end_of_life.collection_losses()
            + self.end_of_life.recycling_losses()
            + self.manufacturing.landfilled()
    }

    /// Total recycled mass put to uses other than PV manufacturing
    pub fn total_other_uses(&self) -> Mass {
        self.end_of_life.other_uses() + self.manufacturing.scrap_recycling.other_uses()
    }

    /// Total recycled mass reused in PV manufacturing
    pub fn total_reused_for_manufacturing(&self) -> Mass {
        self.recycled_feedstock + self.manufacturing.scrap_recycling.high_quality_into_manufacturing
    }
}

/// Route the flows of one material through manufacturing and end of life for every year.
///
/// # Arguments
///
/// * `scenario` - The scenario providing module parameters
/// * `survival` - The survival history of the scenario's cohorts
/// * `installed_area` - Area installed in each year
/// * `material_parameters` - The material's parameters, aligned with the scenario's years
/// * `feedstock_lag` - Years between end-of-life material being recycled and it offsetting
///   virgin demand
pub fn route_material(
    scenario: &Scenario,
    survival: &CohortSurvival,
    installed_area: &[Area],
    material_parameters: &[MaterialParameters],
    feedstock_lag: u32,
) -> Result<Vec<MaterialYearFlows>> {
    let num_years = scenario.num_years();
    ensure!(
        material_parameters.len() == num_years
            && installed_area.len() == num_years
            && survival.num_years() == num_years,
        "Misaligned time series for scenario {}: {} years, {} material parameter rows, {} \
        installed areas and {} years of cohort survival",
        scenario.id,
        num_years,
        material_parameters.len(),
        installed_area.len(),
        survival.num_years()
    );

    let mass_per_area = material_parameters
        .iter()
        .map(|parameters| parameters.mass_per_area)
        .collect::<Vec<_>>();
    let active_mass = mass_totals(&survival.active_area, &mass_per_area);
    let disposed_mass = mass_totals(&survival.disposed_by_failure, &mass_per_area)
        .into_iter()
        .zip(mass_totals(&survival.disposed_by_retirement, &mass_per_area))
        .map(|(failure, retirement)| failure + retirement);
    let target_mass = manufactured_mass(installed_area, &mass_per_area);

    let end_of_life = disposed_mass
        .zip(scenario.module_parameters.iter().zip(material_parameters))
        .map(|(disposed, (module, material))| EndOfLifeFlows::route(disposed, module, material))
        .collect::<Vec<_>>();

    let lag = feedstock_lag as usize;
    let mut flows = Vec::with_capacity(num_years);
    for (index, (year, module)) in scenario.iter_years().enumerate() {
        let material = &material_parameters[index];
        let manufacturing = ManufacturingFlows::route(target_mass[index], module, material);
        let recycled_feedstock = index
            .checked_sub(lag)
            .map_or(Mass(0.0), |source| end_of_life[source].reused_for_manufacturing());

        let virgin_stock = manufacturing.input
            - recycled_feedstock
            - manufacturing.scrap_recycling.high_quality_into_manufacturing;
        if virgin_stock < Mass(0.0) {
            warn!(
                "Recycled material exceeds manufacturing demand in {year} for scenario {} \
                (virgin stock: {virgin_stock})",
                scenario.id
            );
        }

        flows.push(MaterialYearFlows {
            year,
            active_mass: active_mass[index],
            end_of_life: end_of_life[index],
            manufacturing,
            recycled_feedstock,
            virgin_stock,
            virgin_stock_raw: virgin_stock / material.virgin_efficiency.fraction(),
        });
    }

    Ok(flows)
}
