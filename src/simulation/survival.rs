//! Tracks every installation cohort through random failure, repair, scheduled retirement and
//! repowering.
//!
//! Each cohort is walked forward from its installation year to the end of the time horizon. Its
//! contributions are stored in [`CohortMatrix`]es so that yearly totals are simple reductions over
//! cohorts.
use super::cohort::CohortMatrix;
use crate::model::{DegradationBasis, FailureModel};
use crate::reliability::WeibullParams;
use crate::scenario::{ModuleParameters, Scenario};
use crate::units::{Area, Dimensionless};
use anyhow::{Context, Result, ensure};
use log::debug;

/// Options controlling how cohorts age
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SurvivalOptions {
    /// How the yearly failure share is derived from the Weibull CDF
    pub failure_model: FailureModel,
    /// Which count of years is used as the degradation exponent
    pub degradation_basis: DegradationBasis,
}

/// Survival history of every cohort in a scenario
#[derive(Debug, Clone, PartialEq)]
pub struct CohortSurvival {
    /// Fitted reliability model for each cohort (`None` for years without installations)
    pub weibull_params: Vec<Option<WeibullParams>>,
    /// Area still in service at the end of each year
    pub active_area: CohortMatrix<Area>,
    /// Area removed because of random failure
    pub disposed_by_failure: CohortMatrix<Area>,
    /// Area removed on reaching the end of its project lifetime
    pub disposed_by_retirement: CohortMatrix<Area>,
    /// Area which would have failed but was repaired
    pub repaired: CohortMatrix<Area>,
    /// Exponent to use when compounding power degradation
    pub degradation_exponent: CohortMatrix<f64>,
}

impl CohortSurvival {
    fn new(num_years: usize) -> Self {
        Self {
            weibull_params: vec![None; num_years],
            active_area: CohortMatrix::new(num_years),
            disposed_by_failure: CohortMatrix::new(num_years),
            disposed_by_retirement: CohortMatrix::new(num_years),
            repaired: CohortMatrix::new(num_years),
            degradation_exponent: CohortMatrix::new(num_years),
        }
    }

    /// Number of years simulated
    pub fn num_years(&self) -> usize {
        self.weibull_params.len()
    }

    /// Total area disposed of (for any reason) by `cohort` in `year`
    pub fn disposed(&self, cohort: usize, year: usize) -> Area {
        self.disposed_by_failure.get(cohort, year) + self.disposed_by_retirement.get(cohort, year)
    }

    /// Total area disposed of by all cohorts, for each year
    pub fn disposed_totals(&self) -> Vec<Area> {
        self.disposed_by_failure
            .year_totals()
            .into_iter()
            .zip(self.disposed_by_retirement.year_totals())
            .map(|(failure, retirement)| failure + retirement)
            .collect()
    }
}

/// Share of the surviving area expected to fail in the year ending at `age`
fn failure_share(model: FailureModel, weibull: &WeibullParams, age: f64) -> Dimensionless {
    let share = match model {
        FailureModel::Hazard => {
            let surviving = 1.0 - weibull.cdf(age - 1.0);
            if surviving <= 0.0 {
                1.0
            } else {
                weibull.interval_probability(age) / surviving
            }
        }
        FailureModel::Cumulative => weibull.cdf(age),
    };

    Dimensionless(share.clamp(0.0, 1.0))
}

/// Simulate the survival of every cohort in a scenario.
///
/// # Arguments
///
/// * `scenario` - The scenario providing module parameters for each year
/// * `installed_area` - Area installed in each year of the scenario
/// * `options` - Options controlling how cohorts age
///
/// # Returns
///
/// The survival history of all cohorts, or an error if a cohort with a non-zero installed area has
/// invalid parameters.
pub fn simulate_cohorts(
    scenario: &Scenario,
    installed_area: &[Area],
    options: &SurvivalOptions,
) -> Result<CohortSurvival> {
    let num_years = scenario.num_years();
    ensure!(
        installed_area.len() == num_years && scenario.module_parameters.len() == num_years,
        "Misaligned time series for scenario {}: {} years, {} module parameter rows and {} \
        installed areas",
        scenario.id,
        num_years,
        scenario.module_parameters.len(),
        installed_area.len()
    );

    let mut survival = CohortSurvival::new(num_years);
    for (cohort, &area) in installed_area.iter().enumerate() {
        ensure!(
            area.is_finite() && area >= Area(0.0),
            "Installed area must be a finite, non-negative number (got {area} in {})",
            scenario.years[cohort]
        );
        if area == Area(0.0) {
            continue;
        }

        let parameters = &scenario.module_parameters[cohort];
        let weibull =
            WeibullParams::from_t50_t90(parameters.reliability_t50, parameters.reliability_t90)
                .with_context(|| {
                    format!(
                        "Invalid reliability parameters for modules installed in {}",
                        scenario.years[cohort]
                    )
                })?;
        debug!(
            "Cohort {}: alpha = {}, beta = {}",
            scenario.years[cohort], weibull.alpha, weibull.beta
        );

        survival.weibull_params[cohort] = Some(weibull);
        simulate_cohort(
            &mut survival,
            cohort,
            area,
            &weibull,
            &scenario.module_parameters,
            options,
        );
    }

    Ok(survival)
}

/// Walk a single cohort forward from its installation year
fn simulate_cohort(
    survival: &mut CohortSurvival,
    cohort: usize,
    area: Area,
    weibull: &WeibullParams,
    module_parameters: &[ModuleParameters],
    options: &SurvivalOptions,
) {
    let lifetime = module_parameters[cohort].lifetime as usize;

    // The whole installation is active in its first year, regardless of what the CDF says
    survival.active_area.set(cohort, cohort, area);

    let mut active = area;
    let mut ageing_years = 0u32;
    for year in (cohort + 1)..module_parameters.len() {
        let age = year - cohort;
        let parameters = &module_parameters[year];

        let cdf = weibull.cdf(age as f64);
        if cdf > 0.0 {
            ageing_years += 1;

            let failing = active * failure_share(options.failure_model, weibull, age as f64);
            let repaired = failing * parameters.repair.fraction();
            let disposed = failing - repaired;
            active -= disposed;

            survival.repaired.set(cohort, year, repaired);
            survival.disposed_by_failure.set(cohort, year, disposed);
        }

        if age == lifetime {
            let kept = active * parameters.repowering.fraction();
            survival
                .disposed_by_retirement
                .set(cohort, year, active - kept);
            active = kept;
        }

        survival.active_area.set(cohort, year, active);
        let exponent = match options.degradation_basis {
            DegradationBasis::CalendarAge => age as f64,
            DegradationBasis::ActiveYears => ageing_years as f64,
        };
        survival.degradation_exponent.set(cohort, year, exponent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{module_parameters, scenario_with};
    use crate::units::Percent;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    const AREA: Area = Area(1_000_000.0);

    fn simulate(scenario: &Scenario, cohort: usize, options: &SurvivalOptions) -> CohortSurvival {
        let mut installed = vec![Area(0.0); scenario.num_years()];
        installed[cohort] = AREA;
        simulate_cohorts(scenario, &installed, options).unwrap()
    }

    #[rstest]
    fn test_single_cohort_end_to_end(module_parameters: ModuleParameters) {
        let parameters = ModuleParameters {
            reliability_t50: 20.0,
            reliability_t90: 30.0,
            lifetime: 20,
            repowering: Percent(0.0),
            repair: Percent(0.0),
            ..module_parameters
        };
        let scenario = scenario_with(2000, 30, parameters);
        let survival = simulate(&scenario, 0, &SurvivalOptions::default());
        let weibull = survival.weibull_params[0].unwrap();

        // Active area follows the Weibull survival curve until retirement
        assert_eq!(survival.active_area.get(0, 0), AREA);
        for age in 1..20 {
            let expected = AREA * Dimensionless(1.0 - weibull.cdf(age as f64));
            assert_approx_eq!(Area, survival.active_area.get(0, age), expected, epsilon = 1e-6);
            assert_eq!(survival.disposed_by_retirement.get(0, age), Area(0.0));
        }

        // Everything left is retired at age 20 and nothing is active afterwards
        let survivors_at_20 = AREA * Dimensionless(1.0 - weibull.cdf(20.0));
        assert_approx_eq!(
            Area,
            survival.disposed_by_retirement.get(0, 20),
            survivors_at_20,
            epsilon = 1e-6
        );
        assert_eq!(survival.active_area.get(0, 20), Area(0.0));
        assert_eq!(survival.active_area.get(0, 21), Area(0.0));
        assert_eq!(survival.disposed(0, 25), Area(0.0));

        // All installed area has been disposed of by age 21
        let total: Area = (0..=21).map(|year| survival.disposed(0, year)).sum();
        assert_approx_eq!(Area, total, AREA, epsilon = 1e-6);
    }

    #[rstest]
    fn test_scheduled_retirement_cutoff(module_parameters: ModuleParameters) {
        // Failures are vanishingly unlikely before the lifetime is reached
        let parameters = ModuleParameters {
            reliability_t50: 500.0,
            reliability_t90: 510.0,
            lifetime: 15,
            repowering: Percent(30.0),
            ..module_parameters
        };
        let scenario = scenario_with(2000, 25, parameters);
        let survival = simulate(&scenario, 2, &SurvivalOptions::default());

        for year in 0..17 {
            assert_approx_eq!(
                Area,
                survival.disposed_by_failure.get(2, year),
                Area(0.0),
                epsilon = 1e-6
            );
        }

        let retired = survival.disposed_by_retirement.get(2, 17);
        let active_before = survival.active_area.get(2, 16);
        assert_approx_eq!(Area, retired, active_before * Dimensionless(0.7), epsilon = 1e-6);
        assert_approx_eq!(
            Area,
            survival.active_area.get(2, 17),
            active_before * Dimensionless(0.3),
            epsilon = 1e-6
        );

        // Retirement only happens once
        let retirement_events = (0..25)
            .filter(|&year| survival.disposed_by_retirement.get(2, year) > Area(0.0))
            .count();
        assert_eq!(retirement_events, 1);
    }

    #[rstest]
    fn test_installation_year_fixup(module_parameters: ModuleParameters) {
        let scenario = scenario_with(2000, 10, module_parameters);

        // Cohorts installed in the first, a middle and the final year all count as active
        for cohort in [0, 4, 9] {
            let survival = simulate(&scenario, cohort, &SurvivalOptions::default());
            assert_eq!(survival.active_area.get(cohort, cohort), AREA);
            assert_eq!(survival.active_area.year_totals()[cohort], AREA);
            if cohort > 0 {
                assert_eq!(survival.active_area.get(cohort, cohort - 1), Area(0.0));
            }
        }
    }

    #[rstest]
    fn test_repair_reduces_disposal(module_parameters: ModuleParameters) {
        let scenario = scenario_with(2000, 30, module_parameters.clone());
        let repaired_scenario = scenario_with(
            2000,
            30,
            ModuleParameters {
                repair: Percent(50.0),
                ..module_parameters
            },
        );

        let options = SurvivalOptions::default();
        let without = simulate(&scenario, 0, &options);
        let with = simulate(&repaired_scenario, 0, &options);

        // First failure year: half of the would-be failures are saved
        let year = 1;
        assert_approx_eq!(
            Area,
            with.disposed_by_failure.get(0, year),
            without.disposed_by_failure.get(0, year) * Dimensionless(0.5),
            epsilon = 1e-6
        );
        assert_approx_eq!(
            Area,
            with.repaired.get(0, year),
            with.disposed_by_failure.get(0, year),
            epsilon = 1e-6
        );
        assert!(with.active_area.get(0, 10) > without.active_area.get(0, 10));
    }

    #[rstest]
    fn test_cumulative_failure_model(module_parameters: ModuleParameters) {
        let parameters = ModuleParameters {
            repair: Percent(25.0),
            ..module_parameters
        };
        let scenario = scenario_with(2000, 5, parameters);
        let options = SurvivalOptions {
            failure_model: FailureModel::Cumulative,
            ..SurvivalOptions::default()
        };
        let survival = simulate(&scenario, 0, &options);
        let weibull = survival.weibull_params[0].unwrap();

        let mut expected = AREA;
        for age in 1..5 {
            let cdf = weibull.cdf(age as f64);
            expected = expected * Dimensionless(1.0 - cdf * 0.75);
            assert_approx_eq!(Area, survival.active_area.get(0, age), expected, epsilon = 1e-6);
        }
    }

    #[rstest]
    fn test_degradation_basis(module_parameters: ModuleParameters) {
        // A very steep Weibull curve: nothing fails for the first few years
        let parameters = ModuleParameters {
            reliability_t50: 20.0,
            reliability_t90: 20.5,
            ..module_parameters
        };
        let scenario = scenario_with(2000, 25, parameters);
        let calendar = simulate(&scenario, 0, &SurvivalOptions::default());
        let active = simulate(
            &scenario,
            0,
            &SurvivalOptions {
                degradation_basis: DegradationBasis::ActiveYears,
                ..SurvivalOptions::default()
            },
        );

        assert_eq!(calendar.degradation_exponent.get(0, 3), 3.0);
        assert!(active.degradation_exponent.get(0, 3) < 3.0);
        assert!(
            active.degradation_exponent.get(0, 24) <= calendar.degradation_exponent.get(0, 24)
        );
        assert_eq!(calendar.active_area, active.active_area);
    }

    #[rstest]
    fn test_invalid_reliability(module_parameters: ModuleParameters) {
        let parameters = ModuleParameters {
            reliability_t50: 30.0,
            reliability_t90: 20.0,
            ..module_parameters
        };
        let scenario = scenario_with(2000, 5, parameters);

        // Cohorts with no installations don't need valid parameters
        let empty = vec![Area(0.0); 5];
        assert!(simulate_cohorts(&scenario, &empty, &SurvivalOptions::default()).is_ok());

        let mut installed = empty;
        installed[1] = AREA;
        let err = simulate_cohorts(&scenario, &installed, &SurvivalOptions::default())
            .unwrap_err()
            .to_string();
        assert_eq!(
            err,
            "Invalid reliability parameters for modules installed in 2001"
        );
    }

    #[rstest]
    fn test_misaligned_series(module_parameters: ModuleParameters) {
        let scenario = scenario_with(2000, 5, module_parameters);
        let installed = vec![AREA; 4];
        let err = simulate_cohorts(&scenario, &installed, &SurvivalOptions::default())
            .unwrap_err()
            .to_string();
        assert!(err.starts_with("Misaligned time series"));
    }

    #[rstest]
    #[case(FailureModel::Hazard, 1.0)]
    #[case(FailureModel::Hazard, 10.0)]
    #[case(FailureModel::Cumulative, 10.0)]
    fn test_failure_share(#[case] model: FailureModel, #[case] age: f64) {
        let weibull = WeibullParams::from_t50_t90(20.0, 30.0).unwrap();
        let (cdf, previous_cdf) = (weibull.cdf(age), weibull.cdf(age - 1.0));
        let expected = match model {
            FailureModel::Hazard => (cdf - previous_cdf) / (1.0 - previous_cdf),
            FailureModel::Cumulative => cdf,
        };

        assert_approx_eq!(
            Dimensionless,
            failure_share(model, &weibull, age),
            Dimensionless(expected),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_failure_share_after_certain_failure() {
        // The whole population has failed by this age, so anything left fails too
        let weibull = WeibullParams::from_t50_t90(1.0, 1.1).unwrap();
        assert_eq!(weibull.cdf(50.0), 1.0);
        assert_eq!(
            failure_share(FailureModel::Hazard, &weibull, 51.0),
            Dimensionless(1.0)
        );
    }
}
