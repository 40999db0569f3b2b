//! Reliability models for PV modules.
//!
//! Time to failure is modelled with a two-parameter Weibull distribution:
//!
//! ```text
//! F(t) = 1 - exp(-(t / beta)^alpha)
//! ```
//!
//! The parameters are not fitted to raw failure data. They are solved in closed form from two
//! control points (age, cumulative failure fraction), usually the ages at which 50% and 90% of a
//! cohort is expected to have failed.
use anyhow::{Result, ensure};
use serde::Serialize;

/// Cumulative failure fraction at the `t50` reliability point
pub const T50_FAILURE_FRACTION: f64 = 0.5;

/// Cumulative failure fraction at the `t90` reliability point
pub const T90_FAILURE_FRACTION: f64 = 0.9;

/// A point on the cumulative failure curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FailurePoint {
    /// Age in years
    pub age: f64,
    /// Cumulative failure fraction at `age` (0-1)
    pub failure_fraction: f64,
}

impl FailurePoint {
    /// Create a new [`FailurePoint`]
    pub fn new(age: f64, failure_fraction: f64) -> Self {
        Self {
            age,
            failure_fraction,
        }
    }

    /// Linearised ordinate of the Weibull CDF, `ln(-ln(1 - F))`
    fn weibull_ordinate(&self) -> f64 {
        (-(1.0 - self.failure_fraction).ln()).ln()
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.age.is_finite() && self.age > 0.0,
            "Age of reliability point must be a finite number greater than zero (got {})",
            self.age
        );
        ensure!(
            self.failure_fraction > 0.0 && self.failure_fraction < 1.0,
            "Cumulative failure fraction must be strictly between 0 and 1 (got {})",
            self.failure_fraction
        );

        Ok(())
    }
}

/// Shape and scale parameters of a two-parameter Weibull distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeibullParams {
    /// Shape parameter
    pub alpha: f64,
    /// Scale parameter (years)
    pub beta: f64,
}

impl WeibullParams {
    /// Solve for the Weibull parameters whose CDF passes exactly through two points.
    ///
    /// Taking `ln(-ln(1 - F(t))) = alpha * ln(t) - alpha * ln(beta)`, the CDF is a straight line in
    /// `ln(t)`, so the two points determine `alpha` (the slope) and `beta` (from the intercept).
    ///
    /// # Returns
    ///
    /// The fitted parameters, or an error if the points do not define a valid distribution (e.g.
    /// equal ages, equal fractions, or a later point with a smaller failure fraction).
    pub fn fit(first: FailurePoint, second: FailurePoint) -> Result<Self> {
        first.validate()?;
        second.validate()?;
        ensure!(
            first.age != second.age,
            "Cannot fit Weibull distribution to two points with the same age ({})",
            first.age
        );
        ensure!(
            first.failure_fraction != second.failure_fraction,
            "Cannot fit Weibull distribution to two points with the same failure fraction ({})",
            first.failure_fraction
        );

        let (y1, y2) = (first.weibull_ordinate(), second.weibull_ordinate());
        let (x1, x2) = (first.age.ln(), second.age.ln());
        let alpha = (y2 - y1) / (x2 - x1);
        ensure!(
            alpha > 0.0,
            "Cumulative failure fraction must increase with age (got {} at age {} and {} at age {})",
            first.failure_fraction,
            first.age,
            second.failure_fraction,
            second.age
        );

        let beta = (x1 - y1 / alpha).exp();
        ensure!(
            alpha.is_finite() && beta.is_finite() && beta > 0.0,
            "Weibull fit produced invalid parameters (alpha: {alpha}, beta: {beta})"
        );

        Ok(Self { alpha, beta })
    }

    /// Fit the distribution from the ages at which 50% and 90% of modules have failed
    pub fn from_t50_t90(t50: f64, t90: f64) -> Result<Self> {
        ensure!(
            t50 < t90,
            "t50 must be less than t90 (got t50 = {t50}, t90 = {t90})"
        );

        Self::fit(
            FailurePoint::new(t50, T50_FAILURE_FRACTION),
            FailurePoint::new(t90, T90_FAILURE_FRACTION),
        )
    }

    /// Cumulative failure fraction at `age`. Ages at or below zero give zero.
    pub fn cdf(&self, age: f64) -> f64 {
        if age <= 0.0 {
            return 0.0;
        }

        1.0 - (-(age / self.beta).powf(self.alpha)).exp()
    }

    /// Probability density of failure at `age`. Negative ages give zero.
    pub fn pdf(&self, age: f64) -> f64 {
        if age < 0.0 {
            return 0.0;
        }

        let scaled = age / self.beta;
        (self.alpha / self.beta) * scaled.powf(self.alpha - 1.0) * (-scaled.powf(self.alpha)).exp()
    }

    /// Probability of failing during the year ending at `age`, i.e. `F(age) - F(age - 1)`
    pub fn interval_probability(&self, age: f64) -> f64 {
        self.cdf(age) - self.cdf(age - 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use itertools::Itertools;
    use rstest::rstest;

    #[rstest]
    #[case(20.0, 0.5, 30.0, 0.9)]
    #[case(25.0, 0.5, 35.0, 0.9)]
    #[case(5.0, 0.1, 40.0, 0.95)]
    #[case(1.5, 0.01, 2.0, 0.02)]
    #[case(30.0, 0.9, 20.0, 0.5)] // points given in reverse order
    fn test_fit_round_trip(#[case] t1: f64, #[case] p1: f64, #[case] t2: f64, #[case] p2: f64) {
        let params =
            WeibullParams::fit(FailurePoint::new(t1, p1), FailurePoint::new(t2, p2)).unwrap();
        assert_approx_eq!(f64, params.cdf(t1), p1, epsilon = 1e-12);
        assert_approx_eq!(f64, params.cdf(t2), p2, epsilon = 1e-12);
    }

    #[test]
    fn test_from_t50_t90() {
        let params = WeibullParams::from_t50_t90(20.0, 30.0).unwrap();
        assert_approx_eq!(f64, params.cdf(20.0), 0.5, epsilon = 1e-12);
        assert_approx_eq!(f64, params.cdf(30.0), 0.9, epsilon = 1e-12);
        assert!(params.alpha > 1.0);
    }

    #[rstest]
    #[case(20.0, 20.0, "t50 must be less than t90 (got t50 = 20, t90 = 20)")]
    #[case(30.0, 20.0, "t50 must be less than t90 (got t50 = 30, t90 = 20)")]
    #[case(
        0.0,
        20.0,
        "Age of reliability point must be a finite number greater than zero (got 0)"
    )]
    #[case(
        f64::NAN,
        20.0,
        "t50 must be less than t90 (got t50 = NaN, t90 = 20)"
    )]
    fn test_from_t50_t90_invalid(#[case] t50: f64, #[case] t90: f64, #[case] msg: &str) {
        let err = WeibullParams::from_t50_t90(t50, t90).unwrap_err();
        assert_eq!(err.to_string(), msg);
    }

    #[rstest]
    #[case(FailurePoint::new(10.0, 0.5), FailurePoint::new(10.0, 0.9))]
    #[case(FailurePoint::new(10.0, 0.5), FailurePoint::new(20.0, 0.5))]
    #[case(FailurePoint::new(10.0, 0.9), FailurePoint::new(20.0, 0.5))]
    #[case(FailurePoint::new(10.0, 0.0), FailurePoint::new(20.0, 0.5))]
    #[case(FailurePoint::new(10.0, 0.5), FailurePoint::new(20.0, 1.0))]
    #[case(FailurePoint::new(f64::INFINITY, 0.5), FailurePoint::new(20.0, 0.9))]
    fn test_fit_degenerate(#[case] first: FailurePoint, #[case] second: FailurePoint) {
        assert!(WeibullParams::fit(first, second).is_err());
    }

    #[test]
    fn test_cdf_monotonic() {
        let params = WeibullParams::from_t50_t90(25.0, 35.0).unwrap();
        assert_eq!(params.cdf(0.0), 0.0);
        assert_eq!(params.cdf(-3.0), 0.0);

        let values = (0..=200).map(|age| params.cdf(age as f64)).collect_vec();
        assert!(values.iter().tuple_windows().all(|(a, b)| a <= b));
        assert_approx_eq!(f64, params.cdf(1000.0), 1.0);
    }

    #[test]
    fn test_pdf_matches_cdf_derivative() {
        let params = WeibullParams::from_t50_t90(20.0, 30.0).unwrap();
        let h = 1e-6;
        for age in [1.0, 10.0, 20.0, 35.0] {
            let numeric = (params.cdf(age + h) - params.cdf(age - h)) / (2.0 * h);
            assert_approx_eq!(f64, params.pdf(age), numeric, epsilon = 1e-6);
        }
        assert_eq!(params.pdf(-1.0), 0.0);
    }

    #[test]
    fn test_interval_probability_sums_to_cdf() {
        let params = WeibullParams::from_t50_t90(20.0, 30.0).unwrap();
        let total: f64 = (1..=25).map(|age| params.interval_probability(age as f64)).sum();
        assert_approx_eq!(f64, total, params.cdf(25.0), epsilon = 1e-12);
    }
}
