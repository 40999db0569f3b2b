//! A dense matrix for per-cohort quantities, indexed by installation year and calendar year.
//!
//! A cohort installed in year `i` only contributes to calendar years `j >= i`, so the cells below
//! the diagonal always hold their default (zero) value.
use std::iter::Sum;
use std::ops::Mul;

/// A square matrix of values indexed by `(cohort, year)`, where both indexes are offsets into the
/// simulated time series
#[derive(Debug, Clone, PartialEq)]
pub struct CohortMatrix<T> {
    size: usize,
    data: Vec<T>,
}

impl<T: Copy + Default> CohortMatrix<T> {
    /// Create a new matrix for `size` years with all cells set to the default value
    pub fn new(size: usize) -> Self {
        Self {
            size,
            data: vec![T::default(); size * size],
        }
    }

    fn offset(&self, cohort: usize, year: usize) -> usize {
        assert!(
            cohort < self.size && year < self.size,
            "Cohort matrix index ({cohort}, {year}) out of range for size {}",
            self.size
        );
        cohort * self.size + year
    }

    /// Get the value for `cohort` in `year`
    pub fn get(&self, cohort: usize, year: usize) -> T {
        self.data[self.offset(cohort, year)]
    }

    /// Set the value for `cohort` in `year`
    pub fn set(&mut self, cohort: usize, year: usize, value: T) {
        let offset = self.offset(cohort, year);
        self.data[offset] = value;
    }

    /// Iterate over the values of every cohort in `year`
    pub fn iter_year(&self, year: usize) -> impl Iterator<Item = T> + '_ {
        self.data.iter().skip(year).step_by(self.size).copied()
    }

    /// Iterate over every cell as `(cohort, year, value)`, skipping years before each cohort's
    /// installation
    pub fn iter_cells(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        (0..self.size).flat_map(move |cohort| {
            (cohort..self.size).map(move |year| (cohort, year, self.get(cohort, year)))
        })
    }
}

impl<T: Copy + Default + Sum> CohortMatrix<T> {
    /// Sum over cohorts for each year
    pub fn year_totals(&self) -> Vec<T> {
        (0..self.size)
            .map(|year| self.iter_year(year).sum())
            .collect()
    }
}

impl<T: Copy + Default> CohortMatrix<T> {
    /// Sum over cohorts for each year, after scaling each cohort's values by a per-cohort weight
    pub fn weighted_year_totals<W, O>(&self, weights: &[W]) -> Vec<O>
    where
        W: Copy,
        T: Mul<W, Output = O>,
        O: Sum,
    {
        assert_eq!(weights.len(), self.size, "One weight is needed per cohort");

        (0..self.size)
            .map(|year| {
                self.iter_year(year)
                    .zip(weights)
                    .map(|(value, weight)| value * *weight)
                    .sum()
            })
            .collect()
    }
}
