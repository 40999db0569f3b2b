//! Code for working with years.
use crate::input::is_sorted_and_unique;
use anyhow::{Result, bail, ensure};
use itertools::Itertools;

/// Check that years form an unbroken, increasing sequence (e.g. 2020, 2021, 2022).
///
/// # Arguments
///
/// - `years` - The years to check
pub fn check_years_contiguous(years: &[u32]) -> Result<()> {
    ensure!(!years.is_empty(), "No years provided");
    ensure!(
        is_sorted_and_unique(years),
        "Years must be in order and unique"
    );

    if let Some((a, b)) = years.iter().tuple_windows().find(|&(a, b)| b - a != 1) {
        bail!("Years must be contiguous (found gap between {a} and {b})");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use rstest::rstest;

    #[rstest]
    #[case(&[2020])]
    #[case(&[2020, 2021, 2022])]
    fn test_check_years_contiguous_valid(#[case] years: &[u32]) {
        assert!(check_years_contiguous(years).is_ok());
    }

    #[rstest]
    #[case(&[], "No years provided")]
    #[case(&[2021, 2020], "Years must be in order and unique")]
    #[case(&[2020, 2020], "Years must be in order and unique")]
    #[case(&[2020, 2021, 2023], "Years must be contiguous (found gap between 2021 and 2023)")]
    fn test_check_years_contiguous_invalid(#[case] years: &[u32], #[case] error_msg: &str) {
        assert_error!(check_years_contiguous(years), error_msg);
    }
}
