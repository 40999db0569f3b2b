//! Common routines for handling input data.
use crate::id::{HasID, IDLike};
use crate::model::{MissingValuePolicy, Model, ModelParameters};
use crate::units::Percent;
use anyhow::{Context, Result, bail, ensure};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

pub mod material;
use material::read_materials;
pub mod scenario;
use scenario::read_scenarios;

/// Read a series of type `T`s from a CSV file.
///
/// Will raise an error if the file is empty.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<'a, T: DeserializeOwned + 'a>(
    file_path: &'a Path,
) -> Result<impl Iterator<Item = T> + 'a> {
    let vec = read_csv_internal(file_path)?;
    if vec.is_empty() {
        bail!("CSV file {} cannot be empty", file_path.display());
    }

    Ok(vec.into_iter())
}

fn read_csv_internal<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let vec = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| input_err_msg(file_path))?
        .into_deserialize()
        .process_results(|iter| iter.collect_vec())
        .with_context(|| input_err_msg(file_path))?;

    Ok(vec)
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Format an error message to include the file path. To be used with `anyhow::Context`.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().to_string_lossy())
}

/// Read a CSV file of items with IDs.
///
/// As this function is only ever used for top-level CSV files (i.e. the ones which actually define
/// the IDs for a given type), we use an ordered map to maintain the order in the input files.
pub fn read_csv_id_file<T, ID: IDLike>(file_path: &Path) -> Result<IndexMap<ID, T>>
where
    T: HasID<ID> + DeserializeOwned,
{
    fn fill_and_validate_map<T, ID: IDLike>(file_path: &Path) -> Result<IndexMap<ID, T>>
    where
        T: HasID<ID> + DeserializeOwned,
    {
        let mut map = IndexMap::new();
        for record in read_csv::<T>(file_path)? {
            let id = record.get_id().clone();
            let existing = map.insert(id.clone(), record).is_some();
            ensure!(!existing, "Duplicate ID found: {id}");
        }

        Ok(map)
    }

    fill_and_validate_map(file_path).with_context(|| input_err_msg(file_path))
}

/// Indicates whether the elements of the iterator are sorted and unique
pub fn is_sorted_and_unique<T, I>(iter: I) -> bool
where
    T: PartialOrd + Clone,
    I: IntoIterator<Item = T>,
{
    iter.into_iter().tuple_windows().all(|(a, b)| a < b)
}

/// Resolve a numeric cell which may be empty or NaN, according to the model's policy
pub fn resolve_missing(
    value: Option<f64>,
    column: &str,
    policy: MissingValuePolicy,
) -> Result<f64> {
    match value {
        Some(value) if !value.is_nan() => Ok(value),
        _ => match policy {
            MissingValuePolicy::Error => bail!("Missing or NaN value for {column}"),
            MissingValuePolicy::Zero => Ok(0.0),
        },
    }
}

/// Check that a value is a percentage between 0 and 100
pub fn check_percentage(value: f64, column: &str) -> Result<Percent> {
    ensure!(
        (0.0..=100.0).contains(&value),
        "{column} must be a percentage between 0 and 100 (got {value})"
    );

    Ok(Percent(value))
}

/// Check that a value is a yield, i.e. a percentage greater than 0 and at most 100
pub fn check_yield(value: f64, column: &str) -> Result<Percent> {
    ensure!(
        value > 0.0 && value <= 100.0,
        "{column} must be greater than 0 and at most 100 (got {value})"
    );

    Ok(Percent(value))
}

/// Check that a value is finite and not negative
pub fn check_non_negative(value: f64, column: &str) -> Result<f64> {
    ensure!(
        value.is_finite() && value >= 0.0,
        "{column} must be a finite, non-negative number (got {value})"
    );

    Ok(value)
}

/// Read a model from the specified directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// The static model data ([`Model`]) or an error.
pub fn load_model<P: AsRef<Path>>(model_dir: P) -> Result<Model> {
    let model_dir = model_dir.as_ref();
    let parameters = ModelParameters::from_path(model_dir)?;
    let scenarios = read_scenarios(model_dir, parameters.missing_values)?;
    let materials = read_materials(model_dir, &scenarios, parameters.missing_values)?;

    Ok(Model {
        model_path: model_dir.to_path_buf(),
        parameters,
        scenarios,
        materials,
    })
}
