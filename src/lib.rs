//! Common functionality for pvflow.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod cli;
pub mod id;
pub mod input;
pub mod log;
pub mod material;
pub mod model;
pub mod output;
pub mod reliability;
pub mod scenario;
pub mod settings;
pub mod simulation;
pub mod units;
pub mod year;

#[cfg(test)]
mod fixture;

/// Get the directory in which program config files are stored.
///
/// Falls back to the current directory on platforms without a config dir.
pub fn get_pvflow_config_dir() -> PathBuf {
    let Some(mut config_dir) = dirs::config_dir() else {
        return PathBuf::new();
    };
    config_dir.push("pvflow");

    config_dir
}
