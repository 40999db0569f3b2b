//! Command-line interface: argument parsing and the top-level commands.
use crate::input::load_model;
use crate::log;
use crate::output::{create_output_directory, get_output_dir};
use crate::settings::Settings;
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod example;
use example::ExampleSubcommands;
pub mod settings;
use settings::SettingsSubcommands;

/// PV module mass flow calculator
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Command to run. Help is printed if absent.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Print the CLI reference as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Options shared by `run` and `example run`
#[derive(Args, Default)]
pub struct RunOpts {
    /// Folder to write results to (defaults to `pvflow_results/<model name>`)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Replace the output folder if it already has files in it
    #[arg(long)]
    pub overwrite: bool,
    /// Also write per-cohort survival data
    #[arg(long)]
    pub debug_model: bool,
}

/// Top-level commands
#[derive(Subcommand)]
enum Commands {
    /// Run a mass flow model.
    Run {
        /// Folder containing the model's input files.
        model_dir: PathBuf,
        /// Output options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Manage example models.
    Example {
        /// What to do with the bundled examples.
        #[command(subcommand)]
        subcommand: ExampleSubcommands,
    },
    /// Check a model's input files without running it.
    Validate {
        /// Folder containing the model's input files.
        model_dir: PathBuf,
    },
    /// View or edit program settings.
    Settings {
        /// What to do with the settings file.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Dispatch to the handler for this command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { model_dir, opts } => handle_run_command(&model_dir, &opts, None),
            Self::Example { subcommand } => subcommand.execute(),
            Self::Validate { model_dir } => handle_validate_command(&model_dir, None),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse command-line arguments and run the requested command
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    let Some(command) = cli.command else {
        println!("{}", Cli::command().render_long_help());
        return Ok(());
    };

    command.execute()
}

/// Use the given settings, or read them from the settings file
fn settings_or_load(settings: Option<Settings>) -> Result<Settings> {
    match settings {
        Some(settings) => Ok(settings),
        None => Settings::load().context("Failed to load settings."),
    }
}

/// Run the model in `model_path`, writing results according to `opts`.
///
/// Command-line flags can switch on `overwrite` and `debug_model` but never switch them off.
pub fn handle_run_command(
    model_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let mut settings = settings_or_load(settings)?;
    settings.debug_model |= opts.debug_model;
    settings.overwrite |= opts.overwrite;

    let output_path = match &opts.output_dir {
        Some(dir) => dir.clone(),
        None => get_output_dir(model_path)?,
    };
    let output_path = output_path.as_path();
    let overwrite =
        create_output_directory(output_path, settings.overwrite).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        })?;

    log::init(Some(&settings.log_level), Some(output_path))
        .context("Failed to initialise logging.")?;
    if overwrite {
        warn!("Replaced existing output folder {}", output_path.display());
    }

    let model = load_model(model_path).context("Failed to load model.")?;
    info!("Loaded model from {}", model_path.display());
    info!("Output folder: {}", output_path.display());

    crate::simulation::run(&model, output_path, settings.debug_model)?;
    info!("Simulation complete!");

    Ok(())
}

/// Load the model in `model_path` and report whether its input files are valid.
///
/// Only console logging is set up, since there is no output folder.
pub fn handle_validate_command(model_path: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = settings_or_load(settings)?;
    log::init(Some(&settings.log_level), None).context("Failed to initialise logging.")?;

    let model = load_model(model_path).context("Failed to validate model.")?;
    info!(
        "Model validation successful! ({} scenarios, {} materials)",
        model.scenarios.len(),
        model.materials.len()
    );

    Ok(())
}
