//! figconv - batch figure conversion driven by Inkscape
//!
//! Main entry point for the command line application.
//!
//! # Overview
//!
//! The `convert` command initializes:
//! - Logging (daily rotated file, optionally mirrored to stderr)
//! - Tokio async runtime (2 worker threads; runs execute one task at a time)
//! - State management ([`StateManager`])
//! - Configuration loading ([`ConfigManager`])
//! - The presenter bridge and [`SessionController`]
//!
//! # Execution Flow
//!
//! 1. Parse arguments and load `figconv.yaml` (+ `FIGCONV_*` overrides)
//! 2. Initialize logging → `<log_dir>/figconv.<date>`
//! 3. Create the tokio runtime and StateManager, apply the user config
//! 4. Locate the converter (configured path, PATH, install dirs, optional dialog)
//! 5. Add files, select formats, start the run and wait for its summary
//! 6. Flush the presenter, shut down the runtime with a 5s timeout
//!
//! Exit status is 0 when every task succeeded or there was nothing to do.

mod cli;

use anyhow::{Context, Result};
use camino::Utf8Path;
use clap::Parser;
use cli::{Cli, Commands, ConfigCommand, ConvertArgs};
use figconv::models::{FormatKind, SelectionError};
use figconv::services::discovery::{
    SystemLocator, discover_converter, pick_converter_interactively,
};
use figconv::services::runner::RunError;
use figconv::ui::{ConsolePresenter, EventLoopBridge, SessionController};
use figconv::{APP_NAME, ConfigManager, OutputFormat, StateManager, UserConfig, VERSION};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config_manager = ConfigManager::new(&cli.config_dir)?;

    match &cli.command {
        Commands::Formats => {
            print_formats();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config(args) => match args.command {
            ConfigCommand::Show => {
                let user_config = config_manager.load_user_config()?;
                let yaml = serde_yaml_ng::to_string(&user_config)
                    .context("Failed to serialize configuration")?;
                println!("# {}", config_manager.config_path());
                print!("{}", yaml);
                Ok(ExitCode::SUCCESS)
            }
            ConfigCommand::Init => {
                if config_manager.init_user_config()? {
                    println!("Wrote {}", config_manager.config_path());
                } else {
                    println!("{} already exists", config_manager.config_path());
                }
                Ok(ExitCode::SUCCESS)
            }
        },
        Commands::Convert(args) => {
            let user_config = config_manager.load_user_config()?;
            run_convert(args, &user_config, cli.debug)
        }
    }
}

fn print_formats() {
    for format in OutputFormat::ALL {
        println!("{:<4} .{:<4} {}", format.name(), format.extension(), format.kind());
    }
}

fn run_convert(args: &ConvertArgs, user_config: &UserConfig, debug: bool) -> Result<ExitCode> {
    let debug = debug || user_config.debug_mode;
    let _log_guard = figconv::logging::setup_logging_with_console(
        Utf8Path::new(&user_config.log_dir),
        "figconv",
        debug,
        debug,
    )?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("figconv-worker")
        .build()
        .context("Failed to create tokio runtime")?;

    let state_manager = Arc::new(StateManager::new());
    state_manager.load_from_user_config(user_config);

    let bridge = EventLoopBridge::new(
        ConsolePresenter::stdout(args.verbosity()),
        &state_manager,
        runtime.handle().clone(),
    )?;

    let controller = SessionController::new(Arc::clone(&state_manager), runtime.handle().clone());

    // Converter: command line beats config, then discovery, then the dialog
    let configured = args
        .converter
        .clone()
        .or_else(|| state_manager.read(|s| s.converter_exe.clone()));
    let mut converter_exe = discover_converter(configured.as_deref(), &SystemLocator);
    if converter_exe.is_none() && args.pick_converter {
        converter_exe = pick_converter_interactively();
    }
    controller.set_converter_path(converter_exe);

    if let Some(dpi) = args.dpi {
        controller.set_dpi(dpi);
    }

    // Formats given on the command line replace the configured defaults
    if !args.formats.is_empty() {
        controller.reset_formats();
    }

    let added = controller.add_files(&args.files);
    if added.len() < args.files.len() {
        eprintln!(
            "Skipped {} of {} inputs (missing, duplicate or unsupported; see log)",
            args.files.len() - added.len(),
            args.files.len()
        );
    }

    for format in &args.formats {
        match controller.set_format_selected(*format, true) {
            Ok(_) => {}
            Err(SelectionError::Unavailable(f)) => {
                eprintln!(
                    "{} is not available: {} inputs cannot be converted to vector formats",
                    f,
                    FormatKind::Bitmap
                );
            }
        }
    }

    let outcome = match controller.start_run() {
        Ok(handle) => runtime.block_on(handle.wait()),
        Err(e) => Err(e),
    };

    drop(controller);
    let presenter = bridge.finish()?;
    tracing::info!("{} failed tasks reported", presenter.failures());
    runtime.shutdown_timeout(Duration::from_secs(5));

    let exit_code = match outcome {
        Ok(summary) if summary.has_failures() => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        // Already reported by the presenter
        Err(RunError::Aborted(_)) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    };

    tracing::info!("Application shutdown complete");
    Ok(exit_code)
}
