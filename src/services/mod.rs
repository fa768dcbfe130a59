//! Services module - Conversion logic independent of any front end.
//!
//! # Components
//!
//! - [`planner`]: expands files × formats into [`ConversionTask`]s, skipping
//!   pairs whose source already has the target format
//! - [`converter`]: builds converter command lines and runs the executable
//!   behind the [`Converter`] trait
//! - [`runner`]: executes planned tasks sequentially and reports progress
//!   through the [`StateManager`](crate::state::StateManager)
//! - [`discovery`]: locates the converter executable
//!
//! # Converter Integration
//!
//! Each task is one invocation of the form
//! `<exe> <input> --export-type=<ext> --export-filename=<output> [--export-dpi=<n>]`.
//! Exit code 0 means success; anything written to stderr is kept as the
//! diagnostic of a failed task.

pub mod converter;
pub mod discovery;
pub mod planner;
pub mod runner;

pub use converter::{
    Converter, ConverterCommand, ConverterError, ProcessConverter, ProcessOutput, build_command,
};
pub use discovery::{
    ExecutableLocator, SystemLocator, discover_converter, pick_converter_interactively,
};
pub use planner::{ConversionTask, JobPlan, SkippedPair, plan};
pub use runner::{
    JobResult, JobRunner, JobStatus, RunError, RunOutcome, RunRequest, RunSummary,
};
