//! Data models for figconv.
//!
//! - [`OutputFormat`] / [`FormatKind`]: the fixed format registry
//! - [`Worklist`] / [`InputFile`]: ordered, de-duplicated input files
//! - [`FormatSelection`]: per-format selection and availability (compatibility filter)
//! - [`AppState`]: the session state held by [`StateManager`](crate::state::StateManager)
//! - [`UserConfig`]: settings loaded from `figconv.yaml`

pub mod app_state;
pub mod config;
pub mod format;
pub mod selection;
pub mod worklist;

pub use app_state::{AppState, RunPhase, RunState};
pub use config::{DEFAULT_DPI, MAX_DPI, MIN_DPI, UserConfig, clamp_dpi};
pub use format::{FormatKind, OutputFormat, classify, extension_for};
pub use selection::{FormatFlags, FormatSelection, SelectionError};
pub use worklist::{InputFile, Worklist, WorklistError};
