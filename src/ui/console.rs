//! Terminal presenter for conversion runs.

use crate::models::OutputFormat;
use crate::state::StateChange;
use crate::ui::bridge::Presenter;
use std::io::{self, Stdout, Write};

/// How much the console presenter prints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Failures and the final summary only
    Quiet,
    #[default]
    Normal,
    /// Every state change
    Verbose,
}

/// Renders state changes as lines of text.
pub struct ConsolePresenter<W: Write + Send + 'static> {
    out: W,
    verbosity: Verbosity,
    failures: usize,
}

impl ConsolePresenter<Stdout> {
    pub fn stdout(verbosity: Verbosity) -> Self {
        Self::new(io::stdout(), verbosity)
    }
}

impl<W: Write + Send + 'static> ConsolePresenter<W> {
    pub fn new(out: W, verbosity: Verbosity) -> Self {
        Self {
            out,
            verbosity,
            failures: 0,
        }
    }

    /// Failed tasks seen so far
    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: impl AsRef<str>) {
        if let Err(e) = writeln!(self.out, "{}", text.as_ref()) {
            tracing::warn!("Failed to write console output: {}", e);
        }
    }

    fn format_list(formats: &[OutputFormat]) -> String {
        if formats.is_empty() {
            return "none".to_string();
        }
        formats
            .iter()
            .map(|f| f.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl<W: Write + Send + 'static> Presenter for ConsolePresenter<W> {
    fn present(&mut self, change: &StateChange) {
        let normal = self.verbosity != Verbosity::Quiet;
        let verbose = self.verbosity == Verbosity::Verbose;

        match change {
            StateChange::TaskFailed { task, diagnostic } => {
                self.failures += 1;
                self.line(format!("FAILED {}", task));
                for detail in diagnostic.lines() {
                    self.line(format!("    {}", detail));
                }
            }
            StateChange::RunFinished { summary } => {
                self.line(summary.message());
            }
            StateChange::RunAborted { message } => {
                self.line(message);
            }
            StateChange::RunStarted { total_tasks } if normal => {
                self.line(format!("Converting {} tasks", total_tasks));
            }
            StateChange::ProgressUpdated {
                percent,
                current_task: Some(task),
                ..
            } if normal => {
                self.line(format!("[{:>3.0}%] {}", percent, task));
            }
            StateChange::TaskFinished {
                task,
                succeeded: true,
                message,
            } if verbose => {
                self.line(format!("  ok {} ({})", task, message));
            }
            StateChange::FormatsRestricted { formats } if normal => {
                self.line(format!(
                    "Bitmap input added: {} unavailable",
                    Self::format_list(formats)
                ));
            }
            StateChange::WorklistChanged { len } if verbose => {
                self.line(format!("{} files in worklist", len));
            }
            StateChange::SelectionChanged {
                selected,
                unavailable,
            } if verbose => {
                self.line(format!(
                    "Selected: {} (unavailable: {})",
                    Self::format_list(selected),
                    Self::format_list(unavailable)
                ));
            }
            StateChange::SettingsChanged { dpi } if verbose => {
                self.line(format!("DPI set to {}", dpi));
            }
            StateChange::ConfigurationChanged {
                is_converter_configured,
            } if verbose => {
                let status = if *is_converter_configured {
                    "configured"
                } else {
                    "not configured"
                };
                self.line(format!("Converter {}", status));
            }
            StateChange::StatusChanged { message } if verbose => {
                self.line(format!("status: {}", message));
            }
            _ => {}
        }
    }
}
