use crate::models::{InputFile, OutputFormat};
use crate::services::converter::{Converter, build_command};
use crate::services::planner::ConversionTask;
use crate::state::StateManager;
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Conditions that prevent a run from starting or finishing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    #[error("Converter executable not configured")]
    ConverterNotConfigured,

    #[error("No files selected for conversion")]
    EmptyWorklist,

    #[error("Select at least one output format")]
    NoFormatsSelected,

    #[error("A conversion run is already in progress")]
    RunInProgress,

    #[error("Conversion aborted: {0}")]
    Aborted(String),
}

/// Session inputs captured when a run is accepted.
///
/// Later edits to the worklist or selection do not affect a run in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub converter_exe: Utf8PathBuf,
    pub files: Vec<InputFile>,
    pub formats: Vec<OutputFormat>,
    pub dpi: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Succeeded,
    Failed,
}

/// Outcome of one conversion task
#[derive(Debug, Clone, PartialEq)]
pub struct JobResult {
    pub task: ConversionTask,
    pub status: JobStatus,
    pub diagnostic: Option<String>,
    pub duration: Duration,
}

impl JobResult {
    pub fn succeeded(&self) -> bool {
        self.status == JobStatus::Succeeded
    }

    /// DPI passed to the converter, if any
    pub fn dpi_used(&self) -> Option<u32> {
        self.task.dpi
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Converted,
    NothingToDo,
}

/// Aggregate result of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub total_tasks: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Pairs skipped during planning because the source already had the target format
    pub skipped: usize,
}

impl RunSummary {
    pub fn nothing_to_do(skipped: usize) -> Self {
        Self {
            outcome: RunOutcome::NothingToDo,
            total_tasks: 0,
            succeeded: 0,
            failed: 0,
            skipped,
        }
    }

    pub fn from_results(results: &[JobResult], skipped: usize) -> Self {
        let succeeded = results.iter().filter(|r| r.succeeded()).count();
        Self {
            outcome: RunOutcome::Converted,
            total_tasks: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            skipped,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// User-facing completion message
    pub fn message(&self) -> String {
        match self.outcome {
            RunOutcome::NothingToDo => {
                "Nothing to do: every selected format matches its source file".to_string()
            }
            RunOutcome::Converted if self.failed > 0 => format!(
                "Converted {} of {} tasks ({} failed, {} skipped)",
                self.succeeded, self.total_tasks, self.failed, self.skipped
            ),
            RunOutcome::Converted => format!(
                "Converted {} tasks ({} skipped)",
                self.succeeded, self.skipped
            ),
        }
    }
}

/// Executes planned tasks one after another.
///
/// Progress goes through the [`StateManager`] after every task. A failing
/// task never stops the ones after it.
pub struct JobRunner<C: Converter> {
    converter: Arc<C>,
    state: Arc<StateManager>,
}

impl<C: Converter> JobRunner<C> {
    pub fn new(converter: Arc<C>, state: Arc<StateManager>) -> Self {
        Self { converter, state }
    }

    /// Run every task in order, returning one result per task.
    pub async fn run(&self, converter_exe: &Utf8Path, tasks: Vec<ConversionTask>) -> Vec<JobResult> {
        let mut results = Vec::with_capacity(tasks.len());

        for (index, task) in tasks.into_iter().enumerate() {
            // DPI changes made during the run apply to tasks not yet started
            let dpi = self.state.read(|s| s.dpi);
            let task = task.with_current_dpi(dpi);

            tracing::info!("Converting task {}: {}", index + 1, task.label());
            self.state.task_started(&task);

            let result = self.run_task(converter_exe, task).await;

            match result.status {
                JobStatus::Succeeded => {
                    tracing::info!("Converted: {}", result.task.output_path);
                }
                JobStatus::Failed => {
                    tracing::error!(
                        "Conversion failed: {} - {}",
                        result.task.label(),
                        result.diagnostic.as_deref().unwrap_or("no diagnostic")
                    );
                    self.state.notify_task_failed(&result);
                }
            }

            self.state.record_task_result(&result);
            results.push(result);
        }

        results
    }

    async fn run_task(&self, converter_exe: &Utf8Path, task: ConversionTask) -> JobResult {
        let command = build_command(converter_exe, &task);
        tracing::debug!("Executing command: {}", command.display());

        let start = Instant::now();

        match self.converter.convert(&command).await {
            Ok(output) if output.success() => JobResult {
                task,
                status: JobStatus::Succeeded,
                diagnostic: None,
                duration: output.duration,
            },
            Ok(output) => {
                let stderr = output.diagnostic();
                let diagnostic = if stderr.is_empty() {
                    match output.exit_code {
                        Some(code) => format!("Converter exited with code {}", code),
                        None => "Converter terminated by signal".to_string(),
                    }
                } else {
                    stderr
                };
                JobResult {
                    task,
                    status: JobStatus::Failed,
                    diagnostic: Some(diagnostic),
                    duration: output.duration,
                }
            }
            Err(e) => JobResult {
                task,
                status: JobStatus::Failed,
                diagnostic: Some(e.to_string()),
                duration: start.elapsed(),
            },
        }
    }
}
