// Session Controller - Drives a conversion session
//
// This module contains the SessionController which coordinates between:
// - The front end (CLI arguments today)
// - StateManager (session state and events)
// - JobRunner (conversion execution)
//
// It handles:
// - Worklist, format and settings commands
// - Run validation and spawning
// - Finalizing run state, including after a crashed run task

use crate::models::{InputFile, OutputFormat, SelectionError};
use crate::services::converter::{Converter, ProcessConverter};
use crate::services::planner;
use crate::services::runner::{JobRunner, RunError, RunRequest, RunSummary};
use crate::state::{StateChange, StateManager};
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Session controller that owns the run lifecycle
///
/// All mutations go through the shared [`StateManager`], so any subscribed
/// presenter sees them. At most one run is active at a time; a second
/// [`start_run()`](Self::start_run) is rejected with [`RunError::RunInProgress`].
///
/// # Example
/// ```ignore
/// let controller = SessionController::new(state_manager, runtime.handle().clone());
/// controller.add_files(["figure.svg"]);
/// controller.set_format_selected(OutputFormat::Png, true)?;
/// let summary = runtime.block_on(controller.start_run()?.wait())?;
/// ```
pub struct SessionController<C: Converter + 'static = ProcessConverter> {
    /// Shared state manager
    state_manager: Arc<StateManager>,

    /// Converter backend used by runs
    converter: Arc<C>,

    /// Handle to the tokio runtime for spawning runs
    tokio_handle: tokio::runtime::Handle,
}

impl SessionController<ProcessConverter> {
    /// Create a controller that runs the real converter executable
    pub fn new(state_manager: Arc<StateManager>, tokio_handle: tokio::runtime::Handle) -> Self {
        Self::with_converter(state_manager, Arc::new(ProcessConverter), tokio_handle)
    }
}

impl<C: Converter + 'static> SessionController<C> {
    pub fn with_converter(
        state_manager: Arc<StateManager>,
        converter: Arc<C>,
        tokio_handle: tokio::runtime::Handle,
    ) -> Self {
        tracing::info!("Session controller initialized");
        Self {
            state_manager,
            converter,
            tokio_handle,
        }
    }

    pub fn state_manager(&self) -> &Arc<StateManager> {
        &self.state_manager
    }

    // ===== Session commands =====

    /// Add files to the worklist, returning the ones actually added
    pub fn add_files<I, P>(&self, paths: I) -> Vec<InputFile>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Utf8Path>,
    {
        let added = self.state_manager.add_files(paths);
        tracing::info!("Added {} files to worklist", added.len());
        added
    }

    pub fn remove_file(&self, path: &Utf8Path) -> bool {
        self.state_manager.remove_file(path)
    }

    /// Empty the worklist. Format restrictions stay until [`reset_formats()`](Self::reset_formats).
    pub fn clear_files(&self) -> Vec<StateChange> {
        self.state_manager.clear_files()
    }

    pub fn set_format_selected(
        &self,
        format: OutputFormat,
        selected: bool,
    ) -> Result<Vec<StateChange>, SelectionError> {
        self.state_manager.set_format_selected(format, selected)
    }

    pub fn toggle_format(&self, format: OutputFormat) -> Result<bool, SelectionError> {
        self.state_manager.toggle_format(format)
    }

    /// Lift all format restrictions and clear the selection
    pub fn reset_formats(&self) -> Vec<StateChange> {
        self.state_manager.reset_format_availability()
    }

    /// Set the DPI; clamped to 72..=600. Also applies to pending tasks of an active run.
    pub fn set_dpi(&self, dpi: u32) -> Vec<StateChange> {
        self.state_manager.set_dpi(dpi)
    }

    pub fn set_converter_path(&self, path: Option<Utf8PathBuf>) -> Vec<StateChange> {
        match &path {
            Some(p) => tracing::info!("Converter set to {}", p),
            None => tracing::warn!("Converter path cleared"),
        }
        self.state_manager.set_converter_exe(path)
    }

    // ===== Run orchestration =====

    /// Validate the session and start a run in the background
    ///
    /// The worklist, selection and DPI are captured now. Returns the reason
    /// when the run cannot start.
    pub fn start_run(&self) -> Result<RunHandle, RunError> {
        let request = self.state_manager.begin_planning().inspect_err(|e| {
            tracing::warn!("Run rejected: {}", e);
        })?;

        let state = Arc::clone(&self.state_manager);
        let converter = Arc::clone(&self.converter);

        let task = self.tokio_handle.spawn(async move {
            let workflow_state = Arc::clone(&state);
            let workflow = tokio::spawn(Self::run_conversion_workflow(
                workflow_state,
                converter,
                request,
            ));

            match workflow.await {
                Ok(summary) => Ok(summary),
                Err(e) => {
                    tracing::error!("Conversion task ended abnormally: {}", e);
                    let reason = if e.is_panic() {
                        "conversion task panicked".to_string()
                    } else {
                        e.to_string()
                    };
                    state.abort_run(&reason);
                    Err(RunError::Aborted(reason))
                }
            }
        });

        Ok(RunHandle { task })
    }

    /// Plan and execute one run
    ///
    /// 1. Plans tasks from the captured files and formats
    /// 2. Finishes immediately with "nothing to do" when no task remains
    /// 3. Runs every task sequentially through [`JobRunner`]
    /// 4. Publishes the summary
    async fn run_conversion_workflow(
        state: Arc<StateManager>,
        converter: Arc<C>,
        request: RunRequest,
    ) -> RunSummary {
        tracing::info!(
            "Starting conversion workflow: {} files, formats {:?}",
            request.files.len(),
            request.formats
        );

        let plan = planner::plan(&request.files, &request.formats, request.dpi);
        let skipped = plan.skipped.len();

        if plan.is_empty() {
            let summary = RunSummary::nothing_to_do(skipped);
            tracing::info!("{}", summary.message());
            state.finish_run(&summary);
            return summary;
        }

        state.start_running(plan.total_tasks(), skipped);

        let runner = JobRunner::new(converter, Arc::clone(&state));
        let results = runner.run(&request.converter_exe, plan.tasks).await;

        let summary = RunSummary::from_results(&results, skipped);
        tracing::info!("Conversion workflow completed: {}", summary.message());
        state.finish_run(&summary);

        summary
    }
}

/// Handle to a run started by [`SessionController::start_run`]
pub struct RunHandle {
    task: JoinHandle<Result<RunSummary, RunError>>,
}

impl RunHandle {
    /// Wait for the run to finish.
    ///
    /// Run state is already finalized when this resolves, whatever the outcome.
    pub async fn wait(self) -> Result<RunSummary, RunError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(RunError::Aborted(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RunPhase;
    use crate::services::converter::{ConverterCommand, ConverterError, ProcessOutput};
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    struct AlwaysOk;

    impl Converter for AlwaysOk {
        async fn convert(&self, _command: &ConverterCommand) -> Result<ProcessOutput, ConverterError> {
            Ok(ProcessOutput {
                exit_code: Some(0),
                stderr: Vec::new(),
                duration: Duration::ZERO,
            })
        }
    }

    struct Panics;

    impl Converter for Panics {
        async fn convert(&self, _command: &ConverterCommand) -> Result<ProcessOutput, ConverterError> {
            panic!("converter backend crashed");
        }
    }

    fn touch(dir: &TempDir, name: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::try_from(dir.path().join(name)).unwrap();
        fs::write(&path, b"").unwrap();
        path
    }

    fn controller<C: Converter + 'static>(converter: C) -> SessionController<C> {
        let state = Arc::new(StateManager::new());
        state.set_converter_exe(Some(Utf8PathBuf::from("/usr/bin/inkscape")));
        SessionController::with_converter(
            state,
            Arc::new(converter),
            tokio::runtime::Handle::current(),
        )
    }

    #[tokio::test]
    async fn test_start_run_requires_formats() {
        let dir = TempDir::new().unwrap();
        let controller = controller(AlwaysOk);
        controller.add_files([touch(&dir, "a.svg")]);

        assert!(matches!(
            controller.start_run(),
            Err(RunError::NoFormatsSelected)
        ));
    }

    #[tokio::test]
    async fn test_run_converts_and_finishes() {
        let dir = TempDir::new().unwrap();
        let controller = controller(AlwaysOk);
        controller.add_files([touch(&dir, "a.svg")]);
        controller.set_format_selected(OutputFormat::Png, true).unwrap();
        controller.set_format_selected(OutputFormat::Pdf, true).unwrap();

        let summary = controller.start_run().unwrap().wait().await.unwrap();

        assert_eq!(summary.total_tasks, 2);
        assert_eq!(summary.succeeded, 2);

        let state = controller.state_manager().snapshot();
        assert_eq!(state.run.phase, RunPhase::Completed);
        assert_eq!(state.run.percent(), 100.0);
    }

    #[tokio::test]
    async fn test_nothing_to_do() {
        let dir = TempDir::new().unwrap();
        let controller = controller(AlwaysOk);
        controller.add_files([touch(&dir, "a.svg")]);
        controller.set_format_selected(OutputFormat::Svg, true).unwrap();

        let summary = controller.start_run().unwrap().wait().await.unwrap();

        assert_eq!(summary, RunSummary::nothing_to_do(1));
        assert_eq!(controller.state_manager().read(|s| s.run.percent()), 100.0);
    }

    #[tokio::test]
    async fn test_panicking_run_is_finalized() {
        let dir = TempDir::new().unwrap();
        let controller = controller(Panics);
        controller.add_files([touch(&dir, "a.svg")]);
        controller.set_format_selected(OutputFormat::Pdf, true).unwrap();

        let result = controller.start_run().unwrap().wait().await;

        assert!(matches!(result, Err(RunError::Aborted(_))));
        let state = controller.state_manager().snapshot();
        assert_eq!(state.run.phase, RunPhase::Completed);
        assert!(state.run.status_message.starts_with("Conversion aborted"));
    }

    #[tokio::test]
    async fn test_clear_then_reset_formats() {
        let dir = TempDir::new().unwrap();
        let controller = controller(AlwaysOk);
        controller.add_files([touch(&dir, "photo.png")]);

        controller.clear_files();
        assert_eq!(
            controller.set_format_selected(OutputFormat::Pdf, true),
            Err(SelectionError::Unavailable(OutputFormat::Pdf))
        );

        controller.reset_formats();
        assert!(controller.toggle_format(OutputFormat::Pdf).unwrap());
    }
}
