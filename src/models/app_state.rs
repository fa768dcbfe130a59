use crate::models::config::DEFAULT_DPI;
use crate::models::selection::FormatSelection;
use crate::models::worklist::Worklist;
use camino::Utf8PathBuf;

/// Lifecycle of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    Planning,
    Running,
    Completed,
}

/// Progress of the current (or last) run.
///
/// Written by the run task, read by presenters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunState {
    pub phase: RunPhase,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub status_message: String,

    // Results
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunState {
    /// Completion percentage in `0.0..=100.0`.
    ///
    /// A completed run always reports 100, including runs with no tasks.
    pub fn percent(&self) -> f64 {
        if self.phase == RunPhase::Completed {
            return 100.0;
        }
        if self.total_tasks == 0 {
            return 0.0;
        }
        (self.completed_tasks as f64 / self.total_tasks as f64 * 100.0).min(100.0)
    }

    /// True while a run is planning or executing
    pub fn is_active(&self) -> bool {
        matches!(self.phase, RunPhase::Planning | RunPhase::Running)
    }
}

/// Single source of truth for the conversion session.
///
/// Wrapped in `Arc<RwLock<AppState>>` by [`crate::state::StateManager`];
/// never mutate it directly, go through `StateManager::update()` so change
/// events are emitted.
#[derive(Clone, Debug)]
pub struct AppState {
    // Converter
    pub converter_exe: Option<Utf8PathBuf>,
    pub is_converter_configured: bool,

    // Settings
    pub dpi: u32,

    // Inputs
    pub worklist: Worklist,
    pub selection: FormatSelection,

    // Runtime state
    pub run: RunState,
    pub current_task: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            converter_exe: None,
            is_converter_configured: false,
            dpi: DEFAULT_DPI,
            worklist: Worklist::new(),
            selection: FormatSelection::new(),
            run: RunState::default(),
            current_task: None,
        }
    }
}

impl AppState {
    pub fn is_running(&self) -> bool {
        self.run.is_active()
    }

    /// Result counters of the last run as (succeeded, failed, skipped, total).
    pub fn run_stats(&self) -> (usize, usize, usize, usize) {
        (
            self.run.succeeded,
            self.run.failed,
            self.run.skipped,
            self.run.total_tasks,
        )
    }

    /// Reset run progress to its initial values.
    pub fn reset_run_state(&mut self) {
        self.run = RunState::default();
        self.current_task = None;
    }

    /// Mark the run as finished at 100% with the given message.
    pub fn finish_run(&mut self, message: impl Into<String>) {
        self.run.phase = RunPhase::Completed;
        self.run.completed_tasks = self.run.total_tasks;
        self.run.status_message = message.into();
        self.current_task = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = AppState::default();
        assert!(!state.is_converter_configured);
        assert_eq!(state.dpi, 300);
        assert_eq!(state.run.phase, RunPhase::Idle);
    }

    #[test]
    fn test_percent() {
        let mut run = RunState {
            phase: RunPhase::Running,
            total_tasks: 4,
            completed_tasks: 1,
            ..RunState::default()
        };
        assert_eq!(run.percent(), 25.0);

        run.completed_tasks = 4;
        assert_eq!(run.percent(), 100.0);

        let empty = RunState::default();
        assert_eq!(empty.percent(), 0.0);
    }

    #[test]
    fn test_completed_is_always_full() {
        let mut state = AppState::default();
        state.run.phase = RunPhase::Running;
        state.run.total_tasks = 0;

        state.finish_run("Nothing to do");

        assert_eq!(state.run.percent(), 100.0);
        assert_eq!(state.run.status_message, "Nothing to do");
        assert!(!state.is_running());
    }

    #[test]
    fn test_is_running_covers_planning_and_running() {
        let mut state = AppState::default();
        assert!(!state.is_running());

        state.run.phase = RunPhase::Planning;
        assert!(state.is_running());

        state.run.phase = RunPhase::Running;
        assert!(state.is_running());

        state.run.phase = RunPhase::Completed;
        assert!(!state.is_running());
    }

    #[test]
    fn test_reset_run_state() {
        let mut state = AppState::default();
        state.run.phase = RunPhase::Completed;
        state.run.total_tasks = 3;
        state.run.failed = 1;
        state.current_task = Some("a.svg -> PNG".to_string());

        state.reset_run_state();

        assert_eq!(state.run, RunState::default());
        assert!(state.current_task.is_none());
        assert_eq!(state.run_stats(), (0, 0, 0, 0));
    }
}
