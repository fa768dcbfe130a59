// State management module
//
// This module provides the StateManager which wraps AppState with thread-safe access
// using Arc<RwLock<T>> and emits change events for presenters.

use crate::models::{
    AppState, InputFile, OutputFormat, RunPhase, SelectionError, UserConfig, clamp_dpi,
};
use crate::services::planner::ConversionTask;
use crate::services::runner::{JobResult, RunError, RunRequest, RunSummary};
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::{broadcast, mpsc};

/// Change events emitted when state is modified
///
/// These events are emitted to notify interested parties (primarily the
/// presenter) about state changes without requiring them to poll the state.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// Converter path has been set or cleared
    ConfigurationChanged { is_converter_configured: bool },

    /// Files were added to or removed from the worklist
    WorklistChanged { len: usize },

    /// Selection or availability of output formats changed
    SelectionChanged {
        selected: Vec<OutputFormat>,
        unavailable: Vec<OutputFormat>,
    },

    /// A bitmap input disabled these vector outputs
    FormatsRestricted { formats: Vec<OutputFormat> },

    /// DPI setting changed
    SettingsChanged { dpi: u32 },

    /// A run was accepted and is being planned
    PlanningStarted,

    /// Planning produced tasks and execution has begun
    RunStarted { total_tasks: usize },

    /// Progress has been updated during a run
    ProgressUpdated {
        completed: usize,
        total: usize,
        percent: f64,
        current_task: Option<String>,
    },

    /// Status line text changed
    StatusChanged { message: String },

    /// A task has been processed
    TaskFinished {
        task: String,
        succeeded: bool,
        message: String,
    },

    /// A task failed; carries the converter diagnostic
    TaskFailed { task: String, diagnostic: String },

    /// The run completed normally
    RunFinished { summary: RunSummary },

    /// The run task ended abnormally and was force-completed
    RunAborted { message: String },
}

/// Thread-safe state manager with event emission
///
/// This is the central state management component that:
/// - Provides thread-safe access to [`AppState`] via `Arc<RwLock<T>>`
/// - Detects state changes and emits [`StateChange`] events
/// - Guards run transitions (only one run at a time)
/// - Supports subscribing to state changes via tokio broadcast channels, or
///   through a lossless feed for presenters that must see every event
///
/// # Usage
///
/// Always use `StateManager` instead of accessing [`AppState`] directly:
/// - [`read()`](Self::read) for reading individual fields
/// - [`update()`](Self::update) for mutations with automatic event emission
/// - [`subscribe()`](Self::subscribe) for listening to state changes
///
/// A poisoned lock is recovered rather than propagated, so a run task that
/// panicked can still be finalized.
///
/// # Related Types
///
/// - [`crate::models::AppState`]: The underlying state structure
/// - [`StateChange`]: Event types emitted on state mutations
/// - [`crate::config::ConfigManager`]: Loads configuration applied here
/// - [`crate::ui::controller::SessionController`]: Primary driver of state changes
pub struct StateManager {
    /// The session state protected by RwLock for thread-safe access
    state: Arc<RwLock<AppState>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<StateChange>,

    /// Lossless subscribers; closed ones are pruned on the next event
    feeds: Arc<Mutex<Vec<mpsc::UnboundedSender<StateChange>>>>,
}

impl StateManager {
    /// Create a new StateManager with default state
    ///
    /// The broadcast channel buffers 100 events per subscriber.
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(AppState::default())),
            state_tx,
            feeds: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn read_lock(&self) -> RwLockReadGuard<'_, AppState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, AppState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get an owned snapshot of the current state
    pub fn snapshot(&self) -> AppState {
        self.read_lock().clone()
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let dpi = state_manager.read(|state| state.dpi);
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AppState) -> R,
    {
        let state = self.read_lock();
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// This is the primary way to modify state. It:
    /// 1. Captures the old state
    /// 2. Applies the update function
    /// 3. Detects what changed
    /// 4. Emits appropriate events
    ///
    /// # Returns
    /// The StateChange events that were emitted
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut AppState),
    {
        self.update_with(update_fn).1
    }

    /// Like [`update()`](Self::update), also returning the closure's result.
    ///
    /// The whole closure runs under one write lock, so check-and-set
    /// sequences are atomic.
    pub fn update_with<F, R>(&self, update_fn: F) -> (R, Vec<StateChange>)
    where
        F: FnOnce(&mut AppState) -> R,
    {
        let mut state = self.write_lock();
        let old_state = state.clone();

        let result = update_fn(&mut state);

        let changes = self.detect_changes(&old_state, &state);
        for change in &changes {
            self.publish(change);
        }

        (result, changes)
    }

    /// Subscribe to state change events
    ///
    /// Returns a receiver that will get notified of all future state changes.
    /// Multiple subscribers can listen simultaneously. A receiver that falls
    /// more than 100 events behind skips the oldest ones.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    /// Subscribe to every future state change, without loss
    ///
    /// The queue is unbounded: events pile up while the receiver is behind
    /// and are never skipped. Dropping the receiver unsubscribes.
    pub fn subscribe_lossless(&self) -> mpsc::UnboundedReceiver<StateChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.feeds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    fn publish(&self, change: &StateChange) {
        // Nobody listening is fine
        let _ = self.state_tx.send(change.clone());

        self.feeds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|tx| tx.send(change.clone()).is_ok());
    }

    fn emit(&self, change: StateChange, changes: &mut Vec<StateChange>) {
        self.publish(&change);
        changes.push(change);
    }

    /// Detect what changed between two states and generate events
    fn detect_changes(&self, old: &AppState, new: &AppState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.is_converter_configured != new.is_converter_configured
            || old.converter_exe != new.converter_exe
        {
            changes.push(StateChange::ConfigurationChanged {
                is_converter_configured: new.is_converter_configured,
            });
        }

        if !old
            .worklist
            .iter()
            .map(|f| &f.key)
            .eq(new.worklist.iter().map(|f| &f.key))
        {
            changes.push(StateChange::WorklistChanged {
                len: new.worklist.len(),
            });
        }

        if old.selection != new.selection {
            changes.push(StateChange::SelectionChanged {
                selected: new.selection.selected(),
                unavailable: OutputFormat::ALL
                    .iter()
                    .copied()
                    .filter(|f| !new.selection.is_available(*f))
                    .collect(),
            });
        }

        if old.dpi != new.dpi {
            changes.push(StateChange::SettingsChanged { dpi: new.dpi });
        }

        if old.run.phase != new.run.phase {
            match new.run.phase {
                RunPhase::Planning => changes.push(StateChange::PlanningStarted),
                RunPhase::Running => changes.push(StateChange::RunStarted {
                    total_tasks: new.run.total_tasks,
                }),
                // Completion is announced by finish_run / abort_run with the summary
                RunPhase::Idle | RunPhase::Completed => {}
            }
        }

        if old.run.completed_tasks != new.run.completed_tasks
            || old.run.total_tasks != new.run.total_tasks
            || old.current_task != new.current_task
            || (old.run.phase != new.run.phase && new.run.phase == RunPhase::Completed)
        {
            changes.push(StateChange::ProgressUpdated {
                completed: new.run.completed_tasks,
                total: new.run.total_tasks,
                percent: new.run.percent(),
                current_task: new.current_task.clone(),
            });
        }

        if old.run.status_message != new.run.status_message {
            changes.push(StateChange::StatusChanged {
                message: new.run.status_message.clone(),
            });
        }

        changes
    }

    // Session commands

    /// Set the converter executable and update configuration status
    pub fn set_converter_exe(&self, path: Option<Utf8PathBuf>) -> Vec<StateChange> {
        self.update(|state| {
            state.is_converter_configured = path.is_some();
            state.converter_exe = path;
        })
    }

    /// Set the export DPI, clamped to the supported range
    pub fn set_dpi(&self, dpi: u32) -> Vec<StateChange> {
        let clamped = clamp_dpi(dpi);
        if clamped != dpi {
            tracing::warn!("DPI {} out of range, using {}", dpi, clamped);
        }
        self.update(|state| state.dpi = clamped)
    }

    /// Add files to the worklist and apply the compatibility filter for each new entry.
    ///
    /// Rejected paths are logged and skipped. Returns the newly added files.
    pub fn add_files<I, P>(&self, paths: I) -> Vec<InputFile>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Utf8Path>,
    {
        let ((added, restricted), _) = self.update_with(|state| {
            let added = state.worklist.add_all(paths);
            let restricted: Vec<OutputFormat> = added
                .iter()
                .flat_map(|file| state.selection.apply_input(file.kind))
                .collect();
            (added, restricted)
        });

        if !restricted.is_empty() {
            let mut changes = Vec::new();
            self.emit(
                StateChange::FormatsRestricted {
                    formats: restricted,
                },
                &mut changes,
            );
        }

        added
    }

    /// Remove one file from the worklist; availability is left unchanged
    pub fn remove_file(&self, path: &Utf8Path) -> bool {
        self.update_with(|state| state.worklist.remove(path)).0
    }

    /// Empty the worklist; availability is left unchanged
    pub fn clear_files(&self) -> Vec<StateChange> {
        self.update(|state| state.worklist.clear())
    }

    pub fn set_format_selected(
        &self,
        format: OutputFormat,
        selected: bool,
    ) -> Result<Vec<StateChange>, SelectionError> {
        let (result, changes) =
            self.update_with(|state| state.selection.set_selected(format, selected));
        result.map(|()| changes)
    }

    /// Flip a format's selection, returning the new value
    pub fn toggle_format(&self, format: OutputFormat) -> Result<bool, SelectionError> {
        self.update_with(|state| state.selection.toggle(format)).0
    }

    /// Re-enable all formats and clear the selection
    pub fn reset_format_availability(&self) -> Vec<StateChange> {
        self.update(|state| state.selection.reset_availability())
    }

    // Run lifecycle

    /// Validate the session and move the run into the planning phase.
    ///
    /// Rejections other than [`RunError::RunInProgress`] finalize the run
    /// state with the error as status message. An active run is left as is.
    pub fn begin_planning(&self) -> Result<RunRequest, RunError> {
        self.update_with(|state| {
            if state.is_running() {
                return Err(RunError::RunInProgress);
            }

            let validated = match state.converter_exe.clone() {
                None => Err(RunError::ConverterNotConfigured),
                Some(_) if state.worklist.is_empty() => Err(RunError::EmptyWorklist),
                Some(_) if !state.selection.has_selection() => Err(RunError::NoFormatsSelected),
                Some(converter_exe) => Ok(converter_exe),
            };

            state.reset_run_state();
            match validated {
                Ok(converter_exe) => {
                    state.run.phase = RunPhase::Planning;
                    state.run.status_message = "Planning conversions".to_string();
                    Ok(RunRequest {
                        converter_exe,
                        files: state.worklist.snapshot(),
                        formats: state.selection.selected(),
                        dpi: state.dpi,
                    })
                }
                Err(e) => {
                    state.finish_run(e.to_string());
                    Err(e)
                }
            }
        })
        .0
    }

    /// Enter the running phase with the planned task count
    pub fn start_running(&self, total_tasks: usize, skipped: usize) -> Vec<StateChange> {
        self.update(|state| {
            state.run.phase = RunPhase::Running;
            state.run.total_tasks = total_tasks;
            state.run.completed_tasks = 0;
            state.run.skipped = skipped;
            state.run.status_message = format!("Converting {} tasks", total_tasks);
        })
    }

    /// Mark a task as the one currently executing
    pub fn task_started(&self, task: &ConversionTask) -> Vec<StateChange> {
        let label = task.label();
        self.update(|state| {
            state.run.status_message = format!("Converting {}", label);
            state.current_task = Some(label);
        })
    }

    /// Record the result of a task and advance progress
    pub fn record_task_result(&self, result: &JobResult) -> Vec<StateChange> {
        let label = result.task.label();
        let succeeded = result.succeeded();

        let mut changes = self.update(|state| {
            state.run.completed_tasks += 1;
            if succeeded {
                state.run.succeeded += 1;
            } else {
                state.run.failed += 1;
            }
            state.current_task = None;
            state.run.status_message = format!(
                "{} of {} tasks done",
                state.run.completed_tasks, state.run.total_tasks
            );
        });

        let message = match (&result.diagnostic, succeeded) {
            (_, true) => format!("Wrote {}", result.task.output_path),
            (Some(diagnostic), false) => diagnostic.clone(),
            (None, false) => "Conversion failed".to_string(),
        };

        self.emit(
            StateChange::TaskFinished {
                task: label,
                succeeded,
                message,
            },
            &mut changes,
        );

        changes
    }

    /// Non-blocking failure notification for the presenter
    pub fn notify_task_failed(&self, result: &JobResult) -> Vec<StateChange> {
        let mut changes = Vec::new();
        self.emit(
            StateChange::TaskFailed {
                task: result.task.label(),
                diagnostic: result
                    .diagnostic
                    .clone()
                    .unwrap_or_else(|| "Conversion failed".to_string()),
            },
            &mut changes,
        );
        changes
    }

    /// Complete the run with its summary
    pub fn finish_run(&self, summary: &RunSummary) -> Vec<StateChange> {
        let mut changes = self.update(|state| {
            state.run.succeeded = summary.succeeded;
            state.run.failed = summary.failed;
            state.run.skipped = summary.skipped;
            state.finish_run(summary.message());
        });

        self.emit(
            StateChange::RunFinished {
                summary: summary.clone(),
            },
            &mut changes,
        );

        changes
    }

    /// Force-complete a run whose task ended abnormally
    pub fn abort_run(&self, reason: &str) -> Vec<StateChange> {
        let message = format!("Conversion aborted: {}", reason);

        let mut changes = self.update(|state| state.finish_run(message.clone()));
        self.emit(StateChange::RunAborted { message }, &mut changes);

        changes
    }

    /// Apply the user configuration to the session
    ///
    /// Sets the converter path (when configured), the clamped DPI and the
    /// default format selection.
    pub fn load_from_user_config(&self, user_config: &UserConfig) -> Vec<StateChange> {
        let defaults = user_config.default_output_formats();

        self.update(|state| {
            if !user_config.converter_exe.is_empty() {
                state.converter_exe = Some(Utf8PathBuf::from(&user_config.converter_exe));
                state.is_converter_configured = true;
            }

            state.dpi = clamp_dpi(user_config.dpi);

            for format in defaults {
                if let Err(e) = state.selection.set_selected(format, true) {
                    tracing::warn!("Default format not applied: {}", e);
                }
            }

            tracing::info!(
                "Loaded user config: converter={}, dpi={}, formats={:?}",
                state.is_converter_configured,
                state.dpi,
                state.selection.selected()
            );
        })
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Clones share the same state and channel
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
            feeds: Arc::clone(&self.feeds),
        }
    }
}
