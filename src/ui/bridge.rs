// EventLoopBridge - Coordinates between the tokio runtime and the presenter thread
//
// Two execution contexts are involved:
// 1. Tokio's multi-threaded runtime, where runs execute and state events are published
// 2. A single presenter thread that owns the output (terminal, window, ...)
//
// Every StateChange is forwarded onto the presenter thread, in order and
// without loss, through the StateManager's lossless feed.

use crate::state::{StateChange, StateManager};
use anyhow::{Context, Result, anyhow};
use std::thread::JoinHandle;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};

/// Receives state changes on the presenter thread
pub trait Presenter: Send + 'static {
    fn present(&mut self, change: &StateChange);
}

/// Coordinates between the tokio runtime and a presenter running on its own thread
///
/// Every [`StateChange`] published by the [`StateManager`] after construction
/// reaches the presenter exactly once and in emission order. The presenter is
/// only ever touched from its own thread.
///
/// # Example
/// ```ignore
/// let bridge = EventLoopBridge::new(ConsolePresenter::stdout(Verbosity::Normal), &state, handle)?;
/// // ... run conversions ...
/// let presenter = bridge.finish()?;
/// ```
pub struct EventLoopBridge<P: Presenter> {
    /// Stops the event forwarder after it drains pending events
    shutdown_tx: oneshot::Sender<()>,

    presenter_thread: JoinHandle<P>,
}

impl<P: Presenter> EventLoopBridge<P> {
    /// Create a new EventLoopBridge
    ///
    /// Subscribes to `state_manager` immediately, then starts the presenter
    /// thread and a forwarder task on `tokio_handle`.
    pub fn new(
        presenter: P,
        state_manager: &StateManager,
        tokio_handle: tokio::runtime::Handle,
    ) -> Result<Self> {
        // Bounded towards the presenter: a slow terminal slows the forwarder,
        // never the run, and nothing is dropped
        let (presenter_tx, mut presenter_rx) = mpsc::channel::<StateChange>(100);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let presenter_thread = std::thread::Builder::new()
            .name("figconv-presenter".to_string())
            .spawn(move || {
                tracing::debug!("EventLoopBridge presenter thread started");

                let mut presenter = presenter;
                while let Some(change) = presenter_rx.blocking_recv() {
                    presenter.present(&change);
                }

                tracing::debug!("EventLoopBridge presenter thread terminated");
                presenter
            })
            .context("Failed to spawn presenter thread")?;

        let feed = state_manager.subscribe_lossless();
        tokio_handle.spawn(forward_changes(feed, presenter_tx, shutdown_rx));

        Ok(Self {
            shutdown_tx,
            presenter_thread,
        })
    }

    /// Deliver all pending events, stop the presenter thread and return the presenter.
    ///
    /// Must be called from outside the runtime's worker threads; it blocks
    /// until the presenter thread exits.
    pub fn finish(self) -> Result<P> {
        let _ = self.shutdown_tx.send(());

        self.presenter_thread
            .join()
            .map_err(|_| anyhow!("Presenter thread panicked"))
    }
}

/// Forward state changes to the presenter until shutdown.
///
/// On shutdown, events already published are drained before exiting.
async fn forward_changes(
    mut feed: mpsc::UnboundedReceiver<StateChange>,
    tx: mpsc::Sender<StateChange>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;

            received = feed.recv() => match received {
                Some(change) => {
                    if tx.send(change).await.is_err() {
                        tracing::warn!("Presenter thread stopped - ending event forwarding");
                        return;
                    }
                }
                None => {
                    tracing::info!("State feed closed - ending event forwarding");
                    return;
                }
            },

            _ = &mut shutdown_rx => break,
        }
    }

    loop {
        match feed.try_recv() {
            Ok(change) => {
                if tx.send(change).await.is_err() {
                    return;
                }
            }
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
        }
    }

    tracing::debug!("State event forwarder terminated");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingPresenter {
        changes: Vec<StateChange>,
    }

    impl Presenter for RecordingPresenter {
        fn present(&mut self, change: &StateChange) {
            self.changes.push(change.clone());
        }
    }

    /// Sleeps on every event so the presenter falls far behind the producer
    #[derive(Default)]
    struct SlowPresenter {
        seen: usize,
    }

    impl Presenter for SlowPresenter {
        fn present(&mut self, _change: &StateChange) {
            std::thread::sleep(Duration::from_micros(200));
            self.seen += 1;
        }
    }

    #[test]
    fn test_events_reach_presenter_in_order() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let state = StateManager::new();

        let bridge =
            EventLoopBridge::new(RecordingPresenter::default(), &state, rt.handle().clone())
                .unwrap();

        state.set_dpi(100);
        state.set_dpi(200);
        state.set_dpi(300);

        let presenter = bridge.finish().unwrap();

        assert_eq!(
            presenter.changes,
            vec![
                StateChange::SettingsChanged { dpi: 100 },
                StateChange::SettingsChanged { dpi: 200 },
                StateChange::SettingsChanged { dpi: 300 },
            ]
        );

        rt.shutdown_timeout(Duration::from_secs(1));
    }

    #[test]
    fn test_slow_presenter_loses_nothing() {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        let state = StateManager::new();

        let bridge =
            EventLoopBridge::new(SlowPresenter::default(), &state, rt.handle().clone()).unwrap();

        // Far more than the channel capacities, published without yielding
        for dpi in 0..1000u32 {
            state.set_dpi(100 + dpi % 400);
        }

        let presenter = bridge.finish().unwrap();
        assert_eq!(presenter.seen, 1000);

        rt.shutdown_timeout(Duration::from_secs(1));
    }

    #[test]
    fn test_finish_without_events() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let state = StateManager::new();
        let bridge =
            EventLoopBridge::new(RecordingPresenter::default(), &state, rt.handle().clone())
                .unwrap();

        let presenter = bridge.finish().unwrap();
        assert!(presenter.changes.is_empty());

        rt.shutdown_timeout(Duration::from_secs(1));
    }
}
