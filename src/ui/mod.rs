// UI module - presentation layer
//
// This module contains:
// - EventLoopBridge: Carries state changes from the tokio runtime to a presenter thread
// - ConsolePresenter: Renders runs on the terminal
// - SessionController: Session commands and run orchestration

pub mod bridge;
pub mod console;
pub mod controller;

pub use bridge::{EventLoopBridge, Presenter};
pub use console::{ConsolePresenter, Verbosity};
pub use controller::{RunHandle, SessionController};
