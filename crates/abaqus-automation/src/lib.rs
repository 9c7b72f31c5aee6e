//! Drives a running Abaqus/CAE session through its accessibility tree.
//!
//! Abaqus exposes no scripting IPC once the GUI is up; the only seam is the
//! UI itself. This crate finds the main window, pushes a Python script
//! through the File > Run Script dialog and scrapes the message area, all
//! over a small backend trait so the logic stays testable off-Windows.

pub mod automator;
pub mod backend;
pub mod config;
pub mod controls;
pub mod dialog;
pub mod errors;
pub mod locator;
pub mod mock;
pub mod platforms;
pub mod scraper;

pub use automator::GuiAutomator;
pub use backend::{Bounds, ControlRole, TopLevelWindow, UiBackend, UiConnection, UiNode, WindowHandle};
pub use config::{Delays, GuiConfig};
pub use errors::AutomationError;
pub use platforms::default_backend;
