//! Seam between the automation logic and the OS accessibility backend.
//!
//! Everything above this module reasons in terms of these traits; the
//! Windows UI Automation implementation lives in [`crate::platforms`] and a
//! scriptable in-memory implementation in [`crate::mock`]. Nodes and
//! connections are transient references into a live UI tree: they are only
//! valid for the duration of one operation and are never cached, with the
//! single exception of the locator's session pair.

use std::time::Duration;

use crate::errors::AutomationError;

/// Opaque OS-level identifier of a top-level window. Becomes invalid when
/// the underlying window closes.
pub type WindowHandle = isize;

#[derive(Debug, Clone)]
pub struct TopLevelWindow {
    pub handle: WindowHandle,
    pub title: String,
}

/// The accessibility roles this crate cares about. Deliberately tiny: the
/// Abaqus tree is searched by role plus heuristics, never by automation ID,
/// because the application exposes none that survive a version bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlRole {
    Window,
    Pane,
    Edit,
    Button,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bounds {
    pub width: i32,
    pub height: i32,
}

/// Entry point: window enumeration, process introspection and connection.
pub trait UiBackend: Send + Sync {
    fn top_level_windows(&self) -> Result<Vec<TopLevelWindow>, AutomationError>;

    /// Executable name of the process owning `window`.
    fn process_name(&self, window: WindowHandle) -> Result<String, AutomationError>;

    /// Attaches to the process owning `window`, bounded by `timeout`.
    fn connect(
        &self,
        window: WindowHandle,
        timeout: Duration,
    ) -> Result<Box<dyn UiConnection>, AutomationError>;
}

/// A live attachment to one process's UI tree.
pub trait UiConnection: Send {
    /// The window object for a previously enumerated handle.
    fn window(&self, handle: WindowHandle) -> Result<Box<dyn UiNode>, AutomationError>;

    /// The process's current top-level window, whichever the backend reports.
    fn top_window(&self) -> Result<Box<dyn UiNode>, AutomationError>;

    /// The process's currently active (focused) window.
    fn active_window(&self) -> Result<Box<dyn UiNode>, AutomationError>;
}

/// One element of the accessibility tree.
pub trait UiNode: Send {
    fn exists(&self) -> bool;
    fn is_visible(&self) -> bool;
    fn is_minimized(&self) -> bool;
    /// Whether the element accepts user edits (value pattern not read-only).
    fn is_editable(&self) -> bool;
    fn title(&self) -> String;
    fn class_name(&self) -> String;
    fn bounds(&self) -> Bounds;

    fn restore(&self) -> Result<(), AutomationError>;
    fn focus(&self) -> Result<(), AutomationError>;
    /// Walks the window's menu bar along `path` and activates the last item.
    fn select_menu_path(&self, path: &[String]) -> Result<(), AutomationError>;

    /// Visible windows anywhere below this node (recursive).
    fn visible_child_windows(&self) -> Vec<Box<dyn UiNode>>;
    /// All descendants of the given role, in tree order.
    fn descendants(&self, role: ControlRole) -> Vec<Box<dyn UiNode>>;
    /// Descendant of `role` whose accessible name is exactly `name`.
    fn find_by_name(&self, role: ControlRole, name: &str) -> Option<Box<dyn UiNode>>;
    /// The `index`-th descendant of `role`.
    fn find_by_index(&self, role: ControlRole, index: usize) -> Option<Box<dyn UiNode>>;
    /// First descendant of `role`, found by the cheapest lookup the backend has.
    fn first_of_role(&self, role: ControlRole) -> Option<Box<dyn UiNode>>;

    fn set_text(&self, text: &str) -> Result<(), AutomationError>;
    /// The element's displayed text as the backend reports it: a nested
    /// grouping of lines where groups and lines may be empty.
    fn text_blocks(&self) -> Vec<Vec<String>>;
    fn invoke(&self) -> Result<(), AutomationError>;
    fn close(&self) -> Result<(), AutomationError>;
}
