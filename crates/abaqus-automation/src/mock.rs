//! Scriptable in-memory accessibility backend.
//!
//! The real backend talks to a live, non-deterministic UI tree, which makes
//! the discovery and fallback logic untestable against the real thing. This
//! module provides a deterministic stand-in: tests assemble a tree of
//! [`MockElement`]s, wire it into a [`MockBackend`], and afterwards inspect
//! what the automation wrote, invoked, closed or queried.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::backend::{
    Bounds, ControlRole, TopLevelWindow, UiBackend, UiConnection, UiNode, WindowHandle,
};
use crate::errors::AutomationError;

pub struct MockElement {
    pub role: ControlRole,
    pub title: Mutex<String>,
    pub class_name: String,
    pub bounds: Bounds,
    pub editable: bool,
    pub exists: AtomicBool,
    pub visible: AtomicBool,
    pub minimized: AtomicBool,
    pub text_blocks: Mutex<Vec<Vec<String>>>,
    pub children: Mutex<Vec<Arc<MockElement>>>,

    // Interaction records inspected by tests.
    pub entered_text: Mutex<Option<String>>,
    pub invoked: AtomicUsize,
    pub closed: AtomicBool,
    pub focused: AtomicUsize,
    pub restored: AtomicUsize,
    pub menu_selections: Mutex<Vec<Vec<String>>>,
    /// Roles passed to `descendants`, in call order.
    pub role_queries: Mutex<Vec<ControlRole>>,
}

impl MockElement {
    pub fn new(role: ControlRole, title: &str) -> Self {
        Self {
            role,
            title: Mutex::new(title.to_string()),
            class_name: String::new(),
            bounds: Bounds::default(),
            editable: false,
            exists: AtomicBool::new(true),
            visible: AtomicBool::new(true),
            minimized: AtomicBool::new(false),
            text_blocks: Mutex::new(Vec::new()),
            children: Mutex::new(Vec::new()),
            entered_text: Mutex::new(None),
            invoked: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            focused: AtomicUsize::new(0),
            restored: AtomicUsize::new(0),
            menu_selections: Mutex::new(Vec::new()),
            role_queries: Mutex::new(Vec::new()),
        }
    }

    pub fn with_class(mut self, class_name: &str) -> Self {
        self.class_name = class_name.to_string();
        self
    }

    pub fn with_bounds(mut self, width: i32, height: i32) -> Self {
        self.bounds = Bounds { width, height };
        self
    }

    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    pub fn hidden(self) -> Self {
        self.visible.store(false, Ordering::SeqCst);
        self
    }

    pub fn with_text_blocks<S: Into<String>>(self, blocks: Vec<Vec<S>>) -> Self {
        *self.text_blocks.lock().unwrap() = blocks
            .into_iter()
            .map(|group| group.into_iter().map(Into::into).collect())
            .collect();
        self
    }

    pub fn with_child(self, child: Arc<MockElement>) -> Self {
        self.children.lock().unwrap().push(child);
        self
    }

    pub fn shared(self) -> Arc<MockElement> {
        Arc::new(self)
    }

    pub fn set_title(&self, title: &str) {
        *self.title.lock().unwrap() = title.to_string();
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
    }

    pub fn set_exists(&self, exists: bool) {
        self.exists.store(exists, Ordering::SeqCst);
    }

    pub fn add_child(&self, child: Arc<MockElement>) {
        self.children.lock().unwrap().push(child);
    }

    fn collect(&self, role: ControlRole, out: &mut Vec<Arc<MockElement>>) {
        for child in self.children.lock().unwrap().iter() {
            if child.role == role {
                out.push(Arc::clone(child));
            }
            child.collect(role, out);
        }
    }

    fn matching(&self, role: ControlRole) -> Vec<Arc<MockElement>> {
        let mut out = Vec::new();
        self.collect(role, &mut out);
        out
    }
}

/// Trait-object adapter over a shared element.
pub struct MockNode(pub Arc<MockElement>);

impl UiNode for MockNode {
    fn exists(&self) -> bool {
        self.0.exists.load(Ordering::SeqCst)
    }

    fn is_visible(&self) -> bool {
        self.0.visible.load(Ordering::SeqCst)
    }

    fn is_minimized(&self) -> bool {
        self.0.minimized.load(Ordering::SeqCst)
    }

    fn is_editable(&self) -> bool {
        self.0.editable
    }

    fn title(&self) -> String {
        self.0.title.lock().unwrap().clone()
    }

    fn class_name(&self) -> String {
        self.0.class_name.clone()
    }

    fn bounds(&self) -> Bounds {
        self.0.bounds
    }

    fn restore(&self) -> Result<(), AutomationError> {
        self.0.minimized.store(false, Ordering::SeqCst);
        self.0.restored.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn focus(&self) -> Result<(), AutomationError> {
        self.0.focused.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn select_menu_path(&self, path: &[String]) -> Result<(), AutomationError> {
        self.0.menu_selections.lock().unwrap().push(path.to_vec());
        Ok(())
    }

    fn visible_child_windows(&self) -> Vec<Box<dyn UiNode>> {
        self.0
            .matching(ControlRole::Window)
            .into_iter()
            .filter(|w| w.visible.load(Ordering::SeqCst))
            .map(|w| Box::new(MockNode(w)) as Box<dyn UiNode>)
            .collect()
    }

    fn descendants(&self, role: ControlRole) -> Vec<Box<dyn UiNode>> {
        self.0.role_queries.lock().unwrap().push(role);
        self.0
            .matching(role)
            .into_iter()
            .map(|e| Box::new(MockNode(e)) as Box<dyn UiNode>)
            .collect()
    }

    fn find_by_name(&self, role: ControlRole, name: &str) -> Option<Box<dyn UiNode>> {
        self.0
            .matching(role)
            .into_iter()
            .find(|e| *e.title.lock().unwrap() == name)
            .map(|e| Box::new(MockNode(e)) as Box<dyn UiNode>)
    }

    fn find_by_index(&self, role: ControlRole, index: usize) -> Option<Box<dyn UiNode>> {
        self.0
            .matching(role)
            .into_iter()
            .nth(index)
            .map(|e| Box::new(MockNode(e)) as Box<dyn UiNode>)
    }

    fn first_of_role(&self, role: ControlRole) -> Option<Box<dyn UiNode>> {
        self.find_by_index(role, 0)
    }

    fn set_text(&self, text: &str) -> Result<(), AutomationError> {
        *self.0.entered_text.lock().unwrap() = Some(text.to_string());
        Ok(())
    }

    fn text_blocks(&self) -> Vec<Vec<String>> {
        self.0.text_blocks.lock().unwrap().clone()
    }

    fn invoke(&self) -> Result<(), AutomationError> {
        self.0.invoked.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) -> Result<(), AutomationError> {
        self.0.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// One process's UI tree as the mock backend serves it. Tests flip `top`
/// and `active` to exercise the dialog-identification tiers.
pub struct MockConnection {
    pub main_window: Arc<MockElement>,
    pub top: Mutex<Option<Arc<MockElement>>>,
    pub active: Mutex<Option<Arc<MockElement>>>,
}

impl MockConnection {
    pub fn new(main_window: Arc<MockElement>) -> Arc<Self> {
        Arc::new(Self {
            main_window,
            top: Mutex::new(None),
            active: Mutex::new(None),
        })
    }

    pub fn set_top(&self, element: Option<Arc<MockElement>>) {
        *self.top.lock().unwrap() = element;
    }

    pub fn set_active(&self, element: Option<Arc<MockElement>>) {
        *self.active.lock().unwrap() = element;
    }

    /// The same adapter `MockBackend::connect` hands out, for tests that
    /// drive a component below the locator directly.
    pub fn connection_handle(self: &Arc<Self>) -> Box<dyn UiConnection> {
        Box::new(MockConnectionHandle(Arc::clone(self)))
    }
}

struct MockConnectionHandle(Arc<MockConnection>);

impl UiConnection for MockConnectionHandle {
    fn window(&self, _handle: WindowHandle) -> Result<Box<dyn UiNode>, AutomationError> {
        Ok(Box::new(MockNode(Arc::clone(&self.0.main_window))))
    }

    fn top_window(&self) -> Result<Box<dyn UiNode>, AutomationError> {
        self.0
            .top
            .lock()
            .unwrap()
            .as_ref()
            .map(|e| Box::new(MockNode(Arc::clone(e))) as Box<dyn UiNode>)
            .ok_or_else(|| AutomationError::PlatformError("no top window".to_string()))
    }

    fn active_window(&self) -> Result<Box<dyn UiNode>, AutomationError> {
        self.0
            .active
            .lock()
            .unwrap()
            .as_ref()
            .map(|e| Box::new(MockNode(Arc::clone(e))) as Box<dyn UiNode>)
            .ok_or_else(|| AutomationError::PlatformError("no active window".to_string()))
    }
}

pub struct MockWindow {
    pub window: TopLevelWindow,
    /// `None` simulates a process that cannot be inspected (access denied,
    /// already exited); discovery must skip it and keep scanning.
    pub process_name: Option<String>,
    pub connection: Arc<MockConnection>,
}

#[derive(Default)]
pub struct MockBackend {
    windows: Mutex<Vec<MockWindow>>,
    pub enumerations: AtomicUsize,
    pub connects: AtomicUsize,
    pub fail_connect: AtomicBool,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_window(
        &self,
        handle: WindowHandle,
        title: &str,
        process_name: Option<&str>,
        connection: Arc<MockConnection>,
    ) {
        self.windows.lock().unwrap().push(MockWindow {
            window: TopLevelWindow {
                handle,
                title: title.to_string(),
            },
            process_name: process_name.map(str::to_string),
            connection,
        });
    }

    pub fn set_fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }
}

impl UiBackend for MockBackend {
    fn top_level_windows(&self) -> Result<Vec<TopLevelWindow>, AutomationError> {
        self.enumerations.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .windows
            .lock()
            .unwrap()
            .iter()
            .map(|w| w.window.clone())
            .collect())
    }

    fn process_name(&self, window: WindowHandle) -> Result<String, AutomationError> {
        self.windows
            .lock()
            .unwrap()
            .iter()
            .find(|w| w.window.handle == window)
            .and_then(|w| w.process_name.clone())
            .ok_or_else(|| {
                AutomationError::PlatformError(format!(
                    "owning process of window {window} could not be inspected"
                ))
            })
    }

    fn connect(
        &self,
        window: WindowHandle,
        timeout: Duration,
    ) -> Result<Box<dyn UiConnection>, AutomationError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(AutomationError::Timeout(format!(
                "could not attach to window {window} within {timeout:?}"
            )));
        }
        self.windows
            .lock()
            .unwrap()
            .iter()
            .find(|w| w.window.handle == window)
            .map(|w| {
                Box::new(MockConnectionHandle(Arc::clone(&w.connection))) as Box<dyn UiConnection>
            })
            .ok_or_else(|| {
                AutomationError::PlatformError(format!("window {window} no longer exists"))
            })
    }
}
