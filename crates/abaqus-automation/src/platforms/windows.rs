//! Windows UI Automation backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread::sleep;
use std::time::{Duration, Instant};

use sysinfo::{Pid, ProcessesToUpdate, System};
use tracing::debug;
use uiautomation::controls::ControlType;
use uiautomation::filters::NameFilter;
use uiautomation::patterns;
use uiautomation::{UIAutomation, UIElement};
use windows::Win32::Foundation::HWND;
use windows::Win32::UI::WindowsAndMessaging::{
    IsIconic, IsWindowVisible, SetForegroundWindow, ShowWindow, SW_RESTORE,
};

use crate::backend::{
    Bounds, ControlRole, TopLevelWindow, UiBackend, UiConnection, UiNode, WindowHandle,
};
use crate::errors::AutomationError;

const FIND_TIMEOUT_MS: u64 = 2000;
const PROBE_TIMEOUT_MS: u64 = 200;
const SEARCH_DEPTH: u32 = 32;
const MENU_POPUP_DELAY: Duration = Duration::from_millis(300);

// thread-safety wrappers over the COM pointers
#[derive(Clone)]
struct ThreadSafeWinUIAutomation(Arc<UIAutomation>);

unsafe impl Send for ThreadSafeWinUIAutomation {}
unsafe impl Sync for ThreadSafeWinUIAutomation {}

#[derive(Clone)]
struct ThreadSafeWinUIElement(Arc<UIElement>);

unsafe impl Send for ThreadSafeWinUIElement {}
unsafe impl Sync for ThreadSafeWinUIElement {}

fn control_type_of(role: ControlRole) -> ControlType {
    match role {
        ControlRole::Window => ControlType::Window,
        ControlRole::Pane => ControlType::Pane,
        ControlRole::Edit => ControlType::Edit,
        ControlRole::Button => ControlType::Button,
    }
}

fn platform_err(e: impl std::fmt::Display) -> AutomationError {
    AutomationError::PlatformError(e.to_string())
}

pub struct WindowsBackend {
    automation: ThreadSafeWinUIAutomation,
    /// Native handle to element map, refreshed on every enumeration.
    elements: Mutex<HashMap<WindowHandle, ThreadSafeWinUIElement>>,
}

impl WindowsBackend {
    pub fn new() -> Result<Self, AutomationError> {
        let automation = UIAutomation::new_direct().map_err(platform_err)?;
        Ok(Self {
            automation: ThreadSafeWinUIAutomation(Arc::new(automation)),
            elements: Mutex::new(HashMap::new()),
        })
    }

    fn known_element(&self, window: WindowHandle) -> Result<ThreadSafeWinUIElement, AutomationError> {
        self.elements
            .lock()
            .map_err(|_| AutomationError::Unexpected("window map poisoned".to_string()))?
            .get(&window)
            .cloned()
            .ok_or_else(|| {
                AutomationError::PlatformError(format!(
                    "window {window} was not seen during enumeration"
                ))
            })
    }
}

impl UiBackend for WindowsBackend {
    fn top_level_windows(&self) -> Result<Vec<TopLevelWindow>, AutomationError> {
        let root = self.automation.0.get_root_element().map_err(platform_err)?;
        let windows = self
            .automation
            .0
            .create_matcher()
            .from_ref(&root)
            .control_type(ControlType::Window)
            .depth(1)
            .timeout(FIND_TIMEOUT_MS)
            .find_all()
            .unwrap_or_default();

        let mut map = self
            .elements
            .lock()
            .map_err(|_| AutomationError::Unexpected("window map poisoned".to_string()))?;
        let mut out = Vec::new();
        for element in windows {
            let title = element.get_name().unwrap_or_default();
            if title.is_empty() || element.is_offscreen().unwrap_or(true) {
                continue;
            }
            let Ok(native) = element.get_native_window_handle() else {
                continue;
            };
            let hwnd: HWND = native.into();
            let handle = hwnd.0 as WindowHandle;
            map.insert(handle, ThreadSafeWinUIElement(Arc::new(element)));
            out.push(TopLevelWindow { handle, title });
        }
        debug!(count = out.len(), "enumerated top-level windows");
        Ok(out)
    }

    fn process_name(&self, window: WindowHandle) -> Result<String, AutomationError> {
        let element = self.known_element(window)?;
        let pid = element.0.get_process_id().map_err(platform_err)?;
        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]), true);
        system
            .process(Pid::from_u32(pid))
            .map(|p| p.name().to_string_lossy().to_string())
            .ok_or_else(|| {
                AutomationError::PlatformError(format!(
                    "owning process {pid} of window {window} could not be inspected"
                ))
            })
    }

    fn connect(
        &self,
        window: WindowHandle,
        timeout: Duration,
    ) -> Result<Box<dyn UiConnection>, AutomationError> {
        let element = self.known_element(window)?;
        let deadline = Instant::now() + timeout;
        loop {
            if element.0.get_control_type().is_ok() {
                break;
            }
            if Instant::now() >= deadline {
                return Err(AutomationError::Timeout(format!(
                    "could not attach to window {window} within {timeout:?}"
                )));
            }
            sleep(Duration::from_millis(250));
        }
        let pid = element.0.get_process_id().map_err(platform_err)?;
        Ok(Box::new(WindowsConnection {
            automation: self.automation.clone(),
            main: element,
            pid,
        }))
    }
}

struct WindowsConnection {
    automation: ThreadSafeWinUIAutomation,
    main: ThreadSafeWinUIElement,
    pid: u32,
}

impl WindowsConnection {
    fn node(&self, element: UIElement) -> Box<dyn UiNode> {
        Box::new(WindowsNode::new(self.automation.clone(), element))
    }
}

impl UiConnection for WindowsConnection {
    fn window(&self, _handle: WindowHandle) -> Result<Box<dyn UiNode>, AutomationError> {
        Ok(self.node(self.main.0.as_ref().clone()))
    }

    fn top_window(&self) -> Result<Box<dyn UiNode>, AutomationError> {
        let root = self.automation.0.get_root_element().map_err(platform_err)?;
        let pid = self.pid;
        let window = self
            .automation
            .0
            .create_matcher()
            .from_ref(&root)
            .control_type(ControlType::Window)
            .depth(1)
            .filter_fn(Box::new(move |e: &UIElement| {
                Ok(e.get_process_id().map(|p| p == pid).unwrap_or(false))
            }))
            .timeout(FIND_TIMEOUT_MS)
            .find_first()
            .map_err(|e| {
                AutomationError::PlatformError(format!("no top window for process {pid}: {e}"))
            })?;
        Ok(self.node(window))
    }

    fn active_window(&self) -> Result<Box<dyn UiNode>, AutomationError> {
        let focused = self
            .automation
            .0
            .get_focused_element()
            .map_err(platform_err)?;
        if focused.get_process_id().map_err(platform_err)? != self.pid {
            return Err(AutomationError::PlatformError(
                "keyboard focus is in another process".to_string(),
            ));
        }
        // walk up to the enclosing window, bounded to avoid loops
        let mut current = focused;
        for _ in 0..10 {
            if current.get_control_type() == Ok(ControlType::Window) {
                return Ok(self.node(current));
            }
            match current.get_cached_parent() {
                Ok(parent) => current = parent,
                Err(_) => break,
            }
        }
        Err(AutomationError::PlatformError(
            "focused element has no enclosing window".to_string(),
        ))
    }
}

struct WindowsNode {
    automation: ThreadSafeWinUIAutomation,
    element: ThreadSafeWinUIElement,
    /// Present only for elements that are real native windows.
    hwnd: Option<WindowHandle>,
}

impl WindowsNode {
    fn new(automation: ThreadSafeWinUIAutomation, element: UIElement) -> Self {
        let hwnd = element.get_native_window_handle().ok().map(|native| {
            let hwnd: HWND = native.into();
            hwnd.0 as WindowHandle
        });
        Self {
            automation,
            element: ThreadSafeWinUIElement(Arc::new(element)),
            hwnd,
        }
    }

    fn raw_hwnd(&self) -> Option<HWND> {
        self.hwnd.map(|h| HWND(h as *mut std::ffi::c_void))
    }

    fn of_role(&self, role: ControlRole) -> Vec<UIElement> {
        self.automation
            .0
            .create_matcher()
            .from_ref(&self.element.0)
            .control_type(control_type_of(role))
            .depth(SEARCH_DEPTH)
            .timeout(PROBE_TIMEOUT_MS)
            .find_all()
            .unwrap_or_default()
    }

    fn wrap(&self, element: UIElement) -> Box<dyn UiNode> {
        Box::new(WindowsNode::new(self.automation.clone(), element))
    }
}

impl UiNode for WindowsNode {
    fn exists(&self) -> bool {
        // a destroyed element fails every property read
        self.element.0.get_control_type().is_ok()
    }

    fn is_visible(&self) -> bool {
        match self.raw_hwnd() {
            Some(hwnd) => unsafe { IsWindowVisible(hwnd) }.as_bool(),
            None => !self.element.0.is_offscreen().unwrap_or(true),
        }
    }

    fn is_minimized(&self) -> bool {
        match self.raw_hwnd() {
            Some(hwnd) => unsafe { IsIconic(hwnd) }.as_bool(),
            None => false,
        }
    }

    fn is_editable(&self) -> bool {
        match self.element.0.get_pattern::<patterns::UIValuePattern>() {
            Ok(pattern) => !pattern.is_readonly().unwrap_or(true),
            Err(_) => false,
        }
    }

    fn title(&self) -> String {
        self.element.0.get_name().unwrap_or_default()
    }

    fn class_name(&self) -> String {
        self.element.0.get_classname().unwrap_or_default()
    }

    fn bounds(&self) -> Bounds {
        self.element
            .0
            .get_bounding_rectangle()
            .map(|rect| Bounds {
                width: rect.get_width(),
                height: rect.get_height(),
            })
            .unwrap_or_default()
    }

    fn restore(&self) -> Result<(), AutomationError> {
        if let Some(hwnd) = self.raw_hwnd() {
            unsafe {
                let _ = ShowWindow(hwnd, SW_RESTORE);
            }
        }
        Ok(())
    }

    fn focus(&self) -> Result<(), AutomationError> {
        if let Some(hwnd) = self.raw_hwnd() {
            unsafe {
                let _ = SetForegroundWindow(hwnd);
            }
        }
        self.element.0.set_focus().map_err(platform_err)
    }

    fn select_menu_path(&self, path: &[String]) -> Result<(), AutomationError> {
        let root = self.automation.0.get_root_element().map_err(platform_err)?;
        for (position, item) in path.iter().enumerate() {
            // popup menus open as top-level windows, not as children of
            // the menu bar, so items past the first are searched from root
            let scope = if position == 0 {
                self.element.0.as_ref().clone()
            } else {
                root.clone()
            };
            let menu_item = self
                .automation
                .0
                .create_matcher()
                .from_ref(&scope)
                .control_type(ControlType::MenuItem)
                .filter(Box::new(NameFilter {
                    value: item.clone(),
                    casesensitive: false,
                    partial: false,
                }))
                .depth(SEARCH_DEPTH)
                .timeout(FIND_TIMEOUT_MS)
                .find_first()
                .map_err(|e| {
                    AutomationError::ControlNotFound(format!("menu item '{item}' not found: {e}"))
                })?;
            activate_menu_item(&menu_item)?;
            sleep(MENU_POPUP_DELAY);
        }
        Ok(())
    }

    fn visible_child_windows(&self) -> Vec<Box<dyn UiNode>> {
        self.of_role(ControlRole::Window)
            .into_iter()
            .filter(|w| !w.is_offscreen().unwrap_or(true))
            .map(|w| self.wrap(w))
            .collect()
    }

    fn descendants(&self, role: ControlRole) -> Vec<Box<dyn UiNode>> {
        self.of_role(role).into_iter().map(|e| self.wrap(e)).collect()
    }

    fn find_by_name(&self, role: ControlRole, name: &str) -> Option<Box<dyn UiNode>> {
        self.automation
            .0
            .create_matcher()
            .from_ref(&self.element.0)
            .control_type(control_type_of(role))
            .filter(Box::new(NameFilter {
                value: name.to_string(),
                casesensitive: false,
                partial: false,
            }))
            .depth(SEARCH_DEPTH)
            .timeout(PROBE_TIMEOUT_MS)
            .find_first()
            .ok()
            .map(|e| self.wrap(e))
    }

    fn find_by_index(&self, role: ControlRole, index: usize) -> Option<Box<dyn UiNode>> {
        self.of_role(role).into_iter().nth(index).map(|e| self.wrap(e))
    }

    fn first_of_role(&self, role: ControlRole) -> Option<Box<dyn UiNode>> {
        self.automation
            .0
            .create_matcher()
            .from_ref(&self.element.0)
            .control_type(control_type_of(role))
            .depth(SEARCH_DEPTH)
            .timeout(PROBE_TIMEOUT_MS)
            .find_first()
            .ok()
            .map(|e| self.wrap(e))
    }

    fn set_text(&self, text: &str) -> Result<(), AutomationError> {
        let pattern = self
            .element
            .0
            .get_pattern::<patterns::UIValuePattern>()
            .map_err(|e| {
                AutomationError::PlatformError(format!(
                    "`UIValuePattern` is not supported by this control: {e}"
                ))
            })?;
        pattern.set_value(text).map_err(platform_err)
    }

    fn text_blocks(&self) -> Vec<Vec<String>> {
        let mut blocks = Vec::new();

        let mut own = Vec::new();
        if let Ok(pattern) = self.element.0.get_pattern::<patterns::UIValuePattern>() {
            if let Ok(value) = pattern.get_value() {
                own.extend(value.lines().map(str::to_string));
            }
        }
        if own.is_empty() {
            if let Ok(name) = self.element.0.get_name() {
                own.push(name);
            }
        }
        blocks.push(own);

        // each text descendant contributes its own group
        let texts = self
            .automation
            .0
            .create_matcher()
            .from_ref(&self.element.0)
            .control_type(ControlType::Text)
            .depth(SEARCH_DEPTH)
            .timeout(PROBE_TIMEOUT_MS)
            .find_all()
            .unwrap_or_default();
        for text in texts {
            blocks.push(vec![text.get_name().unwrap_or_default()]);
        }
        blocks
    }

    fn invoke(&self) -> Result<(), AutomationError> {
        let pattern = self
            .element
            .0
            .get_pattern::<patterns::UIInvokePattern>()
            .map_err(platform_err)?;
        pattern.invoke().map_err(platform_err)
    }

    fn close(&self) -> Result<(), AutomationError> {
        let pattern = self
            .element
            .0
            .get_pattern::<patterns::UIWindowPattern>()
            .map_err(|e| {
                AutomationError::PlatformError(format!("window cannot be closed: {e}"))
            })?;
        pattern.close().map_err(platform_err)
    }
}

fn activate_menu_item(item: &UIElement) -> Result<(), AutomationError> {
    if let Ok(expand) = item.get_pattern::<patterns::UIExpandCollapsePattern>() {
        if expand.expand().is_ok() {
            return Ok(());
        }
    }
    let invoke = item
        .get_pattern::<patterns::UIInvokePattern>()
        .map_err(platform_err)?;
    invoke.invoke().map_err(platform_err)
}
