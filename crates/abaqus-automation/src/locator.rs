//! Finds and caches the Abaqus/CAE main window.

use std::sync::Arc;

use tracing::{debug, info};

use crate::backend::{TopLevelWindow, UiBackend, UiConnection, UiNode, WindowHandle};
use crate::config::GuiConfig;
use crate::errors::AutomationError;

/// The validated (connection, main-window) pair every operation starts from.
pub struct CachedSession {
    pub connection: Box<dyn UiConnection>,
    pub window: Box<dyn UiNode>,
    pub handle: WindowHandle,
}

/// Owns the process-wide session cache. `acquire` and `invalidate` are the
/// only mutators; callers never hold the raw cached handles themselves.
pub struct WindowLocator {
    backend: Arc<dyn UiBackend>,
    config: Arc<GuiConfig>,
    session: Option<CachedSession>,
}

impl WindowLocator {
    pub fn new(backend: Arc<dyn UiBackend>, config: Arc<GuiConfig>) -> Self {
        Self {
            backend,
            config,
            session: None,
        }
    }

    /// Returns the cached session when it still passes its existence and
    /// visibility checks (the fast path: two cheap probes, no re-scan);
    /// otherwise drops it and rediscovers the window from scratch.
    pub fn acquire(&mut self) -> Result<&CachedSession, AutomationError> {
        let cached_ok = self
            .session
            .as_ref()
            .map(|s| s.window.exists() && s.window.is_visible())
            .unwrap_or(false);

        if cached_ok {
            debug!("reusing cached Abaqus/CAE session");
        } else {
            if self.session.take().is_some() {
                debug!("cached window no longer exists or is hidden, rediscovering");
            }
            let session = self.discover()?;
            self.session = Some(session);
        }

        self.session
            .as_ref()
            .ok_or_else(|| AutomationError::Unexpected("session cache empty after discovery".to_string()))
    }

    /// Drops the cached pair so the next `acquire` rediscovers. Called from
    /// every failure path whose error may have left the handles stale.
    pub fn invalidate(&mut self) {
        if self.session.take().is_some() {
            debug!("invalidated cached Abaqus/CAE session");
        }
    }

    #[cfg(test)]
    pub(crate) fn has_session(&self) -> bool {
        self.session.is_some()
    }

    fn discover(&self) -> Result<CachedSession, AutomationError> {
        let candidate = self.find_target_window()?;
        info!(
            title = %candidate.title,
            handle = candidate.handle,
            "connecting to Abaqus/CAE window"
        );
        let connection = self
            .backend
            .connect(candidate.handle, self.config.connect_timeout)?;
        let window = connection.window(candidate.handle)?;
        if !window.exists() || !window.is_visible() {
            return Err(AutomationError::TargetNotFound(
                "matched window disappeared or is not visible".to_string(),
            ));
        }
        Ok(CachedSession {
            connection,
            window,
            handle: candidate.handle,
        })
    }

    /// Scans top-level windows for one whose title carries the configured
    /// prefix and whose owning process name carries the core marker plus a
    /// product-variant marker. First match wins, in enumeration order.
    fn find_target_window(&self) -> Result<TopLevelWindow, AutomationError> {
        for candidate in self.backend.top_level_windows()? {
            if !candidate.title.starts_with(&self.config.window_title_prefix) {
                continue;
            }
            let process = match self.backend.process_name(candidate.handle) {
                Ok(name) => name.to_lowercase(),
                Err(err) => {
                    debug!(handle = candidate.handle, %err, "skipping candidate, owning process not inspectable");
                    continue;
                }
            };
            let variant_matches = self
                .config
                .process_variant_markers
                .iter()
                .any(|marker| process.contains(marker.as_str()));
            if process.contains(&self.config.process_name_marker) && variant_matches {
                return Ok(candidate);
            }
            debug!(
                title = %candidate.title,
                %process,
                "title matched but process name did not, skipping"
            );
        }
        Err(AutomationError::TargetNotFound(format!(
            "no top-level window titled '{}...' owned by a matching process; ensure Abaqus/CAE is running with its GUI open",
            self.config.window_title_prefix
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Delays;
    use crate::mock::{MockBackend, MockConnection, MockElement};
    use crate::backend::ControlRole;
    use std::sync::atomic::Ordering;

    fn config() -> Arc<GuiConfig> {
        Arc::new(GuiConfig::default().with_delays(Delays::zero()))
    }

    fn main_window() -> std::sync::Arc<MockElement> {
        MockElement::new(ControlRole::Window, "Abaqus/CAE 2024 -- Model-1").shared()
    }

    #[test]
    fn caches_session_and_skips_rescan_on_second_acquire() {
        let backend = MockBackend::new();
        let window = main_window();
        backend.add_window(
            11,
            "Abaqus/CAE 2024 -- Model-1",
            Some("abaqus_cae.exe"),
            MockConnection::new(Arc::clone(&window)),
        );

        let mut locator = WindowLocator::new(backend.clone(), config());
        locator.acquire().unwrap();
        locator.acquire().unwrap();

        assert_eq!(backend.enumerations.load(Ordering::SeqCst), 1);
        assert_eq!(backend.connects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stale_visibility_forces_full_rediscovery() {
        let backend = MockBackend::new();
        let window = main_window();
        backend.add_window(
            11,
            "Abaqus/CAE 2024 -- Model-1",
            Some("abaqus_cae.exe"),
            MockConnection::new(Arc::clone(&window)),
        );

        let mut locator = WindowLocator::new(backend.clone(), config());
        locator.acquire().unwrap();

        window.set_visible(false);
        // rediscovery finds the same (now hidden) window and must reject it
        assert!(matches!(
            locator.acquire(),
            Err(AutomationError::TargetNotFound(_))
        ));
        assert_eq!(backend.enumerations.load(Ordering::SeqCst), 2);
        assert!(!locator.has_session());
    }

    #[test]
    fn no_matching_title_yields_target_not_found_and_empty_cache() {
        let backend = MockBackend::new();
        backend.add_window(
            7,
            "Notepad",
            Some("notepad.exe"),
            MockConnection::new(main_window()),
        );

        let mut locator = WindowLocator::new(backend, config());
        let Err(err) = locator.acquire() else {
            panic!("no Abaqus window exists, discovery must fail");
        };
        assert!(err.to_string().contains("window not found"));
        assert!(!locator.has_session());
    }

    #[test]
    fn process_name_without_variant_marker_is_skipped() {
        let backend = MockBackend::new();
        let decoy = MockElement::new(ControlRole::Window, "Abaqus/CAE docs").shared();
        let real = main_window();
        backend.add_window(
            1,
            "Abaqus/CAE documentation",
            Some("browser.exe"),
            MockConnection::new(decoy),
        );
        backend.add_window(
            2,
            "Abaqus/CAE 2024 -- Model-1",
            Some("abaqus_viewer.exe"),
            MockConnection::new(Arc::clone(&real)),
        );

        let mut locator = WindowLocator::new(backend, config());
        let session = locator.acquire().unwrap();
        assert_eq!(session.handle, 2);
    }

    #[test]
    fn variant_marker_alone_does_not_satisfy_the_core_marker() {
        let backend = MockBackend::new();
        // "abqcaek.exe" carries the "cae" variant marker but not "abaqus"
        backend.add_window(
            4,
            "Abaqus/CAE 2024",
            Some("ABQcaeK.exe"),
            MockConnection::new(main_window()),
        );

        let mut locator = WindowLocator::new(backend, config());
        assert!(matches!(
            locator.acquire(),
            Err(AutomationError::TargetNotFound(_))
        ));
    }

    #[test]
    fn uninspectable_process_is_skipped_and_scan_continues() {
        let backend = MockBackend::new();
        let real = main_window();
        backend.add_window(1, "Abaqus/CAE zombie", None, MockConnection::new(main_window()));
        backend.add_window(
            2,
            "Abaqus/CAE 2024",
            Some("abaqus_cae.exe"),
            MockConnection::new(Arc::clone(&real)),
        );

        let mut locator = WindowLocator::new(backend, config());
        assert_eq!(locator.acquire().unwrap().handle, 2);
    }

    #[test]
    fn connect_timeout_propagates_and_leaves_no_session() {
        let backend = MockBackend::new();
        backend.add_window(
            3,
            "Abaqus/CAE 2024",
            Some("abaqus_cae.exe"),
            MockConnection::new(main_window()),
        );
        backend.set_fail_connect(true);

        let mut locator = WindowLocator::new(backend, config());
        assert!(matches!(
            locator.acquire(),
            Err(AutomationError::Timeout(_))
        ));
        assert!(!locator.has_session());
    }
}
