//! Opens and identifies the script-submission dialog.

use std::thread::sleep;

use tracing::debug;

use crate::backend::{UiConnection, UiNode};
use crate::config::GuiConfig;
use crate::errors::AutomationError;

/// Triggers the configured menu path on the main window and locates the
/// dialog it opens.
///
/// Which window the accessibility backend reports as "top" or "active" is
/// not deterministic across Abaqus versions, so identification runs through
/// three tiers, first success wins:
///
/// 1. the connection's current top window,
/// 2. after a further pause, the connection's active window,
/// 3. a recursive search of the main window's visible child windows.
///
/// All pauses are the heuristic delays from [`GuiConfig`]; Abaqus exposes no
/// completion signal to await instead.
pub fn open_submission_dialog(
    config: &GuiConfig,
    connection: &dyn UiConnection,
    main_window: &dyn UiNode,
) -> Result<Box<dyn UiNode>, AutomationError> {
    if main_window.is_minimized() {
        main_window.restore()?;
    }
    main_window.focus()?;
    sleep(config.delays.focus_settle);

    main_window.select_menu_path(&config.menu_path)?;
    sleep(config.delays.dialog_render);

    if let Ok(window) = connection.top_window() {
        if is_submission_dialog(config, window.as_ref()) {
            debug!("dialog identified as the connection's top window");
            return Ok(window);
        }
    }

    sleep(config.delays.dialog_retry);
    if let Ok(window) = connection.active_window() {
        if is_submission_dialog(config, window.as_ref()) {
            debug!("dialog identified as the connection's active window");
            return Ok(window);
        }
    }

    for child in main_window.visible_child_windows() {
        if is_submission_dialog(config, child.as_ref()) {
            debug!("dialog identified among the main window's child windows");
            return Ok(child);
        }
    }

    Err(AutomationError::DialogNotFound(format!(
        "no window titled with any of {:?} appeared after selecting '{}'",
        config.dialog_title_markers,
        config.menu_path.join(" -> ")
    )))
}

fn is_submission_dialog(config: &GuiConfig, window: &dyn UiNode) -> bool {
    if !window.exists() {
        return false;
    }
    let title = window.title();
    config
        .dialog_title_markers
        .iter()
        .any(|marker| title.contains(marker.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ControlRole;
    use crate::config::Delays;
    use crate::mock::{MockConnection, MockElement, MockNode};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    fn config() -> GuiConfig {
        GuiConfig::default().with_delays(Delays::zero())
    }

    struct Scene {
        main: Arc<MockElement>,
        connection: Arc<MockConnection>,
    }

    fn scene() -> Scene {
        let main = MockElement::new(ControlRole::Window, "Abaqus/CAE 2024").shared();
        let connection = MockConnection::new(Arc::clone(&main));
        Scene { main, connection }
    }

    fn handle(connection: &Arc<MockConnection>) -> Box<dyn crate::backend::UiConnection> {
        connection.connection_handle()
    }

    #[test]
    fn restores_minimized_window_and_selects_menu() {
        let s = scene();
        s.main.minimized.store(true, Ordering::SeqCst);
        let dialog = MockElement::new(ControlRole::Window, "Run Script").shared();
        s.connection.set_top(Some(dialog));

        let conn = handle(&s.connection);
        open_submission_dialog(&config(), conn.as_ref(), &MockNode(Arc::clone(&s.main))).unwrap();

        assert_eq!(s.main.restored.load(Ordering::SeqCst), 1);
        assert_eq!(s.main.focused.load(Ordering::SeqCst), 1);
        assert_eq!(
            s.main.menu_selections.lock().unwrap().as_slice(),
            &[vec!["File".to_string(), "Run Script...".to_string()]]
        );
    }

    #[test]
    fn tier_two_active_window_is_used_when_top_window_mismatches() {
        let s = scene();
        let wrong = MockElement::new(ControlRole::Window, "Print Preview").shared();
        let dialog = MockElement::new(ControlRole::Window, "Select file to run").shared();
        s.connection.set_top(Some(wrong));
        s.connection.set_active(Some(Arc::clone(&dialog)));

        let conn = handle(&s.connection);
        let found =
            open_submission_dialog(&config(), conn.as_ref(), &MockNode(Arc::clone(&s.main)))
                .unwrap();
        assert_eq!(found.title(), "Select file to run");
    }

    #[test]
    fn tier_three_searches_child_windows() {
        let s = scene();
        let dialog = MockElement::new(ControlRole::Window, "Run Script").shared();
        s.main.add_child(Arc::clone(&dialog));

        let conn = handle(&s.connection);
        let found =
            open_submission_dialog(&config(), conn.as_ref(), &MockNode(Arc::clone(&s.main)))
                .unwrap();
        assert_eq!(found.title(), "Run Script");
    }

    #[test]
    fn hidden_child_dialog_is_not_considered() {
        let s = scene();
        let dialog = MockElement::new(ControlRole::Window, "Run Script")
            .hidden()
            .shared();
        s.main.add_child(dialog);

        let conn = handle(&s.connection);
        let Err(err) =
            open_submission_dialog(&config(), conn.as_ref(), &MockNode(Arc::clone(&s.main)))
        else {
            panic!("hidden dialog must not be identified");
        };
        assert!(matches!(err, AutomationError::DialogNotFound(_)));
    }

    #[test]
    fn all_tiers_failing_reports_dialog_not_found() {
        let s = scene();
        let conn = handle(&s.connection);
        let Err(err) =
            open_submission_dialog(&config(), conn.as_ref(), &MockNode(Arc::clone(&s.main)))
        else {
            panic!("no dialog was staged, identification must fail");
        };
        let message = err.to_string();
        assert!(message.contains("Run Script"));
        assert!(message.contains("File -> Run Script..."));
    }
}
