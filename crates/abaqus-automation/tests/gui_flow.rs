//! End-to-end flows through `GuiAutomator` against the mock backend.

use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use abaqus_automation::config::{Delays, GuiConfig};
use abaqus_automation::errors::AutomationError;
use abaqus_automation::mock::{MockBackend, MockConnection, MockElement};
use abaqus_automation::{ControlRole, GuiAutomator};

struct Gui {
    backend: Arc<MockBackend>,
    main: Arc<MockElement>,
    connection: Arc<MockConnection>,
}

fn running_abaqus() -> Gui {
    let main = MockElement::new(ControlRole::Window, "Abaqus/CAE 2024 -- Model-1").shared();
    let connection = MockConnection::new(Arc::clone(&main));
    let backend = MockBackend::new();
    backend.add_window(
        42,
        "Abaqus/CAE 2024 -- Model-1",
        Some("abaqus_cae.exe"),
        Arc::clone(&connection),
    );
    Gui {
        backend,
        main,
        connection,
    }
}

fn automator(gui: &Gui) -> GuiAutomator {
    GuiAutomator::new(
        gui.backend.clone(),
        GuiConfig::default().with_delays(Delays::zero()),
    )
}

fn run_script_dialog() -> (Arc<MockElement>, Arc<MockElement>, Arc<MockElement>) {
    let edit = MockElement::new(ControlRole::Edit, "File &name:").shared();
    let ok = MockElement::new(ControlRole::Button, "OK").shared();
    let dialog = MockElement::new(ControlRole::Window, "Run Script")
        .with_child(Arc::clone(&edit))
        .with_child(Arc::clone(&ok))
        .shared();
    (dialog, edit, ok)
}

#[test]
fn script_submission_types_a_temp_path_and_cleans_it_up() {
    let gui = running_abaqus();
    let (dialog, edit, ok) = run_script_dialog();
    gui.connection.set_top(Some(dialog));

    let summary = automator(&gui)
        .execute_script("print('hello from abaqus')")
        .unwrap();

    assert!(summary.contains("submitted"));
    assert!(summary.contains("File -> Run Script..."));

    let typed = edit.entered_text.lock().unwrap().clone().unwrap();
    assert!(typed.ends_with(".py"));
    assert!(typed.contains("abaqus_script_"));
    // the script file must not outlive the submission
    assert!(!Path::new(&typed).exists());
    assert_eq!(ok.invoked.load(Ordering::SeqCst), 1);
    assert_eq!(
        gui.main.menu_selections.lock().unwrap().as_slice(),
        &[vec!["File".to_string(), "Run Script...".to_string()]]
    );
}

#[test]
fn missing_dialog_fails_without_touching_any_control() {
    let gui = running_abaqus();
    let mut automator = automator(&gui);

    let err = automator.execute_script("print(1)").unwrap_err();
    assert!(matches!(err, AutomationError::DialogNotFound(_)));

    // the menu was driven, but nothing was typed or clicked anywhere
    assert_eq!(gui.main.menu_selections.lock().unwrap().len(), 1);
    assert!(gui.main.entered_text.lock().unwrap().is_none());
    assert_eq!(gui.main.invoked.load(Ordering::SeqCst), 0);
}

#[test]
fn dialog_failure_keeps_the_cached_window_session() {
    let gui = running_abaqus();
    gui.main.add_child(
        MockElement::new(ControlRole::Pane, "")
            .with_class("FXWindow")
            .with_bounds(640, 180)
            .with_text_blocks(vec![vec!["Abaqus License"]])
            .shared(),
    );
    let mut automator = automator(&gui);

    automator.execute_script("print(1)").unwrap_err();
    automator.read_message_log().unwrap();

    // one enumeration total: the dialog failure did not drop the session
    assert_eq!(gui.backend.enumerations.load(Ordering::SeqCst), 1);
}

#[test]
fn control_failure_closes_the_dialog() {
    let gui = running_abaqus();
    // a dialog with an input but no button at all
    let edit = MockElement::new(ControlRole::Edit, "File &name:").shared();
    let dialog = MockElement::new(ControlRole::Window, "Run Script")
        .with_child(edit)
        .shared();
    gui.connection.set_top(Some(Arc::clone(&dialog)));

    let err = automator(&gui).execute_script("print(1)").unwrap_err();
    assert!(matches!(err, AutomationError::ControlNotFound(_)));
    assert!(dialog.closed.load(Ordering::SeqCst));
}

#[test]
fn dialog_found_via_child_window_search_when_backend_misreports() {
    let gui = running_abaqus();
    let (dialog, edit, _ok) = run_script_dialog();
    // neither top nor active window is set; only the child search can win
    gui.main.add_child(dialog);

    automator(&gui).execute_script("print(1)").unwrap();
    assert!(edit.entered_text.lock().unwrap().is_some());
}

#[test]
fn log_reads_are_banner_wrapped_and_repeatable() {
    let gui = running_abaqus();
    gui.main.add_child(
        MockElement::new(ControlRole::Pane, "")
            .with_class("FXWindow")
            .with_bounds(800, 200)
            .with_text_blocks(vec![vec!["Job Job-1: Analysis Input File Processor completed"]])
            .shared(),
    );
    let mut automator = automator(&gui);

    let first = automator.read_message_log().unwrap();
    assert!(first.starts_with("Message Log Content"));
    assert!(first.contains("Job Job-1: Analysis Input File Processor completed"));
    assert_eq!(first, automator.read_message_log().unwrap());
}

#[test]
fn closed_window_is_rediscovered_on_the_next_call() {
    let gui = running_abaqus();
    gui.main.add_child(
        MockElement::new(ControlRole::Pane, "")
            .with_class("FXWindow")
            .with_bounds(800, 200)
            .with_text_blocks(vec![vec!["ready"]])
            .shared(),
    );
    let mut automator = automator(&gui);

    automator.read_message_log().unwrap();
    gui.main.set_exists(false);
    let err = automator.read_message_log().unwrap_err();
    assert!(matches!(err, AutomationError::TargetNotFound(_)));

    gui.main.set_exists(true);
    automator.read_message_log().unwrap();
    assert!(gui.backend.enumerations.load(Ordering::SeqCst) >= 2);
}
