use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::AutomationError;

/// Identifiers and timing parameters for driving the Abaqus/CAE GUI.
///
/// The defaults reflect the window titles, menu path and control labels
/// observed on one Abaqus/CAE version. None of them are contractual:
/// Abaqus exposes no stable automation IDs, so every value here may drift
/// across releases. Deployments can override any of them from a JSON file
/// (see [`GuiConfig::from_file`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuiConfig {
    /// Top-level windows are candidates only when their title starts with this.
    pub window_title_prefix: String,
    /// The owning process's executable name must contain this marker...
    pub process_name_marker: String,
    /// ...and at least one of these product-variant markers.
    pub process_variant_markers: Vec<String>,
    /// Bound on the accessibility-backend connection. The only caller-visible
    /// timeout in the system.
    pub connect_timeout: Duration,
    /// Menu path that opens the script-submission dialog.
    pub menu_path: Vec<String>,
    /// A window is accepted as the submission dialog when its title contains
    /// any of these substrings.
    pub dialog_title_markers: Vec<String>,
    /// Label of the file-name edit control inside the dialog.
    pub file_input_label: String,
    /// Accepted labels for the dialog's confirm button.
    pub confirm_button_labels: Vec<String>,
    /// Class-name marker of Abaqus's custom content panes (message area host).
    pub message_pane_class_marker: String,
    pub message_pane_min_height: i32,
    pub message_pane_min_width: i32,
    /// Smaller minimum used by the read-only edit fallback heuristic.
    pub message_edit_min_height: i32,
    pub delays: Delays,
}

/// Fixed pauses compensating for UI-update latency the target never signals.
///
/// These are best-effort timing heuristics, not correctness guarantees:
/// Abaqus offers no "dialog rendered" or "focus settled" event to await, so
/// the navigator sleeps for an empirically chosen interval instead. Under
/// heavy solver load they can be too short. Tests zero them out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Delays {
    /// After restoring/focusing the main window.
    pub focus_settle: Duration,
    /// After triggering the menu, before looking for the dialog.
    pub dialog_render: Duration,
    /// Before the second dialog-identification tier retries.
    pub dialog_retry: Duration,
    /// After writing the script path, before confirming, so the dialog's own
    /// input validation does not race the click.
    pub post_text_entry: Duration,
}

impl Default for GuiConfig {
    fn default() -> Self {
        Self {
            window_title_prefix: "Abaqus/CAE".to_string(),
            process_name_marker: "abaqus".to_string(),
            process_variant_markers: vec!["cae".to_string(), "viewer".to_string()],
            connect_timeout: Duration::from_secs(20),
            menu_path: vec!["File".to_string(), "Run Script...".to_string()],
            dialog_title_markers: vec!["Run Script".to_string(), "Select file".to_string()],
            file_input_label: "File &name:".to_string(),
            confirm_button_labels: vec![
                "OK".to_string(),
                "Run".to_string(),
                "Open".to_string(),
            ],
            message_pane_class_marker: "FXWindow".to_string(),
            message_pane_min_height: 100,
            message_pane_min_width: 200,
            message_edit_min_height: 50,
            delays: Delays::default(),
        }
    }
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            focus_settle: Duration::from_millis(500),
            dialog_render: Duration::from_millis(1500),
            dialog_retry: Duration::from_millis(1000),
            post_text_entry: Duration::from_millis(300),
        }
    }
}

impl Delays {
    /// All-zero delays, for tests running against a simulated backend.
    pub fn zero() -> Self {
        Self {
            focus_settle: Duration::ZERO,
            dialog_render: Duration::ZERO,
            dialog_retry: Duration::ZERO,
            post_text_entry: Duration::ZERO,
        }
    }
}

impl GuiConfig {
    /// Loads a config from a JSON file. Missing fields fall back to the
    /// built-in defaults.
    pub fn from_file(path: &Path) -> Result<Self, AutomationError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AutomationError::Unexpected(format!(
                "could not read config file {}: {e}",
                path.display()
            ))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            AutomationError::Unexpected(format!(
                "could not parse config file {}: {e}",
                path.display()
            ))
        })
    }

    pub fn with_delays(mut self, delays: Delays) -> Self {
        self.delays = delays;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_target_abaqus_cae() {
        let config = GuiConfig::default();
        assert_eq!(config.window_title_prefix, "Abaqus/CAE");
        assert!(config.process_variant_markers.contains(&"cae".to_string()));
        assert_eq!(config.menu_path, vec!["File", "Run Script..."]);
    }

    #[test]
    fn partial_file_overrides_merge_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "window_title_prefix": "Abaqus/Viewer", "message_pane_min_height": 80 }}"#
        )
        .unwrap();
        file.flush().unwrap();

        let config = GuiConfig::from_file(file.path()).unwrap();
        assert_eq!(config.window_title_prefix, "Abaqus/Viewer");
        assert_eq!(config.message_pane_min_height, 80);
        // untouched fields keep their defaults
        assert_eq!(config.file_input_label, "File &name:");
        assert_eq!(config.delays.dialog_render, Duration::from_millis(1500));
    }

    #[test]
    fn zero_delays_remove_every_pause() {
        let delays = Delays::zero();
        assert_eq!(delays.focus_settle, Duration::ZERO);
        assert_eq!(delays.dialog_render, Duration::ZERO);
        assert_eq!(delays.dialog_retry, Duration::ZERO);
        assert_eq!(delays.post_text_entry, Duration::ZERO);
    }
}
