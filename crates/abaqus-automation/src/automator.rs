//! High-level driver tying the locator, dialog, controls and scraper
//! together into the two operations callers actually invoke.

use std::io::Write;
use std::path::MAIN_SEPARATOR;
use std::sync::Arc;

use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::backend::UiBackend;
use crate::config::GuiConfig;
use crate::controls::submit_path;
use crate::dialog::open_submission_dialog;
use crate::errors::AutomationError;
use crate::locator::WindowLocator;
use crate::scraper;

/// Drives a running Abaqus/CAE GUI through its accessibility tree.
///
/// Holds the window cache; `&mut self` on the operations keeps every cache
/// mutation behind one owner.
pub struct GuiAutomator {
    locator: WindowLocator,
    config: Arc<GuiConfig>,
}

impl GuiAutomator {
    pub fn new(backend: Arc<dyn UiBackend>, config: GuiConfig) -> Self {
        let config = Arc::new(config);
        Self {
            locator: WindowLocator::new(backend, Arc::clone(&config)),
            config,
        }
    }

    /// Submits `python_code` to Abaqus/CAE through its run-script dialog.
    ///
    /// The code is written to a temporary `.py` file whose path is typed
    /// into the dialog; the file is deleted before returning, whatever the
    /// outcome. Returning `Ok` means the dialog was confirmed, not that the
    /// script ran without error; callers check the message log for that.
    pub fn execute_script(&mut self, python_code: &str) -> Result<String, AutomationError> {
        let script = ScriptFile::create(python_code)?;
        let result = self.submit_script(script.target_path());
        self.invalidate_on(&result);
        script.remove();
        result
    }

    /// Scrapes the current content of the message/log area.
    pub fn read_message_log(&mut self) -> Result<String, AutomationError> {
        let result = self.scrape_log();
        self.invalidate_on(&result);
        result
    }

    fn submit_script(&mut self, script_path: &str) -> Result<String, AutomationError> {
        let config = Arc::clone(&self.config);
        let session = self.locator.acquire()?;
        let dialog = open_submission_dialog(
            &config,
            session.connection.as_ref(),
            session.window.as_ref(),
        )?;
        submit_path(&config, dialog.as_ref(), script_path)?;
        info!(path = %script_path, "script submitted");
        Ok(format!(
            "Script submitted for execution via {}: {}",
            config.menu_path.join(" -> "),
            script_path
        ))
    }

    fn scrape_log(&mut self) -> Result<String, AutomationError> {
        let config = Arc::clone(&self.config);
        let session = self.locator.acquire()?;
        let content = scraper::read_message_log(&config, session.window.as_ref())?;
        Ok(format!(
            "Message Log Content (best effort extraction):\n------------------------\n{content}\n------------------------"
        ))
    }

    fn invalidate_on<T>(&mut self, result: &Result<T, AutomationError>) {
        if let Err(err) = result {
            if err.clears_session() {
                self.locator.invalidate();
            }
        }
    }
}

/// A temporary `.py` file holding the script for one submission.
///
/// Deletion is owned by `NamedTempFile`'s drop, so the file cannot outlive
/// the submission even on an early error return.
struct ScriptFile {
    file: NamedTempFile,
    target_path: String,
}

impl ScriptFile {
    fn create(python_code: &str) -> Result<Self, AutomationError> {
        let mut file = tempfile::Builder::new()
            .prefix("abaqus_script_")
            .suffix(".py")
            .tempfile()
            .map_err(|e| {
                AutomationError::Unexpected(format!("could not create script file: {e}"))
            })?;
        file.write_all(python_code.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| {
                AutomationError::Unexpected(format!("could not write script file: {e}"))
            })?;
        let target_path = to_target_separators(&file.path().to_string_lossy());
        Ok(Self { file, target_path })
    }

    /// The path as it will be typed into the dialog.
    fn target_path(&self) -> &str {
        &self.target_path
    }

    fn remove(self) {
        if let Err(err) = self.file.close() {
            warn!(%err, "could not delete temporary script file");
        }
    }
}

/// Normalizes forward slashes to the native separator so the path pasted
/// into the file dialog matches what the target shell expects. A no-op on
/// platforms whose separator already is `/`.
fn to_target_separators(path: &str) -> String {
    if MAIN_SEPARATOR == '/' {
        path.to_string()
    } else {
        path.replace('/', std::path::MAIN_SEPARATOR_STR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_file_is_deleted_after_remove() {
        let script = ScriptFile::create("print('hi')").unwrap();
        let path = script.file.path().to_path_buf();
        assert!(path.exists());
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("abaqus_script_"));
        assert!(name.ends_with(".py"));

        script.remove();
        assert!(!path.exists());
    }

    #[test]
    fn script_file_holds_the_exact_code() {
        let code = "from abaqus import *\nprint('ok')\n";
        let script = ScriptFile::create(code).unwrap();
        let on_disk = std::fs::read_to_string(script.file.path()).unwrap();
        assert_eq!(on_disk, code);
    }

    #[test]
    fn separator_conversion_is_identity_on_unix() {
        if MAIN_SEPARATOR == '/' {
            assert_eq!(to_target_separators("/tmp/a/b.py"), "/tmp/a/b.py");
        } else {
            assert_eq!(to_target_separators("C:/tmp/b.py"), r"C:\tmp\b.py");
        }
    }
}
