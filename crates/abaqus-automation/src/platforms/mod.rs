//! Platform backends. Only Windows has a real implementation; everywhere
//! else callers get an error and tests use the mock backend instead.

use std::sync::Arc;

use crate::backend::UiBackend;
use crate::errors::AutomationError;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(target_os = "windows")]
pub fn default_backend() -> Result<Arc<dyn UiBackend>, AutomationError> {
    Ok(Arc::new(windows::WindowsBackend::new()?))
}

#[cfg(not(target_os = "windows"))]
pub fn default_backend() -> Result<Arc<dyn UiBackend>, AutomationError> {
    Err(AutomationError::PlatformError(
        "the Abaqus/CAE GUI backend is only available on Windows".to_string(),
    ))
}
