use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutomationError {
    /// No window/process pair matched the configured Abaqus/CAE identifiers,
    /// or the matched window failed its existence/visibility checks.
    #[error("Abaqus/CAE window not found: {0}")]
    TargetNotFound(String),

    #[error("'Run Script' dialog not found: {0}")]
    DialogNotFound(String),

    #[error("dialog control not found: {0}")]
    ControlNotFound(String),

    #[error("operation timed out: {0}")]
    Timeout(String),

    /// A candidate message area was located but no text could be read out of it.
    #[error("message area found but no text could be extracted: {0}")]
    ScrapeEmpty(String),

    /// No element matched either message-area heuristic.
    #[error("message area not found: {0}")]
    ScrapeNotFound(String),

    #[error("platform automation error: {0}")]
    PlatformError(String),

    #[error("unexpected automation failure: {0}")]
    Unexpected(String),
}

impl AutomationError {
    /// Whether the cached session may be stale after this error and must be
    /// dropped so the next call rediscovers the window from scratch.
    ///
    /// Dialog, control and scrape failures keep the session: the main window
    /// itself was still valid when they occurred.
    pub fn clears_session(&self) -> bool {
        matches!(
            self,
            Self::TargetNotFound(_)
                | Self::Timeout(_)
                | Self::PlatformError(_)
                | Self::Unexpected(_)
        )
    }
}
