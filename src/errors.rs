use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("A run is already in progress")]
    AlreadyRunning,

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Platform-specific error: {0}")]
    PlatformError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
