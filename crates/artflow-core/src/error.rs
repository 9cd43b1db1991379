//! Error types for the automation core.

use artflow_browser::PageError;
use thiserror::Error;

/// Automation error taxonomy.
///
/// Every variant aborts the run when it escapes a step. Per-image download
/// failures never escape: they are logged and skipped inside the extraction
/// step, and a batch that saves nothing still succeeds.
/// [`AutomationError::Download`] only surfaces when the extraction step
/// cannot read the image links off the page at all.
#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("action not found: {0}")]
    ActionNotFound(String),

    #[error("action already registered: {0}")]
    DuplicateAction(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("timed out during {step}; last message: {last_seen:?}")]
    Timeout { step: String, last_seen: String },

    #[error("no messages found on the page during {0}")]
    EmptyTimeline(String),

    #[error("download failed: {0}")]
    Download(String),

    #[error("page error: {0}")]
    Page(#[from] PageError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for automation operations.
pub type Result<T> = std::result::Result<T, AutomationError>;
