//! Controller-level error taxonomy.
//!
//! DESIGN
//! ======
//! `ValidationError` is raised before any network call and never retried.
//! `ApiError` (see `api::types`) covers transport and non-2xx failures.
//! `ConsoleError` is the union surfaced by `CampaignConsole` operations.
//! Every error carries a grepable `E_*` code through [`ErrorCode`] so log
//! lines and CLI output stay uniform.

use crate::api::types::{ApiError, CampaignId};

/// Grepable error code and retryable flag for structured error output.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

/// A local precondition failed. No request was sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("no campaign selected")]
    NoCampaignSelected,

    #[error("upload a file or enter at least one contact")]
    NoRecipients,

    #[error("campaign name is required")]
    MissingCampaignName,

    #[error("message type is required")]
    MissingMessageKind,
}

impl ErrorCode for ValidationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NoCampaignSelected => "E_NO_CAMPAIGN",
            Self::NoRecipients => "E_NO_RECIPIENTS",
            Self::MissingCampaignName => "E_MISSING_NAME",
            Self::MissingMessageKind => "E_MISSING_KIND",
        }
    }
}

// =============================================================================
// CONSOLE
// =============================================================================

/// Errors returned by [`crate::services::console::CampaignConsole`] and the
/// dispatch submitter.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A dispatch for the same campaign has not completed yet.
    #[error("a dispatch for campaign {0} is already in flight")]
    Busy(CampaignId),

    #[error("unknown campaign: {0}")]
    UnknownCampaign(CampaignId),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("failed to read bulk file {path}: {source}")]
    BulkFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ErrorCode for ConsoleError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.error_code(),
            Self::Busy(_) => "E_BUSY",
            Self::UnknownCampaign(_) => "E_UNKNOWN_CAMPAIGN",
            Self::Api(e) => e.error_code(),
            Self::BulkFile { .. } => "E_BULK_FILE",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Busy(_) => true,
            Self::Api(e) => e.retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
