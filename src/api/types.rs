//! Wire types shared by the backend client and the controller.
//!
//! The backend owns campaigns and their statistics; everything here is a
//! read-only copy or an outgoing request body.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ErrorCode;
use crate::state::contacts::BulkFile;
use crate::state::template::{ListOption, MessageKind, TemplateButton};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by backend calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, timeout, ...).
    #[error("request failed: {0}")]
    Transport(String),

    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    /// A 2xx body could not be decoded into the expected shape.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// No usable bearer token: missing, expired, or refused with HTTP 401.
    /// Carries the server's detail when the 401 body had one.
    #[error("not authenticated{}; log in again", detail_suffix(.0.as_deref()))]
    Unauthenticated(Option<String>),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),
}

impl ErrorCode for ApiError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "E_TRANSPORT",
            Self::Rejected { .. } => "E_REJECTED",
            Self::Decode(_) => "E_DECODE",
            Self::Unauthenticated(_) => "E_UNAUTHENTICATED",
            Self::ClientBuild(_) => "E_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Rejected { status: 429 | 500..=599, .. })
    }
}

fn detail_suffix(detail: Option<&str>) -> String {
    detail.map(|d| format!(" ({d})")).unwrap_or_default()
}

// =============================================================================
// CAMPAIGN
// =============================================================================

/// Opaque campaign identifier. The backend may send it as a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CampaignId(String);

impl CampaignId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CampaignId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CampaignId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for CampaignId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for CampaignId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl std::str::FromStr for CampaignId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().to_owned()))
    }
}

impl<'de> Deserialize<'de> for CampaignId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self(s),
            Raw::Unsigned(n) => Self(n.to_string()),
            Raw::Signed(n) => Self(n.to_string()),
        })
    }
}

/// A campaign as listed by `GET /campaigns`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    #[serde(default)]
    pub name: String,
}

// =============================================================================
// STATS
// =============================================================================

/// Delivery counters for one campaign, replaced wholesale on every poll.
///
/// Unknown fields (per-channel breakdowns and the like) are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignStats {
    #[serde(default)]
    pub total: u64,
    #[serde(default, alias = "total_seen")]
    pub total_seen: u64,
    #[serde(default, alias = "total_delivered")]
    pub total_delivered: u64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Recipients of one dispatch, already reconciled from the contact set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipients {
    /// A spreadsheet the backend parses. Manual entries are never sent with it.
    File(BulkFile),
    /// Manually entered numbers with their country codes.
    Manual(ManualRecipients),
}

impl Recipients {
    /// Number of manual recipients, or `None` for a file upload.
    #[must_use]
    pub fn manual_count(&self) -> Option<usize> {
        match self {
            Self::File(_) => None,
            Self::Manual(manual) => Some(manual.len()),
        }
    }
}

/// Index-aligned country codes and numbers.
///
/// Only built from `(code, number)` pairs, so both sequences always have the
/// same length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualRecipients {
    phone_codes: Vec<String>,
    phone_numbers: Vec<String>,
}

impl ManualRecipients {
    pub fn push(&mut self, phone_code: impl Into<String>, phone_number: impl Into<String>) {
        self.phone_codes.push(phone_code.into());
        self.phone_numbers.push(phone_number.into());
    }

    #[must_use]
    pub fn phone_codes(&self) -> &[String] {
        &self.phone_codes
    }

    #[must_use]
    pub fn phone_numbers(&self) -> &[String] {
        &self.phone_numbers
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.phone_numbers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phone_numbers.is_empty()
    }

    /// `(code, number)` pairs in entry order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.phone_codes
            .iter()
            .map(String::as_str)
            .zip(self.phone_numbers.iter().map(String::as_str))
    }
}

impl<C: Into<String>, N: Into<String>> FromIterator<(C, N)> for ManualRecipients {
    fn from_iter<I: IntoIterator<Item = (C, N)>>(iter: I) -> Self {
        let mut manual = Self::default();
        for (code, number) in iter {
            manual.push(code, number);
        }
        manual
    }
}

// =============================================================================
// CAMPAIGN DRAFT
// =============================================================================

/// Body of `POST /campaign`. Only the active variant's data is populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignDraft {
    pub name: String,
    pub category: MessageKind,
    pub text: String,
    pub header: String,
    pub footer: String,
    pub buttons: Vec<TemplateButton>,
    pub list_options: Vec<ListOption>,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
