//! Campaign composition and dispatch controller.
//!
//! ARCHITECTURE
//! ============
//! - `state`: contact set, template builder and campaign directory models.
//! - `services`: stats poller, dispatch submitter and the `CampaignConsole`
//!   controller that wires them together.
//! - `api`: the `CampaignApi` seam plus its `reqwest` implementation.
//! - `config`, `auth`, `error`: environment config, bearer credential and
//!   the `ErrorCode` taxonomy shared by every layer.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod services;
pub mod state;

#[cfg(test)]
pub(crate) mod test_helpers;
