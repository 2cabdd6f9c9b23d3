//! Composition state owned by the campaign console.
//!
//! DESIGN
//! ======
//! State is split by concern (`contacts`, `template`, `directory`) so the
//! controller and its tests can exercise each model on its own. None of these
//! types perform I/O except [`directory::CampaignDirectory::refresh`], which
//! goes through the [`crate::api::CampaignApi`] seam.

pub mod contacts;
pub mod directory;
pub mod template;
