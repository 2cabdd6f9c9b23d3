//! Contact set: manually entered numbers plus an optional bulk upload.
//!
//! DESIGN
//! ======
//! Both sources may be populated at once; only [`ContactSet::recipients`]
//! reconciles them, and a bulk file always wins. Phone-number syntax is the
//! backend's concern, so nothing here validates digits.

#[cfg(test)]
#[path = "contacts_test.rs"]
mod contacts_test;

use std::path::Path;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::api::types::{ManualRecipients, Recipients};
use crate::error::ValidationError;

pub const DEFAULT_COUNTRY_CODE: &str = "91";

/// One manually entered recipient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEntry {
    pub country_code: String,
    pub number: String,
}

impl Default for ContactEntry {
    fn default() -> Self {
        Self { country_code: DEFAULT_COUNTRY_CODE.to_owned(), number: String::new() }
    }
}

impl ContactEntry {
    fn is_blank(&self) -> bool {
        self.number.trim().is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactField {
    CountryCode,
    Number,
}

/// An uploaded spreadsheet, kept opaque and forwarded as-is.
///
/// Cloning shares the buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct BulkFile {
    pub name: String,
    pub bytes: Bytes,
}

impl BulkFile {
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self { name: name.into(), bytes: bytes.into() }
    }

    /// Read a file from disk, using its file name as the display name.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the file cannot be read.
    pub async fn load(path: &Path) -> std::io::Result<Self> {
        let bytes = Bytes::from(tokio::fs::read(path).await?);
        let name = path
            .file_name()
            .map_or_else(|| "upload".to_owned(), |n| n.to_string_lossy().into_owned());
        Ok(Self { name, bytes })
    }
}

impl std::fmt::Debug for BulkFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Recipients currently specified in the compose dialog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContactSet {
    entries: Vec<ContactEntry>,
    bulk_file: Option<BulkFile>,
}

impl Default for ContactSet {
    /// One blank entry with the default country code, no file.
    fn default() -> Self {
        Self { entries: vec![ContactEntry::default()], bulk_file: None }
    }
}

impl ContactSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entries(&self) -> &[ContactEntry] {
        &self.entries
    }

    #[must_use]
    pub fn bulk_file(&self) -> Option<&BulkFile> {
        self.bulk_file.as_ref()
    }

    pub fn add_manual_contact(&mut self) {
        self.entries.push(ContactEntry::default());
    }

    /// Whether the entry at `index` may be removed right now.
    ///
    /// The last remaining entry stays until another entry or a file exists.
    #[must_use]
    pub fn can_remove(&self, index: usize) -> bool {
        index < self.entries.len() && (self.entries.len() > 1 || self.bulk_file.is_some())
    }

    /// Remove the entry at `index`. Returns `false` (and does nothing) when
    /// the index is out of range or the entry is the last one without a file.
    pub fn remove_manual_contact(&mut self, index: usize) -> bool {
        if !self.can_remove(index) {
            return false;
        }
        self.entries.remove(index);
        true
    }

    /// Overwrite one field of the entry at `index`. Out-of-range is a no-op.
    pub fn update_manual_contact(&mut self, index: usize, field: ContactField, value: impl Into<String>) -> bool {
        let Some(entry) = self.entries.get_mut(index) else {
            return false;
        };
        match field {
            ContactField::CountryCode => entry.country_code = value.into(),
            ContactField::Number => entry.number = value.into(),
        }
        true
    }

    /// Attach or clear the bulk file. Manual entries are left alone.
    pub fn set_bulk_file(&mut self, file: Option<BulkFile>) {
        self.bulk_file = file;
    }

    /// Reconcile the two sources into what a dispatch actually sends.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoRecipients`] when there is no file and
    /// no entry with a non-blank number.
    pub fn recipients(&self) -> Result<Recipients, ValidationError> {
        if let Some(file) = &self.bulk_file {
            return Ok(Recipients::File(file.clone()));
        }

        let manual: ManualRecipients = self
            .entries
            .iter()
            .filter(|entry| !entry.is_blank())
            .map(|entry| (entry.country_code.trim(), entry.number.trim()))
            .collect();

        if manual.is_empty() {
            return Err(ValidationError::NoRecipients);
        }
        Ok(Recipients::Manual(manual))
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
