//! Template builder for the three message shapes.
//!
//! DESIGN
//! ======
//! The builder keeps one draft per variant so switching the selected kind
//! never loses what the operator typed. Outgoing data is produced only
//! through [`TemplateBuilder::template`], which reads the active draft and
//! yields a [`MessageTemplate`] tagged union; inactive drafts cannot leak.
//!
//! Sub-lists (buttons, list options) are plain vectors addressed by
//! position, so removal always leaves positions contiguous.

#[cfg(test)]
#[path = "template_test.rs"]
mod template_test;

use serde::{Deserialize, Serialize};

use crate::api::types::CampaignDraft;
use crate::error::ValidationError;

// =============================================================================
// KINDS
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Button,
    List,
}

impl std::str::FromStr for MessageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "button" => Ok(Self::Button),
            "list" => Ok(Self::List),
            other => Err(format!("unknown message kind '{other}' (expected text, button or list)")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonKind {
    QuickReply,
    Url,
    Call,
}

impl std::str::FromStr for ButtonKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quick_reply" => Ok(Self::QuickReply),
            "url" => Ok(Self::Url),
            "call" => Ok(Self::Call),
            other => Err(format!("unknown button type '{other}' (expected quick_reply, url or call)")),
        }
    }
}

// =============================================================================
// SUB-ENTRIES
// =============================================================================

/// A button row. `kind` stays `None` until the operator picks one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateButton {
    pub text: String,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: Option<ButtonKind>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOption {
    pub text: String,
    pub id: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryField {
    Text,
    Id,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateField {
    Body,
    Header,
    Footer,
}

impl std::fmt::Display for TemplateField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Body => "body",
            Self::Header => "header",
            Self::Footer => "footer",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("select a message type first")]
    NoVariant,

    #[error("{kind:?} messages have no {field}")]
    UnsupportedField { kind: MessageKind, field: TemplateField },
}

// =============================================================================
// TEMPLATE
// =============================================================================

/// The message content of the active variant, ready to send.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum MessageTemplate {
    Text {
        body: String,
    },
    Button {
        header: Option<String>,
        body: String,
        footer: Option<String>,
        buttons: Vec<TemplateButton>,
    },
    List {
        header: Option<String>,
        body: String,
        footer: Option<String>,
        options: Vec<ListOption>,
    },
}

impl MessageTemplate {
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Text { .. } => MessageKind::Text,
            Self::Button { .. } => MessageKind::Button,
            Self::List { .. } => MessageKind::List,
        }
    }
}

// =============================================================================
// BUILDER
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct TextDraft {
    body: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct ButtonDraft {
    header: String,
    body: String,
    footer: String,
    buttons: Vec<TemplateButton>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct ListDraft {
    header: String,
    body: String,
    footer: String,
    options: Vec<ListOption>,
}

/// Form state of the compose dialog's template section.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TemplateBuilder {
    name: String,
    kind: Option<MessageKind>,
    text: TextDraft,
    button: ButtonDraft,
    list: ListDraft,
}

impl TemplateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[must_use]
    pub fn kind(&self) -> Option<MessageKind> {
        self.kind
    }

    /// Switch the active variant. Drafts of other variants are preserved.
    pub fn set_variant(&mut self, kind: MessageKind) {
        self.kind = Some(kind);
    }

    /// Set a scalar field on the active variant.
    ///
    /// # Errors
    ///
    /// Fails if no variant is selected, or the variant has no such field
    /// (text messages only carry a body).
    pub fn set_field(&mut self, field: TemplateField, value: impl Into<String>) -> Result<(), TemplateError> {
        let kind = self.kind.ok_or(TemplateError::NoVariant)?;
        let slot = match (kind, field) {
            (MessageKind::Text, TemplateField::Body) => &mut self.text.body,
            (MessageKind::Text, field) => return Err(TemplateError::UnsupportedField { kind, field }),
            (MessageKind::Button, TemplateField::Body) => &mut self.button.body,
            (MessageKind::Button, TemplateField::Header) => &mut self.button.header,
            (MessageKind::Button, TemplateField::Footer) => &mut self.button.footer,
            (MessageKind::List, TemplateField::Body) => &mut self.list.body,
            (MessageKind::List, TemplateField::Header) => &mut self.list.header,
            (MessageKind::List, TemplateField::Footer) => &mut self.list.footer,
        };
        *slot = value.into();
        Ok(())
    }

    #[must_use]
    pub fn buttons(&self) -> &[TemplateButton] {
        &self.button.buttons
    }

    #[must_use]
    pub fn list_options(&self) -> &[ListOption] {
        &self.list.options
    }

    pub fn append_button(&mut self) {
        self.button.buttons.push(TemplateButton::default());
    }

    pub fn update_button(&mut self, index: usize, field: EntryField, value: impl Into<String>) -> bool {
        let Some(button) = self.button.buttons.get_mut(index) else {
            return false;
        };
        match field {
            EntryField::Text => button.text = value.into(),
            EntryField::Id => button.id = value.into(),
        }
        true
    }

    pub fn set_button_kind(&mut self, index: usize, kind: ButtonKind) -> bool {
        let Some(button) = self.button.buttons.get_mut(index) else {
            return false;
        };
        button.kind = Some(kind);
        true
    }

    pub fn remove_button(&mut self, index: usize) -> bool {
        if index >= self.button.buttons.len() {
            return false;
        }
        self.button.buttons.remove(index);
        true
    }

    pub fn append_list_option(&mut self) {
        self.list.options.push(ListOption::default());
    }

    pub fn update_list_option(&mut self, index: usize, field: EntryField, value: impl Into<String>) -> bool {
        let Some(option) = self.list.options.get_mut(index) else {
            return false;
        };
        match field {
            EntryField::Text => option.text = value.into(),
            EntryField::Id => option.id = value.into(),
        }
        true
    }

    pub fn remove_list_option(&mut self, index: usize) -> bool {
        if index >= self.list.options.len() {
            return false;
        }
        self.list.options.remove(index);
        true
    }

    /// The active variant's content, or `None` when no variant is selected.
    ///
    /// Variant-specific fields are not checked; empty bodies and empty
    /// sub-lists are passed through for the backend to judge.
    #[must_use]
    pub fn template(&self) -> Option<MessageTemplate> {
        let template = match self.kind? {
            MessageKind::Text => MessageTemplate::Text { body: self.text.body.clone() },
            MessageKind::Button => MessageTemplate::Button {
                header: non_blank(&self.button.header),
                body: self.button.body.clone(),
                footer: non_blank(&self.button.footer),
                buttons: self.button.buttons.clone(),
            },
            MessageKind::List => MessageTemplate::List {
                header: non_blank(&self.list.header),
                body: self.list.body.clone(),
                footer: non_blank(&self.list.footer),
                options: self.list.options.clone(),
            },
        };
        Some(template)
    }

    /// Build the `POST /campaign` body.
    ///
    /// # Errors
    ///
    /// Fails when the campaign name is blank or no variant is selected.
    pub fn draft(&self) -> Result<CampaignDraft, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingCampaignName);
        }
        let template = self.template().ok_or(ValidationError::MissingMessageKind)?;
        Ok(CampaignDraft::from_template(name, template))
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl CampaignDraft {
    #[must_use]
    pub fn from_template(name: &str, template: MessageTemplate) -> Self {
        let category = template.kind();
        let mut draft = Self {
            name: name.to_owned(),
            category,
            text: String::new(),
            header: String::new(),
            footer: String::new(),
            buttons: Vec::new(),
            list_options: Vec::new(),
        };
        match template {
            MessageTemplate::Text { body } => draft.text = body,
            MessageTemplate::Button { header, body, footer, buttons } => {
                draft.header = header.unwrap_or_default();
                draft.text = body;
                draft.footer = footer.unwrap_or_default();
                draft.buttons = buttons;
            }
            MessageTemplate::List { header, body, footer, options } => {
                draft.header = header.unwrap_or_default();
                draft.text = body;
                draft.footer = footer.unwrap_or_default();
                draft.list_options = options;
            }
        }
        draft
    }
}

fn non_blank(value: &str) -> Option<String> {
    if value.trim().is_empty() { None } else { Some(value.to_owned()) }
}
