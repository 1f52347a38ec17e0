//! crates/storecast_core/src/compose.rs
//!
//! Draft state and submission validation for the message composer.

use crate::domain::{NewMessage, Store};

/// The in-progress subject and body of the composer form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageDraft {
    pub title: String,
    pub body: String,
}

/// A single field's validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("required")]
    Required,
    #[error("at least one store must be selected")]
    EmptySelection,
}

/// Everything wrong with a submission. The three rules are evaluated
/// together rather than short-circuited, so a blank form reports every
/// failure at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    pub title: Option<FieldError>,
    pub body: Option<FieldError>,
    pub stores: Option<FieldError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none() && self.stores.is_none()
    }
}

/// Validates a draft against the committed store selection.
///
/// Title and body must be non-empty after trimming, and at least one store
/// must be selected. On success the returned message carries the trimmed
/// text and a frozen snapshot of each selected store, in selection order.
pub fn validate(draft: &MessageDraft, selected: &[Store]) -> Result<NewMessage, ValidationErrors> {
    let title = draft.title.trim();
    let body = draft.body.trim();

    let mut errors = ValidationErrors::default();
    if title.is_empty() {
        errors.title = Some(FieldError::Required);
    }
    if body.is_empty() {
        errors.body = Some(FieldError::Required);
    }
    if selected.is_empty() {
        errors.stores = Some(FieldError::EmptySelection);
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(NewMessage {
        title: title.to_owned(),
        body: body.to_owned(),
        list_of_stores: selected.iter().map(Store::snapshot).collect(),
    })
}
