//! Page configuration value object.

use serde::Serialize;

use crate::domain::foundation::ValidationError;

/// Immutable description of the page the runtime gates.
///
/// Built from a single `publication` or `publication:label` identifier.
/// When a label is present the whole identifier names the product the page
/// belongs to; a bare publication id has no product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageConfig {
    publication_id: String,
    product_id: Option<String>,
    label: Option<String>,
    locked: bool,
}

impl PageConfig {
    /// Parses a product or publication identifier.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for empty identifiers or identifiers
    /// containing characters that cannot appear in a URL path segment.
    pub fn new(product_or_publication_id: &str, locked: bool) -> Result<Self, ValidationError> {
        let id = product_or_publication_id.trim();
        if id.is_empty() {
            return Err(ValidationError::empty_field("product_or_publication_id"));
        }
        if let Some(bad) = id.chars().find(|c| matches!(c, '/' | '?' | '#') || c.is_whitespace()) {
            return Err(ValidationError::invalid_format(
                "product_or_publication_id",
                format!("contains {:?}", bad),
            ));
        }

        let (publication_id, product_id, label) = match id.split_once(':') {
            Some((publication, label)) => {
                if publication.is_empty() {
                    return Err(ValidationError::empty_field("publication_id"));
                }
                (
                    publication.to_string(),
                    Some(id.to_string()),
                    Some(label.to_string()).filter(|l| !l.is_empty()),
                )
            }
            None => (id.to_string(), None, None),
        };

        Ok(Self {
            publication_id,
            product_id,
            label,
            locked,
        })
    }

    pub fn publication_id(&self) -> &str {
        &self.publication_id
    }

    /// Product the page belongs to, if any.
    pub fn product_id(&self) -> Option<&str> {
        self.product_id.as_deref()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Whether the content is gated behind an entitlement.
    pub fn is_locked(&self) -> bool {
        self.locked
    }
}
