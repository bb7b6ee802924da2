//! Entitlement grants and the immutable snapshot returned to the host page.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::RuntimeError;

/// A grant permitting access to one or more products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    /// Where the grant came from (publisher, platform, ...).
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub products: Vec<String>,
    /// Opaque access token.
    #[serde(default)]
    pub subscription_token: String,
}

impl Entitlement {
    pub fn new(
        source: impl Into<String>,
        products: Vec<String>,
        subscription_token: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            products,
            subscription_token: subscription_token.into(),
        }
    }

    /// Whether this grant covers the product. `None` matches any product.
    pub fn enables(&self, product: Option<&str>) -> bool {
        match product {
            Some(product) => self.products.iter().any(|p| p == product),
            None => !self.products.is_empty(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(Entitlement),
    Many(Vec<Entitlement>),
}

#[derive(Deserialize)]
struct EntitlementsBody {
    #[serde(default)]
    entitlements: Option<OneOrMany>,
}

/// Snapshot of a user's entitlements for one publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlements {
    pub service: String,
    /// Raw response body as received.
    pub raw: String,
    pub entitlements: Vec<Entitlement>,
    /// Product of the page the snapshot was fetched for.
    pub product: Option<String>,
}

impl Entitlements {
    pub fn new(
        service: impl Into<String>,
        raw: impl Into<String>,
        entitlements: Vec<Entitlement>,
        product: Option<String>,
    ) -> Self {
        Self {
            service: service.into(),
            raw: raw.into(),
            entitlements,
            product,
        }
    }

    /// Parses an entitlements response body.
    ///
    /// Accepts either a list or a single object under `entitlements`; a
    /// missing key is an empty snapshot.
    pub fn from_json(
        service: impl Into<String>,
        json: &Value,
        product: Option<String>,
    ) -> Result<Self, RuntimeError> {
        let body: EntitlementsBody = serde_json::from_value(json.clone())
            .map_err(|e| RuntimeError::invalid_response(format!("entitlements: {}", e)))?;
        let entitlements = match body.entitlements {
            Some(OneOrMany::One(entitlement)) => vec![entitlement],
            Some(OneOrMany::Many(list)) => list,
            None => Vec::new(),
        };
        Ok(Self::new(service, json.to_string(), entitlements, product))
    }

    /// Whether any grant covers the page's own product.
    pub fn enables_this(&self) -> bool {
        self.product
            .as_deref()
            .map(|product| self.enables(product))
            .unwrap_or(false)
    }

    pub fn enables(&self, product: &str) -> bool {
        self.get_entitlement_for(Some(product)).is_some()
    }

    pub fn enables_any(&self) -> bool {
        self.entitlements.iter().any(|e| e.enables(None))
    }

    /// First grant covering the product, or the first non-empty grant when
    /// no product is given.
    pub fn get_entitlement_for(&self, product: Option<&str>) -> Option<&Entitlement> {
        self.entitlements.iter().find(|e| e.enables(product))
    }
}
