//! Values handed to the host page's callback slots when a flow completes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::RuntimeError;

/// Purchase record returned by the payment activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseData {
    /// Raw purchase JSON.
    pub raw: String,
    pub signature: Option<String>,
}

/// Outcome of a successful purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeResponse {
    /// Raw activity payload.
    pub raw: String,
    pub purchase_data: PurchaseData,
    /// SKU that was purchased.
    pub sku: Option<String>,
}

impl SubscribeResponse {
    /// Parses the payload of a successful purchase activity.
    ///
    /// `purchaseData` may be an object or a JSON-encoded string. The SKU is
    /// read from the payload, then from `purchaseData.productId`, then falls
    /// back to `pending_sku`.
    pub fn from_payload(payload: &Value, pending_sku: Option<String>) -> Result<Self, RuntimeError> {
        let object = payload
            .as_object()
            .ok_or_else(|| RuntimeError::invalid_response("purchase payload is not an object"))?;

        let purchase = match object.get("purchaseData") {
            Some(Value::String(encoded)) => serde_json::from_str::<Value>(encoded)
                .map_err(|e| RuntimeError::invalid_response(format!("purchaseData: {}", e)))?,
            Some(value @ Value::Object(_)) => value.clone(),
            Some(_) => return Err(RuntimeError::invalid_response("purchaseData has wrong type")),
            None => Value::Object(Default::default()),
        };

        let signature = object
            .get("signature")
            .or_else(|| object.get("dataSignature"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let sku = object
            .get("sku")
            .and_then(Value::as_str)
            .or_else(|| purchase.get("productId").and_then(Value::as_str))
            .map(str::to_string)
            .or(pending_sku);

        Ok(Self {
            raw: payload.to_string(),
            purchase_data: PurchaseData {
                raw: purchase.to_string(),
                signature,
            },
            sku,
        })
    }
}

/// Request for the host page to sign the user in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// The user asked to link an existing subscription.
    pub link_requested: bool,
}

impl LoginRequest {
    /// Reads a login request out of activity context data, if one is present.
    ///
    /// Recognized shapes: `{"loginRequested": true}` and
    /// `{"alreadySubscribed": true, "linkRequested": bool}`.
    pub fn from_context(data: &Value) -> Option<Self> {
        let flag = |key: &str| data.get(key).and_then(Value::as_bool).unwrap_or(false);
        if flag("loginRequested") || flag("alreadySubscribed") {
            Some(Self {
                link_requested: flag("linkRequested"),
            })
        } else {
            None
        }
    }
}
