//! Activities opened outside the host page.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::RequestId;

/// How the activity is presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityMode {
    Popup,
    Iframe,
}

/// The user interaction an activity performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    LinkAccounts,
    Purchase,
    Offers,
}

impl ActivityKind {
    /// Path of the activity relative to the service origin.
    pub fn path(&self) -> &'static str {
        match self {
            ActivityKind::LinkAccounts => "linkbackstart",
            ActivityKind::Purchase => "pay",
            ActivityKind::Offers => "offersiframe",
        }
    }

    pub fn mode(&self) -> ActivityMode {
        match self {
            ActivityKind::LinkAccounts | ActivityKind::Purchase => ActivityMode::Popup,
            ActivityKind::Offers => ActivityMode::Iframe,
        }
    }
}

/// Everything the transport needs to open one activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRequest {
    pub request_id: RequestId,
    pub kind: ActivityKind,
    pub mode: ActivityMode,
    pub url: String,
    pub params: Value,
}

impl ActivityRequest {
    pub fn new(request_id: RequestId, kind: ActivityKind, service_origin: &str, params: Value) -> Self {
        Self {
            request_id,
            kind,
            mode: kind.mode(),
            url: format!("{}/{}", service_origin.trim_end_matches('/'), kind.path()),
            params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_url_from_origin_and_kind() {
        let request = ActivityRequest::new(
            RequestId::well_known(RequestId::PAY),
            ActivityKind::Purchase,
            "https://subscribe.example.com/",
            json!({"sku": "sku1"}),
        );
        assert_eq!(request.url, "https://subscribe.example.com/pay");
        assert_eq!(request.mode, ActivityMode::Popup);
    }

    #[test]
    fn offers_open_in_a_frame() {
        assert_eq!(ActivityKind::Offers.mode(), ActivityMode::Iframe);
        assert_eq!(ActivityKind::LinkAccounts.mode(), ActivityMode::Popup);
    }
}
