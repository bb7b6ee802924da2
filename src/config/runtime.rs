//! Runtime configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Settings shared by every configured runtime.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RuntimeSettings {
    /// Origin serving activities and the entitlements API.
    /// Activity results must come from this origin.
    #[serde(default = "default_service_origin")]
    pub service_origin: String,

    /// Path prefix of the entitlements API under the service origin
    #[serde(default = "default_api_base_path")]
    pub api_base_path: String,

    /// Service name recorded on entitlement snapshots
    #[serde(default = "default_service_id")]
    pub service_id: String,

    /// Whether the host binding starts the entitlements flow on install
    #[serde(default)]
    pub control: ControlMode,
}

/// Start behaviour after installation
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    #[default]
    Auto,
    Manual,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            service_origin: default_service_origin(),
            api_base_path: default_api_base_path(),
            service_id: default_service_id(),
            control: ControlMode::default(),
        }
    }
}

impl RuntimeSettings {
    /// Entitlements endpoint for a publication
    pub fn entitlements_url(&self, publication_id: &str) -> String {
        format!(
            "{}{}/publication/{}/entitlements",
            self.service_origin.trim_end_matches('/'),
            self.api_base_path.trim_end_matches('/'),
            publication_id
        )
    }

    /// Validate runtime settings
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.service_origin.is_empty() {
            return Err(ValidationError::MissingRequired("SERVICE_ORIGIN"));
        }
        if self.service_id.is_empty() {
            return Err(ValidationError::MissingRequired("SERVICE_ID"));
        }

        let origin = self.service_origin.trim_end_matches('/');
        let rest = if let Some(rest) = origin.strip_prefix("https://") {
            rest
        } else if let Some(rest) = origin.strip_prefix("http://") {
            // Plain http only for local development
            if !(rest.starts_with("localhost") || rest.starts_with("127.0.0.1")) {
                return Err(ValidationError::InvalidServiceOrigin);
            }
            rest
        } else {
            return Err(ValidationError::InvalidServiceOrigin);
        };
        if rest.is_empty() || rest.contains('/') {
            return Err(ValidationError::InvalidServiceOrigin);
        }

        if !self.api_base_path.starts_with('/') {
            return Err(ValidationError::InvalidApiBasePath);
        }

        Ok(())
    }
}

fn default_service_origin() -> String {
    "https://subscribe.example.com".to_string()
}

fn default_api_base_path() -> String {
    "/swg/_/api/v1".to_string()
}

fn default_service_id() -> String {
    "subscribe.example.com".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = RuntimeSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.control, ControlMode::Auto);
    }

    #[test]
    fn test_entitlements_url() {
        let settings = RuntimeSettings::default();
        assert_eq!(
            settings.entitlements_url("pub1"),
            "https://subscribe.example.com/swg/_/api/v1/publication/pub1/entitlements"
        );
    }

    #[test]
    fn test_plain_http_only_for_localhost() {
        let local = RuntimeSettings {
            service_origin: "http://localhost:8000".to_string(),
            ..Default::default()
        };
        assert!(local.validate().is_ok());

        let remote = RuntimeSettings {
            service_origin: "http://subscribe.example.com".to_string(),
            ..Default::default()
        };
        assert_eq!(remote.validate(), Err(ValidationError::InvalidServiceOrigin));
    }

    #[test]
    fn test_origin_must_not_have_path() {
        let settings = RuntimeSettings {
            service_origin: "https://subscribe.example.com/path".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.validate(), Err(ValidationError::InvalidServiceOrigin));
    }

    #[test]
    fn test_api_base_path_needs_leading_slash() {
        let settings = RuntimeSettings {
            api_base_path: "api".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.validate(), Err(ValidationError::InvalidApiBasePath));
    }

    #[test]
    fn test_control_mode_deserialization() {
        let settings: RuntimeSettings = serde_json::from_str(r#"{"control": "manual"}"#).unwrap();
        assert_eq!(settings.control, ControlMode::Manual);
        assert_eq!(settings.service_id, "subscribe.example.com");
    }
}
