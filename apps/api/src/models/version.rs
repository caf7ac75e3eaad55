use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::versioning::marketplace::MarketplaceStatus;

/// A version of a prompt or an asset as returned by the upstream API.
/// Prompt versions carry their body in `promptText`, asset versions in `value`;
/// both land in `text`, which is also the name this service responds with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    #[serde(default)]
    pub version_tag: Option<String>,
    #[serde(default, alias = "promptText", alias = "value")]
    pub text: Option<String>,
    #[serde(default)]
    pub change_message: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub marketplace_status: MarketplaceStatus,
}

impl Version {
    pub fn tag(&self) -> Option<&str> {
        self.version_tag.as_deref()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub language_code: String,
    #[serde(default, alias = "promptText", alias = "value")]
    pub text: Option<String>,
}

/// Request body for creating a version. The tag is fixed from here on.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVersion {
    pub version_tag: String,
    #[serde(alias = "promptText", alias = "value")]
    pub text: String,
    #[serde(default)]
    pub change_message: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
}

/// Request body for updating a version. Tags are immutable once created.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionPatch {
    #[serde(default, alias = "promptText", alias = "value")]
    pub text: Option<String>,
    #[serde(default)]
    pub change_message: Option<String>,
}

impl VersionPatch {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.change_message.is_none()
    }
}

/// The entity that owns a list of versions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionParent {
    Prompt {
        project_id: String,
        prompt_id: String,
    },
    Asset {
        project_id: String,
        asset_key: String,
    },
}

impl VersionParent {
    pub fn kind(&self) -> &'static str {
        match self {
            VersionParent::Prompt { .. } => "prompt",
            VersionParent::Asset { .. } => "asset",
        }
    }

    /// Upstream path segments of the parent entity.
    pub fn segments(&self) -> [&str; 4] {
        match self {
            VersionParent::Prompt {
                project_id,
                prompt_id,
            } => ["projects", project_id.as_str(), "prompts", prompt_id.as_str()],
            VersionParent::Asset {
                project_id,
                asset_key,
            } => ["projects", project_id.as_str(), "assets", asset_key.as_str()],
        }
    }

    /// Name of the body-text field in upstream payloads.
    pub fn body_field(&self) -> &'static str {
        match self {
            VersionParent::Prompt { .. } => "promptText",
            VersionParent::Asset { .. } => "value",
        }
    }

    /// Stable key used for per-parent caches and selections.
    pub fn key(&self) -> String {
        self.segments().join("/")
    }

    pub fn create_payload(&self, v: &NewVersion) -> Value {
        let mut body = Map::new();
        body.insert("versionTag".into(), json!(v.version_tag));
        body.insert(self.body_field().into(), json!(v.text));
        if let Some(msg) = &v.change_message {
            body.insert("changeMessage".into(), json!(msg));
        }
        if let Some(lang) = &v.language_code {
            body.insert("languageCode".into(), json!(lang));
        }
        Value::Object(body)
    }

    pub fn patch_payload(&self, p: &VersionPatch) -> Value {
        let mut body = Map::new();
        if let Some(text) = &p.text {
            body.insert(self.body_field().into(), json!(text));
        }
        if let Some(msg) = &p.change_message {
            body.insert("changeMessage".into(), json!(msg));
        }
        Value::Object(body)
    }

    pub fn translation_payload(&self, text: &str) -> Value {
        let mut body = Map::new();
        body.insert(self.body_field().into(), json!(text));
        Value::Object(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset() -> VersionParent {
        VersionParent::Asset {
            project_id: "p1".into(),
            asset_key: "greeting_key".into(),
        }
    }

    #[test]
    fn test_version_reads_prompt_and_asset_bodies() {
        let prompt: Version = serde_json::from_value(json!({
            "versionTag": "1.0.0",
            "promptText": "Hello",
            "isActive": true,
            "marketplaceStatus": "PUBLISHED"
        }))
        .unwrap();
        assert_eq!(prompt.text.as_deref(), Some("Hello"));
        assert_eq!(prompt.marketplace_status, MarketplaceStatus::Published);

        let asset: Version =
            serde_json::from_value(json!({"versionTag": "v2", "value": "Hi"})).unwrap();
        assert_eq!(asset.text.as_deref(), Some("Hi"));
        assert_eq!(asset.marketplace_status, MarketplaceStatus::NotPublished);
    }

    #[test]
    fn test_body_serializes_as_text_for_both_kinds() {
        for body in [json!({"promptText": "Hello"}), json!({"value": "Hello"})] {
            let v: Version = serde_json::from_value(body).unwrap();
            let out = serde_json::to_value(&v).unwrap();
            assert_eq!(out["text"], "Hello");
            assert!(out.get("promptText").is_none());
            assert!(out.get("value").is_none());
        }

        let t: Translation =
            serde_json::from_value(json!({"languageCode": "es", "value": "Hola"})).unwrap();
        assert_eq!(serde_json::to_value(&t).unwrap()["text"], "Hola");
    }

    #[test]
    fn test_missing_body_is_none() {
        let v: Version = serde_json::from_value(json!({"versionTag": "1.0.0"})).unwrap();
        assert!(v.text.is_none());
    }

    #[test]
    fn test_asset_payload_uses_value_field() {
        let payload = asset().create_payload(&NewVersion {
            version_tag: "1.0.1".into(),
            text: "Hola".into(),
            change_message: Some("spanish tone".into()),
            language_code: None,
        });
        assert_eq!(payload["value"], "Hola");
        assert_eq!(payload["changeMessage"], "spanish tone");
        assert!(payload.get("promptText").is_none());
        assert!(payload.get("languageCode").is_none());
    }

    #[test]
    fn test_patch_payload_omits_unset_fields() {
        let parent = VersionParent::Prompt {
            project_id: "p1".into(),
            prompt_id: "welcome".into(),
        };
        let payload = parent.patch_payload(&VersionPatch {
            text: None,
            change_message: Some("typo".into()),
        });
        assert_eq!(payload, json!({"changeMessage": "typo"}));
    }

    #[test]
    fn test_parent_key() {
        assert_eq!(asset().key(), "projects/p1/assets/greeting_key");
    }
}
