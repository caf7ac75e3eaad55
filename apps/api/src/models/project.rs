use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPrompt {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAsset {
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Body of the initial version.
    pub value: String,
}

/// Flat upstream collections the dashboard only lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CatalogResource {
    Users,
    Tags,
    Regions,
    Environments,
    CulturalData,
    AiModels,
    ApiKeys,
}

impl CatalogResource {
    pub fn path_segment(self) -> &'static str {
        match self {
            CatalogResource::Users => "users",
            CatalogResource::Tags => "tags",
            CatalogResource::Regions => "regions",
            CatalogResource::Environments => "environments",
            CatalogResource::CulturalData => "cultural-data",
            CatalogResource::AiModels => "ai-models",
            CatalogResource::ApiKeys => "api-keys",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_resource_from_path() {
        let r: CatalogResource = serde_json::from_str("\"cultural-data\"").unwrap();
        assert_eq!(r, CatalogResource::CulturalData);
        assert_eq!(r.path_segment(), "cultural-data");
    }

    #[test]
    fn test_unknown_catalog_resource_rejected() {
        assert!(serde_json::from_str::<CatalogResource>("\"secrets\"").is_err());
    }
}
