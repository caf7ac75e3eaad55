use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use crate::errors::AppError;
use crate::models::version::VersionParent;

/// Path parameters shared by the prompt and asset version routes.
///
/// Prompt routes carry `:project_id/prompts/:prompt_id`, asset routes
/// `:project_id/assets/:asset_key`; both may add `:tag` and `:lang`.
#[derive(Debug, Clone)]
pub struct VersionPath {
    pub parent: VersionParent,
    tag: Option<String>,
    lang: Option<String>,
}

impl VersionPath {
    pub fn tag(&self) -> Result<&str, AppError> {
        self.tag
            .as_deref()
            .ok_or_else(|| AppError::Validation("Version tag is required".to_string()))
    }

    pub fn lang(&self) -> Result<&str, AppError> {
        self.lang
            .as_deref()
            .ok_or_else(|| AppError::Validation("Language code is required".to_string()))
    }

    /// Key identifying one version across the service, e.g. for guards.
    pub fn version_key(&self) -> Result<String, AppError> {
        Ok(format!("{}/versions/{}", self.parent.key(), self.tag()?))
    }
}

fn parent_from(params: &mut HashMap<String, String>) -> Result<VersionParent, AppError> {
    let project_id = params
        .remove("project_id")
        .ok_or_else(|| AppError::Validation("Project id is required".to_string()))?;
    if let Some(prompt_id) = params.remove("prompt_id") {
        return Ok(VersionParent::Prompt {
            project_id,
            prompt_id,
        });
    }
    if let Some(asset_key) = params.remove("asset_key") {
        return Ok(VersionParent::Asset {
            project_id,
            asset_key,
        });
    }
    Err(AppError::Validation(
        "Either a prompt id or an asset key is required".to_string(),
    ))
}

#[async_trait]
impl<S> FromRequestParts<S> for VersionPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(mut params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        Ok(VersionPath {
            parent: parent_from(&mut params)?,
            tag: params.remove("tag"),
            lang: params.remove("lang"),
        })
    }
}
