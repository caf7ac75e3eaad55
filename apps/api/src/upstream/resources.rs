use reqwest::Method;
use serde_json::{json, Value};

use super::{ApiClient, ApiError};
use crate::models::project::{Asset, CatalogResource, NewAsset, NewPrompt, Project, Prompt};
use crate::models::version::{NewVersion, Translation, Version, VersionParent, VersionPatch};
use crate::versioning::marketplace::MarketplaceAction;

/// Path of a single version under its parent.
fn version_path<'a>(parent: &'a VersionParent, tag: &'a str) -> Vec<&'a str> {
    let mut segments = parent.segments().to_vec();
    segments.extend(["versions", tag]);
    segments
}

fn versions_path(parent: &VersionParent) -> Vec<&str> {
    let mut segments = parent.segments().to_vec();
    segments.push("versions");
    segments
}

impl ApiClient {
    pub async fn health(&self) -> Result<Value, ApiError> {
        self.send_json(Method::GET, &["health"], None).await
    }

    pub async fn list_catalog(&self, resource: CatalogResource) -> Result<Value, ApiError> {
        self.send_json(Method::GET, &[resource.path_segment()], None)
            .await
    }

    // --- projects ---

    pub async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        self.send_json(Method::GET, &["projects"], None).await
    }

    pub async fn get_project(&self, project_id: &str) -> Result<Project, ApiError> {
        self.send_json(Method::GET, &["projects", project_id], None)
            .await
    }

    // --- prompts and assets ---

    pub async fn list_prompts(&self, project_id: &str) -> Result<Vec<Prompt>, ApiError> {
        self.send_json(Method::GET, &["projects", project_id, "prompts"], None)
            .await
    }

    pub async fn get_prompt(&self, project_id: &str, prompt_id: &str) -> Result<Prompt, ApiError> {
        self.send_json(
            Method::GET,
            &["projects", project_id, "prompts", prompt_id],
            None,
        )
        .await
    }

    pub async fn create_prompt(
        &self,
        project_id: &str,
        prompt: &NewPrompt,
    ) -> Result<Prompt, ApiError> {
        let body = json!({ "name": prompt.name, "description": prompt.description });
        self.send_json(
            Method::POST,
            &["projects", project_id, "prompts"],
            Some(&body),
        )
        .await
    }

    pub async fn list_assets(&self, project_id: &str) -> Result<Vec<Asset>, ApiError> {
        self.send_json(Method::GET, &["projects", project_id, "assets"], None)
            .await
    }

    pub async fn get_asset(&self, project_id: &str, asset_key: &str) -> Result<Asset, ApiError> {
        self.send_json(
            Method::GET,
            &["projects", project_id, "assets", asset_key],
            None,
        )
        .await
    }

    pub async fn create_asset(
        &self,
        project_id: &str,
        asset: &NewAsset,
    ) -> Result<Asset, ApiError> {
        let body = json!({ "key": asset.key, "name": asset.name, "value": asset.value });
        self.send_json(
            Method::POST,
            &["projects", project_id, "assets"],
            Some(&body),
        )
        .await
    }

    // --- versions ---

    pub async fn list_versions(&self, parent: &VersionParent) -> Result<Vec<Version>, ApiError> {
        self.send_json(Method::GET, &versions_path(parent), None)
            .await
    }

    pub async fn get_version(
        &self,
        parent: &VersionParent,
        tag: &str,
    ) -> Result<Version, ApiError> {
        self.send_json(Method::GET, &version_path(parent, tag), None)
            .await
    }

    pub async fn create_version(
        &self,
        parent: &VersionParent,
        version: &NewVersion,
    ) -> Result<Version, ApiError> {
        let body = parent.create_payload(version);
        self.send_json(Method::POST, &versions_path(parent), Some(&body))
            .await
    }

    pub async fn update_version(
        &self,
        parent: &VersionParent,
        tag: &str,
        patch: &VersionPatch,
    ) -> Result<Version, ApiError> {
        let body = parent.patch_payload(patch);
        self.send_json(Method::PATCH, &version_path(parent, tag), Some(&body))
            .await
    }

    pub async fn delete_version(&self, parent: &VersionParent, tag: &str) -> Result<(), ApiError> {
        self.send_empty(Method::DELETE, &version_path(parent, tag), None)
            .await
    }

    // --- translations ---

    pub async fn list_translations(
        &self,
        parent: &VersionParent,
        tag: &str,
    ) -> Result<Vec<Translation>, ApiError> {
        let mut path = version_path(parent, tag);
        path.push("translations");
        self.send_json(Method::GET, &path, None).await
    }

    pub async fn put_translation(
        &self,
        parent: &VersionParent,
        tag: &str,
        language_code: &str,
        text: &str,
    ) -> Result<Translation, ApiError> {
        let mut path = version_path(parent, tag);
        path.extend(["translations", language_code]);
        let body = parent.translation_payload(text);
        self.send_json(Method::PUT, &path, Some(&body)).await
    }

    pub async fn delete_translation(
        &self,
        parent: &VersionParent,
        tag: &str,
        language_code: &str,
    ) -> Result<(), ApiError> {
        let mut path = version_path(parent, tag);
        path.extend(["translations", language_code]);
        self.send_empty(Method::DELETE, &path, None).await
    }

    // --- marketplace ---

    /// Fires a marketplace transition and returns the server's view of the version.
    pub async fn marketplace_transition(
        &self,
        parent: &VersionParent,
        tag: &str,
        action: MarketplaceAction,
    ) -> Result<Version, ApiError> {
        let mut path = version_path(parent, tag);
        path.extend(["marketplace", action.path_segment()]);
        self.send_json(Method::POST, &path, None).await
    }
}
