use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::errors::AppError;
use crate::models::project::{Asset, CatalogResource, NewAsset, NewPrompt, Project, Prompt};
use crate::state::AppState;
use crate::versioning::validation::{validate_asset_key, validate_prompt_name, validate_text};
use crate::workspace::WorkspaceContext;

/// GET /api/v1/projects
pub async fn handle_list_projects(
    State(state): State<AppState>,
) -> Result<Json<Vec<Project>>, AppError> {
    let projects = state
        .upstream
        .list_projects()
        .await
        .map_err(AppError::upstream("Failed to load projects"))?;
    Ok(Json(projects))
}

/// GET /api/v1/workspace
/// Loads the stored selection and re-validates it against the live project list.
pub async fn handle_get_workspace(
    State(state): State<AppState>,
) -> Result<Json<WorkspaceContext>, AppError> {
    let stored = state.selection_store.load().await?;
    let projects = state
        .upstream
        .list_projects()
        .await
        .map_err(AppError::upstream("Failed to load projects"))?;

    let ctx = stored.reconciled(&projects);
    if ctx != stored {
        info!(
            "Workspace selection changed from {:?} to {:?}",
            stored.selected_project_id, ctx.selected_project_id
        );
        state.selection_store.save(&ctx).await?;
    }
    Ok(Json(ctx))
}

/// PUT /api/v1/workspace
pub async fn handle_put_workspace(
    State(state): State<AppState>,
    Json(ctx): Json<WorkspaceContext>,
) -> Result<Json<WorkspaceContext>, AppError> {
    if ctx.selected_prompt_id.is_some() && ctx.selected_project_id.is_none() {
        return Err(AppError::Validation(
            "A prompt can only be selected together with its project".to_string(),
        ));
    }
    if let Some(project_id) = &ctx.selected_project_id {
        let projects = state
            .upstream
            .list_projects()
            .await
            .map_err(AppError::upstream("Failed to load projects"))?;
        if !projects.iter().any(|p| &p.id == project_id) {
            return Err(AppError::Validation(format!(
                "Project '{project_id}' does not exist"
            )));
        }
    }
    state.selection_store.save(&ctx).await?;
    Ok(Json(ctx))
}

/// GET /api/v1/projects/:project_id/prompts
pub async fn handle_list_prompts(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<Prompt>>, AppError> {
    let prompts = state
        .upstream
        .list_prompts(&project_id)
        .await
        .map_err(AppError::upstream("Failed to load prompts"))?;
    Ok(Json(prompts))
}

/// POST /api/v1/projects/:project_id/prompts
pub async fn handle_create_prompt(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(req): Json<NewPrompt>,
) -> Result<(StatusCode, Json<Prompt>), AppError> {
    validate_prompt_name(&req.name).map_err(AppError::Validation)?;
    let prompt = state
        .upstream
        .create_prompt(&project_id, &req)
        .await
        .map_err(AppError::upstream("Failed to create prompt"))?;
    info!("Created prompt {} in project {project_id}", prompt.id);
    Ok((StatusCode::CREATED, Json(prompt)))
}

/// GET /api/v1/projects/:project_id/assets
pub async fn handle_list_assets(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<Asset>>, AppError> {
    let assets = state
        .upstream
        .list_assets(&project_id)
        .await
        .map_err(AppError::upstream("Failed to load assets"))?;
    Ok(Json(assets))
}

/// POST /api/v1/projects/:project_id/assets
pub async fn handle_create_asset(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(req): Json<NewAsset>,
) -> Result<(StatusCode, Json<Asset>), AppError> {
    validate_text(&req.value, "Asset value").map_err(AppError::Validation)?;
    let existing = state
        .upstream
        .list_assets(&project_id)
        .await
        .map_err(AppError::upstream("Failed to load assets"))?;
    validate_asset_key(&req.key, existing.iter().map(|a| a.key.as_str()))
        .map_err(AppError::Validation)?;

    let asset = state
        .upstream
        .create_asset(&project_id, &req)
        .await
        .map_err(AppError::upstream("Failed to create asset"))?;
    info!("Created asset {} in project {project_id}", asset.key);
    Ok((StatusCode::CREATED, Json(asset)))
}

#[derive(Deserialize)]
pub struct BreadcrumbQuery {
    pub asset_key: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Breadcrumbs {
    pub project: Project,
    pub prompt: Prompt,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<Asset>,
}

/// GET /api/v1/projects/:project_id/prompts/:prompt_id/breadcrumbs
/// Fetches all trail entries concurrently and waits for every one of them.
pub async fn handle_breadcrumbs(
    State(state): State<AppState>,
    Path((project_id, prompt_id)): Path<(String, String)>,
    Query(query): Query<BreadcrumbQuery>,
) -> Result<Json<Breadcrumbs>, AppError> {
    let upstream = &state.upstream;
    let asset = async {
        match &query.asset_key {
            Some(key) => upstream.get_asset(&project_id, key).await.map(Some),
            None => Ok(None),
        }
    };

    let (project, prompt, asset) = tokio::try_join!(
        upstream.get_project(&project_id),
        upstream.get_prompt(&project_id, &prompt_id),
        asset
    )
    .map_err(AppError::upstream("Failed to load navigation"))?;

    Ok(Json(Breadcrumbs {
        project,
        prompt,
        asset,
    }))
}

/// GET /api/v1/catalog/:resource
pub async fn handle_list_catalog(
    State(state): State<AppState>,
    Path(resource): Path<CatalogResource>,
) -> Result<Json<Value>, AppError> {
    let items = state
        .upstream
        .list_catalog(resource)
        .await
        .map_err(AppError::upstream("Failed to load list"))?;
    Ok(Json(items))
}

#[derive(Deserialize)]
pub struct SessionRequest {
    pub token: Option<String>,
}

/// PUT /api/v1/session
/// Replaces the bearer token used for upstream calls; `null` signs out.
pub async fn handle_put_session(
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> StatusCode {
    let token = req.token.filter(|t| !t.trim().is_empty());
    info!("Upstream session {}", if token.is_some() { "set" } else { "cleared" });
    state.upstream.set_token(token);
    StatusCode::NO_CONTENT
}

/// GET /api/v1/upstream/health
pub async fn handle_upstream_health(
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let health = state
        .upstream
        .health()
        .await
        .map_err(AppError::upstream("Upstream health check failed"))?;
    Ok(Json(json!({
        "upstream": state.config.upstream_api_url,
        "authenticated": state.upstream.has_token(),
        "health": health,
    })))
}
