use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::version::{NewVersion, Translation, Version, VersionParent, VersionPatch};
use crate::state::AppState;
use crate::upstream::ApiError;
use crate::versioning::compare::Toggle;
use crate::versioning::diff::{compare_versions, DiffResult};
use crate::versioning::extract::VersionPath;
use crate::versioning::latest::{resolve_latest, sorted_newest_first};
use crate::versioning::marketplace::MarketplaceAction;
use crate::versioning::optimistic::OptimisticList;
use crate::versioning::reference::{
    insert_at_selection, parse_references, FoundReference, Reference, Splice, VersionSelector,
};
use crate::versioning::validation::{
    validate_language_code, validate_new_tag, validate_reference, validate_text,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionListResponse {
    pub versions: Vec<Version>,
    pub latest: Option<String>,
    /// True while a change to one of the versions awaits confirmation.
    pub pending: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestResponse {
    pub latest: Option<String>,
}

/// Re-reads the parent's versions from upstream into the cache.
async fn refresh_versions(
    state: &AppState,
    parent: &VersionParent,
) -> Result<Vec<Version>, ApiError> {
    let fresh = state.upstream.list_versions(parent).await?;
    let mut cache = state.version_cache();
    let list = cache.entry(parent.key()).or_default();
    list.replace_all(fresh);
    Ok(list.records())
}

/// Re-fetch after a failed mutation so the cache shows authoritative state again.
async fn resync_after_failure(state: &AppState, parent: &VersionParent) {
    if let Err(e) = refresh_versions(state, parent).await {
        warn!("Could not refresh versions of {}: {e}", parent.key());
    }
}

fn list_response(
    state: &AppState,
    parent: &VersionParent,
    versions: Vec<Version>,
) -> VersionListResponse {
    let pending = state
        .version_cache()
        .get(&parent.key())
        .is_some_and(|list| list.has_pending());
    VersionListResponse {
        latest: resolve_latest(&versions),
        versions: sorted_newest_first(&versions),
        pending,
    }
}

/// GET .../versions
pub async fn handle_list_versions(
    State(state): State<AppState>,
    path: VersionPath,
) -> Result<Json<VersionListResponse>, AppError> {
    let versions = refresh_versions(&state, &path.parent)
        .await
        .map_err(AppError::upstream("Failed to load versions"))?;
    Ok(Json(list_response(&state, &path.parent, versions)))
}

/// GET .../versions/latest
pub async fn handle_latest_version(
    State(state): State<AppState>,
    path: VersionPath,
) -> Result<Json<LatestResponse>, AppError> {
    let versions = refresh_versions(&state, &path.parent)
        .await
        .map_err(AppError::upstream("Failed to load versions"))?;
    Ok(Json(LatestResponse {
        latest: resolve_latest(&versions),
    }))
}

/// POST .../versions
pub async fn handle_create_version(
    State(state): State<AppState>,
    path: VersionPath,
    Json(req): Json<NewVersion>,
) -> Result<(StatusCode, Json<Version>), AppError> {
    let parent = &path.parent;
    validate_text(&req.text, "Version text").map_err(AppError::Validation)?;
    if let Some(lang) = &req.language_code {
        validate_language_code(lang).map_err(AppError::Validation)?;
    }

    let existing = refresh_versions(&state, parent)
        .await
        .map_err(AppError::upstream("Failed to load versions"))?;
    validate_new_tag(&req.version_tag, &existing).map_err(AppError::Validation)?;

    let tentative = Version {
        version_tag: Some(req.version_tag.clone()),
        text: Some(req.text.clone()),
        change_message: req.change_message.clone(),
        language_code: req.language_code.clone(),
        created_at: None,
        is_active: None,
        marketplace_status: Default::default(),
    };
    let pending = state
        .version_cache()
        .entry(parent.key())
        .or_default()
        .stage(tentative);

    match state.upstream.create_version(parent, &req).await {
        Ok(created) => {
            info!(
                "Created {} version {} under {}",
                parent.kind(),
                req.version_tag,
                parent.key()
            );
            state
                .version_cache()
                .entry(parent.key())
                .or_default()
                .commit(pending, created.clone());
            Ok((StatusCode::CREATED, Json(created)))
        }
        Err(e) => {
            discard(&state, parent, pending);
            resync_after_failure(&state, parent).await;
            Err(AppError::upstream("Failed to create version")(e))
        }
    }
}

fn discard(state: &AppState, parent: &VersionParent, pending: uuid::Uuid) {
    if let Some(list) = state.version_cache().get_mut(&parent.key()) {
        list.discard(pending);
    }
}

/// Stages `change` on the cached copy of a version, if one is cached.
fn stage_change(
    state: &AppState,
    parent: &VersionParent,
    tag: &str,
    change: impl FnOnce(&mut Version),
) -> Option<uuid::Uuid> {
    let mut cache = state.version_cache();
    let list: &mut OptimisticList<Version> = cache.get_mut(&parent.key())?;
    let mut record = list.get(tag)?.clone();
    change(&mut record);
    Some(list.stage(record))
}

fn commit(state: &AppState, parent: &VersionParent, pending: Option<uuid::Uuid>, record: Version) {
    let mut cache = state.version_cache();
    let list = cache.entry(parent.key()).or_default();
    match pending {
        Some(id) if list.commit(id, record.clone()) => {}
        _ => list.upsert(record),
    }
}

/// PATCH .../versions/:tag
pub async fn handle_update_version(
    State(state): State<AppState>,
    path: VersionPath,
    Json(patch): Json<VersionPatch>,
) -> Result<Json<Version>, AppError> {
    let tag = path.tag()?;
    let parent = &path.parent;
    if patch.is_empty() {
        return Err(AppError::Validation(
            "Nothing to update: supply text or a change message".to_string(),
        ));
    }
    if let Some(text) = &patch.text {
        validate_text(text, "Version text").map_err(AppError::Validation)?;
    }

    let pending = stage_change(&state, parent, tag, |v| {
        if let Some(text) = &patch.text {
            v.text = Some(text.clone());
        }
        if let Some(msg) = &patch.change_message {
            v.change_message = Some(msg.clone());
        }
    });

    match state.upstream.update_version(parent, tag, &patch).await {
        Ok(updated) => {
            info!("Updated {} version {tag} under {}", parent.kind(), parent.key());
            commit(&state, parent, pending, updated.clone());
            Ok(Json(updated))
        }
        Err(e) => {
            if let Some(id) = pending {
                discard(&state, parent, id);
            }
            resync_after_failure(&state, parent).await;
            Err(AppError::upstream("Failed to update version")(e))
        }
    }
}

/// DELETE .../versions/:tag
pub async fn handle_delete_version(
    State(state): State<AppState>,
    path: VersionPath,
) -> Result<StatusCode, AppError> {
    let tag = path.tag()?;
    let parent = &path.parent;
    state
        .cooldown
        .check(&format!("delete:{}", path.version_key()?))
        .map_err(AppError::Cooldown)?;

    match state.upstream.delete_version(parent, tag).await {
        Ok(()) => {
            info!("Deleted {} version {tag} under {}", parent.kind(), parent.key());
            if let Some(list) = state.version_cache().get_mut(&parent.key()) {
                list.remove(tag);
            }
            state.with_compare_selection(parent, |s| s.remove(tag));
            Ok(StatusCode::NO_CONTENT)
        }
        Err(e) => {
            resync_after_failure(&state, parent).await;
            Err(AppError::upstream("Failed to delete version")(e))
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    pub base: String,
    pub target: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareResponse {
    pub base: Version,
    pub target: Version,
    pub diff: DiffResult,
}

async fn diff_pair(
    state: &AppState,
    parent: &VersionParent,
    base: &str,
    target: &str,
) -> Result<CompareResponse, AppError> {
    let (base, target) = tokio::try_join!(
        state.upstream.get_version(parent, base),
        state.upstream.get_version(parent, target)
    )
    .map_err(AppError::upstream("Failed to load versions for comparison"))?;
    let diff = compare_versions(&base, &target)?;
    if diff.is_identical() {
        info!(
            "Versions {:?} and {:?} of {} have identical text",
            base.tag(),
            target.tag(),
            parent.key()
        );
    }
    Ok(CompareResponse { base, target, diff })
}

/// POST .../versions/compare
pub async fn handle_compare_versions(
    State(state): State<AppState>,
    path: VersionPath,
    Json(req): Json<CompareRequest>,
) -> Result<Json<CompareResponse>, AppError> {
    Ok(Json(
        diff_pair(&state, &path.parent, &req.base, &req.target).await?,
    ))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toggle: Option<Toggle>,
    pub selected: Vec<String>,
}

/// POST .../versions/:tag/select
pub async fn handle_toggle_selection(
    State(state): State<AppState>,
    path: VersionPath,
) -> Result<Json<SelectionResponse>, AppError> {
    let tag = path.tag()?;
    let (toggle, selected) = state.with_compare_selection(&path.parent, |s| {
        s.toggle(tag).map(|t| (t, s.tags().to_vec()))
    })?;
    Ok(Json(SelectionResponse {
        toggle: Some(toggle),
        selected,
    }))
}

/// GET .../versions/selection
pub async fn handle_get_selection(
    State(state): State<AppState>,
    path: VersionPath,
) -> Json<SelectionResponse> {
    Json(SelectionResponse {
        toggle: None,
        selected: state.compare_selection(&path.parent).tags().to_vec(),
    })
}

/// DELETE .../versions/selection
pub async fn handle_clear_selection(
    State(state): State<AppState>,
    path: VersionPath,
) -> StatusCode {
    state.with_compare_selection(&path.parent, |s| s.clear());
    StatusCode::NO_CONTENT
}

/// GET .../versions/selection/diff
pub async fn handle_diff_selection(
    State(state): State<AppState>,
    path: VersionPath,
) -> Result<Json<CompareResponse>, AppError> {
    let selection = state.compare_selection(&path.parent);
    let (base, target) = selection.pair()?;
    Ok(Json(diff_pair(&state, &path.parent, base, target).await?))
}

/// GET .../versions/:tag/translations
pub async fn handle_list_translations(
    State(state): State<AppState>,
    path: VersionPath,
) -> Result<Json<Vec<Translation>>, AppError> {
    let translations = state
        .upstream
        .list_translations(&path.parent, path.tag()?)
        .await
        .map_err(AppError::upstream("Failed to load translations"))?;
    Ok(Json(translations))
}

#[derive(Deserialize)]
pub struct TranslationBody {
    #[serde(alias = "promptText", alias = "value")]
    pub text: String,
}

/// PUT .../versions/:tag/translations/:lang
pub async fn handle_put_translation(
    State(state): State<AppState>,
    path: VersionPath,
    Json(body): Json<TranslationBody>,
) -> Result<Json<Translation>, AppError> {
    let (tag, lang) = (path.tag()?, path.lang()?);
    validate_language_code(lang).map_err(AppError::Validation)?;
    validate_text(&body.text, "Translation text").map_err(AppError::Validation)?;

    let translation = state
        .upstream
        .put_translation(&path.parent, tag, lang, &body.text)
        .await
        .map_err(AppError::upstream("Failed to save translation"))?;
    info!("Saved {lang} translation of {} version {tag}", path.parent.key());
    Ok(Json(translation))
}

/// DELETE .../versions/:tag/translations/:lang
pub async fn handle_delete_translation(
    State(state): State<AppState>,
    path: VersionPath,
) -> Result<StatusCode, AppError> {
    let (tag, lang) = (path.tag()?, path.lang()?);
    state
        .cooldown
        .check(&format!("delete:{}/translations/{lang}", path.version_key()?))
        .map_err(AppError::Cooldown)?;

    state
        .upstream
        .delete_translation(&path.parent, tag, lang)
        .await
        .map_err(AppError::upstream("Failed to delete translation"))?;
    info!("Deleted {lang} translation of {} version {tag}", path.parent.key());
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceResponse {
    pub version: Version,
    pub available_actions: Vec<MarketplaceAction>,
}

async fn marketplace_transition(
    state: &AppState,
    path: &VersionPath,
    action: MarketplaceAction,
    failure: &'static str,
) -> Result<Json<MarketplaceResponse>, AppError> {
    let tag = path.tag()?;
    let parent = &path.parent;
    let _ticket = state
        .transitions
        .try_begin(path.version_key()?)
        .ok_or_else(|| AppError::InProgress(format!("A marketplace change for version {tag}")))?;

    let current = state
        .upstream
        .get_version(parent, tag)
        .await
        .map_err(AppError::upstream(failure))?;
    let next = current.marketplace_status.apply(action)?;

    let pending = {
        let mut tentative = current.clone();
        tentative.marketplace_status = next;
        state
            .version_cache()
            .entry(parent.key())
            .or_default()
            .stage(tentative)
    };

    match state.upstream.marketplace_transition(parent, tag, action).await {
        Ok(version) => {
            info!(
                "Marketplace {} on {} version {tag}: now {}",
                action,
                parent.key(),
                version.marketplace_status
            );
            state
                .version_cache()
                .entry(parent.key())
                .or_default()
                .commit(pending, version.clone());
            Ok(Json(MarketplaceResponse {
                available_actions: version.marketplace_status.available_actions(),
                version,
            }))
        }
        Err(e) => {
            discard(state, parent, pending);
            resync_after_failure(state, parent).await;
            Err(AppError::upstream(failure)(e))
        }
    }
}

/// POST .../versions/:tag/marketplace/publish
pub async fn handle_request_publish(
    State(state): State<AppState>,
    path: VersionPath,
) -> Result<Json<MarketplaceResponse>, AppError> {
    marketplace_transition(
        &state,
        &path,
        MarketplaceAction::RequestPublish,
        "Failed to publish version",
    )
    .await
}

/// POST .../versions/:tag/marketplace/unpublish
pub async fn handle_unpublish(
    State(state): State<AppState>,
    path: VersionPath,
) -> Result<Json<MarketplaceResponse>, AppError> {
    marketplace_transition(
        &state,
        &path,
        MarketplaceAction::Unpublish,
        "Failed to unpublish version",
    )
    .await
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodeRequest {
    pub reference: Reference,
    /// Project of a referenced prompt. When given, the version selector falls
    /// back to `latest` if that prompt has no versions yet.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Text being edited; when present the token is spliced into it.
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub selection_start: Option<usize>,
    #[serde(default)]
    pub selection_end: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodeResponse {
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub splice: Option<Splice>,
}

/// POST /api/v1/references/encode
pub async fn handle_encode_reference(
    State(state): State<AppState>,
    Json(req): Json<EncodeRequest>,
) -> Result<Json<EncodeResponse>, AppError> {
    let mut reference = req.reference;
    validate_reference(&reference).map_err(AppError::Validation)?;
    if let Reference::Prompt {
        language_code: Some(lang),
        ..
    } = &reference
    {
        validate_language_code(lang).map_err(AppError::Validation)?;
    }

    if let (
        Reference::Prompt {
            prompt_id, version, ..
        },
        Some(project_id),
    ) = (&mut reference, req.project_id)
    {
        let versions = state
            .upstream
            .list_versions(&VersionParent::Prompt {
                project_id,
                prompt_id: prompt_id.clone(),
            })
            .await
            .map_err(AppError::upstream("Failed to load prompt versions"))?;
        let chosen = match version {
            VersionSelector::Latest => None,
            VersionSelector::Tag(tag) => Some(tag.clone()),
        };
        *version = VersionSelector::choose(chosen.as_deref(), &versions);
    }

    let token = reference.to_string();
    let splice = req.text.map(|text| {
        let end_of_text = text.chars().count();
        let start = req.selection_start.unwrap_or(end_of_text);
        let end = req.selection_end.unwrap_or(start);
        insert_at_selection(&text, start, end, &token)
    });
    Ok(Json(EncodeResponse { token, splice }))
}

#[derive(Deserialize)]
pub struct ParseRequest {
    pub text: String,
}

/// POST /api/v1/references/parse
pub async fn handle_parse_references(Json(req): Json<ParseRequest>) -> Json<Vec<FoundReference>> {
    Json(parse_references(&req.text))
}
