pub mod health;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::state::AppState;
use crate::versioning::handlers as versions;
use crate::workspace::handlers as workspace;

/// Version routes shared by prompts and assets. Nested under
/// `.../prompts/:prompt_id/versions` and `.../assets/:asset_key/versions`.
fn version_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(versions::handle_list_versions).post(versions::handle_create_version),
        )
        .route("/latest", get(versions::handle_latest_version))
        .route("/compare", post(versions::handle_compare_versions))
        .route(
            "/selection",
            get(versions::handle_get_selection).delete(versions::handle_clear_selection),
        )
        .route("/selection/diff", get(versions::handle_diff_selection))
        .route(
            "/:tag",
            patch(versions::handle_update_version)
                .delete(versions::handle_delete_version),
        )
        .route("/:tag/select", post(versions::handle_toggle_selection))
        .route("/:tag/translations", get(versions::handle_list_translations))
        .route(
            "/:tag/translations/:lang",
            put(versions::handle_put_translation).delete(versions::handle_delete_translation),
        )
        .route(
            "/:tag/marketplace/publish",
            post(versions::handle_request_publish),
        )
        .route(
            "/:tag/marketplace/unpublish",
            post(versions::handle_unpublish),
        )
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/upstream/health",
            get(workspace::handle_upstream_health),
        )
        .route("/api/v1/session", put(workspace::handle_put_session))
        .route(
            "/api/v1/catalog/:resource",
            get(workspace::handle_list_catalog),
        )
        // Workspace navigation
        .route("/api/v1/projects", get(workspace::handle_list_projects))
        .route(
            "/api/v1/workspace",
            get(workspace::handle_get_workspace).put(workspace::handle_put_workspace),
        )
        .route(
            "/api/v1/projects/:project_id/prompts",
            get(workspace::handle_list_prompts).post(workspace::handle_create_prompt),
        )
        .route(
            "/api/v1/projects/:project_id/prompts/:prompt_id/breadcrumbs",
            get(workspace::handle_breadcrumbs),
        )
        .route(
            "/api/v1/projects/:project_id/assets",
            get(workspace::handle_list_assets).post(workspace::handle_create_asset),
        )
        // Version history
        .nest(
            "/api/v1/projects/:project_id/prompts/:prompt_id/versions",
            version_routes(),
        )
        .nest(
            "/api/v1/projects/:project_id/assets/:asset_key/versions",
            version_routes(),
        )
        // Reference tokens
        .route(
            "/api/v1/references/encode",
            post(versions::handle_encode_reference),
        )
        .route(
            "/api/v1/references/parse",
            post(versions::handle_parse_references),
        )
        .with_state(state)
}
