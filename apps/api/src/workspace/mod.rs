//! The dashboard's selected project and prompt.
//!
//! The selection is an explicit value passed to whoever needs it. It is
//! loaded and saved at the edges through a `SelectionStore`, and re-checked
//! against the live project list every time it is loaded.

pub mod handlers;
pub mod store;

use serde::{Deserialize, Serialize};

use crate::models::project::Project;

pub use store::{FileSelectionStore, SelectionStore, StoreError};

#[cfg(test)]
pub use store::MemorySelectionStore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceContext {
    #[serde(default)]
    pub selected_project_id: Option<String>,
    #[serde(default)]
    pub selected_prompt_id: Option<String>,
}

/// Keeps the stored project if it still exists, otherwise falls back to the
/// first project, otherwise clears the selection.
pub fn reconcile(stored: Option<&str>, projects: &[Project]) -> Option<String> {
    match stored {
        Some(id) if projects.iter().any(|p| p.id == id) => Some(id.to_string()),
        _ => projects.first().map(|p| p.id.clone()),
    }
}

impl WorkspaceContext {
    /// Re-validates the selection against the current projects. A prompt
    /// selection only survives if its project did.
    pub fn reconciled(&self, projects: &[Project]) -> WorkspaceContext {
        let project = reconcile(self.selected_project_id.as_deref(), projects);
        let prompt = if project == self.selected_project_id {
            self.selected_prompt_id.clone()
        } else {
            None
        };
        WorkspaceContext {
            selected_project_id: project,
            selected_prompt_id: prompt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projects(ids: &[&str]) -> Vec<Project> {
        ids.iter()
            .map(|id| Project {
                id: id.to_string(),
                name: format!("Project {id}"),
                description: None,
            })
            .collect()
    }

    #[test]
    fn test_stored_project_kept() {
        assert_eq!(reconcile(Some("b"), &projects(&["a", "b"])), Some("b".into()));
    }

    #[test]
    fn test_missing_project_falls_back_to_first() {
        assert_eq!(reconcile(Some("gone"), &projects(&["a", "b"])), Some("a".into()));
        assert_eq!(reconcile(None, &projects(&["a"])), Some("a".into()));
    }

    #[test]
    fn test_no_projects_clears_selection() {
        assert_eq!(reconcile(Some("a"), &[]), None);
    }

    #[test]
    fn test_prompt_dropped_when_project_changes() {
        let ctx = WorkspaceContext {
            selected_project_id: Some("gone".into()),
            selected_prompt_id: Some("welcome".into()),
        };
        let next = ctx.reconciled(&projects(&["a"]));
        assert_eq!(next.selected_project_id.as_deref(), Some("a"));
        assert_eq!(next.selected_prompt_id, None);

        let ctx = WorkspaceContext {
            selected_project_id: Some("a".into()),
            selected_prompt_id: Some("welcome".into()),
        };
        assert_eq!(ctx.reconciled(&projects(&["a"])), ctx);
    }
}
