use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use super::WorkspaceContext;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persistence for the workspace selection.
#[async_trait]
pub trait SelectionStore: Send + Sync {
    async fn load(&self) -> Result<WorkspaceContext, StoreError>;
    async fn save(&self, ctx: &WorkspaceContext) -> Result<(), StoreError>;
}

/// Stores the selection as a small JSON file.
pub struct FileSelectionStore {
    path: PathBuf,
}

impl FileSelectionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SelectionStore for FileSelectionStore {
    async fn load(&self) -> Result<WorkspaceContext, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No stored selection at {}", self.path.display());
                Ok(WorkspaceContext::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, ctx: &WorkspaceContext) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let bytes = serde_json::to_vec_pretty(ctx)?;
        tokio::fs::write(&self.path, bytes).await?;
        info!(
            "Saved workspace selection (project: {:?})",
            ctx.selected_project_id
        );
        Ok(())
    }
}

/// Keeps the selection in memory.
#[cfg(test)]
#[derive(Default)]
pub struct MemorySelectionStore {
    ctx: std::sync::Mutex<WorkspaceContext>,
}

#[cfg(test)]
#[async_trait]
impl SelectionStore for MemorySelectionStore {
    async fn load(&self) -> Result<WorkspaceContext, StoreError> {
        Ok(self.ctx.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn save(&self, ctx: &WorkspaceContext) -> Result<(), StoreError> {
        *self.ctx.lock().unwrap_or_else(|e| e.into_inner()) = ctx.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_loads_empty_selection() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSelectionStore::new(dir.path().join("selection.json"));
        assert_eq!(store.load().await.unwrap(), WorkspaceContext::default());
    }

    #[tokio::test]
    async fn test_file_round_trip_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSelectionStore::new(dir.path().join("nested/selection.json"));
        let ctx = WorkspaceContext {
            selected_project_id: Some("p1".into()),
            selected_prompt_id: None,
        };
        store.save(&ctx).await.unwrap();
        assert_eq!(store.load().await.unwrap(), ctx);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selection.json");
        std::fs::write(&path, "not json").unwrap();
        let store = FileSelectionStore::new(path);
        assert!(matches!(store.load().await, Err(StoreError::Json(_))));
    }
}
