use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::{
    error::ServiceResult,
    rbac::Role,
    storage::{keys, StorageBackend, StorageRef},
    workspace::{WorkspaceRecord, WorkspaceStore},
};

#[derive(Debug, Clone, PartialEq)]
enum SelectorState {
    Unresolved,
    Resolved(WorkspaceRecord),
}

/// Tracks which single workspace is current for the session.
///
/// The pointer is persisted per storage profile, not per identity: after an
/// identity switch it can name a workspace the new identity does not belong
/// to. `resolve` therefore always validates the pointer against the current
/// workspace set and falls back to the first element.
#[derive(Clone)]
pub struct ActiveWorkspaceSelector {
    storage: StorageRef,
    registry: WorkspaceStore,
    state: Arc<RwLock<SelectorState>>,
}

impl ActiveWorkspaceSelector {
    pub fn new(storage: StorageRef, registry: WorkspaceStore) -> Self {
        Self {
            storage,
            registry,
            state: Arc::new(RwLock::new(SelectorState::Unresolved)),
        }
    }

    /// Run on every authentication-state change. Resolution order: the
    /// persisted pointer if it names a listed workspace, else the first
    /// listed workspace, else unresolved.
    pub async fn resolve(&self) -> ServiceResult<Option<WorkspaceRecord>> {
        let workspaces = self.registry.list().await?;
        let persisted = self.storage.get(keys::ACTIVE_WORKSPACE).await?;

        let chosen = persisted
            .and_then(|id| workspaces.iter().find(|ws| ws.id == id.as_str()).cloned())
            .or_else(|| workspaces.first().cloned());

        match chosen {
            Some(workspace) => {
                self.storage
                    .set(keys::ACTIVE_WORKSPACE, workspace.id.as_str())
                    .await?;
                info!(workspace = %workspace.id, "active workspace resolved");
                *self.state.write() = SelectorState::Resolved(workspace.clone());
                Ok(Some(workspace))
            }
            None => {
                debug!("no workspaces available, selector left unresolved");
                *self.state.write() = SelectorState::Unresolved;
                Ok(None)
            }
        }
    }

    /// Switching to an id outside the current set is a silent no-op.
    pub async fn switch(&self, id: &str) -> ServiceResult<()> {
        let workspaces = self.registry.load().await?;
        let Some(workspace) = workspaces.into_iter().find(|ws| ws.id == id) else {
            debug!(workspace = id, "switch skipped, workspace not in set");
            return Ok(());
        };

        self.storage
            .set(keys::ACTIVE_WORKSPACE, workspace.id.as_str())
            .await?;
        info!(workspace = %workspace.id, "active workspace switched");
        *self.state.write() = SelectorState::Resolved(workspace);
        Ok(())
    }

    /// Drop the in-memory resolution on logout. The persisted pointer stays;
    /// the next `resolve` validates it against the next identity's set.
    pub fn reset(&self) {
        *self.state.write() = SelectorState::Unresolved;
    }

    pub fn current(&self) -> Option<WorkspaceRecord> {
        match &*self.state.read() {
            SelectorState::Resolved(workspace) => Some(workspace.clone()),
            SelectorState::Unresolved => None,
        }
    }

    pub fn current_role(&self) -> Option<Role> {
        match &*self.state.read() {
            SelectorState::Resolved(workspace) => Some(workspace.role),
            SelectorState::Unresolved => None,
        }
    }
}
