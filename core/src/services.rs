use std::sync::Arc;

use anyhow::Result;

use crate::{
    active_workspace::ActiveWorkspaceSelector,
    config::{AppConfig, StorageBackendKind},
    error::ServiceResult,
    latency::LatencyProfile,
    membership::MembershipStore,
    profile::ProfileStore,
    rbac::{Can, Role},
    session::{SessionStore, UserRecord},
    storage::{JsonFileStorage, MemoryStorage, StorageRef},
    workspace::WorkspaceStore,
};

/// The service graph, constructed once per session and passed by reference.
/// Stores share one storage backend and one latency profile; nothing here is
/// a process-global.
#[derive(Clone)]
pub struct Services {
    pub session: SessionStore,
    pub workspaces: WorkspaceStore,
    pub active: ActiveWorkspaceSelector,
    pub members: MembershipStore,
    pub profile: ProfileStore,
}

impl Services {
    pub fn build(config: &AppConfig) -> Result<Self> {
        let storage: StorageRef = match config.storage_backend {
            StorageBackendKind::Memory => Arc::new(MemoryStorage::new()),
            StorageBackendKind::JsonFile => {
                Arc::new(JsonFileStorage::open(&config.storage_path)?)
            }
        };

        Ok(Self::with_storage(storage, config.latency_profile()))
    }

    pub fn with_storage(storage: StorageRef, latency: LatencyProfile) -> Self {
        let session = SessionStore::new(storage.clone(), latency);
        let workspaces = WorkspaceStore::new(storage.clone(), latency);
        let active = ActiveWorkspaceSelector::new(storage.clone(), workspaces.clone());
        let members = MembershipStore::new(storage.clone(), latency, workspaces.clone());
        let profile = ProfileStore::new(storage, latency);

        Self {
            session,
            workspaces,
            active,
            members,
            profile,
        }
    }

    /// Ephemeral graph with the latency simulation off. Used by tests and
    /// the walkthrough's no-persistence mode.
    pub fn in_memory() -> Self {
        Self::with_storage(Arc::new(MemoryStorage::new()), LatencyProfile::zero())
    }

    /// Login followed by active-workspace resolution, in the order the
    /// session-aware UI performs them.
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<UserRecord> {
        let user = self.session.login(email, password).await?;
        self.active.resolve().await?;
        Ok(user)
    }

    /// Logout drops the resolved workspace along with the session.
    pub async fn logout(&self) -> ServiceResult<()> {
        self.session.logout().await?;
        self.active.reset();
        Ok(())
    }

    /// Rendering guard bound to this session's active workspace.
    pub fn can(&self, allowed: impl Into<Vec<Role>>) -> Can {
        Can::new(self.active.clone(), allowed)
    }
}
