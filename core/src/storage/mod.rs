use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

pub mod file;
pub mod memory;

pub use file::JsonFileStorage;
pub use memory::MemoryStorage;

/// Flat string-keyed storage with the browser local-storage contract: string
/// values, last write wins, no transactions.
///
/// The trait surface is async to match the service layer, but backends
/// mutate synchronously under the hood, which is what gives operations
/// against the same key their issue-order guarantee for a single caller.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

pub type StorageRef = Arc<dyn StorageBackend>;

/// Persisted key layout. One record for the token, one for the signed-in
/// user, one workspace set, one active-workspace pointer, one member roster
/// per workspace, one merged user profile.
pub mod keys {
    pub const AUTH_TOKEN: &str = "saas_auth_token";
    pub const USER_DATA: &str = "saas_user_data";
    pub const WORKSPACES: &str = "saas_workspaces";
    pub const ACTIVE_WORKSPACE: &str = "saas_active_workspace";
    pub const USER_PROFILE: &str = "saas_user_profile";

    const TEAM_PREFIX: &str = "saas_team_";

    pub fn team(workspace_id: &str) -> String {
        format!("{TEAM_PREFIX}{workspace_id}")
    }
}

pub(crate) async fn read_json<T: DeserializeOwned>(
    storage: &StorageRef,
    key: &str,
) -> Result<Option<T>> {
    let Some(raw) = storage.get(key).await? else {
        return Ok(None);
    };

    let value = serde_json::from_str(&raw)
        .with_context(|| format!("malformed stored value under {key}"))?;
    Ok(Some(value))
}

pub(crate) async fn write_json<T: Serialize>(
    storage: &StorageRef,
    key: &str,
    value: &T,
) -> Result<()> {
    let raw = serde_json::to_string(value)
        .with_context(|| format!("failed to serialize value for {key}"))?;
    storage.set(key, &raw).await
}
