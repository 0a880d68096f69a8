use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    error::{ServiceError, ServiceResult},
    ids::WorkspaceId,
    latency::LatencyProfile,
    rbac::{self, Role},
    storage::{keys, read_json, write_json, StorageRef},
};

/// A tenant as seen by the acting user: `role` is that user's role within
/// this workspace, materialized from the membership. Always non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceRecord {
    pub id: WorkspaceId,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub role: Role,
}

/// Patch for `update`. `logo` distinguishes "leave alone" (`None`) from
/// "set/clear" (`Some(..)`).
#[derive(Debug, Default, Clone)]
pub struct WorkspaceUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub logo: Option<Option<String>>,
}

/// The set of tenants the signed-in user belongs to, persisted as one
/// ordered list. Seeds a fixed default set on first access.
#[derive(Clone)]
pub struct WorkspaceStore {
    storage: StorageRef,
    latency: LatencyProfile,
}

fn default_workspaces() -> Vec<WorkspaceRecord> {
    vec![
        WorkspaceRecord {
            id: WorkspaceId::from("ws-1"),
            name: "Acme Corp".to_owned(),
            slug: "acme-corp".to_owned(),
            logo: None,
            role: Role::Owner,
        },
        WorkspaceRecord {
            id: WorkspaceId::from("ws-2"),
            name: "Design Studio".to_owned(),
            slug: "design-studio".to_owned(),
            logo: None,
            role: Role::Admin,
        },
    ]
}

impl WorkspaceStore {
    pub fn new(storage: StorageRef, latency: LatencyProfile) -> Self {
        Self { storage, latency }
    }

    pub async fn list(&self) -> ServiceResult<Vec<WorkspaceRecord>> {
        self.latency.read_delay().await;
        self.load().await
    }

    pub async fn find(&self, id: &str) -> ServiceResult<Option<WorkspaceRecord>> {
        self.latency.read_delay().await;
        let workspaces = self.load().await?;
        Ok(workspaces.into_iter().find(|ws| ws.id == id))
    }

    /// The creator always becomes Owner of a new workspace.
    pub async fn create(&self, name: &str) -> ServiceResult<WorkspaceRecord> {
        self.latency.write_delay().await;

        let mut workspaces = self.load().await?;
        let workspace = WorkspaceRecord {
            id: WorkspaceId::from(format!("ws-{}", Uuid::new_v4().simple())),
            name: name.to_owned(),
            slug: slugify(name),
            logo: None,
            role: Role::Owner,
        };

        workspaces.push(workspace.clone());
        self.persist(&workspaces).await?;

        info!(workspace = %workspace.id, "workspace created");
        Ok(workspace)
    }

    pub async fn update(&self, id: &str, patch: WorkspaceUpdate) -> ServiceResult<WorkspaceRecord> {
        self.latency.write_delay().await;

        let mut workspaces = self.load().await?;
        let Some(record) = workspaces.iter_mut().find(|ws| ws.id == id) else {
            return Err(ServiceError::not_found("workspace", id));
        };

        if !rbac::is_allowed(Some(record.role), rbac::MANAGE_WORKSPACE) {
            return Err(ServiceError::forbidden("update this workspace"));
        }

        if let Some(name) = patch.name {
            record.name = name;
        }
        if let Some(slug) = patch.slug {
            record.slug = slug;
        }
        if let Some(logo) = patch.logo {
            record.logo = logo;
        }

        let updated = record.clone();
        self.persist(&workspaces).await?;
        Ok(updated)
    }

    /// Deleting an absent workspace is a silent no-op.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.latency.write_delay().await;

        let mut workspaces = self.load().await?;
        let Some(record) = workspaces.iter().find(|ws| ws.id == id) else {
            debug!(workspace = id, "delete skipped, workspace not present");
            return Ok(());
        };

        if !rbac::is_allowed(Some(record.role), rbac::DELETE_WORKSPACE) {
            return Err(ServiceError::forbidden("delete this workspace"));
        }

        workspaces.retain(|ws| ws.id != id);
        self.persist(&workspaces).await?;

        info!(workspace = id, "workspace deleted");
        Ok(())
    }

    /// The acting user's role in `id`, if the workspace is in the set.
    pub(crate) async fn role_of(&self, id: &str) -> ServiceResult<Option<Role>> {
        let workspaces = self.load().await?;
        Ok(workspaces.into_iter().find(|ws| ws.id == id).map(|ws| ws.role))
    }

    pub(crate) async fn load(&self) -> ServiceResult<Vec<WorkspaceRecord>> {
        if let Some(workspaces) = read_json(&self.storage, keys::WORKSPACES).await? {
            return Ok(workspaces);
        }

        let seeded = default_workspaces();
        self.persist(&seeded).await?;
        Ok(seeded)
    }

    async fn persist(&self, workspaces: &[WorkspaceRecord]) -> ServiceResult<()> {
        write_json(&self.storage, keys::WORKSPACES, &workspaces)
            .await
            .map_err(ServiceError::from)
    }
}

/// Lower-case the name and collapse every whitespace run into a single
/// hyphen. Runs at the ends of the string become hyphens too.
fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut in_gap = false;

    for ch in lowered.chars() {
        if ch.is_whitespace() {
            if !in_gap {
                slug.push('-');
                in_gap = true;
            }
        } else {
            slug.push(ch);
            in_gap = false;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn store() -> WorkspaceStore {
        WorkspaceStore::new(Arc::new(MemoryStorage::new()), LatencyProfile::zero())
    }

    #[tokio::test]
    async fn first_access_seeds_the_default_set() -> anyhow::Result<()> {
        let workspaces = store();

        let listed = workspaces.list().await?;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, "ws-1");
        assert_eq!(listed[0].slug, "acme-corp");
        assert_eq!(listed[0].role, Role::Owner);
        assert_eq!(listed[1].id, "ws-2");
        assert_eq!(listed[1].role, Role::Admin);
        Ok(())
    }

    #[tokio::test]
    async fn create_assigns_owner_and_appends() -> anyhow::Result<()> {
        let workspaces = store();

        let created = workspaces.create("Launch Team").await?;
        assert_eq!(created.role, Role::Owner);
        assert_eq!(created.slug, "launch-team");

        let listed = workspaces.list().await?;
        assert_eq!(listed.len(), 3);
        assert_eq!(listed.last(), Some(&created));

        let found = workspaces.find(created.id.as_str()).await?;
        assert_eq!(found.as_ref(), Some(&created));
        Ok(())
    }

    #[tokio::test]
    async fn update_merges_the_patch() -> anyhow::Result<()> {
        let workspaces = store();
        workspaces.list().await?;

        let updated = workspaces
            .update(
                "ws-1",
                WorkspaceUpdate {
                    name: Some("Acme Corporation".to_owned()),
                    logo: Some(Some("AC".to_owned())),
                    ..WorkspaceUpdate::default()
                },
            )
            .await?;

        assert_eq!(updated.name, "Acme Corporation");
        assert_eq!(updated.slug, "acme-corp");
        assert_eq!(updated.logo.as_deref(), Some("AC"));

        let listed = workspaces.list().await?;
        assert_eq!(listed[0], updated);
        Ok(())
    }

    #[tokio::test]
    async fn update_of_missing_workspace_fails() {
        let workspaces = store();

        let err = workspaces
            .update("ws-404", WorkspaceUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::NotFound {
                entity: "workspace",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn delete_requires_owner_role() -> anyhow::Result<()> {
        let workspaces = store();

        // ws-2 carries Admin, which the delete surface does not list
        let err = workspaces.delete("ws-2").await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden { .. }));
        assert_eq!(workspaces.list().await?.len(), 2);

        workspaces.delete("ws-1").await?;
        let listed = workspaces.list().await?;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "ws-2");
        Ok(())
    }

    #[tokio::test]
    async fn delete_of_absent_workspace_is_a_silent_no_op() -> anyhow::Result<()> {
        let workspaces = store();
        workspaces.list().await?;

        workspaces.delete("ws-404").await?;
        assert_eq!(workspaces.list().await?.len(), 2);
        Ok(())
    }

    #[test]
    fn slugs_collapse_whitespace_runs() {
        assert_eq!(slugify("Acme Corp"), "acme-corp");
        assert_eq!(slugify("Deep   Space  Nine"), "deep-space-nine");
        assert_eq!(slugify(" Padded "), "-padded-");
        assert_eq!(slugify("Tabs\tand\nnewlines"), "tabs-and-newlines");
    }
}
