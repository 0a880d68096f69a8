use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    error::{ServiceError, ServiceResult},
    ids::MemberId,
    latency::LatencyProfile,
    rbac::{self, Role},
    storage::{keys, read_json, write_json, StorageRef},
    workspace::WorkspaceStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberStatus {
    Active,
    Pending,
}

/// One person's membership in one workspace. The same person invited to two
/// workspaces yields two independent records; no cross-workspace identity
/// linkage exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRecord {
    pub id: MemberId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: MemberStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub joined_at: NaiveDate,
}

/// Per-workspace member rosters, one storage record per workspace id.
///
/// Mutations resolve the acting user's role for the target workspace from
/// the registry and enforce the allowed-role set at the operation entry
/// point; rendering-layer checks are advisory only.
#[derive(Clone)]
pub struct MembershipStore {
    storage: StorageRef,
    latency: LatencyProfile,
    registry: WorkspaceStore,
}

fn seed_date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("seed dates must be valid")
}

fn default_members(workspace_id: &str) -> Vec<MemberRecord> {
    let member = |id: &str, name: &str, email: &str, role, status, joined_at| MemberRecord {
        id: MemberId::from(id),
        name: name.to_owned(),
        email: email.to_owned(),
        role,
        status,
        avatar: None,
        joined_at,
    };

    match workspace_id {
        "ws-1" => vec![
            member(
                "1",
                "Jane Smith",
                "jane.smith@example.com",
                Role::Owner,
                MemberStatus::Active,
                seed_date(2025, 1, 1),
            ),
            member(
                "2",
                "Jackson Lee",
                "jackson.lee@email.com",
                Role::Admin,
                MemberStatus::Active,
                seed_date(2025, 2, 15),
            ),
            member(
                "3",
                "Olivia Martin",
                "olivia.martin@email.com",
                Role::Member,
                MemberStatus::Active,
                seed_date(2025, 3, 10),
            ),
            member(
                "4",
                "Isabella Nguyen",
                "isabella.nguyen@email.com",
                Role::Member,
                MemberStatus::Pending,
                seed_date(2026, 1, 10),
            ),
        ],
        "ws-2" => vec![
            member(
                "1",
                "Jane Smith",
                "jane.smith@example.com",
                Role::Admin,
                MemberStatus::Active,
                seed_date(2025, 5, 1),
            ),
            member(
                "5",
                "William Kim",
                "will@email.com",
                Role::Owner,
                MemberStatus::Active,
                seed_date(2025, 6, 20),
            ),
        ],
        _ => Vec::new(),
    }
}

impl MembershipStore {
    pub fn new(storage: StorageRef, latency: LatencyProfile, registry: WorkspaceStore) -> Self {
        Self {
            storage,
            latency,
            registry,
        }
    }

    pub async fn list(&self, workspace_id: &str) -> ServiceResult<Vec<MemberRecord>> {
        self.latency.read_delay().await;
        self.load(workspace_id).await
    }

    /// New members start Pending with a name derived from the email's local
    /// part. Duplicate emails are accepted; the roster is not keyed by email.
    pub async fn invite(
        &self,
        workspace_id: &str,
        email: &str,
        role: Role,
    ) -> ServiceResult<MemberRecord> {
        if email.trim().is_empty() {
            return Err(ServiceError::missing_input("email"));
        }
        self.authorize(workspace_id, rbac::MANAGE_MEMBERS, "invite members")
            .await?;
        self.latency.write_delay().await;

        let mut members = self.load(workspace_id).await?;
        let member = MemberRecord {
            id: MemberId::from(format!("m-{}", Uuid::new_v4().simple())),
            name: email.split('@').next().unwrap_or(email).to_owned(),
            email: email.to_owned(),
            role,
            status: MemberStatus::Pending,
            avatar: None,
            joined_at: Utc::now().date_naive(),
        };

        members.push(member.clone());
        self.persist(workspace_id, &members).await?;

        info!(workspace = workspace_id, member = %member.id, "member invited");
        Ok(member)
    }

    pub async fn update_role(
        &self,
        workspace_id: &str,
        member_id: &str,
        role: Role,
    ) -> ServiceResult<()> {
        self.authorize(workspace_id, rbac::MANAGE_MEMBERS, "change member roles")
            .await?;
        self.latency.write_delay().await;

        let mut members = self.load(workspace_id).await?;
        let Some(member) = members.iter_mut().find(|member| member.id == member_id) else {
            return Err(ServiceError::not_found("member", member_id));
        };

        member.role = role;
        self.persist(workspace_id, &members).await?;

        info!(workspace = workspace_id, member = member_id, %role, "member role updated");
        Ok(())
    }

    /// Removing an absent member is a silent no-op.
    pub async fn remove(&self, workspace_id: &str, member_id: &str) -> ServiceResult<()> {
        self.authorize(workspace_id, rbac::MANAGE_MEMBERS, "remove members")
            .await?;
        self.latency.write_delay().await;

        let mut members = self.load(workspace_id).await?;
        let before = members.len();
        members.retain(|member| member.id != member_id);

        if members.len() == before {
            debug!(
                workspace = workspace_id,
                member = member_id,
                "remove skipped, member not present"
            );
            return Ok(());
        }

        self.persist(workspace_id, &members).await?;
        info!(workspace = workspace_id, member = member_id, "member removed");
        Ok(())
    }

    /// Pending invitations are plain roster rows; revoking one is a removal.
    pub async fn revoke_invite(&self, workspace_id: &str, member_id: &str) -> ServiceResult<()> {
        self.remove(workspace_id, member_id).await
    }

    async fn authorize(
        &self,
        workspace_id: &str,
        allowed: &[Role],
        action: &'static str,
    ) -> ServiceResult<()> {
        let role = self.registry.role_of(workspace_id).await?;
        if rbac::is_allowed(role, allowed) {
            Ok(())
        } else {
            Err(ServiceError::forbidden(action))
        }
    }

    async fn load(&self, workspace_id: &str) -> ServiceResult<Vec<MemberRecord>> {
        let key = keys::team(workspace_id);
        if let Some(members) = read_json(&self.storage, &key).await? {
            return Ok(members);
        }

        let seeded = default_members(workspace_id);
        self.persist(workspace_id, &seeded).await?;
        Ok(seeded)
    }

    async fn persist(&self, workspace_id: &str, members: &[MemberRecord]) -> ServiceResult<()> {
        write_json(&self.storage, &keys::team(workspace_id), &members)
            .await
            .map_err(ServiceError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, StorageBackend};
    use std::sync::Arc;

    fn setup() -> (StorageRef, MembershipStore) {
        let storage: StorageRef = Arc::new(MemoryStorage::new());
        let registry = WorkspaceStore::new(storage.clone(), LatencyProfile::zero());
        let members = MembershipStore::new(storage.clone(), LatencyProfile::zero(), registry);
        (storage, members)
    }

    #[tokio::test]
    async fn rosters_seed_per_workspace() -> anyhow::Result<()> {
        let (_, members) = setup();

        let acme = members.list("ws-1").await?;
        assert_eq!(acme.len(), 4);
        assert_eq!(acme[0].name, "Jane Smith");
        assert_eq!(acme[0].role, Role::Owner);
        assert_eq!(acme[3].status, MemberStatus::Pending);

        let studio = members.list("ws-2").await?;
        assert_eq!(studio.len(), 2);
        assert_eq!(studio[1].name, "William Kim");
        Ok(())
    }

    #[tokio::test]
    async fn invite_derives_name_and_starts_pending() -> anyhow::Result<()> {
        let (_, members) = setup();

        let invited = members
            .invite("ws-1", "new.user@x.com", Role::Member)
            .await?;
        assert_eq!(invited.name, "new.user");
        assert_eq!(invited.status, MemberStatus::Pending);
        assert_eq!(invited.joined_at, Utc::now().date_naive());

        let roster = members.list("ws-1").await?;
        assert_eq!(roster.len(), 5);
        assert_eq!(roster.last(), Some(&invited));
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_emails_are_accepted() -> anyhow::Result<()> {
        let (_, members) = setup();

        members.invite("ws-1", "twin@x.com", Role::Member).await?;
        members.invite("ws-1", "twin@x.com", Role::Admin).await?;

        let twins: Vec<_> = members
            .list("ws-1")
            .await?
            .into_iter()
            .filter(|member| member.email == "twin@x.com")
            .collect();
        assert_eq!(twins.len(), 2);
        assert_ne!(twins[0].id, twins[1].id);
        Ok(())
    }

    #[tokio::test]
    async fn invite_requires_an_email() {
        let (_, members) = setup();

        let err = members.invite("ws-1", " ", Role::Member).await.unwrap_err();
        assert!(matches!(err, ServiceError::MissingInput { field: "email" }));
    }

    #[tokio::test]
    async fn update_role_of_unknown_member_fails_and_changes_nothing() -> anyhow::Result<()> {
        let (_, members) = setup();
        let before = members.list("ws-1").await?;

        let err = members
            .update_role("ws-1", "nonexistent-id", Role::Admin)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::NotFound {
                entity: "member",
                ..
            }
        ));
        assert_eq!(members.list("ws-1").await?, before);
        Ok(())
    }

    #[tokio::test]
    async fn update_role_persists() -> anyhow::Result<()> {
        let (_, members) = setup();
        members.list("ws-1").await?;

        members.update_role("ws-1", "3", Role::Admin).await?;
        let roster = members.list("ws-1").await?;
        let olivia = roster.iter().find(|m| m.id == "3").expect("member kept");
        assert_eq!(olivia.role, Role::Admin);
        Ok(())
    }

    #[tokio::test]
    async fn remove_filters_the_member_and_ignores_absentees() -> anyhow::Result<()> {
        let (_, members) = setup();

        members.remove("ws-1", "2").await?;
        let roster = members.list("ws-1").await?;
        assert_eq!(roster.len(), 3);
        assert!(roster.iter().all(|member| member.id != "2"));

        // absent id: silent no-op
        members.remove("ws-1", "2").await?;
        assert_eq!(members.list("ws-1").await?.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn revoking_an_invite_removes_the_pending_row() -> anyhow::Result<()> {
        let (_, members) = setup();

        members.revoke_invite("ws-1", "4").await?;
        let roster = members.list("ws-1").await?;
        assert!(roster.iter().all(|member| member.id != "4"));
        Ok(())
    }

    #[tokio::test]
    async fn mutations_are_forbidden_without_a_managing_role() -> anyhow::Result<()> {
        let (storage, members) = setup();
        // acting role in ws-3 is Member
        storage
            .set(
                keys::WORKSPACES,
                r#"[{"id":"ws-3","name":"Side Project","slug":"side-project","role":"Member"}]"#,
            )
            .await?;

        let err = members
            .invite("ws-3", "friend@x.com", Role::Member)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden { .. }));

        let err = members.update_role("ws-3", "1", Role::Admin).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden { .. }));

        let err = members.remove("ws-3", "1").await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden { .. }));

        // reads stay open
        assert!(members.list("ws-3").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn stored_roster_layout_is_stable() -> anyhow::Result<()> {
        let (storage, members) = setup();
        members.list("ws-1").await?;

        let raw = storage
            .get(&keys::team("ws-1"))
            .await?
            .expect("roster stored");
        let value: serde_json::Value = serde_json::from_str(&raw)?;

        assert_eq!(value[0]["joinedAt"], "2025-01-01");
        assert_eq!(value[0]["status"], "Active");
        assert_eq!(value[3]["status"], "Pending");
        Ok(())
    }
}
