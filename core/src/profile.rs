use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    error::{ServiceError, ServiceResult},
    ids::UserId,
    latency::LatencyProfile,
    rbac::Role,
    session::{ThemeMode, UserRecord},
    storage::{keys, read_json, write_json, StorageRef},
};

/// The settings-page view of an account: identity fields merged with
/// preference fields into one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub role: Role,
    pub professional_title: String,
    pub language: String,
    pub timezone: String,
    pub theme: ThemeMode,
}

#[derive(Debug, Default, Clone)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub role: Option<Role>,
    pub professional_title: Option<String>,
    pub language: Option<String>,
    pub timezone: Option<String>,
    pub theme: Option<ThemeMode>,
}

fn default_profile() -> UserProfile {
    UserProfile {
        id: UserId::from("1"),
        name: "Jane Smith".to_owned(),
        email: "jane.smith@example.com".to_owned(),
        avatar: "JS".to_owned(),
        role: Role::Owner,
        professional_title: "Senior Product Designer".to_owned(),
        language: "English (United States)".to_owned(),
        timezone: "(GMT-08:00) Pacific Time".to_owned(),
        theme: ThemeMode::System,
    }
}

/// Reads the merged profile. Identity fields follow the signed-in user when
/// a session exists; preference fields come from the saved profile record;
/// fixed defaults fill whatever is left.
#[derive(Clone)]
pub struct ProfileStore {
    storage: StorageRef,
    latency: LatencyProfile,
}

impl ProfileStore {
    pub fn new(storage: StorageRef, latency: LatencyProfile) -> Self {
        Self { storage, latency }
    }

    pub async fn get(&self) -> ServiceResult<UserProfile> {
        self.latency.profile_delay().await;

        let user: Option<UserRecord> = read_json(&self.storage, keys::USER_DATA).await?;
        let saved: Option<UserProfile> = read_json(&self.storage, keys::USER_PROFILE).await?;
        let defaults = default_profile();

        if let Some(user) = user {
            let saved = saved.as_ref();
            return Ok(UserProfile {
                id: user.id,
                name: user.name,
                email: user.email,
                avatar: user.avatar.unwrap_or(defaults.avatar),
                role: user.role,
                professional_title: saved
                    .map(|profile| profile.professional_title.clone())
                    .unwrap_or(defaults.professional_title),
                language: saved
                    .map(|profile| profile.language.clone())
                    .unwrap_or(defaults.language),
                timezone: saved
                    .map(|profile| profile.timezone.clone())
                    .unwrap_or(defaults.timezone),
                theme: user
                    .preferences
                    .map(|preferences| preferences.theme)
                    .or_else(|| saved.map(|profile| profile.theme))
                    .unwrap_or(defaults.theme),
            });
        }

        Ok(saved.unwrap_or(defaults))
    }

    pub async fn update(&self, patch: ProfileUpdate) -> ServiceResult<UserProfile> {
        let mut profile = self.get().await?;

        if let Some(name) = patch.name {
            profile.name = name;
        }
        if let Some(email) = patch.email {
            profile.email = email;
        }
        if let Some(avatar) = patch.avatar {
            profile.avatar = avatar;
        }
        if let Some(role) = patch.role {
            profile.role = role;
        }
        if let Some(title) = patch.professional_title {
            profile.professional_title = title;
        }
        if let Some(language) = patch.language {
            profile.language = language;
        }
        if let Some(timezone) = patch.timezone {
            profile.timezone = timezone;
        }
        if let Some(theme) = patch.theme {
            profile.theme = theme;
        }

        write_json(&self.storage, keys::USER_PROFILE, &profile)
            .await
            .map_err(ServiceError::from)?;

        info!(user = %profile.id, "profile updated");
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        session::{SessionStore, UserPreferences},
        storage::MemoryStorage,
    };
    use std::sync::Arc;

    fn setup() -> (StorageRef, ProfileStore) {
        let storage: StorageRef = Arc::new(MemoryStorage::new());
        let profile = ProfileStore::new(storage.clone(), LatencyProfile::zero());
        (storage, profile)
    }

    #[tokio::test]
    async fn empty_storage_yields_the_default_profile() -> anyhow::Result<()> {
        let (_, profiles) = setup();

        let profile = profiles.get().await?;
        assert_eq!(profile, default_profile());
        Ok(())
    }

    #[tokio::test]
    async fn identity_fields_follow_the_signed_in_user() -> anyhow::Result<()> {
        let (storage, profiles) = setup();
        let sessions = SessionStore::new(storage.clone(), LatencyProfile::zero());
        sessions.login("demo@example.com", "demopassword").await?;

        let profile = profiles.get().await?;
        assert_eq!(profile.id, "demo-user-1");
        assert_eq!(profile.name, "Demo User");
        assert_eq!(profile.email, "demo@example.com");
        assert_eq!(profile.avatar, "DU");
        // preference fields keep their defaults
        assert_eq!(profile.professional_title, "Senior Product Designer");
        assert_eq!(profile.theme, ThemeMode::System);
        Ok(())
    }

    #[tokio::test]
    async fn updates_persist_preference_fields() -> anyhow::Result<()> {
        let (storage, profiles) = setup();
        let sessions = SessionStore::new(storage.clone(), LatencyProfile::zero());
        sessions.login("jane.smith@example.com", "password").await?;

        profiles
            .update(ProfileUpdate {
                professional_title: Some("Staff Engineer".to_owned()),
                timezone: Some("(GMT+01:00) Berlin".to_owned()),
                ..ProfileUpdate::default()
            })
            .await?;

        let profile = profiles.get().await?;
        assert_eq!(profile.professional_title, "Staff Engineer");
        assert_eq!(profile.timezone, "(GMT+01:00) Berlin");
        // identity still comes from the session user
        assert_eq!(profile.name, "Jane Smith");
        Ok(())
    }

    #[tokio::test]
    async fn user_preference_theme_wins_over_the_saved_profile() -> anyhow::Result<()> {
        let (storage, profiles) = setup();

        profiles
            .update(ProfileUpdate {
                theme: Some(ThemeMode::Light),
                ..ProfileUpdate::default()
            })
            .await?;

        let user = UserRecord {
            id: UserId::from("1"),
            name: "Jane Smith".to_owned(),
            email: "jane.smith@example.com".to_owned(),
            avatar: None,
            role: Role::Owner,
            preferences: Some(UserPreferences {
                theme: ThemeMode::Dark,
                notifications: true,
            }),
        };
        write_json(&storage, keys::USER_DATA, &user).await?;

        let profile = profiles.get().await?;
        assert_eq!(profile.theme, ThemeMode::Dark);
        // avatar falls back to the default when the user record has none
        assert_eq!(profile.avatar, "JS");
        Ok(())
    }

    #[tokio::test]
    async fn saved_profile_is_served_without_a_session() -> anyhow::Result<()> {
        let (_, profiles) = setup();

        let updated = profiles
            .update(ProfileUpdate {
                name: Some("Someone Else".to_owned()),
                ..ProfileUpdate::default()
            })
            .await?;

        let profile = profiles.get().await?;
        assert_eq!(profile, updated);
        assert_eq!(profile.name, "Someone Else");
        Ok(())
    }
}
