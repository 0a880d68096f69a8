use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ServiceError, ServiceResult},
    ids::UserId,
    latency::LatencyProfile,
    rbac::Role,
    storage::{keys, StorageBackend, StorageRef},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub theme: ThemeMode,
    pub notifications: bool,
}

/// The signed-in account. `role` is the account-global label; it is a
/// separate field from any per-workspace role and neither ever defaults
/// from the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<UserPreferences>,
}

/// Authentication transitions broadcast to route-guarding collaborators.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Anonymous,
    Authenticated(UserRecord),
}

struct DemoAccount {
    email: &'static str,
    password: &'static str,
    id: &'static str,
    name: &'static str,
    avatar: &'static str,
}

/// The closed credential allow-list. Login succeeds only on an exact pair
/// match against one of these accounts.
const DEMO_ACCOUNTS: &[DemoAccount] = &[
    DemoAccount {
        email: "demo@example.com",
        password: "demopassword",
        id: "demo-user-1",
        name: "Demo User",
        avatar: "DU",
    },
    DemoAccount {
        email: "jane.smith@example.com",
        password: "password",
        id: "1",
        name: "Jane Smith",
        avatar: "JS",
    },
];

impl DemoAccount {
    fn user_record(&self) -> UserRecord {
        UserRecord {
            id: UserId::from(self.id),
            name: self.name.to_owned(),
            email: self.email.to_owned(),
            avatar: Some(self.avatar.to_owned()),
            role: Role::Owner,
            preferences: Some(UserPreferences {
                theme: ThemeMode::System,
                notifications: true,
            }),
        }
    }
}

/// Persists the `{token, user}` pair. Presence of the token is the sole
/// authentication predicate; a stored user without a token is never treated
/// as authenticated.
#[derive(Clone)]
pub struct SessionStore {
    storage: StorageRef,
    latency: LatencyProfile,
    auth_tx: Arc<watch::Sender<AuthState>>,
}

impl SessionStore {
    pub fn new(storage: StorageRef, latency: LatencyProfile) -> Self {
        let (auth_tx, _) = watch::channel(AuthState::Anonymous);
        Self {
            storage,
            latency,
            auth_tx: Arc::new(auth_tx),
        }
    }

    /// Observe login/logout transitions, e.g. from a route guard.
    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.auth_tx.subscribe()
    }

    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<UserRecord> {
        self.latency.login_delay().await;

        if email.trim().is_empty() {
            return Err(ServiceError::missing_input("email"));
        }
        if password.trim().is_empty() {
            return Err(ServiceError::missing_input("password"));
        }

        let Some(account) = DEMO_ACCOUNTS
            .iter()
            .find(|account| account.email == email && account.password == password)
        else {
            return Err(ServiceError::InvalidCredentials);
        };

        let user = account.user_record();
        let token = generate_token();

        self.storage.set(keys::AUTH_TOKEN, &token).await?;
        let raw = serde_json::to_string(&user).context("failed to serialize session user")?;
        self.storage.set(keys::USER_DATA, &raw).await?;

        self.auth_tx
            .send_replace(AuthState::Authenticated(user.clone()));
        info!(user = %user.id, "session established");

        Ok(user)
    }

    /// Idempotent: clearing an absent session is not an error.
    pub async fn logout(&self) -> ServiceResult<()> {
        self.storage.remove(keys::AUTH_TOKEN).await?;
        self.storage.remove(keys::USER_DATA).await?;

        self.auth_tx.send_replace(AuthState::Anonymous);
        info!("session cleared");
        Ok(())
    }

    pub async fn is_authenticated(&self) -> ServiceResult<bool> {
        Ok(self.storage.get(keys::AUTH_TOKEN).await?.is_some())
    }

    pub async fn current_user(&self) -> ServiceResult<Option<UserRecord>> {
        crate::storage::read_json(&self.storage, keys::USER_DATA)
            .await
            .map_err(ServiceError::from)
    }
}

fn generate_token() -> String {
    let mut token = format!("mock-jwt-token-{}", Uuid::new_v4().simple());
    token.truncate(24);
    token
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn store() -> SessionStore {
        SessionStore::new(Arc::new(MemoryStorage::new()), LatencyProfile::zero())
    }

    #[tokio::test]
    async fn login_succeeds_only_on_exact_allow_list_match() -> anyhow::Result<()> {
        let sessions = store();

        let user = sessions.login("demo@example.com", "demopassword").await?;
        assert_eq!(user.id, "demo-user-1");
        assert_eq!(user.name, "Demo User");
        assert_eq!(user.role, Role::Owner);
        assert!(sessions.is_authenticated().await?);

        let current = sessions.current_user().await?.expect("user persisted");
        assert_eq!(current, user);
        Ok(())
    }

    #[tokio::test]
    async fn login_rejects_pairs_outside_the_allow_list() -> anyhow::Result<()> {
        let sessions = store();

        for (email, password) in [
            ("demo@example.com", "wrong"),
            ("jane.smith@example.com", "demopassword"),
            ("stranger@example.com", "password"),
        ] {
            let err = sessions.login(email, password).await.unwrap_err();
            assert!(matches!(err, ServiceError::InvalidCredentials));
            assert!(!sessions.is_authenticated().await?);
        }
        Ok(())
    }

    #[tokio::test]
    async fn login_requires_both_fields() {
        let sessions = store();

        let err = sessions.login("", "password").await.unwrap_err();
        assert!(matches!(err, ServiceError::MissingInput { field: "email" }));

        let err = sessions.login("demo@example.com", "  ").await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::MissingInput { field: "password" }
        ));
    }

    #[tokio::test]
    async fn logout_clears_the_session_and_is_idempotent() -> anyhow::Result<()> {
        let sessions = store();
        sessions.login("jane.smith@example.com", "password").await?;
        assert!(sessions.is_authenticated().await?);

        sessions.logout().await?;
        assert!(!sessions.is_authenticated().await?);
        assert!(sessions.current_user().await?.is_none());

        // a second logout with no session is not an error
        sessions.logout().await?;
        Ok(())
    }

    #[tokio::test]
    async fn auth_transitions_are_observable() -> anyhow::Result<()> {
        let sessions = store();
        let mut rx = sessions.watch();
        assert_eq!(*rx.borrow(), AuthState::Anonymous);

        let user = sessions.login("demo@example.com", "demopassword").await?;
        rx.changed().await?;
        assert_eq!(*rx.borrow_and_update(), AuthState::Authenticated(user));

        sessions.logout().await?;
        rx.changed().await?;
        assert_eq!(*rx.borrow_and_update(), AuthState::Anonymous);
        Ok(())
    }

    #[tokio::test]
    async fn stored_user_layout_is_stable() -> anyhow::Result<()> {
        let sessions = store();
        sessions.login("demo@example.com", "demopassword").await?;

        let raw = sessions
            .storage
            .get(keys::USER_DATA)
            .await?
            .expect("user stored");
        let value: serde_json::Value = serde_json::from_str(&raw)?;

        assert_eq!(value["id"], "demo-user-1");
        assert_eq!(value["role"], "Owner");
        assert_eq!(value["preferences"]["theme"], "system");
        assert_eq!(value["preferences"]["notifications"], true);

        let token = sessions
            .storage
            .get(keys::AUTH_TOKEN)
            .await?
            .expect("token stored");
        assert!(token.starts_with("mock-jwt-token-"));
        Ok(())
    }
}
