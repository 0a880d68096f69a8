use std::{fmt, str::FromStr};

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::active_workspace::ActiveWorkspaceSelector;

/// Access-control label scoped to a single workspace.
///
/// The set is closed and deliberately unordered: Owner does not imply Admin,
/// and no role implies another. Every gated surface enumerates its own
/// allowed set explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Owner,
    Admin,
    Member,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Owner => "Owner",
            Role::Admin => "Admin",
            Role::Member => "Member",
        };
        f.write_str(label)
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "owner" => Ok(Role::Owner),
            "admin" => Ok(Role::Admin),
            "member" => Ok(Role::Member),
            other => Err(anyhow!("unknown role: {other}")),
        }
    }
}

/// Allowed-role sets for the mutating operations, enforced at the operation
/// entry points rather than only at the rendering layer.
pub const MANAGE_MEMBERS: &[Role] = &[Role::Owner, Role::Admin];
pub const MANAGE_WORKSPACE: &[Role] = &[Role::Owner, Role::Admin];
pub const DELETE_WORKSPACE: &[Role] = &[Role::Owner];

/// `role` is defined and appears in `allowed`. Membership check only, no
/// hierarchy.
pub fn is_allowed(role: Option<Role>, allowed: &[Role]) -> bool {
    role.map_or(false, |role| allowed.contains(&role))
}

/// Conditional-render guard over the active workspace's role.
///
/// Side-effect free; when no workspace is resolved the predicate evaluates
/// false and the fallback (or nothing) is produced.
#[derive(Clone)]
pub struct Can {
    selector: ActiveWorkspaceSelector,
    allowed: Vec<Role>,
}

impl Can {
    pub fn new(selector: ActiveWorkspaceSelector, allowed: impl Into<Vec<Role>>) -> Self {
        Self {
            selector,
            allowed: allowed.into(),
        }
    }

    pub fn check(&self) -> bool {
        is_allowed(self.selector.current_role(), &self.allowed)
    }

    pub fn render<T>(&self, children: impl FnOnce() -> T) -> Option<T> {
        if self.check() {
            Some(children())
        } else {
            None
        }
    }

    pub fn render_or<T>(&self, children: impl FnOnce() -> T, fallback: impl FnOnce() -> T) -> T {
        if self.check() {
            children()
        } else {
            fallback()
        }
    }
}
