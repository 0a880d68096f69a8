//! Mocked client service layer for the Team Control admin dashboard.
//!
//! Every "service" here reads and writes a local storage backend and
//! resolves after a fixed simulated network delay; there is no server and no
//! real authentication. The session store establishes identity, the
//! workspace store lists the tenants that identity belongs to, the selector
//! pins one of them as current, and the role carried by the current
//! workspace gates the mutating surfaces.

pub mod active_workspace;
pub mod config;
pub mod error;
pub mod ids;
pub mod latency;
pub mod membership;
pub mod profile;
pub mod rbac;
pub mod route_guard;
pub mod services;
pub mod session;
pub mod storage;
pub mod workspace;

pub use active_workspace::ActiveWorkspaceSelector;
pub use config::{AppConfig, StorageBackendKind};
pub use error::{ServiceError, ServiceResult};
pub use ids::{MemberId, UserId, WorkspaceId};
pub use latency::LatencyProfile;
pub use membership::{MemberRecord, MemberStatus, MembershipStore};
pub use profile::{ProfileStore, ProfileUpdate, UserProfile};
pub use rbac::{is_allowed, Can, Role};
pub use route_guard::{decide_navigation, decide_request, RouteDecision};
pub use services::Services;
pub use session::{AuthState, SessionStore, ThemeMode, UserPreferences, UserRecord};
pub use storage::{JsonFileStorage, MemoryStorage, StorageBackend, StorageRef};
pub use workspace::{WorkspaceRecord, WorkspaceStore, WorkspaceUpdate};
