//! Scripted tour of the service layer against a real storage file: sign in,
//! inspect tenants, switch, exercise the role gates, mutate the roster,
//! sign out. Run with `TEAMCONTROL_DISABLE_LATENCY=1` to skip the simulated
//! network delays.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use teamcontrol_core::{
    rbac, route_guard::{self, RouteDecision},
    AppConfig, Role, Services,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;
    info!(backend = ?config.storage_backend, path = %config.storage_path, "starting walkthrough");

    let services = Services::build(&config)?;

    // An anonymous visitor hitting the dashboard gets bounced to login.
    let decision = route_guard::decide_navigation("/", services.session.is_authenticated().await?);
    info!(?decision, "navigation check before sign-in");

    let user = services.login("demo@example.com", "demopassword").await?;
    info!(user = %user.id, name = %user.name, "signed in");

    match route_guard::decide_navigation("/login", true) {
        RouteDecision::RedirectToDashboard => info!("login surface now redirects to dashboard"),
        other => info!(?other, "unexpected navigation decision"),
    }

    for workspace in services.workspaces.list().await? {
        info!(id = %workspace.id, name = %workspace.name, role = %workspace.role, "member of workspace");
    }

    let Some(active) = services.active.current() else {
        anyhow::bail!("no workspace resolved for a seeded set");
    };
    info!(workspace = %active.name, role = %active.role, "active workspace");

    // Role-gated surfaces: the seeded first workspace carries Owner.
    let manage = services.can(rbac::MANAGE_MEMBERS.to_vec());
    info!(visible = manage.check(), "invite button");

    let roster = services.members.list(active.id.as_str()).await?;
    info!(count = roster.len(), "current roster");

    let invited = services
        .members
        .invite(active.id.as_str(), "new.user@example.com", Role::Member)
        .await?;
    info!(member = %invited.id, name = %invited.name, status = ?invited.status, "invited");

    services.members.revoke_invite(active.id.as_str(), invited.id.as_str()).await?;
    info!(member = %invited.id, "invite revoked");

    // Switching to the Admin-role workspace hides Owner-only surfaces.
    services.active.switch("ws-2").await?;
    if let Some(current) = services.active.current() {
        let delete = services.can(rbac::DELETE_WORKSPACE.to_vec());
        info!(workspace = %current.name, role = %current.role, delete_visible = delete.check(), "after switch");
    }

    let profile = services.profile.get().await?;
    info!(name = %profile.name, title = %profile.professional_title, "profile");

    services.logout().await?;
    info!(authenticated = services.session.is_authenticated().await?, "signed out");

    Ok(())
}
