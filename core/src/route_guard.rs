//! Redirect decisions for the navigation boundary.
//!
//! Two collaborators consult the session state: the in-app guard, which runs
//! on every client-side navigation, and the edge guard, which sees only the
//! persisted token marker attached to the request. Both are pure decision
//! functions; performing the redirect is the caller's concern.

/// Surfaces reachable without a session, matched exactly by the in-app guard.
pub const PUBLIC_PATHS: &[&str] = &["/login", "/register", "/forgot-password"];

/// Auth surfaces the edge guard recognizes, matched by prefix.
const AUTH_PAGE_PREFIXES: &[&str] = &["/login", "/register"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Proceed,
    RedirectToLogin,
    RedirectToDashboard,
}

/// In-app navigation guard: unauthenticated visitors are sent to the login
/// surface, authenticated visitors are kept off the public surfaces.
pub fn decide_navigation(path: &str, authenticated: bool) -> RouteDecision {
    let public = PUBLIC_PATHS.contains(&path);

    if !authenticated && !public {
        RouteDecision::RedirectToLogin
    } else if authenticated && public {
        RouteDecision::RedirectToDashboard
    } else {
        RouteDecision::Proceed
    }
}

/// Edge guard: the same decision pair, taken from the presence of the
/// persisted token marker before any page renders.
pub fn decide_request(path: &str, token_present: bool) -> RouteDecision {
    let auth_page = AUTH_PAGE_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix));

    if !token_present && !auth_page {
        RouteDecision::RedirectToLogin
    } else if token_present && auth_page {
        RouteDecision::RedirectToDashboard
    } else {
        RouteDecision::Proceed
    }
}
