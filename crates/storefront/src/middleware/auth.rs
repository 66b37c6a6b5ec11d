//! Authentication extractors and role gates.
//!
//! Dashboard areas (`/customer`, `/merchant`, `/producer`) each belong to one
//! [`UserRole`]. Guests are sent to `/login`; a signed-in user who wanders
//! into another role's area is sent back to their own dashboard.

use axum::{
    extract::{FromRequestParts, Request},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use freshdart_core::UserRole;

use crate::models::{CurrentUser, session_keys};

/// Where guests are sent when a page needs a signed-in user.
pub const LOGIN_PATH: &str = "/login";

/// Extractor that requires a signed-in user.
///
/// API requests are rejected with 401; page requests redirect to the login
/// page.
///
/// # Example
///
/// ```rust,ignore
/// async fn my_orders(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Orders for {}", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when authentication is required but the user is not logged in.
pub enum AuthRejection {
    /// Redirect to login page (for page requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                axum::Json(serde_json::json!({
                    "error": {
                        "code": "UNAUTHORIZED",
                        "message": "You must be logged in"
                    }
                })),
            )
                .into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let rejection = if parts.uri.path().starts_with("/api/") {
            AuthRejection::Unauthorized
        } else {
            AuthRejection::RedirectToLogin
        };

        let Some(session) = parts.extensions.get::<Session>() else {
            return Err(rejection);
        };

        current_user(session).await.map(Self).ok_or(rejection)
    }
}

/// Extractor that optionally gets the current user.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => current_user(session).await,
            None => None,
        };

        Ok(Self(user))
    }
}

async fn current_user(session: &Session) -> Option<CurrentUser> {
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Store the signed-in user in the session.
///
/// The session ID is cycled first so a pre-login session ID cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Remove the signed-in user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}

/// Where a request for `path` should be redirected, if anywhere.
///
/// Only paths inside a role's dashboard area are gated.
#[must_use]
pub fn dashboard_redirect(path: &str, user: Option<&CurrentUser>) -> Option<&'static str> {
    let area = UserRole::owning_area(path)?;
    match user {
        None => Some(LOGIN_PATH),
        Some(user) if user.role != area => Some(user.role.dashboard_path()),
        Some(_) => None,
    }
}

/// Middleware gating the role dashboard areas.
pub async fn dashboard_gate(session: Session, request: Request, next: Next) -> Response {
    let user = current_user(&session).await;

    if let Some(target) = dashboard_redirect(request.uri().path(), user.as_ref()) {
        tracing::debug!(path = %request.uri().path(), target, "dashboard gate redirect");
        return Redirect::to(target).into_response();
    }

    next.run(request).await
}

/// Middleware for the login and register pages: signed-in users go to their
/// dashboard instead.
pub async fn guest_only(session: Session, request: Request, next: Next) -> Response {
    if let Some(user) = current_user(&session).await {
        return Redirect::to(user.role.dashboard_path()).into_response();
    }

    next.run(request).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use freshdart_core::{Email, UserId};

    fn user(role: UserRole) -> CurrentUser {
        CurrentUser {
            id: UserId::new(1),
            name: "Lito".to_owned(),
            email: Email::parse("lito@example.ph").unwrap(),
            role,
        }
    }

    #[test]
    fn test_guest_sent_to_login() {
        assert_eq!(dashboard_redirect("/merchant/dashboard", None), Some("/login"));
    }

    #[test]
    fn test_wrong_role_sent_home() {
        let producer = user(UserRole::Producer);
        assert_eq!(
            dashboard_redirect("/customer/dashboard", Some(&producer)),
            Some("/producer/dashboard")
        );
        assert_eq!(dashboard_redirect("/producer/dashboard", Some(&producer)), None);
    }

    #[test]
    fn test_public_paths_not_gated() {
        assert_eq!(dashboard_redirect("/api/products", None), None);
        assert_eq!(dashboard_redirect("/customers", None), None);
    }
}
