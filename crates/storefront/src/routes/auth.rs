//! Authentication route handlers.
//!
//! Email and password accounts. Registration does not sign the user in; the
//! client follows up with a login.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use freshdart_core::UserRole;

use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::AuthService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: UserRole,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user: CurrentUser,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: Option<CurrentUser>,
}

/// Create an account.
#[instrument(skip(state, request), fields(email = %request.email, role = %request.role))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>> {
    let user = AuthService::new(state.pool())
        .register(&request.name, &request.email, &request.password, request.role)
        .await?;

    tracing::info!(user_id = %user.id, "account registered");

    Ok(Json(AuthResponse {
        success: true,
        user: CurrentUser::from(&user),
        redirect: None,
    }))
}

/// Sign in and store the user in the session.
#[instrument(skip(state, session, request), fields(email = %request.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let user = match AuthService::new(state.pool())
        .login(&request.email, &request.password)
        .await
    {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "login failed");
            return Err(e.into());
        }
    };

    let current = CurrentUser::from(&user);
    set_current_user(&session, &current).await?;
    set_sentry_user(&current.id, Some(current.email.as_str()));
    add_breadcrumb("auth", "Signed in", Some(&[("role", current.role.as_str())]));

    Ok(Json(AuthResponse {
        success: true,
        redirect: Some(current.role.dashboard_path()),
        user: current,
    }))
}

#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Json<serde_json::Value>> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(Json(json!({ "success": true })))
}

/// The signed-in user, or `null`.
pub async fn session(OptionalAuth(user): OptionalAuth) -> Json<SessionResponse> {
    Json(SessionResponse { user })
}

/// Login page. Signed-in users are redirected before reaching this.
pub async fn login_page() -> Json<serde_json::Value> {
    Json(json!({ "page": "login", "action": "/api/auth/login" }))
}

/// Registration page, offering the selectable roles.
pub async fn register_page() -> Json<serde_json::Value> {
    Json(json!({
        "page": "register",
        "action": "/api/auth/register",
        "roles": UserRole::ALL,
    }))
}
