//! Authentication and profile routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;

use tavola_core::UserRole;

use crate::db::UserRepository;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::RequireAuth;
use crate::middleware::auth::{clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::routes::{ApiResponse, success};
use crate::services::auth::AuthService;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me).put(update_profile))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignupRequest {
    email: String,
    password: String,
    name: String,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    role: Option<UserRole>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProfileRequest {
    name: String,
    #[serde(default)]
    phone: Option<String>,
}

async fn signup(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<User>>)> {
    // Admin accounts are provisioned out of band, never self-registered.
    let role = match body.role.unwrap_or_default() {
        UserRole::Admin => UserRole::Customer,
        other => other,
    };

    let user = AuthService::new(state.pool())
        .signup(
            &body.email,
            &body.password,
            &body.name,
            body.phone.as_deref(),
            role,
        )
        .await?;

    establish_session(&session, &user).await?;
    Ok((StatusCode::CREATED, success(user)))
}

async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<ApiResponse<User>>> {
    let user = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await?;

    establish_session(&session, &user).await?;
    Ok(success(user))
}

async fn logout(session: Session) -> Result<Json<ApiResponse<()>>> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();
    Ok(success(()))
}

async fn me(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<ApiResponse<User>>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_owned()))?;
    Ok(success(user))
}

async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<User>>> {
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_owned()));
    }

    let user = UserRepository::new(state.pool())
        .update_profile(current.id, &body.name, body.phone.as_deref())
        .await?;

    // The session copy carries the display name; keep it in step.
    set_current_user(&session, &CurrentUser::from(&user))
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    Ok(success(user))
}

async fn establish_session(session: &Session, user: &User) -> Result<()> {
    // Drop any prior session id before authenticating (session fixation).
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    let current = CurrentUser::from(user);
    set_current_user(session, &current)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    set_sentry_user(&current.id, Some(&current.email));
    Ok(())
}
