use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vela_core::repository::UserRepository;
use vela_core::{Membership, ProfileStatus, Role, User};
use vela_shared::pii::mask_email;

use crate::error::AppError;
use crate::middleware::auth::{issue_token, user_auth_middleware, Claims};
use crate::state::AppState;
use crate::validation::{validate_email, validate_name, validate_password, validate_phone};

/// A user as returned by the API. Never carries the password hash.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub role: Role,
    pub profile_status: ProfileStatus,
    pub membership: Membership,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            phone: user.phone.clone(),
            company: user.company.clone(),
            role: user.role,
            profile_status: user.profile_status,
            membership: user.membership.clone(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    email: String,
    name: String,
    password: String,
    role: Role,
    phone: Option<String>,
    company: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct UpdateProfileRequest {
    name: Option<String>,
    phone: Option<String>,
    company: Option<String>,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    user: UserView,
}

pub fn routes(state: AppState) -> Router<AppState> {
    let profile = Router::new()
        .route("/me", get(get_profile).put(update_profile))
        .route_layer(middleware::from_fn_with_state(state, user_auth_middleware));

    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .merge(profile)
}

pub async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::InternalServerError(format!("hashing task failed: {}", e)))?
        .map_err(|e| AppError::InternalServerError(format!("bcrypt: {}", e)))
}

async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::InternalServerError(format!("hashing task failed: {}", e)))?
        .map_err(|e| AppError::InternalServerError(format!("bcrypt: {}", e)))
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if req.role == Role::Admin {
        return Err(AppError::AuthorizationError(
            "Admin accounts cannot self-register".into(),
        ));
    }
    validate_email(&req.email)?;
    validate_name(&req.name)?;
    validate_password(&req.password)?;
    if let Some(phone) = req.phone.as_deref() {
        validate_phone(phone)?;
    }

    let password_hash = hash_password(req.password, state.auth.bcrypt_cost).await?;

    let _guard = state.write_lock.lock().await;
    if state.store.find_by_email(&req.email).await?.is_some() {
        return Err(AppError::ConflictError("Email is already registered".into()));
    }

    let mut user = User::new(req.email, req.name.trim().to_string(), req.role, password_hash);
    user.phone = req.phone;
    user.company = req.company;
    user.membership.booking_limit = state.plans.booking_limit;
    user.membership.cancellation_limit = state.plans.cancellation_limit;
    state.store.save_user(&user).await?;

    tracing::info!("Registered {:?} account {}", user.role, mask_email(&user.email));

    let token = issue_token(&user, &state.auth)?;
    Ok(Json(AuthResponse {
        token,
        user: UserView::from(&user),
    }))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let invalid = || AppError::AuthenticationError("Invalid email or password".into());

    let user = state.store.find_by_email(&req.email).await?.ok_or_else(invalid)?;
    if !verify_password(req.password, user.password_hash.clone()).await? {
        tracing::warn!("Failed login for {}", mask_email(&user.email));
        return Err(invalid());
    }

    let token = issue_token(&user, &state.auth)?;
    Ok(Json(AuthResponse {
        token,
        user: UserView::from(&user),
    }))
}

pub async fn current_user(state: &AppState, claims: &Claims) -> Result<User, AppError> {
    state
        .store
        .get_user(claims.sub)
        .await?
        .ok_or_else(|| AppError::AuthenticationError("Account no longer exists".into()))
}

async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserView>, AppError> {
    let user = current_user(&state, &claims).await?;
    Ok(Json(UserView::from(&user)))
}

async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserView>, AppError> {
    if let Some(name) = req.name.as_deref() {
        validate_name(name)?;
    }
    if let Some(phone) = req.phone.as_deref() {
        validate_phone(phone)?;
    }

    let _guard = state.write_lock.lock().await;
    let mut user = current_user(&state, &claims).await?;
    if let Some(name) = req.name {
        user.name = name.trim().to_string();
    }
    if req.phone.is_some() {
        user.phone = req.phone;
    }
    if req.company.is_some() {
        user.company = req.company;
    }
    user.touch();
    state.store.save_user(&user).await?;

    Ok(Json(UserView::from(&user)))
}
