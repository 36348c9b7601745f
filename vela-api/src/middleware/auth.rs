use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vela_core::{Role, User};

use crate::error::AppError;
use crate::state::{AppState, AuthConfig};

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub exp: usize,
}

impl Claims {
    pub fn for_user(user: &User, auth: &AuthConfig) -> Self {
        Self {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            exp: (Utc::now() + Duration::seconds(auth.expiration as i64)).timestamp() as usize,
        }
    }
}

pub fn issue_token(user: &User, auth: &AuthConfig) -> Result<String, AppError> {
    encode(
        &Header::default(),
        &Claims::for_user(user, auth),
        &EncodingKey::from_secret(auth.secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

fn decode_claims(
    header: Option<TypedHeader<Authorization<Bearer>>>,
    auth: &AuthConfig,
) -> Result<Claims, AppError> {
    let TypedHeader(Authorization(bearer)) = header
        .ok_or_else(|| AppError::AuthenticationError("Missing bearer token".into()))?;

    decode::<Claims>(
        bearer.token(),
        &DecodingKey::from_secret(auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::AuthenticationError(format!("Invalid token: {}", e)))
}

async fn authorize(
    state: &AppState,
    header: Option<TypedHeader<Authorization<Bearer>>>,
    allowed: &[Role],
    mut req: Request,
    next: Next,
) -> Response {
    let claims = match decode_claims(header, &state.auth) {
        Ok(claims) => claims,
        Err(err) => return err.into_response(),
    };

    if !allowed.is_empty() && !allowed.contains(&claims.role) {
        tracing::warn!("{:?} token refused on {}", claims.role, req.uri().path());
        return AppError::AuthorizationError(format!(
            "{:?} accounts cannot access this resource",
            claims.role
        ))
        .into_response();
    }

    req.extensions_mut().insert(claims);
    next.run(req).await
}

// ============================================================================
// Role-scoped middleware
// ============================================================================

/// Any signed-in account.
pub async fn user_auth_middleware(
    State(state): State<AppState>,
    header: Option<TypedHeader<Authorization<Bearer>>>,
    req: Request,
    next: Next,
) -> Response {
    authorize(&state, header, &[], req, next).await
}

pub async fn customer_auth_middleware(
    State(state): State<AppState>,
    header: Option<TypedHeader<Authorization<Bearer>>>,
    req: Request,
    next: Next,
) -> Response {
    authorize(&state, header, &[Role::Customer], req, next).await
}

pub async fn operator_auth_middleware(
    State(state): State<AppState>,
    header: Option<TypedHeader<Authorization<Bearer>>>,
    req: Request,
    next: Next,
) -> Response {
    authorize(&state, header, &[Role::Operator], req, next).await
}

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    header: Option<TypedHeader<Authorization<Bearer>>>,
    req: Request,
    next: Next,
) -> Response {
    authorize(&state, header, &[Role::Admin], req, next).await
}
