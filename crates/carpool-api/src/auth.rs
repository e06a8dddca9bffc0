use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use rand::Rng;

use carpool_store::Store;
use carpool_types::api::{
    Claims, LoginRequest, LoginResponse, ProfileResponse, RegisterRequest, RegisterResponse,
    UpdateProfileRequest,
};
use carpool_types::models::{Account, Role};

use crate::error::ApiError;
use crate::notify::Notifier;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub store: Store,
    pub jwt_secret: String,
    pub notifier: Notifier,
    /// Base URL used in the verification link sent at registration.
    pub public_base_url: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.name.is_empty() || req.name.len() > 64 {
        return Err(ApiError::Validation("name must be 1-64 characters".into()));
    }
    if !req.email.contains('@') {
        return Err(ApiError::Validation("email is not an address".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?
        .to_string();

    let verify_token = fresh_token();

    let account = Account {
        email: req.email.clone(),
        name: req.name.clone(),
        role: req.role,
        password_hash,
        verified: false,
        verify_token: Some(verify_token.clone()),
        // Vehicle info only makes sense for drivers.
        vehicle_info: match req.role {
            Role::Driver => req.vehicle_info,
            Role::Passenger => None,
        },
        created_at: chrono::Utc::now(),
    };

    if !state.store.accounts.insert(account)? {
        return Err(ApiError::Validation("email is already registered".into()));
    }

    // Account is committed; the verification mail is best-effort.
    let link = format!("{}/auth/confirm/{}", state.public_base_url, verify_token);
    let notified = state
        .notifier
        .deliver_best_effort(
            &req.email,
            "Confirm your email",
            &format!(
                "Hello {}, please confirm your email by opening this link: {}",
                req.name, link
            ),
        )
        .await;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            email: req.email,
            notified,
        }),
    ))
}

pub async fn confirm(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match state.store.accounts.confirm(&token)? {
        Some(email) => {
            tracing::info!(email, "email verified");
            Ok(Json(serde_json::json!({ "verified": email })))
        }
        None => Err(ApiError::Validation(
            "invalid or already used verification token".into(),
        )),
    }
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state
        .store
        .accounts
        .find(&req.email)?
        .ok_or(ApiError::Unauthorized)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&account.password_hash)
        .map_err(|e| anyhow::anyhow!("stored hash is corrupt: {e}"))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)?;

    let token = create_token(&state.jwt_secret, &account.email, account.role)?;

    Ok(Json(LoginResponse {
        email: account.email,
        name: account.name,
        role: account.role,
        token,
    }))
}

pub async fn profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state
        .store
        .accounts
        .find(&claims.sub)?
        .ok_or(ApiError::NotFound("account"))?;
    Ok(Json(profile_response(account)))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(name) = &req.name {
        if name.is_empty() || name.len() > 64 {
            return Err(ApiError::Validation("name must be 1-64 characters".into()));
        }
    }

    let updated = state
        .store
        .accounts
        .update(&claims.sub, |account| {
            if let Some(name) = req.name {
                account.name = name;
            }
            if account.role == Role::Driver {
                if let Some(vehicle) = req.vehicle_info {
                    account.vehicle_info = Some(vehicle);
                }
            }
            account.clone()
        })?
        .ok_or(ApiError::NotFound("account"))?;

    Ok(Json(profile_response(updated)))
}

fn profile_response(account: Account) -> ProfileResponse {
    ProfileResponse {
        email: account.email,
        name: account.name,
        role: account.role,
        verified: account.verified,
        vehicle_info: account.vehicle_info,
    }
}

fn fresh_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    hex::encode(bytes)
}

fn create_token(secret: &str, identity: &str, role: Role) -> anyhow::Result<String> {
    let claims = Claims {
        sub: identity.to_string(),
        role,
        exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
