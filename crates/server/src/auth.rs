//! Password authentication endpoints and session token plumbing.

use api_types::user::{AuthResponse, SignIn, SignUp, UserView};
use axum::{Json, extract::State};
use axum_extra::extract::{CookieJar, cookie::Cookie};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};
use ledger::users;

pub const SESSION_COOKIE: &str = "session";

/// Session lifetime, matching the token's `exp` claim.
const SESSION_DURATION: time::Duration = time::Duration::hours(1);

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn generate_session_token(secret: &str, user: &users::Model) -> Result<String, ServerError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user.id.clone(),
        username: user.username.clone(),
        iat: now,
        exp: now + SESSION_DURATION.whole_seconds(),
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|err| ServerError::Internal(format!("failed to sign session token: {err}")))
}

pub fn verify_session_token(
    secret: &str,
    token: &str,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .secure(true)
        .path("/")
        .max_age(SESSION_DURATION)
        .build()
}

pub fn user_view(user: &users::Model) -> Result<UserView, ServerError> {
    let id = Uuid::parse_str(&user.id)
        .map_err(|err| ServerError::Internal(format!("malformed user id: {err}")))?;
    Ok(UserView {
        id,
        username: user.username.clone(),
        email: user.email.clone(),
        profile_picture: user.profile_picture.clone(),
        provider: user.provider.clone(),
    })
}

pub async fn find_by_email(
    state: &ServerState,
    email: &str,
) -> Result<Option<users::Model>, ServerError> {
    users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(&state.db)
        .await
        .map_err(|err| ServerError::Internal(format!("user lookup failed: {err}")))
}

pub async fn signup(
    State(state): State<ServerState>,
    jar: CookieJar,
    Json(payload): Json<SignUp>,
) -> Result<(CookieJar, Json<AuthResponse>), ServerError> {
    if payload.username.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.password.is_empty()
    {
        return Err(ServerError::Generic(
            "username, email and password are required".to_string(),
        ));
    }

    if find_by_email(&state, &payload.email).await?.is_some() {
        return Err(ServerError::Ledger(ledger::LedgerError::ExistingKey(
            payload.email,
        )));
    }

    let password_hash = bcrypt::hash(&payload.password, bcrypt::DEFAULT_COST)
        .map_err(|err| ServerError::Internal(format!("password hashing failed: {err}")))?;

    let now = Utc::now();
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        username: Set(payload.username),
        email: Set(payload.email),
        password_hash: Set(Some(password_hash)),
        profile_picture: Set(None),
        provider: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await
    .map_err(|err| ServerError::Internal(format!("user insert failed: {err}")))?;

    let token = generate_session_token(&state.auth.jwt_secret, &user)?;
    let view = user_view(&user)?;
    Ok((
        jar.add(session_cookie(token)),
        Json(AuthResponse {
            message: "signed up".to_string(),
            user: view,
        }),
    ))
}

pub async fn signin(
    State(state): State<ServerState>,
    jar: CookieJar,
    Json(payload): Json<SignIn>,
) -> Result<(CookieJar, Json<AuthResponse>), ServerError> {
    let user = find_by_email(&state, &payload.email)
        .await?
        .ok_or_else(|| ServerError::Unauthorized("invalid email or password".to_string()))?;

    // Federated users have no password to check.
    let password_hash = user
        .password_hash
        .as_deref()
        .ok_or_else(|| ServerError::Unauthorized("invalid email or password".to_string()))?;

    let valid = bcrypt::verify(&payload.password, password_hash)
        .map_err(|err| ServerError::Internal(format!("password verification failed: {err}")))?;
    if !valid {
        return Err(ServerError::Unauthorized(
            "invalid email or password".to_string(),
        ));
    }

    let token = generate_session_token(&state.auth.jwt_secret, &user)?;
    let view = user_view(&user)?;
    Ok((
        jar.add(session_cookie(token)),
        Json(AuthResponse {
            message: "signed in".to_string(),
            user: view,
        }),
    ))
}

pub async fn signout(jar: CookieJar) -> (CookieJar, Json<serde_json::Value>) {
    let removal = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    (
        jar.remove(removal),
        Json(serde_json::json!({"message": "signed out"})),
    )
}
