//! Google sign-in via the OAuth authorization-code flow with PKCE.
//!
//! `GET /auth/google` hands the client an authorization URL and parks the
//! `state` and PKCE verifier in short-lived cookies. The callback checks
//! the returned `state` against the cookie, exchanges the code for tokens
//! and reads the user's identity from the ID token payload.

use api_types::user::{AuthResponse, GoogleCallback, GoogleLoginResponse};
use axum::{Json, extract::State};
use axum_extra::extract::{CookieJar, cookie::Cookie};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, IntoActiveModel, Set};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    ServerError, auth,
    server::{GoogleSettings, ServerState},
};
use ledger::users;

const AUTHORIZATION_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

const STATE_COOKIE: &str = "google_oauth";
const VERIFIER_COOKIE: &str = "google_code_verifier";

/// The client must finish the exchange within this window.
const EXCHANGE_EXPIRY: time::Duration = time::Duration::minutes(10);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    id_token: String,
}

/// Identity claims carried in the ID token payload.
#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    name: String,
    email: String,
    picture: Option<String>,
}

fn google_settings(state: &ServerState) -> Result<&GoogleSettings, ServerError> {
    state
        .auth
        .google
        .as_ref()
        .ok_or_else(|| ServerError::NotConfigured("google sign-in is not configured".to_string()))
}

fn exchange_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .path("/")
        .max_age(EXCHANGE_EXPIRY)
        .build()
}

pub async fn google_login(
    State(state): State<ServerState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<GoogleLoginResponse>), ServerError> {
    let google = google_settings(&state)?;

    let oauth_state = Uuid::new_v4().simple().to_string();
    let verifier = format!(
        "{}{}",
        Uuid::new_v4().simple(),
        Uuid::new_v4().simple()
    );
    let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));

    let url = reqwest::Url::parse_with_params(
        AUTHORIZATION_ENDPOINT,
        &[
            ("response_type", "code"),
            ("client_id", google.client_id.as_str()),
            ("redirect_uri", google.redirect_uri.as_str()),
            ("scope", "openid profile email"),
            ("state", oauth_state.as_str()),
            ("code_challenge", challenge.as_str()),
            ("code_challenge_method", "S256"),
        ],
    )
    .map_err(|err| ServerError::Internal(format!("authorization url: {err}")))?;

    let jar = jar
        .add(exchange_cookie(STATE_COOKIE, oauth_state))
        .add(exchange_cookie(VERIFIER_COOKIE, verifier));

    Ok((
        jar,
        Json(GoogleLoginResponse {
            url: url.to_string(),
        }),
    ))
}

pub async fn google_callback(
    State(state): State<ServerState>,
    jar: CookieJar,
    Json(payload): Json<GoogleCallback>,
) -> Result<(CookieJar, Json<AuthResponse>), ServerError> {
    let google = google_settings(&state)?;

    let stored_state = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    let verifier = jar.get(VERIFIER_COOKIE).map(|c| c.value().to_string());
    let (Some(stored_state), Some(verifier)) = (stored_state, verifier) else {
        return Err(ServerError::Generic("invalid login attempt".to_string()));
    };
    if payload.code.is_empty() || payload.state != stored_state {
        return Err(ServerError::Generic("invalid login attempt".to_string()));
    }

    let claims = exchange_code(google, &payload.code, &verifier).await?;
    let user = upsert_federated_user(&state, claims).await?;

    let token = auth::generate_session_token(&state.auth.jwt_secret, &user)?;
    let view = auth::user_view(&user)?;

    let jar = jar
        .remove(Cookie::build((STATE_COOKIE, "")).path("/").build())
        .remove(Cookie::build((VERIFIER_COOKIE, "")).path("/").build())
        .add(auth::session_cookie(token));

    Ok((
        jar,
        Json(AuthResponse {
            message: "signed in".to_string(),
            user: view,
        }),
    ))
}

/// Trades the authorization code for tokens and decodes the identity
/// claims from the ID token payload. The token comes straight from the
/// provider over TLS, so the signature is not re-checked here.
async fn exchange_code(
    google: &GoogleSettings,
    code: &str,
    verifier: &str,
) -> Result<IdTokenClaims, ServerError> {
    let client = reqwest::Client::new();
    let response = client
        .post(TOKEN_ENDPOINT)
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", google.client_id.as_str()),
            ("client_secret", google.client_secret.as_str()),
            ("redirect_uri", google.redirect_uri.as_str()),
            ("code_verifier", verifier),
        ])
        .send()
        .await
        .map_err(|err| ServerError::Upstream(format!("identity provider unreachable: {err}")))?;

    if !response.status().is_success() {
        return Err(ServerError::Unauthorized(
            "invalid authorization code or credentials".to_string(),
        ));
    }

    let tokens: TokenResponse = response
        .json()
        .await
        .map_err(|err| ServerError::Upstream(format!("malformed token response: {err}")))?;

    decode_id_token(&tokens.id_token)
}

fn decode_id_token(id_token: &str) -> Result<IdTokenClaims, ServerError> {
    let payload = id_token
        .split('.')
        .nth(1)
        .ok_or_else(|| ServerError::Upstream("malformed id token".to_string()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|err| ServerError::Upstream(format!("malformed id token: {err}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|err| ServerError::Upstream(format!("malformed id token claims: {err}")))
}

/// Links the Google identity to an existing user by email, or creates a
/// fresh passwordless user.
async fn upsert_federated_user(
    state: &ServerState,
    claims: IdTokenClaims,
) -> Result<users::Model, ServerError> {
    if let Some(existing) = auth::find_by_email(state, &claims.email).await? {
        let mut active = existing.into_active_model();
        active.provider = Set(Some("google".to_string()));
        if let Some(picture) = claims.picture {
            active.profile_picture = Set(Some(picture));
        }
        active.updated_at = Set(Utc::now());
        return active
            .update(&state.db)
            .await
            .map_err(|err| ServerError::Internal(format!("user update failed: {err}")));
    }

    let now = Utc::now();
    users::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        username: Set(claims.name),
        email: Set(claims.email),
        password_hash: Set(None),
        profile_picture: Set(claims.picture),
        provider: Set(Some("google".to_string())),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await
    .map_err(|err| ServerError::Internal(format!("user insert failed: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_claims_from_id_token_payload() {
        let payload = serde_json::json!({
            "name": "Maria",
            "email": "maria@example.com",
            "picture": "https://example.com/p.png"
        });
        let encoded = URL_SAFE_NO_PAD.encode(payload.to_string());
        let token = format!("header.{encoded}.signature");

        let claims = decode_id_token(&token).ok().expect("claims decode");
        assert_eq!(claims.name, "Maria");
        assert_eq!(claims.email, "maria@example.com");
        assert_eq!(claims.picture.as_deref(), Some("https://example.com/p.png"));
    }

    #[test]
    fn rejects_token_without_payload_segment() {
        assert!(decode_id_token("not-a-jwt").is_err());
    }
}
