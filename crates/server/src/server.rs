use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use sea_orm::{DatabaseConnection, EntityTrait};

use std::sync::Arc;

use crate::{accounts, auth, oauth, transactions};
use ledger::Ledger;

/// Google OAuth client registration. Absent in deployments that only use
/// password sign-in.
#[derive(Clone, Debug)]
pub struct GoogleSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Clone, Debug)]
pub struct AuthSettings {
    /// HMAC secret for signing session tokens.
    pub jwt_secret: String,
    pub google: Option<GoogleSettings>,
}

#[derive(Clone)]
pub struct ServerState {
    pub ledger: Arc<Ledger>,
    pub db: DatabaseConnection,
    pub auth: Arc<AuthSettings>,
}

/// Resolves the session cookie to a user and stores it as a request
/// extension. Requests without a valid session are rejected before any
/// handler runs.
async fn session_auth(
    jar: CookieJar,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = jar
        .get(auth::SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let claims =
        auth::verify_session_token(&state.auth.jwt_secret, &token).map_err(|err| {
            tracing::debug!("session token rejected: {err}");
            StatusCode::UNAUTHORIZED
        })?;

    let user = ledger::users::Entity::find_by_id(claims.sub)
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    let api = Router::new()
        .route(
            "/accounts",
            post(accounts::create).get(accounts::list),
        )
        .route(
            "/accounts/{id}",
            get(accounts::get)
                .put(accounts::update)
                .delete(accounts::delete),
        )
        .route(
            "/transactions",
            post(transactions::create).get(transactions::list),
        )
        .route(
            "/transactions/{id}",
            get(transactions::get)
                .put(transactions::update)
                .delete(transactions::delete),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session_auth,
        ));

    Router::new()
        .route("/", get(|| async { "fino is running" }))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/signin", post(auth::signin))
        .route("/auth/signout", post(auth::signout))
        .route("/auth/google", get(oauth::google_login))
        .route("/auth/google/callback", post(oauth::google_callback))
        .nest("/api", api)
        .with_state(state)
}

pub async fn run(ledger: Ledger, db: DatabaseConnection, auth: AuthSettings, bind: &str) {
    let listener = match tokio::net::TcpListener::bind(bind).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(ledger, db, auth, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    ledger: Ledger,
    db: DatabaseConnection,
    auth: AuthSettings,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        ledger: Arc::new(ledger),
        db,
        auth: Arc::new(auth),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    ledger: Ledger,
    db: DatabaseConnection,
    auth: AuthSettings,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(ledger, db, auth, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{Request as HttpRequest, header};
    use http_body_util::BodyExt;
    use migration::MigratorTrait;
    use sea_orm::Database;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn test_router() -> Router {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("in-memory database");
        migration::Migrator::up(&db, None).await.expect("migrations");

        let ledger = Ledger::builder().database(db.clone()).build();
        router(ServerState {
            ledger: Arc::new(ledger),
            db,
            auth: Arc::new(AuthSettings {
                jwt_secret: "test-secret".to_string(),
                google: None,
            }),
        })
    }

    fn json_request(method: &str, uri: &str, body: Value) -> HttpRequest<Body> {
        HttpRequest::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn signup_session(router: &Router) -> String {
        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/auth/signup",
                json!({
                    "username": "maria",
                    "email": "maria@example.com",
                    "password": "hunter2hunter2"
                }),
            ))
            .await
            .expect("signup response");
        assert_eq!(response.status(), StatusCode::OK);

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("session cookie")
            .to_str()
            .expect("cookie string");
        set_cookie
            .split(';')
            .next()
            .expect("cookie pair")
            .to_string()
    }

    #[tokio::test]
    async fn api_rejects_requests_without_session() {
        let router = test_router().await;

        let response = router
            .oneshot(
                HttpRequest::builder()
                    .uri("/api/accounts")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn signup_then_create_account() {
        let router = test_router().await;
        let cookie = signup_session(&router).await;

        let mut request = json_request(
            "POST",
            "/api/accounts",
            json!({"name": "Checking", "type": "Bank", "balance_minor": 1500}),
        );
        request
            .headers_mut()
            .insert(header::COOKIE, cookie.parse().expect("cookie header"));

        let response = router.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let account: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(account["name"], "Checking");
        assert_eq!(account["type"], "Bank");
        assert_eq!(account["balance_minor"], 1500);
    }

    #[tokio::test]
    async fn create_transaction_end_to_end() {
        let router = test_router().await;
        let cookie = signup_session(&router).await;

        let mut request = json_request(
            "POST",
            "/api/accounts",
            json!({"name": "Checking", "type": "Bank"}),
        );
        request
            .headers_mut()
            .insert(header::COOKIE, cookie.parse().expect("cookie header"));
        let response = router.clone().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let account: Value = serde_json::from_slice(&body).expect("json");
        let account_id = account["id"].as_str().expect("account id").to_string();

        let mut request = json_request(
            "POST",
            "/api/transactions",
            json!({
                "date": "2026-08-20T12:00:00Z",
                "amount_minor": 1000,
                "type": "income",
                "category": "salary",
                "account_id": account_id
            }),
        );
        request
            .headers_mut()
            .insert(header::COOKIE, cookie.parse().expect("cookie header"));
        let response = router.clone().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);

        let mut request = HttpRequest::builder()
            .uri(format!("/api/accounts/{account_id}"))
            .body(Body::empty())
            .expect("request");
        request
            .headers_mut()
            .insert(header::COOKIE, cookie.parse().expect("cookie header"));
        let response = router.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let account: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(account["balance_minor"], 1000);
    }

    #[tokio::test]
    async fn duplicate_signup_conflicts() {
        let router = test_router().await;
        signup_session(&router).await;

        let response = router
            .oneshot(json_request(
                "POST",
                "/auth/signup",
                json!({
                    "username": "maria2",
                    "email": "maria@example.com",
                    "password": "hunter2hunter2"
                }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn signin_with_wrong_password_is_unauthorized() {
        let router = test_router().await;
        signup_session(&router).await;

        let response = router
            .oneshot(json_request(
                "POST",
                "/auth/signin",
                json!({"email": "maria@example.com", "password": "wrong-password"}),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn google_login_unconfigured_is_unavailable() {
        let router = test_router().await;

        let response = router
            .oneshot(
                HttpRequest::builder()
                    .uri("/auth/google")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
