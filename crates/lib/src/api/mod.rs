//! HTTP API
//!
//! Routes are grouped by audience:
//!
//! - `/api/auth/*`: administrator login and kid password verification. Every
//!   response carries `Cache-Control: no-store`.
//! - `/api/learn/*`: the kid selector (public) and progress (kid session).
//! - `/api/admin/*`: family passwords and kid profiles (administrator session).
//! - `/health`: liveness and backend kind.
//!
//! Sessions travel in HttpOnly cookies, `ks_admin` and `ks_session`.

mod admin;
mod auth;
mod errors;
mod extract;
mod learn;

use std::{sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, header},
    middleware,
    response::Response,
    routing::{get, post},
};
use serde::Serialize;
use tower_cookies::{Cookie, CookieManagerLayer, cookie::SameSite};

pub use errors::ApiError;
pub use extract::{AdminAuth, KidAuth};

use crate::{
    Clock, Database,
    backend::DbKind,
    credential::{AdminGate, CredentialStore},
    kid::KidStore,
    progress::ProgressStore,
    session::SessionManager,
};

/// Cookie carrying the administrator session token.
pub const ADMIN_COOKIE: &str = "ks_admin";

/// Cookie carrying the kid session token.
pub const KID_COOKIE: &str = "ks_session";

/// Shared state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub credentials: CredentialStore,
    pub sessions: SessionManager,
    pub kids: KidStore,
    pub progress: ProgressStore,
    pub admin: Arc<AdminGate>,
    pub backend: DbKind,
}

impl AppState {
    pub fn new(db: Database, clock: Arc<dyn Clock>, admin: AdminGate) -> Self {
        Self {
            credentials: CredentialStore::new(db.clone(), clock.clone()),
            sessions: SessionManager::new(db.clone(), clock.clone()),
            kids: KidStore::new(db.clone(), clock.clone()),
            progress: ProgressStore::new(db.clone(), clock),
            admin: Arc::new(admin),
            backend: db.kind(),
        }
    }
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let auth = Router::new()
        .route("/admin/login", post(auth::admin_login))
        .route("/admin/logout", post(auth::admin_logout))
        .route("/admin/check", get(auth::admin_check))
        .route("/verify", post(auth::kid_verify))
        .route("/check", get(auth::kid_check))
        .route("/logout", post(auth::kid_logout))
        .layer(middleware::map_response(no_store));

    let learn = Router::new()
        .route("/kids", get(learn::list_kids))
        .route("/progress", get(learn::list_progress))
        .route(
            "/progress/{lesson_id}",
            get(learn::get_progress).post(learn::save_progress),
        );

    let admin = Router::new()
        .route(
            "/passwords",
            get(admin::list_passwords).post(admin::create_password),
        )
        .route(
            "/passwords/{id}",
            axum::routing::delete(admin::delete_password),
        )
        .route("/kids", get(admin::list_kids).post(admin::create_kid))
        .route(
            "/kids/{id}",
            get(admin::get_kid)
                .put(admin::update_kid)
                .delete(admin::delete_kid),
        );

    Router::new()
        .route("/health", get(health))
        .nest("/api/auth", auth)
        .nest("/api/learn", learn)
        .nest("/api/admin", admin)
        .layer(CookieManagerLayer::new())
        .with_state(state)
}

async fn no_store(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

/// A session cookie: HttpOnly, SameSite=Lax, Path=/, Max-Age of the session TTL.
pub(crate) fn session_cookie(name: &'static str, token: String, ttl: Duration) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, token);
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    cookie.set_max_age(time::Duration::seconds(ttl.as_secs() as i64));
    cookie
}

/// Overwrites a session cookie with an empty one that expires immediately.
pub(crate) fn cleared_cookie(name: &'static str) -> Cookie<'static> {
    session_cookie(name, String::new(), Duration::ZERO)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    backend: &'static str,
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        backend: state.backend.as_str(),
    })
}
