// HTTP surface: profile page, login page, OAuth callbacks, logout.
// Decision: Every failure path degrades to the app root as if logged out;
// there is no user-visible error page.

use axum::{
    extract::{FromRef, Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::pages;
use crate::providers::{PatreonService, Provider, YouTubeService};
use crate::session::{CurrentSession, SessionTokenService};

/// Shared state constructed once at startup and treated as immutable for
/// the process lifetime.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub session: Arc<SessionTokenService>,
    pub patreon: Arc<PatreonService>,
    pub youtube: Arc<YouTubeService>,
}

/// Random `state` value attached to authorization URLs (32 hex characters)
fn generate_oauth_state() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 16] = rng.gen();
    hex::encode(bytes)
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/login", get(login))
        .route("/oauth/redirect/:provider", get(oauth_redirect))
        .route("/logout", get(logout))
        .route("/health", get(health))
        .with_state(state)
}

/// GET / - profile page. Re-queries the provider's identity endpoint with
/// the stored access token for display; anonymous sessions get the
/// logged-out page. A failed refresh (e.g. a token revoked upstream) lands
/// back on `/`, which will try again.
async fn home(State(state): State<AppState>, CurrentSession(session): CurrentSession) -> Response {
    if !session.is_authenticated() {
        return Html(pages::home_anonymous()).into_response();
    }

    if let Some(patreon) = &session.patreon {
        return match state.patreon.fetch_identity(&patreon.access_token).await {
            Ok(identity) => Html(pages::home_patreon(&session, &identity)).into_response(),
            Err(e) => {
                tracing::error!("Patreon profile refresh failed: {}", e);
                Redirect::to("/").into_response()
            }
        };
    }

    if let Some(youtube) = &session.youtube {
        return match state.youtube.fetch_channel(&youtube.access_token).await {
            Ok(channel) => Html(pages::home_youtube(&session, &channel)).into_response(),
            Err(e) => {
                tracing::error!("YouTube profile refresh failed: {}", e);
                Redirect::to("/").into_response()
            }
        };
    }

    Html(pages::home_anonymous()).into_response()
}

/// GET /login - renders both providers' consent links.
async fn login(State(state): State<AppState>) -> Html<String> {
    let patreon_url = state.patreon.authorization_url(&generate_oauth_state());
    let youtube_url = state.youtube.authorization_url(&generate_oauth_state());
    Html(pages::login(&patreon_url, &youtube_url))
}

/// Query parameters of an OAuth callback
#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: String,
    #[allow(dead_code)]
    state: Option<String>,
}

/// GET /oauth/redirect/:provider - authorization-code callback. On success
/// the session cookie is issued; any failure leaves the cookie untouched
/// and lands back on the app root.
async fn oauth_redirect(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    let provider = match Provider::from_str(&provider) {
        Some(p) => p,
        None => {
            tracing::warn!("OAuth callback for unknown provider: {}", provider);
            return (jar, Redirect::to("/"));
        }
    };

    let authenticated = match provider {
        Provider::Patreon => state.patreon.authenticate(&query.code).await,
        Provider::YouTube => state.youtube.authenticate(&query.code).await,
    };

    let session = match authenticated {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("{} authentication failed: {}", provider.as_str(), e);
            return (jar, Redirect::to("/"));
        }
    };

    match state.session.issue(&session) {
        Ok(cookie) => (jar.add(cookie), Redirect::to("/")),
        Err(e) => {
            tracing::error!("Failed to issue session token: {:#}", e);
            (jar, Redirect::to("/"))
        }
    }
}

/// GET /logout - overwrite the session cookie with an expired one.
async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    (jar.add(state.session.clear_cookie()), Redirect::to("/"))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
