// Session token codec and request extractor.
// Decision: HS256-signed cookie is the only session state (no database)
// Decision: Missing, invalid or expired tokens degrade to an anonymous session

use anyhow::{Context, Result};
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::SessionConfig;

/// Name of the cookie carrying the signed session token.
pub const SESSION_COOKIE: &str = "token";

/// Credentials stored after a Patreon login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatreonAuth {
    pub access_token: String,
}

/// Credentials stored after a YouTube login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTubeAuth {
    pub access_token: String,
    pub channel_id: String,
}

/// Decoded payload of the session cookie. A new session fully replaces the
/// old one on each successful login; provider fragments are not merged
/// across logins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Display name from whichever provider authenticated last
    #[serde(default)]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patreon: Option<PatreonAuth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube: Option<YouTubeAuth>,
}

impl Session {
    /// Session observed by requests without a valid token.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A session without provider credentials is a logged-out session.
    pub fn is_authenticated(&self) -> bool {
        self.patreon.is_some() || self.youtube.is_some()
    }
}

/// Signed wire format: the session plus its expiry window.
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    #[serde(flatten)]
    session: Session,
    /// Expiration time (Unix timestamp)
    exp: i64,
    /// Issued at (Unix timestamp)
    iat: i64,
}

/// Issues and verifies the signed session cookie.
pub struct SessionTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
    secure_cookies: bool,
}

impl SessionTokenService {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            lifetime: config.lifetime,
            secure_cookies: config.secure_cookies,
        }
    }

    /// Sign a session and wrap it in the response cookie.
    pub fn issue(&self, session: &Session) -> Result<Cookie<'static>> {
        let now = Utc::now();
        let exp = now + chrono::Duration::from_std(self.lifetime)?;

        let claims = SessionClaims {
            session: session.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .context("Failed to encode session token")?;

        let max_age =
            time::Duration::try_from(self.lifetime).context("Session lifetime out of range")?;

        Ok(Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .secure(self.secure_cookies)
            .same_site(SameSite::Lax)
            .max_age(max_age)
            .build())
    }

    /// Decode and validate a raw cookie value.
    pub fn verify(&self, token: &str) -> Result<Session> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        // Zero leeway: a token issued as already expired must never verify.
        validation.leeway = 0;

        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .context("Invalid session token")?;

        Ok(data.claims.session)
    }

    /// Overwrite the session cookie with one that is expired on arrival.
    /// Logout is the only revocation mechanism; there is no server-side
    /// blacklist.
    pub fn clear_cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, ""))
            .path("/")
            .http_only(true)
            .secure(self.secure_cookies)
            .same_site(SameSite::Lax)
            .expires(time::OffsetDateTime::now_utc())
            .build()
    }
}

/// Extractor for the request's session. Never rejects: a missing, invalid
/// or expired cookie yields the anonymous session so logged-out users still
/// reach every page.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
    Arc<SessionTokenService>: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let service = Arc::<SessionTokenService>::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);

        let session = jar
            .get(SESSION_COOKIE)
            .and_then(|cookie| match service.verify(cookie.value()) {
                Ok(session) => Some(session),
                Err(e) => {
                    tracing::debug!("Session verification failed: {:#}", e);
                    None
                }
            })
            .unwrap_or_else(Session::anonymous);

        Ok(CurrentSession(session))
    }
}
