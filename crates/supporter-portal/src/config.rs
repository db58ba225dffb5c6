// Environment-driven configuration.
// Decision: Required OAuth credentials fail at boot, everything else defaults
// Decision: Default to development mode; production is opt-in via APP_ENV

use anyhow::{Context, Result};
use rand::Rng;
use std::time::Duration;

const PATREON_AUTHORIZE_URL: &str = "https://www.patreon.com/oauth2/authorize";
const PATREON_TOKEN_URL: &str = "https://www.patreon.com/api/oauth2/token";
const PATREON_API_BASE_URL: &str = "https://www.patreon.com/api/oauth2/api";

const YOUTUBE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const YOUTUBE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const YOUTUBE_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Deployment environment. Selects the `Secure` attribute on the session
/// cookie and whether a signing secret may be generated on the fly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

/// OAuth client credentials plus endpoint URLs for one provider.
/// Endpoints carry production defaults; tests point them at a local server.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    pub authorize_url: String,
    pub token_url: String,
    pub api_base_url: String,
}

/// Session token configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Secret key for signing session tokens
    pub secret: String,
    /// How long an issued session stays valid
    pub lifetime: Duration,
    /// Whether the cookie carries the `Secure` attribute
    pub secure_cookies: bool,
}

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub port: u16,
    pub session: SessionConfig,
    pub patreon: ProviderConfig,
    pub youtube: ProviderConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let environment = std::env::var("APP_ENV")
            .map(|s| Environment::from_str(&s))
            .unwrap_or_default();

        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5000);

        let secret = match std::env::var("SESSION_SECRET") {
            Ok(s) if !s.is_empty() => s,
            _ => {
                if environment.is_production() {
                    anyhow::bail!("SESSION_SECRET environment variable required in production");
                }
                tracing::warn!("SESSION_SECRET not set, generating a random development secret");
                let bytes: [u8; 32] = rand::thread_rng().gen();
                hex::encode(bytes)
            }
        };

        let lifetime = std::env::var("SESSION_MAX_AGE")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(30 * 24 * 60 * 60));

        let session = SessionConfig {
            secret,
            lifetime,
            secure_cookies: environment.is_production(),
        };

        let patreon = ProviderConfig {
            client_id: std::env::var("PATREON_CLIENT_ID")
                .context("PATREON_CLIENT_ID environment variable required")?,
            client_secret: std::env::var("PATREON_CLIENT_SECRET")
                .context("PATREON_CLIENT_SECRET environment variable required")?,
            redirect_url: std::env::var("PATREON_REDIRECT_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}/oauth/redirect/patreon", port)),
            authorize_url: PATREON_AUTHORIZE_URL.to_string(),
            token_url: PATREON_TOKEN_URL.to_string(),
            api_base_url: PATREON_API_BASE_URL.to_string(),
        };

        let youtube = ProviderConfig {
            client_id: std::env::var("GOOGLE_CLIENT_ID")
                .context("GOOGLE_CLIENT_ID environment variable required")?,
            client_secret: std::env::var("GOOGLE_CLIENT_SECRET")
                .context("GOOGLE_CLIENT_SECRET environment variable required")?,
            redirect_url: std::env::var("GOOGLE_REDIRECT_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}/oauth/redirect/youtube", port)),
            authorize_url: YOUTUBE_AUTHORIZE_URL.to_string(),
            token_url: YOUTUBE_TOKEN_URL.to_string(),
            api_base_url: YOUTUBE_API_BASE_URL.to_string(),
        };

        Ok(Self {
            environment,
            port,
            session,
            patreon,
            youtube,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!(Environment::from_str("production"), Environment::Production);
        assert_eq!(Environment::from_str("PRODUCTION"), Environment::Production);
        assert_eq!(Environment::from_str("prod"), Environment::Production);
        assert_eq!(Environment::from_str("development"), Environment::Development);
        assert_eq!(Environment::from_str("staging"), Environment::Development);
        assert_eq!(Environment::from_str(""), Environment::Development);
    }

    #[test]
    fn test_environment_default() {
        assert_eq!(Environment::default(), Environment::Development);
        assert!(!Environment::default().is_production());
        assert!(Environment::Production.is_production());
    }
}
