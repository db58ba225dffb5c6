// OAuth2 provider flows.
// Decision: One service object per provider, constructed once at startup
// Decision: Flows return Result; presentation of failures is the router's call

pub mod patreon;
pub mod youtube;

pub use patreon::PatreonService;
pub use youtube::YouTubeService;

use thiserror::Error;

/// Provider selector used by the callback route path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Patreon,
    YouTube,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Patreon => "patreon",
            Provider::YouTube => "youtube",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "patreon" => Some(Provider::Patreon),
            "youtube" => Some(Provider::YouTube),
            _ => None,
        }
    }
}

/// Failure of one step of a provider flow. Both variants end in the same
/// user-facing outcome; the split exists for the server-side logs.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The code-for-token exchange was rejected or unreachable.
    #[error("token exchange failed: {0:#}")]
    TokenExchange(anyhow::Error),
    /// The identity-confirming API call after the exchange failed.
    #[error("identity fetch failed: {0:#}")]
    Identity(anyhow::Error),
}
