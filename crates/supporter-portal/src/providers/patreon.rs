// Patreon authorization-code flow and identity lookup.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::ProviderError;
use crate::config::ProviderConfig;
use crate::session::{PatreonAuth, Session};

const SCOPE: &str = "identity[email]";
const USER_FIELDS: &str = "full_name,email,image_url,about";
const MEMBER_FIELDS: &str =
    "patron_status,last_charge_status,last_charge_date,pledge_relationship_start";

/// Display identity fetched from the current-user endpoint.
#[derive(Debug, Clone)]
pub struct PatreonIdentity {
    pub full_name: String,
    /// Full current-user document, shown on the profile page.
    pub raw: Value,
}

/// Patreon OAuth service
pub struct PatreonService {
    config: ProviderConfig,
    authorize_url: Url,
    http: reqwest::Client,
}

impl PatreonService {
    pub fn new(config: ProviderConfig, http: reqwest::Client) -> Result<Self> {
        let authorize_url =
            Url::parse(&config.authorize_url).context("Invalid Patreon authorize URL")?;
        Ok(Self {
            config,
            authorize_url,
            http,
        })
    }

    /// Consent-page URL the login page links to.
    pub fn authorization_url(&self, state: &str) -> String {
        let mut url = self.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_url)
            .append_pair("scope", SCOPE)
            .append_pair("state", state);
        url.to_string()
    }

    /// Run the flow end to end: exchange the code, confirm the identity,
    /// build the session. On failure nothing is observable to the caller
    /// beyond the error itself.
    pub async fn authenticate(&self, code: &str) -> Result<Session, ProviderError> {
        let access_token = self
            .exchange_code(code)
            .await
            .map_err(ProviderError::TokenExchange)?;

        let identity = self.fetch_identity(&access_token).await?;

        Ok(Session {
            name: identity.full_name,
            patreon: Some(PatreonAuth { access_token }),
            youtube: None,
        })
    }

    /// Identity-confirming call, also used by the profile page to refresh
    /// display data from an already stored token.
    pub async fn fetch_identity(&self, access_token: &str) -> Result<PatreonIdentity, ProviderError> {
        self.current_user(access_token)
            .await
            .map_err(ProviderError::Identity)
    }

    async fn exchange_code(&self, code: &str) -> Result<String> {
        let response: TokenResponse = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("code", code),
                ("grant_type", "authorization_code"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
            ])
            .send()
            .await
            .context("Failed to reach token endpoint")?
            .error_for_status()
            .context("Token endpoint rejected the exchange")?
            .json()
            .await
            .context("Failed to parse token response")?;

        Ok(response.access_token)
    }

    async fn current_user(&self, access_token: &str) -> Result<PatreonIdentity> {
        let url = format!("{}/current_user", self.config.api_base_url);
        let document: Value = self
            .http
            .get(&url)
            .query(&[
                ("include", "memberships"),
                ("fields[user]", USER_FIELDS),
                ("fields[member]", MEMBER_FIELDS),
            ])
            .bearer_auth(access_token)
            .send()
            .await
            .context("Failed to reach current-user endpoint")?
            .error_for_status()
            .context("Current-user request rejected")?
            .json()
            .await
            .context("Failed to parse current-user response")?;

        let parsed: CurrentUserDocument = serde_json::from_value(document.clone())
            .context("Unexpected current-user document shape")?;

        Ok(PatreonIdentity {
            full_name: parsed.data.attributes.full_name,
            raw: document,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

// JSON:API document returned by /current_user.
#[derive(Debug, Deserialize)]
struct CurrentUserDocument {
    data: UserResource,
}

#[derive(Debug, Deserialize)]
struct UserResource {
    attributes: UserAttributes,
}

#[derive(Debug, Deserialize)]
struct UserAttributes {
    full_name: String,
}
