// YouTube (Google) authorization-code flow and channel lookup.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::ProviderError;
use crate::config::ProviderConfig;
use crate::session::{Session, YouTubeAuth};

const SCOPE: &str = "https://www.googleapis.com/auth/youtube";

/// The caller's own channel, fetched with `mine=true`.
#[derive(Debug, Clone)]
pub struct ChannelIdentity {
    pub channel_id: String,
    pub title: String,
    /// Raw channel resource, shown on the profile page.
    pub raw: Value,
}

/// YouTube OAuth service
pub struct YouTubeService {
    config: ProviderConfig,
    authorize_url: Url,
    http: reqwest::Client,
}

impl YouTubeService {
    pub fn new(config: ProviderConfig, http: reqwest::Client) -> Result<Self> {
        let authorize_url =
            Url::parse(&config.authorize_url).context("Invalid YouTube authorize URL")?;
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
            .append_pair("access_type", "online")
            .append_pair("state", state);
        url.to_string()
    }

    /// Run the flow end to end: exchange the code, look up the caller's
    /// channel, build the session.
    pub async fn authenticate(&self, code: &str) -> Result<Session, ProviderError> {
        let access_token = self
            .exchange_code(code)
            .await
            .map_err(ProviderError::TokenExchange)?;

        let channel = self.fetch_channel(&access_token).await?;

        Ok(Session {
            name: channel.title,
            patreon: None,
            youtube: Some(YouTubeAuth {
                access_token,
                channel_id: channel.channel_id,
            }),
        })
    }

    /// Channel lookup, also used by the profile page to refresh display
    /// data from an already stored token.
    pub async fn fetch_channel(&self, access_token: &str) -> Result<ChannelIdentity, ProviderError> {
        self.own_channel(access_token)
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

    async fn own_channel(&self, access_token: &str) -> Result<ChannelIdentity> {
        let url = format!("{}/channels", self.config.api_base_url);
        let response: ChannelListResponse = self
            .http
            .get(&url)
            .query(&[("part", "snippet"), ("mine", "true")])
            .bearer_auth(access_token)
            .send()
            .await
            .context("Failed to reach channels endpoint")?
            .error_for_status()
            .context("Channels request rejected")?
            .json()
            .await
            .context("Failed to parse channels response")?;

        let raw = response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Account has no YouTube channel"))?;

        let channel: ChannelResource =
            serde_json::from_value(raw.clone()).context("Unexpected channel resource shape")?;

        Ok(ChannelIdentity {
            channel_id: channel.id,
            title: channel.snippet.title,
            raw,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ChannelResource {
    id: String,
    snippet: ChannelSnippet,
}

#[derive(Debug, Deserialize)]
struct ChannelSnippet {
    title: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{bearer_token, body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base: &str) -> ProviderConfig {
        ProviderConfig {
            client_id: "google-client".to_string(),
            client_secret: "google-secret".to_string(),
            redirect_url: "http://localhost:5000/oauth/redirect/youtube".to_string(),
            authorize_url: format!("{}/o/oauth2/v2/auth", base),
            token_url: format!("{}/token", base),
            api_base_url: format!("{}/youtube/v3", base),
        }
    }

    fn test_service(base: &str) -> YouTubeService {
        YouTubeService::new(test_config(base), reqwest::Client::new()).unwrap()
    }

    #[test]
    fn test_authorization_url() {
        let service = test_service("https://accounts.google.com");
        let url = service.authorization_url("xyz789");

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=google-client"));
        assert!(url.contains("access_type=online"));
        assert!(url.contains("state=xyz789"));
        assert!(url.contains("scope=https%3A%2F%2Fwww.googleapis.com%2Fauth%2Fyoutube"));
    }

    #[tokio::test]
    async fn test_authenticate_builds_session() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=good-code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "T2",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/youtube/v3/channels"))
            .and(query_param("part", "snippet"))
            .and(query_param("mine", "true"))
            .and(bearer_token("T2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {
                        "id": "C1",
                        "snippet": { "title": "Bob's Channel" }
                    }
                ]
            })))
            .mount(&server)
            .await;

        let service = test_service(&server.uri());
        let session = service.authenticate("good-code").await.unwrap();

        assert_eq!(
            session,
            Session {
                name: "Bob's Channel".to_string(),
                patreon: None,
                youtube: Some(YouTubeAuth {
                    access_token: "T2".to_string(),
                    channel_id: "C1".to_string(),
                }),
            }
        );
    }

    #[tokio::test]
    async fn test_authenticate_failed_exchange() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let service = test_service(&server.uri());
        let err = service.authenticate("bad-code").await.unwrap_err();

        assert!(matches!(err, ProviderError::TokenExchange(_)));
    }

    #[tokio::test]
    async fn test_account_without_channel_is_identity_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "T2"
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/youtube/v3/channels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
            .mount(&server)
            .await;

        let service = test_service(&server.uri());
        let err = service.authenticate("good-code").await.unwrap_err();

        assert!(matches!(err, ProviderError::Identity(_)));
    }

    #[tokio::test]
    async fn test_fetch_channel_keeps_raw_resource() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/youtube/v3/channels"))
            .and(bearer_token("stored-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {
                        "id": "C1",
                        "snippet": { "title": "Bob's Channel", "description": "videos" }
                    }
                ]
            })))
            .mount(&server)
            .await;

        let service = test_service(&server.uri());
        let channel = service.fetch_channel("stored-token").await.unwrap();

        assert_eq!(channel.channel_id, "C1");
        assert_eq!(channel.title, "Bob's Channel");
        assert_eq!(channel.raw["snippet"]["description"], "videos");
    }
}
