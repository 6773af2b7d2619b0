use async_trait::async_trait;
use serde::Deserialize;

use crate::config::GoogleOAuth;
use crate::integrations::{
    ExternalIdentity, IdentityProvider, IntegrationError, IntegrationResult, ensure_success,
};

pub const SERVICE: &str = "google";

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const SCOPES: &str = "openid email profile";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    name: Option<String>,
}

/// Google OAuth2 authorization-code client.
#[derive(Debug, Clone)]
pub struct GoogleIdentityProvider {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl GoogleIdentityProvider {
    pub fn new(http: reqwest::Client, config: &GoogleOAuth) -> Self {
        Self {
            http,
            client_id: config.client_id().to_string(),
            client_secret: config.client_secret().to_string(),
            redirect_uri: config.redirect_uri().to_string(),
        }
    }
}

fn payload_err(message: impl Into<String>) -> IntegrationError {
    IntegrationError::Payload {
        service: SERVICE,
        message: message.into(),
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    fn authorize_url(&self, state: &str) -> String {
        let query = [
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", SCOPES),
            ("state", state),
            ("prompt", "select_account"),
        ];
        match reqwest::Url::parse_with_params(AUTHORIZE_URL, &query) {
            Ok(url) => url.into(),
            Err(_) => AUTHORIZE_URL.to_string(),
        }
    }

    #[tracing::instrument(skip(self, code))]
    async fn exchange(&self, code: &str) -> IntegrationResult<ExternalIdentity> {
        let form = [
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];
        let resp = self
            .http
            .post(TOKEN_URL)
            .form(&form)
            .send()
            .await
            .map_err(|source| IntegrationError::Request {
                service: SERVICE,
                source,
            })?;
        let token: TokenResponse = ensure_success(SERVICE, resp)
            .await?
            .json()
            .await
            .map_err(|e| payload_err(e.to_string()))?;

        let resp = self
            .http
            .get(USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|source| IntegrationError::Request {
                service: SERVICE,
                source,
            })?;
        let info: UserInfo = ensure_success(SERVICE, resp)
            .await?
            .json()
            .await
            .map_err(|e| payload_err(e.to_string()))?;

        let email = info.email.ok_or_else(|| payload_err("missing e-mail"))?;
        if !info.email_verified {
            return Err(payload_err("e-mail not verified"));
        }
        let name = info.name.unwrap_or_else(|| email.clone());

        Ok(ExternalIdentity { email, name })
    }
}
