use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument};

pub const USERNAME_ENV: &str = "CDSE_USERNAME";
pub const PASSWORD_ENV: &str = "CDSE_PASSWORD";

/// Partially known username/password, from one configuration source.
#[derive(Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct CredentialOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl fmt::Debug for CredentialOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialOverrides")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl CredentialOverrides {
    pub fn new(username: Option<String>, password: Option<String>) -> Self {
        Self {
            username: username.filter(|s| !s.is_empty()),
            password: password.filter(|s| !s.is_empty()),
        }
    }

    pub fn from_env() -> Self {
        Self::new(
            std::env::var(USERNAME_ENV).ok(),
            std::env::var(PASSWORD_ENV).ok(),
        )
    }

    /// Field-wise precedence: values present in `self` win over `fallback`.
    pub fn or(self, fallback: Self) -> Self {
        let fallback = Self::new(fallback.username, fallback.password);
        let own = Self::new(self.username, self.password);
        Self {
            username: own.username.or(fallback.username),
            password: own.password.or(fallback.password),
        }
    }

    /// CLI flags over the `CDSE_*` environment variables over the settings
    /// file, field by field.
    pub fn from_sources(cli: Self, settings_file: Self) -> Self {
        Self::layered(cli, Self::from_env(), settings_file)
    }

    pub fn layered(cli: Self, env: Self, settings_file: Self) -> Self {
        cli.or(env).or(settings_file)
    }

    pub fn resolve(self) -> Result<Credentials> {
        match Self::new(self.username, self.password) {
            Self {
                username: Some(username),
                password: Some(password),
            } => Ok(Credentials { username, password }),
            _ => Err(Error::MissingCredentials),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Opaque bearer token. Expiry is enforced by the server and only noticed
/// when a request is rejected.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

pub trait TokenIssuer {
    async fn issue_token(&self) -> Result<AccessToken>;
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Password-grant token exchange against the CDSE identity service.
pub struct CredentialManager {
    client: reqwest::Client,
    identity_url: String,
    client_id: String,
    credentials: Credentials,
}

impl CredentialManager {
    pub fn new(
        client: reqwest::Client,
        identity_url: &str,
        client_id: &str,
        credentials: Credentials,
    ) -> Self {
        Self {
            client,
            identity_url: identity_url.to_string(),
            client_id: client_id.to_string(),
            credentials,
        }
    }
}

impl TokenIssuer for CredentialManager {
    #[instrument(skip(self), fields(username = %self.credentials.username))]
    async fn issue_token(&self) -> Result<AccessToken> {
        let form = [
            ("client_id", self.client_id.as_str()),
            ("grant_type", "password"),
            ("username", self.credentials.username.as_str()),
            ("password", self.credentials.password.as_str()),
        ];
        let response = self
            .client
            .post(&self.identity_url)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                status: status.as_u16(),
                body,
            });
        }

        let token = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| Error::from_body(&self.identity_url, e))?;
        debug!("Access token issued");
        Ok(AccessToken::new(token.access_token))
    }
}
