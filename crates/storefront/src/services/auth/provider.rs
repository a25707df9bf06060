//! OAuth 2.0 authorization-code client for the hosted identity provider.
//!
//! # Flow
//!
//! 1. Redirect the customer to `authorization_url()`
//! 2. The provider redirects back to `/auth/callback` with a code
//! 3. Exchange the code for an access token with `exchange_code()`
//! 4. Resolve the customer with `fetch_identity()`

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use rwaya_core::{CustomerId, Email};

use super::AuthError;
use crate::config::AuthConfig;
use crate::models::CustomerIdentity;

/// Token endpoint response.
#[derive(Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Userinfo endpoint response.
#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    #[serde(default)]
    email: Option<String>,
}

/// Client for the identity provider.
#[derive(Clone)]
pub struct SignInProvider {
    inner: Arc<SignInProviderInner>,
}

struct SignInProviderInner {
    client: reqwest::Client,
    client_id: String,
    client_secret: SecretString,
    authorize_url: Url,
    token_url: String,
    userinfo_url: String,
}

impl SignInProvider {
    /// Create a provider client.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidUrl`] if the authorize URL does not parse.
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        Ok(Self {
            inner: Arc::new(SignInProviderInner {
                client: reqwest::Client::new(),
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
                authorize_url: Url::parse(&config.authorize_url)?,
                token_url: config.token_url.clone(),
                userinfo_url: config.userinfo_url.clone(),
            }),
        })
    }

    /// Build the authorization URL the customer is redirected to.
    ///
    /// # Arguments
    ///
    /// * `redirect_uri` - The callback URL registered with the provider
    /// * `state` - A random string stored in the session to prevent CSRF
    #[must_use]
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> String {
        let mut url = self.inner.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.inner.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("scope", "openid email")
            .append_pair("state", state);
        url.into()
    }

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the provider rejects the code.
    #[instrument(skip(self, code))]
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, AuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.inner.client_id.as_str()),
            ("client_secret", self.inner.client_secret.expose_secret()),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];

        let response = self
            .inner
            .client
            .post(&self.inner.token_url)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AuthError::Provider(format!(
                "token exchange failed ({status}): {text}"
            )));
        }

        Ok(response.json().await?)
    }

    /// Resolve the signed-in customer.
    ///
    /// An email the provider returns that does not look like an address is
    /// treated as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the provider rejects the token.
    #[instrument(skip(self, access_token))]
    pub async fn fetch_identity(&self, access_token: &str) -> Result<CustomerIdentity, AuthError> {
        let response = self
            .inner
            .client
            .get(&self.inner.userinfo_url)
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AuthError::Provider(format!(
                "userinfo request failed ({})",
                response.status()
            )));
        }

        let info: UserInfo = response.json().await?;

        Ok(CustomerIdentity {
            id: CustomerId::new(info.sub),
            email: info.email.as_deref().and_then(|e| Email::parse(e).ok()),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn provider() -> SignInProvider {
        SignInProvider::new(&AuthConfig {
            client_id: "rwaya-web".to_string(),
            client_secret: SecretString::from("kq8Zr2vN5xT1mW7p"),
            authorize_url: "https://id.example.com/oauth/authorize".to_string(),
            token_url: "https://id.example.com/oauth/token".to_string(),
            userinfo_url: "https://id.example.com/oauth/userinfo".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_authorization_url_encodes_parameters() {
        let url = provider().authorization_url("http://localhost:3000/auth/callback", "st4te");
        let parsed = Url::parse(&url).unwrap();
        let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();

        assert_eq!(parsed.path(), "/oauth/authorize");
        assert!(pairs.contains(&("client_id".into(), "rwaya-web".into())));
        assert!(pairs.contains(&("response_type".into(), "code".into())));
        assert!(pairs.contains(&(
            "redirect_uri".into(),
            "http://localhost:3000/auth/callback".into()
        )));
        assert!(pairs.contains(&("scope".into(), "openid email".into())));
        assert!(pairs.contains(&("state".into(), "st4te".into())));
    }

    #[test]
    fn test_new_rejects_bad_authorize_url() {
        let result = SignInProvider::new(&AuthConfig {
            client_id: "rwaya-web".to_string(),
            client_secret: SecretString::from("kq8Zr2vN5xT1mW7p"),
            authorize_url: "not a url".to_string(),
            token_url: String::new(),
            userinfo_url: String::new(),
        });
        assert!(matches!(result, Err(AuthError::InvalidUrl(_))));
    }

    #[test]
    fn test_token_response_debug_redacts_token() {
        let token = TokenResponse {
            access_token: "at_very_secret".to_string(),
            token_type: Some("Bearer".to_string()),
            expires_in: Some(3600),
        };
        let debug = format!("{token:?}");
        assert!(!debug.contains("at_very_secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
