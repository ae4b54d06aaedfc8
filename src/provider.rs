//! Client for the external users service that runs the Google OAuth flow and
//! owns student sessions.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use crate::models::ProviderUser;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL the browser is sent to in order to start the OAuth flow.
    async fn redirect_url(&self, provider: &str) -> anyhow::Result<String>;

    /// Trades an authorization code for a session token.
    async fn exchange_code(&self, code: &str) -> anyhow::Result<String>;

    /// `Ok(None)` when the provider does not recognise the token.
    async fn resolve_session(&self, token: &str) -> anyhow::Result<Option<ProviderUser>>;

    async fn delete_session(&self, token: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct UsersServiceClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct RedirectUrl {
    redirect_url: String,
}

#[derive(Deserialize)]
struct SessionToken {
    session_token: String,
}

impl UsersServiceClient {
    pub fn new(api_url: &str, api_key: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("portal-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("could not build users service client")?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }
}

#[async_trait]
impl IdentityProvider for UsersServiceClient {
    async fn redirect_url(&self, provider: &str) -> anyhow::Result<String> {
        let body: RedirectUrl = self
            .http
            .get(self.url(&format!("/oauth/{}/redirect_url", provider)))
            .header("x-api-key", &self.api_key)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("malformed redirect url response")?;
        Ok(body.redirect_url)
    }

    async fn exchange_code(&self, code: &str) -> anyhow::Result<String> {
        let body: SessionToken = self
            .http
            .post(self.url("/sessions"))
            .header("x-api-key", &self.api_key)
            .json(&json!({ "code": code }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("malformed session token response")?;
        Ok(body.session_token)
    }

    async fn resolve_session(&self, token: &str) -> anyhow::Result<Option<ProviderUser>> {
        let res = self
            .http
            .get(self.url("/users/me"))
            .header("x-api-key", &self.api_key)
            .bearer_auth(token)
            .send()
            .await?;
        if matches!(
            res.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
        ) {
            return Ok(None);
        }
        let user = res
            .error_for_status()?
            .json::<ProviderUser>()
            .await
            .context("malformed user response")?;
        Ok(Some(user))
    }

    async fn delete_session(&self, token: &str) -> anyhow::Result<()> {
        self.http
            .delete(self.url("/sessions"))
            .header("x-api-key", &self.api_key)
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// In-process provider: codes map to tokens, tokens map to users.
    #[derive(Default)]
    pub struct FakeProvider {
        codes: Mutex<HashMap<String, String>>,
        sessions: Mutex<HashMap<String, ProviderUser>>,
        pub fail: Mutex<bool>,
    }

    impl FakeProvider {
        pub fn with_session(self, token: &str, user: ProviderUser) -> Self {
            self.sessions.lock().unwrap().insert(token.to_string(), user);
            self
        }

        pub fn with_code(self, code: &str, token: &str) -> Self {
            self.codes
                .lock()
                .unwrap()
                .insert(code.to_string(), token.to_string());
            self
        }

        pub fn has_session(&self, token: &str) -> bool {
            self.sessions.lock().unwrap().contains_key(token)
        }

        fn check(&self) -> anyhow::Result<()> {
            if *self.fail.lock().unwrap() {
                anyhow::bail!("users service unavailable");
            }
            Ok(())
        }
    }

    pub fn user(id: &str, email: &str, name: &str) -> ProviderUser {
        serde_json::from_value(json!({
            "id": id,
            "email": email,
            "google_user_data": { "name": name, "given_name": name },
        }))
        .unwrap()
    }

    #[async_trait]
    impl IdentityProvider for FakeProvider {
        async fn redirect_url(&self, provider: &str) -> anyhow::Result<String> {
            self.check()?;
            Ok(format!("https://accounts.example.com/{provider}/authorize"))
        }

        async fn exchange_code(&self, code: &str) -> anyhow::Result<String> {
            self.check()?;
            self.codes
                .lock()
                .unwrap()
                .get(code)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("unknown code"))
        }

        async fn resolve_session(&self, token: &str) -> anyhow::Result<Option<ProviderUser>> {
            self.check()?;
            Ok(self.sessions.lock().unwrap().get(token).cloned())
        }

        async fn delete_session(&self, token: &str) -> anyhow::Result<()> {
            self.check()?;
            self.sessions.lock().unwrap().remove(token);
            Ok(())
        }
    }
}
