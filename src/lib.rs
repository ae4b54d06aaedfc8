pub mod auth;
pub mod config;
pub mod err;
pub mod guard;
pub mod models;
pub mod password;
pub mod provider;
pub mod provision;
pub mod routes;
pub mod session;
pub mod store;

use std::sync::Arc;

use anyhow::Context;
use axum::Json;
use serde::Serialize;

use crate::auth::AdminAuth;
use crate::config::Config;
use crate::err::{Error, Success};
use crate::password::Hasher;
use crate::provider::{IdentityProvider, UsersServiceClient};
use crate::provision::Provisioner;
use crate::session::SessionCodec;
use crate::store::Store;

pub type Payload<T> = Result<Json<Success<T>>, Error>;

pub fn proceeds<V>(value: V) -> Payload<V>
where
    V: Serialize,
{
    Ok(Json(Success::of(value)))
}

/// Everything handlers and guards share. No session state lives here.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub provider: Arc<dyn IdentityProvider>,
    pub admin: AdminAuth,
    pub students: Provisioner,
}

impl AppState {
    pub fn new(
        store: Store,
        provider: Arc<dyn IdentityProvider>,
        hasher: Hasher,
        codec: SessionCodec,
    ) -> Self {
        Self {
            admin: AdminAuth::new(store.clone(), hasher, codec),
            students: Provisioner::new(store.clone()),
            store,
            provider,
        }
    }

    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store = Store::connect(&config.database_url).await?;
        store.migrate().await?;

        let codec = match &config.session_secret {
            Some(secret) => SessionCodec::new(secret.as_bytes())?,
            None => {
                log::warn!(
                    "ADMIN_SESSION_SECRET is not set; admin sessions will not survive a restart"
                );
                SessionCodec::random()?
            }
        };
        let provider = UsersServiceClient::new(&config.users_service_url, &config.users_service_key)
            .context("could not set up the users service client")?;

        let state = Self::new(
            store,
            Arc::new(provider),
            Hasher::new(config.password_rounds),
            codec,
        );

        if let Some(email) = &config.seed_admin_email {
            state
                .admin
                .seed_admin(email, &config.seed_admin_name)
                .await
                .context("could not seed admin")?;
        }
        Ok(state)
    }
}
