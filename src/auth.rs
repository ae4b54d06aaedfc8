use serde::Serialize;

use crate::err::Error;
use crate::password::Hasher;
use crate::session::{AdminClaims, SessionCodec};
use crate::store::Store;

/// Password seeded admins start with. Logging in with it forces a rotation.
pub const DEFAULT_ADMIN_PASSWORD: &str = "password";
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSummary {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub requires_password_change: bool,
}

#[derive(Debug, Clone)]
pub struct LoggedInAdmin {
    pub admin: AdminSummary,
    /// Value for the admin session cookie.
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct AdminAuth {
    store: Store,
    hasher: Hasher,
    codec: SessionCodec,
}

impl AdminAuth {
    pub fn new(store: Store, hasher: Hasher, codec: SessionCodec) -> Self {
        Self {
            store,
            hasher,
            codec,
        }
    }

    pub fn codec(&self) -> &SessionCodec {
        &self.codec
    }

    /// Unknown email, non-admin row and wrong password all fail the same way.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoggedInAdmin, Error> {
        let admin = match self.store.find_admin_by_email(email).await? {
            Some(admin) => admin,
            None => {
                log::info!("Rejected admin login for {}", email);
                return Err(Error::InvalidCredentials);
            }
        };
        if !self.hasher.verify(password, &admin.password_hash).await? {
            log::info!("Rejected admin login for {}", email);
            return Err(Error::InvalidCredentials);
        }

        let token = self.codec.encode(&AdminClaims::new(admin.id, &admin.email))?;
        let requires_password_change = self
            .hasher
            .verify(DEFAULT_ADMIN_PASSWORD, &admin.password_hash)
            .await?;
        if requires_password_change {
            log::warn!("Admin {} is still using the default password", admin.email);
        }
        log::info!("Admin {} logged in", admin.email);

        Ok(LoggedInAdmin {
            admin: AdminSummary {
                id: admin.id,
                email: admin.email,
                name: admin.name,
                requires_password_change,
            },
            token,
        })
    }

    /// The caller's session stays valid until it expires on its own.
    pub async fn change_password(
        &self,
        session: &AdminClaims,
        current: &str,
        new: &str,
    ) -> Result<(), Error> {
        let admin = self
            .store
            .find_admin_by_id(session.id)
            .await?
            .ok_or(Error::AccessDenied)?;

        if !self.hasher.verify(current, &admin.password_hash).await? {
            return Err(Error::InvalidCurrentPassword);
        }
        if new.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::WeakPassword);
        }

        let password_hash = self.hasher.hash(new).await?;
        if self.store.update_admin_password(admin.id, &password_hash).await? < 1 {
            return Err(Error::AccessDenied);
        }
        log::info!("Admin {} rotated their password", admin.email);
        Ok(())
    }

    /// Inserts an admin with the default password unless the email is taken.
    /// Returns whether a row was created.
    pub async fn seed_admin(&self, email: &str, name: &str) -> anyhow::Result<bool> {
        if self.store.admin_exists(email).await? {
            return Ok(false);
        }
        let password_hash = self.hasher.hash(DEFAULT_ADMIN_PASSWORD).await?;
        self.store
            .insert_admin(email, &password_hash, name, true)
            .await?;
        log::warn!(
            "Seeded admin {} with the default password; it must be changed on first login",
            email
        );
        Ok(true)
    }
}
