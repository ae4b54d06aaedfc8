use std::net::SocketAddr;

use clap::Parser;

use crate::password::DEFAULT_ROUNDS;

/// Student/admin portal API server.
#[derive(Clone, Parser)]
#[command(name = "portal-server", version)]
pub struct Config {
    /// Address the HTTP server binds to
    #[arg(long, env = "PORTAL_LISTEN", default_value = "127.0.0.1:3000")]
    pub listen: SocketAddr,

    /// SQLite connection string
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://portal.db?mode=rwc")]
    pub database_url: String,

    /// Base URL of the users service that runs the OAuth flow
    #[arg(long, env = "USERS_SERVICE_API_URL")]
    pub users_service_url: String,

    /// API key for the users service
    #[arg(long, env = "USERS_SERVICE_API_KEY", hide_env_values = true)]
    pub users_service_key: String,

    /// Key signing admin session cookies; random per process when unset
    #[arg(long, env = "ADMIN_SESSION_SECRET", hide_env_values = true)]
    pub session_secret: Option<String>,

    /// PBKDF2 rounds for new admin password hashes
    #[arg(long, env = "PASSWORD_HASH_ROUNDS", default_value_t = DEFAULT_ROUNDS)]
    pub password_rounds: u32,

    /// Create this admin with the default password if it does not exist
    #[arg(long, env = "SEED_ADMIN_EMAIL")]
    pub seed_admin_email: Option<String>,

    #[arg(long, env = "SEED_ADMIN_NAME", default_value = "Administrator")]
    pub seed_admin_name: String,
}
