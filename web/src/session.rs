//! Session storage: the cookie settings and the backing stores.
use log::*;
use sea_orm::DatabaseConnection;
use service::config::Config;
use sha2::{Digest, Sha512};
use std::error::Error as StdError;
use time::Duration;
use tokio::task::JoinHandle;
use tower_sessions::{
    cookie::{Key, SameSite},
    service::SignedCookie,
    session_store::{self, ExpiredDeletion},
    Expiry, SessionManagerLayer, SessionStore,
};
use tower_sessions_sqlx_store::PostgresStore;

pub const SESSION_COOKIE: &str = "session";

/// Derives the 64-byte cookie signing key from the configured secret.
pub fn signing_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

pub fn session_layer<S>(store: S, config: &Config) -> SessionManagerLayer<S, SignedCookie>
where
    S: SessionStore + Clone,
{
    if config.uses_default_session_secret() {
        warn!("Signing session cookies with the built-in default secret; set SESSION_SECRET");
    }

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE)
        .with_http_only(true)
        .with_secure(config.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_path("/")
        .with_expiry(Expiry::OnInactivity(Duration::seconds(
            i64::try_from(config.session_expiry_seconds).unwrap_or(i64::MAX),
        )))
        .with_signed(signing_key(config.session_secret()))
}

/// Opens the PostgreSQL session store on the record store's pool, creating its
/// table when missing.
pub async fn postgres_store(
    db: &DatabaseConnection,
) -> Result<PostgresStore, Box<dyn StdError + Send + Sync>> {
    let store = PostgresStore::new(db.get_postgres_connection_pool().clone())
        .with_schema_name(service::DB_SCHEMA)?;
    store.migrate().await?;

    Ok(store)
}

/// Purges expired sessions from `store` every `period` until the task is aborted.
pub fn spawn_expired_deletion(
    store: PostgresStore,
    period: std::time::Duration,
) -> JoinHandle<session_store::Result<()>> {
    let period = period.max(std::time::Duration::from_secs(1));
    info!("Purging expired sessions every {}s", period.as_secs());
    tokio::task::spawn(store.continuously_delete_expired(period))
}
