use crate::error::{EntityErrorKind, Error};
use crate::{users, Id};
use async_trait::async_trait;
use axum_login::{AuthUser, AuthnBackend, UserId};
use log::*;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The principal a session is signed in as.
///
/// Only ever stored in a session and attached to a single request; the user
/// row it names is owned by the record store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(pub Id);

impl Identity {
    pub fn id(self) -> Id {
        self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AuthUser for Identity {
    type Id = Id;

    fn id(&self) -> Self::Id {
        self.0
    }

    // Sessions are not bound to a credential, only to the user's existence.
    fn session_auth_hash(&self) -> &[u8] {
        &[]
    }
}

/// Answers whether a session's identity still names an existing user.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn exists(&self, identity: Identity) -> Result<bool, Error>;
}

/// [`UserDirectory`] over the `users` table.
struct UserTable {
    db: Arc<DatabaseConnection>,
}

#[async_trait]
impl UserDirectory for UserTable {
    async fn exists(&self, identity: Identity) -> Result<bool, Error> {
        Ok(entity_api::user::exists(self.db.as_ref(), identity.id()).await?)
    }
}

#[derive(Clone, Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Session authentication backend: checks credentials against the record
/// store and re-resolves a session's identity on every request.
#[derive(Clone)]
pub struct Backend {
    db: Arc<DatabaseConnection>,
    directory: Arc<dyn UserDirectory>,
}

impl Backend {
    pub fn new(db: &Arc<DatabaseConnection>) -> Self {
        Self {
            db: Arc::clone(db),
            directory: Arc::new(UserTable { db: Arc::clone(db) }),
        }
    }

    /// Replaces the lookup used to re-resolve session identities.
    pub fn with_directory(mut self, directory: Arc<dyn UserDirectory>) -> Self {
        self.directory = directory;
        self
    }
}

#[async_trait]
impl AuthnBackend for Backend {
    type User = Identity;
    type Credentials = Credentials;
    type Error = Error;

    /// `Ok(None)` for an unknown email or a wrong password alike.
    async fn authenticate(
        &self,
        creds: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        match authenticate(self.db.as_ref(), creds.email.trim(), &creds.password).await {
            Ok(identity) => Ok(Some(identity)),
            Err(err) if err.entity_kind() == Some(&EntityErrorKind::Unauthenticated) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn get_user(&self, user_id: &UserId<Self>) -> Result<Option<Self::User>, Self::Error> {
        let identity = Identity(*user_id);
        if self.directory.exists(identity).await? {
            Ok(Some(identity))
        } else {
            info!("Session names user {identity} who no longer exists");
            Ok(None)
        }
    }
}

pub type AuthSession = axum_login::AuthSession<Backend>;

/// Registers a new user; an email already in use is `EntityErrorKind::Duplicate`.
pub async fn create(
    db: &DatabaseConnection,
    name: String,
    email: String,
    password: String,
) -> Result<users::Model, Error> {
    Ok(entity_api::user::create(db, name, email, password).await?)
}

/// Checks an email/password pair, yielding the identity to sign the session in as.
pub async fn authenticate(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> Result<Identity, Error> {
    let id = entity_api::user::authenticate(db, email, password).await?;
    debug!("Authenticated user {id}");
    Ok(Identity(id))
}
