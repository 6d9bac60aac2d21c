use super::error::{EntityApiErrorKind, Error};
use chrono::Utc;

use entity::users::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use password_auth;
use sea_orm::{entity::prelude::*, ConnectionTrait, Set};

/// Inserts a new user, hashing the plaintext password first.
///
/// An email address that is already registered surfaces as
/// [`EntityApiErrorKind::DuplicateRecord`].
pub async fn create(
    db: &impl ConnectionTrait,
    name: String,
    email: String,
    password: String,
) -> Result<Model, Error> {
    debug!("New User to be inserted: {email}");

    let user_active_model = ActiveModel {
        name: Set(name),
        email: Set(email),
        hashed_password: Set(generate_hash(password)),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    };

    Ok(user_active_model.insert(db).await?)
}

pub async fn find_by_email(db: &impl ConnectionTrait, email: &str) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::Email.eq(email))
        .one(db)
        .await?)
}

/// Whether a user with this id is still present.
pub async fn exists(db: &impl ConnectionTrait, id: Id) -> Result<bool, Error> {
    Ok(Entity::find_by_id(id).one(db).await?.is_some())
}

/// Verifies an email/password pair and returns the matching user id.
///
/// An unknown email and a wrong password are indistinguishable to the caller:
/// both are [`EntityApiErrorKind::RecordUnauthenticated`].
pub async fn authenticate(
    db: &impl ConnectionTrait,
    email: &str,
    password: &str,
) -> Result<Id, Error> {
    let user = find_by_email(db, email)
        .await?
        .ok_or_else(|| Error::new(EntityApiErrorKind::RecordUnauthenticated))?;

    verify_password(password, &user.hashed_password)?;
    Ok(user.id)
}

pub fn verify_password(password_to_verify: &str, password_hash: &str) -> Result<(), Error> {
    match password_auth::verify_password(password_to_verify, password_hash) {
        Ok(_) => Ok(()),
        Err(_) => Err(Error::new(EntityApiErrorKind::RecordUnauthenticated)),
    }
}

pub fn generate_hash(password: String) -> String {
    password_auth::generate_hash(password)
}
