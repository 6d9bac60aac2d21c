use crate::{error::Error, patients::Model, Id, Identity};
use sea_orm::DatabaseConnection;

pub use entity_api::patient::Fields;

pub async fn create(
    db: &DatabaseConnection,
    fields: Fields,
    owner: Identity,
) -> Result<Model, Error> {
    Ok(entity_api::patient::create(db, fields, owner.id()).await?)
}

pub async fn find_by_id(db: &DatabaseConnection, id: Id) -> Result<Model, Error> {
    Ok(entity_api::patient::find_by_id(db, id).await?)
}

pub async fn find_by_ucn(db: &DatabaseConnection, ucn: &str) -> Result<Model, Error> {
    Ok(entity_api::patient::find_by_ucn(db, ucn).await?)
}

pub async fn find_all(db: &DatabaseConnection) -> Result<Vec<Model>, Error> {
    Ok(entity_api::patient::find_all(db).await?)
}

pub async fn find_latest(db: &DatabaseConnection) -> Result<Vec<Model>, Error> {
    Ok(entity_api::patient::find_latest(db).await?)
}

pub async fn find_by_medication(
    db: &DatabaseConnection,
    medication: &str,
) -> Result<Vec<Model>, Error> {
    Ok(entity_api::patient::find_by_medication(db, medication).await?)
}

/// Fails with `EntityErrorKind::Unauthorized` unless `owner` created the patient.
pub async fn update(
    db: &DatabaseConnection,
    id: Id,
    owner: Identity,
    fields: Fields,
) -> Result<(), Error> {
    Ok(entity_api::patient::update(db, id, owner.id(), fields).await?)
}

pub async fn delete(db: &DatabaseConnection, id: Id, owner: Identity) -> Result<(), Error> {
    Ok(entity_api::patient::delete(db, id, owner.id()).await?)
}
