use crate::{error::Error, medications::Model, Identity};
use sea_orm::DatabaseConnection;

pub async fn create(db: &DatabaseConnection, name: String, owner: Identity) -> Result<Model, Error> {
    Ok(entity_api::medication::create(db, name, owner.id()).await?)
}

pub async fn find_all(db: &DatabaseConnection) -> Result<Vec<Model>, Error> {
    Ok(entity_api::medication::find_all(db).await?)
}

/// Deletes a medication `owner` created.
///
/// Still-referenced medications fail with `EntityErrorKind::ExistingDependency`,
/// someone else's with `EntityErrorKind::Unauthorized`.
pub async fn delete(db: &DatabaseConnection, name: &str, owner: Identity) -> Result<(), Error> {
    Ok(entity_api::medication::delete(db, name, owner.id()).await?)
}
