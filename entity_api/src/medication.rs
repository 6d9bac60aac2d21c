use super::error::{EntityApiErrorKind, Error};
use entity::medications::{ActiveModel, Column, Entity, Model};
use entity::{patients, Id};
use sea_orm::{
    entity::prelude::*, ActiveValue::Set, ConnectionTrait, PaginatorTrait, QueryOrder,
};

use log::*;

pub async fn create(db: &impl ConnectionTrait, name: String, owner: Id) -> Result<Model, Error> {
    debug!("New Medication to be inserted for user {owner}: {name}");

    let active_model = ActiveModel {
        name: Set(name),
        user_id: Set(owner),
        created_at: Set(chrono::Utc::now().into()),
    };

    Ok(active_model.insert(db).await?)
}

pub async fn find_all(db: &impl ConnectionTrait) -> Result<Vec<Model>, Error> {
    Ok(Entity::find().order_by_asc(Column::Name).all(db).await?)
}

/// Deletes a medication created by `owner`.
///
/// A medication still prescribed to any patient is kept and reported as
/// [`EntityApiErrorKind::ExistingDependency`].
pub async fn delete(db: &impl ConnectionTrait, name: &str, owner: Id) -> Result<(), Error> {
    let references = patients::Entity::find()
        .filter(patients::Column::Medication.eq(name))
        .count(db)
        .await?;

    if references > 0 {
        info!("Medication {name} is still referenced by {references} patient(s)");
        return Err(Error::new(EntityApiErrorKind::ExistingDependency));
    }

    let result = Entity::delete_many()
        .filter(Column::Name.eq(name))
        .filter(Column::UserId.eq(owner))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        warn!("User {owner} attempted to delete medication {name} without owning it");
        return Err(Error::new(EntityApiErrorKind::Unauthorized));
    }

    Ok(())
}
