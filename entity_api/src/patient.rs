use super::error::{EntityApiErrorKind, Error};
use entity::patients::{ActiveModel, Column, Entity, Model};
use entity::Id;
use sea_orm::{entity::prelude::*, ActiveValue::Set, ConnectionTrait, QueryOrder, QuerySelect};

use log::*;

/// Number of patients shown on the home page.
const LATEST_LIMIT: u64 = 10;

/// The user-editable columns of a patient record.
#[derive(Clone, Debug, PartialEq)]
pub struct Fields {
    pub ucn: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub height: i32,
    pub weight: i32,
    pub medication: String,
    pub note: String,
    pub approved: bool,
    pub first_continuation: bool,
}

impl Fields {
    fn into_active_model(self) -> ActiveModel {
        ActiveModel {
            ucn: Set(self.ucn),
            first_name: Set(self.first_name),
            last_name: Set(self.last_name),
            phone_number: Set(self.phone_number),
            height: Set(self.height),
            weight: Set(self.weight),
            medication: Set(self.medication),
            note: Set(self.note),
            approved: Set(self.approved),
            first_continuation: Set(self.first_continuation),
            ..Default::default()
        }
    }
}

pub async fn create(db: &impl ConnectionTrait, fields: Fields, owner: Id) -> Result<Model, Error> {
    debug!("New Patient to be inserted for user {owner}: {fields:?}");

    let mut active_model = fields.into_active_model();
    // Newly registered patients always start unapproved.
    active_model.approved = Set(false);
    active_model.first_continuation = Set(false);
    active_model.user_id = Set(owner);
    active_model.created_at = Set(chrono::Utc::now().into());

    Ok(active_model.insert(db).await?)
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::new(EntityApiErrorKind::RecordNotFound))
}

pub async fn find_by_ucn(db: &impl ConnectionTrait, ucn: &str) -> Result<Model, Error> {
    Entity::find()
        .filter(Column::Ucn.eq(ucn))
        .one(db)
        .await?
        .ok_or_else(|| Error::new(EntityApiErrorKind::RecordNotFound))
}

pub async fn find_all(db: &impl ConnectionTrait) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .order_by_asc(Column::LastName)
        .order_by_asc(Column::FirstName)
        .all(db)
        .await?)
}

pub async fn find_latest(db: &impl ConnectionTrait) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .order_by_desc(Column::CreatedAt)
        .limit(LATEST_LIMIT)
        .all(db)
        .await?)
}

pub async fn find_by_medication(
    db: &impl ConnectionTrait,
    medication: &str,
) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::Medication.eq(medication))
        .order_by_asc(Column::LastName)
        .all(db)
        .await?)
}

/// Updates a patient owned by `owner`.
///
/// Matching no row owned by `owner` is reported as [`EntityApiErrorKind::Unauthorized`].
pub async fn update(
    db: &impl ConnectionTrait,
    id: Id,
    owner: Id,
    fields: Fields,
) -> Result<(), Error> {
    let result = Entity::update_many()
        .set(fields.into_active_model())
        .filter(Column::Id.eq(id))
        .filter(Column::UserId.eq(owner))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        warn!("User {owner} attempted to update patient {id} without owning it");
        return Err(Error::new(EntityApiErrorKind::Unauthorized));
    }

    Ok(())
}

/// Deletes a patient owned by `owner`, with the same zero-rows rule as [`update`].
pub async fn delete(db: &impl ConnectionTrait, id: Id, owner: Id) -> Result<(), Error> {
    let result = Entity::delete_many()
        .filter(Column::Id.eq(id))
        .filter(Column::UserId.eq(owner))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        warn!("User {owner} attempted to delete patient {id} without owning it");
        return Err(Error::new(EntityApiErrorKind::Unauthorized));
    }

    Ok(())
}
