use sea_orm_migration::prelude::*;
use service::DB_SCHEMA;

#[derive(DeriveMigrationName)]
pub struct Migration;

fn schema() -> Alias {
    Alias::new(DB_SCHEMA)
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table((schema(), Users::Table))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Users::Email)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::HashedPassword).text().not_null())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table((schema(), Medications::Table))
                    .if_not_exists()
                    .col(ColumnDef::new(Medications::Name).text().not_null().primary_key())
                    .col(ColumnDef::new(Medications::UserId).integer().not_null())
                    .col(
                        ColumnDef::new(Medications::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_medications_user_id")
                            .from((schema(), Medications::Table), Medications::UserId)
                            .to((schema(), Users::Table), Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table((schema(), Patients::Table))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Patients::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Patients::Ucn).string_len(10).not_null())
                    .col(ColumnDef::new(Patients::FirstName).string_len(255).not_null())
                    .col(ColumnDef::new(Patients::LastName).string_len(255).not_null())
                    .col(ColumnDef::new(Patients::PhoneNumber).string_len(16).not_null())
                    .col(ColumnDef::new(Patients::Height).integer().not_null())
                    .col(ColumnDef::new(Patients::Weight).integer().not_null())
                    .col(ColumnDef::new(Patients::Medication).text().not_null())
                    .col(ColumnDef::new(Patients::Note).text().not_null())
                    .col(
                        ColumnDef::new(Patients::Approved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Patients::FirstContinuation)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Patients::UserId).integer().not_null())
                    .col(
                        ColumnDef::new(Patients::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_patients_medication")
                            .from((schema(), Patients::Table), Patients::Medication)
                            .to((schema(), Medications::Table), Medications::Name)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_patients_user_id")
                            .from((schema(), Patients::Table), Patients::UserId)
                            .to((schema(), Users::Table), Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_patients_ucn")
                    .table((schema(), Patients::Table))
                    .col(Patients::Ucn)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_patients_created_at")
                    .table((schema(), Patients::Table))
                    .col(Patients::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Reverse order of creation because of the foreign keys
        manager
            .drop_table(Table::drop().table((schema(), Patients::Table)).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table((schema(), Medications::Table)).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table((schema(), Users::Table)).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Name,
    Email,
    HashedPassword,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Medications {
    Table,
    Name,
    UserId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Patients {
    Table,
    Id,
    Ucn,
    FirstName,
    LastName,
    PhoneNumber,
    Height,
    Weight,
    Medication,
    Note,
    Approved,
    FirstContinuation,
    UserId,
    CreatedAt,
}
