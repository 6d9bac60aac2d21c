use sea_orm_migration::prelude::*;
use service::DB_SCHEMA;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Records and sessions share one schema
        manager
            .get_connection()
            .execute_unprepared(&format!("CREATE SCHEMA IF NOT EXISTS {DB_SCHEMA};"))
            .await?;

        manager
            .get_connection()
            .execute_unprepared(&format!("SET search_path TO {DB_SCHEMA}, public;"))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // CASCADE also removes the session table
        manager
            .get_connection()
            .execute_unprepared(&format!("DROP SCHEMA IF EXISTS {DB_SCHEMA} CASCADE;"))
            .await?;

        Ok(())
    }
}
