//! Migration: Create the prototype task table.
//!
//! Single table with a free-text `assignee`; later migrations normalize it.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE IF NOT EXISTS "task" (
                    "id" SERIAL PRIMARY KEY,
                    "title" VARCHAR(255) NOT NULL,
                    "description" VARCHAR(255) NULL,
                    "deadline" TIMESTAMPTZ NULL,
                    "priority" VARCHAR(255) NOT NULL,
                    "assignee" VARCHAR(255) NULL,
                    "created_at" TIMESTAMPTZ NOT NULL,
                    "updated_at" TIMESTAMPTZ NOT NULL
                );
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(r#"DROP TABLE IF EXISTS "task" CASCADE;"#)
            .await?;

        Ok(())
    }
}
