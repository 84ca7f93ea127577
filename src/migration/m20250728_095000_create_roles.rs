//! Migration: Create roles and attach one to every user.
//!
//! Users that existed before roles are assigned `admin`: the prototype only
//! had administrators.

use sea_orm_migration::prelude::*;

use super::guard::{self, ForeignKey};

#[derive(DeriveMigrationName)]
pub struct Migration;

const USER_ROLE_FK: ForeignKey = ForeignKey {
    name: "user_role_id_foreign",
    table: "user",
    column: "role_id",
    references: "roles",
    on_delete_cascade: false,
};

/// Seed statement for the fixed role set. Safe to run any number of times.
pub const SEED_ROLES: &str = r#"
    INSERT INTO "roles" ("name") VALUES ('admin'), ('user')
    ON CONFLICT ("name") DO NOTHING;
"#;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        conn.execute_unprepared(
            r#"
            CREATE TABLE IF NOT EXISTS "roles" (
                "id" SERIAL PRIMARY KEY,
                "name" VARCHAR(50) NOT NULL UNIQUE CHECK ("name" IN ('admin', 'user'))
            );
            "#,
        )
        .await?;

        conn.execute_unprepared(SEED_ROLES).await?;

        conn.execute_unprepared(&guard::add_column("user", "role_id", "INT"))
            .await?;

        conn.execute_unprepared(
            r#"
            UPDATE "user"
            SET "role_id" = (SELECT "id" FROM "roles" WHERE "name" = 'admin')
            WHERE "role_id" IS NULL;
            "#,
        )
        .await?;

        // SET NOT NULL on an already NOT NULL column is a no-op
        conn.execute_unprepared(r#"ALTER TABLE "user" ALTER COLUMN "role_id" SET NOT NULL;"#)
            .await?;

        conn.execute_unprepared(&USER_ROLE_FK.add_sql()).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        conn.execute_unprepared(&USER_ROLE_FK.drop_sql()).await?;
        conn.execute_unprepared(&guard::drop_column("user", "role_id"))
            .await?;
        conn.execute_unprepared(&guard::drop_table("roles")).await?;

        Ok(())
    }
}
