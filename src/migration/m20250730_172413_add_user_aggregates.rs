//! Migration: Add denormalized order counters to users.

use sea_orm_migration::prelude::*;

use super::guard;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        conn.execute_unprepared(&guard::add_column("user", "total_orders", "INTEGER DEFAULT 0"))
            .await?;
        conn.execute_unprepared(&guard::add_column(
            "user",
            "total_spending",
            "DECIMAL(12, 2) DEFAULT 0",
        ))
        .await?;

        conn.execute_unprepared(&guard::create_index(
            "user_total_orders_index",
            "user",
            &["total_orders"],
        ))
        .await?;
        conn.execute_unprepared(&guard::create_index(
            "user_total_spending_index",
            "user",
            &["total_spending"],
        ))
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        conn.execute_unprepared(&guard::drop_index("user_total_orders_index"))
            .await?;
        conn.execute_unprepared(&guard::drop_index("user_total_spending_index"))
            .await?;
        conn.execute_unprepared(&guard::drop_column("user", "total_orders"))
            .await?;
        conn.execute_unprepared(&guard::drop_column("user", "total_spending"))
            .await?;

        Ok(())
    }
}
