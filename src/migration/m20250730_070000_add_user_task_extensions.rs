//! Migration: Normalize assignment and add tickets and work logs.
//!
//! Runs in five phases, each a list of statements that are no-ops when their
//! target state already exists:
//!
//! 1. additive columns on `user` and `task` (nothing dropped or renamed)
//! 2. new tables: `task_assignees`, `ticket`, `ticket_assignees`, `log_work`
//! 3. foreign keys, guarded by a `pg_constraint` lookup
//! 4. indexes for the status and date filters
//! 5. backfill of `task_assignees` from the legacy free-text `task.assignee`,
//!    and of `task.creator_id` from the first admin
//!
//! The legacy `assignee` column is kept so the backfill can be audited.

use sea_orm::{ConnectionTrait, Statement};
use sea_orm_migration::prelude::*;
use tracing::{info, warn};

use super::guard::{self, ForeignKey};

#[derive(DeriveMigrationName)]
pub struct Migration;

/// One ordered step of the migration.
pub struct Phase {
    pub name: &'static str,
    pub statements: fn() -> Vec<String>,
}

/// Phases in application order.
pub const PHASES: [Phase; 5] = [
    Phase {
        name: "additive columns",
        statements: additive_columns,
    },
    Phase {
        name: "new tables",
        statements: new_tables,
    },
    Phase {
        name: "constraints",
        statements: constraints,
    },
    Phase {
        name: "indexes",
        statements: indexes,
    },
    Phase {
        name: "backfill",
        statements: backfill,
    },
];

const USER_COLUMNS: &[(&str, &str)] = &[
    ("username", "VARCHAR(255)"),
    ("full_name", "VARCHAR(255)"),
    ("avatar", "VARCHAR(255)"),
    ("phone", "VARCHAR(255)"),
    ("department", "VARCHAR(255)"),
    ("position", "VARCHAR(255)"),
    ("status", "VARCHAR(20) DEFAULT 'active'"),
    ("last_login_at", "TIMESTAMPTZ"),
    ("updated_at", "TIMESTAMPTZ DEFAULT NOW()"),
];

const TASK_COLUMNS: &[(&str, &str)] = &[
    ("status", "VARCHAR(20) DEFAULT 'pending'"),
    ("start_date", "TIMESTAMPTZ"),
    ("end_date", "TIMESTAMPTZ"),
    ("estimated_hours", "INT DEFAULT 0"),
    ("actual_hours", "INT DEFAULT 0"),
    ("progress", "INT DEFAULT 0"),
    ("notes", "TEXT"),
    ("creator_id", "INT"),
];

const NEW_TABLES: &[&str] = &["log_work", "ticket_assignees", "ticket", "task_assignees"];

const FOREIGN_KEYS: &[ForeignKey] = &[
    ForeignKey {
        name: "task_creator_id_foreign",
        table: "task",
        column: "creator_id",
        references: "user",
        on_delete_cascade: false,
    },
    ForeignKey {
        name: "task_assignees_task_id_foreign",
        table: "task_assignees",
        column: "task_id",
        references: "task",
        on_delete_cascade: true,
    },
    ForeignKey {
        name: "task_assignees_user_id_foreign",
        table: "task_assignees",
        column: "user_id",
        references: "user",
        on_delete_cascade: true,
    },
    ForeignKey {
        name: "ticket_task_id_foreign",
        table: "ticket",
        column: "task_id",
        references: "task",
        on_delete_cascade: false,
    },
    ForeignKey {
        name: "ticket_requested_by_id_foreign",
        table: "ticket",
        column: "requested_by_id",
        references: "user",
        on_delete_cascade: false,
    },
    ForeignKey {
        name: "ticket_approved_by_id_foreign",
        table: "ticket",
        column: "approved_by_id",
        references: "user",
        on_delete_cascade: false,
    },
    ForeignKey {
        name: "ticket_assignees_ticket_id_foreign",
        table: "ticket_assignees",
        column: "ticket_id",
        references: "ticket",
        on_delete_cascade: true,
    },
    ForeignKey {
        name: "ticket_assignees_user_id_foreign",
        table: "ticket_assignees",
        column: "user_id",
        references: "user",
        on_delete_cascade: true,
    },
    ForeignKey {
        name: "log_work_task_id_foreign",
        table: "log_work",
        column: "task_id",
        references: "task",
        on_delete_cascade: false,
    },
    ForeignKey {
        name: "log_work_user_id_foreign",
        table: "log_work",
        column: "user_id",
        references: "user",
        on_delete_cascade: false,
    },
];

const INDEXES: &[(&str, &str, &str)] = &[
    ("user_email_index", "user", "email"),
    ("user_status_index", "user", "status"),
    ("task_status_index", "task", "status"),
    ("task_priority_index", "task", "priority"),
    ("task_deadline_index", "task", "deadline"),
    ("ticket_status_index", "ticket", "status"),
    ("log_work_date_index", "log_work", "date"),
];

fn additive_columns() -> Vec<String> {
    let user = USER_COLUMNS
        .iter()
        .map(|(col, def)| guard::add_column("user", col, def));
    let task = TASK_COLUMNS
        .iter()
        .map(|(col, def)| guard::add_column("task", col, def));
    user.chain(task).collect()
}

fn new_tables() -> Vec<String> {
    vec![
        r#"
        CREATE TABLE IF NOT EXISTS "task_assignees" (
            "task_id" INT NOT NULL,
            "user_id" INT NOT NULL,
            CONSTRAINT "task_assignees_pkey" PRIMARY KEY ("task_id", "user_id")
        );
        "#
        .to_string(),
        r#"
        CREATE TABLE IF NOT EXISTS "ticket" (
            "id" SERIAL PRIMARY KEY,
            "title" VARCHAR(255) NOT NULL,
            "description" TEXT,
            "status" VARCHAR(20) DEFAULT 'pending',
            "priority" VARCHAR(10) DEFAULT 'medium',
            "task_id" INT NOT NULL,
            "requested_by_id" INT NOT NULL,
            "approved_by_id" INT,
            "requested_at" TIMESTAMPTZ DEFAULT NOW(),
            "approved_at" TIMESTAMPTZ,
            "notes" TEXT,
            "created_at" TIMESTAMPTZ DEFAULT NOW(),
            "updated_at" TIMESTAMPTZ DEFAULT NOW()
        );
        "#
        .to_string(),
        r#"
        CREATE TABLE IF NOT EXISTS "ticket_assignees" (
            "ticket_id" INT NOT NULL,
            "user_id" INT NOT NULL,
            CONSTRAINT "ticket_assignees_pkey" PRIMARY KEY ("ticket_id", "user_id")
        );
        "#
        .to_string(),
        r#"
        CREATE TABLE IF NOT EXISTS "log_work" (
            "id" SERIAL PRIMARY KEY,
            "task_id" INT NOT NULL,
            "user_id" INT NOT NULL,
            "date" DATE NOT NULL,
            "hours_worked" DECIMAL(5, 2) DEFAULT 0,
            "description" TEXT,
            "created_at" TIMESTAMPTZ DEFAULT NOW(),
            "updated_at" TIMESTAMPTZ DEFAULT NOW()
        );
        "#
        .to_string(),
    ]
}

fn constraints() -> Vec<String> {
    FOREIGN_KEYS.iter().map(ForeignKey::add_sql).collect()
}

fn indexes() -> Vec<String> {
    INDEXES
        .iter()
        .map(|(name, table, column)| guard::create_index(name, table, &[*column]))
        .collect()
}

/// Match between a user field and the trimmed legacy assignee text.
///
/// Case-insensitive substring in either direction, or trimmed equality.
/// Empty fields are turned into NULL so `'%' || '' || '%'` cannot match
/// everything.
fn assignee_match(user_field: &str) -> String {
    let field = format!("NULLIF(TRIM(u.\"{}\"), '')", user_field);
    let legacy = "TRIM(t.\"assignee\")";
    format!(
        "({field} ILIKE ('%' || {legacy} || '%') \
         OR {legacy} ILIKE ('%' || {field} || '%') \
         OR LOWER({field}) = LOWER({legacy}))"
    )
}

/// SQL that links tasks to users matched from the legacy assignee text.
pub fn backfill_assignees_sql() -> String {
    format!(
        r#"
        INSERT INTO "task_assignees" ("task_id", "user_id")
        SELECT DISTINCT t."id", u."id"
        FROM "task" t
        JOIN "user" u ON (
            {full_name}
            OR {email}
            OR {username}
        )
        WHERE t."assignee" IS NOT NULL
          AND TRIM(t."assignee") <> ''
          AND NOT EXISTS (
              SELECT 1 FROM "task_assignees" ta
              WHERE ta."task_id" = t."id" AND ta."user_id" = u."id"
          );
        "#,
        full_name = assignee_match("full_name"),
        email = assignee_match("email"),
        username = assignee_match("username"),
    )
}

/// Tasks without a creator get the lowest-id admin. Rows that already have
/// a creator are never touched, so reruns are stable.
pub const BACKFILL_CREATOR_SQL: &str = r#"
    UPDATE "task"
    SET "creator_id" = (
        SELECT u."id" FROM "user" u
        JOIN "roles" r ON u."role_id" = r."id"
        WHERE r."name" = 'admin'
        ORDER BY u."id"
        LIMIT 1
    )
    WHERE "creator_id" IS NULL;
"#;

fn backfill() -> Vec<String> {
    vec![backfill_assignees_sql(), BACKFILL_CREATOR_SQL.to_string()]
}

const UNMATCHED_ASSIGNEES_SQL: &str = r#"
    SELECT t."id", t."assignee"
    FROM "task" t
    WHERE t."assignee" IS NOT NULL
      AND TRIM(t."assignee") <> ''
      AND NOT EXISTS (SELECT 1 FROM "task_assignees" ta WHERE ta."task_id" = t."id")
    ORDER BY t."id";
"#;

const MULTI_MATCH_SQL: &str = r#"
    SELECT ta."task_id", COUNT(*) AS "matches"
    FROM "task_assignees" ta
    JOIN "task" t ON t."id" = ta."task_id"
    WHERE t."assignee" IS NOT NULL AND TRIM(t."assignee") <> ''
    GROUP BY ta."task_id"
    HAVING COUNT(*) > 1
    ORDER BY ta."task_id";
"#;

/// Log legacy assignees that matched no user or more than one.
async fn report_ambiguous_assignees(manager: &SchemaManager<'_>) -> Result<(), DbErr> {
    let conn = manager.get_connection();
    let backend = manager.get_database_backend();

    let unmatched = conn
        .query_all_raw(Statement::from_string(backend, UNMATCHED_ASSIGNEES_SQL))
        .await?;
    for row in &unmatched {
        let task_id: i32 = row.try_get("", "id")?;
        let assignee: String = row.try_get("", "assignee")?;
        warn!(
            task_id,
            assignee = %assignee,
            "Legacy assignee matched no user; task left without assignees"
        );
    }

    let multi = conn
        .query_all_raw(Statement::from_string(backend, MULTI_MATCH_SQL))
        .await?;
    for row in &multi {
        let task_id: i32 = row.try_get("", "task_id")?;
        let matches: i64 = row.try_get("", "matches")?;
        info!(task_id, matches, "Legacy assignee matched several users");
    }

    Ok(())
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        for (i, phase) in PHASES.iter().enumerate() {
            info!("Phase {}/{}: {}", i + 1, PHASES.len(), phase.name);
            for sql in (phase.statements)() {
                conn.execute_unprepared(&sql).await?;
            }
        }

        report_ambiguous_assignees(manager).await?;
        info!("Column \"task\".\"assignee\" is kept for audit; drop it manually once verified");

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        for table in NEW_TABLES {
            conn.execute_unprepared(&guard::drop_table(table)).await?;
        }

        for fk in FOREIGN_KEYS.iter().filter(|fk| fk.table == "task") {
            conn.execute_unprepared(&fk.drop_sql()).await?;
        }

        for (name, table, _) in INDEXES {
            if !NEW_TABLES.contains(table) {
                conn.execute_unprepared(&guard::drop_index(name)).await?;
            }
        }

        for (col, _) in TASK_COLUMNS {
            conn.execute_unprepared(&guard::drop_column("task", col))
                .await?;
        }
        for (col, _) in USER_COLUMNS {
            conn.execute_unprepared(&guard::drop_column("user", col))
                .await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order() {
        let names: Vec<&str> = PHASES.iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            [
                "additive columns",
                "new tables",
                "constraints",
                "indexes",
                "backfill"
            ]
        );
    }

    #[test]
    fn test_additive_phase_never_drops() {
        for sql in additive_columns() {
            assert!(sql.contains("ADD COLUMN IF NOT EXISTS"), "{}", sql);
            assert!(!sql.to_uppercase().contains("DROP"), "{}", sql);
        }
    }

    #[test]
    fn test_every_statement_is_guarded() {
        for sql in new_tables() {
            assert!(sql.contains("CREATE TABLE IF NOT EXISTS"));
        }
        for sql in constraints() {
            assert!(sql.contains("IF NOT EXISTS"));
            assert!(sql.contains("FROM pg_constraint"));
        }
        for sql in indexes() {
            assert!(sql.starts_with("CREATE INDEX IF NOT EXISTS"));
        }
    }

    #[test]
    fn test_constraints_reference_known_tables() {
        let known = ["user", "task", "roles", "ticket", "task_assignees"];
        for fk in FOREIGN_KEYS {
            assert!(known.contains(&fk.references), "{}", fk.name);
        }
    }

    #[test]
    fn test_backfill_skips_existing_pairs_and_blank_text() {
        let sql = backfill_assignees_sql();
        assert!(sql.contains("NOT EXISTS"));
        assert!(sql.contains("TRIM(t.\"assignee\") <> ''"));
        assert!(sql.contains("NULLIF(TRIM(u.\"full_name\"), '')"));
        assert!(sql.contains("NULLIF(TRIM(u.\"username\"), '')"));
    }

    #[test]
    fn test_creator_backfill_is_deterministic() {
        assert!(BACKFILL_CREATOR_SQL.contains("ORDER BY u.\"id\""));
        assert!(BACKFILL_CREATOR_SQL.contains("WHERE \"creator_id\" IS NULL"));
    }

    #[test]
    fn test_down_drops_dependents_first() {
        let pos = |t: &str| NEW_TABLES.iter().position(|n| *n == t).unwrap();
        assert!(pos("ticket_assignees") < pos("ticket"));
        assert!(pos("log_work") < pos("ticket"));
    }
}
