//! Database migration runner.
//!
//! Applies the units from [`crate::migration::Migrator`] in identifier order,
//! each in its own transaction together with its `schema_migrations` row, so
//! a unit is either fully applied and recorded or not at all. The first
//! failure stops the run.

use std::collections::BTreeSet;

use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbErr, Statement, TransactionTrait,
};
use sea_orm_migration::{MigrationTrait, MigratorTrait, SchemaManager};
use tracing::{error, info, warn};

use crate::migration::Migrator;

/// Table recording applied migration identifiers.
pub const LEDGER_TABLE: &str = "schema_migrations";

/// Length of the `mYYYYMMDD_HHMMSS` identifier prefix.
const IDENTIFIER_LEN: usize = 16;

/// Migration runner errors.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Invalid migration name '{0}': expected mYYYYMMDD_HHMMSS_description")]
    InvalidName(String),

    #[error("Migration order violated: {later} is declared before {earlier}")]
    OutOfOrder { earlier: String, later: String },

    #[error("Pending migration {pending} predates applied migration {applied}")]
    PendingBeforeApplied { pending: String, applied: String },

    #[error("Applied migration {0} is not known to this binary")]
    UnknownApplied(String),

    #[error("Migration {name} failed: {source}")]
    Failed {
        name: String,
        #[source]
        source: DbErr,
    },

    #[error("Migration ledger error: {0}")]
    Ledger(#[from] DbErr),
}

/// Whether a unit has been recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationState {
    Pending,
    Applied,
}

impl MigrationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Applied => "applied",
        }
    }
}

/// One row of `status` output.
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    pub name: String,
    pub state: MigrationState,
}

/// Extract the timestamp identifier from a migration name.
pub fn identifier(name: &str) -> Result<&str, MigrationError> {
    let bytes = name.as_bytes();
    let well_formed = bytes.len() > IDENTIFIER_LEN
        && bytes[0] == b'm'
        && bytes[1..9].iter().all(u8::is_ascii_digit)
        && bytes[9] == b'_'
        && bytes[10..IDENTIFIER_LEN].iter().all(u8::is_ascii_digit)
        && bytes[IDENTIFIER_LEN] == b'_';

    if well_formed {
        Ok(&name[..IDENTIFIER_LEN])
    } else {
        Err(MigrationError::InvalidName(name.to_string()))
    }
}

/// Check that declared identifiers are well formed and strictly increasing.
pub fn validate_order(names: &[String]) -> Result<(), MigrationError> {
    for pair in names.windows(2) {
        if identifier(&pair[0])? >= identifier(&pair[1])? {
            return Err(MigrationError::OutOfOrder {
                earlier: pair[1].clone(),
                later: pair[0].clone(),
            });
        }
    }
    if let Some(first) = names.first() {
        identifier(first)?;
    }
    Ok(())
}

/// Indices of the units to apply, in order.
///
/// Recorded units are skipped. A recorded unit missing from `names` is
/// refused, as is a pending unit older than the newest recorded one.
pub fn plan_up(names: &[String], applied: &BTreeSet<String>) -> Result<Vec<usize>, MigrationError> {
    validate_order(names)?;

    if let Some(unknown) = applied.iter().find(|name| !names.contains(name)) {
        return Err(MigrationError::UnknownApplied(unknown.clone()));
    }

    let newest_applied = applied
        .iter()
        .map(|name| identifier(name).map(|id| (id, name)))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .max();

    let pending: Vec<usize> = names
        .iter()
        .enumerate()
        .filter(|(_, name)| !applied.contains(*name))
        .map(|(i, _)| i)
        .collect();

    if let (Some((newest_id, newest_name)), Some(&first)) = (newest_applied, pending.first()) {
        if identifier(&names[first])? < newest_id {
            return Err(MigrationError::PendingBeforeApplied {
                pending: names[first].clone(),
                applied: newest_name.clone(),
            });
        }
    }

    Ok(pending)
}

/// Indices of the units to revert, newest first.
pub fn plan_down(
    names: &[String],
    applied: &BTreeSet<String>,
    steps: usize,
) -> Result<Vec<usize>, MigrationError> {
    let mut recorded: Vec<(&str, &String)> = applied
        .iter()
        .map(|name| identifier(name).map(|id| (id, name)))
        .collect::<Result<_, _>>()?;
    recorded.sort();

    recorded
        .iter()
        .rev()
        .take(steps)
        .map(|(_, name)| {
            names
                .iter()
                .position(|n| n == *name)
                .ok_or_else(|| MigrationError::UnknownApplied((*name).clone()))
        })
        .collect()
}

/// Applies and reverts migration units against one database.
pub struct MigrationRunner<'a> {
    db: &'a DatabaseConnection,
    migrations: Vec<Box<dyn MigrationTrait>>,
}

impl<'a> MigrationRunner<'a> {
    /// Runner over the units compiled into this binary.
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self::with_migrations(db, Migrator::migrations())
    }

    /// Runner over an explicit list of units.
    pub fn with_migrations(
        db: &'a DatabaseConnection,
        migrations: Vec<Box<dyn MigrationTrait>>,
    ) -> Self {
        Self { db, migrations }
    }

    fn names(&self) -> Vec<String> {
        self.migrations.iter().map(|m| m.name().to_string()).collect()
    }

    async fn ensure_ledger(&self) -> Result<(), MigrationError> {
        self.db
            .execute_unprepared(&format!(
                r#"CREATE TABLE IF NOT EXISTS "{LEDGER_TABLE}" (
                    "version" VARCHAR(255) PRIMARY KEY,
                    "applied_at" TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );"#
            ))
            .await?;
        Ok(())
    }

    async fn ledger_exists(&self) -> Result<bool, MigrationError> {
        let row = self
            .db
            .query_one_raw(Statement::from_string(
                self.db.get_database_backend(),
                format!(r#"SELECT to_regclass('"{LEDGER_TABLE}"') IS NOT NULL AS "present""#),
            ))
            .await?;
        match row {
            Some(row) => Ok(row.try_get::<bool>("", "present")?),
            None => Ok(false),
        }
    }

    /// Names recorded in the ledger. Read-only: a missing ledger reads as empty.
    pub async fn applied(&self) -> Result<BTreeSet<String>, MigrationError> {
        if !self.ledger_exists().await? {
            return Ok(BTreeSet::new());
        }

        let rows = self
            .db
            .query_all_raw(Statement::from_string(
                self.db.get_database_backend(),
                format!(r#"SELECT "version" FROM "{LEDGER_TABLE}""#),
            ))
            .await?;

        rows.iter()
            .map(|row| row.try_get::<String>("", "version").map_err(Into::into))
            .collect()
    }

    /// State of every known unit, in declared order.
    pub async fn status(&self) -> Result<Vec<MigrationStatus>, MigrationError> {
        let applied = self.applied().await?;
        Ok(self
            .names()
            .into_iter()
            .map(|name| {
                let state = if applied.contains(&name) {
                    MigrationState::Applied
                } else {
                    MigrationState::Pending
                };
                MigrationStatus { name, state }
            })
            .collect())
    }

    /// Apply all pending units. Returns the names applied by this run.
    pub async fn up(&self) -> Result<Vec<String>, MigrationError> {
        let names = self.names();
        validate_order(&names)?;
        self.ensure_ledger().await?;
        let applied = self.applied().await?;
        let plan = plan_up(&names, &applied)?;

        info!("Current schema: {} migration(s) applied", applied.len());
        if plan.is_empty() {
            info!("No pending migrations");
            return Ok(Vec::new());
        }
        info!("{} migration(s) pending", plan.len());

        let mut done = Vec::with_capacity(plan.len());
        for i in plan {
            let name = &names[i];
            info!("Applying migration {}", name);
            self.apply_one(self.migrations[i].as_ref(), name).await?;
            info!("Migration {} applied successfully", name);
            done.push(name.clone());
        }

        Ok(done)
    }

    /// Revert the newest `steps` applied units, newest first.
    pub async fn down(&self, steps: usize) -> Result<Vec<String>, MigrationError> {
        let names = self.names();
        let applied = self.applied().await?;
        let plan = plan_down(&names, &applied, steps)?;

        if plan.is_empty() {
            info!("No applied migrations to revert");
            return Ok(Vec::new());
        }

        let mut reverted = Vec::with_capacity(plan.len());
        for i in plan {
            let name = &names[i];
            info!("Reverting migration {}", name);
            self.revert_one(self.migrations[i].as_ref(), name).await?;
            info!("Migration {} reverted", name);
            reverted.push(name.clone());
        }

        Ok(reverted)
    }

    async fn apply_one(&self, migration: &dyn MigrationTrait, name: &str) -> Result<(), MigrationError> {
        let txn = self.db.begin().await?;

        let result = {
            let manager = SchemaManager::new(&txn);
            migration.up(&manager).await
        };

        if let Err(source) = result {
            error!("Migration {} failed, rolling back: {}", name, source);
            if let Err(e) = txn.rollback().await {
                warn!("Rollback of {} reported an error: {}", name, e);
            }
            return Err(MigrationError::Failed {
                name: name.to_string(),
                source,
            });
        }

        txn.execute_raw(Statement::from_sql_and_values(
            txn.get_database_backend(),
            format!(r#"INSERT INTO "{LEDGER_TABLE}" ("version") VALUES ($1)"#),
            [name.into()],
        ))
        .await?;

        txn.commit().await?;
        Ok(())
    }

    async fn revert_one(&self, migration: &dyn MigrationTrait, name: &str) -> Result<(), MigrationError> {
        let txn = self.db.begin().await?;

        let result = {
            let manager = SchemaManager::new(&txn);
            migration.down(&manager).await
        };

        if let Err(source) = result {
            error!("Reverting {} failed, rolling back: {}", name, source);
            if let Err(e) = txn.rollback().await {
                warn!("Rollback of {} reported an error: {}", name, e);
            }
            return Err(MigrationError::Failed {
                name: name.to_string(),
                source,
            });
        }

        txn.execute_raw(Statement::from_sql_and_values(
            txn.get_database_backend(),
            format!(r#"DELETE FROM "{LEDGER_TABLE}" WHERE "version" = $1"#),
            [name.into()],
        ))
        .await?;

        txn.commit().await?;
        Ok(())
    }
}
