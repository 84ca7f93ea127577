//! Builders for statements that are safe to run more than once.
//!
//! PostgreSQL has `IF NOT EXISTS` for columns, tables and indexes but not for
//! constraints, so constraint creation is wrapped in a `DO` block that checks
//! `pg_constraint` first. The check is scoped to the owning table so two
//! schemas in one database do not see each other's constraints.

/// Quote an identifier for PostgreSQL (`user` is reserved).
pub fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// `ALTER TABLE .. ADD COLUMN IF NOT EXISTS ..`
pub fn add_column(table: &str, column: &str, definition: &str) -> String {
    format!(
        "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {} {};",
        quote(table),
        quote(column),
        definition
    )
}

/// `ALTER TABLE .. DROP COLUMN IF EXISTS ..`
pub fn drop_column(table: &str, column: &str) -> String {
    format!(
        "ALTER TABLE {} DROP COLUMN IF EXISTS {};",
        quote(table),
        quote(column)
    )
}

/// `CREATE INDEX IF NOT EXISTS name ON table (columns)`
pub fn create_index(name: &str, table: &str, columns: &[&str]) -> String {
    let cols: Vec<String> = columns.iter().map(|c| quote(c)).collect();
    format!(
        "CREATE INDEX IF NOT EXISTS {} ON {} ({});",
        quote(name),
        quote(table),
        cols.join(", ")
    )
}

/// `DROP INDEX IF EXISTS name`
pub fn drop_index(name: &str) -> String {
    format!("DROP INDEX IF EXISTS {};", quote(name))
}

/// `DROP TABLE IF EXISTS name CASCADE`
pub fn drop_table(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {} CASCADE;", quote(table))
}

/// A named foreign key constraint.
#[derive(Debug, Clone, Copy)]
pub struct ForeignKey {
    pub name: &'static str,
    pub table: &'static str,
    pub column: &'static str,
    pub references: &'static str,
    pub on_delete_cascade: bool,
}

impl ForeignKey {
    /// Catalog-guarded `ADD CONSTRAINT .. FOREIGN KEY`.
    pub fn add_sql(&self) -> String {
        let on_delete = if self.on_delete_cascade {
            " ON DELETE CASCADE"
        } else {
            ""
        };
        add_constraint(
            self.name,
            self.table,
            &format!(
                "FOREIGN KEY ({}) REFERENCES {} (\"id\") ON UPDATE CASCADE{}",
                quote(self.column),
                quote(self.references),
                on_delete
            ),
        )
    }

    /// `ALTER TABLE .. DROP CONSTRAINT IF EXISTS ..`, tolerant of a missing table.
    pub fn drop_sql(&self) -> String {
        drop_constraint(self.name, self.table)
    }
}

/// Add a constraint only when no constraint with that name exists on the table.
pub fn add_constraint(name: &str, table: &str, body: &str) -> String {
    format!(
        r#"DO $$
BEGIN
    IF NOT EXISTS (
        SELECT 1 FROM pg_constraint
        WHERE conname = '{name}' AND conrelid = to_regclass('{qtable}')
    ) THEN
        ALTER TABLE {qtable} ADD CONSTRAINT {qname} {body};
    END IF;
END $$;"#,
        name = name,
        qname = quote(name),
        qtable = quote(table),
        body = body
    )
}

/// Drop a constraint if both the table and the constraint exist.
pub fn drop_constraint(name: &str, table: &str) -> String {
    format!(
        r#"DO $$
BEGIN
    IF to_regclass('{qtable}') IS NOT NULL THEN
        ALTER TABLE {qtable} DROP CONSTRAINT IF EXISTS {qname};
    END IF;
END $$;"#,
        qname = quote(name),
        qtable = quote(table)
    )
}
