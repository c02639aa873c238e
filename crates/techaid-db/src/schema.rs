//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! Employee UUIDs are stored as strings, ticket ids as integer record
//! keys. Enums are stored as their canonical names with ASSERT
//! constraints for validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Employees
-- =======================================================================
DEFINE TABLE employee SCHEMAFULL;
DEFINE FIELD email ON TABLE employee TYPE string \
    ASSERT $value = string::lowercase($value);
DEFINE FIELD password_hash ON TABLE employee TYPE string;
DEFINE FIELD first_name ON TABLE employee TYPE string;
DEFINE FIELD last_name ON TABLE employee TYPE string;
DEFINE FIELD phone_number ON TABLE employee TYPE string;
DEFINE FIELD role ON TABLE employee TYPE string \
    ASSERT $value IN ['ADMIN', 'BANK_STAFF', 'IT_PERSONNEL'];
DEFINE FIELD department ON TABLE employee TYPE option<string> \
    ASSERT $value = NONE OR $value IN ['SALES', 'MARKETING', \
    'CUSTOMER_SERVICE', 'OPERATIONS', 'TREASURY', 'HUMAN_RESOURCES'];
DEFINE FIELD refresh_token_hash ON TABLE employee TYPE option<string>;
DEFINE FIELD refresh_token_expires_at ON TABLE employee \
    TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE employee TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE employee TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_employee_email ON TABLE employee COLUMNS email UNIQUE;
DEFINE INDEX idx_employee_refresh ON TABLE employee \
    COLUMNS refresh_token_hash;

-- =======================================================================
-- Tickets (integer record keys issued by ticket_sequence)
-- =======================================================================
DEFINE TABLE ticket SCHEMAFULL;
DEFINE FIELD subject ON TABLE ticket TYPE string;
DEFINE FIELD description ON TABLE ticket TYPE string;
DEFINE FIELD attachment ON TABLE ticket TYPE option<string>;
DEFINE FIELD category ON TABLE ticket TYPE string \
    ASSERT $value IN ['NETWORK', 'TRANSACTION', 'SOFTWARE', 'HARDWARE'];
DEFINE FIELD department ON TABLE ticket TYPE string \
    ASSERT $value IN ['SALES', 'MARKETING', 'CUSTOMER_SERVICE', \
    'OPERATIONS', 'TREASURY', 'HUMAN_RESOURCES'];
DEFINE FIELD priority ON TABLE ticket TYPE string \
    ASSERT $value IN ['LOW', 'MEDIUM', 'HIGH'];
DEFINE FIELD status ON TABLE ticket TYPE string \
    ASSERT $value IN ['NOT_ACTIVE', 'ACTIVE', 'COMPLETED'];
DEFINE FIELD requester_id ON TABLE ticket TYPE string;
DEFINE FIELD assignee_id ON TABLE ticket TYPE option<string>;
DEFINE FIELD comment ON TABLE ticket TYPE option<string>;
DEFINE FIELD created_at ON TABLE ticket TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE ticket TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_ticket_requester ON TABLE ticket COLUMNS requester_id;
DEFINE INDEX idx_ticket_assignee ON TABLE ticket COLUMNS assignee_id;
DEFINE INDEX idx_ticket_created ON TABLE ticket COLUMNS created_at;

DEFINE TABLE ticket_sequence SCHEMAFULL;
DEFINE FIELD last_id ON TABLE ticket_sequence TYPE int DEFAULT 0;
";

/// Apply all pending migrations. Safe to call on every startup.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }
        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        db.query(migration.sql).await?.check().map_err(|e| {
            DbError::Migration(format!(
                "Migration v{} '{}' failed: {}",
                migration.version, migration.name, e,
            ))
        })?;

        db.query("CREATE _migration SET version = $version, name = $name")
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

        info!(version = migration.version, "Migration applied");
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
