// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded schema migrations (refinery).
//!
//! SQL files under `migrations/` are compiled in with `embed_migrations!`
//! and applied by [`crate::Database::open`].

use wabot_core::WabotError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Apply pending migrations. Refinery records progress in `refinery_schema_history`.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), WabotError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(|e| WabotError::Storage {
            source: Box::new(e),
        })?;
    for migration in report.applied_migrations() {
        tracing::debug!(version = migration.version(), name = migration.name(), "migration applied");
    }
    Ok(())
}
