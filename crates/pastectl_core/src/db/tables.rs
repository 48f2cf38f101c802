//! redb table definitions shared by storage modules.

use redb::TableDefinition;

/// File name for the redb database within the configured DB directory.
pub const REDB_FILE_NAME: &str = "data.redb";

/// Canonical paste rows (`Paste`, bincode-encoded).
pub const PASTES: TableDefinition<&str, &[u8]> = TableDefinition::new("pastes");

/// Expiry index ordered by expire millis then id. Pastes without an expiry
/// have no entry here.
pub const PASTES_BY_EXPIRY: TableDefinition<(u64, &str), ()> =
    TableDefinition::new("pastes_by_expiry");
