/// SQLite persistence adapter
///
/// Thread-safe store built on a connection pool with WAL journaling.
/// Multi-statement writes (sync commits, FIFO rebuilds, wallet removal)
/// run inside a single transaction: either every row is visible after
/// commit or none is. Schema setup is idempotent and migrations are
/// additive, probing for column presence before ALTER TABLE.

mod follow_scores;
mod positions;
mod schema;
mod token_metadata;
mod trades;
mod transactions;
mod wallets;

use r2d2::{ Pool, PooledConnection };
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

use crate::logger::{ self, LogTag };
use schema::{ INDEXES, SCHEMA_STATEMENTS, SCHEMA_VERSION };

/// Connection-pooled store shared across all subsystems
pub struct Database {
    pub(crate) pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Open (or create) the database at the given path
    pub fn open(path: &str) -> Result<Self, String> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs
                    ::create_dir_all(parent)
                    .map_err(|e| format!("Failed to create data directory: {}", e))?;
            }
        }

        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(5)
            .min_idle(Some(1))
            .build(manager)
            .map_err(|e| format!("Failed to create connection pool: {}", e))?;

        let db = Database { pool };
        db.initialize_schema()?;
        db.run_migrations()?;

        logger::debug(LogTag::Database, &format!("Database ready at {}", path));
        Ok(db)
    }

    /// Open an in-memory database. The pool is capped at a single connection
    /// so every operation sees the same memory store.
    pub fn open_in_memory() -> Result<Self, String> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| format!("Failed to create connection pool: {}", e))?;

        let db = Database { pool };
        db.initialize_schema()?;
        db.run_migrations()?;
        Ok(db)
    }

    pub(crate) fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, String> {
        self.pool.get().map_err(|e| format!("Failed to get database connection: {}", e))
    }

    /// Create tables, indexes and pragmas. Safe to run repeatedly.
    fn initialize_schema(&self) -> Result<(), String> {
        let conn = self.conn()?;

        conn
            .pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| format!("Failed to set WAL mode: {}", e))?;
        conn
            .pragma_update(None, "foreign_keys", true)
            .map_err(|e| format!("Failed to enable foreign keys: {}", e))?;
        conn
            .pragma_update(None, "synchronous", "NORMAL")
            .map_err(|e| format!("Failed to set synchronous mode: {}", e))?;

        for statement in SCHEMA_STATEMENTS {
            conn.execute(statement, []).map_err(|e| format!("Failed to create table: {}", e))?;
        }

        for index_sql in INDEXES {
            conn.execute(index_sql, []).map_err(|e| format!("Failed to create index: {}", e))?;
        }

        conn
            .execute(
                "INSERT OR IGNORE INTO db_metadata (key, value) VALUES ('schema_version', ?1)",
                params![SCHEMA_VERSION.to_string()]
            )
            .map_err(|e| format!("Failed to set schema version: {}", e))?;

        Ok(())
    }

    /// Additive, idempotent migrations plus their one-shot backfill passes
    fn run_migrations(&self) -> Result<(), String> {
        let conn = self.conn()?;

        // v2: sync cursor metadata on wallets
        if !schema::column_exists(&conn, "wallets", "first_synced_at")? {
            conn
                .execute("ALTER TABLE wallets ADD COLUMN first_synced_at INTEGER", [])
                .map_err(|e| format!("Failed to add first_synced_at: {}", e))?;
        }

        // v3: behavior stat rollups on wallets
        for column in ["quick_flip_rate", "exited_token_rate"] {
            if !schema::column_exists(&conn, "wallets", column)? {
                conn
                    .execute(
                        &format!("ALTER TABLE wallets ADD COLUMN {} REAL NOT NULL DEFAULT 0", column),
                        []
                    )
                    .map_err(|e| format!("Failed to add {}: {}", column, e))?;
            }
        }

        let version: u32 = conn
            .query_row(
                "SELECT value FROM db_metadata WHERE key = 'schema_version'",
                [],
                |row| row.get::<_, String>(0)
            )
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);

        if version < SCHEMA_VERSION {
            self.backfill_first_synced_at(&conn)?;
            self.backfill_behavior_stats(&conn)?;
            conn
                .execute(
                    "INSERT OR REPLACE INTO db_metadata (key, value) VALUES ('schema_version', ?1)",
                    params![SCHEMA_VERSION.to_string()]
                )
                .map_err(|e| format!("Failed to bump schema version: {}", e))?;
            logger::info(
                LogTag::Database,
                &format!("Migrated schema {} -> {}", version, SCHEMA_VERSION)
            );
        }

        Ok(())
    }

    /// Atomically commit one sync batch: advance the wallet cursor, insert
    /// raw transactions (idempotent) and upsert the parsed trades. Either
    /// all of it becomes visible or none of it does.
    pub fn commit_sync_batch(
        &self,
        wallet: &crate::types::TrackedWallet,
        raw_transactions: &[crate::types::RawTransaction],
        trades: &[crate::types::Trade]
    ) -> Result<(), String> {
        let conn = self.conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| format!("Failed to start sync transaction: {}", e))?;

        tx
            .execute(
                "INSERT OR IGNORE INTO users (id, created_at) VALUES (?1, ?2)",
                params![wallet.owner, wallet.created_at]
            )
            .map_err(|e| format!("Failed to upsert user: {}", e))?;

        tx
            .execute(
                r#"INSERT INTO wallets (address, user_id, name, emoji, alerts_on,
                                    last_synced_at, first_synced_at, last_signature,
                                    total_transactions, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
               ON CONFLICT(address, user_id) DO UPDATE SET
                   last_synced_at = excluded.last_synced_at,
                   first_synced_at = COALESCE(wallets.first_synced_at, excluded.first_synced_at),
                   last_signature = COALESCE(excluded.last_signature, wallets.last_signature),
                   total_transactions = excluded.total_transactions"#,
                params![
                    wallet.address,
                    wallet.owner,
                    wallet.name,
                    wallet.emoji,
                    wallet.alerts_on,
                    wallet.last_synced_at,
                    wallet.first_synced_at,
                    wallet.last_signature,
                    wallet.total_transactions,
                    wallet.created_at
                ]
            )
            .map_err(|e| format!("Failed to advance wallet cursor: {}", e))?;

        {
            let mut stmt = tx
                .prepare(
                    r#"INSERT OR IGNORE INTO transactions (signature, wallet, block_time, slot, payload, parsed)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#
                )
                .map_err(|e| format!("Failed to prepare raw insert: {}", e))?;

            for raw in raw_transactions {
                stmt
                    .execute(
                        params![
                            raw.signature,
                            raw.wallet,
                            raw.block_time,
                            raw.slot as i64,
                            raw.payload,
                            raw.parsed
                        ]
                    )
                    .map_err(|e| format!("Failed to insert raw transaction: {}", e))?;
            }
        }

        for trade in trades {
            Self::upsert_trade_on(&tx, trade)?;
        }

        tx.commit().map_err(|e| format!("Failed to commit sync batch: {}", e))
    }

    /// Populate first_synced_at for wallets missing it, from the earliest
    /// stored raw transaction. Runs once after the cursor migration.
    fn backfill_first_synced_at(
        &self,
        conn: &rusqlite::Connection
    ) -> Result<(), String> {
        conn
            .execute(
                "UPDATE wallets SET first_synced_at = (
                    SELECT MIN(block_time) FROM transactions
                    WHERE transactions.wallet = wallets.address
                 )
                 WHERE first_synced_at IS NULL",
                []
            )
            .map_err(|e| format!("Failed to backfill first_synced_at: {}", e))?;
        Ok(())
    }

    /// Populate the behavior-stat rollups for wallets that predate the
    /// columns, straight from their stored trades.
    fn backfill_behavior_stats(
        &self,
        conn: &rusqlite::Connection
    ) -> Result<(), String> {
        conn
            .execute(
                r#"UPDATE wallets SET
                exited_token_rate = COALESCE((
                    SELECT CAST(SUM(has_both) AS REAL) / COUNT(*)
                    FROM (
                        SELECT token_mint,
                               MAX(CASE WHEN side = 'buy' THEN 1 ELSE 0 END) *
                               MAX(CASE WHEN side = 'sell' THEN 1 ELSE 0 END) AS has_both
                        FROM trades WHERE trades.wallet = wallets.address
                        GROUP BY token_mint
                    )
                ), 0),
                quick_flip_rate = COALESCE((
                    SELECT CAST(SUM(CASE WHEN first_buy IS NOT NULL
                                          AND first_sell - first_buy < 600
                                         THEN 1 ELSE 0 END) AS REAL) / COUNT(*)
                    FROM (
                        SELECT token_mint,
                               MIN(CASE WHEN side = 'buy' THEN timestamp END) AS first_buy,
                               MIN(CASE WHEN side = 'sell' THEN timestamp END) AS first_sell
                        FROM trades WHERE trades.wallet = wallets.address
                        GROUP BY token_mint
                        HAVING first_sell IS NOT NULL
                    )
                ), 0)
             WHERE quick_flip_rate = 0 AND exited_token_rate = 0"#,
                []
            )
            .map_err(|e| format!("Failed to backfill behavior stats: {}", e))?;
        Ok(())
    }
}
