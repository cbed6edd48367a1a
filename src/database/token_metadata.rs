/// Token metadata cache and the launch table used by the profiler

use rusqlite::{ params, OptionalExtension };
use std::collections::HashMap;

use super::Database;
use crate::types::{ TokenLaunch, TokenMetadata };

impl Database {
    pub fn upsert_token_metadata(&self, metadata: &TokenMetadata) -> Result<(), String> {
        let conn = self.conn()?;
        conn
            .execute(
                r#"INSERT OR REPLACE INTO token_metadata (mint, symbol, name, decimals, fetched_at)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
                params![
                    metadata.mint,
                    metadata.symbol,
                    metadata.name,
                    metadata.decimals,
                    metadata.fetched_at
                ]
            )
            .map_err(|e| format!("Failed to upsert token metadata: {}", e))?;
        Ok(())
    }

    pub fn get_token_metadata(&self, mint: &str) -> Result<Option<TokenMetadata>, String> {
        let conn = self.conn()?;
        conn
            .query_row(
                "SELECT mint, symbol, name, decimals, fetched_at FROM token_metadata WHERE mint = ?1",
                params![mint],
                |row| {
                    Ok(TokenMetadata {
                        mint: row.get(0)?,
                        symbol: row.get(1)?,
                        name: row.get(2)?,
                        decimals: row.get(3)?,
                        fetched_at: row.get(4)?,
                    })
                }
            )
            .optional()
            .map_err(|e| format!("Failed to get token metadata: {}", e))
    }

    pub fn delete_token_metadata(&self, mint: &str) -> Result<(), String> {
        let conn = self.conn()?;
        conn
            .execute("DELETE FROM token_metadata WHERE mint = ?1", params![mint])
            .map_err(|e| format!("Failed to delete token metadata: {}", e))?;
        Ok(())
    }

    // =========================================================================
    // LAUNCH TABLE
    // =========================================================================

    /// Replace the launch table wholesale and remember the raw-transaction
    /// count it was derived from, so refreshes can be skipped while the
    /// stored set is unchanged.
    pub fn replace_token_launches(
        &self,
        launches: &[TokenLaunch],
        derived_from_tx_count: u64
    ) -> Result<(), String> {
        let conn = self.conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| format!("Failed to start transaction: {}", e))?;

        tx
            .execute("DELETE FROM token_launches", [])
            .map_err(|e| format!("Failed to clear token launches: {}", e))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO token_launches (mint, first_signature, first_timestamp, first_slot)
                 VALUES (?1, ?2, ?3, ?4)"
                )
                .map_err(|e| format!("Failed to prepare launch insert: {}", e))?;

            for launch in launches {
                stmt
                    .execute(
                        params![
                            launch.mint,
                            launch.first_signature,
                            launch.first_timestamp,
                            launch.first_slot as i64
                        ]
                    )
                    .map_err(|e| format!("Failed to insert launch: {}", e))?;
            }
        }

        tx
            .execute(
                "INSERT OR REPLACE INTO db_metadata (key, value) VALUES ('launches_tx_count', ?1)",
                params![derived_from_tx_count.to_string()]
            )
            .map_err(|e| format!("Failed to record launch snapshot count: {}", e))?;

        tx.commit().map_err(|e| format!("Failed to commit launches: {}", e))
    }

    /// Raw-transaction count the launch table was last derived from
    pub fn launches_snapshot_count(&self) -> Result<Option<u64>, String> {
        let conn = self.conn()?;
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM db_metadata WHERE key = 'launches_tx_count'",
                [],
                |row| row.get(0)
            )
            .optional()
            .map_err(|e| format!("Failed to read launch snapshot count: {}", e))?;
        Ok(value.and_then(|v| v.parse().ok()))
    }

    pub fn token_launches(&self) -> Result<HashMap<String, TokenLaunch>, String> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT mint, first_signature, first_timestamp, first_slot FROM token_launches")
            .map_err(|e| format!("Failed to prepare launch scan: {}", e))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(TokenLaunch {
                    mint: row.get(0)?,
                    first_signature: row.get(1)?,
                    first_timestamp: row.get(2)?,
                    first_slot: row.get::<_, i64>(3)? as u64,
                })
            })
            .map_err(|e| format!("Failed to scan launches: {}", e))?;

        let mut map = HashMap::new();
        for row in rows {
            let launch = row.map_err(|e| format!("Failed to read launch row: {}", e))?;
            map.insert(launch.mint.clone(), launch);
        }
        Ok(map)
    }
}
