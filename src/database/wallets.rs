/// Wallet catalog: metadata upserts, sync cursor, cached rollups and
/// cascading removal of everything a wallet owns.

use rusqlite::{ params, OptionalExtension, Row };

use super::Database;
use crate::types::{ TrackedWallet, WalletRollups };

const WALLET_SELECT_COLUMNS: &str =
    r#"
    address, user_id, name, emoji, alerts_on,
    last_synced_at, first_synced_at, last_signature, total_transactions,
    total_realized_pnl, win_rate, total_sol_volume, total_trades,
    quick_flip_rate, exited_token_rate, created_at
"#;

fn wallet_from_row(row: &Row) -> rusqlite::Result<TrackedWallet> {
    Ok(TrackedWallet {
        address: row.get(0)?,
        owner: row.get(1)?,
        name: row.get(2)?,
        emoji: row.get(3)?,
        alerts_on: row.get(4)?,
        last_synced_at: row.get(5)?,
        first_synced_at: row.get(6)?,
        last_signature: row.get(7)?,
        total_transactions: row.get(8)?,
        total_realized_pnl: row.get(9)?,
        win_rate: row.get(10)?,
        total_sol_volume: row.get(11)?,
        total_trades: row.get(12)?,
        quick_flip_rate: row.get(13)?,
        exited_token_rate: row.get(14)?,
        created_at: row.get(15)?,
    })
}

impl Database {
    /// Create or update wallet display metadata. Cursor and rollup fields
    /// are untouched; those belong to the sync coordinator.
    pub fn upsert_wallet(&self, wallet: &TrackedWallet) -> Result<(), String> {
        let conn = self.conn()?;

        conn
            .execute(
                "INSERT OR IGNORE INTO users (id, created_at) VALUES (?1, ?2)",
                params![wallet.owner, wallet.created_at]
            )
            .map_err(|e| format!("Failed to upsert user: {}", e))?;

        conn
            .execute(
                r#"INSERT INTO wallets (address, user_id, name, emoji, alerts_on, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)
               ON CONFLICT(address, user_id) DO UPDATE SET
                   name = excluded.name,
                   emoji = excluded.emoji,
                   alerts_on = excluded.alerts_on"#,
                params![
                    wallet.address,
                    wallet.owner,
                    wallet.name,
                    wallet.emoji,
                    wallet.alerts_on,
                    wallet.created_at
                ]
            )
            .map_err(|e| format!("Failed to upsert wallet: {}", e))?;

        Ok(())
    }

    pub fn get_wallet(&self, address: &str, owner: &str) -> Result<Option<TrackedWallet>, String> {
        let conn = self.conn()?;
        conn
            .query_row(
                &format!(
                    "SELECT {} FROM wallets WHERE address = ?1 AND user_id = ?2",
                    WALLET_SELECT_COLUMNS
                ),
                params![address, owner],
                wallet_from_row
            )
            .optional()
            .map_err(|e| format!("Failed to get wallet: {}", e))
    }

    pub fn list_wallets(&self, owner: &str) -> Result<Vec<TrackedWallet>, String> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                &format!(
                    "SELECT {} FROM wallets WHERE user_id = ?1 ORDER BY created_at",
                    WALLET_SELECT_COLUMNS
                )
            )
            .map_err(|e| format!("Failed to prepare wallet listing: {}", e))?;

        let rows = stmt
            .query_map(params![owner], wallet_from_row)
            .map_err(|e| format!("Failed to list wallets: {}", e))?;

        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(|e|
            format!("Failed to read wallet row: {}", e)
        )
    }

    /// Latest ingested signature for a wallet address (any owner)
    pub fn latest_signature(&self, address: &str) -> Result<Option<String>, String> {
        let conn = self.conn()?;
        conn
            .query_row(
                "SELECT last_signature FROM wallets WHERE address = ?1 AND last_signature IS NOT NULL
                 ORDER BY last_synced_at DESC LIMIT 1",
                params![address],
                |row| row.get(0)
            )
            .optional()
            .map_err(|e| format!("Failed to read latest signature: {}", e))
            .map(|opt: Option<Option<String>>| opt.flatten())
    }

    /// Write the cached rollups refreshed after a sync run
    pub fn update_wallet_rollups(
        &self,
        address: &str,
        rollups: &WalletRollups
    ) -> Result<(), String> {
        let conn = self.conn()?;
        conn
            .execute(
                r#"UPDATE wallets SET
                   total_realized_pnl = ?2,
                   win_rate = ?3,
                   total_sol_volume = ?4,
                   total_trades = ?5,
                   quick_flip_rate = ?6,
                   exited_token_rate = ?7
               WHERE address = ?1"#,
                params![
                    address,
                    rollups.total_realized_pnl,
                    rollups.win_rate,
                    rollups.total_sol_volume,
                    rollups.total_trades,
                    rollups.quick_flip_rate,
                    rollups.exited_token_rate
                ]
            )
            .map_err(|e| format!("Failed to update wallet rollups: {}", e))?;
        Ok(())
    }

    /// Remove a wallet and everything it owns in one transaction:
    /// trades, positions, lots, raw transactions and its follow score.
    pub fn remove_wallet(&self, address: &str, owner: &str) -> Result<(), String> {
        let conn = self.conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| format!("Failed to start transaction: {}", e))?;

        for sql in [
            "DELETE FROM trades WHERE wallet = ?1",
            "DELETE FROM positions WHERE wallet = ?1",
            "DELETE FROM cost_basis_lots WHERE wallet = ?1",
            "DELETE FROM transactions WHERE wallet = ?1",
            "DELETE FROM wallet_follow_scores WHERE wallet = ?1",
        ] {
            tx.execute(sql, params![address]).map_err(|e|
                format!("Failed to sweep wallet data: {}", e)
            )?;
        }

        tx
            .execute(
                "DELETE FROM wallets WHERE address = ?1 AND user_id = ?2",
                params![address, owner]
            )
            .map_err(|e| format!("Failed to delete wallet: {}", e))?;

        tx.commit().map_err(|e| format!("Failed to commit wallet removal: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_upsert_preserves_cursor() {
        let db = Database::open_in_memory().unwrap();
        let mut wallet = TrackedWallet::new("addr1", "user1", "Alpha", "🐋", 1000);
        db.upsert_wallet(&wallet).unwrap();

        // Simulate cursor advance
        let conn = db.conn().unwrap();
        conn
            .execute(
                "UPDATE wallets SET last_signature = 'sig9', total_transactions = 9 WHERE address = 'addr1'",
                []
            )
            .unwrap();
        drop(conn);

        // Metadata upsert must not clobber the cursor
        wallet.name = "Alpha Renamed".to_string();
        db.upsert_wallet(&wallet).unwrap();

        let loaded = db.get_wallet("addr1", "user1").unwrap().unwrap();
        assert_eq!(loaded.name, "Alpha Renamed");
        assert_eq!(loaded.last_signature, Some("sig9".to_string()));
        assert_eq!(loaded.total_transactions, 9);
        assert_eq!(db.latest_signature("addr1").unwrap(), Some("sig9".to_string()));
    }

    #[test]
    fn test_remove_wallet_sweeps_owned_rows() {
        let db = Database::open_in_memory().unwrap();
        let wallet = TrackedWallet::new("addr1", "user1", "Alpha", "", 1000);
        db.upsert_wallet(&wallet).unwrap();

        let conn = db.conn().unwrap();
        conn
            .execute(
                "INSERT INTO trades (id, wallet, signature, timestamp, side, token_mint, token_amount, sol_amount, price_per_token, dex)
             VALUES ('t1', 'addr1', 's1', 1, 'buy', 'mint1', 10.0, 1.0, 0.1, 'Jupiter')",
                []
            )
            .unwrap();
        conn
            .execute(
                "INSERT INTO positions (wallet, token_mint) VALUES ('addr1', 'mint1')",
                []
            )
            .unwrap();
        drop(conn);

        db.remove_wallet("addr1", "user1").unwrap();

        assert!(db.get_wallet("addr1", "user1").unwrap().is_none());
        let conn = db.conn().unwrap();
        let trades: i64 = conn
            .query_row("SELECT COUNT(*) FROM trades WHERE wallet = 'addr1'", [], |r| r.get(0))
            .unwrap();
        let positions: i64 = conn
            .query_row("SELECT COUNT(*) FROM positions WHERE wallet = 'addr1'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(trades, 0);
        assert_eq!(positions, 0);
    }
}
