/// Trade storage: replace-on-conflict upserts keyed by the deterministic
/// trade id, and wallet-scoped range scans for the read paths.

use rusqlite::{ params, Row };

use super::Database;
use crate::types::{ Trade, TradeSide };

const TRADE_SELECT_COLUMNS: &str =
    "id, wallet, signature, timestamp, side, token_mint, token_amount, sol_amount, price_per_token, dex";

fn trade_from_row(row: &Row) -> rusqlite::Result<Trade> {
    let side_str: String = row.get(4)?;
    let side = TradeSide::from_str(&side_str).unwrap_or(TradeSide::Buy);
    Ok(Trade {
        id: row.get(0)?,
        wallet: row.get(1)?,
        signature: row.get(2)?,
        timestamp: row.get(3)?,
        side,
        token_mint: row.get(5)?,
        token_amount: row.get(6)?,
        sol_amount: row.get(7)?,
        price_per_token: row.get(8)?,
        dex: row.get(9)?,
    })
}

impl Database {
    /// Upsert a trade; same deterministic id replaces the previous row
    pub fn upsert_trade(&self, trade: &Trade) -> Result<(), String> {
        let conn = self.conn()?;
        Self::upsert_trade_on(&conn, trade)
    }

    /// Statement shared with the sync commit transaction
    pub(crate) fn upsert_trade_on(
        conn: &rusqlite::Connection,
        trade: &Trade
    ) -> Result<(), String> {
        conn
            .execute(
                r#"INSERT OR REPLACE INTO trades
               (id, wallet, signature, timestamp, side, token_mint, token_amount, sol_amount, price_per_token, dex)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"#,
                params![
                    trade.id,
                    trade.wallet,
                    trade.signature,
                    trade.timestamp,
                    trade.side.as_str(),
                    trade.token_mint,
                    trade.token_amount,
                    trade.sol_amount,
                    trade.price_per_token,
                    trade.dex
                ]
            )
            .map_err(|e| format!("Failed to upsert trade: {}", e))?;
        Ok(())
    }

    /// Trades for a wallet sorted by timestamp, optionally bounded below
    pub fn trades_for_wallet(
        &self,
        wallet: &str,
        since: Option<i64>
    ) -> Result<Vec<Trade>, String> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                &format!(
                    "SELECT {} FROM trades WHERE wallet = ?1 AND timestamp >= ?2
                 ORDER BY timestamp, signature, side",
                    TRADE_SELECT_COLUMNS
                )
            )
            .map_err(|e| format!("Failed to prepare trade scan: {}", e))?;

        let rows = stmt
            .query_map(params![wallet, since.unwrap_or(0)], trade_from_row)
            .map_err(|e| format!("Failed to scan trades: {}", e))?;

        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(|e|
            format!("Failed to read trade row: {}", e)
        )
    }

    pub fn count_trades(&self, wallet: &str) -> Result<u64, String> {
        let conn = self.conn()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM trades WHERE wallet = ?1", params![wallet], |row|
                row.get(0)
            )
            .map_err(|e| format!("Failed to count trades: {}", e))?;
        Ok(count as u64)
    }
}
