/// Position and FIFO lot storage.
///
/// The FIFO engine replaces a wallet's entire position/lot state in one
/// transaction; rows are never patched in place.

use rusqlite::{ params, Row };

use super::Database;
use crate::types::{ CostBasisLot, Position };

const POSITION_SELECT_COLUMNS: &str =
    r#"
    wallet, token_mint, total_bought, total_sold, total_cost_sol, total_proceeds_sol,
    remaining_tokens, average_buy_price, realized_pnl_sol, trade_count, win_count,
    first_trade_at, last_trade_at
"#;

fn position_from_row(row: &Row) -> rusqlite::Result<Position> {
    Ok(Position {
        wallet: row.get(0)?,
        token_mint: row.get(1)?,
        total_bought: row.get(2)?,
        total_sold: row.get(3)?,
        total_cost_sol: row.get(4)?,
        total_proceeds_sol: row.get(5)?,
        remaining_tokens: row.get(6)?,
        average_buy_price: row.get(7)?,
        realized_pnl_sol: row.get(8)?,
        trade_count: row.get(9)?,
        win_count: row.get(10)?,
        first_trade_at: row.get(11)?,
        last_trade_at: row.get(12)?,
    })
}

fn lot_from_row(row: &Row) -> rusqlite::Result<CostBasisLot> {
    Ok(CostBasisLot {
        wallet: row.get(0)?,
        token_mint: row.get(1)?,
        trade_id: row.get(2)?,
        timestamp: row.get(3)?,
        original_amount: row.get(4)?,
        remaining_amount: row.get(5)?,
        price_per_token: row.get(6)?,
    })
}

impl Database {
    /// Atomically replace a wallet's FIFO state: delete all positions and
    /// lots, then write the recomputed set. Only lots with remaining > 0
    /// are persisted.
    pub fn replace_fifo_state(
        &self,
        wallet: &str,
        positions: &[Position],
        lots: &[CostBasisLot]
    ) -> Result<(), String> {
        let conn = self.conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| format!("Failed to start transaction: {}", e))?;

        tx
            .execute("DELETE FROM positions WHERE wallet = ?1", params![wallet])
            .map_err(|e| format!("Failed to clear positions: {}", e))?;
        tx
            .execute("DELETE FROM cost_basis_lots WHERE wallet = ?1", params![wallet])
            .map_err(|e| format!("Failed to clear lots: {}", e))?;

        {
            let mut stmt = tx
                .prepare(
                    r#"INSERT INTO positions
                   (wallet, token_mint, total_bought, total_sold, total_cost_sol, total_proceeds_sol,
                    remaining_tokens, average_buy_price, realized_pnl_sol, trade_count, win_count,
                    first_trade_at, last_trade_at)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"#
                )
                .map_err(|e| format!("Failed to prepare position insert: {}", e))?;

            for position in positions {
                stmt
                    .execute(
                        params![
                            position.wallet,
                            position.token_mint,
                            position.total_bought,
                            position.total_sold,
                            position.total_cost_sol,
                            position.total_proceeds_sol,
                            position.remaining_tokens,
                            position.average_buy_price,
                            position.realized_pnl_sol,
                            position.trade_count,
                            position.win_count,
                            position.first_trade_at,
                            position.last_trade_at
                        ]
                    )
                    .map_err(|e| format!("Failed to insert position: {}", e))?;
            }
        }

        {
            let mut stmt = tx
                .prepare(
                    r#"INSERT INTO cost_basis_lots
                   (wallet, token_mint, trade_id, timestamp, original_amount, remaining_amount, price_per_token)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#
                )
                .map_err(|e| format!("Failed to prepare lot insert: {}", e))?;

            for lot in lots {
                if lot.remaining_amount <= 0.0 {
                    continue;
                }
                stmt
                    .execute(
                        params![
                            lot.wallet,
                            lot.token_mint,
                            lot.trade_id,
                            lot.timestamp,
                            lot.original_amount,
                            lot.remaining_amount,
                            lot.price_per_token
                        ]
                    )
                    .map_err(|e| format!("Failed to insert lot: {}", e))?;
            }
        }

        tx.commit().map_err(|e| format!("Failed to commit FIFO state: {}", e))
    }

    pub fn positions_for_wallet(&self, wallet: &str) -> Result<Vec<Position>, String> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                &format!(
                    "SELECT {} FROM positions WHERE wallet = ?1 ORDER BY token_mint",
                    POSITION_SELECT_COLUMNS
                )
            )
            .map_err(|e| format!("Failed to prepare position scan: {}", e))?;

        let rows = stmt
            .query_map(params![wallet], position_from_row)
            .map_err(|e| format!("Failed to scan positions: {}", e))?;

        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(|e|
            format!("Failed to read position row: {}", e)
        )
    }

    /// Open lots for a wallet, oldest first
    pub fn lots_for_wallet(&self, wallet: &str) -> Result<Vec<CostBasisLot>, String> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT wallet, token_mint, trade_id, timestamp, original_amount, remaining_amount, price_per_token
                 FROM cost_basis_lots WHERE wallet = ?1 ORDER BY token_mint, timestamp, id"
            )
            .map_err(|e| format!("Failed to prepare lot scan: {}", e))?;

        let rows = stmt
            .query_map(params![wallet], lot_from_row)
            .map_err(|e| format!("Failed to scan lots: {}", e))?;

        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(|e|
            format!("Failed to read lot row: {}", e)
        )
    }
}
