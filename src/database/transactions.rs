/// Raw transaction storage: write-once payloads keyed by signature,
/// with the parsed flag as the only mutable field.

use rusqlite::{ params, OptionalExtension, Row };

use super::Database;
use crate::types::RawTransaction;

fn raw_tx_from_row(row: &Row) -> rusqlite::Result<RawTransaction> {
    Ok(RawTransaction {
        signature: row.get(0)?,
        wallet: row.get(1)?,
        block_time: row.get(2)?,
        slot: row.get::<_, i64>(3)? as u64,
        payload: row.get(4)?,
        parsed: row.get(5)?,
    })
}

impl Database {
    /// Insert a raw transaction; a second insert with the same signature
    /// for the same wallet is a no-op.
    pub fn insert_raw_transaction(&self, tx: &RawTransaction) -> Result<(), String> {
        let conn = self.conn()?;
        conn
            .execute(
                r#"INSERT OR IGNORE INTO transactions (signature, wallet, block_time, slot, payload, parsed)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
                params![
                    tx.signature,
                    tx.wallet,
                    tx.block_time,
                    tx.slot as i64,
                    tx.payload,
                    tx.parsed
                ]
            )
            .map_err(|e| format!("Failed to insert raw transaction: {}", e))?;
        Ok(())
    }

    /// Flip the parsed flag once the parser has consumed the record
    pub fn mark_transaction_parsed(&self, signature: &str, wallet: &str) -> Result<(), String> {
        let conn = self.conn()?;
        conn
            .execute(
                "UPDATE transactions SET parsed = 1 WHERE signature = ?1 AND wallet = ?2",
                params![signature, wallet]
            )
            .map_err(|e| format!("Failed to mark transaction parsed: {}", e))?;
        Ok(())
    }

    pub fn get_raw_transaction(
        &self,
        signature: &str,
        wallet: &str
    ) -> Result<Option<RawTransaction>, String> {
        let conn = self.conn()?;
        conn
            .query_row(
                "SELECT signature, wallet, block_time, slot, payload, parsed
                 FROM transactions WHERE signature = ?1 AND wallet = ?2",
                params![signature, wallet],
                raw_tx_from_row
            )
            .optional()
            .map_err(|e| format!("Failed to get raw transaction: {}", e))
    }

    /// All stored raw transactions, oldest first. Used by the launch-table
    /// materialization pass.
    pub fn list_raw_transactions(&self) -> Result<Vec<RawTransaction>, String> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT signature, wallet, block_time, slot, payload, parsed
                 FROM transactions ORDER BY block_time, signature"
            )
            .map_err(|e| format!("Failed to prepare transaction scan: {}", e))?;

        let rows = stmt
            .query_map([], raw_tx_from_row)
            .map_err(|e| format!("Failed to scan transactions: {}", e))?;

        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(|e|
            format!("Failed to read transaction row: {}", e)
        )
    }

    pub fn count_raw_transactions(&self) -> Result<u64, String> {
        let conn = self.conn()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))
            .map_err(|e| format!("Failed to count transactions: {}", e))?;
        Ok(count as u64)
    }

    /// Signatures already stored for a wallet, for dedup before parsing
    pub fn known_signatures(&self, wallet: &str) -> Result<std::collections::HashSet<String>, String> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT signature FROM transactions WHERE wallet = ?1")
            .map_err(|e| format!("Failed to prepare signature scan: {}", e))?;

        let rows = stmt
            .query_map(params![wallet], |row| row.get::<_, String>(0))
            .map_err(|e| format!("Failed to scan signatures: {}", e))?;

        let mut set = std::collections::HashSet::new();
        for row in rows {
            set.insert(row.map_err(|e| format!("Failed to read signature: {}", e))?);
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tx(signature: &str) -> RawTransaction {
        RawTransaction {
            signature: signature.to_string(),
            wallet: "addr1".to_string(),
            block_time: 1700000000,
            slot: 250_000_000,
            payload: "{}".to_string(),
            parsed: false,
        }
    }

    #[test]
    fn test_insert_idempotent_on_signature() {
        let db = Database::open_in_memory().unwrap();
        let tx = sample_tx("sig1");
        db.insert_raw_transaction(&tx).unwrap();

        // Second insert with different payload must not overwrite
        let mut altered = sample_tx("sig1");
        altered.payload = "{\"changed\":true}".to_string();
        db.insert_raw_transaction(&altered).unwrap();

        let stored = db.get_raw_transaction("sig1", "addr1").unwrap().unwrap();
        assert_eq!(stored.payload, "{}");
        assert_eq!(db.count_raw_transactions().unwrap(), 1);
    }

    #[test]
    fn test_parsed_flag_is_mutable() {
        let db = Database::open_in_memory().unwrap();
        db.insert_raw_transaction(&sample_tx("sig1")).unwrap();
        db.mark_transaction_parsed("sig1", "addr1").unwrap();

        let stored = db.get_raw_transaction("sig1", "addr1").unwrap().unwrap();
        assert!(stored.parsed);
        assert!(db.known_signatures("addr1").unwrap().contains("sig1"));
    }
}
