/// Follow-score persistence: one row per wallet, replaced on recompute

use rusqlite::{ params, OptionalExtension };

use super::Database;
use crate::types::{ FollowScore, SlippageModel };

impl Database {
    pub fn upsert_follow_score(&self, score: &FollowScore) -> Result<(), String> {
        let conn = self.conn()?;
        conn
            .execute(
                r#"INSERT OR REPLACE INTO wallet_follow_scores
               (wallet, delay_seconds, slippage_model, actual_pnl_sol, simulated_pnl_sol,
                followability_ratio, quick_dump_rate, avg_time_to_first_sell_secs,
                median_time_to_first_sell_secs, followable_tokens, unfollowable_tokens,
                avg_entry_size_sol, computed_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"#,
                params![
                    score.wallet,
                    score.delay_seconds,
                    score.slippage_model.as_str(),
                    score.actual_pnl_sol,
                    score.simulated_pnl_sol,
                    score.followability_ratio,
                    score.quick_dump_rate,
                    score.avg_time_to_first_sell_secs,
                    score.median_time_to_first_sell_secs,
                    score.followable_tokens,
                    score.unfollowable_tokens,
                    score.avg_entry_size_sol,
                    score.computed_at
                ]
            )
            .map_err(|e| format!("Failed to upsert follow score: {}", e))?;
        Ok(())
    }

    pub fn get_follow_score(&self, wallet: &str) -> Result<Option<FollowScore>, String> {
        let conn = self.conn()?;
        conn
            .query_row(
                r#"SELECT wallet, delay_seconds, slippage_model, actual_pnl_sol, simulated_pnl_sol,
                      followability_ratio, quick_dump_rate, avg_time_to_first_sell_secs,
                      median_time_to_first_sell_secs, followable_tokens, unfollowable_tokens,
                      avg_entry_size_sol, computed_at
               FROM wallet_follow_scores WHERE wallet = ?1"#,
                params![wallet],
                |row| {
                    let model_str: String = row.get(2)?;
                    Ok(FollowScore {
                        wallet: row.get(0)?,
                        delay_seconds: row.get(1)?,
                        slippage_model: SlippageModel::from_str(&model_str).unwrap_or(
                            SlippageModel::Moderate
                        ),
                        actual_pnl_sol: row.get(3)?,
                        simulated_pnl_sol: row.get(4)?,
                        followability_ratio: row.get(5)?,
                        quick_dump_rate: row.get(6)?,
                        avg_time_to_first_sell_secs: row.get(7)?,
                        median_time_to_first_sell_secs: row.get(8)?,
                        followable_tokens: row.get(9)?,
                        unfollowable_tokens: row.get(10)?,
                        avg_entry_size_sol: row.get(11)?,
                        computed_at: row.get(12)?,
                    })
                }
            )
            .optional()
            .map_err(|e| format!("Failed to get follow score: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_score_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        let score = FollowScore {
            wallet: "addr1".to_string(),
            delay_seconds: 5,
            slippage_model: SlippageModel::Aggressive,
            actual_pnl_sol: 10.0,
            simulated_pnl_sol: 4.0,
            followability_ratio: 0.4,
            quick_dump_rate: 0.25,
            avg_time_to_first_sell_secs: 180.0,
            median_time_to_first_sell_secs: 120.0,
            followable_tokens: 3,
            unfollowable_tokens: 1,
            avg_entry_size_sol: 0.8,
            computed_at: 1000,
        };
        db.upsert_follow_score(&score).unwrap();

        let loaded = db.get_follow_score("addr1").unwrap().unwrap();
        assert_eq!(loaded.slippage_model, SlippageModel::Aggressive);
        assert_eq!(loaded.followable_tokens, 3);
        assert_eq!(loaded.followability_ratio, 0.4);
    }
}
