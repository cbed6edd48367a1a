/// Behavioral profiler
///
/// Aggregates latency, hold-duration and quick-flip statistics from a
/// wallet's cached trades. Entry latency is measured against the launch
/// table: the earliest observation of each mint across all stored raw
/// transactions, materialized once and reused until the stored set of
/// raw transactions changes.

use std::collections::{ BTreeMap, HashMap };

use crate::database::Database;
use crate::helpers::percentile;
use crate::logger::{ self, LogTag };
use crate::provider::types::EnhancedTransaction;
use crate::types::{ LatencyStats, TokenLaunch, Trade, TradeSide, WalletProfile };

/// First sell within this many seconds of the first buy counts as an early exit
const EARLY_EXIT_WINDOW_SECS: i64 = 600;

/// Refresh the launch table if the stored raw-transaction set changed,
/// then return it.
pub fn launch_table(db: &Database) -> Result<HashMap<String, TokenLaunch>, String> {
    let tx_count = db.count_raw_transactions()?;
    if db.launches_snapshot_count()? == Some(tx_count) {
        return db.token_launches();
    }

    let mut earliest: HashMap<String, TokenLaunch> = HashMap::new();
    for raw in db.list_raw_transactions()? {
        let Ok(tx) = serde_json::from_str::<EnhancedTransaction>(&raw.payload) else {
            continue;
        };
        for transfer in &tx.token_transfers {
            if transfer.mint.is_empty() || crate::constants::is_sol_mint(&transfer.mint) {
                continue;
            }
            let candidate = TokenLaunch {
                mint: transfer.mint.clone(),
                first_signature: raw.signature.clone(),
                first_timestamp: raw.block_time,
                first_slot: raw.slot,
            };
            let replace = match earliest.get(&transfer.mint) {
                Some(existing) => candidate.first_timestamp < existing.first_timestamp,
                None => true,
            };
            if replace {
                earliest.insert(transfer.mint.clone(), candidate);
            }
        }
    }

    let launches: Vec<TokenLaunch> = earliest.values().cloned().collect();
    db.replace_token_launches(&launches, tx_count)?;
    logger::debug(
        LogTag::Profiler,
        &format!("Launch table refreshed: {} mints from {} transactions", launches.len(), tx_count)
    );
    Ok(earliest)
}

/// Profile a wallet from its cached trades
pub fn profile_wallet(db: &Database, wallet: &str) -> Result<WalletProfile, String> {
    let trades = db.trades_for_wallet(wallet, None)?;
    let launches = launch_table(db)?;
    Ok(build_profile(wallet, &trades, &launches))
}

/// Pure aggregation over a trade stream and a launch table
pub fn build_profile(
    wallet: &str,
    trades: &[Trade],
    launches: &HashMap<String, TokenLaunch>
) -> WalletProfile {
    let mut profile = WalletProfile {
        wallet: wallet.to_string(),
        total_trades: trades.len() as u32,
        ..Default::default()
    };

    struct MintActivity {
        first_trade: i64,
        first_buy: Option<i64>,
        first_sell: Option<i64>,
        last_trade: i64,
        has_buy: bool,
        has_sell: bool,
    }

    let mut by_mint: BTreeMap<&str, MintActivity> = BTreeMap::new();

    for trade in trades {
        profile.total_sol_volume += trade.sol_amount;
        *profile.dex_breakdown.entry(trade.dex.clone()).or_insert(0) += 1;

        let activity = by_mint.entry(trade.token_mint.as_str()).or_insert(MintActivity {
            first_trade: trade.timestamp,
            first_buy: None,
            first_sell: None,
            last_trade: trade.timestamp,
            has_buy: false,
            has_sell: false,
        });
        activity.first_trade = activity.first_trade.min(trade.timestamp);
        activity.last_trade = activity.last_trade.max(trade.timestamp);
        match trade.side {
            TradeSide::Buy => {
                activity.has_buy = true;
                activity.first_buy = Some(
                    activity.first_buy.map_or(trade.timestamp, |t| t.min(trade.timestamp))
                );
            }
            TradeSide::Sell => {
                activity.has_sell = true;
                activity.first_sell = Some(
                    activity.first_sell.map_or(trade.timestamp, |t| t.min(trade.timestamp))
                );
            }
        }
    }

    profile.tokens_tracked = by_mint.len() as u32;

    let mut entry_latencies: Vec<f64> = Vec::new();
    let mut hold_durations: Vec<f64> = Vec::new();
    let mut sell_mints = 0u32;
    let mut early_exits = 0u32;
    let mut round_trips = 0u32;

    for (mint, activity) in &by_mint {
        if let Some(launch) = launches.get(*mint) {
            if launch.first_timestamp <= activity.first_trade {
                entry_latencies.push((activity.first_trade - launch.first_timestamp) as f64);
            }
        }

        if activity.has_buy && activity.has_sell {
            round_trips += 1;
            hold_durations.push((activity.last_trade - activity.first_trade) as f64);
        }

        if activity.has_sell {
            sell_mints += 1;
            if let (Some(first_buy), Some(first_sell)) = (activity.first_buy, activity.first_sell) {
                if first_sell - first_buy < EARLY_EXIT_WINDOW_SECS {
                    early_exits += 1;
                }
            }
        }
    }

    entry_latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    hold_durations.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    profile.entry_latency_seconds = LatencyStats {
        p50: percentile(&entry_latencies, 50.0).unwrap_or(0.0),
        p90: percentile(&entry_latencies, 90.0).unwrap_or(0.0),
        samples: entry_latencies.len() as u32,
    };
    profile.hold_durations_seconds = LatencyStats {
        p50: percentile(&hold_durations, 50.0).unwrap_or(0.0),
        p90: percentile(&hold_durations, 90.0).unwrap_or(0.0),
        samples: hold_durations.len() as u32,
    };

    profile.early_exit_rate = if sell_mints > 0 {
        (early_exits as f64) / (sell_mints as f64)
    } else {
        0.0
    };
    profile.round_trip_rate = if profile.tokens_tracked > 0 {
        (round_trips as f64) / (profile.tokens_tracked as f64)
    } else {
        0.0
    };

    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawTransaction;

    fn trade(
        signature: &str,
        timestamp: i64,
        side: TradeSide,
        mint: &str,
        sol: f64,
        dex: &str
    ) -> Trade {
        Trade {
            id: Trade::make_id(signature, side, mint),
            wallet: "addr1".to_string(),
            signature: signature.to_string(),
            timestamp,
            side,
            token_mint: mint.to_string(),
            token_amount: 100.0,
            sol_amount: sol,
            price_per_token: sol / 100.0,
            dex: dex.to_string(),
        }
    }

    #[test]
    fn test_profile_aggregates() {
        let trades = vec![
            trade("s1", 1000, TradeSide::Buy, "mint1", 1.0, "Jupiter"),
            trade("s2", 1100, TradeSide::Sell, "mint1", 1.5, "Jupiter"),
            trade("s3", 2000, TradeSide::Buy, "mint2", 2.0, "Raydium")
        ];
        let mut launches = HashMap::new();
        launches.insert("mint1".to_string(), TokenLaunch {
            mint: "mint1".to_string(),
            first_signature: "s0".to_string(),
            first_timestamp: 900,
            first_slot: 1,
        });

        let profile = build_profile("addr1", &trades, &launches);
        assert_eq!(profile.tokens_tracked, 2);
        assert_eq!(profile.total_trades, 3);
        assert!((profile.total_sol_volume - 4.5).abs() < 1e-9);
        assert_eq!(profile.dex_breakdown.get("Jupiter"), Some(&2));
        assert_eq!(profile.dex_breakdown.get("Raydium"), Some(&1));

        // mint1 entered 100s after launch
        assert_eq!(profile.entry_latency_seconds.samples, 1);
        assert!((profile.entry_latency_seconds.p50 - 100.0).abs() < 1e-9);

        // mint1 held for 100s; first sell 100s after first buy -> early exit
        assert_eq!(profile.hold_durations_seconds.samples, 1);
        assert!((profile.hold_durations_seconds.p50 - 100.0).abs() < 1e-9);
        assert!((profile.early_exit_rate - 1.0).abs() < 1e-9);
        assert!((profile.round_trip_rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_slow_exit_not_early() {
        let trades = vec![
            trade("s1", 1000, TradeSide::Buy, "mint1", 1.0, "Jupiter"),
            trade("s2", 1000 + 601, TradeSide::Sell, "mint1", 1.5, "Jupiter")
        ];
        let profile = build_profile("addr1", &trades, &HashMap::new());
        assert_eq!(profile.early_exit_rate, 0.0);
        assert_eq!(profile.round_trip_rate, 1.0);
    }

    #[test]
    fn test_launch_after_first_trade_excluded() {
        // Launch table knows the mint only from a later transaction; the
        // negative latency sample must be dropped
        let trades = vec![trade("s1", 1000, TradeSide::Buy, "mint1", 1.0, "Jupiter")];
        let mut launches = HashMap::new();
        launches.insert("mint1".to_string(), TokenLaunch {
            mint: "mint1".to_string(),
            first_signature: "s9".to_string(),
            first_timestamp: 5000,
            first_slot: 9,
        });

        let profile = build_profile("addr1", &trades, &launches);
        assert_eq!(profile.entry_latency_seconds.samples, 0);
    }

    #[test]
    fn test_launch_table_materialization_and_reuse() {
        let db = Database::open_in_memory().unwrap();

        let payload = serde_json::json!({
            "signature": "sig1",
            "timestamp": 500,
            "type": "SWAP",
            "source": "JUPITER",
            "tokenTransfers": [
                {"fromUserAccount": "p", "toUserAccount": "w", "mint": "mint1", "tokenAmount": 5.0}
            ]
        });
        db
            .insert_raw_transaction(
                &(RawTransaction {
                    signature: "sig1".to_string(),
                    wallet: "addr1".to_string(),
                    block_time: 500,
                    slot: 10,
                    payload: payload.to_string(),
                    parsed: true,
                })
            )
            .unwrap();

        let launches = launch_table(&db).unwrap();
        assert_eq!(launches.get("mint1").unwrap().first_timestamp, 500);
        assert_eq!(db.launches_snapshot_count().unwrap(), Some(1));

        // Second call reuses the stored table (same snapshot count)
        let again = launch_table(&db).unwrap();
        assert_eq!(again.len(), launches.len());

        // An earlier observation wins once the set changes
        let earlier = serde_json::json!({
            "signature": "sig0",
            "timestamp": 100,
            "type": "SWAP",
            "source": "JUPITER",
            "tokenTransfers": [
                {"fromUserAccount": "p", "toUserAccount": "w", "mint": "mint1", "tokenAmount": 1.0}
            ]
        });
        db
            .insert_raw_transaction(
                &(RawTransaction {
                    signature: "sig0".to_string(),
                    wallet: "addr1".to_string(),
                    block_time: 100,
                    slot: 5,
                    payload: earlier.to_string(),
                    parsed: true,
                })
            )
            .unwrap();

        let refreshed = launch_table(&db).unwrap();
        assert_eq!(refreshed.get("mint1").unwrap().first_signature, "sig0");
        assert_eq!(refreshed.get("mint1").unwrap().first_timestamp, 100);
    }
}
