/// Follow simulator
///
/// Replays a wallet's round-trips as a hypothetical copy-trader would
/// experience them: entries and exits delayed by a fixed number of
/// seconds, slippage applied by trade-size bucket, and a price-drift
/// penalty proportional to the delay. Each round-trip's simulated PnL is
/// weighted by a followability score derived from how fast the wallet
/// exited; positions dumped within seconds are worth nothing to a
/// follower no matter how profitable they were.

use std::collections::BTreeMap;

use crate::database::Database;
use crate::logger::{ self, LogTag };
use crate::types::{ FollowScore, SlippageModel, Trade, TradeSide };

/// Price drift per second of delay, applied to both entry and exit
const DRIFT_PER_SECOND: f64 = 0.001;

/// First sell within this many seconds of the first buy flags a quick dump
const QUICK_DUMP_WINDOW_SECS: i64 = 60;

/// Slippage fraction for a trade of the given SOL size.
/// Buckets: small < 0.5 SOL, medium < 2 SOL, large >= 2 SOL.
pub fn slippage_fraction(model: SlippageModel, trade_size_sol: f64) -> f64 {
    let bucket = if trade_size_sol < 0.5 {
        0
    } else if trade_size_sol < 2.0 {
        1
    } else {
        2
    };

    match model {
        SlippageModel::Conservative => [0.01, 0.02, 0.05][bucket],
        SlippageModel::Moderate => [0.02, 0.05, 0.1][bucket],
        SlippageModel::Aggressive => [0.03, 0.08, 0.15][bucket],
    }
}

/// Followability weight in [0, 1] from the wallet's time to first sell
pub fn followability_score(time_to_first_sell_secs: i64) -> f64 {
    if time_to_first_sell_secs < 30 {
        0.0
    } else if time_to_first_sell_secs < 60 {
        0.2
    } else if time_to_first_sell_secs < 120 {
        0.5
    } else if time_to_first_sell_secs < 300 {
        0.8
    } else {
        1.0
    }
}

/// Simulate following a wallet and persist the resulting score row
pub fn simulate_wallet(
    db: &Database,
    wallet: &str,
    delay_seconds: u32,
    model: SlippageModel
) -> Result<FollowScore, String> {
    let trades = db.trades_for_wallet(wallet, None)?;
    let score = simulate(wallet, &trades, delay_seconds, model, chrono::Utc::now().timestamp());
    db.upsert_follow_score(&score)?;

    logger::info(
        LogTag::Follow,
        &format!(
            "{}: actual {:.4} SOL, simulated {:.4} SOL (ratio {:.2})",
            wallet,
            score.actual_pnl_sol,
            score.simulated_pnl_sol,
            score.followability_ratio
        )
    );
    Ok(score)
}

/// Pure simulation over a trade stream
pub fn simulate(
    wallet: &str,
    trades: &[Trade],
    delay_seconds: u32,
    model: SlippageModel,
    now: i64
) -> FollowScore {
    let drift = (delay_seconds as f64) * DRIFT_PER_SECOND;

    struct MintRoundTrip {
        buys: Vec<(i64, f64)>,
        sells: Vec<(i64, f64)>,
    }

    let mut by_mint: BTreeMap<&str, MintRoundTrip> = BTreeMap::new();
    let mut entry_sizes: Vec<f64> = Vec::new();

    for trade in trades {
        let entry = by_mint.entry(trade.token_mint.as_str()).or_insert(MintRoundTrip {
            buys: Vec::new(),
            sells: Vec::new(),
        });
        match trade.side {
            TradeSide::Buy => {
                entry.buys.push((trade.timestamp, trade.sol_amount));
                entry_sizes.push(trade.sol_amount);
            }
            TradeSide::Sell => entry.sells.push((trade.timestamp, trade.sol_amount)),
        }
    }

    let mut actual_total = 0.0;
    let mut simulated_total = 0.0;
    let mut sell_latencies: Vec<f64> = Vec::new();
    let mut followable = 0u32;
    let mut unfollowable = 0u32;
    let mut quick_dumps = 0u32;
    let mut round_trips = 0u32;

    for round_trip in by_mint.values() {
        if round_trip.buys.is_empty() || round_trip.sells.is_empty() {
            continue;
        }
        round_trips += 1;

        let first_buy = round_trip.buys
            .iter()
            .map(|(t, _)| *t)
            .min()
            .unwrap_or(0);
        let first_sell = round_trip.sells
            .iter()
            .map(|(t, _)| *t)
            .min()
            .unwrap_or(0);
        let time_to_first_sell = first_sell - first_buy;
        sell_latencies.push(time_to_first_sell as f64);

        let actual: f64 =
            round_trip.sells
                .iter()
                .map(|(_, sol)| sol)
                .sum::<f64>() -
            round_trip.buys
                .iter()
                .map(|(_, sol)| sol)
                .sum::<f64>();

        let simulated_cost: f64 = round_trip.buys
            .iter()
            .map(|(_, sol)| sol * (1.0 + slippage_fraction(model, *sol) + drift))
            .sum();
        let simulated_proceeds: f64 = round_trip.sells
            .iter()
            .map(|(_, sol)| sol * (1.0 - slippage_fraction(model, *sol) - drift))
            .sum();

        let score = followability_score(time_to_first_sell);
        actual_total += actual;
        simulated_total += (simulated_proceeds - simulated_cost) * score;

        if score >= 0.5 {
            followable += 1;
        } else {
            unfollowable += 1;
        }
        if time_to_first_sell < QUICK_DUMP_WINDOW_SECS {
            quick_dumps += 1;
        }
    }

    sell_latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let avg_latency = if sell_latencies.is_empty() {
        0.0
    } else {
        sell_latencies.iter().sum::<f64>() / (sell_latencies.len() as f64)
    };
    let median_latency = crate::helpers::percentile(&sell_latencies, 50.0).unwrap_or(0.0);

    FollowScore {
        wallet: wallet.to_string(),
        delay_seconds,
        slippage_model: model,
        actual_pnl_sol: actual_total,
        simulated_pnl_sol: simulated_total,
        followability_ratio: if actual_total > 0.0 {
            simulated_total / actual_total
        } else {
            0.0
        },
        quick_dump_rate: if round_trips > 0 {
            (quick_dumps as f64) / (round_trips as f64)
        } else {
            0.0
        },
        avg_time_to_first_sell_secs: avg_latency,
        median_time_to_first_sell_secs: median_latency,
        followable_tokens: followable,
        unfollowable_tokens: unfollowable,
        avg_entry_size_sol: if entry_sizes.is_empty() {
            0.0
        } else {
            entry_sizes.iter().sum::<f64>() / (entry_sizes.len() as f64)
        },
        computed_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(
        signature: &str,
        timestamp: i64,
        side: TradeSide,
        mint: &str,
        sol: f64
    ) -> Trade {
        Trade {
            id: Trade::make_id(signature, side, mint),
            wallet: "addr1".to_string(),
            signature: signature.to_string(),
            timestamp,
            side,
            token_mint: mint.to_string(),
            token_amount: 1000.0,
            sol_amount: sol,
            price_per_token: sol / 1000.0,
            dex: "Jupiter".to_string(),
        }
    }

    #[test]
    fn test_slippage_buckets() {
        assert_eq!(slippage_fraction(SlippageModel::Conservative, 0.1), 0.01);
        assert_eq!(slippage_fraction(SlippageModel::Conservative, 1.0), 0.02);
        assert_eq!(slippage_fraction(SlippageModel::Conservative, 5.0), 0.05);
        assert_eq!(slippage_fraction(SlippageModel::Moderate, 1.0), 0.05);
        assert_eq!(slippage_fraction(SlippageModel::Aggressive, 2.0), 0.15);
        // Boundary: exactly 0.5 SOL is medium, exactly 2 SOL is large
        assert_eq!(slippage_fraction(SlippageModel::Moderate, 0.5), 0.05);
        assert_eq!(slippage_fraction(SlippageModel::Moderate, 2.0), 0.1);
    }

    #[test]
    fn test_followability_thresholds() {
        assert_eq!(followability_score(10), 0.0);
        assert_eq!(followability_score(30), 0.2);
        assert_eq!(followability_score(60), 0.5);
        assert_eq!(followability_score(120), 0.8);
        assert_eq!(followability_score(300), 1.0);
        assert_eq!(followability_score(4000), 1.0);
    }

    #[test]
    fn test_quick_dump_contributes_nothing() {
        // First sell 20s after first buy: score 0, simulated contribution 0
        let trades = vec![
            trade("s1", 1000, TradeSide::Buy, "mint1", 1.0),
            trade("s2", 1020, TradeSide::Sell, "mint1", 5.0)
        ];

        let score = simulate("addr1", &trades, 5, SlippageModel::Moderate, 2000);
        assert!((score.actual_pnl_sol - 4.0).abs() < 1e-9);
        assert_eq!(score.simulated_pnl_sol, 0.0);
        assert_eq!(score.quick_dump_rate, 1.0);
        assert_eq!(score.unfollowable_tokens, 1);
        assert_eq!(score.followable_tokens, 0);
        assert_eq!(score.followability_ratio, 0.0);
    }

    #[test]
    fn test_slow_round_trip_full_weight() {
        // Held for 10 minutes: full score
        let trades = vec![
            trade("s1", 0, TradeSide::Buy, "mint1", 1.0),
            trade("s2", 600, TradeSide::Sell, "mint1", 2.0)
        ];

        let score = simulate("addr1", &trades, 5, SlippageModel::Moderate, 2000);
        // drift = 5 * 0.001 = 0.005; both legs are medium (0.05)
        let expected_cost = 1.0 * (1.0 + 0.05 + 0.005);
        let expected_proceeds = 2.0 * (1.0 - 0.05 - 0.005);
        let expected = expected_proceeds - expected_cost;
        assert!((score.simulated_pnl_sol - expected).abs() < 1e-9);
        assert!((score.actual_pnl_sol - 1.0).abs() < 1e-9);
        assert!((score.followability_ratio - expected / 1.0).abs() < 1e-9);
        assert_eq!(score.followable_tokens, 1);
        assert_eq!(score.quick_dump_rate, 0.0);
    }

    #[test]
    fn test_ratio_zero_when_actual_nonpositive() {
        let trades = vec![
            trade("s1", 0, TradeSide::Buy, "mint1", 2.0),
            trade("s2", 600, TradeSide::Sell, "mint1", 1.0)
        ];
        let score = simulate("addr1", &trades, 5, SlippageModel::Moderate, 2000);
        assert!(score.actual_pnl_sol < 0.0);
        assert_eq!(score.followability_ratio, 0.0);
    }

    #[test]
    fn test_open_positions_ignored() {
        let trades = vec![
            trade("s1", 0, TradeSide::Buy, "mint1", 1.0),
            // mint2 never sold
            trade("s3", 0, TradeSide::Buy, "mint2", 3.0),
            trade("s2", 600, TradeSide::Sell, "mint1", 2.0)
        ];
        let score = simulate("addr1", &trades, 5, SlippageModel::Moderate, 2000);
        // Only mint1 forms a round-trip
        assert!((score.actual_pnl_sol - 1.0).abs() < 1e-9);
        // Entry size averages over every buy, including the open one
        assert!((score.avg_entry_size_sol - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_persisted_score_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        db
            .upsert_trade(&trade("s1", 0, TradeSide::Buy, "mint1", 1.0))
            .unwrap();
        db
            .upsert_trade(&trade("s2", 600, TradeSide::Sell, "mint1", 2.0))
            .unwrap();

        let score = simulate_wallet(&db, "addr1", 5, SlippageModel::Conservative).unwrap();
        let stored = db.get_follow_score("addr1").unwrap().unwrap();
        assert_eq!(stored.delay_seconds, 5);
        assert!((stored.simulated_pnl_sol - score.simulated_pnl_sol).abs() < 1e-9);
    }
}
