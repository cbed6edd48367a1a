/// Period summarizer
///
/// Reports realized PnL over a timeframe against the *lifetime* average
/// buy price, not a per-period FIFO reconstruction. This keeps the 24h
/// view correct when a position was opened before the window; rebuilding
/// lot state at period_start would need history the store doesn't keep.
/// The summary always recomputes the wallet's FIFO state first so the
/// stored positions reflect lifetime cost basis.

use std::collections::{ BTreeMap, HashMap };

use crate::database::Database;
use crate::pnl::fifo;
use crate::types::{ PeriodSummary, PeriodTrade, Timeframe, Trade, TradeSide };

/// Summarize at the current wall clock
pub fn summarize(
    db: &Database,
    wallet: &str,
    timeframe: Timeframe
) -> Result<PeriodSummary, String> {
    summarize_at(db, wallet, timeframe, chrono::Utc::now().timestamp())
}

/// Summarize with an explicit "now", for deterministic reporting and tests
pub fn summarize_at(
    db: &Database,
    wallet: &str,
    timeframe: Timeframe,
    now: i64
) -> Result<PeriodSummary, String> {
    let all_trades = db.trades_for_wallet(wallet, None)?;
    let state = fifo::recompute_wallet(db, wallet, &all_trades)?;

    let period_start = match timeframe.duration_secs() {
        Some(duration) => now - duration,
        None => 0,
    };

    // Lifetime average buy price per mint is the reference cost basis
    let lifetime_avg: HashMap<&str, f64> = state.positions
        .iter()
        .map(|p| (p.token_mint.as_str(), p.average_buy_price))
        .collect();

    let in_period: Vec<&Trade> = all_trades
        .iter()
        .filter(|t| t.timestamp >= period_start)
        .collect();

    let mut summary = PeriodSummary {
        wallet: wallet.to_string(),
        timeframe: timeframe.as_str().to_string(),
        period_start,
        trade_count: in_period.len() as u32,
        ..Default::default()
    };

    let mut mints_in_period: BTreeMap<&str, Vec<i64>> = BTreeMap::new();
    let mut mints_with_sell: std::collections::BTreeSet<&str> = std::collections::BTreeSet::new();

    for trade in &in_period {
        summary.total_sol_volume += trade.sol_amount;
        mints_in_period.entry(trade.token_mint.as_str()).or_default().push(trade.timestamp);

        if trade.side == TradeSide::Sell {
            let avg_price = lifetime_avg.get(trade.token_mint.as_str()).copied().unwrap_or(0.0);
            let contribution = trade.sol_amount - trade.token_amount * avg_price;
            summary.realized_pnl_sol += contribution;
            mints_with_sell.insert(trade.token_mint.as_str());

            if contribution > 0.0 {
                summary.win_count += 1;
            } else {
                summary.loss_count += 1;
            }

            let period_trade = PeriodTrade {
                token_mint: trade.token_mint.clone(),
                timestamp: trade.timestamp,
                pnl_sol: contribution,
            };
            if summary.best_trade.as_ref().map_or(true, |best| contribution > best.pnl_sol) {
                summary.best_trade = Some(period_trade.clone());
            }
            if summary.worst_trade.as_ref().map_or(true, |worst| contribution < worst.pnl_sol) {
                summary.worst_trade = Some(period_trade);
            }
        }
    }

    summary.unique_tokens = mints_in_period.len() as u32;
    summary.avg_trade_size_sol = if summary.trade_count > 0 {
        summary.total_sol_volume / (summary.trade_count as f64)
    } else {
        0.0
    };

    // Mean hold duration over mints that had at least one sell in the period,
    // measured between that mint's first and last in-period trades
    let mut hold_total = 0.0;
    let mut hold_samples = 0u32;
    for (mint, timestamps) in &mints_in_period {
        if !mints_with_sell.contains(mint) {
            continue;
        }
        let first = timestamps.iter().min().copied().unwrap_or(0);
        let last = timestamps.iter().max().copied().unwrap_or(0);
        hold_total += (last - first) as f64;
        hold_samples += 1;
    }
    summary.avg_hold_duration_secs = if hold_samples > 0 {
        hold_total / (hold_samples as f64)
    } else {
        0.0
    };

    Ok(summary)
}
