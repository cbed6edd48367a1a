/// FIFO cost-basis engine
///
/// Rebuilds a wallet's positions and open lots from scratch on every run:
/// existing rows are deleted and the full trade stream is replayed. Sells
/// consume the oldest lot with remaining quantity first; a sell that
/// exhausts the queue treats the remainder as zero-cost rather than
/// aborting, which tolerates unbalanced trade streams.

use std::collections::BTreeMap;

use crate::database::Database;
use crate::logger::{ self, LogTag };
use crate::types::{ CostBasisLot, Position, Trade, TradeSide };

/// Output of one FIFO replay: positions plus the lots still open
#[derive(Debug, Clone, Default)]
pub struct FifoState {
    pub positions: Vec<Position>,
    pub lots: Vec<CostBasisLot>,
}

/// Replay a wallet's trades and persist the resulting state atomically
pub fn recompute_wallet(
    db: &Database,
    wallet: &str,
    trades: &[Trade]
) -> Result<FifoState, String> {
    let state = compute_fifo(wallet, trades);
    db.replace_fifo_state(wallet, &state.positions, &state.lots)?;

    logger::debug(
        LogTag::Fifo,
        &format!(
            "Recomputed {}: {} positions, {} open lots from {} trades",
            wallet,
            state.positions.len(),
            state.lots.len(),
            trades.len()
        )
    );
    Ok(state)
}

/// Pure FIFO replay over a trade stream
pub fn compute_fifo(wallet: &str, trades: &[Trade]) -> FifoState {
    // Group by mint; BTreeMap keeps position output order stable
    let mut by_mint: BTreeMap<String, Vec<&Trade>> = BTreeMap::new();
    for trade in trades {
        by_mint.entry(trade.token_mint.clone()).or_default().push(trade);
    }

    let mut state = FifoState::default();

    for (mint, mut group) in by_mint {
        // Ascending time; ties broken by signature, then buys before sells
        group.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.signature.cmp(&b.signature))
                .then_with(|| side_order(a.side).cmp(&side_order(b.side)))
        });

        let mut lots: Vec<CostBasisLot> = Vec::new();
        let mut position = Position {
            wallet: wallet.to_string(),
            token_mint: mint.clone(),
            first_trade_at: group.first().map(|t| t.timestamp).unwrap_or(0),
            last_trade_at: group.last().map(|t| t.timestamp).unwrap_or(0),
            ..Default::default()
        };

        for trade in &group {
            position.trade_count += 1;
            match trade.side {
                TradeSide::Buy => {
                    position.total_bought += trade.token_amount;
                    position.total_cost_sol += trade.sol_amount;
                    let price = if trade.token_amount > 0.0 {
                        trade.sol_amount / trade.token_amount
                    } else {
                        0.0
                    };
                    lots.push(CostBasisLot {
                        wallet: wallet.to_string(),
                        token_mint: mint.clone(),
                        trade_id: trade.id.clone(),
                        timestamp: trade.timestamp,
                        original_amount: trade.token_amount,
                        remaining_amount: trade.token_amount,
                        price_per_token: price,
                    });
                }
                TradeSide::Sell => {
                    position.total_sold += trade.token_amount;
                    position.total_proceeds_sol += trade.sol_amount;

                    let mut remaining = trade.token_amount;
                    let mut matched_cost = 0.0;
                    for lot in lots.iter_mut() {
                        if remaining <= 0.0 {
                            break;
                        }
                        if lot.remaining_amount <= 0.0 {
                            continue;
                        }
                        let take = lot.remaining_amount.min(remaining);
                        lot.remaining_amount -= take;
                        remaining -= take;
                        matched_cost += take * lot.price_per_token;
                    }
                    // Unmatched remainder is treated as zero cost: the sell's
                    // proceeds count as pure profit instead of failing the run.

                    let sell_pnl = trade.sol_amount - matched_cost;
                    position.realized_pnl_sol += sell_pnl;
                    if sell_pnl > 0.0 {
                        position.win_count += 1;
                    }
                }
            }
        }

        position.remaining_tokens = lots
            .iter()
            .map(|lot| lot.remaining_amount)
            .sum();
        position.average_buy_price = if position.total_bought > 0.0 {
            position.total_cost_sol / position.total_bought
        } else {
            0.0
        };

        state.lots.extend(lots.into_iter().filter(|lot| lot.remaining_amount > 0.0));
        state.positions.push(position);
    }

    state
}

fn side_order(side: TradeSide) -> u8 {
    match side {
        TradeSide::Buy => 0,
        TradeSide::Sell => 1,
    }
}
