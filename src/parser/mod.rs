/// Swap parser: enhanced transaction records -> canonical trades
///
/// Pure function of (record, wallet, config). Three strategies are tried
/// in order and the first to produce at least one trade wins:
///
///   A. token-transfer ledger — net SOL delta vs. signed per-mint deltas,
///      with wrapped SOL folded into SOL and stablecoin/LST hops collapsed
///   B. account-data balance diffs — native_balance_change on the wallet's
///      account plus token balance changes owned by the wallet
///   C. declared swap event — the provider's structured swap legs
///
/// Records with a non-null transaction error produce nothing, as do
/// records that none of the strategies can read (ParseEmpty is not an
/// error; the coordinator just skips them).

pub mod dex;

use std::collections::BTreeMap;

use crate::constants::{ is_intermediate_mint, is_sol_mint, DUST_THRESHOLD, SOL_DELTA_FLOOR };
use crate::helpers::lamports_to_sol;
use crate::provider::types::EnhancedTransaction;
use crate::types::{ Trade, TradeSide };

/// Parse one enhanced record for one tracked wallet.
///
/// `stable_to_sol_rate` is the configured SOL value of one stablecoin unit,
/// used only when a swap shows intermediate flow without a usable SOL delta.
pub fn parse_enhanced_transaction(
    tx: &EnhancedTransaction,
    wallet: &str,
    stable_to_sol_rate: f64
) -> Vec<Trade> {
    if tx.transaction_error.is_some() {
        return Vec::new();
    }

    let trades = strategy_transfer_ledger(tx, wallet, stable_to_sol_rate);
    if !trades.is_empty() {
        return trades;
    }

    let trades = strategy_balance_diffs(tx, wallet);
    if !trades.is_empty() {
        return trades;
    }

    strategy_swap_event(tx, wallet)
}

fn make_trade(
    tx: &EnhancedTransaction,
    wallet: &str,
    side: TradeSide,
    mint: &str,
    token_amount: f64,
    sol_amount: f64
) -> Trade {
    let price_per_token = if token_amount > 0.0 && sol_amount > 0.0 {
        sol_amount / token_amount
    } else {
        0.0
    };

    Trade {
        id: Trade::make_id(&tx.signature, side, mint),
        wallet: wallet.to_string(),
        signature: tx.signature.clone(),
        timestamp: tx.timestamp,
        side,
        token_mint: mint.to_string(),
        token_amount,
        sol_amount,
        price_per_token,
        dex: dex::resolve_label(
            &tx.source,
            &tx.tx_type,
            tx.instructions.iter().map(|i| i.program_id.as_str())
        ),
    }
}

// =============================================================================
// STRATEGY A — TOKEN-TRANSFER LEDGER
// =============================================================================

fn strategy_transfer_ledger(
    tx: &EnhancedTransaction,
    wallet: &str,
    stable_to_sol_rate: f64
) -> Vec<Trade> {
    // Net SOL delta across native transfers touching the wallet
    let mut sol_delta = 0.0;
    for transfer in &tx.native_transfers {
        let amount = lamports_to_sol(transfer.amount);
        if transfer.from_user_account.as_deref() == Some(wallet) {
            sol_delta -= amount;
        }
        if transfer.to_user_account.as_deref() == Some(wallet) {
            sol_delta += amount;
        }
    }

    // Signed per-mint deltas. BTreeMap keeps emission order deterministic.
    let mut token_deltas: BTreeMap<String, f64> = BTreeMap::new();
    for transfer in &tx.token_transfers {
        if transfer.mint.is_empty() {
            continue;
        }
        if transfer.from_user_account.as_deref() == Some(wallet) {
            *token_deltas.entry(transfer.mint.clone()).or_insert(0.0) -= transfer.token_amount;
        }
        if transfer.to_user_account.as_deref() == Some(wallet) {
            *token_deltas.entry(transfer.mint.clone()).or_insert(0.0) += transfer.token_amount;
        }
    }

    // Wrapped SOL is SOL
    let sol_mints: Vec<String> = token_deltas
        .keys()
        .filter(|mint| is_sol_mint(mint.as_str()))
        .cloned()
        .collect();
    for mint in sol_mints {
        if let Some(delta) = token_deltas.remove(&mint) {
            sol_delta += delta;
        }
    }

    token_deltas.retain(|_, delta| delta.abs() >= DUST_THRESHOLD);

    let mut intermediates: BTreeMap<String, f64> = BTreeMap::new();
    let mut targets: BTreeMap<String, f64> = BTreeMap::new();
    for (mint, delta) in token_deltas {
        if is_intermediate_mint(&mint) {
            intermediates.insert(mint, delta);
        } else {
            targets.insert(mint, delta);
        }
    }

    if targets.is_empty() {
        return Vec::new();
    }

    let target_magnitude: f64 = targets
        .values()
        .map(|d| d.abs())
        .sum();
    if target_magnitude <= 0.0 {
        return Vec::new();
    }

    let mut trades = Vec::new();

    if sol_delta.abs() >= SOL_DELTA_FLOOR {
        // Case A1: direct SOL-token swap. Allocate |SOL| across targets in
        // proportion to their share of the total token magnitude.
        for (mint, delta) in &targets {
            let sol_share = sol_delta.abs() * (delta.abs() / target_magnitude);
            if *delta > 0.0 && sol_delta < 0.0 {
                trades.push(make_trade(tx, wallet, TradeSide::Buy, mint, *delta, sol_share));
            } else if *delta < 0.0 && sol_delta > 0.0 {
                trades.push(make_trade(tx, wallet, TradeSide::Sell, mint, delta.abs(), sol_share));
            }
        }
    } else {
        let intermediate_flow: f64 = intermediates.values().sum();
        let intermediate_magnitude: f64 = intermediates
            .values()
            .map(|d| d.abs())
            .sum();

        if intermediate_magnitude >= DUST_THRESHOLD {
            // Case A2: multi-hop through a stablecoin/LST. The intermediate
            // magnitude stands in for the SOL leg; direction follows the net
            // intermediate flow (sent intermediates mean the wallet was buying).
            let sol_value_total = if sol_delta.abs() >= DUST_THRESHOLD {
                sol_delta.abs()
            } else {
                intermediate_magnitude * stable_to_sol_rate
            };

            for (mint, delta) in &targets {
                let sol_share = sol_value_total * (delta.abs() / target_magnitude);
                if *delta > 0.0 && intermediate_flow < 0.0 {
                    trades.push(make_trade(tx, wallet, TradeSide::Buy, mint, *delta, sol_share));
                } else if *delta < 0.0 && intermediate_flow > 0.0 {
                    trades.push(
                        make_trade(tx, wallet, TradeSide::Sell, mint, delta.abs(), sol_share)
                    );
                }
            }
        } else {
            // Case A3: tokens moved with no SOL and no intermediate flow.
            // Incoming tokens are zero-cost acquisitions (airdrop / free mint).
            for (mint, delta) in &targets {
                if *delta > 0.0 {
                    trades.push(make_trade(tx, wallet, TradeSide::Buy, mint, *delta, 0.0));
                }
            }
        }
    }

    trades
}

// =============================================================================
// STRATEGY B — ACCOUNT-DATA BALANCE DIFFS
// =============================================================================

fn strategy_balance_diffs(tx: &EnhancedTransaction, wallet: &str) -> Vec<Trade> {
    let mut sol_delta = 0.0;
    let mut token_deltas: BTreeMap<String, f64> = BTreeMap::new();

    for entry in &tx.account_data {
        if entry.account == wallet {
            sol_delta += (entry.native_balance_change as f64) /
                (crate::constants::LAMPORTS_PER_SOL as f64);
        }
        // Token balance changes are matched on the owning user account,
        // not the outer (token) account.
        for change in &entry.token_balance_changes {
            if change.user_account != wallet || is_sol_mint(&change.mint) {
                continue;
            }
            if is_intermediate_mint(&change.mint) {
                continue;
            }
            *token_deltas.entry(change.mint.clone()).or_insert(0.0) +=
                change.raw_token_amount.to_real();
        }
    }

    let mut trades = Vec::new();
    for (mint, delta) in &token_deltas {
        if delta.abs() < DUST_THRESHOLD {
            continue;
        }
        if *delta > 0.0 {
            // Zero SOL deltas are preserved as zero-cost buys
            trades.push(make_trade(tx, wallet, TradeSide::Buy, mint, *delta, sol_delta.abs()));
        } else {
            trades.push(
                make_trade(tx, wallet, TradeSide::Sell, mint, delta.abs(), sol_delta.max(0.0))
            );
        }
    }

    trades
}

// =============================================================================
// STRATEGY C — DECLARED SWAP EVENT
// =============================================================================

fn strategy_swap_event(tx: &EnhancedTransaction, wallet: &str) -> Vec<Trade> {
    let Some(swap) = &tx.events.swap else {
        return Vec::new();
    };

    let mut trades = Vec::new();

    // Native input paired with token outputs -> buys
    if let Some(native_in) = &swap.native_input {
        let sol_amount = native_in.to_sol();
        let mut outputs: BTreeMap<String, f64> = BTreeMap::new();
        for leg in &swap.token_outputs {
            if is_intermediate_mint(&leg.mint) {
                continue;
            }
            *outputs.entry(leg.mint.clone()).or_insert(0.0) +=
                leg.raw_token_amount.to_real().abs();
        }
        for (mint, amount) in outputs {
            if amount >= DUST_THRESHOLD {
                trades.push(make_trade(tx, wallet, TradeSide::Buy, &mint, amount, sol_amount));
            }
        }
    }

    // Token inputs paired with native output -> sells
    if let Some(native_out) = &swap.native_output {
        let sol_amount = native_out.to_sol();
        let mut inputs: BTreeMap<String, f64> = BTreeMap::new();
        for leg in &swap.token_inputs {
            if is_intermediate_mint(&leg.mint) {
                continue;
            }
            *inputs.entry(leg.mint.clone()).or_insert(0.0) +=
                leg.raw_token_amount.to_real().abs();
        }
        for (mint, amount) in inputs {
            if amount >= DUST_THRESHOLD {
                trades.push(make_trade(tx, wallet, TradeSide::Sell, &mint, amount, sol_amount));
            }
        }
    }

    trades
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::types::*;

    const WALLET: &str = "WaLLet1111111111111111111111111111111111111";
    const POOL: &str = "Poo11111111111111111111111111111111111111111";
    const MINT: &str = "TokenMint111111111111111111111111111111111";
    const USDC: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

    fn base_tx() -> EnhancedTransaction {
        EnhancedTransaction {
            signature: "sig1".to_string(),
            timestamp: 1_700_000_000,
            slot: 250_000_000,
            tx_type: "SWAP".to_string(),
            source: "JUPITER".to_string(),
            ..Default::default()
        }
    }

    fn native(from: &str, to: &str, lamports: u64) -> NativeTransfer {
        NativeTransfer {
            from_user_account: Some(from.to_string()),
            to_user_account: Some(to.to_string()),
            amount: lamports,
        }
    }

    fn token(from: &str, to: &str, mint: &str, amount: f64) -> TokenTransfer {
        TokenTransfer {
            from_user_account: Some(from.to_string()),
            to_user_account: Some(to.to_string()),
            mint: mint.to_string(),
            token_amount: amount,
        }
    }

    #[test]
    fn test_direct_buy() {
        let mut tx = base_tx();
        tx.native_transfers.push(native(WALLET, POOL, 1_000_000_000));
        tx.token_transfers.push(token(POOL, WALLET, MINT, 1000.0));

        let trades = parse_enhanced_transaction(&tx, WALLET, 0.01);
        assert_eq!(trades.len(), 1);
        let trade = &trades[0];
        assert_eq!(trade.side, TradeSide::Buy);
        assert_eq!(trade.token_mint, MINT);
        assert_eq!(trade.token_amount, 1000.0);
        assert!((trade.sol_amount - 1.0).abs() < 1e-9);
        assert!((trade.price_per_token - 0.001).abs() < 1e-12);
        assert_eq!(trade.dex, "Jupiter");
        assert_eq!(trade.id, format!("sig1:buy:{}", MINT));
    }

    #[test]
    fn test_direct_sell() {
        let mut tx = base_tx();
        tx.native_transfers.push(native(POOL, WALLET, 1_500_000_000));
        tx.token_transfers.push(token(WALLET, POOL, MINT, 1000.0));

        let trades = parse_enhanced_transaction(&tx, WALLET, 0.01);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].side, TradeSide::Sell);
        assert!((trades[0].sol_amount - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_failed_transaction_discarded() {
        let mut tx = base_tx();
        tx.transaction_error = Some(serde_json::json!({"InstructionError": [0, "Custom"]}));
        tx.native_transfers.push(native(WALLET, POOL, 1_000_000_000));
        tx.token_transfers.push(token(POOL, WALLET, MINT, 1000.0));

        assert!(parse_enhanced_transaction(&tx, WALLET, 0.01).is_empty());
    }

    #[test]
    fn test_wrapped_sol_folded_into_sol_delta() {
        // Wallet pays with wrapped SOL only; no native transfer involves it
        let mut tx = base_tx();
        tx.token_transfers.push(
            token(WALLET, POOL, crate::constants::WRAPPED_SOL_MINT, 2.0)
        );
        tx.token_transfers.push(token(POOL, WALLET, MINT, 500.0));

        let trades = parse_enhanced_transaction(&tx, WALLET, 0.01);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].side, TradeSide::Buy);
        assert!((trades[0].sol_amount - 2.0).abs() < 1e-9);
        // Wrapped SOL never shows up as a trade mint
        assert!(trades.iter().all(|t| t.token_mint == MINT));
    }

    #[test]
    fn test_multi_hop_via_stablecoin_uses_sol_leg() {
        // Wallet sends 10 SOL, receives 5000 TOKEN; 1500 USDC flows through
        // and leaves. One buy for 10 SOL, nothing for the stablecoin.
        let mut tx = base_tx();
        tx.native_transfers.push(native(WALLET, POOL, 10_000_000_000));
        tx.token_transfers.push(token(POOL, WALLET, USDC, 1500.0));
        tx.token_transfers.push(token(WALLET, POOL, USDC, 1500.0));
        tx.token_transfers.push(token(POOL, WALLET, MINT, 5000.0));

        let trades = parse_enhanced_transaction(&tx, WALLET, 0.01);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].token_mint, MINT);
        assert_eq!(trades[0].side, TradeSide::Buy);
        assert!((trades[0].sol_amount - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_stablecoin_only_buy_uses_proxy() {
        // No SOL moved; wallet sent 150 USDC for tokens
        let mut tx = base_tx();
        tx.token_transfers.push(token(WALLET, POOL, USDC, 150.0));
        tx.token_transfers.push(token(POOL, WALLET, MINT, 3000.0));

        let trades = parse_enhanced_transaction(&tx, WALLET, 0.01);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].side, TradeSide::Buy);
        // 150 USDC * 0.01 SOL/unit
        assert!((trades[0].sol_amount - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_stablecoin_only_sell_direction() {
        // Wallet sent tokens and received 200 USDT
        let usdt = "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB";
        let mut tx = base_tx();
        tx.token_transfers.push(token(WALLET, POOL, MINT, 3000.0));
        tx.token_transfers.push(token(POOL, WALLET, usdt, 200.0));

        let trades = parse_enhanced_transaction(&tx, WALLET, 0.01);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].side, TradeSide::Sell);
        assert!((trades[0].sol_amount - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_airdrop_zero_cost_buy() {
        let mut tx = base_tx();
        tx.source = "UNKNOWN".to_string();
        tx.tx_type = "TRANSFER".to_string();
        tx.token_transfers.push(token(POOL, WALLET, MINT, 10_000.0));

        let trades = parse_enhanced_transaction(&tx, WALLET, 0.01);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].side, TradeSide::Buy);
        assert_eq!(trades[0].sol_amount, 0.0);
        assert_eq!(trades[0].price_per_token, 0.0);
        assert_eq!(trades[0].dex, "Unknown");
    }

    #[test]
    fn test_dust_deltas_dropped() {
        let mut tx = base_tx();
        tx.native_transfers.push(native(WALLET, POOL, 1_000_000_000));
        tx.token_transfers.push(token(POOL, WALLET, MINT, 5e-7));

        assert!(parse_enhanced_transaction(&tx, WALLET, 0.01).is_empty());
    }

    #[test]
    fn test_multi_target_sol_allocation() {
        // One SOL spent across two mints, 3:1 by token magnitude
        let other = "OtherMint11111111111111111111111111111111";
        let mut tx = base_tx();
        tx.native_transfers.push(native(WALLET, POOL, 1_000_000_000));
        tx.token_transfers.push(token(POOL, WALLET, MINT, 300.0));
        tx.token_transfers.push(token(POOL, WALLET, other, 100.0));

        let trades = parse_enhanced_transaction(&tx, WALLET, 0.01);
        assert_eq!(trades.len(), 2);
        let total_sol: f64 = trades
            .iter()
            .map(|t| t.sol_amount)
            .sum();
        assert!((total_sol - 1.0).abs() < 1e-9);

        let big = trades
            .iter()
            .find(|t| t.token_mint == MINT)
            .unwrap();
        assert!((big.sol_amount - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_strategy_b_fallback() {
        // No transfers at all; only account data balance diffs
        let mut tx = base_tx();
        tx.account_data.push(AccountData {
            account: WALLET.to_string(),
            native_balance_change: -500_000_000,
            token_balance_changes: vec![TokenBalanceChange {
                mint: MINT.to_string(),
                user_account: WALLET.to_string(),
                raw_token_amount: RawTokenAmount {
                    token_amount: "2000000000".to_string(),
                    decimals: 6,
                },
            }],
        });

        let trades = parse_enhanced_transaction(&tx, WALLET, 0.01);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].side, TradeSide::Buy);
        assert_eq!(trades[0].token_amount, 2000.0);
        assert!((trades[0].sol_amount - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_strategy_b_ignores_other_owners() {
        let mut tx = base_tx();
        tx.account_data.push(AccountData {
            account: POOL.to_string(),
            native_balance_change: 0,
            token_balance_changes: vec![TokenBalanceChange {
                mint: MINT.to_string(),
                user_account: POOL.to_string(),
                raw_token_amount: RawTokenAmount {
                    token_amount: "1000000".to_string(),
                    decimals: 6,
                },
            }],
        });

        assert!(parse_enhanced_transaction(&tx, WALLET, 0.01).is_empty());
    }

    #[test]
    fn test_strategy_b_sell_clamps_negative_sol() {
        // Token left the wallet while its SOL balance also fell (fees larger
        // than proceeds). The sell keeps max(SOL delta, 0).
        let mut tx = base_tx();
        tx.account_data.push(AccountData {
            account: WALLET.to_string(),
            native_balance_change: -10_000,
            token_balance_changes: vec![TokenBalanceChange {
                mint: MINT.to_string(),
                user_account: WALLET.to_string(),
                raw_token_amount: RawTokenAmount {
                    token_amount: "-1000000".to_string(),
                    decimals: 6,
                },
            }],
        });

        let trades = parse_enhanced_transaction(&tx, WALLET, 0.01);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].side, TradeSide::Sell);
        assert_eq!(trades[0].sol_amount, 0.0);
    }

    #[test]
    fn test_strategy_c_swap_event() {
        let mut tx = base_tx();
        tx.events.swap = Some(SwapEvent {
            native_input: Some(NativeSwapLeg {
                account: WALLET.to_string(),
                amount: "750000000".to_string(),
            }),
            native_output: None,
            token_inputs: Vec::new(),
            token_outputs: vec![TokenSwapLeg {
                user_account: WALLET.to_string(),
                mint: MINT.to_string(),
                raw_token_amount: RawTokenAmount {
                    token_amount: "1500000000".to_string(),
                    decimals: 6,
                },
            }],
        });

        let trades = parse_enhanced_transaction(&tx, WALLET, 0.01);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].side, TradeSide::Buy);
        assert!((trades[0].sol_amount - 0.75).abs() < 1e-9);
        assert_eq!(trades[0].token_amount, 1500.0);
    }

    #[test]
    fn test_parser_determinism() {
        let other = "AotherMint1111111111111111111111111111111";
        let mut tx = base_tx();
        tx.native_transfers.push(native(WALLET, POOL, 1_000_000_000));
        tx.token_transfers.push(token(POOL, WALLET, other, 100.0));
        tx.token_transfers.push(token(POOL, WALLET, MINT, 300.0));

        let first = parse_enhanced_transaction(&tx, WALLET, 0.01);
        let second = parse_enhanced_transaction(&tx, WALLET, 0.01);
        let first_ids: Vec<_> = first.iter().map(|t| t.id.clone()).collect();
        let second_ids: Vec<_> = second.iter().map(|t| t.id.clone()).collect();
        assert_eq!(first_ids, second_ids);
    }

    #[test]
    fn test_no_intermediate_mint_ever_emitted() {
        let mut tx = base_tx();
        tx.native_transfers.push(native(WALLET, POOL, 1_000_000_000));
        tx.token_transfers.push(token(POOL, WALLET, USDC, 100.0));
        tx.token_transfers.push(token(POOL, WALLET, MINT, 1000.0));

        let trades = parse_enhanced_transaction(&tx, WALLET, 0.01);
        assert!(trades.iter().all(|t| !crate::constants::is_intermediate_mint(&t.token_mint)));
    }
}
