/// Incremental sync coordinator
///
/// Drives ingestion per wallet: page signatures from the provider down to
/// the stored cursor, decode enhanced records in batches, parse trades,
/// commit everything atomically, then refresh the wallet's FIFO state,
/// behavior profile and cached rollups.
///
/// Each wallet has at most one in-flight run. A second request during a
/// run attaches to it and receives the same outcome; `force_refresh`
/// schedules a fresh full run sequenced after the current one. There is
/// no global lock; per-wallet run handles live in a map.

pub mod status;

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{ AtomicBool, Ordering };
use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;
use tokio::sync::{ Mutex as TokioMutex, OnceCell as AsyncOnceCell };

use crate::config::Config;
use crate::constants::{ ENHANCE_BATCH_SIZE, SIGNATURE_PAGE_LIMIT };
use crate::database::Database;
use crate::errors::AnalyticsError;
use crate::logger::{ self, LogTag };
use crate::parser;
use crate::pnl::fifo;
use crate::profiler;
use crate::provider::types::SignatureInfo;
use crate::provider::TransactionSource;
use crate::types::{ RawTransaction, SyncOutcome, TrackedWallet, TradeSide, WalletRollups };
use status::SyncEvent;

/// Phases of one sync run, reported through status events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncPhase {
    Fetching,
    Parsing,
    Persisting,
    RollingUp,
}

impl SyncPhase {
    fn as_str(&self) -> &'static str {
        match self {
            SyncPhase::Fetching => "fetching",
            SyncPhase::Parsing => "parsing",
            SyncPhase::Persisting => "persisting",
            SyncPhase::RollingUp => "rolling up",
        }
    }
}

type RunResult = Result<SyncOutcome, AnalyticsError>;

#[derive(Clone)]
struct ActiveRun {
    cell: Arc<AsyncOnceCell<RunResult>>,
    cancel: Arc<AtomicBool>,
}

impl ActiveRun {
    fn new() -> Self {
        Self {
            cell: Arc::new(AsyncOnceCell::new()),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }
}

struct WalletRuns {
    /// Sequences runs for one wallet; a forced refresh queues behind the
    /// current run on this lock
    run_lock: Arc<TokioMutex<()>>,
    active: Option<ActiveRun>,
}

impl WalletRuns {
    fn new() -> Self {
        Self {
            run_lock: Arc::new(TokioMutex::new(())),
            active: None,
        }
    }
}

pub struct SyncCoordinator<P: TransactionSource> {
    db: Arc<Database>,
    provider: P,
    config: Config,
    runs: TokioMutex<HashMap<String, WalletRuns>>,
}

impl<P: TransactionSource> SyncCoordinator<P> {
    pub fn new(db: Arc<Database>, provider: P, config: Config) -> Self {
        Self {
            db,
            provider,
            config,
            runs: TokioMutex::new(HashMap::new()),
        }
    }

    /// Sync one wallet. Joins the in-flight run when one exists (unless
    /// `force_refresh`), otherwise starts one.
    pub async fn sync_wallet(
        &self,
        address: &str,
        owner: &str,
        force_refresh: bool
    ) -> RunResult {
        Pubkey::from_str(address).map_err(|e| AnalyticsError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })?;

        let (run, run_lock) = {
            let mut runs = self.runs.lock().await;
            let entry = runs.entry(address.to_string()).or_insert_with(WalletRuns::new);

            let run = match entry.active.clone() {
                Some(active) if !force_refresh => active,
                _ => {
                    let fresh = ActiveRun::new();
                    entry.active = Some(fresh.clone());
                    fresh
                }
            };
            (run, entry.run_lock.clone())
        };

        let result = run.cell
            .get_or_init(|| async {
                // Queue behind any in-flight run for this wallet
                let _guard = run_lock.lock().await;
                self.run_sync(address, owner, force_refresh, &run.cancel).await
            }).await
            .clone();

        // Retire the handle so the next request starts a fresh incremental run
        {
            let mut runs = self.runs.lock().await;
            if let Some(entry) = runs.get_mut(address) {
                if let Some(active) = &entry.active {
                    if Arc::ptr_eq(&active.cell, &run.cell) {
                        entry.active = None;
                    }
                }
            }
        }

        if let Err(e) = &result {
            status::emit(SyncEvent::error(address, &format!("{} ({})", e, e.kind())));
        }
        result
    }

    /// Sync many wallets; per-wallet failures don't abort the batch
    pub async fn sync_many(
        &self,
        addresses: &[String],
        owner: &str,
        force_refresh: bool
    ) -> Vec<(String, RunResult)> {
        let mut results = Vec::with_capacity(addresses.len());
        for address in addresses {
            let result = self.sync_wallet(address, owner, force_refresh).await;
            results.push((address.clone(), result));
        }
        results
    }

    /// Request cancellation of the wallet's in-flight run. Subsequent
    /// provider calls stop and the commit is skipped; the store keeps its
    /// pre-run state.
    pub async fn cancel_sync(&self, address: &str) {
        let runs = self.runs.lock().await;
        if let Some(entry) = runs.get(address) {
            if let Some(active) = &entry.active {
                active.cancel.store(true, Ordering::Relaxed);
            }
        }
    }

    fn check_cancel(&self, address: &str, cancel: &AtomicBool) -> Result<(), AnalyticsError> {
        if cancel.load(Ordering::Relaxed) {
            status::emit(SyncEvent::warning(address, "sync cancelled"));
            return Err(AnalyticsError::Cancelled {
                wallet: address.to_string(),
            });
        }
        Ok(())
    }

    async fn run_sync(
        &self,
        address: &str,
        owner: &str,
        force_refresh: bool,
        cancel: &AtomicBool
    ) -> RunResult {
        status::emit(SyncEvent::info(address, SyncPhase::Fetching.as_str()));
        logger::info(
            LogTag::Sync,
            &format!("Sync started for {} (force: {})", address, force_refresh)
        );

        // 1. Cursor
        let until = if force_refresh {
            None
        } else {
            self.db.latest_signature(address).map_err(AnalyticsError::from_store_message)?
        };

        // 2. Page signatures newest-first until the cursor, a short page,
        //    or the safety cap
        let max_signatures = self.config.sync.max_signatures_per_run;
        let mut signatures: Vec<SignatureInfo> = Vec::new();
        let mut before: Option<String> = None;

        loop {
            self.check_cancel(address, cancel)?;

            let page = self.provider.signatures(
                address,
                before.as_deref(),
                until.as_deref(),
                SIGNATURE_PAGE_LIMIT
            ).await?;

            let page_len = page.len();
            let mut hit_cursor = false;
            for info in page {
                if until.as_deref() == Some(info.signature.as_str()) {
                    hit_cursor = true;
                    break;
                }
                signatures.push(info);
            }

            if
                page_len == 0 ||
                page_len < SIGNATURE_PAGE_LIMIT ||
                hit_cursor ||
                signatures.len() >= max_signatures
            {
                break;
            }
            before = signatures.last().map(|s| s.signature.clone());
        }
        signatures.truncate(max_signatures);

        if signatures.is_empty() {
            status::emit(SyncEvent::success(address, "up to date"));
            return Ok(SyncOutcome {
                wallet: address.to_string(),
                last_signature: until,
                ..Default::default()
            });
        }

        // 3. Enhance and parse in batches
        status::emit(SyncEvent::info(address, SyncPhase::Parsing.as_str()));

        let newest_signature = signatures.first().map(|s| s.signature.clone());
        let signature_strings: Vec<String> = signatures
            .iter()
            .map(|s| s.signature.clone())
            .collect();

        let mut raw_transactions: Vec<RawTransaction> = Vec::new();
        let mut trades = Vec::new();
        let mut skipped_malformed = 0u32;
        let total = signature_strings.len() as u64;
        let mut processed = 0u64;

        for chunk in signature_strings.chunks(ENHANCE_BATCH_SIZE) {
            self.check_cancel(address, cancel)?;

            let enhanced = self.provider.enhance(chunk).await?;
            for record in enhanced {
                if record.signature.is_empty() {
                    skipped_malformed += 1;
                    status::emit(SyncEvent::warning(address, "skipped malformed record"));
                    continue;
                }

                let payload = match serde_json::to_string(&record) {
                    Ok(payload) => payload,
                    Err(e) => {
                        skipped_malformed += 1;
                        status::emit(
                            SyncEvent::warning(address, &format!("unencodable record: {}", e))
                        );
                        continue;
                    }
                };

                raw_transactions.push(RawTransaction {
                    signature: record.signature.clone(),
                    wallet: address.to_string(),
                    block_time: record.timestamp,
                    slot: record.slot,
                    payload,
                    parsed: true,
                });

                // Failed transactions are stored but produce no trades;
                // records no strategy can read are silently skipped
                trades.extend(
                    parser::parse_enhanced_transaction(
                        &record,
                        address,
                        self.config.parser.stable_to_sol_rate
                    )
                );
            }

            processed += chunk.len() as u64;
            status::emit(
                SyncEvent::progress(address, SyncPhase::Parsing.as_str(), processed, total)
            );
        }

        // 4. Atomic commit: cursor + raw transactions + trades
        self.check_cancel(address, cancel)?;
        status::emit(SyncEvent::info(address, SyncPhase::Persisting.as_str()));

        let known = self.db
            .known_signatures(address)
            .map_err(AnalyticsError::from_store_message)?;
        let new_unique = raw_transactions
            .iter()
            .filter(|tx| !known.contains(&tx.signature))
            .count();

        let now = chrono::Utc::now().timestamp();
        let earliest_block_time = raw_transactions
            .iter()
            .map(|tx| tx.block_time)
            .filter(|t| *t > 0)
            .min();

        let mut wallet_row = TrackedWallet::new(address, owner, "", "", now);
        wallet_row.last_synced_at = Some(now);
        wallet_row.first_synced_at = earliest_block_time;
        wallet_row.last_signature = newest_signature.clone();
        wallet_row.total_transactions = (known.len() + new_unique) as u32;

        self.db
            .commit_sync_batch(&wallet_row, &raw_transactions, &trades)
            .map_err(AnalyticsError::from_store_message)?;

        // 5. Refresh FIFO state, behavior profile and cached rollups.
        //    Readers never see rollups ahead of the trades they describe.
        status::emit(SyncEvent::info(address, SyncPhase::RollingUp.as_str()));

        let all_trades = self.db
            .trades_for_wallet(address, None)
            .map_err(AnalyticsError::from_store_message)?;
        let state = fifo
            ::recompute_wallet(&self.db, address, &all_trades)
            .map_err(AnalyticsError::from_store_message)?;
        let profile = profiler
            ::profile_wallet(&self.db, address)
            .map_err(AnalyticsError::from_store_message)?;

        let sell_count = all_trades
            .iter()
            .filter(|t| t.side == TradeSide::Sell)
            .count();
        let win_count: u32 = state.positions
            .iter()
            .map(|p| p.win_count)
            .sum();

        let rollups = WalletRollups {
            total_realized_pnl: state.positions
                .iter()
                .map(|p| p.realized_pnl_sol)
                .sum(),
            win_rate: if sell_count > 0 {
                (win_count as f64) / (sell_count as f64)
            } else {
                0.0
            },
            total_sol_volume: all_trades
                .iter()
                .map(|t| t.sol_amount)
                .sum(),
            total_trades: all_trades.len() as u32,
            quick_flip_rate: profile.early_exit_rate,
            exited_token_rate: profile.round_trip_rate,
        };
        self.db
            .update_wallet_rollups(address, &rollups)
            .map_err(AnalyticsError::from_store_message)?;

        let outcome = SyncOutcome {
            wallet: address.to_string(),
            new_signatures: signature_strings.len() as u32,
            parsed_transactions: raw_transactions.len() as u32,
            new_trades: trades.len() as u32,
            skipped_malformed,
            last_signature: newest_signature,
        };

        status::emit(
            SyncEvent::success(
                address,
                &format!(
                    "synced {} transactions, {} trades",
                    outcome.parsed_transactions,
                    outcome.new_trades
                )
            )
        );
        logger::info(
            LogTag::Sync,
            &format!(
                "Sync finished for {}: {} new signatures, {} trades",
                address,
                outcome.new_signatures,
                outcome.new_trades
            )
        );
        Ok(outcome)
    }
}
