/// Canonical model types for the analytics pipeline
///
/// Everything downstream of the parser speaks in these types: trades,
/// positions, FIFO lots, wallet records with cached rollups, behavioral
/// profiles and follow-simulation scores.

use serde::{ Deserialize, Serialize };

// =============================================================================
// TRADES
// =============================================================================

/// Buy or sell side of a canonical trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "buy",
            TradeSide::Sell => "sell",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "buy" => Some(TradeSide::Buy),
            "sell" => Some(TradeSide::Sell),
            _ => None,
        }
    }
}

/// An atomic buy/sell produced by the swap parser.
///
/// Invariant: `price_per_token * token_amount == sol_amount` within rounding,
/// except zero-cost acquisitions where both sol_amount and price are 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    /// Deterministic id: `{signature}:{buy|sell}:{mint}`
    pub id: String,
    pub wallet: String,
    pub signature: String,
    /// Unix seconds
    pub timestamp: i64,
    pub side: TradeSide,
    pub token_mint: String,
    pub token_amount: f64,
    pub sol_amount: f64,
    pub price_per_token: f64,
    pub dex: String,
}

impl Trade {
    /// Build the deterministic trade id
    pub fn make_id(signature: &str, side: TradeSide, mint: &str) -> String {
        format!("{}:{}:{}", signature, side.as_str(), mint)
    }
}

// =============================================================================
// POSITIONS & LOTS
// =============================================================================

/// Per (wallet, token) aggregate, recomputed in full whenever trades change
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Position {
    pub wallet: String,
    pub token_mint: String,
    pub total_bought: f64,
    pub total_sold: f64,
    pub total_cost_sol: f64,
    pub total_proceeds_sol: f64,
    pub remaining_tokens: f64,
    pub average_buy_price: f64,
    pub realized_pnl_sol: f64,
    pub trade_count: u32,
    pub win_count: u32,
    pub first_trade_at: i64,
    pub last_trade_at: i64,
}

/// An open FIFO lot. Created on buy, shrunk by sells; fully consumed lots
/// are deleted rather than kept at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostBasisLot {
    pub wallet: String,
    pub token_mint: String,
    /// Trade id of the originating buy
    pub trade_id: String,
    pub timestamp: i64,
    pub original_amount: f64,
    pub remaining_amount: f64,
    pub price_per_token: f64,
}

// =============================================================================
// WALLETS
// =============================================================================

/// A tracked wallet: identity, display metadata, sync cursor and cached rollups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedWallet {
    pub address: String,
    pub owner: String,
    pub name: String,
    pub emoji: String,
    pub alerts_on: bool,
    // Sync cursor
    pub last_synced_at: Option<i64>,
    pub first_synced_at: Option<i64>,
    pub last_signature: Option<String>,
    pub total_transactions: u32,
    // Cached rollups, written only by the sync coordinator
    pub total_realized_pnl: f64,
    pub win_rate: f64,
    pub total_sol_volume: f64,
    pub total_trades: u32,
    pub quick_flip_rate: f64,
    pub exited_token_rate: f64,
    pub created_at: i64,
}

impl TrackedWallet {
    pub fn new(address: &str, owner: &str, name: &str, emoji: &str, created_at: i64) -> Self {
        Self {
            address: address.to_string(),
            owner: owner.to_string(),
            name: name.to_string(),
            emoji: emoji.to_string(),
            alerts_on: false,
            last_synced_at: None,
            first_synced_at: None,
            last_signature: None,
            total_transactions: 0,
            total_realized_pnl: 0.0,
            win_rate: 0.0,
            total_sol_volume: 0.0,
            total_trades: 0,
            quick_flip_rate: 0.0,
            exited_token_rate: 0.0,
            created_at,
        }
    }
}

/// Rollup fields refreshed after every successful sync
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletRollups {
    pub total_realized_pnl: f64,
    pub win_rate: f64,
    pub total_sol_volume: f64,
    pub total_trades: u32,
    pub quick_flip_rate: f64,
    pub exited_token_rate: f64,
}

// =============================================================================
// RAW TRANSACTIONS
// =============================================================================

/// An ingested on-chain record. Content is write-once; only `parsed` mutates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTransaction {
    pub signature: String,
    pub wallet: String,
    pub block_time: i64,
    pub slot: u64,
    /// Opaque provider payload, stored verbatim
    pub payload: String,
    pub parsed: bool,
}

// =============================================================================
// PERIOD SUMMARY
// =============================================================================

/// Reporting window for the period summarizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "24h")]
    Hours24,
    #[serde(rename = "7d")]
    Days7,
    #[serde(rename = "30d")]
    Days30,
    #[serde(rename = "90d")]
    Days90,
    #[serde(rename = "all")]
    All,
}

impl Timeframe {
    /// Window length in seconds; None means "all time"
    pub fn duration_secs(&self) -> Option<i64> {
        match self {
            Timeframe::Hours24 => Some(24 * 3600),
            Timeframe::Days7 => Some(7 * 24 * 3600),
            Timeframe::Days30 => Some(30 * 24 * 3600),
            Timeframe::Days90 => Some(90 * 24 * 3600),
            Timeframe::All => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Hours24 => "24h",
            Timeframe::Days7 => "7d",
            Timeframe::Days30 => "30d",
            Timeframe::Days90 => "90d",
            Timeframe::All => "all",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "24h" => Some(Timeframe::Hours24),
            "7d" => Some(Timeframe::Days7),
            "30d" => Some(Timeframe::Days30),
            "90d" => Some(Timeframe::Days90),
            "all" => Some(Timeframe::All),
            _ => None,
        }
    }
}

/// One notable sell inside a reporting window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodTrade {
    pub token_mint: String,
    pub timestamp: i64,
    pub pnl_sol: f64,
}

/// Timeframe-scoped PnL report built on lifetime cost basis
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub wallet: String,
    pub timeframe: String,
    pub period_start: i64,
    pub realized_pnl_sol: f64,
    pub total_sol_volume: f64,
    pub trade_count: u32,
    pub win_count: u32,
    pub loss_count: u32,
    pub avg_trade_size_sol: f64,
    pub unique_tokens: u32,
    pub avg_hold_duration_secs: f64,
    pub best_trade: Option<PeriodTrade>,
    pub worst_trade: Option<PeriodTrade>,
}

// =============================================================================
// BEHAVIORAL PROFILE
// =============================================================================

/// Percentile pair with sample size
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LatencyStats {
    pub p50: f64,
    pub p90: f64,
    pub samples: u32,
}

/// Behavioral aggregates computed from cached trades and the launch table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletProfile {
    pub wallet: String,
    pub tokens_tracked: u32,
    pub total_trades: u32,
    pub total_sol_volume: f64,
    /// DEX label -> trade count
    pub dex_breakdown: std::collections::HashMap<String, u32>,
    pub entry_latency_seconds: LatencyStats,
    pub hold_durations_seconds: LatencyStats,
    /// Share of mints with any sell whose first sell came within 600 s of the first buy
    pub early_exit_rate: f64,
    /// Share of all tracked mints with both a buy and a sell
    pub round_trip_rate: f64,
}

/// Earliest observation of a mint across all stored raw transactions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenLaunch {
    pub mint: String,
    pub first_signature: String,
    pub first_timestamp: i64,
    pub first_slot: u64,
}

// =============================================================================
// FOLLOW SIMULATION
// =============================================================================

/// Slippage model applied by trade-size bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlippageModel {
    Conservative,
    Moderate,
    Aggressive,
}

impl SlippageModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlippageModel::Conservative => "conservative",
            SlippageModel::Moderate => "moderate",
            SlippageModel::Aggressive => "aggressive",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "conservative" => Some(SlippageModel::Conservative),
            "moderate" => Some(SlippageModel::Moderate),
            "aggressive" => Some(SlippageModel::Aggressive),
            _ => None,
        }
    }
}

/// Per-wallet copy-trade simulation output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowScore {
    pub wallet: String,
    pub delay_seconds: u32,
    pub slippage_model: SlippageModel,
    pub actual_pnl_sol: f64,
    pub simulated_pnl_sol: f64,
    /// simulated / actual when actual > 0, else 0; may be negative
    pub followability_ratio: f64,
    /// Share of round-trip mints whose first sell came within 60 s of the first buy
    pub quick_dump_rate: f64,
    pub avg_time_to_first_sell_secs: f64,
    pub median_time_to_first_sell_secs: f64,
    pub followable_tokens: u32,
    pub unfollowable_tokens: u32,
    pub avg_entry_size_sol: f64,
    pub computed_at: i64,
}

// =============================================================================
// TOKEN METADATA
// =============================================================================

/// Cached token metadata keyed by mint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub mint: String,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub decimals: Option<u8>,
    pub fetched_at: i64,
}

// =============================================================================
// SYNC
// =============================================================================

/// Result of a sync run, cloned to every caller attached to the run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub wallet: String,
    pub new_signatures: u32,
    pub parsed_transactions: u32,
    pub new_trades: u32,
    pub skipped_malformed: u32,
    pub last_signature: Option<String>,
}
