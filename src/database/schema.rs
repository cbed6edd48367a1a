/// Schema definitions and migration probes

use rusqlite::Connection;

pub const SCHEMA_VERSION: u32 = 3;

const SCHEMA_USERS: &str =
    r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    created_at INTEGER NOT NULL
);
"#;

const SCHEMA_WALLETS: &str =
    r#"
CREATE TABLE IF NOT EXISTS wallets (
    address TEXT NOT NULL,
    user_id TEXT NOT NULL,
    name TEXT NOT NULL DEFAULT '',
    emoji TEXT NOT NULL DEFAULT '',
    alerts_on INTEGER NOT NULL DEFAULT 0,
    last_synced_at INTEGER,
    first_synced_at INTEGER,
    last_signature TEXT,
    total_transactions INTEGER NOT NULL DEFAULT 0,
    total_realized_pnl REAL NOT NULL DEFAULT 0,
    win_rate REAL NOT NULL DEFAULT 0,
    total_sol_volume REAL NOT NULL DEFAULT 0,
    total_trades INTEGER NOT NULL DEFAULT 0,
    quick_flip_rate REAL NOT NULL DEFAULT 0,
    exited_token_rate REAL NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    PRIMARY KEY (address, user_id)
);
"#;

const SCHEMA_TRANSACTIONS: &str =
    r#"
CREATE TABLE IF NOT EXISTS transactions (
    signature TEXT NOT NULL,
    wallet TEXT NOT NULL,
    block_time INTEGER NOT NULL DEFAULT 0,
    slot INTEGER NOT NULL DEFAULT 0,
    payload TEXT NOT NULL DEFAULT '',
    parsed INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (signature, wallet)
);
"#;

const SCHEMA_TRADES: &str =
    r#"
CREATE TABLE IF NOT EXISTS trades (
    id TEXT PRIMARY KEY,
    wallet TEXT NOT NULL,
    signature TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    side TEXT NOT NULL, -- 'buy' or 'sell'
    token_mint TEXT NOT NULL,
    token_amount REAL NOT NULL,
    sol_amount REAL NOT NULL,
    price_per_token REAL NOT NULL,
    dex TEXT NOT NULL DEFAULT 'Unknown'
);
"#;

const SCHEMA_POSITIONS: &str =
    r#"
CREATE TABLE IF NOT EXISTS positions (
    wallet TEXT NOT NULL,
    token_mint TEXT NOT NULL,
    total_bought REAL NOT NULL DEFAULT 0,
    total_sold REAL NOT NULL DEFAULT 0,
    total_cost_sol REAL NOT NULL DEFAULT 0,
    total_proceeds_sol REAL NOT NULL DEFAULT 0,
    remaining_tokens REAL NOT NULL DEFAULT 0,
    average_buy_price REAL NOT NULL DEFAULT 0,
    realized_pnl_sol REAL NOT NULL DEFAULT 0,
    trade_count INTEGER NOT NULL DEFAULT 0,
    win_count INTEGER NOT NULL DEFAULT 0,
    first_trade_at INTEGER NOT NULL DEFAULT 0,
    last_trade_at INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (wallet, token_mint)
);
"#;

const SCHEMA_COST_BASIS_LOTS: &str =
    r#"
CREATE TABLE IF NOT EXISTS cost_basis_lots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    wallet TEXT NOT NULL,
    token_mint TEXT NOT NULL,
    trade_id TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    original_amount REAL NOT NULL,
    remaining_amount REAL NOT NULL,
    price_per_token REAL NOT NULL
);
"#;

const SCHEMA_TOKEN_METADATA: &str =
    r#"
CREATE TABLE IF NOT EXISTS token_metadata (
    mint TEXT PRIMARY KEY,
    symbol TEXT,
    name TEXT,
    decimals INTEGER,
    fetched_at INTEGER NOT NULL DEFAULT 0
);
"#;

const SCHEMA_TOKEN_LAUNCHES: &str =
    r#"
CREATE TABLE IF NOT EXISTS token_launches (
    mint TEXT PRIMARY KEY,
    first_signature TEXT NOT NULL,
    first_timestamp INTEGER NOT NULL,
    first_slot INTEGER NOT NULL DEFAULT 0
);
"#;

const SCHEMA_FOLLOW_SCORES: &str =
    r#"
CREATE TABLE IF NOT EXISTS wallet_follow_scores (
    wallet TEXT PRIMARY KEY,
    delay_seconds INTEGER NOT NULL,
    slippage_model TEXT NOT NULL,
    actual_pnl_sol REAL NOT NULL,
    simulated_pnl_sol REAL NOT NULL,
    followability_ratio REAL NOT NULL,
    quick_dump_rate REAL NOT NULL,
    avg_time_to_first_sell_secs REAL NOT NULL,
    median_time_to_first_sell_secs REAL NOT NULL,
    followable_tokens INTEGER NOT NULL,
    unfollowable_tokens INTEGER NOT NULL,
    avg_entry_size_sol REAL NOT NULL,
    computed_at INTEGER NOT NULL
);
"#;

const SCHEMA_METADATA: &str =
    r#"
CREATE TABLE IF NOT EXISTS db_metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

pub const SCHEMA_STATEMENTS: &[&str] = &[
    SCHEMA_USERS,
    SCHEMA_WALLETS,
    SCHEMA_TRANSACTIONS,
    SCHEMA_TRADES,
    SCHEMA_POSITIONS,
    SCHEMA_COST_BASIS_LOTS,
    SCHEMA_TOKEN_METADATA,
    SCHEMA_TOKEN_LAUNCHES,
    SCHEMA_FOLLOW_SCORES,
    SCHEMA_METADATA,
];

pub const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_transactions_wallet ON transactions(wallet, block_time DESC);",
    "CREATE INDEX IF NOT EXISTS idx_trades_wallet_time ON trades(wallet, timestamp);",
    "CREATE INDEX IF NOT EXISTS idx_trades_wallet_mint ON trades(wallet, token_mint);",
    "CREATE INDEX IF NOT EXISTS idx_positions_wallet ON positions(wallet);",
    "CREATE INDEX IF NOT EXISTS idx_lots_wallet_mint ON cost_basis_lots(wallet, token_mint, timestamp);",
];

/// Probe for a column before an additive ALTER TABLE
pub fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool, String> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({})", table))
        .map_err(|e| format!("Failed to inspect table {}: {}", table, e))?;

    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(|e| format!("Failed to read table info: {}", e))?;

    for name in names {
        let name = name.map_err(|e| format!("Failed to read column name: {}", e))?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
