/// Shared constants for the analytics pipeline
///
/// Mint sets, DEX registry and conversion constants used by the parser,
/// the FIFO engine and the sync coordinator.

// =============================================================================
// SOL / LAMPORTS
// =============================================================================

/// Lamports per SOL
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Native SOL pseudo-mint used by enhanced providers
pub const NATIVE_SOL_MINT: &str = "So11111111111111111111111111111111111111111";

/// Wrapped SOL SPL mint
pub const WRAPPED_SOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// Mints that must be treated as SOL itself
pub const SOL_MINTS: &[&str] = &[NATIVE_SOL_MINT, WRAPPED_SOL_MINT];

// =============================================================================
// INTERMEDIATE TOKENS
// =============================================================================

/// Stablecoins and liquid-staking tokens commonly used as routing hops.
/// These never appear as the target mint of a canonical trade; a swap routed
/// through one of them is collapsed into a single SOL-token trade.
pub const INTERMEDIATE_MINTS: &[&str] = &[
    // Stablecoins
    "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v", // USDC
    "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB", // USDT
    "USDSwr9ApdHk5bvJKMjzff41FfuX8bSxdKcR81vTwcA", // USDS
    "USD1ttGY1N17NEEHLmELoaybftRBUSErhqYiQzvEmuB", // USD1
    // Liquid staking
    "mSoLzYCxHdYgdzU16g5QSh3i5K3z3KZK7ytfqcJm7So", // mSOL
    "bSo13r4TkiE4KumL71LsHTPpL2euBYLFx6h9HP3piy1", // bSOL
    "7dHbWXmci3dT8UFYWYZweBLXgycu7Y3iL6trKn1Y7ARj", // stSOL
    "J1toso1uCk3RLmjorhTtrVwY9HJ7X8V9yYac6Y7kGCPn", // jitoSOL
];

/// True when the mint is native or wrapped SOL
pub fn is_sol_mint(mint: &str) -> bool {
    SOL_MINTS.contains(&mint)
}

/// True when the mint is a routing intermediate (includes SOL mints)
pub fn is_intermediate_mint(mint: &str) -> bool {
    is_sol_mint(mint) || INTERMEDIATE_MINTS.contains(&mint)
}

// =============================================================================
// DEX REGISTRY
// =============================================================================

/// Known DEX vendors for source-string matching.
/// Pairs of (needle for case-insensitive substring test, canonical label).
pub const KNOWN_DEX_VENDORS: &[(&str, &str)] = &[
    ("jupiter", "Jupiter"),
    ("raydium", "Raydium"),
    ("pump", "Pump.fun"),
    ("orca", "Orca"),
    ("meteora", "Meteora"),
    ("moonshot", "Moonshot"),
    ("phoenix", "Phoenix"),
    ("lifinity", "Lifinity"),
];

/// Known DEX program ids mapped to their labels, used when only a low-level
/// parsed record with an instruction list is available.
pub const DEX_PROGRAM_IDS: &[(&str, &str)] = &[
    ("JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4", "Jupiter"),
    ("675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8", "Raydium"),
    ("CAMMCzo5YL8w4VFF8KVHrK22GGUsp5VTaW7grrKgrWqK", "Raydium"),
    ("6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P", "Pump.fun"),
    ("pAMMBay6oceH9fJKBRHGP5D4bD4sWpmSwMn52FMfXEA", "Pump.fun"),
    ("9W959DqEETiGZocYWCQPaJ6sBmUzgfxXfqGeTEdp3aQP", "Orca"),
    ("whirLbMiicVdio4qvUfM5KAg6Ct8VwpYzGff3uctyCc", "Orca"),
    ("Eo7WjKq67rjJQSZxS6z3YkapzY3eMj6Xy8X5EQVn5UaB", "Meteora"),
    ("LBUZKhRxPF3XUpBCjp4YzTKgLccjZhTSDM9YuVaPwxo", "Meteora"),
    ("MoonCVVNZFSYkqNXP6bxHLPL6QQJiMagDL3qcqUQTrG", "Moonshot"),
    ("PhoeNiX7BPQtuPBGYWf5KhxZVsXBMNzC9mHvgSe3kfE", "Phoenix"),
    ("EewxydAPCCVuNEyrVN68PuSYdQ7wKn27V9Gjeoi8dy3S", "Lifinity"),
];

// =============================================================================
// PARSER THRESHOLDS
// =============================================================================

/// Token deltas below this absolute value are dropped as dust
pub const DUST_THRESHOLD: f64 = 1e-6;

/// SOL deltas below this absolute value are treated as negligible
pub const SOL_DELTA_FLOOR: f64 = 1e-4;

// =============================================================================
// SYNC TUNING
// =============================================================================

/// Signature page size per provider call
pub const SIGNATURE_PAGE_LIMIT: usize = 1000;

/// Enhanced-transaction batch size per provider call
pub const ENHANCE_BATCH_SIZE: usize = 100;

/// Safety cap on new signatures ingested in a single run
pub const MAX_SIGNATURES_PER_SYNC: usize = 5000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sol_mints_are_intermediates() {
        assert!(is_intermediate_mint(NATIVE_SOL_MINT));
        assert!(is_intermediate_mint(WRAPPED_SOL_MINT));
        assert!(is_sol_mint(WRAPPED_SOL_MINT));
    }

    #[test]
    fn test_stablecoins_are_intermediates_not_sol() {
        let usdc = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
        assert!(is_intermediate_mint(usdc));
        assert!(!is_sol_mint(usdc));
    }
}
