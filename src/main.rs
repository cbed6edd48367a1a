use std::sync::Arc;

use copyscope::arguments;
use copyscope::config::Config;
use copyscope::database::Database;
use copyscope::follow;
use copyscope::logger::{ self, LogTag };
use copyscope::pnl;
use copyscope::profiler;
use copyscope::provider::EnhancedTxProvider;
use copyscope::sync::{ status, SyncCoordinator };
use copyscope::types::{ SlippageModel, Timeframe, TrackedWallet };

const USAGE: &str = r#"copyscope — wallet swap-history analytics

USAGE:
    copyscope <command> [flags]

COMMANDS:
    sync        Ingest new transactions for a wallet (--wallet, --owner, --force)
    summary     Period PnL report (--wallet, --timeframe 24h|7d|30d|90d|all)
    profile     Behavioral profile (--wallet)
    simulate    Copy-trade simulation (--wallet, --delay, --slippage)
    wallets     List tracked wallets (--owner)
    add         Track a wallet (--wallet, --owner, --name)
    remove      Stop tracking a wallet and delete its data (--wallet, --owner)

FLAGS:
    --config <path>      Config file (default: copyscope.toml)
    --debug-<module>     Enable debug logs for a module
    --verbose            Enable all verbose logs
"#;

#[tokio::main]
async fn main() {
    logger::init();

    let config_path = arguments
        ::get_arg_value("--config")
        .unwrap_or_else(|| "copyscope.toml".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            logger::error(LogTag::System, &format!("Config error: {:#}", e));
            std::process::exit(1);
        }
    };

    let db = match Database::open(&config.database.path) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            logger::error(LogTag::System, &format!("Database error: {}", e));
            std::process::exit(1);
        }
    };

    let command = arguments::get_subcommand().unwrap_or_default();
    let exit_code = match command.as_str() {
        "sync" => run_sync(&config, db).await,
        "summary" => run_summary(&db),
        "profile" => run_profile(&db),
        "simulate" => run_simulate(&config, &db),
        "wallets" => run_wallets(&db),
        "add" => run_add(&db),
        "remove" => run_remove(&db),
        _ => {
            print!("{}", USAGE);
            2
        }
    };
    std::process::exit(exit_code);
}

fn require_wallet() -> Option<String> {
    let wallet = arguments::get_arg_value("--wallet");
    if wallet.is_none() {
        eprintln!("Missing required flag: --wallet");
    }
    wallet
}

fn owner() -> String {
    arguments::get_arg_value("--owner").unwrap_or_else(|| "default".to_string())
}

async fn run_sync(config: &Config, db: Arc<Database>) -> i32 {
    let Some(wallet) = require_wallet() else {
        return 2;
    };
    let force = arguments::has_arg("--force");

    let provider = match EnhancedTxProvider::new(&config.provider) {
        Ok(provider) => provider,
        Err(e) => {
            logger::error(LogTag::Provider, &e.to_string());
            return 1;
        }
    };
    let coordinator = SyncCoordinator::new(db, provider, config.clone());

    // Mirror status events to the console while the sync runs
    let mut events = status::subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event.percentage {
                Some(pct) => println!("[{:?}] {} ({:.0}%)", event.level, event.message, pct),
                None => println!("[{:?}] {}", event.level, event.message),
            }
        }
    });

    let result = coordinator.sync_wallet(&wallet, &owner(), force).await;
    printer.abort();

    match result {
        Ok(outcome) => {
            println!(
                "Synced {}: {} transactions, {} trades ({} malformed skipped)",
                outcome.wallet,
                outcome.parsed_transactions,
                outcome.new_trades,
                outcome.skipped_malformed
            );
            0
        }
        Err(e) => {
            eprintln!("Sync failed for {}: {}", wallet, e);
            1
        }
    }
}

fn run_summary(db: &Database) -> i32 {
    let Some(wallet) = require_wallet() else {
        return 2;
    };
    let timeframe = arguments
        ::get_arg_value("--timeframe")
        .and_then(|s| Timeframe::from_str(&s))
        .unwrap_or(Timeframe::Days7);

    match pnl::summarize(db, &wallet, timeframe) {
        Ok(summary) => {
            println!("{}", serde_json::to_string_pretty(&summary).unwrap_or_default());
            0
        }
        Err(e) => {
            eprintln!("Summary failed: {}", e);
            1
        }
    }
}

fn run_profile(db: &Database) -> i32 {
    let Some(wallet) = require_wallet() else {
        return 2;
    };
    match profiler::profile_wallet(db, &wallet) {
        Ok(profile) => {
            println!("{}", serde_json::to_string_pretty(&profile).unwrap_or_default());
            0
        }
        Err(e) => {
            eprintln!("Profile failed: {}", e);
            1
        }
    }
}

fn run_simulate(config: &Config, db: &Database) -> i32 {
    let Some(wallet) = require_wallet() else {
        return 2;
    };
    let delay = arguments
        ::get_arg_value("--delay")
        .and_then(|s| s.parse().ok())
        .unwrap_or(config.follow.default_delay_seconds);
    let model = arguments
        ::get_arg_value("--slippage")
        .and_then(|s| SlippageModel::from_str(&s))
        .or_else(|| SlippageModel::from_str(&config.follow.default_slippage_model))
        .unwrap_or(SlippageModel::Moderate);

    match follow::simulate_wallet(db, &wallet, delay, model) {
        Ok(score) => {
            println!("{}", serde_json::to_string_pretty(&score).unwrap_or_default());
            0
        }
        Err(e) => {
            eprintln!("Simulation failed: {}", e);
            1
        }
    }
}

fn run_wallets(db: &Database) -> i32 {
    match db.list_wallets(&owner()) {
        Ok(wallets) => {
            for wallet in wallets {
                println!(
                    "{} {} {}  pnl: {:.4} SOL  win rate: {:.0}%  trades: {}",
                    wallet.emoji,
                    wallet.address,
                    wallet.name,
                    wallet.total_realized_pnl,
                    wallet.win_rate * 100.0,
                    wallet.total_trades
                );
            }
            0
        }
        Err(e) => {
            eprintln!("Listing failed: {}", e);
            1
        }
    }
}

fn run_add(db: &Database) -> i32 {
    let Some(wallet) = require_wallet() else {
        return 2;
    };
    let name = arguments::get_arg_value("--name").unwrap_or_default();
    let emoji = arguments::get_arg_value("--emoji").unwrap_or_default();
    let record = TrackedWallet::new(
        &wallet,
        &owner(),
        &name,
        &emoji,
        chrono::Utc::now().timestamp()
    );

    match db.upsert_wallet(&record) {
        Ok(()) => {
            println!("Tracking {}", wallet);
            0
        }
        Err(e) => {
            eprintln!("Add failed: {}", e);
            1
        }
    }
}

fn run_remove(db: &Database) -> i32 {
    let Some(wallet) = require_wallet() else {
        return 2;
    };
    match db.remove_wallet(&wallet, &owner()) {
        Ok(()) => {
            println!("Removed {} and all its data", wallet);
            0
        }
        Err(e) => {
            eprintln!("Remove failed: {}", e);
            1
        }
    }
}
