//! Divvy command-line interface.
//!
//! Opens the ledger stored under the data directory, runs one command
//! against it and exits. Payouts are recorded in memory only.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing::debug;

use divvy_core::{AccountId, Amount};
use divvy_ledger::PayoutLog;
use divvy_node::{Node, NodeConfig};

/// Proportional-dividend ledger.
#[derive(Parser, Debug)]
#[command(name = "divvy-cli", version, about = "Proportional-dividend ledger")]
struct Cli {
    /// Data directory for ledger storage
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format ("text" or "json")
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    /// Genesis holder, used only when the store is empty
    #[arg(long, global = true)]
    deployer: Option<String>,

    /// Genesis share supply in whole units, used only when the store is empty
    #[arg(long, global = true)]
    initial_supply: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show token metadata and ledger totals.
    Info,
    /// Deposit value into the earnings pool.
    Deposit(DepositArgs),
    /// Withdraw settled entitlement.
    ///
    /// The debit is stored in the ledger, but the payout is only recorded
    /// in memory for this run and is not sent anywhere.
    Withdraw(AccountAmountArgs),
    /// Transfer shares between accounts.
    Transfer(TransferArgs),
    /// Entitlement including accrual not yet settled.
    Available(AccountArgs),
    /// Entitlement as of the last settlement.
    Left(AccountArgs),
    /// Total value ever deposited.
    Earnings,
    /// Total earnings recorded at an account's last settlement.
    Snapshot(AccountArgs),
    /// Share balance of an account.
    Balance(AccountArgs),
    /// Verify ledger invariants.
    Audit,
}

#[derive(Args, Debug)]
struct AccountArgs {
    /// Account id (0x-prefixed, 40 hex characters).
    account: String,
}

#[derive(Args, Debug)]
struct AccountAmountArgs {
    /// Account id (0x-prefixed, 40 hex characters).
    account: String,
    /// Amount in whole units (e.g. 0.2).
    amount: String,
}

#[derive(Args, Debug)]
struct DepositArgs {
    /// Amount in whole units (e.g. 1.5).
    amount: String,
    /// Depositing account. Defaults to the zero account.
    #[arg(long)]
    from: Option<String>,
}

#[derive(Args, Debug)]
struct TransferArgs {
    /// Sending account.
    from: String,
    /// Receiving account.
    to: String,
    /// Shares in whole units.
    amount: String,
}

impl Cli {
    /// Merge CLI flags over the environment and defaults.
    fn config(&self) -> Result<NodeConfig> {
        let mut config = NodeConfig::from_env().context("failed to read DIVVY_* environment")?;
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(deployer) = &self.deployer {
            config.deployer = parse_account(deployer)?;
        }
        if let Some(supply) = &self.initial_supply {
            config.initial_supply = parse_amount(supply)?;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config()?;
    init_logging(&config.log_level, &cli.log_format);
    debug!(?config, "configuration");

    let node = Node::open(config, Arc::new(PayoutLog::new())).context("failed to open ledger")?;
    let result = run(&node, &cli);
    node.shutdown().context("failed to flush ledger")?;
    result
}

fn run(node: &Node, cli: &Cli) -> Result<()> {
    let ledger = node.ledger();
    let out = Output { json: cli.json };

    match &cli.command {
        Commands::Info => {
            let token = ledger.token_info();
            let db_path = node.config().db_path();
            out.print(
                json!({
                    "name": token.name,
                    "symbol": token.symbol,
                    "decimals": token.decimals,
                    "total_supply": ledger.total_supply(),
                    "total_earnings": ledger.total_earnings(),
                    "pool_balance": ledger.pool_balance(),
                    "database": db_path.display().to_string(),
                }),
                format!(
                    "{} ({})\ndecimals:       {}\ntotal supply:   {}\ntotal earnings: {}\npool balance:   {}\ndatabase:       {}",
                    token.name,
                    token.symbol,
                    token.decimals,
                    ledger.total_supply(),
                    ledger.total_earnings(),
                    ledger.pool_balance(),
                    db_path.display(),
                ),
            );
        }
        Commands::Deposit(args) => {
            let amount = parse_amount(&args.amount)?;
            let depositor = match &args.from {
                Some(from) => parse_account(from)?,
                None => AccountId::ZERO,
            };
            let event = ledger.deposit(&depositor, amount)?;
            out.print(json!(event), event.to_string());
        }
        Commands::Withdraw(args) => {
            let account = parse_account(&args.account)?;
            let amount = parse_amount(&args.amount)?;
            let w = ledger.withdraw(&account, amount)?;
            out.print(
                json!({
                    "account": w.account,
                    "amount": w.amount,
                    "accrued": w.settlement.accrued,
                    "remaining": w.remaining(),
                }),
                format!(
                    "withdrew {} from {}, {} left (payout recorded for this run only)",
                    w.amount,
                    w.account,
                    w.remaining()
                ),
            );
        }
        Commands::Transfer(args) => {
            let from = parse_account(&args.from)?;
            let to = parse_account(&args.to)?;
            let amount = parse_amount(&args.amount)?;
            let t = ledger.transfer(&from, &to, amount)?;
            out.print(
                json!({ "from": t.from, "to": t.to, "amount": t.amount }),
                format!("transferred {} shares from {} to {}", t.amount, t.from, t.to),
            );
        }
        Commands::Available(args) => {
            let account = parse_account(&args.account)?;
            out.amount(ledger.available_for_withdrawal(&account)?);
        }
        Commands::Left(args) => {
            out.amount(ledger.left_for_withdrawal(&parse_account(&args.account)?));
        }
        Commands::Earnings => out.amount(ledger.total_earnings()),
        Commands::Snapshot(args) => {
            out.amount(ledger.snapshot_total_earnings(&parse_account(&args.account)?));
        }
        Commands::Balance(args) => {
            out.amount(ledger.balance_of(&parse_account(&args.account)?));
        }
        Commands::Audit => {
            ledger.check_invariants()?;
            out.print(json!({ "ok": true }), "ledger invariants hold".to_string());
        }
    }
    Ok(())
}

struct Output {
    json: bool,
}

impl Output {
    fn print(&self, value: serde_json::Value, text: String) {
        if self.json {
            println!("{value}");
        } else {
            println!("{text}");
        }
    }

    fn amount(&self, amount: Amount) {
        self.print(json!({ "amount": amount }), amount.to_string());
    }
}

fn parse_account(s: &str) -> Result<AccountId> {
    s.parse()
        .with_context(|| format!("invalid account id: {s}"))
}

fn parse_amount(s: &str) -> Result<Amount> {
    s.parse().with_context(|| format!("invalid amount: {s}"))
}

/// Initialize tracing subscriber with the given log level and output format.
///
/// Logs go to stderr so command output on stdout stays parseable.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
