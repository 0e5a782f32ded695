mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use property_calc_core::config::EngineConfig;

use commands::batch::BatchArgs;
use commands::flip::{FlipArgs, FlipMaxPurchaseArgs, FlipMaxRenovationArgs, FlipProfitArgs};
use commands::holding::HoldArgs;
use commands::irr::IrrArgs;
use commands::mortgage::{PaymentArgs, ScheduleArgs};
use commands::multi_unit::MultiArgs;
use commands::tax::TransferTaxArgs;

/// Real-estate investment calculations
#[derive(Parser)]
#[command(
    name = "pcalc",
    version,
    about = "Real-estate investment calculations",
    long_about = "A CLI for real-estate investment analysis with decimal precision. \
                  Supports mortgage payments and schedules, tiered transfer tax, IRR, \
                  fix-and-flip feasibility, multi-unit rental cash flow, holding-period \
                  projections and parallel portfolio evaluation."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Engine configuration file (.json, .yaml or .yml)
    #[arg(long, global = true)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Level monthly mortgage payment
    Payment(PaymentArgs),
    /// Yearly amortization schedule with totals
    Schedule(ScheduleArgs),
    /// Tiered land-transfer tax on a purchase price
    TransferTax(TransferTaxArgs),
    /// Internal rate of return (Newton-Raphson)
    Irr(IrrArgs),
    /// Flip profit after the flat fee reserve
    FlipProfit(FlipProfitArgs),
    /// Maximum purchase price for a target flip profit
    FlipMaxPurchase(FlipMaxPurchaseArgs),
    /// Maximum renovation budget for a target flip profit
    FlipMaxRenovation(FlipMaxRenovationArgs),
    /// Full flip report with verdict
    Flip(FlipArgs),
    /// Multi-unit rental cash-flow analysis
    Multi(MultiArgs),
    /// Holding-period projection with levered IRR
    Hold(HoldArgs),
    /// Evaluate a portfolio of flip and multi-unit scenarios in parallel
    Batch(BatchArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Version => {
            println!("pcalc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
        command => load_config(cli.config.as_deref()).and_then(|config| run(command, &config)),
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

fn load_config(path: Option<&str>) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    match path {
        Some(p) => input::file::read_config(p),
        None => Ok(EngineConfig::default()),
    }
}

fn run(
    command: Commands,
    config: &EngineConfig,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    match command {
        Commands::Payment(args) => commands::mortgage::run_payment(args),
        Commands::Schedule(args) => commands::mortgage::run_schedule(args),
        Commands::TransferTax(args) => commands::tax::run_transfer_tax(args, config),
        Commands::Irr(args) => commands::irr::run_irr(args, config),
        Commands::FlipProfit(args) => commands::flip::run_profit(args, config),
        Commands::FlipMaxPurchase(args) => commands::flip::run_max_purchase(args, config),
        Commands::FlipMaxRenovation(args) => commands::flip::run_max_renovation(args, config),
        Commands::Flip(args) => commands::flip::run_flip(args, config),
        Commands::Multi(args) => commands::multi_unit::run_multi(args, config),
        Commands::Hold(args) => commands::holding::run_hold(args, config),
        Commands::Batch(args) => commands::batch::run_batch(args, config),
        Commands::Version => Ok(serde_json::json!({ "version": env!("CARGO_PKG_VERSION") })),
    }
}
