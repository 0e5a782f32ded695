use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use property_calc_core::config::EngineConfig;
use property_calc_core::flip::{self, FlipScenario};
use property_calc_core::input::{as_record, optional_decimal, require_decimal};

use crate::input;

/// Arguments for the flip profit formula
#[derive(Args)]
pub struct FlipProfitArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Expected resale price
    #[arg(long)]
    pub final_price: Option<Decimal>,

    /// Acquisition price
    #[arg(long)]
    pub purchase_price: Option<Decimal>,

    /// Renovation spend
    #[arg(long)]
    pub renovation_cost: Option<Decimal>,
}

/// Arguments for the maximum purchase price formula
#[derive(Args)]
pub struct FlipMaxPurchaseArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Expected resale price
    #[arg(long)]
    pub final_price: Option<Decimal>,

    /// Renovation spend
    #[arg(long)]
    pub renovation_cost: Option<Decimal>,

    /// Desired profit (defaults to the configured minimum)
    #[arg(long)]
    pub target_profit: Option<Decimal>,
}

/// Arguments for the maximum renovation budget formula
#[derive(Args)]
pub struct FlipMaxRenovationArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Expected resale price
    #[arg(long)]
    pub final_price: Option<Decimal>,

    /// Acquisition price
    #[arg(long)]
    pub purchase_price: Option<Decimal>,

    /// Desired profit (defaults to the configured minimum)
    #[arg(long)]
    pub target_profit: Option<Decimal>,
}

/// Arguments for the combined flip report
#[derive(Args)]
pub struct FlipArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_profit(
    args: FlipProfitArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let (final_price, purchase_price, renovation_cost) =
        if let Some(data) = input::read_document(args.input.as_deref())? {
            let record = as_record(&data, "flip input")?;
            (
                require_decimal(record, "final_price")?,
                require_decimal(record, "purchase_price")?,
                require_decimal(record, "renovation_cost")?,
            )
        } else {
            (
                args.final_price
                    .ok_or("--final-price is required (or provide --input)")?,
                args.purchase_price
                    .ok_or("--purchase-price is required (or provide --input)")?,
                args.renovation_cost
                    .ok_or("--renovation-cost is required (or provide --input)")?,
            )
        };

    let result = flip::compute_profit(final_price, purchase_price, renovation_cost, &config.flip)?;
    Ok(json!({ "result": result }))
}

pub fn run_max_purchase(
    args: FlipMaxPurchaseArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let (final_price, renovation_cost, target) =
        if let Some(data) = input::read_document(args.input.as_deref())? {
            let record = as_record(&data, "flip input")?;
            (
                require_decimal(record, "final_price")?,
                require_decimal(record, "renovation_cost")?,
                optional_decimal(record, "target_profit")?,
            )
        } else {
            (
                args.final_price
                    .ok_or("--final-price is required (or provide --input)")?,
                args.renovation_cost
                    .ok_or("--renovation-cost is required (or provide --input)")?,
                args.target_profit,
            )
        };

    let result =
        flip::compute_max_purchase_price(final_price, renovation_cost, target, &config.flip)?;
    Ok(json!({ "result": result }))
}

pub fn run_max_renovation(
    args: FlipMaxRenovationArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let (final_price, purchase_price, target) =
        if let Some(data) = input::read_document(args.input.as_deref())? {
            let record = as_record(&data, "flip input")?;
            (
                require_decimal(record, "final_price")?,
                require_decimal(record, "purchase_price")?,
                optional_decimal(record, "target_profit")?,
            )
        } else {
            (
                args.final_price
                    .ok_or("--final-price is required (or provide --input)")?,
                args.purchase_price
                    .ok_or("--purchase-price is required (or provide --input)")?,
                args.target_profit,
            )
        };

    let result =
        flip::compute_max_renovation_budget(final_price, purchase_price, target, &config.flip)?;
    Ok(json!({ "result": result }))
}

pub fn run_flip(args: FlipArgs, config: &EngineConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let data = input::read_document(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for flip analysis")?;
    let scenario = FlipScenario::from_value(&data)?;
    let result = flip::analyze_flip(&scenario, &config.flip)?;
    Ok(serde_json::to_value(result)?)
}
