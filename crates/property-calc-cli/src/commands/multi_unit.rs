use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use property_calc_core::config::EngineConfig;
use property_calc_core::multi_unit::{self, MultiScenario};

use crate::input;

/// Arguments for multi-unit rental analysis
#[derive(Args)]
pub struct MultiArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,

    /// Date used to pick the transfer-tax table (default: today)
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

pub fn run_multi(args: MultiArgs, config: &EngineConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let data = input::read_document(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for multi-unit analysis")?;
    let scenario = MultiScenario::from_value(&data)?;
    let table = config.transfer_tax_for(super::as_of(args.date))?;
    let result = multi_unit::analyze_with_transfer_tax(&scenario, &config.multi_unit, table)?;
    Ok(serde_json::to_value(result)?)
}
