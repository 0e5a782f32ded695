use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use property_calc_core::config::EngineConfig;
use property_calc_core::input::{as_record, require_decimal, require_decimal_list};
use property_calc_core::irr::{self, IrrOptions};

use crate::input;

/// Arguments for the IRR solver
#[derive(Args)]
pub struct IrrArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Signed time-zero amount (an outlay is negative)
    #[arg(long, allow_hyphen_values = true)]
    pub initial: Option<Decimal>,

    /// Period cash flows (comma-separated, e.g. "30000,30000,130000")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,
}

pub fn run_irr(args: IrrArgs, config: &EngineConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let mut options = config.irr.clone();

    let (cashflows, initial) = if let Some(data) = input::read_document(args.input.as_deref())? {
        let record = as_record(&data, "irr input")?;
        if let Some(o) = record.get("options") {
            options = serde_json::from_value::<IrrOptions>(o.clone())?;
        }
        (
            require_decimal_list(record, "cashflows")?,
            require_decimal(record, "initial_investment")?,
        )
    } else {
        let initial = args
            .initial
            .ok_or("--initial is required (or provide --input)")?;
        let flows = args
            .cash_flows
            .ok_or("--cash-flows is required (or provide --input)")?;
        (flows, initial)
    };

    let outcome = irr::solve_irr(&cashflows, initial, &options)?;
    Ok(json!({
        "result": outcome,
        "cashflows": cashflows,
        "initial_investment": initial,
    }))
}
