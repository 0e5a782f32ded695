use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use property_calc_core::config::EngineConfig;
use property_calc_core::input::{as_record, require_decimal};
use property_calc_core::tax::{self, TaxBracketTable};

use crate::input;

/// Arguments for the tiered transfer-tax calculation
#[derive(Args)]
pub struct TransferTaxArgs {
    /// Path to JSON input file: { "price": ..., "table": { "brackets": [...] } }
    #[arg(long)]
    pub input: Option<String>,

    /// Purchase price
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Selects the configured table in effect on this date (default: today)
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

pub fn run_transfer_tax(
    args: TransferTaxArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let date = super::as_of(args.date);

    let (price, inline_table) = if let Some(data) = input::read_document(args.input.as_deref())? {
        let record = as_record(&data, "transfer-tax input")?;
        let table = match record.get("table") {
            None | Some(Value::Null) => None,
            Some(t) => Some(serde_json::from_value::<TaxBracketTable>(t.clone())?),
        };
        (require_decimal(record, "price")?, table)
    } else {
        let price = args.price.ok_or("--price is required (or provide --input)")?;
        (price, None)
    };

    let table = match inline_table.as_ref() {
        Some(t) => t,
        None => config
            .transfer_tax_for(date)?
            .ok_or("no transfer-tax table is configured")?,
    };

    let breakdown = tax::tax_breakdown(price, table)?;
    Ok(json!({
        "result": breakdown,
        "table": table.name,
        "as_of": date,
    }))
}
