use chrono::NaiveDate;
use clap::Args;
use serde_json::{json, Value};

use property_calc_core::batch;
use property_calc_core::config::EngineConfig;

use crate::input;

/// Arguments for portfolio evaluation
#[derive(Args)]
pub struct BatchArgs {
    /// JSON array of scenarios, or an object with a "scenarios" array
    #[arg(long)]
    pub input: Option<String>,

    /// Date used to pick the transfer-tax table (default: today)
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

pub fn run_batch(args: BatchArgs, config: &EngineConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let data = input::read_document(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for batch evaluation")?;

    let items = match data {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("scenarios") {
            Some(Value::Array(items)) => items,
            _ => return Err("expected a \"scenarios\" array".into()),
        },
        _ => return Err("expected a JSON array of scenarios".into()),
    };

    let entries = batch::evaluate_portfolio(&items, config, super::as_of(args.date));
    let failed = entries.iter().filter(|e| !e.is_ok()).count();

    Ok(json!({
        "results": entries,
        "evaluated": entries.len(),
        "failed": failed,
    }))
}
