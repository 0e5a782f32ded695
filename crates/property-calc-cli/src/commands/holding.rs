use clap::Args;
use serde_json::Value;

use property_calc_core::config::EngineConfig;
use property_calc_core::holding::{self, HoldInput};

use crate::input;

/// Arguments for the holding-period projection
#[derive(Args)]
pub struct HoldArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_hold(args: HoldArgs, config: &EngineConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let data = input::read_document(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for holding-period projection")?;
    let hold_input = HoldInput::from_value(&data)?;
    let result = holding::project_hold(&hold_input, &config.multi_unit, &config.irr)?;
    Ok(serde_json::to_value(result)?)
}
