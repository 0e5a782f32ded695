use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use property_calc_core::mortgage::{self, LoanTerms, ScheduleInput};

use crate::input;

/// Arguments for the monthly payment calculation
#[derive(Args)]
pub struct PaymentArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate as a percentage (4.5 = 4.5%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Amortization period in years
    #[arg(long)]
    pub years: Option<u32>,
}

/// Arguments for the yearly amortization schedule
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate as a percentage
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Amortization period in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Years to report (defaults to the amortization period)
    #[arg(long)]
    pub horizon: Option<u32>,
}

pub fn run_payment(args: PaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan = if let Some(data) = input::read_document(args.input.as_deref())? {
        LoanTerms::from_value(&data)?
    } else {
        LoanTerms {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate_percent: args.rate.ok_or("--rate is required (or provide --input)")?,
            amortization_years: args.years.ok_or("--years is required (or provide --input)")?,
        }
    };

    let payment = mortgage::monthly_payment(
        loan.principal,
        loan.annual_rate_percent,
        loan.amortization_years,
    )?;
    Ok(json!({
        "result": {
            "monthly_payment": payment,
            "principal": loan.principal,
            "annual_rate_percent": loan.annual_rate_percent,
            "amortization_years": loan.amortization_years,
        }
    }))
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let schedule_input = if let Some(data) = input::read_document(args.input.as_deref())? {
        ScheduleInput::from_value(&data)?
    } else {
        ScheduleInput {
            loan: LoanTerms {
                principal: args
                    .principal
                    .ok_or("--principal is required (or provide --input)")?,
                annual_rate_percent: args.rate.ok_or("--rate is required (or provide --input)")?,
                amortization_years: args
                    .years
                    .ok_or("--years is required (or provide --input)")?,
            },
            horizon_years: args.horizon,
        }
    };

    let result = mortgage::build_schedule(&schedule_input)?;
    Ok(serde_json::to_value(result)?)
}
