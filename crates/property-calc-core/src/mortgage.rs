use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

use crate::error::RealtyError;
use crate::input::{as_record, optional_u32, require_decimal, require_u32};
use crate::types::{percent_to_rate, with_metadata, ComputationOutput, Money, Percent, Rate};
use crate::RealtyResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A fixed-rate, level-payment loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Amount borrowed
    pub principal: Money,
    /// Nominal annual rate as a percentage (4.5 = 4.5%)
    pub annual_rate_percent: Percent,
    /// Amortization period in years
    pub amortization_years: u32,
}

/// One year of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationYear {
    pub year: u32,
    /// Total paid during the year (principal + interest)
    pub payment: Money,
    pub principal_paid: Money,
    pub interest_paid: Money,
    /// Outstanding balance at year end, never negative
    pub remaining_balance: Money,
}

/// Input for a full schedule build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleInput {
    pub loan: LoanTerms,
    /// Years to report; defaults to the amortization period
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizon_years: Option<u32>,
}

/// Schedule plus lifetime totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationOutput {
    pub monthly_payment: Money,
    pub schedule: Vec<AmortizationYear>,
    pub total_payments: Money,
    pub total_interest: Money,
    pub total_principal: Money,
    /// First year whose closing balance is zero, if within the horizon
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payoff_year: Option<u32>,
}

impl LoanTerms {
    /// Build from a loosely-typed record (numbers or numeric strings).
    pub fn from_value(value: &Value) -> RealtyResult<Self> {
        let record = as_record(value, "loan")?;
        Ok(LoanTerms {
            principal: require_decimal(record, "principal")?,
            annual_rate_percent: require_decimal(record, "annual_rate_percent")?,
            amortization_years: require_u32(record, "amortization_years")?,
        })
    }
}

impl ScheduleInput {
    /// `{ "loan": {...}, "horizon_years": n }`, with the same coercion as
    /// [`LoanTerms::from_value`].
    pub fn from_value(value: &Value) -> RealtyResult<Self> {
        let record = as_record(value, "schedule input")?;
        let loan = match record.get("loan") {
            Some(l) => LoanTerms::from_value(l)?,
            None => return Err(RealtyError::invalid("loan", "value is required")),
        };
        Ok(ScheduleInput {
            loan,
            horizon_years: optional_u32(record, "horizon_years")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Level monthly payment: P * r(1+r)^n / ((1+r)^n - 1), with r the monthly
/// rate and n the number of monthly payments. A zero rate is straight-line.
pub fn monthly_payment(
    principal: Money,
    annual_rate_percent: Percent,
    years: u32,
) -> RealtyResult<Money> {
    validate_loan(principal, annual_rate_percent, years)?;

    let total_months = term_months(years)?;
    if annual_rate_percent.is_zero() {
        return Ok(principal / Decimal::from(total_months));
    }

    let monthly_rate = monthly_rate(annual_rate_percent);
    let interest_only = principal.checked_mul(monthly_rate).ok_or_else(|| {
        RealtyError::degenerate("monthly interest exceeds representable range")
    })?;

    // (1 + r)^n via iterative multiplication. Past the representable range
    // the annuity factor r(1+r)^n / ((1+r)^n - 1) is indistinguishable from r.
    let growth = Decimal::ONE + monthly_rate;
    let mut compound = Decimal::ONE;
    for _ in 0..total_months {
        match compound.checked_mul(growth) {
            Some(next) => compound = next,
            None => return Ok(interest_only),
        }
    }

    let denominator = compound - Decimal::ONE;
    if denominator.is_zero() {
        return Err(RealtyError::degenerate(
            "mortgage payment denominator underflowed to zero",
        ));
    }

    compound
        .checked_div(denominator)
        .and_then(|factor| interest_only.checked_mul(factor))
        .ok_or_else(|| RealtyError::degenerate("mortgage payment exceeds representable range"))
}

/// Year-by-year amortization. Always returns exactly `horizon_years` entries;
/// years after payoff are zero-filled.
pub fn amortization_schedule(
    loan: &LoanTerms,
    horizon_years: u32,
) -> RealtyResult<Vec<AmortizationYear>> {
    let payment = monthly_payment(
        loan.principal,
        loan.annual_rate_percent,
        loan.amortization_years,
    )?;
    let rate = monthly_rate(loan.annual_rate_percent);
    let term_months = term_months(loan.amortization_years)?;

    let mut schedule = Vec::with_capacity(horizon_years as usize);
    let mut balance = loan.principal;
    let mut month = 0u32;

    for year in 1..=horizon_years {
        let mut paid = Decimal::ZERO;
        let mut principal_paid = Decimal::ZERO;
        let mut interest_paid = Decimal::ZERO;

        for _ in 0..12 {
            if balance.is_zero() {
                break;
            }
            month += 1;

            let interest = balance * rate;
            let mut principal_part = payment - interest;

            // Last payment of the term (or any overshoot) retires the balance.
            if principal_part >= balance || month >= term_months {
                principal_part = balance;
            }

            balance -= principal_part;
            paid += principal_part + interest;
            principal_paid += principal_part;
            interest_paid += interest;
        }

        schedule.push(AmortizationYear {
            year,
            payment: paid,
            principal_paid,
            interest_paid,
            remaining_balance: balance.max(Decimal::ZERO),
        });
    }

    Ok(schedule)
}

/// Outstanding balance after `after_years` whole years of payments.
pub fn remaining_balance(loan: &LoanTerms, after_years: u32) -> RealtyResult<Money> {
    if after_years == 0 {
        validate_loan(
            loan.principal,
            loan.annual_rate_percent,
            loan.amortization_years,
        )?;
        return Ok(loan.principal);
    }
    let schedule = amortization_schedule(loan, after_years)?;
    Ok(schedule
        .last()
        .map(|y| y.remaining_balance)
        .unwrap_or(loan.principal))
}

/// Build a schedule with lifetime totals, wrapped in the standard envelope.
pub fn build_schedule(input: &ScheduleInput) -> RealtyResult<ComputationOutput<AmortizationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let loan = &input.loan;
    let horizon = input.horizon_years.unwrap_or(loan.amortization_years);

    let payment = monthly_payment(
        loan.principal,
        loan.annual_rate_percent,
        loan.amortization_years,
    )?;
    let schedule = amortization_schedule(loan, horizon)?;

    let total_payments: Money = schedule.iter().map(|y| y.payment).sum();
    let total_interest: Money = schedule.iter().map(|y| y.interest_paid).sum();
    let total_principal: Money = schedule.iter().map(|y| y.principal_paid).sum();
    let payoff_year = schedule
        .iter()
        .find(|y| y.remaining_balance.is_zero())
        .map(|y| y.year);

    if horizon < loan.amortization_years {
        warnings.push(format!(
            "Horizon of {horizon} years is shorter than the {}-year amortization; balance remains outstanding",
            loan.amortization_years
        ));
    }
    if loan.annual_rate_percent > dec!(15) {
        warnings.push(format!(
            "Annual rate of {}% is unusually high for a residential mortgage",
            loan.annual_rate_percent
        ));
    }

    let output = AmortizationOutput {
        monthly_payment: payment,
        schedule,
        total_payments,
        total_interest,
        total_principal,
        payoff_year,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Fixed-rate level-payment amortization (monthly compounding)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn monthly_rate(annual_rate_percent: Percent) -> Rate {
    percent_to_rate(annual_rate_percent) / dec!(12)
}

fn term_months(years: u32) -> RealtyResult<u32> {
    years.checked_mul(12).ok_or_else(|| {
        RealtyError::invalid("amortization_years", "Amortization period is too long")
    })
}

fn validate_loan(principal: Money, annual_rate_percent: Percent, years: u32) -> RealtyResult<()> {
    if principal < Decimal::ZERO {
        return Err(RealtyError::invalid(
            "principal",
            "Principal must not be negative",
        ));
    }
    if annual_rate_percent < Decimal::ZERO {
        return Err(RealtyError::invalid(
            "annual_rate_percent",
            "Interest rate must not be negative",
        ));
    }
    if years == 0 {
        return Err(RealtyError::invalid(
            "amortization_years",
            "Amortization period must be at least 1 year",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
