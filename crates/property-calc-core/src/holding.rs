use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use serde_json::Value;

use crate::error::RealtyError;
use crate::input::{as_record, optional_decimal, require_u32};
use crate::irr::{self, IrrOptions, IrrOutcome};
use crate::mortgage::{self, LoanTerms};
use crate::multi_unit::{self, MultiScenario, MultiUnitPolicy};
use crate::types::{percent_to_rate, with_metadata, ComputationOutput, Money, Percent};
use crate::RealtyResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A multi-unit deal held for a fixed number of years, then sold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldInput {
    pub scenario: MultiScenario,
    pub holding_years: u32,
    /// Annual rent growth (3 = 3%)
    #[serde(default)]
    pub rent_growth_percent: Percent,
    /// Annual property value growth applied to total investment
    #[serde(default)]
    pub appreciation_percent: Percent,
    /// Selling costs as a share of sale price
    #[serde(default)]
    pub selling_cost_percent: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldYear {
    pub year: u32,
    pub gross_rent: Money,
    pub noi: Money,
    pub debt_service: Money,
    pub cashflow: Money,
    pub loan_balance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldProjection {
    pub years: Vec<HoldYear>,
    pub equity_invested: Money,
    pub sale_price: Money,
    pub selling_costs: Money,
    pub net_sale_proceeds: Money,
    pub total_cashflow: Money,
    /// (total cash flow + net sale proceeds) / equity invested
    pub equity_multiple: Decimal,
    pub irr: IrrOutcome,
}

impl HoldInput {
    /// Build from a loosely-typed record (numbers or numeric strings).
    /// Growth and selling-cost percentages default to zero.
    pub fn from_value(value: &Value) -> RealtyResult<Self> {
        let record = as_record(value, "holding input")?;
        let scenario = match record.get("scenario") {
            Some(s) => MultiScenario::from_value(s)?,
            None => return Err(RealtyError::invalid("scenario", "value is required")),
        };
        let percent = |field: &str| -> RealtyResult<Percent> {
            Ok(optional_decimal(record, field)?.unwrap_or(Decimal::ZERO))
        };
        Ok(HoldInput {
            scenario,
            holding_years: require_u32(record, "holding_years")?,
            rent_growth_percent: percent("rent_growth_percent")?,
            appreciation_percent: percent("appreciation_percent")?,
            selling_cost_percent: percent("selling_cost_percent")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project equity cash flows over the hold and solve for the levered IRR.
pub fn project_hold(
    input: &HoldInput,
    policy: &MultiUnitPolicy,
    irr_options: &IrrOptions,
) -> RealtyResult<ComputationOutput<HoldProjection>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.holding_years == 0 {
        return Err(RealtyError::invalid(
            "holding_years",
            "Holding period must be at least 1 year",
        ));
    }
    if input.selling_cost_percent < Decimal::ZERO || input.selling_cost_percent >= dec!(100) {
        return Err(RealtyError::invalid(
            "selling_cost_percent",
            "Selling costs must be between 0 and 100%",
        ));
    }
    if input.rent_growth_percent <= dec!(-100) || input.appreciation_percent <= dec!(-100) {
        return Err(RealtyError::invalid(
            "growth",
            "Growth rates must exceed -100%",
        ));
    }

    // Year-one economics and all validation come from the base analysis.
    let base = multi_unit::analyze(&input.scenario, policy)?;
    warnings.extend(base.warnings);
    let details = base.result.details;

    let loan = LoanTerms {
        principal: details.loan_amount,
        annual_rate_percent: details.financing.interest_rate_percent,
        amortization_years: details.financing.amortization_years,
    };
    let schedule = mortgage::amortization_schedule(&loan, input.holding_years)?;

    let rent_growth = Decimal::ONE + percent_to_rate(input.rent_growth_percent);
    let mut rent = input.scenario.gross_annual_rent;
    let mut years = Vec::with_capacity(schedule.len());

    for entry in &schedule {
        if entry.year > 1 {
            rent = compound(rent, rent_growth, "projected rent")?;
        }
        let noi = rent * (Decimal::ONE - details.expense_ratio);
        years.push(HoldYear {
            year: entry.year,
            gross_rent: rent,
            noi,
            debt_service: entry.payment,
            cashflow: noi - entry.payment,
            loan_balance: entry.remaining_balance,
        });
    }

    // --- Exit ---
    let appreciation = Decimal::ONE + percent_to_rate(input.appreciation_percent);
    let mut sale_price = details.total_investment;
    for _ in 0..input.holding_years {
        sale_price = compound(sale_price, appreciation, "projected sale price")?;
    }
    let selling_costs = sale_price * percent_to_rate(input.selling_cost_percent);
    let closing_balance = years.last().map(|y| y.loan_balance).unwrap_or(loan.principal);
    let net_sale_proceeds = sale_price - selling_costs - closing_balance;

    if net_sale_proceeds < Decimal::ZERO {
        warnings.push("Sale proceeds do not cover the outstanding loan balance".into());
    }

    // --- Returns ---
    let equity_invested = details.down_payment;
    let total_cashflow = years
        .iter()
        .try_fold(Decimal::ZERO, |acc, y| acc.checked_add(y.cashflow))
        .ok_or_else(|| out_of_range("total cash flow"))?;
    let total_return = total_cashflow
        .checked_add(net_sale_proceeds)
        .ok_or_else(|| out_of_range("total return"))?;
    let equity_multiple = total_return
        .checked_div(equity_invested)
        .ok_or_else(|| out_of_range("equity multiple"))?;

    let mut equity_flows: Vec<Money> = years.iter().map(|y| y.cashflow).collect();
    if let Some(last) = equity_flows.last_mut() {
        *last = last
            .checked_add(net_sale_proceeds)
            .ok_or_else(|| out_of_range("exit-year cash flow"))?;
    }
    let irr = irr::solve_irr(&equity_flows, -equity_invested, irr_options)?;

    match &irr {
        IrrOutcome::NotConverged { iterations, .. } => warnings.push(format!(
            "IRR did not converge after {iterations} iterations; estimate is unreliable"
        )),
        IrrOutcome::NoSolution { reason } => {
            warnings.push(format!("IRR undefined: {reason}"));
        }
        IrrOutcome::Converged { .. } => {}
    }

    let output = HoldProjection {
        years,
        equity_invested,
        sale_price,
        selling_costs,
        net_sale_proceeds,
        total_cashflow,
        equity_multiple,
        irr,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Holding-period projection (levered equity cash flows, Newton-Raphson IRR)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn compound(value: Money, factor: Decimal, what: &str) -> RealtyResult<Money> {
    value.checked_mul(factor).ok_or_else(|| out_of_range(what))
}

fn out_of_range(what: &str) -> RealtyError {
    RealtyError::degenerate(format!("{what} exceeds representable range"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multi_unit::FinancingInput;

    fn input(holding_years: u32) -> HoldInput {
        HoldInput {
            scenario: MultiScenario {
                purchase_price: dec!(300000),
                gross_annual_rent: dec!(36000),
                units: 2,
                renovation_cost: None,
                financing: None,
            },
            holding_years,
            rent_growth_percent: Decimal::ZERO,
            appreciation_percent: Decimal::ZERO,
            selling_cost_percent: Decimal::ZERO,
        }
    }

    fn run(i: &HoldInput) -> ComputationOutput<HoldProjection> {
        project_hold(i, &MultiUnitPolicy::default(), &IrrOptions::default()).unwrap()
    }

    #[test]
    fn test_year_count_and_flat_rent() {
        let out = run(&input(5));
        let p = &out.result;
        assert_eq!(p.years.len(), 5);
        assert!(p.years.iter().all(|y| y.gross_rent == dec!(36000)));
        assert!(p.years.iter().all(|y| y.noi == dec!(25200)));
        assert_eq!(p.equity_invested, dec!(75000));
    }

    #[test]
    fn test_rent_growth_compounds() {
        let mut i = input(3);
        i.rent_growth_percent = dec!(10);
        let out = run(&i);
        let y = &out.result.years;
        assert_eq!(y[0].gross_rent, dec!(36000));
        assert_eq!(y[1].gross_rent, dec!(39600));
        assert_eq!(y[2].gross_rent, dec!(43560));
    }

    #[test]
    fn test_exit_without_appreciation_repays_loan() {
        let out = run(&input(5));
        let p = &out.result;
        assert_eq!(p.sale_price, dec!(300000));
        let balance = p.years.last().unwrap().loan_balance;
        assert_eq!(p.net_sale_proceeds, dec!(300000) - balance);
    }

    #[test]
    fn test_irr_converges_for_positive_deal() {
        let mut i = input(5);
        i.appreciation_percent = dec!(3);
        i.selling_cost_percent = dec!(5);
        let out = run(&i);
        let rate = out.result.irr.converged_rate().expect("IRR should converge");
        // Cash-on-cash alone is ~13.6%; appreciation pushes it higher
        assert!(rate > dec!(10) && rate < dec!(40), "got {rate}");
        assert!(out.result.equity_multiple > Decimal::ONE);
    }

    #[test]
    fn test_paid_off_loan_zero_fills_debt_service() {
        let mut i = input(6);
        i.scenario.financing = Some(FinancingInput {
            amortization_years: Some(3),
            ..FinancingInput::default()
        });
        let out = run(&i);
        let y = &out.result.years;
        assert_eq!(y[3].debt_service, Decimal::ZERO);
        assert_eq!(y[5].loan_balance, Decimal::ZERO);
        assert_eq!(y[5].cashflow, y[5].noi);
    }

    #[test]
    fn test_runaway_appreciation_is_degenerate_not_panic() {
        let mut i = input(40);
        i.appreciation_percent = dec!(1000);
        let err = project_hold(&i, &MultiUnitPolicy::default(), &IrrOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), "computation_degenerate");
        assert!(err.to_string().contains("sale price"), "got {err}");
    }

    #[test]
    fn test_runaway_rent_growth_is_degenerate_not_panic() {
        let mut i = input(40);
        i.rent_growth_percent = dec!(1000);
        let err = project_hold(&i, &MultiUnitPolicy::default(), &IrrOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), "computation_degenerate");
    }

    #[test]
    fn test_from_value_accepts_numeric_strings() {
        let i = HoldInput::from_value(&serde_json::json!({
            "scenario": { "purchase_price": "300000", "gross_annual_rent": 36000, "units": "2" },
            "holding_years": "5",
            "appreciation_percent": "3"
        }))
        .unwrap();
        assert_eq!(i.scenario.units, 2);
        assert_eq!(i.holding_years, 5);
        assert_eq!(i.appreciation_percent, dec!(3));
        assert_eq!(i.selling_cost_percent, Decimal::ZERO);

        let err = HoldInput::from_value(&serde_json::json!({ "holding_years": 5 })).unwrap_err();
        assert!(matches!(err, RealtyError::InvalidInput { ref field, .. } if field == "scenario"));
    }

    #[test]
    fn test_zero_holding_years_rejected() {
        let err = project_hold(&input(0), &MultiUnitPolicy::default(), &IrrOptions::default())
            .unwrap_err();
        assert!(matches!(err, RealtyError::InvalidInput { ref field, .. } if field == "holding_years"));
    }

    #[test]
    fn test_scenario_errors_propagate() {
        let mut i = input(5);
        i.scenario.units = 0;
        assert!(project_hold(&i, &MultiUnitPolicy::default(), &IrrOptions::default()).is_err());
    }
}
