use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

use crate::error::RealtyError;
use crate::input::{as_record, optional_decimal, optional_u32, require_decimal, require_u32};
use crate::mortgage;
use crate::tax::{self, TaxBracketTable};
use crate::types::{
    format_two_dp, round_money, with_metadata, AnalysisReport, ComputationOutput, Money, Percent,
    Rate,
};
use crate::RealtyResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Operating-expense ratio applied to buildings up to `max_units` doors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRatioTier {
    /// Inclusive upper unit count; `None` catches everything above
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_units: Option<u32>,
    pub ratio: Rate,
}

/// Fully resolved financing assumptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancingTerms {
    /// Loan as a fraction of total investment, in [0, 1]
    pub loan_to_value: Rate,
    pub interest_rate_percent: Percent,
    pub amortization_years: u32,
}

impl Default for FinancingTerms {
    fn default() -> Self {
        FinancingTerms {
            loan_to_value: dec!(0.75),
            interest_rate_percent: dec!(4.5),
            amortization_years: 25,
        }
    }
}

/// Financing as supplied by a scenario; gaps are filled from the policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinancingInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_to_value: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_rate_percent: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amortization_years: Option<u32>,
}

impl FinancingInput {
    pub fn resolve(&self, defaults: &FinancingTerms) -> FinancingTerms {
        FinancingTerms {
            loan_to_value: self.loan_to_value.unwrap_or(defaults.loan_to_value),
            interest_rate_percent: self
                .interest_rate_percent
                .unwrap_or(defaults.interest_rate_percent),
            amortization_years: self
                .amortization_years
                .unwrap_or(defaults.amortization_years),
        }
    }
}

/// Policy knobs for multi-unit analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiUnitPolicy {
    /// Monthly cash flow per door required for a viable verdict
    pub min_cashflow_per_unit: Money,
    pub default_financing: FinancingTerms,
    /// Step function over unit count, ascending
    pub expense_ratios: Vec<ExpenseRatioTier>,
}

impl Default for MultiUnitPolicy {
    fn default() -> Self {
        MultiUnitPolicy {
            min_cashflow_per_unit: dec!(75),
            default_financing: FinancingTerms::default(),
            expense_ratios: vec![
                ExpenseRatioTier {
                    max_units: Some(2),
                    ratio: dec!(0.30),
                },
                ExpenseRatioTier {
                    max_units: Some(4),
                    ratio: dec!(0.35),
                },
                ExpenseRatioTier {
                    max_units: Some(6),
                    ratio: dec!(0.45),
                },
                ExpenseRatioTier {
                    max_units: None,
                    ratio: dec!(0.50),
                },
            ],
        }
    }
}

/// An income-producing multi-unit property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiScenario {
    pub purchase_price: Money,
    pub gross_annual_rent: Money,
    pub units: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renovation_cost: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financing: Option<FinancingInput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashflowVerdict {
    Viable,
    Marginal,
    Negative,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiUnitDetails {
    pub total_investment: Money,
    pub expense_ratio: Rate,
    pub operating_expenses: Money,
    pub noi: Money,
    pub financing: FinancingTerms,
    pub loan_amount: Money,
    pub down_payment: Money,
    pub monthly_mortgage_payment: Money,
    pub annual_mortgage_payment: Money,
    pub annual_cashflow: Money,
    pub monthly_cashflow: Money,
    pub cashflow_per_unit: Money,
    /// NOI / total investment * 100
    pub cap_rate: Percent,
    /// Annual cash flow / down payment * 100
    pub cash_on_cash: Percent,
    /// NOI / annual debt service; absent without debt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debt_service_coverage: Option<Decimal>,
    /// Total investment / gross rent; absent without rent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gross_rent_multiplier: Option<Decimal>,
    pub price_per_unit: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub land_transfer_tax: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiUnitSummary {
    pub noi: Money,
    pub monthly_cashflow: Money,
    pub cashflow_per_unit: Money,
    pub cap_rate: String,
    pub cash_on_cash: String,
    pub verdict: CashflowVerdict,
    pub is_viable: bool,
    pub message: String,
}

pub type MultiUnitReport = AnalysisReport<MultiUnitDetails, MultiUnitSummary>;

impl MultiScenario {
    /// Build from a loosely-typed record (numbers or numeric strings).
    pub fn from_value(value: &Value) -> RealtyResult<Self> {
        let record = as_record(value, "multi-unit scenario")?;
        let financing = match record.get("financing") {
            None | Some(Value::Null) => None,
            Some(f) => {
                let f = as_record(f, "financing")?;
                Some(FinancingInput {
                    loan_to_value: optional_decimal(f, "loan_to_value")?,
                    interest_rate_percent: optional_decimal(f, "interest_rate_percent")?,
                    amortization_years: optional_u32(f, "amortization_years")?,
                })
            }
        };
        Ok(MultiScenario {
            purchase_price: require_decimal(record, "purchase_price")?,
            gross_annual_rent: require_decimal(record, "gross_annual_rent")?,
            units: require_u32(record, "units")?,
            renovation_cost: optional_decimal(record, "renovation_cost")?,
            financing,
        })
    }

    pub fn total_investment(&self) -> Money {
        self.purchase_price + self.renovation_cost.unwrap_or(Decimal::ZERO)
    }

    pub fn resolved_financing(&self, policy: &MultiUnitPolicy) -> FinancingTerms {
        self.financing
            .as_ref()
            .map(|f| f.resolve(&policy.default_financing))
            .unwrap_or_else(|| policy.default_financing.clone())
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Step-function lookup: first tier whose `max_units` covers `units`.
pub fn expense_ratio(units: u32, tiers: &[ExpenseRatioTier]) -> RealtyResult<Rate> {
    tiers
        .iter()
        .find(|t| t.max_units.is_none_or(|max| units <= max))
        .map(|t| t.ratio)
        .ok_or_else(|| {
            RealtyError::ConfigError(format!("no expense-ratio tier covers {units} units"))
        })
}

/// Evaluate a multi-unit deal under `policy`.
pub fn analyze(
    scenario: &MultiScenario,
    policy: &MultiUnitPolicy,
) -> RealtyResult<ComputationOutput<MultiUnitReport>> {
    analyze_with_transfer_tax(scenario, policy, None)
}

/// As [`analyze`], also reporting land-transfer tax on the purchase price.
/// The tax is informational and not folded into total investment.
pub fn analyze_with_transfer_tax(
    scenario: &MultiScenario,
    policy: &MultiUnitPolicy,
    transfer_tax: Option<&TaxBracketTable>,
) -> RealtyResult<ComputationOutput<MultiUnitReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let financing = scenario.resolved_financing(policy);
    validate_scenario(scenario, &financing)?;

    let units = Decimal::from(scenario.units);
    let total_investment = scenario.total_investment();
    if total_investment.is_zero() {
        return Err(RealtyError::degenerate(
            "cap rate with zero total investment",
        ));
    }

    // --- Income ---
    let ratio = expense_ratio(scenario.units, &policy.expense_ratios)?;
    let operating_expenses = scenario.gross_annual_rent * ratio;
    let noi = scenario.gross_annual_rent - operating_expenses;

    // --- Financing ---
    let loan_amount = total_investment * financing.loan_to_value;
    let down_payment = total_investment - loan_amount;
    if down_payment.is_zero() {
        return Err(RealtyError::degenerate(
            "cash-on-cash return with zero down payment (100% financing)",
        ));
    }

    let monthly_mortgage_payment = mortgage::monthly_payment(
        loan_amount,
        financing.interest_rate_percent,
        financing.amortization_years,
    )?;
    let annual_mortgage_payment = monthly_mortgage_payment * dec!(12);

    // --- Cash flow and yields ---
    let annual_cashflow = noi - annual_mortgage_payment;
    let monthly_cashflow = annual_cashflow / dec!(12);
    let cashflow_per_unit = monthly_cashflow / units;

    let cap_rate = noi / total_investment * Decimal::ONE_HUNDRED;
    let cash_on_cash = annual_cashflow / down_payment * Decimal::ONE_HUNDRED;

    let debt_service_coverage = if annual_mortgage_payment.is_zero() {
        None
    } else {
        Some(noi / annual_mortgage_payment)
    };
    let gross_rent_multiplier = if scenario.gross_annual_rent.is_zero() {
        None
    } else {
        Some(total_investment / scenario.gross_annual_rent)
    };

    let land_transfer_tax = transfer_tax
        .map(|table| tax::tiered_tax(scenario.purchase_price, table))
        .transpose()?;

    // --- Verdict ---
    let verdict = classify(cashflow_per_unit, policy.min_cashflow_per_unit);
    let message = match verdict {
        CashflowVerdict::Viable => format!(
            "Viable: {} per unit per month meets the {} minimum",
            round_money(cashflow_per_unit),
            policy.min_cashflow_per_unit
        ),
        CashflowVerdict::Marginal => format!(
            "Marginal: {} per unit per month is positive but below the {} minimum",
            round_money(cashflow_per_unit),
            policy.min_cashflow_per_unit
        ),
        CashflowVerdict::Negative => format!(
            "Negative cash flow: {} per unit per month after debt service",
            round_money(cashflow_per_unit)
        ),
    };

    // --- Warnings ---
    if financing.loan_to_value > dec!(0.80) {
        warnings.push(format!(
            "LTV of {}% exceeds 80%, high leverage",
            format_two_dp(financing.loan_to_value * Decimal::ONE_HUNDRED)
        ));
    }
    if let Some(dscr) = debt_service_coverage {
        if dscr < dec!(1.2) {
            warnings.push(format!(
                "DSCR of {} is below 1.20x, lender covenant risk",
                format_two_dp(dscr)
            ));
        }
    }

    let summary = MultiUnitSummary {
        noi: round_money(noi),
        monthly_cashflow: round_money(monthly_cashflow),
        cashflow_per_unit: round_money(cashflow_per_unit),
        cap_rate: format_two_dp(cap_rate),
        cash_on_cash: format_two_dp(cash_on_cash),
        verdict,
        is_viable: verdict == CashflowVerdict::Viable,
        message,
    };

    let details = MultiUnitDetails {
        total_investment,
        expense_ratio: ratio,
        operating_expenses,
        noi,
        financing,
        loan_amount,
        down_payment,
        monthly_mortgage_payment,
        annual_mortgage_payment,
        annual_cashflow,
        monthly_cashflow,
        cashflow_per_unit,
        cap_rate,
        cash_on_cash,
        debt_service_coverage,
        gross_rent_multiplier,
        price_per_unit: total_investment / units,
        land_transfer_tax,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Multi-unit income analysis (tiered expense ratio, level-payment financing)",
        scenario,
        warnings,
        elapsed,
        AnalysisReport { details, summary },
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn classify(cashflow_per_unit: Money, threshold: Money) -> CashflowVerdict {
    if cashflow_per_unit >= threshold {
        CashflowVerdict::Viable
    } else if cashflow_per_unit > Decimal::ZERO {
        CashflowVerdict::Marginal
    } else {
        CashflowVerdict::Negative
    }
}

fn validate_scenario(scenario: &MultiScenario, financing: &FinancingTerms) -> RealtyResult<()> {
    if scenario.units == 0 {
        return Err(RealtyError::invalid("units", "At least one unit is required"));
    }
    if scenario.purchase_price < Decimal::ZERO {
        return Err(RealtyError::invalid(
            "purchase_price",
            "Purchase price must not be negative",
        ));
    }
    if scenario.gross_annual_rent < Decimal::ZERO {
        return Err(RealtyError::invalid(
            "gross_annual_rent",
            "Gross rent must not be negative",
        ));
    }
    if scenario.renovation_cost.is_some_and(|r| r < Decimal::ZERO) {
        return Err(RealtyError::invalid(
            "renovation_cost",
            "Renovation cost must not be negative",
        ));
    }
    if financing.loan_to_value < Decimal::ZERO || financing.loan_to_value > Decimal::ONE {
        return Err(RealtyError::invalid(
            "financing.loan_to_value",
            "Loan-to-value must be between 0 and 1",
        ));
    }
    if financing.interest_rate_percent < Decimal::ZERO {
        return Err(RealtyError::invalid(
            "financing.interest_rate_percent",
            "Interest rate must not be negative",
        ));
    }
    if financing.amortization_years == 0 {
        return Err(RealtyError::invalid(
            "financing.amortization_years",
            "Amortization period must be at least 1 year",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
