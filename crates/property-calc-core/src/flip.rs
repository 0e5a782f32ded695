//! Buy-renovate-resell ("flip") economics using the FIP10 quick estimate.
//!
//! Every formula is a rearrangement of one identity:
//!
//! ```text
//! final_price = purchase_price + renovation_cost + fee_rate * final_price + profit
//! ```
//!
//! where `fee_rate * final_price` (10% by default) stands in for acquisition,
//! holding and selling costs.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

use crate::error::RealtyError;
use crate::input::{as_record, optional_decimal, require_decimal};
use crate::types::{
    format_two_dp, round_money, with_metadata, AnalysisReport, ComputationOutput, Money, Percent,
    Rate,
};
use crate::RealtyResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Thresholds applied by the flip formulas.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlipPolicy {
    /// Share of resale price reserved for transaction and holding costs
    pub fee_rate: Rate,
    /// Minimum profit for a deal to be called viable; also the default target
    pub min_profit: Money,
}

impl Default for FlipPolicy {
    fn default() -> Self {
        FlipPolicy {
            fee_rate: dec!(0.10),
            min_profit: dec!(25000),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlipScenario {
    /// Expected resale price after renovation
    pub final_price: Money,
    pub purchase_price: Money,
    pub renovation_cost: Money,
    /// Required profit; defaults to the policy's `min_profit`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_profit: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfitResult {
    pub profit: Money,
    pub fees_ten_percent: Money,
    pub is_viable: bool,
    /// profit / (purchase + renovation) * 100
    pub profit_percentage: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaxPurchaseResult {
    pub max_purchase_price: Money,
    pub is_feasible: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaxRenovationResult {
    pub max_renovation_budget: Money,
    pub is_feasible: bool,
    /// max_renovation_budget / final_price * 100
    pub percentage_of_resale: Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlipVerdict {
    Viable,
    Marginal,
    Loss,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlipDetails {
    pub profit: ProfitResult,
    pub max_purchase: MaxPurchaseResult,
    pub max_renovation: MaxRenovationResult,
    pub target_profit: Money,
    pub total_cost: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlipSummary {
    pub profit: Money,
    pub profit_percentage: String,
    pub max_purchase_price: Money,
    pub max_renovation_budget: Money,
    pub verdict: FlipVerdict,
    pub is_viable: bool,
    pub message: String,
}

pub type FlipReport = AnalysisReport<FlipDetails, FlipSummary>;

impl FlipScenario {
    /// Build from a loosely-typed record (numbers or numeric strings).
    pub fn from_value(value: &Value) -> RealtyResult<Self> {
        let record = as_record(value, "flip scenario")?;
        Ok(FlipScenario {
            final_price: require_decimal(record, "final_price")?,
            purchase_price: require_decimal(record, "purchase_price")?,
            renovation_cost: require_decimal(record, "renovation_cost")?,
            target_profit: optional_decimal(record, "target_profit")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Profit left after purchase, renovation and the flat fee reserve.
pub fn compute_profit(
    final_price: Money,
    purchase_price: Money,
    renovation_cost: Money,
    policy: &FlipPolicy,
) -> RealtyResult<ProfitResult> {
    non_negative("final_price", final_price)?;
    non_negative("purchase_price", purchase_price)?;
    non_negative("renovation_cost", renovation_cost)?;

    let fees = policy.fee_rate * final_price;
    let profit = final_price - purchase_price - renovation_cost - fees;

    let invested = purchase_price + renovation_cost;
    if invested.is_zero() {
        return Err(RealtyError::degenerate(
            "profit percentage with zero purchase price and renovation cost",
        ));
    }

    Ok(ProfitResult {
        profit,
        fees_ten_percent: fees,
        is_viable: profit >= policy.min_profit,
        profit_percentage: profit / invested * Decimal::ONE_HUNDRED,
    })
}

/// Highest price that still leaves `target_profit` after renovation and fees.
pub fn compute_max_purchase_price(
    final_price: Money,
    renovation_cost: Money,
    target_profit: Option<Money>,
    policy: &FlipPolicy,
) -> RealtyResult<MaxPurchaseResult> {
    non_negative("final_price", final_price)?;
    non_negative("renovation_cost", renovation_cost)?;
    let target = resolve_target(target_profit, policy)?;

    let max_purchase_price = final_price - renovation_cost - policy.fee_rate * final_price - target;

    Ok(MaxPurchaseResult {
        max_purchase_price,
        is_feasible: max_purchase_price > Decimal::ZERO,
    })
}

/// Largest renovation spend that still leaves `target_profit`.
pub fn compute_max_renovation_budget(
    final_price: Money,
    purchase_price: Money,
    target_profit: Option<Money>,
    policy: &FlipPolicy,
) -> RealtyResult<MaxRenovationResult> {
    non_negative("final_price", final_price)?;
    non_negative("purchase_price", purchase_price)?;
    let target = resolve_target(target_profit, policy)?;

    if final_price.is_zero() {
        return Err(RealtyError::degenerate(
            "renovation share of a zero resale price",
        ));
    }

    let max_renovation_budget = final_price - purchase_price - policy.fee_rate * final_price - target;

    Ok(MaxRenovationResult {
        max_renovation_budget,
        is_feasible: max_renovation_budget > Decimal::ZERO,
        percentage_of_resale: max_renovation_budget / final_price * Decimal::ONE_HUNDRED,
    })
}

/// Run all three formulas for one scenario and classify the deal.
pub fn analyze_flip(
    scenario: &FlipScenario,
    policy: &FlipPolicy,
) -> RealtyResult<ComputationOutput<FlipReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let target = resolve_target(scenario.target_profit, policy)?;
    let profit = compute_profit(
        scenario.final_price,
        scenario.purchase_price,
        scenario.renovation_cost,
        policy,
    )?;
    let max_purchase = compute_max_purchase_price(
        scenario.final_price,
        scenario.renovation_cost,
        Some(target),
        policy,
    )?;
    let max_renovation = compute_max_renovation_budget(
        scenario.final_price,
        scenario.purchase_price,
        Some(target),
        policy,
    )?;

    let verdict = if profit.profit >= policy.min_profit {
        FlipVerdict::Viable
    } else if profit.profit > Decimal::ZERO {
        FlipVerdict::Marginal
    } else {
        FlipVerdict::Loss
    };

    let message = match verdict {
        FlipVerdict::Viable => format!(
            "Profitable flip: {} profit meets the {} minimum",
            round_money(profit.profit),
            policy.min_profit
        ),
        FlipVerdict::Marginal => format!(
            "Marginal flip: {} profit is below the {} minimum",
            round_money(profit.profit),
            policy.min_profit
        ),
        FlipVerdict::Loss => format!(
            "Unprofitable flip: costs exceed resale by {}",
            round_money(-profit.profit)
        ),
    };

    if scenario.purchase_price > max_purchase.max_purchase_price {
        warnings.push(format!(
            "Purchase price {} exceeds the maximum of {} for a {} target profit",
            scenario.purchase_price,
            round_money(max_purchase.max_purchase_price),
            target
        ));
    }
    if max_renovation.percentage_of_resale > Decimal::ZERO
        && scenario.renovation_cost > max_renovation.max_renovation_budget
    {
        warnings.push(format!(
            "Renovation cost {} exceeds the budget of {}",
            scenario.renovation_cost,
            round_money(max_renovation.max_renovation_budget)
        ));
    }

    let summary = FlipSummary {
        profit: round_money(profit.profit),
        profit_percentage: format_two_dp(profit.profit_percentage),
        max_purchase_price: round_money(max_purchase.max_purchase_price),
        max_renovation_budget: round_money(max_renovation.max_renovation_budget),
        verdict,
        is_viable: profit.is_viable,
        message,
    };

    let details = FlipDetails {
        total_cost: scenario.purchase_price + scenario.renovation_cost + profit.fees_ten_percent,
        profit,
        max_purchase,
        max_renovation,
        target_profit: target,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "FIP10 flip analysis (flat fee reserve on resale price)",
        scenario,
        warnings,
        elapsed,
        AnalysisReport { details, summary },
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn resolve_target(target_profit: Option<Money>, policy: &FlipPolicy) -> RealtyResult<Money> {
    let target = target_profit.unwrap_or(policy.min_profit);
    non_negative("target_profit", target)?;
    Ok(target)
}

fn non_negative(field: &str, value: Money) -> RealtyResult<()> {
    if value < Decimal::ZERO {
        return Err(RealtyError::invalid(field, "Amount must not be negative"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
