//! Engine-wide policy: thresholds, default financing, expense tiers, solver
//! options and the transfer-tax schedule.
//!
//! Every field has a documented default, so a configuration file only needs
//! to name what it changes:
//!
//! ```json
//! { "multi_unit": { "min_cashflow_per_unit": "100" } }
//! ```

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RealtyError;
use crate::flip::FlipPolicy;
use crate::irr::IrrOptions;
use crate::multi_unit::MultiUnitPolicy;
use crate::tax::{TaxBracketTable, TransferTaxSchedule};
use crate::RealtyResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub flip: FlipPolicy,
    pub multi_unit: MultiUnitPolicy,
    pub irr: IrrOptions,
    /// Empty schedule disables the transfer-tax line in reports
    pub transfer_tax: TransferTaxSchedule,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            flip: FlipPolicy::default(),
            multi_unit: MultiUnitPolicy::default(),
            irr: IrrOptions::default(),
            transfer_tax: TransferTaxSchedule::single(TaxBracketTable::example_land_transfer()),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(s: &str) -> RealtyResult<Self> {
        let config: EngineConfig =
            serde_json::from_str(s).map_err(|e| RealtyError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Table in effect on `date`, or `None` when no schedule is configured.
    pub fn transfer_tax_for(&self, date: NaiveDate) -> RealtyResult<Option<&TaxBracketTable>> {
        if self.transfer_tax.tables.is_empty() {
            return Ok(None);
        }
        self.transfer_tax.table_for(date).map(Some)
    }

    pub fn validate(&self) -> RealtyResult<()> {
        let flip = &self.flip;
        if flip.fee_rate < Decimal::ZERO || flip.fee_rate >= Decimal::ONE {
            return Err(config_error("flip.fee_rate must be in [0, 1)"));
        }
        if flip.min_profit < Decimal::ZERO {
            return Err(config_error("flip.min_profit must not be negative"));
        }

        let multi = &self.multi_unit;
        if multi.expense_ratios.is_empty() {
            return Err(config_error("multi_unit.expense_ratios must not be empty"));
        }
        let last = multi.expense_ratios.len() - 1;
        let mut previous: Option<u32> = None;
        for (i, tier) in multi.expense_ratios.iter().enumerate() {
            if tier.ratio < Decimal::ZERO || tier.ratio > Decimal::ONE {
                return Err(config_error(format!(
                    "multi_unit.expense_ratios[{i}].ratio must be in [0, 1]"
                )));
            }
            match tier.max_units {
                Some(max) if previous.is_some_and(|p| max <= p) => {
                    return Err(config_error(format!(
                        "multi_unit.expense_ratios[{i}].max_units must increase"
                    )));
                }
                Some(max) => previous = Some(max),
                None if i != last => {
                    return Err(config_error(format!(
                        "multi_unit.expense_ratios[{i}] is open-ended but not last"
                    )));
                }
                None => {}
            }
        }
        let financing = &multi.default_financing;
        if financing.loan_to_value < Decimal::ZERO || financing.loan_to_value > Decimal::ONE {
            return Err(config_error(
                "multi_unit.default_financing.loan_to_value must be in [0, 1]",
            ));
        }
        if financing.amortization_years == 0 {
            return Err(config_error(
                "multi_unit.default_financing.amortization_years must be positive",
            ));
        }

        if self.irr.tolerance <= Decimal::ZERO
            || self.irr.delta <= Decimal::ZERO
            || self.irr.max_iterations == 0
        {
            return Err(config_error(
                "irr.tolerance, irr.delta and irr.max_iterations must be positive",
            ));
        }

        for table in &self.transfer_tax.tables {
            table
                .validate()
                .map_err(|e| config_error(format!("transfer_tax: {e}")))?;
        }
        Ok(())
    }
}

fn config_error(msg: impl Into<String>) -> RealtyError {
    RealtyError::ConfigError(msg.into())
}
