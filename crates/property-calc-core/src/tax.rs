use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::RealtyError;
use crate::types::{Money, Rate};
use crate::RealtyResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One tier of a progressive table. `upper_bound: None` is the open-ended top tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxBracket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<Money>,
    /// Marginal rate as a fraction (0.01 = 1%)
    pub rate: Rate,
}

/// Ordered, strictly increasing brackets, optionally versioned by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxBracketTable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// First day the table applies. `None` applies from the beginning of time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_from: Option<NaiveDate>,
    pub brackets: Vec<TaxBracket>,
}

/// Several versions of the same table, selected by transaction date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferTaxSchedule {
    pub tables: Vec<TaxBracketTable>,
}

/// Per-tier detail of a tax computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BracketLine {
    pub lower_bound: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<Money>,
    pub rate: Rate,
    pub taxable: Money,
    pub tax: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxBreakdown {
    pub price: Money,
    pub lines: Vec<BracketLine>,
    pub total: Money,
    /// total / price, zero for a zero price
    pub effective_rate: Rate,
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

impl TaxBracketTable {
    pub fn new(brackets: Vec<TaxBracket>) -> Self {
        TaxBracketTable {
            name: None,
            effective_from: None,
            brackets,
        }
    }

    /// Example three-tier land-transfer table (0.5% / 1.0% / 1.5%).
    /// Illustrative configuration data only, not current legal rates.
    pub fn example_land_transfer() -> Self {
        TaxBracketTable {
            name: Some("example land-transfer (3 tiers)".into()),
            effective_from: None,
            brackets: vec![
                TaxBracket {
                    upper_bound: Some(dec!(53200)),
                    rate: dec!(0.005),
                },
                TaxBracket {
                    upper_bound: Some(dec!(266200)),
                    rate: dec!(0.01),
                },
                TaxBracket {
                    upper_bound: None,
                    rate: dec!(0.015),
                },
            ],
        }
    }

    /// Check ordering and rates. Called by every computation.
    pub fn validate(&self) -> RealtyResult<()> {
        if self.brackets.is_empty() {
            return Err(RealtyError::invalid(
                "brackets",
                "Bracket table must contain at least one bracket",
            ));
        }

        let last = self.brackets.len() - 1;
        let mut previous = Decimal::ZERO;
        for (i, bracket) in self.brackets.iter().enumerate() {
            if bracket.rate < Decimal::ZERO {
                return Err(RealtyError::invalid(
                    format!("brackets[{i}].rate"),
                    "Bracket rate must not be negative",
                ));
            }
            match bracket.upper_bound {
                Some(bound) => {
                    if bound <= previous {
                        return Err(RealtyError::invalid(
                            format!("brackets[{i}].upper_bound"),
                            format!("Bounds must be strictly increasing ({bound} after {previous})"),
                        ));
                    }
                    previous = bound;
                }
                None if i != last => {
                    return Err(RealtyError::invalid(
                        format!("brackets[{i}].upper_bound"),
                        "Only the final bracket may be unbounded",
                    ));
                }
                None => {}
            }
        }
        Ok(())
    }
}

impl TransferTaxSchedule {
    pub fn single(table: TaxBracketTable) -> Self {
        TransferTaxSchedule {
            tables: vec![table],
        }
    }

    /// Latest table whose `effective_from` is on or before `date`.
    pub fn table_for(&self, date: NaiveDate) -> RealtyResult<&TaxBracketTable> {
        self.tables
            .iter()
            .filter(|t| t.effective_from.is_none_or(|from| from <= date))
            .max_by_key(|t| t.effective_from)
            .ok_or_else(|| {
                RealtyError::invalid(
                    "transfer_tax",
                    format!("No bracket table is in effect on {date}"),
                )
            })
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Progressive tax: each bracket taxes only the slice of `price` inside it.
pub fn tiered_tax(price: Money, table: &TaxBracketTable) -> RealtyResult<Money> {
    Ok(tax_breakdown(price, table)?.total)
}

/// Same as [`tiered_tax`] with the per-bracket slices exposed.
pub fn tax_breakdown(price: Money, table: &TaxBracketTable) -> RealtyResult<TaxBreakdown> {
    if price < Decimal::ZERO {
        return Err(RealtyError::invalid("price", "Price must not be negative"));
    }
    table.validate()?;

    let mut lines = Vec::with_capacity(table.brackets.len());
    let mut total = Decimal::ZERO;
    let mut lower = Decimal::ZERO;

    for bracket in &table.brackets {
        let ceiling = match bracket.upper_bound {
            Some(bound) => price.min(bound),
            None => price,
        };
        let taxable = (ceiling - lower).max(Decimal::ZERO);
        let tax = taxable * bracket.rate;
        total += tax;

        lines.push(BracketLine {
            lower_bound: lower,
            upper_bound: bracket.upper_bound,
            rate: bracket.rate,
            taxable,
            tax,
        });

        if let Some(bound) = bracket.upper_bound {
            lower = bound;
        }
    }

    let effective_rate = if price.is_zero() {
        Decimal::ZERO
    } else {
        total / price
    };

    Ok(TaxBreakdown {
        price,
        lines,
        total,
        effective_rate,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn bracket(upper: Option<Money>, rate: Rate) -> TaxBracket {
        TaxBracket {
            upper_bound: upper,
            rate,
        }
    }

    #[test]
    fn test_three_tier_reference() {
        // 53200*0.005 + 213000*0.01 + 33800*0.015 = 266 + 2130 + 507
        let tax = tiered_tax(dec!(300000), &TaxBracketTable::example_land_transfer()).unwrap();
        assert_eq!(tax, dec!(2903));
    }

    #[test]
    fn test_price_inside_first_bracket() {
        let tax = tiered_tax(dec!(40000), &TaxBracketTable::example_land_transfer()).unwrap();
        assert_eq!(tax, dec!(200));
    }

    #[test]
    fn test_price_on_boundary() {
        let tax = tiered_tax(dec!(266200), &TaxBracketTable::example_land_transfer()).unwrap();
        assert_eq!(tax, dec!(266) + dec!(2130));
    }

    #[test]
    fn test_zero_price() {
        let b = tax_breakdown(Decimal::ZERO, &TaxBracketTable::example_land_transfer()).unwrap();
        assert_eq!(b.total, Decimal::ZERO);
        assert_eq!(b.effective_rate, Decimal::ZERO);
        assert!(b.lines.iter().all(|l| l.taxable.is_zero()));
    }

    #[test]
    fn test_breakdown_lines() {
        let b = tax_breakdown(dec!(300000), &TaxBracketTable::example_land_transfer()).unwrap();
        assert_eq!(b.lines.len(), 3);
        assert_eq!(b.lines[1].lower_bound, dec!(53200));
        assert_eq!(b.lines[1].taxable, dec!(213000));
        assert_eq!(b.lines[2].taxable, dec!(33800));
        assert_eq!(b.lines[2].tax, dec!(507));
    }

    #[test]
    fn test_bounded_top_bracket_caps_tax() {
        let table = TaxBracketTable::new(vec![bracket(Some(dec!(100)), dec!(0.1))]);
        assert_eq!(tiered_tax(dec!(1000), &table).unwrap(), dec!(10));
    }

    #[test]
    fn test_negative_price_rejected() {
        let err = tiered_tax(dec!(-1), &TaxBracketTable::example_land_transfer()).unwrap_err();
        assert!(matches!(err, RealtyError::InvalidInput { ref field, .. } if field == "price"));
    }

    #[test]
    fn test_non_increasing_bounds_rejected() {
        let table = TaxBracketTable::new(vec![
            bracket(Some(dec!(1000)), dec!(0.01)),
            bracket(Some(dec!(1000)), dec!(0.02)),
        ]);
        assert!(tiered_tax(dec!(500), &table).is_err());
    }

    #[test]
    fn test_unbounded_middle_bracket_rejected() {
        let table = TaxBracketTable::new(vec![
            bracket(None, dec!(0.01)),
            bracket(Some(dec!(1000)), dec!(0.02)),
        ]);
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_empty_table_rejected() {
        assert!(tiered_tax(dec!(1), &TaxBracketTable::new(vec![])).is_err());
    }

    #[test]
    fn test_schedule_selects_latest_effective() {
        let mut old = TaxBracketTable::example_land_transfer();
        old.effective_from = NaiveDate::from_ymd_opt(2023, 1, 1);
        let mut new = TaxBracketTable::new(vec![bracket(None, dec!(0.02))]);
        new.effective_from = NaiveDate::from_ymd_opt(2025, 1, 1);
        let schedule = TransferTaxSchedule {
            tables: vec![new.clone(), old.clone()],
        };

        let d = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(schedule.table_for(d).unwrap(), &old);
        let d = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(schedule.table_for(d).unwrap(), &new);
        let d = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert!(schedule.table_for(d).is_err());
    }

    #[test]
    fn test_undated_table_always_applies() {
        let schedule = TransferTaxSchedule::single(TaxBracketTable::example_land_transfer());
        let d = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        assert!(schedule.table_for(d).is_ok());
    }
}
