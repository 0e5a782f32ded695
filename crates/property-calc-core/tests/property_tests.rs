use proptest::prelude::*;
use property_calc_core::flip::{self, FlipPolicy};
use property_calc_core::irr::{self, IrrOptions};
use property_calc_core::mortgage::{self, LoanTerms};
use property_calc_core::multi_unit::{self, MultiUnitPolicy};
use property_calc_core::tax::{self, TaxBracket, TaxBracketTable};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn arb_table() -> impl Strategy<Value = TaxBracketTable> {
    (
        prop::collection::vec((1_000u32..200_000, 0u32..300), 0..4),
        0u32..300,
    )
        .prop_map(|(steps, top_bp)| {
            let mut bound = Decimal::ZERO;
            let mut brackets: Vec<TaxBracket> = steps
                .into_iter()
                .map(|(width, bp)| {
                    bound += Decimal::from(width);
                    TaxBracket {
                        upper_bound: Some(bound),
                        rate: Decimal::new(bp as i64, 4),
                    }
                })
                .collect();
            brackets.push(TaxBracket {
                upper_bound: None,
                rate: Decimal::new(top_bp as i64, 4),
            });
            TaxBracketTable::new(brackets)
        })
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(64))]

    #[test]
    fn prop_zero_rate_payment_is_straight_line(
        principal in 0u64..10_000_000,
        years in 1u32..40,
    ) {
        let p = Decimal::from(principal);
        let pmt = mortgage::monthly_payment(p, Decimal::ZERO, years).unwrap();
        prop_assert_eq!(pmt, p / Decimal::from(years * 12));
    }

    #[test]
    fn prop_amortization_repays_principal(
        principal in 1_000u64..2_000_000,
        rate_bp in 0u32..1_500,
        years in 1u32..35,
        extra in 0u32..5,
    ) {
        let loan = LoanTerms {
            principal: Decimal::from(principal),
            annual_rate_percent: Decimal::new(rate_bp as i64, 2),
            amortization_years: years,
        };
        let schedule = mortgage::amortization_schedule(&loan, years + extra).unwrap();
        prop_assert_eq!(schedule.len(), (years + extra) as usize);

        let repaid: Decimal = schedule.iter().map(|y| y.principal_paid).sum();
        prop_assert!((repaid - loan.principal).abs() < dec!(0.000001), "repaid {}", repaid);

        let last = schedule.last().unwrap();
        prop_assert!(last.remaining_balance.abs() < dec!(0.000001));
        for y in &schedule {
            prop_assert!((y.payment - y.principal_paid - y.interest_paid).abs() < dec!(0.000001));
        }
    }

    #[test]
    fn prop_tax_is_monotone_and_bounded(
        table in arb_table(),
        a in 0u64..2_000_000,
        b in 0u64..2_000_000,
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let t_lo = tax::tiered_tax(Decimal::from(lo), &table).unwrap();
        let t_hi = tax::tiered_tax(Decimal::from(hi), &table).unwrap();
        prop_assert!(t_lo <= t_hi);

        let max_rate = table.brackets.iter().map(|b| b.rate).max().unwrap_or_default();
        prop_assert!(t_hi >= Decimal::ZERO);
        prop_assert!(t_hi <= Decimal::from(hi) * max_rate);
    }

    #[test]
    fn prop_flip_max_purchase_round_trips(
        renovation in 0u64..500_000,
        target in 0u64..100_000,
        margin in 1u64..500_000,
    ) {
        let policy = FlipPolicy::default();
        // Resale high enough that the maximum purchase price stays positive
        let final_price =
            Decimal::from(renovation + target + margin) / (Decimal::ONE - policy.fee_rate);
        let renovation = Decimal::from(renovation);
        let target = Decimal::from(target);

        let max = flip::compute_max_purchase_price(final_price, renovation, Some(target), &policy)
            .unwrap();
        prop_assert!(max.is_feasible);

        let profit = flip::compute_profit(final_price, max.max_purchase_price, renovation, &policy)
            .unwrap();
        prop_assert!((profit.profit - target).abs() < dec!(0.000001), "profit {}", profit.profit);
    }

    #[test]
    fn prop_expense_ratio_never_falls_with_units(units in 1u32..200) {
        let tiers = MultiUnitPolicy::default().expense_ratios;
        let here = multi_unit::expense_ratio(units, &tiers).unwrap();
        let next = multi_unit::expense_ratio(units + 1, &tiers).unwrap();
        prop_assert!(here <= next);
    }

    #[test]
    fn prop_irr_recovers_single_period_rate(
        cashflow in 100u64..1_000_000,
        rate_bp in -3_000i64..5_000,
    ) {
        let cf = Decimal::from(cashflow);
        let rate = Decimal::new(rate_bp, 4);
        let initial = -(cf / (Decimal::ONE + rate));

        let outcome = irr::solve_irr(&[cf], initial, &IrrOptions::default()).unwrap();
        let solved = outcome.converged_rate();
        prop_assert!(solved.is_some(), "outcome {:?}", outcome);
        let solved = solved.unwrap();
        prop_assert!((solved - rate * dec!(100)).abs() < dec!(0.01), "solved {}", solved);
    }
}

// ===========================================================================
// Expense-ratio breakpoints
// ===========================================================================

#[test]
fn test_expense_ratio_breakpoints() {
    let tiers = MultiUnitPolicy::default().expense_ratios;
    let cases = [
        (1, dec!(0.30)),
        (2, dec!(0.30)),
        (3, dec!(0.35)),
        (4, dec!(0.35)),
        (5, dec!(0.45)),
        (6, dec!(0.45)),
        (7, dec!(0.50)),
        (100, dec!(0.50)),
    ];
    for (units, expected) in cases {
        assert_eq!(multi_unit::expense_ratio(units, &tiers).unwrap(), expected, "units {units}");
    }
}
