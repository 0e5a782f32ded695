use pretty_assertions::assert_eq;
use property_calc_core::flip::{self, FlipPolicy, FlipScenario, FlipVerdict};
use property_calc_core::multi_unit::{self, CashflowVerdict, MultiScenario, MultiUnitPolicy};
use property_calc_core::mortgage;
use property_calc_core::tax::{self, TaxBracketTable};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

// ===========================================================================
// Reference scenarios
// ===========================================================================

#[test]
fn test_flip_profit_reference() {
    let r = flip::compute_profit(dec!(400000), dec!(300000), dec!(50000), &FlipPolicy::default())
        .unwrap();
    assert_eq!(r.fees_ten_percent, dec!(40000));
    assert_eq!(r.profit, dec!(10000));
    assert!(!r.is_viable);
}

#[test]
fn test_multi_duplex_operating_expenses() {
    let scenario = MultiScenario::from_value(&json!({
        "purchase_price": 300000,
        "gross_annual_rent": 36000,
        "units": 2
    }))
    .unwrap();
    let out = multi_unit::analyze(&scenario, &MultiUnitPolicy::default()).unwrap();
    assert_eq!(out.result.details.operating_expenses, dec!(10800));
}

#[test]
fn test_multi_fourplex_total_investment() {
    let scenario = MultiScenario::from_value(&json!({
        "purchase_price": 400000,
        "gross_annual_rent": 48000,
        "units": 4,
        "renovation_cost": 50000
    }))
    .unwrap();
    let out = multi_unit::analyze(&scenario, &MultiUnitPolicy::default()).unwrap();
    assert_eq!(out.result.details.total_investment, dec!(450000));
}

#[test]
fn test_monthly_payment_reference() {
    let pmt = mortgage::monthly_payment(dec!(200000), dec!(4.5), 25).unwrap();
    assert!(
        (pmt - dec!(1111.66)).abs() < dec!(0.01),
        "Expected ~1111.66, got {}",
        pmt
    );
}

#[test]
fn test_transfer_tax_reference() {
    let t = tax::tiered_tax(dec!(300000), &TaxBracketTable::example_land_transfer()).unwrap();
    assert_eq!(t, dec!(2903));
}

// ===========================================================================
// Report contract
// ===========================================================================

#[test]
fn test_multi_summary_field_names_are_stable() {
    let scenario = MultiScenario {
        purchase_price: dec!(300000),
        gross_annual_rent: dec!(36000),
        units: 2,
        renovation_cost: None,
        financing: None,
    };
    let out = multi_unit::analyze(&scenario, &MultiUnitPolicy::default()).unwrap();
    let v = serde_json::to_value(&out).unwrap();
    let summary = &v["result"]["summary"];

    assert_eq!(summary["cap_rate"], json!("8.40"));
    assert_eq!(summary["verdict"], json!("viable"));
    assert_eq!(summary["is_viable"], json!(true));
    assert!(summary["cash_on_cash"].is_string());
    assert!(summary["message"].is_string());
    assert!(v["metadata"]["version"].is_string());
}

#[test]
fn test_multi_verdict_threshold_is_configurable() {
    let scenario = MultiScenario {
        purchase_price: dec!(300000),
        gross_annual_rent: dec!(36000),
        units: 2,
        renovation_cost: None,
        financing: None,
    };
    let strict = MultiUnitPolicy {
        min_cashflow_per_unit: dec!(500),
        ..MultiUnitPolicy::default()
    };
    let out = multi_unit::analyze(&scenario, &strict).unwrap();
    // ~424.69 per door is positive but under 500
    assert_eq!(out.result.summary.verdict, CashflowVerdict::Marginal);
}

#[test]
fn test_flip_json_boundary_round_trip() {
    let scenario = FlipScenario::from_value(&json!({
        "final_price": "500000",
        "purchase_price": "300000",
        "renovation_cost": "50000",
        "target_profit": "40000"
    }))
    .unwrap();
    let out = flip::analyze_flip(&scenario, &FlipPolicy::default()).unwrap();
    assert_eq!(out.result.summary.verdict, FlipVerdict::Viable);
    assert_eq!(out.result.summary.max_purchase_price, dec!(360000));
    assert_eq!(out.result.summary.max_renovation_budget, dec!(110000));
    assert_eq!(out.result.details.profit.profit, dec!(100000));
}

#[test]
fn test_errors_are_distinct_from_zero_results() {
    // A valid zero profit is a result...
    let r = flip::compute_profit(dec!(100000), dec!(60000), dec!(30000), &FlipPolicy::default())
        .unwrap();
    assert_eq!(r.profit, Decimal::ZERO);
    // ...a zero down payment is an error
    let scenario = MultiScenario::from_value(&json!({
        "purchase_price": 300000,
        "gross_annual_rent": 36000,
        "units": 2,
        "financing": { "loan_to_value": 1 }
    }))
    .unwrap();
    let err = multi_unit::analyze(&scenario, &MultiUnitPolicy::default()).unwrap_err();
    assert_eq!(err.kind(), "computation_degenerate");
}
