use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as fractions (0.05 = 5%).
pub type Rate = Decimal;

/// Rates expressed as percentages (4.5 = 4.5%). Used at the engine boundary.
pub type Percent = Decimal;

/// Raw computed fields plus the rounded headline view of the same analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport<D, S> {
    pub details: D,
    pub summary: S,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// Round to cents, half away from zero.
pub fn round_money(value: Money) -> Money {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Two-decimal string used by report summaries (e.g. "12.50").
pub fn format_two_dp(value: Decimal) -> String {
    format!("{:.2}", round_money(value))
}

/// Convert a percentage (4.5) to a fraction (0.045).
pub fn percent_to_rate(percent: Percent) -> Rate {
    percent / Decimal::ONE_HUNDRED
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_two_dp_pads_and_rounds() {
        assert_eq!(format_two_dp(dec!(12.5)), "12.50");
        assert_eq!(format_two_dp(dec!(3.14159)), "3.14");
        assert_eq!(format_two_dp(dec!(2.345)), "2.35");
        assert_eq!(format_two_dp(dec!(-1.005)), "-1.01");
        assert_eq!(format_two_dp(Decimal::ZERO), "0.00");
    }

    #[test]
    fn test_percent_to_rate() {
        assert_eq!(percent_to_rate(dec!(4.5)), dec!(0.045));
    }

    #[test]
    fn test_with_metadata_envelope() {
        let out = with_metadata("Test", &dec!(1), vec!["w".into()], 7, dec!(2));
        assert_eq!(out.result, dec!(2));
        assert_eq!(out.methodology, "Test");
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.metadata.computation_time_us, 7);
        assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    }
}
