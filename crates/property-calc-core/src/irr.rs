use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::RealtyError;
use crate::types::{Money, Percent, Rate};
use crate::RealtyResult;

const MIN_PERIOD_RATE: Decimal = dec!(-0.99);
const MAX_PERIOD_RATE: Decimal = dec!(10.0);

/// Solver knobs. Defaults: guess 10%, tolerance 1e-4, delta 1e-4, 100 iterations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IrrOptions {
    /// Starting rate as a fraction
    pub guess: Rate,
    /// Applied both to |NPV| and to the Newton step size
    pub tolerance: Decimal,
    /// Forward finite-difference step for the derivative
    pub delta: Decimal,
    pub max_iterations: u32,
}

impl Default for IrrOptions {
    fn default() -> Self {
        IrrOptions {
            guess: dec!(0.10),
            tolerance: dec!(0.0001),
            delta: dec!(0.0001),
            max_iterations: 100,
        }
    }
}

/// Outcome of a root search. Never an error: batch callers keep going.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IrrOutcome {
    /// NPV at `rate_percent` is within tolerance of zero
    Converged { rate_percent: Percent, iterations: u32 },
    /// Budget exhausted (or derivative vanished) before NPV reached zero
    NotConverged {
        last_estimate_percent: Percent,
        iterations: u32,
        residual_npv: Option<Money>,
    },
    /// No discount rate can zero this series
    NoSolution { reason: String },
}

impl IrrOutcome {
    /// The rate only when it is trustworthy.
    pub fn converged_rate(&self) -> Option<Percent> {
        match self {
            IrrOutcome::Converged { rate_percent, .. } => Some(*rate_percent),
            _ => None,
        }
    }

    pub fn is_converged(&self) -> bool {
        matches!(self, IrrOutcome::Converged { .. })
    }
}

/// NPV(r) = initial_investment + Σ cashflows[i] / (1+r)^(i+1).
///
/// Returns `None` when the discount factors leave the representable range.
pub fn npv(rate: Rate, cashflows: &[Money], initial_investment: Money) -> Option<Money> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }
    let factor = Decimal::ONE.checked_div(one_plus_r)?;

    let mut total = initial_investment;
    let mut discount = Decimal::ONE;
    for cf in cashflows {
        discount = discount.checked_mul(factor)?;
        total = total.checked_add(cf.checked_mul(discount)?)?;
    }
    Some(total)
}

/// Newton-Raphson IRR with a forward-difference derivative.
///
/// An estimate only counts as converged once |NPV| is below tolerance; a
/// small step on its own is not enough.
pub fn solve_irr(
    cashflows: &[Money],
    initial_investment: Money,
    options: &IrrOptions,
) -> RealtyResult<IrrOutcome> {
    validate_options(options)?;

    if cashflows.iter().all(|cf| *cf <= Decimal::ZERO) {
        return Ok(IrrOutcome::NoSolution {
            reason: "every period cash flow is zero or negative".into(),
        });
    }
    if initial_investment >= Decimal::ZERO && cashflows.iter().all(|cf| *cf >= Decimal::ZERO) {
        return Ok(IrrOutcome::NoSolution {
            reason: "cash flows never change sign".into(),
        });
    }

    let mut guess = clamp_rate(options.guess);

    for iteration in 1..=options.max_iterations {
        let Some(value) = npv(guess, cashflows, initial_investment) else {
            return Ok(not_converged(guess, iteration, None));
        };
        log::trace!("irr iteration {iteration}: rate={guess} npv={value}");

        if value.abs() < options.tolerance {
            return Ok(IrrOutcome::Converged {
                rate_percent: guess * Decimal::ONE_HUNDRED,
                iterations: iteration,
            });
        }

        let Some(bumped) = npv(guess + options.delta, cashflows, initial_investment) else {
            return Ok(not_converged(guess, iteration, Some(value)));
        };
        let derivative = (bumped - value) / options.delta;
        if derivative.is_zero() {
            return Ok(not_converged(guess, iteration, Some(value)));
        }

        let Some(step) = value.checked_div(derivative) else {
            return Ok(not_converged(guess, iteration, Some(value)));
        };
        let next = clamp_rate(guess - step);

        if (next - guess).abs() < options.tolerance {
            if let Some(residual) = npv(next, cashflows, initial_investment) {
                if residual.abs() < options.tolerance {
                    return Ok(IrrOutcome::Converged {
                        rate_percent: next * Decimal::ONE_HUNDRED,
                        iterations: iteration,
                    });
                }
            }
        }

        guess = next;
    }

    let residual = npv(guess, cashflows, initial_investment);
    Ok(not_converged(guess, options.max_iterations, residual))
}

fn not_converged(rate: Rate, iterations: u32, residual_npv: Option<Money>) -> IrrOutcome {
    IrrOutcome::NotConverged {
        last_estimate_percent: rate * Decimal::ONE_HUNDRED,
        iterations,
        residual_npv,
    }
}

fn clamp_rate(rate: Rate) -> Rate {
    rate.max(MIN_PERIOD_RATE).min(MAX_PERIOD_RATE)
}

fn validate_options(options: &IrrOptions) -> RealtyResult<()> {
    if options.tolerance <= Decimal::ZERO {
        return Err(RealtyError::invalid("tolerance", "Tolerance must be positive"));
    }
    if options.delta <= Decimal::ZERO {
        return Err(RealtyError::invalid("delta", "Finite-difference step must be positive"));
    }
    if options.max_iterations == 0 {
        return Err(RealtyError::invalid(
            "max_iterations",
            "At least one iteration is required",
        ));
    }
    if options.guess <= dec!(-1) {
        return Err(RealtyError::invalid("guess", "Initial guess must exceed -100%"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solve(cashflows: &[Money], initial: Money) -> IrrOutcome {
        solve_irr(cashflows, initial, &IrrOptions::default()).unwrap()
    }

    #[test]
    fn test_npv_basic() {
        // -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        let v = npv(dec!(0.10), &[dec!(300), dec!(400), dec!(500)], dec!(-1000)).unwrap();
        assert!((v - dec!(-21.04)).abs() < dec!(0.01));
    }

    #[test]
    fn test_npv_zero_rate() {
        let v = npv(Decimal::ZERO, &[dec!(50), dec!(50), dec!(50)], dec!(-100)).unwrap();
        assert_eq!(v, dec!(50));
    }

    #[test]
    fn test_irr_even_cashflows() {
        // -1000, +400 x3 => IRR ~9.70%
        let out = solve(&[dec!(400), dec!(400), dec!(400)], dec!(-1000));
        let rate = out.converged_rate().expect("should converge");
        assert!((rate - dec!(9.70)).abs() < dec!(0.01), "got {rate}");
    }

    #[test]
    fn test_irr_single_period_recovery() {
        // 1100 in one year for 1000 today => 10%
        let out = solve(&[dec!(1100)], dec!(-1000));
        let rate = out.converged_rate().unwrap();
        assert!((rate - dec!(10)).abs() < dec!(0.01));
    }

    #[test]
    fn test_irr_zero_percent_is_a_real_answer() {
        let out = solve(&[dec!(500), dec!(500)], dec!(-1000));
        let rate = out.converged_rate().unwrap();
        assert!(rate.abs() < dec!(0.01), "got {rate}");
    }

    #[test]
    fn test_irr_negative_return() {
        let out = solve(&[dec!(400), dec!(400)], dec!(-1000));
        let rate = out.converged_rate().unwrap();
        assert!(rate < Decimal::ZERO);
    }

    #[test]
    fn test_all_non_positive_is_no_solution() {
        let out = solve(&[dec!(-100), Decimal::ZERO, dec!(-5)], dec!(-1000));
        assert!(matches!(out, IrrOutcome::NoSolution { .. }));
        assert_eq!(out.converged_rate(), None);
    }

    #[test]
    fn test_empty_series_is_no_solution() {
        assert!(matches!(solve(&[], dec!(-10)), IrrOutcome::NoSolution { .. }));
    }

    #[test]
    fn test_no_sign_change_is_no_solution() {
        let out = solve(&[dec!(100), dec!(100)], dec!(50));
        assert!(matches!(out, IrrOutcome::NoSolution { .. }));
    }

    #[test]
    fn test_iteration_budget_reports_not_converged() {
        let options = IrrOptions {
            max_iterations: 1,
            ..IrrOptions::default()
        };
        let out = solve_irr(&[dec!(0), dec!(0), dec!(3000)], dec!(-1000), &options).unwrap();
        match out {
            IrrOutcome::NotConverged { iterations, .. } => assert_eq!(iterations, 1),
            other => panic!("expected NotConverged, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_options() {
        let options = IrrOptions {
            tolerance: Decimal::ZERO,
            ..IrrOptions::default()
        };
        assert!(solve_irr(&[dec!(1)], dec!(-1), &options).is_err());
        let options = IrrOptions {
            max_iterations: 0,
            ..IrrOptions::default()
        };
        assert!(solve_irr(&[dec!(1)], dec!(-1), &options).is_err());
    }

    #[test]
    fn test_outcome_serializes_tagged() {
        let out = IrrOutcome::NoSolution {
            reason: "x".into(),
        };
        let v = serde_json::to_value(&out).unwrap();
        assert_eq!(v["status"], "no_solution");
    }
}
