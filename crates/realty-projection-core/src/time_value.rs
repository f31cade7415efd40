use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::ProjectionError;
use crate::types::{Money, Month, Rate};
use crate::ProjectionResult;

/// Lowest periodic rate searched for an IRR (-99%).
pub const IRR_LOWER_BOUND: Rate = dec!(-0.99);
/// Highest periodic rate searched for an IRR (+1000%).
pub const IRR_UPPER_BOUND: Rate = dec!(10);

const RATE_TOLERANCE: Decimal = dec!(0.000000001);
const MAX_IRR_ITERATIONS: u32 = 200;

/// Net Present Value of a series of periodic cash flows
pub fn npv(rate: Rate, cash_flows: &[Money]) -> ProjectionResult<Money> {
    if rate <= dec!(-1) {
        return Err(ProjectionError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let one_plus_r = Decimal::ONE + rate;
    let mut result = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount
                .checked_mul(one_plus_r)
                .ok_or_else(|| ProjectionError::DivisionByZero {
                    context: format!("NPV discount factor overflow at period {t}"),
                })?;
        }
        if discount.is_zero() {
            return Err(ProjectionError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            });
        }
        result += cf / discount;
    }

    Ok(result)
}

/// A value with the same sign as the NPV at `rate`, computed without
/// overflowing anywhere inside the IRR bracket.
///
/// For r >= 0 this is the NPV itself (factors shrink towards zero). For
/// r < 0 it is the value carried forward to the last period, which equals
/// NPV * (1 + r)^T and so shares its sign.
fn npv_sign_proxy(rate: Rate, cash_flows: &[Money]) -> Decimal {
    let one_plus_r = Decimal::ONE + rate;
    let mut total = Decimal::ZERO;

    if rate >= Decimal::ZERO {
        let v = Decimal::ONE / one_plus_r;
        let mut factor = Decimal::ONE;
        for cf in cash_flows {
            total += cf * factor;
            factor *= v;
        }
    } else {
        let mut factor = Decimal::ONE;
        for cf in cash_flows.iter().rev() {
            total += cf * factor;
            factor *= one_plus_r;
        }
    }

    total
}

/// Internal Rate of Return by bisection over [-99%, +1000%] per period.
///
/// Returns `ConvergenceFailure` when the NPV has the same sign at both ends
/// of the bracket (no root to bisect).
pub fn irr(cash_flows: &[Money]) -> ProjectionResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(ProjectionError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    let mut lo = IRR_LOWER_BOUND;
    let mut hi = IRR_UPPER_BOUND;
    let mut f_lo = npv_sign_proxy(lo, cash_flows);
    let f_hi = npv_sign_proxy(hi, cash_flows);

    if f_lo.is_zero() {
        return Ok(lo);
    }
    if f_hi.is_zero() {
        return Ok(hi);
    }
    if f_lo.is_sign_negative() == f_hi.is_sign_negative() {
        return Err(ProjectionError::ConvergenceFailure {
            function: "IRR".into(),
            iterations: 0,
            last_delta: f_lo.abs().min(f_hi.abs()),
        });
    }

    for _ in 0..MAX_IRR_ITERATIONS {
        let mid = (lo + hi) / dec!(2);
        let f_mid = npv_sign_proxy(mid, cash_flows);

        if f_mid.is_zero() || (hi - lo) < RATE_TOLERANCE {
            return Ok(mid);
        }

        if f_mid.is_sign_negative() == f_lo.is_sign_negative() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }

    Err(ProjectionError::ConvergenceFailure {
        function: "IRR".into(),
        iterations: MAX_IRR_ITERATIONS,
        last_delta: hi - lo,
    })
}

/// Convert a monthly periodic rate to its effective annual equivalent.
pub fn annualize_monthly(rate: Rate) -> Rate {
    (Decimal::ONE + rate).powi(12) - Decimal::ONE
}

/// First month at which cumulative net cash flow is back at or above zero
/// after money has gone out. `None` when never recovered within the horizon.
pub fn payback_period(cash_flows: &[Money]) -> Option<Month> {
    let mut cumulative = Decimal::ZERO;
    let mut invested = false;

    for (month, cf) in cash_flows.iter().enumerate() {
        if cf.is_sign_negative() && !cf.is_zero() {
            invested = true;
        }
        cumulative += cf;
        if invested && cumulative >= Decimal::ZERO {
            return Some(month as Month);
        }
    }

    None
}
