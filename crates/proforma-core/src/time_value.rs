use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{Money, Rate};

const NPV_TOLERANCE: Decimal = dec!(0.000001);
const MAX_ITERATIONS: u32 = 200;
const RATE_FLOOR: Decimal = dec!(-0.99);
const RATE_CEILING: Decimal = dec!(10.0);

/// Net Present Value of an integer-period cash-flow series (t = 0..n).
///
/// Evaluated with Horner's rule from the terminal flow. Near the lower
/// rate bound the true NPV can exceed the decimal range; it saturates
/// with the dominating sign instead of overflowing, which preserves the
/// sign information the root search needs.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> Money {
    checked_npv(rate, cash_flows).unwrap_or_else(|| saturated(cash_flows))
}

/// Internal Rate of Return of an integer-period series.
///
/// Newton-Raphson from a 10% guess, falling back to bisection over
/// [-0.99, 10.0] when Newton stalls or leaves the bracket. Returns `None`
/// for degenerate series (fewer than two flows, all zero, or no sign
/// change) and when no root exists in range: those are valid business
/// outcomes, not faults.
pub fn irr(cash_flows: &[Money]) -> Option<Rate> {
    if cash_flows.len() < 2 {
        return None;
    }

    let has_positive = cash_flows.iter().any(|cf| *cf > Decimal::ZERO);
    let has_negative = cash_flows.iter().any(|cf| *cf < Decimal::ZERO);
    if !has_positive || !has_negative {
        return None;
    }

    let mut rate = dec!(0.10);

    for _ in 0..MAX_ITERATIONS {
        let Some((npv_val, dnpv)) = npv_and_derivative(cash_flows, rate) else {
            break;
        };

        if npv_val.abs() < NPV_TOLERANCE {
            return Some(rate);
        }

        if dnpv.is_zero() {
            break;
        }

        let next = rate - npv_val / dnpv;

        if next <= RATE_FLOOR || next >= RATE_CEILING {
            break;
        }

        rate = next;
    }

    if npv(rate, cash_flows).abs() < NPV_TOLERANCE {
        return Some(rate);
    }

    bisect(cash_flows)
}

/// Horner evaluation: NPV = CF_0 + (CF_1 + (CF_2 + ...)/(1+r))/(1+r).
/// None when the running value leaves the decimal range.
fn checked_npv(rate: Rate, cash_flows: &[Money]) -> Option<Decimal> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r.is_zero() {
        return None;
    }

    let mut acc = Decimal::ZERO;
    for cf in cash_flows.iter().rev() {
        acc = acc.checked_div(one_plus_r)?.checked_add(*cf)?;
    }
    Some(acc)
}

/// Sign-preserving stand-in for an out-of-range NPV. At rates near -1 the
/// latest nonzero flow dominates the sum.
fn saturated(cash_flows: &[Money]) -> Decimal {
    let dominant = cash_flows
        .iter()
        .rev()
        .find(|cf| !cf.is_zero())
        .copied()
        .unwrap_or(Decimal::ZERO);
    if dominant < Decimal::ZERO {
        Decimal::MIN
    } else {
        Decimal::MAX
    }
}

/// NPV(r) and its derivative d(NPV)/dr, or None on range overflow.
fn npv_and_derivative(cash_flows: &[Money], rate: Decimal) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r.is_zero() {
        return None;
    }

    let mut npv_val = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    let mut discount = Decimal::ONE; // (1+r)^0 = 1

    for (t, cf) in cash_flows.iter().enumerate() {
        npv_val = npv_val.checked_add(cf.checked_mul(discount)?)?;
        if t > 0 {
            // d/dr of CF_t / (1+r)^t = -t * CF_t / (1+r)^(t+1)
            let term = Decimal::from(-(t as i64))
                .checked_mul(*cf)?
                .checked_mul(discount)?
                .checked_div(one_plus_r)?;
            dnpv = dnpv.checked_add(term)?;
        }
        discount = discount.checked_div(one_plus_r)?;
    }

    Some((npv_val, dnpv))
}

/// Bisection over the full admissible rate range. Requires a sign change
/// of NPV between the bounds; otherwise there is no root to report.
fn bisect(cash_flows: &[Money]) -> Option<Rate> {
    let mut lo = RATE_FLOOR;
    let mut hi = RATE_CEILING;
    let mut npv_lo = npv(lo, cash_flows);
    let npv_hi = npv(hi, cash_flows);

    if npv_lo.abs() < NPV_TOLERANCE {
        return Some(lo);
    }
    if npv_hi.abs() < NPV_TOLERANCE {
        return Some(hi);
    }
    if (npv_lo > Decimal::ZERO) == (npv_hi > Decimal::ZERO) {
        return None;
    }

    for _ in 0..MAX_ITERATIONS {
        let mid = (lo + hi) / dec!(2);
        let npv_mid = npv(mid, cash_flows);

        if npv_mid.abs() < NPV_TOLERANCE {
            return Some(mid);
        }

        if (npv_lo > Decimal::ZERO) == (npv_mid > Decimal::ZERO) {
            lo = mid;
            npv_lo = npv_mid;
        } else {
            hi = mid;
        }
    }

    None
}
