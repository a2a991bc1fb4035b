use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::costs::CostRevenue;
use crate::error::ProformaError;
use crate::resolver::AssumptionSet;
use crate::types::{Money, Rate};
use crate::ProformaResult;

const PCT_SUM_TOLERANCE: Decimal = dec!(0.000000001);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Fund fee schedule, estimated over the full fund period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundFeeBreakdown {
    pub management_fee: Money,
    pub custodian_fee: Money,
    pub board_fee: Money,
    pub sharia_fees: Money,
    pub legal_counsel: Money,
    pub auditor_fee: Money,
    pub valuation_fee: Money,
    pub other_reserve: Money,
    pub spv_formation: Money,
    pub structuring_fee: Money,
    pub arrangement_fee: Money,
    pub operator_fee: Money,
    pub total_fund_fees: Money,
}

/// Fund size and its equity / debt / in-kind split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapitalStructure {
    pub total_fund_size: Money,
    pub equity_amount: Money,
    pub bank_loan: Money,
    pub in_kind_contribution: Money,
    pub equity_pct: Rate,
    pub debt_pct: Rate,
    pub in_kind_pct: Rate,
    pub interest_rate: Rate,
    /// Interest over the whole period: single drawdown at acquisition,
    /// bullet repayment in the final year.
    pub total_interest: Money,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Compute the fund fee schedule and split the resulting fund size into
/// equity, bank debt and in-kind contributions.
///
/// The structuring fee (a fraction of equity) and the arrangement fee (a
/// fraction of the loan) are circular with the fund size; both are
/// resolved with a single first-pass estimate off the pre-fee fund size,
/// applied consistently to every run.
pub fn build_capital_structure(
    a: &AssumptionSet,
    cr: &CostRevenue,
) -> ProformaResult<(FundFeeBreakdown, CapitalStructure)> {
    let n = Decimal::from(a.years());
    let cost_base = cr.land.total_acquisition + cr.construction.total_construction;

    let in_kind_frac = a.in_kind_pct.value;
    let ltv = a.bank_ltv_pct.value;

    // Fee schedule off the cost base
    let management_fee = a.management_fee_pct.value * cost_base;
    let custodian_fee = a.custodian_fee_annual.value * n;
    let board_fee = a.board_fee_annual.value * n;
    let sharia_fees = a.sharia_certificate_fee.value + a.sharia_board_fee_annual.value * n;
    let legal_counsel = a.legal_counsel_fee.value;
    let auditor_fee = a.auditor_fee_annual.value * n;
    let valuation_fee = a.valuation_fee_quarterly.value * dec!(4) * n;
    let other_reserve = a.other_reserve_pct.value * cost_base;
    let spv_formation = a.spv_formation_fee.value;
    let operator_fee = a.operator_fee_pct.value * cost_base;

    let base_fees = management_fee
        + custodian_fee
        + board_fee
        + sharia_fees
        + legal_counsel
        + auditor_fee
        + valuation_fee
        + other_reserve
        + spv_formation
        + operator_fee;

    // First-pass estimates for the circular fees
    let est_fund = cost_base + base_fees;
    let est_in_kind = est_fund * in_kind_frac;
    let est_loan = (est_fund - est_in_kind) * ltv;
    let est_equity = est_fund - est_in_kind - est_loan;
    let arrangement_fee = a.arrangement_fee_pct.value * est_loan;
    let structuring_fee = a.structuring_fee_pct.value * est_equity;

    let total_fund_fees = base_fees + arrangement_fee + structuring_fee;

    let fees = FundFeeBreakdown {
        management_fee,
        custodian_fee,
        board_fee,
        sharia_fees,
        legal_counsel,
        auditor_fee,
        valuation_fee,
        other_reserve,
        spv_formation,
        structuring_fee,
        arrangement_fee,
        operator_fee,
        total_fund_fees,
    };

    // Capital split: equity is the residual, so the three percentages sum
    // to one by construction; the invariant is still checked.
    let total_fund_size = cost_base + total_fund_fees;
    let in_kind_contribution = total_fund_size * in_kind_frac;
    let bank_loan = (total_fund_size - in_kind_contribution) * ltv;
    let equity_amount = total_fund_size - in_kind_contribution - bank_loan;

    let (equity_pct, debt_pct, in_kind_pct) = if total_fund_size > Decimal::ZERO {
        (
            equity_amount / total_fund_size,
            bank_loan / total_fund_size,
            in_kind_contribution / total_fund_size,
        )
    } else {
        (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
    };

    if total_fund_size > Decimal::ZERO {
        let pct_sum = equity_pct + debt_pct + in_kind_pct;
        if (pct_sum - Decimal::ONE).abs() > PCT_SUM_TOLERANCE {
            return Err(ProformaError::FinancialImpossibility(format!(
                "capital structure percentages sum to {pct_sum}, expected 1.0"
            )));
        }
    }

    let interest_rate = a.interest_rate_pct.value;
    let total_interest = interest_rate * bank_loan * n;

    let capital = CapitalStructure {
        total_fund_size,
        equity_amount,
        bank_loan,
        in_kind_contribution,
        equity_pct,
        debt_pct,
        in_kind_pct,
        interest_rate,
        total_interest,
    };

    Ok((fees, capital))
}
