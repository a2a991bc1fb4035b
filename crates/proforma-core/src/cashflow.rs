use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::capital::{CapitalStructure, FundFeeBreakdown};
use crate::costs::CostRevenue;
use crate::resolver::AssumptionSet;
use crate::types::Money;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One period of the projection. Year 0 is the acquisition period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearCashFlow {
    pub year: u32,
    pub inflow_sales: Money,
    pub outflow_land: Money,
    pub outflow_direct: Money,
    pub outflow_indirect: Money,
    pub outflow_interest: Money,
    pub outflow_fees: Money,
    pub outflow_total: Money,
    pub net: Money,
    pub cumulative: Money,
}

/// Ordered yearly schedule over `fund_period_years + 1` periods.
/// The sole input to the IRR solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowSchedule {
    pub years: Vec<YearCashFlow>,
}

impl CashFlowSchedule {
    pub fn net_flows(&self) -> Vec<Money> {
        self.years.iter().map(|y| y.net).collect()
    }

    /// Cumulative position at the end of the fund period.
    pub fn final_cumulative(&self) -> Money {
        self.years
            .last()
            .map(|y| y.cumulative)
            .unwrap_or(Decimal::ZERO)
    }
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Build the year-0..n schedule.
///
/// Policy, applied identically to the base run and every sensitivity cell:
/// the full land acquisition is charged in year 0; direct and indirect
/// construction follow their phasing vectors over years 1..n; proportional
/// fund fees (management, reserve, operator) track the yearly construction
/// spend, fixed annual fees recur every operating year, one-time fees land
/// in year 1; interest accrues on the full loan balance in years 1..n
/// (single drawdown, bullet repayment); revenue is recognised per the
/// revenue phasing vector, net of selling costs.
pub fn project_cash_flows(
    a: &AssumptionSet,
    cr: &CostRevenue,
    fees: &FundFeeBreakdown,
    cap: &CapitalStructure,
) -> CashFlowSchedule {
    let n = a.years() as usize;
    let mut years: Vec<YearCashFlow> = Vec::with_capacity(n + 1);

    let total_direct = cr.construction.total_direct;
    let total_indirect = cr.construction.total_indirect;
    let total_spread = total_direct + total_indirect;

    let proportional_fees = fees.management_fee + fees.other_reserve + fees.operator_fee;
    let fixed_annual = a.custodian_fee_annual.value
        + a.board_fee_annual.value
        + a.sharia_board_fee_annual.value
        + a.auditor_fee_annual.value
        + a.valuation_fee_quarterly.value * Decimal::from(4u32);
    let one_time = a.sharia_certificate_fee.value
        + a.legal_counsel_fee.value
        + a.spv_formation_fee.value
        + fees.structuring_fee
        + fees.arrangement_fee;

    let annual_interest = cap.interest_rate * cap.bank_loan;
    let even_share = Decimal::ONE / Decimal::from(n as u64);

    // Year 0: land acquisition only
    let land_outflow = cr.land.total_acquisition;
    let mut cumulative = -land_outflow;
    years.push(YearCashFlow {
        year: 0,
        inflow_sales: Decimal::ZERO,
        outflow_land: land_outflow,
        outflow_direct: Decimal::ZERO,
        outflow_indirect: Decimal::ZERO,
        outflow_interest: Decimal::ZERO,
        outflow_fees: Decimal::ZERO,
        outflow_total: land_outflow,
        net: -land_outflow,
        cumulative,
    });

    for t in 1..=n {
        let direct = total_direct * a.direct_cost_phasing.weights[t - 1];
        let indirect = total_indirect * a.indirect_cost_phasing.weights[t - 1];

        let spend_share = if total_spread.is_zero() {
            even_share
        } else {
            (direct + indirect) / total_spread
        };

        let mut year_fees = proportional_fees * spend_share + fixed_annual;
        if t == 1 {
            year_fees += one_time;
        }

        let inflow = cr.revenue.net_revenue * a.revenue_phasing.weights[t - 1];
        let outflow_total = direct + indirect + annual_interest + year_fees;
        let net = inflow - outflow_total;
        cumulative += net;

        years.push(YearCashFlow {
            year: t as u32,
            inflow_sales: inflow,
            outflow_land: Decimal::ZERO,
            outflow_direct: direct,
            outflow_indirect: indirect,
            outflow_interest: annual_interest,
            outflow_fees: year_fees,
            outflow_total,
            net,
            cumulative,
        });
    }

    CashFlowSchedule { years }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capital::build_capital_structure;
    use crate::costs::compute_costs;
    use crate::resolver::{resolve_assumptions, AssumptionOverrides};
    use rust_decimal_macros::dec;

    fn sample_overrides() -> AssumptionOverrides {
        AssumptionOverrides {
            land_area_sqm: Some(dec!(1000)),
            far: Some(dec!(1.5)),
            land_price_per_sqm: Some(dec!(7000)),
            sale_price_per_sqm: Some(dec!(12500)),
            fund_period_years: Some(3),
            ..Default::default()
        }
    }

    fn schedule_for(overrides: &AssumptionOverrides) -> CashFlowSchedule {
        let a = resolve_assumptions(None, overrides);
        let cr = compute_costs(&a);
        let (fees, cap) = build_capital_structure(&a, &cr).unwrap();
        project_cash_flows(&a, &cr, &fees, &cap)
    }

    #[test]
    fn test_schedule_length_is_period_plus_one() {
        let schedule = schedule_for(&sample_overrides());
        assert_eq!(schedule.years.len(), 4);
        assert_eq!(schedule.years[0].year, 0);
        assert_eq!(schedule.years[3].year, 3);
    }

    #[test]
    fn test_year_zero_is_land_only() {
        let schedule = schedule_for(&sample_overrides());
        let y0 = &schedule.years[0];
        assert!(y0.outflow_land > Decimal::ZERO);
        assert_eq!(y0.outflow_direct, Decimal::ZERO);
        assert_eq!(y0.outflow_fees, Decimal::ZERO);
        assert_eq!(y0.cumulative, -y0.outflow_land);
    }

    #[test]
    fn test_cumulative_equals_sum_of_nets() {
        let schedule = schedule_for(&sample_overrides());
        let total: Decimal = schedule.years.iter().map(|y| y.net).sum();
        assert!((schedule.final_cumulative() - total).abs() < dec!(0.000001));
    }

    #[test]
    fn test_revenue_recognised_in_final_year_by_default() {
        let schedule = schedule_for(&sample_overrides());
        assert_eq!(schedule.years[1].inflow_sales, Decimal::ZERO);
        assert_eq!(schedule.years[2].inflow_sales, Decimal::ZERO);
        assert!(schedule.years[3].inflow_sales > Decimal::ZERO);
    }

    #[test]
    fn test_staged_sale_policy() {
        let mut overrides = sample_overrides();
        overrides.revenue_phasing = Some(vec![Decimal::ZERO, dec!(0.4), dec!(0.6)]);
        let schedule = schedule_for(&overrides);
        assert_eq!(schedule.years[1].inflow_sales, Decimal::ZERO);
        assert!(schedule.years[2].inflow_sales > Decimal::ZERO);
        assert!(schedule.years[3].inflow_sales > schedule.years[2].inflow_sales);
    }

    #[test]
    fn test_fee_outflows_sum_to_fee_schedule() {
        let overrides = sample_overrides();
        let a = resolve_assumptions(None, &overrides);
        let cr = compute_costs(&a);
        let (fees, cap) = build_capital_structure(&a, &cr).unwrap();
        let schedule = project_cash_flows(&a, &cr, &fees, &cap);

        let charged: Decimal = schedule.years.iter().map(|y| y.outflow_fees).sum();
        assert!(
            (charged - fees.total_fund_fees).abs() < dec!(0.01),
            "charged {charged}, schedule {}",
            fees.total_fund_fees
        );
    }

    #[test]
    fn test_interest_charged_each_operating_year() {
        let overrides = sample_overrides();
        let a = resolve_assumptions(None, &overrides);
        let cr = compute_costs(&a);
        let (fees, cap) = build_capital_structure(&a, &cr).unwrap();
        let schedule = project_cash_flows(&a, &cr, &fees, &cap);

        let annual = cap.interest_rate * cap.bank_loan;
        assert_eq!(schedule.years[0].outflow_interest, Decimal::ZERO);
        for y in &schedule.years[1..] {
            assert_eq!(y.outflow_interest, annual);
        }
        let total: Decimal = schedule.years.iter().map(|y| y.outflow_interest).sum();
        assert_eq!(total, cap.total_interest);
    }

    #[test]
    fn test_construction_follows_phasing() {
        let mut overrides = sample_overrides();
        overrides.direct_cost_phasing = Some(vec![dec!(1), Decimal::ZERO, Decimal::ZERO]);
        let schedule = schedule_for(&overrides);
        assert!(schedule.years[1].outflow_direct > Decimal::ZERO);
        assert_eq!(schedule.years[2].outflow_direct, Decimal::ZERO);
        assert_eq!(schedule.years[3].outflow_direct, Decimal::ZERO);
    }
}
