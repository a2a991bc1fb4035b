use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::capital::{CapitalStructure, FundFeeBreakdown};
use crate::cashflow::CashFlowSchedule;
use crate::costs::CostRevenue;
use crate::resolver::AssumptionSet;
use crate::time_value;
use crate::types::{Money, Rate};

// ---------------------------------------------------------------------------
// Policy configuration
// ---------------------------------------------------------------------------

/// Deal-score weighting policy. Each metric is normalised linearly against
/// its band, weighted, and the composite is scaled to 0–100. Tunable
/// without touching the cash-flow or IRR core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub irr_weight: Decimal,
    pub irr_floor: Rate,
    pub irr_ceiling: Rate,
    pub yield_weight: Decimal,
    pub yield_floor: Decimal,
    pub yield_ceiling: Decimal,
    pub margin_weight: Decimal,
    pub margin_floor: Rate,
    pub margin_ceiling: Rate,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            irr_weight: dec!(0.50),
            irr_floor: Decimal::ZERO,
            irr_ceiling: dec!(0.15),
            yield_weight: dec!(0.25),
            yield_floor: dec!(1.0),
            yield_ceiling: dec!(1.5),
            margin_weight: dec!(0.25),
            margin_floor: Decimal::ZERO,
            margin_ceiling: dec!(0.30),
        }
    }
}

/// Rule thresholds for risk flagging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    pub fund_overhead_max: Rate,
    pub in_kind_max: Rate,
    pub leverage_max: Rate,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            fund_overhead_max: dec!(0.05),
            in_kind_max: dec!(0.50),
            leverage_max: dec!(0.50),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFlag {
    FundOverheadHigh,
    HighInkindExposure,
    NegativeReturns,
    UnknownZoning,
    HighLeverage,
    InputsClamped,
}

// ---------------------------------------------------------------------------
// KPI set
// ---------------------------------------------------------------------------

/// Return metrics for one pro-forma run. `None` means "not computable for
/// this deal" (no real IRR root, zero denominator), which is a valid
/// outcome surfaced as null in the output contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiSet {
    pub irr: Option<Rate>,
    pub equity_net_profit: Money,
    pub roe_total: Option<Rate>,
    pub roe_annualized: Option<Rate>,
    pub profit_margin: Option<Rate>,
    pub cost_to_revenue_ratio: Option<Decimal>,
    pub yield_on_cost: Option<Decimal>,
    pub break_even_sale_price_per_sqm: Option<Money>,
    pub land_cost_per_buildable_sqm: Option<Money>,
    pub revenue_multiple: Option<Decimal>,
    pub fund_overhead_ratio: Option<Rate>,
    pub deal_score: Decimal,
    pub risk_flags: Vec<RiskFlag>,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Derive the full KPI set from the finished pipeline stages.
pub fn calculate_metrics(
    a: &AssumptionSet,
    cr: &CostRevenue,
    fees: &FundFeeBreakdown,
    cap: &CapitalStructure,
    schedule: &CashFlowSchedule,
    scoring: &ScoringConfig,
    thresholds: &RiskThresholds,
) -> KpiSet {
    let n = a.years();
    let total_cost = cap.total_fund_size;
    let gross_revenue = cr.revenue.gross_revenue;

    let irr = time_value::irr(&schedule.net_flows());

    // Profit to equity after financing costs: the terminal cumulative
    // position of the schedule.
    let equity_net_profit = schedule.final_cumulative();

    let roe_total = ratio(equity_net_profit, cap.equity_amount);
    let roe_annualized = roe_total.and_then(|roe| annualize(roe, n));

    let profit_margin = ratio(equity_net_profit, gross_revenue);
    let cost_to_revenue_ratio = ratio(total_cost, gross_revenue);
    let yield_on_cost = ratio(cr.revenue.net_revenue, total_cost);
    let break_even_sale_price_per_sqm = ratio(total_cost, cr.construction.sellable_area_sqm);
    let land_cost_per_buildable_sqm =
        ratio(cr.land.total_acquisition, cr.construction.buildable_area_sqm);
    let revenue_multiple = ratio(gross_revenue, total_cost);
    let fund_overhead_ratio = ratio(fees.total_fund_fees, total_cost);

    let deal_score = score_deal(irr, yield_on_cost, profit_margin, scoring);

    // Flags are pushed in a fixed evaluation order; several may co-occur.
    let mut risk_flags = Vec::new();
    if fund_overhead_ratio.is_some_and(|r| r > thresholds.fund_overhead_max) {
        risk_flags.push(RiskFlag::FundOverheadHigh);
    }
    if a.in_kind_pct.value > thresholds.in_kind_max {
        risk_flags.push(RiskFlag::HighInkindExposure);
    }
    if irr.is_some_and(|r| r < Decimal::ZERO) || equity_net_profit < Decimal::ZERO {
        risk_flags.push(RiskFlag::NegativeReturns);
    }
    if a.far.is_missing() {
        risk_flags.push(RiskFlag::UnknownZoning);
    }
    if cap.debt_pct > thresholds.leverage_max {
        risk_flags.push(RiskFlag::HighLeverage);
    }
    if !a.clamped_fields.is_empty() {
        risk_flags.push(RiskFlag::InputsClamped);
    }

    KpiSet {
        irr,
        equity_net_profit,
        roe_total,
        roe_annualized,
        profit_margin,
        cost_to_revenue_ratio,
        yield_on_cost,
        break_even_sale_price_per_sqm,
        land_cost_per_buildable_sqm,
        revenue_multiple,
        fund_overhead_ratio,
        deal_score,
        risk_flags,
    }
}

/// Null-safe division: `None` on a zero denominator.
fn ratio(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator.is_zero() {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// Geometric annualisation: (1+total)^(1/n) − 1. Undefined when the total
/// return wipes out more than the full stake.
fn annualize(total_return: Rate, years: u32) -> Option<Rate> {
    if years == 0 {
        return None;
    }
    let base = Decimal::ONE + total_return;
    if base <= Decimal::ZERO {
        return None;
    }
    let exponent = Decimal::ONE / Decimal::from(years);
    Some(base.powd(exponent) - Decimal::ONE)
}

/// Weighted band-normalised composite, clamped to [0, 100]. Metrics that
/// are not computable contribute the bottom of their band.
fn score_deal(
    irr: Option<Rate>,
    yield_on_cost: Option<Decimal>,
    profit_margin: Option<Rate>,
    cfg: &ScoringConfig,
) -> Decimal {
    let weight_total = cfg.irr_weight + cfg.yield_weight + cfg.margin_weight;
    if weight_total.is_zero() {
        return Decimal::ZERO;
    }

    let irr_n = band(irr, cfg.irr_floor, cfg.irr_ceiling);
    let yield_n = band(yield_on_cost, cfg.yield_floor, cfg.yield_ceiling);
    let margin_n = band(profit_margin, cfg.margin_floor, cfg.margin_ceiling);

    let composite =
        (cfg.irr_weight * irr_n + cfg.yield_weight * yield_n + cfg.margin_weight * margin_n)
            / weight_total;

    (composite * dec!(100))
        .clamp(Decimal::ZERO, dec!(100))
        .round_dp(1)
}

fn band(value: Option<Decimal>, floor: Decimal, ceiling: Decimal) -> Decimal {
    let Some(v) = value else {
        return Decimal::ZERO;
    };
    if ceiling <= floor {
        return Decimal::ZERO;
    }
    ((v - floor) / (ceiling - floor)).clamp(Decimal::ZERO, Decimal::ONE)
}
