use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::resolver::AssumptionSet;
use crate::types::Money;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Land acquisition cost breakdown, in-kind aware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandCostBreakdown {
    pub land_price_total: Money,
    pub brokerage_fee: Money,
    pub transfer_tax: Money,
    pub brokerage_vat: Money,
    pub total_acquisition: Money,
    /// Acquisition cost actually paid in cash
    pub cash_portion: Money,
    /// Land value contributed in kind instead of purchased
    pub in_kind_portion: Money,
}

/// Construction cost breakdown: direct works plus soft costs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructionCostBreakdown {
    /// Gross buildable area = parcel area × FAR
    pub buildable_area_sqm: Decimal,
    /// Sellable area = buildable × efficiency ratio
    pub sellable_area_sqm: Decimal,
    pub infrastructure_cost: Money,
    pub superstructure_cost: Money,
    pub parking_cost: Money,
    pub total_direct: Money,
    pub developer_fee: Money,
    pub other_indirect: Money,
    pub contingency: Money,
    pub total_indirect: Money,
    pub total_construction: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueBreakdown {
    pub sale_price_per_sqm: Money,
    pub gross_revenue: Money,
    pub selling_costs: Money,
    pub net_revenue: Money,
}

/// Combined cost and revenue view consumed by the capital-structure and
/// cash-flow stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostRevenue {
    pub land: LandCostBreakdown,
    pub construction: ConstructionCostBreakdown,
    pub revenue: RevenueBreakdown,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Derive land, construction and revenue figures from a resolved
/// assumption set.
///
/// Zero area or FAR produces zero buildable area and zero revenue: an
/// infeasible deal is a valid outcome, not an error.
pub fn compute_costs(a: &AssumptionSet) -> CostRevenue {
    let land_area = a.land_area_sqm.value;
    let in_kind_pct = a.in_kind_pct.value;

    // Land acquisition. Brokerage is always due on the full land price
    // (the broker arranged the deal either way); transfer tax applies only
    // to a cash purchase, not an in-kind contribution.
    let land_price_total = land_area * a.land_price_per_sqm.value;
    let brokerage_fee = a.brokerage_fee_pct.value * land_price_total;
    let brokerage_vat = a.brokerage_vat_pct.value * brokerage_fee;
    let transfer_tax = if in_kind_pct.is_zero() {
        a.transfer_tax_pct.value * land_price_total
    } else {
        Decimal::ZERO
    };
    let total_acquisition = land_price_total + brokerage_fee + transfer_tax + brokerage_vat;
    let in_kind_portion = land_price_total * in_kind_pct;
    let cash_portion = total_acquisition - in_kind_portion;

    let land = LandCostBreakdown {
        land_price_total,
        brokerage_fee,
        transfer_tax,
        brokerage_vat,
        total_acquisition,
        cash_portion,
        in_kind_portion,
    };

    // Construction
    let buildable_area_sqm = land_area * a.far.value;
    let sellable_area_sqm = buildable_area_sqm * a.efficiency_ratio.value;

    let infrastructure_cost = buildable_area_sqm * a.infrastructure_cost_per_sqm.value;
    let superstructure_cost = buildable_area_sqm * a.superstructure_cost_per_sqm.value;
    let parking_cost = a.parking_area_sqm.value * a.parking_cost_per_sqm.value;
    let total_direct = infrastructure_cost + superstructure_cost + parking_cost;

    let developer_fee = a.developer_fee_pct.value * total_direct;
    let other_indirect = a.other_indirect_pct.value * total_direct;
    let contingency = a.contingency_pct.value * total_direct;
    let total_indirect = developer_fee + other_indirect + contingency;

    let construction = ConstructionCostBreakdown {
        buildable_area_sqm,
        sellable_area_sqm,
        infrastructure_cost,
        superstructure_cost,
        parking_cost,
        total_direct,
        developer_fee,
        other_indirect,
        contingency,
        total_indirect,
        total_construction: total_direct + total_indirect,
    };

    // Revenue
    let sale_price_per_sqm = a.sale_price_per_sqm.value;
    let gross_revenue = sellable_area_sqm * sale_price_per_sqm;
    let selling_costs = gross_revenue * a.selling_cost_pct.value;

    let revenue = RevenueBreakdown {
        sale_price_per_sqm,
        gross_revenue,
        selling_costs,
        net_revenue: gross_revenue - selling_costs,
    };

    CostRevenue {
        land,
        construction,
        revenue,
    }
}
