use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{ParcelSnapshot, Provenance, ResolvedPhasing, ResolvedValue};

/// District average prices below this floor are treated as absent rather
/// than propagated as auto values.
const PRICE_VALIDITY_FLOOR: Decimal = dec!(100);

/// Hard ceiling on the bank loan-to-value fraction.
const LTV_CEILING: Decimal = dec!(0.80);

/// Longest fund period the projection will build.
const MAX_FUND_PERIOD_YEARS: Decimal = dec!(50);

// ---------------------------------------------------------------------------
// Caller overrides
// ---------------------------------------------------------------------------

/// Caller-supplied parameter overrides. Every field is optional; `None`
/// falls through to parcel derivation and then the engine default table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssumptionOverrides {
    pub land_area_sqm: Option<Decimal>,
    pub far: Option<Decimal>,
    pub efficiency_ratio: Option<Decimal>,
    pub land_price_per_sqm: Option<Decimal>,
    pub sale_price_per_sqm: Option<Decimal>,
    pub selling_cost_pct: Option<Decimal>,
    pub infrastructure_cost_per_sqm: Option<Decimal>,
    pub superstructure_cost_per_sqm: Option<Decimal>,
    pub parking_area_sqm: Option<Decimal>,
    pub parking_cost_per_sqm: Option<Decimal>,
    pub brokerage_fee_pct: Option<Decimal>,
    pub transfer_tax_pct: Option<Decimal>,
    pub brokerage_vat_pct: Option<Decimal>,
    pub developer_fee_pct: Option<Decimal>,
    pub other_indirect_pct: Option<Decimal>,
    pub contingency_pct: Option<Decimal>,
    pub in_kind_pct: Option<Decimal>,
    pub bank_ltv_pct: Option<Decimal>,
    pub interest_rate_pct: Option<Decimal>,
    pub arrangement_fee_pct: Option<Decimal>,
    pub fund_period_years: Option<u32>,
    pub management_fee_pct: Option<Decimal>,
    pub custodian_fee_annual: Option<Decimal>,
    pub board_fee_annual: Option<Decimal>,
    pub sharia_certificate_fee: Option<Decimal>,
    pub sharia_board_fee_annual: Option<Decimal>,
    pub legal_counsel_fee: Option<Decimal>,
    pub auditor_fee_annual: Option<Decimal>,
    pub valuation_fee_quarterly: Option<Decimal>,
    pub other_reserve_pct: Option<Decimal>,
    pub spv_formation_fee: Option<Decimal>,
    pub structuring_fee_pct: Option<Decimal>,
    pub operator_fee_pct: Option<Decimal>,
    pub direct_cost_phasing: Option<Vec<Decimal>>,
    pub indirect_cost_phasing: Option<Vec<Decimal>>,
    pub revenue_phasing: Option<Vec<Decimal>>,
}

// ---------------------------------------------------------------------------
// Resolved assumption set
// ---------------------------------------------------------------------------

/// The complete, provenance-tagged input set for one computation.
///
/// Constructed fresh per request by [`resolve_assumptions`] and passed
/// immutably through the rest of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssumptionSet {
    pub land_area_sqm: ResolvedValue,
    pub far: ResolvedValue,
    pub efficiency_ratio: ResolvedValue,
    pub land_price_per_sqm: ResolvedValue,
    pub sale_price_per_sqm: ResolvedValue,
    pub selling_cost_pct: ResolvedValue,
    pub infrastructure_cost_per_sqm: ResolvedValue,
    pub superstructure_cost_per_sqm: ResolvedValue,
    pub parking_area_sqm: ResolvedValue,
    pub parking_cost_per_sqm: ResolvedValue,
    pub brokerage_fee_pct: ResolvedValue,
    pub transfer_tax_pct: ResolvedValue,
    pub brokerage_vat_pct: ResolvedValue,
    pub developer_fee_pct: ResolvedValue,
    pub other_indirect_pct: ResolvedValue,
    pub contingency_pct: ResolvedValue,
    pub in_kind_pct: ResolvedValue,
    pub bank_ltv_pct: ResolvedValue,
    pub interest_rate_pct: ResolvedValue,
    pub arrangement_fee_pct: ResolvedValue,
    pub fund_period_years: ResolvedValue,
    pub management_fee_pct: ResolvedValue,
    pub custodian_fee_annual: ResolvedValue,
    pub board_fee_annual: ResolvedValue,
    pub sharia_certificate_fee: ResolvedValue,
    pub sharia_board_fee_annual: ResolvedValue,
    pub legal_counsel_fee: ResolvedValue,
    pub auditor_fee_annual: ResolvedValue,
    pub valuation_fee_quarterly: ResolvedValue,
    pub other_reserve_pct: ResolvedValue,
    pub spv_formation_fee: ResolvedValue,
    pub structuring_fee_pct: ResolvedValue,
    pub operator_fee_pct: ResolvedValue,
    pub direct_cost_phasing: ResolvedPhasing,
    pub indirect_cost_phasing: ResolvedPhasing,
    pub revenue_phasing: ResolvedPhasing,
    /// Override fields that were clamped into the valid domain.
    pub clamped_fields: Vec<String>,
}

impl AssumptionSet {
    /// Fund period as a whole-year count. Clamped to at least 1 at
    /// resolution time, so the conversion is total.
    pub fn years(&self) -> u32 {
        self.fund_period_years.value.to_u32().unwrap_or(1).max(1)
    }

    /// Every scalar parameter with its provenance, in declaration order.
    /// Input to the data-health census.
    pub fn provenance_entries(&self) -> Vec<(&'static str, Provenance)> {
        let mut entries = vec![
            ("land_area_sqm", self.land_area_sqm.provenance),
            ("far", self.far.provenance),
            ("efficiency_ratio", self.efficiency_ratio.provenance),
            ("land_price_per_sqm", self.land_price_per_sqm.provenance),
            ("sale_price_per_sqm", self.sale_price_per_sqm.provenance),
            ("selling_cost_pct", self.selling_cost_pct.provenance),
            (
                "infrastructure_cost_per_sqm",
                self.infrastructure_cost_per_sqm.provenance,
            ),
            (
                "superstructure_cost_per_sqm",
                self.superstructure_cost_per_sqm.provenance,
            ),
            ("parking_area_sqm", self.parking_area_sqm.provenance),
            ("parking_cost_per_sqm", self.parking_cost_per_sqm.provenance),
            ("brokerage_fee_pct", self.brokerage_fee_pct.provenance),
            ("transfer_tax_pct", self.transfer_tax_pct.provenance),
            ("brokerage_vat_pct", self.brokerage_vat_pct.provenance),
            ("developer_fee_pct", self.developer_fee_pct.provenance),
            ("other_indirect_pct", self.other_indirect_pct.provenance),
            ("contingency_pct", self.contingency_pct.provenance),
            ("in_kind_pct", self.in_kind_pct.provenance),
            ("bank_ltv_pct", self.bank_ltv_pct.provenance),
            ("interest_rate_pct", self.interest_rate_pct.provenance),
            ("arrangement_fee_pct", self.arrangement_fee_pct.provenance),
            ("fund_period_years", self.fund_period_years.provenance),
            ("management_fee_pct", self.management_fee_pct.provenance),
            ("custodian_fee_annual", self.custodian_fee_annual.provenance),
            ("board_fee_annual", self.board_fee_annual.provenance),
            (
                "sharia_certificate_fee",
                self.sharia_certificate_fee.provenance,
            ),
            (
                "sharia_board_fee_annual",
                self.sharia_board_fee_annual.provenance,
            ),
            ("legal_counsel_fee", self.legal_counsel_fee.provenance),
            ("auditor_fee_annual", self.auditor_fee_annual.provenance),
            (
                "valuation_fee_quarterly",
                self.valuation_fee_quarterly.provenance,
            ),
            ("other_reserve_pct", self.other_reserve_pct.provenance),
            ("spv_formation_fee", self.spv_formation_fee.provenance),
            ("structuring_fee_pct", self.structuring_fee_pct.provenance),
            ("operator_fee_pct", self.operator_fee_pct.provenance),
        ];
        entries.push(("direct_cost_phasing", self.direct_cost_phasing.provenance));
        entries.push((
            "indirect_cost_phasing",
            self.indirect_cost_phasing.provenance,
        ));
        entries.push(("revenue_phasing", self.revenue_phasing.provenance));
        entries
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Merge caller overrides, parcel-derived values and the engine default
/// table into one coherent, provenance-tagged set.
///
/// Pure and total: absence never raises. Out-of-domain overrides are
/// clamped into the valid range here, at the boundary, and recorded in
/// `clamped_fields` so the metrics stage can flag them.
pub fn resolve_assumptions(
    parcel: Option<&ParcelSnapshot>,
    overrides: &AssumptionOverrides,
) -> AssumptionSet {
    let mut clamped: Vec<String> = Vec::new();

    // Parcel-derived candidates. Zero-area or zero-FAR snapshots are kept:
    // an infeasible parcel is still real data.
    let parcel_area = parcel.and_then(|p| p.area_sqm);
    let parcel_far = parcel.and_then(|p| p.far);
    let district_sale = parcel
        .and_then(|p| p.district.as_ref())
        .and_then(|d| d.avg_sale_price_per_sqm)
        .filter(|v| *v >= PRICE_VALIDITY_FLOOR);
    let district_land = parcel
        .and_then(|p| p.district.as_ref())
        .and_then(|d| d.avg_land_price_per_sqm)
        .filter(|v| *v >= PRICE_VALIDITY_FLOOR);

    // Zoning and areas. No default for area or FAR: without a snapshot or
    // an override they resolve Missing.
    let mut land_area_sqm = resolved(overrides.land_area_sqm, parcel_area, None);
    let mut far = resolved(overrides.far, parcel_far, None);
    let mut efficiency_ratio = resolved(overrides.efficiency_ratio, None, Some(dec!(0.85)));

    // Prices. District averages only count when above the validity floor.
    let mut land_price_per_sqm = resolved(overrides.land_price_per_sqm, district_land, None);
    let mut sale_price_per_sqm = resolved(overrides.sale_price_per_sqm, district_sale, None);
    let mut selling_cost_pct = resolved(overrides.selling_cost_pct, None, Some(Decimal::ZERO));

    // Construction
    let mut infrastructure_cost_per_sqm =
        resolved(overrides.infrastructure_cost_per_sqm, None, Some(dec!(500)));
    let mut superstructure_cost_per_sqm = resolved(
        overrides.superstructure_cost_per_sqm,
        None,
        Some(dec!(2500)),
    );
    let mut parking_area_sqm = resolved(overrides.parking_area_sqm, None, Some(Decimal::ZERO));
    let mut parking_cost_per_sqm =
        resolved(overrides.parking_cost_per_sqm, None, Some(dec!(2000)));

    // Acquisition costs
    let mut brokerage_fee_pct = resolved(overrides.brokerage_fee_pct, None, Some(dec!(0.025)));
    let mut transfer_tax_pct = resolved(overrides.transfer_tax_pct, None, Some(dec!(0.05)));
    let mut brokerage_vat_pct = resolved(overrides.brokerage_vat_pct, None, Some(dec!(0.15)));

    // Soft costs (% of direct construction)
    let mut developer_fee_pct = resolved(overrides.developer_fee_pct, None, Some(dec!(0.10)));
    let mut other_indirect_pct = resolved(overrides.other_indirect_pct, None, Some(dec!(0.06)));
    let mut contingency_pct = resolved(overrides.contingency_pct, None, Some(dec!(0.05)));

    // Financing and fund structure
    let mut in_kind_pct = resolved(overrides.in_kind_pct, None, Some(Decimal::ZERO));
    let mut bank_ltv_pct = resolved(overrides.bank_ltv_pct, None, Some(dec!(0.667)));
    let mut interest_rate_pct = resolved(overrides.interest_rate_pct, None, Some(dec!(0.08)));
    let mut arrangement_fee_pct =
        resolved(overrides.arrangement_fee_pct, None, Some(dec!(0.02)));
    let mut fund_period_years = resolved(
        overrides.fund_period_years.map(Decimal::from),
        None,
        Some(dec!(3)),
    );

    // Fund fee schedule
    let mut management_fee_pct = resolved(overrides.management_fee_pct, None, Some(dec!(0.015)));
    let mut custodian_fee_annual =
        resolved(overrides.custodian_fee_annual, None, Some(dec!(50000)));
    let mut board_fee_annual = resolved(overrides.board_fee_annual, None, Some(dec!(100000)));
    let mut sharia_certificate_fee =
        resolved(overrides.sharia_certificate_fee, None, Some(dec!(5000)));
    let mut sharia_board_fee_annual =
        resolved(overrides.sharia_board_fee_annual, None, Some(dec!(5000)));
    let mut legal_counsel_fee = resolved(overrides.legal_counsel_fee, None, Some(dec!(50000)));
    let mut auditor_fee_annual = resolved(overrides.auditor_fee_annual, None, Some(dec!(50000)));
    let mut valuation_fee_quarterly =
        resolved(overrides.valuation_fee_quarterly, None, Some(dec!(20000)));
    let mut other_reserve_pct = resolved(overrides.other_reserve_pct, None, Some(dec!(0.0005)));
    let mut spv_formation_fee = resolved(overrides.spv_formation_fee, None, Some(dec!(25000)));
    let mut structuring_fee_pct =
        resolved(overrides.structuring_fee_pct, None, Some(dec!(0.01)));
    let mut operator_fee_pct = resolved(overrides.operator_fee_pct, None, Some(dec!(0.0015)));

    // Clamp out-of-domain values at the boundary so no NaN-producing
    // arithmetic can happen downstream.
    clamp_min(&mut land_area_sqm, Decimal::ZERO, "land_area_sqm", &mut clamped);
    clamp_min(&mut far, Decimal::ZERO, "far", &mut clamped);
    clamp_range(&mut efficiency_ratio, Decimal::ZERO, Decimal::ONE, "efficiency_ratio", &mut clamped);
    clamp_min(&mut land_price_per_sqm, Decimal::ZERO, "land_price_per_sqm", &mut clamped);
    clamp_min(&mut sale_price_per_sqm, Decimal::ZERO, "sale_price_per_sqm", &mut clamped);
    clamp_range(&mut selling_cost_pct, Decimal::ZERO, Decimal::ONE, "selling_cost_pct", &mut clamped);
    clamp_min(&mut infrastructure_cost_per_sqm, Decimal::ZERO, "infrastructure_cost_per_sqm", &mut clamped);
    clamp_min(&mut superstructure_cost_per_sqm, Decimal::ZERO, "superstructure_cost_per_sqm", &mut clamped);
    clamp_min(&mut parking_area_sqm, Decimal::ZERO, "parking_area_sqm", &mut clamped);
    clamp_min(&mut parking_cost_per_sqm, Decimal::ZERO, "parking_cost_per_sqm", &mut clamped);
    clamp_range(&mut brokerage_fee_pct, Decimal::ZERO, Decimal::ONE, "brokerage_fee_pct", &mut clamped);
    clamp_range(&mut transfer_tax_pct, Decimal::ZERO, Decimal::ONE, "transfer_tax_pct", &mut clamped);
    clamp_range(&mut brokerage_vat_pct, Decimal::ZERO, Decimal::ONE, "brokerage_vat_pct", &mut clamped);
    clamp_range(&mut developer_fee_pct, Decimal::ZERO, Decimal::ONE, "developer_fee_pct", &mut clamped);
    clamp_range(&mut other_indirect_pct, Decimal::ZERO, Decimal::ONE, "other_indirect_pct", &mut clamped);
    clamp_range(&mut contingency_pct, Decimal::ZERO, Decimal::ONE, "contingency_pct", &mut clamped);
    clamp_range(&mut in_kind_pct, Decimal::ZERO, Decimal::ONE, "in_kind_pct", &mut clamped);
    clamp_range(&mut bank_ltv_pct, Decimal::ZERO, LTV_CEILING, "bank_ltv_pct", &mut clamped);
    clamp_range(&mut interest_rate_pct, Decimal::ZERO, Decimal::ONE, "interest_rate_pct", &mut clamped);
    clamp_range(&mut arrangement_fee_pct, Decimal::ZERO, Decimal::ONE, "arrangement_fee_pct", &mut clamped);
    clamp_range(&mut fund_period_years, Decimal::ONE, MAX_FUND_PERIOD_YEARS, "fund_period_years", &mut clamped);
    clamp_range(&mut management_fee_pct, Decimal::ZERO, Decimal::ONE, "management_fee_pct", &mut clamped);
    clamp_min(&mut custodian_fee_annual, Decimal::ZERO, "custodian_fee_annual", &mut clamped);
    clamp_min(&mut board_fee_annual, Decimal::ZERO, "board_fee_annual", &mut clamped);
    clamp_min(&mut sharia_certificate_fee, Decimal::ZERO, "sharia_certificate_fee", &mut clamped);
    clamp_min(&mut sharia_board_fee_annual, Decimal::ZERO, "sharia_board_fee_annual", &mut clamped);
    clamp_min(&mut legal_counsel_fee, Decimal::ZERO, "legal_counsel_fee", &mut clamped);
    clamp_min(&mut auditor_fee_annual, Decimal::ZERO, "auditor_fee_annual", &mut clamped);
    clamp_min(&mut valuation_fee_quarterly, Decimal::ZERO, "valuation_fee_quarterly", &mut clamped);
    clamp_range(&mut other_reserve_pct, Decimal::ZERO, Decimal::ONE, "other_reserve_pct", &mut clamped);
    clamp_min(&mut spv_formation_fee, Decimal::ZERO, "spv_formation_fee", &mut clamped);
    clamp_range(&mut structuring_fee_pct, Decimal::ZERO, Decimal::ONE, "structuring_fee_pct", &mut clamped);
    clamp_range(&mut operator_fee_pct, Decimal::ZERO, Decimal::ONE, "operator_fee_pct", &mut clamped);

    let n_years = fund_period_years.value.to_u32().unwrap_or(1).max(1) as usize;

    // S-curve construction phasing over years 1..n; sale proceeds recognised
    // in the final year unless the caller configures a staged-sale vector.
    let direct_cost_phasing = resolve_phasing(
        overrides.direct_cost_phasing.as_ref(),
        &[dec!(0.33), dec!(0.45), dec!(0.22)],
        n_years,
    );
    let indirect_cost_phasing = resolve_phasing(
        overrides.indirect_cost_phasing.as_ref(),
        &[dec!(0.33), dec!(0.45), dec!(0.22)],
        n_years,
    );
    let revenue_phasing = resolve_phasing(
        overrides.revenue_phasing.as_ref(),
        &final_year_weights(n_years),
        n_years,
    );

    AssumptionSet {
        land_area_sqm,
        far,
        efficiency_ratio,
        land_price_per_sqm,
        sale_price_per_sqm,
        selling_cost_pct,
        infrastructure_cost_per_sqm,
        superstructure_cost_per_sqm,
        parking_area_sqm,
        parking_cost_per_sqm,
        brokerage_fee_pct,
        transfer_tax_pct,
        brokerage_vat_pct,
        developer_fee_pct,
        other_indirect_pct,
        contingency_pct,
        in_kind_pct,
        bank_ltv_pct,
        interest_rate_pct,
        arrangement_fee_pct,
        fund_period_years,
        management_fee_pct,
        custodian_fee_annual,
        board_fee_annual,
        sharia_certificate_fee,
        sharia_board_fee_annual,
        legal_counsel_fee,
        auditor_fee_annual,
        valuation_fee_quarterly,
        other_reserve_pct,
        spv_formation_fee,
        structuring_fee_pct,
        operator_fee_pct,
        direct_cost_phasing,
        indirect_cost_phasing,
        revenue_phasing,
        clamped_fields: clamped,
    }
}

fn resolved(
    user: Option<Decimal>,
    auto: Option<Decimal>,
    fallback: Option<Decimal>,
) -> ResolvedValue {
    if let Some(v) = user {
        return ResolvedValue::new(v, Provenance::User);
    }
    if let Some(v) = auto {
        return ResolvedValue::new(v, Provenance::Auto);
    }
    if let Some(v) = fallback {
        return ResolvedValue::new(v, Provenance::Default);
    }
    ResolvedValue::missing()
}

fn clamp_min(rv: &mut ResolvedValue, floor: Decimal, field: &str, clamped: &mut Vec<String>) {
    if rv.value < floor {
        rv.value = floor;
        clamped.push(field.to_string());
    }
}

fn clamp_range(
    rv: &mut ResolvedValue,
    floor: Decimal,
    ceiling: Decimal,
    field: &str,
    clamped: &mut Vec<String>,
) {
    if rv.value < floor {
        rv.value = floor;
        clamped.push(field.to_string());
    } else if rv.value > ceiling {
        rv.value = ceiling;
        clamped.push(field.to_string());
    }
}

/// Resize a weight vector to `n` periods and renormalise to sum 1.
/// A vector that sums to zero becomes an even spread.
fn normalise_weights(mut weights: Vec<Decimal>, n: usize) -> Vec<Decimal> {
    weights.resize(n, Decimal::ZERO);
    for w in weights.iter_mut() {
        if *w < Decimal::ZERO {
            *w = Decimal::ZERO;
        }
    }

    let total: Decimal = weights.iter().copied().sum();
    if total.is_zero() {
        let even = Decimal::ONE / Decimal::from(n as u64);
        return vec![even; n];
    }

    weights.iter().map(|w| w / total).collect()
}

fn resolve_phasing(
    user: Option<&Vec<Decimal>>,
    default_weights: &[Decimal],
    n: usize,
) -> ResolvedPhasing {
    match user {
        Some(w) => ResolvedPhasing {
            weights: normalise_weights(w.clone(), n),
            provenance: Provenance::User,
        },
        None => ResolvedPhasing {
            weights: normalise_weights(default_weights.to_vec(), n),
            provenance: Provenance::Default,
        },
    }
}

/// Default revenue recognition: everything in the final year.
fn final_year_weights(n: usize) -> Vec<Decimal> {
    let mut w = vec![Decimal::ZERO; n];
    if let Some(last) = w.last_mut() {
        *last = Decimal::ONE;
    }
    w
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DistrictStats;
    use rust_decimal_macros::dec;

    fn sample_parcel() -> ParcelSnapshot {
        ParcelSnapshot {
            parcel_id: "1010-500".into(),
            area_sqm: Some(dec!(1000)),
            far: Some(dec!(1.5)),
            coverage_ratio: Some(dec!(0.6)),
            max_floors: Some(3),
            allowed_uses: vec!["residential".into()],
            district: Some(DistrictStats {
                district_name: "Al Hada".into(),
                avg_sale_price_per_sqm: Some(dec!(12500)),
                avg_land_price_per_sqm: Some(dec!(7000)),
            }),
        }
    }

    #[test]
    fn test_override_beats_parcel() {
        let overrides = AssumptionOverrides {
            far: Some(dec!(2.0)),
            ..Default::default()
        };
        let a = resolve_assumptions(Some(&sample_parcel()), &overrides);
        assert_eq!(a.far.value, dec!(2.0));
        assert_eq!(a.far.provenance, Provenance::User);
    }

    #[test]
    fn test_parcel_derivation_is_auto() {
        let a = resolve_assumptions(Some(&sample_parcel()), &AssumptionOverrides::default());
        assert_eq!(a.land_area_sqm.value, dec!(1000));
        assert_eq!(a.land_area_sqm.provenance, Provenance::Auto);
        assert_eq!(a.far.provenance, Provenance::Auto);
        assert_eq!(a.sale_price_per_sqm.value, dec!(12500));
        assert_eq!(a.sale_price_per_sqm.provenance, Provenance::Auto);
        assert_eq!(a.land_price_per_sqm.provenance, Provenance::Auto);
    }

    #[test]
    fn test_default_table_fills_gaps() {
        let a = resolve_assumptions(Some(&sample_parcel()), &AssumptionOverrides::default());
        assert_eq!(a.efficiency_ratio.value, dec!(0.85));
        assert_eq!(a.efficiency_ratio.provenance, Provenance::Default);
        assert_eq!(a.superstructure_cost_per_sqm.value, dec!(2500));
        assert_eq!(a.years(), 3);
    }

    #[test]
    fn test_no_parcel_no_override_is_missing() {
        let a = resolve_assumptions(None, &AssumptionOverrides::default());
        assert!(a.far.is_missing());
        assert!(a.land_area_sqm.is_missing());
        assert!(a.sale_price_per_sqm.is_missing());
        assert_eq!(a.far.value, Decimal::ZERO);
    }

    #[test]
    fn test_district_price_below_floor_ignored() {
        let mut parcel = sample_parcel();
        parcel.district = Some(DistrictStats {
            district_name: "Sparse".into(),
            avg_sale_price_per_sqm: Some(dec!(12)),
            avg_land_price_per_sqm: None,
        });
        let a = resolve_assumptions(Some(&parcel), &AssumptionOverrides::default());
        assert!(a.sale_price_per_sqm.is_missing());
        assert!(a.land_price_per_sqm.is_missing());
    }

    #[test]
    fn test_pathological_overrides_are_clamped() {
        let overrides = AssumptionOverrides {
            land_area_sqm: Some(dec!(-50)),
            in_kind_pct: Some(dec!(1.4)),
            bank_ltv_pct: Some(dec!(0.95)),
            ..Default::default()
        };
        let a = resolve_assumptions(None, &overrides);
        assert_eq!(a.land_area_sqm.value, Decimal::ZERO);
        assert_eq!(a.in_kind_pct.value, Decimal::ONE);
        assert_eq!(a.bank_ltv_pct.value, dec!(0.80));
        assert!(a.clamped_fields.contains(&"land_area_sqm".to_string()));
        assert!(a.clamped_fields.contains(&"in_kind_pct".to_string()));
        assert!(a.clamped_fields.contains(&"bank_ltv_pct".to_string()));
    }

    #[test]
    fn test_phasing_resized_to_fund_period() {
        let overrides = AssumptionOverrides {
            fund_period_years: Some(5),
            ..Default::default()
        };
        let a = resolve_assumptions(None, &overrides);
        assert_eq!(a.direct_cost_phasing.weights.len(), 5);
        assert_eq!(a.revenue_phasing.weights.len(), 5);
        let total: Decimal = a.direct_cost_phasing.weights.iter().copied().sum();
        assert!((total - Decimal::ONE).abs() < dec!(0.000000001));
        // default revenue recognition stays in the final year
        assert_eq!(a.revenue_phasing.weights[4], Decimal::ONE);
    }

    #[test]
    fn test_phasing_renormalised() {
        let overrides = AssumptionOverrides {
            direct_cost_phasing: Some(vec![dec!(2), dec!(2)]),
            ..Default::default()
        };
        let a = resolve_assumptions(None, &overrides);
        // padded to 3 years and normalised: [0.5, 0.5, 0]
        assert_eq!(a.direct_cost_phasing.weights, vec![dec!(0.5), dec!(0.5), Decimal::ZERO]);
        assert_eq!(a.direct_cost_phasing.provenance, Provenance::User);
    }

    #[test]
    fn test_zero_fund_period_clamped_to_one() {
        let overrides = AssumptionOverrides {
            fund_period_years: Some(0),
            ..Default::default()
        };
        let a = resolve_assumptions(None, &overrides);
        assert_eq!(a.years(), 1);
        assert!(a.clamped_fields.contains(&"fund_period_years".to_string()));
    }

    #[test]
    fn test_provenance_census_counts_every_parameter() {
        let a = resolve_assumptions(None, &AssumptionOverrides::default());
        let entries = a.provenance_entries();
        assert_eq!(entries.len(), 36);
        // every parameter has exactly one provenance tag
        assert!(entries.iter().all(|(name, _)| !name.is_empty()));
    }
}
