use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::capital::{build_capital_structure, CapitalStructure, FundFeeBreakdown};
use crate::cashflow::{project_cash_flows, CashFlowSchedule};
use crate::costs::{compute_costs, CostRevenue};
use crate::health::{score_data_health, DataHealth};
use crate::metrics::{calculate_metrics, KpiSet, RiskThresholds, ScoringConfig};
use crate::resolver::{resolve_assumptions, AssumptionOverrides, AssumptionSet};
use crate::sensitivity::{run_sensitivity, SensitivityGrid, SensitivityInput};
use crate::types::{with_metadata, ComputationOutput, ParcelSnapshot};
use crate::ProformaResult;

// ---------------------------------------------------------------------------
// Boundary contract
// ---------------------------------------------------------------------------

/// One feasibility request: an optional parcel snapshot plus partial
/// overrides. Policy knobs (scoring bands, risk thresholds, grid shape)
/// ride along; they default when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProformaInput {
    pub parcel: Option<ParcelSnapshot>,
    #[serde(default)]
    pub overrides: AssumptionOverrides,
    #[serde(default)]
    pub sensitivity: Option<SensitivityInput>,
    #[serde(default)]
    pub skip_sensitivity: bool,
    #[serde(default)]
    pub scoring: Option<ScoringConfig>,
    #[serde(default)]
    pub risk_thresholds: Option<RiskThresholds>,
}

/// The complete pro-forma bundle. Fully populated on every successful
/// run; `null` KPI fields mean "not computable", never "absent".
/// Immutable once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProformaOutput {
    /// Every resolved input with its provenance tag
    pub inputs_used: AssumptionSet,
    pub cost_revenue: CostRevenue,
    pub fund_fees: FundFeeBreakdown,
    pub capital_structure: CapitalStructure,
    pub cash_flows: CashFlowSchedule,
    pub kpis: KpiSet,
    pub sensitivity: Option<SensitivityGrid>,
    pub data_health: DataHealth,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run the full pipeline: resolve → costs → capital → cash flows →
/// metrics → sensitivity → data health. Deterministic and side-effect
/// free; a null parcel means "proceed with defaults only" and shows up as
/// reduced confidence rather than an error.
pub fn compute_proforma(
    input: &ProformaInput,
) -> ProformaResult<ComputationOutput<ProformaOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let assumptions = resolve_assumptions(input.parcel.as_ref(), &input.overrides);

    if !assumptions.clamped_fields.is_empty() {
        warnings.push(format!(
            "Overrides clamped into the valid domain: {}",
            assumptions.clamped_fields.join(", ")
        ));
    }

    let cost_revenue = compute_costs(&assumptions);

    if cost_revenue.construction.buildable_area_sqm.is_zero() {
        warnings.push(
            "Zero buildable area (parcel area or FAR unresolved) — projection covers costs only"
                .into(),
        );
    }

    let (fund_fees, capital_structure) = build_capital_structure(&assumptions, &cost_revenue)?;
    let cash_flows = project_cash_flows(&assumptions, &cost_revenue, &fund_fees, &capital_structure);

    let scoring = input.scoring.clone().unwrap_or_default();
    let thresholds = input.risk_thresholds.clone().unwrap_or_default();
    let kpis = calculate_metrics(
        &assumptions,
        &cost_revenue,
        &fund_fees,
        &capital_structure,
        &cash_flows,
        &scoring,
        &thresholds,
    );

    let sensitivity = if input.skip_sensitivity {
        None
    } else {
        let cost_base = assumptions.infrastructure_cost_per_sqm.value
            + assumptions.superstructure_cost_per_sqm.value;
        if cost_base.is_zero() {
            warnings.push("Construction cost base is zero — sensitivity grid skipped".into());
            None
        } else {
            if assumptions.sale_price_per_sqm.value <= Decimal::ZERO {
                warnings.push(
                    "Sale price unresolved — sensitivity grid centred on a fallback price".into(),
                );
            }
            let grid_input = input.sensitivity.clone().unwrap_or_default();
            Some(run_sensitivity(&assumptions, &grid_input)?)
        }
    };

    let data_health = score_data_health(&assumptions);
    if !data_health.missing_fields.is_empty() {
        warnings.push(format!(
            "Unresolved parameters substituted with zero: {}",
            data_health.missing_fields.join(", ")
        ));
    }

    let output = ProformaOutput {
        inputs_used: assumptions,
        cost_revenue,
        fund_fees,
        capital_structure,
        cash_flows,
        kpis,
        sensitivity,
        data_health,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Development Feasibility Pro-Forma (Fund Model)",
        input,
        warnings,
        elapsed,
        output,
    ))
}
