use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

use crate::engine::{compute_proforma, ProformaInput, ProformaOutput};
use crate::error::ProformaError;
use crate::resolver::AssumptionOverrides;
use crate::types::{with_metadata, ComputationOutput, Rate};
use crate::ProformaResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A named set of override deltas applied on top of the base request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioDelta {
    pub name: String,
    pub overrides: AssumptionOverrides,
}

/// One scenario's full pro-forma plus its deviation from the base run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRun {
    pub name: String,
    pub result: ProformaOutput,
    /// Scenario IRR minus base IRR; None when either is not computable
    pub irr_delta: Option<Rate>,
    pub deal_score_delta: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioBatchOutput {
    pub base: ProformaOutput,
    pub scenarios: Vec<ScenarioRun>,
}

// ---------------------------------------------------------------------------
// Batch run
// ---------------------------------------------------------------------------

/// Run the base request plus one full pro-forma per scenario delta,
/// against the same parcel snapshot.
///
/// Each scenario re-resolves from the immutable base input merged with its
/// delta, so no run observes state left by a previous one. Sensitivity
/// grids are skipped inside scenario runs; the base run keeps whatever the
/// caller requested.
pub fn run_scenarios(
    base_input: &ProformaInput,
    deltas: &[ScenarioDelta],
) -> ProformaResult<ComputationOutput<ScenarioBatchOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if deltas.is_empty() {
        return Err(ProformaError::InsufficientData(
            "At least one scenario required".into(),
        ));
    }

    let base_envelope = compute_proforma(base_input)?;
    warnings.extend(base_envelope.warnings.iter().map(|w| format!("base: {w}")));
    let base = base_envelope.result;

    let mut scenarios = Vec::with_capacity(deltas.len());
    for delta in deltas {
        let mut scenario_input = base_input.clone();
        scenario_input.overrides = merge_overrides(&base_input.overrides, &delta.overrides)?;
        scenario_input.skip_sensitivity = true;

        let envelope = compute_proforma(&scenario_input)?;
        warnings.extend(
            envelope
                .warnings
                .iter()
                .map(|w| format!("{}: {w}", delta.name)),
        );
        let result = envelope.result;

        let irr_delta = match (result.kpis.irr, base.kpis.irr) {
            (Some(scenario_irr), Some(base_irr)) => Some(scenario_irr - base_irr),
            _ => None,
        };
        let deal_score_delta = result.kpis.deal_score - base.kpis.deal_score;

        scenarios.push(ScenarioRun {
            name: delta.name.clone(),
            result,
            irr_delta,
            deal_score_delta,
        });
    }

    let output = ScenarioBatchOutput { base, scenarios };
    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Scenario Batch Analysis",
        base_input,
        warnings,
        elapsed,
        output,
    ))
}

/// Field-level merge: delta fields that are set replace the base field,
/// unset fields fall through.
fn merge_overrides(
    base: &AssumptionOverrides,
    delta: &AssumptionOverrides,
) -> ProformaResult<AssumptionOverrides> {
    let mut merged = serde_json::to_value(base)?;
    let delta_value = serde_json::to_value(delta)?;

    if let (Value::Object(base_map), Value::Object(delta_map)) = (&mut merged, delta_value) {
        for (key, value) in delta_map {
            if !value.is_null() {
                base_map.insert(key, value);
            }
        }
    }

    Ok(serde_json::from_value(merged)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_input() -> ProformaInput {
        ProformaInput {
            parcel: None,
            overrides: AssumptionOverrides {
                land_area_sqm: Some(dec!(1000)),
                far: Some(dec!(1.5)),
                efficiency_ratio: Some(dec!(1.0)),
                land_price_per_sqm: Some(dec!(7000)),
                sale_price_per_sqm: Some(dec!(12500)),
                fund_period_years: Some(3),
                ..Default::default()
            },
            skip_sensitivity: true,
            ..Default::default()
        }
    }

    fn deltas() -> Vec<ScenarioDelta> {
        vec![
            ScenarioDelta {
                name: "upside".into(),
                overrides: AssumptionOverrides {
                    sale_price_per_sqm: Some(dec!(14000)),
                    ..Default::default()
                },
            },
            ScenarioDelta {
                name: "downside".into(),
                overrides: AssumptionOverrides {
                    sale_price_per_sqm: Some(dec!(10000)),
                    ..Default::default()
                },
            },
        ]
    }

    #[test]
    fn test_one_result_per_scenario() {
        let batch = run_scenarios(&base_input(), &deltas()).unwrap();
        let out = &batch.result;
        assert_eq!(out.scenarios.len(), 2);
        assert_eq!(out.scenarios[0].name, "upside");
        assert_eq!(out.scenarios[1].name, "downside");
    }

    #[test]
    fn test_deltas_move_irr_in_the_right_direction() {
        let batch = run_scenarios(&base_input(), &deltas()).unwrap();
        let out = &batch.result;
        assert!(out.scenarios[0].irr_delta.unwrap() > Decimal::ZERO);
        assert!(out.scenarios[1].irr_delta.unwrap() < Decimal::ZERO);
    }

    #[test]
    fn test_scenario_isolation() {
        // the downside run must not see the upside override
        let batch = run_scenarios(&base_input(), &deltas()).unwrap();
        let out = &batch.result;
        assert_eq!(
            out.scenarios[1].result.inputs_used.sale_price_per_sqm.value,
            dec!(10000)
        );
        // and the base is untouched by both
        assert_eq!(out.base.inputs_used.sale_price_per_sqm.value, dec!(12500));
    }

    #[test]
    fn test_unset_delta_fields_inherit_base() {
        let batch = run_scenarios(&base_input(), &deltas()).unwrap();
        let out = &batch.result;
        assert_eq!(
            out.scenarios[0].result.inputs_used.land_price_per_sqm.value,
            dec!(7000)
        );
    }

    #[test]
    fn test_empty_batch_rejected() {
        assert!(run_scenarios(&base_input(), &[]).is_err());
    }
}
