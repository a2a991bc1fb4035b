use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::capital::build_capital_structure;
use crate::cashflow::project_cash_flows;
use crate::costs::compute_costs;
use crate::error::ProformaError;
use crate::resolver::AssumptionSet;
use crate::time_value;
use crate::types::{Money, Rate};
use crate::ProformaResult;

/// Hard cap on grid resolution: a pathological grid size is not
/// self-limiting, so it is bounded at the request boundary.
pub const MAX_STEPS_PER_AXIS: usize = 25;

/// Grid centre when the base sale price is unresolved.
const FALLBACK_BASE_SALE_PRICE: Decimal = dec!(10000);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Grid request: steps and fractional half-width per axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensitivityInput {
    pub sale_price_steps: usize,
    pub construction_cost_steps: usize,
    /// Axis half-width as a fraction of the base value (0.20 = ±20%)
    pub sale_price_span: Decimal,
    pub construction_cost_span: Decimal,
}

impl Default for SensitivityInput {
    fn default() -> Self {
        Self {
            sale_price_steps: 5,
            construction_cost_steps: 5,
            sale_price_span: dec!(0.20),
            construction_cost_span: dec!(0.20),
        }
    }
}

/// Two-dimensional IRR surface over sale price and construction cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityGrid {
    /// Strictly increasing sale prices per m²
    pub sale_price_axis: Vec<Money>,
    /// Strictly increasing combined (infrastructure + superstructure)
    /// cost per m²
    pub construction_cost_axis: Vec<Money>,
    /// irr_matrix[i][j] = IRR at sale_price_axis[i] × construction_cost_axis[j];
    /// None where the cell admits no real IRR
    pub irr_matrix: Vec<Vec<Option<Rate>>>,
    /// (row, col) of the cell closest to the base case
    pub base_position: (usize, usize),
}

// ---------------------------------------------------------------------------
// Sweep
// ---------------------------------------------------------------------------

/// Re-run the cost → cash-flow → IRR pipeline across the grid.
///
/// Each cell is an independent pure recomputation from the immutable base
/// set; nothing is shared between cells, so the sweep could be evaluated
/// in any order or concurrently without coordination.
pub fn run_sensitivity(
    base: &AssumptionSet,
    input: &SensitivityInput,
) -> ProformaResult<SensitivityGrid> {
    validate_axis("sale_price_steps", input.sale_price_steps, input.sale_price_span)?;
    validate_axis(
        "construction_cost_steps",
        input.construction_cost_steps,
        input.construction_cost_span,
    )?;

    let base_sale = if base.sale_price_per_sqm.value > Decimal::ZERO {
        base.sale_price_per_sqm.value
    } else {
        FALLBACK_BASE_SALE_PRICE
    };
    let base_cost =
        base.infrastructure_cost_per_sqm.value + base.superstructure_cost_per_sqm.value;

    let sale_price_axis = linspace(base_sale, input.sale_price_span, input.sale_price_steps);
    let cost_multipliers = linspace(
        Decimal::ONE,
        input.construction_cost_span,
        input.construction_cost_steps,
    );
    let construction_cost_axis: Vec<Money> =
        cost_multipliers.iter().map(|m| base_cost * m).collect();

    let mut irr_matrix = Vec::with_capacity(sale_price_axis.len());
    for sale_price in &sale_price_axis {
        let mut row = Vec::with_capacity(cost_multipliers.len());
        for multiplier in &cost_multipliers {
            row.push(cell_irr(base, *sale_price, *multiplier));
        }
        irr_matrix.push(row);
    }

    let base_position = (
        closest_index(&sale_price_axis, base_sale),
        closest_index(&construction_cost_axis, base_cost),
    );

    Ok(SensitivityGrid {
        sale_price_axis,
        construction_cost_axis,
        irr_matrix,
        base_position,
    })
}

/// IRR of the base assumption set with the sale price replaced and the
/// per-m² construction rates scaled. Pure function of its arguments;
/// this is the unit of work for one grid cell.
pub fn cell_irr(base: &AssumptionSet, sale_price: Money, cost_multiplier: Decimal) -> Option<Rate> {
    let mut cell = base.clone();
    cell.sale_price_per_sqm.value = sale_price;
    cell.infrastructure_cost_per_sqm.value *= cost_multiplier;
    cell.superstructure_cost_per_sqm.value *= cost_multiplier;

    let cr = compute_costs(&cell);
    let (fees, cap) = build_capital_structure(&cell, &cr).ok()?;
    let schedule = project_cash_flows(&cell, &cr, &fees, &cap);
    time_value::irr(&schedule.net_flows())
}

fn validate_axis(field: &str, steps: usize, span: Decimal) -> ProformaResult<()> {
    if steps == 0 || steps > MAX_STEPS_PER_AXIS {
        return Err(ProformaError::InvalidInput {
            field: field.into(),
            reason: format!("steps must be between 1 and {MAX_STEPS_PER_AXIS}"),
        });
    }
    if steps > 1 && (span <= Decimal::ZERO || span >= Decimal::ONE) {
        return Err(ProformaError::InvalidInput {
            field: field.into(),
            reason: "span must be strictly between 0 and 1".into(),
        });
    }
    Ok(())
}

/// Evenly spaced values across base × (1 ± span). Strictly increasing for
/// a positive base.
fn linspace(base: Decimal, span: Decimal, steps: usize) -> Vec<Decimal> {
    if steps == 1 {
        return vec![base];
    }
    let lo = base * (Decimal::ONE - span);
    let hi = base * (Decimal::ONE + span);
    let step = (hi - lo) / Decimal::from((steps - 1) as u64);
    (0..steps)
        .map(|i| lo + step * Decimal::from(i as u64))
        .collect()
}

/// Index of the axis value closest to a target.
fn closest_index(values: &[Decimal], target: Decimal) -> usize {
    values
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| (**v - target).abs())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{resolve_assumptions, AssumptionOverrides};
    use rust_decimal_macros::dec;

    fn base_assumptions() -> AssumptionSet {
        let overrides = AssumptionOverrides {
            land_area_sqm: Some(dec!(1000)),
            far: Some(dec!(1.5)),
            efficiency_ratio: Some(dec!(1.0)),
            land_price_per_sqm: Some(dec!(7000)),
            sale_price_per_sqm: Some(dec!(12500)),
            fund_period_years: Some(3),
            ..Default::default()
        };
        resolve_assumptions(None, &overrides)
    }

    #[test]
    fn test_default_grid_dimensions() {
        let grid = run_sensitivity(&base_assumptions(), &SensitivityInput::default()).unwrap();
        assert_eq!(grid.sale_price_axis.len(), 5);
        assert_eq!(grid.construction_cost_axis.len(), 5);
        assert_eq!(grid.irr_matrix.len(), 5);
        assert!(grid.irr_matrix.iter().all(|row| row.len() == 5));
    }

    #[test]
    fn test_axes_strictly_increasing() {
        let grid = run_sensitivity(&base_assumptions(), &SensitivityInput::default()).unwrap();
        for axis in [&grid.sale_price_axis, &grid.construction_cost_axis] {
            for pair in axis.windows(2) {
                assert!(pair[0] < pair[1], "axis not strictly increasing: {axis:?}");
            }
        }
    }

    #[test]
    fn test_center_cell_matches_base_run() {
        let base = base_assumptions();
        let grid = run_sensitivity(&base, &SensitivityInput::default()).unwrap();

        let (row, col) = grid.base_position;
        assert_eq!((row, col), (2, 2));
        assert_eq!(grid.sale_price_axis[row], dec!(12500));

        let base_irr = cell_irr(&base, dec!(12500), Decimal::ONE).unwrap();
        let center = grid.irr_matrix[row][col].unwrap();
        assert!((center - base_irr).abs() < dec!(0.000001));
    }

    #[test]
    fn test_irr_increases_with_sale_price() {
        let grid = run_sensitivity(&base_assumptions(), &SensitivityInput::default()).unwrap();
        let col = 2;
        for pair in grid.irr_matrix.windows(2) {
            if let (Some(lower), Some(upper)) = (pair[0][col], pair[1][col]) {
                assert!(upper > lower, "IRR should rise with sale price");
            }
        }
    }

    #[test]
    fn test_irr_decreases_with_construction_cost() {
        let grid = run_sensitivity(&base_assumptions(), &SensitivityInput::default()).unwrap();
        let row = 2;
        for j in 0..grid.irr_matrix[row].len() - 1 {
            if let (Some(cheap), Some(dear)) =
                (grid.irr_matrix[row][j], grid.irr_matrix[row][j + 1])
            {
                assert!(cheap > dear, "IRR should fall with construction cost");
            }
        }
    }

    #[test]
    fn test_oversized_grid_rejected() {
        let oversized = SensitivityInput {
            sale_price_steps: 26,
            ..Default::default()
        };
        assert!(run_sensitivity(&base_assumptions(), &oversized).is_err());
    }

    #[test]
    fn test_zero_span_rejected() {
        let flat = SensitivityInput {
            sale_price_span: Decimal::ZERO,
            ..Default::default()
        };
        assert!(run_sensitivity(&base_assumptions(), &flat).is_err());
    }

    #[test]
    fn test_cell_isolation() {
        // running a cell does not disturb the base set
        let base = base_assumptions();
        let before = base.sale_price_per_sqm.value;
        let _ = cell_irr(&base, dec!(20000), dec!(1.2));
        assert_eq!(base.sale_price_per_sqm.value, before);
    }

    #[test]
    fn test_fallback_sale_price_when_unresolved() {
        let overrides = AssumptionOverrides {
            land_area_sqm: Some(dec!(1000)),
            far: Some(dec!(1.5)),
            land_price_per_sqm: Some(dec!(7000)),
            ..Default::default()
        };
        let base = resolve_assumptions(None, &overrides);
        let grid = run_sensitivity(&base, &SensitivityInput::default()).unwrap();
        let (row, _) = grid.base_position;
        assert_eq!(grid.sale_price_axis[row], dec!(10000));
    }
}
