use proforma_core::engine::{compute_proforma, ProformaInput};
use proforma_core::resolver::AssumptionOverrides;
use proforma_core::sensitivity::SensitivityInput;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Sensitivity grid tests — dimensions, base anchoring, bounds
// ===========================================================================

fn grid_input() -> ProformaInput {
    ProformaInput {
        overrides: AssumptionOverrides {
            land_area_sqm: Some(dec!(1000)),
            far: Some(dec!(1.5)),
            efficiency_ratio: Some(dec!(1.0)),
            land_price_per_sqm: Some(dec!(7000)),
            sale_price_per_sqm: Some(dec!(12500)),
            fund_period_years: Some(3),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[test]
fn test_grid_dimensions_match_requested_steps() {
    let mut input = grid_input();
    input.sensitivity = Some(SensitivityInput {
        sale_price_steps: 7,
        construction_cost_steps: 3,
        ..Default::default()
    });
    let grid = compute_proforma(&input)
        .unwrap()
        .result
        .sensitivity
        .unwrap();

    assert_eq!(grid.sale_price_axis.len(), 7);
    assert_eq!(grid.construction_cost_axis.len(), 3);
    assert_eq!(grid.irr_matrix.len(), 7);
    assert!(grid.irr_matrix.iter().all(|row| row.len() == 3));
}

#[test]
fn test_center_cell_matches_base_irr() {
    let result = compute_proforma(&grid_input()).unwrap().result;
    let grid = result.sensitivity.as_ref().unwrap();
    let base_irr = result.kpis.irr.unwrap();

    let (row, col) = grid.base_position;
    let center = grid.irr_matrix[row][col].expect("center cell should solve");
    assert!(
        (center - base_irr).abs() < dec!(0.000001),
        "center {center} vs base {base_irr}"
    );
}

#[test]
fn test_grid_irr_monotonic_in_both_axes() {
    let grid = compute_proforma(&grid_input())
        .unwrap()
        .result
        .sensitivity
        .unwrap();

    // along sale price (rows), holding cost fixed
    for col in 0..grid.construction_cost_axis.len() {
        for pair in grid.irr_matrix.windows(2) {
            if let (Some(lower), Some(upper)) = (pair[0][col], pair[1][col]) {
                assert!(upper > lower);
            }
        }
    }

    // along construction cost (cols), holding sale price fixed
    for row in &grid.irr_matrix {
        for j in 0..row.len() - 1 {
            if let (Some(cheap), Some(dear)) = (row[j], row[j + 1]) {
                assert!(cheap > dear);
            }
        }
    }
}

#[test]
fn test_oversized_grid_rejected_at_boundary() {
    let mut input = grid_input();
    input.sensitivity = Some(SensitivityInput {
        sale_price_steps: 100,
        ..Default::default()
    });
    assert!(compute_proforma(&input).is_err());
}

#[test]
fn test_infeasible_cells_are_null_not_errors() {
    // land so expensive that even the optimistic cells stay under water:
    // the downside corner produces deeply negative or unsolvable cells
    let mut input = grid_input();
    input.overrides.land_price_per_sqm = Some(dec!(100000));
    input.overrides.sale_price_per_sqm = Some(dec!(500));

    let result = compute_proforma(&input).unwrap().result;
    let grid = result.sensitivity.unwrap();

    // the sweep completed with full dimensions regardless of solvability
    assert_eq!(grid.irr_matrix.len(), 5);
    assert!(grid.irr_matrix.iter().all(|row| row.len() == 5));
}

#[test]
fn test_base_run_unaffected_by_grid_size() {
    let small = compute_proforma(&grid_input()).unwrap().result;

    let mut input = grid_input();
    input.sensitivity = Some(SensitivityInput {
        sale_price_steps: 9,
        construction_cost_steps: 9,
        ..Default::default()
    });
    let large = compute_proforma(&input).unwrap().result;

    assert_eq!(small.kpis.irr, large.kpis.irr);
    assert_eq!(
        small.capital_structure.total_fund_size,
        large.capital_structure.total_fund_size
    );
}
