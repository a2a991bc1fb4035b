use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::resolver::AssumptionSet;
use crate::types::Provenance;

/// Census of where the computation's inputs actually came from.
///
/// Confidence counts only values grounded in real data (parcel-derived or
/// caller-supplied); defaults and sentinels dilute it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataHealth {
    pub auto_count: usize,
    pub user_count: usize,
    pub default_count: usize,
    pub missing_count: usize,
    pub total_params: usize,
    /// (auto + user) / total × 100, rounded to one decimal place
    pub confidence_pct: Decimal,
    pub missing_fields: Vec<String>,
}

pub fn score_data_health(a: &AssumptionSet) -> DataHealth {
    let entries = a.provenance_entries();

    let mut auto_count = 0;
    let mut user_count = 0;
    let mut default_count = 0;
    let mut missing_count = 0;
    let mut missing_fields = Vec::new();

    for (name, provenance) in &entries {
        match provenance {
            Provenance::Auto => auto_count += 1,
            Provenance::User => user_count += 1,
            Provenance::Default => default_count += 1,
            Provenance::Missing => {
                missing_count += 1;
                missing_fields.push((*name).to_string());
            }
        }
    }

    let total_params = entries.len();
    let confidence_pct = if total_params == 0 {
        Decimal::ZERO
    } else {
        (Decimal::from((auto_count + user_count) as u64) / Decimal::from(total_params as u64)
            * dec!(100))
        .round_dp(1)
    };

    DataHealth {
        auto_count,
        user_count,
        default_count,
        missing_count,
        total_params,
        confidence_pct,
        missing_fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{resolve_assumptions, AssumptionOverrides};
    use crate::types::{DistrictStats, ParcelSnapshot};
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults_only_run_has_low_confidence() {
        let a = resolve_assumptions(None, &AssumptionOverrides::default());
        let health = score_data_health(&a);

        assert_eq!(health.auto_count, 0);
        assert_eq!(health.user_count, 0);
        // area, FAR, land price, sale price have no defaults
        assert_eq!(health.missing_count, 4);
        assert_eq!(health.confidence_pct, Decimal::ZERO);
        assert!(health.missing_fields.contains(&"far".to_string()));
        assert!(health
            .missing_fields
            .contains(&"sale_price_per_sqm".to_string()));
    }

    #[test]
    fn test_parcel_raises_confidence() {
        let parcel = ParcelSnapshot {
            parcel_id: "p-1".into(),
            area_sqm: Some(dec!(1000)),
            far: Some(dec!(1.5)),
            coverage_ratio: None,
            max_floors: None,
            allowed_uses: vec![],
            district: Some(DistrictStats {
                district_name: "Al Malqa".into(),
                avg_sale_price_per_sqm: Some(dec!(11000)),
                avg_land_price_per_sqm: Some(dec!(6500)),
            }),
        };
        let a = resolve_assumptions(Some(&parcel), &AssumptionOverrides::default());
        let health = score_data_health(&a);

        assert_eq!(health.auto_count, 4);
        assert_eq!(health.missing_count, 0);
        assert!(health.confidence_pct > Decimal::ZERO);
        assert!(health.missing_fields.is_empty());
    }

    #[test]
    fn test_counts_sum_to_total() {
        let overrides = AssumptionOverrides {
            sale_price_per_sqm: Some(dec!(12000)),
            ..Default::default()
        };
        let a = resolve_assumptions(None, &overrides);
        let health = score_data_health(&a);
        assert_eq!(
            health.auto_count + health.user_count + health.default_count + health.missing_count,
            health.total_params
        );
        assert_eq!(health.user_count, 1);
    }
}
