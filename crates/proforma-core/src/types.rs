use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Source of a resolved assumption value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Derived from the parcel snapshot (zoning regulations, district stats)
    Auto,
    /// Supplied by the caller as an override
    User,
    /// Taken from the engine default table
    Default,
    /// No source resolvable; a zero sentinel was substituted
    Missing,
}

/// A parameter value tagged with where it came from. Carried through the
/// whole pipeline so downstream consumers never need side-channel lookups
/// to judge whether a number is real.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResolvedValue {
    pub value: Decimal,
    pub provenance: Provenance,
}

impl ResolvedValue {
    pub fn new(value: Decimal, provenance: Provenance) -> Self {
        Self { value, provenance }
    }

    /// Zero sentinel with `Missing` provenance. Keeps downstream arithmetic
    /// total; the gap is surfaced by the data-health scorer instead.
    pub fn missing() -> Self {
        Self {
            value: Decimal::ZERO,
            provenance: Provenance::Missing,
        }
    }

    pub fn is_missing(&self) -> bool {
        self.provenance == Provenance::Missing
    }
}

/// A per-year weight vector with its provenance (cost or revenue phasing).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedPhasing {
    pub weights: Vec<Decimal>,
    pub provenance: Provenance,
}

/// District market statistics attached to a parcel snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistrictStats {
    pub district_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_sale_price_per_sqm: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_land_price_per_sqm: Option<Money>,
}

/// Read-only parcel attributes delivered by the zoning backend.
///
/// Owned by the caller and passed by reference; the engine never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParcelSnapshot {
    pub parcel_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_sqm: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub far: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage_ratio: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_floors: Option<u32>,
    #[serde(default)]
    pub allowed_uses: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<DistrictStats>,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
