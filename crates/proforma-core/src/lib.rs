pub mod capital;
pub mod cashflow;
pub mod costs;
pub mod engine;
pub mod error;
pub mod health;
pub mod metrics;
pub mod resolver;
pub mod sensitivity;
pub mod time_value;
pub mod types;

#[cfg(feature = "scenarios")]
pub mod scenarios;

pub use engine::{compute_proforma, ProformaInput, ProformaOutput};
pub use error::ProformaError;
pub use types::*;

/// Standard result type for all engine operations
pub type ProformaResult<T> = Result<T, ProformaError>;
