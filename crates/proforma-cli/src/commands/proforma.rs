use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use proforma_core::engine::{compute_proforma, ProformaInput};
use proforma_core::scenarios::{run_scenarios, ScenarioDelta};
use proforma_core::sensitivity::SensitivityInput;

use crate::input;

/// Arguments for a full pro-forma computation
#[derive(Args)]
pub struct ComputeArgs {
    /// Path to a JSON or YAML request file
    #[arg(long)]
    pub input: Option<String>,
    /// Skip the sensitivity grid
    #[arg(long)]
    pub skip_sensitivity: bool,
}

/// Arguments for a standalone sensitivity grid
#[derive(Args)]
pub struct SensitivityArgs {
    /// Path to a JSON or YAML request file
    #[arg(long)]
    pub input: Option<String>,
    /// Steps per axis (applies to both axes)
    #[arg(long)]
    pub steps: Option<usize>,
    /// Axis half-width as a fraction of the base value (e.g. 0.2 = ±20%)
    #[arg(long)]
    pub span: Option<Decimal>,
}

/// Arguments for a scenario batch
#[derive(Args)]
pub struct ScenariosArgs {
    /// Path to a JSON or YAML file holding the base request plus a
    /// `scenarios` list of named override deltas
    #[arg(long)]
    pub input: Option<String>,
}

/// Scenario batch file: a base request with a list of named deltas.
#[derive(Deserialize)]
struct ScenarioRequest {
    #[serde(flatten)]
    base: ProformaInput,
    #[serde(default)]
    scenarios: Vec<ScenarioDelta>,
}

pub fn run_compute(args: ComputeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request: ProformaInput = read_request(args.input.as_deref())?;
    if args.skip_sensitivity {
        request.skip_sensitivity = true;
    }
    let result = compute_proforma(&request)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_sensitivity_grid(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request: ProformaInput = read_request(args.input.as_deref())?;

    let mut grid_input = request.sensitivity.clone().unwrap_or_default();
    if let Some(steps) = args.steps {
        grid_input.sale_price_steps = steps;
        grid_input.construction_cost_steps = steps;
    }
    if let Some(span) = args.span {
        grid_input.sale_price_span = span;
        grid_input.construction_cost_span = span;
    }
    request.sensitivity = Some(grid_input);
    request.skip_sensitivity = false;

    let result = compute_proforma(&request)?;
    let grid = result
        .result
        .sensitivity
        .ok_or("sensitivity grid could not be built for this request")?;

    Ok(json!({
        "base_irr": result.result.kpis.irr,
        "grid": grid,
        "warnings": result.warnings,
    }))
}

pub fn run_scenario_batch(args: ScenariosArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: ScenarioRequest = read_request(args.input.as_deref())?;
    if request.scenarios.is_empty() {
        return Err("request file must include a non-empty 'scenarios' list".into());
    }
    let result = run_scenarios(&request.base, &request.scenarios)?;
    Ok(serde_json::to_value(result)?)
}

/// Load a typed request from `--input <file>` or piped stdin.
fn read_request<T: serde::de::DeserializeOwned>(
    path: Option<&str>,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return input::file::read_request(path);
    }
    if let Some(data) = input::stdin::read_stdin()? {
        return Ok(serde_json::from_value(data)?);
    }
    Err("--input <file.json|file.yaml> or piped stdin required".into())
}
