use serde_json::Value;

/// Print just the headline answer from the output.
///
/// For a pro-forma that is the IRR, then the deal score; for a
/// sensitivity run, the base IRR.
pub fn print_minimal(value: &Value) {
    // Sensitivity output carries its headline at the top level
    if let Some(base_irr) = value.get("base_irr") {
        println!("{}", format_minimal(base_irr));
        return;
    }

    let kpis = value
        .get("result")
        .and_then(|r| r.get("kpis"))
        .or_else(|| value.get("result").and_then(|r| r.get("base")).and_then(|b| b.get("kpis")));

    let priority_keys = ["irr", "deal_score", "equity_net_profit", "yield_on_cost"];

    if let Some(Value::Object(map)) = kpis {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }
    }

    // Fall back to the raw value
    println!("{}", format_minimal(value));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
