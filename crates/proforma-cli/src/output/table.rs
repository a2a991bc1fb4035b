use serde_json::Value;
use tabled::{builder::Builder, Table};

/// Format output as tables using the tabled crate.
///
/// Pro-forma envelopes get dedicated KPI, capital-structure and cash-flow
/// tables; sensitivity output gets a matrix table; anything else falls
/// back to a flat field/value listing.
pub fn print_table(value: &Value) {
    if let Some(obj) = value.as_object() {
        if let Some(result) = obj.get("result") {
            print_result(result);
            print_envelope_footer(obj);
            return;
        }
        if let Some(grid) = obj.get("grid") {
            print_grid(grid);
            if let Some(Value::Array(warnings)) = obj.get("warnings") {
                print_warning_list(warnings);
            }
            return;
        }
    }

    print_flat_object(value);
}

fn print_result(result: &Value) {
    let Some(obj) = result.as_object() else {
        print_flat_object(result);
        return;
    };

    // Scenario batch: base plus one block per scenario
    if let (Some(base), Some(Value::Array(scenarios))) = (obj.get("base"), obj.get("scenarios")) {
        println!("Base case:");
        print_result(base);
        for scenario in scenarios {
            if let Some(s) = scenario.as_object() {
                let name = s.get("name").and_then(Value::as_str).unwrap_or("scenario");
                println!("\nScenario: {name}");
                if let Some(kpis) = s.get("result").and_then(|r| r.get("kpis")) {
                    print_section("KPIs", kpis);
                }
            }
        }
        return;
    }

    if let Some(kpis) = obj.get("kpis") {
        print_section("KPIs", kpis);
    }
    if let Some(capital) = obj.get("capital_structure") {
        print_section("Capital structure", capital);
    }
    if let Some(years) = obj
        .get("cash_flows")
        .and_then(|cf| cf.get("years"))
        .and_then(Value::as_array)
    {
        print_cash_flow_table(years);
    }
    if let Some(health) = obj.get("data_health") {
        print_section("Data health", health);
    }
    if let Some(grid) = obj.get("sensitivity") {
        if !grid.is_null() {
            print_grid(grid);
        }
    }

    if !obj.contains_key("kpis") {
        print_flat_object(result);
    }
}

fn print_section(title: &str, value: &Value) {
    let Some(map) = value.as_object() else {
        return;
    };
    println!("\n{title}:");
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_cash_flow_table(years: &[Value]) {
    println!("\nCash flows:");
    let columns = [
        "year",
        "inflow_sales",
        "outflow_land",
        "outflow_direct",
        "outflow_indirect",
        "outflow_interest",
        "outflow_fees",
        "net",
        "cumulative",
    ];

    let mut builder = Builder::default();
    builder.push_record(columns);
    for year in years {
        if let Some(map) = year.as_object() {
            let row: Vec<String> = columns
                .iter()
                .map(|c| map.get(*c).map(format_value).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }
    }
    println!("{}", Table::from(builder));
}

fn print_grid(grid: &Value) {
    let Some(obj) = grid.as_object() else {
        return;
    };
    let sale_axis = obj
        .get("sale_price_axis")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let cost_axis = obj
        .get("construction_cost_axis")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let matrix = obj
        .get("irr_matrix")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    println!("\nIRR sensitivity (rows: sale price, columns: construction cost):");
    let mut builder = Builder::default();

    let mut header = vec!["sale \\ cost".to_string()];
    header.extend(cost_axis.iter().map(format_value));
    builder.push_record(header);

    for (i, row) in matrix.iter().enumerate() {
        let mut record = vec![sale_axis.get(i).map(format_value).unwrap_or_default()];
        if let Some(cells) = row.as_array() {
            record.extend(cells.iter().map(format_value));
        }
        builder.push_record(record);
    }
    println!("{}", Table::from(builder));
}

fn print_envelope_footer(envelope: &serde_json::Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        print_warning_list(warnings);
    }
    if let Some(Value::String(methodology)) = envelope.get("methodology") {
        println!("\nMethodology: {}", methodology);
    }
}

fn print_warning_list(warnings: &[Value]) {
    if warnings.is_empty() {
        return;
    }
    println!("\nWarnings:");
    for w in warnings {
        if let Value::String(s) = w {
            println!("  - {}", s);
        }
    }
}

fn print_flat_object(value: &Value) {
    if let Some(map) = value.as_object() {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        println!("{}", Table::from(builder));
    } else {
        println!("{}", value);
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
