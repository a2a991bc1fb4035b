use serde_json::Value;
use std::io;

/// Write output as CSV to stdout.
///
/// A pro-forma envelope emits the yearly cash-flow schedule; sensitivity
/// output emits the IRR matrix with axis headers; anything else becomes
/// field/value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    if let Some(obj) = value.as_object() {
        if let Some(years) = obj
            .get("result")
            .and_then(|r| r.get("cash_flows"))
            .and_then(|cf| cf.get("years"))
            .and_then(Value::as_array)
        {
            write_schedule_csv(&mut wtr, years);
            let _ = wtr.flush();
            return;
        }
        if let Some(grid) = obj.get("grid").and_then(Value::as_object) {
            write_grid_csv(&mut wtr, grid);
            let _ = wtr.flush();
            return;
        }
        if let Some(result) = obj.get("result").and_then(Value::as_object) {
            write_flat_csv(&mut wtr, result);
            let _ = wtr.flush();
            return;
        }
        write_flat_csv(&mut wtr, obj);
    }

    let _ = wtr.flush();
}

fn write_schedule_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, years: &[Value]) {
    let columns = [
        "year",
        "inflow_sales",
        "outflow_land",
        "outflow_direct",
        "outflow_indirect",
        "outflow_interest",
        "outflow_fees",
        "outflow_total",
        "net",
        "cumulative",
    ];
    let _ = wtr.write_record(columns);

    for year in years {
        if let Some(map) = year.as_object() {
            let row: Vec<String> = columns
                .iter()
                .map(|c| map.get(*c).map(format_csv_value).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
}

fn write_grid_csv(
    wtr: &mut csv::Writer<io::StdoutLock<'_>>,
    grid: &serde_json::Map<String, Value>,
) {
    let sale_axis = grid
        .get("sale_price_axis")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let cost_axis = grid
        .get("construction_cost_axis")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let matrix = grid
        .get("irr_matrix")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut header = vec!["sale_price".to_string()];
    header.extend(cost_axis.iter().map(format_csv_value));
    let _ = wtr.write_record(&header);

    for (i, row) in matrix.iter().enumerate() {
        let mut record = vec![sale_axis.get(i).map(format_csv_value).unwrap_or_default()];
        if let Some(cells) = row.as_array() {
            record.extend(cells.iter().map(format_csv_value));
        }
        let _ = wtr.write_record(&record);
    }
}

fn write_flat_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, map: &serde_json::Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
