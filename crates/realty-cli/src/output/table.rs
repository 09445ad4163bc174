use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{flatten_row, format_value, primary_series, result_of};

/// Scalar fields as a Field/Value table, then the primary series, then
/// warnings and methodology from the envelope.
pub fn print_table(value: &Value) {
    match result_of(value) {
        Value::Object(result) => {
            print_fields(result);
            if let Some((key, rows)) = primary_series(result) {
                println!("\n{key}:");
                print_rows(rows);
            }
        }
        Value::Array(rows) => print_rows(rows),
        other => println!("{}", format_value(other)),
    }

    let Some(envelope) = value.as_object() else {
        return;
    };
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {w}");
            }
        }
    }
    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {meth}");
    }
}

fn print_fields(result: &Map<String, Value>) {
    let mut flat = Vec::new();
    for (key, val) in result {
        if !val.is_array() {
            flatten_row(key, val, &mut flat);
        }
    }
    if flat.is_empty() {
        return;
    }
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in &flat {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(rows: &[Value]) {
    if rows.is_empty() {
        println!("(empty)");
        return;
    }
    let flattened: Vec<Vec<(String, Value)>> = rows
        .iter()
        .map(|row| {
            let mut flat = Vec::new();
            flatten_row("", row, &mut flat);
            flat
        })
        .collect();

    let mut builder = Builder::default();
    builder.push_record(flattened[0].iter().map(|(k, _)| k.clone()));
    for row in &flattened {
        builder.push_record(row.iter().map(|(_, v)| format_value(v)));
    }
    println!("{}", Table::from(builder));
}
