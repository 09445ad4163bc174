use serde_json::Value;

use super::{format_value, result_of};

/// Headline fields in order of priority. Object-valued fields print their
/// own headline (an IRR solution prints its rate).
const PRIORITY_KEYS: [&str; 10] = [
    "rate",
    "irr",
    "expected_irr",
    "monthly_payment",
    "stressed_noi",
    "avg_stressed_noi",
    "total_portfolio_value",
    "totals",
    "summary",
    "terminal_value",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    println!("{}", headline(result_of(value)));
}

fn headline(value: &Value) -> String {
    let Value::Object(map) = value else {
        return format_value(value);
    };
    for key in PRIORITY_KEYS {
        match map.get(key) {
            Some(Value::Object(_)) => return headline(&map[key]),
            Some(val) if !val.is_null() => return format_value(val),
            _ => {}
        }
    }
    match map.iter().next() {
        Some((key, val)) => format!("{key}: {}", format_value(val)),
        None => String::new(),
    }
}
