use serde_json::Value;
use std::io;

use super::{flatten_row, format_value, primary_series, result_of};

/// Write the primary series as CSV rows, or field/value pairs when the
/// result has no series.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = result_of(value);
    let outcome = match result {
        Value::Object(map) => match primary_series(map) {
            Some((_, rows)) => write_rows(&mut wtr, rows),
            None => write_fields(&mut wtr, result),
        },
        Value::Array(rows) => write_rows(&mut wtr, rows),
        other => wtr.write_record([format_value(other)]),
    };

    if let Err(e) = outcome.and_then(|_| wtr.flush().map_err(csv::Error::from)) {
        eprintln!("CSV write error: {e}");
    }
}

fn write_fields<W: io::Write>(wtr: &mut csv::Writer<W>, result: &Value) -> csv::Result<()> {
    let mut flat = Vec::new();
    flatten_row("", result, &mut flat);
    wtr.write_record(["field", "value"])?;
    for (key, val) in flat {
        wtr.write_record([key, format_value(&val)])?;
    }
    Ok(())
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) -> csv::Result<()> {
    let mut header_written = false;
    for row in rows {
        let mut flat = Vec::new();
        flatten_row("", row, &mut flat);
        if !header_written {
            wtr.write_record(flat.iter().map(|(k, _)| k.as_str()))?;
            header_written = true;
        }
        wtr.write_record(flat.iter().map(|(_, v)| format_value(v)))?;
    }
    Ok(())
}
