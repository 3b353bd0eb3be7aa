use serde_json::{json, Value};
use std::path::Path;

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });
            if let Some(data) = data {
                response["data"] = data;
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Print a record or list; text mode shows one compact line per row
pub fn output_value(output_format: OutputFormat, value: &Value) -> anyhow::Result<()> {
    match (output_format, value) {
        (OutputFormat::Json, _) => println!("{}", serde_json::to_string_pretty(value)?),
        (OutputFormat::Text, Value::Array(rows)) if rows.is_empty() => println!("(no results)"),
        (OutputFormat::Text, Value::Array(rows)) => {
            for row in rows {
                println!("{}", summarize(row));
            }
        }
        (OutputFormat::Text, other) => println!("{}", serde_json::to_string_pretty(other)?),
    }
    Ok(())
}

/// `id  title  [status]` for rows that have those fields, JSON otherwise
pub fn summarize(row: &Value) -> String {
    let id = row["id"].as_str();
    let label = ["title", "name", "email", "code"].iter().find_map(|k| row[*k].as_str());
    match (id, label) {
        (Some(id), Some(label)) => match row["status"].as_str() {
            Some(status) => format!("{}  {}  [{}]", id, label, status),
            None => format!("{}  {}", id, label),
        },
        _ => row.to_string(),
    }
}

/// Write to `out` when given, stdout otherwise
pub fn write_output(out: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, content)?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarizes_rows_with_status() {
        let row = json!({ "id": "abc", "title": "Calc review", "status": "live" });
        assert_eq!(summarize(&row), "abc  Calc review  [live]");
    }

    #[test]
    fn falls_back_to_json() {
        let row = json!({ "count": 3 });
        assert_eq!(summarize(&row), "{\"count\":3}");
    }

    #[test]
    fn writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.ics");
        write_output(Some(&path), "BEGIN:VCALENDAR\r\n").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "BEGIN:VCALENDAR\r\n");
    }
}
