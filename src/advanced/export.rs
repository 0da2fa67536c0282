//! Text formatters for query results.

use serde_json::Value;

use crate::errors::QueryError;

/// Quote a cell when it holds a delimiter, quote or line break. Embedded
/// quotes are doubled.
fn escape_csv(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

fn csv_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => escape_csv(s),
        // Nested values are always quoted, even `{}` and `[]`
        Some(nested @ (Value::Object(_) | Value::Array(_))) => {
            format!("\"{}\"", nested.to_string().replace('"', "\"\""))
        }
        Some(other) => other.to_string(),
    }
}

/// Render rows as CSV. Columns come from the first row's keys; a row missing
/// a column leaves that cell empty.
pub fn to_csv(rows: &[Value]) -> String {
    let headers: Vec<&String> = match rows.first() {
        Some(Value::Object(first)) => first.keys().collect(),
        _ => return String::new(),
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(
        headers
            .iter()
            .map(|h| escape_csv(h))
            .collect::<Vec<_>>()
            .join(","),
    );

    for row in rows {
        let line = headers
            .iter()
            .map(|h| csv_cell(row.get(h.as_str())))
            .collect::<Vec<_>>()
            .join(",");
        lines.push(line);
    }

    lines.join("\n")
}

/// Render rows as a JSON array
pub fn to_json(rows: &[Value], pretty: bool) -> Result<String, QueryError> {
    let rendered = if pretty {
        serde_json::to_string_pretty(rows)?
    } else {
        serde_json::to_string(rows)?
    };
    Ok(rendered)
}
