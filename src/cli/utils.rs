use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::types::EntityType;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(target), Some(Value::Object(extra))) = (response.as_object_mut(), data) {
                target.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Print a single value; text mode pretty-prints it as well
pub fn output_value(_output_format: OutputFormat, value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a collection, one line per record in text mode
pub fn output_records(output_format: OutputFormat, entity: EntityType, records: &Value) -> anyhow::Result<()> {
    let items = records.as_array().map(Vec::as_slice).unwrap_or_default();

    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ entity.collection(): items }))?);
        }
        OutputFormat::Text if items.is_empty() => {
            println!("No {} found", entity.collection());
        }
        OutputFormat::Text => {
            for record in items {
                println!("{}  {}", field(record, "id"), summary(record));
            }
        }
    }
    Ok(())
}

fn field<'a>(record: &'a Value, name: &str) -> &'a str {
    record.get(name).and_then(Value::as_str).unwrap_or("-")
}

/// Human label for a record, whichever naming fields it has
fn summary(record: &Value) -> String {
    if let Some(name) = record.get("name").and_then(Value::as_str) {
        return name.to_string();
    }
    match (
        record.get("firstName").and_then(Value::as_str),
        record.get("lastName").and_then(Value::as_str),
    ) {
        (Some(first), Some(last)) => format!("{} {}", first, last),
        _ => format!("user {}", field(record, "user")),
    }
}
