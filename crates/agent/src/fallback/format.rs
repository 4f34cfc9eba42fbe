use serde_json::{Map, Value};

pub const NO_USERS: &str = "No users found.";
const MISSING: &str = "N/A";

/// Renders directory output as text. Arrays become one line per record,
/// records become a single line, `{message}` objects yield their message and
/// anything that is not JSON passes through verbatim.
pub fn format_directory_output(content: &str) -> String {
    let Ok(parsed) = serde_json::from_str::<Value>(content) else {
        return content.to_string();
    };

    match parsed {
        Value::Array(items) if items.is_empty() => NO_USERS.to_string(),
        Value::Array(items) => items.iter().map(format_record).collect::<Vec<_>>().join("\n"),
        Value::Object(object) => {
            if probe_field(&object, "id").is_some() {
                return format_record_fields(&object);
            }
            match probe_field(&object, "message") {
                Some(Value::String(message)) => message.clone(),
                _ => content.to_string(),
            }
        }
        _ => content.to_string(),
    }
}

/// Casing variants tried for `key`, in order: as given, then first letter upper-cased.
pub fn casing_variants(key: &str) -> [String; 2] {
    let mut chars = key.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    [key.to_string(), capitalized]
}

pub fn probe_field<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    casing_variants(key).iter().find_map(|variant| object.get(variant))
}

fn format_record(value: &Value) -> String {
    match value {
        Value::Object(object) => format_record_fields(object),
        _ => format_record_fields(&Map::new()),
    }
}

fn format_record_fields(object: &Map<String, Value>) -> String {
    let field = |key: &str| {
        probe_field(object, key).map(render_value).unwrap_or_else(|| MISSING.to_string())
    };
    format!(
        "User [ID: {}] Name: {}, Age: {}, Job: {}",
        field("id"),
        field("name"),
        field("age"),
        field("jobTitle")
    )
}

fn render_value(value: &Value) -> String {
    let rendered = match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    if rendered.len() >= 2 && rendered.starts_with('"') && rendered.ends_with('"') {
        rendered.trim_matches('"').to_string()
    } else {
        rendered
    }
}
