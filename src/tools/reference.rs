// Reference data for the application template placeholders (list_template_fields).

use crate::types::AppTemplate;
use serde_json::{Map as JsonMap, Value};

/// Placeholder names accepted by the application template, with their descriptions.
pub fn template_fields_json() -> String {
    let fields = template_fields();
    serde_json::to_string_pretty(&fields).unwrap_or_else(|_| "{}".to_string())
}

fn template_fields() -> JsonMap<String, Value> {
    let schema = serde_json::to_value(schemars::schema_for!(AppTemplate)).unwrap_or_default();
    let mut fields = JsonMap::new();
    if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
        for (name, property) in properties {
            let description = property.get("description").cloned().unwrap_or(Value::Null);
            let mut entry = JsonMap::new();
            entry.insert("placeholder".to_string(), Value::String(format!("{{{{.{}}}}}", name)));
            entry.insert("description".to_string(), description);
            fields.insert(name.clone(), Value::Object(entry));
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_fields_cover_request() {
        let fields = template_fields();
        assert_eq!(fields.len(), 9);
        assert_eq!(fields["ApplicationName"]["placeholder"], "{{.ApplicationName}}");
        assert_eq!(fields["RepoUrl"]["description"], "Git repository URL");
    }
}
