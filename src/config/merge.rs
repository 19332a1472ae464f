//! Layer merging
//!
//! - Tables: merged key by key
//! - Arrays: replaced wholesale (later layer wins)
//! - Scalars: later layer wins
//! - Null in a later layer: ignored, the earlier value stays

use serde_json::{Map, Value};

/// Merge `overlay` on top of `base`.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match (base_map.remove(&key), overlay_value) {
                    (Some(base_value), overlay_value) => deep_merge(base_value, overlay_value),
                    (None, table @ Value::Object(_)) => deep_merge(Value::Object(Map::new()), table),
                    (None, overlay_value) => overlay_value,
                };
                if !merged.is_null() {
                    base_map.insert(key, merged);
                }
            }
            Value::Object(base_map)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Merge layers in precedence order (first is the base, last wins).
pub fn merge_layers<I>(layers: I) -> Value
where
    I: IntoIterator<Item = Value>,
{
    layers.into_iter().fold(Value::Null, deep_merge)
}

/// Convert a parsed TOML document to JSON so it can take part in merging.
pub fn toml_to_json(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tables_merge_by_key() {
        let base = json!({"endpoint": {"command": ["geth"], "max_line_bytes": 1024}});
        let overlay = json!({"endpoint": {"max_line_bytes": 4096}});

        let result = deep_merge(base, overlay);
        assert_eq!(result["endpoint"]["command"], json!(["geth"]));
        assert_eq!(result["endpoint"]["max_line_bytes"], 4096);
    }

    #[test]
    fn test_arrays_replace() {
        let base = json!({"endpoint": {"command": ["geth", "attach"]}});
        let overlay = json!({"endpoint": {"command": ["nc", "-U", "/tmp/geth.ipc"]}});

        let result = deep_merge(base, overlay);
        assert_eq!(result["endpoint"]["command"], json!(["nc", "-U", "/tmp/geth.ipc"]));
    }

    #[test]
    fn test_null_keeps_earlier_value() {
        let base = json!({"output": {"pretty": true}, "log": {"level": "warn"}});
        let overlay = json!({"output": {"pretty": null}, "log": null});

        let result = deep_merge(base.clone(), overlay);
        assert_eq!(result, base);
    }

    #[test]
    fn test_null_does_not_introduce_keys() {
        let result = deep_merge(json!({}), json!({"log": {"level": null}}));
        assert_eq!(result, json!({"log": {}}));
    }

    #[test]
    fn test_merge_layers_precedence() {
        let builtin = json!({"log": {"level": "warn"}, "output": {"pretty": true}});
        let user = json!({"log": {"level": "info"}});
        let explicit = json!({"output": {"pretty": false}});
        let cli = json!({"log": {"level": "debug"}});

        let result = merge_layers(vec![builtin, user, explicit, cli]);
        assert_eq!(result["log"]["level"], "debug");
        assert_eq!(result["output"]["pretty"], false);
    }

    #[test]
    fn test_toml_to_json() {
        let doc: toml::Value = toml::from_str(
            r#"
            [endpoint]
            command = ["geth", "attach"]
            max_line_bytes = 2048

            [output]
            pretty = false
            "#,
        )
        .unwrap();

        assert_eq!(
            toml_to_json(doc),
            json!({
                "endpoint": {"command": ["geth", "attach"], "max_line_bytes": 2048},
                "output": {"pretty": false}
            })
        );
    }
}
