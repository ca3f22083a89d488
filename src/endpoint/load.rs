use super::types::EndpointRecord;
use anyhow::Context;
use serde_json::Value;
use tracing::debug;

/// Load and normalize endpoint descriptions from a YAML or JSON file
///
/// The file holds either a single raw endpoint description or a list of
/// them, as dumped by the extraction pipeline. Format is chosen by file
/// extension (`.yaml`/`.yml` vs. everything else).
pub fn load_endpoints(file_path: &str) -> anyhow::Result<Vec<EndpointRecord>> {
    let content = std::fs::read_to_string(file_path)
        .with_context(|| format!("failed to read endpoint descriptions from {file_path}"))?;
    let value: Value = if file_path.ends_with(".yaml") || file_path.ends_with(".yml") {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    endpoints_from_value(value)
        .with_context(|| format!("failed to normalize endpoints from {file_path}"))
}

/// Normalize one description or a list of them from untyped JSON
pub fn endpoints_from_value(value: Value) -> anyhow::Result<Vec<EndpointRecord>> {
    let raws = match value {
        Value::Array(items) => items,
        other => vec![other],
    };
    let mut records = Vec::with_capacity(raws.len());
    for raw in raws {
        records.push(EndpointRecord::from_value(raw)?);
    }
    debug!(count = records.len(), "normalized endpoint descriptions");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_description_becomes_one_record() {
        let records = endpoints_from_value(json!({
            "methods": ["GET"],
            "uri": "/ping"
        }))
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].uri, "/ping");
    }

    #[test]
    fn test_list_of_descriptions() {
        let records = endpoints_from_value(json!([
            { "methods": ["GET"], "uri": "/users" },
            { "methods": ["POST"], "uri": "/users" }
        ]))
        .unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_one_bad_description_fails_the_load() {
        let err = endpoints_from_value(json!([
            { "methods": ["GET"], "uri": "/users" },
            { "uri": "/orphan" }
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("methods"));
    }
}
