//! Endpoint descriptor compiler
//!
//! Turns the nested `api` config of an exchange into a flat table of
//! normalized operation name -> [`EndpointDescriptor`].
//!
//! ```text
//! { "v2": { "public": { "get": { "time": {}, "currencies": { "cost": 2 } } } } }
//!   => v2PublicGetTime       GET time        api=[v2, public] cost=1
//!      v2PublicGetCurrencies GET currencies  api=[v2, public] cost=2
//! ```
//!
//! Non-verb keys are grouping labels. Under a verb key the value is either a
//! mapping of path -> endpoint config or a list of paths. The endpoint config
//! may be a mapping with a `cost`, a bare number, or a numeric string.
//!
//! Names that normalize to the same string resolve last-write-wins in document
//! order. That is inherited behaviour rather than a contract exchanges should
//! lean on.

use serde_json::{Map, Value};

use crate::errors::{CcxtError, CcxtResult};
use crate::types::{ApiGroup, ApiTable, EndpointDescriptor, HttpMethod};

const DEFAULT_COST: f64 = 1.0;

/// Compiles a descriptor config into a flat endpoint table.
///
/// `null` and `{}` compile to an empty table. Leaves that are neither
/// mappings nor lists are skipped. A non-mapping root or a negative /
/// non-finite cost is a configuration error.
pub fn compile_api(config: &Value) -> CcxtResult<ApiTable> {
    let mut table = ApiTable::new();
    match config {
        Value::Null => {}
        Value::Object(root) => walk(root, &mut Vec::new(), &mut table)?,
        other => {
            return Err(CcxtError::ConfigurationError {
                message: format!("api config must be a mapping, got {}", type_name(other)),
            })
        }
    }
    Ok(table)
}

fn walk(node: &Map<String, Value>, labels: &mut Vec<String>, table: &mut ApiTable) -> CcxtResult<()> {
    for (key, value) in node {
        if let Some(method) = HttpMethod::parse(key) {
            for (path, cost) in endpoints(value) {
                let name = operation_name(labels, method, &path);
                let cost = validate_cost(&name, cost)?;
                table.insert(
                    name,
                    EndpointDescriptor {
                        method,
                        path,
                        api: ApiGroup::from_labels(labels),
                        cost,
                    },
                );
            }
        } else if let Value::Object(child) = value {
            labels.push(key.clone());
            walk(child, labels, table)?;
            labels.pop();
        }
    }
    Ok(())
}

/// (path, cost) pairs under a verb node, in document order
fn endpoints(value: &Value) -> Vec<(String, f64)> {
    match value {
        Value::Object(paths) => paths
            .iter()
            .map(|(path, config)| (path.clone(), endpoint_cost(config)))
            .collect(),
        Value::Array(paths) => paths
            .iter()
            .filter_map(Value::as_str)
            .map(|path| (path.to_string(), DEFAULT_COST))
            .collect(),
        _ => Vec::new(),
    }
}

fn endpoint_cost(config: &Value) -> f64 {
    match config {
        Value::Object(fields) => fields.get("cost").map(cost_value).unwrap_or(DEFAULT_COST),
        Value::Number(_) | Value::String(_) => cost_value(config),
        _ => DEFAULT_COST,
    }
}

/// Explicit number wins, then a decimal string, then the default
fn cost_value(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(DEFAULT_COST),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(DEFAULT_COST),
        _ => DEFAULT_COST,
    }
}

fn validate_cost(name: &str, cost: f64) -> CcxtResult<f64> {
    if cost.is_finite() && cost >= 0.0 {
        Ok(cost)
    } else {
        Err(CcxtError::ConfigurationError {
            message: format!("{name}: cost must be a non-negative number, got {cost}"),
        })
    }
}

/// Prefix labels + verb + path tokens, each capitalized, first char lowered
///
/// `["private"]`, POST, `orders/{id}/cancel` -> `privatePostOrdersIdCancel`
pub fn operation_name(labels: &[String], method: HttpMethod, path: &str) -> String {
    let mut name = String::new();
    for label in labels {
        name.push_str(&capitalize(label));
    }
    name.push_str(&capitalize(&method.as_str().to_ascii_lowercase()));
    for token in path
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
    {
        name.push_str(&capitalize(token));
    }
    lowercase_first(&name)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn lowercase_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_config() {
        let table = compile_api(&json!({
            "v2": { "public": { "get": { "time": {}, "currencies": { "cost": 2 } } } }
        }))
        .unwrap();

        assert_eq!(table.len(), 2);
        let time = &table["v2PublicGetTime"];
        assert_eq!(time.method, HttpMethod::Get);
        assert_eq!(time.path, "time");
        assert_eq!(time.cost, 1.0);
        assert_eq!(time.api, ApiGroup::Path(vec!["v2".into(), "public".into()]));

        let currencies = &table["v2PublicGetCurrencies"];
        assert_eq!(currencies.path, "currencies");
        assert_eq!(currencies.cost, 2.0);
    }

    #[test]
    fn test_single_label_and_list_form() {
        let table = compile_api(&json!({
            "private": { "POST": ["orders/{id}/cancel", 42, "order"] }
        }))
        .unwrap();

        assert_eq!(table.len(), 2);
        let cancel = &table["privatePostOrdersIdCancel"];
        assert_eq!(cancel.method, HttpMethod::Post);
        assert_eq!(cancel.path, "orders/{id}/cancel");
        assert_eq!(cancel.api, ApiGroup::Single("private".into()));
        assert_eq!(cancel.cost, 1.0);
        assert!(table.contains_key("privatePostOrder"));
    }

    #[test]
    fn test_cost_forms() {
        let table = compile_api(&json!({
            "public": { "get": {
                "openapi/v1/exchangeInfo": 10,
                "openapi/v1/ping": "0.5",
                "openapi/quote/v1/depth": { "cost": "3", "byLimit": [[101, 5], [0, 1]] },
                "openapi/v1/pairs": { "cost": "cheap" },
                "openapi/v1/time": true
            } }
        }))
        .unwrap();

        assert_eq!(table["publicGetOpenapiV1ExchangeInfo"].cost, 10.0);
        assert_eq!(table["publicGetOpenapiV1Ping"].cost, 0.5);
        assert_eq!(table["publicGetOpenapiQuoteV1Depth"].cost, 3.0);
        assert_eq!(table["publicGetOpenapiV1Pairs"].cost, 1.0);
        assert_eq!(table["publicGetOpenapiV1Time"].cost, 1.0);
    }

    #[test]
    fn test_collision_last_write_wins() {
        let forward = compile_api(&json!({
            "public": { "get": { "a-b": { "cost": 1 }, "a_b": { "cost": 5 } } }
        }))
        .unwrap();
        assert_eq!(forward.len(), 1);
        assert_eq!(forward["publicGetAB"].path, "a_b");
        assert_eq!(forward["publicGetAB"].cost, 5.0);

        let reversed = compile_api(&json!({
            "public": { "get": { "a_b": { "cost": 5 }, "a-b": { "cost": 1 } } }
        }))
        .unwrap();
        assert_eq!(reversed["publicGetAB"].path, "a-b");
        assert_eq!(reversed["publicGetAB"].cost, 1.0);
    }

    #[test]
    fn test_collision_across_verb_nodes() {
        // "get" and "GET" are distinct keys but the same verb
        let table = compile_api(&json!({
            "public": { "get": { "status": 1 }, "GET": { "status": 7 } }
        }))
        .unwrap();
        assert_eq!(table["publicGetStatus"].cost, 7.0);
    }

    #[test]
    fn test_deterministic() {
        let config = json!({
            "public": { "get": ["time", "markets"], "post": { "echo": 2 } },
            "private": { "delete": { "orders/{id}": {} } }
        });
        assert_eq!(compile_api(&config).unwrap(), compile_api(&config).unwrap());
    }

    #[test]
    fn test_empty_and_ignored_leaves() {
        assert!(compile_api(&json!({})).unwrap().is_empty());
        assert!(compile_api(&Value::Null).unwrap().is_empty());

        let table = compile_api(&json!({
            "public": { "get": "time", "note": "not a group", "put": null }
        }))
        .unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_verb_at_root_has_empty_group() {
        let table = compile_api(&json!({ "get": ["ping"] })).unwrap();
        assert_eq!(table["getPing"].api, ApiGroup::Path(vec![]));
    }

    #[test]
    fn test_malformed_config() {
        let err = compile_api(&json!(["public"])).unwrap_err();
        assert_eq!(err.code(), "CONFIGURATION_ERROR");

        let err = compile_api(&json!({ "public": { "get": { "time": -1 } } })).unwrap_err();
        assert!(err.to_string().contains("publicGetTime"));
    }

    #[test]
    fn test_operation_name() {
        let labels = vec!["fapiPrivate".to_string()];
        assert_eq!(
            operation_name(&labels, HttpMethod::Get, "v2/account/{userId}"),
            "fapiPrivateGetV2AccountUserId"
        );
        assert_eq!(operation_name(&[], HttpMethod::Patch, "x"), "patchX");
    }
}
