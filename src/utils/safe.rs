//! Safe helper functions for extracting values from JSON
//!
//! CCXT의 safe* 헬퍼 함수 중 런타임이 사용하는 것들

use serde_json::{Map, Value};

/// 스칼라 값을 문자열로 변환 (null, 배열, 객체는 None)
pub fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Lenient boolean: `true`, `"true"`, `"1"`, `"yes"`, non-zero numbers
pub fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.to_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        _ => None,
    }
}

/// Substitutes `{name}` placeholders in `path` from `params`.
///
/// Returns the filled path and the params that were not consumed.
/// Placeholders without a matching scalar param are left as they are.
pub fn implode_params(path: &str, params: &Value) -> (String, Map<String, Value>) {
    let mut rest = match params {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    let mut out = String::with_capacity(path.len());
    let mut remaining = path;

    while let Some(open) = remaining.find('{') {
        let Some(close) = remaining[open..].find('}').map(|i| open + i) else {
            break;
        };
        let key = &remaining[open + 1..close];
        out.push_str(&remaining[..open]);
        match rest.get(key).and_then(stringify) {
            Some(value) => {
                out.push_str(&value);
                rest.remove(key);
            }
            None => out.push_str(&remaining[open..=close]),
        }
        remaining = &remaining[close + 1..];
    }
    out.push_str(remaining);
    (out, rest)
}
