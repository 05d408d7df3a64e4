//! Endpoint descriptor types - 컴파일된 API 엔드포인트 정보

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// HTTP 메서드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    /// Parses a verb label case-insensitively; `None` for non-verb keys
    pub fn parse(label: &str) -> Option<Self> {
        match label.to_ascii_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "DELETE" => Some(HttpMethod::Delete),
            "PATCH" => Some(HttpMethod::Patch),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }

    /// True when parameters travel in the query string rather than a body
    pub fn uses_query(&self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Delete)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// API 그룹
///
/// The grouping labels above a verb node. A single label (`"public"`) is kept
/// as-is; deeper nesting keeps the whole path (`["v2", "public"]`). The
/// transport uses it to pick the base URL and signing policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiGroup {
    Single(String),
    Path(Vec<String>),
}

impl ApiGroup {
    pub fn from_labels(labels: &[String]) -> Self {
        match labels {
            [single] => ApiGroup::Single(single.clone()),
            _ => ApiGroup::Path(labels.to_vec()),
        }
    }

    /// Labels from outermost to innermost
    pub fn labels(&self) -> Vec<&str> {
        match self {
            ApiGroup::Single(label) => vec![label.as_str()],
            ApiGroup::Path(labels) => labels.iter().map(String::as_str).collect(),
        }
    }

    /// Innermost label, usually the access level (`public` / `private`)
    pub fn access(&self) -> Option<&str> {
        match self {
            ApiGroup::Single(label) => Some(label.as_str()),
            ApiGroup::Path(labels) => labels.last().map(String::as_str),
        }
    }
}

impl fmt::Display for ApiGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.labels().join("/"))
    }
}

/// 엔드포인트 디스크립터
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDescriptor {
    pub method: HttpMethod,
    /// Path template as written in the config, e.g. `orders/{id}`
    pub path: String,
    pub api: ApiGroup,
    pub cost: f64,
}

/// Flat table of normalized operation name -> descriptor
pub type ApiTable = BTreeMap<String, EndpointDescriptor>;
