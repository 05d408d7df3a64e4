//! HTTP client for API requests
//!
//! The runtime hands every endpoint call to a [`Transport`] as an
//! [`EndpointRequest`]. [`HttpClient`] is the reqwest-backed transport; tests
//! substitute a scripted one.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use super::ExchangeConfig;
use crate::errors::{CcxtError, CcxtResult};
use crate::types::{ApiGroup, HttpMethod};
use crate::utils::{implode_params, stringify};

/// 엔드포인트 호출 요청
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointRequest {
    /// Normalized operation name, e.g. `v2PublicGetCurrencies`
    pub name: String,
    pub method: HttpMethod,
    /// Path template, placeholders not yet substituted
    pub path: String,
    pub api: ApiGroup,
    pub params: Value,
    pub cost: f64,
}

/// Sends endpoint requests and returns the decoded response
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: EndpointRequest) -> CcxtResult<Value>;
}

/// HTTP 클라이언트
///
/// `urls` maps an api group to its base URL. A group is looked up by its full
/// joined path (`v2/public`), then by its access label (`public`), then by its
/// outermost label (`v2`). `{hostname}` in a base URL is replaced with the
/// configured hostname.
pub struct HttpClient {
    client: Client,
    urls: HashMap<String, String>,
    hostname: Option<String>,
}

impl HttpClient {
    /// 새로운 HTTP 클라이언트 생성
    pub fn new(urls: HashMap<String, String>, config: &ExchangeConfig) -> CcxtResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms()))
            .build()
            .map_err(|e| CcxtError::NetworkError {
                url: String::new(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            urls,
            hostname: config.hostname().map(str::to_string),
        })
    }

    /// 기본 URL 조회
    pub fn base_url(&self, api: &ApiGroup) -> CcxtResult<String> {
        let candidates = [
            Some(api.to_string()),
            api.access().map(str::to_string),
            api.labels().first().map(|label| label.to_string()),
        ];

        let url = candidates
            .into_iter()
            .flatten()
            .find_map(|key| self.urls.get(&key))
            .ok_or_else(|| CcxtError::ConfigurationError {
                message: format!("no base url for api group '{api}'"),
            })?;

        if url.contains("{hostname}") {
            let hostname = self.hostname.as_deref().ok_or_else(|| CcxtError::ConfigurationError {
                message: format!("base url {url} needs a hostname"),
            })?;
            Ok(url.replace("{hostname}", hostname))
        } else {
            Ok(url.clone())
        }
    }

    /// Full URL plus the params left over after path substitution
    pub fn build_url(&self, request: &EndpointRequest) -> CcxtResult<(String, serde_json::Map<String, Value>)> {
        let base = self.base_url(&request.api)?;
        let (path, rest) = implode_params(&request.path, &request.params);
        let url = format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'));
        Ok((url, rest))
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn execute(&self, request: EndpointRequest) -> CcxtResult<Value> {
        let (url, rest) = self.build_url(&request)?;
        debug!(operation = %request.name, method = %request.method, %url, "http request");

        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes()).map_err(|e| {
            CcxtError::ConfigurationError {
                message: e.to_string(),
            }
        })?;
        let mut builder = self.client.request(method, &url);

        if request.method.uses_query() {
            let query: Vec<(String, String)> = rest
                .iter()
                .filter_map(|(key, value)| stringify(value).map(|v| (key.clone(), v)))
                .collect();
            if !query.is_empty() {
                builder = builder.query(&query);
            }
        } else if !rest.is_empty() {
            builder = builder.json(&rest);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                CcxtError::RequestTimeout { url: url.clone() }
            } else {
                CcxtError::NetworkError {
                    url: url.clone(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(CcxtError::ExchangeError {
                message: format!("HTTP {status}: {url} {body}"),
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| CcxtError::BadResponse {
            message: format!("{url}: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(hostname: Option<&str>) -> HttpClient {
        let urls = HashMap::from([
            ("public".to_string(), "https://api.example.com/v1".to_string()),
            ("v2/private".to_string(), "https://{hostname}/v2".to_string()),
        ]);
        let mut config = ExchangeConfig::new();
        if let Some(hostname) = hostname {
            config = config.with_hostname(hostname);
        }
        HttpClient::new(urls, &config).unwrap()
    }

    fn request(api: ApiGroup, path: &str, params: Value) -> EndpointRequest {
        EndpointRequest {
            name: "test".into(),
            method: HttpMethod::Get,
            path: path.into(),
            api,
            params,
            cost: 1.0,
        }
    }

    #[test]
    fn test_build_url_implodes_path() {
        let client = client(None);
        let (url, rest) = client
            .build_url(&request(
                ApiGroup::Single("public".into()),
                "orders/{id}",
                json!({ "id": 7, "limit": 5 }),
            ))
            .unwrap();
        assert_eq!(url, "https://api.example.com/v1/orders/7");
        assert_eq!(rest["limit"], json!(5));
    }

    #[test]
    fn test_base_url_lookup_order() {
        let client = client(Some("eu.example.com"));
        let nested = ApiGroup::Path(vec!["v2".into(), "private".into()]);
        assert_eq!(client.base_url(&nested).unwrap(), "https://eu.example.com/v2");

        // falls back to the access label
        let nested_public = ApiGroup::Path(vec!["v3".into(), "public".into()]);
        assert_eq!(client.base_url(&nested_public).unwrap(), "https://api.example.com/v1");
    }

    #[test]
    fn test_base_url_errors() {
        let client = client(None);
        let missing = client.base_url(&ApiGroup::Single("margin".into())).unwrap_err();
        assert_eq!(missing.code(), "CONFIGURATION_ERROR");

        let nested = ApiGroup::Path(vec!["v2".into(), "private".into()]);
        assert!(client.base_url(&nested).is_err());
    }
}
