use crate::constants::network;
use crate::models::auth::find_param;
use crate::models::{ApiKeyLocation, Authentication, ExecutionResult, RequestDescription};
use crate::services::logger::{LogLevel, Logger};
use crate::services::oauth2::TokenAcquirer;
use crate::utils::query::upsert_query_param;
use crate::utils::redact::{redact_header_pairs, redact_url};
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, Method, Request};
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::time::Instant;
use url::Url;

/// Headers that describe the body rather than the message.
const CONTENT_HEADERS: &[&str] = &[
    "content-type",
    "content-length",
    "content-encoding",
    "content-language",
    "content-location",
    "content-md5",
    "content-range",
    "content-disposition",
    "expires",
    "last-modified",
    "allow",
];

fn is_content_header(name: &HeaderName) -> bool {
    CONTENT_HEADERS.contains(&name.as_str())
}

/// Outgoing headers split the way the transport separates message headers
/// from body headers. The body set is merged last.
#[derive(Debug, Default)]
struct HeaderSet {
    general: HeaderMap,
    content: HeaderMap,
}

impl HeaderSet {
    fn add(&mut self, name: HeaderName, value: HeaderValue) {
        if !is_content_header(&name) {
            self.general.append(name, value);
        } else if name == CONTENT_TYPE {
            self.content.insert(name, value);
        } else {
            self.content.append(name, value);
        }
    }

    fn set(&mut self, name: HeaderName, value: HeaderValue) {
        self.general.insert(name, value);
    }

    fn into_header_map(self) -> HeaderMap {
        let mut merged = self.general;
        merged.insert(
            CONTENT_TYPE,
            HeaderValue::from_static(network::RAW_BODY_CONTENT_TYPE),
        );
        for name in self.content.keys() {
            merged.remove(name);
        }
        for (name, value) in self.content.iter() {
            merged.append(name.clone(), value.clone());
        }
        merged
    }
}

/// Turns request descriptions into HTTP calls over one shared client.
#[derive(Clone)]
pub struct RequestExecutor {
    logger: Logger,
    client: Client,
    tokens: TokenAcquirer,
}

impl RequestExecutor {
    pub fn new(logger: Logger, client: Client) -> Self {
        let logger = logger.child("executor");
        Self {
            tokens: TokenAcquirer::new(logger.clone(), client.clone()),
            logger,
            client,
        }
    }

    /// Sends the request and normalizes the outcome. Transport errors come
    /// back as a result with status code 0; this never fails.
    pub async fn execute(&self, request: &RequestDescription) -> ExecutionResult {
        let started = Instant::now();

        let prepared = match self.prepare(request).await {
            Ok(prepared) => prepared,
            Err(message) => {
                self.logger.warn(
                    "request could not be built",
                    Some(&serde_json::json!({ "reason": message })),
                );
                return ExecutionResult::transport_failure(message, elapsed_ms(started));
            }
        };

        if self.logger.enabled(LogLevel::Debug) {
            let headers: Vec<(&str, &str)> = prepared
                .headers()
                .iter()
                .map(|(k, v)| (k.as_str(), v.to_str().unwrap_or("<binary>")))
                .collect();
            self.logger.debug(
                "dispatching request",
                Some(&serde_json::json!({
                    "method": prepared.method().as_str(),
                    "url": redact_url(prepared.url().as_str()),
                    "headers": redact_header_pairs(headers),
                })),
            );
        }

        let response = match self.client.execute(prepared).await {
            Ok(response) => response,
            Err(err) => return self.transport_failure(&err, started),
        };

        let status_code = response.status().as_u16();
        let headers = merge_response_headers(response.headers());
        match response.bytes().await {
            Ok(bytes) => {
                let body = String::from_utf8_lossy(&bytes).into_owned();
                ExecutionResult::new(status_code, headers, body, elapsed_ms(started))
            }
            Err(err) => self.transport_failure(&err, started),
        }
    }

    /// Builds the wire request without sending it: method, url, body,
    /// explicit headers, then authentication.
    pub async fn prepare(&self, request: &RequestDescription) -> Result<Request, String> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| format!("invalid HTTP method '{}'", request.method))?;
        let mut url = Url::parse(request.url.raw.trim())
            .map_err(|err| format!("invalid URL '{}': {}", request.url.raw, err))?;

        let mut headers = HeaderSet::default();
        for header in request.headers.iter().filter(|h| !h.disabled) {
            self.add_header(&mut headers, &header.key, &header.value);
        }

        if let Some(auth) = &request.authentication {
            self.apply_auth(auth, &mut headers, &mut url).await;
        }

        self.client
            .request(method, url)
            .headers(headers.into_header_map())
            .body(request.body.raw_text().to_string())
            .build()
            .map_err(|err| err.to_string())
    }

    fn add_header(&self, headers: &mut HeaderSet, key: &str, value: &str) {
        let parsed = HeaderName::from_bytes(key.trim().as_bytes())
            .map_err(|err| err.to_string())
            .and_then(|name| {
                HeaderValue::from_str(value)
                    .map(|value| (name, value))
                    .map_err(|err| err.to_string())
            });
        match parsed {
            Ok((name, _)) if name == CONTENT_LENGTH => {
                self.logger
                    .debug("content-length is computed by the transport, ignoring header", None);
            }
            Ok((name, value)) => headers.add(name, value),
            Err(reason) => self.logger.warn(
                "dropping header the transport rejects",
                Some(&serde_json::json!({ "header": key, "reason": reason })),
            ),
        }
    }

    async fn apply_auth(&self, auth: &Authentication, headers: &mut HeaderSet, url: &mut Url) {
        match auth {
            Authentication::NoAuth => {}
            Authentication::Bearer(params) => {
                let token = params.first().map(|p| p.value.as_str()).unwrap_or("");
                if !token.is_empty() {
                    self.set_authorization(headers, &format!("Bearer {}", token));
                }
            }
            Authentication::Basic(params) => {
                let username = find_param(params, "username").unwrap_or("");
                if !username.is_empty() {
                    let password = find_param(params, "password").unwrap_or("");
                    let encoded = base64::engine::general_purpose::STANDARD
                        .encode(format!("{}:{}", username, password));
                    self.set_authorization(headers, &format!("Basic {}", encoded));
                }
            }
            Authentication::ApiKey(params) => {
                let Some(param) = params.first() else {
                    return;
                };
                if param.key.trim().is_empty() {
                    self.logger.warn("api key auth without a key name, skipping", None);
                    return;
                }
                match param.placement() {
                    Some(ApiKeyLocation::Header) => self.add_header(headers, &param.key, &param.value),
                    Some(ApiKeyLocation::Query) => upsert_query_param(url, &param.key, &param.value),
                    None => self.logger.warn(
                        "unsupported api key location, skipping",
                        Some(&serde_json::json!({ "in": param.location })),
                    ),
                }
            }
            Authentication::OAuth2(config) => {
                if let Some(token) = self.tokens.acquire_token(config).await {
                    self.set_authorization(headers, &format!("Bearer {}", token));
                }
            }
            Authentication::Unknown(kind) => {
                self.logger.debug(
                    "unrecognized auth type, sending without credentials",
                    Some(&serde_json::json!({ "type": kind })),
                );
            }
        }
    }

    fn set_authorization(&self, headers: &mut HeaderSet, value: &str) {
        match HeaderValue::from_str(value) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.set(AUTHORIZATION, value);
            }
            Err(_) => self
                .logger
                .warn("credential is not a valid header value, skipping", None),
        }
    }

    fn transport_failure(&self, err: &reqwest::Error, started: Instant) -> ExecutionResult {
        let message = describe_error(err);
        self.logger.warn(
            "request failed before a response was received",
            Some(&serde_json::json!({
                "url": err.url().map(|u| redact_url(u.as_str())),
                "timeout": err.is_timeout(),
                "reason": message,
            })),
        );
        ExecutionResult::transport_failure(message, elapsed_ms(started))
    }
}

/// One entry per header name, multiple values joined with `,`.
pub fn merge_response_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut merged = BTreeMap::new();
    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(",");
        merged.insert(name.as_str().to_string(), joined);
    }
    merged
}

fn describe_error(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = StdError::source(err);
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message = format!("{}: {}", message, text);
        }
        source = cause.source();
    }
    message
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor() -> RequestExecutor {
        RequestExecutor::new(Logger::capturing("test").0, Client::new())
    }

    fn describe(value: serde_json::Value) -> RequestDescription {
        serde_json::from_value(value).expect("request description")
    }

    #[tokio::test]
    async fn raw_body_is_sent_as_json_by_default() {
        let request = describe(serde_json::json!({
            "method": "POST",
            "url": "https://api.test/items",
            "body": {"mode": "raw", "raw": "{\"a\":1}"}
        }));
        let prepared = executor().prepare(&request).await.expect("prepared");
        assert_eq!(prepared.method(), &Method::POST);
        assert_eq!(prepared.headers()[CONTENT_TYPE], "application/json");
        let body = prepared.body().and_then(|b| b.as_bytes()).expect("buffered body");
        assert_eq!(body, b"{\"a\":1}");
    }

    #[tokio::test]
    async fn explicit_content_type_replaces_default() {
        let request = describe(serde_json::json!({
            "method": "PUT",
            "url": "https://api.test/items",
            "headers": [
                {"key": "Content-Type", "value": "text/plain"},
                {"key": "Content-Length", "value": "999"}
            ]
        }));
        let prepared = executor().prepare(&request).await.expect("prepared");
        let values: Vec<_> = prepared.headers().get_all(CONTENT_TYPE).iter().collect();
        assert_eq!(values, vec!["text/plain"]);
        assert!(prepared.headers().get(CONTENT_LENGTH).is_none());
    }

    #[tokio::test]
    async fn duplicate_headers_are_all_applied_and_disabled_skipped() {
        let request = describe(serde_json::json!({
            "url": "https://api.test/",
            "headers": [
                {"key": "X-Tag", "value": "a"},
                {"key": "X-Tag", "value": "b"},
                {"key": "X-Off", "value": "1", "disabled": true}
            ]
        }));
        let prepared = executor().prepare(&request).await.expect("prepared");
        let tags: Vec<_> = prepared.headers().get_all("x-tag").iter().collect();
        assert_eq!(tags, vec!["a", "b"]);
        assert!(prepared.headers().get("x-off").is_none());
    }

    #[tokio::test]
    async fn malformed_header_is_dropped_with_warning() {
        let (logger, records) = Logger::capturing("test");
        let executor = RequestExecutor::new(logger, Client::new());
        let request = describe(serde_json::json!({
            "url": "https://api.test/",
            "headers": [
                {"key": "Bad Header", "value": "x"},
                {"key": "X-Ok", "value": "line\nbreak"},
                {"key": "X-Fine", "value": "yes"}
            ]
        }));
        let prepared = executor.prepare(&request).await.expect("prepared");
        assert_eq!(prepared.headers()["x-fine"], "yes");
        assert!(prepared.headers().get("x-ok").is_none());
        let warnings = records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.level == LogLevel::Warn)
            .count();
        assert_eq!(warnings, 2);
    }

    #[tokio::test]
    async fn bearer_overrides_explicit_authorization() {
        let request = describe(serde_json::json!({
            "url": "https://api.test/",
            "headers": [{"key": "Authorization", "value": "Token old"}],
            "authentication": {"type": "bearer", "bearer": [{"key": "token", "value": "T"}]}
        }));
        let prepared = executor().prepare(&request).await.expect("prepared");
        let values: Vec<_> = prepared.headers().get_all(AUTHORIZATION).iter().collect();
        assert_eq!(values, vec!["Bearer T"]);
    }

    #[tokio::test]
    async fn empty_bearer_token_leaves_headers_alone() {
        let request = describe(serde_json::json!({
            "url": "https://api.test/",
            "headers": [{"key": "Authorization", "value": "Token old"}],
            "authentication": {"type": "bearer", "bearer": [{"key": "token", "value": ""}]}
        }));
        let prepared = executor().prepare(&request).await.expect("prepared");
        assert_eq!(prepared.headers()[AUTHORIZATION], "Token old");
    }

    #[tokio::test]
    async fn basic_auth_is_keyed_not_positional() {
        let request = describe(serde_json::json!({
            "url": "https://api.test/",
            "authentication": {"type": "basic", "basic": [
                {"key": "password", "value": "secret"},
                {"key": "username", "value": "alice"}
            ]}
        }));
        let prepared = executor().prepare(&request).await.expect("prepared");
        assert_eq!(prepared.headers()[AUTHORIZATION], "Basic YWxpY2U6c2VjcmV0");
    }

    #[tokio::test]
    async fn basic_auth_without_password_uses_empty_string() {
        let request = describe(serde_json::json!({
            "url": "https://api.test/",
            "authentication": {"type": "basic", "basic": [{"key": "username", "value": "alice"}]}
        }));
        let prepared = executor().prepare(&request).await.expect("prepared");
        assert_eq!(prepared.headers()[AUTHORIZATION], "Basic YWxpY2U6");
    }

    #[tokio::test]
    async fn api_key_in_header() {
        let request = describe(serde_json::json!({
            "url": "https://api.test/",
            "authentication": {"type": "apikey", "apikey": [{"key": "X-Api-Key", "value": "k1", "in": "header"}]}
        }));
        let prepared = executor().prepare(&request).await.expect("prepared");
        assert_eq!(prepared.headers()["x-api-key"], "k1");
        assert_eq!(prepared.url().query(), None);
    }

    #[tokio::test]
    async fn api_key_in_query_keeps_existing_parameters() {
        let request = describe(serde_json::json!({
            "url": "https://x.test/a?x=1",
            "authentication": {"type": "apikey", "apikey": [{"key": "k", "value": "v", "in": "query"}]}
        }));
        let prepared = executor().prepare(&request).await.expect("prepared");
        let pairs: Vec<(String, String)> = prepared
            .url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![("x".to_string(), "1".to_string()), ("k".to_string(), "v".to_string())]
        );
    }

    #[tokio::test]
    async fn unknown_auth_type_adds_nothing() {
        let request = describe(serde_json::json!({
            "url": "https://api.test/",
            "authentication": {"type": "digest"}
        }));
        let prepared = executor().prepare(&request).await.expect("prepared");
        assert!(prepared.headers().get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn invalid_method_and_url_become_failed_results() {
        let executor = executor();
        let bad_method = describe(serde_json::json!({"method": "GE T", "url": "https://api.test/"}));
        let result = executor.execute(&bad_method).await;
        assert_eq!(result.status_code, 0);
        assert!(result.body.starts_with("Request failed: invalid HTTP method"));

        let relative = describe(serde_json::json!({"url": "/relative/path"}));
        let result = executor.execute(&relative).await;
        assert_eq!(result.status_code, 0);
        assert_eq!(result.size, 0);
        assert!(result.body.starts_with("Request failed: invalid URL"));
    }

    #[test]
    fn response_headers_join_multiple_values() {
        let mut headers = HeaderMap::new();
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let merged = merge_response_headers(&headers);
        assert_eq!(merged["set-cookie"], "a=1,b=2");
        assert_eq!(merged["content-type"], "text/plain");
    }
}
