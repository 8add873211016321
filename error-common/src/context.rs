//! Request metadata attached to reported errors
//!
//! Collected before the handler consumes the request:
//! - Request ID extraction/generation
//! - Method, path and decoded query
//! - Remote address (peer, then proxy headers)
//! - User-Agent

use axum::extract::{ConnectInfo, Query};
use axum::http::{header, HeaderMap, Request, Uri};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use uuid::Uuid;

/// Request-error context handed to the reporting client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestErrorContext {
    /// Time the request was received, milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Unique request ID for correlation
    pub id: String,
    /// Lower-case HTTP method
    pub method: String,
    pub path: String,
    pub query: BTreeMap<String, String>,
    pub remote_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestErrorContext {
    pub fn from_request<B>(request: &Request<B>) -> Self {
        let headers = request.headers();

        let remote_address = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string())
            .or_else(|| forwarded_address(headers));

        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .map(ToString::to_string);

        Self {
            timestamp: chrono::Utc::now().timestamp_millis(),
            id: request_id(headers),
            method: request.method().as_str().to_ascii_lowercase(),
            path: request.uri().path().to_string(),
            query: parse_query(request.uri()),
            remote_address,
            user_agent,
        }
    }
}

/// Extract request ID from headers or generate a new one
fn request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|h| h.to_str().ok())
        .filter(|s| !s.is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), ToString::to_string)
}

fn forwarded_address(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.trim().to_string())
        })
}

/// Decode `a=1&b=two+words` into a map. Repeated keys keep the last value.
fn parse_query(uri: &Uri) -> BTreeMap<String, String> {
    match Query::<Vec<(String, String)>>::try_from_uri(uri) {
        Ok(Query(pairs)) => pairs.into_iter().collect(),
        Err(e) => {
            tracing::debug!(error = %e, "Unparseable query string left out of error context");
            BTreeMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::HeaderValue;

    fn request(uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    #[test]
    fn test_basic_fields() {
        let mut req = request("/patients/42");
        req.headers_mut()
            .insert(header::USER_AGENT, HeaderValue::from_static("shot"));
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));

        let ctx = RequestErrorContext::from_request(&req);
        assert_eq!(ctx.method, "get");
        assert_eq!(ctx.path, "/patients/42");
        assert!(ctx.query.is_empty());
        assert_eq!(ctx.remote_address.as_deref(), Some("127.0.0.1"));
        assert_eq!(ctx.user_agent.as_deref(), Some("shot"));
        assert!(!ctx.id.is_empty());
        assert!(ctx.timestamp > 0);
    }

    #[test]
    fn test_request_id_header_is_reused() {
        let mut req = request("/");
        req.headers_mut()
            .insert("x-request-id", HeaderValue::from_static("req-123"));

        assert_eq!(RequestErrorContext::from_request(&req).id, "req-123");
    }

    #[test]
    fn test_query_decoding() {
        let ctx = RequestErrorContext::from_request(&request(
            "/search?name=John+Doe&ward=a%2Fb&flag&ward=c",
        ));

        assert_eq!(ctx.query.get("name").map(String::as_str), Some("John Doe"));
        assert_eq!(ctx.query.get("flag").map(String::as_str), Some(""));
        // last duplicate wins
        assert_eq!(ctx.query.get("ward").map(String::as_str), Some("c"));
    }

    #[test]
    fn test_forwarded_address_fallbacks() {
        let mut req = request("/");
        req.headers_mut().insert(
            "x-forwarded-for",
            HeaderValue::from_static("10.0.0.7, 172.16.0.1"),
        );
        assert_eq!(
            RequestErrorContext::from_request(&req).remote_address.as_deref(),
            Some("10.0.0.7")
        );

        let mut req = request("/");
        req.headers_mut()
            .insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        assert_eq!(
            RequestErrorContext::from_request(&req).remote_address.as_deref(),
            Some("10.0.0.9")
        );

        assert_eq!(RequestErrorContext::from_request(&request("/")).remote_address, None);
    }

    #[test]
    fn test_serializes_camel_case() {
        let mut req = request("/");
        req.headers_mut()
            .insert(header::USER_AGENT, HeaderValue::from_static("shot"));
        let value = serde_json::to_value(RequestErrorContext::from_request(&req)).expect("json");

        assert_eq!(value["userAgent"], "shot");
        assert!(value.get("remoteAddress").is_some());
        assert_eq!(value["query"], serde_json::json!({}));
    }
}
