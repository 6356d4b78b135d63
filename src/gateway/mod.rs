pub mod hubtel;
pub mod mock;
pub mod slydepay;

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::transport::{HttpTransport, Method, OutboundRequest};

pub const MSG_BAD_REQUEST: &str = "Invalid invoice data.";
pub const MSG_UNAUTHORIZED: &str = "Invalid or no API key provided in authorization header.";
pub const MSG_NOT_FOUND: &str = "Requested URL or resource is not found.";
pub const MSG_INTERNAL_ERROR: &str = "An error occurred while processing your request.";

/// Connection settings for one gateway. Fixed for the life of the client.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    base_uri: String,
    api_key: Option<String>,
}

impl GatewayConfig {
    /// Validates `base_uri` as an absolute http(s) URL and drops any trailing
    /// slash. An empty `api_key` is treated as absent.
    pub fn new(
        gateway: &'static str,
        base_uri: &str,
        api_key: Option<String>,
    ) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidBaseUri {
            gateway,
            value: base_uri.to_string(),
        };

        let parsed = reqwest::Url::parse(base_uri).map_err(|_| invalid())?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(invalid());
        }

        Ok(Self {
            base_uri: base_uri.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_uri, path)
    }
}

#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub path: String,
    pub method: Method,
    pub body: Option<Map<String, Value>>,
}

impl RequestSpec {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: Method::Get,
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Map<String, Value>) -> Self {
        Self {
            path: path.into(),
            method: Method::Post,
            body: Some(body),
        }
    }
}

/// Status code plus the decoded body. `body` is `None` when the gateway's
/// reply was not valid JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawResponse {
    pub status_code: u16,
    pub body: Option<Value>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }

    pub fn field_str(&self, pointer: &str) -> Option<&str> {
        self.body.as_ref()?.pointer(pointer)?.as_str()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    BadRequest,
    Unauthorized,
    NotFound,
    #[serde(rename = "internal_server_error")]
    InternalError,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DomainResult {
    Success { payload: Map<String, Value> },
    Failure { kind: FailureKind, message: String },
}

impl DomainResult {
    pub fn success(key: &str, value: impl Into<Value>) -> Self {
        let mut payload = Map::new();
        payload.insert(key.to_string(), value.into());
        DomainResult::Success { payload }
    }

    pub fn failure(kind: FailureKind) -> Self {
        DomainResult::Failure {
            kind,
            message: failure_message(kind).to_string(),
        }
    }

    pub fn from_status(status_code: u16) -> Self {
        let (kind, message) = classify_error(status_code);
        DomainResult::Failure {
            kind,
            message: message.to_string(),
        }
    }

    /// Flat result map handed back to action callers:
    /// `{"status": "success", ..payload}` or `{"status": <kind>, "message": ..}`.
    pub fn to_value(&self) -> Value {
        match self {
            DomainResult::Success { payload } => {
                let mut map = Map::with_capacity(payload.len() + 1);
                map.insert("status".to_string(), Value::from("success"));
                map.extend(payload.iter().map(|(k, v)| (k.clone(), v.clone())));
                Value::Object(map)
            }
            DomainResult::Failure { kind, message } => json!({
                "status": kind,
                "message": message,
            }),
        }
    }
}

fn failure_message(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::BadRequest => MSG_BAD_REQUEST,
        FailureKind::Unauthorized => MSG_UNAUTHORIZED,
        FailureKind::NotFound => MSG_NOT_FOUND,
        FailureKind::InternalError => MSG_INTERNAL_ERROR,
    }
}

/// Buckets an HTTP status code. Total over `u16`: anything that is not
/// 400/401/404 is an internal error, including 200 if it ever gets here.
pub fn classify_error(status_code: u16) -> (FailureKind, &'static str) {
    let kind = match status_code {
        400 => FailureKind::BadRequest,
        401 => FailureKind::Unauthorized,
        404 => FailureKind::NotFound,
        _ => FailureKind::InternalError,
    };
    (kind, failure_message(kind))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    Bearer,
    None,
}

/// Shape of the body synthesized when the transport itself fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorBodyStyle {
    /// `{"errors": <message>}`
    Errors,
    /// `{"errorCode": "INTERNAL_SERVER_ERROR", "errorMessage": <message>}`
    ErrorCodeMessage,
}

impl ErrorBodyStyle {
    fn body(&self, message: String) -> Value {
        match self {
            ErrorBodyStyle::Errors => json!({ "errors": message }),
            ErrorBodyStyle::ErrorCodeMessage => json!({
                "errorCode": "INTERNAL_SERVER_ERROR",
                "errorMessage": message,
            }),
        }
    }
}

/// Request plumbing shared by every gateway client.
pub struct GatewayCore {
    name: &'static str,
    config: GatewayConfig,
    auth: AuthScheme,
    error_style: ErrorBodyStyle,
    transport: Arc<dyn HttpTransport>,
}

impl GatewayCore {
    pub fn new(
        name: &'static str,
        config: GatewayConfig,
        auth: AuthScheme,
        error_style: ErrorBodyStyle,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            name,
            config,
            auth,
            error_style,
            transport,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        if self.auth == AuthScheme::Bearer {
            if let Some(key) = self.config.api_key() {
                headers.push(("Authorization".to_string(), format!("Bearer {}", key)));
            }
        }
        headers
    }

    /// Performs one exchange. Never fails: transport errors come back as a
    /// synthetic 500 carrying this gateway's error body.
    pub async fn build_and_send(&self, spec: RequestSpec) -> RawResponse {
        let request = OutboundRequest {
            method: spec.method,
            url: self.config.url(&spec.path),
            headers: self.headers(),
            body: spec.body.map(Value::Object),
        };

        debug!("{} {} {}", self.name, request.method.as_str(), request.url);

        match self.transport.send(request).await {
            Ok(resp) => {
                let body = serde_json::from_str::<Value>(&resp.text).ok();
                if body.is_none() && !resp.text.is_empty() {
                    debug!("{} returned a non-JSON body (status {})", self.name, resp.status);
                }
                RawResponse {
                    status_code: resp.status,
                    body,
                }
            }
            Err(e) => {
                warn!("{} transport error on {}: {}", self.name, spec.path, e);
                RawResponse {
                    status_code: 500,
                    body: Some(self.error_style.body(e.to_string())),
                }
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeTransport;
    use super::*;

    #[test]
    fn test_classify_error_table() {
        assert_eq!(classify_error(400), (FailureKind::BadRequest, "Invalid invoice data."));
        assert_eq!(
            classify_error(401),
            (
                FailureKind::Unauthorized,
                "Invalid or no API key provided in authorization header."
            )
        );
        assert_eq!(
            classify_error(404),
            (FailureKind::NotFound, "Requested URL or resource is not found.")
        );
        for code in [0u16, 201, 302, 403, 409, 422, 500, 502, 503, 599, u16::MAX] {
            assert_eq!(
                classify_error(code),
                (
                    FailureKind::InternalError,
                    "An error occurred while processing your request."
                ),
                "status {}",
                code
            );
        }
    }

    #[test]
    fn test_classify_error_is_deterministic() {
        for code in 0..=1000u16 {
            assert_eq!(classify_error(code), classify_error(code));
        }
    }

    #[test]
    fn test_config_validation() {
        let cfg = GatewayConfig::new("Hubtel", "https://api.example.com/", Some(String::new())).unwrap();
        assert_eq!(cfg.base_uri(), "https://api.example.com");
        assert_eq!(cfg.api_key(), None);
        assert_eq!(cfg.url("/a/b"), "https://api.example.com/a/b");

        assert!(GatewayConfig::new("Hubtel", "", None).is_err());
        assert!(GatewayConfig::new("Hubtel", "/relative/path", None).is_err());
        assert!(GatewayConfig::new("Hubtel", "ftp://files.example.com", None).is_err());
    }

    #[test]
    fn test_domain_result_serialized_shape() {
        let ok = DomainResult::success("checkout_url", "https://pay.example/abc");
        assert_eq!(
            ok.to_value(),
            json!({"status": "success", "checkout_url": "https://pay.example/abc"})
        );

        let err = DomainResult::from_status(503);
        assert_eq!(
            err.to_value(),
            json!({
                "status": "internal_server_error",
                "message": "An error occurred while processing your request."
            })
        );
        assert_eq!(
            DomainResult::from_status(404).to_value()["status"],
            json!("not_found")
        );
    }

    fn core(transport: Arc<FakeTransport>, auth: AuthScheme, style: ErrorBodyStyle) -> GatewayCore {
        let config =
            GatewayConfig::new("Test", "https://gw.example.com", Some("k3y".to_string())).unwrap();
        GatewayCore::new("Test", config, auth, style, transport)
    }

    #[tokio::test]
    async fn test_build_and_send_decodes_json() {
        let transport = FakeTransport::replying(201, r#"{"ok":true}"#);
        let core = core(transport.clone(), AuthScheme::Bearer, ErrorBodyStyle::Errors);

        let mut body = Map::new();
        body.insert("amount".to_string(), json!(5));
        let resp = core.build_and_send(RequestSpec::post("/x", body)).await;

        assert_eq!(resp, RawResponse { status_code: 201, body: Some(json!({"ok": true})) });
        let sent = transport.last();
        assert_eq!(sent.url, "https://gw.example.com/x");
        assert_eq!(sent.method, Method::Post);
        assert_eq!(sent.body, Some(json!({"amount": 5})));
        assert_eq!(sent.header("content-type"), Some("application/json"));
        assert_eq!(sent.header("authorization"), Some("Bearer k3y"));
    }

    #[tokio::test]
    async fn test_build_and_send_without_bearer() {
        let transport = FakeTransport::replying(200, "not json");
        let core = core(transport.clone(), AuthScheme::None, ErrorBodyStyle::Errors);

        let resp = core.build_and_send(RequestSpec::get("/y")).await;

        assert_eq!(resp, RawResponse { status_code: 200, body: None });
        assert_eq!(transport.last().header("authorization"), None);
        assert_eq!(transport.last().body, None);
    }

    #[tokio::test]
    async fn test_transport_failure_error_bodies() {
        let core_a = core(FakeTransport::failing("boom"), AuthScheme::Bearer, ErrorBodyStyle::Errors);
        let resp = core_a.build_and_send(RequestSpec::get("/z")).await;
        assert_eq!(resp.status_code, 500);
        assert_eq!(resp.body, Some(json!({"errors": "Mock transport error: boom"})));

        let core_b = core(
            FakeTransport::failing("boom"),
            AuthScheme::None,
            ErrorBodyStyle::ErrorCodeMessage,
        );
        let resp = core_b.build_and_send(RequestSpec::get("/z")).await;
        assert_eq!(resp.status_code, 500);
        assert_eq!(
            resp.body,
            Some(json!({
                "errorCode": "INTERNAL_SERVER_ERROR",
                "errorMessage": "Mock transport error: boom"
            }))
        );
    }
}
