use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::error::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl OutboundRequest {
    #[cfg(test)]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status code and undecoded body text of a completed exchange.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub text: String,
}

/// Performs a single HTTP exchange. Timeouts and cancellation belong to the
/// implementation; callers never retry.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, TransportError>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, TransportError> {
        let mut req = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };

        for (name, value) in &request.headers {
            req = req.header(name, value);
        }

        // Content-Type comes from the caller's headers, so encode by hand
        // rather than letting `.json()` add its own.
        if let Some(body) = &request.body {
            req = req.body(serde_json::to_vec(body)?);
        }

        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let text = resp.text().await?;

        Ok(TransportResponse { status, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::{MockServer, GET, POST};
    use serde_json::json;

    fn request(method: Method, url: String, body: Option<Value>) -> OutboundRequest {
        OutboundRequest {
            method,
            url,
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Authorization".to_string(), "Bearer secret".to_string()),
            ],
            body,
        }
    }

    #[tokio::test]
    async fn test_post_sends_headers_and_json_body() {
        let server = MockServer::start_async().await;
        let m = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/pos/onlinecheckout/items/initiate")
                    .header("content-type", "application/json")
                    .header("authorization", "Bearer secret")
                    .json_body(json!({"totalAmount": 10}));
                then.status(200).body(r#"{"data":{"checkoutDirectUrl":"x"}}"#);
            })
            .await;

        let transport = ReqwestTransport::new(None).unwrap();
        let url = format!("{}/pos/onlinecheckout/items/initiate", server.base_url());
        let resp = transport
            .send(request(Method::Post, url, Some(json!({"totalAmount": 10}))))
            .await
            .unwrap();

        m.assert_async().await;
        assert_eq!(resp.status, 200);
        assert_eq!(resp.text, r#"{"data":{"checkoutDirectUrl":"x"}}"#);
    }

    #[tokio::test]
    async fn test_get_surfaces_error_status_and_text() {
        let server = MockServer::start_async().await;
        let _m = server
            .mock_async(|when, then| {
                when.method(GET).path("/missing");
                then.status(404).body("not here");
            })
            .await;

        let transport = ReqwestTransport::new(Some(Duration::from_secs(5))).unwrap();
        let url = format!("{}/missing", server.base_url());
        let resp = transport.send(request(Method::Get, url, None)).await.unwrap();

        assert_eq!(resp.status, 404);
        assert_eq!(resp.text, "not here");
    }

    #[tokio::test]
    async fn test_connection_failure_is_request_error() {
        let transport = ReqwestTransport::new(Some(Duration::from_secs(2))).unwrap();
        let err = transport
            .send(request(Method::Get, "http://127.0.0.1:1/nope".to_string(), None))
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Request(_)));
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let req = request(Method::Get, "http://localhost".to_string(), None);
        assert_eq!(req.header("authorization"), Some("Bearer secret"));
        assert_eq!(req.header("x-missing"), None);
    }
}
