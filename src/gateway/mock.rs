use async_trait::async_trait;
use rand::Rng;
use serde_json::{json, Value};

use crate::error::TransportError;
use crate::transport::{HttpTransport, Method, OutboundRequest, TransportResponse};

/// Offline stand-in for both gateways. Answers the known endpoints with
/// plausible 200 bodies and everything else with 404. A body carrying
/// `"simulateFailure": true` fails as if the network dropped.
pub struct MockTransport;

impl MockTransport {
    pub fn new() -> Self {
        Self
    }
}

fn path_of(url: &str) -> &str {
    let rest = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
    rest.find('/').map(|i| &rest[i..]).unwrap_or("/")
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, TransportError> {
        let simulate_failure = request
            .body
            .as_ref()
            .and_then(|b| b.get("simulateFailure"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if simulate_failure {
            return Err(TransportError::Mock("simulated network failure".to_string()));
        }

        let token: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
        let path = path_of(&request.url);

        let body = match (request.method, path) {
            (Method::Post, "/pos/onlinecheckout/items/initiate") => json!({
                "responseCode": "0000",
                "data": {
                    "checkoutId": format!("mock-{}", token),
                    "checkoutDirectUrl": format!("https://checkout.mock/{}", token),
                }
            }),
            (Method::Get, p) if p.starts_with("/pos/onlinecheckout/items/") => json!({
                "responseCode": "0000",
                "data": { "paymentStatus": "pending" }
            }),
            (Method::Post, "/api/merchant/invoice/payoptions") => json!({
                "success": true,
                "result": [
                    { "name": "MTN Mobile Money", "shortName": "MTN_MONEY" },
                    { "name": "Visa", "shortName": "VISA" },
                ],
            }),
            (Method::Post, "/api/merchant/invoice/create") => json!({
                "success": true,
                "result": { "payToken": format!("mock-{}", token) },
            }),
            (Method::Post, "/api/merchant/invoice/send")
            | (Method::Post, "/api/merchant/transaction/confirm") => json!({
                "success": true,
                "result": null,
            }),
            (Method::Post, "/api/merchant/invoice/checkstatus") => json!({
                "success": true,
                "result": "PENDING",
            }),
            _ => {
                return Ok(TransportResponse {
                    status: 404,
                    text: String::new(),
                })
            }
        };

        Ok(TransportResponse {
            status: 200,
            text: body.to_string(),
        })
    }
}
