use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use super::{
    AuthScheme, DomainResult, ErrorBodyStyle, FailureKind, GatewayConfig, GatewayCore, RawResponse,
    RequestSpec,
};
use crate::dispatch::{ActionDispatcher, ActionHandler};
use crate::transport::HttpTransport;

pub const DEFAULT_BASE_URI: &str = "https://app.slydepay.com.gh";

/// Slydepay merchant operations. Every call is a JSON POST whose raw
/// response is handed back untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlydepayOp {
    PayOptions,
    CreateInvoice,
    SendInvoice,
    CheckPaymentStatus,
    ConfirmTransaction,
}

impl SlydepayOp {
    pub const ALL: [SlydepayOp; 5] = [
        SlydepayOp::PayOptions,
        SlydepayOp::CreateInvoice,
        SlydepayOp::SendInvoice,
        SlydepayOp::CheckPaymentStatus,
        SlydepayOp::ConfirmTransaction,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            SlydepayOp::PayOptions => "/api/merchant/invoice/payoptions",
            SlydepayOp::CreateInvoice => "/api/merchant/invoice/create",
            SlydepayOp::SendInvoice => "/api/merchant/invoice/send",
            SlydepayOp::CheckPaymentStatus => "/api/merchant/invoice/checkstatus",
            SlydepayOp::ConfirmTransaction => "/api/merchant/transaction/confirm",
        }
    }

    /// Action name this operation is registered under. The plugin-era hook
    /// `init_slydepay_merchant` carried all five operations at once, so
    /// firing it also confirmed transactions; it is not registered, and
    /// hosts must fire the per-operation names instead.
    pub fn action(&self) -> &'static str {
        match self {
            SlydepayOp::PayOptions => "slydepay_get_pay_options",
            SlydepayOp::CreateInvoice => "slydepay_create_invoice",
            SlydepayOp::SendInvoice => "slydepay_send_invoice",
            SlydepayOp::CheckPaymentStatus => "slydepay_check_payment_status",
            SlydepayOp::ConfirmTransaction => "slydepay_confirm_transaction",
        }
    }
}

pub struct SlydepayClient {
    core: GatewayCore,
}

impl SlydepayClient {
    pub fn new(config: GatewayConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            core: GatewayCore::new(
                "Slydepay",
                config,
                AuthScheme::None,
                ErrorBodyStyle::ErrorCodeMessage,
                transport,
            ),
        }
    }

    pub fn name(&self) -> &str {
        self.core.name()
    }

    async fn call(&self, op: SlydepayOp, data: Map<String, Value>) -> RawResponse {
        self.core.build_and_send(RequestSpec::post(op.path(), data)).await
    }

    /// Lists the payment options available to the merchant.
    pub async fn get_pay_options(&self, merchant_info: Map<String, Value>) -> RawResponse {
        self.call(SlydepayOp::PayOptions, merchant_info).await
    }

    /// Creates an invoice; the gateway replies with a pay token.
    pub async fn create_invoice(&self, invoice_details: Map<String, Value>) -> RawResponse {
        self.call(SlydepayOp::CreateInvoice, invoice_details).await
    }

    /// Sends a previously created invoice to the customer.
    pub async fn send_invoice(&self, invoice_details: Map<String, Value>) -> RawResponse {
        self.call(SlydepayOp::SendInvoice, invoice_details).await
    }

    pub async fn check_payment_status(&self, payment_info: Map<String, Value>) -> RawResponse {
        self.call(SlydepayOp::CheckPaymentStatus, payment_info).await
    }

    pub async fn confirm_transaction(&self, transaction_details: Map<String, Value>) -> RawResponse {
        self.call(SlydepayOp::ConfirmTransaction, transaction_details).await
    }

    pub fn register(self: &Arc<Self>, dispatcher: &mut ActionDispatcher) {
        for op in SlydepayOp::ALL {
            dispatcher.add_action(
                op.action(),
                Arc::new(SlydepayAction {
                    client: Arc::clone(self),
                    op,
                }),
            );
        }
    }
}

struct SlydepayAction {
    client: Arc<SlydepayClient>,
    op: SlydepayOp,
}

#[async_trait]
impl ActionHandler for SlydepayAction {
    async fn handle(&self, args: Value) -> Value {
        let Value::Object(data) = args else {
            return DomainResult::failure(FailureKind::BadRequest).to_value();
        };

        let resp = match self.op {
            SlydepayOp::PayOptions => self.client.get_pay_options(data).await,
            SlydepayOp::CreateInvoice => self.client.create_invoice(data).await,
            SlydepayOp::SendInvoice => self.client.send_invoice(data).await,
            SlydepayOp::CheckPaymentStatus => self.client.check_payment_status(data).await,
            SlydepayOp::ConfirmTransaction => self.client.confirm_transaction(data).await,
        };

        serde_json::to_value(&resp).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::FakeTransport;
    use crate::transport::Method;
    use serde_json::json;

    fn client(transport: Arc<FakeTransport>) -> SlydepayClient {
        let config = GatewayConfig::new("Slydepay", DEFAULT_BASE_URI, None).unwrap();
        SlydepayClient::new(config, transport)
    }

    fn details() -> Map<String, Value> {
        match json!({"emailOrMobileNumber": "merchant@example.com", "merchantKey": "mk"}) {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_confirm_transaction_returns_raw_response() {
        let body = r#"{"success":true,"result":{"confirmed":1},"errorMessage":null}"#;
        let transport = FakeTransport::replying(200, body);
        let resp = client(transport.clone()).confirm_transaction(details()).await;

        assert_eq!(
            resp,
            RawResponse {
                status_code: 200,
                body: Some(serde_json::from_str(body).unwrap()),
            }
        );
        let sent = transport.last();
        assert_eq!(sent.method, Method::Post);
        assert_eq!(
            sent.url,
            "https://app.slydepay.com.gh/api/merchant/transaction/confirm"
        );
        assert_eq!(sent.header("content-type"), Some("application/json"));
        assert_eq!(sent.header("authorization"), None);
    }

    #[tokio::test]
    async fn test_every_operation_hits_its_path_unwrapped() {
        let transport = FakeTransport::replying(200, r#"{"anything":[1,2,3]}"#);
        let client = client(transport.clone());

        let responses = vec![
            client.get_pay_options(details()).await,
            client.create_invoice(details()).await,
            client.send_invoice(details()).await,
            client.check_payment_status(details()).await,
            client.confirm_transaction(details()).await,
        ];

        let urls: Vec<String> = transport.seen.lock().unwrap().iter().map(|r| r.url.clone()).collect();
        for (op, url) in SlydepayOp::ALL.iter().zip(&urls) {
            assert_eq!(url, &format!("{}{}", DEFAULT_BASE_URI, op.path()));
        }
        for resp in responses {
            assert_eq!(resp.body, Some(json!({"anything": [1, 2, 3]})));
        }
    }

    #[tokio::test]
    async fn test_error_status_is_not_classified() {
        let transport = FakeTransport::replying(401, r#"{"errorCode":"AUTH"}"#);
        let resp = client(transport).send_invoice(details()).await;

        assert_eq!(resp.status_code, 401);
        assert_eq!(resp.body, Some(json!({"errorCode": "AUTH"})));
    }

    #[tokio::test]
    async fn test_invalid_json_keeps_status_with_null_body() {
        let resp = client(FakeTransport::replying(200, "OK")).create_invoice(details()).await;
        assert_eq!(resp, RawResponse { status_code: 200, body: None });
    }

    #[tokio::test]
    async fn test_network_failure_is_synthetic_500() {
        let resp = client(FakeTransport::failing("timed out"))
            .check_payment_status(details())
            .await;

        assert_eq!(resp.status_code, 500);
        assert_eq!(resp.body.as_ref().unwrap()["errorCode"], json!("INTERNAL_SERVER_ERROR"));
        assert_eq!(
            resp.body.as_ref().unwrap()["errorMessage"],
            json!("Mock transport error: timed out")
        );
    }

    #[tokio::test]
    async fn test_registered_actions_return_raw_shape() {
        let transport = FakeTransport::replying(200, r#"{"payToken":"t-1"}"#);
        let client = Arc::new(client(transport.clone()));
        let mut dispatcher = ActionDispatcher::new();
        client.register(&mut dispatcher);

        for op in SlydepayOp::ALL {
            assert!(dispatcher.action_names().contains(&op.action()));
        }

        let out = dispatcher
            .do_action("slydepay_create_invoice", Value::Object(details()))
            .await;
        assert_eq!(out, vec![json!({"status_code": 200, "body": {"payToken": "t-1"}})]);
        assert!(transport.last().url.ends_with("/api/merchant/invoice/create"));

        let out = dispatcher
            .do_action("init_slydepay_merchant", Value::Object(details()))
            .await;
        assert!(out.is_empty());
        assert_eq!(transport.count(), 1);

        let out = dispatcher.do_action("slydepay_send_invoice", json!([1, 2])).await;
        assert_eq!(out[0]["status"], json!("bad_request"));
        assert_eq!(transport.count(), 1);
    }
}
