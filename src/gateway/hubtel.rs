use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, warn};

use super::{
    AuthScheme, DomainResult, ErrorBodyStyle, FailureKind, GatewayConfig, GatewayCore,
    RequestSpec,
};
use crate::dispatch::{ActionDispatcher, ActionHandler};
use crate::transport::HttpTransport;

pub const ACTION_CREATE_INVOICE: &str = "init_hubtel_checkout";
pub const ACTION_INVOICE_STATUS: &str = "check_hubtel_payment_status";

const INITIATE_PATH: &str = "/pos/onlinecheckout/items/initiate";
const ITEMS_PATH: &str = "/pos/onlinecheckout/items";

/// Hubtel online checkout. Bearer-authenticated; successful replies are
/// unwrapped into a single payload field.
pub struct HubtelClient {
    core: GatewayCore,
}

impl HubtelClient {
    pub fn new(config: GatewayConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            core: GatewayCore::new(
                "Hubtel",
                config,
                AuthScheme::Bearer,
                ErrorBodyStyle::Errors,
                transport,
            ),
        }
    }

    pub fn name(&self) -> &str {
        self.core.name()
    }

    /// Starts a checkout. Success carries `checkout_url`.
    pub async fn create_invoice(&self, invoice_data: Map<String, Value>) -> DomainResult {
        let resp = self
            .core
            .build_and_send(RequestSpec::post(INITIATE_PATH, invoice_data))
            .await;

        if !resp.is_success() {
            return DomainResult::from_status(resp.status_code);
        }

        match resp.field_str("/data/checkoutDirectUrl") {
            Some(url) => {
                info!("Hubtel checkout initiated");
                DomainResult::success("checkout_url", url)
            }
            None => {
                warn!("Hubtel 200 reply is missing data.checkoutDirectUrl");
                DomainResult::failure(FailureKind::InternalError)
            }
        }
    }

    /// Success carries `payment_status`.
    pub async fn get_invoice_status(&self, invoice_number: &str) -> DomainResult {
        let path = format!("{}/{}", ITEMS_PATH, invoice_number);
        let resp = self.core.build_and_send(RequestSpec::get(path)).await;

        if !resp.is_success() {
            return DomainResult::from_status(resp.status_code);
        }

        match resp.field_str("/data/paymentStatus") {
            Some(status) => DomainResult::success("payment_status", status),
            None => {
                warn!("Hubtel 200 reply is missing data.paymentStatus for {}", invoice_number);
                DomainResult::failure(FailureKind::InternalError)
            }
        }
    }

    pub fn register(self: &Arc<Self>, dispatcher: &mut ActionDispatcher) {
        dispatcher.add_action(
            ACTION_CREATE_INVOICE,
            Arc::new(HubtelAction {
                client: Arc::clone(self),
                op: HubtelOp::CreateInvoice,
            }),
        );
        dispatcher.add_action(
            ACTION_INVOICE_STATUS,
            Arc::new(HubtelAction {
                client: Arc::clone(self),
                op: HubtelOp::InvoiceStatus,
            }),
        );
    }
}

#[derive(Debug, Clone, Copy)]
enum HubtelOp {
    CreateInvoice,
    InvoiceStatus,
}

struct HubtelAction {
    client: Arc<HubtelClient>,
    op: HubtelOp,
}

#[async_trait]
impl ActionHandler for HubtelAction {
    async fn handle(&self, args: Value) -> Value {
        let result = match (self.op, args) {
            (HubtelOp::CreateInvoice, Value::Object(invoice)) => {
                self.client.create_invoice(invoice).await
            }
            (HubtelOp::InvoiceStatus, Value::String(number)) => {
                self.client.get_invoice_status(&number).await
            }
            _ => DomainResult::failure(FailureKind::BadRequest),
        };
        result.to_value()
    }
}
