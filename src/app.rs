use serde_json::Value;

use crate::config::AppConfig;
use crate::gateway::{hubtel, slydepay::SlydepayOp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gateway {
    Hubtel,
    Slydepay,
}

impl Gateway {
    pub fn label(&self) -> &'static str {
        match self {
            Gateway::Hubtel => "Hubtel",
            Gateway::Slydepay => "Slydepay",
        }
    }
}

pub const GATEWAYS: &[Gateway] = &[Gateway::Hubtel, Gateway::Slydepay];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// A JSON object.
    Object,
    /// A bare identifier, sent as a JSON string.
    Text,
}

#[derive(Debug, Clone)]
pub struct Operation {
    pub gateway: Gateway,
    pub label: &'static str,
    pub action: &'static str,
    pub arg: ArgKind,
    pub template: &'static str,
}

pub fn operations() -> Vec<Operation> {
    let mut ops = vec![
        Operation {
            gateway: Gateway::Hubtel,
            label: "Create invoice",
            action: hubtel::ACTION_CREATE_INVOICE,
            arg: ArgKind::Object,
            template: r#"{"totalAmount": 1.0, "description": "", "callbackUrl": "", "returnUrl": "", "merchantAccountNumber": "", "clientReference": ""}"#,
        },
        Operation {
            gateway: Gateway::Hubtel,
            label: "Check payment status",
            action: hubtel::ACTION_INVOICE_STATUS,
            arg: ArgKind::Text,
            template: "",
        },
    ];

    for op in SlydepayOp::ALL {
        let (label, template) = match op {
            SlydepayOp::PayOptions => (
                "List pay options",
                r#"{"emailOrMobileNumber": "", "merchantKey": ""}"#,
            ),
            SlydepayOp::CreateInvoice => (
                "Create invoice",
                r#"{"emailOrMobileNumber": "", "merchantKey": "", "amount": 1.0, "orderCode": ""}"#,
            ),
            SlydepayOp::SendInvoice => (
                "Send invoice",
                r#"{"emailOrMobileNumber": "", "merchantKey": "", "payToken": "", "customerEmailOrMobileNumber": ""}"#,
            ),
            SlydepayOp::CheckPaymentStatus => (
                "Check payment status",
                r#"{"emailOrMobileNumber": "", "merchantKey": "", "orderCode": "", "confirmTransaction": false}"#,
            ),
            SlydepayOp::ConfirmTransaction => (
                "Confirm transaction",
                r#"{"emailOrMobileNumber": "", "merchantKey": "", "payToken": "", "transactionId": ""}"#,
            ),
        };
        ops.push(Operation {
            gateway: Gateway::Slydepay,
            label,
            action: op.action(),
            arg: ArgKind::Object,
            template,
        });
    }

    ops
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppPhase {
    GatewaySelect,
    OperationSelect,
    Input,
    Waiting,
    Result,
}

#[derive(Debug, Clone)]
pub struct CallRecord {
    pub at: chrono::DateTime<chrono::Utc>,
    pub gateway: Gateway,
    pub label: &'static str,
    pub action: String,
    pub results: Vec<Value>,
}

pub struct App {
    pub config: AppConfig,
    pub phase: AppPhase,
    pub cursor: usize,
    pub gateway: Gateway,
    pub input: String,
    pub history: Vec<CallRecord>,
    pub error_message: Option<String>,
    pub tick: u32,
    operations: Vec<Operation>,
    registered: Vec<String>,
}

impl App {
    /// `registered` lists the actions the dispatcher actually carries.
    pub fn new(config: AppConfig, registered: Vec<String>) -> Self {
        Self {
            config,
            phase: AppPhase::GatewaySelect,
            cursor: 0,
            gateway: Gateway::Slydepay,
            input: String::new(),
            history: Vec::new(),
            error_message: None,
            tick: 0,
            operations: operations(),
            registered,
        }
    }

    pub fn gateway_enabled(&self, gateway: Gateway) -> bool {
        self.operations
            .iter()
            .any(|op| op.gateway == gateway && self.registered.iter().any(|a| a == op.action))
    }

    pub fn current_operations(&self) -> Vec<&Operation> {
        self.operations
            .iter()
            .filter(|op| op.gateway == self.gateway)
            .collect()
    }

    pub fn selected_operation(&self) -> Option<&Operation> {
        self.current_operations().get(self.cursor).copied()
    }

    pub fn cursor_limit(&self) -> usize {
        match self.phase {
            AppPhase::GatewaySelect => GATEWAYS.len(),
            AppPhase::OperationSelect => self.current_operations().len(),
            _ => 0,
        }
    }

    pub fn move_cursor(&mut self, down: bool) {
        let limit = self.cursor_limit();
        if down {
            if self.cursor + 1 < limit {
                self.cursor += 1;
            }
        } else if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    /// Returns false when the highlighted gateway has no registered actions.
    pub fn choose_gateway(&mut self) -> bool {
        let gateway = GATEWAYS[self.cursor.min(GATEWAYS.len() - 1)];
        if !self.gateway_enabled(gateway) {
            self.error_message = Some(format!("{} is not configured", gateway.label()));
            return false;
        }
        self.gateway = gateway;
        self.error_message = None;
        self.cursor = 0;
        self.phase = AppPhase::OperationSelect;
        true
    }

    pub fn choose_operation(&mut self) {
        if let Some(op) = self.selected_operation() {
            self.input = op.template.to_string();
            self.error_message = None;
            self.phase = AppPhase::Input;
        }
    }

    pub fn back(&mut self) {
        self.error_message = None;
        match self.phase {
            AppPhase::OperationSelect => {
                self.cursor = GATEWAYS.iter().position(|g| *g == self.gateway).unwrap_or(0);
                self.phase = AppPhase::GatewaySelect;
            }
            AppPhase::Input | AppPhase::Result => {
                self.input.clear();
                self.phase = AppPhase::OperationSelect;
            }
            AppPhase::GatewaySelect | AppPhase::Waiting => {}
        }
    }

    /// Parses the typed arguments for the selected operation.
    pub fn parse_input(&self) -> Result<(&'static str, Value), String> {
        let op = self.selected_operation().ok_or("No operation selected")?;
        let args = match op.arg {
            ArgKind::Text => {
                let text = self.input.trim();
                if text.is_empty() {
                    return Err("Enter an invoice number".to_string());
                }
                Value::String(text.to_string())
            }
            ArgKind::Object => {
                let value: Value = serde_json::from_str(self.input.trim())
                    .map_err(|e| format!("Invalid JSON: {}", e))?;
                if !value.is_object() {
                    return Err("Arguments must be a JSON object".to_string());
                }
                value
            }
        };
        Ok((op.action, args))
    }

    pub fn record_result(&mut self, action: String, results: Vec<Value>) {
        let label = self
            .operations
            .iter()
            .find(|op| op.action == action)
            .map(|op| op.label)
            .unwrap_or("Unknown");
        self.history.push(CallRecord {
            at: chrono::Utc::now(),
            gateway: self.gateway,
            label,
            action,
            results,
        });
        self.phase = AppPhase::Result;
    }

    pub fn last_call(&self) -> Option<&CallRecord> {
        self.history.last()
    }
}
