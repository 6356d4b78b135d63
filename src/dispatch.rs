use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// A callback fired when its named action runs. Handlers report every
/// outcome as a value; they never fail.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn handle(&self, args: Value) -> Value;
}

/// Named actions mapped to the handlers registered under them.
#[derive(Default)]
pub struct ActionDispatcher {
    actions: BTreeMap<String, Vec<Arc<dyn ActionHandler>>>,
}

impl ActionDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_action(&mut self, name: &str, handler: Arc<dyn ActionHandler>) {
        self.actions.entry(name.to_string()).or_default().push(handler);
    }

    pub fn action_names(&self) -> Vec<&str> {
        self.actions.keys().map(String::as_str).collect()
    }

    /// Runs every handler under `name` in registration order, each with its
    /// own copy of `args`.
    pub async fn do_action(&self, name: &str, args: Value) -> Vec<Value> {
        let Some(handlers) = self.actions.get(name) else {
            debug!("No handlers registered for action {}", name);
            return Vec::new();
        };

        let mut results = Vec::with_capacity(handlers.len());
        for handler in handlers {
            results.push(handler.handle(args.clone()).await);
        }
        results
    }
}
