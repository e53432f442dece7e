use serde::Serialize;
use serde_json::Value;

/// Body of `POST /view`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewRequest {
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<Value>,
}

impl ViewRequest {
    pub fn new(function: impl Into<String>, arguments: Vec<Value>) -> Self {
        Self {
            function: function.into(),
            type_arguments: Vec::new(),
            arguments,
        }
    }
}

/// State of a submitted transaction as seen by the node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Unknown to the node yet, or still in the mempool
    Pending,
    Committed { version: Option<u64> },
    Failed { vm_status: String },
}

impl TransactionStatus {
    /// Interpret a `GET /transactions/by_hash` body
    pub fn from_json(body: &Value) -> Self {
        if body.get("type").and_then(Value::as_str) == Some("pending_transaction") {
            return TransactionStatus::Pending;
        }
        let version = body
            .get("version")
            .and_then(|v| v.as_str().and_then(|s| s.parse().ok()).or_else(|| v.as_u64()));
        match body.get("success").and_then(Value::as_bool) {
            Some(true) => TransactionStatus::Committed { version },
            Some(false) => TransactionStatus::Failed {
                vm_status: body
                    .get("vm_status")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown vm status")
                    .to_string(),
            },
            None => TransactionStatus::Pending,
        }
    }

    pub fn is_final(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}
