//! Batch execution with the host's continue-on-failure policy.

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};
use tracing::{info, warn};
use warest_common::WarestError;

use crate::binary::BinaryData;
use crate::compiler::compile_with_binary;
use crate::dispatch::{Dispatcher, HttpTransport};

/// One input item: the operation to run and its parameters.
#[derive(Debug, Clone, Default)]
pub struct ActionInvocation {
    pub resource: String,
    pub operation: String,
    pub params: Map<String, Value>,
    pub binary: BTreeMap<String, BinaryData>,
}

impl ActionInvocation {
    pub fn new(
        resource: impl Into<String>,
        operation: impl Into<String>,
        params: Map<String, Value>,
    ) -> Self {
        Self {
            resource: resource.into(),
            operation: operation.into(),
            params,
            binary: BTreeMap::new(),
        }
    }
}

pub fn run_one<T: HttpTransport>(
    item: &ActionInvocation,
    dispatcher: &Dispatcher<T>,
) -> Result<Value, WarestError> {
    let request = compile_with_binary(
        &item.resource,
        &item.operation,
        &item.params,
        dispatcher.credentials(),
        &item.binary,
    )?;
    dispatcher.send(&request)
}

/// Run every item in order, one output per input.
///
/// With `continue_on_fail` a failing item yields `{"error": message}` and the
/// batch goes on; otherwise the first error is returned.
pub fn run_batch<T: HttpTransport>(
    items: &[ActionInvocation],
    dispatcher: &Dispatcher<T>,
    continue_on_fail: bool,
) -> Result<Vec<Value>, WarestError> {
    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match run_one(item, dispatcher) {
            Ok(value) => out.push(value),
            Err(err) if continue_on_fail => {
                warn!(index, error = %err, "warest item failed, continuing");
                out.push(json!({ "error": err.to_string() }));
            }
            Err(err) => return Err(err),
        }
    }
    info!(items = items.len(), outputs = out.len(), "batch finished");
    Ok(out)
}
