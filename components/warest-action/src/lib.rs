//! WARest action node: compiles `resource:operation` pairs into gateway calls
//! and dispatches them with the stored credentials.

pub mod binary;
pub mod builders;
pub mod catalog;
pub mod compiler;
pub mod descriptor;
pub mod dispatch;
pub mod ops;
pub mod options;
pub mod preprocess;
pub mod request;

use serde_json::Value;
use warest_common::{Credentials, WarestError};
use warest_runtime_config::RuntimeConfig;

pub use binary::{BinaryData, BinarySource, NoBinary};
pub use compiler::{compile, compile_with_binary};
pub use descriptor::{Method, OperationDescriptor};
pub use dispatch::{Dispatcher, HttpTransport, UreqTransport};
pub use ops::{ActionInvocation, run_batch};
pub use request::OutboundRequest;

/// Run a batch against the live gateway using the host's runtime settings.
pub fn execute(
    items: &[ActionInvocation],
    creds: Credentials,
    runtime: &RuntimeConfig,
) -> Result<Vec<Value>, WarestError> {
    runtime
        .validate()
        .map_err(|e| WarestError::configuration(e.to_string()))?;
    creds.validate()?;
    let dispatcher = Dispatcher::new(creds, runtime.network.clone());
    run_batch(items, &dispatcher, runtime.execution.continue_on_fail)
}

/// Connectivity check used when the credential is saved.
pub fn test_credentials(creds: Credentials, runtime: &RuntimeConfig) -> Result<Value, WarestError> {
    creds.validate()?;
    Dispatcher::new(creds, runtime.network.clone()).test_credentials()
}
