//! Guarded execution
//!
//! Every failure between "we have an alias and arguments" and "we have an
//! envelope" is converted here: unresolved placeholders, typed-access errors
//! inside a body, and panics. Nothing escapes as an unwinding panic.

use crate::arguments::Arguments;
use crate::descriptor::CommandDescriptor;
use crate::registry::CommandRegistry;
use crate::resource::{resolve, ResourceSet};
use pulsar_proto::{Argument, ResultEnvelope, StatusCode};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, warn};

/// Resolve placeholders against `resources`, then run the descriptor's body.
pub fn execute(
    descriptor: &CommandDescriptor,
    args: Vec<Argument>,
    resources: &ResourceSet,
) -> ResultEnvelope {
    let resolved = match resolve(args, resources) {
        Ok(resolved) => resolved,
        Err(e) => {
            warn!("Command {} not executed: {}", descriptor.alias(), e);
            return ResultEnvelope::with_message(StatusCode::InternalError, e.to_string());
        }
    };
    let arguments = Arguments::new(resolved);

    debug!("Executing command {}", descriptor.alias());

    match panic::catch_unwind(AssertUnwindSafe(|| descriptor.invoke(&arguments))) {
        Ok(Ok(envelope)) => envelope,
        Ok(Err(e)) => {
            warn!("Command {} failed: {}", descriptor.alias(), e);
            e.into_envelope()
        }
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            error!("Command {} panicked: {}", descriptor.alias(), reason);
            ResultEnvelope::with_message(
                StatusCode::InternalError,
                format!("Command {} failed unexpectedly: {}", descriptor.alias(), reason),
            )
        }
    }
}

/// Execute a request that arrived from a remote peer.
///
/// Unknown aliases and client-only commands are rejected without running
/// anything.
pub fn dispatch_request(
    registry: &CommandRegistry,
    alias: &str,
    args: Vec<Argument>,
    resources: &ResourceSet,
) -> ResultEnvelope {
    let Some(descriptor) = registry.lookup(alias) else {
        warn!("Rejecting unknown command: {}", alias);
        return ResultEnvelope::with_message(
            StatusCode::OperationRejected,
            format!("Unknown command: {}", alias),
        );
    };

    if descriptor.is_client_only() {
        warn!("Rejecting client-only command: {}", alias);
        return ResultEnvelope::with_message(
            StatusCode::OperationRejected,
            format!("Command {} can only run on the client", alias),
        );
    }

    execute(&descriptor, args, resources)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
