//! Pulsar Core Dispatch: from an alias and an argument vector to a result envelope
//!
//! # Overview
//!
//! - **Descriptors**: the registered definition of an operation (alias, help
//!   text, locality flag, argument validator, body)
//! - **Registry**: an explicitly constructed alias → descriptor table
//! - **Placeholder resolution**: swaps resource markers for the live objects
//!   held by the executing side
//! - **Guarded execution**: resolve, invoke, and turn every failure (including
//!   a panicking body) into a [`ResultEnvelope`](pulsar_proto::ResultEnvelope)
//!
//! The same execution path serves both the Star's receive loop and commands
//! that run locally on the client.

pub mod arguments;
pub mod descriptor;
pub mod error;
pub mod execute;
pub mod registry;
pub mod resource;

pub use arguments::Arguments;
pub use descriptor::{CommandBody, CommandDescriptor, Validator};
pub use error::{CommandError, RegistryError, ResolveError, ValidationError};
pub use execute::{dispatch_request, execute};
pub use registry::CommandRegistry;
pub use resource::{resolve, Resolved, Resource, ResourceSet};
