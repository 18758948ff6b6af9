//! Command descriptors

use crate::arguments::Arguments;
use crate::error::{CommandError, ValidationError};
use pulsar_proto::{Argument, ResultEnvelope};
use std::fmt;
use std::sync::Arc;

/// Turns raw command-line tokens into an argument vector
pub type Validator = Arc<dyn Fn(&[String]) -> Result<Vec<Argument>, ValidationError> + Send + Sync>;

/// The operation itself, run against resolved arguments
pub type CommandBody = Arc<dyn Fn(&Arguments) -> Result<ResultEnvelope, CommandError> + Send + Sync>;

fn no_arguments(_tokens: &[String]) -> Result<Vec<Argument>, ValidationError> {
    Ok(Vec::new())
}

/// Registered definition of an operation.
///
/// Immutable once built. Cloning is cheap: the validator and the body are
/// shared.
#[derive(Clone)]
pub struct CommandDescriptor {
    alias: String,
    help: String,
    client_only: bool,
    validator: Validator,
    body: CommandBody,
}

impl CommandDescriptor {
    /// Create a descriptor that takes no arguments
    ///
    /// # Arguments
    ///
    /// * `alias` - Unique name the command is looked up by
    /// * `help` - One-line usage text shown by `help`
    /// * `body` - The operation
    pub fn new<F>(alias: impl Into<String>, help: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Arguments) -> Result<ResultEnvelope, CommandError> + Send + Sync + 'static,
    {
        Self {
            alias: alias.into(),
            help: help.into(),
            client_only: false,
            validator: Arc::new(no_arguments),
            body: Arc::new(body),
        }
    }

    /// Attach an argument validator
    pub fn with_validator<V>(mut self, validator: V) -> Self
    where
        V: Fn(&[String]) -> Result<Vec<Argument>, ValidationError> + Send + Sync + 'static,
    {
        self.validator = Arc::new(validator);
        self
    }

    /// Mark the command as running where it was invoked, never forwarded
    pub fn client_only(mut self) -> Self {
        self.client_only = true;
        self
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn is_client_only(&self) -> bool {
        self.client_only
    }

    /// Build the argument vector from raw tokens
    pub fn validate(&self, tokens: &[String]) -> Result<Vec<Argument>, ValidationError> {
        (self.validator)(tokens)
    }

    /// Run the body. Callers normally go through [`crate::execute`] instead,
    /// which resolves placeholders and guards against panics.
    pub fn invoke(&self, args: &Arguments) -> Result<ResultEnvelope, CommandError> {
        (self.body)(args)
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("alias", &self.alias)
            .field("client_only", &self.client_only)
            .finish_non_exhaustive()
    }
}
