//! Command registry
//!
//! An explicitly constructed alias → descriptor table. Both sides of a
//! connection build an identical registry at startup and share it by `Arc`
//! with whichever component needs lookups.

use crate::descriptor::CommandDescriptor;
use crate::error::RegistryError;
use crate::resource::Resource;
use pulsar_proto::ResourceKind;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Registry of command descriptors keyed by alias
///
/// # Example
///
/// ```
/// use pulsar_core_dispatch::{CommandDescriptor, CommandRegistry, RegistryError};
/// use pulsar_proto::ResultEnvelope;
///
/// let registry = CommandRegistry::new();
/// registry
///     .register(CommandDescriptor::new("ping", "ping : reply", |_| Ok(ResultEnvelope::ok("pong"))))
///     .unwrap();
///
/// let duplicate = CommandDescriptor::new("ping", "again", |_| Ok(ResultEnvelope::ok_empty()));
/// assert_eq!(
///     registry.register(duplicate),
///     Err(RegistryError::AlreadyExists("ping".to_string()))
/// );
/// assert!(registry.lookup("ping").is_some());
/// ```
#[derive(Default)]
pub struct CommandRegistry {
    commands: RwLock<HashMap<String, Arc<CommandDescriptor>>>,
}

impl CommandRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a descriptor; fails if the alias is taken
    pub fn register(&self, descriptor: CommandDescriptor) -> Result<(), RegistryError> {
        let mut commands = self.commands.write().unwrap_or_else(PoisonError::into_inner);
        if commands.contains_key(descriptor.alias()) {
            return Err(RegistryError::AlreadyExists(descriptor.alias().to_string()));
        }
        debug!("Registering command: {}", descriptor.alias());
        commands.insert(descriptor.alias().to_string(), Arc::new(descriptor));
        Ok(())
    }

    /// Insert a batch of descriptors, all or nothing.
    ///
    /// If any alias is already registered, or appears twice in the batch,
    /// nothing is inserted.
    pub fn register_many(
        &self,
        descriptors: impl IntoIterator<Item = CommandDescriptor>,
    ) -> Result<(), RegistryError> {
        let descriptors: Vec<CommandDescriptor> = descriptors.into_iter().collect();
        let mut commands = self.commands.write().unwrap_or_else(PoisonError::into_inner);

        let mut seen = HashSet::new();
        for descriptor in &descriptors {
            let alias = descriptor.alias();
            if commands.contains_key(alias) || !seen.insert(alias) {
                return Err(RegistryError::AlreadyExists(alias.to_string()));
            }
        }

        for descriptor in descriptors {
            debug!("Registering command: {}", descriptor.alias());
            commands.insert(descriptor.alias().to_string(), Arc::new(descriptor));
        }
        Ok(())
    }

    /// Replace an existing descriptor; fails if the alias is absent
    pub fn reassign(&self, descriptor: CommandDescriptor) -> Result<(), RegistryError> {
        let mut commands = self.commands.write().unwrap_or_else(PoisonError::into_inner);
        match commands.get_mut(descriptor.alias()) {
            Some(slot) => {
                debug!("Reassigning command: {}", descriptor.alias());
                *slot = Arc::new(descriptor);
                Ok(())
            }
            None => Err(RegistryError::NotFound(descriptor.alias().to_string())),
        }
    }

    /// Remove a descriptor; fails if the alias is absent
    pub fn unregister(&self, alias: &str) -> Result<(), RegistryError> {
        let mut commands = self.commands.write().unwrap_or_else(PoisonError::into_inner);
        commands
            .remove(alias)
            .map(|_| debug!("Unregistered command: {}", alias))
            .ok_or_else(|| RegistryError::NotFound(alias.to_string()))
    }

    /// Look up a descriptor by alias
    pub fn lookup(&self, alias: &str) -> Option<Arc<CommandDescriptor>> {
        let commands = self.commands.read().unwrap_or_else(PoisonError::into_inner);
        commands.get(alias).cloned()
    }

    /// All registered aliases, sorted
    pub fn aliases(&self) -> Vec<String> {
        let commands = self.commands.read().unwrap_or_else(PoisonError::into_inner);
        let mut aliases: Vec<String> = commands.keys().cloned().collect();
        aliases.sort();
        aliases
    }

    /// Help text of every command, sorted by alias, one per line
    pub fn help_listing(&self) -> String {
        let commands = self.commands.read().unwrap_or_else(PoisonError::into_inner);
        let mut entries: Vec<&Arc<CommandDescriptor>> = commands.values().collect();
        entries.sort_by(|a, b| a.alias().cmp(b.alias()));
        entries
            .iter()
            .map(|d| d.help())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Resource for CommandRegistry {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Registry
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulsar_proto::ResultEnvelope;

    fn command(alias: &str, reply: &'static str) -> CommandDescriptor {
        CommandDescriptor::new(alias, format!("{} : test command", alias), move |_| {
            Ok(ResultEnvelope::ok(reply))
        })
    }

    fn reply_of(registry: &CommandRegistry, alias: &str) -> Option<String> {
        registry
            .lookup(alias)
            .and_then(|d| d.invoke(&Default::default()).ok())
            .and_then(|e| e.value)
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = CommandRegistry::new();
        registry.register(command("info", "a")).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(reply_of(&registry, "info").as_deref(), Some("a"));
        assert!(registry.lookup("missing").is_none());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let registry = CommandRegistry::new();
        registry.register(command("info", "original")).unwrap();

        let result = registry.register(command("info", "impostor"));

        assert_eq!(result, Err(RegistryError::AlreadyExists("info".to_string())));
        assert_eq!(reply_of(&registry, "info").as_deref(), Some("original"));
    }

    #[test]
    fn test_lookup_is_idempotent() {
        let registry = CommandRegistry::new();
        registry.register(command("show", "x")).unwrap();

        let first = registry.lookup("show").unwrap();
        let second = registry.lookup("show").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(registry.lookup("nope").is_none());
        assert!(registry.lookup("nope").is_none());
    }

    #[test]
    fn test_register_many_is_all_or_nothing() {
        let registry = CommandRegistry::new();
        registry.register(command("clear", "c")).unwrap();

        let result = registry.register_many(vec![command("add", "a"), command("clear", "dup")]);
        assert_eq!(result, Err(RegistryError::AlreadyExists("clear".to_string())));
        assert!(registry.lookup("add").is_none());
        assert_eq!(registry.len(), 1);

        let result = registry.register_many(vec![command("show", "s"), command("show", "s2")]);
        assert!(result.is_err());
        assert!(registry.lookup("show").is_none());

        registry
            .register_many(vec![command("add", "a"), command("show", "s")])
            .unwrap();
        assert_eq!(registry.aliases(), vec!["add", "clear", "show"]);
    }

    #[test]
    fn test_reassign() {
        let registry = CommandRegistry::new();
        assert_eq!(
            registry.reassign(command("info", "new")),
            Err(RegistryError::NotFound("info".to_string()))
        );

        registry.register(command("info", "old")).unwrap();
        registry.reassign(command("info", "new")).unwrap();
        assert_eq!(reply_of(&registry, "info").as_deref(), Some("new"));
    }

    #[test]
    fn test_unregister() {
        let registry = CommandRegistry::new();
        assert_eq!(
            registry.unregister("info"),
            Err(RegistryError::NotFound("info".to_string()))
        );

        registry.register(command("info", "x")).unwrap();
        registry.unregister("info").unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_help_listing_sorted_by_alias() {
        let registry = CommandRegistry::new();
        registry
            .register_many(vec![command("show", "s"), command("add", "a"), command("info", "i")])
            .unwrap();

        let listing = registry.help_listing();
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(
            lines,
            vec![
                "add : test command",
                "info : test command",
                "show : test command"
            ]
        );
    }
}
