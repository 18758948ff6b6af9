//! Client-side command invocation.
//!
//! A [`Session`] turns a command line into a result envelope: look up the
//! alias, validate the tokens, then either run the command right here
//! (client-only commands, offline mode) or send it to the Star.

use crate::error::Result;
use pulsar_connect::{ClientConfig, UdpClient};
use pulsar_core_dispatch::{execute, CommandRegistry, ResourceSet};
use pulsar_core_people::{
    register_people_commands, Database, PeopleCollection, PeopleStore, StoreError,
};
use pulsar_proto::{ResultEnvelope, StatusCode};
use std::sync::Arc;
use tracing::{debug, warn};

/// Build the registry both ends share
pub fn build_registry() -> Result<Arc<CommandRegistry>> {
    let registry = Arc::new(CommandRegistry::new());
    register_people_commands(&registry)?;
    Ok(registry)
}

enum Target {
    Remote {
        client: UdpClient,
        /// Why the initial connect failed, if it did
        connect_error: Option<String>,
    },
    /// The collection lives in this process
    Offline(ResourceSet),
}

pub struct Session {
    registry: Arc<CommandRegistry>,
    /// Resources for client-only commands
    local: ResourceSet,
    target: Target,
}

impl Session {
    /// Session forwarding to a Star.
    ///
    /// A failed connect leaves the client disconnected; every forwarded
    /// command then answers `Unreachable` with the connect error as text.
    pub async fn remote(registry: Arc<CommandRegistry>, config: ClientConfig) -> Self {
        let mut client = UdpClient::new(config);
        let connect_error = match client.connect().await {
            Ok(_) => None,
            Err(e) => {
                warn!("{}", e);
                Some(e.to_string())
            }
        };
        Self {
            local: ResourceSet::new().with(registry.clone()),
            registry,
            target: Target::Remote {
                client,
                connect_error,
            },
        }
    }

    /// Session running every command against a collection loaded from `store`
    pub fn offline(registry: Arc<CommandRegistry>, store: Arc<dyn PeopleStore>) -> Result<Self> {
        let people = PeopleCollection::from_people(store.load()?).map_err(StoreError::from)?;
        debug!(
            "Offline session over {} ({} people)",
            store.describe(),
            people.len()
        );
        let local = ResourceSet::new().with(registry.clone());
        let resources = ResourceSet::new()
            .with(Arc::new(people))
            .with(Arc::new(Database::new(store)))
            .with(registry.clone());
        Ok(Self {
            registry,
            local,
            target: Target::Offline(resources),
        })
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    pub fn is_offline(&self) -> bool {
        matches!(self.target, Target::Offline(_))
    }

    /// Run one command line
    pub async fn run(&mut self, alias: &str, tokens: &[String]) -> ResultEnvelope {
        let Some(descriptor) = self.registry.lookup(alias) else {
            return ResultEnvelope::with_message(
                StatusCode::ValidationFailed,
                format!("Unknown command: {}. Use help to list commands", alias),
            );
        };

        let args = match descriptor.validate(tokens) {
            Ok(args) => args,
            Err(e) => return e.into_envelope(),
        };

        if descriptor.is_client_only() {
            return execute(&descriptor, args, &self.local);
        }

        match &mut self.target {
            Target::Remote {
                client,
                connect_error: Some(reason),
            } if !client.is_connected() => ResultEnvelope::with_message(
                StatusCode::Unreachable,
                format!("{}: {}", StatusCode::Unreachable.message(), reason),
            ),
            Target::Remote { client, .. } => client.send(alias, &args).await,
            Target::Offline(resources) => execute(&descriptor, args, resources),
        }
    }

    /// Release the client socket, if any
    pub fn close(&mut self) {
        if let Target::Remote {
            client,
            connect_error,
        } = &mut self.target
        {
            client.disconnect();
            *connect_error = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_logging;
    use pulsar_core_people::MemoryStore;
    use std::time::Duration;

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    const ANN: &str = r#"{"name":"Ann","coordinates":{"x":0,"y":0},"height":170,"eye_color":"BROWN","nationality":"CHINA"}"#;

    #[tokio::test]
    async fn test_offline_session_runs_locally() {
        init_test_logging();
        let store = Arc::new(MemoryStore::new());
        let mut session = Session::offline(build_registry().unwrap(), store.clone()).unwrap();
        assert!(session.is_offline());

        assert!(session.run("add", &tokens(&[ANN])).await.is_ok());
        assert_eq!(
            session.run("sum_of_height", &[]).await,
            ResultEnvelope::ok("170")
        );

        assert!(session.run("save", &[]).await.is_ok());
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_and_invalid_never_leave_client() {
        let mut session = Session::remote(
            build_registry().unwrap(),
            ClientConfig {
                host: "127.0.0.1".to_string(),
                port: 9,
                attempts: 1,
                retry_delay: Duration::from_millis(10),
            },
        )
        .await;

        let unknown = session.run("launch", &[]).await;
        assert_eq!(unknown.status, StatusCode::ValidationFailed);

        let invalid = session.run("remove_by_id", &tokens(&["zero"])).await;
        assert_eq!(invalid.status, StatusCode::ValidationFailed);
    }

    #[tokio::test]
    async fn test_help_is_answered_locally() {
        let mut session = Session::remote(
            build_registry().unwrap(),
            ClientConfig {
                host: "127.0.0.1".to_string(),
                port: 9,
                attempts: 1,
                retry_delay: Duration::from_millis(10),
            },
        )
        .await;
        session.close();

        let help = session.run("help", &[]).await;
        assert!(help.is_ok());
        assert!(help.text().contains("remove_by_id"));

        let forwarded = session.run("show", &[]).await;
        assert_eq!(forwarded.status, StatusCode::Unreachable);
    }

    #[tokio::test]
    async fn test_connect_failure_is_reported_in_reply() {
        let mut session = Session::remote(
            build_registry().unwrap(),
            ClientConfig {
                host: "no-such-host.invalid".to_string(),
                port: 1234,
                attempts: 1,
                retry_delay: Duration::from_millis(10),
            },
        )
        .await;

        let result = session.run("show", &[]).await;
        assert_eq!(result.status, StatusCode::Unreachable);
        assert!(result.text().starts_with(StatusCode::Unreachable.message()));
        assert!(result.text().contains("no-such-host.invalid"));

        assert!(session.run("help", &[]).await.is_ok());
    }
}
