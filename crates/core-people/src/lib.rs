//! Pulsar Core People: the collection served by a Pulsar Star
//!
//! - [`PeopleCollection`]: a sorted set of people with id assignment, shared
//!   as the `collection` resource
//! - [`PeopleStore`]: load/save backends ([`JsonFileStore`], [`MemoryStore`]),
//!   shared through the [`Database`] resource
//! - [`people_commands`]: the command table both ends register at startup

pub mod collection;
pub mod commands;
pub mod store;

pub use collection::{CollectionError, PeopleCollection};
pub use commands::{parse_person, people_commands, register_people_commands, PersonDraft};
pub use store::{Database, JsonFileStore, MemoryStore, PeopleStore, StoreError};
