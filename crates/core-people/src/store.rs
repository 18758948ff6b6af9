//! Persistence for the people collection
//!
//! The Star loads the collection once at startup and writes it back only on
//! an explicit `save`. Stores are reached by commands through a
//! [`Database`] resource, never transmitted.

use crate::collection::CollectionError;
use pulsar_core_dispatch::Resource;
use pulsar_proto::{Person, ResourceKind};
use std::any::Any;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid people file {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid people data: {0}")]
    Contents(#[from] CollectionError),
}

/// Somewhere the collection can be loaded from and saved to
pub trait PeopleStore: Send + Sync {
    /// Read every stored person. A store that was never written is empty.
    fn load(&self) -> Result<Vec<Person>, StoreError>;

    /// Replace the stored contents with `people`
    fn save(&self, people: &[Person]) -> Result<(), StoreError>;

    /// Human-readable location of the store, for logs and replies
    fn describe(&self) -> String;
}

/// People stored as a pretty-printed JSON array on disk
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl PeopleStore for JsonFileStore {
    fn load(&self) -> Result<Vec<Person>, StoreError> {
        if !self.path.exists() {
            info!("No people file at {}, starting empty", self.path.display());
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        let people: Vec<Person> =
            serde_json::from_str(&contents).map_err(|source| StoreError::Format {
                path: self.path.clone(),
                source,
            })?;
        info!("Loaded {} people from {}", people.len(), self.path.display());
        Ok(people)
    }

    fn save(&self, people: &[Person]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(people).map_err(|source| StoreError::Format {
            path: self.path.clone(),
            source,
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        // Write beside the target, then rename over it
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;

        debug!("Saved {} people to {}", people.len(), self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory store, for tests and embedded Stars
#[derive(Debug, Default)]
pub struct MemoryStore {
    people: Mutex<Vec<Person>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_people(people: Vec<Person>) -> Self {
        Self {
            people: Mutex::new(people),
        }
    }
}

impl PeopleStore for MemoryStore {
    fn load(&self) -> Result<Vec<Person>, StoreError> {
        Ok(self
            .people
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, people: &[Person]) -> Result<(), StoreError> {
        *self.people.lock().unwrap_or_else(PoisonError::into_inner) = people.to_vec();
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// The persistence handle as a resolvable resource
#[derive(Clone)]
pub struct Database {
    store: Arc<dyn PeopleStore>,
}

impl Database {
    pub fn new(store: Arc<dyn PeopleStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn PeopleStore {
        self.store.as_ref()
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Database").field(&self.store.describe()).finish()
    }
}

impl Resource for Database {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Database
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
