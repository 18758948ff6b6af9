//! The shared people collection
//!
//! A sorted set of people behind a lock. The collection is shared as an
//! `Arc` resource, so commands reach it through `&self`; the Star's receive
//! loop runs them one at a time.

use chrono::{Local, NaiveDate};
use pulsar_core_dispatch::Resource;
use pulsar_proto::{Location, Person, ResourceKind};
use std::any::Any;
use std::collections::BTreeSet;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tracing::debug;

const COLLECTION_TYPE: &str = "BTreeSet";

/// Id assignment failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    #[error("Stored person id {0} leaves no room for new ids")]
    IdOutOfRange(i64),

    #[error("No person ids left to assign")]
    IdsExhausted,
}

#[derive(Debug)]
struct State {
    people: BTreeSet<Person>,
    next_id: i64,
}

/// Sorted, id-keyed collection of people
#[derive(Debug)]
pub struct PeopleCollection {
    state: RwLock<State>,
    init_date: NaiveDate,
}

impl PeopleCollection {
    /// Create an empty collection initialized today
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                people: BTreeSet::new(),
                next_id: 1,
            }),
            init_date: Local::now().date_naive(),
        }
    }

    /// Create a collection from previously stored people.
    ///
    /// Stored ids are kept; people with a non-positive id get a fresh one.
    /// An id of `i64::MAX` is rejected.
    pub fn from_people(
        people: impl IntoIterator<Item = Person>,
    ) -> Result<Self, CollectionError> {
        let collection = Self::new();
        {
            let mut state = collection.write();
            let mut pending = Vec::new();
            for person in people {
                if person.id > 0 && !state.people.iter().any(|p| p.id == person.id) {
                    let after = person
                        .id
                        .checked_add(1)
                        .ok_or(CollectionError::IdOutOfRange(person.id))?;
                    state.next_id = state.next_id.max(after);
                    state.people.insert(person);
                } else {
                    pending.push(person);
                }
            }
            for mut person in pending {
                person.id = Self::take_id(&mut state)?;
                state.people.insert(person);
            }
        }
        Ok(collection)
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_id(state: &mut State) -> Result<i64, CollectionError> {
        let id = state.next_id;
        state.next_id = id.checked_add(1).ok_or(CollectionError::IdsExhausted)?;
        Ok(id)
    }

    fn insert_new(state: &mut State, mut person: Person) -> Result<i64, CollectionError> {
        let id = Self::take_id(state)?;
        person.id = id;
        debug!("Adding person {} ({})", id, person.name);
        state.people.insert(person);
        Ok(id)
    }

    /// Prepare a candidate for insertion: today's date, provisional id
    fn stamp(mut person: Person) -> Person {
        person.id = 0;
        person.creation_date = Local::now().date_naive();
        person
    }

    /// Insert a person, assigning id and creation date. Returns the new id.
    pub fn add(&self, person: Person) -> Result<i64, CollectionError> {
        let person = Self::stamp(person);
        Self::insert_new(&mut self.write(), person)
    }

    /// Insert only if the person sorts after the current greatest element.
    /// An empty collection always accepts.
    pub fn add_if_max(&self, person: Person) -> Result<Option<i64>, CollectionError> {
        let person = Self::stamp(person);
        let mut state = self.write();
        let accepted = state.people.last().map_or(true, |last| person > *last);
        accepted
            .then(|| Self::insert_new(&mut state, person))
            .transpose()
    }

    /// Insert only if the person sorts before the current smallest element.
    /// An empty collection always accepts.
    pub fn add_if_min(&self, person: Person) -> Result<Option<i64>, CollectionError> {
        let person = Self::stamp(person);
        let mut state = self.write();
        let accepted = state.people.first().map_or(true, |first| person < *first);
        accepted
            .then(|| Self::insert_new(&mut state, person))
            .transpose()
    }

    /// Replace the editable fields of the person with `id`
    pub fn update(&self, id: i64, replacement: &Person) -> bool {
        let mut state = self.write();
        let Some(existing) = state.people.iter().find(|p| p.id == id).cloned() else {
            return false;
        };
        state.people.remove(&existing);
        let mut updated = existing;
        updated.update_from(replacement);
        state.people.insert(updated);
        true
    }

    /// Remove the person with `id`; false if there is none
    pub fn remove_by_id(&self, id: i64) -> bool {
        let mut state = self.write();
        let before = state.people.len();
        state.people.retain(|p| p.id != id);
        before != state.people.len()
    }

    pub fn clear(&self) {
        self.write().people.clear();
    }

    pub fn len(&self) -> usize {
        self.read().people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn init_date(&self) -> NaiveDate {
        self.init_date
    }

    /// Sum of all known heights; missing heights count as zero
    pub fn sum_of_height(&self) -> i64 {
        self.read()
            .people
            .iter()
            .filter_map(|p| p.height)
            .map(i64::from)
            .sum()
    }

    /// People whose name contains `needle`, in natural order
    pub fn filter_contains_name(&self, needle: &str) -> Vec<Person> {
        self.read()
            .people
            .iter()
            .filter(|p| p.name.contains(needle))
            .cloned()
            .collect()
    }

    /// Locations of all people that have one, greatest first
    pub fn locations_descending(&self) -> Vec<Location> {
        let mut locations: Vec<Location> = self
            .read()
            .people
            .iter()
            .filter_map(|p| p.location.clone())
            .collect();
        locations.sort_by(|a, b| b.compare(a));
        locations
    }

    /// Copy of every person, in natural order
    pub fn snapshot(&self) -> Vec<Person> {
        self.read().people.iter().cloned().collect()
    }

    /// Summary: collection type, initialization date and size
    pub fn info(&self) -> String {
        format!(
            "Collection type: {}\nInitialized: {}\nElements: {}",
            COLLECTION_TYPE,
            self.init_date,
            self.len()
        )
    }
}

impl Default for PeopleCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl Resource for PeopleCollection {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Collection
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
