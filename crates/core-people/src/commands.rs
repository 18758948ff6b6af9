//! The people command set
//!
//! Each command is a [`CommandDescriptor`] whose validator runs where the user
//! typed the command and whose body runs wherever the collection lives.
//! Bodies reach the collection, the store and the registry through
//! placeholders, so the same table serves the client and the Star.
//!
//! Persons are given on the command line as a single JSON object:
//!
//! ```text
//! add {"name":"Ann","coordinates":{"x":1,"y":2},"height":170,
//!      "eye_color":"BROWN","nationality":"JAPAN"}
//! ```

use crate::collection::{CollectionError, PeopleCollection};
use crate::store::Database;
use chrono::Local;
use pulsar_core_dispatch::{CommandDescriptor, CommandRegistry, RegistryError, ValidationError};
use pulsar_proto::{
    Argument, Color, Coordinates, Country, Location, Person, ResourceKind, ResultEnvelope,
    StatusCode,
};
use serde::Deserialize;
use tracing::{info, warn};

const MAX_NAME_LEN: usize = 50;
const MIN_PASSPORT_LEN: usize = 8;
const MAX_PASSPORT_LEN: usize = 50;
const MIN_COORDINATE_Y: f32 = -816.0;

/// A person as typed by the user: everything except id and creation date
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersonDraft {
    pub name: String,
    pub coordinates: Coordinates,
    pub height: Option<i32>,
    pub passport_id: Option<String>,
    pub eye_color: Color,
    pub nationality: Country,
    pub location: Option<Location>,
}

impl PersonDraft {
    /// Check field constraints and build a person with a provisional id
    pub fn into_person(self) -> Result<Person, ValidationError> {
        let name_len = self.name.chars().count();
        if self.name.trim().is_empty() || name_len > MAX_NAME_LEN {
            return Err(ValidationError::invalid(
                "name",
                format!("must be 1 to {} characters", MAX_NAME_LEN),
            ));
        }
        if self.coordinates.y <= MIN_COORDINATE_Y {
            return Err(ValidationError::invalid(
                "coordinates.y",
                format!("must be greater than {}", MIN_COORDINATE_Y),
            ));
        }
        if let Some(height) = self.height {
            if height <= 0 {
                return Err(ValidationError::invalid("height", "must be positive"));
            }
        }
        if let Some(passport) = &self.passport_id {
            let len = passport.chars().count();
            if !(MIN_PASSPORT_LEN..=MAX_PASSPORT_LEN).contains(&len) {
                return Err(ValidationError::invalid(
                    "passport_id",
                    format!(
                        "must be {} to {} characters",
                        MIN_PASSPORT_LEN, MAX_PASSPORT_LEN
                    ),
                ));
            }
        }
        if let Some(location_name) = self.location.as_ref().and_then(|l| l.name.as_ref()) {
            if location_name.chars().count() > MAX_NAME_LEN {
                return Err(ValidationError::invalid(
                    "location.name",
                    format!("must be at most {} characters", MAX_NAME_LEN),
                ));
            }
        }

        Ok(Person {
            id: 0,
            name: self.name,
            coordinates: self.coordinates,
            creation_date: Local::now().date_naive(),
            height: self.height,
            passport_id: self.passport_id,
            eye_color: self.eye_color,
            nationality: self.nationality,
            location: self.location,
        })
    }
}

/// Parse and check a JSON person token
pub fn parse_person(raw: &str) -> Result<Person, ValidationError> {
    let draft: PersonDraft = serde_json::from_str(raw)
        .map_err(|e| ValidationError::invalid("person", e.to_string()))?;
    draft.into_person()
}

fn require(tokens: &[String], expected: usize) -> Result<(), ValidationError> {
    if tokens.len() < expected {
        return Err(ValidationError::MissingArguments {
            expected,
            got: tokens.len(),
        });
    }
    Ok(())
}

fn parse_id(token: &str) -> Result<i64, ValidationError> {
    match token.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        Ok(_) => Err(ValidationError::invalid("id", "must be positive")),
        Err(e) => Err(ValidationError::invalid("id", e.to_string())),
    }
}

fn collection() -> Argument {
    Argument::placeholder(ResourceKind::Collection)
}

fn collection_only(_tokens: &[String]) -> Result<Vec<Argument>, ValidationError> {
    Ok(vec![collection()])
}

/// `{person}` tokens, rejoined so unquoted JSON with spaces still parses
fn person_then_collection(tokens: &[String]) -> Result<Vec<Argument>, ValidationError> {
    require(tokens, 1)?;
    let person = parse_person(&tokens.join(" "))?;
    Ok(vec![Argument::value(person), collection()])
}

fn id_then_collection(tokens: &[String]) -> Result<Vec<Argument>, ValidationError> {
    require(tokens, 1)?;
    Ok(vec![Argument::value(parse_id(&tokens[0])?), collection()])
}

fn id_person_then_collection(tokens: &[String]) -> Result<Vec<Argument>, ValidationError> {
    require(tokens, 2)?;
    let id = parse_id(&tokens[0])?;
    let person = parse_person(&tokens[1..].join(" "))?;
    Ok(vec![Argument::value(id), Argument::value(person), collection()])
}

fn list<T: ToString>(items: &[T], empty: &str) -> ResultEnvelope {
    if items.is_empty() {
        return ResultEnvelope::ok(empty);
    }
    let lines: Vec<String> = items.iter().map(|i| i.to_string()).collect();
    ResultEnvelope::ok(lines.join("\n").trim_end().to_string())
}

fn help() -> CommandDescriptor {
    CommandDescriptor::new("help", "help : show available commands", |args| {
        let registry = args.resource::<CommandRegistry>(0)?;
        Ok(ResultEnvelope::ok(registry.help_listing()))
    })
    .with_validator(|_| Ok(vec![Argument::placeholder(ResourceKind::Registry)]))
    .client_only()
}

fn info() -> CommandDescriptor {
    CommandDescriptor::new(
        "info",
        "info : show collection type, initialization date and size",
        |args| {
            let people = args.resource::<PeopleCollection>(0)?;
            Ok(ResultEnvelope::ok(people.info()))
        },
    )
    .with_validator(collection_only)
}

fn show() -> CommandDescriptor {
    CommandDescriptor::new("show", "show : print every person in the collection", |args| {
        let people = args.resource::<PeopleCollection>(0)?;
        Ok(list(&people.snapshot(), "Collection is empty"))
    })
    .with_validator(collection_only)
}

fn out_of_ids(error: CollectionError) -> ResultEnvelope {
    ResultEnvelope::with_message(StatusCode::OperationRejected, error.to_string())
}

fn add() -> CommandDescriptor {
    CommandDescriptor::new("add", "add {person} : add a person", |args| {
        let person = args.person(0)?.clone();
        let people = args.resource::<PeopleCollection>(1)?;
        Ok(match people.add(person) {
            Ok(id) => ResultEnvelope::ok(format!("Person added with id {}", id)),
            Err(e) => out_of_ids(e),
        })
    })
    .with_validator(person_then_collection)
}

fn add_if_max() -> CommandDescriptor {
    CommandDescriptor::new(
        "add_if_max",
        "add_if_max {person} : add a person if it exceeds the greatest element",
        |args| {
            let person = args.person(0)?.clone();
            let people = args.resource::<PeopleCollection>(1)?;
            Ok(match people.add_if_max(person) {
                Ok(Some(id)) => ResultEnvelope::ok(format!("Person added with id {}", id)),
                Ok(None) => ResultEnvelope::with_message(
                    StatusCode::OperationRejected,
                    "Person is not greater than the greatest element",
                ),
                Err(e) => out_of_ids(e),
            })
        },
    )
    .with_validator(person_then_collection)
}

fn add_if_min() -> CommandDescriptor {
    CommandDescriptor::new(
        "add_if_min",
        "add_if_min {person} : add a person if it precedes the smallest element",
        |args| {
            let person = args.person(0)?.clone();
            let people = args.resource::<PeopleCollection>(1)?;
            Ok(match people.add_if_min(person) {
                Ok(Some(id)) => ResultEnvelope::ok(format!("Person added with id {}", id)),
                Ok(None) => ResultEnvelope::with_message(
                    StatusCode::OperationRejected,
                    "Person is not smaller than the smallest element",
                ),
                Err(e) => out_of_ids(e),
            })
        },
    )
    .with_validator(person_then_collection)
}

fn update() -> CommandDescriptor {
    CommandDescriptor::new(
        "update",
        "update id {person} : replace the person with the given id",
        |args| {
            let id = args.int(0)?;
            let replacement = args.person(1)?;
            let people = args.resource::<PeopleCollection>(2)?;
            Ok(if people.update(id, replacement) {
                ResultEnvelope::ok(format!("Person {} updated", id))
            } else {
                ResultEnvelope::with_message(
                    StatusCode::ElementNotFound,
                    format!("No person with id {}", id),
                )
            })
        },
    )
    .with_validator(id_person_then_collection)
}

fn remove_by_id() -> CommandDescriptor {
    CommandDescriptor::new(
        "remove_by_id",
        "remove_by_id id : remove the person with the given id",
        |args| {
            let id = args.int(0)?;
            let people = args.resource::<PeopleCollection>(1)?;
            Ok(if people.remove_by_id(id) {
                ResultEnvelope::ok(format!("Person {} removed", id))
            } else {
                ResultEnvelope::with_message(
                    StatusCode::ElementNotFound,
                    format!("No person with id {}", id),
                )
            })
        },
    )
    .with_validator(id_then_collection)
}

fn clear() -> CommandDescriptor {
    CommandDescriptor::new("clear", "clear : remove every person", |args| {
        let people = args.resource::<PeopleCollection>(0)?;
        people.clear();
        Ok(ResultEnvelope::ok("Collection cleared"))
    })
    .with_validator(collection_only)
}

fn filter_contains_name() -> CommandDescriptor {
    CommandDescriptor::new(
        "filter_contains_name",
        "filter_contains_name name : show people whose name contains the given text",
        |args| {
            let needle = args.text(0)?;
            let people = args.resource::<PeopleCollection>(1)?;
            Ok(list(
                &people.filter_contains_name(needle),
                "No matching people",
            ))
        },
    )
    .with_validator(|tokens| {
        require(tokens, 1)?;
        Ok(vec![Argument::value(tokens.join(" ")), collection()])
    })
}

fn print_field_descending_location() -> CommandDescriptor {
    CommandDescriptor::new(
        "print_field_descending_location",
        "print_field_descending_location : show every location, greatest first",
        |args| {
            let people = args.resource::<PeopleCollection>(0)?;
            Ok(list(&people.locations_descending(), "No locations to show"))
        },
    )
    .with_validator(collection_only)
}

fn sum_of_height() -> CommandDescriptor {
    CommandDescriptor::new(
        "sum_of_height",
        "sum_of_height : sum the height of every person",
        |args| {
            let people = args.resource::<PeopleCollection>(0)?;
            Ok(ResultEnvelope::ok(people.sum_of_height().to_string()))
        },
    )
    .with_validator(collection_only)
}

fn save() -> CommandDescriptor {
    CommandDescriptor::new("save", "save : write the collection to storage", |args| {
        let people = args.resource::<PeopleCollection>(0)?;
        let database = args.resource::<Database>(1)?;
        let store = database.store();
        match store.save(&people.snapshot()) {
            Ok(()) => {
                info!("Collection saved to {}", store.describe());
                Ok(ResultEnvelope::ok(format!(
                    "Collection saved to {}",
                    store.describe()
                )))
            }
            Err(e) => {
                warn!("Save failed: {}", e);
                Ok(ResultEnvelope::with_message(
                    StatusCode::OperationRejected,
                    format!("Failed to save collection: {}", e),
                ))
            }
        }
    })
    .with_validator(|_| {
        Ok(vec![
            collection(),
            Argument::placeholder(ResourceKind::Database),
        ])
    })
}

/// Every people command, in no particular order
pub fn people_commands() -> Vec<CommandDescriptor> {
    vec![
        help(),
        info(),
        show(),
        add(),
        add_if_max(),
        add_if_min(),
        update(),
        remove_by_id(),
        clear(),
        filter_contains_name(),
        print_field_descending_location(),
        sum_of_height(),
        save(),
    ]
}

/// Register the full people command set; nothing is registered on conflict
pub fn register_people_commands(registry: &CommandRegistry) -> Result<(), RegistryError> {
    registry.register_many(people_commands())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, PeopleStore};
    use pulsar_core_dispatch::{dispatch_request, execute, ResourceSet};
    use std::sync::Arc;

    struct Fixture {
        registry: Arc<CommandRegistry>,
        people: Arc<PeopleCollection>,
        store: Arc<MemoryStore>,
        resources: ResourceSet,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(CommandRegistry::new());
        register_people_commands(&registry).unwrap();
        let people = Arc::new(PeopleCollection::new());
        let store = Arc::new(MemoryStore::new());
        let resources = ResourceSet::new()
            .with(people.clone())
            .with(Arc::new(Database::new(store.clone())));
        Fixture {
            registry,
            people,
            store,
            resources,
        }
    }

    impl Fixture {
        fn run(&self, alias: &str, tokens: &[&str]) -> ResultEnvelope {
            let descriptor = self.registry.lookup(alias).unwrap();
            let tokens: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
            match descriptor.validate(&tokens) {
                Ok(args) => dispatch_request(&self.registry, alias, args, &self.resources),
                Err(e) => e.into_envelope(),
            }
        }
    }

    fn person_json(name: &str, height: i32) -> String {
        format!(
            r#"{{"name":"{}","coordinates":{{"x":1.0,"y":2.0}},"height":{},"eye_color":"BROWN","nationality":"JAPAN"}}"#,
            name, height
        )
    }

    #[test]
    fn test_sum_of_height() {
        let f = fixture();
        assert!(f.run("add", &[&person_json("Ann", 170)]).is_ok());
        assert!(f.run("add", &[&person_json("Ben", 180)]).is_ok());

        let result = f.run("sum_of_height", &[]);
        assert_eq!(result, ResultEnvelope::ok("350"));
    }

    #[test]
    fn test_remove_missing_id_is_element_not_found() {
        let f = fixture();
        let result = f.run("remove_by_id", &["999"]);
        assert_eq!(result.status, StatusCode::ElementNotFound);

        f.run("add", &[&person_json("Ann", 170)]);
        assert!(f.run("remove_by_id", &["1"]).is_ok());
        assert!(f.people.is_empty());
    }

    #[test]
    fn test_validation_failures() {
        let f = fixture();
        let cases: Vec<Vec<&str>> = vec![
            vec![],
            vec!["not json"],
            vec![r#"{"name":"","coordinates":{"x":0,"y":0},"eye_color":"BLACK","nationality":"CHINA"}"#],
            vec![r#"{"name":"A","coordinates":{"x":0,"y":-900},"eye_color":"BLACK","nationality":"CHINA"}"#],
            vec![r#"{"name":"A","coordinates":{"x":0,"y":0},"passport_id":"short","eye_color":"BLACK","nationality":"CHINA"}"#],
            vec![r#"{"name":"A","coordinates":{"x":0,"y":0},"height":0,"eye_color":"BLACK","nationality":"CHINA"}"#],
            vec![r#"{"name":"A","coordinates":{"x":0,"y":0},"eye_color":"PURPLE","nationality":"CHINA"}"#],
        ];
        for tokens in cases {
            let result = f.run("add", &tokens);
            assert_eq!(result.status, StatusCode::ValidationFailed, "{:?}", tokens);
        }
        assert_eq!(f.run("remove_by_id", &["abc"]).status, StatusCode::ValidationFailed);
        assert_eq!(f.run("remove_by_id", &["-1"]).status, StatusCode::ValidationFailed);
        assert!(f.people.is_empty());
    }

    #[test]
    fn test_spaced_json_tokens_are_rejoined() {
        let f = fixture();
        let result = f.run(
            "add",
            &[
                r#"{"name":"Ann","coordinates":{"x":1,"y":2},"#,
                r#""eye_color":"BROWN","nationality":"JAPAN"}"#,
            ],
        );
        assert!(result.is_ok(), "{}", result.text());
    }

    #[test]
    fn test_update_and_missing_update() {
        let f = fixture();
        f.run("add", &[&person_json("Ann", 170)]);

        let result = f.run("update", &["1", &person_json("Anna", 171)]);
        assert!(result.is_ok());
        assert_eq!(f.people.snapshot()[0].name, "Anna");

        let result = f.run("update", &["5", &person_json("Ghost", 1)]);
        assert_eq!(result.status, StatusCode::ElementNotFound);
    }

    #[test]
    fn test_add_if_max_rejects_smaller() {
        let f = fixture();
        f.run("add", &[&person_json("Mia", 170)]);

        let result = f.run("add_if_max", &[&person_json("Abe", 170)]);
        assert_eq!(result.status, StatusCode::OperationRejected);
        assert!(f.run("add_if_min", &[&person_json("Abe", 170)]).is_ok());
        assert_eq!(f.people.len(), 2);
    }

    #[test]
    fn test_add_without_free_ids_is_rejected() {
        let mut last = parse_person(&person_json("Last", 170)).unwrap();
        last.id = i64::MAX - 1;
        let mut f = fixture();
        f.people = Arc::new(PeopleCollection::from_people(vec![last]).unwrap());
        f.resources = ResourceSet::new()
            .with(f.people.clone())
            .with(Arc::new(Database::new(f.store.clone())));

        for alias in ["add", "add_if_max"] {
            let result = f.run(alias, &[&person_json("Zed", 180)]);
            assert_eq!(result.status, StatusCode::OperationRejected, "{}", alias);
            assert_eq!(result.text(), "No person ids left to assign");
        }
        assert_eq!(f.people.len(), 1);
    }

    #[test]
    fn test_show_info_and_filter() {
        let f = fixture();
        assert_eq!(f.run("show", &[]).text(), "Collection is empty");

        f.run("add", &[&person_json("Hannah", 160)]);
        f.run("add", &[&person_json("Bob", 190)]);

        let shown = f.run("show", &[]);
        assert!(shown.text().contains("Hannah"));
        assert!(shown.text().contains("Bob"));
        assert!(f.run("info", &[]).text().contains("Elements: 2"));

        let filtered = f.run("filter_contains_name", &["ann"]);
        assert!(filtered.text().contains("Hannah"));
        assert!(!filtered.text().contains("Bob"));

        assert_eq!(
            f.run("print_field_descending_location", &[]).text(),
            "No locations to show"
        );

        assert!(f.run("clear", &[]).is_ok());
        assert!(f.people.is_empty());
    }

    #[test]
    fn test_save_writes_to_store() {
        let f = fixture();
        f.run("add", &[&person_json("Ann", 170)]);

        assert!(f.run("save", &[]).is_ok());
        assert_eq!(f.store.load().unwrap().len(), 1);
    }

    #[test]
    fn test_help_runs_locally_only() {
        let f = fixture();
        let descriptor = f.registry.lookup("help").unwrap();
        let args = descriptor.validate(&[]).unwrap();

        let remote = dispatch_request(&f.registry, "help", args.clone(), &f.resources);
        assert_eq!(remote.status, StatusCode::OperationRejected);

        let local = ResourceSet::new().with(f.registry.clone());
        let result = execute(&descriptor, args, &local);
        assert!(result.is_ok());
        assert!(result.text().contains("sum_of_height"));
        assert_eq!(result.text().lines().count(), 13);
    }

    #[test]
    fn test_registering_twice_fails_cleanly() {
        let registry = CommandRegistry::new();
        register_people_commands(&registry).unwrap();
        assert!(register_people_commands(&registry).is_err());
        assert_eq!(registry.len(), 13);
    }
}
