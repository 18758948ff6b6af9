//! Domain entities carried inside argument vectors.
//!
//! People are ordered by a fixed natural order (name first, id last) so the
//! collection can keep them in a sorted set.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Eye color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Color {
    Black,
    Orange,
    Brown,
}

impl Color {
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Black => "BLACK",
            Color::Orange => "ORANGE",
            Color::Brown => "BROWN",
        }
    }
}

/// Nationality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Country {
    UnitedKingdom,
    Germany,
    China,
    Thailand,
    Japan,
}

impl Country {
    pub fn as_str(&self) -> &'static str {
        match self {
            Country::UnitedKingdom => "UNITED_KINGDOM",
            Country::Germany => "GERMANY",
            Country::China => "CHINA",
            Country::Thailand => "THAILAND",
            Country::Japan => "JAPAN",
        }
    }
}

/// Planar coordinates; `y` must be greater than -816
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f32,
    pub y: f32,
}

impl Coordinates {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn distance(&self) -> f64 {
        let (x, y) = (self.x as f64, self.y as f64);
        (x * x + y * y).sqrt()
    }

    /// Orders by distance from the origin
    pub fn compare(&self, other: &Self) -> Ordering {
        self.distance().total_cmp(&other.distance())
    }
}

/// A named point in space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f32,
    pub z: i64,
    pub name: Option<String>,
}

impl Location {
    pub fn new(x: f64, y: f32, z: i64, name: Option<String>) -> Self {
        Self { x, y, z, name }
    }

    fn distance(&self) -> f64 {
        let (y, z) = (self.y as f64, self.z as f64);
        (self.x * self.x + y * y + z * z).sqrt()
    }

    /// Orders by name (unnamed first), then by distance from the origin
    pub fn compare(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.distance().total_cmp(&other.distance()))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Location(name={}, x={}, y={}, z={})",
            self.name.as_deref().unwrap_or("-"),
            self.x,
            self.y,
            self.z
        )
    }
}

/// A person stored in the collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    /// Positive, unique, assigned by the collection on insert
    pub id: i64,
    pub name: String,
    pub coordinates: Coordinates,
    /// Assigned by the collection on insert
    pub creation_date: NaiveDate,
    pub height: Option<i32>,
    pub passport_id: Option<String>,
    pub eye_color: Color,
    pub nationality: Country,
    pub location: Option<Location>,
}

impl Person {
    /// Copy every user-editable field from `other`, keeping id and creation date
    pub fn update_from(&mut self, other: &Person) {
        self.name = other.name.clone();
        self.coordinates = other.coordinates;
        self.height = other.height;
        self.passport_id = other.passport_id.clone();
        self.eye_color = other.eye_color;
        self.nationality = other.nationality;
        self.location = other.location.clone();
    }
}

impl Ord for Person {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.passport_id.cmp(&other.passport_id))
            .then_with(|| self.height.cmp(&other.height))
            .then_with(|| self.creation_date.cmp(&other.creation_date))
            .then_with(|| self.nationality.as_str().cmp(other.nationality.as_str()))
            .then_with(|| match (&self.location, &other.location) {
                (Some(a), Some(b)) => a.compare(b),
                (a, b) => a.is_some().cmp(&b.is_some()),
            })
            .then_with(|| self.coordinates.compare(&other.coordinates))
            .then_with(|| self.eye_color.as_str().cmp(other.eye_color.as_str()))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for Person {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Equality follows the natural order so the sorted set stays consistent.
impl PartialEq for Person {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Person {}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Person {}:", self.id)?;
        writeln!(f, "\tName: {}", self.name)?;
        writeln!(f, "\tCreated: {}", self.creation_date)?;
        match self.height {
            Some(h) => writeln!(f, "\tHeight: {}", h)?,
            None => writeln!(f, "\tHeight: -")?,
        }
        writeln!(
            f,
            "\tPassport: {}",
            self.passport_id.as_deref().unwrap_or("-")
        )?;
        writeln!(f, "\tEye color: {}", self.eye_color.as_str())?;
        writeln!(f, "\tNationality: {}", self.nationality.as_str())?;
        match &self.location {
            Some(location) => writeln!(f, "\t{}", location)?,
            None => writeln!(f, "\tLocation: -")?,
        }
        writeln!(
            f,
            "\tCoordinates: ({}, {})",
            self.coordinates.x, self.coordinates.y
        )
    }
}
