//! Family record types.
//!
//! Public person records and private contact details are kept as two
//! separate records joined by id. Callers only ever see the private half
//! when the viewer is an admin.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a person record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(String);

impl PersonId {
    /// Wraps an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PersonId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PersonId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Gender of a person. Drives the avatar color coding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    #[default]
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            "other" | "o" => Ok(Gender::Other),
            other => Err(format!("unknown gender '{}'", other)),
        }
    }
}

/// A partially known calendar date.
///
/// Each part is independently optional. A stored zero counts as unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateParts {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl DateParts {
    pub fn new(year: Option<i32>, month: Option<u32>, day: Option<u32>) -> Self {
        Self { year, month, day }
    }

    /// Year, treating zero as unknown.
    pub fn known_year(&self) -> Option<i32> {
        self.year.filter(|y| *y != 0)
    }

    pub fn known_month(&self) -> Option<u32> {
        self.month.filter(|m| *m != 0)
    }

    pub fn known_day(&self) -> Option<u32> {
        self.day.filter(|d| *d != 0)
    }

    /// True when at least one part is known.
    pub fn any_present(&self) -> bool {
        self.known_year().is_some() || self.known_month().is_some() || self.known_day().is_some()
    }
}

/// Public record of one individual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub full_name: String,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub birth: DateParts,
    #[serde(default)]
    pub death: DateParts,
    #[serde(default)]
    pub is_deceased: bool,
    #[serde(default)]
    pub is_in_law: bool,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl Person {
    /// Creates a living person with no dates recorded.
    pub fn new(id: impl Into<PersonId>, full_name: impl Into<String>, gender: Gender) -> Self {
        Self {
            id: id.into(),
            full_name: full_name.into(),
            gender,
            birth: DateParts::default(),
            death: DateParts::default(),
            is_deceased: false,
            is_in_law: false,
            avatar_url: None,
            note: None,
        }
    }

    pub fn with_birth(mut self, year: Option<i32>, month: Option<u32>, day: Option<u32>) -> Self {
        self.birth = DateParts::new(year, month, day);
        self
    }

    pub fn with_death(mut self, year: Option<i32>, month: Option<u32>, day: Option<u32>) -> Self {
        self.death = DateParts::new(year, month, day);
        self
    }

    pub fn deceased(mut self) -> Self {
        self.is_deceased = true;
        self
    }

    pub fn in_law(mut self) -> Self {
        self.is_in_law = true;
        self
    }

    /// The single deceased rule used by every view: the explicit flag, or
    /// any recorded death date part.
    pub fn is_deceased(&self) -> bool {
        self.is_deceased || self.death.any_present()
    }
}

/// Admin-only contact details for a person.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PrivateDetails {
    pub person_id: PersonId,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub current_residence: Option<String>,
}

impl PrivateDetails {
    /// A row with every field absent.
    pub fn empty(person_id: PersonId) -> Self {
        Self {
            person_id,
            ..Default::default()
        }
    }
}

impl Default for PersonId {
    fn default() -> Self {
        Self(String::new())
    }
}

/// The type of a relationship edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    /// Unordered pair of spouses.
    Marriage,

    /// `person_a` is the biological parent of `person_b`.
    BiologicalChild,

    /// `person_a` is the adoptive parent of `person_b`.
    AdoptedChild,
}

impl RelationshipKind {
    /// True for the parent → child kinds.
    pub fn is_child(&self) -> bool {
        matches!(
            self,
            RelationshipKind::BiologicalChild | RelationshipKind::AdoptedChild
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::Marriage => "marriage",
            RelationshipKind::BiologicalChild => "biological_child",
            RelationshipKind::AdoptedChild => "adopted_child",
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RelationshipKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "marriage" => Ok(RelationshipKind::Marriage),
            "biological_child" | "child" => Ok(RelationshipKind::BiologicalChild),
            "adopted_child" | "adopted" => Ok(RelationshipKind::AdoptedChild),
            other => Err(format!("unknown relationship type '{}'", other)),
        }
    }
}

/// A typed link between two persons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub person_a: PersonId,
    pub person_b: PersonId,
    #[serde(rename = "type")]
    pub kind: RelationshipKind,
    #[serde(default)]
    pub note: Option<String>,
}

impl Relationship {
    pub fn new(
        person_a: impl Into<PersonId>,
        person_b: impl Into<PersonId>,
        kind: RelationshipKind,
    ) -> Self {
        Self {
            person_a: person_a.into(),
            person_b: person_b.into(),
            kind,
            note: None,
        }
    }

    pub fn marriage(a: impl Into<PersonId>, b: impl Into<PersonId>) -> Self {
        Self::new(a, b, RelationshipKind::Marriage)
    }

    pub fn child(parent: impl Into<PersonId>, child: impl Into<PersonId>) -> Self {
        Self::new(parent, child, RelationshipKind::BiologicalChild)
    }

    pub fn adopted(parent: impl Into<PersonId>, child: impl Into<PersonId>) -> Self {
        Self::new(parent, child, RelationshipKind::AdoptedChild)
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// True when either side is the given person.
    pub fn involves(&self, id: &PersonId) -> bool {
        &self.person_a == id || &self.person_b == id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_date_parts_are_unknown() {
        let date = DateParts::new(Some(0), Some(0), None);
        assert!(!date.any_present());
        assert_eq!(date.known_year(), None);
    }

    #[test]
    fn test_deceased_rule() {
        let flagged = Person::new("a", "A", Gender::Male).deceased();
        assert!(flagged.is_deceased());

        let dated = Person::new("b", "B", Gender::Female).with_death(None, Some(4), None);
        assert!(dated.is_deceased());

        let living = Person::new("c", "C", Gender::Other);
        assert!(!living.is_deceased());
    }

    #[test]
    fn test_relationship_wire_format() {
        let rel = Relationship::marriage("a", "b").with_note("second marriage");
        let json = serde_json::to_value(&rel).unwrap();
        assert_eq!(json["type"], "marriage");
        assert_eq!(json["person_a"], "a");

        let parsed: Relationship = serde_json::from_str(
            r#"{"person_a":"p","person_b":"c","type":"adopted_child"}"#,
        )
        .unwrap();
        assert_eq!(parsed.kind, RelationshipKind::AdoptedChild);
        assert!(parsed.kind.is_child());
        assert_eq!(parsed.note, None);
    }

    #[test]
    fn test_parse_kinds_and_genders() {
        assert_eq!("female".parse::<Gender>(), Ok(Gender::Female));
        assert!("unknown".parse::<Gender>().is_err());
        assert_eq!(
            "biological_child".parse::<RelationshipKind>(),
            Ok(RelationshipKind::BiologicalChild)
        );
    }
}
