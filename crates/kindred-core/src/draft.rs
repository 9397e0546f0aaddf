//! Admin edit forms and their validation.
//!
//! A draft is what an admin submits; validation turns it into the record
//! that gets stored. Blank text fields become `None`, and a person who is
//! not marked deceased never keeps death date parts.

use crate::dataset::FamilyDataset;
use crate::error::{CoreError, Result};
use crate::model::{DateParts, Gender, Person, PersonId, PrivateDetails, Relationship, RelationshipKind};
use serde::{Deserialize, Serialize};

/// Submitted person form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonDraft {
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

impl PersonDraft {
    pub fn new(full_name: impl Into<String>, gender: Gender) -> Self {
        Self {
            full_name: full_name.into(),
            gender,
            ..Default::default()
        }
    }

    /// Pre-fills the form from an existing record.
    pub fn from_person(person: &Person) -> Self {
        Self {
            full_name: person.full_name.clone(),
            gender: person.gender,
            birth: person.birth,
            death: person.death,
            is_deceased: person.is_deceased,
            is_in_law: person.is_in_law,
            avatar_url: person.avatar_url.clone(),
            note: person.note.clone(),
        }
    }

    /// Validates the form and produces the record stored under `id`.
    pub fn into_person(self, id: PersonId) -> Result<Person> {
        let full_name = self.full_name.trim().to_string();
        if full_name.is_empty() {
            return Err(CoreError::validation("full_name", "name is required"));
        }

        validate_date("birth", &self.birth)?;
        let death = if self.is_deceased {
            validate_date("death", &self.death)?;
            self.death
        } else {
            DateParts::default()
        };

        Ok(Person {
            id,
            full_name,
            gender: self.gender,
            birth: self.birth,
            death,
            is_deceased: self.is_deceased,
            is_in_law: self.is_in_law,
            avatar_url: non_blank(self.avatar_url),
            note: non_blank(self.note),
        })
    }
}

/// Submitted private details form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateDraft {
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub current_residence: Option<String>,
}

impl PrivateDraft {
    pub fn into_details(self, person_id: PersonId) -> PrivateDetails {
        PrivateDetails {
            person_id,
            phone_number: non_blank(self.phone_number),
            occupation: non_blank(self.occupation),
            current_residence: non_blank(self.current_residence),
        }
    }
}

/// Submitted relationship form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipDraft {
    pub person_a: PersonId,
    pub person_b: PersonId,
    #[serde(rename = "type")]
    pub kind: RelationshipKind,
    #[serde(default)]
    pub note: Option<String>,
}

impl RelationshipDraft {
    /// Checks both endpoints exist and differ.
    ///
    /// Ancestry cycles need the graph and are checked by the caller.
    pub fn validate(self, dataset: &FamilyDataset) -> Result<Relationship> {
        for id in [&self.person_a, &self.person_b] {
            if !dataset.contains(id) {
                return Err(CoreError::PersonNotFound(id.to_string()));
            }
        }
        if self.person_a == self.person_b {
            return Err(CoreError::validation(
                "person_b",
                "a person cannot be related to themselves",
            ));
        }

        Ok(Relationship {
            person_a: self.person_a,
            person_b: self.person_b,
            kind: self.kind,
            note: non_blank(self.note),
        })
    }
}

fn validate_date(field: &'static str, date: &DateParts) -> Result<()> {
    if let Some(month) = date.known_month() {
        if !(1..=12).contains(&month) {
            return Err(CoreError::validation(field, format!("invalid month {}", month)));
        }
    }
    if let Some(day) = date.known_day() {
        if !(1..=31).contains(&day) {
            return Err(CoreError::validation(field, format!("invalid day {}", day)));
        }
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_required() {
        let err = PersonDraft::new("   ", Gender::Male)
            .into_person(PersonId::generate())
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { field: "full_name", .. }));
    }

    #[test]
    fn test_living_person_drops_death_parts() {
        let mut draft = PersonDraft::new("Pham Huu C", Gender::Male);
        draft.death = DateParts::new(Some(1999), None, None);

        let person = draft.into_person("c".into()).unwrap();
        assert!(!person.death.any_present());
        assert!(!person.is_deceased());
    }

    #[test]
    fn test_blank_optional_fields_become_none() {
        let mut draft = PersonDraft::new(" Le Thi D ", Gender::Female);
        draft.note = Some("  ".to_string());
        draft.avatar_url = Some(String::new());

        let person = draft.into_person("d".into()).unwrap();
        assert_eq!(person.full_name, "Le Thi D");
        assert_eq!(person.note, None);
        assert_eq!(person.avatar_url, None);
    }

    #[test]
    fn test_invalid_month_rejected() {
        let mut draft = PersonDraft::new("E", Gender::Other);
        draft.birth = DateParts::new(Some(1990), Some(13), None);
        assert!(draft.into_person("e".into()).is_err());
    }

    #[test]
    fn test_relationship_draft_checks_endpoints() {
        let dataset = FamilyDataset::new(
            vec![
                Person::new("a", "A", Gender::Male),
                Person::new("b", "B", Gender::Female),
            ],
            vec![],
            vec![],
        );

        let ok = RelationshipDraft {
            person_a: "a".into(),
            person_b: "b".into(),
            kind: RelationshipKind::Marriage,
            note: Some(String::new()),
        }
        .validate(&dataset)
        .unwrap();
        assert_eq!(ok.note, None);

        let missing = RelationshipDraft {
            person_a: "a".into(),
            person_b: "zzz".into(),
            kind: RelationshipKind::BiologicalChild,
            note: None,
        }
        .validate(&dataset);
        assert!(matches!(missing, Err(CoreError::PersonNotFound(_))));

        let self_link = RelationshipDraft {
            person_a: "a".into(),
            person_b: "a".into(),
            kind: RelationshipKind::Marriage,
            note: None,
        }
        .validate(&dataset);
        assert!(self_link.is_err());
    }

    #[test]
    fn test_private_draft() {
        let details = PrivateDraft {
            phone_number: Some("0901".to_string()),
            occupation: Some(" ".to_string()),
            current_residence: None,
        }
        .into_details("a".into());

        assert_eq!(details.phone_number.as_deref(), Some("0901"));
        assert_eq!(details.occupation, None);
    }
}
