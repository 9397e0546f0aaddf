//! The family snapshot: every person, relationship and private row.
//!
//! A dataset is loaded as a whole and replaced as a whole. Renderers treat
//! it as read-only; edits go through a clone that then replaces the
//! current one.

use crate::error::{CoreError, Result};
use crate::model::{Person, PersonId, PrivateDetails, Relationship};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FamilyDataset {
    pub persons: Vec<Person>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub private_details: Vec<PrivateDetails>,
}

impl FamilyDataset {
    /// Builds a dataset with persons ordered by birth year.
    pub fn new(
        persons: Vec<Person>,
        relationships: Vec<Relationship>,
        private_details: Vec<PrivateDetails>,
    ) -> Self {
        let mut dataset = Self {
            persons,
            relationships,
            private_details,
        };
        dataset.sort_persons();
        dataset
    }

    /// Parses a JSON document.
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: FamilyDataset = serde_json::from_str(text)?;
        Ok(Self::new(
            raw.persons,
            raw.relationships,
            raw.private_details,
        ))
    }

    /// Reads a JSON document from disk.
    pub fn load_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| CoreError::read(path, e))?;
        let dataset = Self::from_json(&text)?;
        debug!(
            "Loaded {} persons and {} relationships from {}",
            dataset.persons.len(),
            dataset.relationships.len(),
            path.display()
        );
        Ok(dataset)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save_json_file(&self, path: &Path) -> Result<()> {
        let json = self.to_json_pretty()?;
        fs::write(path, json).map_err(|e| CoreError::write(path, e))
    }

    /// Stable sort: ascending birth year, unknown years last.
    pub fn sort_persons(&mut self) {
        self.persons
            .sort_by(|a, b| compare_birth_years(a.birth.known_year(), b.birth.known_year()));
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }

    pub fn person(&self, id: &PersonId) -> Option<&Person> {
        self.persons.iter().find(|p| &p.id == id)
    }

    pub fn contains(&self, id: &PersonId) -> bool {
        self.person(id).is_some()
    }

    /// Private row for a person, if one was ever saved.
    pub fn private_details(&self, id: &PersonId) -> Option<&PrivateDetails> {
        self.private_details.iter().find(|d| &d.person_id == id)
    }

    /// Inserts a new person or replaces the record with the same id.
    pub fn upsert_person(&mut self, person: Person) {
        match self.persons.iter_mut().find(|p| p.id == person.id) {
            Some(existing) => *existing = person,
            None => self.persons.push(person),
        }
        self.sort_persons();
    }

    /// Inserts or replaces the private row keyed by person id.
    pub fn upsert_private(&mut self, details: PrivateDetails) {
        match self
            .private_details
            .iter_mut()
            .find(|d| d.person_id == details.person_id)
        {
            Some(existing) => *existing = details,
            None => self.private_details.push(details),
        }
    }

    pub fn add_relationship(&mut self, relationship: Relationship) {
        self.relationships.push(relationship);
    }
}

fn compare_birth_years(a: Option<i32>, b: Option<i32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Gender;

    fn person(id: &str, year: Option<i32>) -> Person {
        Person::new(id, id.to_uppercase(), Gender::Male).with_birth(year, None, None)
    }

    #[test]
    fn test_persons_sorted_by_birth_year_nulls_last() {
        let dataset = FamilyDataset::new(
            vec![
                person("a", None),
                person("b", Some(1950)),
                person("c", Some(1920)),
                person("d", None),
                person("e", Some(1950)),
            ],
            vec![],
            vec![],
        );

        let order: Vec<&str> = dataset.persons.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(order, vec!["c", "b", "e", "a", "d"]);
    }

    #[test]
    fn test_from_json_defaults() {
        let dataset = FamilyDataset::from_json(
            r#"{"persons":[{"id":"1","full_name":"Root","gender":"female"}]}"#,
        )
        .unwrap();

        assert_eq!(dataset.persons.len(), 1);
        assert!(dataset.relationships.is_empty());
        assert!(!dataset.persons[0].is_deceased);
        assert_eq!(dataset.persons[0].gender, Gender::Female);
    }

    #[test]
    fn test_upsert_person_replaces_and_resorts() {
        let mut dataset = FamilyDataset::new(vec![person("a", Some(1900))], vec![], vec![]);
        dataset.upsert_person(person("b", Some(1850)));
        dataset.upsert_person(Person::new("a", "Renamed", Gender::Male).with_birth(Some(1800), None, None));

        assert_eq!(dataset.persons.len(), 2);
        assert_eq!(dataset.persons[0].full_name, "Renamed");
    }

    #[test]
    fn test_json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("family.json");
        let dataset = FamilyDataset::new(
            vec![person("a", Some(1900)), person("b", Some(1930))],
            vec![Relationship::child("a", "b")],
            vec![],
        );

        dataset.save_json_file(&path).unwrap();
        let loaded = FamilyDataset::load_json_file(&path).unwrap();
        assert_eq!(loaded, dataset);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = FamilyDataset::load_json_file(Path::new("/nonexistent/family.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/family.json"));
        assert!(err.to_string().starts_with("failed to read"));
    }

    #[test]
    fn test_save_failure_names_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("family.json");
        let err = FamilyDataset::default().save_json_file(&path).unwrap_err();
        assert!(err.to_string().starts_with("failed to write"));
    }
}
