//! Local persistence of the family snapshot.
//!
//! The dataset is stored as one bincode blob in sled. The graph itself is
//! not stored; it is rebuilt from the dataset on load.

use crate::graph::FamilyGraph;
use kindred_core::FamilyDataset;
use sled::Db;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

const DATASET_KEY: &str = "family_dataset";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sled(#[from] sled::Error),
    #[error("Serialization error: {0}")]
    Bincode(#[from] bincode::Error),
}

pub struct FamilyStore {
    db: Db,
}

impl FamilyStore {
    /// Opens or creates a store at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Replaces the stored dataset.
    pub fn save_dataset(&self, dataset: &FamilyDataset) -> Result<(), StoreError> {
        let bytes = bincode::serialize(dataset)?;
        self.db.insert(DATASET_KEY, bytes)?;
        self.db.flush()?;
        debug!("Stored {} persons", dataset.persons.len());
        Ok(())
    }

    pub fn load_dataset(&self) -> Result<Option<FamilyDataset>, StoreError> {
        match self.db.get(DATASET_KEY)? {
            Some(bytes) => {
                let mut dataset: FamilyDataset = bincode::deserialize(&bytes)?;
                dataset.sort_persons();
                Ok(Some(dataset))
            }
            None => Ok(None),
        }
    }

    /// Loads the dataset and builds its graph.
    pub fn load_graph(&self) -> Result<Option<(FamilyDataset, FamilyGraph)>, StoreError> {
        Ok(self.load_dataset()?.map(|dataset| {
            let graph = FamilyGraph::from_dataset(&dataset);
            (dataset, graph)
        }))
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.db.remove(DATASET_KEY)?;
        self.db.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kindred_core::{Gender, Person, PrivateDetails, Relationship};
    use tempfile::tempdir;

    fn sample() -> FamilyDataset {
        let mut private = PrivateDetails::empty("a".into());
        private.occupation = Some("Teacher".to_string());

        FamilyDataset::new(
            vec![
                Person::new("b", "Child", Gender::Female).with_birth(Some(1980), Some(2), None),
                Person::new("a", "Parent", Gender::Male)
                    .with_birth(Some(1950), None, None)
                    .deceased(),
            ],
            vec![Relationship::child("a", "b").with_note("eldest")],
            vec![private],
        )
    }

    #[test]
    fn test_save_load_dataset() {
        let dir = tempdir().unwrap();
        let store = FamilyStore::open(dir.path()).unwrap();

        assert!(store.load_dataset().unwrap().is_none());

        let dataset = sample();
        store.save_dataset(&dataset).unwrap();

        let (loaded, graph) = store.load_graph().unwrap().unwrap();
        assert_eq!(loaded, dataset);
        assert_eq!(graph.children(&"a".into()).len(), 1);
    }

    #[test]
    fn test_clear() {
        let dir = tempdir().unwrap();
        let store = FamilyStore::open(dir.path()).unwrap();
        store.save_dataset(&sample()).unwrap();
        store.clear().unwrap();
        assert!(store.load_dataset().unwrap().is_none());
    }
}
