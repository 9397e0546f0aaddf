//! The shared family snapshot and its generation counter.
//!
//! Every load or mutation takes a ticket from the counter before it starts
//! and installs its result only if no newer ticket has been installed in
//! the meantime. A slow load that finishes after a faster, newer one is
//! dropped.

use kindred_core::FamilyDataset;
use kindred_graph::FamilyGraph;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// One immutable view of the family data.
#[derive(Debug, Clone, Default)]
pub struct FamilyState {
    pub dataset: FamilyDataset,
    pub graph: FamilyGraph,
    /// Ticket of the load that produced this state; 0 before any load.
    pub generation: u64,
}

impl FamilyState {
    pub fn new(dataset: FamilyDataset, generation: u64) -> Self {
        let graph = FamilyGraph::from_dataset(&dataset);
        Self {
            dataset,
            graph,
            generation,
        }
    }
}

/// Shared state across connections.
pub type SharedState = Arc<RwLock<FamilyState>>;

/// Hands out increasing load tickets.
#[derive(Debug, Clone, Default)]
pub struct Generation(Arc<AtomicU64>);

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the next ticket. Tickets start at 1.
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Replaces the snapshot if `generation` is newer than the installed one.
///
/// Returns whether the dataset was installed.
pub async fn install_if_newer(state: &SharedState, generation: u64, dataset: FamilyDataset) -> bool {
    // Build outside the lock; readers keep the old snapshot meanwhile.
    let next = FamilyState::new(dataset, generation);

    let mut current = state.write().await;
    if generation <= current.generation {
        debug!(
            "Discarding stale load {} (installed {})",
            generation, current.generation
        );
        return false;
    }

    info!(
        "Installed snapshot {} ({} persons, {} relationships)",
        generation,
        next.graph.node_count(),
        next.graph.edge_count()
    );
    *current = next;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use kindred_core::{Gender, Person};

    fn dataset(name: &str) -> FamilyDataset {
        FamilyDataset::new(vec![Person::new("p", name, Gender::Male)], vec![], vec![])
    }

    #[tokio::test]
    async fn test_stale_load_is_discarded() {
        let state: SharedState = Arc::new(RwLock::new(FamilyState::default()));
        let generation = Generation::new();

        let slow = generation.next();
        let fast = generation.next();

        assert!(install_if_newer(&state, fast, dataset("new")).await);
        assert!(!install_if_newer(&state, slow, dataset("old")).await);

        let current = state.read().await;
        assert_eq!(current.generation, fast);
        assert_eq!(current.dataset.persons[0].full_name, "new");
    }

    #[test]
    fn test_tickets_increase() {
        let generation = Generation::new();
        assert_eq!(generation.current(), 0);
        assert_eq!(generation.next(), 1);
        assert_eq!(generation.clone().next(), 2);
        assert_eq!(generation.current(), 2);
    }
}
