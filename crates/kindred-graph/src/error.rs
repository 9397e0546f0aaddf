use kindred_core::PersonId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Person not found: {0}")]
    PersonNotFound(PersonId),

    /// The path starts and ends with the same person.
    #[error("Relationship cycle: {}", format_path(.path))]
    Cycle { path: Vec<PersonId> },
}

pub type Result<T> = std::result::Result<T, GraphError>;

fn format_path(path: &[PersonId]) -> String {
    path.iter()
        .map(PersonId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_lists_path() {
        let err = GraphError::Cycle {
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "Relationship cycle: a -> b -> a");
    }
}
