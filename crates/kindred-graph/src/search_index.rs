//! Name index for the root selector and member search.
//!
//! Names are split into overlapping bigrams and trigrams. A query is
//! answered by intersecting the posting sets of its n-grams and then
//! confirming the substring against the full lowercased name.

use crate::graph::NodeId;
use std::collections::{HashMap, HashSet};

const MIN_NGRAM_LEN: usize = 2;
const MAX_NGRAM_LEN: usize = 3;

#[derive(Debug, Default, Clone)]
pub struct SearchIndex {
    /// Lowercased full name per node.
    names: HashMap<NodeId, String>,
    ngram_index: HashMap<String, HashSet<NodeId>>,
}

impl SearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes a person's name.
    pub fn insert(&mut self, name: &str, id: NodeId) {
        let lower = name.to_lowercase();
        for ngram in ngrams(&lower) {
            self.ngram_index.entry(ngram).or_default().insert(id);
        }
        self.names.insert(id, lower);
    }

    /// Nodes whose names contain the query, case-insensitively.
    ///
    /// Results are sorted by node index, which is snapshot order.
    pub fn search(&self, query: &str) -> Vec<NodeId> {
        let query = query.to_lowercase();

        let mut results: Vec<NodeId> = if query.chars().count() < MIN_NGRAM_LEN {
            self.names
                .iter()
                .filter(|(_, name)| name.contains(&query))
                .map(|(id, _)| *id)
                .collect()
        } else {
            let mut candidates: Option<HashSet<NodeId>> = None;
            for ngram in ngrams(&query) {
                let Some(ids) = self.ngram_index.get(&ngram) else {
                    return Vec::new();
                };
                match &mut candidates {
                    None => candidates = Some(ids.clone()),
                    Some(c) => c.retain(|id| ids.contains(id)),
                }
            }

            candidates
                .unwrap_or_default()
                .into_iter()
                .filter(|id| {
                    self.names
                        .get(id)
                        .map(|name| name.contains(&query))
                        .unwrap_or(false)
                })
                .collect()
        };

        results.sort();
        results
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn ngrams(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut out = Vec::new();

    for n in MIN_NGRAM_LEN..=MAX_NGRAM_LEN {
        if chars.len() >= n {
            for window in chars.windows(n) {
                out.push(window.iter().collect());
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use petgraph::graph::NodeIndex;

    fn node(n: usize) -> NodeId {
        NodeIndex::new(n)
    }

    #[test]
    fn test_search_substring_any_position() {
        let mut index = SearchIndex::new();
        index.insert("Nguyễn Văn An", node(0));
        index.insert("Trần Thị Bình", node(1));
        index.insert("Nguyễn Thị Cúc", node(2));

        assert_eq!(index.search("nguyễn"), vec![node(0), node(2)]);
        assert_eq!(index.search("THỊ"), vec![node(1), node(2)]);
        assert_eq!(index.search("bình"), vec![node(1)]);
    }

    #[test]
    fn test_single_character_query() {
        let mut index = SearchIndex::new();
        index.insert("An", node(0));
        index.insert("Bo", node(1));

        assert_eq!(index.search("n"), vec![node(0)]);
    }

    #[test]
    fn test_no_match() {
        let mut index = SearchIndex::new();
        index.insert("hello", node(0));
        assert!(index.search("world").is_empty());
        assert!(index.search("hello world").is_empty());
    }
}
