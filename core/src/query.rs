use crate::document::Document;
use crate::index::DocId;
use crate::store::Index;
use crate::tokenizer::normalize;
use std::collections::BTreeSet;

/// Keyword matching against one field of one collection.
pub struct QueryEngine<'a, D: Document> {
    index: &'a Index<D>,
    field: D::Field,
}

impl<'a, D: Document> QueryEngine<'a, D> {
    pub fn new(index: &'a Index<D>, field: D::Field) -> Self {
        Self { index, field }
    }

    /// Query terms, analyzed exactly as the indexed field was. Duplicates are removed.
    pub fn parse(&self, query: &str) -> Vec<String> {
        let normalized = normalize(Some(query));
        let mut terms: Vec<String> = Vec::new();
        for (term, _pos) in self.index.analyzer().analyze(&normalized) {
            if !terms.contains(&term) {
                terms.push(term);
            }
        }
        terms
    }

    /// Ids of documents whose field holds at least one query term, ascending.
    pub fn matching_ids(&self, query: &str) -> Vec<DocId> {
        let mut ids = BTreeSet::new();
        for term in self.parse(query) {
            ids.extend(self.index.postings(self.field, &term).iter().map(|p| p.doc_id));
        }
        ids.into_iter().collect()
    }

    /// The complete match set in insertion order. Never truncated: limiting
    /// belongs to the ranker, after the requested sort.
    pub fn search(&self, query: &str) -> Vec<&'a D> {
        let index = self.index;
        let matches: Vec<&'a D> = self.matching_ids(query).into_iter().filter_map(|id| index.document(id)).collect();
        tracing::debug!(kind = %D::KIND, field = ?self.field, query, total_hits = matches.len(), "query matched");
        matches
    }
}
