use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub type TermId = u32;
pub type DocId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub term_frequency: u32,
}

/// Dictionary and postings of one indexed field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldPostings {
    pub dictionary: HashMap<String, TermId>,
    pub df: Vec<u32>,
    pub postings: Vec<Vec<Posting>>, // by term id, doc ids in insertion order
}

impl FieldPostings {
    fn add(&mut self, doc_id: DocId, tokens: Vec<(String, usize)>) {
        let mut tf_counts: Vec<(TermId, u32)> = Vec::new();
        for (term, _pos) in tokens {
            let next = self.dictionary.len() as TermId;
            let tid = *self.dictionary.entry(term).or_insert(next);
            if tid == next {
                self.df.push(0);
                self.postings.push(Vec::new());
            }
            match tf_counts.iter_mut().find(|(t, _)| *t == tid) {
                Some((_, tf)) => *tf += 1,
                None => tf_counts.push((tid, 1)),
            }
        }
        for (tid, term_frequency) in tf_counts {
            self.df[tid as usize] += 1;
            self.postings[tid as usize].push(Posting { doc_id, term_frequency });
        }
    }

    pub fn get(&self, term: &str) -> &[Posting] {
        self.dictionary
            .get(term)
            .and_then(|tid| self.postings.get(*tid as usize))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn num_terms(&self) -> usize {
        self.dictionary.len()
    }

    /// Iterate `(term, postings)` pairs in term id order.
    pub fn terms(&self) -> impl Iterator<Item = (&str, &[Posting])> {
        let mut by_id: Vec<(&str, TermId)> =
            self.dictionary.iter().map(|(t, id)| (t.as_str(), *id)).collect();
        by_id.sort_unstable_by_key(|(_, id)| *id);
        by_id.into_iter().map(move |(t, id)| (t, self.postings[id as usize].as_slice()))
    }
}

/// Term postings for every indexed field of one collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvertedIndex {
    pub fields: BTreeMap<String, FieldPostings>,
    pub num_docs: u32,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Record one document's analyzed fields. Ids must be assigned in increasing order.
    pub fn add_document<'a, I>(&mut self, doc_id: DocId, fields: I)
    where
        I: IntoIterator<Item = (&'a str, Vec<(String, usize)>)>,
    {
        for (field, tokens) in fields {
            self.fields.entry(field.to_string()).or_default().add(doc_id, tokens);
        }
        self.num_docs = self.num_docs.max(doc_id + 1);
    }

    pub fn field(&self, field: &str) -> Option<&FieldPostings> {
        self.fields.get(field)
    }

    pub fn postings(&self, field: &str, term: &str) -> &[Posting] {
        self.field(field).map(|f| f.get(term)).unwrap_or(&[])
    }

    pub fn num_terms(&self) -> usize {
        self.fields.values().map(FieldPostings::num_terms).sum()
    }
}
