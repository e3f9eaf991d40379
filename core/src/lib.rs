pub mod analytics;
pub mod builder;
pub mod config;
pub mod document;
pub mod error;
pub mod geo;
pub mod index;
pub mod persist;
pub mod query;
pub mod ranker;
pub mod search;
pub mod store;
pub mod tokenizer;

pub use builder::{build_index, BuildOutcome, BuildReport, Checkpoint};
pub use document::{BusinessDocument, BusinessField, CollectionKind, Document, RawRecord, ReviewDocument, ReviewField};
pub use error::{Error, Result};
pub use index::{DocId, InvertedIndex, Posting, TermId};
pub use ranker::{BusinessSort, Ranked, ReviewSort};
pub use store::{Index, IndexWriter};
