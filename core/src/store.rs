//! Read and write handles over one collection's persisted index.

use crate::document::{Document, IndexedField};
use crate::error::{Error, Result};
use crate::index::{DocId, InvertedIndex, Posting};
use crate::persist::{
    commit_segments, ensure_replaceable, load_doc_id_map, load_docs, load_meta, load_postings, IndexPaths, MetaFile,
    Segments, WriteLock, FORMAT_VERSION,
};
use crate::tokenizer::{Analyzer, AnalyzerConfig};
use std::collections::HashMap;
use std::fmt;

/// Exclusive, uncommitted writer. Nothing is visible to readers until [`IndexWriter::commit`].
pub struct IndexWriter<D: Document> {
    paths: IndexPaths,
    _lock: WriteLock,
    analyzer_config: AnalyzerConfig,
    analyzer: Box<dyn Analyzer>,
    index: InvertedIndex,
    docs: Vec<D>,
    doc_id_map: HashMap<String, DocId>,
}

impl<D: Document> IndexWriter<D> {
    /// Fails fast with [`Error::WriterLocked`] if another writer holds the
    /// index, with [`Error::IndexExists`] if it is already committed, and
    /// with [`Error::RootNotEmpty`] if the root holds anything else.
    pub fn open(paths: IndexPaths, analyzer_config: AnalyzerConfig) -> Result<Self> {
        let lock = WriteLock::acquire(&paths)?;
        if paths.is_committed() {
            return Err(Error::IndexExists { path: paths.root.clone() });
        }
        ensure_replaceable(&paths)?;
        let analyzer = analyzer_config.build();
        Ok(Self {
            paths,
            _lock: lock,
            analyzer_config,
            analyzer,
            index: InvertedIndex::new(),
            docs: Vec::new(),
            doc_id_map: HashMap::new(),
        })
    }

    pub fn add_document(&mut self, doc: D) -> DocId {
        let doc_id = self.docs.len() as DocId;
        {
            let analyzer = &self.analyzer;
            let fields = doc
                .indexed_text()
                .into_iter()
                .map(|(field, text)| (field.name(), analyzer.analyze(text)));
            self.index.add_document(doc_id, fields);
        }
        if self.doc_id_map.contains_key(doc.key()) {
            tracing::warn!(kind = %D::KIND, key = doc.key(), doc_id, "duplicate document key; lookups resolve to the first");
        } else {
            self.doc_id_map.insert(doc.key().to_string(), doc_id);
        }
        self.docs.push(doc);
        doc_id
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn commit(self) -> Result<Index<D>> {
        let meta = MetaFile {
            kind: D::KIND,
            num_docs: self.docs.len() as u32,
            num_terms: self.index.num_terms() as u32,
            created_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_default(),
            version: FORMAT_VERSION,
            analyzer: self.analyzer_config,
        };
        commit_segments(
            &self.paths,
            Segments { index: &self.index, docs: &self.docs, doc_id_map: &self.doc_id_map, meta: &meta },
        )?;
        tracing::info!(kind = %D::KIND, num_docs = meta.num_docs, num_terms = meta.num_terms, root = %self.paths.root.display(), "index committed");
        Ok(Index {
            paths: self.paths,
            meta,
            analyzer: self.analyzer,
            index: self.index,
            docs: self.docs,
            doc_id_map: self.doc_id_map,
        })
    }
}

/// Immutable, shareable read handle on a committed index.
pub struct Index<D: Document> {
    paths: IndexPaths,
    meta: MetaFile,
    analyzer: Box<dyn Analyzer>,
    index: InvertedIndex,
    docs: Vec<D>,
    doc_id_map: HashMap<String, DocId>,
}

impl<D: Document> Index<D> {
    pub fn open(paths: IndexPaths) -> Result<Self> {
        let meta = load_meta(&paths)?;
        if meta.kind != D::KIND {
            return Err(Error::CollectionMismatch { expected: D::KIND, found: meta.kind });
        }
        let index = load_postings(&paths)?;
        let docs: Vec<D> = load_docs(&paths)?;
        let doc_id_map = load_doc_id_map(&paths)?;
        let analyzer = meta.analyzer.build();
        tracing::debug!(kind = %D::KIND, num_docs = docs.len(), root = %paths.root.display(), "index opened");
        Ok(Self { paths, meta, analyzer, index, docs, doc_id_map })
    }

    pub fn paths(&self) -> &IndexPaths {
        &self.paths
    }

    pub fn meta(&self) -> &MetaFile {
        &self.meta
    }

    /// The analyzer this index was built with; queries must use it.
    pub fn analyzer(&self) -> &dyn Analyzer {
        self.analyzer.as_ref()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&D> {
        self.doc_id_map.get(key).and_then(|id| self.document(*id))
    }

    pub fn document(&self, doc_id: DocId) -> Option<&D> {
        self.docs.get(doc_id as usize)
    }

    /// Full scan in document id order.
    pub fn documents(&self) -> impl Iterator<Item = (DocId, &D)> {
        self.docs.iter().enumerate().map(|(i, d)| (i as DocId, d))
    }

    pub fn postings(&self, field: D::Field, term: &str) -> &[Posting] {
        self.index.postings(field.name(), term)
    }

    pub fn inverted_index(&self) -> &InvertedIndex {
        &self.index
    }

    pub fn close(self) {
        tracing::debug!(kind = %D::KIND, root = %self.paths.root.display(), "index closed");
    }
}

impl<D: Document> fmt::Debug for Index<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Index")
            .field("root", &self.paths.root)
            .field("kind", &self.meta.kind)
            .field("num_docs", &self.docs.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{BusinessDocument, BusinessField, RawRecord, ReviewDocument};

    fn business(id: &str, name: &str, stars: &str) -> BusinessDocument {
        BusinessDocument::from_record(&RawRecord::from_pairs([
            ("business_id", id),
            ("name", name),
            ("stars", stars),
            ("latitude", "53.5461"),
            ("longitude", "-113.4938"),
        ]))
    }

    #[test]
    fn committed_index_round_trips_stored_fields() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(tmp.path().join("indexdir"));
        let mut w = IndexWriter::<BusinessDocument>::open(paths.clone(), AnalyzerConfig::default()).unwrap();
        let original = business("b1", "Apex Cafe", "4.5");
        w.add_document(original.clone());
        w.commit().unwrap().close();

        let ix = Index::<BusinessDocument>::open(paths).unwrap();
        assert_eq!(ix.get("b1"), Some(&original));
        assert_eq!(ix.postings(BusinessField::Name, "cafe").len(), 1);
        assert_eq!(ix.meta().num_docs, 1);
    }

    #[test]
    fn readers_do_not_see_uncommitted_writes() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(tmp.path().join("indexdir"));
        let mut w = IndexWriter::<BusinessDocument>::open(paths.clone(), AnalyzerConfig::default()).unwrap();
        w.add_document(business("b1", "Apex Cafe", "4.5"));
        assert!(matches!(Index::<BusinessDocument>::open(paths.clone()), Err(Error::IndexNotFound { .. })));
        drop(w);
        assert!(!paths.lock_file().exists());
    }

    #[test]
    fn second_writer_fails_fast() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(tmp.path().join("indexdir"));
        let _w = IndexWriter::<BusinessDocument>::open(paths.clone(), AnalyzerConfig::default()).unwrap();
        let second = IndexWriter::<BusinessDocument>::open(paths, AnalyzerConfig::default());
        assert!(matches!(second, Err(Error::WriterLocked { .. })));
    }

    #[test]
    fn committed_index_refuses_writers() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(tmp.path().join("indexdir"));
        IndexWriter::<BusinessDocument>::open(paths.clone(), AnalyzerConfig::default()).unwrap().commit().unwrap();
        let again = IndexWriter::<BusinessDocument>::open(paths, AnalyzerConfig::default());
        assert!(matches!(again, Err(Error::IndexExists { .. })));
    }

    #[test]
    fn opening_with_wrong_collection_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(tmp.path().join("indexdir"));
        IndexWriter::<BusinessDocument>::open(paths.clone(), AnalyzerConfig::default()).unwrap().commit().unwrap();
        let err = Index::<ReviewDocument>::open(paths).unwrap_err();
        assert!(matches!(err, Error::CollectionMismatch { .. }));
    }

    #[test]
    fn writer_refuses_a_root_holding_other_files() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(tmp.path().join("indexdir"));
        std::fs::create_dir_all(&paths.root).unwrap();
        std::fs::write(paths.root.join("data.csv"), "business_id\n").unwrap();

        let res = IndexWriter::<BusinessDocument>::open(paths.clone(), AnalyzerConfig::default());
        assert!(matches!(res, Err(Error::RootNotEmpty { .. })));
        assert!(paths.root.join("data.csv").exists());
        assert!(!paths.lock_file().exists());
    }

    #[test]
    fn index_handles_are_send_and_sync() {
        fn shareable<T: Send + Sync>() {}
        shareable::<Index<BusinessDocument>>();
        shareable::<Index<ReviewDocument>>();
    }

    #[test]
    fn duplicate_keys_keep_every_document() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(tmp.path().join("indexdir"));
        let mut w = IndexWriter::<BusinessDocument>::open(paths, AnalyzerConfig::default()).unwrap();
        w.add_document(business("dup", "First Grill", "3"));
        w.add_document(business("dup", "Second Grill", "4"));
        let ix = w.commit().unwrap();
        assert_eq!(ix.len(), 2);
        assert_eq!(ix.get("dup").unwrap().name, "first grill");
        assert_eq!(ix.postings(BusinessField::Name, "grill").len(), 2);
    }
}
