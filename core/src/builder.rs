use crate::document::{Document, RawRecord};
use crate::error::Result;
use crate::persist::IndexPaths;
use crate::store::{Index, IndexWriter};
use crate::tokenizer::AnalyzerConfig;
use rayon::prelude::*;
use std::time::{Duration, Instant};

/// Progress sample taken every tenth of the input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Checkpoint {
    pub indexed: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    pub documents: usize,
    pub checkpoints: Vec<Checkpoint>,
}

#[derive(Debug)]
pub struct BuildOutcome<D: Document> {
    pub index: Index<D>,
    /// `None` when a committed index already existed and nothing was built.
    pub report: Option<BuildReport>,
}

impl<D: Document> BuildOutcome<D> {
    pub fn was_built(&self) -> bool {
        self.report.is_some()
    }
}

/// Build the collection's index from the records `load` returns, unless one
/// is already committed at `paths`. In that case the existing index is opened
/// and `load` is never called.
pub fn build_index<D, F>(paths: IndexPaths, analyzer: AnalyzerConfig, load: F) -> Result<BuildOutcome<D>>
where
    D: Document,
    F: FnOnce() -> Result<Vec<RawRecord>>,
{
    if paths.is_committed() {
        tracing::info!(kind = %D::KIND, root = %paths.root.display(), "index already exists; skipping indexing");
        return Ok(BuildOutcome { index: Index::open(paths)?, report: None });
    }

    let writer = IndexWriter::<D>::open(paths, analyzer)?;
    let records = load()?;
    let (index, report) = index_records(writer, &records)?;
    Ok(BuildOutcome { index, report: Some(report) })
}

fn index_records<D: Document>(mut writer: IndexWriter<D>, records: &[RawRecord]) -> Result<(Index<D>, BuildReport)> {
    let total = records.len();
    let step = (total / 10).max(1);
    let start = Instant::now();
    let mut checkpoints = Vec::new();

    // par_iter().collect() keeps input order, so doc ids follow the records.
    let docs: Vec<D> = records.par_iter().map(D::from_record).collect();

    for (i, doc) in docs.into_iter().enumerate() {
        writer.add_document(doc);
        if (i + 1) % step == 0 {
            let elapsed = start.elapsed();
            tracing::info!(kind = %D::KIND, indexed = i + 1, total, elapsed_s = elapsed.as_secs_f64(), "indexing progress");
            checkpoints.push(Checkpoint { indexed: i + 1, elapsed });
        }
    }

    let index = writer.commit()?;
    tracing::info!(kind = %D::KIND, num_docs = total, took_s = start.elapsed().as_secs_f64(), "indexed successfully");
    Ok((index, BuildReport { documents: total, checkpoints }))
}
