use anyhow::{Context, Result};
use bizsearch_core::config::IndexLayout;
use bizsearch_core::persist::IndexPaths;
use bizsearch_core::tokenizer::AnalyzerConfig;
use bizsearch_core::{build_index, BuildOutcome, BusinessDocument, Document, RawRecord, ReviewDocument};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build the business and review search indexes", long_about = None)]
struct Cli {
    /// Directory holding indexdir/ and review_indexdir/ (default: $BIZSEARCH_INDEX_ROOT or .)
    #[arg(long, global = true)]
    index_root: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build each given collection from CSV; collections already indexed are skipped
    Build {
        /// Business CSV file
        #[arg(long = "business_file", alias = "business-file")]
        business_file: Option<PathBuf>,
        /// Review CSV file
        #[arg(long = "review_file", alias = "review-file")]
        review_file: Option<PathBuf>,
        /// Newline-separated stopword list replacing the built-in English one
        #[arg(long)]
        stopwords: Option<PathBuf>,
        /// Index terms without stemming
        #[arg(long, default_value_t = false)]
        no_stem: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let layout = IndexLayout::resolve(cli.index_root.as_deref())?;

    match cli.command {
        Commands::Build { business_file, review_file, stopwords, no_stem } => {
            if business_file.is_none() && review_file.is_none() {
                anyhow::bail!("nothing to build: pass --business_file and/or --review_file");
            }
            let analyzer = analyzer_config(stopwords.as_deref(), no_stem)?;
            if let Some(file) = business_file {
                let outcome = build_collection::<BusinessDocument>(layout.business(), analyzer.clone(), file)?;
                report("business", &outcome);
            }
            if let Some(file) = review_file {
                let outcome = build_collection::<ReviewDocument>(layout.review(), analyzer, file)?;
                report("review", &outcome);
            }
            Ok(())
        }
    }
}

fn analyzer_config(stopwords: Option<&Path>, no_stem: bool) -> Result<AnalyzerConfig> {
    if no_stem {
        if stopwords.is_some() {
            anyhow::bail!("--stopwords applies to the stemming analyzer only");
        }
        return Ok(AnalyzerConfig::Standard);
    }
    let stopwords = match stopwords {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading stopwords from {}", path.display()))?;
            Some(text.lines().map(str::trim).filter(|w| !w.is_empty()).map(String::from).collect())
        }
        None => None,
    };
    Ok(AnalyzerConfig::Stemming { stopwords })
}

fn build_collection<D: Document>(paths: IndexPaths, analyzer: AnalyzerConfig, file: PathBuf) -> Result<BuildOutcome<D>> {
    let root = paths.root.clone();
    build_index::<D, _>(paths, analyzer, || load_csv(&file))
        .with_context(|| format!("building {} index at {}", D::KIND, root.display()))
}

fn report<D: Document>(label: &str, outcome: &BuildOutcome<D>) {
    match &outcome.report {
        Some(report) => {
            for cp in &report.checkpoints {
                tracing::debug!(collection = label, indexed = cp.indexed, elapsed_s = cp.elapsed.as_secs_f64(), "checkpoint");
            }
            println!("{label} index built with {} documents", report.documents);
        }
        None => println!("{label} index already exists; skipping indexing ({} documents)", outcome.index.len()),
    }
}

/// Read every row of a headed CSV file. Cells that are not valid UTF-8 are
/// decoded lossily, so the row still becomes a document. Only rows the reader
/// cannot split at all are skipped with a warning.
fn load_csv(path: &Path) -> bizsearch_core::Result<Vec<RawRecord>> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_path(path).map_err(io::Error::from)?;
    let headers: Vec<String> =
        rdr.byte_headers().map_err(io::Error::from)?.iter().map(|h| String::from_utf8_lossy(h).into_owned()).collect();

    let mut records = Vec::new();
    for (idx, result) in rdr.byte_records().enumerate() {
        match result {
            Ok(row) => {
                if std::str::from_utf8(row.as_slice()).is_err() {
                    tracing::warn!(file = %path.display(), row = idx + 1, "row holds invalid UTF-8; decoding lossily");
                }
                let cells = row.iter().map(|cell| String::from_utf8_lossy(cell).into_owned());
                records.push(RawRecord::from_pairs(headers.iter().map(String::as_str).zip(cells)));
            }
            Err(e) => tracing::warn!(file = %path.display(), row = idx + 1, error = %e, "skipping unreadable row"),
        }
    }
    tracing::info!(file = %path.display(), rows = records.len(), "loaded records");
    Ok(records)
}
