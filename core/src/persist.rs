use crate::document::CollectionKind;
use crate::error::{Error, Result};
use crate::index::{DocId, InvertedIndex};
use crate::tokenizer::AnalyzerConfig;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::{self, create_dir_all, File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub kind: CollectionKind,
    pub num_docs: u32,
    pub num_terms: u32,
    pub created_at: String,
    pub version: u32,
    pub analyzer: AnalyzerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn postings(&self) -> PathBuf { self.root.join("postings.bin") }
    fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
    fn doc_id_map(&self) -> PathBuf { self.root.join("doc_id_map.bin") }

    /// Sibling of the root, so that it survives the rename at commit.
    pub fn lock_file(&self) -> PathBuf { self.sibling("lock") }
    fn staging(&self) -> PathBuf { self.sibling("staging") }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name: OsString = self.root.file_name().map(OsString::from).unwrap_or_else(|| "index".into());
        name.push(".");
        name.push(suffix);
        self.root.with_file_name(name)
    }

    /// A committed index is one whose `meta.json` is in place.
    pub fn is_committed(&self) -> bool {
        self.meta().is_file()
    }

    /// Roots like `.` or `/` have no name to hang the lock and staging
    /// siblings on, and must never be replaced at commit.
    fn check_root(&self) -> Result<()> {
        if self.root.file_name().is_none() {
            return Err(Error::InvalidRoot { path: self.root.clone() });
        }
        Ok(())
    }
}

/// Fails with [`Error::RootNotEmpty`] when an uncommitted root holds anything.
/// Only an absent or empty root may be replaced by a commit.
pub fn ensure_replaceable(paths: &IndexPaths) -> Result<()> {
    paths.check_root()?;
    if paths.root.exists() && fs::read_dir(&paths.root)?.next().is_some() {
        return Err(Error::RootNotEmpty { path: paths.root.clone() });
    }
    Ok(())
}

/// Exclusive write access to one index directory, released on drop.
#[derive(Debug)]
pub struct WriteLock {
    path: PathBuf,
}

impl WriteLock {
    pub fn acquire(paths: &IndexPaths) -> Result<Self> {
        paths.check_root()?;
        let path = paths.lock_file();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_dir_all(parent)?;
        }
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut f) => {
                writeln!(f, "{}", std::process::id())?;
                Ok(Self { path })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(Error::WriterLocked { path: paths.root.clone() }),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release index lock");
        }
    }
}

fn write_bincode<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut f = File::create(path)?;
    let bytes = bincode::serialize(value)?;
    f.write_all(&bytes)?;
    f.sync_all()?;
    Ok(())
}

fn read_bincode<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let mut f = File::open(path)?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    Ok(bincode::deserialize(&buf)?)
}

pub fn save_postings(paths: &IndexPaths, index: &InvertedIndex) -> Result<()> {
    write_bincode(&paths.postings(), index)
}

pub fn load_postings(paths: &IndexPaths) -> Result<InvertedIndex> {
    read_bincode(&paths.postings())
}

pub fn save_docs<D: Serialize>(paths: &IndexPaths, docs: &[D]) -> Result<()> {
    write_bincode(&paths.docs(), docs)
}

pub fn load_docs<D: DeserializeOwned>(paths: &IndexPaths) -> Result<Vec<D>> {
    read_bincode(&paths.docs())
}

pub fn save_doc_id_map(paths: &IndexPaths, map: &HashMap<String, DocId>) -> Result<()> {
    write_bincode(&paths.doc_id_map(), map)
}

pub fn load_doc_id_map(paths: &IndexPaths) -> Result<HashMap<String, DocId>> {
    read_bincode(&paths.doc_id_map())
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    f.sync_all()?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = match File::open(paths.meta()) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(Error::IndexNotFound { path: paths.root.clone() })
        }
        Err(e) => return Err(e.into()),
    };
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    if meta.version != FORMAT_VERSION {
        return Err(Error::UnsupportedVersion { found: meta.version, supported: FORMAT_VERSION });
    }
    Ok(meta)
}

/// Everything a commit writes.
pub struct Segments<'a, D> {
    pub index: &'a InvertedIndex,
    pub docs: &'a [D],
    pub doc_id_map: &'a HashMap<String, DocId>,
    pub meta: &'a MetaFile,
}

/// Write all segments into a staging directory, then rename it over the root.
/// `meta.json` goes last, so neither a partial staging dir nor a half-written
/// root is ever taken for a committed index. Caller must hold the [`WriteLock`].
pub fn commit_segments<D: Serialize>(paths: &IndexPaths, segments: Segments<'_, D>) -> Result<()> {
    if paths.is_committed() {
        return Err(Error::IndexExists { path: paths.root.clone() });
    }
    ensure_replaceable(paths)?;
    let staging = IndexPaths::new(paths.staging());
    if staging.root.exists() {
        fs::remove_dir_all(&staging.root)?;
    }
    create_dir_all(&staging.root)?;

    save_postings(&staging, segments.index)?;
    save_docs(&staging, segments.docs)?;
    save_doc_id_map(&staging, segments.doc_id_map)?;
    save_meta(&staging, segments.meta)?;

    if paths.root.exists() {
        fs::remove_dir(&paths.root)?;
    }
    fs::rename(&staging.root, &paths.root)?;
    tracing::debug!(root = %paths.root.display(), "segments committed");
    Ok(())
}
