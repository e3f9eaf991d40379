use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::persist::IndexPaths;

pub const ROOT_ENV: &str = "BIZSEARCH_INDEX_ROOT";
pub const BUSINESS_DIR: &str = "indexdir";
pub const REVIEW_DIR: &str = "review_indexdir";

/// Where the two collection indexes live.
#[derive(Debug, Clone)]
pub struct IndexLayout {
    root: PathBuf,
}

impl IndexLayout {
    /// Resolve the index root from, in order of priority:
    /// 1. An explicit path (from --index-root)
    /// 2. The BIZSEARCH_INDEX_ROOT environment variable
    /// 3. The current directory
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let root = if let Some(path) = explicit {
            path.to_path_buf()
        } else if let Ok(val) = std::env::var(ROOT_ENV) {
            if val.trim().is_empty() {
                return Err(Error::Config(format!("{ROOT_ENV} is set but empty")));
            }
            PathBuf::from(val)
        } else {
            PathBuf::from(".")
        };
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn business(&self) -> IndexPaths {
        IndexPaths::new(self.root.join(BUSINESS_DIR))
    }

    pub fn review(&self) -> IndexPaths {
        IndexPaths::new(self.root.join(REVIEW_DIR))
    }
}
