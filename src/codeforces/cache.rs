extern crate log;

use crate::{error::Result, problem::ProblemIdentifier};
use log::{debug, warn};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// The last source submitted for every problem, used to warn about
/// resubmitting the same code.
#[derive(Debug, Default)]
pub struct SourceHistory {
    path: Option<PathBuf>,
    sources: BTreeMap<ProblemIdentifier, String>,
}

impl SourceHistory {
    pub fn new() -> Self {
        Self::default()
    }
    /// History backed by a yaml file; a missing file starts empty.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut ret = Self {
            path: Some(path.as_ref().to_path_buf()),
            sources: BTreeMap::new(),
        };
        ret.reload()?;
        Ok(ret)
    }

    pub fn last(&self, problem: &ProblemIdentifier) -> Option<&str> {
        self.sources.get(problem).map(String::as_str)
    }
    pub fn len(&self) -> usize {
        self.sources.len()
    }
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = (&ProblemIdentifier, &str)> {
        self.sources.iter().map(|(k, v)| (k, v.as_str()))
    }

    /// Whether `source` matches the last submission of `problem`, ignoring
    /// leading and trailing whitespace.
    pub fn is_duplicate(&self, problem: &ProblemIdentifier, source: &str) -> bool {
        self.last(problem)
            .map_or(false, |last| last.trim() == source.trim())
    }

    pub fn remember(&mut self, problem: &ProblemIdentifier, source: &str) {
        debug!("Remembering source of {}", problem);
        self.sources.insert(problem.clone(), source.to_owned());
        if let Err(e) = self.flush() {
            warn!("Failed to save source history: {}", e);
        }
    }
    pub fn forget(&mut self, problem: &ProblemIdentifier) -> bool {
        let removed = self.sources.remove(problem).is_some();
        if removed {
            if let Err(e) = self.flush() {
                warn!("Failed to save source history: {}", e);
            }
        }
        removed
    }
}

pub mod storage;
