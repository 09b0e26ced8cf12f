//! Corpus adapters.
//!
//! Each adapter turns one raw corpus into a [`Dataset`]. Structural problems
//! with the input (unaligned files, unreadable JSON) abort the build;
//! problems with a single entry are collected in a [`BatchReport`] and the
//! build carries on.

use crate::config::BuildConfig;
use crate::dataset::Dataset;
use crate::Error;
use log::warn;
use std::fmt;

pub mod dbnqa_adapter;
pub mod lcquad_adapter;
pub mod monument_adapter;

pub use dbnqa_adapter::DbnqaAdapter;
pub use lcquad_adapter::LcquadAdapter;
pub use monument_adapter::MonumentAdapter;

/// One entry that a batch pass could not process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFailure {
    pub entry_id: String,
    pub error: String,
}

/// Outcome of a per-entry batch pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failures: Vec<EntryFailure>,
}

impl BatchReport {
    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, entry_id: &str, error: Error) {
        warn!("Entry {}: {}", entry_id, error);
        self.failures.push(EntryFailure { entry_id: entry_id.to_string(), error: error.to_string() });
    }

    pub fn merge(&mut self, other: BatchReport) {
        self.succeeded += other.succeeded;
        self.failures.extend(other.failures);
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_ids(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.entry_id.as_str()).collect()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} succeeded, {} failed", self.succeeded, self.failures.len())
    }
}

/// A built dataset and the per-entry failures met while building it.
#[derive(Debug)]
pub struct BuildOutput {
    pub dataset: Dataset,
    pub report: BatchReport,
}

/// A raw corpus that can be turned into a dataset.
pub trait CorpusAdapter {
    /// Key under which source fields are kept in `original_data`.
    fn source_name(&self) -> &'static str;

    fn build(&self, config: &BuildConfig) -> crate::Result<BuildOutput>;
}
