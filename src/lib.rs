//! # nlsparql
//!
//! nlsparql builds supervised training datasets for natural-language-to-SPARQL
//! translation from heterogeneous corpora (LC-QuAD, Monument, DBNQA).
//!
//! A query travels between three renderings:
//!
//! - **pure** SPARQL, with shortened DBpedia prefixes (`dbr:`, `dbo:`, ...)
//! - **intermediary** SPARQL, where punctuation and prefixes become flat
//!   word-like tokens (`brack_open`, `var_x`, `dbo_author`)
//! - **URI-tagged** intermediary SPARQL, where selected knowledge-base classes
//!   keep their literal prefixed form so a sequence model can copy them
//!
//! ## Example
//!
//! ```rust
//! use nlsparql::core::TagFlags;
//! use nlsparql::parsing::query_normalizer::QueryNormalizer;
//!
//! fn example() -> nlsparql::Result<()> {
//!     let normalizer = QueryNormalizer::new()?;
//!     let interm = normalizer.to_interm("select ?x where { ?x dbo:author dbr:Victor_Hugo . }", false, TagFlags::none());
//!     assert_eq!(interm, "select var_x where brack_open var_x dbo_author dbr_Victor_Hugo sep_dot brack_close");
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::missing_docs_in_private_items)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::new_without_default)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::if_not_else)]
#![allow(clippy::too_many_lines)]

/// Knowledge-base classes, tagging flags and the token encoding table
pub mod core;

/// Runtime configuration for normalization and dataset builds
pub mod config;

/// SPARQL tokenizer, query normalizer and question normalizer
pub mod parsing;

/// URI tagging of queries and questions, and the untagging pass
pub mod tagging;

/// Template library, matching, extraction and OOV synthesis
pub mod templates;

/// Entry records and dataset-level operations
pub mod dataset;

/// Corpus adapters producing datasets from raw files
pub mod sources;

/// Collaborators that run or validate pure SPARQL
pub mod querying;

pub mod error {
    //! Error types and result definitions

    use thiserror::Error;

    /// Result type alias for nlsparql operations
    pub type Result<T> = std::result::Result<T, Error>;

    /// Main error type for nlsparql
    #[derive(Debug, Error)]
    pub enum Error {
        /// Structural SPARQL irregularity the repair heuristics cannot fix
        #[error("Malformed query: {0}")]
        MalformedQuery(String),
        /// No template matched both the question and the intermediary query
        #[error("No matching template for entry {entry_id}")]
        NoMatchingTemplate { entry_id: String },
        /// Slot values and placeholders could not be zipped together
        #[error("Slot count mismatch for template {template_id}: expected {expected}, found {found}")]
        SlotCountMismatch { template_id: String, expected: usize, found: usize },
        /// Parallel corpus files differ in length
        #[error("Row count mismatch: {left} questions for {right} queries")]
        RowCountMismatch { left: usize, right: usize },
        /// Split ratios are negative or do not sum to 1
        #[error("Invalid split ratios ({train}, {valid}, {test})")]
        InvalidRatio { train: f64, valid: f64, test: f64 },
        /// A required record field is absent
        #[error("Missing field `{0}`")]
        MissingField(String),
        /// A record field has the wrong type or value
        #[error("Invalid field `{field}`: {reason}")]
        InvalidField { field: String, reason: String },
        /// Entry or template lookup failed
        #[error("Not found: {0}")]
        NotFound(String),
        /// The dataset has already been shuffled and split
        #[error("Dataset has already been split")]
        AlreadySplit,
        /// A template placeholder has no known knowledge-base class
        #[error("Unknown placeholder <{0}>")]
        UnknownPlaceholder(String),
        /// Regex compilation error
        #[error("Regex error: {0}")]
        Regex(#[from] regex::Error),
        /// IO error
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),
        /// JSON (de)serialization error
        #[error("JSON error: {0}")]
        Json(#[from] serde_json::Error),
        /// Remote endpoint error
        #[error("HTTP error: {0}")]
        Http(#[from] reqwest::Error),
        /// SPARQL syntax error reported by the validator
        #[error("SPARQL error: {0}")]
        Sparql(String),
    }
}

// Re-export commonly used types
pub use error::{Error, Result};
