//! Raw corpus readers.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Pairs two line-aligned texts by line number.
pub fn pair_lines(questions: &str, queries: &str) -> Result<Vec<(String, String)>> {
    let questions: Vec<&str> = questions.lines().collect();
    let queries: Vec<&str> = queries.lines().collect();

    if questions.len() != queries.len() {
        return Err(Error::RowCountMismatch { left: questions.len(), right: queries.len() });
    }

    Ok(questions
        .into_iter()
        .zip(queries)
        .map(|(q, s)| (q.to_string(), s.to_string()))
        .collect())
}

/// Reads a question file and a query file with one example per line.
pub fn read_parallel_files<P: AsRef<Path>, Q: AsRef<Path>>(nl_path: P, sparql_path: Q) -> Result<Vec<(String, String)>> {
    let questions = fs::read_to_string(nl_path)?;
    let queries = fs::read_to_string(sparql_path)?;
    pair_lines(&questions, &queries)
}

/// Reads a JSON array of records.
pub fn read_json_array<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<Vec<T>> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_lines() {
        let pairs = pair_lines("a ?\nb ?\n", "select 1\nselect 2").unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1], ("b ?".to_string(), "select 2".to_string()));
    }

    #[test]
    fn test_row_count_mismatch() {
        let err = pair_lines("a\nb\nc", "x\ny").unwrap_err();
        assert!(matches!(err, Error::RowCountMismatch { left: 3, right: 2 }));
    }
}
