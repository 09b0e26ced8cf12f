//! DBNQA: large parallel question/intermediary-query files without
//! templates. The tagged query variants are obtained by aligning the KB
//! references of the pure form with those of the intermediary form.

use crate::config::BuildConfig;
use crate::core::{TagFlags, TokenTable, UriVariants};
use crate::dataset::entry::Entry;
use crate::dataset::loaders::read_parallel_files;
use crate::dataset::{Dataset, SplitRatios};
use crate::parsing::query_normalizer::QueryNormalizer;
use crate::parsing::question_normalizer::QuestionNormalizer;
use crate::parsing::sparql_lexer::{tokenize, TokenKind};
use crate::sources::monument_adapter::correct_entries;
use crate::sources::{BuildOutput, CorpusAdapter};
use crate::{Error, Result};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{Map, Value};
use std::path::Path;

const KB_PREFIXES: [&str; 4] = ["dbr_", "dbo_", "dbp_", "dbc_"];

/// Replaces the next occurrence of `needle` at or after `from` that ends on
/// a word boundary. Returns the position after the replacement.
fn replace_from(haystack: &mut String, from: usize, needle: &str, with: &str) -> Option<usize> {
    let mut start = from;
    while let Some(offset) = haystack[start..].find(needle) {
        let at = start + offset;
        let end = at + needle.len();
        let boundary_before = at == 0 || haystack[..at].ends_with(' ');
        let boundary_after = haystack[end..].chars().next().map_or(true, char::is_whitespace);
        if boundary_before && boundary_after {
            haystack.replace_range(at..end, with);
            return Some(at + with.len());
        }
        start = at + 1;
        while !haystack.is_char_boundary(start) {
            start += 1;
        }
    }
    None
}

/// The all-tagged variant of an intermediary query: each opaque KB reference
/// is swapped, in order, for the literal reference of the pure form.
pub fn align_uri_interm(normalizer: &QueryNormalizer, interm: &str, pure: &str) -> Result<String> {
    let references: Vec<_> = tokenize(pure)
        .into_iter()
        .filter_map(|t| match t.kind {
            TokenKind::KbReference(class) => Some((class, t.text)),
            _ => None,
        })
        .collect();

    let interm_count = interm
        .split_whitespace()
        .filter(|w| KB_PREFIXES.iter().any(|p| w.starts_with(p)))
        .count();
    if references.len() != interm_count {
        return Err(Error::SlotCountMismatch {
            template_id: "dbnqa".to_string(),
            expected: interm_count,
            found: references.len(),
        });
    }

    let tagger = normalizer.tagger();
    let mut aligned = interm.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut cursor = 0;
    for (class, local) in &references {
        let opaque = tagger.render_reference(*class, local, TagFlags::none(), false);
        let literal = tagger.render_reference(*class, local, TagFlags::all(), true);
        cursor = replace_from(&mut aligned, cursor, &opaque, &literal)
            .ok_or_else(|| Error::MalformedQuery(format!("reference '{}' not found in '{}'", opaque, interm)))?;
    }
    Ok(aligned)
}

/// Derives the two partial variants from the all-tagged one.
pub fn variants_from_all(all: String) -> UriVariants {
    UriVariants {
        only_resources: all.replace("dbc:", "dbc_").replace("dbo:", "dbo_").replace("dbp:", "dbp_"),
        rest_no_resources: all.replace("dbr:", "dbr_"),
        all,
    }
}

pub struct DbnqaAdapter {
    pairs: Vec<(String, String)>,
    subset: Option<usize>,
}

impl DbnqaAdapter {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs, subset: None }
    }

    pub fn from_files<P: AsRef<Path>>(nl_path: P, sparql_path: P) -> Result<Self> {
        Ok(Self::new(read_parallel_files(nl_path, sparql_path)?))
    }

    /// Only keep the first `n` pairs.
    pub fn with_subset(mut self, n: Option<usize>) -> Self {
        self.subset = n;
        self
    }
}

impl CorpusAdapter for DbnqaAdapter {
    fn source_name(&self) -> &'static str {
        "dbnqa"
    }

    fn build(&self, config: &BuildConfig) -> Result<BuildOutput> {
        let normalizer = QueryNormalizer::with_config(TokenTable::dbpedia(), &config.normalizer)?;
        let questions = QuestionNormalizer::with_rules(config.normalizer.question.clone())?;
        let mut dataset = Dataset::with_ratios(SplitRatios::new(config.train_ratio, config.valid_ratio, config.test_ratio)?)?;

        let limit = self.subset.unwrap_or(self.pairs.len());
        for (i, (question, interm)) in self.pairs.iter().take(limit).enumerate() {
            let mut original = Map::new();
            original.insert("question".to_string(), Value::String(question.clone()));
            original.insert("interm_sparql".to_string(), Value::String(interm.clone()));
            dataset.push(Entry { original_data: Some(original), ..Entry::new(i.to_string()) });
        }

        let mut report = correct_entries(&normalizer, &questions, dataset.entries_mut());
        for entry in dataset.entries_mut() {
            let (Some(interm), Some(pure)) = (entry.query.interm_sparql.as_deref(), entry.query.pure_sparql.as_deref())
            else {
                continue;
            };
            match align_uri_interm(&normalizer, interm, pure) {
                Ok(all) => {
                    let variants = variants_from_all(all);
                    entry.query.uri_interm_sparql_all = Some(variants.all);
                    entry.query.uri_interm_sparql_only_resources = Some(variants.only_resources);
                    entry.query.uri_interm_sparql_rest_no_resources = Some(variants.rest_no_resources);
                }
                Err(e) => report.record_failure(&entry.id, e),
            }
        }

        dataset.split(&mut StdRng::seed_from_u64(config.seed))?;
        info!("Built DBNQA dataset: {} entries, {}", dataset.len(), report);
        Ok(BuildOutput { dataset, report })
    }
}
