//! Configuration structures and utilities
//!
//! Every corpus-specific table lives here as plain data with a `Default`
//! reproducing the DBpedia corpora, so components receive it at
//! construction instead of reading module-level globals.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tables driving the trailing-dot decision inside KB references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SepDotRules {
    /// Whole references whose trailing dot always belongs to the name
    pub exceptions_keep: Vec<String>,
    /// Final underscore segments whose trailing dot is always a separator
    pub ends_replace: Vec<String>,
    /// Final underscore segments that are abbreviations ending in a dot
    pub ends_keep: Vec<String>,
}

impl Default for SepDotRules {
    fn default() -> Self {
        Self {
            exceptions_keep: strings(&[
                "dbr_Mode._Set._Clear.",
                "dbr_Cand.theol.",
                "dbr_Observe._Hack._Make.",
            ]),
            ends_replace: strings(&["hop."]),
            ends_keep: strings(&["dept.", "bros.", "litt.", "corp.", "gent."]),
        }
    }
}

/// Question repair table, applied in order on the lowercased question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionRules {
    pub typo_fixes: Vec<(String, String)>,
    /// Literal spans removed from every question
    pub removals: Vec<String>,
}

impl Default for QuestionRules {
    fn default() -> Self {
        let fixes = [
            ("wasthe", "was the"),
            ("monthyl", "monthly"),
            ("grevais", "gervais"),
            ("joesph", "joseph"),
            ("palce", "place"),
            ("whihc", "which"),
            ("whci", "which"),
            (" od ", " of "),
            ("emplyer", "employer"),
            ("ispychess", "is pychess"),
            ("compnay", "company"),
            ("comapny", "company"),
            ("genere", "genre"),
            ("herny ford", "henry ford"),
            (" aldo ", " also "),
            (" form ", " from "),
            (" of from ", " of form "),
            (" awrds ", " awards "),
            (" awardwinners ", " award winners "),
            (" castillo ", " callisto"),
            ("rishkiesh", "rishikesh"),
            ("kriminalpolizie", "kriminalpolizei"),
            ("willian", "william"),
            ("ehtics", "ethics"),
            ("terrotory", "territory"),
            ("snaman", "sandman"),
            ("neverwher", "neverwhere"),
            ("hopoer", "hooper"),
            ("ho0lder", "holder"),
            ("marvo", "mavro"),
            ("micheal", "michael"),
            ("brandenton", "bradenton"),
            ("fraiser", "frasier"),
            (" firt ", " first "),
            (" asnorth ", " as north "),
            (" electoin ", " election "),
        ];
        Self {
            typo_fixes: fixes.iter().map(|(a, b)| ((*a).to_string(), (*b).to_string())).collect(),
            removals: strings(&["< ", "http://dbpedia.org/resource/werner_heisenberg"]),
        }
    }
}

/// Which slot label to drop when a template systematically miscounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotRemoval {
    First,
    Last,
    At(usize),
}

/// `(template id, observed slot count) -> slot to remove`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotCorrection {
    pub template_id: i64,
    pub observed: usize,
    pub removal: SlotRemoval,
}

/// Normalizer tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub sep_dots: SepDotRules,
    pub question: QuestionRules,
}

/// Template tables shared by the LC-QuAD pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Corpus template ids folded into their canonical template
    pub id_aliases: Vec<(i64, i64)>,
    pub slot_corrections: Vec<SlotCorrection>,
    /// Structural predicates never abstracted into placeholders
    pub keep_predicates: Vec<String>,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        let correction = |template_id, observed, removal| SlotCorrection { template_id, observed, removal };
        Self {
            id_aliases: vec![(605, 305), (906, 306), (601, 301)],
            slot_corrections: vec![
                correction(7, 3, SlotRemoval::First),
                correction(307, 3, SlotRemoval::First),
                correction(308, 4, SlotRemoval::At(3)),
                correction(402, 2, SlotRemoval::Last),
                correction(305, 3, SlotRemoval::At(3)),
                correction(5, 3, SlotRemoval::At(3)),
                correction(105, 3, SlotRemoval::At(3)),
            ],
            keep_predicates: strings(&[
                "dbo:abstract",
                "dbp:length",
                "dbo:location",
                "dbo:designer",
                "dbp:complete",
                "dbp:nativename",
                "dbp:height",
            ]),
        }
    }
}

/// Remote SPARQL endpoint settings for answer lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub url: String,
    pub default_graph: String,
    pub timeout_secs: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: "http://dbpedia.org/sparql".to_string(),
            default_graph: "http://dbpedia.org".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Top-level configuration of a dataset build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub train_ratio: f64,
    pub valid_ratio: f64,
    pub test_ratio: f64,
    /// Seed for shuffling and OOV sampling
    pub seed: u64,
    /// Rewrite unpredictable KB tokens in every entry, not just the offending one
    pub untag_all: bool,
    /// Number of synthesized out-of-vocabulary entries
    pub oov_size: usize,
    pub normalizer: NormalizerConfig,
    pub templates: TemplateConfig,
    pub endpoint: EndpointConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            train_ratio: 0.8,
            valid_ratio: 0.1,
            test_ratio: 0.1,
            seed: 42,
            untag_all: true,
            oov_size: 250,
            normalizer: NormalizerConfig::default(),
            templates: TemplateConfig::default(),
            endpoint: EndpointConfig::default(),
        }
    }
}

impl BuildConfig {
    /// Loads a JSON config file; absent keys fall back to the defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: BuildConfig =
            serde_json::from_str(r#"{"seed": 7, "endpoint": {"timeout_secs": 5}}"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.endpoint.timeout_secs, 5);
        assert_eq!(config.endpoint.url, "http://dbpedia.org/sparql");
        assert_eq!(config.train_ratio, 0.8);
        assert_eq!(config.templates.id_aliases.len(), 3);
        assert_eq!(config.normalizer.sep_dots.ends_replace, vec!["hop.".to_string()]);
    }

    #[test]
    fn test_slot_removal_serde() {
        let json = serde_json::to_string(&SlotRemoval::At(3)).unwrap();
        assert_eq!(json, r#"{"at":3}"#);
        let parsed: SlotRemoval = serde_json::from_str(r#""first""#).unwrap();
        assert_eq!(parsed, SlotRemoval::First);
    }
}
