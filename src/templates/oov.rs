//! Out-of-vocabulary test set synthesis.
//!
//! Templates are filled with KB elements that never occur in a reference
//! dataset, so a model evaluated on the result has to generalize instead of
//! recalling entities it was trained on.

use crate::core::{KbClass, PlaceholderTable};
use crate::dataset::dataset::Dataset;
use crate::dataset::entry::{Entry, QueryRecord, QuestionRecord, Split};
use crate::tagging::untag::kb_tokens;
use crate::templates::template::{placeholders, Template, TemplateLibrary};
use crate::{Error, Result};
use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde_json::Value;
use std::collections::BTreeSet;

/// A KB element with a human-readable label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KbElement {
    /// Shortened reference, e.g. `dbr:Eiffel_Tower`
    pub value: String,
    pub label: String,
}

/// Shortens a DBpedia IRI to its prefixed form; other strings are returned
/// unchanged.
pub fn reduce_uri(uri: &str) -> String {
    match KbClass::classify(uri) {
        Some((class, local)) if uri.contains("://") => format!("{}:{}", class.prefix(), local),
        _ => uri.to_string(),
    }
}

/// Words of a camel-cased name: `birthPlace` gives `birth Place`, and runs
/// of capitals stay together (`NCAATeam` gives `NCAA Team`).
fn split_camel_case(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_lowercase() || (c.is_ascii_uppercase() && chars.get(i + 1).is_some_and(char::is_ascii_lowercase)) {
            let start = i;
            i += 1;
            while i < chars.len() && chars[i].is_ascii_lowercase() {
                i += 1;
            }
            words.push(chars[start..i].iter().collect());
        } else if c.is_ascii_uppercase() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_uppercase() {
                i += 1;
            }
            match chars.get(i) {
                None => words.push(chars[start..i].iter().collect()),
                Some(next) => {
                    if i - start >= 2 {
                        words.push(chars[start..i - 1].iter().collect());
                    }
                    // the last capital starts a word only if lowercase follows
                    if next.is_ascii_lowercase() {
                        i -= 1;
                    }
                }
            }
        } else {
            i += 1;
        }
    }
    words
}

/// Human label for a shortened KB reference. Resources read their name with
/// spaces and without a parenthesised suffix; other classes are split on
/// camel case.
pub fn kb_label(value: &str) -> String {
    let (prefix, name) = value.split_once(':').unwrap_or(("", value));
    if KbClass::from_prefix(prefix) == Some(KbClass::Resource) {
        let spaced = name.replace('_', " ");
        return spaced.split('(').next().unwrap_or("").trim().to_string();
    }
    split_camel_case(name).join(" ")
}

/// Candidate elements per placeholder class.
#[derive(Debug, Clone, Default)]
pub struct KbPools {
    pub ontologies: Vec<KbElement>,
    pub resources: Vec<KbElement>,
}

fn bindings(results: &Value) -> Result<&Vec<Value>> {
    results
        .pointer("/results/bindings")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::MissingField("results.bindings".to_string()))
}

fn binding_value<'a>(binding: &'a Value, key: &str) -> Result<&'a str> {
    binding
        .get(key)
        .and_then(|b| b.get("value"))
        .and_then(Value::as_str)
        .ok_or_else(|| Error::MissingField(format!("{}.value", key)))
}

impl KbPools {
    /// Builds the pools from SPARQL JSON results: ontology classes bound to
    /// `domain`, resources bound to `x` with a `label`. Elements in `used`
    /// are left out.
    pub fn from_sparql_results(ontologies: &Value, resources: &Value, used: &BTreeSet<String>) -> Result<Self> {
        let mut pools = Self::default();

        for binding in bindings(ontologies)? {
            let value = reduce_uri(binding_value(binding, "domain")?);
            if !used.contains(&value) {
                pools.ontologies.push(KbElement { label: kb_label(&value), value });
            }
        }

        for binding in bindings(resources)? {
            let value = reduce_uri(binding_value(binding, "x")?);
            if !used.contains(&value) {
                let label = binding_value(binding, "label")?.to_string();
                pools.resources.push(KbElement { value, label });
            }
        }

        info!(
            "OOV pools: {} ontology classes, {} resources",
            pools.ontologies.len(),
            pools.resources.len()
        );
        Ok(pools)
    }

    fn pool(&self, placeholder: &str) -> Result<&[KbElement]> {
        match PlaceholderTable.class_of(placeholder) {
            Some(KbClass::Ontology) => Ok(&self.ontologies),
            Some(KbClass::Resource) => Ok(&self.resources),
            _ => Err(Error::UnknownPlaceholder(placeholder.to_string())),
        }
    }
}

/// KB tokens of every `uri_question_all` in the given entries.
pub fn used_kb_elements<'a, I: IntoIterator<Item = &'a Entry>>(entries: I) -> BTreeSet<String> {
    entries
        .into_iter()
        .filter_map(|e| e.question.uri_question_all.as_deref())
        .flat_map(|q| kb_tokens(q).into_iter().map(str::to_string).collect::<Vec<_>>())
        .collect()
}

pub struct OovGenerator {
    pools: KbPools,
    rng: StdRng,
}

impl OovGenerator {
    pub fn new(pools: KbPools, seed: u64) -> Self {
        Self { pools, rng: StdRng::seed_from_u64(seed) }
    }

    /// Generates `size` test entries, cycling through the templates so each
    /// is instantiated about equally often.
    pub fn generate(&mut self, library: &TemplateLibrary, size: usize) -> Result<Dataset> {
        if library.is_empty() {
            return Ok(Dataset::new());
        }

        let rounds = size.div_ceil(library.len());
        let mut entries = Vec::with_capacity(rounds * library.len());
        for _ in 0..rounds {
            for compiled in library.iter() {
                let entry = self.instantiate(compiled.template(), entries.len())?;
                entries.push(entry);
            }
        }

        entries.shuffle(&mut self.rng);
        entries.truncate(size);
        info!("Generated {} OOV entries from {} templates", entries.len(), library.len());
        Ok(Dataset::from_entries(entries))
    }

    fn instantiate(&mut self, template: &Template, index: usize) -> Result<Entry> {
        let mut question = QuestionRecord {
            question: Some(template.question_template.clone()),
            interm_question: None,
            uri_question_only_resources: Some(template.question_template.clone()),
            uri_question_rest_no_resources: Some(template.uri_question_template.clone()),
            uri_question_all: Some(template.uri_question_template.clone()),
        };
        let mut query = QueryRecord {
            interm_sparql: Some(template.interm_sparql_template.clone()),
            uri_interm_sparql_only_resources: Some(template.interm_sparql_template.clone()),
            uri_interm_sparql_rest_no_resources: Some(template.uri_interm_sparql_template.clone()),
            uri_interm_sparql_all: Some(template.uri_interm_sparql_template.clone()),
            pure_sparql: Some(template.pure_sparql_template.clone()),
        };

        for name in placeholders(&template.question_template) {
            let element = self
                .pools
                .pool(name)?
                .choose(&mut self.rng)
                .ok_or_else(|| Error::NotFound(format!("KB element for <{}>", name)))?
                .clone();
            let slot = format!("<{}>", name);
            let opaque = element.value.replace(':', "_");
            let replace = |field: &mut Option<String>, with: &str| {
                if let Some(text) = field.as_mut() {
                    *text = text.replace(&slot, with);
                }
            };

            replace(&mut question.question, &element.label);
            replace(&mut question.uri_question_only_resources, &element.value);
            replace(&mut question.uri_question_rest_no_resources, &element.label);
            replace(&mut question.uri_question_all, &element.value);

            replace(&mut query.interm_sparql, &opaque);
            replace(&mut query.uri_interm_sparql_only_resources, &element.value);
            replace(&mut query.uri_interm_sparql_rest_no_resources, &opaque);
            replace(&mut query.uri_interm_sparql_all, &element.value);
            replace(&mut query.pure_sparql, &element.value);
        }

        let strip = |field: &mut Option<String>| {
            if let Some(text) = field.as_mut() {
                *text = text.replace(['<', '>'], "");
            }
        };
        for field in [
            &mut question.question,
            &mut question.uri_question_only_resources,
            &mut question.uri_question_rest_no_resources,
            &mut question.uri_question_all,
            &mut query.interm_sparql,
            &mut query.uri_interm_sparql_only_resources,
            &mut query.uri_interm_sparql_rest_no_resources,
            &mut query.uri_interm_sparql_all,
            &mut query.pure_sparql,
        ] {
            strip(field);
        }
        question.question = question.question.map(|q| q.to_lowercase());

        Ok(Entry {
            id: format!("_{}", index),
            template_id: Some(template.id.clone()),
            question,
            query,
            split: Some(Split::Test),
            original_data: None,
            answer: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::entry::TemplateId;
    use serde_json::json;

    #[test]
    fn test_kb_label() {
        assert_eq!(kb_label("dbr:Paris_(Texas)"), "Paris");
        assert_eq!(kb_label("dbr:Eiffel_Tower"), "Eiffel Tower");
        assert_eq!(kb_label("dbo:birthPlace"), "birth Place");
        assert_eq!(kb_label("dbo:NCAATeamSeason"), "NCAA Team Season");
        assert_eq!(kb_label("dbo:ISBN"), "ISBN");
    }

    #[test]
    fn test_reduce_uri() {
        assert_eq!(reduce_uri("http://dbpedia.org/ontology/Monument"), "dbo:Monument");
        assert_eq!(reduce_uri("http://dbpedia.org/resource/Category:Towers"), "dbc:Towers");
        assert_eq!(reduce_uri("dbr:Paris"), "dbr:Paris");
    }

    fn pools() -> KbPools {
        let ontologies = json!({"results": {"bindings": [
            {"domain": {"value": "http://dbpedia.org/ontology/Monument"}},
            {"domain": {"value": "http://dbpedia.org/ontology/Castle"}}
        ]}});
        let resources = json!({"results": {"bindings": [
            {"x": {"value": "http://dbpedia.org/resource/Eiffel_Tower"}, "label": {"value": "Eiffel Tower"}},
            {"x": {"value": "http://dbpedia.org/resource/Big_Ben"}, "label": {"value": "Big Ben"}}
        ]}});
        let used: BTreeSet<String> = ["dbo:Castle".to_string()].into_iter().collect();
        KbPools::from_sparql_results(&ontologies, &resources, &used).unwrap()
    }

    #[test]
    fn test_pools_exclude_used_elements() {
        let pools = pools();
        assert_eq!(pools.ontologies, vec![KbElement { value: "dbo:Monument".to_string(), label: "Monument".to_string() }]);
        assert_eq!(pools.resources.len(), 2);
    }

    #[test]
    fn test_generate() {
        let template = Template {
            id: TemplateId::from("1"),
            question_template: "is <resource> a <ontology> ?".to_string(),
            uri_question_template: "is <resource> a <ontology> ?".to_string(),
            interm_sparql_template: "ask brack_open <resource> rdf_type <ontology> brack_close".to_string(),
            uri_interm_sparql_template: "ask brack_open <resource> rdf_type <ontology> brack_close".to_string(),
            pure_sparql_template: "ask { <resource> rdf:type <ontology> }".to_string(),
            ..Template::default()
        };
        let library = TemplateLibrary::new(vec![template]).unwrap();
        let dataset = OovGenerator::new(pools(), 7).generate(&library, 3).unwrap();

        assert_eq!(dataset.len(), 3);
        for entry in dataset.entries() {
            assert_eq!(entry.split, Some(Split::Test));
            assert!(entry.id.starts_with('_'));
            assert!(entry.query.pure_sparql.as_deref().unwrap().contains("dbo:Monument"));
            assert!(entry.query.interm_sparql.as_deref().unwrap().contains("dbo_Monument"));
            assert!(entry.question.question.as_deref().unwrap().ends_with("a monument ?"));
        }
    }

    #[test]
    fn test_unknown_placeholder() {
        let template = Template {
            id: TemplateId::from("1"),
            question_template: "what is <thing> ?".to_string(),
            ..Template::default()
        };
        let library = TemplateLibrary::new(vec![template]).unwrap();
        let err = OovGenerator::new(pools(), 7).generate(&library, 1).unwrap_err();
        assert!(matches!(err, Error::UnknownPlaceholder(ref p) if p == "thing"));
    }
}
