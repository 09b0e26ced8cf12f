//! LC-QuAD: JSON corpus with a separate template table.
//!
//! Queries arrive with full IRIs and questions come with an intermediary
//! form where every KB mention is wrapped in angle brackets. The template's
//! slot tags join the two.

use crate::config::{BuildConfig, TemplateConfig};
use crate::core::{TagFlags, TokenTable, UriVariants, SPARQL_TYPE};
use crate::dataset::entry::{Entry, Split, TemplateId};
use crate::dataset::loaders::read_json_array;
use crate::dataset::Dataset;
use crate::parsing::query_normalizer::QueryNormalizer;
use crate::parsing::question_normalizer::QuestionNormalizer;
use crate::sources::{BatchReport, BuildOutput, CorpusAdapter};
use crate::tagging::question_tagger::{bracketed_spans, question_variants, LabelSlot, UriSlot};
use crate::tagging::untag::untag_dataset;
use crate::templates::matcher::{canonical_template_id, correct_slot_tags};
use crate::templates::oov::reduce_uri;
use crate::templates::template::{placeholders, CompiledTemplate, TemplateLibrary};
use crate::{Error, Result};
use log::info;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::path::Path;

const SOURCE: &str = "lcquad";

/// Template whose questions leave the object unbracketed.
const UNBRACKETED_OBJECT_TEMPLATE: i64 = 2;

/// One record of the raw LC-QuAD JSON files.
#[derive(Debug, Clone, Deserialize)]
pub struct LcquadRecord {
    #[serde(rename = "_id")]
    pub id: Value,
    #[serde(default)]
    pub corrected_question: Option<String>,
    pub intermediary_question: String,
    pub sparql_query: String,
    pub sparql_template_id: Value,
}

/// Pure form of a raw LC-QuAD query: `rdf:type` shortened, everything
/// outside IRIs lowercased, KB IRIs shortened to prefixed names.
pub fn lcquad_pure_sparql(raw: &str, iris: &Regex) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last = 0;
    for m in iris.find_iter(raw) {
        out.push_str(&raw[last..m.start()].to_lowercase());
        let inner = &m.as_str()[1..m.as_str().len() - 1];
        if inner == SPARQL_TYPE {
            out.push_str("rdf:type");
        } else {
            let reduced = reduce_uri(inner);
            if reduced == inner {
                out.push_str(m.as_str());
            } else {
                out.push_str(&reduced);
            }
        }
        last = m.end();
    }
    out.push_str(&raw[last..].to_lowercase());
    out.replace('{', " { ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn id_string(value: &Value, field: &str) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(Error::InvalidField { field: field.to_string(), reason: "should be a string or an integer".to_string() }),
    }
}

pub struct LcquadAdapter {
    train: Vec<LcquadRecord>,
    test: Vec<LcquadRecord>,
    templates: TemplateLibrary,
    iris: Regex,
    unbracketed_object: Regex,
}

impl LcquadAdapter {
    pub fn new(train: Vec<LcquadRecord>, test: Vec<LcquadRecord>, templates: TemplateLibrary) -> Result<Self> {
        Ok(Self {
            train,
            test,
            templates,
            iris: Regex::new(r"<[^<>\s]+>")?,
            unbracketed_object: Regex::new(r"(what|who) (is|are) the <(.*?)> of (.*?) \?")?,
        })
    }

    pub fn from_files<P: AsRef<Path>>(train: P, test: P, templates: P) -> Result<Self> {
        Self::new(read_json_array(train)?, read_json_array(test)?, TemplateLibrary::from_json_file(templates)?)
    }

    /// Train records stay in train; test records alternate test and valid.
    fn load(&self, config: &TemplateConfig) -> Result<Vec<Entry>> {
        let train = self.train.iter().map(|r| (r, "train", Split::Train));
        let test = self
            .test
            .iter()
            .enumerate()
            .map(|(i, r)| (r, "test", if i % 2 == 0 { Split::Test } else { Split::Valid }));

        train
            .chain(test)
            .map(|(record, original_set, split)| -> Result<Entry> {
                let mut entry = Entry::new(id_string(&record.id, "_id")?);
                entry.split = Some(split);
                entry.template_id = Some(match &record.sparql_template_id {
                    Value::Number(n) => {
                        let id = n.as_i64().ok_or_else(|| Error::InvalidField {
                            field: "sparql_template_id".to_string(),
                            reason: "should be an integer".to_string(),
                        })?;
                        TemplateId::Number(canonical_template_id(config, id))
                    }
                    other => TemplateId::Name(id_string(other, "sparql_template_id")?),
                });

                let mut original = Map::new();
                original.insert(
                    SOURCE.to_string(),
                    json!({
                        "corrected_question": record.corrected_question.clone().unwrap_or_default(),
                        "intermediary_question": record.intermediary_question,
                        "sparql_query": record.sparql_query,
                        "set": original_set,
                    }),
                );
                entry.original_data = Some(original);
                Ok(entry)
            })
            .collect()
    }

    fn complete_query(&self, normalizer: &QueryNormalizer, entry: &mut Entry) -> Result<()> {
        let raw = entry.original_field(SOURCE, "sparql_query")?.to_string();
        let variants = normalizer.uri_variants(&raw);
        entry.query.pure_sparql = Some(lcquad_pure_sparql(&raw, &self.iris));
        entry.query.interm_sparql = Some(normalizer.to_interm(&raw, false, TagFlags::none()));
        entry.query.uri_interm_sparql_all = Some(variants.all);
        entry.query.uri_interm_sparql_only_resources = Some(variants.only_resources);
        entry.query.uri_interm_sparql_rest_no_resources = Some(variants.rest_no_resources);
        Ok(())
    }

    /// Question labels paired with their slot tags.
    fn label_slots(
        &self,
        questions: &QuestionNormalizer,
        config: &TemplateConfig,
        entry: &Entry,
        template: &CompiledTemplate,
    ) -> Result<(String, Vec<LabelSlot>)> {
        let mut question = questions.correct(entry.original_field(SOURCE, "intermediary_question")?);
        let template_id = template.id();
        let unbracketed = template_id.as_number() == Some(UNBRACKETED_OBJECT_TEMPLATE);
        if unbracketed {
            question = self.unbracketed_object.replace_all(&question, "${1} ${2} the <${3}> of <${4}> ?").into_owned();
        }
        question = question.replace("'s", " 's ").replace(',', " , ");

        let spans: Vec<String> = bracketed_spans(&question).into_iter().map(str::to_string).collect();
        let tags = if unbracketed {
            vec!["%(e_in_to_e)s".to_string(), "%(e_in)s".to_string()]
        } else {
            correct_slot_tags(config, template_id, &template.template().resource_tag_slots, spans.len())
        };
        if tags.len() != spans.len() {
            return Err(Error::SlotCountMismatch {
                template_id: template_id.to_string(),
                expected: tags.len(),
                found: spans.len(),
            });
        }

        let labels = tags.into_iter().zip(spans).map(|(tag, span)| LabelSlot::new(tag, span)).collect();
        Ok((question, labels))
    }

    /// Query URIs paired with the template's placeholder tags.
    fn uri_slots(&self, entry: &Entry, template: &CompiledTemplate) -> Result<Vec<UriSlot>> {
        let raw = entry.original_field(SOURCE, "sparql_query")?;
        let uris: Vec<String> = self
            .iris
            .find_iter(raw)
            .map(|m| &m.as_str()[1..m.as_str().len() - 1])
            .filter(|inner| *inner != SPARQL_TYPE)
            .map(reduce_uri)
            .collect();

        let pattern = template.template().pure_sparql_template.replace("class", "<class>");
        let tags = placeholders(&pattern);
        if tags.len() != uris.len() {
            return Err(Error::SlotCountMismatch {
                template_id: template.id().to_string(),
                expected: tags.len(),
                found: uris.len(),
            });
        }

        Ok(tags
            .into_iter()
            .zip(uris)
            .filter(|(_, uri)| uri != "dbp:type")
            .map(|(tag, uri)| UriSlot::new(tag, uri))
            .collect())
    }

    fn tag_question(
        &self,
        questions: &QuestionNormalizer,
        config: &TemplateConfig,
        entry: &mut Entry,
    ) -> Result<()> {
        let template_id = entry
            .template_id
            .clone()
            .ok_or_else(|| Error::NoMatchingTemplate { entry_id: entry.id.clone() })?;
        let template = self.templates.get_by_id(&template_id)?;

        entry.question.interm_question =
            Some(questions.untagged_question(entry.original_field(SOURCE, "intermediary_question")?));

        let (question, labels) = self.label_slots(questions, config, entry, template)?;
        let uris = self.uri_slots(entry, template)?;
        let UriVariants { all, only_resources, rest_no_resources } = question_variants(&question, &labels, &uris);
        entry.question.uri_question_all = Some(all);
        entry.question.uri_question_only_resources = Some(only_resources);
        entry.question.uri_question_rest_no_resources = Some(rest_no_resources);
        Ok(())
    }
}

impl CorpusAdapter for LcquadAdapter {
    fn source_name(&self) -> &'static str {
        SOURCE
    }

    fn build(&self, config: &BuildConfig) -> Result<BuildOutput> {
        let normalizer = QueryNormalizer::with_config(TokenTable::dbpedia(), &config.normalizer)?;
        let questions = QuestionNormalizer::with_rules(config.normalizer.question.clone())?;
        let mut entries = self.load(&config.templates)?;
        let mut report = BatchReport::default();

        for entry in &mut entries {
            if let Ok(raw) = entry.original_field(SOURCE, "corrected_question") {
                entry.question.question = Some(questions.correct(raw));
            }

            let outcome = self
                .complete_query(&normalizer, entry)
                .and_then(|()| self.tag_question(&questions, &config.templates, entry));
            match outcome {
                Ok(()) => report.record_success(),
                Err(e) => report.record_failure(&entry.id, e),
            }
        }

        untag_dataset(&mut entries, config.untag_all);
        info!("Built LC-QuAD dataset: {} entries, {}", entries.len(), report);
        Ok(BuildOutput { dataset: Dataset::from_entries(entries), report })
    }
}
