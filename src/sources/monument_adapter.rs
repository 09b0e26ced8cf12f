//! Monument: parallel question/intermediary-query files and a hand-written
//! template library from which the tagged variants are regenerated.

use crate::config::BuildConfig;
use crate::core::{TokenTable, UriVariants};
use crate::dataset::entry::Entry;
use crate::dataset::loaders::read_parallel_files;
use crate::dataset::{Dataset, SplitRatios};
use crate::parsing::query_normalizer::QueryNormalizer;
use crate::parsing::question_normalizer::QuestionNormalizer;
use crate::sources::{BatchReport, BuildOutput, CorpusAdapter};
use crate::templates::matcher::{assign_templates, extract_slots};
use crate::templates::template::{fill_named, placeholders, CompiledTemplate, TemplateLibrary};
use crate::{Error, Result};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;

/// Regenerates the three query variants of an entry from its template: the
/// slot values captured from the pure query are written into the template's
/// intermediary forms.
pub fn uri_interm_variants(template: &CompiledTemplate, entry: &Entry) -> Result<UriVariants> {
    let pure = entry.query.pure_sparql.as_deref().unwrap_or_default();
    let slots = extract_slots(template, &entry.id, pure)?;
    let interm_template = &template.template().interm_sparql_template;
    let uri_template = &template.template().uri_interm_sparql_template;
    let names = placeholders(interm_template);

    if names.len() != slots.len() {
        return Err(Error::SlotCountMismatch {
            template_id: template.id().to_string(),
            expected: names.len(),
            found: slots.len(),
        });
    }

    let literal: Vec<(&str, &str)> = names.iter().copied().zip(slots.iter().map(String::as_str)).collect();
    let opaque: Vec<(String, String)> = names
        .iter()
        .zip(&slots)
        .map(|(name, slot)| ((*name).to_string(), slot.trim().replace(':', "_")))
        .collect();

    Ok(UriVariants {
        all: fill_named(uri_template, &literal),
        only_resources: fill_named(interm_template, &literal),
        rest_no_resources: fill_named(uri_template, &opaque),
    })
}

/// Regenerates the three question variants of an entry: placeholders are
/// filled with query URIs or with the labels captured from the question.
pub fn uri_question_variants(template: &CompiledTemplate, entry: &Entry) -> Result<UriVariants> {
    let no_match = || Error::NoMatchingTemplate { entry_id: entry.id.clone() };
    let t = template.template();

    let pure = entry.query.pure_sparql.as_deref().ok_or_else(no_match)?;
    let question = entry.question.question.as_deref().ok_or_else(no_match)?;
    let slots = template.extract_slots(pure).ok_or_else(no_match)?;
    let labels = template.extract_labels(question).ok_or_else(no_match)?;

    let uris: HashMap<&str, &str> =
        placeholders(&t.interm_sparql_template).into_iter().zip(slots.iter().map(String::as_str)).collect();
    let question_names = placeholders(&t.question_template);
    let labels: HashMap<&str, &str> =
        question_names.iter().copied().zip(labels.iter().map(String::as_str)).collect();

    if question_names.len() != uris.len() {
        return Err(Error::SlotCountMismatch {
            template_id: template.id().to_string(),
            expected: question_names.len(),
            found: uris.len(),
        });
    }

    let mut with_uris = Vec::with_capacity(question_names.len());
    let mut with_labels = Vec::with_capacity(question_names.len());
    for name in &question_names {
        let uri = uris
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("slot <{}> in template {}", name, template.id())))?;
        let label = labels.get(name).copied().unwrap_or_default();
        with_uris.push((*name, *uri));
        with_labels.push((*name, label));
    }

    Ok(UriVariants {
        all: fill_named(&t.uri_question_template, &with_uris),
        only_resources: fill_named(&t.question_template, &with_uris),
        rest_no_resources: fill_named(&t.uri_question_template, &with_labels),
    })
}

pub struct MonumentAdapter {
    pairs: Vec<(String, String)>,
    templates: Option<TemplateLibrary>,
}

impl MonumentAdapter {
    pub fn new(pairs: Vec<(String, String)>, templates: Option<TemplateLibrary>) -> Self {
        Self { pairs, templates }
    }

    pub fn from_files<P: AsRef<Path>>(nl_path: P, sparql_path: P, templates_path: Option<P>) -> Result<Self> {
        let templates = templates_path.map(TemplateLibrary::from_json_file).transpose()?;
        Ok(Self::new(read_parallel_files(nl_path, sparql_path)?, templates))
    }

    fn load(&self) -> Vec<Entry> {
        self.pairs
            .iter()
            .enumerate()
            .map(|(i, (question, interm))| {
                let mut original = Map::new();
                original.insert("question".to_string(), Value::String(question.clone()));
                original.insert("interm_sparql".to_string(), Value::String(interm.clone()));
                Entry { original_data: Some(original), ..Entry::new(i.to_string()) }
            })
            .collect()
    }

    fn complete(library: &TemplateLibrary, entry: &mut Entry) -> Result<()> {
        let template_id = entry
            .template_id
            .clone()
            .ok_or_else(|| Error::NoMatchingTemplate { entry_id: entry.id.clone() })?;
        let template = library.get_by_id(&template_id)?;

        let queries = uri_interm_variants(template, entry)?;
        let questions = uri_question_variants(template, entry)?;

        entry.query.uri_interm_sparql_all = Some(queries.all);
        entry.query.uri_interm_sparql_only_resources = Some(queries.only_resources);
        entry.query.uri_interm_sparql_rest_no_resources = Some(queries.rest_no_resources);
        entry.question.uri_question_all = Some(questions.all);
        entry.question.uri_question_only_resources = Some(questions.only_resources);
        entry.question.uri_question_rest_no_resources = Some(questions.rest_no_resources);
        Ok(())
    }
}

/// Corrects question and intermediary query of every entry and derives the
/// pure form.
pub(crate) fn correct_entries(
    normalizer: &QueryNormalizer,
    questions: &QuestionNormalizer,
    entries: &mut [Entry],
) -> BatchReport {
    let mut report = BatchReport::default();
    for entry in entries.iter_mut() {
        let (Ok(question), Ok(interm)) = (original_value(entry, "question"), original_value(entry, "interm_sparql"))
        else {
            report.record_failure(&entry.id, Error::MissingField("original_data.question".to_string()));
            continue;
        };
        let question = questions.correct(question);
        let interm = normalizer.correct_query(interm);

        match normalizer.to_pure_sparql(&interm) {
            Ok(pure) => {
                entry.query.pure_sparql = Some(pure);
                report.record_success();
            }
            Err(e) => report.record_failure(&entry.id, e),
        }
        entry.question.question = Some(question);
        entry.query.interm_sparql = Some(interm);
    }
    report
}

fn original_value<'a>(entry: &'a Entry, key: &str) -> Result<&'a str> {
    entry
        .original_data
        .as_ref()
        .and_then(|d| d.get(key))
        .and_then(Value::as_str)
        .ok_or_else(|| Error::MissingField(format!("original_data.{}", key)))
}

impl CorpusAdapter for MonumentAdapter {
    fn source_name(&self) -> &'static str {
        "monument"
    }

    fn build(&self, config: &BuildConfig) -> Result<BuildOutput> {
        let normalizer = QueryNormalizer::with_config(TokenTable::dbpedia(), &config.normalizer)?;
        let questions = QuestionNormalizer::with_rules(config.normalizer.question.clone())?;

        let mut dataset = Dataset::with_ratios(SplitRatios::new(config.train_ratio, config.valid_ratio, config.test_ratio)?)?;
        for entry in self.load() {
            dataset.push(entry);
        }

        let mut report = correct_entries(&normalizer, &questions, dataset.entries_mut());
        dataset.split(&mut StdRng::seed_from_u64(config.seed))?;

        if let Some(library) = &self.templates {
            let assigned = assign_templates(library, dataset.entries_mut());
            report.failures.extend(assigned.failures);
            for entry in dataset.entries_mut() {
                if entry.template_id.is_none() {
                    continue;
                }
                if let Err(e) = Self::complete(library, entry) {
                    report.record_failure(&entry.id, e);
                }
            }
        }

        info!("Built Monument dataset: {} entries, {}", dataset.len(), report);
        Ok(BuildOutput { dataset, report })
    }
}
