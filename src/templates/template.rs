//! Template records and the compiled template library.

use crate::dataset::entry::TemplateId;
use crate::{Error, Result};
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One parametrized (question, query) pattern.
///
/// Monument-style libraries store every field; LC-QuAD template files only
/// carry `id`, `template` (the pure query) and `resource_tags`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    #[serde(rename = "_id", alias = "id")]
    pub id: TemplateId,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub question_template: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub interm_sparql_template: String,
    #[serde(default, alias = "template", skip_serializing_if = "String::is_empty")]
    pub pure_sparql_template: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uri_interm_sparql_template: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uri_question_template: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub question_regex: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub interm_sparql_regex: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pure_sparql_regex: String,
    /// Slot tag of each `<...>` span of the question, in order
    #[serde(default, alias = "resource_tags", skip_serializing_if = "Vec::is_empty")]
    pub resource_tag_slots: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_example: Option<String>,
}

/// Which stored string of a template to read or fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateField {
    Question,
    UriQuestion,
    IntermSparql,
    UriIntermSparql,
    PureSparql,
}

impl Template {
    pub fn field(&self, field: TemplateField) -> &str {
        match field {
            TemplateField::Question => &self.question_template,
            TemplateField::UriQuestion => &self.uri_question_template,
            TemplateField::IntermSparql => &self.interm_sparql_template,
            TemplateField::UriIntermSparql => &self.uri_interm_sparql_template,
            TemplateField::PureSparql => &self.pure_sparql_template,
        }
    }

    /// Fills in the three regex fields from their templates where missing.
    pub fn with_generated_regexes(mut self) -> Self {
        if self.question_regex.is_empty() && !self.question_template.is_empty() {
            self.question_regex = generate_regex(&self.question_template);
        }
        if self.interm_sparql_regex.is_empty() && !self.interm_sparql_template.is_empty() {
            self.interm_sparql_regex = generate_regex(&self.interm_sparql_template);
        }
        if self.pure_sparql_regex.is_empty() && !self.pure_sparql_template.is_empty() {
            self.pure_sparql_regex = generate_regex(&self.pure_sparql_template);
        }
        self
    }
}

/// Placeholder names of a template string, in order of appearance:
/// `"<a> x <b>"` gives `["a", "b"]`.
pub fn placeholders(template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('<') {
        let Some(len) = rest[open + 1..].find('>') else {
            break;
        };
        names.push(&rest[open + 1..open + 1 + len]);
        rest = &rest[open + len + 2..];
    }
    names
}

/// Builds the matching regex of a template string: literal text is escaped,
/// each `<placeholder>` becomes a lazy capture group and the pattern is
/// anchored at the end.
pub fn generate_regex(template: &str) -> String {
    let mut regex = String::with_capacity(template.len() * 2);
    let mut rest = template;
    while let Some(open) = rest.find('<') {
        let Some(len) = rest[open + 1..].find('>') else {
            break;
        };
        regex.push_str(&regex::escape(&rest[..open]));
        regex.push_str("(.*?)");
        rest = &rest[open + len + 2..];
    }
    regex.push_str(&regex::escape(rest));
    regex.push('$');
    regex
}

/// Replaces each `<name>` with its value, then collapses whitespace.
pub fn fill_named<S: AsRef<str>>(template: &str, values: &[(S, S)]) -> String {
    let mut filled = template.to_string();
    for (name, value) in values {
        filled = filled.replace(&format!("<{}>", name.as_ref()), value.as_ref().trim());
    }
    filled.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn compile(pattern: &str, case_insensitive: bool) -> Result<Option<Regex>> {
    if pattern.is_empty() {
        return Ok(None);
    }
    let flags = if case_insensitive { "(?i)" } else { "" };
    Ok(Some(Regex::new(&format!("{}^(?:{})", flags, pattern))?))
}

/// A template with its regexes compiled once.
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    template: Template,
    question: Option<Regex>,
    question_ci: Option<Regex>,
    interm: Option<Regex>,
    pure: Option<Regex>,
}

impl CompiledTemplate {
    pub fn new(template: Template) -> Result<Self> {
        let template = template.with_generated_regexes();
        Ok(Self {
            question: compile(&template.question_regex, false)?,
            question_ci: compile(&template.question_regex, true)?,
            interm: compile(&template.interm_sparql_regex, false)?,
            pure: compile(&template.pure_sparql_regex, true)?,
            template,
        })
    }

    pub fn id(&self) -> &TemplateId {
        &self.template.id
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn matches_question(&self, question: &str) -> bool {
        self.question.as_ref().is_some_and(|r| r.is_match(question))
    }

    pub fn matches_interm(&self, interm: &str) -> bool {
        self.interm.as_ref().is_some_and(|r| r.is_match(interm))
    }

    /// Captured slot values of a pure query, in placeholder order.
    pub fn extract_slots(&self, pure: &str) -> Option<Vec<String>> {
        captures(self.pure.as_ref()?, pure)
    }

    /// Captured labels of a question, in placeholder order.
    pub fn extract_labels(&self, question: &str) -> Option<Vec<String>> {
        captures(self.question_ci.as_ref()?, question)
    }

    /// Zips `values` with the placeholders of `field` and substitutes them.
    pub fn instantiate<S: AsRef<str>>(&self, field: TemplateField, values: &[S]) -> Result<String> {
        let text = self.template.field(field);
        let names = placeholders(text);
        if names.len() != values.len() {
            return Err(Error::SlotCountMismatch {
                template_id: self.template.id.to_string(),
                expected: names.len(),
                found: values.len(),
            });
        }
        let pairs: Vec<(&str, &str)> = names.into_iter().zip(values.iter().map(AsRef::as_ref)).collect();
        Ok(fill_named(text, &pairs))
    }
}

fn captures(regex: &Regex, text: &str) -> Option<Vec<String>> {
    let caps = regex.captures(text)?;
    Some(
        caps.iter()
            .skip(1)
            .map(|m| m.map_or_else(String::new, |m| m.as_str().to_string()))
            .collect(),
    )
}

/// Read-only, ordered template table.
///
/// Matching is first-wins, so templates should go from least to most
/// capturing.
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    templates: Vec<CompiledTemplate>,
}

impl TemplateLibrary {
    pub fn new(templates: Vec<Template>) -> Result<Self> {
        let templates = templates
            .into_iter()
            .map(CompiledTemplate::new)
            .collect::<Result<Vec<_>>>()?;
        debug!("Compiled {} templates", templates.len());
        Ok(Self { templates })
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::new(serde_json::from_str(&raw)?)
    }

    pub fn get_by_id(&self, id: &TemplateId) -> Result<&CompiledTemplate> {
        self.templates
            .iter()
            .find(|t| t.id() == id)
            .ok_or_else(|| Error::NotFound(format!("template {}", id)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn templates(&self) -> Vec<&Template> {
        self.templates.iter().map(CompiledTemplate::template).collect()
    }
}
