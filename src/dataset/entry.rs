//! One training example and its flat JSON record form.

use crate::{Error, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Dataset partition of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Valid,
    Test,
}

impl Split {
    pub fn as_str(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Valid => "valid",
            Split::Test => "test",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "train" => Some(Split::Train),
            "valid" => Some(Split::Valid),
            "test" => Some(Split::Test),
            _ => None,
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Template ids are integers in LC-QuAD and free-form in other corpora.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateId {
    Number(i64),
    Name(String),
}

impl TemplateId {
    pub fn as_number(&self) -> Option<i64> {
        match self {
            TemplateId::Number(n) => Some(*n),
            TemplateId::Name(_) => None,
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(TemplateId::Number),
            Value::String(s) => Some(TemplateId::Name(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateId::Number(n) => write!(f, "{}", n),
            TemplateId::Name(s) => f.write_str(s),
        }
    }
}

impl Default for TemplateId {
    fn default() -> Self {
        TemplateId::Name(String::new())
    }
}

impl From<i64> for TemplateId {
    fn from(n: i64) -> Self {
        TemplateId::Number(n)
    }
}

impl From<&str> for TemplateId {
    fn from(s: &str) -> Self {
        TemplateId::Name(s.to_string())
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

/// Question renderings of one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// Corrected natural-language question
    #[serde(default, skip_serializing_if = "is_blank")]
    pub question: Option<String>,
    /// Untagged intermediary question
    #[serde(default, skip_serializing_if = "is_blank")]
    pub interm_question: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub uri_question_only_resources: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub uri_question_rest_no_resources: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub uri_question_all: Option<String>,
}

impl QuestionRecord {
    pub fn is_empty(&self) -> bool {
        [
            &self.question,
            &self.interm_question,
            &self.uri_question_only_resources,
            &self.uri_question_rest_no_resources,
            &self.uri_question_all,
        ]
        .into_iter()
        .all(is_blank)
    }
}

/// Query renderings of one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRecord {
    #[serde(default, skip_serializing_if = "is_blank")]
    pub interm_sparql: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub uri_interm_sparql_only_resources: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub uri_interm_sparql_rest_no_resources: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub uri_interm_sparql_all: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub pure_sparql: Option<String>,
}

impl QueryRecord {
    pub fn is_empty(&self) -> bool {
        [
            &self.interm_sparql,
            &self.uri_interm_sparql_only_resources,
            &self.uri_interm_sparql_rest_no_resources,
            &self.uri_interm_sparql_all,
            &self.pure_sparql,
        ]
        .into_iter()
        .all(is_blank)
    }
}

/// Selects one of the three URI-tagged variants of a question or query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    All,
    OnlyResources,
    RestNoResources,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::All, Variant::OnlyResources, Variant::RestNoResources];
}

impl QuestionRecord {
    pub fn variant(&self, variant: Variant) -> Option<&str> {
        match variant {
            Variant::All => self.uri_question_all.as_deref(),
            Variant::OnlyResources => self.uri_question_only_resources.as_deref(),
            Variant::RestNoResources => self.uri_question_rest_no_resources.as_deref(),
        }
    }

    pub fn set_variant(&mut self, variant: Variant, value: String) {
        match variant {
            Variant::All => self.uri_question_all = Some(value),
            Variant::OnlyResources => self.uri_question_only_resources = Some(value),
            Variant::RestNoResources => self.uri_question_rest_no_resources = Some(value),
        }
    }
}

impl QueryRecord {
    pub fn variant(&self, variant: Variant) -> Option<&str> {
        match variant {
            Variant::All => self.uri_interm_sparql_all.as_deref(),
            Variant::OnlyResources => self.uri_interm_sparql_only_resources.as_deref(),
            Variant::RestNoResources => self.uri_interm_sparql_rest_no_resources.as_deref(),
        }
    }

    pub fn set_variant(&mut self, variant: Variant, value: String) {
        match variant {
            Variant::All => self.uri_interm_sparql_all = Some(value),
            Variant::OnlyResources => self.uri_interm_sparql_only_resources = Some(value),
            Variant::RestNoResources => self.uri_interm_sparql_rest_no_resources = Some(value),
        }
    }
}

/// One training example.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entry {
    pub id: String,
    pub template_id: Option<TemplateId>,
    pub question: QuestionRecord,
    pub query: QueryRecord,
    pub split: Option<Split>,
    /// Source-corpus fields, keyed by source name
    pub original_data: Option<Map<String, Value>>,
    /// Remote query result, stored verbatim
    pub answer: Option<Value>,
}

impl Entry {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), ..Self::default() }
    }

    pub fn is_complete(&self) -> bool {
        !self.id.is_empty() && !self.question.is_empty() && !self.query.is_empty() && self.split.is_some()
    }

    /// `original_data[source][field]` as a string.
    pub fn original_field(&self, source: &str, field: &str) -> Result<&str> {
        self.original_data
            .as_ref()
            .and_then(|data| data.get(source))
            .and_then(|section| section.get(field))
            .and_then(Value::as_str)
            .ok_or_else(|| Error::MissingField(format!("original_data.{}.{}", source, field)))
    }

    /// Flat record with empty fields omitted. Warns when the entry is
    /// incomplete but still serializes it.
    pub fn to_record(&self) -> Result<Value> {
        if !self.is_complete() {
            warn!("Entry {} is missing required information", self.id);
        }

        let mut record = Map::new();
        record.insert("_id".to_string(), Value::String(self.id.clone()));
        if let Some(template_id) = &self.template_id {
            record.insert("template_id".to_string(), serde_json::to_value(template_id)?);
        }
        if !self.question.is_empty() {
            record.insert("question".to_string(), serde_json::to_value(&self.question)?);
        }
        if !self.query.is_empty() {
            record.insert("query".to_string(), serde_json::to_value(&self.query)?);
        }
        if let Some(split) = self.split {
            record.insert("set".to_string(), Value::String(split.as_str().to_string()));
        }
        if let Some(data) = self.original_data.as_ref().filter(|d| !d.is_empty()) {
            record.insert("original_data".to_string(), Value::Object(data.clone()));
        }
        if let Some(answer) = self.answer.as_ref().filter(|a| !a.is_null()) {
            record.insert("dbpedia_result".to_string(), answer.clone());
        }
        Ok(Value::Object(record))
    }

    /// Parses a flat record, validating the required fields.
    pub fn from_record(record: &Value) -> Result<Self> {
        let object = record
            .as_object()
            .ok_or_else(|| invalid("entry", "record should be an object"))?;

        let id = match object.get("_id") {
            None => return Err(Error::MissingField("_id".to_string())),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) if n.is_i64() || n.is_u64() => n.to_string(),
            Some(_) => return Err(invalid("_id", "should be a string or an integer")),
        };

        let template_id = match object.get("template_id") {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                TemplateId::from_value(value).ok_or_else(|| invalid("template_id", "should be a string or an integer"))?,
            ),
        };

        let question: QuestionRecord = section(object, "question")?;
        let query: QueryRecord = section(object, "query")?;

        let split = match object.get("set") {
            None => return Err(Error::MissingField("set".to_string())),
            Some(Value::String(s)) => {
                Split::parse(s).ok_or_else(|| invalid("set", "should be one of train, valid, test"))?
            }
            Some(_) => return Err(invalid("set", "should be a string")),
        };

        let original_data = match object.get("original_data") {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => Some(map.clone()),
            Some(_) => return Err(invalid("original_data", "should be an object")),
        };

        // older datasets stored lookups at entry level under `query_result`
        let answer = match object.get("dbpedia_result").or_else(|| object.get("query_result")) {
            None | Some(Value::Null) => None,
            Some(value @ Value::Object(_)) => Some(value.clone()),
            Some(_) => return Err(invalid("dbpedia_result", "should be an object")),
        };

        Ok(Entry { id, template_id, question, query, split: Some(split), original_data, answer })
    }
}

fn section<T: for<'de> Deserialize<'de>>(object: &Map<String, Value>, field: &str) -> Result<T> {
    match object.get(field) {
        None => Err(Error::MissingField(field.to_string())),
        Some(value @ Value::Object(_)) => {
            serde_json::from_value(value.clone()).map_err(|e| invalid(field, &e.to_string()))
        }
        Some(_) => Err(invalid(field, "should be an object")),
    }
}

fn invalid(field: &str, reason: &str) -> Error {
    Error::InvalidField { field: field.to_string(), reason: reason.to_string() }
}
