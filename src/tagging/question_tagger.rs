//! Question-side URI tagging.
//!
//! A question carries its KB mentions as `<label>` spans. Each span has a
//! slot tag (from the template), and so does each URI of the paired query.
//! Spans and URIs sharing a tag refer to the same entity, so the span is
//! rewritten to the URI when the URI's class is switched on.

use crate::core::{KbClass, TagFlags, UriVariants};
use log::debug;

/// A bracketed mention in a question, e.g. `<kylie minogue>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSlot {
    pub tag: String,
    /// Span text including the angle brackets
    pub span: String,
}

/// A shortened URI of the paired query, e.g. `dbr:Kylie_Minogue`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriSlot {
    pub tag: String,
    pub uri: String,
}

impl LabelSlot {
    pub fn new(tag: impl Into<String>, span: impl Into<String>) -> Self {
        Self { tag: tag.into(), span: span.into() }
    }
}

impl UriSlot {
    pub fn new(tag: impl Into<String>, uri: impl Into<String>) -> Self {
        Self { tag: tag.into(), uri: uri.into() }
    }

    /// Whether the URI may appear literally under `flags`. References
    /// outside the four KB classes are always substituted.
    pub fn allowed(&self, flags: TagFlags) -> bool {
        match self.uri.split_once(':').and_then(|(prefix, _)| KbClass::from_prefix(prefix)) {
            Some(class) => flags.allows(class),
            None => true,
        }
    }
}

/// All `<...>` spans of `text`, brackets included, in order.
pub fn bracketed_spans(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut rest = text;
    let mut offset = 0;
    while let Some(open) = rest.find('<') {
        let Some(close) = rest[open..].find('>') else {
            break;
        };
        let end = open + close + 1;
        spans.push(&text[offset + open..offset + end]);
        offset += end;
        rest = &text[offset..];
    }
    spans
}

/// Rewrites each label span to the URI with the same tag, then strips the
/// remaining brackets.
pub fn tag_question(question: &str, labels: &[LabelSlot], uris: &[UriSlot], flags: TagFlags) -> String {
    let mut tagged = question.to_string();

    for label in labels {
        let Some(uri) = uris.iter().find(|u| u.tag == label.tag) else {
            debug!("No query URI for label {} tagged {}", label.span, label.tag);
            continue;
        };
        if uri.allowed(flags) {
            tagged = tagged.replace(&label.span.to_lowercase(), &uri.uri);
        }
    }

    tagged
        .replace(['<', '>'], "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// The three standard question variants.
pub fn question_variants(question: &str, labels: &[LabelSlot], uris: &[UriSlot]) -> UriVariants {
    let [all, only_resources, rest_no_resources] =
        UriVariants::flag_sets().map(|flags| tag_question(question, labels, uris, flags));
    UriVariants { all, only_resources, rest_no_resources }
}
