//! Per-reference rendering decisions.
//!
//! A knowledge-base reference is rendered either literally (`dbo:Place`)
//! or as an opaque intermediary token (`dbo_Place`). Only the four DBpedia
//! classes are switchable; every other namespace is always opaque.

use crate::config::SepDotRules;
use crate::core::{KbClass, TagFlags, TokenTable, SPARQL_TYPE};
use crate::parsing::sep_dot::{self, TrailingDot};

#[derive(Debug, Clone)]
pub struct UriTagger {
    table: TokenTable,
    sep_dots: SepDotRules,
}

impl UriTagger {
    pub fn new(table: TokenTable, sep_dots: SepDotRules) -> Self {
        Self { table, sep_dots }
    }

    /// Renders any resource fragment: a full IRI (bracketed or not), a
    /// prefixed name or an intermediary token.
    ///
    /// With `keep_uris` off every reference is opaque and parentheses inside
    /// names become `attr_open` / `attr_close`.
    pub fn tag_resource(&self, fragment: &str, flags: TagFlags, keep_uris: bool) -> String {
        let trimmed = fragment.trim();
        let bracketed = trimmed.strip_prefix('<').and_then(|f| f.strip_suffix('>'));
        let inner = bracketed.unwrap_or(trimmed);

        if inner == SPARQL_TYPE {
            return self.render_prefixed("rdf", "type", keep_uris);
        }

        if let Some((class, local)) = KbClass::classify(inner) {
            return self.render_reference(class, local, flags, keep_uris);
        }

        match inner.split_once(':') {
            Some((prefix, local)) if bracketed.is_none() && !local.starts_with("//") => {
                self.render_prefixed(prefix, local, keep_uris)
            }
            Some(_) => self.render_iri(inner),
            None => self.encode_entity_chars(inner, keep_uris),
        }
    }

    /// Full IRIs outside the knowledge base keep their delimiters as
    /// `iri_open` / `iri_close` and are never shortened.
    pub fn render_iri(&self, iri: &str) -> String {
        format!(
            "{} {} {}",
            self.table.encode_iri_token("<").unwrap_or("iri_open"),
            iri,
            self.table.encode_iri_token(">").unwrap_or("iri_close")
        )
    }

    /// Renders one KB reference given its class and local name.
    pub fn render_reference(&self, class: KbClass, local: &str, flags: TagFlags, keep_uris: bool) -> String {
        let opaque_prefix = self.table.kb_token(class);

        let (local, separator) = match sep_dot::classify(&format!("{}{}", opaque_prefix, local), &self.sep_dots) {
            TrailingDot::Separator => (&local[..local.len() - 1], true),
            TrailingDot::Keep => (local, false),
        };

        let name = if keep_uris && flags.allows(class) {
            format!("{}:{}", class.prefix(), local)
        } else {
            format!("{}{}", opaque_prefix, local)
        };

        let mut rendered = self.encode_entity_chars(&name, keep_uris);
        if separator {
            rendered.push(' ');
            rendered.push_str(self.table.encode_token(".").unwrap_or("sep_dot"));
        }
        rendered
    }

    /// Non-switchable namespaces, always opaque (`rdf:type` -> `rdf_type`).
    pub fn render_prefixed(&self, prefix: &str, local: &str, keep_uris: bool) -> String {
        let token = self
            .table
            .encode_token(&format!("{}:", prefix))
            .map_or_else(|| format!("{}_", prefix), str::to_string);
        self.encode_entity_chars(&format!("{}{}", token, local), keep_uris)
    }

    fn encode_entity_chars(&self, name: &str, keep_uris: bool) -> String {
        if keep_uris || !name.contains(['(', ')']) {
            return name.to_string();
        }

        let mut out = String::with_capacity(name.len() + 16);
        for c in name.chars() {
            let fragment = c.to_string();
            match self.table.encode_entity_token(&fragment) {
                Some(token) if c == '(' || c == ')' => {
                    out.push(' ');
                    out.push_str(token);
                    out.push(' ');
                }
                _ => out.push(c),
            }
        }
        out.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

impl Default for UriTagger {
    fn default() -> Self {
        Self::new(TokenTable::dbpedia(), SepDotRules::default())
    }
}
