//! Syntax check of pure SPARQL through the Oxigraph parser.
//!
//! Corpus queries use the short DBpedia prefixes without declaring them, and
//! their local names carry characters (`(`, `,`, `'`) that SPARQL only
//! accepts escaped. The validator rebuilds the query from its tokens with
//! declared prefixes and escaped local names, then hands it to Oxigraph.

use crate::config::SepDotRules;
use crate::core::{KbClass, TokenTable};
use crate::dataset::entry::Entry;
use crate::parsing::sep_dot::{self, TrailingDot};
use crate::parsing::sparql_lexer::{self, Token, TokenKind};
use crate::sources::BatchReport;
use crate::{Error, Result};
use log::debug;
use oxigraph::sparql::SparqlEvaluator;

const EXTRA_PREFIXES: [(&str, &str); 10] = [
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("foaf", "http://xmlns.com/foaf/0.1/"),
    ("owl", "http://www.w3.org/2002/07/owl#"),
    ("dct", "http://purl.org/dc/terms/"),
    ("geo", "http://www.w3.org/2003/01/geo/wgs84_pos#"),
    ("georss", "http://www.georss.org/georss/"),
    ("yago", "http://dbpedia.org/class/yago/"),
    ("skos", "http://www.w3.org/2004/02/skos/core#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
];

/// Characters SPARQL accepts in a local name only behind a backslash.
const LOCAL_ESCAPES: &str = "~!$&'()*+,;=/?#@%";

pub struct SparqlValidator {
    table: TokenTable,
    sep_dots: SepDotRules,
    prologue: String,
}

impl SparqlValidator {
    pub fn new() -> Self {
        Self::with_rules(SepDotRules::default())
    }

    pub fn with_rules(sep_dots: SepDotRules) -> Self {
        let mut prologue = String::new();
        for class in KbClass::ALL {
            prologue.push_str(&format!("PREFIX {}: <{}>\n", class.prefix(), class.namespace()));
        }
        for (prefix, namespace) in EXTRA_PREFIXES {
            prologue.push_str(&format!("PREFIX {}: <{}>\n", prefix, namespace));
        }
        Self { table: TokenTable::dbpedia(), sep_dots, prologue }
    }

    /// The query exactly as it is handed to the parser.
    pub fn prepare(&self, pure: &str) -> String {
        let body: Vec<String> = sparql_lexer::tokenize(pure).iter().map(|t| self.render(t)).collect();
        format!("{}{}", self.prologue, body.join(" "))
    }

    /// Parses the query, reporting the parser's message on failure.
    pub fn validate(&self, pure: &str) -> Result<()> {
        let prepared = self.prepare(pure);
        SparqlEvaluator::new()
            .parse_query(&prepared)
            .map(drop)
            .map_err(|e| Error::Sparql(e.to_string()))
    }

    /// Checks the pure form of every entry. Entries without one are reported
    /// as missing the field.
    pub fn validate_dataset(&self, entries: &[Entry]) -> BatchReport {
        let mut report = BatchReport::default();
        for entry in entries {
            let outcome = match entry.query.pure_sparql.as_deref() {
                Some(pure) => self.validate(pure),
                None => Err(Error::MissingField("query.pure_sparql".to_string())),
            };
            match outcome {
                Ok(()) => report.record_success(),
                Err(e) => report.record_failure(&entry.id, e),
            }
        }
        debug!("Validated {} entries: {}", entries.len(), report);
        report
    }

    fn render(&self, token: &Token) -> String {
        match token.kind {
            TokenKind::Variable => format!("?{}", token.text),
            TokenKind::Iri => format!("<{}>", token.text),
            TokenKind::KbReference(class) => {
                let spelled = format!("{}{}", self.table.kb_token(class), token.text);
                match sep_dot::classify(&spelled, &self.sep_dots) {
                    TrailingDot::Separator => {
                        let local = &token.text[..token.text.len() - 1];
                        format!("{}:{} .", class.prefix(), escape_local(local))
                    }
                    TrailingDot::Keep => format!("{}:{}", class.prefix(), escape_local(&token.text)),
                }
            }
            TokenKind::PrefixedName => match token.text.split_once(':') {
                Some((prefix, local)) => format!("{}:{}", prefix, escape_local(local)),
                None => token.text.clone(),
            },
            _ => token.text.clone(),
        }
    }
}

impl Default for SparqlValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Escapes a local name so it reads as a single `PN_LOCAL`.
pub fn escape_local(local: &str) -> String {
    let count = local.chars().count();
    let mut out = String::with_capacity(local.len() + 8);
    for (i, c) in local.chars().enumerate() {
        let needs_escape = LOCAL_ESCAPES.contains(c) || (c == '.' && (i == 0 || i + 1 == count)) || (c == '-' && i == 0);
        if needs_escape {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_local() {
        assert_eq!(escape_local("Paris_(Texas)"), "Paris_\\(Texas\\)");
        assert_eq!(escape_local("Washington,_D.C."), "Washington\\,_D.C\\.");
        assert_eq!(escape_local("J._K._Rowling"), "J._K._Rowling");
    }

    #[test]
    fn test_valid_queries() {
        let validator = SparqlValidator::new();
        assert!(validator.validate("select ?x where { ?x dbo:author dbr:Victor_Hugo . }").is_ok());
        assert!(validator.validate("select ?x where { ?x dbo:location dbr:Paris_(Texas) }").is_ok());
        assert!(validator.validate("ask where { ?x dbo:knownFor dbr:Stephen_Hawking. ?x rdf:type dbo:Person }").is_ok());
        assert!(validator.validate("select ?n where { dbr:Paris <http://xmlns.com/foaf/0.1/name> ?n }").is_ok());
        assert!(validator
            .validate("select distinct ?uri where { ?uri <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://dbpedia.org/ontology/Film> }")
            .is_ok());
    }

    #[test]
    fn test_invalid_query_is_reported() {
        let validator = SparqlValidator::new();
        let result = validator.validate("select ?x where { ?x dbo:author ");
        assert!(matches!(result, Err(Error::Sparql(_))));
    }
}
