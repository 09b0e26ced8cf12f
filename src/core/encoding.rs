//! Bidirectional mapping between SPARQL syntax fragments and the flat
//! placeholder tokens of intermediary SPARQL.

use super::KbClass;

/// One row of the encoding table. The first `pure` alternative is the
/// canonical decoding of `interm`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRule {
    pub pure: Vec<String>,
    pub interm: String,
}

impl TokenRule {
    fn new(pure: &[&str], interm: &str) -> Self {
        Self { pure: pure.iter().map(|p| (*p).to_string()).collect(), interm: interm.to_string() }
    }

    /// Canonical pure fragment.
    pub fn canonical(&self) -> &str {
        self.pure.first().map_or("", String::as_str)
    }

    fn matches_fragment(&self, fragment: &str) -> bool {
        self.pure.iter().any(|p| p.trim() == fragment)
    }
}

/// Ordered encoding table. Row order matters in both directions: rows are
/// tried top to bottom and earlier rows win.
#[derive(Debug, Clone)]
pub struct TokenTable {
    rules: Vec<TokenRule>,
}

impl Default for TokenTable {
    fn default() -> Self {
        Self::dbpedia()
    }
}

impl TokenTable {
    pub fn new(rules: Vec<TokenRule>) -> Self {
        Self { rules }
    }

    /// The DBpedia table used by every corpus.
    pub fn dbpedia() -> Self {
        Self::new(vec![
            TokenRule::new(&["dbo:", "http://dbpedia.org/ontology/"], "dbo_"),
            TokenRule::new(&["dbp:", "http://dbpedia.org/property/"], "dbp_"),
            TokenRule::new(&["dbc:", "http://dbpedia.org/resource/Category:"], "dbc_"),
            TokenRule::new(&["dbr:", "res:", "http://dbpedia.org/resource/"], "dbr_"),
            TokenRule::new(&["dct:"], "dct_"),
            TokenRule::new(&["geo:"], "geo_"),
            TokenRule::new(&["georss:"], "georss_"),
            TokenRule::new(&["rdf:"], "rdf_"),
            TokenRule::new(&["rdfs:"], "rdfs_"),
            TokenRule::new(&["foaf:"], "foaf_"),
            TokenRule::new(&["owl:"], "owl_"),
            TokenRule::new(&["yago:"], "yago_"),
            TokenRule::new(&["skos:"], "skos_"),
            TokenRule::new(&[" ( "], "  par_open  "),
            TokenRule::new(&[" ) "], "  par_close  "),
            TokenRule::new(&[" ( "], " sparql_open "),
            TokenRule::new(&[" ) "], " sparql_close "),
            TokenRule::new(&["("], " attr_open "),
            TokenRule::new(&[") ", ")"], " attr_close "),
            TokenRule::new(&["{"], " brack_open "),
            TokenRule::new(&["}"], " brack_close "),
            TokenRule::new(&[" . "], " sep_dot "),
            TokenRule::new(&[". "], " sep_dot "),
            TokenRule::new(&["?"], "var_"),
            TokenRule::new(&["*"], "wildcard"),
            TokenRule::new(&[" <= "], " math_leq "),
            TokenRule::new(&[" >= "], " math_geq "),
            TokenRule::new(&[" < "], " math_lt "),
            TokenRule::new(&[" > "], " math_gt "),
            TokenRule::new(&["<"], " iri_open "),
            TokenRule::new(&[">"], " iri_close "),
        ])
    }

    pub fn rules(&self) -> &[TokenRule] {
        &self.rules
    }

    /// Literal substring encoding of a whole text, row by row.
    pub fn encode(&self, text: &str) -> String {
        let mut out = text.to_string();
        for rule in &self.rules {
            for pure in &rule.pure {
                out = out.replace(pure.as_str(), &rule.interm);
            }
        }
        out
    }

    /// Literal substring decoding, padded encoding first then the stripped one.
    pub fn decode(&self, text: &str) -> String {
        let mut out = text.to_string();
        for rule in &self.rules {
            let canonical = rule.canonical();
            out = out.replace(rule.interm.as_str(), canonical);
            let stripped = rule.interm.trim();
            if !stripped.is_empty() {
                out = out.replace(stripped, canonical);
            }
        }
        out
    }

    /// Token for a single syntactic fragment (`{`, `.`, `rdf:`...), taken from
    /// the first row whose trimmed pure side equals it.
    pub fn encode_token(&self, fragment: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.matches_fragment(fragment))
            .map(|rule| rule.interm.trim())
    }

    /// Token for a fragment occurring inside an entity name, where
    /// parentheses use the `attr_` spelling.
    pub fn encode_entity_token(&self, fragment: &str) -> Option<&str> {
        self.rules
            .iter()
            .filter(|rule| rule.interm.trim().starts_with("attr_"))
            .find(|rule| rule.matches_fragment(fragment))
            .map(|rule| rule.interm.trim())
    }

    /// Token delimiting a full IRI outside the knowledge base.
    pub fn encode_iri_token(&self, fragment: &str) -> Option<&str> {
        self.rules
            .iter()
            .filter(|rule| rule.interm.trim().starts_with("iri_"))
            .find(|rule| rule.matches_fragment(fragment))
            .map(|rule| rule.interm.trim())
    }

    /// Opaque token prefix for a knowledge-base class (`dbr_`).
    pub fn kb_token(&self, class: KbClass) -> String {
        let pure = format!("{}:", class.prefix());
        self.encode_token(&pure).map_or_else(|| format!("{}_", class.prefix()), str::to_string)
    }
}

/// Bracket placeholders used when a query is abstracted into a template.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderTable;

impl PlaceholderTable {
    pub fn placeholder(&self, class: KbClass) -> String {
        format!("<{}>", class.placeholder_name())
    }

    /// Placeholder for a prefixed KB reference, keyed on its first three
    /// characters.
    pub fn placeholder_for(&self, reference: &str) -> Option<String> {
        reference.get(..3).and_then(KbClass::from_prefix).map(|class| self.placeholder(class))
    }

    /// Class named by a template placeholder (`<resource_2>` is a resource).
    pub fn class_of(&self, placeholder: &str) -> Option<KbClass> {
        let name = placeholder.trim_start_matches('<').trim_end_matches('>');
        KbClass::ALL.into_iter().find(|class| name.contains(class.placeholder_name()))
    }
}
