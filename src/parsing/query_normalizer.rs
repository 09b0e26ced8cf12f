//! Conversion between pure and intermediary SPARQL, and the textual repairs
//! applied to intermediary queries coming from the corpora.

use crate::config::{NormalizerConfig, SepDotRules};
use crate::core::{TagFlags, TokenTable, UriVariants};
use crate::parsing::sep_dot;
use crate::parsing::sparql_lexer::{tokenize, TokenKind};
use crate::tagging::uri_tagger::UriTagger;
use crate::{Error, Result};
use log::debug;
use regex::{Captures, Regex};

/// Regex-driven normalizer. Patterns are compiled once in [`QueryNormalizer::new`].
pub struct QueryNormalizer {
    table: TokenTable,
    tagger: UriTagger,
    sep_dots: SepDotRules,
    whitespace: Regex,
    filter_par: Regex,
    rest_par: Regex,
    quotes: Regex,
    interm_resources: Regex,
    math_spaces: Regex,
    order_by: Regex,
    var_in_resource: Regex,
    pure_resources: Regex,
    encoded_question_mark: Regex,
    interm_iris: Regex,
}

impl QueryNormalizer {
    pub fn new() -> Result<Self> {
        Self::with_config(TokenTable::dbpedia(), &NormalizerConfig::default())
    }

    pub fn with_config(table: TokenTable, config: &NormalizerConfig) -> Result<Self> {
        Ok(QueryNormalizer {
            tagger: UriTagger::new(table.clone(), config.sep_dots.clone()),
            table,
            sep_dots: config.sep_dots.clone(),
            whitespace: Regex::new(r"\s+")?,
            filter_par: Regex::new(r"(?i)(?:FILTER)\s*?(par_open).*(par_close)")?,
            rest_par: Regex::new(r"(?i)(?:count|order by (?:asc|desc))\s*?(par_open).*?(par_close)")?,
            quotes: Regex::new(r"(?i)regex par_open var_[a-z]+,(').*?(')(?:,(').*?('))? par_close")?,
            interm_resources: Regex::new(
                r"(db[orcp]_.*?(?:(?:\s*?(?:attr|par)_open([a-z\^db\[orcp]_*?)(?:attr|par)_close [a-z\^db\[orcp]\]*?)|(?:\s*?(?:attr|par)_open(.*?)(?:attr|par)_close)|(?:\s?_.*?)|(?:,?_.*?)|(?:\s*?\-.*?))*\??)(?:\s|brack_close)",
            )?,
            math_spaces: Regex::new(r"(?i)(var_[a-zA-Z0-9]+)(math_[gl]t)(.*?)[$|\s]")?,
            order_by: Regex::new(r"(?i)(_ob[ad]_)\s*(\?[a-zA-Z]+)")?,
            var_in_resource: Regex::new(r"(?i)db[rocp]:[a-zA-Z0-9_]*?(\?)[a-zA-Z0-9]")?,
            pure_resources: Regex::new(r"(?i)(db[orcp]:.*?)(?:[\s|}])")?,
            encoded_question_mark: Regex::new(r" ?%3F")?,
            interm_iris: Regex::new(r"iri_open\s+(\S+)\s+iri_close")?,
        })
    }

    pub fn table(&self) -> &TokenTable {
        &self.table
    }

    pub fn tagger(&self) -> &UriTagger {
        &self.tagger
    }

    /// Repairs a corpus intermediary query. The steps run in a fixed order;
    /// later steps rely on the token spelling left by earlier ones.
    pub fn correct_query(&self, raw: &str) -> String {
        let mut q = raw.replace("attr_open", " par_open ").replace("attr_close", " par_close ");
        q = self.collapse(&q);

        q = q.replace("var_uri.", "var_uri sep_dot");
        q = q.replace("brack_open", " brack_open ").replace("brack_close", " brack_close ");
        q = q.replace("dbp_length", " dbp_length ");

        // parentheses of FILTER / COUNT / ORDER BY are syntax, not entity boundaries
        q = self
            .filter_par
            .replace_all(&q, |caps: &Captures| splice_groups(caps, |g| if g == 1 { "sparql_open" } else { "sparql_close" }))
            .into_owned();
        q = self
            .rest_par
            .replace_all(&q, |caps: &Captures| splice_groups(caps, |g| if g == 1 { "sparql_open" } else { "sparql_close" }))
            .into_owned();
        q = self.quotes.replace_all(&q, |caps: &Captures| splice_groups(caps, |_| " sparql_quote ")).into_owned();

        q = self
            .interm_resources
            .replace_all(&q, |caps: &Captures| sep_dot::correct(&caps[0], &self.sep_dots))
            .into_owned();
        q = self
            .math_spaces
            .replace_all(&q, |caps: &Captures| format!(" {} {} {} ", &caps[1], &caps[2], &caps[3]))
            .into_owned();

        q = q.replace("FILTER", "filter").replace("COUNT", "count").replace("UNION", "union");
        q = q.replace("%3F", "?");
        q = self.collapse(&q);

        let corrected = q
            .replace("par_open", "attr_open")
            .replace("par_close", "attr_close")
            .replace("sparql_open", "par_open")
            .replace("sparql_close", "par_close");

        if corrected != raw {
            debug!("Corrected intermediary query: {} -> {}", raw, corrected);
        }
        corrected
    }

    /// Intermediary to pure SPARQL through the reversed encoding table.
    pub fn to_pure_sparql(&self, interm: &str) -> Result<String> {
        let mut q = self.decode_outside_iris(interm);
        q = self.restore_order_by(&q)?;
        q = self.restore_vars_in_resources(&q);

        q = q.replace('{', " { ").replace('}', " } ");
        q = q.replace("FILTER", "filter").replace("COUNT", "count").replace("UNION", "union");

        q = self
            .pure_resources
            .replace_all(&q, |caps: &Captures| {
                let entity = caps[0]
                    .replace(' ', "")
                    .replace('\\', "")
                    .replace("attr_dot", ".");
                format!(" {} ", entity)
            })
            .into_owned();

        q = q.replace("dbp:length", " dbp:length ");
        q = self.encoded_question_mark.replace_all(&q, "?").into_owned();
        Ok(self.collapse(&q))
    }

    /// Pure to intermediary SPARQL.
    ///
    /// Keywords, variables and literals are lowercased, syntax goes through
    /// the encoding table and every resource is rendered by the URI tagger.
    pub fn to_interm(&self, pure: &str, keep_uris: bool, flags: TagFlags) -> String {
        let mut out: Vec<String> = Vec::new();

        for token in tokenize(pure) {
            let rendered = match token.kind {
                TokenKind::Keyword | TokenKind::StringLiteral => token.text.to_lowercase(),
                TokenKind::Number => token.text,
                TokenKind::Variable => {
                    format!("{}{}", self.table.encode_token("?").unwrap_or("var_"), token.text.to_lowercase())
                }
                TokenKind::KbReference(class) => self.tagger.render_reference(class, &token.text, flags, keep_uris),
                TokenKind::PrefixedName | TokenKind::Iri => self.tagger.tag_resource(&token.text, flags, keep_uris),
                TokenKind::Operator | TokenKind::Punct => {
                    self.table.encode_token(&token.text).unwrap_or(token.text.as_str()).to_string()
                }
            };
            out.push(rendered);
        }

        out.join(" ")
    }

    /// The three URI-tagged intermediary variants of one pure query.
    pub fn uri_variants(&self, pure: &str) -> UriVariants {
        let [all, only_resources, rest_no_resources] = UriVariants::flag_sets();
        UriVariants {
            all: self.to_interm(pure, true, all),
            only_resources: self.to_interm(pure, true, only_resources),
            rest_no_resources: self.to_interm(pure, true, rest_no_resources),
        }
    }

    /// Escapes a pure query for a remote SPARQL service. One-way.
    pub fn escape_for_remote_query(&self, pure: &str) -> Result<String> {
        let mut q = self
            .pure_resources
            .replace_all(pure, |caps: &Captures| caps[0].replace('(', "\\(").replace(')', "\\)"))
            .into_owned();
        q = escape_lone_ampersands(&q);
        q = self.pure_resources.replace_all(&q, |caps: &Captures| caps[0].replace('.', "\\.")).into_owned();
        q = q.replace('+', "\\+");
        q = self.restore_order_by(&q)?;

        Ok(q.replace('\'', "\\'").replace(',', "\\,").replace('!', "\\!").replace('/', "\\/"))
    }

    /// Table decoding of everything but `iri_open .. iri_close` spans, which
    /// come back verbatim inside angle brackets.
    fn decode_outside_iris(&self, interm: &str) -> String {
        let mut out = String::with_capacity(interm.len());
        let mut last = 0;
        for caps in self.interm_iris.captures_iter(interm) {
            let (Some(whole), Some(iri)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&self.table.decode(&interm[last..whole.start()]));
            out.push_str(" <");
            out.push_str(iri.as_str());
            out.push_str("> ");
            last = whole.end();
        }
        out.push_str(&self.table.decode(&interm[last..]));
        out
    }

    /// `_oba_ ?x` / `_obd_ ?x` back to `ORDER BY ASC(?x)` / `ORDER BY DESC(?x)`.
    fn restore_order_by(&self, query: &str) -> Result<String> {
        let markers = self.order_by.find_iter(query).count();
        if markers > 1 {
            return Err(Error::MalformedQuery(format!("more than one order by in '{}'", query)));
        }

        Ok(self
            .order_by
            .replace(query, |caps: &Captures| {
                let direction = if caps[1].eq_ignore_ascii_case("_oba_") { "ASC" } else { "DESC" };
                format!("ORDER BY {}({})", direction, &caps[2])
            })
            .into_owned())
    }

    /// Decoding turns `var_` inside names (`Sarovar_Bridge`) into `?`;
    /// put it back wherever the `?` is glued inside a KB reference.
    fn restore_vars_in_resources(&self, query: &str) -> String {
        let mut current = query.to_string();
        loop {
            let next = self
                .var_in_resource
                .replace_all(&current, |caps: &Captures| caps[0].replace('?', "var_"))
                .into_owned();
            if next == current {
                return current;
            }
            current = next;
        }
    }

    fn collapse(&self, text: &str) -> String {
        self.whitespace.replace_all(text, " ").trim().to_string()
    }
}

/// Rebuilds a match with each participating capture group replaced.
fn splice_groups<'a>(caps: &Captures<'_>, replacement: impl Fn(usize) -> &'a str) -> String {
    let Some(whole) = caps.get(0) else {
        return String::new();
    };
    let mut out = whole.as_str().to_string();
    for g in (1..caps.len()).rev() {
        if let Some(m) = caps.get(g) {
            out.replace_range(m.start() - whole.start()..m.end() - whole.start(), replacement(g));
        }
    }
    out
}

fn escape_lone_ampersands(query: &str) -> String {
    let chars: Vec<char> = query.chars().collect();
    let mut out = String::with_capacity(query.len());
    for (i, c) in chars.iter().enumerate() {
        if *c == '&' {
            let prev = i.checked_sub(1).and_then(|p| chars.get(p));
            let next = chars.get(i + 1);
            if prev != Some(&'&') && next != Some(&'&') {
                out.push('\\');
            }
        }
        out.push(*c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> QueryNormalizer {
        QueryNormalizer::new().unwrap()
    }

    #[test]
    fn test_to_interm_opaque() {
        let interm = normalizer().to_interm("SELECT ?x WHERE { ?x dbo:author dbr:J._K._Rowling . }", false, TagFlags::none());
        assert_eq!(interm, "select var_x where brack_open var_x dbo_author dbr_J._K._Rowling sep_dot brack_close");
    }

    #[test]
    fn test_to_interm_all_tagged() {
        let interm = normalizer().to_interm("SELECT ?x WHERE { ?x dbo:author dbr:J._K._Rowling . }", true, TagFlags::all());
        assert_eq!(interm, "select var_x where brack_open var_x dbo:author dbr:J._K._Rowling sep_dot brack_close");
    }

    #[test]
    fn test_to_interm_count_and_filter() {
        let interm = normalizer().to_interm(
            "select count(?uri) where { ?uri dbo:height ?h . filter(?h >= 2) }",
            false,
            TagFlags::none(),
        );
        assert_eq!(
            interm,
            "select count par_open var_uri par_close where brack_open var_uri dbo_height var_h sep_dot filter par_open var_h math_geq 2 par_close brack_close"
        );
    }

    #[test]
    fn test_to_pure_sparql() {
        let pure = normalizer()
            .to_pure_sparql("select var_x where brack_open var_x dbo_author dbr_J._K._Rowling sep_dot brack_close")
            .unwrap();
        assert_eq!(pure, "select ?x where { ?x dbo:author dbr:J._K._Rowling . }");
    }

    #[test]
    fn test_foreign_iri_survives_round_trip() {
        let n = normalizer();
        let pure = "select ?n where { dbr:Paris <http://xmlns.com/foaf/0.1/name> ?n }";
        let interm = n.to_interm(pure, true, TagFlags::all());
        assert_eq!(interm, "select var_n where brack_open dbr:Paris iri_open http://xmlns.com/foaf/0.1/name iri_close var_n brack_close");
        assert_eq!(n.to_pure_sparql(&interm).unwrap(), pure);
    }

    #[test]
    fn test_to_pure_sparql_order_by() {
        let pure = normalizer()
            .to_pure_sparql("select var_x where brack_open var_x dbo_height var_h brack_close _obd_ var_h")
            .unwrap();
        assert_eq!(pure, "select ?x where { ?x dbo:height ?h } ORDER BY DESC(?h)");
    }

    #[test]
    fn test_to_pure_sparql_rejects_two_order_by() {
        let err = normalizer()
            .to_pure_sparql("select var_x where brack_open var_x dbo_a var_h brack_close _obd_ var_h _oba_ var_x")
            .unwrap_err();
        assert!(matches!(err, Error::MalformedQuery(_)));
    }

    #[test]
    fn test_var_inside_resource_name_restored() {
        let pure = normalizer()
            .to_pure_sparql("select var_x where brack_open var_x dbo_location dbr_Sarovar_Bridge brack_close")
            .unwrap();
        assert_eq!(pure, "select ?x where { ?x dbo:location dbr:Sarovar_Bridge }");
    }

    #[test]
    fn test_correct_query_filter_parentheses() {
        let corrected = normalizer().correct_query(
            "SELECT ?x WHERE brack_open var_x dbo_birthDate var_d . FILTER attr_open var_d math_gt 1990 attr_close brack_close",
        );
        assert_eq!(
            corrected,
            "SELECT ?x WHERE brack_open var_x dbo_birthDate var_d . filter par_open var_d math_gt 1990 par_close brack_close"
        );
    }

    #[test]
    fn test_correct_query_entity_parentheses_and_dots() {
        let corrected = normalizer()
            .correct_query("select var_a where brack_open dbr_Paris_attr_open Texasattr_close dbo_mayor var_a brack_close");
        assert_eq!(corrected, "select var_a where brack_open dbr_Paris_ attr_open Texas attr_close dbo_mayor var_a brack_close");

        let corrected =
            normalizer().correct_query("select var_a where brack_open dbr_Stephen_Hawking. dbo_spouse var_a brack_close");
        assert_eq!(corrected, "select var_a where brack_open dbr_Stephen_Hawking sep_dot dbo_spouse var_a brack_close");
    }

    #[test]
    fn test_correct_query_math_spacing() {
        let corrected = normalizer().correct_query("ask brack_open var_xmath_gt5 brack_close");
        assert_eq!(corrected, "ask brack_open var_x math_gt 5 brack_close");

        let corrected = normalizer().correct_query("ask where brack_open var_amath_lt10 sep_dot brack_close");
        assert_eq!(corrected, "ask where brack_open var_a math_lt 10 sep_dot brack_close");
    }

    #[test]
    fn test_escape_for_remote_query() {
        let escaped = normalizer()
            .escape_for_remote_query("select ?x where { dbr:Paris_(Texas) dbo:mayor ?x . dbr:A&B dbp:x 'a,b' }")
            .unwrap();
        assert_eq!(
            escaped,
            "select ?x where { dbr:Paris_\\(Texas\\) dbo:mayor ?x . dbr:A\\&B dbp:x \\'a\\,b\\' }"
        );
    }

    #[test]
    fn test_uri_variants() {
        let variants = normalizer().uri_variants("select ?x where { ?x dbo:author dbr:Victor_Hugo . }");
        assert_eq!(variants.all, "select var_x where brack_open var_x dbo:author dbr:Victor_Hugo sep_dot brack_close");
        assert_eq!(variants.only_resources, "select var_x where brack_open var_x dbo_author dbr:Victor_Hugo sep_dot brack_close");
        assert_eq!(variants.rest_no_resources, "select var_x where brack_open var_x dbo:author dbr_Victor_Hugo sep_dot brack_close");
    }
}
