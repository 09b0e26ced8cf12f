//! Tokenizer for pure SPARQL as it appears in the corpora.
//!
//! This is deliberately more lenient than the SPARQL grammar: DBpedia local
//! names in the corpora contain parentheses, commas and dots that a strict
//! lexer would reject, so prefixed names are read up to whitespace, a brace,
//! an unbalanced `)` or a comma followed by whitespace.

use crate::core::{KbClass, SPARQL_TYPE};

/// Token classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// Bare word: `select`, `where`, `filter`, `a`, ...
    Keyword,
    /// `?name` or `$name`; text holds the name without sigil
    Variable,
    /// Non-KB IRI; text holds the IRI without angle brackets
    Iri,
    /// Non-KB prefixed name such as `rdf:type`
    PrefixedName,
    /// KB reference of the given class; text holds the local name
    KbReference(KbClass),
    /// Quoted literal, verbatim including quotes and language tag
    StringLiteral,
    Number,
    /// `=`, `!=`, `<=`, `&&`, ...
    Operator,
    /// `{`, `}`, `(`, `)`, `.`, `,`, `;`, `*`
    Punct,
}

/// A token with its classified text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self { kind, text: text.into() }
    }

    pub fn is_kb_reference(&self) -> bool {
        matches!(self.kind, TokenKind::KbReference(_))
    }
}

/// Splits a pure SPARQL query into tokens. Never fails: characters that fit
/// no rule become single-character operators.
pub fn tokenize(input: &str) -> Vec<Token> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        match c {
            '<' => {
                if let Some(end) = iri_end(&chars, i) {
                    let inner: String = chars[i + 1..end].iter().collect();
                    tokens.push(classify_iri(&inner));
                    i = end + 1;
                } else if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::new(TokenKind::Operator, "<="));
                    i += 2;
                } else {
                    tokens.push(Token::new(TokenKind::Operator, "<"));
                    i += 1;
                }
            }
            '>' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::new(TokenKind::Operator, ">="));
                    i += 2;
                } else {
                    tokens.push(Token::new(TokenKind::Operator, ">"));
                    i += 1;
                }
            }
            '?' | '$' => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && is_name_char(chars[end]) {
                    end += 1;
                }
                tokens.push(Token::new(TokenKind::Variable, chars[start..end].iter().collect::<String>()));
                i = end;
            }
            '"' | '\'' => {
                let end = literal_end(&chars, i);
                tokens.push(Token::new(TokenKind::StringLiteral, chars[i..end].iter().collect::<String>()));
                i = end;
            }
            c if c.is_ascii_digit() => {
                let mut end = i;
                while end < chars.len() && chars[end].is_ascii_digit() {
                    end += 1;
                }
                if chars.get(end) == Some(&'.') && chars.get(end + 1).is_some_and(|d| d.is_ascii_digit()) {
                    end += 1;
                    while end < chars.len() && chars[end].is_ascii_digit() {
                        end += 1;
                    }
                }
                tokens.push(Token::new(TokenKind::Number, chars[i..end].iter().collect::<String>()));
                i = end;
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut end = i;
                while end < chars.len() && (is_name_char(chars[end]) || chars[end] == '-') {
                    end += 1;
                }
                let word: String = chars[i..end].iter().collect();

                if chars.get(end) == Some(&':') {
                    let (local, next) = read_local(&chars, end + 1);
                    tokens.extend(classify_prefixed(&word, local));
                    i = next;
                } else {
                    tokens.push(Token::new(TokenKind::Keyword, word));
                    i = end;
                }
            }
            '{' | '}' | '(' | ')' | '.' | ',' | ';' | '*' => {
                tokens.push(Token::new(TokenKind::Punct, c.to_string()));
                i += 1;
            }
            '!' | '&' | '|' | '=' => {
                let pair: String = chars[i..(i + 2).min(chars.len())].iter().collect();
                if matches!(pair.as_str(), "!=" | "&&" | "||") {
                    tokens.push(Token::new(TokenKind::Operator, pair));
                    i += 2;
                } else {
                    tokens.push(Token::new(TokenKind::Operator, c.to_string()));
                    i += 1;
                }
            }
            _ => {
                tokens.push(Token::new(TokenKind::Operator, c.to_string()));
                i += 1;
            }
        }
    }

    tokens
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Position of the closing `>` of an IRI starting at `start`, if the span
/// holds no whitespace.
fn iri_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    while j < chars.len() {
        match chars[j] {
            '>' if j > start + 1 => return Some(j),
            c if c.is_whitespace() || c == '<' || c == '>' => return None,
            _ => j += 1,
        }
    }
    None
}

fn literal_end(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    let mut j = start + 1;
    while j < chars.len() {
        if chars[j] == '\\' {
            j += 2;
            continue;
        }
        if chars[j] == quote {
            j += 1;
            break;
        }
        j += 1;
    }
    let mut end = j.min(chars.len());
    if chars.get(end) == Some(&'@') {
        end += 1;
        while end < chars.len() && (chars[end].is_alphanumeric() || chars[end] == '-') {
            end += 1;
        }
    }
    end
}

/// Reads a local name, keeping balanced parentheses and commas that are not
/// followed by whitespace.
fn read_local(chars: &[char], start: usize) -> (String, usize) {
    let mut depth = 0usize;
    let mut j = start;

    while j < chars.len() {
        let c = chars[j];
        match c {
            c if c.is_whitespace() => break,
            '{' | '}' | ';' | '<' | '>' | '"' => break,
            '(' => depth += 1,
            ')' if depth == 0 => break,
            ')' => depth -= 1,
            ',' if chars.get(j + 1).map_or(true, |n| n.is_whitespace()) => break,
            _ => {}
        }
        j += 1;
    }

    (chars[start..j].iter().collect(), j)
}

fn classify_iri(inner: &str) -> Token {
    if inner == SPARQL_TYPE {
        return Token::new(TokenKind::PrefixedName, "rdf:type");
    }
    match KbClass::classify(inner) {
        Some((class, local)) => Token::new(TokenKind::KbReference(class), local),
        None => Token::new(TokenKind::Iri, inner),
    }
}

fn classify_prefixed(prefix: &str, local: String) -> Vec<Token> {
    if prefix.eq_ignore_ascii_case("http") || prefix.eq_ignore_ascii_case("https") {
        return vec![classify_iri(&format!("{}:{}", prefix, local))];
    }

    if let Some(class) = KbClass::from_prefix(prefix) {
        // a trailing dot is resolved later by the sep-dot rules
        return vec![Token::new(TokenKind::KbReference(class), local)];
    }

    let trimmed = local.trim_end_matches('.');
    let mut tokens = vec![Token::new(TokenKind::PrefixedName, format!("{}:{}", prefix, trimmed))];
    for _ in trimmed.len()..local.len() {
        tokens.push(Token::new(TokenKind::Punct, "."));
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(query: &str) -> Vec<(TokenKind, String)> {
        tokenize(query).into_iter().map(|t| (t.kind, t.text)).collect()
    }

    #[test]
    fn test_basic_select() {
        let tokens = kinds("SELECT ?x WHERE { ?x dbo:author dbr:J._K._Rowling . }");
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Keyword, "SELECT".to_string()),
                (TokenKind::Variable, "x".to_string()),
                (TokenKind::Keyword, "WHERE".to_string()),
                (TokenKind::Punct, "{".to_string()),
                (TokenKind::Variable, "x".to_string()),
                (TokenKind::KbReference(KbClass::Ontology), "author".to_string()),
                (TokenKind::KbReference(KbClass::Resource), "J._K._Rowling".to_string()),
                (TokenKind::Punct, ".".to_string()),
                (TokenKind::Punct, "}".to_string()),
            ]
        );
    }

    #[test]
    fn test_entity_parentheses_and_commas() {
        let tokens = kinds("filter(?x = dbr:Paris_(Texas)) ?y dbp:x dbr:Washington,_D.C. ,");
        assert!(tokens.contains(&(TokenKind::KbReference(KbClass::Resource), "Paris_(Texas)".to_string())));
        assert!(tokens.contains(&(TokenKind::KbReference(KbClass::Resource), "Washington,_D.C.".to_string())));
        assert_eq!(tokens.last(), Some(&(TokenKind::Punct, ",".to_string())));
        let closing = tokens.iter().filter(|(_, t)| t == ")").count();
        assert_eq!(closing, 1);
    }

    #[test]
    fn test_full_iris_and_comparisons() {
        let tokens = kinds(
            "SELECT DISTINCT ?uri WHERE { ?uri <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://dbpedia.org/ontology/Film> . ?uri <http://xmlns.com/foaf/0.1/name> ?n . FILTER(?n < 5) }",
        );
        assert!(tokens.contains(&(TokenKind::PrefixedName, "rdf:type".to_string())));
        assert!(tokens.contains(&(TokenKind::KbReference(KbClass::Ontology), "Film".to_string())));
        assert!(tokens.contains(&(TokenKind::Iri, "http://xmlns.com/foaf/0.1/name".to_string())));
        assert!(tokens.contains(&(TokenKind::Operator, "<".to_string())));
        assert!(tokens.contains(&(TokenKind::Number, "5".to_string())));
    }

    #[test]
    fn test_non_kb_prefixed_name_drops_trailing_dot() {
        let tokens = kinds("?x rdfs:label ?l. ?l foaf:name.");
        assert_eq!(tokens[1], (TokenKind::PrefixedName, "rdfs:label".to_string()));
        assert_eq!(tokens[5], (TokenKind::PrefixedName, "foaf:name".to_string()));
        assert_eq!(tokens[6], (TokenKind::Punct, ".".to_string()));
    }

    #[test]
    fn test_string_literal_with_language() {
        let tokens = kinds("filter(lang(?l) = 'en') ?x rdfs:label \"Paris\"@fr");
        assert!(tokens.contains(&(TokenKind::StringLiteral, "'en'".to_string())));
        assert!(tokens.contains(&(TokenKind::StringLiteral, "\"Paris\"@fr".to_string())));
    }
}
