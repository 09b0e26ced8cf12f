//! Tokenizer and normalizers for SPARQL queries and natural-language questions

pub mod question_normalizer;
pub mod query_normalizer;
pub mod sep_dot;
pub mod sparql_lexer;
