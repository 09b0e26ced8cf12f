pub mod answer_lookup;
pub mod oxigraph_adapter;

pub use answer_lookup::{answers_match, fetch_answers, AnswerLookup, SparqlEndpoint};
pub use oxigraph_adapter::SparqlValidator;
