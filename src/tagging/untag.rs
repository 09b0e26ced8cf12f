//! Untagging of KB references a model could not copy from the question.
//!
//! A literal reference (`dbo:Book`) in a query variant is only predictable
//! when the paired question variant contains it too. Anything else is
//! rewritten to its opaque form (`dbo_Book`). The dataset-wide pass runs in
//! two phases: [`UntagPlan::collect`] reads every entry, then
//! [`UntagPlan::apply`] rewrites them.

use crate::dataset::entry::{Entry, Variant};
use log::debug;
use std::collections::{BTreeSet, HashMap};

const KB_TAGS: [&str; 4] = ["dbr:", "dbo:", "dbp:", "dbc:"];

fn is_kb_token(word: &str) -> bool {
    word.get(..4).is_some_and(|head| KB_TAGS.contains(&head))
}

fn opaque(word: &str) -> String {
    word.replace(':', "_")
}

/// Literal KB tokens of a whitespace-tokenized text.
pub fn kb_tokens(text: &str) -> BTreeSet<&str> {
    text.split_whitespace().filter(|w| is_kb_token(w)).collect()
}

/// Rewrites every word of `text` found in `tokens` to its opaque form.
fn rewrite(text: &str, tokens: &BTreeSet<String>) -> String {
    text.split_whitespace()
        .map(|w| if tokens.contains(w) { opaque(w) } else { w.to_string() })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Untags the query tokens missing from the question. Returns the new query
/// and the tokens that were untagged.
pub fn untag_pair(question: &str, query: &str) -> (String, BTreeSet<String>) {
    let in_question = kb_tokens(question);
    let to_untag: BTreeSet<String> = kb_tokens(query)
        .into_iter()
        .filter(|t| !in_question.contains(t))
        .map(str::to_string)
        .collect();

    if to_untag.is_empty() {
        return (query.split_whitespace().collect::<Vec<_>>().join(" "), to_untag);
    }
    (rewrite(query, &to_untag), to_untag)
}

/// Untags one entry in place, on all three variants. Returns the number of
/// distinct tokens untagged.
pub fn untag_entry(entry: &mut Entry) -> usize {
    let mut count = 0;
    for variant in Variant::ALL {
        let (Some(question), Some(query)) = (entry.question.variant(variant), entry.query.variant(variant)) else {
            continue;
        };
        let (query, untagged) = untag_pair(question, query);
        count += untagged.len();
        entry.query.set_variant(variant, query);
    }
    count
}

/// Tokens to untag, per variant, across a whole dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UntagPlan {
    tokens: HashMap<Variant, BTreeSet<String>>,
}

impl UntagPlan {
    /// Phase one: gathers the unpredictable tokens of every entry without
    /// touching any of them.
    pub fn collect(entries: &[Entry]) -> Self {
        let mut tokens: HashMap<Variant, BTreeSet<String>> = HashMap::new();
        for entry in entries {
            for variant in Variant::ALL {
                let (Some(question), Some(query)) = (entry.question.variant(variant), entry.query.variant(variant))
                else {
                    continue;
                };
                let in_question = kb_tokens(question);
                let set = tokens.entry(variant).or_default();
                for token in kb_tokens(query) {
                    if !in_question.contains(token) {
                        set.insert(token.to_string());
                    }
                }
            }
        }
        Self { tokens }
    }

    pub fn tokens(&self, variant: Variant) -> Option<&BTreeSet<String>> {
        self.tokens.get(&variant)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.values().all(BTreeSet::is_empty)
    }

    /// Phase two: rewrites every occurrence of a planned token in the query
    /// variants of all entries.
    pub fn apply(&self, entries: &mut [Entry]) {
        for entry in entries {
            for variant in Variant::ALL {
                let Some(set) = self.tokens.get(&variant).filter(|s| !s.is_empty()) else {
                    continue;
                };
                if let Some(query) = entry.query.variant(variant) {
                    let query = rewrite(query, set);
                    entry.query.set_variant(variant, query);
                }
            }
        }
    }
}

/// Untags every entry; with `untag_all` the union of unpredictable tokens is
/// also untagged in entries where it was predictable.
pub fn untag_dataset(entries: &mut [Entry], untag_all: bool) -> UntagPlan {
    let plan = UntagPlan::collect(entries);
    if untag_all {
        plan.apply(entries);
    } else {
        for entry in entries.iter_mut() {
            untag_entry(entry);
        }
    }
    debug!(
        "Untag plan: {} tokens",
        plan.tokens.values().map(BTreeSet::len).sum::<usize>()
    );
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(question: &str, query: &str) -> Entry {
        let mut entry = Entry::new("1");
        for variant in Variant::ALL {
            entry.question.set_variant(variant, question.to_string());
            entry.query.set_variant(variant, query.to_string());
        }
        entry
    }

    #[test]
    fn test_untag_pair_only_touches_missing_tokens() {
        let (query, untagged) = untag_pair(
            "what books were dbp:writtenBy dbr:Michel_Tremblay ?",
            "select var_a where brack_open var_a dbp:writtenBy dbr:Michel_Tremblay sep_dot var_a rdf_type dbo:Book sep_dot brack_close",
        );
        assert_eq!(
            query,
            "select var_a where brack_open var_a dbp:writtenBy dbr:Michel_Tremblay sep_dot var_a rdf_type dbo_Book sep_dot brack_close"
        );
        assert_eq!(untagged.into_iter().collect::<Vec<_>>(), vec!["dbo:Book".to_string()]);
    }

    #[test]
    fn test_plan_applies_dataset_wide() {
        let mut entries = vec![
            entry("books by dbr:A ?", "var_a dbo:author dbr:A"),
            entry("dbo:author of dbr:B ?", "var_a dbo:author dbr:B"),
        ];
        let plan = UntagPlan::collect(&entries);
        assert!(plan.tokens(Variant::All).unwrap().contains("dbo:author"));

        plan.apply(&mut entries);
        assert_eq!(entries[1].query.uri_interm_sparql_all.as_deref(), Some("var_a dbo_author dbr:B"));
    }

    #[test]
    fn test_local_untag_keeps_other_entries() {
        let mut entries = vec![
            entry("books by dbr:A ?", "var_a dbo:author dbr:A"),
            entry("dbo:author of dbr:B ?", "var_a dbo:author dbr:B"),
        ];
        untag_dataset(&mut entries, false);
        assert_eq!(entries[0].query.uri_interm_sparql_all.as_deref(), Some("var_a dbo_author dbr:A"));
        assert_eq!(entries[1].query.uri_interm_sparql_all.as_deref(), Some("var_a dbo:author dbr:B"));
    }
}
