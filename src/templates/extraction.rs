//! Abstraction of concrete queries into template skeletons.

use crate::core::{KbClass, PlaceholderTable};
use crate::dataset::entry::{Entry, TemplateId};
use crate::templates::template::Template;
use std::collections::HashMap;

fn kb_class_of_word(word: &str) -> Option<KbClass> {
    let prefix = word.get(..3)?;
    let sep = word.get(3..4)?;
    if sep != ":" && sep != "_" {
        return None;
    }
    match prefix.to_lowercase().as_str() {
        p @ ("dbr" | "dbp" | "dbc" | "dbo") => KbClass::from_prefix(p),
        _ => None,
    }
}

/// Replaces every KB reference of a pure or intermediary query with a
/// class placeholder. Repeated references share a placeholder; further
/// references of the same class are numbered (`<resource_2>`). Words in
/// `keep`, in either spelling, stay as they are.
pub fn abstract_query(query: &str, keep: &[String]) -> String {
    let table = PlaceholderTable;
    let mut assigned: HashMap<String, String> = HashMap::new();
    let mut per_class: HashMap<KbClass, usize> = HashMap::new();
    let mut out: Vec<String> = Vec::new();
    let mut words = query.split_whitespace().peekable();

    while let Some(word) = words.next() {
        let Some(class) = kb_class_of_word(word) else {
            out.push(word.to_string());
            continue;
        };

        let lower = word.to_lowercase();
        if keep.iter().any(|k| {
            let k = k.to_lowercase();
            k == lower || k.replacen(':', "_", 1) == lower
        }) {
            out.push(word.to_string());
            continue;
        }

        // an intermediary entity name continues through its parenthesised parts
        let mut reference = word.to_string();
        while words.peek() == Some(&"attr_open") {
            for part in words.by_ref() {
                reference.push(' ');
                reference.push_str(part);
                if part == "attr_close" {
                    break;
                }
            }
        }

        let key = reference.replacen(':', "_", 1);
        let placeholder = assigned
            .entry(key)
            .or_insert_with(|| {
                let n = per_class.entry(class).or_insert(0);
                *n += 1;
                if *n == 1 {
                    table.placeholder(class)
                } else {
                    format!("<{}_{}>", class.placeholder_name(), n)
                }
            })
            .clone();
        out.push(placeholder);
    }

    out.join(" ")
}

/// Abstracts every entry and keeps one template per distinct intermediary
/// skeleton, numbered from 1 in order of first appearance.
pub fn derive_templates(entries: &[Entry], keep: &[String]) -> Vec<Template> {
    let mut templates: Vec<Template> = Vec::new();

    for entry in entries {
        let (Some(interm), Some(pure)) = (entry.query.interm_sparql.as_deref(), entry.query.pure_sparql.as_deref())
        else {
            continue;
        };
        let interm_template = abstract_query(interm, keep);
        if templates.iter().any(|t| t.interm_sparql_template == interm_template) {
            continue;
        }
        templates.push(
            Template {
                id: TemplateId::Name((templates.len() + 1).to_string()),
                interm_sparql_template: interm_template,
                pure_sparql_template: abstract_query(pure, keep),
                question_example: entry.question.question.clone(),
                ..Template::default()
            }
            .with_generated_regexes(),
        );
    }

    templates
}
