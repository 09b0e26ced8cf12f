//! Template assignment and slot bookkeeping.

use crate::config::{SlotRemoval, TemplateConfig};
use crate::dataset::entry::{Entry, TemplateId};
use crate::sources::BatchReport;
use crate::templates::template::{CompiledTemplate, TemplateLibrary};
use crate::{Error, Result};
use log::debug;

/// First template whose question regex and intermediary regex both match
/// the entry.
pub fn match_template<'a>(library: &'a TemplateLibrary, entry: &Entry) -> Result<&'a CompiledTemplate> {
    let no_match = || Error::NoMatchingTemplate { entry_id: entry.id.clone() };
    let question = entry.question.question.as_deref().ok_or_else(no_match)?;
    let interm = entry.query.interm_sparql.as_deref().ok_or_else(no_match)?;

    library
        .iter()
        .find(|t| t.matches_interm(interm) && t.matches_question(question))
        .ok_or_else(no_match)
}

/// Assigns a template id to every entry; entries without a match keep their
/// previous id and are reported.
pub fn assign_templates(library: &TemplateLibrary, entries: &mut [Entry]) -> BatchReport {
    let mut report = BatchReport::default();
    for entry in entries.iter_mut() {
        match match_template(library, entry) {
            Ok(template) => {
                entry.template_id = Some(template.id().clone());
                report.record_success();
            }
            Err(e) => report.record_failure(&entry.id, e),
        }
    }
    report
}

/// Slot values of `template` captured from a pure query.
pub fn extract_slots(template: &CompiledTemplate, entry_id: &str, pure: &str) -> Result<Vec<String>> {
    template
        .extract_slots(pure)
        .ok_or_else(|| Error::NoMatchingTemplate { entry_id: entry_id.to_string() })
}

/// Canonical id of a corpus template id.
pub fn canonical_template_id(config: &TemplateConfig, id: i64) -> i64 {
    config
        .id_aliases
        .iter()
        .find(|(from, _)| *from == id)
        .map_or(id, |(_, to)| *to)
}

/// Applies the table-driven slot-count corrections to a template's slot
/// tags, given the number of slots actually observed in the entry.
pub fn correct_slot_tags(config: &TemplateConfig, template_id: &TemplateId, tags: &[String], observed: usize) -> Vec<String> {
    let mut tags = tags.to_vec();
    let Some(id) = template_id.as_number() else {
        return tags;
    };
    let Some(correction) = config
        .slot_corrections
        .iter()
        .find(|c| c.template_id == id && c.observed == observed)
    else {
        return tags;
    };

    match correction.removal {
        SlotRemoval::First if !tags.is_empty() => {
            tags.remove(0);
        }
        SlotRemoval::Last => {
            tags.pop();
        }
        SlotRemoval::At(i) if i < tags.len() => {
            tags.remove(i);
        }
        _ => debug!("Slot correction {:?} does not apply to {} tags", correction.removal, tags.len()),
    }
    tags
}
