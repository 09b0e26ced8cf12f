//! Split sizes and KB vocabulary overlap between splits.

use crate::dataset::dataset::Dataset;
use crate::dataset::entry::{Entry, Split};
use crate::tagging::untag::kb_tokens;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatasetStats {
    pub total: usize,
    pub train: usize,
    pub valid: usize,
    pub test: usize,
    pub unassigned: usize,
    /// Distinct template ids
    pub templates: usize,
}

impl DatasetStats {
    pub fn compute(dataset: &Dataset) -> Self {
        let mut stats = Self { total: dataset.len(), ..Self::default() };
        let mut templates = BTreeSet::new();
        for entry in dataset.entries() {
            match entry.split {
                Some(Split::Train) => stats.train += 1,
                Some(Split::Valid) => stats.valid += 1,
                Some(Split::Test) => stats.test += 1,
                None => stats.unassigned += 1,
            }
            if let Some(id) = &entry.template_id {
                templates.insert(id.to_string());
            }
        }
        stats.templates = templates.len();
        stats
    }
}

impl fmt::Display for DatasetStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entries (train {}, valid {}, test {}, unassigned {}), {} templates",
            self.total, self.train, self.valid, self.test, self.unassigned, self.templates
        )
    }
}

fn question_kb_tokens<'a, I: IntoIterator<Item = &'a Entry>>(entries: I) -> BTreeSet<String> {
    entries
        .into_iter()
        .filter_map(|e| e.question.uri_question_all.as_deref())
        .flat_map(|q| kb_tokens(q).into_iter().map(str::to_string).collect::<Vec<_>>())
        .collect()
}

/// Share of the test split's KB tokens (in `uri_question_all`) also seen in
/// train. `None` when the test split has no KB tokens.
pub fn kb_intersection_rate<'a, I, J>(train: I, test: J) -> Option<f64>
where
    I: IntoIterator<Item = &'a Entry>,
    J: IntoIterator<Item = &'a Entry>,
{
    let in_train = question_kb_tokens(train);
    let in_test = question_kb_tokens(test);
    if in_test.is_empty() {
        return None;
    }
    let unseen = in_test.difference(&in_train).count();
    Some(1.0 - unseen as f64 / in_test.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::entry::TemplateId;

    fn entry(id: &str, split: Split, question: &str) -> Entry {
        let mut entry = Entry::new(id);
        entry.split = Some(split);
        entry.template_id = Some(TemplateId::Number(1));
        entry.question.uri_question_all = Some(question.to_string());
        entry
    }

    #[test]
    fn test_counts() {
        let data = Dataset::from_entries(vec![
            entry("1", Split::Train, "a"),
            entry("2", Split::Train, "b"),
            entry("3", Split::Test, "c"),
        ]);
        let stats = DatasetStats::compute(&data);
        assert_eq!((stats.train, stats.valid, stats.test, stats.templates), (2, 0, 1, 1));
    }

    #[test]
    fn test_intersection_rate() {
        let train = vec![entry("1", Split::Train, "where is dbr:Paris ? dbo:country")];
        let test = vec![entry("2", Split::Test, "where is dbr:Paris ? dbr:Lyon dbo:country dbo:city")];
        let rate = kb_intersection_rate(&train, &test).unwrap();
        assert!((rate - 0.5).abs() < 1e-9);
        assert_eq!(kb_intersection_rate(&train, &Vec::<Entry>::new()), None);
    }
}
