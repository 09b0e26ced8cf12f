//! Best-effort repair of crowd-sourced questions.

use crate::config::QuestionRules;
use crate::Result;
use log::debug;
use regex::Regex;

pub struct QuestionNormalizer {
    rules: QuestionRules,
    whitespace: Regex,
}

impl QuestionNormalizer {
    pub fn new() -> Result<Self> {
        Self::with_rules(QuestionRules::default())
    }

    pub fn with_rules(rules: QuestionRules) -> Result<Self> {
        Ok(Self { rules, whitespace: Regex::new(r"\s+")? })
    }

    /// Lowercases, repairs known typos and forces a single trailing ` ?`.
    ///
    /// Never fails. Empty input comes back as the partially corrected text.
    pub fn correct(&self, raw: &str) -> String {
        let mut q = raw.to_lowercase().trim().to_string();

        for (typo, fix) in &self.rules.typo_fixes {
            q = q.replace(typo.as_str(), fix);
        }
        q = q.replace("\\\"", " \\\" ");
        for removal in &self.rules.removals {
            q = q.replace(removal.as_str(), "");
        }

        if q.is_empty() {
            debug!("Question '{}' is empty after correction", raw);
            return q;
        }

        if let Some(rest) = q.strip_prefix('?') {
            q = format!("{}?", rest);
        }
        q = q.replace(" jr ", " jr. ").replace(" sr ", " sr. ");

        // only the first sentence is kept
        if let Some(idx) = q.find('?') {
            q.truncate(idx);
        }
        if q.is_empty() {
            debug!("Question '{}' has no text before its question mark", raw);
            return q;
        }

        if q.ends_with('.') || q.ends_with('/') {
            q.pop();
            q.push('?');
        }
        if !q.ends_with('?') {
            q.push_str(" ? ");
        }

        q = q.replace('?', " ? ");
        self.collapse(&q)
    }

    /// Corrected intermediary question with possessives and commas split
    /// off and the label brackets removed.
    pub fn untagged_question(&self, intermediary: &str) -> String {
        let q = self.correct(intermediary).replace("'s", " 's ").replace(',', " , ").replace(['<', '>'], "");
        self.collapse(&q)
    }

    fn collapse(&self, text: &str) -> String {
        self.whitespace.replace_all(text, " ").trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> QuestionNormalizer {
        QuestionNormalizer::new().unwrap()
    }

    #[test]
    fn test_adds_question_mark() {
        assert_eq!(normalizer().correct("Where is the Eiffel Tower"), "where is the eiffel tower ?");
        assert_eq!(normalizer().correct("Name the capital of France."), "name the capital of france ?");
    }

    #[test]
    fn test_drops_text_after_first_question_mark() {
        assert_eq!(normalizer().correct("Who wrote Dune? And when?"), "who wrote dune ?");
    }

    #[test]
    fn test_leading_question_mark_moves_to_end() {
        assert_eq!(normalizer().correct("?who is the mayor of paris"), "who is the mayor of paris ?");
    }

    #[test]
    fn test_typos_and_suffixes() {
        assert_eq!(normalizer().correct("Whihc company did martin luther king jr work for?"), "which company did martin luther king jr. work for ?");
        assert_eq!(normalizer().correct("what is the palce of birth od micheal jordan"), "what is the place of birth of michael jordan ?");
    }

    #[test]
    fn test_empty_input_is_passed_through() {
        assert_eq!(normalizer().correct("   "), "");
        assert_eq!(normalizer().correct("?"), "");
    }

    #[test]
    fn test_untagged_question() {
        assert_eq!(
            normalizer().untagged_question("What is the <birth place> of <Kylie Minogue>'s sister, <Dannii>?"),
            "what is the birth place of kylie minogue 's sister , dannii ?"
        );
    }
}
