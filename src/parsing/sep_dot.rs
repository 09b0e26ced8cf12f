//! Trailing-dot decision for knowledge-base references.
//!
//! The corpora glue clause separators onto entity names (`dbr_Foo.`) while
//! also containing names that legitimately end with a dot (`dbr_Cand.theol.`).
//! The checks below run in a fixed order and the first one that applies wins.

use crate::config::SepDotRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailingDot {
    /// The dot, if any, belongs to the name
    Keep,
    /// The dot is a clause separator
    Separator,
}

/// Classifies the trailing dot of an intermediary-spelled reference.
pub fn classify(entity: &str, rules: &SepDotRules) -> TrailingDot {
    let e = entity.trim();
    let Some(body) = e.strip_suffix('.') else {
        return TrailingDot::Keep;
    };

    if rules.exceptions_keep.iter().any(|x| x == e) {
        return TrailingDot::Keep;
    }

    let last_underscore = e.rsplit('_').next().unwrap_or(e);
    let last_underscore_lower = last_underscore.to_lowercase();
    let before_dot_numeric = body.chars().last().is_some_and(char::is_numeric);

    if before_dot_numeric || rules.ends_replace.iter().any(|x| *x == last_underscore_lower) {
        return TrailingDot::Separator;
    }

    let last_dot_segment = body.rsplit('.').next().unwrap_or(body);
    if last_dot_segment.chars().count() <= 4 {
        return TrailingDot::Keep;
    }

    if last_underscore.chars().count() <= 4 || rules.ends_keep.iter().any(|x| *x == last_underscore_lower) {
        return TrailingDot::Keep;
    }

    TrailingDot::Separator
}

/// Rewrites one matched reference, padding it with spaces, and turning a
/// separator dot into ` sep_dot `.
pub fn correct(matched: &str, rules: &SepDotRules) -> String {
    let e = matched.trim();
    match classify(e, rules) {
        TrailingDot::Separator => format!(" {} sep_dot ", &e[..e.len() - 1]),
        TrailingDot::Keep => format!(" {} ", matched),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decide(entity: &str) -> TrailingDot {
        classify(entity, &SepDotRules::default())
    }

    #[test]
    fn test_no_trailing_dot() {
        assert_eq!(decide("dbr_J._K._Rowling"), TrailingDot::Keep);
    }

    #[test]
    fn test_explicit_exception_wins() {
        assert_eq!(decide("dbr_Cand.theol."), TrailingDot::Keep);
    }

    #[test]
    fn test_numeric_and_replace_suffix() {
        assert_eq!(decide("dbr_Apollo_11."), TrailingDot::Separator);
        assert_eq!(decide("dbr_Hip_hop."), TrailingDot::Separator);
    }

    #[test]
    fn test_short_segments_belong_to_name() {
        assert_eq!(decide("dbr_Washington,_D.C."), TrailingDot::Keep);
        assert_eq!(decide("dbr_Warner_Bros."), TrailingDot::Keep);
        assert_eq!(decide("dbr_Example_Dept."), TrailingDot::Keep);
    }

    #[test]
    fn test_long_final_word_is_separator() {
        assert_eq!(decide("dbr_Stephen_Hawking."), TrailingDot::Separator);
        assert_eq!(correct("dbr_Stephen_Hawking. ", &SepDotRules::default()), " dbr_Stephen_Hawking sep_dot ");
    }
}
