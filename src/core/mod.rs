//! Core data structures shared by the normalizer, the tagging engine and the
//! template matcher.

use serde::{Deserialize, Serialize};

pub mod encoding;
pub use encoding::*;

/// `rdf:type` as it appears in raw corpus queries.
pub const SPARQL_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

/// The four switchable knowledge-base reference classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KbClass {
    Resource,
    Property,
    Category,
    Ontology,
}

impl KbClass {
    pub const ALL: [KbClass; 4] =
        [KbClass::Resource, KbClass::Property, KbClass::Category, KbClass::Ontology];

    /// Short prefix without separator (`dbr`, `dbp`, `dbc`, `dbo`).
    pub fn prefix(self) -> &'static str {
        match self {
            KbClass::Resource => "dbr",
            KbClass::Property => "dbp",
            KbClass::Category => "dbc",
            KbClass::Ontology => "dbo",
        }
    }

    /// Full namespace IRI for this class.
    pub fn namespace(self) -> &'static str {
        match self {
            KbClass::Resource => "http://dbpedia.org/resource/",
            KbClass::Property => "http://dbpedia.org/property/",
            KbClass::Category => "http://dbpedia.org/resource/Category:",
            KbClass::Ontology => "http://dbpedia.org/ontology/",
        }
    }

    /// Name used inside template placeholders (`<resource>`, `<ontology>`...).
    pub fn placeholder_name(self) -> &'static str {
        match self {
            KbClass::Resource => "resource",
            KbClass::Property => "property",
            KbClass::Category => "category",
            KbClass::Ontology => "ontology",
        }
    }

    /// Maps a prefix (`dbr`, `res`, `dbo`...) to its class.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "dbr" | "res" => Some(KbClass::Resource),
            "dbp" => Some(KbClass::Property),
            "dbc" => Some(KbClass::Category),
            "dbo" => Some(KbClass::Ontology),
            _ => None,
        }
    }

    /// Splits a KB reference into its class and local name.
    ///
    /// Accepts full IRIs (with or without angle brackets), pure prefixed names
    /// (`dbr:Paris`) and intermediary tokens (`dbr_Paris`). Category IRIs are
    /// checked before resource IRIs since they share a namespace root.
    pub fn classify(fragment: &str) -> Option<(KbClass, &str)> {
        let inner = fragment
            .strip_prefix('<')
            .and_then(|f| f.strip_suffix('>'))
            .unwrap_or(fragment);

        for class in [KbClass::Category, KbClass::Resource, KbClass::Property, KbClass::Ontology] {
            if let Some(local) = inner.strip_prefix(class.namespace()) {
                return Some((class, local));
            }
        }

        let idx = inner.find([':', '_'])?;
        let (prefix, local) = (&inner[..idx], &inner[idx + 1..]);
        if prefix == "res" && !inner[idx..].starts_with(':') {
            return None;
        }
        KbClass::from_prefix(prefix).map(|class| (class, local))
    }
}

/// Per-class switches deciding whether a KB reference keeps its literal
/// prefixed form (`dbo:Place`) or is rendered opaque (`dbo_Place`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFlags {
    pub resource: bool,
    pub property: bool,
    pub category: bool,
    pub ontology: bool,
}

impl TagFlags {
    pub fn all() -> Self {
        Self { resource: true, property: true, category: true, ontology: true }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn only_resources() -> Self {
        Self { resource: true, ..Self::none() }
    }

    pub fn rest_no_resources() -> Self {
        Self { resource: false, ..Self::all() }
    }

    pub fn allows(&self, class: KbClass) -> bool {
        match class {
            KbClass::Resource => self.resource,
            KbClass::Property => self.property,
            KbClass::Category => self.category,
            KbClass::Ontology => self.ontology,
        }
    }
}

/// The three standard tagging configurations of one query or question.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriVariants {
    pub all: String,
    pub only_resources: String,
    pub rest_no_resources: String,
}

impl UriVariants {
    /// The flag set used to produce each variant, in field order.
    pub fn flag_sets() -> [TagFlags; 3] {
        [TagFlags::all(), TagFlags::only_resources(), TagFlags::rest_no_resources()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_forms() {
        assert_eq!(KbClass::classify("dbr:Paris"), Some((KbClass::Resource, "Paris")));
        assert_eq!(KbClass::classify("dbo_Place"), Some((KbClass::Ontology, "Place")));
        assert_eq!(
            KbClass::classify("<http://dbpedia.org/resource/Category:Poets>"),
            Some((KbClass::Category, "Poets"))
        );
        assert_eq!(
            KbClass::classify("http://dbpedia.org/property/height"),
            Some((KbClass::Property, "height"))
        );
        assert_eq!(KbClass::classify("res:Berlin"), Some((KbClass::Resource, "Berlin")));
        assert_eq!(KbClass::classify("rdf:type"), None);
        assert_eq!(KbClass::classify("var_x"), None);
    }

    #[test]
    fn test_flag_presets() {
        let only = TagFlags::only_resources();
        assert!(only.allows(KbClass::Resource));
        assert!(!only.allows(KbClass::Ontology));

        let rest = TagFlags::rest_no_resources();
        assert!(!rest.allows(KbClass::Resource));
        assert!(rest.allows(KbClass::Category));
    }
}
