pub mod question_tagger;
pub mod uri_tagger;
pub mod untag;

pub use question_tagger::{tag_question, LabelSlot, UriSlot};
pub use untag::{kb_tokens, untag_dataset, untag_entry, UntagPlan};
pub use uri_tagger::UriTagger;
