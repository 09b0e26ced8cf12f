#[allow(clippy::module_inception)]
pub mod dataset;
pub mod entry;
pub mod loaders;
pub mod stats;

pub use dataset::{Dataset, SplitRatios};
pub use entry::{Entry, QueryRecord, QuestionRecord, Split, TemplateId, Variant};
pub use stats::{kb_intersection_rate, DatasetStats};
