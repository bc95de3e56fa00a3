mod collect;
mod parse;
mod records;

pub use collect::load_dataset;
pub use records::{CategorySummary, Dataset, Item, ItemKind, ItemMode, PaperRecord};
