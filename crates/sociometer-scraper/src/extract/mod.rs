//! Content extraction: ordered fallback strategies per field, run against a
//! page snapshot or an individual post container.

mod chain;
mod fields;
mod node;
mod page;
mod parse;
pub mod strategies;

pub use chain::{Extracted, FieldChain};
pub use fields::{ExtractedPost, PostFieldChains};
pub use node::{discover_posts, PostNode};
pub use page::PageState;
pub use parse::{parse_count, parse_timestamp, LabeledCount};
pub use strategies::{NodeChain, PageChain};
