#![deny(missing_docs)]
//! Conversation compactor: splits old history into fixed-size chunks,
//! fold-in summarizes them, archives the summaries as memory blocks, deletes
//! the source messages, and rebuilds a clip-archive system message showing
//! the earliest and most recent summary batches.

mod batch;
mod chunk;
mod clip;
mod compactor;
mod config;
mod counter;
mod prompts;
mod split;

pub use batch::{SummaryBatch, BATCH_LABEL_PREFIX};
pub use compactor::Compactor;
pub use config::{CompactionConfig, CompactionResult};
pub use counter::TokenCounter;

pub use chunk::chunk_messages;
pub use clip::build_clip_archive;
pub use split::{split_history, SplitHistory};
