//! Document processing: word chunking and recursive reduction.

pub mod chunking;
mod reduce;
pub mod types;

pub use chunking::{WordChunks, chunk_text};
pub use reduce::{RecursiveReducer, SUMMARY_SEPARATOR};
pub use types::{Chunk, ChunkSet, ChunkingError, ReduceError, ReductionReport};
