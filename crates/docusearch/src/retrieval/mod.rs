//! Vector index and ranking

pub mod index;
pub mod mmr;
pub mod store;

pub use index::{ScoredChunk, SearchMode, VectorIndex};
pub use mmr::{cosine_similarity, maximal_marginal_relevance};
pub use store::IndexStore;
