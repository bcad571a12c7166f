//! Document ingestion: PDF extraction, normalization and chunking

mod chunker;
mod normalize;
mod parser;
mod processor;
pub mod validation;

pub use chunker::{TextChunker, DEFAULT_SEPARATORS};
pub use normalize::normalize_text;
pub use parser::{PdfExtractor, PdfTextExtractor};
pub use processor::{IngestPipeline, IngestedDocument};
pub use validation::{sanitize_filename, validate_upload};
