//! Core types for documents, chunks, requests and responses

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, ChunkSource, Document, Page};
pub use query::{QueryRequest, RemoveFileRequest, WorkspaceParams};
pub use response::{
    IndexReport, IndexStats, QueryResult, RemovalResult, RemoveFileResponse, SourceRef,
    StatusResponse, UploadResponse,
};
