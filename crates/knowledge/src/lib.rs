//! Document question-answering pipeline for EasyDocs.
//!
//! Uploaded PDFs are extracted, split into overlapping chunks, embedded,
//! and written to a hybrid search index. Questions are embedded, matched
//! against the index, and answered by a completion model that is only
//! allowed to use the retrieved chunks.
//!
//! ```text
//! upload:   Document → parser → RecursiveChunker → Embedder → IndexClient
//! question: text → Retriever (Embedder + IndexClient) → AnswerOrchestrator
//! ```

pub mod chunker;
pub mod embeddings;
pub mod ingest;
pub mod parser;
pub mod pipeline;
pub mod rag;
pub mod retrieval;
pub mod search;
pub mod session;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use chunker::RecursiveChunker;
pub use embeddings::{Embedder, EmbeddingProvider};
pub use ingest::{DocumentIngest, Ingestor};
pub use pipeline::Pipeline;
pub use rag::{Answer, AnswerOrchestrator, Simplifier, NOT_FOUND_ANSWER};
pub use retrieval::{Retriever, DEFAULT_TOP_K};
pub use search::{IndexClient, SearchIndex, UpsertReport};
pub use session::{FileUpload, InboundEvent, Mode, Session, SessionSurface, UploadPolicy};
pub use types::{Chunk, Document, IndexRecord, IngestReport, RetrievedContext};
