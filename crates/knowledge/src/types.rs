//! Core data types for the document pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// An uploaded document, as received from the session surface.
#[derive(Debug, Clone)]
pub struct Document {
    /// File name as supplied by the user (used as the chunk title)
    pub name: String,

    /// Raw file contents
    pub bytes: Vec<u8>,

    /// Declared or detected MIME type
    pub mime_type: String,
}

impl Document {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Hex-encoded SHA-256 of the file contents.
    pub fn digest(&self) -> String {
        let hash = Sha256::digest(&self.bytes);
        hash.iter().map(|b| format!("{:02x}", b)).collect()
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// A contiguous piece of document text prepared for embedding.
///
/// `text` starts with the last `overlap` characters of the text that
/// precedes the chunk's own content, so dropping that prefix from every
/// chunk but the first and concatenating yields the original text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position in the document (0-based)
    pub index: u32,

    /// Chunk text, including the overlap prefix
    pub text: String,

    /// Title of the source document
    pub title: String,

    /// Character offset where `text` begins in the source text
    pub start: usize,

    /// Number of leading characters repeated from the previous chunk
    pub overlap: usize,
}

impl Chunk {
    /// Chunk text without the overlap prefix.
    pub fn own_text(&self) -> &str {
        match self.text.char_indices().nth(self.overlap) {
            Some((offset, _)) => &self.text[offset..],
            None if self.overlap == 0 => &self.text,
            None => "",
        }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A chunk paired with its identity and (possibly missing) vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    /// Unique record identifier, assigned at ingestion
    pub id: String,

    pub title: String,

    pub content: String,

    /// `None` when the embedding provider did not return a vector
    pub vector: Option<Vec<f32>>,
}

impl IndexRecord {
    /// Build a record for a chunk with a freshly generated id.
    ///
    /// Every call produces a new id, so ingesting the same document twice
    /// appends a second set of records.
    pub fn from_chunk(chunk: &Chunk, vector: Option<Vec<f32>>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: chunk.title.clone(),
            content: chunk.text.clone(),
            vector,
        }
    }
}

/// The chunks selected for one question, in rank order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievedContext {
    pub query: String,
    pub chunks: Vec<String>,
}

impl RetrievedContext {
    pub fn new(query: impl Into<String>, chunks: Vec<String>) -> Self {
        Self {
            query: query.into(),
            chunks,
        }
    }

    pub fn empty(query: impl Into<String>) -> Self {
        Self::new(query, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Chunks joined in rank order with blank lines between them.
    pub fn joined(&self) -> String {
        self.chunks.join("\n\n")
    }
}

/// Outcome of ingesting a single document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    /// Document title (file name)
    pub title: String,

    /// Hex SHA-256 of the uploaded bytes
    pub digest: String,

    /// Number of chunks produced by the chunker
    pub chunks: usize,

    /// Ids of records the index accepted
    pub written: Vec<String>,

    /// Ids of records dropped locally because they had no vector
    pub skipped: Vec<String>,

    /// Ids the index rejected, with the reason it gave
    pub failed: Vec<(String, String)>,

    pub ingested_at: DateTime<Utc>,

    pub duration_secs: f64,
}

impl IngestReport {
    /// True when every chunk was written.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.failed.is_empty() && self.written.len() == self.chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str, overlap: usize) -> Chunk {
        Chunk {
            index: 1,
            text: text.to_string(),
            title: "lease.pdf".to_string(),
            start: 0,
            overlap,
        }
    }

    #[test]
    fn test_document_digest_is_stable_hex() {
        let doc = Document::new("a.pdf", b"abc".to_vec(), "application/pdf");
        assert_eq!(
            doc.digest(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(doc.size_bytes(), 3);
    }

    #[test]
    fn test_own_text_skips_overlap_chars() {
        assert_eq!(chunk("héllo world", 6).own_text(), "world");
        assert_eq!(chunk("hello", 0).own_text(), "hello");
        assert_eq!(chunk("hi", 2).own_text(), "");
    }

    #[test]
    fn test_records_from_same_chunk_get_distinct_ids() {
        let c = chunk("text", 0);
        let a = IndexRecord::from_chunk(&c, None);
        let b = IndexRecord::from_chunk(&c, None);
        assert_ne!(a.id, b.id);
        assert_eq!(a.content, b.content);
    }

    #[test]
    fn test_context_joins_with_blank_lines() {
        let ctx = RetrievedContext::new("q", vec!["one".to_string(), "two".to_string()]);
        assert_eq!(ctx.joined(), "one\n\ntwo");
        assert_eq!(ctx.len(), 2);
        assert!(RetrievedContext::empty("q").is_empty());
    }
}
