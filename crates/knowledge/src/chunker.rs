//! Semantic text chunking with configurable size and overlap.
//!
//! Window boundaries come from `text-splitter`, which prefers the coarsest
//! semantic level that fits: paragraphs, then lines, sentences, words and
//! finally graphemes. Windows hold at most `size - overlap` characters and
//! each one is prefixed with the last `overlap` characters before it.
//!
//! Sizes are counted in characters, not bytes.

use crate::types::Chunk;
use easydocs_core::config::ChunkingSettings;
use easydocs_core::{AppError, AppResult};
use text_splitter::{ChunkConfig, TextSplitter};

/// Splits document text into overlapping chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecursiveChunker {
    size: usize,
    overlap: usize,
}

impl RecursiveChunker {
    /// Create a chunker.
    ///
    /// # Errors
    /// Returns `AppError::Config` when `size` is zero or `overlap >= size`.
    pub fn new(size: usize, overlap: usize) -> AppResult<Self> {
        if size == 0 {
            return Err(AppError::Config(
                "Chunk size must be greater than zero".to_string(),
            ));
        }
        if overlap >= size {
            return Err(AppError::Config(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, size
            )));
        }
        Ok(Self { size, overlap })
    }

    pub fn from_settings(settings: &ChunkingSettings) -> AppResult<Self> {
        Self::new(settings.size, settings.overlap)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Characters of new text each chunk contributes.
    fn window(&self) -> usize {
        self.size - self.overlap
    }

    /// Split `text` into chunks tagged with `title`.
    ///
    /// Returns an empty vector for empty input. Every chunk is at most
    /// `size` characters long unless a single grapheme cluster exceeds the
    /// window.
    pub fn chunk(&self, title: &str, text: &str) -> Vec<Chunk> {
        if text.is_empty() {
            return Vec::new();
        }

        let windows = split_windows(text, self.window());

        let mut chunks = Vec::with_capacity(windows.len());
        let mut start_byte = 0;
        let mut start_char = 0;

        for (index, window) in windows.into_iter().enumerate() {
            let overlap = self.overlap.min(start_char);
            let prefix = tail_chars(&text[..start_byte], overlap);

            chunks.push(Chunk {
                index: index as u32,
                text: format!("{}{}", prefix, window),
                title: title.to_string(),
                start: start_char - overlap,
                overlap,
            });

            start_byte += window.len();
            start_char += window.chars().count();
        }

        tracing::debug!(
            "Chunked '{}' into {} chunks (size {}, overlap {})",
            title,
            chunks.len(),
            self.size,
            self.overlap
        );

        chunks
    }
}

/// Last `n` characters of `text`.
fn tail_chars(text: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match text.char_indices().rev().nth(n - 1) {
        Some((offset, _)) => &text[offset..],
        None => text,
    }
}

/// Contiguous windows of at most `budget` characters that tile `text`.
///
/// Windows are cut at the byte offsets reported by the splitter, so the
/// text between two offsets always lands in exactly one window.
fn split_windows(text: &str, budget: usize) -> Vec<&str> {
    let splitter = TextSplitter::new(ChunkConfig::new(budget).with_trim(false));

    let mut starts: Vec<usize> = splitter
        .chunk_indices(text)
        .map(|(offset, _)| offset)
        .filter(|&offset| offset > 0 && offset < text.len())
        .collect();
    starts.dedup();

    let mut windows = Vec::with_capacity(starts.len() + 1);
    let mut start = 0;
    for end in starts {
        if end > start {
            windows.push(&text[start..end]);
            start = end;
        }
    }
    windows.push(&text[start..]);
    windows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reconstruct(chunks: &[Chunk]) -> String {
        let mut out = String::new();
        for chunk in chunks {
            out.push_str(chunk.own_text());
        }
        out
    }

    fn sample_contract() -> String {
        let mut text = String::new();
        for section in 1..=12 {
            text.push_str(&format!("Section {}. Obligations of the parties.\n\n", section));
            for clause in 1..=6 {
                text.push_str(&format!(
                    "The Lessee shall pay clause {} of section {} within thirty days. \
                     Late payment accrues interest at the statutory rate! Is notice required? \
                     Yes, in writing.\n",
                    clause, section
                ));
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_rejects_invalid_configuration() {
        assert!(matches!(
            RecursiveChunker::new(0, 0),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            RecursiveChunker::new(100, 100),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            RecursiveChunker::new(100, 150),
            Err(AppError::Config(_))
        ));
        assert!(RecursiveChunker::new(100, 99).is_ok());
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        let chunker = RecursiveChunker::new(1000, 200).unwrap();
        assert!(chunker.chunk("empty.pdf", "").is_empty());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunker = RecursiveChunker::new(1000, 200).unwrap();
        let chunks = chunker.chunk("short.pdf", "A short agreement.");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "A short agreement.");
        assert_eq!(chunks[0].overlap, 0);
        assert_eq!(chunks[0].title, "short.pdf");
    }

    #[test]
    fn test_reconstruction_across_configurations() {
        let texts = vec![
            sample_contract(),
            "word ".repeat(700),
            "x".repeat(2_345),
            "שלום עולם. הסכם שכירות בין הצדדים! ".repeat(80),
            "line one\nline two\n\n\n\nline three\n".repeat(50),
        ];

        for (size, overlap) in [(1000, 200), (100, 20), (50, 0), (7, 3), (2, 1)] {
            let chunker = RecursiveChunker::new(size, overlap).unwrap();
            for text in &texts {
                let chunks = chunker.chunk("doc.pdf", text);
                assert_eq!(&reconstruct(&chunks), text, "size={} overlap={}", size, overlap);
            }
        }
    }

    #[test]
    fn test_chunks_respect_size_and_overlap() {
        let chunker = RecursiveChunker::new(300, 60).unwrap();
        let text = sample_contract();
        let chunks = chunker.chunk("lease.pdf", &text);

        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index as usize, i);
            assert!(chunk.char_len() <= 300, "chunk {} too long", i);
        }

        for pair in chunks.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            let preceding = next.start + next.overlap;
            assert_eq!(next.overlap, 60.min(preceding));
            assert_eq!(preceding, prev.start + prev.char_len());
            let prefix: String = next.text.chars().take(next.overlap).collect();
            assert!(prev.text.ends_with(&prefix));
        }
    }

    #[test]
    fn test_start_offsets_point_into_source() {
        let chunker = RecursiveChunker::new(40, 10).unwrap();
        let text = "The tenant pays rent monthly. The landlord repairs the roof. \
                    Either party may terminate with notice.";
        let chars: Vec<char> = text.chars().collect();

        for chunk in chunker.chunk("t.pdf", text) {
            let len = chunk.char_len();
            let slice: String = chars[chunk.start..chunk.start + len].iter().collect();
            assert_eq!(slice, chunk.text);
        }
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let first = "First paragraph about payment terms.";
        let second = "Second paragraph about termination rights.";
        let text = format!("{}\n\n{}", first, second);

        let chunker = RecursiveChunker::new(60, 10).unwrap();
        let chunks = chunker.chunk("p.pdf", &text);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text.trim_end(), first);
        assert!(chunks[1].own_text().trim_start().starts_with("Second paragraph"));
    }

    #[test]
    fn test_hard_split_keeps_graphemes_whole() {
        let chunker = RecursiveChunker::new(4, 1).unwrap();
        let text = "e\u{301}e\u{301}e\u{301}e\u{301}";
        let chunks = chunker.chunk("g.pdf", text);

        assert_eq!(reconstruct(&chunks), text);
        for chunk in &chunks {
            assert!(!chunk.own_text().starts_with('\u{301}'));
        }
    }

    #[test]
    fn test_chunking_is_repeatable() {
        let chunker = RecursiveChunker::new(120, 30).unwrap();
        let text = sample_contract();
        assert_eq!(chunker.chunk("a", &text), chunker.chunk("a", &text));
    }

    #[test]
    fn test_long_single_paragraph_chunks_in_linear_time() {
        let chunker = RecursiveChunker::new(1000, 200).unwrap();
        let text = "The tenant shall pay rent. ".repeat(20_000);

        let started = std::time::Instant::now();
        let chunks = chunker.chunk("long.pdf", &text);
        let elapsed = started.elapsed();

        assert!(chunks.len() > 500);
        assert_eq!(reconstruct(&chunks), text);
        assert!(
            elapsed < std::time::Duration::from_secs(30),
            "chunking 540 KB took {:?}",
            elapsed
        );
    }

    #[test]
    fn test_single_line_without_separators() {
        let chunker = RecursiveChunker::new(500, 100).unwrap();
        let text = "x".repeat(20_000);
        let chunks = chunker.chunk("blob.pdf", &text);

        assert_eq!(reconstruct(&chunks), text);
        assert!(chunks.iter().all(|c| c.char_len() <= 500));
    }
}
