//! Text chunking with boundary-preferring cuts and exact overlap
//!
//! Chunks are contiguous slices of the input text, each carrying its byte
//! offsets. A successor chunk starts exactly `overlap` bytes before its
//! predecessor's end (snapped down to a char boundary), so the overlap
//! invariant holds by construction and chunking is fully deterministic.

use unicode_segmentation::UnicodeSegmentation;

use crate::error::{Error, Result};

/// A chunk of text with its position in the source
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkSpan {
    /// 0-based position within the document
    pub index: u32,
    /// The chunk text, equal to `&source[start..end]`
    pub content: String,
    /// Byte offset of the chunk start (char boundary)
    pub start: usize,
    /// Byte offset one past the chunk end (char boundary)
    pub end: usize,
}

/// Splits text into overlapping chunks, cutting at paragraph breaks,
/// then sentence boundaries, then word boundaries within the size budget.
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    /// Create a chunker. Fails when `chunk_size` is zero or `overlap` is not
    /// smaller than `chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::config("chunk_size must be greater than zero"));
        }
        if overlap >= chunk_size {
            return Err(Error::config(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self { chunk_size, overlap })
    }

    /// Split `text` into ordered chunks. Blank input is an error.
    pub fn chunk(&self, text: &str) -> Result<Vec<ChunkSpan>> {
        if text.trim().is_empty() {
            return Err(Error::empty_input("cannot chunk empty text"));
        }

        let len = text.len();
        let mut spans = Vec::new();
        let mut start = 0usize;
        let mut index = 0u32;

        while start < len {
            let end = self.cut_point(text, start);
            spans.push(ChunkSpan {
                index,
                content: text[start..end].to_string(),
                start,
                end,
            });
            if end >= len {
                break;
            }

            let mut next = floor_char(text, end.saturating_sub(self.overlap));
            if next <= start {
                // Degenerate geometry (tiny chunks of wide chars); drop the
                // overlap rather than stall.
                next = end;
            }
            start = next;
            index += 1;
        }

        Ok(spans)
    }

    /// Choose where the chunk starting at `start` ends. Prefers the last
    /// paragraph break in the window, then the last sentence boundary, then
    /// the last word boundary; falls back to a hard cut at the size limit.
    /// Every candidate must leave more than `overlap` bytes behind it so the
    /// next chunk makes forward progress.
    fn cut_point(&self, text: &str, start: usize) -> usize {
        let len = text.len();
        if len - start <= self.chunk_size {
            return len;
        }

        let hard_end = floor_char(text, start + self.chunk_size);
        if hard_end <= start {
            return ceil_char(text, start + 1);
        }
        let window = &text[start..hard_end];
        let min_advance = self.overlap;

        if let Some(pos) = window.rfind("\n\n") {
            let cut = pos + 2;
            if cut > min_advance {
                return start + cut;
            }
        }

        if let Some(cut) = last_sentence_boundary(window) {
            if cut > min_advance {
                return start + cut;
            }
        }

        if let Some(pos) = window.rfind(char::is_whitespace) {
            let cut = pos + window[pos..].chars().next().map_or(1, char::len_utf8);
            if cut > min_advance && cut < window.len() {
                return start + cut;
            }
        }

        hard_end
    }
}

/// Last sentence start strictly inside `window`, as a byte offset
fn last_sentence_boundary(window: &str) -> Option<usize> {
    window
        .split_sentence_bound_indices()
        .map(|(offset, _)| offset)
        .filter(|&offset| offset > 0)
        .last()
}

/// Snap `i` down to the nearest char boundary
fn floor_char(text: &str, mut i: usize) -> usize {
    if i >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Snap `i` up to the nearest char boundary
fn ceil_char(text: &str, mut i: usize) -> usize {
    if i >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(i) {
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rejects_zero_chunk_size() {
        assert!(TextChunker::new(0, 0).is_err());
    }

    #[test]
    fn rejects_overlap_not_smaller_than_size() {
        assert!(TextChunker::new(100, 100).is_err());
        assert!(TextChunker::new(100, 150).is_err());
        assert!(TextChunker::new(100, 99).is_ok());
    }

    #[test]
    fn rejects_blank_input() {
        let chunker = TextChunker::new(100, 10).unwrap();
        assert!(chunker.chunk("").is_err());
        assert!(chunker.chunk("   \n\t ").is_err());
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunker = TextChunker::new(100, 10).unwrap();
        let spans = chunker.chunk("A short paragraph.").unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].start, 0);
        assert_eq!(spans[0].end, 18);
        assert_eq!(spans[0].content, "A short paragraph.");
    }

    #[test]
    fn cuts_at_sentence_boundary_with_exact_overlap() {
        let text = "Revenue grew 25% in Q4. Net profit margin was 15%.";
        assert_eq!(text.len(), 50);
        let chunker = TextChunker::new(40, 10).unwrap();
        let spans = chunker.chunk(text).unwrap();

        assert_eq!(spans.len(), 2);
        assert_eq!((spans[0].start, spans[0].end), (0, 24));
        assert_eq!(spans[0].content, "Revenue grew 25% in Q4. ");
        assert_eq!((spans[1].start, spans[1].end), (14, 50));
        assert_eq!(spans[1].content, "5% in Q4. Net profit margin was 15%.");
        // Overlap region is exactly 10 bytes shared by both chunks.
        assert_eq!(spans[0].end - spans[1].start, 10);
    }

    #[test]
    fn prefers_paragraph_breaks() {
        let text = "First paragraph here.\n\nSecond paragraph follows with more text than fits.";
        let chunker = TextChunker::new(40, 5).unwrap();
        let spans = chunker.chunk(text).unwrap();
        assert_eq!(spans[0].end, 23);
        assert!(spans[0].content.ends_with("\n\n"));
    }

    #[test]
    fn chunking_is_deterministic() {
        let text = "Alpha beta gamma. ".repeat(50);
        let chunker = TextChunker::new(64, 16).unwrap();
        let a = chunker.chunk(&text).unwrap();
        let b = chunker.chunk(&text).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn successors_start_exactly_overlap_before_predecessor_end() {
        let text = "word ".repeat(200);
        let overlap = 12;
        let chunker = TextChunker::new(60, overlap).unwrap();
        let spans = chunker.chunk(&text).unwrap();
        assert!(spans.len() > 1);
        for pair in spans.windows(2) {
            assert_eq!(pair[1].start, pair[0].end - overlap);
        }
    }

    #[test]
    fn handles_multibyte_text_on_char_boundaries() {
        let text = "Résumé naïve café. ".repeat(30);
        let chunker = TextChunker::new(50, 10).unwrap();
        let spans = chunker.chunk(&text).unwrap();
        for span in &spans {
            assert!(text.is_char_boundary(span.start));
            assert!(text.is_char_boundary(span.end));
            assert_eq!(span.content, &text[span.start..span.end]);
        }
    }

    proptest! {
        #[test]
        fn chunks_are_ordered_contiguous_slices(
            text in "[a-zA-Z0-9 .\n]{1,500}",
            chunk_size in 8usize..80,
            overlap in 0usize..7,
        ) {
            prop_assume!(!text.trim().is_empty());
            let chunker = TextChunker::new(chunk_size, overlap).unwrap();
            let spans = chunker.chunk(&text).unwrap();

            prop_assert!(!spans.is_empty());
            prop_assert_eq!(spans[0].start, 0);
            prop_assert_eq!(spans.last().unwrap().end, text.len());
            for (i, span) in spans.iter().enumerate() {
                prop_assert_eq!(span.index, i as u32);
                prop_assert!(span.start < span.end);
                prop_assert_eq!(span.content.as_str(), &text[span.start..span.end]);
            }
            for pair in spans.windows(2) {
                // Every byte is covered; successors never skip ahead.
                prop_assert!(pair[1].start <= pair[0].end);
                prop_assert!(pair[1].end > pair[0].end);
            }
        }
    }
}
