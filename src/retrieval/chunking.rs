use uuid::Uuid;

use crate::extract::Document;

/// A bounded window of one page's text, the unit of indexing and retrieval.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub id: String,
    pub document_id: Uuid,
    pub text: String,
    pub page_index: usize,
    pub sequence_index: usize,
}

/// Splits page text into overlapping, size-bounded chunks.
///
/// Cuts prefer the largest structural boundary that fits inside
/// `chunk_size`: paragraph break, then line break, then sentence-terminal
/// punctuation, then whitespace, then a hard cut at exactly `chunk_size`
/// characters. Each chunk after the first on a page repeats the previous
/// chunk's last `overlap` characters.
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Chunker {
    /// `overlap` must be strictly smaller than `chunk_size`; this is what
    /// guarantees forward progress on every cut.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        assert!(chunk_size > 0, "chunk_size must be greater than zero");
        assert!(overlap < chunk_size, "overlap must be smaller than chunk_size");
        Self {
            chunk_size,
            overlap,
        }
    }

    /// Split a document into chunks, ordered by page then position.
    /// Whitespace-only pages yield no chunks; `sequence_index` is global
    /// across the whole document and strictly increasing.
    pub fn split(&self, document: &Document) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut sequence_index = 0;

        for (page_index, page) in document.pages.iter().enumerate() {
            if page.trim().is_empty() {
                continue;
            }

            for text in self.split_page(page) {
                chunks.push(Chunk {
                    id: format!("{}-{}", document.id, sequence_index),
                    document_id: document.id,
                    text,
                    page_index,
                    sequence_index,
                });
                sequence_index += 1;
            }
        }

        chunks
    }

    fn split_page(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();

        if len <= self.chunk_size {
            return vec![text.to_string()];
        }

        let mut pieces = Vec::new();
        let mut start = 0;

        while start < len {
            let window_end = (start + self.chunk_size).min(len);

            let cut = if window_end == len {
                len
            } else {
                self.find_cut(&chars, start, window_end)
            };

            pieces.push(chars[start..cut].iter().collect());

            if cut >= len {
                break;
            }
            start = cut - self.overlap;
        }

        pieces
    }

    /// Pick the cut point inside `(start, window_end]`, trying boundary
    /// classes from largest to smallest. A boundary is only usable if it
    /// leaves room for forward progress past the overlap; otherwise fall
    /// through to the next class and ultimately to a hard cut.
    fn find_cut(&self, chars: &[char], start: usize, window_end: usize) -> usize {
        let min_cut = start + self.overlap + 1;

        let paragraph = (min_cut..=window_end)
            .rev()
            .find(|&i| i >= start + 2 && chars[i - 1] == '\n' && chars[i - 2] == '\n');
        if let Some(cut) = paragraph {
            return cut;
        }

        let line = (min_cut..=window_end).rev().find(|&i| chars[i - 1] == '\n');
        if let Some(cut) = line {
            return cut;
        }

        let sentence = (min_cut..=window_end)
            .rev()
            .find(|&i| matches!(chars[i - 1], '.' | '!' | '?'));
        if let Some(cut) = sentence {
            return cut;
        }

        let whitespace = (min_cut..=window_end)
            .rev()
            .find(|&i| chars[i - 1].is_whitespace());
        if let Some(cut) = whitespace {
            return cut;
        }

        window_end
    }
}
