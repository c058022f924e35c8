//! # Text Chunking
//!
//! Splits plain text into word windows of roughly `target_chunk_size` words with
//! `overlap_size` words repeated between neighbours. Window ends are pulled back
//! to the nearest natural boundary when one lies in the last 70% of the window.

use serde::Serialize;
use tracing::{debug, instrument};

use super::ChunkOptions;

/// A chunk of text with its position in the source document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextChunk {
    /// The text of the chunk
    pub text: String,

    /// The position of the chunk in the original document
    pub position: usize,
}

/// What separates a word from the one after it, weakest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Break {
    Space,
    Sentence,
    Line,
    Paragraph,
}

#[derive(Debug)]
struct Word<'a> {
    text: &'a str,
    after: Break,
}

/// Chunk plain text into overlapping passages
///
/// Blank input yields no chunks. Line and paragraph structure is kept inside each
/// chunk; runs of spaces collapse to one.
#[instrument(skip(text), fields(chars = text.len()))]
pub fn chunk_text(text: &str, options: &ChunkOptions) -> Vec<TextChunk> {
    let words = tokenize(text);
    let (target, overlap) = options.effective();

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < words.len() {
        let window_end = (start + target).min(words.len());
        let end = if window_end == words.len() {
            window_end
        } else {
            start + find_split_point(&words[start..window_end], target)
        };

        chunks.push(TextChunk {
            text: render(&words[start..end]),
            position: chunks.len(),
        });

        if end == words.len() {
            break;
        }
        start = end.saturating_sub(overlap).max(start + 1);
    }

    debug!("Created {} chunks", chunks.len());
    chunks
}

fn tokenize(text: &str) -> Vec<Word<'_>> {
    let mut words: Vec<Word<'_>> = Vec::new();
    let mut pending_blank = false;

    for line in text.lines() {
        if line.trim().is_empty() {
            pending_blank = true;
            continue;
        }
        if let Some(last) = words.last_mut() {
            last.after = if pending_blank {
                Break::Paragraph
            } else {
                Break::Line
            };
        }
        pending_blank = false;

        for word in line.split_whitespace() {
            words.push(Word {
                text: word,
                after: if word.ends_with(['.', '!', '?']) {
                    Break::Sentence
                } else {
                    Break::Space
                },
            });
        }
    }

    words
}

/// Number of words to keep from `window`
///
/// Searches backwards for the strongest boundary past 30% of the target size.
fn find_split_point(window: &[Word<'_>], target_size: usize) -> usize {
    let min_pos = target_size * 3 / 10;

    for wanted in [Break::Paragraph, Break::Line, Break::Sentence] {
        let found = window
            .iter()
            .enumerate()
            .rev()
            .find(|(i, word)| *i + 1 > min_pos && word.after >= wanted);
        if let Some((i, _)) = found {
            return i + 1;
        }
    }

    window.len()
}

fn render(words: &[Word<'_>]) -> String {
    let mut text = String::new();
    for (i, word) in words.iter().enumerate() {
        text.push_str(word.text);
        if i + 1 == words.len() {
            break;
        }
        text.push_str(match word.after {
            Break::Space | Break::Sentence => " ",
            Break::Line => "\n",
            Break::Paragraph => "\n\n",
        });
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(target: usize, overlap: usize) -> ChunkOptions {
        ChunkOptions::default()
            .with_target_chunk_size(target)
            .with_overlap_size(overlap)
    }

    fn numbered(n: usize) -> String {
        (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_blank_text_has_no_chunks() {
        assert!(chunk_text("", &ChunkOptions::default()).is_empty());
        assert!(chunk_text(" \n\n \t", &ChunkOptions::default()).is_empty());
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunks = chunk_text("hello   world\nsecond line", &ChunkOptions::default());
        assert_eq!(
            chunks,
            vec![TextChunk {
                text: "hello world\nsecond line".to_string(),
                position: 0,
            }]
        );
    }

    #[test]
    fn test_windows_overlap() {
        let chunks = chunk_text(&numbered(10), &options(4, 1));
        let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["w0 w1 w2 w3", "w3 w4 w5 w6", "w6 w7 w8 w9"]
        );
        assert_eq!(chunks[2].position, 2);
    }

    #[test]
    fn test_prefers_paragraph_break() {
        let text = "one two three.\n\nfour five six seven eight nine ten";
        let chunks = chunk_text(text, &options(6, 0));
        assert_eq!(chunks[0].text, "one two three.");
        assert!(chunks[1].text.starts_with("four"));
    }

    #[test]
    fn test_prefers_sentence_end_over_mid_sentence() {
        let text = "alpha beta gamma delta. epsilon zeta eta theta iota";
        let chunks = chunk_text(text, &options(6, 0));
        assert_eq!(chunks[0].text, "alpha beta gamma delta.");
        assert_eq!(chunks[1].text, "epsilon zeta eta theta iota");
    }

    #[test]
    fn test_ignores_boundary_too_early_in_window() {
        let text = "a. b c d e f g h i j";
        let chunks = chunk_text(text, &options(10, 0));
        assert_eq!(chunks.len(), 1);

        let chunks = chunk_text(text, &options(8, 0));
        assert_eq!(chunks[0].text, "a. b c d e f g h");
    }

    #[test]
    fn test_always_makes_progress() {
        let chunks = chunk_text(&numbered(5), &options(1, 5));
        assert_eq!(chunks.len(), 5);
        assert_eq!(chunks[4].text, "w4");
    }

    #[test]
    fn test_utf8_text() {
        let text = "Hello, 世界! This is a test with UTF-8 characters. 你好，世界！";
        let chunks = chunk_text(text, &options(4, 1));
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|chunk| !chunk.text.is_empty()));
        assert!(chunks.last().unwrap().text.ends_with("你好，世界！"));
    }
}
