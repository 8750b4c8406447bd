//! Cleaning and splitting of raw section bodies into passage-sized chunks.
//!
//! Mirrors the indexing pipeline's `DocumentCleaner` +
//! `DocumentSplitter(split_by="word", split_length=100, split_overlap=0)`
//! configuration: empty lines and repeated whitespace are removed,
//! repeated-substring (header/footer) removal is left disabled, and each
//! cleaned body is cut into non-overlapping 100-word windows.

const SPLIT_LENGTH: usize = 100;

/// Removes empty lines and collapses runs of whitespace within each line.
pub fn clean(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Splits cleaned text into whitespace-delimited word windows of
/// `SPLIT_LENGTH` with no overlap. A body shorter than the window is
/// emitted whole; the final window may be shorter than the rest. Empty
/// input yields no windows.
pub fn split(text: &str) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }
    words
        .chunks(SPLIT_LENGTH)
        .map(|chunk| chunk.join(" "))
        .collect()
}
