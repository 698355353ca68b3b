//! Paragraph-preserving text chunking.
//!
//! Splits on blank-line boundaries and accumulates paragraphs greedily up to
//! the size limit. A single paragraph longer than the limit becomes an
//! oversized chunk on its own — it is never split further.

/// Default chunk budget in characters.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 1000;

/// Split `text` into bounded chunks. Never returns an empty sequence: input
/// that produces no paragraphs (including the empty string) comes back as a
/// single chunk holding the original text verbatim.
pub fn chunk_text(text: &str, max_chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_size = 0usize;

    for paragraph in text.split("\n\n") {
        if paragraph.trim().is_empty() {
            continue;
        }

        // Close the running chunk before this paragraph would overflow it.
        if current_size + paragraph.len() > max_chunk_size && !current.is_empty() {
            chunks.push(current.join("\n\n"));
            current.clear();
            current_size = 0;
        }

        current.push(paragraph);
        current_size += paragraph.len();
    }

    if !current.is_empty() {
        chunks.push(current.join("\n\n"));
    }

    if chunks.is_empty() {
        return vec![text.to_string()];
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = chunk_text("Hello, world!", DEFAULT_MAX_CHUNK_SIZE);
        assert_eq!(chunks, vec!["Hello, world!".to_string()]);
    }

    #[test]
    fn test_empty_input_is_single_empty_chunk() {
        assert_eq!(chunk_text("", DEFAULT_MAX_CHUNK_SIZE), vec![String::new()]);
    }

    #[test]
    fn test_blank_paragraphs_are_skipped() {
        let chunks = chunk_text("first\n\n\n\nsecond", 1000);
        assert_eq!(chunks, vec!["first\n\nsecond".to_string()]);
    }

    #[test]
    fn test_2500_chars_make_three_chunks() {
        // Five ~494-char paragraphs → ~2500 chars of input. Two fit per
        // chunk (988 ≤ 1000), the fifth flushes alone.
        let paragraph = "x".repeat(494);
        let text = vec![paragraph.clone(); 5].join("\n\n");
        assert!(text.len() >= 2478);

        let chunks = chunk_text(&text, 1000);
        assert_eq!(chunks.len(), 3);
        for chunk in &chunks[..2] {
            assert!(chunk.len() <= 1000);
        }
    }

    #[test]
    fn test_oversized_paragraph_is_not_split() {
        let big = "y".repeat(3000);
        let text = format!("intro\n\n{}\n\noutro", big);
        let chunks = chunk_text(&text, 1000);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], "intro");
        assert_eq!(chunks[1], big);
        assert_eq!(chunks[2], "outro");
    }

    #[test]
    fn test_concatenation_preserves_content() {
        let text = "alpha\n\nbeta\n\n\n\ngamma delta\n\nepsilon";
        let chunks = chunk_text(text, 12);
        let rejoined = chunks.join("\n\n");
        for word in ["alpha", "beta", "gamma delta", "epsilon"] {
            assert!(rejoined.contains(word));
        }
        for chunk in &chunks {
            assert!(!chunk.trim().is_empty());
        }
    }
}
