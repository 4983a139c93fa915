/// Number of words in `text`: maximal runs of non-whitespace.
///
/// Empty and whitespace-only text has zero words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Whether `text` is long enough to be worth analyzing.
pub fn meets_word_gate(text: &str, min_words: u32) -> bool {
    word_count(text) >= min_words as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   \n\t "), 0);
        assert_eq!(word_count("one"), 1);
        assert_eq!(word_count("  spaced   out\nwords\t"), 3);
        assert_eq!(word_count("I need this done immediately!"), 5);
    }

    #[test]
    fn test_word_gate() {
        assert!(!meets_word_gate("this is four words", 5));
        assert!(meets_word_gate("this is now five words", 5));
        // Zero disables the gate, even for empty text.
        assert!(meets_word_gate("", 0));
    }
}
