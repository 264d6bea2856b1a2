//! Text normalization shared by the similarity signals.

/// Normalizes free text for lexical comparison: splits camel-case boundaries,
/// strips ASCII punctuation, lowercases.
///
/// The boundary pass must run first; after lowercasing there are no
/// boundaries left to detect. Idempotent: a second application changes
/// nothing.
pub fn normalize(text: &str) -> String {
    // Pass 1: insert a space at every lowercase→uppercase boundary so
    // concatenated tokens like "JavaScriptDeveloper" split apart.
    let mut split = String::with_capacity(text.len() + 8);
    let mut prev_lower = false;
    for c in text.chars() {
        if prev_lower && c.is_uppercase() {
            split.push(' ');
        }
        prev_lower = c.is_lowercase();
        split.push(c);
    }

    // Pass 2: drop punctuation (removed, not replaced) and lowercase.
    split
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Alphabetic tokens of length ≥ `min_len` from already-normalized text.
/// Used by the tokenizer fallback and the fuzzy token signal.
pub fn word_tokens(text: &str, min_len: usize) -> Vec<String> {
    text.split(|c: char| !c.is_alphabetic())
        .filter(|t| t.len() >= min_len)
        .map(|t| t.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_punctuation_and_lowercases() {
        assert_eq!(normalize("Python, SQL; Linux!"), "python sql linux");
    }

    #[test]
    fn test_camel_case_splits_before_lowercase() {
        assert_eq!(normalize("JavaScriptDeveloper"), "java script developer");
    }

    #[test]
    fn test_punctuation_removed_not_spaced() {
        // Mirrors str.translate deletion semantics: "C++" collapses to "c".
        assert_eq!(normalize("C++"), "c");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "JavaScriptDeveloper, 5+ years!",
            "plain text",
            "  MixedCASE with-hyphens  ",
            "",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_word_tokens_min_length() {
        let tokens = word_tokens("go c python sql of", 3);
        assert_eq!(tokens, vec!["python", "sql"]);
    }

    #[test]
    fn test_word_tokens_skip_digits() {
        let tokens = word_tokens("python3 has 100 users", 3);
        assert_eq!(tokens, vec!["python", "has", "users"]);
    }
}
