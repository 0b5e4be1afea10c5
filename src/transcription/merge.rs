//! Joins the transcripts of two adjacent, overlapping audio windows.
//!
//! The overlap region is heard by both windows, so the boundary word is
//! usually transcribed twice, either whole (`"to" | "to market"`) or cut
//! (`"hello ther" | "there world"`). Only the last word of `previous` and
//! the first word of `current` are compared.

/// Merge two consecutive transcript fragments at their word boundary.
///
/// - Either side has no words: `previous + " " + current`.
/// - Boundary words equal: the duplicate is dropped once.
/// - A suffix of the last word (longest first) is a prefix of the first
///   word: the two are fused into one word.
/// - Otherwise: `previous + " " + current`, nothing deduplicated.
pub fn merge(previous: &str, current: &str) -> String {
    let previous_words: Vec<&str> = previous.split_whitespace().collect();
    let current_words: Vec<&str> = current.split_whitespace().collect();

    let (Some(&last), Some(&first)) = (previous_words.last(), current_words.first()) else {
        return format!("{} {}", previous, current);
    };

    if last == first {
        return format!("{} {}", previous, current_words[1..].join(" "));
    }

    let overlap = last
        .char_indices()
        .map(|(i, _)| i)
        .find(|&i| first.starts_with(&last[i..]));

    match overlap {
        Some(i) => {
            let fused = format!("{}{}", &last[..i], first);
            let mut words: Vec<&str> = previous_words[..previous_words.len() - 1].to_vec();
            words.push(fused.as_str());
            words.extend_from_slice(&current_words[1..]);
            words.join(" ")
        }
        None => format!("{} {}", previous, current),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_boundary_word() {
        assert_eq!(merge("I went to", "to market"), "I went to market");
    }

    #[test]
    fn test_partial_boundary_word() {
        assert_eq!(merge("hello ther", "there world"), "hello there world");
    }

    #[test]
    fn test_no_overlap() {
        assert_eq!(merge("good morning", "everyone here"), "good morning everyone here");
    }

    #[test]
    fn test_empty_side() {
        assert_eq!(merge("", "anything"), " anything");
        assert_eq!(merge("something", "   "), "something    ");
    }

    #[test]
    fn test_longest_suffix_wins() {
        // "abab" and "ab" are both candidates; the whole-word-first scan picks "abab".
        assert_eq!(merge("x abab", "ababc y"), "x ababc y");
        // Only the last character overlaps.
        assert_eq!(merge("the cat", "tiger"), "the catiger");
    }

    #[test]
    fn test_single_word_exact_match_keeps_separator() {
        assert_eq!(merge("hello", "hello"), "hello ");
    }

    #[test]
    fn test_multibyte_words() {
        assert_eq!(merge("café crè", "crème brûlée"), "café crème brûlée");
    }

    #[test]
    fn test_deterministic() {
        let first = merge("we should meet tomor", "tomorrow at noon");
        for _ in 0..10 {
            assert_eq!(merge("we should meet tomor", "tomorrow at noon"), first);
        }
        assert_eq!(first, "we should meet tomorrow at noon");
    }
}
