//! Character-level Unicode classification for Korean text.

/// Precomposed Hangul syllables (U+AC00..U+D7A3, 가..힣).
pub fn is_hangul_syllable(c: char) -> bool {
    ('\u{AC00}'..='\u{D7A3}').contains(&c)
}

/// Hangul Compatibility Jamo (U+3131..U+318E, ㄱ..ㆎ). These show up in
/// informal text ("ㅋㅋ", "ㅠㅠ") and in initial-consonant search keys.
pub fn is_hangul_jamo(c: char) -> bool {
    ('\u{3131}'..='\u{318E}').contains(&c)
}

pub fn is_hangul(c: char) -> bool {
    is_hangul_syllable(c) || is_hangul_jamo(c)
}

/// True when `c` is a Hangul character sitting directly against a match edge.
/// `None` (start or end of text) never counts as Hangul.
pub(crate) fn is_hangul_neighbor(c: Option<char>) -> bool {
    c.is_some_and(is_hangul)
}
