//! Scan-and-reduce: raw Aho-Corasick occurrences are filtered and then
//! reduced to a non-overlapping, start-ordered list suitable for linking
//! expressions in running text.
//!
//! Overlap policy: candidates are ordered by start, longer first at equal
//! start, and swept greedily left to right. This keeps earlier matches over
//! later ones and does not try to maximize total coverage.

#[cfg(test)]
mod tests;

use serde::Serialize;
use tracing::{debug, debug_span};

use crate::automaton::{Automaton, PatternOutput, ROOT};
use crate::settings::Settings;
use crate::unicode::is_hangul_neighbor;

/// One located expression. `start`/`end` count Unicode scalar values
/// (end exclusive); `byte_start`/`byte_end` index the scanned `&str`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    pub start: usize,
    pub end: usize,
    pub byte_start: usize,
    pub byte_end: usize,
    /// The matched surface form.
    pub korean: String,
    /// Entry refs for the surface form, minus any excluded ref.
    pub entry_refs: Vec<String>,
}

impl Match {
    /// More than one entry shares this surface form; the caller must disambiguate.
    pub fn is_ambiguous(&self) -> bool {
        self.entry_refs.len() > 1
    }

    pub fn byte_range(&self) -> std::ops::Range<usize> {
        self.byte_start..self.byte_end
    }
}

/// Per-scan parameters. Nothing here is stored in the automaton.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions<'a> {
    /// Entry whose own text is being scanned; it never links to itself.
    pub exclude_entry_ref: Option<&'a str>,
    /// Drop matches of at most this many characters that sit between two
    /// Hangul characters. `0` disables the rule.
    pub short_match_boundary: usize,
}

impl<'a> MatchOptions<'a> {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            exclude_entry_ref: None,
            short_match_boundary: settings.matching.short_match_boundary,
        }
    }

    pub fn excluding(mut self, entry_ref: &'a str) -> Self {
        self.exclude_entry_ref = Some(entry_ref);
        self
    }

    pub fn with_short_match_boundary(mut self, max_len: usize) -> Self {
        self.short_match_boundary = max_len;
        self
    }
}

struct Candidate<'a> {
    start: usize,
    end: usize,
    byte_start: usize,
    byte_end: usize,
    output: &'a PatternOutput,
}

impl Candidate<'_> {
    fn into_match(self, exclude: Option<&str>) -> Match {
        let entry_refs = self
            .output
            .entry_refs()
            .iter()
            .filter(|e| Some(e.as_str()) != exclude)
            .cloned()
            .collect();
        Match {
            start: self.start,
            end: self.end,
            byte_start: self.byte_start,
            byte_end: self.byte_end,
            korean: self.output.pattern().to_string(),
            entry_refs,
        }
    }

    /// Whether any entry ref survives the exclusion filter.
    fn survives_exclusion(&self, exclude: Option<&str>) -> bool {
        match exclude {
            None => true,
            Some(excluded) => self.output.entry_refs().iter().any(|e| e != excluded),
        }
    }

    /// Short-match word boundary: a short expression flanked by Hangul on both
    /// sides is part of a longer word ("시" in "아시아").
    fn inside_word(&self, text: &str, max_len: usize) -> bool {
        if max_len == 0 || self.output.char_len() > max_len {
            return false;
        }
        let prev = text[..self.byte_start].chars().next_back();
        let next = text[self.byte_end..].chars().next();
        is_hangul_neighbor(prev) && is_hangul_neighbor(next)
    }
}

impl Automaton {
    /// Non-overlapping matches ordered by start, optionally excluding one entry ref.
    pub fn find_matches(&self, text: &str, exclude_entry_ref: Option<&str>) -> Vec<Match> {
        self.find_matches_with(
            text,
            &MatchOptions {
                exclude_entry_ref,
                ..MatchOptions::default()
            },
        )
    }

    pub fn find_matches_with(&self, text: &str, options: &MatchOptions<'_>) -> Vec<Match> {
        let _span = debug_span!("find_matches", text_len = text.len()).entered();
        let exclude = options.exclude_entry_ref;

        let mut candidates = self.scan(text);
        let raw = candidates.len();
        candidates.retain(|c| {
            c.survives_exclusion(exclude) && !c.inside_word(text, options.short_match_boundary)
        });
        let filtered = candidates.len();
        let accepted = resolve_overlaps(candidates);
        debug!(raw, filtered, accepted = accepted.len());

        accepted
            .into_iter()
            .map(|c| c.into_match(exclude))
            .collect()
    }

    /// Every occurrence of every pattern, overlaps included, ordered by end
    /// position and, at equal end, longest first.
    pub fn find_all(&self, text: &str) -> Vec<Match> {
        self.scan(text)
            .into_iter()
            .map(|c| c.into_match(None))
            .collect()
    }

    fn scan<'a>(&'a self, text: &str) -> Vec<Candidate<'a>> {
        let mut candidates = Vec::new();
        let mut state = ROOT;
        for (pos, (byte_idx, c)) in text.char_indices().enumerate() {
            state = self.next_state(state, c);
            let end = pos + 1;
            let byte_end = byte_idx + c.len_utf8();
            for output in self.outputs_at(state) {
                candidates.push(Candidate {
                    start: end - output.char_len(),
                    end,
                    byte_start: byte_end - output.pattern().len(),
                    byte_end,
                    output,
                });
            }
        }
        candidates
    }
}

/// Greedy sweep: sort by start (longer first on ties), keep a candidate only
/// if it starts at or after the end of the last kept one.
fn resolve_overlaps(mut candidates: Vec<Candidate<'_>>) -> Vec<Candidate<'_>> {
    candidates.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
    let mut accepted = Vec::new();
    let mut frontier = 0;
    for candidate in candidates {
        if candidate.start >= frontier {
            frontier = candidate.end;
            accepted.push(candidate);
        }
    }
    accepted
}
