use std::collections::BTreeSet;

use proptest::prelude::*;

use super::*;

fn automaton(pairs: &[(&str, &str)]) -> Automaton {
    let (automaton, report) = Automaton::from_pairs(pairs.iter().copied());
    assert!(report.is_clean());
    automaton
}

fn spans(matches: &[Match]) -> Vec<(usize, usize, &str)> {
    matches
        .iter()
        .map(|m| (m.start, m.end, m.korean.as_str()))
        .collect()
}

// ---------------------------------------------------------------------------
// Basic matching
// ---------------------------------------------------------------------------

#[test]
fn every_pattern_finds_itself() {
    let pairs = [
        ("안녕", "annyeong"),
        ("안녕하세요", "annyeonghaseyo"),
        ("사랑", "love-id"),
        ("배", "ship-id"),
        ("잘 먹겠습니다", "jal-meokgetseumnida"),
    ];
    let automaton = automaton(&pairs);
    for (pattern, entry_ref) in pairs {
        let matches = automaton.find_matches(pattern, None);
        assert_eq!(matches.len(), 1, "{pattern}");
        let m = &matches[0];
        assert_eq!((m.start, m.end), (0, pattern.chars().count()));
        assert_eq!(m.korean, pattern);
        assert!(m.entry_refs.iter().any(|e| e == entry_ref));
    }
}

#[test]
fn greeting_scenario() {
    let automaton = automaton(&[
        ("안녕", "annyeong"),
        ("안녕하세요", "annyeonghaseyo"),
        ("하세요", "haseyo"),
    ]);
    let matches = automaton.find_matches("오늘 안녕하세요! 안녕?", None);
    assert_eq!(
        spans(&matches),
        [(3, 8, "안녕하세요"), (10, 12, "안녕")]
    );
    assert_eq!(matches[0].entry_refs, ["annyeonghaseyo"]);
    assert_eq!(matches[1].entry_refs, ["annyeong"]);
}

#[test]
fn homonyms_reported_together() {
    let automaton = automaton(&[("배", "ship-id"), ("배", "pear-id")]);
    let matches = automaton.find_matches("배가 고파요", None);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].entry_refs, ["ship-id", "pear-id"]);
    assert!(matches[0].is_ambiguous());
}

#[test]
fn suffix_pattern_absorbed_by_longer_match() {
    let automaton = automaton(&[("하세요", "haseyo"), ("안녕하세요", "annyeonghaseyo")]);
    assert_eq!(
        spans(&automaton.find_matches("안녕하세요", None)),
        [(0, 5, "안녕하세요")]
    );
    assert_eq!(
        spans(&automaton.find_matches("하세요", None)),
        [(0, 3, "하세요")]
    );
}

#[test]
fn no_false_positives() {
    let automaton = automaton(&[("안녕", "annyeong"), ("사랑", "love-id")]);
    assert!(automaton.find_matches("hello world", None).is_empty());
    assert!(automaton.find_matches("안 녕", None).is_empty());
    assert!(automaton.find_matches("사", None).is_empty());
}

#[test]
fn empty_text_and_empty_dictionary() {
    let automaton = automaton(&[("안녕", "annyeong")]);
    assert!(automaton.find_matches("", None).is_empty());
    assert!(automaton.find_all("").is_empty());

    let empty = Automaton::empty();
    assert!(empty.find_matches("안녕하세요", None).is_empty());
    assert!(empty.find_all("안녕하세요").is_empty());
}

#[test]
fn repeated_occurrences_all_found() {
    let automaton = automaton(&[("네", "ne-id")]);
    let matches = automaton.find_matches("네 네 네네", None);
    assert_eq!(
        spans(&matches),
        [(0, 1, "네"), (2, 3, "네"), (4, 5, "네"), (5, 6, "네")]
    );
}

// ---------------------------------------------------------------------------
// Overlap policy
// ---------------------------------------------------------------------------

#[test]
fn longer_wins_at_same_start() {
    let automaton = automaton(&[("안녕", "annyeong"), ("안녕하세요", "annyeonghaseyo")]);
    let matches = automaton.find_matches("안녕하세요", None);
    assert_eq!(spans(&matches), [(0, 5, "안녕하세요")]);
}

#[test]
fn earlier_start_wins_over_longer_later_match() {
    let automaton = automaton(&[("ab", "1"), ("bcde", "2")]);
    assert_eq!(spans(&automaton.find_matches("abcde", None)), [(0, 2, "ab")]);
}

#[test]
fn overlapped_candidate_dropped_in_favor_of_next() {
    let automaton = automaton(&[("가나", "1"), ("나다라", "2"), ("다라", "3")]);
    // 나다라 overlaps 가나; 다라 starts where 가나 ends.
    assert_eq!(
        spans(&automaton.find_matches("가나다라", None)),
        [(0, 2, "가나"), (2, 4, "다라")]
    );
}

#[test]
fn adjacent_matches_both_kept() {
    let automaton = automaton(&[("안녕", "annyeong"), ("하세요", "haseyo")]);
    assert_eq!(
        spans(&automaton.find_matches("안녕하세요", None)),
        [(0, 2, "안녕"), (2, 5, "하세요")]
    );
}

// ---------------------------------------------------------------------------
// Exclusion
// ---------------------------------------------------------------------------

#[test]
fn sole_candidate_excluded_leaves_nothing() {
    let automaton = automaton(&[("사랑", "love-id")]);
    assert!(automaton.find_matches("사랑해요", Some("love-id")).is_empty());
}

#[test]
fn self_link_excluded_before_overlap_resolution() {
    let automaton = automaton(&[("사랑", "love-id"), ("사랑해요", "saranghaeyo-id")]);
    let matches = automaton.find_matches("사랑해요", Some("saranghaeyo-id"));
    assert_eq!(spans(&matches), [(0, 2, "사랑")]);
    assert_eq!(matches[0].entry_refs, ["love-id"]);
}

#[test]
fn exclusion_keeps_other_homonyms() {
    let automaton = automaton(&[("배", "ship-id"), ("배", "pear-id")]);
    let matches = automaton.find_matches("배", Some("ship-id"));
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].entry_refs, ["pear-id"]);
    assert!(!matches[0].is_ambiguous());
}

#[test]
fn unknown_exclusion_is_a_no_op() {
    let automaton = automaton(&[("안녕", "annyeong")]);
    assert_eq!(
        automaton.find_matches("안녕", Some("missing-id")),
        automaton.find_matches("안녕", None)
    );
}

#[test]
fn excluded_ref_never_appears() {
    let automaton = automaton(&[
        ("안녕", "annyeong"),
        ("안녕", "hello-id"),
        ("안녕하세요", "annyeong"),
    ]);
    let matches = automaton.find_matches("안녕하세요 안녕", Some("annyeong"));
    assert_eq!(spans(&matches), [(0, 2, "안녕"), (6, 8, "안녕")]);
    for m in &matches {
        assert_eq!(m.entry_refs, ["hello-id"]);
        assert!(m.entry_refs.iter().all(|e| e != "annyeong"));
        assert!(!m.entry_refs.is_empty());
    }
}

// ---------------------------------------------------------------------------
// Offsets
// ---------------------------------------------------------------------------

#[test]
fn char_and_byte_offsets() {
    let automaton = automaton(&[("안녕", "annyeong")]);
    let text = "I said 안녕!";
    let matches = automaton.find_matches(text, None);
    assert_eq!(matches.len(), 1);
    let m = &matches[0];
    assert_eq!((m.start, m.end), (7, 9));
    assert_eq!(m.byte_range(), 7..13);
    assert_eq!(&text[m.byte_range()], "안녕");
}

#[test]
fn offsets_after_multibyte_prefix() {
    let automaton = automaton(&[("안녕", "annyeong")]);
    let text = "오늘 안녕";
    let matches = automaton.find_matches(text, None);
    let m = &matches[0];
    assert_eq!((m.start, m.end), (3, 5));
    assert_eq!((m.byte_start, m.byte_end), (7, 13));
}

// ---------------------------------------------------------------------------
// Short-match boundary
// ---------------------------------------------------------------------------

#[test]
fn short_match_inside_word_skipped_when_enabled() {
    let automaton = automaton(&[("시", "si-id")]);
    let strict = MatchOptions::default().with_short_match_boundary(2);

    assert!(automaton.find_matches_with("아시아", &strict).is_empty());
    assert_eq!(
        spans(&automaton.find_matches("아시아", None)),
        [(1, 2, "시")]
    );
}

#[test]
fn short_match_at_word_edge_kept() {
    let automaton = automaton(&[("시", "si-id")]);
    let options = MatchOptions::default().with_short_match_boundary(2);
    for text in ["시 아", "서울시", "아시!", "시"] {
        assert_eq!(
            automaton.find_matches_with(text, &options).len(),
            1,
            "{text}"
        );
    }
}

#[test]
fn boundary_ignores_longer_matches() {
    let automaton = automaton(&[("사랑", "love-id")]);
    let options = MatchOptions::default().with_short_match_boundary(1);
    assert_eq!(
        spans(&automaton.find_matches_with("첫사랑이", &options)),
        [(1, 3, "사랑")]
    );
    let options = MatchOptions::default().with_short_match_boundary(2);
    assert!(automaton.find_matches_with("첫사랑이", &options).is_empty());
}

#[test]
fn boundary_skip_lets_later_match_through() {
    let automaton = automaton(&[("시", "si-id"), ("시아", "sia-id")]);
    let options = MatchOptions::default().with_short_match_boundary(1);
    assert_eq!(
        spans(&automaton.find_matches_with("아시아", &options)),
        [(1, 3, "시아")]
    );
}

#[test]
fn options_from_settings() {
    let settings = crate::settings::parse_settings_toml(
        "[build]\nstrict = false\n[matching]\nshort_match_boundary = 2\n[loader]\nverify_checksum = true\n",
    )
    .unwrap();
    let options = MatchOptions::from_settings(&settings).excluding("si-id");
    assert_eq!(options.short_match_boundary, 2);
    assert_eq!(options.exclude_entry_ref, Some("si-id"));
}

// ---------------------------------------------------------------------------
// find_all
// ---------------------------------------------------------------------------

#[test]
fn find_all_reports_overlaps() {
    let automaton = automaton(&[
        ("안녕", "annyeong"),
        ("안녕하세요", "annyeonghaseyo"),
        ("하세요", "haseyo"),
    ]);
    assert_eq!(
        spans(&automaton.find_all("안녕하세요")),
        [(0, 2, "안녕"), (0, 5, "안녕하세요"), (2, 5, "하세요")]
    );
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

fn arb_syllable() -> impl Strategy<Value = char> {
    // Small alphabet so patterns collide and overlap often.
    prop::sample::select(vec!['가', '나', '다', ' '])
}

fn arb_pattern() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_syllable(), 1..4).prop_map(|cs| cs.into_iter().collect())
}

fn arb_dictionary() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec((arb_pattern(), 0u8..4), 0..8).prop_map(|rows| {
        rows.into_iter()
            .map(|(pattern, id)| (pattern, format!("entry-{id}")))
            .collect()
    })
}

fn arb_text() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_syllable(), 0..24).prop_map(|cs| cs.into_iter().collect())
}

/// Every occurrence of every distinct pattern, by brute force.
fn naive_occurrences(pairs: &[(String, String)], text: &str) -> BTreeSet<(usize, usize, String)> {
    let chars: Vec<char> = text.chars().collect();
    let patterns: BTreeSet<&str> = pairs.iter().map(|(p, _)| p.as_str()).collect();
    let mut found = BTreeSet::new();
    for pattern in patterns {
        let needle: Vec<char> = pattern.chars().collect();
        for start in 0..chars.len() {
            if chars[start..].starts_with(&needle) {
                found.insert((start, start + needle.len(), pattern.to_string()));
            }
        }
    }
    found
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn find_all_agrees_with_brute_force(pairs in arb_dictionary(), text in arb_text()) {
        let (automaton, _) = Automaton::from_pairs(pairs.clone());
        let found: BTreeSet<_> = automaton
            .find_all(&text)
            .into_iter()
            .map(|m| (m.start, m.end, m.korean))
            .collect();
        prop_assert_eq!(found, naive_occurrences(&pairs, &text));
    }

    #[test]
    fn matches_are_ordered_and_disjoint(pairs in arb_dictionary(), text in arb_text()) {
        let (automaton, _) = Automaton::from_pairs(pairs);
        let matches = automaton.find_matches(&text, None);
        for pair in matches.windows(2) {
            prop_assert!(pair[0].end <= pair[1].start, "{:?}", pair);
        }
        let chars: Vec<char> = text.chars().collect();
        for m in &matches {
            let surface: String = chars[m.start..m.end].iter().collect();
            prop_assert_eq!(&surface, &m.korean);
            prop_assert_eq!(&text[m.byte_range()], m.korean.as_str());
            prop_assert!(!m.entry_refs.is_empty());
        }
    }

    #[test]
    fn exclusion_never_leaks(
        pairs in arb_dictionary(),
        text in arb_text(),
        excluded in 0u8..4,
    ) {
        let (automaton, _) = Automaton::from_pairs(pairs);
        let excluded = format!("entry-{excluded}");
        let options = MatchOptions::default().excluding(&excluded);
        for m in automaton.find_matches_with(&text, &options) {
            prop_assert!(!m.entry_refs.is_empty());
            prop_assert!(m.entry_refs.iter().all(|e| *e != excluded));
        }
    }

    #[test]
    fn decoded_automaton_scans_identically(
        pairs in arb_dictionary(),
        text in arb_text(),
        excluded in 0u8..4,
    ) {
        let (automaton, _) = Automaton::from_pairs(pairs);
        let decoded = Automaton::from_bytes(&automaton.to_bytes().unwrap()).unwrap();
        let excluded = format!("entry-{excluded}");
        prop_assert_eq!(decoded.stats(), automaton.stats());
        prop_assert_eq!(
            decoded.find_matches(&text, Some(&excluded)),
            automaton.find_matches(&text, Some(&excluded))
        );
        prop_assert_eq!(decoded.find_all(&text), automaton.find_all(&text));
    }

    #[test]
    fn greedy_selection_is_maximal(pairs in arb_dictionary(), text in arb_text()) {
        // Any occurrence left out must overlap a kept match.
        let (automaton, _) = Automaton::from_pairs(pairs);
        let kept = automaton.find_matches(&text, None);
        for occurrence in automaton.find_all(&text) {
            let covered = kept
                .iter()
                .any(|m| occurrence.start < m.end && m.start < occurrence.end);
            prop_assert!(covered, "{:?} not covered by {:?}", occurrence, kept);
        }
    }
}
