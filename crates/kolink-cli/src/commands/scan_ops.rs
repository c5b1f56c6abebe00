use std::io;

use kolink_core::settings::settings;
use kolink_core::{AutomatonGate, BinaryFileSource, Match, MatchOptions};
use unicode_width::UnicodeWidthStr;

pub struct ScanArgs<'a> {
    pub exclude: Option<&'a str>,
    /// Overrides `matching.short_match_boundary` when set.
    pub boundary: Option<usize>,
    pub json: bool,
}

/// Scan `text` (stdin when `None`) against a compiled automaton.
pub fn scan(file: &str, text: Option<&str>, args: &ScanArgs<'_>) {
    let stdin_text;
    let text = match text {
        Some(text) => text,
        None => {
            stdin_text = die!(io::read_to_string(io::stdin()), "Error reading stdin: {}");
            stdin_text.trim_end_matches('\n')
        }
    };

    let source =
        BinaryFileSource::new(file).verify_checksum(settings().loader.verify_checksum);
    let gate = AutomatonGate::new(source);
    die!(gate.ensure_ready(), "Error loading {file}: {}");

    let mut options = MatchOptions::from_settings(settings());
    if let Some(exclude) = args.exclude {
        options = options.excluding(exclude);
    }
    if let Some(boundary) = args.boundary {
        options = options.with_short_match_boundary(boundary);
    }
    let matches = die!(gate.find_matches(text, &options), "Error: {}");

    if args.json {
        let json = die!(serde_json::to_string_pretty(&matches), "Error: {}");
        println!("{json}");
        return;
    }

    println!("{text}");
    println!("{}", marker_line(text, &matches));
    for m in &matches {
        let note = if m.is_ambiguous() { "  (ambiguous)" } else { "" };
        println!(
            "  [{}..{}) {} → {}{note}",
            m.start,
            m.end,
            m.korean,
            m.entry_refs.join(", ")
        );
    }
    if matches.is_empty() {
        println!("  (no matches)");
    }
}

/// Underline each match in terminal columns. Consecutive matches alternate
/// `^` and `~` so adjacent ones stay distinguishable.
pub fn marker_line(text: &str, matches: &[Match]) -> String {
    let mut line = String::new();
    let mut column = 0;
    for (i, m) in matches.iter().enumerate() {
        let lead = text[..m.byte_start].width();
        let width = text[m.byte_range()].width().max(1);
        line.push_str(&" ".repeat(lead.saturating_sub(column)));
        let marker = if i % 2 == 0 { "^" } else { "~" };
        line.push_str(&marker.repeat(width));
        column = lead.max(column) + width;
    }
    line
}
