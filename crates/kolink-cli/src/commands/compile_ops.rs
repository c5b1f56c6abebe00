use std::fs;
use std::path::Path;

use kolink_core::settings::settings;
use kolink_core::{Automaton, BuildOptions};

use crate::pattern_list::{self, PatternFormat};

pub fn compile(input: &str, output: &str, format: Option<PatternFormat>, strict: bool) {
    let input_path = Path::new(input);
    let options = BuildOptions {
        strict: strict || BuildOptions::from_settings(settings()).strict,
    };

    match format {
        Some(format) => eprintln!("Reading {input} ({format:?})..."),
        None => eprintln!("Reading {input}..."),
    }
    let rows = die!(
        pattern_list::load(input_path, format),
        "Error reading {input}: {}"
    );

    eprintln!(
        "Building automaton from {} rows ({})...",
        rows.len(),
        if options.strict { "strict" } else { "permissive" }
    );
    let (automaton, report) = die!(
        Automaton::build(
            rows.iter().map(|(p, e)| (p.as_str(), e.as_str())),
            options
        ),
        "Error: invalid pattern: {}"
    );

    for rejected in &report.rejected {
        eprintln!(
            "  skipped row {} ({:?} -> {:?}): {}",
            rejected.index + 1,
            rejected.pattern,
            rejected.entry_ref,
            rejected.error
        );
    }

    let stats = automaton.stats();
    eprintln!(
        "  {} patterns, {} entry refs, {} nodes, {} rejected",
        stats.pattern_count,
        stats.entry_ref_count,
        stats.node_count,
        report.rejected.len()
    );

    die!(
        automaton.save(Path::new(output)),
        "Error writing {output}: {}"
    );

    let file_size = fs::metadata(output).map(|m| m.len()).unwrap_or(0);
    eprintln!("Wrote {output} ({:.1} KB)", file_size as f64 / 1024.0);
}

pub fn info(file: &str) {
    let automaton = open(file);
    let file_size = fs::metadata(file).map(|m| m.len()).unwrap_or(0);
    let stats = automaton.stats();
    let homonyms = automaton
        .outputs()
        .iter()
        .filter(|o| o.entry_refs().len() > 1)
        .count();

    println!("Automaton:  {file}");
    println!("File size:  {:.1} KB", file_size as f64 / 1024.0);
    println!("Nodes:      {}", stats.node_count);
    println!("Patterns:   {}", stats.pattern_count);
    println!("Entry refs: {}", stats.entry_ref_count);
    println!("Homonyms:   {homonyms}");
    println!("Characters: {}", stats.char_count);

    let mut longest: Vec<_> = automaton.outputs().iter().collect();
    longest.sort_by(|a, b| b.char_len().cmp(&a.char_len()));
    if !longest.is_empty() {
        println!();
        println!("Longest patterns:");
        for output in longest.iter().take(5) {
            println!(
                "  {} ({} chars) → {}",
                output.pattern(),
                output.char_len(),
                output.entry_refs().join(", ")
            );
        }
    }
}

pub fn lookup(file: &str, pattern: &str) {
    let automaton = open(file);
    match automaton.entry_refs(pattern) {
        Some(refs) => println!("{pattern} → {}", refs.join(", ")),
        None => println!("{pattern} → (not found)"),
    }
}

fn open(file: &str) -> Automaton {
    die!(
        Automaton::open_with(Path::new(file), settings().loader.verify_checksum),
        "Error opening {file}: {}"
    )
}
