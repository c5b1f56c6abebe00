//! Readers for the `(pattern, entry_ref)` lists fed to `kolink compile`.
//!
//! Two formats:
//!
//! - JSON: an array of dictionary entries; only `id` and `korean` are read,
//!   other fields are ignored.
//! - TSV: `pattern<TAB>entry_ref` per line, blank lines and `#` comments skipped.
//!
//! Rows are returned as-is; pattern validation is the builder's job.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use serde::Deserialize;

/// `(pattern, entry_ref)`
pub type PatternRow = (String, String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PatternFormat {
    Json,
    Tsv,
}

impl PatternFormat {
    /// `.json` is JSON, anything else TSV.
    pub fn from_path(path: &Path) -> Self {
        Self::from_extension(path).unwrap_or(Self::Tsv)
    }

    /// Format named by the extension, if it is one of ours.
    fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("json") {
            Some(Self::Json)
        } else if ext.eq_ignore_ascii_case("tsv") {
            Some(Self::Tsv)
        } else {
            None
        }
    }

    fn glob(format: Option<Self>) -> &'static str {
        match format {
            Some(Self::Json) => "*.json",
            Some(Self::Tsv) => "*.tsv",
            None => "*.json or *.tsv",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PatternListError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("duplicate entry id: {0}")]
    DuplicateId(String),

    #[error("no {glob} files found in {dir}")]
    EmptyDir { dir: String, glob: &'static str },
}

#[derive(Deserialize)]
struct JsonEntry {
    id: String,
    korean: String,
}

/// Parse a JSON entry array. Entry ids must be unique within the input.
pub fn parse_json(text: &str) -> Result<Vec<PatternRow>, PatternListError> {
    let entries: Vec<JsonEntry> = serde_json::from_str(text)?;
    let mut ids = HashSet::with_capacity(entries.len());
    let mut rows = Vec::with_capacity(entries.len());
    for entry in entries {
        if !ids.insert(entry.id.clone()) {
            return Err(PatternListError::DuplicateId(entry.id));
        }
        rows.push((entry.korean, entry.id));
    }
    Ok(rows)
}

pub fn parse_tsv(text: &str) -> Result<Vec<PatternRow>, PatternListError> {
    let mut rows = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let (pattern, entry_ref) = line.split_once('\t').ok_or_else(|| PatternListError::Parse {
            line: i + 1,
            reason: "expected pattern<TAB>entry_ref".to_string(),
        })?;
        rows.push((pattern.to_string(), entry_ref.trim().to_string()));
    }
    Ok(rows)
}

/// Read a pattern list file, or every pattern file in a directory (sorted by
/// name, concatenated).
///
/// Without an explicit `format`, a file's format follows its extension and a
/// directory contributes both its `*.json` and `*.tsv` files. With one, a
/// directory contributes only files of that format.
pub fn load(path: &Path, format: Option<PatternFormat>) -> Result<Vec<PatternRow>, PatternListError> {
    if !path.is_dir() {
        let format = format.unwrap_or_else(|| PatternFormat::from_path(path));
        return load_file(path, format);
    }

    let mut files: Vec<(fs::DirEntry, PatternFormat)> = fs::read_dir(path)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let found = PatternFormat::from_extension(&entry.path())?;
            match format {
                Some(wanted) if wanted != found => None,
                _ => Some((entry, found)),
            }
        })
        .collect();
    files.sort_by_key(|(entry, _)| entry.file_name());

    if files.is_empty() {
        return Err(PatternListError::EmptyDir {
            dir: path.display().to_string(),
            glob: PatternFormat::glob(format),
        });
    }

    let mut rows = Vec::new();
    let mut ids = HashSet::new();
    for (file, file_format) in files {
        for row in load_file(&file.path(), file_format)? {
            // Ids are unique per entry, so the check spans files for JSON.
            if file_format == PatternFormat::Json && !ids.insert(row.1.clone()) {
                return Err(PatternListError::DuplicateId(row.1));
            }
            rows.push(row);
        }
    }
    Ok(rows)
}

fn load_file(path: &Path, format: PatternFormat) -> Result<Vec<PatternRow>, PatternListError> {
    let text = fs::read_to_string(path)?;
    match format {
        PatternFormat::Json => parse_json(&text),
        PatternFormat::Tsv => parse_tsv(&text),
    }
}
