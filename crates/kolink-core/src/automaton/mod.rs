//! Aho-Corasick automaton over Korean surface forms.
//!
//! Nodes live in a flat arena (`Vec<Node>`); child edges and failure links are
//! `u32` indices into it, with the root at index 0 terminating every failure
//! chain. A parent's `children` map is the only edge that "owns" a node, so
//! the arena is a tree plus non-owning back references.
//!
//! Each distinct pattern has exactly one [`PatternOutput`] (homonym entry refs
//! are merged into it). The effective output set of a node is its own output
//! followed by the outputs reachable through `output_link`, which points at
//! the nearest node on the failure chain that has an output of its own.

mod builder;
mod io;

pub use builder::{AutomatonBuilder, BuildOptions, BuildReport, RejectedPattern};

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

pub(crate) const ROOT: u32 = 0;

/// Rejection reasons for a single `(pattern, entry_ref)` row.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("empty pattern")]
    Empty,

    #[error("empty entry reference for pattern {pattern:?}")]
    EmptyEntryRef { pattern: String },

    #[error("control character {ch:?} in pattern {pattern:?}")]
    ControlCharacter { pattern: String, ch: char },
}

/// Error type for automaton binary I/O and loading.
#[derive(Debug, thiserror::Error)]
pub enum AutomatonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid header (too short)")]
    InvalidHeader,

    #[error("invalid magic bytes (expected KLAC)")]
    InvalidMagic,

    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),

    #[error("checksum mismatch (expected {expected:#010x}, got {actual:#010x})")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("serialization error: {0}")]
    Serialize(bincode::Error),

    #[error("deserialization error: {0}")]
    Deserialize(bincode::Error),

    #[error("corrupt automaton: {0}")]
    Corrupt(String),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] PatternError),

    #[error("source error: {0}")]
    Source(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Node {
    pub(crate) children: BTreeMap<char, u32>,
    pub(crate) fail: u32,
    pub(crate) output: Option<u32>,
    pub(crate) output_link: Option<u32>,
}

/// A distinct pattern and every entry it resolves to, in first-registration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternOutput {
    pub(crate) pattern: String,
    pub(crate) char_len: u32,
    pub(crate) entry_refs: Vec<String>,
}

impl PatternOutput {
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Pattern length in Unicode scalar values.
    pub fn char_len(&self) -> usize {
        self.char_len as usize
    }

    pub fn entry_refs(&self) -> &[String] {
        &self.entry_refs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutomatonStats {
    pub node_count: usize,
    /// Distinct patterns (homonyms count once).
    pub pattern_count: usize,
    /// Total characters over distinct patterns.
    pub char_count: usize,
    /// Total entry references over all patterns.
    pub entry_ref_count: usize,
}

/// Immutable compiled automaton. Cheap to share behind an `Arc`; scanning
/// takes `&self` only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Automaton {
    pub(crate) nodes: Vec<Node>,
    pub(crate) outputs: Vec<PatternOutput>,
    pub(crate) char_count: usize,
}

impl Automaton {
    /// An automaton with only the root node. Matches nothing.
    pub fn empty() -> Self {
        AutomatonBuilder::new().finish().0
    }

    /// Build from `(pattern, entry_ref)` pairs, skipping invalid rows.
    ///
    /// Rejected rows are listed in the returned report; they never abort the build.
    pub fn from_pairs<I, P, E>(pairs: I) -> (Self, BuildReport)
    where
        I: IntoIterator<Item = (P, E)>,
        P: AsRef<str>,
        E: AsRef<str>,
    {
        let mut builder = AutomatonBuilder::new();
        for (pattern, entry_ref) in pairs {
            builder.push(pattern.as_ref(), entry_ref.as_ref());
        }
        builder.finish()
    }

    /// Build with explicit options. In strict mode the first invalid row
    /// aborts the build.
    pub fn build<I, P, E>(pairs: I, options: BuildOptions) -> Result<(Self, BuildReport), PatternError>
    where
        I: IntoIterator<Item = (P, E)>,
        P: AsRef<str>,
        E: AsRef<str>,
    {
        if !options.strict {
            return Ok(Self::from_pairs(pairs));
        }
        let mut builder = AutomatonBuilder::new();
        for (pattern, entry_ref) in pairs {
            builder.insert(pattern.as_ref(), entry_ref.as_ref())?;
        }
        Ok(builder.finish())
    }

    pub fn stats(&self) -> AutomatonStats {
        AutomatonStats {
            node_count: self.nodes.len(),
            pattern_count: self.outputs.len(),
            char_count: self.char_count,
            entry_ref_count: self.outputs.iter().map(|o| o.entry_refs.len()).sum(),
        }
    }

    pub fn pattern_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn char_count(&self) -> usize {
        self.char_count
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Exact lookup of a pattern's entry refs (no scanning, no failure links).
    pub fn entry_refs(&self, pattern: &str) -> Option<&[String]> {
        let mut state = ROOT;
        for c in pattern.chars() {
            state = *self.nodes[state as usize].children.get(&c)?;
        }
        let idx = self.nodes[state as usize].output?;
        Some(&self.outputs[idx as usize].entry_refs)
    }

    pub fn contains_pattern(&self, pattern: &str) -> bool {
        self.entry_refs(pattern).is_some()
    }

    /// All distinct patterns in insertion order.
    pub fn outputs(&self) -> &[PatternOutput] {
        &self.outputs
    }

    /// Goto/failure transition on `c`.
    #[inline]
    pub(crate) fn next_state(&self, mut state: u32, c: char) -> u32 {
        loop {
            let node = &self.nodes[state as usize];
            if let Some(&next) = node.children.get(&c) {
                return next;
            }
            if state == ROOT {
                return ROOT;
            }
            state = node.fail;
        }
    }

    /// Effective output set of `state`, longest pattern first.
    #[inline]
    pub(crate) fn outputs_at(&self, state: u32) -> Outputs<'_> {
        let node = &self.nodes[state as usize];
        Outputs {
            automaton: self,
            next: if node.output.is_some() {
                Some(state)
            } else {
                node.output_link
            },
        }
    }

    /// Structural check for automata that did not come from the builder.
    ///
    /// Guarantees every index is in range, the nodes form a tree rooted at 0,
    /// failure and output links are exactly the ones the builder would compute
    /// (so every reported output is a suffix of the scanned text and no walk
    /// can loop), and every output's pattern spells the path to its node.
    pub(crate) fn validate(&self) -> Result<(), AutomatonError> {
        let corrupt = |msg: String| Err(AutomatonError::Corrupt(msg));
        let n = self.nodes.len();
        if n == 0 {
            return corrupt("no root node".to_string());
        }
        if self.nodes[ROOT as usize].fail != ROOT {
            return corrupt("root must fail to itself".to_string());
        }

        // BFS over child edges: depth and (parent, label) of every node.
        let mut depth = vec![u32::MAX; n];
        let mut parent: Vec<(u32, char)> = vec![(ROOT, '\0'); n];
        depth[ROOT as usize] = 0;
        let mut queue = VecDeque::from([ROOT]);
        while let Some(current) = queue.pop_front() {
            for (&c, &child) in &self.nodes[current as usize].children {
                let child_idx = child as usize;
                if child_idx >= n {
                    return corrupt(format!("child index {child} out of range"));
                }
                if depth[child_idx] != u32::MAX {
                    return corrupt(format!("node {child} reached twice"));
                }
                depth[child_idx] = depth[current as usize] + 1;
                parent[child_idx] = (current, c);
                queue.push_back(child);
            }
        }
        if let Some(orphan) = depth.iter().position(|&d| d == u32::MAX) {
            return corrupt(format!("node {orphan} unreachable from root"));
        }

        let root = &self.nodes[ROOT as usize];
        if root.output.is_some() || root.output_link.is_some() {
            return corrupt("root must not carry an output".to_string());
        }

        // Links are fully determined by the tree: recompute and compare.
        let mut expected = self.nodes.clone();
        builder::compute_failure_links(&mut expected);
        for (i, (node, want)) in self.nodes.iter().zip(&expected).enumerate() {
            if node.fail != want.fail {
                return corrupt(format!("wrong fail link at node {i}"));
            }
            if node.output_link != want.output_link {
                return corrupt(format!("wrong output link at node {i}"));
            }
        }

        let mut seen_outputs = vec![false; self.outputs.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            let Some(out) = node.output else { continue };
            let out = out as usize;
            if out >= self.outputs.len() || seen_outputs[out] {
                return corrupt(format!("bad output index {out} at node {i}"));
            }
            seen_outputs[out] = true;

            let output = &self.outputs[out];
            if output.entry_refs.is_empty() {
                return corrupt(format!("pattern {:?} has no entry refs", output.pattern));
            }
            if output.char_len != depth[i] {
                return corrupt(format!("pattern {:?} length mismatch", output.pattern));
            }
            let mut path = Vec::with_capacity(depth[i] as usize);
            let mut cursor = i;
            while cursor != ROOT as usize {
                let (up, c) = parent[cursor];
                path.push(c);
                cursor = up as usize;
            }
            if !path.iter().rev().copied().eq(output.pattern.chars()) {
                return corrupt(format!("pattern {:?} does not match its path", output.pattern));
            }
        }
        if seen_outputs.iter().any(|seen| !seen) {
            return corrupt("output not attached to any node".to_string());
        }
        let char_count: usize = self.outputs.iter().map(|o| o.char_len as usize).sum();
        if char_count != self.char_count {
            return corrupt(format!(
                "char count {} does not match outputs ({char_count})",
                self.char_count
            ));
        }
        Ok(())
    }
}

impl Default for Automaton {
    fn default() -> Self {
        Self::empty()
    }
}

/// Iterator over a node's effective outputs (own output, then the output-link chain).
pub(crate) struct Outputs<'a> {
    automaton: &'a Automaton,
    next: Option<u32>,
}

impl<'a> Iterator for Outputs<'a> {
    type Item = &'a PatternOutput;

    fn next(&mut self) -> Option<Self::Item> {
        let state = self.next?;
        let node = &self.automaton.nodes[state as usize];
        self.next = node.output_link;
        let idx = node.output?;
        Some(&self.automaton.outputs[idx as usize])
    }
}
