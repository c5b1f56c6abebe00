use std::collections::VecDeque;

use tracing::{debug, debug_span, warn};

use super::{Automaton, Node, PatternError, PatternOutput, ROOT};
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Abort on the first invalid row instead of skipping it.
    pub strict: bool,
}

impl BuildOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            strict: settings.build.strict,
        }
    }
}

/// A row skipped by a permissive build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedPattern {
    /// Position of the row in the input, counting accepted and rejected rows.
    pub index: usize,
    pub pattern: String,
    pub entry_ref: String,
    pub error: PatternError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Rows inserted, including duplicates and homonyms merged into an existing pattern.
    pub accepted: usize,
    pub rejected: Vec<RejectedPattern>,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Incremental trie construction. Failure links are computed once, in
/// [`AutomatonBuilder::finish`].
pub struct AutomatonBuilder {
    nodes: Vec<Node>,
    outputs: Vec<PatternOutput>,
    char_count: usize,
    report: BuildReport,
    rows: usize,
}

impl AutomatonBuilder {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
            outputs: Vec::new(),
            char_count: 0,
            report: BuildReport::default(),
            rows: 0,
        }
    }

    /// Insert one row, failing on an invalid pattern without recording it.
    pub fn insert(&mut self, pattern: &str, entry_ref: &str) -> Result<(), PatternError> {
        self.rows += 1;
        validate_row(pattern, entry_ref)?;

        let mut state = ROOT as usize;
        let mut char_len = 0u32;
        for c in pattern.chars() {
            char_len += 1;
            state = match self.nodes[state].children.get(&c) {
                Some(&next) => next as usize,
                None => {
                    let next = self.nodes.len();
                    self.nodes.push(Node::default());
                    self.nodes[state].children.insert(c, next as u32);
                    next
                }
            };
        }

        match self.nodes[state].output {
            Some(idx) => {
                let output = &mut self.outputs[idx as usize];
                if !output.entry_refs.iter().any(|e| e == entry_ref) {
                    output.entry_refs.push(entry_ref.to_string());
                }
            }
            None => {
                self.nodes[state].output = Some(self.outputs.len() as u32);
                self.outputs.push(PatternOutput {
                    pattern: pattern.to_string(),
                    char_len,
                    entry_refs: vec![entry_ref.to_string()],
                });
                self.char_count += char_len as usize;
            }
        }
        self.report.accepted += 1;
        Ok(())
    }

    /// Insert one row, recording it in the report if it is invalid.
    pub fn push(&mut self, pattern: &str, entry_ref: &str) {
        let index = self.rows;
        if let Err(error) = self.insert(pattern, entry_ref) {
            warn!(index, pattern, entry_ref, %error, "skipping invalid pattern");
            self.report.rejected.push(RejectedPattern {
                index,
                pattern: pattern.to_string(),
                entry_ref: entry_ref.to_string(),
                error,
            });
        }
    }

    /// Distinct patterns inserted so far.
    pub fn pattern_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    /// Compute failure links and freeze the automaton.
    pub fn finish(mut self) -> (Automaton, BuildReport) {
        let _span = debug_span!(
            "build_automaton",
            patterns = self.outputs.len(),
            rows = self.rows
        )
        .entered();
        compute_failure_links(&mut self.nodes);
        debug!(
            node_count = self.nodes.len(),
            char_count = self.char_count,
            rejected = self.report.rejected.len()
        );
        let automaton = Automaton {
            nodes: self.nodes,
            outputs: self.outputs,
            char_count: self.char_count,
        };
        (automaton, self.report)
    }
}

impl Default for AutomatonBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_row(pattern: &str, entry_ref: &str) -> Result<(), PatternError> {
    if pattern.is_empty() {
        return Err(PatternError::Empty);
    }
    if entry_ref.is_empty() {
        return Err(PatternError::EmptyEntryRef {
            pattern: pattern.to_string(),
        });
    }
    if let Some(ch) = pattern.chars().find(|c| c.is_control()) {
        return Err(PatternError::ControlCharacter {
            pattern: pattern.to_string(),
            ch,
        });
    }
    Ok(())
}

/// Breadth-first failure links. A node reached by `c` from `parent` fails to
/// the `c`-child of the deepest node on `parent`'s failure chain that has one,
/// or to the root. BFS order guarantees that chain is already linked.
pub(super) fn compute_failure_links(nodes: &mut [Node]) {
    let _span = debug_span!("compute_failure_links", node_count = nodes.len()).entered();
    let mut queue = VecDeque::new();

    let root_children: Vec<u32> = nodes[ROOT as usize].children.values().copied().collect();
    for child in root_children {
        let node = &mut nodes[child as usize];
        node.fail = ROOT;
        node.output_link = None;
        queue.push_back(child);
    }

    while let Some(current) = queue.pop_front() {
        let current_fail = nodes[current as usize].fail;
        let children: Vec<(char, u32)> = nodes[current as usize]
            .children
            .iter()
            .map(|(&c, &child)| (c, child))
            .collect();

        for (c, child) in children {
            queue.push_back(child);

            let mut state = current_fail;
            let fail = loop {
                if let Some(&next) = nodes[state as usize].children.get(&c) {
                    break next;
                }
                if state == ROOT {
                    break ROOT;
                }
                state = nodes[state as usize].fail;
            };

            let fail_node = &nodes[fail as usize];
            let output_link = if fail_node.output.is_some() {
                Some(fail)
            } else {
                fail_node.output_link
            };
            let node = &mut nodes[child as usize];
            node.fail = fail;
            node.output_link = output_link;
        }
    }
}
