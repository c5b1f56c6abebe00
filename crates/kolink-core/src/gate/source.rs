use std::path::PathBuf;

use tracing::debug;

use crate::automaton::{Automaton, AutomatonError, BuildOptions};

/// Where a gate gets its automaton from: a precompiled file, raw pattern
/// pairs built on first use, or any loader closure.
pub trait AutomatonSource: Send + Sync {
    fn load(&self) -> Result<Automaton, AutomatonError>;

    /// Short human-readable label for logs.
    fn describe(&self) -> String {
        "custom".to_string()
    }
}

impl<F> AutomatonSource for F
where
    F: Fn() -> Result<Automaton, AutomatonError> + Send + Sync,
{
    fn load(&self) -> Result<Automaton, AutomatonError> {
        self()
    }
}

/// Precompiled KLAC file.
#[derive(Debug, Clone)]
pub struct BinaryFileSource {
    path: PathBuf,
    verify_checksum: bool,
}

impl BinaryFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            verify_checksum: true,
        }
    }

    pub fn verify_checksum(mut self, verify: bool) -> Self {
        self.verify_checksum = verify;
        self
    }
}

impl AutomatonSource for BinaryFileSource {
    fn load(&self) -> Result<Automaton, AutomatonError> {
        Automaton::open_with(&self.path, self.verify_checksum)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory `(pattern, entry_ref)` pairs compiled when the gate first loads.
#[derive(Debug, Clone)]
pub struct PatternSource {
    pairs: Vec<(String, String)>,
    options: BuildOptions,
}

impl PatternSource {
    pub fn new<I, P, E>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (P, E)>,
        P: Into<String>,
        E: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(p, e)| (p.into(), e.into()))
                .collect(),
            options: BuildOptions::default(),
        }
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }
}

impl AutomatonSource for PatternSource {
    fn load(&self) -> Result<Automaton, AutomatonError> {
        let pairs = self.pairs.iter().map(|(p, e)| (p.as_str(), e.as_str()));
        let (automaton, report) = Automaton::build(pairs, self.options)?;
        debug!(
            accepted = report.accepted,
            rejected = report.rejected.len(),
            "built automaton from patterns"
        );
        Ok(automaton)
    }

    fn describe(&self) -> String {
        format!("{} pattern rows", self.pairs.len())
    }
}
