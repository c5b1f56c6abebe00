//! Multi-pattern matching of Korean dictionary expressions in running text.
//!
//! An [`Automaton`] is compiled once from `(pattern, entry_ref)` pairs and then
//! scanned any number of times, concurrently, with [`Automaton::find_matches`].
//! [`AutomatonGate`] wraps construction or deserialization behind a
//! load-once availability gate for hosts that cannot build up front.

pub mod automaton;
pub mod gate;
pub mod matcher;
pub mod settings;
pub mod unicode;

pub use automaton::{
    Automaton, AutomatonBuilder, AutomatonError, AutomatonStats, BuildOptions, BuildReport,
    PatternError,
};
pub use gate::{
    AutomatonGate, AutomatonSource, BinaryFileSource, GateError, GateState, PatternSource,
};
pub use matcher::{Match, MatchOptions};
