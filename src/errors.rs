//! Typed error surface.
//!
//! Construction-time failures (`BuildError`) abort parser construction;
//! parse-time failures (`ParseError`) abort the current `parse` call. There
//! is no recovery: the first error wins. Every variant carries enough
//! context for the caller to surface positions and suggestions without
//! stack traces.

use thiserror::Error;

use crate::symbol::Symbol;

/// The unresolved-conflict subkind reported by [`BuildError::NotLr1`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    ShiftReduce,
    ReduceReduce,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictKind::ShiftReduce => f.write_str("shift/reduce"),
            ConflictKind::ReduceReduce => f.write_str("reduce/reduce"),
        }
    }
}

/// Fatal construction-time failures.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A parsing conflict survived precedence/associativity resolution.
    #[error("grammar is not LR(1): {conflict} conflict in state {state} on '{symbol}'")]
    NotLr1 {
        conflict: ConflictKind,
        state: usize,
        symbol: Symbol,
    },

    /// A pattern's regex matcher failed to compile.
    #[error("pattern '{name}' has an invalid matcher")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    /// The grammar has no production rules.
    #[error("grammar has no production rules")]
    EmptyGrammar,
}

/// A lexing failure: no pattern matched at the given position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized input '{lexeme}' at line {line}, column {column}")]
pub struct LexError {
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
}

/// Parse-time failures surfaced by [`crate::Parser::parse`].
#[derive(Debug, Error)]
pub enum ParseError {
    /// The driver found no table action for the head token. The `expected`
    /// list is an advisory suggestion set: terminals the state could shift,
    /// plus the FIRST sets of variables the state could goto.
    #[error("unexpected token '{lexeme}' at line {line}, column {column}; expected one of [{}]",
            .expected.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", "))]
    UnexpectedToken {
        lexeme: String,
        line: usize,
        column: usize,
        expected: Vec<Symbol>,
    },

    /// The driver exceeded its configured iteration ceiling.
    #[error("parse exceeded the iteration limit of {limit}")]
    IterationLimit { limit: usize },

    /// The lexer collaborator rejected the input.
    #[error(transparent)]
    Lex(#[from] LexError),
}
