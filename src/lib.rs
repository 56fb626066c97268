//! # LRTaIL — LR(1)/LALR(1) Parser Generator
//!
//! LRTaIL is a runtime parser-generator toolkit for context-free grammars:
//! production rules over named symbols plus lexical patterns go in, a
//! runnable shift/reduce parser comes out. Semantic actions attached to
//! each rule transform source text into a user-defined value during
//! reduction.
//!
//! ## Architecture
//!
//! ```text
//! GrammarSpec { rules, patterns }
//!        │
//!        ▼
//!  ┌────────────────────────────────────────────┐
//!  │ 1. Grammar facade:                          │
//!  │    :Group: expansion → symbol partition     │
//!  │    → FIRST fixed point                      │
//!  │                                             │
//!  │ 2. Automaton (CLR or LALR):                 │
//!  │    kernel closure → lookahead propagation   │
//!  │    → state expansion (+ LALR merge cascade) │
//!  │                                             │
//!  │ 3. Parse table:                             │
//!  │    Shift/Goto/Reduce/Accept + precedence    │
//!  │    and associativity conflict resolution    │
//!  └────────────────────────────────────────────┘
//!        │
//!        ▼
//!   Parser<V>::parse — lex → shift/reduce drive → semantic value
//! ```
//!
//! The parser is effectively immutable after construction: every `parse`
//! call owns its driver stack, so a built parser can serve calls from
//! several threads.

pub mod automata;
pub mod driver;
pub mod errors;
pub mod grammar;
pub mod lexer;
pub mod symbol;
pub mod table;

#[cfg(test)]
mod tests;

use std::collections::BTreeSet;
use std::sync::Arc;

use automata::Automaton;
use grammar::{detect_grammar_warnings, expand_groups, GrammarCore, RuleCore};
use lexer::Lexer;
use table::{ParseTable, PrecedenceTable};

pub use driver::{Payload, SemanticAction};
pub use errors::{BuildError, ConflictKind, LexError, ParseError};
pub use grammar::GrammarWarning;
pub use lexer::{Associativity, Matcher, Pattern, Position, Token};
pub use symbol::Symbol;

/// Automaton construction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableMode {
    /// Canonical LR(1): one state per distinct kernel + lookahead
    /// combination.
    Clr,
    /// LALR(1): states merged by kernel core with unioned lookaheads
    /// (default — smaller tables, same language for most grammars).
    #[default]
    Lalr,
}

/// Global override for shift/reduce conflicts left open by equal
/// precedence and `None` associativity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Favor {
    Shift,
    Reduce,
    /// No override: such conflicts are hard errors (default).
    #[default]
    None,
}

/// Parser configuration.
///
/// Non-default fields are set by mutation on the returned value:
///
/// ```
/// # use lrtail::ParserOptions;
/// let mut options = ParserOptions::default();
/// options.max_iterations = 100;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ParserOptions {
    /// Driver iteration ceiling; exceeding it aborts the parse with
    /// [`ParseError::IterationLimit`].
    pub max_iterations: usize,
    /// Print construction stats and driver steps to stderr.
    pub debug: bool,
    /// Conflict favor override.
    pub favor: Favor,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions { max_iterations: 5000, debug: false, favor: Favor::None }
    }
}

/// A production rule specification: `(lhs, rhs, action)`.
///
/// The rhs is given as a whitespace-separated symbol string or a symbol
/// list; `ε` alone denotes the empty production. The action defaults to
/// the identity: a single payload passes through, anything else becomes
/// the payload list.
pub struct RuleSpec<V> {
    pub lhs: String,
    pub rhs: Vec<String>,
    pub action: Option<SemanticAction<V>>,
}

impl<V> RuleSpec<V> {
    /// A rule with a whitespace-separated rhs and the default action:
    /// `RuleSpec::new("S", "S PLUS S")`.
    pub fn new(lhs: impl Into<String>, rhs: &str) -> Self {
        RuleSpec {
            lhs: lhs.into(),
            rhs: rhs.split_whitespace().map(str::to_string).collect(),
            action: None,
        }
    }

    /// A rule with an explicit symbol list.
    pub fn from_symbols(lhs: impl Into<String>, rhs: &[&str]) -> Self {
        RuleSpec {
            lhs: lhs.into(),
            rhs: rhs.iter().map(|s| s.to_string()).collect(),
            action: None,
        }
    }

    /// Attach a semantic action.
    pub fn with_action(
        mut self,
        action: impl Fn(Vec<Payload<V>>) -> Payload<V> + Send + Sync + 'static,
    ) -> Self {
        self.action = Some(Arc::new(action));
        self
    }
}

impl<V> Clone for RuleSpec<V> {
    fn clone(&self) -> Self {
        RuleSpec {
            lhs: self.lhs.clone(),
            rhs: self.rhs.clone(),
            action: self.action.clone(),
        }
    }
}

impl<V> std::fmt::Debug for RuleSpec<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSpec")
            .field("lhs", &self.lhs)
            .field("rhs", &self.rhs)
            .field("has_action", &self.action.is_some())
            .finish()
    }
}

/// The complete grammar input: ordered production rules plus lexical
/// patterns. Rule 0 is the start rule.
pub struct GrammarSpec<V> {
    /// Grammar name, used in diagnostics.
    pub name: String,
    pub rules: Vec<RuleSpec<V>>,
    pub patterns: Vec<Pattern<V>>,
}

impl<V> GrammarSpec<V> {
    pub fn new(name: impl Into<String>) -> Self {
        GrammarSpec { name: name.into(), rules: Vec::new(), patterns: Vec::new() }
    }
}

/// A built parser: compiled grammar, automaton, table, and lexer.
/// Construct once, parse many times.
pub struct Parser<V> {
    name: String,
    grammar: GrammarCore,
    actions: Vec<Option<SemanticAction<V>>>,
    lexer: Lexer<V>,
    automaton: Automaton,
    table: ParseTable,
    options: ParserOptions,
    warnings: Vec<GrammarWarning>,
}

impl<V> Parser<V> {
    /// Build a parser: expand groups, compile the grammar, construct the
    /// automaton and table, compile the lexer.
    ///
    /// Grammar warnings (undefined symbols, unreachable variables) are
    /// printed to stderr and kept for [`Parser::warnings`]; conflicts that
    /// survive precedence resolution abort with [`BuildError::NotLr1`].
    pub fn new(
        spec: GrammarSpec<V>,
        mode: TableMode,
        options: ParserOptions,
    ) -> Result<Self, BuildError> {
        let GrammarSpec { name, rules, patterns } = spec;

        let rules = expand_groups(rules, &patterns);
        if rules.is_empty() {
            return Err(BuildError::EmptyGrammar);
        }

        let mut cores = Vec::with_capacity(rules.len());
        let mut actions = Vec::with_capacity(rules.len() + 1);
        actions.push(None); // the augmented rule never reduces
        for rule in rules {
            let rhs: Vec<Symbol> = rule
                .rhs
                .iter()
                .map(Symbol::new)
                .filter(|s| !s.is_epsilon())
                .collect();
            cores.push(RuleCore { lhs: Symbol::new(&rule.lhs), rhs });
            actions.push(rule.action);
        }
        let grammar = GrammarCore::new(cores);

        let pattern_names: BTreeSet<Symbol> =
            patterns.iter().map(|p| Symbol::new(&p.name)).collect();
        let warnings = detect_grammar_warnings(&grammar, &pattern_names);
        for warning in &warnings {
            eprintln!("warning: {warning}");
        }

        let automaton = Automaton::build(&grammar, mode);
        let precedence = PrecedenceTable::from_patterns(&patterns);
        let table = ParseTable::build(&grammar, &automaton, &precedence, options.favor)?;
        let lexer = Lexer::new(patterns)?;

        if options.debug {
            eprintln!("lrtail: {name}: {:?}", automaton.stats);
            eprintln!("lrtail: {name}: {:?}", table.stats);
        }

        Ok(Parser { name, grammar, actions, lexer, automaton, table, options, warnings })
    }

    /// Build an LALR(1) parser with default options.
    pub fn lalr(spec: GrammarSpec<V>) -> Result<Self, BuildError> {
        Parser::new(spec, TableMode::Lalr, ParserOptions::default())
    }

    /// Build a canonical LR(1) parser with default options.
    pub fn clr(spec: GrammarSpec<V>) -> Result<Self, BuildError> {
        Parser::new(spec, TableMode::Clr, ParserOptions::default())
    }

    /// Lex and parse source text, returning the start rule's semantic
    /// value.
    pub fn parse(&self, input: &str) -> Result<Payload<V>, ParseError> {
        let tokens = self.lexer.lex(input)?;
        self.parse_tokens(tokens)
    }

    /// Drive a pre-lexed token stream. The `$` sentinel is appended when
    /// missing.
    pub fn parse_tokens(&self, tokens: Vec<Token<V>>) -> Result<Payload<V>, ParseError> {
        driver::run(
            &self.grammar,
            &self.actions,
            &self.table,
            tokens,
            self.options.max_iterations,
            self.options.debug,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Non-fatal grammar inspection findings from construction.
    pub fn warnings(&self) -> &[GrammarWarning] {
        &self.warnings
    }

    pub fn grammar(&self) -> &GrammarCore {
        &self.grammar
    }

    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    pub fn table(&self) -> &ParseTable {
        &self.table
    }
}
