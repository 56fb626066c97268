//! Pattern-driven lexer collaborator.
//!
//! Turns source text into the token vector the driver consumes:
//! 1. Patterns declare matchers (literal strings or regexes), a group
//!    list, an optional transform into the semantic value type, operator
//!    precedence/associativity, and an `ignored` flag
//! 2. Scanning is longest-match; ties go to the earliest-declared pattern
//! 3. `ignored` matches (typically whitespace) produce no token
//! 4. The stream always ends with the `$` end-of-input sentinel
//!
//! Regex matchers are compiled once, anchored at the scan position. A
//! position that no pattern matches is a [`LexError`].

use std::sync::Arc;

use regex::Regex;

use crate::errors::{BuildError, LexError};
use crate::symbol::Symbol;

/// Associativity of a terminal, used for shift/reduce conflict
/// resolution at equal precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Associativity {
    Left,
    Right,
    #[default]
    None,
}

/// A lexical matcher: an exact string or a regex source.
#[derive(Debug, Clone)]
pub enum Matcher {
    Literal(String),
    Regex(String),
}

/// Transform from a matched lexeme into a semantic value.
pub type Transform<V> = Arc<dyn Fn(&str) -> V + Send + Sync>;

/// A lexical pattern: `(name, matchers, options)`.
///
/// Constructed via [`Pattern::literal`] / [`Pattern::regex`]; non-default
/// options are set on the returned value via field mutation or the
/// `with_*` helpers.
pub struct Pattern<V> {
    /// Terminal name this pattern produces (the driver's alphabet key).
    pub name: String,
    /// Matchers tried at each scan position; any may win.
    pub matchers: Vec<Matcher>,
    /// Group names this pattern belongs to, for `:Group:` rule expansion.
    pub groups: Vec<String>,
    /// Optional lexeme transform producing the token's `literal` value.
    pub transform: Option<Transform<V>>,
    /// Operator precedence (0 = undeclared).
    pub precedence: u32,
    /// Operator associativity.
    pub associativity: Associativity,
    /// Matches are consumed without producing a token.
    pub ignored: bool,
}

impl<V> Pattern<V> {
    /// A pattern matching an exact string.
    pub fn literal(name: impl Into<String>, text: impl Into<String>) -> Self {
        Pattern {
            name: name.into(),
            matchers: vec![Matcher::Literal(text.into())],
            groups: Vec::new(),
            transform: None,
            precedence: 0,
            associativity: Associativity::None,
            ignored: false,
        }
    }

    /// A pattern matching a regex, anchored at the scan position.
    pub fn regex(name: impl Into<String>, source: impl Into<String>) -> Self {
        Pattern {
            name: name.into(),
            matchers: vec![Matcher::Regex(source.into())],
            groups: Vec::new(),
            transform: None,
            precedence: 0,
            associativity: Associativity::None,
            ignored: false,
        }
    }

    pub fn with_precedence(mut self, precedence: u32, associativity: Associativity) -> Self {
        self.precedence = precedence;
        self.associativity = associativity;
        self
    }

    pub fn with_groups(mut self, groups: &[&str]) -> Self {
        self.groups = groups.iter().map(|g| g.to_string()).collect();
        self
    }

    pub fn with_transform(mut self, transform: impl Fn(&str) -> V + Send + Sync + 'static) -> Self {
        self.transform = Some(Arc::new(transform));
        self
    }

    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }
}

impl<V> Clone for Pattern<V> {
    fn clone(&self) -> Self {
        Pattern {
            name: self.name.clone(),
            matchers: self.matchers.clone(),
            groups: self.groups.clone(),
            transform: self.transform.clone(),
            precedence: self.precedence,
            associativity: self.associativity,
            ignored: self.ignored,
        }
    }
}

impl<V> std::fmt::Debug for Pattern<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pattern")
            .field("name", &self.name)
            .field("matchers", &self.matchers)
            .field("groups", &self.groups)
            .field("precedence", &self.precedence)
            .field("associativity", &self.associativity)
            .field("ignored", &self.ignored)
            .finish()
    }
}

/// Source position: byte offset plus 1-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// The start of the input: offset 0, line 1, column 1.
    pub fn origin() -> Self {
        Position { offset: 0, line: 1, column: 1 }
    }

    /// Advance over a lexeme, tracking newlines.
    fn advance(&mut self, lexeme: &str) {
        self.offset += lexeme.len();
        for ch in lexeme.chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }
}

/// A lexed token. The driver's alphabet is keyed on `ty`.
#[derive(Debug, Clone)]
pub struct Token<V> {
    pub ty: Symbol,
    pub lexeme: String,
    /// The pattern transform's output, when one was declared.
    pub literal: Option<V>,
    pub groups: Vec<String>,
    pub precedence: u32,
    pub associativity: Associativity,
    pub start: Position,
    pub end: Position,
}

impl<V> Token<V> {
    /// A bare token of the given type, for pre-lexed [`crate::Parser::parse_tokens`]
    /// input assembled by hand.
    pub fn of_type(ty: impl Into<Symbol>) -> Self {
        Token {
            ty: ty.into(),
            lexeme: String::new(),
            literal: None,
            groups: Vec::new(),
            precedence: 0,
            associativity: Associativity::None,
            start: Position::origin(),
            end: Position::origin(),
        }
    }

    /// The `$` end-of-input sentinel token.
    pub fn end_sentinel(at: Position) -> Self {
        Token {
            ty: Symbol::end(),
            lexeme: String::new(),
            literal: None,
            groups: Vec::new(),
            precedence: 0,
            associativity: Associativity::None,
            start: at,
            end: at,
        }
    }
}

/// A pattern with its regex matchers compiled.
struct CompiledPattern<V> {
    pattern: Pattern<V>,
    matchers: Vec<CompiledMatcher>,
}

enum CompiledMatcher {
    Literal(String),
    Regex(Regex),
}

/// The lexer: compiled patterns in declaration order.
pub struct Lexer<V> {
    patterns: Vec<CompiledPattern<V>>,
}

impl<V> Lexer<V> {
    /// Compile all pattern matchers. Regex sources are wrapped in
    /// `\A(?:…)` so matches anchor at the scan position.
    pub fn new(patterns: Vec<Pattern<V>>) -> Result<Self, BuildError> {
        let mut compiled = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let mut matchers = Vec::with_capacity(pattern.matchers.len());
            for matcher in &pattern.matchers {
                matchers.push(match matcher {
                    Matcher::Literal(text) => CompiledMatcher::Literal(text.clone()),
                    Matcher::Regex(source) => {
                        let anchored = format!(r"\A(?:{})", source);
                        let regex = Regex::new(&anchored).map_err(|source| {
                            BuildError::InvalidPattern { name: pattern.name.clone(), source }
                        })?;
                        CompiledMatcher::Regex(regex)
                    },
                });
            }
            compiled.push(CompiledPattern { pattern, matchers });
        }
        Ok(Lexer { patterns: compiled })
    }

    /// Lex the whole input into a `$`-terminated token vector.
    pub fn lex(&self, input: &str) -> Result<Vec<Token<V>>, LexError> {
        let mut tokens = Vec::new();
        let mut pos = Position::origin();

        while pos.offset < input.len() {
            let rest = &input[pos.offset..];
            let matched = self.longest_match(rest);

            let Some((len, compiled)) = matched else {
                let lexeme = rest.chars().next().map(String::from).unwrap_or_default();
                return Err(LexError { lexeme, line: pos.line, column: pos.column });
            };

            let lexeme = &rest[..len];
            let start = pos;
            pos.advance(lexeme);

            if compiled.pattern.ignored {
                continue;
            }
            let pattern = &compiled.pattern;
            tokens.push(Token {
                ty: Symbol::new(&pattern.name),
                lexeme: lexeme.to_string(),
                literal: pattern.transform.as_ref().map(|t| t(lexeme)),
                groups: pattern.groups.clone(),
                precedence: pattern.precedence,
                associativity: pattern.associativity,
                start,
                end: pos,
            });
        }

        tokens.push(Token::end_sentinel(pos));
        Ok(tokens)
    }

    /// The longest match at the head of `rest`, ties broken by pattern
    /// declaration order. Zero-length matches never win.
    fn longest_match(&self, rest: &str) -> Option<(usize, &CompiledPattern<V>)> {
        let mut best: Option<(usize, &CompiledPattern<V>)> = None;
        for compiled in &self.patterns {
            for matcher in &compiled.matchers {
                let len = match matcher {
                    CompiledMatcher::Literal(text) => {
                        rest.starts_with(text.as_str()).then(|| text.len())
                    },
                    CompiledMatcher::Regex(regex) => regex.find(rest).map(|m| m.end()),
                };
                if let Some(len) = len {
                    if len > 0 && best.map_or(true, |(best_len, _)| len > best_len) {
                        best = Some((len, compiled));
                    }
                }
            }
        }
        best
    }
}
