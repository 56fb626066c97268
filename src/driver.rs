//! The shift/reduce driver: a stack machine over the parse table.
//!
//! The stack alternates state and symbol frames with a state frame at both
//! ends. Shift pushes the consumed token and the target state; reduce pops
//! `2 × arity` frames, hands the popped symbol payloads to the rule's
//! semantic action in original left-to-right order, and pushes the
//! resulting variable frame plus the goto state. Accept returns the start
//! variable's payload.
//!
//! The loop is bounded by `max_iterations`; exceeding it aborts the call
//! with a typed error, never a hang. The driver mutates neither the
//! grammar nor the table, so one parser can serve many `parse` calls.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::automata::StateId;
use crate::errors::ParseError;
use crate::grammar::GrammarCore;
use crate::lexer::Token;
use crate::symbol::Symbol;
use crate::table::{Action, ParseTable};

/// A semantic value threaded through reductions: a consumed token, a
/// user value produced by an action, or the payload list the default
/// action yields for multi-symbol rules.
#[derive(Debug, Clone)]
pub enum Payload<V> {
    Token(Token<V>),
    Value(V),
    List(Vec<Payload<V>>),
}

impl<V> Payload<V> {
    /// Unwrap into the user value: `Value` directly, a `Token` through its
    /// `literal`. `None` for lists and literal-less tokens.
    pub fn value(self) -> Option<V> {
        match self {
            Payload::Value(v) => Some(v),
            Payload::Token(t) => t.literal,
            Payload::List(_) => None,
        }
    }

    pub fn token(self) -> Option<Token<V>> {
        match self {
            Payload::Token(t) => Some(t),
            _ => None,
        }
    }

    pub fn list(self) -> Option<Vec<Payload<V>>> {
        match self {
            Payload::List(items) => Some(items),
            _ => None,
        }
    }
}

/// A reduction's semantic action: payloads arrive in rhs source order,
/// the return value becomes the reduced variable's payload.
pub type SemanticAction<V> = Arc<dyn Fn(Vec<Payload<V>>) -> Payload<V> + Send + Sync>;

/// One driver stack frame.
enum Frame<V> {
    State(StateId),
    Terminal(Token<V>),
    Variable { payload: Payload<V> },
}

/// Run the driver over a `$`-terminated token vector.
pub fn run<V>(
    grammar: &GrammarCore,
    actions: &[Option<SemanticAction<V>>],
    table: &ParseTable,
    mut tokens: Vec<Token<V>>,
    max_iterations: usize,
    debug: bool,
) -> Result<Payload<V>, ParseError> {
    if tokens.last().map_or(true, |t| !t.ty.is_end()) {
        let at = tokens.last().map(|t| t.end).unwrap_or_else(crate::lexer::Position::origin);
        tokens.push(Token::end_sentinel(at));
    }

    let mut stack: Vec<Frame<V>> = vec![Frame::State(0)];
    let mut input = tokens.into_iter();
    let mut head = input.next();
    let mut iterations = 0usize;

    loop {
        if iterations >= max_iterations {
            return Err(ParseError::IterationLimit { limit: max_iterations });
        }
        iterations += 1;

        let state = top_state(&stack);
        let Some(token) = head.as_ref() else {
            // Only reachable when a grammar shifts `$` itself.
            return Err(unexpected(grammar, table, state, "", 0, 0));
        };

        match table.action(state, &token.ty) {
            None | Some(Action::Goto(_)) => {
                return Err(unexpected(
                    grammar,
                    table,
                    state,
                    &token.lexeme,
                    token.start.line,
                    token.start.column,
                ));
            },
            Some(Action::Shift(target)) => {
                if debug {
                    eprintln!("driver: state {state} shift '{}' → state {target}", token.ty);
                }
                let token = head.take().expect("head token checked above");
                stack.push(Frame::Terminal(token));
                stack.push(Frame::State(target));
                head = input.next();
            },
            Some(Action::Reduce(rule)) => {
                let arity = grammar.rule(rule).arity();
                let mut payloads = Vec::with_capacity(arity);
                for _ in 0..arity {
                    stack.pop().expect("state frame above each symbol frame");
                    match stack.pop() {
                        Some(Frame::Terminal(token)) => payloads.push(Payload::Token(token)),
                        Some(Frame::Variable { payload }) => payloads.push(payload),
                        _ => unreachable!("state and symbol frames alternate"),
                    }
                }
                // Popped right-to-left; actions see rhs source order.
                payloads.reverse();

                let payload = match &actions[rule] {
                    Some(action) => action(payloads),
                    None => default_action(payloads),
                };

                let lhs = &grammar.rule(rule).lhs;
                if debug {
                    eprintln!(
                        "driver: state {state} reduce {}",
                        crate::automata::Lr0Item::new(rule, arity).display(grammar)
                    );
                }
                let back = top_state(&stack);
                let target = match table.action(back, lhs) {
                    Some(Action::Goto(target)) => target,
                    _ => unreachable!("table always holds a goto for a reduced variable"),
                };
                stack.push(Frame::Variable { payload });
                stack.push(Frame::State(target));
            },
            Some(Action::Accept) => {
                if debug {
                    eprintln!("driver: state {state} accept");
                }
                let start_frame = stack
                    .into_iter()
                    .nth(1)
                    .expect("accepting stack holds the start variable");
                match start_frame {
                    Frame::Variable { payload } => return Ok(payload),
                    _ => unreachable!("frame above the bottom state is the start variable"),
                }
            },
        }
    }
}

/// The identity action: a lone payload passes through, anything else
/// becomes the payload list.
fn default_action<V>(mut payloads: Vec<Payload<V>>) -> Payload<V> {
    if payloads.len() == 1 {
        payloads.pop().expect("length checked")
    } else {
        Payload::List(payloads)
    }
}

fn top_state<V>(stack: &[Frame<V>]) -> StateId {
    match stack.last() {
        Some(Frame::State(id)) => *id,
        _ => unreachable!("stack top is always a state frame"),
    }
}

/// Build the advisory suggestion set for an unexpected token: terminals
/// the state can shift, plus FIRST of every variable the state can goto,
/// minus `ε` and `$`.
fn unexpected(
    grammar: &GrammarCore,
    table: &ParseTable,
    state: StateId,
    lexeme: &str,
    line: usize,
    column: usize,
) -> ParseError {
    let mut expected: BTreeSet<Symbol> = BTreeSet::new();
    for (sym, action) in &table.rows[state] {
        match action {
            Action::Shift(_) => {
                expected.insert(sym.clone());
            },
            Action::Goto(_) => {
                expected.extend(grammar.first_of(sym));
            },
            _ => {},
        }
    }
    expected.remove(&Symbol::epsilon());
    expected.remove(&Symbol::end());

    ParseError::UnexpectedToken {
        lexeme: lexeme.to_string(),
        line,
        column,
        expected: expected.into_iter().collect(),
    }
}
