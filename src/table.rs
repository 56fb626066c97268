//! Parse-table assembly and conflict resolution.
//!
//! For each state: terminals with transitions become `Shift`, variables
//! become `Goto`, completed closure items become `Reduce` under each of
//! their lookaheads, and the completed augmented item becomes `Accept`
//! under `$` (and only `$`).
//!
//! Cells that accumulate more than one action are resolved with operator
//! precedence and associativity:
//! - **Shift/Reduce**: the terminal's declared precedence against the
//!   rule's (the max declared precedence of any rhs terminal). Higher
//!   precedence wins; at equal precedence the terminal's associativity
//!   decides (`Left` ⇒ Reduce, `Right` ⇒ Shift), and `None` falls through
//!   to the global `favor` setting
//! - **Reduce/Reduce**: the unique highest-precedence rule wins; a tie at
//!   the top is a hard conflict
//!
//! Hard conflicts abort construction with [`BuildError::NotLr1`].

use std::collections::BTreeMap;

use crate::automata::{Automaton, State, StateId};
use crate::errors::{BuildError, ConflictKind};
use crate::grammar::{GrammarCore, RuleId};
use crate::lexer::{Associativity, Pattern};
use crate::symbol::Symbol;
use crate::Favor;

/// A resolved parse action. At most one occupies each `(state, symbol)`
/// cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Shift(StateId),
    Goto(StateId),
    Reduce(RuleId),
    Accept,
}

/// Declared precedence and associativity per terminal, projected from the
/// lexical patterns. Undeclared terminals read as precedence 0,
/// associativity `None`.
#[derive(Debug, Clone, Default)]
pub struct PrecedenceTable {
    entries: BTreeMap<Symbol, (u32, Associativity)>,
}

impl PrecedenceTable {
    pub fn from_patterns<V>(patterns: &[Pattern<V>]) -> Self {
        let entries = patterns
            .iter()
            .map(|p| (Symbol::new(&p.name), (p.precedence, p.associativity)))
            .collect();
        PrecedenceTable { entries }
    }

    pub fn precedence(&self, sym: &Symbol) -> u32 {
        self.entries.get(sym).map_or(0, |(p, _)| *p)
    }

    pub fn associativity(&self, sym: &Symbol) -> Associativity {
        self.entries.get(sym).map_or(Associativity::None, |(_, a)| *a)
    }

    /// A rule's precedence: the max declared precedence of any terminal in
    /// its rhs, or 0 when it has none.
    pub fn rule_precedence(&self, grammar: &GrammarCore, rule: RuleId) -> u32 {
        grammar
            .rule(rule)
            .rhs
            .iter()
            .filter(|sym| !grammar.is_variable(sym))
            .map(|sym| self.precedence(sym))
            .max()
            .unwrap_or(0)
    }
}

/// Assembly statistics, printed to stderr when the parser is built with
/// `debug` set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableStats {
    pub num_states: usize,
    pub num_actions: usize,
    /// Shift/reduce cells settled by precedence, associativity, or favor.
    pub resolved_shift_reduce: usize,
    /// Reduce/reduce cells settled by precedence.
    pub resolved_reduce_reduce: usize,
}

/// The dense parse table: one action map per state.
#[derive(Debug, Clone)]
pub struct ParseTable {
    pub rows: Vec<BTreeMap<Symbol, Action>>,
    pub stats: TableStats,
}

/// Unresolved actions accumulated in one cell before resolution.
#[derive(Debug, Default)]
struct Cell {
    shift: Option<StateId>,
    goto: Option<StateId>,
    reduces: Vec<RuleId>,
    accept: bool,
}

impl ParseTable {
    /// Assemble and resolve the table for a built automaton.
    pub fn build(
        grammar: &GrammarCore,
        automaton: &Automaton,
        precedence: &PrecedenceTable,
        favor: Favor,
    ) -> Result<Self, BuildError> {
        let mut stats = TableStats { num_states: automaton.num_states(), ..Default::default() };
        let mut rows = Vec::with_capacity(automaton.num_states());
        for state in &automaton.states {
            rows.push(build_row(grammar, state, precedence, favor, &mut stats)?);
        }
        stats.num_actions = rows.iter().map(|r| r.len()).sum();
        Ok(ParseTable { rows, stats })
    }

    /// The action for `(state, symbol)`, if the cell is populated.
    pub fn action(&self, state: StateId, sym: &Symbol) -> Option<Action> {
        self.rows[state].get(sym).copied()
    }
}

fn build_row(
    grammar: &GrammarCore,
    state: &State,
    precedence: &PrecedenceTable,
    favor: Favor,
    stats: &mut TableStats,
) -> Result<BTreeMap<Symbol, Action>, BuildError> {
    let mut cells: BTreeMap<Symbol, Cell> = BTreeMap::new();

    for (sym, target) in &state.transitions {
        let cell = cells.entry(sym.clone()).or_default();
        if grammar.is_variable(sym) {
            cell.goto = Some(*target);
        } else {
            cell.shift = Some(*target);
        }
    }

    for item in state.completed_items(grammar) {
        if grammar.rule(item.core.rule).lhs.is_augmented() {
            cells.entry(Symbol::end()).or_default().accept = true;
        } else {
            for la in &item.lookaheads {
                cells.entry(la.clone()).or_default().reduces.push(item.core.rule);
            }
        }
    }

    let mut row = BTreeMap::new();
    for (sym, cell) in cells {
        let action = resolve_cell(grammar, state.id, &sym, cell, precedence, favor, stats)?;
        row.insert(sym, action);
    }
    Ok(row)
}

fn resolve_cell(
    grammar: &GrammarCore,
    state: StateId,
    sym: &Symbol,
    cell: Cell,
    precedence: &PrecedenceTable,
    favor: Favor,
    stats: &mut TableStats,
) -> Result<Action, BuildError> {
    if let Some(target) = cell.goto {
        // Variable cells never reduce: lookaheads are terminals only.
        return Ok(Action::Goto(target));
    }

    if cell.accept {
        // Accepting competes with nothing; a grammar that reduces another
        // rule on `$` in the accept state is not LR(1).
        if cell.shift.is_some() {
            return Err(conflict(ConflictKind::ShiftReduce, state, sym));
        }
        if !cell.reduces.is_empty() {
            return Err(conflict(ConflictKind::ReduceReduce, state, sym));
        }
        return Ok(Action::Accept);
    }

    let reduce = match cell.reduces.len() {
        0 => None,
        1 => Some(cell.reduces[0]),
        _ => {
            let winner = resolve_reduce_reduce(grammar, state, sym, &cell.reduces, precedence)?;
            stats.resolved_reduce_reduce += 1;
            Some(winner)
        },
    };

    match (cell.shift, reduce) {
        (Some(target), None) => Ok(Action::Shift(target)),
        (None, Some(rule)) => Ok(Action::Reduce(rule)),
        (Some(target), Some(rule)) => {
            let action =
                resolve_shift_reduce(grammar, state, sym, target, rule, precedence, favor)?;
            stats.resolved_shift_reduce += 1;
            Ok(action)
        },
        (None, None) => unreachable!("empty cells are never materialized"),
    }
}

fn resolve_shift_reduce(
    grammar: &GrammarCore,
    state: StateId,
    sym: &Symbol,
    target: StateId,
    rule: RuleId,
    precedence: &PrecedenceTable,
    favor: Favor,
) -> Result<Action, BuildError> {
    let terminal_prec = precedence.precedence(sym);
    let rule_prec = precedence.rule_precedence(grammar, rule);

    if terminal_prec > rule_prec {
        return Ok(Action::Shift(target));
    }
    if terminal_prec < rule_prec {
        return Ok(Action::Reduce(rule));
    }
    match precedence.associativity(sym) {
        Associativity::Left => Ok(Action::Reduce(rule)),
        Associativity::Right => Ok(Action::Shift(target)),
        Associativity::None => match favor {
            Favor::Shift => Ok(Action::Shift(target)),
            Favor::Reduce => Ok(Action::Reduce(rule)),
            Favor::None => Err(conflict(ConflictKind::ShiftReduce, state, sym)),
        },
    }
}

/// The unique highest-precedence rule wins; a tie at the top — including
/// all rules undeclared at precedence 0 — is a hard conflict.
fn resolve_reduce_reduce(
    grammar: &GrammarCore,
    state: StateId,
    sym: &Symbol,
    reduces: &[RuleId],
    precedence: &PrecedenceTable,
) -> Result<RuleId, BuildError> {
    let precedences: Vec<u32> = reduces
        .iter()
        .map(|&r| precedence.rule_precedence(grammar, r))
        .collect();
    let max = *precedences.iter().max().expect("at least two competing reduces");
    if precedences.iter().filter(|&&p| p == max).count() > 1 {
        return Err(conflict(ConflictKind::ReduceReduce, state, sym));
    }
    let winner = reduces[precedences.iter().position(|&p| p == max).unwrap()];
    Ok(winner)
}

fn conflict(kind: ConflictKind, state: StateId, sym: &Symbol) -> BuildError {
    BuildError::NotLr1 { conflict: kind, state, symbol: sym.clone() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::RuleCore;
    use crate::TableMode;

    fn rule(lhs: &str, rhs: &[&str]) -> RuleCore {
        RuleCore {
            lhs: Symbol::new(lhs),
            rhs: rhs.iter().map(Symbol::new).collect(),
        }
    }

    fn plus_patterns(assoc: Associativity) -> PrecedenceTable {
        PrecedenceTable::from_patterns(&[
            Pattern::<i64>::literal("+", "+").with_precedence(1, assoc),
        ])
    }

    #[test]
    fn test_ambiguous_grammar_conflicts_without_associativity() {
        let g = GrammarCore::new(vec![rule("S", &["S", "+", "S"]), rule("S", &["a"])]);
        let automaton = Automaton::build(&g, TableMode::Lalr);
        let result = ParseTable::build(
            &g,
            &automaton,
            &plus_patterns(Associativity::None),
            Favor::None,
        );
        assert!(
            matches!(
                result,
                Err(BuildError::NotLr1 { conflict: ConflictKind::ShiftReduce, ref symbol, .. })
                    if *symbol == "+"
            ),
            "None associativity must leave the shift/reduce conflict hard"
        );
    }

    #[test]
    fn test_left_associativity_resolves_to_reduce() {
        let g = GrammarCore::new(vec![rule("S", &["S", "+", "S"]), rule("S", &["a"])]);
        let automaton = Automaton::build(&g, TableMode::Lalr);
        let table = ParseTable::build(
            &g,
            &automaton,
            &plus_patterns(Associativity::Left),
            Favor::None,
        )
        .expect("left associativity resolves the conflict");
        assert!(table.stats.resolved_shift_reduce > 0);
    }

    #[test]
    fn test_favor_overrides_none_associativity() {
        let g = GrammarCore::new(vec![rule("S", &["S", "+", "S"]), rule("S", &["a"])]);
        let automaton = Automaton::build(&g, TableMode::Lalr);
        let table = ParseTable::build(
            &g,
            &automaton,
            &plus_patterns(Associativity::None),
            Favor::Shift,
        )
        .expect("favor=Shift resolves the None-associativity conflict");
        assert!(table.stats.resolved_shift_reduce > 0);
    }

    #[test]
    fn test_cell_discipline() {
        // Invariant: Shift only on terminals, Goto only on variables,
        // Accept only under `$`.
        let g = GrammarCore::new(vec![rule("S", &["S", "+", "a"]), rule("S", &["a"])]);
        let automaton = Automaton::build(&g, TableMode::Lalr);
        let table =
            ParseTable::build(&g, &automaton, &PrecedenceTable::default(), Favor::None).unwrap();
        for row in &table.rows {
            for (sym, action) in row {
                match action {
                    Action::Shift(_) | Action::Reduce(_) => {
                        assert!(!g.is_variable(sym), "terminal action on variable {sym}")
                    },
                    Action::Goto(_) => {
                        assert!(g.is_variable(sym), "goto on terminal {sym}")
                    },
                    Action::Accept => assert!(sym.is_end(), "accept under {sym}"),
                }
            }
        }
    }

    #[test]
    fn test_rule_precedence_is_max_of_rhs_terminals() {
        let g = GrammarCore::new(vec![rule("S", &["a", "S", "b"]), rule("S", &["c"])]);
        let precedence = PrecedenceTable::from_patterns(&[
            Pattern::<i64>::literal("a", "a").with_precedence(1, Associativity::Left),
            Pattern::<i64>::literal("b", "b").with_precedence(3, Associativity::Left),
        ]);
        // internal rule 1 is S → a S b
        assert_eq!(precedence.rule_precedence(&g, 1), 3);
        // internal rule 2 is S → c, no declared terminals
        assert_eq!(precedence.rule_precedence(&g, 2), 0);
    }
}
