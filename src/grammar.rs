//! Grammar facade: production rules, symbol partitioning, and FIRST sets.
//!
//! Builds the compiled grammar the automaton construction consumes:
//! 1. `:Group:` references in rule right-hand sides are expanded against
//!    the supplied lexical patterns
//! 2. Rules are normalized (an `[ε]` right-hand side becomes empty) and the
//!    synthetic augmented rule `AUG → start` is installed as rule 0
//! 3. Symbols are partitioned into variables and terminals
//! 4. `FIRST` sets are computed by fixed-point iteration
//!
//! The compiled form ([`GrammarCore`]) is deliberately free of the semantic
//! value type: actions are split off and kept alongside the parser, so the
//! whole automaton/table layer stays non-generic.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use crate::lexer::Pattern;
use crate::symbol::Symbol;
use crate::RuleSpec;

/// Identifier of an internal rule. Rule 0 is always the synthetic
/// augmented rule; user rules follow in declaration order.
pub type RuleId = usize;

/// A normalized production rule: `lhs → rhs`, with `[ε]` stored as an
/// empty rhs. The arity (frames popped on reduction) is `rhs.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleCore {
    pub lhs: Symbol,
    pub rhs: Vec<Symbol>,
}

impl RuleCore {
    pub fn arity(&self) -> usize {
        self.rhs.len()
    }
}

/// The compiled grammar: normalized rules, the variable/terminal
/// partition, and FIRST sets.
#[derive(Debug, Clone)]
pub struct GrammarCore {
    rules: Vec<RuleCore>,
    variables: BTreeSet<Symbol>,
    terminals: BTreeSet<Symbol>,
    first: BTreeMap<Symbol, BTreeSet<Symbol>>,
}

impl GrammarCore {
    /// Compile a rule list. The caller supplies user rules only; the
    /// augmented rule `AUG → start` (start = lhs of the first user rule)
    /// is synthesized here as rule 0.
    pub fn new(user_rules: Vec<RuleCore>) -> Self {
        let start = user_rules
            .first()
            .map(|r| r.lhs.clone())
            .expect("grammar must have at least one rule");

        let mut rules = Vec::with_capacity(user_rules.len() + 1);
        rules.push(RuleCore { lhs: Symbol::augmented(), rhs: vec![start] });
        rules.extend(user_rules);

        let variables: BTreeSet<Symbol> = rules.iter().map(|r| r.lhs.clone()).collect();

        let mut terminals = BTreeSet::new();
        terminals.insert(Symbol::end());
        for rule in &rules {
            for sym in &rule.rhs {
                if !variables.contains(sym) && !sym.is_epsilon() {
                    terminals.insert(sym.clone());
                }
            }
        }

        let first = compute_first_sets(&rules, &variables);

        GrammarCore { rules, variables, terminals, first }
    }

    pub fn rules(&self) -> &[RuleCore] {
        &self.rules
    }

    pub fn rule(&self, id: RuleId) -> &RuleCore {
        &self.rules[id]
    }

    /// Number of internal rules (user rules + the augmented rule).
    pub fn num_rules(&self) -> usize {
        self.rules.len()
    }

    /// The grammar's start variable: the lhs of the first user rule.
    pub fn start_symbol(&self) -> &Symbol {
        &self.rules[0].rhs[0]
    }

    pub fn is_variable(&self, sym: &Symbol) -> bool {
        self.variables.contains(sym)
    }

    pub fn variables(&self) -> &BTreeSet<Symbol> {
        &self.variables
    }

    pub fn terminals(&self) -> &BTreeSet<Symbol> {
        &self.terminals
    }

    /// `FIRST(X)`: terminals that can begin a derivation of `X`, plus `ε`
    /// when `X` is nullable. For a terminal this is the singleton set.
    pub fn first_of(&self, sym: &Symbol) -> BTreeSet<Symbol> {
        if let Some(set) = self.first.get(sym) {
            set.clone()
        } else {
            let mut set = BTreeSet::new();
            set.insert(sym.clone());
            set
        }
    }

    /// `FIRST` over a symbol string: the union of each prefix symbol's
    /// FIRST set for as long as the prefix is nullable, with `ε` included
    /// exactly when the whole sequence derives the empty string.
    pub fn first_of_sequence(&self, seq: &[Symbol]) -> BTreeSet<Symbol> {
        first_of_sequence_in(seq, &self.first, &self.variables)
    }
}

/// Fixed-point FIRST computation over all rules.
///
/// Convergence uses a single `changed` flag per pass; lookahead sets only
/// grow and are bounded by the terminal set.
fn compute_first_sets(
    rules: &[RuleCore],
    variables: &BTreeSet<Symbol>,
) -> BTreeMap<Symbol, BTreeSet<Symbol>> {
    let mut first: BTreeMap<Symbol, BTreeSet<Symbol>> = variables
        .iter()
        .map(|v| (v.clone(), BTreeSet::new()))
        .collect();

    loop {
        let mut changed = false;
        for rule in rules {
            let contribution = first_of_sequence_in(&rule.rhs, &first, variables);
            let set = first
                .get_mut(&rule.lhs)
                .expect("every lhs is a registered variable");
            for sym in contribution {
                changed |= set.insert(sym);
            }
        }
        if !changed {
            return first;
        }
    }
}

fn first_of_sequence_in(
    seq: &[Symbol],
    first: &BTreeMap<Symbol, BTreeSet<Symbol>>,
    variables: &BTreeSet<Symbol>,
) -> BTreeSet<Symbol> {
    let mut out = BTreeSet::new();
    for sym in seq {
        if sym.is_epsilon() {
            continue;
        }
        if variables.contains(sym) {
            let set = first.get(sym).cloned().unwrap_or_default();
            let nullable = set.contains(&Symbol::epsilon());
            out.extend(set.into_iter().filter(|s| !s.is_epsilon()));
            if !nullable {
                return out;
            }
        } else {
            out.insert(sym.clone());
            return out;
        }
    }
    out.insert(Symbol::epsilon());
    out
}

// ══════════════════════════════════════════════════════════════════════════════
// Group expansion
// ══════════════════════════════════════════════════════════════════════════════

/// Whether an rhs symbol names a pattern group (`:GroupName:`).
fn is_group_ref(name: &str) -> bool {
    name.len() >= 3 && name.starts_with(':') && name.ends_with(':')
}

/// Expand `:Group:` references before grammar compilation.
///
/// Each occurrence is replaced by one rule per pattern whose `groups` list
/// contains the group name, substituting the pattern name at that position;
/// the grouped rule itself is removed. Expansion is depth-first so a rule
/// with several group references expands to the full cartesian product
/// while preserving declaration order. Rules without group references pass
/// through unchanged.
pub fn expand_groups<V>(rules: Vec<RuleSpec<V>>, patterns: &[Pattern<V>]) -> Vec<RuleSpec<V>> {
    let mut out = Vec::with_capacity(rules.len());
    for rule in rules {
        expand_into(rule, patterns, &mut out);
    }
    out
}

fn expand_into<V>(rule: RuleSpec<V>, patterns: &[Pattern<V>], out: &mut Vec<RuleSpec<V>>) {
    let group_at = rule.rhs.iter().position(|s| is_group_ref(s));
    match group_at {
        None => out.push(rule),
        Some(pos) => {
            let group = &rule.rhs[pos][1..rule.rhs[pos].len() - 1];
            for pattern in patterns.iter().filter(|p| p.groups.iter().any(|g| g == group)) {
                let mut expanded = rule.clone();
                expanded.rhs[pos] = pattern.name.clone();
                expand_into(expanded, patterns, out);
            }
        },
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Grammar inspection
// ══════════════════════════════════════════════════════════════════════════════

/// Non-fatal findings from grammar inspection, emitted to stderr at
/// construction time and retrievable via [`crate::Parser::warnings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarWarning {
    /// A rule references a symbol that is neither a declared variable, a
    /// pattern name, nor `ε`. Only detected when patterns were supplied.
    UndefinedSymbol { rule: usize, symbol: Symbol },
    /// A variable is never reachable from the start variable.
    UnreachableVariable { name: Symbol },
}

impl std::fmt::Display for GrammarWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrammarWarning::UndefinedSymbol { rule, symbol } => write!(
                f,
                "rule {} references \"{}\", which is neither a variable nor a pattern name",
                rule, symbol
            ),
            GrammarWarning::UnreachableVariable { name } => write!(
                f,
                "variable \"{}\" is never reachable from the start variable",
                name
            ),
        }
    }
}

/// Inspect a compiled grammar for undefined symbols and unreachable
/// variables. `pattern_names` is empty when the caller supplied no lexical
/// patterns; the undefined-symbol check is skipped in that case, since the
/// terminal alphabet is then implicitly declared by use.
pub fn detect_grammar_warnings(
    grammar: &GrammarCore,
    pattern_names: &BTreeSet<Symbol>,
) -> Vec<GrammarWarning> {
    let mut warnings = Vec::new();

    if !pattern_names.is_empty() {
        for (id, rule) in grammar.rules().iter().enumerate().skip(1) {
            for sym in &rule.rhs {
                if !grammar.is_variable(sym)
                    && !sym.is_epsilon()
                    && !sym.is_end()
                    && !pattern_names.contains(sym)
                {
                    warnings.push(GrammarWarning::UndefinedSymbol {
                        rule: id - 1,
                        symbol: sym.clone(),
                    });
                }
            }
        }
    }

    let mut reachable: HashSet<Symbol> = HashSet::new();
    let mut queue: VecDeque<Symbol> = VecDeque::new();
    reachable.insert(grammar.start_symbol().clone());
    queue.push_back(grammar.start_symbol().clone());
    while let Some(var) = queue.pop_front() {
        for rule in grammar.rules().iter().filter(|r| r.lhs == var) {
            for sym in &rule.rhs {
                if grammar.is_variable(sym) && reachable.insert(sym.clone()) {
                    queue.push_back(sym.clone());
                }
            }
        }
    }
    for var in grammar.variables() {
        if !var.is_augmented() && !reachable.contains(var) {
            warnings.push(GrammarWarning::UnreachableVariable { name: var.clone() });
        }
    }

    warnings
}
