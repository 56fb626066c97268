//! Automaton population and state expansion.
//!
//! Construction is a worklist over state ids. Processing a state runs
//! `resolve` (closure + lookahead propagation) and then `expand`: for each
//! distinct symbol σ after a dot in the closure, in first-appearance
//! order, a candidate kernel is built by advancing every σ-item and the
//! σ-transition is installed to an existing or freshly registered state.
//!
//! The two strategies differ only in kernel lookup:
//! - **CLR** reuses a state only on full kernel equality (lookaheads
//!   included)
//! - **LALR** reuses on core equality; when the existing kernel does not
//!   already cover the candidate's lookaheads, they are unioned in and the
//!   state is requeued for re-resolution and re-expansion, which may
//!   cascade into further merges until the queue drains
//!
//! Kernel lookup scans states in id order, so the first match — and with
//! it the whole numbering — is deterministic.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::automata::closure::{self, FirstCache};
use crate::automata::item::Lr1Item;
use crate::automata::StateId;
use crate::grammar::GrammarCore;
use crate::symbol::Symbol;
use crate::TableMode;

/// One automaton state: a kernel, its closure, and outgoing transitions
/// keyed by symbol.
#[derive(Debug, Clone)]
pub struct State {
    pub id: StateId,
    /// Items introduced by the transition that created this state (or the
    /// augmented item for state 0).
    pub kernel: Vec<Lr1Item>,
    /// Kernel plus all items reachable by expanding variables at the dot.
    /// Kernel items occupy the front.
    pub closure: Vec<Lr1Item>,
    /// Outgoing transitions; keys are exactly the non-ε symbols appearing
    /// after a dot in the closure.
    pub transitions: BTreeMap<Symbol, StateId>,
    /// Transition symbols in first-appearance order within the closure;
    /// expansion visits them in this order so state numbering is stable.
    pub expandables: Vec<Symbol>,
}

impl State {
    fn new(id: StateId, kernel: Vec<Lr1Item>) -> Self {
        State {
            id,
            kernel,
            closure: Vec::new(),
            transitions: BTreeMap::new(),
            expandables: Vec::new(),
        }
    }

    /// Recompute closure, expandables, and clear transitions for
    /// (re-)expansion.
    fn resolve(&mut self, grammar: &GrammarCore, cache: &mut FirstCache) {
        self.closure = closure::resolve(&self.kernel, grammar, cache);
        self.expandables.clear();
        for item in &self.closure {
            if let Some(sym) = item.core.next_symbol(grammar) {
                if !self.expandables.contains(sym) {
                    self.expandables.push(sym.clone());
                }
            }
        }
        self.transitions.clear();
    }

    /// Candidate kernel for the σ-transition: every closure item with σ
    /// after the dot, advanced, lookaheads copied.
    fn candidate_kernel(&self, sym: &Symbol, grammar: &GrammarCore) -> Vec<Lr1Item> {
        self.closure
            .iter()
            .filter(|item| item.core.next_symbol(grammar) == Some(sym))
            .map(Lr1Item::advanced)
            .collect()
    }

    /// Full kernel equality: same item cores and same lookahead sets,
    /// ignoring order.
    fn kernel_matches_fully(&self, candidate: &[Lr1Item]) -> bool {
        if self.kernel.len() != candidate.len() {
            return false;
        }
        candidate.iter().all(|c| {
            self.kernel
                .iter()
                .any(|k| k.core == c.core && k.lookaheads == c.lookaheads)
        })
    }

    /// Core kernel equality: same item cores, lookaheads ignored.
    fn kernel_matches_core(&self, candidate: &[Lr1Item]) -> bool {
        if self.kernel.len() != candidate.len() {
            return false;
        }
        candidate
            .iter()
            .all(|c| self.kernel.iter().any(|k| k.core == c.core))
    }

    /// Whether this kernel's lookaheads already cover the candidate's.
    fn kernel_covers(&self, candidate: &[Lr1Item]) -> bool {
        candidate.iter().all(|c| {
            self.kernel
                .iter()
                .any(|k| k.core == c.core && k.lookaheads.is_superset(&c.lookaheads))
        })
    }

    /// Union the candidate kernel's lookaheads into this kernel.
    /// Returns whether anything grew.
    fn merge_kernel(&mut self, candidate: &[Lr1Item]) -> bool {
        let mut grew = false;
        for c in candidate {
            if let Some(k) = self.kernel.iter_mut().find(|k| k.core == c.core) {
                for la in &c.lookaheads {
                    grew |= k.lookaheads.insert(la.clone());
                }
            }
        }
        grew
    }

    /// Completed closure items, the reduction sources for this state.
    pub fn completed_items<'a>(
        &'a self,
        grammar: &'a GrammarCore,
    ) -> impl Iterator<Item = &'a Lr1Item> {
        self.closure
            .iter()
            .filter(move |item| item.core.is_completed(grammar))
    }
}

/// Construction statistics, printed to stderr when the parser is built
/// with `debug` set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutomatonStats {
    pub num_states: usize,
    /// Total closure items across all states.
    pub num_items: usize,
    /// LALR kernel merges (lookahead unions into an existing state).
    pub num_merges: usize,
    /// States resolved more than once (LALR cascade re-expansion).
    pub num_reexpansions: usize,
}

/// The LR automaton: an owning, id-ordered state vector.
#[derive(Debug, Clone)]
pub struct Automaton {
    pub states: Vec<State>,
    pub mode: TableMode,
    pub stats: AutomatonStats,
}

impl Automaton {
    /// Build the automaton for a compiled grammar.
    ///
    /// State 0's kernel is the single augmented item `AUG → • start, {$}`.
    /// The queue drains when every state has been resolved and expanded
    /// and no LALR merge has requeued anything.
    pub fn build(grammar: &GrammarCore, mode: TableMode) -> Self {
        let mut cache = FirstCache::new();
        let mut stats = AutomatonStats::default();

        let lookaheads: BTreeSet<Symbol> = [Symbol::end()].into_iter().collect();
        let mut states = vec![State::new(0, vec![Lr1Item::new(0, 0, lookaheads)])];
        let mut queue: VecDeque<StateId> = VecDeque::from([0]);

        while let Some(id) = queue.pop_front() {
            if !states[id].closure.is_empty() {
                stats.num_reexpansions += 1;
            }
            states[id].resolve(grammar, &mut cache);

            let expandables = states[id].expandables.clone();
            for sym in expandables {
                let candidate = states[id].candidate_kernel(&sym, grammar);
                let target = match mode {
                    TableMode::Clr => {
                        match states.iter().position(|s| s.kernel_matches_fully(&candidate)) {
                            Some(existing) => existing,
                            None => register(&mut states, &mut queue, candidate),
                        }
                    },
                    TableMode::Lalr => {
                        match states.iter().position(|s| s.kernel_matches_core(&candidate)) {
                            Some(existing) => {
                                if !states[existing].kernel_covers(&candidate) {
                                    states[existing].merge_kernel(&candidate);
                                    stats.num_merges += 1;
                                    if !queue.contains(&existing) {
                                        queue.push_back(existing);
                                    }
                                }
                                existing
                            },
                            None => register(&mut states, &mut queue, candidate),
                        }
                    },
                };
                states[id].transitions.insert(sym, target);
            }
        }

        stats.num_states = states.len();
        stats.num_items = states.iter().map(|s| s.closure.len()).sum();

        Automaton { states, mode, stats }
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id]
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }
}

/// Register a fresh state: id assigned in creation order, queued for
/// resolution and expansion.
fn register(states: &mut Vec<State>, queue: &mut VecDeque<StateId>, kernel: Vec<Lr1Item>) -> StateId {
    let id = states.len();
    states.push(State::new(id, kernel));
    queue.push_back(id);
    id
}
