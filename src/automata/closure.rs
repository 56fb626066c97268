//! Kernel closure and lookahead propagation.
//!
//! Closure runs in two passes to avoid over-propagation:
//! 1. **Core discovery** (BFS): for every item `A → α • B β` in the set
//!    and every rule `B → γ`, add `B → • γ` with empty lookaheads,
//!    deduplicating by item core
//! 2. **Lookahead propagation** (worklist): every item `A → α • B β, a`
//!    contributes `FIRST(β a)` to every closure item whose lhs is `B` —
//!    that is, `FIRST(β)` minus `ε`, plus `a` itself when β is empty or
//!    nullable. An item whose lookaheads grow is pushed back so items
//!    deriving through it are reconsidered. Lookahead sets are monotonic
//!    and bounded by the terminal set, so the worklist drains.
//!
//! `FIRST(β)` depends only on the item core, so it is memoized per
//! automaton in a [`FirstCache`] shared across states.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use crate::automata::item::{Lr0Item, Lr1Item};
use crate::grammar::GrammarCore;
use crate::symbol::Symbol;

/// Per-automaton memo of `FIRST(β)` keyed by item core, where β is the
/// rhs tail after the dotted symbol.
#[derive(Debug, Default)]
pub struct FirstCache {
    map: HashMap<Lr0Item, BTreeSet<Symbol>>,
}

impl FirstCache {
    pub fn new() -> Self {
        FirstCache::default()
    }

    /// `FIRST(rhs[dot + 1 ..])`. Contains `ε` exactly when the tail is
    /// empty or derives the empty string.
    pub fn beta_first(&mut self, grammar: &GrammarCore, core: Lr0Item) -> BTreeSet<Symbol> {
        if let Some(cached) = self.map.get(&core) {
            return cached.clone();
        }
        let rhs = &grammar.rule(core.rule).rhs;
        let from = (core.dot + 1).min(rhs.len());
        let set = grammar.first_of_sequence(&rhs[from..]);
        self.map.insert(core, set.clone());
        set
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Compute a kernel's full closure: core discovery followed by lookahead
/// propagation. Kernel items occupy the front of the returned vector and
/// keep their lookaheads untouched.
pub fn resolve(kernel: &[Lr1Item], grammar: &GrammarCore, cache: &mut FirstCache) -> Vec<Lr1Item> {
    let mut closure = close(kernel, grammar);
    propagate_lookaheads(&mut closure, kernel.len(), grammar, cache);
    closure
}

/// BFS core discovery. Newly found items start with empty lookaheads.
fn close(kernel: &[Lr1Item], grammar: &GrammarCore) -> Vec<Lr1Item> {
    let mut closure: Vec<Lr1Item> = kernel.to_vec();
    let mut seen: HashSet<Lr0Item> = closure.iter().map(|item| item.core).collect();
    let mut queue: VecDeque<usize> = (0..closure.len()).collect();

    while let Some(idx) = queue.pop_front() {
        let Some(next) = closure[idx].core.next_symbol(grammar).cloned() else {
            continue;
        };
        if !grammar.is_variable(&next) {
            continue;
        }
        for (rule_id, rule) in grammar.rules().iter().enumerate() {
            if rule.lhs != next {
                continue;
            }
            let core = Lr0Item::new(rule_id, 0);
            if seen.insert(core) {
                closure.push(Lr1Item { core, lookaheads: BTreeSet::new() });
                queue.push_back(closure.len() - 1);
            }
        }
    }

    closure
}

/// Worklist lookahead propagation over a discovered closure.
///
/// Only closure-discovered items (index ≥ `kernel_len`, all dot-0)
/// receive contributions; kernel lookaheads are fixed by the transition
/// that created the state.
fn propagate_lookaheads(
    closure: &mut [Lr1Item],
    kernel_len: usize,
    grammar: &GrammarCore,
    cache: &mut FirstCache,
) {
    let mut by_lhs: HashMap<Symbol, Vec<usize>> = HashMap::new();
    for (idx, item) in closure.iter().enumerate().skip(kernel_len) {
        let lhs = grammar.rule(item.core.rule).lhs.clone();
        by_lhs.entry(lhs).or_default().push(idx);
    }

    let mut queue: VecDeque<usize> = (0..closure.len()).collect();
    let mut queued = vec![true; closure.len()];

    while let Some(idx) = queue.pop_front() {
        queued[idx] = false;

        let Some(next) = closure[idx].core.next_symbol(grammar).cloned() else {
            continue;
        };
        let Some(targets) = by_lhs.get(&next) else {
            continue;
        };

        let beta_first = cache.beta_first(grammar, closure[idx].core);
        let mut contribution: BTreeSet<Symbol> = beta_first
            .iter()
            .filter(|s| !s.is_epsilon())
            .cloned()
            .collect();
        if beta_first.contains(&Symbol::epsilon()) {
            contribution.extend(closure[idx].lookaheads.iter().cloned());
        }
        if contribution.is_empty() {
            continue;
        }

        for &target in targets {
            let before = closure[target].lookaheads.len();
            closure[target].lookaheads.extend(contribution.iter().cloned());
            if closure[target].lookaheads.len() != before && !queued[target] {
                queue.push_back(target);
                queued[target] = true;
            }
        }
    }
}
