//! LR(0) and LR(1) items.
//!
//! An LR(0) item is a rule with a dot position; an LR(1) item adds a set
//! of lookahead terminals. Items identify their rule by [`RuleId`] into
//! the compiled grammar, so the item itself is two words and `Copy`.

use std::collections::BTreeSet;
use std::fmt::Write;

use crate::grammar::{GrammarCore, RuleId};
use crate::symbol::Symbol;

/// A rule with a dot position. `dot` ranges over `0..=arity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Lr0Item {
    pub rule: RuleId,
    pub dot: usize,
}

impl Lr0Item {
    pub fn new(rule: RuleId, dot: usize) -> Self {
        Lr0Item { rule, dot }
    }

    /// The symbol immediately after the dot, if any.
    pub fn next_symbol<'g>(&self, grammar: &'g GrammarCore) -> Option<&'g Symbol> {
        grammar.rule(self.rule).rhs.get(self.dot)
    }

    /// The symbol two places after the dot, if any.
    pub fn next_next_symbol<'g>(&self, grammar: &'g GrammarCore) -> Option<&'g Symbol> {
        grammar.rule(self.rule).rhs.get(self.dot + 1)
    }

    /// Whether the dot has consumed the whole rhs.
    pub fn is_completed(&self, grammar: &GrammarCore) -> bool {
        self.dot >= grammar.rule(self.rule).arity()
    }

    /// The same item with the dot advanced one position.
    pub fn advanced(&self) -> Self {
        Lr0Item { rule: self.rule, dot: self.dot + 1 }
    }

    /// Render as `lhs → α • β` for inspection.
    pub fn display(&self, grammar: &GrammarCore) -> String {
        let rule = grammar.rule(self.rule);
        let mut out = format!("{} →", rule.lhs);
        for (idx, sym) in rule.rhs.iter().enumerate() {
            if idx == self.dot {
                out.push_str(" •");
            }
            let _ = write!(out, " {}", sym);
        }
        if self.dot >= rule.rhs.len() {
            out.push_str(" •");
        }
        out
    }
}

/// An LR(0) item plus its lookahead terminals.
///
/// Two items are *core-equal* when their `(rule, dot)` agree; *fully
/// equal* adds set equality of lookaheads. Lookahead sets are owned and
/// copied by value on advance, never aliased between items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lr1Item {
    pub core: Lr0Item,
    pub lookaheads: BTreeSet<Symbol>,
}

impl Lr1Item {
    pub fn new(rule: RuleId, dot: usize, lookaheads: BTreeSet<Symbol>) -> Self {
        Lr1Item { core: Lr0Item::new(rule, dot), lookaheads }
    }

    pub fn core_eq(&self, other: &Lr1Item) -> bool {
        self.core == other.core
    }

    /// The item with the dot advanced and the lookahead set copied.
    pub fn advanced(&self) -> Self {
        Lr1Item { core: self.core.advanced(), lookaheads: self.lookaheads.clone() }
    }

    /// Render as `lhs → α • β, {a, b}` for inspection.
    pub fn display(&self, grammar: &GrammarCore) -> String {
        let lookaheads: Vec<&str> = self.lookaheads.iter().map(|s| s.as_str()).collect();
        format!("{}, {{{}}}", self.core.display(grammar), lookaheads.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::RuleCore;

    fn grammar() -> GrammarCore {
        // S → S + NUMBER | NUMBER | ε
        GrammarCore::new(vec![
            RuleCore {
                lhs: Symbol::new("S"),
                rhs: vec![Symbol::new("S"), Symbol::new("+"), Symbol::new("NUMBER")],
            },
            RuleCore { lhs: Symbol::new("S"), rhs: vec![Symbol::new("NUMBER")] },
            RuleCore { lhs: Symbol::new("S"), rhs: vec![] },
        ])
    }

    #[test]
    fn test_next_symbol_and_completion() {
        let g = grammar();
        // internal rule 1 is S → S + NUMBER
        let item = Lr0Item::new(1, 0);
        assert_eq!(item.next_symbol(&g), Some(&Symbol::new("S")));
        assert_eq!(item.next_next_symbol(&g), Some(&Symbol::new("+")));
        assert!(!item.is_completed(&g));

        let done = item.advanced().advanced().advanced();
        assert_eq!(done.next_symbol(&g), None);
        assert!(done.is_completed(&g));
    }

    #[test]
    fn test_empty_rule_is_immediately_completed() {
        let g = grammar();
        let item = Lr0Item::new(3, 0);
        assert!(item.is_completed(&g));
        assert_eq!(item.next_symbol(&g), None);
    }

    #[test]
    fn test_display_marks_the_dot() {
        let g = grammar();
        assert_eq!(Lr0Item::new(1, 1).display(&g), "S → S • + NUMBER");
        assert_eq!(Lr0Item::new(1, 3).display(&g), "S → S + NUMBER •");
        assert_eq!(Lr0Item::new(3, 0).display(&g), "S → •");
    }

    #[test]
    fn test_core_vs_full_equality() {
        let a = Lr1Item::new(1, 1, [Symbol::end()].into_iter().collect());
        let b = Lr1Item::new(1, 1, [Symbol::new("+")].into_iter().collect());
        assert!(a.core_eq(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_advance_copies_lookaheads() {
        let a = Lr1Item::new(1, 0, [Symbol::end()].into_iter().collect());
        let mut b = a.advanced();
        b.lookaheads.insert(Symbol::new("+"));
        assert_eq!(a.lookaheads.len(), 1, "advance must not alias lookahead sets");
    }
}
