//! Tests for grammar compilation: `:Group:` expansion laws and rule
//! normalization.

use crate::grammar::expand_groups;
use crate::lexer::Pattern;
use crate::{GrammarSpec, Parser, RuleSpec};

/// NUMBER plus two operator patterns in the `BinOp` group.
fn binop_patterns() -> Vec<Pattern<i64>> {
    vec![
        Pattern::regex("NUMBER", "[0-9]+"),
        Pattern::literal("PLUS", "+").with_groups(&["BinOp"]),
        Pattern::literal("TIMES", "*").with_groups(&["BinOp"]),
    ]
}

#[test]
fn test_rule_count_preserved_without_groups() {
    let rules: Vec<RuleSpec<i64>> = vec![
        RuleSpec::new("S", "S PLUS S"),
        RuleSpec::new("S", "NUMBER"),
    ];
    let expanded = expand_groups(rules, &binop_patterns());
    assert_eq!(expanded.len(), 2);
}

#[test]
fn test_single_group_occurrence_grows_by_matches_minus_one() {
    // One `:BinOp:` occurrence, two matching patterns: 2 rules become 3.
    let rules: Vec<RuleSpec<i64>> = vec![
        RuleSpec::new("Expr", "Expr :BinOp: Expr"),
        RuleSpec::new("Expr", "NUMBER"),
    ];
    let expanded = expand_groups(rules, &binop_patterns());
    assert_eq!(expanded.len(), 3);
}

#[test]
fn test_occurrences_in_distinct_rules_each_grow() {
    let rules: Vec<RuleSpec<i64>> = vec![
        RuleSpec::new("A", "A :BinOp: A"),
        RuleSpec::new("B", "B :BinOp: B"),
        RuleSpec::new("A", "NUMBER"),
    ];
    let expanded = expand_groups(rules, &binop_patterns());
    assert_eq!(expanded.len(), 5);
}

#[test]
fn test_double_occurrence_expands_cartesian() {
    let rules: Vec<RuleSpec<i64>> = vec![RuleSpec::new("E", "E :BinOp: E :BinOp: E")];
    let expanded = expand_groups(rules, &binop_patterns());
    assert_eq!(expanded.len(), 4);
    for rule in &expanded {
        assert!(
            rule.rhs.iter().all(|s| s == "E" || s == "PLUS" || s == "TIMES"),
            "unexpanded group left in {:?}",
            rule.rhs
        );
    }
}

#[test]
fn test_expansion_substitutes_at_the_group_position() {
    let rules: Vec<RuleSpec<i64>> = vec![RuleSpec::new("Expr", "Expr :BinOp: NUMBER")];
    let expanded = expand_groups(rules, &binop_patterns());
    let rhss: Vec<Vec<String>> = expanded.iter().map(|r| r.rhs.clone()).collect();
    assert!(rhss.contains(&vec!["Expr".into(), "PLUS".into(), "NUMBER".into()]));
    assert!(rhss.contains(&vec!["Expr".into(), "TIMES".into(), "NUMBER".into()]));
}

#[test]
fn test_expansion_preserves_declaration_order() {
    // The start rule keeps position 0 even when it expands.
    let rules: Vec<RuleSpec<i64>> = vec![
        RuleSpec::new("Expr", "Expr :BinOp: Expr"),
        RuleSpec::new("Expr", "NUMBER"),
    ];
    let expanded = expand_groups(rules, &binop_patterns());
    assert_eq!(expanded[0].rhs[1], "PLUS");
    assert_eq!(expanded[1].rhs[1], "TIMES");
    assert_eq!(expanded[2].rhs, vec!["NUMBER"]);
}

#[test]
fn test_epsilon_rhs_normalizes_to_empty() {
    let mut spec: GrammarSpec<i64> = GrammarSpec::new("Nullable");
    spec.rules = vec![RuleSpec::new("S", "ε")];
    let parser = Parser::lalr(spec).unwrap();
    // internal rule 1 is the user's S → ε
    assert_eq!(parser.grammar().rule(1).arity(), 0);
    assert!(parser.grammar().rule(1).rhs.is_empty());
}

#[test]
fn test_internal_rule_zero_is_augmented() {
    let mut spec: GrammarSpec<i64> = GrammarSpec::new("Minimal");
    spec.rules = vec![RuleSpec::new("S", "a")];
    let parser = Parser::lalr(spec).unwrap();
    let augmented = parser.grammar().rule(0);
    assert!(augmented.lhs.is_augmented());
    assert_eq!(augmented.rhs, vec![crate::Symbol::new("S")]);
}
