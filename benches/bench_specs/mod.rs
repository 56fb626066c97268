//! Shared grammar specs for benchmarks.

use lrtail::{Associativity, GrammarSpec, Pattern, RuleSpec};

/// Arithmetic with two precedence levels.
pub fn arithmetic_spec() -> GrammarSpec<i64> {
    let mut spec = GrammarSpec::new("Arithmetic");
    spec.patterns = vec![
        Pattern::regex("NUMBER", "[0-9]+").with_transform(|s| s.parse().unwrap()),
        Pattern::literal("PLUS", "+").with_precedence(1, Associativity::Left),
        Pattern::literal("TIMES", "*").with_precedence(2, Associativity::Left),
        Pattern::regex("WS", r"[ \t\n]+").ignored(),
    ];
    spec.rules = vec![
        RuleSpec::new("S", "S PLUS S"),
        RuleSpec::new("S", "S TIMES S"),
        RuleSpec::new("S", "NUMBER"),
    ];
    spec
}

/// The JSON object grammar with literal punctuation patterns.
pub fn json_spec() -> GrammarSpec<i64> {
    let mut spec = GrammarSpec::new("Json");
    spec.patterns = vec![
        Pattern::regex("String", "\"[^\"]*\""),
        Pattern::regex("Number", "[0-9]+").with_transform(|s| s.parse().unwrap()),
        Pattern::regex("Boolean", "true|false"),
        Pattern::literal("Null", "null"),
        Pattern::literal("{", "{"),
        Pattern::literal("}", "}"),
        Pattern::literal("[", "["),
        Pattern::literal("]", "]"),
        Pattern::literal(",", ","),
        Pattern::literal(":", ":"),
        Pattern::regex("WS", r"[ \t\n]+").ignored(),
    ];
    spec.rules = vec![
        RuleSpec::new("Json", "Object"),
        RuleSpec::new("Object", "{ ObjectItem }"),
        RuleSpec::new("Object", "{ }"),
        RuleSpec::new("ObjectItem", "String : Value"),
        RuleSpec::new("ObjectItem", "String : Value , ObjectItem"),
        RuleSpec::new("Value", "String"),
        RuleSpec::new("Value", "Number"),
        RuleSpec::new("Value", "Boolean"),
        RuleSpec::new("Value", "Null"),
        RuleSpec::new("Value", "Object"),
        RuleSpec::new("Value", "Array"),
        RuleSpec::new("Array", "[ ArrayItem ]"),
        RuleSpec::new("Array", "[ ]"),
        RuleSpec::new("ArrayItem", "Value"),
        RuleSpec::new("ArrayItem", "Value , ArrayItem"),
    ];
    spec
}

/// A synthetic expression grammar with `n` infix operators at distinct
/// precedence levels, for construction scaling measurements.
pub fn synthetic_spec(n: usize) -> GrammarSpec<i64> {
    let mut spec = GrammarSpec::new("Synthetic");
    spec.patterns = vec![Pattern::regex("NUMBER", "[0-9]+").with_transform(|s| s.parse().unwrap())];
    for i in 0..n {
        spec.patterns.push(
            Pattern::literal(format!("OP{i}"), format!("#{i}#"))
                .with_precedence(i as u32 + 1, Associativity::Left),
        );
        spec.rules.push(RuleSpec::new("S", &format!("S OP{i} S")));
    }
    spec.rules.push(RuleSpec::new("S", "NUMBER"));
    spec
}
