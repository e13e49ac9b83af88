#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rulepack_lang::{HostExpr, Literal, OperatorRegistry, RuleExpr};

#[derive(Debug, Clone, Arbitrary)]
enum ArbitraryLiteral {
    Bool(bool),
    Int(i32),
    Float(f64),
    String(String),
}

#[derive(Debug, Clone, Arbitrary)]
enum ArbitraryRule {
    Operator(String, Vec<ArbitraryRule>, bool),
    Scalar(ArbitraryLiteral),
    Context(String),
    Array(Vec<ArbitraryRule>),
}

impl ArbitraryRule {
    fn to_rule(&self) -> RuleExpr {
        match self {
            ArbitraryRule::Operator(name, args, is_function) => RuleExpr::Operator {
                name: name.as_str().into(),
                args: args.iter().map(|a| a.to_rule()).collect(),
                is_function: *is_function,
            },
            ArbitraryRule::Scalar(value) => RuleExpr::scalar(match value {
                ArbitraryLiteral::Bool(b) => Literal::Bool(*b),
                ArbitraryLiteral::Int(n) => Literal::from(*n),
                ArbitraryLiteral::Float(n) => Literal::from(*n),
                ArbitraryLiteral::String(s) => Literal::from(s.as_str()),
            }),
            ArbitraryRule::Context(name) => RuleExpr::context(name),
            ArbitraryRule::Array(items) => RuleExpr::array(items.iter().map(|i| i.to_rule()).collect()),
        }
    }
}

fuzz_target!(|rule: ArbitraryRule| {
    let rule = rule.to_rule();

    let Ok(lowered) = rulepack_lang::lower(&rule) else {
        return;
    };
    let _ = rulepack_lang::lift(&lowered);

    let operators: OperatorRegistry = rulepack_lang::collect_operators(&lowered)
        .into_iter()
        .map(|name| (name, HostExpr::constant("true")))
        .collect();

    if let Ok(closure) = rulepack_lang::pack(&lowered, &operators) {
        assert_eq!(closure.params, rulepack_lang::collect_variables(&lowered));
    }
});
