use miette::Diagnostic;
use smol_str::SmolStr;
use thiserror::Error;

use crate::rule::Arity;

type OperatorName = SmolStr;
type Shape = SmolStr;

#[derive(Error, Diagnostic, Debug, PartialEq, Clone)]
pub enum Error {
    #[error("Unsupported operator \"{0}\"")]
    #[diagnostic(
        code(rulepack::unsupported_operator),
        help("user-defined operators must be flagged as functions")
    )]
    UnsupportedOperator(OperatorName),
    #[error("Invalid number of arguments in \"{name}\", expected {expected}, got {got}")]
    #[diagnostic(code(rulepack::invalid_arity))]
    InvalidArity {
        name: OperatorName,
        expected: Arity,
        got: usize,
    },
    #[error("Unsupported host construct `{0}`")]
    #[diagnostic(
        code(rulepack::unsupported_host_construct),
        help("only trees produced by lowering a rule can be lifted back")
    )]
    UnsupportedHostConstruct(Shape),
    #[error("No body supplied for operator \"{0}\"")]
    #[diagnostic(code(rulepack::missing_operator_body))]
    MissingOperatorBody(OperatorName),
    #[error("Context variable \"{name}\" uses the reserved prefix \"{prefix}\"")]
    #[diagnostic(
        code(rulepack::reserved_name),
        help("names starting with the call prefix are reserved for packed operators")
    )]
    ReservedName { name: SmolStr, prefix: SmolStr },
    #[error("Call prefix must not be empty")]
    #[diagnostic(
        code(rulepack::empty_call_prefix),
        help("an empty prefix makes every binding shadow its operator")
    )]
    EmptyCallPrefix,
    #[error("Maximum expression depth exceeded \"{0}\"")]
    #[diagnostic(code(rulepack::depth_limit_exceeded))]
    DepthLimitExceeded(u32),
}
