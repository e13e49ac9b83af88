//! `rulepack-lang` translates between rule expressions and host code trees, and
//! packs a lowered rule into a self-contained closure.
//!
//! ## Examples
//!
//! ```rust
//! use rulepack_lang::{BuiltinOperator, HostPrinter, OperatorRegistry, RuleExpr, SourcePrinter};
//!
//! // points > 30 and logged(user)
//! let rule = RuleExpr::operator(
//!     BuiltinOperator::And,
//!     vec![
//!         RuleExpr::operator(
//!             BuiltinOperator::Gt,
//!             vec![RuleExpr::context("points"), RuleExpr::scalar(30)],
//!         ),
//!         RuleExpr::function("logged", vec![RuleExpr::context("user")]),
//!     ],
//! );
//!
//! let expr = rulepack_lang::lower(&rule).unwrap();
//! assert_eq!(rulepack_lang::lift(&expr).unwrap(), rule);
//!
//! let operators = OperatorRegistry::new().with("logged", rulepack_lang::HostExpr::constant("true"));
//! let closure = rulepack_lang::pack(&expr, &operators).unwrap();
//!
//! assert_eq!(closure.params, vec!["points", "user"]);
//! assert_eq!(
//!     SourcePrinter::default().print_closure(&closure),
//!     "function (points, user) {\n    c_logged = true;\n    return points > 30 and c_logged(user);\n}"
//! );
//! ```
mod collect;
mod constants;
mod error;
mod host;
mod lift;
mod literal;
mod lower;
mod number;
mod options;
mod pack;
mod provider;
mod rule;

pub use collect::{collect_operators, collect_variables};
pub use constants::{ARRAY_SUM, DEFAULT_CALL_PREFIX, IN_ARRAY};
pub use error::Error;
pub use host::printer::{HostPrinter, SourcePrinter};
pub use host::{Args as HostArgs, BinaryOp, Closure, HostExpr, Stmt};
pub use lift::Lifter;
pub use literal::Literal;
pub use lower::Lowerer;
pub use number::Number;
pub use options::Options;
pub use pack::Packer;
pub use provider::{OperatorBodyProvider, OperatorRegistry};
pub use rule::{Arity, BuiltinOperator, Name, RuleExpr};

#[cfg(not(feature = "sync"))]
pub type Shared<T> = std::rc::Rc<T>;
#[cfg(feature = "sync")]
pub type Shared<T> = std::sync::Arc<T>;

pub type RulepackResult<T> = Result<T, Error>;

/// Lowers a rule expression with default options.
pub fn lower(rule: &RuleExpr) -> RulepackResult<Shared<HostExpr>> {
    Lowerer::default().lower(rule)
}

/// Lifts a host expression back into the rule model with default options.
pub fn lift(expr: &HostExpr) -> RulepackResult<RuleExpr> {
    Lifter::default().lift(expr)
}

/// Packs a lowered rule and its operator bodies with default options.
pub fn pack(expr: &Shared<HostExpr>, operators: &OperatorRegistry) -> RulepackResult<Closure> {
    Packer::default().pack(expr, operators)
}
