//! Rule expression model.
//!
//! These are the trees produced by the rule language's parser, e.g. for
//! `age > 18 and group in ("admin","owner")`.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use itertools::Itertools;
#[cfg(feature = "ast-json")]
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::literal::Literal;

pub type Name = SmolStr;

/// Number of arguments an operator accepts.
#[cfg_attr(feature = "ast-json", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Variadic,
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => *n == count,
            Arity::Variadic => true,
        }
    }
}

impl Display for Arity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::Variadic => write!(f, "any number"),
        }
    }
}

/// The 13 operators built into the rule language.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::EnumString,
    strum::Display,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
pub enum BuiltinOperator {
    #[strum(to_string = "and")]
    And,
    #[strum(to_string = "or")]
    Or,
    #[strum(to_string = "xor")]
    Xor,
    #[strum(to_string = "not")]
    Not,
    #[strum(to_string = "=")]
    Eq,
    #[strum(to_string = "is")]
    Is,
    #[strum(to_string = "!=")]
    NotEq,
    #[strum(to_string = ">")]
    Gt,
    #[strum(to_string = ">=")]
    Gte,
    #[strum(to_string = "<")]
    Lt,
    #[strum(to_string = "<=")]
    Lte,
    #[strum(to_string = "in")]
    In,
    #[strum(to_string = "sum")]
    Sum,
}

impl BuiltinOperator {
    pub fn arity(&self) -> Arity {
        match self {
            BuiltinOperator::Not => Arity::Exact(1),
            BuiltinOperator::Sum => Arity::Variadic,
            _ => Arity::Exact(2),
        }
    }

    /// Binding strength when written infix in rule text. `None` for prefix and call forms.
    fn precedence(&self) -> Option<u8> {
        match self {
            BuiltinOperator::Or => Some(1),
            BuiltinOperator::Xor => Some(2),
            BuiltinOperator::And => Some(3),
            BuiltinOperator::Eq
            | BuiltinOperator::Is
            | BuiltinOperator::NotEq
            | BuiltinOperator::In
            | BuiltinOperator::Gt
            | BuiltinOperator::Gte
            | BuiltinOperator::Lt
            | BuiltinOperator::Lte => Some(5),
            BuiltinOperator::Not | BuiltinOperator::Sum => None,
        }
    }
}

#[cfg_attr(
    feature = "ast-json",
    derive(Serialize, Deserialize),
    serde(tag = "type", rename_all = "snake_case")
)]
#[derive(PartialEq, Debug, Clone)]
pub enum RuleExpr {
    /// A built-in operator, or a user-defined one when `is_function` is set.
    Operator {
        name: Name,
        args: Vec<RuleExpr>,
        #[cfg_attr(feature = "ast-json", serde(default))]
        is_function: bool,
    },
    Scalar {
        value: Literal,
    },
    /// A free variable resolved from the evaluation environment.
    ContextRef {
        name: Name,
    },
    Array {
        items: Vec<RuleExpr>,
    },
}

impl RuleExpr {
    pub fn operator(op: BuiltinOperator, args: Vec<RuleExpr>) -> Self {
        RuleExpr::Operator {
            name: SmolStr::new_static(op.into()),
            args,
            is_function: false,
        }
    }

    pub fn function(name: &str, args: Vec<RuleExpr>) -> Self {
        RuleExpr::Operator {
            name: SmolStr::new(name),
            args,
            is_function: true,
        }
    }

    pub fn scalar(value: impl Into<Literal>) -> Self {
        RuleExpr::Scalar {
            value: value.into(),
        }
    }

    pub fn context(name: &str) -> Self {
        RuleExpr::ContextRef {
            name: SmolStr::new(name),
        }
    }

    pub fn array(items: Vec<RuleExpr>) -> Self {
        RuleExpr::Array { items }
    }

    /// Returns the built-in operator this node names, if any.
    pub fn builtin(&self) -> Option<BuiltinOperator> {
        match self {
            RuleExpr::Operator { name, .. } => BuiltinOperator::from_str(name).ok(),
            _ => None,
        }
    }

    fn infix_precedence(&self) -> Option<u8> {
        match self {
            RuleExpr::Operator { args, .. } if args.len() == 2 => {
                self.builtin().and_then(|op| op.precedence())
            }
            _ => None,
        }
    }

    fn fmt_operand(&self, f: &mut Formatter<'_>, parent: u8, strict: bool) -> fmt::Result {
        match self.infix_precedence() {
            Some(prec) if prec < parent || (strict && prec == parent) => write!(f, "({})", self),
            _ => write!(f, "{}", self),
        }
    }
}

#[cfg(feature = "ast-json")]
impl RuleExpr {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Renders the node as rule-language text.
impl Display for RuleExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RuleExpr::Scalar { value } => write!(f, "{}", value),
            RuleExpr::ContextRef { name } => write!(f, "{}", name),
            RuleExpr::Array { items } => write!(f, "({})", items.iter().join(",")),
            RuleExpr::Operator { name, args, .. } => {
                let builtin = self.builtin();
                let infix = builtin.and_then(|op| op.precedence());
                match (builtin, infix, args.as_slice()) {
                    (Some(BuiltinOperator::Not), _, [operand]) => {
                        write!(f, "not ")?;
                        match operand.infix_precedence() {
                            Some(_) => write!(f, "({})", operand),
                            None => write!(f, "{}", operand),
                        }
                    }
                    (_, Some(prec), [left, right]) => {
                        // Comparisons do not chain.
                        let non_assoc = prec == 5;
                        left.fmt_operand(f, prec, non_assoc)?;
                        write!(f, " {} ", name)?;
                        right.fmt_operand(f, prec, true)
                    }
                    _ => write!(f, "{}({})", name, args.iter().join(", ")),
                }
            }
        }
    }
}
