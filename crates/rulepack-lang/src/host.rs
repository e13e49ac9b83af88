//! Host expression tree.
//!
//! A small executable-code syntax tree. Nodes are immutable and children are held
//! through [`Shared`] pointers, so rewrite passes can reuse untouched subtrees.

pub mod printer;

#[cfg(feature = "ast-json")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::{Shared, literal::Literal, rule::Name};

pub type Args = SmallVec<[Shared<HostExpr>; 4]>;

#[cfg_attr(
    feature = "ast-json",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum BinaryOp {
    #[strum(to_string = "and")]
    And,
    #[strum(to_string = "or")]
    Or,
    #[strum(to_string = "xor")]
    Xor,
    #[strum(to_string = "==")]
    Eq,
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
}

impl BinaryOp {
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::Xor => 2,
            BinaryOp::And => 3,
            BinaryOp::Eq | BinaryOp::NotEq => 4,
            BinaryOp::Gt | BinaryOp::Gte | BinaryOp::Lt | BinaryOp::Lte => 5,
        }
    }

    pub fn is_comparison(&self) -> bool {
        self.precedence() >= 4
    }
}

#[cfg_attr(
    feature = "ast-json",
    derive(Serialize, Deserialize),
    serde(tag = "type", rename_all = "snake_case")
)]
#[derive(PartialEq, Debug, Clone, strum::IntoStaticStr)]
pub enum HostExpr {
    Literal {
        value: Literal,
    },
    Ident {
        name: Name,
    },
    /// A named constant such as `true`, as opposed to a literal.
    Const {
        name: Name,
    },
    Binary {
        op: BinaryOp,
        left: Shared<HostExpr>,
        right: Shared<HostExpr>,
    },
    Not {
        operand: Shared<HostExpr>,
    },
    /// Invocation of a function bound to `callee`.
    Call {
        callee: Name,
        args: Args,
    },
    Array {
        items: Args,
    },
    Closure(Closure),
    Assign {
        target: Name,
        value: Shared<HostExpr>,
    },
}

impl HostExpr {
    pub fn literal(value: impl Into<Literal>) -> Shared<Self> {
        Shared::new(HostExpr::Literal {
            value: value.into(),
        })
    }

    pub fn ident(name: &str) -> Shared<Self> {
        Shared::new(HostExpr::Ident {
            name: SmolStr::new(name),
        })
    }

    pub fn constant(name: &str) -> Shared<Self> {
        Shared::new(HostExpr::Const {
            name: SmolStr::new(name),
        })
    }

    pub fn binary(op: BinaryOp, left: Shared<HostExpr>, right: Shared<HostExpr>) -> Shared<Self> {
        Shared::new(HostExpr::Binary { op, left, right })
    }

    pub fn not(operand: Shared<HostExpr>) -> Shared<Self> {
        Shared::new(HostExpr::Not { operand })
    }

    pub fn call(callee: &str, args: impl IntoIterator<Item = Shared<HostExpr>>) -> Shared<Self> {
        Shared::new(HostExpr::Call {
            callee: SmolStr::new(callee),
            args: args.into_iter().collect(),
        })
    }

    pub fn array(items: impl IntoIterator<Item = Shared<HostExpr>>) -> Shared<Self> {
        Shared::new(HostExpr::Array {
            items: items.into_iter().collect(),
        })
    }

    pub fn assign(target: &str, value: Shared<HostExpr>) -> Shared<Self> {
        Shared::new(HostExpr::Assign {
            target: SmolStr::new(target),
            value,
        })
    }

    /// Name of the node's variant, used in diagnostics.
    pub fn shape(&self) -> &'static str {
        self.into()
    }
}

#[cfg(feature = "ast-json")]
impl HostExpr {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl From<Closure> for HostExpr {
    fn from(closure: Closure) -> Self {
        HostExpr::Closure(closure)
    }
}

#[cfg_attr(
    feature = "ast-json",
    derive(Serialize, Deserialize),
    serde(tag = "type", rename_all = "snake_case")
)]
#[derive(PartialEq, Debug, Clone)]
pub enum Stmt {
    Expr { expr: Shared<HostExpr> },
    Return { expr: Shared<HostExpr> },
}

impl Stmt {
    pub fn expr(&self) -> &Shared<HostExpr> {
        match self {
            Stmt::Expr { expr } | Stmt::Return { expr } => expr,
        }
    }
}

/// An anonymous function: ordered parameters and an ordered statement list.
#[cfg_attr(feature = "ast-json", derive(Serialize, Deserialize))]
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Closure {
    pub params: Vec<Name>,
    pub body: Vec<Stmt>,
}

impl Closure {
    /// Statements binding private names, i.e. everything before the final return.
    pub fn bindings(&self) -> impl Iterator<Item = (&Name, &Shared<HostExpr>)> {
        self.body.iter().filter_map(|stmt| match stmt {
            Stmt::Expr { expr } => match &**expr {
                HostExpr::Assign { target, value } => Some((target, value)),
                _ => None,
            },
            Stmt::Return { .. } => None,
        })
    }

    /// The expression of the trailing `return`, if the body ends with one.
    pub fn returned(&self) -> Option<&Shared<HostExpr>> {
        match self.body.last() {
            Some(Stmt::Return { expr }) => Some(expr),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::literal(HostExpr::literal(1), "Literal")]
    #[case::ident(HostExpr::ident("x"), "Ident")]
    #[case::call(HostExpr::call("f", []), "Call")]
    #[case::closure(Shared::new(HostExpr::from(Closure::default())), "Closure")]
    #[case::assign(HostExpr::assign("x", HostExpr::literal(1)), "Assign")]
    fn test_shape(#[case] expr: Shared<HostExpr>, #[case] expected: &str) {
        assert_eq!(expr.shape(), expected);
    }

    #[test]
    fn test_closure_bindings_and_return() {
        let closure = Closure {
            params: vec![],
            body: vec![
                Stmt::Expr {
                    expr: HostExpr::assign("c_foo", HostExpr::literal(true)),
                },
                Stmt::Return {
                    expr: HostExpr::call("c_foo", []),
                },
            ],
        };

        let bindings: Vec<_> = closure.bindings().map(|(name, _)| name.as_str()).collect();
        assert_eq!(bindings, vec!["c_foo"]);
        assert_eq!(closure.returned(), Some(&HostExpr::call("c_foo", [])));
    }

    #[rstest]
    #[case(BinaryOp::Or, false)]
    #[case(BinaryOp::And, false)]
    #[case(BinaryOp::Eq, true)]
    #[case(BinaryOp::Lte, true)]
    fn test_is_comparison(#[case] op: BinaryOp, #[case] expected: bool) {
        assert_eq!(op.is_comparison(), expected);
    }
}
