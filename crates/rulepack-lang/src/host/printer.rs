//! Rendering of host trees to source text.
//!
//! Packing only guarantees the logical shape of a closure. How it looks as text
//! is up to a [`HostPrinter`]; [`SourcePrinter`] is the stock implementation.
//!
//! ```text
//! function (user, group, points) {
//!     c_logged = function (user) {
//!         return user != '';
//!     };
//!     return c_logged(user) and in_array(group, array('customer','guest')) and points > 30;
//! }
//! ```

use std::fmt::{self, Write};

use super::{BinaryOp, Closure, HostExpr, Stmt};
use crate::literal::{Literal, write_quoted};

pub trait HostPrinter {
    fn print_expr(&self, expr: &HostExpr) -> String;

    fn print_stmt(&self, stmt: &Stmt) -> String;

    fn print_closure(&self, closure: &Closure) -> String;
}

#[derive(Debug, Clone)]
pub struct SourcePrinter {
    indent_width: usize,
}

impl Default for SourcePrinter {
    fn default() -> Self {
        Self { indent_width: 4 }
    }
}

impl SourcePrinter {
    pub fn new(indent_width: usize) -> Self {
        Self { indent_width }
    }

    fn write_expr(&self, out: &mut String, expr: &HostExpr, depth: usize) -> fmt::Result {
        match expr {
            HostExpr::Literal { value } => match value {
                Literal::Bool(b) => write!(out, "{}", b),
                Literal::Number(n) => write!(out, "{}", n),
                Literal::String(s) => write_quoted(out, s, '\''),
            },
            HostExpr::Ident { name } | HostExpr::Const { name } => out.write_str(name),
            HostExpr::Binary { op, left, right } => {
                self.write_operand(out, left, *op, op.is_comparison(), depth)?;
                write!(out, " {} ", op)?;
                self.write_operand(out, right, *op, true, depth)
            }
            HostExpr::Not { operand } => {
                out.write_char('!')?;
                if matches!(&**operand, HostExpr::Binary { .. } | HostExpr::Assign { .. }) {
                    out.write_char('(')?;
                    self.write_expr(out, operand, depth)?;
                    out.write_char(')')
                } else {
                    self.write_expr(out, operand, depth)
                }
            }
            HostExpr::Call { callee, args } => {
                write!(out, "{}(", callee)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.write_str(", ")?;
                    }
                    self.write_expr(out, arg, depth)?;
                }
                out.write_char(')')
            }
            HostExpr::Array { items } => {
                out.write_str("array(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.write_char(',')?;
                    }
                    self.write_expr(out, item, depth)?;
                }
                out.write_char(')')
            }
            HostExpr::Closure(closure) => self.write_closure(out, closure, depth),
            HostExpr::Assign { target, value } => {
                write!(out, "{} = ", target)?;
                self.write_expr(out, value, depth)
            }
        }
    }

    /// Writes a binary operand, parenthesized when it binds looser than its parent.
    fn write_operand(
        &self,
        out: &mut String,
        operand: &HostExpr,
        parent: BinaryOp,
        parenthesize_equal: bool,
        depth: usize,
    ) -> fmt::Result {
        let needs_parens = match operand {
            HostExpr::Binary { op, .. } => {
                op.precedence() < parent.precedence()
                    || (parenthesize_equal && op.precedence() == parent.precedence())
            }
            HostExpr::Assign { .. } => true,
            _ => false,
        };

        if needs_parens {
            out.write_char('(')?;
            self.write_expr(out, operand, depth)?;
            out.write_char(')')
        } else {
            self.write_expr(out, operand, depth)
        }
    }

    fn write_stmt(&self, out: &mut String, stmt: &Stmt, depth: usize) -> fmt::Result {
        if let Stmt::Return { .. } = stmt {
            out.write_str("return ")?;
        }
        self.write_expr(out, stmt.expr(), depth)?;
        out.write_char(';')
    }

    fn write_closure(&self, out: &mut String, closure: &Closure, depth: usize) -> fmt::Result {
        write!(out, "function ({}) {{", closure.params.join(", "))?;
        let inner = " ".repeat(self.indent_width * (depth + 1));
        for stmt in &closure.body {
            out.write_char('\n')?;
            out.write_str(&inner)?;
            self.write_stmt(out, stmt, depth + 1)?;
        }
        out.write_char('\n')?;
        out.write_str(&" ".repeat(self.indent_width * depth))?;
        out.write_char('}')
    }
}

impl HostPrinter for SourcePrinter {
    fn print_expr(&self, expr: &HostExpr) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_expr(&mut out, expr, 0);
        out
    }

    fn print_stmt(&self, stmt: &Stmt) -> String {
        let mut out = String::new();
        let _ = self.write_stmt(&mut out, stmt, 0);
        out
    }

    fn print_closure(&self, closure: &Closure) -> String {
        let mut out = String::new();
        let _ = self.write_closure(&mut out, closure, 0);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Shared;
    use rstest::rstest;

    #[rstest]
    #[case::string(HostExpr::literal("it's"), r"'it\'s'")]
    #[case::number(HostExpr::literal(1.5), "1.5")]
    #[case::constant(HostExpr::constant("true"), "true")]
    #[case::call(
        HostExpr::call("in_array", [HostExpr::literal("foo"), HostExpr::array([HostExpr::literal("foo"), HostExpr::literal("bar")])]),
        "in_array('foo', array('foo','bar'))"
    )]
    #[case::left_assoc(
        HostExpr::binary(
            BinaryOp::And,
            HostExpr::binary(BinaryOp::And, HostExpr::ident("a"), HostExpr::ident("b")),
            HostExpr::ident("c"),
        ),
        "a and b and c"
    )]
    #[case::right_nested(
        HostExpr::binary(
            BinaryOp::And,
            HostExpr::ident("a"),
            HostExpr::binary(BinaryOp::And, HostExpr::ident("b"), HostExpr::ident("c")),
        ),
        "a and (b and c)"
    )]
    #[case::looser_child(
        HostExpr::binary(
            BinaryOp::And,
            HostExpr::binary(BinaryOp::Or, HostExpr::ident("a"), HostExpr::ident("b")),
            HostExpr::ident("c"),
        ),
        "(a or b) and c"
    )]
    #[case::not_binary(
        HostExpr::not(HostExpr::binary(BinaryOp::Gt, HostExpr::ident("a"), HostExpr::literal(1))),
        "!(a > 1)"
    )]
    #[case::not_ident(HostExpr::not(HostExpr::ident("a")), "!a")]
    fn test_print_expr(#[case] expr: Shared<HostExpr>, #[case] expected: &str) {
        assert_eq!(SourcePrinter::default().print_expr(&expr), expected);
    }

    #[test]
    fn test_print_nested_closure() {
        let body = Closure {
            params: vec!["user".into()],
            body: vec![Stmt::Return {
                expr: HostExpr::binary(BinaryOp::NotEq, HostExpr::ident("user"), HostExpr::literal("")),
            }],
        };
        let closure = Closure {
            params: vec!["user".into(), "points".into()],
            body: vec![
                Stmt::Expr {
                    expr: HostExpr::assign("c_logged", Shared::new(HostExpr::from(body))),
                },
                Stmt::Return {
                    expr: HostExpr::call("c_logged", [HostExpr::ident("user")]),
                },
            ],
        };

        assert_eq!(
            SourcePrinter::default().print_closure(&closure),
            "function (user, points) {\n    c_logged = function (user) {\n        return user != '';\n    };\n    return c_logged(user);\n}"
        );
    }

    #[test]
    fn test_print_stmt() {
        let stmt = Stmt::Return {
            expr: HostExpr::ident("foo"),
        };
        assert_eq!(SourcePrinter::default().print_stmt(&stmt), "return foo;");
    }
}
