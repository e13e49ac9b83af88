//! Host tree to rule model lifting.

use smol_str::SmolStr;

use crate::{
    Error, Options,
    constants::{ARRAY_SUM, FALSE, IN_ARRAY, TRUE},
    host::{BinaryOp, HostExpr},
    literal::Literal,
    rule::{Arity, BuiltinOperator, RuleExpr},
};

/// Lifts host trees back into rule expressions.
///
/// Only the shapes [`crate::Lowerer`] produces are accepted. `==` always lifts to
/// `=`; the `is` spelling cannot be recovered.
#[derive(Debug, Clone, Default)]
pub struct Lifter {
    options: Options,
}

impl Lifter {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    pub fn lift(&self, expr: &HostExpr) -> Result<RuleExpr, Error> {
        tracing::debug!(shape = expr.shape(), "lifting host expression");
        self.lift_expr(expr, 0)
    }

    fn lift_expr(&self, expr: &HostExpr, depth: u32) -> Result<RuleExpr, Error> {
        self.options.check_depth(depth)?;

        match expr {
            HostExpr::Literal { value } => Ok(RuleExpr::Scalar {
                value: value.clone(),
            }),
            HostExpr::Const { name } if name.eq_ignore_ascii_case(TRUE) => {
                Ok(RuleExpr::scalar(Literal::Bool(true)))
            }
            HostExpr::Const { name } if name.eq_ignore_ascii_case(FALSE) => {
                Ok(RuleExpr::scalar(Literal::Bool(false)))
            }
            HostExpr::Ident { name } => Ok(RuleExpr::ContextRef { name: name.clone() }),
            HostExpr::Array { items } => Ok(RuleExpr::Array {
                items: self.lift_args(items, depth)?,
            }),
            HostExpr::Binary { op, left, right } => {
                let op = match op {
                    BinaryOp::And => BuiltinOperator::And,
                    BinaryOp::Or => BuiltinOperator::Or,
                    BinaryOp::Xor => BuiltinOperator::Xor,
                    BinaryOp::Eq => BuiltinOperator::Eq,
                    BinaryOp::NotEq => BuiltinOperator::NotEq,
                    BinaryOp::Gt => BuiltinOperator::Gt,
                    BinaryOp::Gte => BuiltinOperator::Gte,
                    BinaryOp::Lt => BuiltinOperator::Lt,
                    BinaryOp::Lte => BuiltinOperator::Lte,
                };
                Ok(RuleExpr::operator(
                    op,
                    vec![
                        self.lift_expr(left, depth + 1)?,
                        self.lift_expr(right, depth + 1)?,
                    ],
                ))
            }
            HostExpr::Not { operand } => Ok(RuleExpr::operator(
                BuiltinOperator::Not,
                vec![self.lift_expr(operand, depth + 1)?],
            )),
            HostExpr::Call { callee, args } => match callee.as_str() {
                IN_ARRAY if args.len() == 2 => Ok(RuleExpr::operator(
                    BuiltinOperator::In,
                    self.lift_args(args, depth)?,
                )),
                IN_ARRAY => Err(Error::InvalidArity {
                    name: callee.clone(),
                    expected: Arity::Exact(2),
                    got: args.len(),
                }),
                ARRAY_SUM => Ok(RuleExpr::Operator {
                    name: SmolStr::new_static(BuiltinOperator::Sum.into()),
                    args: self.lift_args(args, depth)?,
                    is_function: true,
                }),
                _ => Ok(RuleExpr::Operator {
                    name: callee.clone(),
                    args: self.lift_args(args, depth)?,
                    is_function: true,
                }),
            },
            HostExpr::Const { name } => Err(Error::UnsupportedHostConstruct(
                smol_str::format_smolstr!("{}({})", expr.shape(), name),
            )),
            HostExpr::Closure(_) | HostExpr::Assign { .. } => {
                Err(Error::UnsupportedHostConstruct(SmolStr::new_static(expr.shape())))
            }
        }
    }

    fn lift_args<'a>(
        &self,
        args: impl IntoIterator<Item = &'a crate::Shared<HostExpr>>,
        depth: u32,
    ) -> Result<Vec<RuleExpr>, Error> {
        args.into_iter()
            .map(|arg| self.lift_expr(arg, depth + 1))
            .collect()
    }
}
