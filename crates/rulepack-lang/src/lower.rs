//! Rule model to host tree lowering.

use std::str::FromStr;

use smol_str::SmolStr;

use crate::{
    Error, Options, Shared,
    constants::{ARRAY_SUM, IN_ARRAY},
    host::{Args, BinaryOp, HostExpr},
    rule::{BuiltinOperator, RuleExpr},
};

/// Lowers rule expressions into host trees.
///
/// The mapping is a structural homomorphism: every rule node becomes exactly one
/// host node, and nothing is folded or simplified along the way. Note that `=`
/// and `is` both lower to `==`, so lifting the result back always yields `=`.
#[derive(Debug, Clone, Default)]
pub struct Lowerer {
    options: Options,
}

impl Lowerer {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    pub fn lower(&self, rule: &RuleExpr) -> Result<Shared<HostExpr>, Error> {
        tracing::debug!(rule = %rule, "lowering rule expression");
        self.lower_expr(rule, 0)
    }

    fn lower_expr(&self, rule: &RuleExpr, depth: u32) -> Result<Shared<HostExpr>, Error> {
        self.options.check_depth(depth)?;

        match rule {
            RuleExpr::Scalar { value } => Ok(HostExpr::literal(value.clone())),
            RuleExpr::ContextRef { name } => Ok(Shared::new(HostExpr::Ident { name: name.clone() })),
            RuleExpr::Array { items } => Ok(Shared::new(HostExpr::Array {
                items: self.lower_args(items, depth)?,
            })),
            RuleExpr::Operator {
                name,
                args,
                is_function,
            } => match BuiltinOperator::from_str(name) {
                Ok(op) => self.lower_builtin(op, args, depth),
                Err(_) if *is_function => Ok(Shared::new(HostExpr::Call {
                    callee: name.clone(),
                    args: self.lower_args(args, depth)?,
                })),
                Err(_) => Err(Error::UnsupportedOperator(name.clone())),
            },
        }
    }

    fn lower_builtin(
        &self,
        op: BuiltinOperator,
        args: &[RuleExpr],
        depth: u32,
    ) -> Result<Shared<HostExpr>, Error> {
        if !op.arity().accepts(args.len()) {
            return Err(Error::InvalidArity {
                name: SmolStr::new_static(op.into()),
                expected: op.arity(),
                got: args.len(),
            });
        }

        let binary = match op {
            BuiltinOperator::And => BinaryOp::And,
            BuiltinOperator::Or => BinaryOp::Or,
            BuiltinOperator::Xor => BinaryOp::Xor,
            BuiltinOperator::Eq | BuiltinOperator::Is => BinaryOp::Eq,
            BuiltinOperator::NotEq => BinaryOp::NotEq,
            BuiltinOperator::Gt => BinaryOp::Gt,
            BuiltinOperator::Gte => BinaryOp::Gte,
            BuiltinOperator::Lt => BinaryOp::Lt,
            BuiltinOperator::Lte => BinaryOp::Lte,
            BuiltinOperator::Not => {
                return Ok(HostExpr::not(self.lower_expr(&args[0], depth + 1)?));
            }
            BuiltinOperator::In => {
                return Ok(Shared::new(HostExpr::Call {
                    callee: SmolStr::new_static(IN_ARRAY),
                    args: self.lower_args(args, depth)?,
                }));
            }
            BuiltinOperator::Sum => {
                return Ok(Shared::new(HostExpr::Call {
                    callee: SmolStr::new_static(ARRAY_SUM),
                    args: self.lower_args(args, depth)?,
                }));
            }
        };

        Ok(HostExpr::binary(
            binary,
            self.lower_expr(&args[0], depth + 1)?,
            self.lower_expr(&args[1], depth + 1)?,
        ))
    }

    fn lower_args(&self, args: &[RuleExpr], depth: u32) -> Result<Args, Error> {
        args.iter().map(|arg| self.lower_expr(arg, depth + 1)).collect()
    }
}
