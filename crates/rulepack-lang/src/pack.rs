//! Closure packing.
//!
//! Turns a lowered rule into one self-contained function. Parameters are the
//! rule's free context variables in first-occurrence order, and every
//! user-defined operator the rule calls becomes a private binding at the top of
//! the body:
//!
//! ```text
//! logged(user) and group in ("customer","guest") and points > 30
//!
//! function (user, group, points) {
//!     c_logged = <body of logged>;
//!     return c_logged(user) and in_array(group, array('customer','guest')) and points > 30;
//! }
//! ```
//!
//! Call sites are renamed before parameters are inferred. A lowered rule cannot
//! tell a call of operator `x` from a reference to variable `x` by anything but
//! position, and the prefixed name can never be mistaken for a context variable.

use crate::{
    Error, Options, Shared,
    collect::{LocalScope, collect_operators, collect_variables, is_builtin_call},
    host::{Args, Closure, HostExpr, Stmt},
    provider::{OperatorBodyProvider, OperatorRegistry},
};

#[derive(Debug, Clone, Default)]
pub struct Packer {
    options: Options,
}

impl Packer {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    /// Packs `expr` together with `operators` into a closure.
    ///
    /// Bindings are emitted in the registry's insertion order, one per registered
    /// operator, whether or not `expr` calls it.
    pub fn pack(&self, expr: &Shared<HostExpr>, operators: &OperatorRegistry) -> Result<Closure, Error> {
        tracing::debug!(operators = operators.len(), "packing expression");
        self.options.validate()?;

        let renamed = self.rename_calls(expr, operators, None, 0)?;
        let params = collect_variables(&renamed);

        if let Some(name) = params
            .iter()
            .find(|name| name.starts_with(self.options.call_prefix.as_str()))
        {
            return Err(Error::ReservedName {
                name: name.clone(),
                prefix: self.options.call_prefix.clone(),
            });
        }

        let mut body: Vec<Stmt> = operators
            .iter()
            .map(|(name, operator)| Stmt::Expr {
                expr: Shared::new(HostExpr::Assign {
                    target: self.options.binding_name(name),
                    value: Shared::clone(operator),
                }),
            })
            .collect();
        body.push(Stmt::Return { expr: renamed });

        tracing::debug!(params = ?params, "packed closure");
        Ok(Closure { params, body })
    }

    /// Packs `expr`, fetching the body of each operator it calls from `provider`.
    ///
    /// Only operators that are actually called are bound, in the order they are
    /// first called.
    pub fn pack_with_provider<P>(&self, expr: &Shared<HostExpr>, provider: &P) -> Result<Closure, Error>
    where
        P: OperatorBodyProvider + ?Sized,
    {
        let mut operators = OperatorRegistry::new();
        for name in collect_operators(expr) {
            match provider.body_for(&name) {
                Some(body) => {
                    operators.register(&name, body);
                }
                None if self.options.strict => return Err(Error::MissingOperatorBody(name)),
                None => {}
            }
        }

        self.pack(expr, &operators)
    }

    /// Rewrites every call of a registered operator to its prefixed binding.
    ///
    /// Calls to names bound by an enclosing closure are local and left alone.
    ///
    /// Unchanged subtrees are shared with the input rather than copied.
    fn rename_calls(
        &self,
        expr: &Shared<HostExpr>,
        operators: &OperatorRegistry,
        scope: Option<&LocalScope<'_>>,
        depth: u32,
    ) -> Result<Shared<HostExpr>, Error> {
        self.options.check_depth(depth)?;

        let renamed = match &**expr {
            HostExpr::Literal { .. } | HostExpr::Ident { .. } | HostExpr::Const { .. } => None,
            HostExpr::Binary { op, left, right } => {
                let new_left = self.rename_calls(left, operators, scope, depth + 1)?;
                let new_right = self.rename_calls(right, operators, scope, depth + 1)?;
                (!Shared::ptr_eq(left, &new_left) || !Shared::ptr_eq(right, &new_right)).then(|| {
                    HostExpr::Binary {
                        op: *op,
                        left: new_left,
                        right: new_right,
                    }
                })
            }
            HostExpr::Not { operand } => {
                let new_operand = self.rename_calls(operand, operators, scope, depth + 1)?;
                (!Shared::ptr_eq(operand, &new_operand)).then(|| HostExpr::Not {
                    operand: new_operand,
                })
            }
            HostExpr::Call { callee, args } => {
                let new_args = self.rename_args(args, operators, scope, depth)?;
                if scope.is_some_and(|scope| scope.binds(callee)) {
                    new_args.map(|args| HostExpr::Call {
                        callee: callee.clone(),
                        args,
                    })
                } else if operators.contains(callee) {
                    let binding = self.options.binding_name(callee);
                    tracing::trace!(callee = %callee, binding = %binding, "renaming call site");
                    Some(HostExpr::Call {
                        callee: binding,
                        args: new_args.unwrap_or_else(|| args.clone()),
                    })
                } else {
                    if !is_builtin_call(callee) {
                        if self.options.strict {
                            return Err(Error::MissingOperatorBody(callee.clone()));
                        }
                        tracing::warn!(callee = %callee, "no body supplied, leaving call unrenamed");
                    }
                    new_args.map(|args| HostExpr::Call {
                        callee: callee.clone(),
                        args,
                    })
                }
            }
            HostExpr::Array { items } => self
                .rename_args(items, operators, scope, depth)?
                .map(|items| HostExpr::Array { items }),
            HostExpr::Assign { target, value } => {
                let new_value = self.rename_calls(value, operators, scope, depth + 1)?;
                (!Shared::ptr_eq(value, &new_value)).then(|| HostExpr::Assign {
                    target: target.clone(),
                    value: new_value,
                })
            }
            HostExpr::Closure(closure) => {
                let inner = LocalScope::enter(closure, scope);
                let scope = Some(&inner);
                let mut changed = false;
                let mut body = Vec::with_capacity(closure.body.len());
                for stmt in &closure.body {
                    let expr = self.rename_calls(stmt.expr(), operators, scope, depth + 1)?;
                    changed |= !Shared::ptr_eq(stmt.expr(), &expr);
                    body.push(match stmt {
                        Stmt::Expr { .. } => Stmt::Expr { expr },
                        Stmt::Return { .. } => Stmt::Return { expr },
                    });
                }
                changed.then(|| {
                    HostExpr::Closure(Closure {
                        params: closure.params.clone(),
                        body,
                    })
                })
            }
        };

        Ok(renamed.map_or_else(|| Shared::clone(expr), Shared::new))
    }

    /// Renames within `args`, returning `None` when nothing changed.
    fn rename_args(
        &self,
        args: &Args,
        operators: &OperatorRegistry,
        scope: Option<&LocalScope<'_>>,
        depth: u32,
    ) -> Result<Option<Args>, Error> {
        let new_args = args
            .iter()
            .map(|arg| self.rename_calls(arg, operators, scope, depth + 1))
            .collect::<Result<Args, _>>()?;

        let changed = args
            .iter()
            .zip(new_args.iter())
            .any(|(old, new)| !Shared::ptr_eq(old, new));
        Ok(changed.then_some(new_args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Lowerer,
        host::{BinaryOp, printer::{HostPrinter, SourcePrinter}},
        rule::{BuiltinOperator, RuleExpr},
    };
    use rstest::rstest;

    fn ctx(name: &str) -> RuleExpr {
        RuleExpr::context(name)
    }

    fn lower(rule: &RuleExpr) -> Shared<HostExpr> {
        Lowerer::default().lower(rule).unwrap()
    }

    fn logged_body() -> Shared<HostExpr> {
        Shared::new(HostExpr::from(Closure {
            params: vec!["user".into()],
            body: vec![Stmt::Return {
                expr: HostExpr::binary(BinaryOp::NotEq, HostExpr::ident("user"), HostExpr::literal("")),
            }],
        }))
    }

    #[test]
    fn test_pack_bare_context_reference() {
        let closure = Packer::default()
            .pack(&lower(&ctx("foo")), &OperatorRegistry::new())
            .unwrap();

        assert_eq!(closure.params, vec!["foo"]);
        assert_eq!(closure.body, vec![Stmt::Return { expr: HostExpr::ident("foo") }]);
        assert_eq!(
            SourcePrinter::default().print_closure(&closure),
            "function (foo) {\n    return foo;\n}"
        );
    }

    #[test]
    fn test_pack_splices_operator() {
        let body = logged_body();
        let operators = OperatorRegistry::new().with("foo", Shared::clone(&body));

        let closure = Packer::default()
            .pack(&lower(&RuleExpr::function("foo", vec![])), &operators)
            .unwrap();

        assert!(closure.params.is_empty());
        assert_eq!(
            closure.body,
            vec![
                Stmt::Expr { expr: HostExpr::assign("c_foo", body) },
                Stmt::Return { expr: HostExpr::call("c_foo", []) },
            ]
        );
    }

    #[test]
    fn test_pack_combination_without_operators() {
        let rule = RuleExpr::operator(
            BuiltinOperator::And,
            vec![
                RuleExpr::operator(
                    BuiltinOperator::In,
                    vec![
                        RuleExpr::scalar("foo"),
                        RuleExpr::array(vec![RuleExpr::scalar("foo"), RuleExpr::scalar("bar")]),
                    ],
                ),
                RuleExpr::operator(BuiltinOperator::Gt, vec![RuleExpr::scalar(50), RuleExpr::scalar(30)]),
            ],
        );
        let expr = lower(&rule);
        let printer = SourcePrinter::default();

        assert_eq!(
            printer.print_stmt(&Stmt::Expr { expr: Shared::clone(&expr) }),
            "in_array('foo', array('foo','bar')) and 50 > 30;"
        );

        let closure = Packer::default().pack(&expr, &OperatorRegistry::new()).unwrap();
        assert!(closure.params.is_empty());
        assert_eq!(closure.body, vec![Stmt::Return { expr }]);
    }

    #[test]
    fn test_pack_mixed_rule() {
        let rule = RuleExpr::operator(
            BuiltinOperator::And,
            vec![
                RuleExpr::operator(
                    BuiltinOperator::And,
                    vec![
                        RuleExpr::function("logged", vec![ctx("user")]),
                        RuleExpr::operator(
                            BuiltinOperator::In,
                            vec![
                                ctx("group"),
                                RuleExpr::array(vec![RuleExpr::scalar("customer"), RuleExpr::scalar("guest")]),
                            ],
                        ),
                    ],
                ),
                RuleExpr::operator(BuiltinOperator::Gt, vec![ctx("points"), RuleExpr::scalar(30)]),
            ],
        );
        let operators = OperatorRegistry::new().with("logged", logged_body());

        let closure = Packer::default().pack(&lower(&rule), &operators).unwrap();

        assert_eq!(closure.params, vec!["user", "group", "points"]);
        let bindings: Vec<_> = closure.bindings().map(|(name, _)| name.as_str()).collect();
        assert_eq!(bindings, vec!["c_logged"]);
        assert_eq!(
            SourcePrinter::default().print_closure(&closure),
            "function (user, group, points) {\n    c_logged = function (user) {\n        return user != '';\n    };\n    return c_logged(user) and in_array(group, array('customer','guest')) and points > 30;\n}"
        );
    }

    #[test]
    fn test_operator_name_also_used_as_variable() {
        // `foo(foo)`: the call is renamed, the argument stays a parameter.
        let rule = RuleExpr::function("foo", vec![ctx("foo")]);
        let operators = OperatorRegistry::new().with("foo", logged_body());

        let closure = Packer::default().pack(&lower(&rule), &operators).unwrap();

        assert_eq!(closure.params, vec!["foo"]);
        assert_eq!(
            closure.returned(),
            Some(&HostExpr::call("c_foo", [HostExpr::ident("foo")]))
        );
    }

    #[test]
    fn test_bindings_follow_registry_order() {
        let rule = RuleExpr::operator(
            BuiltinOperator::Or,
            vec![RuleExpr::function("a", vec![]), RuleExpr::function("b", vec![])],
        );
        let operators = OperatorRegistry::new()
            .with("b", HostExpr::constant("true"))
            .with("a", HostExpr::constant("false"))
            .with("unused", HostExpr::constant("true"));

        let closure = Packer::default().pack(&lower(&rule), &operators).unwrap();

        let bindings: Vec<_> = closure.bindings().map(|(name, _)| name.as_str()).collect();
        assert_eq!(bindings, vec!["c_b", "c_a", "c_unused"]);
    }

    #[test]
    fn test_rename_shares_untouched_subtrees() {
        let untouched = HostExpr::binary(BinaryOp::Gt, HostExpr::ident("points"), HostExpr::literal(30));
        let expr = HostExpr::binary(
            BinaryOp::And,
            HostExpr::call("logged", [HostExpr::ident("user")]),
            Shared::clone(&untouched),
        );
        let operators = OperatorRegistry::new().with("logged", logged_body());

        let closure = Packer::default().pack(&expr, &operators).unwrap();

        match closure.returned().map(|expr| &**expr) {
            Some(HostExpr::Binary { right, .. }) => assert!(Shared::ptr_eq(right, &untouched)),
            other => panic!("unexpected return: {:?}", other),
        }
        // The input is left as it was.
        assert_eq!(
            expr,
            HostExpr::binary(
                BinaryOp::And,
                HostExpr::call("logged", [HostExpr::ident("user")]),
                untouched,
            )
        );
    }

    #[rstest]
    #[case::missing_body(
        RuleExpr::function("logged", vec![ctx("user")]),
        Error::MissingOperatorBody("logged".into())
    )]
    #[case::reserved_prefix(
        RuleExpr::operator(BuiltinOperator::Gt, vec![ctx("c_points"), RuleExpr::scalar(1)]),
        Error::ReservedName { name: "c_points".into(), prefix: "c_".into() }
    )]
    fn test_pack_error(#[case] rule: RuleExpr, #[case] expected: Error) {
        assert_eq!(
            Packer::default().pack(&lower(&rule), &OperatorRegistry::new()),
            Err(expected)
        );
    }

    #[test]
    fn test_lenient_leaves_unknown_call() {
        let packer = Packer::new(Options {
            strict: false,
            ..Default::default()
        });
        let expr = lower(&RuleExpr::function("logged", vec![ctx("user")]));

        let closure = packer.pack(&expr, &OperatorRegistry::new()).unwrap();

        assert_eq!(closure.params, vec!["user"]);
        assert_eq!(closure.body, vec![Stmt::Return { expr }]);
    }

    #[test]
    fn test_custom_prefix() {
        let packer = Packer::new(Options {
            call_prefix: "op_".into(),
            ..Default::default()
        });
        let operators = OperatorRegistry::new().with("foo", logged_body());

        let closure = packer
            .pack(&lower(&RuleExpr::function("foo", vec![ctx("c_x")])), &operators)
            .unwrap();

        assert_eq!(closure.params, vec!["c_x"]);
        assert_eq!(
            closure.returned(),
            Some(&HostExpr::call("op_foo", [HostExpr::ident("c_x")]))
        );
    }

    #[test]
    fn test_pack_with_provider() {
        let rule = RuleExpr::operator(
            BuiltinOperator::And,
            vec![
                RuleExpr::function("second", vec![]),
                RuleExpr::function("first", vec![ctx("x")]),
            ],
        );
        let registry = OperatorRegistry::new()
            .with("first", HostExpr::constant("true"))
            .with("second", HostExpr::constant("false"))
            .with("unused", HostExpr::constant("true"));

        let closure = Packer::default()
            .pack_with_provider(&lower(&rule), &registry)
            .unwrap();

        let bindings: Vec<_> = closure.bindings().map(|(name, _)| name.as_str()).collect();
        assert_eq!(bindings, vec!["c_second", "c_first"]);
        assert_eq!(closure.params, vec!["x"]);
    }

    #[test]
    fn test_closure_local_calls_are_not_operators() {
        // function (g) { f = true; return f() and g() and logged(); }
        let inner = Shared::new(HostExpr::from(Closure {
            params: vec!["g".into()],
            body: vec![
                Stmt::Expr { expr: HostExpr::assign("f", HostExpr::constant("true")) },
                Stmt::Return {
                    expr: HostExpr::binary(
                        BinaryOp::And,
                        HostExpr::binary(BinaryOp::And, HostExpr::call("f", []), HostExpr::call("g", [])),
                        HostExpr::call("logged", []),
                    ),
                },
            ],
        }));
        let operators = OperatorRegistry::new()
            .with("logged", HostExpr::constant("true"))
            .with("f", HostExpr::constant("false"));

        let closure = Packer::default().pack(&inner, &operators).unwrap();

        assert_eq!(
            SourcePrinter::default().print_expr(closure.returned().unwrap()),
            "function (g) {\n    f = true;\n    return f() and g() and c_logged();\n}"
        );
        assert_eq!(
            Packer::default().pack(&inner, &OperatorRegistry::new()),
            Err(Error::MissingOperatorBody("logged".into()))
        );
    }

    #[test]
    fn test_pack_rejects_empty_prefix() {
        let packer = Packer::new(Options {
            call_prefix: "".into(),
            ..Default::default()
        });

        assert_eq!(
            packer.pack(&lower(&ctx("user")), &OperatorRegistry::new()),
            Err(Error::EmptyCallPrefix)
        );
    }

    #[test]
    fn test_pack_stops_at_max_depth() {
        let packer = Packer::new(Options {
            max_depth: 2,
            ..Default::default()
        });
        let shallow = HostExpr::not(HostExpr::not(HostExpr::ident("x")));
        let deep = HostExpr::not(Shared::clone(&shallow));

        assert!(packer.pack(&shallow, &OperatorRegistry::new()).is_ok());
        assert_eq!(
            packer.pack(&deep, &OperatorRegistry::new()),
            Err(Error::DepthLimitExceeded(2))
        );
    }

    #[test]
    fn test_pack_with_provider_missing_body() {
        let provider = |_: &str| -> Option<Shared<HostExpr>> { None };
        let expr = lower(&RuleExpr::function("logged", vec![]));

        assert_eq!(
            Packer::default().pack_with_provider(&expr, &provider),
            Err(Error::MissingOperatorBody("logged".into()))
        );
    }
}
