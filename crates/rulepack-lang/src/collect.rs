//! Free-variable and operator collection over host trees.
//!
//! Both collectors walk the tree with an explicit worklist, so arbitrarily deep
//! input cannot overflow the stack.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::{
    constants::{ARRAY_SUM, IN_ARRAY},
    host::{Closure, HostExpr},
    rule::Name,
};

type ScopeId = usize;

/// Names bound by an enclosing closure: its parameters and the targets of its
/// top-level assignments.
#[derive(Debug, Default)]
struct Scope {
    parent: Option<ScopeId>,
    names: FxHashSet<Name>,
}

/// Pre-order, left-to-right traversal that tracks closure scopes.
struct PreOrder<'a> {
    stack: Vec<(&'a HostExpr, Option<ScopeId>)>,
    scopes: Vec<Scope>,
}

impl<'a> PreOrder<'a> {
    fn new(root: &'a HostExpr) -> Self {
        Self {
            stack: vec![(root, None)],
            scopes: Vec::new(),
        }
    }

    fn is_bound(&self, mut scope: Option<ScopeId>, name: &str) -> bool {
        while let Some(id) = scope {
            if self.scopes[id].names.contains(name) {
                return true;
            }
            scope = self.scopes[id].parent;
        }
        false
    }

    fn enter_closure(&mut self, closure: &Closure, parent: Option<ScopeId>) -> ScopeId {
        self.scopes.push(Scope {
            parent,
            names: closure_bindings(closure),
        });
        self.scopes.len() - 1
    }
}

/// Names a closure binds for its body: its parameters and the targets of its
/// top-level assignments.
pub(crate) fn closure_bindings(closure: &Closure) -> FxHashSet<Name> {
    let mut names: FxHashSet<Name> = closure.params.iter().cloned().collect();
    names.extend(closure.body.iter().filter_map(|stmt| match &**stmt.expr() {
        HostExpr::Assign { target, .. } => Some(target.clone()),
        _ => None,
    }));
    names
}

/// Closure scopes enclosing a node during a recursive rewrite.
pub(crate) struct LocalScope<'a> {
    names: FxHashSet<Name>,
    parent: Option<&'a LocalScope<'a>>,
}

impl<'a> LocalScope<'a> {
    pub(crate) fn enter(closure: &Closure, parent: Option<&'a LocalScope<'a>>) -> Self {
        Self {
            names: closure_bindings(closure),
            parent,
        }
    }

    pub(crate) fn binds(&self, name: &str) -> bool {
        self.names.contains(name) || self.parent.is_some_and(|parent| parent.binds(name))
    }
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = (&'a HostExpr, Option<ScopeId>);

    fn next(&mut self) -> Option<Self::Item> {
        let (node, scope) = self.stack.pop()?;

        let mut children: SmallVec<[(&'a HostExpr, Option<ScopeId>); 4]> = SmallVec::new();
        match node {
            HostExpr::Literal { .. } | HostExpr::Ident { .. } | HostExpr::Const { .. } => {}
            HostExpr::Binary { left, right, .. } => {
                children.push((&**left, scope));
                children.push((&**right, scope));
            }
            HostExpr::Not { operand } => children.push((&**operand, scope)),
            HostExpr::Call { args, .. } => children.extend(args.iter().map(|arg| (&**arg, scope))),
            HostExpr::Array { items } => children.extend(items.iter().map(|item| (&**item, scope))),
            HostExpr::Assign { value, .. } => children.push((&**value, scope)),
            HostExpr::Closure(closure) => {
                let inner = self.enter_closure(closure, scope);
                children.extend(closure.body.iter().map(|stmt| (&**stmt.expr(), Some(inner))));
            }
        }

        self.stack.extend(children.into_iter().rev());
        Some((node, scope))
    }
}

/// Collects the free variables of `expr` in first-occurrence order.
///
/// An identifier counts only in value position. Call callees name functions, not
/// context variables, and are never collected. Names bound by an enclosing
/// closure inside `expr` are skipped as well.
pub fn collect_variables(expr: &HostExpr) -> Vec<Name> {
    let mut walker = PreOrder::new(expr);
    let mut seen = FxHashSet::default();
    let mut variables = Vec::new();

    while let Some((node, scope)) = walker.next() {
        if let HostExpr::Ident { name } = node
            && !walker.is_bound(scope, name)
            && seen.insert(name.clone())
        {
            variables.push(name.clone());
        }
    }

    variables
}

/// Collects the user-defined operators `expr` calls, in first-occurrence order.
///
/// Calls to the built-in mapped functions `in_array` and `array_sum` are skipped,
/// and so are calls to names bound by an enclosing closure inside `expr`.
pub fn collect_operators(expr: &HostExpr) -> Vec<Name> {
    let mut walker = PreOrder::new(expr);
    let mut seen = FxHashSet::default();
    let mut operators = Vec::new();

    while let Some((node, scope)) = walker.next() {
        if let HostExpr::Call { callee, .. } = node
            && !is_builtin_call(callee)
            && !walker.is_bound(scope, callee)
            && seen.insert(callee.clone())
        {
            operators.push(callee.clone());
        }
    }

    operators
}

pub(crate) fn is_builtin_call(callee: &str) -> bool {
    callee == IN_ARRAY || callee == ARRAY_SUM
}
