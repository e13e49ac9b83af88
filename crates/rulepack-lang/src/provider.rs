//! Sources of user-defined operator bodies.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::{Shared, host::HostExpr, rule::Name};

/// Supplies the implementation body of a user-defined operator, usually a closure.
///
/// Where bodies come from (a static registry, embedded source, a build step) is up
/// to the implementor.
pub trait OperatorBodyProvider {
    fn body_for(&self, name: &str) -> Option<Shared<HostExpr>>;
}

impl<F> OperatorBodyProvider for F
where
    F: Fn(&str) -> Option<Shared<HostExpr>>,
{
    fn body_for(&self, name: &str) -> Option<Shared<HostExpr>> {
        self(name)
    }
}

/// Operator bodies keyed by name, iterated in registration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperatorRegistry {
    entries: Vec<(Name, Shared<HostExpr>)>,
    index: FxHashMap<Name, usize>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `body` under `name`, returning the body it replaced.
    ///
    /// Re-registering a name keeps its original position.
    pub fn register(&mut self, name: &str, body: Shared<HostExpr>) -> Option<Shared<HostExpr>> {
        match self.index.get(name) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i].1, body)),
            None => {
                let name = SmolStr::new(name);
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, body));
                None
            }
        }
    }

    pub fn with(mut self, name: &str, body: Shared<HostExpr>) -> Self {
        self.register(name, body);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Shared<HostExpr>> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &Shared<HostExpr>)> {
        self.entries.iter().map(|(name, body)| (name, body))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl OperatorBodyProvider for OperatorRegistry {
    fn body_for(&self, name: &str) -> Option<Shared<HostExpr>> {
        self.get(name).cloned()
    }
}

impl<S: AsRef<str>> FromIterator<(S, Shared<HostExpr>)> for OperatorRegistry {
    fn from_iter<T: IntoIterator<Item = (S, Shared<HostExpr>)>>(iter: T) -> Self {
        let mut registry = Self::new();
        for (name, body) in iter {
            registry.register(name.as_ref(), body);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_keeps_insertion_order() {
        let registry = OperatorRegistry::new()
            .with("zeta", HostExpr::literal(1))
            .with("alpha", HostExpr::literal(2))
            .with("mid", HostExpr::literal(3));

        let names: Vec<_> = registry.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_register_replaces_in_place() {
        let mut registry = OperatorRegistry::new()
            .with("a", HostExpr::literal(1))
            .with("b", HostExpr::literal(2));

        let previous = registry.register("a", HostExpr::literal(10));

        assert_eq!(previous, Some(HostExpr::literal(1)));
        assert_eq!(registry.get("a"), Some(&HostExpr::literal(10)));
        let names: Vec<_> = registry.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_closure_provider() {
        let provider = |name: &str| (name == "logged").then(|| HostExpr::constant("true"));

        assert_eq!(provider.body_for("logged"), Some(HostExpr::constant("true")));
        assert_eq!(provider.body_for("other"), None);
    }

    #[test]
    fn test_from_iterator() {
        let registry: OperatorRegistry = [("f", HostExpr::literal(1))].into_iter().collect();
        assert!(registry.contains("f"));
        assert!(!registry.is_empty());
        assert_eq!(registry.body_for("f"), Some(HostExpr::literal(1)));
    }
}
