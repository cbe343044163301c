//! Dependency paths
//!
//! The path from a resolution root to the node currently being resolved. It
//! doubles as the instantiation stack used for circular-reference detection.

use crate::component::ComponentType;
use std::fmt;

/// One node of a [`DependencyPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathNode {
    api: ComponentType,
    implementation: ComponentType,
    instantiating: bool,
}

impl PathNode {
    /// The requested API type.
    #[inline]
    pub fn api(&self) -> ComponentType {
        self.api
    }

    /// The implementation chosen for the API.
    #[inline]
    pub fn implementation(&self) -> ComponentType {
        self.implementation
    }

    /// Whether the node was being constructed (rather than replayed from cache).
    #[inline]
    pub fn is_instantiating(&self) -> bool {
        self.instantiating
    }
}

/// Ordered `(api, implementation)` nodes from the root request to the current node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyPath {
    nodes: Vec<PathNode>,
}

impl DependencyPath {
    /// An empty path.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node currently being resolved.
    #[inline]
    pub fn last(&self) -> Option<&PathNode> {
        self.nodes.last()
    }

    /// Iterate from root to leaf.
    pub fn iter(&self) -> impl Iterator<Item = &PathNode> {
        self.nodes.iter()
    }

    /// Whether an implementation appears anywhere on the path.
    pub fn contains(&self, implementation: ComponentType) -> bool {
        self.nodes
            .iter()
            .any(|node| node.implementation == implementation)
    }

    pub(crate) fn push(&mut self, api: ComponentType, implementation: ComponentType) {
        self.nodes.push(PathNode {
            api,
            implementation,
            instantiating: false,
        });
    }

    pub(crate) fn pop(&mut self) {
        self.nodes.pop();
    }

    /// Mark the leaf as under construction.
    ///
    /// Fails if the leaf's implementation is already being constructed further
    /// up the path, which is a circular reference.
    pub(crate) fn begin_instantiation(&mut self) -> bool {
        let Some((leaf, ancestors)) = self.nodes.split_last_mut() else {
            return true;
        };
        let cyclic = ancestors
            .iter()
            .any(|node| node.instantiating && node.implementation == leaf.implementation);
        leaf.instantiating = true;
        !cyclic
    }
}

impl fmt::Display for DependencyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nodes.is_empty() {
            return f.write_str("<root>");
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            if node.api == node.implementation {
                write!(f, "{}", node.implementation)?;
            } else {
                write!(f, "{}({})", node.api, node.implementation)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Key {}
    struct Value;
    struct Other;

    #[test]
    fn test_display() {
        let mut path = DependencyPath::new();
        assert_eq!(path.to_string(), "<root>");

        path.push(ComponentType::of::<dyn Key>(), ComponentType::of::<Value>());
        path.push(ComponentType::of::<Other>(), ComponentType::of::<Other>());
        assert_eq!(path.to_string(), "dyn Key(Value) -> Other");
    }

    #[test]
    fn test_instantiation_cycle() {
        let value = ComponentType::of::<Value>();
        let other = ComponentType::of::<Other>();
        let mut path = DependencyPath::new();

        path.push(value, value);
        assert!(path.begin_instantiation());
        path.push(other, other);
        assert!(path.begin_instantiation());
        path.push(value, value);
        assert!(!path.begin_instantiation());
    }

    #[test]
    fn test_reference_only_nodes_are_not_cycles() {
        let value = ComponentType::of::<Value>();
        let mut path = DependencyPath::new();

        // First node replayed from cache, never marked
        path.push(value, value);
        path.push(value, value);
        assert!(path.begin_instantiation());
        assert!(path.contains(value));
    }
}
