use std::fmt;
use std::str::FromStr;

use super::{NodeId, TreeStore};
use crate::error::TreeError;

/// Scheme prefix used when an address travels as a drag-and-drop payload.
pub const URI_SCHEME: &str = "tree://";

/// Position of a node as child indices from the root.
///
/// Only meaningful against the tree it was taken from. After children are
/// added, removed or reloaded an old address may miss or land on a different
/// node; re-resolve by id when the reference must outlive a mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathAddress(Vec<usize>);

impl PathAddress {
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    /// The empty address, which resolves to the root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Address of the `index`-th child of this position.
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// Address of the containing position, `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.0.split_last()?;
        Some(Self(rest.to_vec()))
    }

    /// `tree://0.3.1` form.
    pub fn to_uri(&self) -> String {
        format!("{URI_SCHEME}{self}")
    }

    pub fn from_uri(uri: &str) -> Result<Self, TreeError> {
        uri.strip_prefix(URI_SCHEME)
            .ok_or_else(|| TreeError::InvalidAddress(uri.to_string()))?
            .parse()
    }
}

impl fmt::Display for PathAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{index}")?;
        }
        Ok(())
    }
}

impl FromStr for PathAddress {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }
        s.split('.')
            .map(|part| part.parse::<usize>())
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
            .map_err(|_| TreeError::InvalidAddress(s.to_string()))
    }
}

impl TreeStore {
    /// Follow `address` from the root. Misses (index out of range, or
    /// indexing past a leaf) yield `None`.
    pub fn resolve(&self, address: &PathAddress) -> Option<NodeId> {
        address
            .indices()
            .iter()
            .try_fold(self.root(), |node, &index| self.children(node).get(index).copied())
    }

    /// Address of `node` in the current tree, `None` when the node is not
    /// attached to this store's root.
    pub fn address_of(&self, node: NodeId) -> Option<PathAddress> {
        let mut indices = Vec::new();
        let mut current = node;
        while current != self.root() {
            let parent = self.parent(current)?;
            let index = self.children(parent).iter().position(|c| *c == current)?;
            indices.push(index);
            current = parent;
        }
        indices.reverse();
        Some(PathAddress(indices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{sample_tree, InsertRequest};

    #[test]
    fn display_is_dot_joined() {
        assert_eq!(PathAddress::new(vec![0, 3, 1]).to_string(), "0.3.1");
        assert_eq!(PathAddress::root().to_string(), "");
    }

    #[test]
    fn parse_round_trips_display() {
        let addr: PathAddress = "0.3.1".parse().unwrap();
        assert_eq!(addr.indices(), &[0, 3, 1]);
        assert!("".parse::<PathAddress>().unwrap().is_root());
    }

    #[test]
    fn parse_rejects_garbage() {
        for bad in ["0.x", "1..2", "-1", "0.", " 1"] {
            assert!(
                matches!(bad.parse::<PathAddress>(), Err(TreeError::InvalidAddress(_))),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn uri_form() {
        let addr = PathAddress::new(vec![2, 0]);
        assert_eq!(addr.to_uri(), "tree://2.0");
        assert_eq!(PathAddress::from_uri("tree://2.0").unwrap(), addr);
        assert!(PathAddress::from_uri("file:///2.0").is_err());
    }

    #[test]
    fn child_and_parent() {
        let addr = PathAddress::root().child(1).child(4);
        assert_eq!(addr.to_string(), "1.4");
        assert_eq!(addr.parent().unwrap().to_string(), "1");
        assert!(PathAddress::root().parent().is_none());
    }

    #[test]
    fn resolve_walks_children() {
        let store = sample_tree();
        let main = store.resolve(&"0.0.0".parse().unwrap()).unwrap();
        assert_eq!(store.node(main).unwrap().id(), "/proj/src/main");
        assert_eq!(store.resolve(&PathAddress::root()), Some(store.root()));
    }

    #[test]
    fn resolve_misses_are_none() {
        let store = sample_tree();
        // out of range
        assert!(store.resolve(&"5".parse().unwrap()).is_none());
        // past a leaf: notes.txt has no children
        assert!(store.resolve(&"1.0".parse().unwrap()).is_none());
    }

    #[test]
    fn address_round_trips_for_every_node() {
        let store = sample_tree();
        for node in store.descendants(store.root()) {
            let addr = store.address_of(node).unwrap();
            assert_eq!(store.resolve(&addr), Some(node), "address {addr}");
        }
    }

    #[test]
    fn stale_address_after_mutation() {
        let mut store = sample_tree();
        let proj = store.find_by_id("/proj").unwrap();
        let src = store.find_by_id("/proj/src").unwrap();
        let addr = store.address_of(src).unwrap();

        store.clear_children(proj);
        assert!(store.resolve(&addr).is_none());
        assert!(store.address_of(src).is_none());

        let fresh = store
            .insert(InsertRequest::new("/proj/other", Vec::new()).under(proj))
            .unwrap();
        assert_eq!(store.resolve(&addr), Some(fresh));
    }
}
