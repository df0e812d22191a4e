//! Scene graph store
//!
//! Owns every node in a generational arena and maintains the child and
//! sibling links. All linking goes through this type so the singly linked
//! child chains and the owner back-references never disagree.

use super::node::{ListNode, Node, NodeKind, NodeType};
use crate::error::{Result, SceneError};
use crate::foundation::collections::{NodeArena, NodeKey};

/// Arena of display-list nodes with a bounded capacity
#[derive(Debug, Clone)]
pub struct NodeStore {
    nodes: NodeArena<Node>,
    capacity: usize,
}

impl NodeStore {
    /// Store that will hold at most `capacity` live nodes
    pub fn new(capacity: usize) -> Self {
        Self {
            nodes: NodeArena::with_key(),
            capacity,
        }
    }

    /// Allocate a free-standing node
    pub fn alloc(&mut self, node: Node) -> Result<NodeKey> {
        if self.nodes.len() >= self.capacity {
            return Err(SceneError::ResourceExhausted("display list node"));
        }
        Ok(self.nodes.insert(node))
    }

    /// Release a node. It must already be unlinked.
    pub fn free(&mut self, key: NodeKey) -> Option<Node> {
        self.nodes.remove(key)
    }

    /// Node by key
    pub fn get(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    /// Mutable node by key
    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    /// List payload by key
    pub fn list(&self, key: NodeKey) -> Option<&ListNode> {
        self.get(key).and_then(Node::as_list)
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the store is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over the children of a list in insertion order
    pub fn children(&self, list: NodeKey) -> Children<'_> {
        Children {
            store: self,
            next: self.list(list).and_then(|list| list.first),
        }
    }

    /// Containing list of a node
    pub fn owner(&self, key: NodeKey) -> Option<NodeKey> {
        self.get(key).and_then(|node| node.owner)
    }

    /// Append a free-standing node to the end of `list`
    pub fn append_child(&mut self, list: NodeKey, child: NodeKey) -> Result<()> {
        let previous_last = match self.get(list) {
            Some(Node {
                kind: NodeKind::List(list_node),
                ..
            }) => list_node.last,
            Some(node) => {
                return Err(SceneError::WrongType {
                    name: node.name,
                    expected: NodeType::List,
                    found: node.node_type(),
                })
            }
            None => return Err(SceneError::StaleNode),
        };
        let node = self.get_mut(child).ok_or(SceneError::StaleNode)?;
        node.next = None;
        node.owner = Some(list);

        if let Some(last) = previous_last {
            if let Some(last_node) = self.get_mut(last) {
                last_node.next = Some(child);
            }
        }
        if let Some(list_node) = self.get_mut(list).and_then(Node::as_list_mut) {
            if list_node.first.is_none() {
                list_node.first = Some(child);
            }
            list_node.last = Some(child);
        }
        Ok(())
    }

    /// Unlink `child` from its containing list. Returns false when it was free-standing.
    pub fn unlink(&mut self, child: NodeKey) -> bool {
        let Some(list) = self.owner(child) else {
            return false;
        };
        let next = self.get(child).and_then(|node| node.next);

        let mut previous = None;
        let mut cursor = self.list(list).and_then(|list| list.first);
        while let Some(key) = cursor {
            if key == child {
                break;
            }
            previous = Some(key);
            cursor = self.get(key).and_then(|node| node.next);
        }
        if cursor.is_none() {
            return false;
        }

        match previous {
            Some(previous) => {
                if let Some(node) = self.get_mut(previous) {
                    node.next = next;
                }
            }
            None => {
                if let Some(list_node) = self.get_mut(list).and_then(Node::as_list_mut) {
                    list_node.first = next;
                }
            }
        }
        if let Some(list_node) = self.get_mut(list).and_then(Node::as_list_mut) {
            if list_node.last == Some(child) {
                list_node.last = previous;
            }
        }
        if let Some(node) = self.get_mut(child) {
            node.next = None;
            node.owner = None;
        }
        true
    }

    /// Detach every child of `list`, returning them in order
    pub fn take_children(&mut self, list: NodeKey) -> Vec<NodeKey> {
        let children: Vec<NodeKey> = self.children(list).collect();
        for child in &children {
            if let Some(node) = self.get_mut(*child) {
                node.next = None;
                node.owner = None;
            }
        }
        if let Some(list_node) = self.get_mut(list).and_then(Node::as_list_mut) {
            list_node.first = None;
            list_node.last = None;
        }
        children
    }

    /// True when `ancestor` is `node` or contains it at any depth
    pub fn is_ancestor_or_self(&self, ancestor: NodeKey, node: NodeKey) -> bool {
        let mut cursor = Some(node);
        while let Some(key) = cursor {
            if key == ancestor {
                return true;
            }
            cursor = self.owner(key);
        }
        false
    }

    /// Chain of containing lists from the outermost list down to `node` itself
    pub fn path_from_root(&self, node: NodeKey) -> Vec<NodeKey> {
        let mut path = vec![node];
        let mut cursor = self.owner(node);
        while let Some(key) = cursor {
            if path.contains(&key) {
                break;
            }
            path.push(key);
            cursor = self.owner(key);
        }
        path.reverse();
        path
    }
}

/// Iterator over the children of a list
pub struct Children<'a> {
    store: &'a NodeStore,
    next: Option<NodeKey>,
}

impl Iterator for Children<'_> {
    type Item = NodeKey;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.store.get(current).and_then(|node| node.next);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::node::{ListFlags, Name};

    fn list_node() -> Node {
        Node::new(Name::UNNAMED, NodeKind::List(ListNode::new(ListFlags::PROCESS)))
    }

    fn leaf() -> Node {
        Node::new(Name::UNNAMED, NodeKind::Deleted)
    }

    #[test]
    fn test_append_keeps_insertion_order() {
        let mut store = NodeStore::new(16);
        let list = store.alloc(list_node()).unwrap();
        let a = store.alloc(leaf()).unwrap();
        let b = store.alloc(leaf()).unwrap();
        let c = store.alloc(leaf()).unwrap();
        for child in [a, b, c] {
            store.append_child(list, child).unwrap();
        }
        assert_eq!(store.children(list).collect::<Vec<_>>(), vec![a, b, c]);
        assert_eq!(store.owner(b), Some(list));
    }

    #[test]
    fn test_unlink_first_middle_last() {
        let mut store = NodeStore::new(16);
        let list = store.alloc(list_node()).unwrap();
        let children: Vec<_> = (0..4).map(|_| store.alloc(leaf()).unwrap()).collect();
        for child in &children {
            store.append_child(list, *child).unwrap();
        }

        assert!(store.unlink(children[1]));
        assert!(store.unlink(children[0]));
        assert!(store.unlink(children[3]));
        assert_eq!(store.children(list).collect::<Vec<_>>(), vec![children[2]]);
        assert_eq!(store.list(list).unwrap().last, Some(children[2]));

        let e = store.alloc(leaf()).unwrap();
        store.append_child(list, e).unwrap();
        assert_eq!(store.children(list).collect::<Vec<_>>(), vec![children[2], e]);
        assert!(!store.unlink(children[0]));
    }

    #[test]
    fn test_capacity_is_resource_exhaustion() {
        let mut store = NodeStore::new(1);
        store.alloc(leaf()).unwrap();
        assert_eq!(
            store.alloc(leaf()),
            Err(SceneError::ResourceExhausted("display list node"))
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_ancestry_and_path() {
        let mut store = NodeStore::new(16);
        let root = store.alloc(list_node()).unwrap();
        let inner = store.alloc(list_node()).unwrap();
        let item = store.alloc(leaf()).unwrap();
        store.append_child(root, inner).unwrap();
        store.append_child(inner, item).unwrap();

        assert!(store.is_ancestor_or_self(root, item));
        assert!(store.is_ancestor_or_self(inner, inner));
        assert!(!store.is_ancestor_or_self(inner, root));
        assert_eq!(store.path_from_root(item), vec![root, inner, item]);
    }
}
