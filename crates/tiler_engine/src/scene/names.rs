//! Name table
//!
//! Maps integer names to nodes and counts how often shared lists are
//! instanced. The display list only talks to it through [`NameTable`], so a
//! host can supply its own symbol table.

use std::collections::HashMap;

use super::node::{Name, NodeType};
use crate::error::{Result, SceneError};
use crate::foundation::collections::NodeKey;

/// Symbol table capability used by the display list
pub trait NameTable {
    /// Node registered under `name`
    fn lookup(&self, name: Name) -> Option<NodeKey>;

    /// Node and type tag registered under `name`
    fn lookup_with_type(&self, name: Name) -> Option<(NodeKey, NodeType)>;

    /// Register a node and hand out a fresh name
    fn add(&mut self, node: NodeKey, node_type: NodeType) -> Result<Name>;

    /// Forget a name
    fn remove(&mut self, name: Name);

    /// One more instance refers to `name`
    fn inc_usage(&mut self, name: Name);

    /// One instance fewer refers to `name`
    fn dec_usage(&mut self, name: Name);

    /// Current usage count of `name`
    fn usage(&self, name: Name) -> u32;

    /// Record a new type tag for `name` (used when a node is tombstoned)
    fn retag(&mut self, name: Name, node_type: NodeType);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    node: NodeKey,
    node_type: NodeType,
    usage: u32,
}

/// In-memory name table with a bounded number of entries
#[derive(Debug, Clone)]
pub struct HandleTable {
    entries: HashMap<Name, Entry>,
    next_name: u32,
    capacity: usize,
}

impl HandleTable {
    /// Table that will hold at most `capacity` names
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            next_name: 1,
            capacity,
        }
    }

    /// Number of registered names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no names are registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl NameTable for HandleTable {
    fn lookup(&self, name: Name) -> Option<NodeKey> {
        self.entries.get(&name).map(|entry| entry.node)
    }

    fn lookup_with_type(&self, name: Name) -> Option<(NodeKey, NodeType)> {
        self.entries.get(&name).map(|entry| (entry.node, entry.node_type))
    }

    fn add(&mut self, node: NodeKey, node_type: NodeType) -> Result<Name> {
        if self.entries.len() >= self.capacity || self.next_name == u32::MAX {
            return Err(SceneError::ResourceExhausted("name table entry"));
        }
        self.entries
            .try_reserve(1)
            .map_err(|_| SceneError::ResourceExhausted("name table entry"))?;
        let name = Name::new(self.next_name);
        self.next_name += 1;
        self.entries.insert(name, Entry { node, node_type, usage: 0 });
        Ok(name)
    }

    fn remove(&mut self, name: Name) {
        self.entries.remove(&name);
    }

    fn inc_usage(&mut self, name: Name) {
        if let Some(entry) = self.entries.get_mut(&name) {
            entry.usage += 1;
        }
    }

    fn dec_usage(&mut self, name: Name) {
        if let Some(entry) = self.entries.get_mut(&name) {
            entry.usage = entry.usage.saturating_sub(1);
        }
    }

    fn usage(&self, name: Name) -> u32 {
        self.entries.get(&name).map_or(0, |entry| entry.usage)
    }

    fn retag(&mut self, name: Name, node_type: NodeType) {
        if let Some(entry) = self.entries.get_mut(&name) {
            entry.node_type = node_type;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::collections::NodeArena;

    #[test]
    fn test_add_lookup_remove() {
        let mut arena: NodeArena<()> = NodeArena::with_key();
        let key = arena.insert(());
        let mut table = HandleTable::new(4);

        let name = table.add(key, NodeType::List).unwrap();
        assert!(!name.is_unnamed());
        assert_eq!(table.lookup(name), Some(key));
        assert_eq!(table.lookup_with_type(name), Some((key, NodeType::List)));

        table.remove(name);
        assert_eq!(table.lookup(name), None);
    }

    #[test]
    fn test_capacity_is_resource_exhaustion() {
        let mut arena: NodeArena<()> = NodeArena::with_key();
        let key = arena.insert(());
        let mut table = HandleTable::new(1);
        table.add(key, NodeType::Light).unwrap();
        assert_eq!(
            table.add(key, NodeType::Light),
            Err(SceneError::ResourceExhausted("name table entry"))
        );
    }

    #[test]
    fn test_usage_counts_saturate() {
        let mut arena: NodeArena<()> = NodeArena::with_key();
        let key = arena.insert(());
        let mut table = HandleTable::new(4);
        let name = table.add(key, NodeType::List).unwrap();
        table.inc_usage(name);
        table.inc_usage(name);
        table.dec_usage(name);
        assert_eq!(table.usage(name), 1);
        table.dec_usage(name);
        table.dec_usage(name);
        assert_eq!(table.usage(name), 0);
    }
}
