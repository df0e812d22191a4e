//! Specialized collection types

pub use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Stable arena key of a display-list node
    pub struct NodeKey;
}

/// Arena of display-list nodes addressed by [`NodeKey`]
pub type NodeArena<T> = SlotMap<NodeKey, T>;

/// Fixed-capacity vector used for the bounded tables of the render state.
///
/// Pushing past the capacity is refused rather than growing, so callers can
/// decide whether that is an error or a silent clamp.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedVec<T> {
    items: Vec<T>,
    capacity: usize,
}

impl<T> BoundedVec<T> {
    /// Create an empty vector that will hold at most `capacity` items
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::new(),
            capacity,
        }
    }

    /// Push an item, handing it back when the vector is full
    pub fn try_push(&mut self, item: T) -> Result<(), T> {
        if self.items.len() >= self.capacity {
            return Err(item);
        }
        self.items.push(item);
        Ok(())
    }

    /// Maximum number of items
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of stored items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing is stored
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Stored items
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Mutable access to the stored items
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items
    }

    /// Keep only the items matching the predicate
    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        self.items.retain(keep);
    }

    /// Iterate over the stored items
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}
