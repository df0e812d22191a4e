//! Fixed-capacity state stacks
//!
//! A stack never moves or overwrites a slot that a live frame refers to: new
//! state is always a copy pushed above the current top, and scopes give their
//! slots back with [`StateStack::release`]. Each slot carries a stamp that
//! changes whenever the slot is written, so caches derived from a state can
//! tell whether they are still current.

use crate::error::{Result, SceneError};

#[derive(Debug, Clone)]
struct Slot<T> {
    value: T,
    stamp: u64,
}

/// Stack of one kind of render state
#[derive(Debug, Clone)]
pub struct StateStack<T> {
    name: &'static str,
    slots: Vec<Slot<T>>,
    capacity: usize,
    next_stamp: u64,
}

impl<T: Clone> StateStack<T> {
    /// Stack holding `base` in slot 0 and at most `capacity` slots in total
    pub fn new(name: &'static str, capacity: usize, base: T) -> Self {
        Self {
            name,
            slots: vec![Slot { value: base, stamp: 0 }],
            capacity: capacity.max(1),
            next_stamp: 1,
        }
    }

    /// Copy slot `from` onto the top; returns the new slot index
    pub fn push_copy(&mut self, from: usize) -> Result<usize> {
        if self.slots.len() >= self.capacity {
            return Err(SceneError::StackOverflow { stack: self.name });
        }
        self.slots
            .try_reserve(1)
            .map_err(|_| SceneError::ResourceExhausted(self.name))?;
        let value = self.slots[from].value.clone();
        let stamp = self.bump();
        self.slots.push(Slot { value, stamp });
        Ok(self.slots.len() - 1)
    }

    fn bump(&mut self) -> u64 {
        let stamp = self.next_stamp;
        self.next_stamp += 1;
        stamp
    }

    /// State in slot `index`
    pub fn get(&self, index: usize) -> &T {
        &self.slots[index].value
    }

    /// Writable state in slot `index`; marks the slot as changed
    pub fn get_mut(&mut self, index: usize) -> &mut T {
        let stamp = self.bump();
        let slot = &mut self.slots[index];
        slot.stamp = stamp;
        &mut slot.value
    }

    /// Writable state in slot `index` for data derived from it; the stamp is
    /// left alone
    pub fn cache_mut(&mut self, index: usize) -> &mut T {
        &mut self.slots[index].value
    }

    /// Write stamp of slot `index`
    pub fn stamp(&self, index: usize) -> u64 {
        self.slots[index].stamp
    }

    /// Current height, to hand back to [`release`](Self::release)
    pub fn mark(&self) -> usize {
        self.slots.len()
    }

    /// Drop every slot pushed since `mark`
    pub fn release(&mut self, mark: usize) {
        self.slots.truncate(mark.max(1));
    }

    /// Slots in use
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false; slot 0 holds the base state
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Maximum number of slots
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Name used in overflow errors
    pub fn name(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_copy_and_release() {
        let mut stack = StateStack::new("test", 3, 5_u32);
        let top = stack.push_copy(0).unwrap();
        assert_eq!(top, 1);
        *stack.get_mut(top) = 9;
        assert_eq!(*stack.get(0), 5);
        assert_eq!(*stack.get(1), 9);

        let mark = stack.mark();
        stack.push_copy(1).unwrap();
        assert_eq!(
            stack.push_copy(1),
            Err(SceneError::StackOverflow { stack: "test" })
        );
        stack.release(mark);
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn test_stamps_change_on_write() {
        let mut stack = StateStack::new("test", 4, 0_u32);
        let before = stack.stamp(0);
        *stack.get_mut(0) += 1;
        assert_ne!(stack.stamp(0), before);

        let copy = stack.push_copy(0).unwrap();
        let copy_stamp = stack.stamp(copy);
        stack.release(1);
        let reused = stack.push_copy(0).unwrap();
        assert_eq!(copy, reused);
        assert_ne!(stack.stamp(reused), copy_stamp);
    }
}
