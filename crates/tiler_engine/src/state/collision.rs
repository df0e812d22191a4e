//! Active collision points

use std::collections::HashSet;

use crate::error::{Result, SceneError};
use crate::foundation::collections::{BoundedVec, NodeKey};
use crate::foundation::math::Point3;
use crate::scene::Name;

/// A point being tested against convex primitives
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivePoint {
    /// Point node
    pub node: NodeKey,
    /// Point node name
    pub name: Name,
    /// World-space position
    pub position: Point3,
    /// Disabled points stay listed but are not tested
    pub enabled: bool,
}

/// A point found inside a convex primitive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionHit {
    /// Point node name
    pub point: Name,
    /// Convex node name
    pub convex: Name,
    /// World-space point position
    pub position: Point3,
}

/// Points active in the current subtree
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionState {
    points: BoundedVec<ActivePoint>,
}

impl CollisionState {
    /// Empty state holding at most `capacity` points
    pub fn new(capacity: usize) -> Self {
        Self {
            points: BoundedVec::new(capacity),
        }
    }

    /// Start testing a point
    pub fn add(&mut self, point: ActivePoint) -> Result<()> {
        self.points
            .try_push(point)
            .map_err(|_| SceneError::ResourceExhausted("collision point slot"))
    }

    /// Enable or disable every point with this name; false when none matched
    pub fn switch(&mut self, name: Name, enabled: bool) -> bool {
        let mut found = false;
        for point in self.points.as_mut_slice() {
            if point.name == name {
                point.enabled = enabled;
                found = true;
            }
        }
        found
    }

    /// Drop points that were invalidated elsewhere in the traversal
    pub fn compact(&mut self, invalidated: &HashSet<NodeKey>) {
        self.points.retain(|point| !invalidated.contains(&point.node));
    }

    /// Enabled points
    pub fn enabled(&self) -> impl Iterator<Item = &ActivePoint> {
        self.points.iter().filter(|point| point.enabled)
    }

    /// True when at least one point is enabled
    pub fn has_enabled(&self) -> bool {
        self.enabled().next().is_some()
    }

    /// Every listed point
    pub fn points(&self) -> &[ActivePoint] {
        self.points.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::collections::NodeArena;

    fn point(key: NodeKey, raw: u32) -> ActivePoint {
        ActivePoint {
            node: key,
            name: Name::new(raw),
            position: Point3::origin(),
            enabled: true,
        }
    }

    #[test]
    fn test_switch_keeps_point_listed() {
        let mut arena: NodeArena<()> = NodeArena::with_key();
        let key = arena.insert(());
        let mut state = CollisionState::new(4);
        state.add(point(key, 7)).unwrap();

        assert!(state.switch(Name::new(7), false));
        assert!(!state.has_enabled());
        assert_eq!(state.points().len(), 1);
        assert!(!state.switch(Name::new(8), true));
    }

    #[test]
    fn test_compact_drops_invalidated() {
        let mut arena: NodeArena<()> = NodeArena::with_key();
        let first = arena.insert(());
        let second = arena.insert(());
        let mut state = CollisionState::new(4);
        state.add(point(first, 1)).unwrap();
        state.add(point(second, 2)).unwrap();

        state.compact(&HashSet::from([first]));
        assert_eq!(state.points().len(), 1);
        assert_eq!(state.points()[0].name, Name::new(2));
    }

    #[test]
    fn test_full_state_reports_exhaustion() {
        let mut arena: NodeArena<()> = NodeArena::with_key();
        let key = arena.insert(());
        let mut state = CollisionState::new(1);
        state.add(point(key, 1)).unwrap();
        assert!(state.add(point(key, 2)).is_err());
    }
}
