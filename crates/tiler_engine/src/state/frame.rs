//! Render-state frames
//!
//! A [`StateFrame`] selects one slot on each of the six state stacks. Lists
//! that preserve state get a child frame with every save flag set: the first
//! change to a kind of state copies it to a fresh slot, later changes write
//! that slot in place. Lists that do not preserve state share their parent's
//! frame, so their changes stay visible to later siblings.

use bitflags::bitflags;

use super::collision::CollisionState;
use super::material::MaterialState;
use super::quality::QualityFlags;
use super::stack::StateStack;
use super::substitution::SubstitutionTable;
use crate::config::EngineConfig;
use crate::error::FirstError;
use crate::lighting::LightsState;
use crate::math::Transform;

/// The six kinds of inheritable render state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    /// Current material
    Material,
    /// Object-to-world transform
    Transform,
    /// Lights in effect
    Lights,
    /// Render-quality flags
    Quality,
    /// Active collision points
    Collision,
    /// Instance substitutions
    Substitution,
}

impl StateKind {
    /// Every kind, in frame-index order
    pub const ALL: [StateKind; 6] = [
        StateKind::Material,
        StateKind::Transform,
        StateKind::Lights,
        StateKind::Quality,
        StateKind::Collision,
        StateKind::Substitution,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn save_flag(self) -> SaveFlags {
        match self {
            StateKind::Material => SaveFlags::MATERIAL,
            StateKind::Transform => SaveFlags::TRANSFORM,
            StateKind::Lights => SaveFlags::LIGHTS,
            StateKind::Quality => SaveFlags::QUALITY,
            StateKind::Collision => SaveFlags::COLLISION,
            StateKind::Substitution => SaveFlags::SUBSTITUTION,
        }
    }
}

bitflags! {
    /// Kinds of state that must be copied before their next change
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SaveFlags: u8 {
        /// Material
        const MATERIAL = 1 << 0;
        /// Transform
        const TRANSFORM = 1 << 1;
        /// Lights
        const LIGHTS = 1 << 2;
        /// Quality
        const QUALITY = 1 << 3;
        /// Collision points
        const COLLISION = 1 << 4;
        /// Substitutions
        const SUBSTITUTION = 1 << 5;
    }
}

/// Slot selection on every stack plus pending save flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateFrame {
    indices: [usize; 6],
    save: SaveFlags,
}

impl StateFrame {
    /// Slot of `kind` selected by this frame
    pub fn index(&self, kind: StateKind) -> usize {
        self.indices[kind.index()]
    }

    /// Pending save flags
    pub fn save_flags(&self) -> SaveFlags {
        self.save
    }

    /// Frame for a preserve-state child list
    pub fn child(&self) -> Self {
        Self {
            indices: self.indices,
            save: SaveFlags::all(),
        }
    }
}

/// Object-to-world transform with its object-to-camera cache
#[derive(Debug, Clone, PartialEq)]
pub struct TransformState {
    /// Object to world
    pub world: Transform,
    /// Object to camera, computed on first use after each change
    pub camera_local: Option<Transform>,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            world: Transform::identity(),
            camera_local: None,
        }
    }
}

impl TransformState {
    /// Append `local` to the object-to-world transform
    pub fn apply(&mut self, local: &Transform) {
        self.world = self.world.compose(local);
        self.camera_local = None;
    }

    /// Object-to-camera transform for the given world-to-camera transform
    pub fn to_camera(&mut self, world_to_camera: &Transform) -> &Transform {
        let world = &self.world;
        self.camera_local
            .get_or_insert_with(|| world_to_camera.compose(world))
    }
}

/// Heights of every stack, restored when a scope ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackMarks([usize; 6]);

/// The six render-state stacks
#[derive(Debug, Clone)]
pub struct RenderStacks {
    /// Material stack
    pub material: StateStack<MaterialState>,
    /// Transform stack
    pub transform: StateStack<TransformState>,
    /// Lights stack
    pub lights: StateStack<LightsState>,
    /// Quality stack
    pub quality: StateStack<QualityFlags>,
    /// Collision-point stack
    pub collision: StateStack<CollisionState>,
    /// Substitution stack
    pub substitution: StateStack<SubstitutionTable>,
}

impl RenderStacks {
    /// Stacks sized and seeded from the configuration
    pub fn new(config: &EngineConfig) -> Self {
        let stacks = &config.stacks;
        Self {
            material: StateStack::new("material", stacks.material, MaterialState::default()),
            transform: StateStack::new("transform", stacks.transform, TransformState::default()),
            lights: StateStack::new(
                "lights",
                stacks.lights,
                LightsState::new(config.lighting.max_lights, config.lighting.max_shadow_slots),
            ),
            quality: StateStack::new("quality", stacks.quality, QualityFlags::default()),
            collision: StateStack::new(
                "collision",
                stacks.collision,
                CollisionState::new(config.traversal.max_points),
            ),
            substitution: StateStack::new(
                "substitution",
                stacks.substitution,
                SubstitutionTable::new(config.traversal.max_substitutions),
            ),
        }
    }

    /// Frame of the outermost list
    pub fn root_frame(&self) -> StateFrame {
        StateFrame {
            indices: [0; 6],
            save: SaveFlags::all(),
        }
    }

    /// Make the frame's slot of `kind` safe to change.
    ///
    /// When the save flag is set the slot is copied to the top of its stack
    /// first. A full stack is recorded and the current slot is kept.
    pub fn preserve(&mut self, frame: &mut StateFrame, kind: StateKind, errors: &mut FirstError) {
        let flag = kind.save_flag();
        if !frame.save.contains(flag) {
            return;
        }
        frame.save.remove(flag);
        let from = frame.index(kind);
        let pushed = match kind {
            StateKind::Material => self.material.push_copy(from),
            StateKind::Transform => self.transform.push_copy(from),
            StateKind::Lights => self.lights.push_copy(from),
            StateKind::Quality => self.quality.push_copy(from),
            StateKind::Collision => self.collision.push_copy(from),
            StateKind::Substitution => self.substitution.push_copy(from),
        };
        match pushed {
            Ok(index) => frame.indices[kind.index()] = index,
            Err(error) => errors.record(error),
        }
    }

    /// Current stack heights
    pub fn mark(&self) -> StackMarks {
        StackMarks([
            self.material.mark(),
            self.transform.mark(),
            self.lights.mark(),
            self.quality.mark(),
            self.collision.mark(),
            self.substitution.mark(),
        ])
    }

    /// Give back every slot pushed since `marks`
    pub fn release(&mut self, marks: StackMarks) {
        let [material, transform, lights, quality, collision, substitution] = marks.0;
        self.material.release(material);
        self.transform.release(transform);
        self.lights.release(lights);
        self.quality.release(quality);
        self.collision.release(collision);
        self.substitution.release(substitution);
    }

    /// Current material
    pub fn material(&self, frame: &StateFrame) -> &MaterialState {
        self.material.get(frame.index(StateKind::Material))
    }

    /// Current material, preserved for change
    pub fn material_mut(&mut self, frame: &mut StateFrame, errors: &mut FirstError) -> &mut MaterialState {
        self.preserve(frame, StateKind::Material, errors);
        self.material.get_mut(frame.index(StateKind::Material))
    }

    /// Current transform
    pub fn transform(&self, frame: &StateFrame) -> &TransformState {
        self.transform.get(frame.index(StateKind::Transform))
    }

    /// Current transform, preserved for change
    pub fn transform_mut(&mut self, frame: &mut StateFrame, errors: &mut FirstError) -> &mut TransformState {
        self.preserve(frame, StateKind::Transform, errors);
        self.transform.get_mut(frame.index(StateKind::Transform))
    }

    /// Current transform for filling its camera cache, without preserving
    pub fn transform_cache(&mut self, frame: &StateFrame) -> &mut TransformState {
        self.transform.cache_mut(frame.index(StateKind::Transform))
    }

    /// Current lights
    pub fn lights(&self, frame: &StateFrame) -> &LightsState {
        self.lights.get(frame.index(StateKind::Lights))
    }

    /// Current lights, preserved for change
    pub fn lights_mut(&mut self, frame: &mut StateFrame, errors: &mut FirstError) -> &mut LightsState {
        self.preserve(frame, StateKind::Lights, errors);
        self.lights.get_mut(frame.index(StateKind::Lights))
    }

    /// Current quality flags
    pub fn quality(&self, frame: &StateFrame) -> QualityFlags {
        *self.quality.get(frame.index(StateKind::Quality))
    }

    /// Current quality flags, preserved for change
    pub fn quality_mut(&mut self, frame: &mut StateFrame, errors: &mut FirstError) -> &mut QualityFlags {
        self.preserve(frame, StateKind::Quality, errors);
        self.quality.get_mut(frame.index(StateKind::Quality))
    }

    /// Current collision points
    pub fn collision(&self, frame: &StateFrame) -> &CollisionState {
        self.collision.get(frame.index(StateKind::Collision))
    }

    /// Current collision points, preserved for change
    pub fn collision_mut(&mut self, frame: &mut StateFrame, errors: &mut FirstError) -> &mut CollisionState {
        self.preserve(frame, StateKind::Collision, errors);
        self.collision.get_mut(frame.index(StateKind::Collision))
    }

    /// Current substitutions
    pub fn substitution(&self, frame: &StateFrame) -> &SubstitutionTable {
        self.substitution.get(frame.index(StateKind::Substitution))
    }

    /// Current substitutions, preserved for change
    pub fn substitution_mut(
        &mut self,
        frame: &mut StateFrame,
        errors: &mut FirstError,
    ) -> &mut SubstitutionTable {
        self.preserve(frame, StateKind::Substitution, errors);
        self.substitution.get_mut(frame.index(StateKind::Substitution))
    }

    /// Write stamps of the transform and lights selected by the frame
    pub fn light_space_stamp(&self, frame: &StateFrame) -> (u64, u64) {
        (
            self.transform.stamp(frame.index(StateKind::Transform)),
            self.lights.stamp(frame.index(StateKind::Lights)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SceneError;
    use crate::foundation::math::{Color, Vec3};
    use crate::state::material::MaterialNode;

    #[test]
    fn test_preserve_twice_copies_once() {
        let mut stacks = RenderStacks::new(&EngineConfig::default());
        let mut errors = FirstError::default();
        let mut frame = stacks.root_frame();

        stacks.preserve(&mut frame, StateKind::Material, &mut errors);
        let after_first = stacks.material.len();
        stacks.preserve(&mut frame, StateKind::Material, &mut errors);
        assert_eq!(stacks.material.len(), after_first);
        assert_eq!(frame.index(StateKind::Material), 1);
        assert!(!frame.save_flags().contains(SaveFlags::MATERIAL));
        assert!(frame.save_flags().contains(SaveFlags::LIGHTS));
    }

    #[test]
    fn test_child_scope_changes_do_not_leak() {
        let mut stacks = RenderStacks::new(&EngineConfig::default());
        let mut errors = FirstError::default();
        let mut parent = stacks.root_frame();
        stacks
            .material_mut(&mut parent, &mut errors)
            .merge(&MaterialNode::diffuse(Color::new(0.2, 0.2, 0.2)));

        let marks = stacks.mark();
        let mut child = parent.child();
        stacks
            .material_mut(&mut child, &mut errors)
            .merge(&MaterialNode::diffuse(Color::new(1.0, 0.0, 0.0)));
        stacks
            .transform_mut(&mut child, &mut errors)
            .apply(&Transform::translation(Vec3::x()));
        assert_eq!(stacks.material(&child).diffuse, Color::new(1.0, 0.0, 0.0));
        stacks.release(marks);

        assert_eq!(stacks.material(&parent).diffuse, Color::new(0.2, 0.2, 0.2));
        assert_eq!(stacks.transform(&parent).world, Transform::identity());
        assert_eq!(stacks.material.len(), 2);
        assert_eq!(stacks.transform.len(), 1);
        assert!(errors.first().is_none());
    }

    #[test]
    fn test_full_stack_records_overflow_and_continues() {
        let mut config = EngineConfig::default();
        config.stacks.quality = 2;
        let mut stacks = RenderStacks::new(&config);
        let mut errors = FirstError::default();
        let mut frame = stacks.root_frame();
        stacks.preserve(&mut frame, StateKind::Quality, &mut errors);

        let mut child = frame.child();
        stacks.preserve(&mut child, StateKind::Quality, &mut errors);
        assert_eq!(child.index(StateKind::Quality), frame.index(StateKind::Quality));
        assert_eq!(errors.first(), Some(&SceneError::StackOverflow { stack: "quality" }));
        assert!(!child.save_flags().contains(SaveFlags::QUALITY));
    }

    #[test]
    fn test_camera_cache_cleared_by_apply() {
        let mut state = TransformState::default();
        let view = Transform::translation(Vec3::new(0.0, 0.0, -5.0));
        assert!(state.to_camera(&view).forward().translation.z < 0.0);
        assert!(state.camera_local.is_some());
        state.apply(&Transform::translation(Vec3::x()));
        assert!(state.camera_local.is_none());
    }

    #[test]
    fn test_camera_cache_keeps_light_space_stamp() {
        let mut stacks = RenderStacks::new(&EngineConfig::default());
        let mut errors = FirstError::default();
        let mut frame = stacks.root_frame();
        stacks
            .transform_mut(&mut frame, &mut errors)
            .apply(&Transform::translation(Vec3::x()));
        let stamp = stacks.light_space_stamp(&frame);

        let view = Transform::translation(Vec3::new(0.0, 0.0, -5.0));
        stacks.transform_cache(&frame).to_camera(&view);
        assert!(stacks.transform(&frame).camera_local.is_some());
        assert_eq!(stacks.light_space_stamp(&frame), stamp);

        stacks
            .transform_mut(&mut frame, &mut errors)
            .apply(&Transform::translation(Vec3::y()));
        assert_ne!(stacks.light_space_stamp(&frame), stamp);
    }
}
