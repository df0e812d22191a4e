//! Inheritable render state
//!
//! Material, transform, lights, quality, collision points and instance
//! substitutions each live on their own fixed-capacity stack; a
//! [`StateFrame`] selects the current slot of every stack.

pub mod collision;
pub mod frame;
pub mod material;
pub mod quality;
pub mod stack;
pub mod substitution;

pub use collision::{ActivePoint, CollisionHit, CollisionState};
pub use frame::{RenderStacks, SaveFlags, StackMarks, StateFrame, StateKind, TransformState};
pub use material::{MaterialFlags, MaterialNode, MaterialState};
pub use quality::{QualityFlags, QualityNode};
pub use stack::StateStack;
pub use substitution::SubstitutionTable;
