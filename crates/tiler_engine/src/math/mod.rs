//! Transform math shared by the display list and the traversal engine

pub mod affine;

pub use affine::{Affine, ScaleKind, Transform};
