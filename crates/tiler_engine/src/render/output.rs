//! Output boundary towards the tiler
//!
//! Traversal hands finished primitives to a [`RenderSink`]. The in-memory
//! [`PrimitiveQueue`] keeps them in submission order.

use crate::convex::TransformedPlane;
use crate::error::{Result, SceneError};
use crate::foundation::math::Color;
use crate::render::camera::TileRegion;
use crate::scene::Name;
use crate::shading::{ShadeResult, SmoothShading};
use crate::state::QualityFlags;

/// A shaded convex surface
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    /// Convex node name
    pub convex: Name,
    /// World-space planes
    pub planes: Vec<TransformedPlane>,
    /// Per-plane slot colors, parallel to `planes`
    pub colors: Vec<ShadeResult>,
    /// Tiles the surface may touch
    pub region: TileRegion,
    /// The surface may cross a frustum plane
    pub needs_clipping: bool,
    /// The object transform reflects, so vertex winding is reversed
    pub flip_winding: bool,
    /// 0 = opaque, 1 = fully transparent
    pub transparency: f32,
    /// Texture to apply
    pub texture: Option<Name>,
    /// Slot colors for per-pixel shading, when smooth shading is on
    pub smooth: Option<SmoothShading>,
    /// Quality flags in effect
    pub quality: QualityFlags,
}

impl Surface {
    /// Fully lit color of each plane
    pub fn lit_colors(&self) -> impl Iterator<Item = Color> + '_ {
        self.colors.iter().map(ShadeResult::lit)
    }
}

/// A closed volume in world space
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    /// Convex node name
    pub convex: Name,
    /// Bounding planes, outward normals
    pub planes: Vec<TransformedPlane>,
    /// Tiles the volume may touch
    pub region: TileRegion,
}

/// Everything the traversal emits
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Shaded surface
    Surface(Surface),
    /// Shadow volume for a shadow slot; slot 0 shadows every slot
    ShadowVolume {
        /// Shadow slot the volume darkens
        slot: u8,
        /// The volume
        volume: Volume,
    },
    /// Light volume
    LightVolume(Volume),
}

impl Primitive {
    /// Name of the convex the primitive came from
    pub fn convex(&self) -> Name {
        match self {
            Primitive::Surface(surface) => surface.convex,
            Primitive::ShadowVolume { volume, .. } | Primitive::LightVolume(volume) => volume.convex,
        }
    }
}

/// Consumer of traversal output
pub trait RenderSink {
    /// Called once before the first primitive of a frame
    fn begin_frame(&mut self) {}

    /// Take one primitive
    fn submit(&mut self, primitive: Primitive) -> Result<()>;

    /// Called once after the last primitive of a frame
    fn end_frame(&mut self) {}
}

/// In-memory primitive queue
#[derive(Debug, Clone, Default)]
pub struct PrimitiveQueue {
    primitives: Vec<Primitive>,
    capacity: Option<usize>,
    frames: usize,
}

impl PrimitiveQueue {
    /// Unbounded queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue refusing more than `capacity` primitives per frame
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    /// Queued primitives
    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// Queued surfaces
    pub fn surfaces(&self) -> impl Iterator<Item = &Surface> {
        self.primitives.iter().filter_map(|primitive| match primitive {
            Primitive::Surface(surface) => Some(surface),
            _ => None,
        })
    }

    /// Queued shadow volumes with their slots
    pub fn shadow_volumes(&self) -> impl Iterator<Item = (u8, &Volume)> {
        self.primitives.iter().filter_map(|primitive| match primitive {
            Primitive::ShadowVolume { slot, volume } => Some((*slot, volume)),
            _ => None,
        })
    }

    /// Number of queued primitives
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    /// True when nothing is queued
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Frames started on this queue
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Remove every queued primitive
    pub fn clear(&mut self) {
        self.primitives.clear();
    }
}

impl RenderSink for PrimitiveQueue {
    fn begin_frame(&mut self) {
        self.primitives.clear();
        self.frames += 1;
    }

    fn submit(&mut self, primitive: Primitive) -> Result<()> {
        if self.capacity.is_some_and(|capacity| self.primitives.len() >= capacity) {
            return Err(SceneError::ResourceExhausted("primitive queue entry"));
        }
        self.primitives
            .try_reserve(1)
            .map_err(|_| SceneError::ResourceExhausted("primitive queue entry"))?;
        log::trace!("Queued primitive from convex {}", primitive.convex());
        self.primitives.push(primitive);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volume(raw: u32) -> Volume {
        Volume {
            convex: Name::new(raw),
            planes: Vec::new(),
            region: TileRegion {
                x0: 0,
                y0: 0,
                x1: 0,
                y1: 0,
            },
        }
    }

    #[test]
    fn test_queue_capacity_and_frames() {
        let mut queue = PrimitiveQueue::with_capacity(1);
        queue.begin_frame();
        queue.submit(Primitive::LightVolume(volume(1))).unwrap();
        assert!(queue
            .submit(Primitive::ShadowVolume {
                slot: 1,
                volume: volume(2)
            })
            .is_err());
        assert_eq!(queue.len(), 1);

        queue.begin_frame();
        assert!(queue.is_empty());
        queue
            .submit(Primitive::ShadowVolume {
                slot: 3,
                volume: volume(2),
            })
            .unwrap();
        assert_eq!(queue.frames(), 2);
        let (slot, shadow) = queue.shadow_volumes().next().unwrap();
        assert_eq!((slot, shadow.convex), (3, Name::new(2)));
        assert_eq!(queue.surfaces().count(), 0);
    }
}
