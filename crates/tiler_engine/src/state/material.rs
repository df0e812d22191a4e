//! Material state and material nodes

use bitflags::bitflags;

use crate::foundation::math::Color;
use crate::scene::Name;

bitflags! {
    /// Per-material rendering switches
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MaterialFlags: u16 {
        /// Apply the material texture
        const TEXTURED = 1 << 0;
        /// Filter the texture when sampling
        const TEXTURE_FILTER = 1 << 1;
        /// Keep and shade back-facing planes
        const TWO_SIDED = 1 << 2;
        /// Blend using `transparency`
        const TRANSLUCENT = 1 << 3;
        /// Ignore lights; only glow is output
        const UNLIT = 1 << 4;
    }
}

/// Current material of the traversal
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialState {
    /// Diffuse reflectance (also scales ambient light)
    pub diffuse: Color,
    /// Specular reflectance
    pub specular: Color,
    /// Specular exponent; zero disables the specular term
    pub shininess: f32,
    /// Emitted color, added unlit
    pub glow: Color,
    /// 0 = opaque, 1 = fully transparent
    pub transparency: f32,
    /// Texture handle forwarded to the texture stage
    pub texture: Option<Name>,
    /// Rendering switches
    pub flags: MaterialFlags,
}

impl Default for MaterialState {
    fn default() -> Self {
        Self {
            diffuse: Color::new(1.0, 1.0, 1.0),
            specular: Color::zeros(),
            shininess: 0.0,
            glow: Color::zeros(),
            transparency: 0.0,
            texture: None,
            flags: MaterialFlags::empty(),
        }
    }
}

impl MaterialState {
    /// True when every color of the material is grey
    pub fn is_achromatic(&self) -> bool {
        [self.diffuse, self.specular, self.glow]
            .iter()
            .all(|c| c.x == c.y && c.y == c.z)
    }

    /// Merge a material node into this state.
    ///
    /// Present fields overwrite; flags are OR-ed with `set` then AND-NOT-ed with `clear`.
    pub fn merge(&mut self, node: &MaterialNode) {
        if let Some(diffuse) = node.diffuse {
            self.diffuse = diffuse;
        }
        if let Some(specular) = node.specular {
            self.specular = specular;
        }
        if let Some(shininess) = node.shininess {
            self.shininess = shininess.max(0.0);
        }
        if let Some(glow) = node.glow {
            self.glow = glow;
        }
        if let Some(transparency) = node.transparency {
            self.transparency = transparency.clamp(0.0, 1.0);
        }
        if let Some(texture) = node.texture {
            self.texture = Some(texture);
        }
        self.flags = (self.flags | node.set_flags) & !node.clear_flags;
    }

    /// This state with a node merged on top
    pub fn merged(&self, node: &MaterialNode) -> Self {
        let mut merged = self.clone();
        merged.merge(node);
        merged
    }
}

/// Material change carried by a material node or a convex override
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaterialNode {
    /// New diffuse reflectance
    pub diffuse: Option<Color>,
    /// New specular reflectance
    pub specular: Option<Color>,
    /// New specular exponent
    pub shininess: Option<f32>,
    /// New glow
    pub glow: Option<Color>,
    /// New transparency
    pub transparency: Option<f32>,
    /// New texture handle
    pub texture: Option<Name>,
    /// Flags to turn on
    pub set_flags: MaterialFlags,
    /// Flags to turn off
    pub clear_flags: MaterialFlags,
}

impl MaterialNode {
    /// Node that only sets the diffuse color
    pub fn diffuse(color: Color) -> Self {
        Self {
            diffuse: Some(color),
            ..Self::default()
        }
    }

    /// Add a specular term
    pub fn with_specular(mut self, color: Color, shininess: f32) -> Self {
        self.specular = Some(color);
        self.shininess = Some(shininess);
        self
    }

    /// Add a glow term
    pub fn with_glow(mut self, color: Color) -> Self {
        self.glow = Some(color);
        self
    }

    /// Turn flags on and off
    pub fn with_flags(mut self, set: MaterialFlags, clear: MaterialFlags) -> Self {
        self.set_flags = set;
        self.clear_flags = clear;
        self
    }
}
