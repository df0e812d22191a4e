//! Light nodes and light entries

use crate::foundation::math::{utils, Color, Point3, Vec3};
use crate::scene::Name;

/// Light types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightKind {
    /// Non-directional light added to every surface
    Ambient,
    /// Directional light (like sunlight)
    Parallel,
    /// Positional light, optionally a spot
    Point,
}

/// Light definition carried by a light node, in the node's local space
#[derive(Debug, Clone, PartialEq)]
pub struct LightNode {
    /// Light type
    pub kind: LightKind,
    /// Light color (for grey lights every channel holds the intensity)
    pub color: Color,
    /// Achromatic light
    pub grey: bool,
    /// Direction the light travels (parallel) or spot axis (point)
    pub direction: Vec3,
    /// Position (point lights)
    pub position: Point3,
    /// Spot concentration; zero for an omnidirectional point light
    pub concentration: f32,
    /// Initially on
    pub on: bool,
    /// Casts shadows
    pub shadow: bool,
}

impl LightNode {
    /// Ambient light
    pub fn ambient(color: Color) -> Self {
        Self {
            kind: LightKind::Ambient,
            color,
            grey: color.x == color.y && color.y == color.z,
            direction: Vec3::zeros(),
            position: Point3::origin(),
            concentration: 0.0,
            on: true,
            shadow: false,
        }
    }

    /// Directional light
    pub fn parallel(direction: Vec3, color: Color) -> Self {
        Self {
            kind: LightKind::Parallel,
            direction,
            ..Self::ambient(color)
        }
    }

    /// Omnidirectional point light
    pub fn point(position: Point3, color: Color) -> Self {
        Self {
            kind: LightKind::Point,
            position,
            ..Self::ambient(color)
        }
    }

    /// Turn the light into an achromatic light of this intensity
    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.color = utils::grey(intensity);
        self.grey = true;
        self
    }

    /// Make a point light a spot along `axis`
    pub fn with_spot(mut self, axis: Vec3, concentration: f32) -> Self {
        self.direction = axis;
        self.concentration = concentration.max(0.0);
        self
    }

    /// Make the light cast shadows
    pub fn with_shadow(mut self) -> Self {
        self.shadow = true;
        self
    }

    /// Start switched off
    pub fn switched_off(mut self) -> Self {
        self.on = false;
        self
    }
}

/// Requested change of a light-switch node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LightSwitch {
    /// New on/off state
    pub on: Option<bool>,
    /// New shadow-casting state
    pub shadow: Option<bool>,
}

impl LightSwitch {
    /// Switch on
    pub fn on() -> Self {
        Self {
            on: Some(true),
            shadow: None,
        }
    }

    /// Switch off
    pub fn off() -> Self {
        Self {
            on: Some(false),
            shadow: None,
        }
    }

    /// Also change shadow casting
    pub fn with_shadow(mut self, shadow: bool) -> Self {
        self.shadow = Some(shadow);
        self
    }
}

/// A light in a lights state, in world space
#[derive(Debug, Clone, PartialEq)]
pub struct LightEntry {
    /// Light node name
    pub name: Name,
    /// Parallel or point
    pub kind: LightKind,
    /// Color
    pub color: Color,
    /// Achromatic
    pub grey: bool,
    /// Unit direction of travel (parallel) or unit spot axis (point)
    pub direction: Vec3,
    /// World position (point)
    pub position: Point3,
    /// Spot concentration
    pub concentration: f32,
    /// Switched on
    pub on: bool,
    /// Shadow casting requested
    pub shadow: bool,
    /// Enabled while multi-shadow mode was active
    pub multi_shadow: bool,
    /// Assigned shadow slot, 0 for none
    pub shadow_slot: u8,
}

impl LightEntry {
    /// World-space entry for a light node
    pub fn new(name: Name, node: &LightNode, direction: Vec3, position: Point3) -> Self {
        Self {
            name,
            kind: node.kind,
            color: node.color,
            grey: node.grey,
            direction: normalize_or_zero(direction),
            position,
            concentration: node.concentration,
            on: node.on,
            shadow: node.shadow,
            multi_shadow: false,
            shadow_slot: 0,
        }
    }

    /// Scalar intensity of a grey light
    pub fn intensity(&self) -> f32 {
        self.color.x
    }

    /// Unit vector from `point` towards the light, and the spot falloff there
    pub fn incidence(&self, point: &Point3) -> (Vec3, f32) {
        match self.kind {
            LightKind::Point => {
                let to_light = normalize_or_zero(self.position - point);
                let spot = if self.concentration > 0.0 {
                    utils::approx_pow((-to_light).dot(&self.direction).max(0.0), self.concentration)
                } else {
                    1.0
                };
                (to_light, spot)
            }
            LightKind::Parallel | LightKind::Ambient => (-self.direction, 1.0),
        }
    }
}

/// Unit vector, or zero for a zero-length input
pub fn normalize_or_zero(v: Vec3) -> Vec3 {
    v.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::zeros)
}
