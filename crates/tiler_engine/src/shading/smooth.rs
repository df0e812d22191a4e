//! Smooth-shading precomputation
//!
//! Smooth-shaded surfaces are lit per pixel by the tiler from one color and
//! one strength per shadow slot. Those are derived once per lights state.

use crate::foundation::math::Color;
use crate::lighting::{LightsState, MAX_SHADOW_SLOTS};

/// Per-slot light color and strength for smooth shading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothShading {
    /// Normalised light color of each slot (brightest channel is 1, or black)
    pub colors: [Color; MAX_SHADOW_SLOTS + 1],
    /// Summed light strength of each slot
    pub weights: [f32; MAX_SHADOW_SLOTS + 1],
    /// Ambient light, unchanged
    pub ambient: Color,
}

impl SmoothShading {
    /// Derive the slot colors from the on lights
    pub fn precompute(lights: &LightsState) -> Self {
        let averages = lights.average_color();
        let mut colors = [Color::zeros(); MAX_SHADOW_SLOTS + 1];
        let mut weights = [0.0; MAX_SHADOW_SLOTS + 1];
        for (slot, average) in averages.iter().enumerate() {
            let peak = average.color.max();
            if peak > 0.0 {
                colors[slot] = average.color / peak;
            }
            weights[slot] = average.weight;
        }
        Self {
            colors,
            weights,
            ambient: lights.ambient(),
        }
    }

    /// True when no light contributes
    pub fn is_dark(&self) -> bool {
        self.weights.iter().all(|weight| *weight == 0.0)
    }
}
