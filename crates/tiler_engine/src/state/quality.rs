//! Render-quality flags

use bitflags::bitflags;

bitflags! {
    /// Render-quality switches inherited down the display list
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct QualityFlags: u32 {
        /// Generate shadow volumes for shadow-casting lights
        const SHADOWS = 1 << 0;
        /// Attach smooth-shading data to surfaces
        const SMOOTH_SHADING = 1 << 1;
        /// Forward material textures
        const TEXTURES = 1 << 2;
        /// Test active points against convex primitives
        const COLLISION = 1 << 3;
        /// A point stops being tested after its first hit
        const COLLIDE_FIRST_ONLY = 1 << 4;
        /// Fog the emitted surfaces
        const FOG = 1 << 5;
        /// Filter textures
        const TEXTURE_FILTER = 1 << 6;
        /// Dither the output
        const DITHER = 1 << 7;
    }
}

impl Default for QualityFlags {
    fn default() -> Self {
        Self::SHADOWS | Self::TEXTURES | Self::COLLISION | Self::TEXTURE_FILTER | Self::DITHER
    }
}

/// Quality change carried by a quality node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityNode {
    /// Flags to turn on
    pub set: QualityFlags,
    /// Flags to turn off
    pub clear: QualityFlags,
}

impl Default for QualityNode {
    fn default() -> Self {
        Self {
            set: QualityFlags::empty(),
            clear: QualityFlags::empty(),
        }
    }
}

impl QualityNode {
    /// Build from raw masks; unknown bits are dropped
    pub fn from_bits(set: u32, clear: u32) -> Self {
        Self {
            set: QualityFlags::from_bits_truncate(set),
            clear: QualityFlags::from_bits_truncate(clear),
        }
    }

    /// Quality after this node
    pub fn apply(&self, current: QualityFlags) -> QualityFlags {
        (current | self.set) & !self.clear
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_bits_are_clamped() {
        let node = QualityNode::from_bits(0xFFFF_0000 | QualityFlags::FOG.bits(), 0);
        assert_eq!(node.set, QualityFlags::FOG);
    }

    #[test]
    fn test_apply_sets_then_clears() {
        let node = QualityNode {
            set: QualityFlags::FOG | QualityFlags::SHADOWS,
            clear: QualityFlags::SHADOWS | QualityFlags::DITHER,
        };
        let result = node.apply(QualityFlags::DITHER | QualityFlags::TEXTURES);
        assert_eq!(result, QualityFlags::FOG | QualityFlags::TEXTURES);
    }

    #[test]
    fn test_default_node_changes_nothing() {
        let current = QualityFlags::default();
        assert_eq!(QualityNode::default().apply(current), current);
    }
}
