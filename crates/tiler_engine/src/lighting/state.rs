//! Lights state
//!
//! Lights are kept in one array split into three contiguous partitions:
//!
//! ```text
//! [ on-parallel | on-point | off ]
//! ```
//!
//! Every operation moves entries across partition boundaries by swapping with
//! the boundary element, so the partitions stay contiguous without compacting
//! the array. Shading walks the first two partitions directly.

use super::light::{LightEntry, LightKind, LightSwitch};
use super::MAX_SHADOW_SLOTS;
use crate::error::{Result, SceneError};
use crate::foundation::math::{constants::SQRT_3, Color, Point3, Vec3};
use crate::scene::Name;

/// Summed light of one shadow slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotColor {
    /// Summed color, rescaled into unit range
    pub color: Color,
    /// Summed strength (color vector length, or intensity·√3 for grey lights)
    pub weight: f32,
}

impl Default for SlotColor {
    fn default() -> Self {
        Self {
            color: Color::zeros(),
            weight: 0.0,
        }
    }
}

/// Lights in effect for the current subtree
#[derive(Debug, Clone, PartialEq)]
pub struct LightsState {
    entries: Vec<LightEntry>,
    capacity: usize,
    on_parallel: usize,
    on_point: usize,
    ambient: Color,
    all_grey: bool,
    has_shadows: bool,
    multi_shadow: bool,
    multi_slot: u8,
    slots_used: u8,
    max_slots: u8,
}

impl LightsState {
    /// Empty state holding at most `capacity` lights and `max_slots` shadow slots
    pub fn new(capacity: usize, max_slots: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
            on_parallel: 0,
            on_point: 0,
            ambient: Color::zeros(),
            all_grey: true,
            has_shadows: false,
            multi_shadow: false,
            multi_slot: 0,
            slots_used: 0,
            max_slots: max_slots.min(MAX_SHADOW_SLOTS) as u8,
        }
    }

    /// Add a world-space light to its partition
    pub fn add(&mut self, entry: LightEntry) -> Result<()> {
        match entry.kind {
            LightKind::Parallel => self.add_parallel(entry),
            LightKind::Point => self.add_point(entry),
            LightKind::Ambient => {
                if entry.on {
                    self.add_ambient(entry.color);
                }
                Ok(())
            }
        }
    }

    /// Add a parallel light: on lights go to the end of the on-parallel
    /// partition, off lights to the tail
    pub fn add_parallel(&mut self, entry: LightEntry) -> Result<()> {
        self.insert(entry, LightKind::Parallel)
    }

    /// Add a point light: on lights go to the end of the on-point partition,
    /// off lights to the tail
    pub fn add_point(&mut self, entry: LightEntry) -> Result<()> {
        self.insert(entry, LightKind::Point)
    }

    fn insert(&mut self, mut entry: LightEntry, kind: LightKind) -> Result<()> {
        if self.entries.len() >= self.capacity {
            return Err(SceneError::ResourceExhausted("light slot"));
        }
        self.entries
            .try_reserve(1)
            .map_err(|_| SceneError::ResourceExhausted("light slot"))?;
        entry.kind = kind;
        entry.shadow_slot = 0;
        entry.multi_shadow = entry.on && self.multi_shadow;
        let on = entry.on;
        self.entries.push(entry);
        let tail = self.entries.len() - 1;
        if on {
            // The new entry is off-partition until moved across the boundary
            self.entries[tail].on = false;
            let index = self.move_to_on(tail);
            if self.entries[index].shadow {
                self.assign_shadow_slot(index);
            }
        }
        self.refresh_grey();
        Ok(())
    }

    /// Move an off entry into its on partition; returns its new index
    pub fn move_to_on(&mut self, index: usize) -> usize {
        let first_off = self.on_parallel + self.on_point;
        if index < first_off {
            return index;
        }
        self.entries.swap(index, first_off);
        self.entries[first_off].on = true;
        match self.entries[first_off].kind {
            LightKind::Parallel => {
                // Rotate the first point light to the end of the point partition
                self.entries.swap(first_off, self.on_parallel);
                self.on_parallel += 1;
                self.on_parallel - 1
            }
            LightKind::Point | LightKind::Ambient => {
                self.on_point += 1;
                first_off
            }
        }
    }

    /// Move an on entry into the off partition; returns its new index
    pub fn move_to_off(&mut self, index: usize) -> usize {
        let first_off = self.on_parallel + self.on_point;
        if index >= first_off {
            return index;
        }
        let last_on = first_off - 1;
        if index < self.on_parallel {
            let last_parallel = self.on_parallel - 1;
            self.entries.swap(index, last_parallel);
            self.entries.swap(last_parallel, last_on);
            self.on_parallel -= 1;
        } else {
            self.entries.swap(index, last_on);
            self.on_point -= 1;
        }
        let entry = &mut self.entries[last_on];
        entry.on = false;
        entry.shadow_slot = 0;
        last_on
    }

    /// Apply a switch to every light with this name; false when none matched
    pub fn switch(&mut self, name: Name, switch: LightSwitch) -> bool {
        let mut found = false;
        for entry in self.entries.iter_mut().filter(|entry| entry.name == name) {
            found = true;
            if let Some(shadow) = switch.shadow {
                entry.shadow = shadow;
            }
        }
        // Each move crosses one boundary, so repeat until no entry needs one
        if let Some(on) = switch.on {
            while let Some(index) = self
                .entries
                .iter()
                .position(|entry| entry.name == name && entry.on != on)
            {
                if on {
                    self.entries[index].multi_shadow = self.multi_shadow;
                    self.move_to_on(index);
                } else {
                    self.move_to_off(index);
                }
            }
        }
        if found {
            self.refresh_grey();
            self.rescan_shadows();
        }
        found
    }

    /// Reposition every light with this name; false when none matched
    pub fn set_position(&mut self, name: Name, position: Point3, direction: Vec3) -> bool {
        let mut found = false;
        for entry in self.entries.iter_mut().filter(|entry| entry.name == name) {
            entry.position = position;
            entry.direction = super::light::normalize_or_zero(direction);
            found = true;
        }
        found
    }

    /// Enter or leave multi-shadow mode
    pub fn set_multi_shadow(&mut self, enabled: bool) {
        self.multi_shadow = enabled;
    }

    /// True while lights being enabled share one shadow slot
    pub fn is_multi_shadow(&self) -> bool {
        self.multi_shadow
    }

    /// Give a shadow-casting on light a slot.
    ///
    /// A light gets a fresh slot unless it was enabled in multi mode, in which
    /// case it shares the one multi slot. Past the limit the light is demoted
    /// to not casting shadows.
    pub fn assign_shadow_slot(&mut self, index: usize) -> u8 {
        let multi = self.entries[index].multi_shadow;
        let slot = if multi && self.multi_slot != 0 {
            self.multi_slot
        } else if self.slots_used < self.max_slots {
            self.slots_used += 1;
            if multi {
                self.multi_slot = self.slots_used;
            }
            self.slots_used
        } else {
            log::debug!(
                "No shadow slot left for light {}, rendering it without shadows",
                self.entries[index].name
            );
            0
        };
        self.entries[index].shadow_slot = slot;
        self.has_shadows |= slot != 0;
        slot
    }

    /// Reassign every shadow slot from the on lights
    pub fn rescan_shadows(&mut self) {
        self.slots_used = 0;
        self.multi_slot = 0;
        self.has_shadows = false;
        for entry in &mut self.entries {
            entry.shadow_slot = 0;
        }
        for index in 0..self.on_count() {
            if self.entries[index].shadow {
                self.assign_shadow_slot(index);
            }
        }
    }

    fn refresh_grey(&mut self) {
        let ambient_grey = self.ambient.x == self.ambient.y && self.ambient.y == self.ambient.z;
        self.all_grey = ambient_grey && self.on_lights().iter().all(|entry| entry.grey);
    }

    /// Per-slot summed light, used to precompute smooth shading.
    ///
    /// Index 0 holds the non-shadowed lights. A slot whose summed color leaves
    /// unit range is scaled back into it.
    pub fn average_color(&self) -> [SlotColor; MAX_SHADOW_SLOTS + 1] {
        let mut slots = [SlotColor::default(); MAX_SHADOW_SLOTS + 1];
        for entry in self.on_lights() {
            let slot = &mut slots[usize::from(entry.shadow_slot)];
            slot.color += entry.color;
            slot.weight += if entry.grey {
                entry.intensity().abs() * SQRT_3
            } else {
                entry.color.norm()
            };
        }
        for slot in &mut slots {
            let peak = slot.color.max();
            if peak > 1.0 {
                slot.color /= peak;
            }
        }
        slots
    }

    /// Add to the ambient light
    pub fn add_ambient(&mut self, color: Color) {
        self.ambient += color;
        self.refresh_grey();
    }

    /// Summed ambient light
    pub fn ambient(&self) -> Color {
        self.ambient
    }

    /// On parallel lights
    pub fn parallel_lights(&self) -> &[LightEntry] {
        &self.entries[..self.on_parallel]
    }

    /// On point lights
    pub fn point_lights(&self) -> &[LightEntry] {
        &self.entries[self.on_parallel..self.on_count()]
    }

    /// Every on light
    pub fn on_lights(&self) -> &[LightEntry] {
        &self.entries[..self.on_count()]
    }

    /// Every off light
    pub fn off_lights(&self) -> &[LightEntry] {
        &self.entries[self.on_count()..]
    }

    /// Every light
    pub fn entries(&self) -> &[LightEntry] {
        &self.entries
    }

    fn on_count(&self) -> usize {
        self.on_parallel + self.on_point
    }

    /// Number of on parallel lights
    pub fn on_parallel_count(&self) -> usize {
        self.on_parallel
    }

    /// Number of on point lights
    pub fn on_point_count(&self) -> usize {
        self.on_point
    }

    /// Number of off lights
    pub fn off_count(&self) -> usize {
        self.entries.len() - self.on_count()
    }

    /// Number of lights
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no lights
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when every on light and the ambient light are grey
    pub fn is_all_grey(&self) -> bool {
        self.all_grey
    }

    /// True when some on light owns a shadow slot
    pub fn has_shadows(&self) -> bool {
        self.has_shadows
    }

    /// Highest shadow slot in use
    pub fn slots_used(&self) -> usize {
        usize::from(self.slots_used)
    }

    /// Check that every partition holds only what it should
    pub fn is_consistent(&self) -> bool {
        let on = self.on_count();
        on <= self.entries.len()
            && self.entries[..self.on_parallel]
                .iter()
                .all(|entry| entry.on && entry.kind == LightKind::Parallel)
            && self.entries[self.on_parallel..on]
                .iter()
                .all(|entry| entry.on && entry.kind == LightKind::Point)
            && self.entries[on..].iter().all(|entry| !entry.on && entry.shadow_slot == 0)
    }
}
