//! Flat shading of transformed planes
//!
//! Each plane gets one color per shadow slot. Slot 0 collects ambient, glow
//! and the lights that cast no shadow; a shadow-casting light adds into the
//! slot it was assigned so the tiler can drop it where the slot is shadowed.

use crate::convex::{Facing, TransformedPlane};
use crate::error::{Result, SceneError};
use crate::foundation::math::{utils, Color, Point3, Vec3};
use crate::lighting::{LightEntry, LightsState, MAX_SHADOW_SLOTS};
use crate::math::ScaleKind;
use crate::state::{MaterialFlags, MaterialNode, MaterialState};

/// Everything shading needs besides the planes and the material
#[derive(Debug, Clone, Copy)]
pub struct ShadeInput<'a> {
    /// Lights in effect
    pub lights: &'a LightsState,
    /// Scale class of the transform that produced the planes
    pub scale_kind: ScaleKind,
    /// Normal rescale factor of that transform
    pub rescale: f32,
    /// Back faces are kept and shaded from behind
    pub reversed: bool,
    /// Eye position in the planes' space
    pub eye: Point3,
    /// Diffuse and specular terms below this are skipped
    pub epsilon: f32,
}

/// Colors of one plane, per shadow slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadeResult {
    /// Slot 0 is unshadowed light, slot `n` the light of shadow slot `n`
    pub slots: [Color; MAX_SHADOW_SLOTS + 1],
}

impl Default for ShadeResult {
    fn default() -> Self {
        Self {
            slots: [Color::zeros(); MAX_SHADOW_SLOTS + 1],
        }
    }
}

impl ShadeResult {
    /// Color with every slot lit, clamped
    pub fn lit(&self) -> Color {
        utils::saturate(self.slots.iter().sum())
    }

    fn clamp(&mut self) {
        for slot in &mut self.slots {
            *slot = utils::saturate(*slot);
        }
    }
}

/// Shade every plane with the material (or its per-plane override)
pub fn flat_shade(
    input: &ShadeInput<'_>,
    planes: &[TransformedPlane],
    material: &MaterialState,
    overrides: &[MaterialNode],
) -> Result<Vec<ShadeResult>> {
    let mut results = Vec::new();
    results
        .try_reserve_exact(planes.len())
        .map_err(|_| SceneError::ResourceExhausted("shade result"))?;

    let grey = input.lights.is_all_grey();
    for plane in planes {
        let merged;
        let material = match plane.material.and_then(|index| overrides.get(usize::from(index))) {
            Some(node) => {
                merged = material.merged(node);
                &merged
            }
            None => material,
        };
        let normal = shading_normal(input, plane);
        let mut result = if material.flags.contains(MaterialFlags::UNLIT) {
            let mut unlit = ShadeResult::default();
            unlit.slots[0] = material.glow;
            unlit
        } else if grey {
            shade_grey(input, plane, &normal, material)
        } else {
            shade_color(input, plane, &normal, material)
        };
        result.clamp();
        results.push(result);
    }
    Ok(results)
}

fn shading_normal(input: &ShadeInput<'_>, plane: &TransformedPlane) -> Vec3 {
    let normal = match input.scale_kind {
        ScaleKind::None => plane.normal,
        ScaleKind::Uniform => plane.normal * input.rescale,
        ScaleKind::Arbitrary => plane.normal.try_normalize(f32::EPSILON).unwrap_or(plane.normal),
    };
    if input.reversed && plane.facing == Facing::Back {
        -normal
    } else {
        normal
    }
}

/// Diffuse and specular factors of one light, already epsilon-gated
fn light_terms(
    input: &ShadeInput<'_>,
    light: &LightEntry,
    plane: &TransformedPlane,
    normal: &Vec3,
    shininess: f32,
) -> (f32, f32) {
    let (to_light, spot) = light.incidence(&plane.point);
    let cosine = normal.dot(&to_light) * spot;
    if cosine <= input.epsilon {
        return (0.0, 0.0);
    }
    if shininess <= 0.0 {
        return (cosine, 0.0);
    }
    let reflected = normal * (2.0 * normal.dot(&to_light)) - to_light;
    let to_eye = (input.eye - plane.point).try_normalize(f32::EPSILON).unwrap_or(*normal);
    let alignment = reflected.dot(&to_eye);
    let specular = if alignment > input.epsilon {
        utils::approx_pow(alignment.min(1.0), shininess) * spot
    } else {
        0.0
    };
    (cosine, if specular > input.epsilon { specular } else { 0.0 })
}

fn shade_color(
    input: &ShadeInput<'_>,
    plane: &TransformedPlane,
    normal: &Vec3,
    material: &MaterialState,
) -> ShadeResult {
    let mut result = ShadeResult::default();
    result.slots[0] = input.lights.ambient().component_mul(&material.diffuse) + material.glow;
    for light in input.lights.on_lights() {
        let (diffuse, specular) = light_terms(input, light, plane, normal, material.shininess);
        let slot = &mut result.slots[usize::from(light.shadow_slot)];
        if diffuse > 0.0 {
            *slot += material.diffuse.component_mul(&light.color) * diffuse;
        }
        if specular > 0.0 {
            *slot += material.specular.component_mul(&light.color) * specular;
        }
    }
    result
}

/// Same result as [`shade_color`] for achromatic lights, summing scalar
/// intensities per slot before touching the material colors
fn shade_grey(
    input: &ShadeInput<'_>,
    plane: &TransformedPlane,
    normal: &Vec3,
    material: &MaterialState,
) -> ShadeResult {
    let mut diffuse_sum = [0.0_f32; MAX_SHADOW_SLOTS + 1];
    let mut specular_sum = [0.0_f32; MAX_SHADOW_SLOTS + 1];
    for light in input.lights.on_lights() {
        let (diffuse, specular) = light_terms(input, light, plane, normal, material.shininess);
        let slot = usize::from(light.shadow_slot);
        diffuse_sum[slot] += light.intensity() * diffuse;
        specular_sum[slot] += light.intensity() * specular;
    }

    let mut result = ShadeResult::default();
    for (slot, color) in result.slots.iter_mut().enumerate() {
        *color = material.diffuse * diffuse_sum[slot] + material.specular * specular_sum[slot];
    }
    result.slots[0] += material.diffuse * input.lights.ambient().x + material.glow;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convex::{transform_planes, Plane};
    use crate::lighting::LightNode;
    use crate::math::Transform;
    use crate::scene::Name;
    use approx::assert_relative_eq;

    fn lights(nodes: &[LightNode]) -> LightsState {
        let mut state = LightsState::new(8, MAX_SHADOW_SLOTS);
        for (index, node) in nodes.iter().enumerate() {
            let entry = LightEntry::new(Name::new(index as u32 + 1), node, node.direction, node.position);
            state.add(entry).unwrap();
        }
        state
    }

    fn input(lights: &LightsState) -> ShadeInput<'_> {
        ShadeInput {
            lights,
            scale_kind: ScaleKind::None,
            rescale: 1.0,
            reversed: false,
            eye: Point3::new(0.0, 10.0, 10.0),
            epsilon: 1e-3,
        }
    }

    fn plane(normal: Vec3) -> Vec<TransformedPlane> {
        transform_planes(&[Plane::new(normal, Point3::origin())], &Transform::identity(), &Point3::new(0.0, 10.0, 10.0))
            .unwrap()
    }

    fn grey_material(diffuse: f32) -> MaterialState {
        MaterialState {
            diffuse: utils::grey(diffuse),
            ..MaterialState::default()
        }
    }

    #[test]
    fn test_single_grey_light_scenario() {
        let state = lights(&[
            LightNode::ambient(utils::grey(0.1)),
            LightNode::parallel(-Vec3::y(), utils::grey(0.5)),
        ]);
        let theta = 60.0_f32.to_radians();
        let planes = plane(Vec3::new(theta.sin(), theta.cos(), 0.0));
        let results = flat_shade(&input(&state), &planes, &grey_material(0.5), &[]).unwrap();

        let expected = 0.1 * 0.5 + 0.5 * 0.5 * theta.cos();
        assert_relative_eq!(results[0].slots[0], utils::grey(expected), epsilon = 1e-5);
    }

    #[test]
    fn test_grey_fast_path_matches_color_path() {
        let state = lights(&[
            LightNode::ambient(utils::grey(0.2)),
            LightNode::parallel(Vec3::new(-1.0, -1.0, 0.0), utils::grey(0.4)),
            LightNode::point(Point3::new(0.0, 3.0, 2.0), utils::grey(0.7)).with_spot(-Vec3::y(), 2.0),
        ]);
        assert!(state.is_all_grey());
        let material = MaterialState {
            diffuse: Color::new(0.9, 0.4, 0.1),
            specular: Color::new(0.5, 0.5, 0.2),
            shininess: 8.0,
            glow: Color::new(0.05, 0.0, 0.0),
            ..MaterialState::default()
        };
        let planes = plane(Vec3::new(0.3, 1.0, 0.2).normalize());
        let normal = planes[0].normal;
        let fast = shade_grey(&input(&state), &planes[0], &normal, &material);
        let full = shade_color(&input(&state), &planes[0], &normal, &material);
        for (a, b) in fast.slots.iter().zip(&full.slots) {
            assert_relative_eq!(*a, *b, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_shadow_light_goes_to_its_slot() {
        let state = lights(&[LightNode::parallel(-Vec3::y(), utils::grey(0.5)).with_shadow()]);
        let results = flat_shade(&input(&state), &plane(Vec3::y()), &grey_material(1.0), &[]).unwrap();
        assert_eq!(results[0].slots[0], Color::zeros());
        assert_relative_eq!(results[0].slots[1], utils::grey(0.5));
        assert_relative_eq!(results[0].lit(), utils::grey(0.5));
    }

    #[test]
    fn test_back_face_lit_only_when_reversed() {
        let state = lights(&[LightNode::parallel(Vec3::y(), utils::grey(1.0))]);
        // Normal +y seen from below is a back face lit from below
        let planes = transform_planes(
            &[Plane::new(Vec3::y(), Point3::origin())],
            &Transform::identity(),
            &Point3::new(0.0, -5.0, 0.0),
        )
        .unwrap();
        let mut shade = input(&state);
        shade.eye = Point3::new(0.0, -5.0, 0.0);
        let front = flat_shade(&shade, &planes, &grey_material(1.0), &[]).unwrap();
        assert_eq!(front[0].lit(), Color::zeros());

        shade.reversed = true;
        let back = flat_shade(&shade, &planes, &grey_material(1.0), &[]).unwrap();
        assert_relative_eq!(back[0].lit(), utils::grey(1.0));
    }

    #[test]
    fn test_override_and_clamp() {
        let state = lights(&[
            LightNode::parallel(-Vec3::y(), Color::new(2.0, 0.0, 0.0)),
            LightNode::ambient(utils::grey(0.5)),
        ]);
        let mut planes = plane(Vec3::y());
        planes[0].material = Some(0);
        let overrides = [MaterialNode::diffuse(Color::new(1.0, 1.0, 0.0))];
        let results = flat_shade(&input(&state), &planes, &MaterialState::default(), &overrides).unwrap();
        assert_relative_eq!(results[0].slots[0], Color::new(1.0, 0.5, 0.0));
    }

    #[test]
    fn test_uniform_scale_normal_is_rescaled() {
        let state = lights(&[LightNode::parallel(-Vec3::y(), utils::grey(1.0))]);
        let scale = Transform::scaling(Vec3::new(2.0, 2.0, 2.0)).unwrap();
        let planes = transform_planes(&[Plane::new(Vec3::y(), Point3::origin())], &scale, &Point3::new(0.0, 5.0, 0.0))
            .unwrap();
        let mut shade = input(&state);
        shade.scale_kind = scale.scale_kind();
        shade.rescale = scale.rescale();
        let results = flat_shade(&shade, &planes, &grey_material(0.5), &[]).unwrap();
        assert_relative_eq!(results[0].slots[0], utils::grey(0.5));
    }

    #[test]
    fn test_arbitrary_scale_normal_is_renormalised() {
        let state = lights(&[LightNode::parallel(-Vec3::y(), utils::grey(1.0))]);
        let stretch = Transform::scaling(Vec3::new(1.0, 4.0, 1.0)).unwrap();
        assert_eq!(stretch.scale_kind(), ScaleKind::Arbitrary);
        let tilted = Plane::new(Vec3::new(1.0, 1.0, 0.0).normalize(), Point3::origin());
        let planes = transform_planes(&[tilted], &stretch, &Point3::new(0.0, 5.0, 0.0)).unwrap();
        // The inverse transpose leaves the normal short
        assert!(planes[0].normal.norm() < 0.9);

        let mut shade = input(&state);
        shade.scale_kind = stretch.scale_kind();
        shade.rescale = stretch.rescale();
        let results = flat_shade(&shade, &planes, &grey_material(1.0), &[]).unwrap();
        // World normal is (4, 1, 0) / sqrt(17)
        assert_relative_eq!(results[0].slots[0], utils::grey(1.0 / 17.0_f32.sqrt()), epsilon = 1e-5);
    }
}
