use glam::{Mat4, Vec3};

use crate::renderer::gpu::{Gpu, TextureTarget};
use crate::renderer::shadow_map::ShadowMap;
use crate::renderer::uniforms::{BaseLightSlots, LightSlots};

/// Color and intensities shared by every light kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightBase {
    pub color: Vec3,
    /// Conventionally in [0, 1]; not enforced.
    pub ambient_intensity: f32,
    pub diffuse_intensity: f32,
}

impl LightBase {
    pub fn new(color: Vec3, ambient_intensity: f32, diffuse_intensity: f32) -> Self {
        Self {
            color,
            ambient_intensity,
            diffuse_intensity,
        }
    }
}

/// Distance falloff: `1 / (exponent * d^2 + linear * d + constant)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub exponent: f32,
}

impl Attenuation {
    pub fn new(constant: f32, linear: f32, exponent: f32) -> Self {
        Self {
            constant,
            linear,
            exponent,
        }
    }
}

impl Default for Attenuation {
    fn default() -> Self {
        // constant 1 keeps the divisor non-zero
        Self::new(1.0, 0.0, 0.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DirectionalParams {
    pub direction: Vec3,
    pub projection: Mat4,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PointParams {
    pub position: Vec3,
    pub attenuation: Attenuation,
    pub near_plane: f32,
    pub far_plane: f32,
    pub projection: Mat4,
}

impl PointParams {
    fn new(position: Vec3, attenuation: Attenuation, near_plane: f32, far_plane: f32) -> Self {
        Self {
            position,
            attenuation,
            near_plane,
            far_plane,
            // Cube faces are square
            projection: Mat4::perspective_rh_gl(90f32.to_radians(), 1.0, near_plane, far_plane),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpotParams {
    pub point: PointParams,
    direction: Vec3,
    edge: f32,
    processed_edge: f32,
    enabled: bool,
}

impl SpotParams {
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Cone half-angle in degrees.
    pub fn edge(&self) -> f32 {
        self.edge
    }

    /// `cos(radians(edge))`, what the fragment shader compares against.
    pub fn processed_edge(&self) -> f32 {
        self.processed_edge
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LightKind {
    Directional(DirectionalParams),
    Point(PointParams),
    Spot(SpotParams),
}

impl LightKind {
    pub fn name(&self) -> &'static str {
        match self {
            LightKind::Directional(_) => "directional",
            LightKind::Point(_) => "point",
            LightKind::Spot(_) => "spot",
        }
    }
}

/// Light-space transform(s) used by the depth passes.
#[derive(Clone, Debug, PartialEq)]
pub enum LightSpace {
    Single(Mat4),
    /// One view-projection per cube face in GL face order.
    Cube([Mat4; 6]),
}

/// Cube face axes and up vectors in `GL_TEXTURE_CUBE_MAP_POSITIVE_X + i`
/// order. Looking along ±Y needs a Z up vector or `look_at` degenerates.
pub const CUBE_FACES: [(Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::NEG_Y),
    (Vec3::NEG_X, Vec3::NEG_Y),
    (Vec3::Y, Vec3::Z),
    (Vec3::NEG_Y, Vec3::NEG_Z),
    (Vec3::Z, Vec3::NEG_Y),
    (Vec3::NEG_Z, Vec3::NEG_Y),
];

/// Default directional shadow frustum: half-extent, near, far.
pub const DEFAULT_ORTHO_EXTENT: f32 = 20.0;
pub const DEFAULT_ORTHO_NEAR: f32 = 0.1;
pub const DEFAULT_ORTHO_FAR: f32 = 100.0;

/// A scene light of any kind, optionally owning a shadow map.
#[derive(Debug)]
pub struct Light {
    pub base: LightBase,
    pub kind: LightKind,
    shadow: Option<ShadowMap>,
}

impl Light {
    #[cfg(test)]
    pub fn directional(base: LightBase, direction: Vec3) -> Self {
        Self::directional_with_extent(base, direction, DEFAULT_ORTHO_EXTENT, DEFAULT_ORTHO_NEAR, DEFAULT_ORTHO_FAR)
    }

    pub fn directional_with_extent(base: LightBase, direction: Vec3, extent: f32, near: f32, far: f32) -> Self {
        Self {
            base,
            kind: LightKind::Directional(DirectionalParams {
                direction,
                projection: Mat4::orthographic_rh_gl(-extent, extent, -extent, extent, near, far),
            }),
            shadow: None,
        }
    }

    pub fn point(base: LightBase, position: Vec3, attenuation: Attenuation, near_plane: f32, far_plane: f32) -> Self {
        Self {
            base,
            kind: LightKind::Point(PointParams::new(position, attenuation, near_plane, far_plane)),
            shadow: None,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn spot(
        base: LightBase,
        position: Vec3,
        direction: Vec3,
        attenuation: Attenuation,
        edge: f32,
        near_plane: f32,
        far_plane: f32,
    ) -> Self {
        Self {
            base,
            kind: LightKind::Spot(SpotParams {
                point: PointParams::new(position, attenuation, near_plane, far_plane),
                direction: direction.normalize(),
                edge,
                processed_edge: edge.to_radians().cos(),
                enabled: true,
            }),
            shadow: None,
        }
    }

    /// Give this light a shadow map of the kind it needs. A map that fails to
    /// initialize leaves the light without shadows.
    pub fn with_shadow_map(mut self, gpu: &mut impl Gpu, width: u32, height: u32) -> Self {
        let target = match self.kind {
            LightKind::Directional(_) => TextureTarget::Flat,
            LightKind::Point(_) | LightKind::Spot(_) => TextureTarget::Cube,
        };
        match ShadowMap::new(gpu, target, width, height) {
            Ok(map) => self.shadow = Some(map),
            Err(e) => log::warn!("{} light casts no shadow: {e}", self.kind.name()),
        }
        self
    }

    pub fn shadow_map(&self) -> Option<&ShadowMap> {
        self.shadow.as_ref()
    }

    pub fn release(&mut self, gpu: &mut impl Gpu) {
        if let Some(map) = self.shadow.as_mut() {
            map.release(gpu);
        }
        self.shadow = None;
    }

    pub fn light_transform(&self) -> Option<Mat4> {
        match light_transforms(self) {
            LightSpace::Single(m) => Some(m),
            LightSpace::Cube(_) => None,
        }
    }

    pub fn cube_transforms(&self) -> Option<[Mat4; 6]> {
        match light_transforms(self) {
            LightSpace::Cube(m) => Some(m),
            LightSpace::Single(_) => None,
        }
    }

    /// Point and spot lights share a position; directional lights have none.
    pub fn point_params(&self) -> Option<&PointParams> {
        match &self.kind {
            LightKind::Point(p) => Some(p),
            LightKind::Spot(s) => Some(&s.point),
            LightKind::Directional(_) => None,
        }
    }

    pub fn spot_params(&self) -> Option<&SpotParams> {
        match &self.kind {
            LightKind::Spot(s) => Some(s),
            _ => None,
        }
    }

    /// Reposition a spot light (camera-attached flashlight). No-op on other kinds.
    pub fn set_flash(&mut self, position: Vec3, direction: Vec3) {
        if let LightKind::Spot(s) = &mut self.kind {
            s.point.position = position;
            s.direction = direction.normalize_or(s.direction);
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if let LightKind::Spot(s) = &mut self.kind {
            s.enabled = enabled;
        }
    }
}

fn write_base(gpu: &mut impl Gpu, base: &LightBase, slots: &BaseLightSlots, lit: bool) {
    gpu.set_vec3(slots.color, base.color);
    if lit {
        gpu.set_float(slots.ambient_intensity, base.ambient_intensity);
        gpu.set_float(slots.diffuse_intensity, base.diffuse_intensity);
    } else {
        gpu.set_float(slots.ambient_intensity, 0.0);
        gpu.set_float(slots.diffuse_intensity, 0.0);
    }
}

fn write_point(gpu: &mut impl Gpu, point: &PointParams, slots: &crate::renderer::uniforms::PointSlots) {
    gpu.set_vec3(slots.position, point.position);
    gpu.set_float(slots.constant, point.attenuation.constant);
    gpu.set_float(slots.linear, point.attenuation.linear);
    gpu.set_float(slots.exponent, point.attenuation.exponent);
}

/// Write `light` into the uniform block `slots`. The consuming program must
/// already be bound.
///
/// A disabled spot light still fills its block, with zero ambient and diffuse
/// intensity.
pub fn use_light(gpu: &mut impl Gpu, light: &Light, slots: LightSlots<'_>) {
    match (&light.kind, slots) {
        (LightKind::Directional(d), LightSlots::Directional(s)) => {
            write_base(gpu, &light.base, &s.base, true);
            gpu.set_vec3(s.direction, d.direction);
        }
        (LightKind::Point(p), LightSlots::Point(s)) => {
            write_base(gpu, &light.base, &s.base, true);
            write_point(gpu, p, s);
        }
        (LightKind::Spot(sp), LightSlots::Spot(s)) => {
            write_base(gpu, &light.base, &s.point.base, sp.enabled);
            write_point(gpu, &sp.point, &s.point);
            gpu.set_vec3(s.direction, sp.direction);
            gpu.set_float(s.edge, sp.processed_edge);
        }
        (kind, slots) => {
            log::error!("{} light bound to {} uniform slots", kind.name(), slots.name());
            write_base(gpu, &light.base, slots.base(), true);
        }
    }
}

/// Light-space transform(s) for the depth passes, computed on demand.
pub fn light_transforms(light: &Light) -> LightSpace {
    match &light.kind {
        LightKind::Directional(d) => {
            let eye = -d.direction;
            let up = if eye.normalize_or_zero().y.abs() > 0.999 { Vec3::Z } else { Vec3::Y };
            LightSpace::Single(d.projection * Mat4::look_at_rh(eye, Vec3::ZERO, up))
        }
        LightKind::Point(p) => LightSpace::Cube(cube_face_transforms(p)),
        LightKind::Spot(s) => LightSpace::Cube(cube_face_transforms(&s.point)),
    }
}

fn cube_face_transforms(point: &PointParams) -> [Mat4; 6] {
    CUBE_FACES.map(|(axis, up)| point.projection * Mat4::look_at_rh(point.position, point.position + axis, up))
}
