//! Link-time uniform tables for the three programs of a frame.
//!
//! Every location is resolved once, right after linking, and indexed
//! positionally afterwards: light `i` of a list always binds to array slot
//! `i`. The tables are only valid for the program they were resolved from.

use gl::types::GLuint;
use glam::{Mat4, Vec3};

use crate::components::lighting::{use_light, Light};
use crate::components::material::MaterialSlots;
use crate::config::{
    DIFFUSE_TEXTURE_UNIT, DIRECTIONAL_SHADOW_UNIT, MAX_OMNI_SHADOWS, MAX_POINT_LIGHTS, MAX_SPOT_LIGHTS,
    OMNI_SHADOW_UNIT_BASE,
};
use crate::renderer::gpu::{Gpu, UniformLocation};

#[derive(Clone, Copy, Debug)]
pub struct BaseLightSlots {
    pub color: UniformLocation,
    pub ambient_intensity: UniformLocation,
    pub diffuse_intensity: UniformLocation,
}

impl BaseLightSlots {
    fn resolve(gpu: &mut impl Gpu, program: GLuint, prefix: &str) -> Self {
        Self {
            color: gpu.uniform_location(program, &format!("{prefix}.color")),
            ambient_intensity: gpu.uniform_location(program, &format!("{prefix}.ambientIntensity")),
            diffuse_intensity: gpu.uniform_location(program, &format!("{prefix}.diffuseIntensity")),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct DirectionalSlots {
    pub base: BaseLightSlots,
    pub direction: UniformLocation,
}

#[derive(Clone, Copy, Debug)]
pub struct PointSlots {
    pub base: BaseLightSlots,
    pub position: UniformLocation,
    pub constant: UniformLocation,
    pub linear: UniformLocation,
    pub exponent: UniformLocation,
}

impl PointSlots {
    fn resolve(gpu: &mut impl Gpu, program: GLuint, prefix: &str) -> Self {
        Self {
            base: BaseLightSlots::resolve(gpu, program, &format!("{prefix}.base")),
            position: gpu.uniform_location(program, &format!("{prefix}.position")),
            constant: gpu.uniform_location(program, &format!("{prefix}.constant")),
            linear: gpu.uniform_location(program, &format!("{prefix}.linear")),
            exponent: gpu.uniform_location(program, &format!("{prefix}.exponent")),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SpotSlots {
    pub point: PointSlots,
    pub direction: UniformLocation,
    pub edge: UniformLocation,
}

/// Sampler and parameters of one entry in the omni shadow array.
#[derive(Clone, Copy, Debug)]
pub struct OmniShadowSlots {
    pub shadow_map: UniformLocation,
    pub far_plane: UniformLocation,
    pub enabled: UniformLocation,
}

/// Per-kind uniform block handed to [`use_light`].
#[derive(Clone, Copy, Debug)]
pub enum LightSlots<'a> {
    Directional(&'a DirectionalSlots),
    Point(&'a PointSlots),
    Spot(&'a SpotSlots),
}

impl LightSlots<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            LightSlots::Directional(_) => "directional",
            LightSlots::Point(_) => "point",
            LightSlots::Spot(_) => "spot",
        }
    }

    pub fn base(&self) -> &BaseLightSlots {
        match self {
            LightSlots::Directional(s) => &s.base,
            LightSlots::Point(s) => &s.base,
            LightSlots::Spot(s) => &s.point.base,
        }
    }
}

/// Slots a geometry callback needs: the model matrix always, material only
/// in the lit pass.
#[derive(Clone, Copy, Debug)]
pub struct GeometrySlots {
    pub model: UniformLocation,
    pub material: Option<MaterialSlots>,
}

/// Uniforms of the lit (color) program.
pub struct LightingUniforms {
    program: GLuint,
    pub model: UniformLocation,
    pub projection: UniformLocation,
    pub view: UniformLocation,
    pub eye_position: UniformLocation,
    pub material: MaterialSlots,
    pub diffuse_texture: UniformLocation,
    pub directional: DirectionalSlots,
    pub directional_transform: UniformLocation,
    pub directional_shadow_map: UniformLocation,
    pub directional_shadow_enabled: UniformLocation,
    pub point_count: UniformLocation,
    pub points: [PointSlots; MAX_POINT_LIGHTS],
    pub spot_count: UniformLocation,
    pub spots: [SpotSlots; MAX_SPOT_LIGHTS],
    pub omni_shadows: [OmniShadowSlots; MAX_OMNI_SHADOWS],
}

impl LightingUniforms {
    pub fn resolve(gpu: &mut impl Gpu, program: GLuint) -> Self {
        let mut loc = |name: &str| gpu.uniform_location(program, name);
        let model = loc("model");
        let projection = loc("projection");
        let view = loc("view");
        let eye_position = loc("eyePosition");
        let material = MaterialSlots {
            specular_intensity: loc("material.specularIntensity"),
            shininess: loc("material.shininess"),
        };
        let diffuse_texture = loc("theTexture");
        let directional_transform = loc("directionalLightTransform");
        let directional_shadow_map = loc("directionalShadowMap");
        let directional_shadow_enabled = loc("directionalShadowEnabled");
        let point_count = loc("pointLightCount");
        let spot_count = loc("spotLightCount");

        let directional = DirectionalSlots {
            base: BaseLightSlots::resolve(gpu, program, "directionalLight.base"),
            direction: gpu.uniform_location(program, "directionalLight.direction"),
        };
        let points = std::array::from_fn(|i| PointSlots::resolve(gpu, program, &format!("pointLights[{i}]")));
        let spots = std::array::from_fn(|i| SpotSlots {
            point: PointSlots::resolve(gpu, program, &format!("spotLights[{i}].base")),
            direction: gpu.uniform_location(program, &format!("spotLights[{i}].direction")),
            edge: gpu.uniform_location(program, &format!("spotLights[{i}].edge")),
        });
        let omni_shadows = std::array::from_fn(|i| OmniShadowSlots {
            shadow_map: gpu.uniform_location(program, &format!("omniShadowMaps[{i}].shadowMap")),
            far_plane: gpu.uniform_location(program, &format!("omniShadowMaps[{i}].farPlane")),
            enabled: gpu.uniform_location(program, &format!("omniShadowMaps[{i}].enabled")),
        });

        Self {
            program,
            model,
            projection,
            view,
            eye_position,
            material,
            diffuse_texture,
            directional,
            directional_transform,
            directional_shadow_map,
            directional_shadow_enabled,
            point_count,
            points,
            spot_count,
            spots,
            omni_shadows,
        }
    }

    pub fn program(&self) -> GLuint {
        self.program
    }

    /// Give every sampler its own unit so 2-D and cube samplers never share
    /// one, whether or not a map is bound to it this frame.
    pub fn assign_sampler_units(&self, gpu: &mut impl Gpu) {
        gpu.set_int(self.diffuse_texture, DIFFUSE_TEXTURE_UNIT as i32);
        gpu.set_int(self.directional_shadow_map, DIRECTIONAL_SHADOW_UNIT as i32);
        for (i, slot) in self.omni_shadows.iter().enumerate() {
            gpu.set_int(slot.shadow_map, (OMNI_SHADOW_UNIT_BASE as usize + i) as i32);
            gpu.set_int(slot.enabled, 0);
        }
    }

    pub fn set_camera(&self, gpu: &mut impl Gpu, projection: &Mat4, view: &Mat4, eye: Vec3) {
        gpu.set_mat4(self.projection, projection);
        gpu.set_mat4(self.view, view);
        gpu.set_vec3(self.eye_position, eye);
    }

    pub fn set_directional_light(&self, gpu: &mut impl Gpu, light: &Light) {
        use_light(gpu, light, LightSlots::Directional(&self.directional));
    }

    pub fn set_directional_light_transform(&self, gpu: &mut impl Gpu, transform: &Mat4) {
        gpu.set_mat4(self.directional_transform, transform);
    }

    /// Bind the directional shadow map on `unit`, or flag it absent.
    pub fn set_directional_shadow_map(&self, gpu: &mut impl Gpu, light: &Light, unit: u32) {
        match light.shadow_map() {
            Some(map) => {
                map.read(gpu, unit);
                gpu.set_int(self.directional_shadow_map, unit as i32);
                gpu.set_int(self.directional_shadow_enabled, 1);
            }
            None => gpu.set_int(self.directional_shadow_enabled, 0),
        }
    }

    /// Write up to [`MAX_POINT_LIGHTS`] point lights. Returns the clamped
    /// count actually written.
    pub fn set_point_lights(
        &self,
        gpu: &mut impl Gpu,
        lights: &[Light],
        texture_unit_base: u32,
        index_offset: usize,
    ) -> usize {
        let count = lights.len().min(MAX_POINT_LIGHTS);
        gpu.set_int(self.point_count, count as i32);
        for (i, light) in lights.iter().take(count).enumerate() {
            use_light(gpu, light, LightSlots::Point(&self.points[i]));
            self.bind_omni_shadow(gpu, light, texture_unit_base + i as u32, i + index_offset);
        }
        count
    }

    /// Write up to [`MAX_SPOT_LIGHTS`] spot lights. Their omni shadow slots
    /// start at `index_offset`, after the point lights.
    pub fn set_spot_lights(
        &self,
        gpu: &mut impl Gpu,
        lights: &[Light],
        texture_unit_base: u32,
        index_offset: usize,
    ) -> usize {
        let count = lights.len().min(MAX_SPOT_LIGHTS);
        gpu.set_int(self.spot_count, count as i32);
        for (i, light) in lights.iter().take(count).enumerate() {
            use_light(gpu, light, LightSlots::Spot(&self.spots[i]));
            self.bind_omni_shadow(gpu, light, texture_unit_base + i as u32, i + index_offset);
        }
        count
    }

    fn bind_omni_shadow(&self, gpu: &mut impl Gpu, light: &Light, unit: u32, slot: usize) {
        let Some(slots) = self.omni_shadows.get(slot) else {
            log::error!("omni shadow slot {slot} out of range");
            return;
        };
        let far_plane = light.point_params().map_or(0.0, |p| p.far_plane);
        gpu.set_int(slots.shadow_map, unit as i32);
        gpu.set_float(slots.far_plane, far_plane);
        match light.shadow_map() {
            Some(map) => {
                map.read(gpu, unit);
                gpu.set_int(slots.enabled, 1);
            }
            None => gpu.set_int(slots.enabled, 0),
        }
    }
}

/// Uniforms of the directional depth-only program.
pub struct DirectionalShadowUniforms {
    program: GLuint,
    pub model: UniformLocation,
    pub light_transform: UniformLocation,
}

impl DirectionalShadowUniforms {
    pub fn resolve(gpu: &mut impl Gpu, program: GLuint) -> Self {
        Self {
            program,
            model: gpu.uniform_location(program, "model"),
            light_transform: gpu.uniform_location(program, "directionalLightTransform"),
        }
    }

    pub fn program(&self) -> GLuint {
        self.program
    }

    pub fn set_directional_light_transform(&self, gpu: &mut impl Gpu, transform: &Mat4) {
        gpu.set_mat4(self.light_transform, transform);
    }
}

/// Uniforms of the omnidirectional (cube map) depth-only program.
pub struct OmniShadowUniforms {
    program: GLuint,
    pub model: UniformLocation,
    pub light_position: UniformLocation,
    pub far_plane: UniformLocation,
    pub light_matrices: [UniformLocation; 6],
}

impl OmniShadowUniforms {
    pub fn resolve(gpu: &mut impl Gpu, program: GLuint) -> Self {
        Self {
            program,
            model: gpu.uniform_location(program, "model"),
            light_position: gpu.uniform_location(program, "lightPos"),
            far_plane: gpu.uniform_location(program, "farPlane"),
            light_matrices: std::array::from_fn(|i| gpu.uniform_location(program, &format!("lightMatrices[{i}]"))),
        }
    }

    pub fn program(&self) -> GLuint {
        self.program
    }

    pub fn set_light(&self, gpu: &mut impl Gpu, position: Vec3, far_plane: f32) {
        gpu.set_vec3(self.light_position, position);
        gpu.set_float(self.far_plane, far_plane);
    }

    pub fn set_omni_light_matrices(&self, gpu: &mut impl Gpu, matrices: &[Mat4; 6]) {
        for (loc, m) in self.light_matrices.iter().zip(matrices) {
            gpu.set_mat4(*loc, m);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::lighting::{Attenuation, LightBase};
    use crate::renderer::gpu::recording::{RecordingGpu, UniformValue};

    fn points(n: usize) -> Vec<Light> {
        (0..n)
            .map(|i| {
                Light::point(
                    LightBase::new(Vec3::X, 0.1, 0.5),
                    Vec3::new(i as f32, 0.0, 0.0),
                    Attenuation::new(0.5, 0.2, 0.1),
                    0.01,
                    100.0,
                )
            })
            .collect()
    }

    fn spots(n: usize) -> Vec<Light> {
        (0..n)
            .map(|i| {
                Light::spot(
                    LightBase::new(Vec3::ONE, 0.0, 1.0),
                    Vec3::new(0.0, i as f32, 0.0),
                    Vec3::NEG_Y,
                    Attenuation::default(),
                    30.0,
                    0.01,
                    100.0,
                )
            })
            .collect()
    }

    fn block_writes(gpu: &RecordingGpu, field: &str, prefix: &str, max: usize) -> usize {
        (0..max + 4)
            .filter(|i| !gpu.writes_to(&format!("{prefix}[{i}]{field}")).is_empty())
            .count()
    }

    #[test]
    fn test_point_lights_clamp_to_max() {
        let mut gpu = RecordingGpu::new();
        let uniforms = LightingUniforms::resolve(&mut gpu, 3);

        let written = uniforms.set_point_lights(&mut gpu, &points(MAX_POINT_LIGHTS + 2), OMNI_SHADOW_UNIT_BASE, 0);

        assert_eq!(written, MAX_POINT_LIGHTS);
        assert_eq!(
            gpu.writes_to("pointLightCount"),
            vec![UniformValue::Int(MAX_POINT_LIGHTS as i32)]
        );
        assert_eq!(block_writes(&gpu, ".position", "pointLights", MAX_POINT_LIGHTS), MAX_POINT_LIGHTS);
    }

    #[test]
    fn test_fewer_lights_than_max_write_exact_count() {
        let mut gpu = RecordingGpu::new();
        let uniforms = LightingUniforms::resolve(&mut gpu, 3);

        uniforms.set_point_lights(&mut gpu, &points(2), OMNI_SHADOW_UNIT_BASE, 0);

        assert_eq!(gpu.writes_to("pointLightCount"), vec![UniformValue::Int(2)]);
        assert_eq!(block_writes(&gpu, ".position", "pointLights", MAX_POINT_LIGHTS), 2);
        assert_eq!(
            gpu.last_write("pointLights[1].position"),
            Some(UniformValue::Vec3(Vec3::new(1.0, 0.0, 0.0)))
        );
    }

    #[test]
    fn test_spot_lights_use_offset_shadow_slots() {
        let mut gpu = RecordingGpu::new();
        let uniforms = LightingUniforms::resolve(&mut gpu, 3);

        let written = uniforms.set_spot_lights(&mut gpu, &spots(MAX_SPOT_LIGHTS + 1), OMNI_SHADOW_UNIT_BASE + 2, 2);

        assert_eq!(written, MAX_SPOT_LIGHTS);
        assert_eq!(
            gpu.writes_to("spotLightCount"),
            vec![UniformValue::Int(MAX_SPOT_LIGHTS as i32)]
        );
        assert_eq!(block_writes(&gpu, ".direction", "spotLights", MAX_SPOT_LIGHTS), MAX_SPOT_LIGHTS);
        // Spot 0 after two point lights samples omni slot 2 on unit base + 2
        assert_eq!(
            gpu.last_write("omniShadowMaps[2].shadowMap"),
            Some(UniformValue::Int((OMNI_SHADOW_UNIT_BASE + 2) as i32))
        );
        assert!(gpu.writes_to("omniShadowMaps[0].shadowMap").is_empty());
        assert_eq!(
            gpu.last_write("spotLights[0].edge"),
            Some(UniformValue::Float(30f32.to_radians().cos()))
        );
    }

    #[test]
    fn test_light_without_shadow_is_flagged_disabled() {
        let mut gpu = RecordingGpu::new();
        let uniforms = LightingUniforms::resolve(&mut gpu, 3);

        uniforms.set_point_lights(&mut gpu, &points(1), OMNI_SHADOW_UNIT_BASE, 0);

        assert_eq!(gpu.last_write("omniShadowMaps[0].enabled"), Some(UniformValue::Int(0)));
        assert_eq!(gpu.last_write("omniShadowMaps[0].farPlane"), Some(UniformValue::Float(100.0)));
    }

    #[test]
    fn test_sampler_units_are_distinct() {
        let mut gpu = RecordingGpu::new();
        let uniforms = LightingUniforms::resolve(&mut gpu, 3);
        uniforms.assign_sampler_units(&mut gpu);

        let mut units = vec![
            gpu.last_write("theTexture"),
            gpu.last_write("directionalShadowMap"),
        ];
        for i in 0..MAX_OMNI_SHADOWS {
            units.push(gpu.last_write(&format!("omniShadowMaps[{i}].shadowMap")));
        }
        let mut ints: Vec<i32> = units
            .into_iter()
            .map(|u| match u {
                Some(UniformValue::Int(v)) => v,
                other => panic!("expected int sampler unit, got {other:?}"),
            })
            .collect();
        ints.sort_unstable();
        ints.dedup();
        assert_eq!(ints.len(), MAX_OMNI_SHADOWS + 2);
        assert!(!ints.contains(&0), "unit 0 belongs to the skybox");
    }

    #[test]
    fn test_omni_matrices_upload_in_face_order() {
        let mut gpu = RecordingGpu::new();
        let uniforms = OmniShadowUniforms::resolve(&mut gpu, 9);
        let mats: [Mat4; 6] = std::array::from_fn(|i| Mat4::from_translation(Vec3::splat(i as f32)));

        uniforms.set_omni_light_matrices(&mut gpu, &mats);

        for (i, m) in mats.iter().enumerate() {
            assert_eq!(gpu.last_write(&format!("lightMatrices[{i}]")), Some(UniformValue::Mat4(*m)));
        }
    }
}
