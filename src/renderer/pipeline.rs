//! Per-frame pass sequence: directional shadow, omni shadows, lit pass.
//!
//! Each shadow pass finishes writing its map and rebinds the window
//! framebuffer before the lit pass samples it.

use glam::{Mat4, Vec3};

use crate::components::lighting::Light;
use crate::config::{DIRECTIONAL_SHADOW_UNIT, MAX_POINT_LIGHTS, MAX_SPOT_LIGHTS, OMNI_SHADOW_UNIT_BASE};
use crate::renderer::gpu::{ClearTarget, Gpu};
use crate::renderer::uniforms::{DirectionalShadowUniforms, GeometrySlots, LightingUniforms, OmniShadowUniforms};
use crate::scene::Scene;

/// Camera and window state for one frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameView {
    pub view: Mat4,
    pub projection: Mat4,
    pub eye: Vec3,
    pub width: u32,
    pub height: u32,
}

/// Draws the scene for whichever pass is active.
pub trait SceneGeometry<G: Gpu> {
    /// Draw every visible object, writing its model matrix to `slots.model`.
    /// `slots.material` is only set in the lit pass; bind diffuse textures and
    /// materials only then.
    fn draw_geometry(&mut self, gpu: &mut G, slots: &GeometrySlots);

    /// Runs right after the window framebuffer is cleared.
    fn draw_background(&mut self, _gpu: &mut G, _view: &Mat4, _projection: &Mat4) {}
}

pub struct FramePipeline {
    lighting: LightingUniforms,
    directional_shadow: DirectionalShadowUniforms,
    omni_shadow: OmniShadowUniforms,
}

impl FramePipeline {
    pub fn new(
        lighting: LightingUniforms,
        directional_shadow: DirectionalShadowUniforms,
        omni_shadow: OmniShadowUniforms,
    ) -> Self {
        Self {
            lighting,
            directional_shadow,
            omni_shadow,
        }
    }

    /// Bind the lit program with its sampler units assigned, for validation.
    pub fn prepare(&self, gpu: &mut impl Gpu) {
        gpu.use_program(self.lighting.program());
        self.lighting.assign_sampler_units(gpu);
    }

    pub fn render<G: Gpu>(&self, gpu: &mut G, scene: &Scene, frame: &FrameView, geometry: &mut impl SceneGeometry<G>) {
        self.directional_shadow_pass(gpu, &scene.directional, geometry);

        let points = scene.point_lights().iter().take(MAX_POINT_LIGHTS);
        let spots = scene.spot_lights().iter().take(MAX_SPOT_LIGHTS);
        for light in points.chain(spots) {
            self.omni_shadow_pass(gpu, light, geometry);
        }

        self.render_pass(gpu, scene, frame, geometry);
    }

    fn directional_shadow_pass<G: Gpu>(&self, gpu: &mut G, light: &Light, geometry: &mut impl SceneGeometry<G>) {
        let (Some(map), Some(transform)) = (light.shadow_map(), light.light_transform()) else {
            return;
        };

        map.write(gpu);
        gpu.viewport(map.width(), map.height());
        gpu.clear(ClearTarget::Depth);

        gpu.use_program(self.directional_shadow.program());
        self.directional_shadow.set_directional_light_transform(gpu, &transform);
        geometry.draw_geometry(
            gpu,
            &GeometrySlots {
                model: self.directional_shadow.model,
                material: None,
            },
        );

        gpu.bind_framebuffer(0);
    }

    fn omni_shadow_pass<G: Gpu>(&self, gpu: &mut G, light: &Light, geometry: &mut impl SceneGeometry<G>) {
        let (Some(map), Some(point), Some(matrices)) = (light.shadow_map(), light.point_params(), light.cube_transforms())
        else {
            return;
        };

        map.write(gpu);
        gpu.viewport(map.width(), map.height());
        gpu.clear(ClearTarget::Depth);

        gpu.use_program(self.omni_shadow.program());
        self.omni_shadow.set_light(gpu, point.position, point.far_plane);
        self.omni_shadow.set_omni_light_matrices(gpu, &matrices);
        geometry.draw_geometry(
            gpu,
            &GeometrySlots {
                model: self.omni_shadow.model,
                material: None,
            },
        );

        gpu.bind_framebuffer(0);
    }

    fn render_pass<G: Gpu>(&self, gpu: &mut G, scene: &Scene, frame: &FrameView, geometry: &mut impl SceneGeometry<G>) {
        gpu.bind_framebuffer(0);
        gpu.viewport(frame.width, frame.height);
        gpu.clear(ClearTarget::ColorDepth);

        geometry.draw_background(gpu, &frame.view, &frame.projection);

        let lighting = &self.lighting;
        gpu.use_program(lighting.program());
        lighting.assign_sampler_units(gpu);
        lighting.set_camera(gpu, &frame.projection, &frame.view, frame.eye);

        lighting.set_directional_light(gpu, &scene.directional);
        if let Some(transform) = scene.directional.light_transform() {
            lighting.set_directional_light_transform(gpu, &transform);
        }
        lighting.set_directional_shadow_map(gpu, &scene.directional, DIRECTIONAL_SHADOW_UNIT);

        let points = lighting.set_point_lights(gpu, scene.point_lights(), OMNI_SHADOW_UNIT_BASE, 0);
        lighting.set_spot_lights(gpu, scene.spot_lights(), OMNI_SHADOW_UNIT_BASE + points as u32, points);

        geometry.draw_geometry(
            gpu,
            &GeometrySlots {
                model: lighting.model,
                material: Some(lighting.material),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::lighting::{Attenuation, LightBase};
    use crate::renderer::gpu::recording::{Call, RecordingGpu, UniformValue};
    use crate::renderer::gpu::TextureTarget;

    const LIT: u32 = 100;
    const DIRECTIONAL_DEPTH: u32 = 101;
    const OMNI_DEPTH: u32 = 102;

    struct Geometry;

    impl SceneGeometry<RecordingGpu> for Geometry {
        fn draw_geometry(&mut self, gpu: &mut RecordingGpu, slots: &GeometrySlots) {
            gpu.set_mat4(slots.model, &Mat4::IDENTITY);
            let label = if slots.material.is_some() { "lit" } else { "depth" };
            gpu.calls.push(Call::Draw(label));
        }

        fn draw_background(&mut self, gpu: &mut RecordingGpu, _view: &Mat4, _projection: &Mat4) {
            gpu.depth_mask(false);
            gpu.calls.push(Call::Draw("background"));
            gpu.depth_mask(true);
        }
    }

    fn pipeline(gpu: &mut RecordingGpu) -> FramePipeline {
        FramePipeline::new(
            LightingUniforms::resolve(gpu, LIT),
            DirectionalShadowUniforms::resolve(gpu, DIRECTIONAL_DEPTH),
            OmniShadowUniforms::resolve(gpu, OMNI_DEPTH),
        )
    }

    fn frame() -> FrameView {
        FrameView {
            view: Mat4::look_at_rh(Vec3::new(0.0, 2.0, 5.0), Vec3::ZERO, Vec3::Y),
            projection: Mat4::perspective_rh_gl(45f32.to_radians(), 800.0 / 600.0, 0.1, 100.0),
            eye: Vec3::new(0.0, 2.0, 5.0),
            width: 800,
            height: 600,
        }
    }

    fn sun(gpu: &mut RecordingGpu) -> Light {
        Light::directional(LightBase::new(Vec3::ONE, 0.1, 0.5), Vec3::new(0.0, -15.0, -10.0))
            .with_shadow_map(gpu, 2048, 2048)
    }

    fn bulb(gpu: &mut RecordingGpu, x: f32) -> Light {
        Light::point(
            LightBase::new(Vec3::Z, 0.0, 1.0),
            Vec3::new(x, 2.0, 0.0),
            Attenuation::new(0.3, 0.2, 0.1),
            0.01,
            100.0,
        )
        .with_shadow_map(gpu, 1024, 1024)
    }

    fn torch(gpu: &mut RecordingGpu) -> Light {
        Light::spot(
            LightBase::new(Vec3::ONE, 0.0, 2.0),
            Vec3::new(0.0, 3.0, 0.0),
            Vec3::NEG_Y,
            Attenuation::default(),
            20.0,
            0.01,
            100.0,
        )
        .with_shadow_map(gpu, 1024, 1024)
    }

    fn draws(gpu: &RecordingGpu, label: &'static str) -> usize {
        gpu.positions_of(&Call::Draw(label)).len()
    }

    #[test]
    fn test_directional_shadow_written_before_read() {
        let mut gpu = RecordingGpu::new();
        let pipeline = pipeline(&mut gpu);
        let scene = Scene::new(sun(&mut gpu), &mut gpu).unwrap();
        let map = scene.directional.shadow_map().unwrap();
        let (fb, tex) = (map.framebuffer(), map.texture());
        gpu.calls.clear();

        pipeline.render(&mut gpu, &scene, &frame(), &mut Geometry);

        let write = gpu.position_of(&Call::BindFramebuffer(fb)).unwrap();
        let depth_draw = gpu.position_of(&Call::Draw("depth")).unwrap();
        let unbind = gpu.position_of(&Call::BindFramebuffer(0)).unwrap();
        let read = gpu
            .position_of(&Call::BindTexture {
                unit: DIRECTIONAL_SHADOW_UNIT,
                target: TextureTarget::Flat,
                texture: tex,
            })
            .unwrap();
        assert!(write < depth_draw && depth_draw < unbind && unbind < read);
        assert_eq!(gpu.last_write("directionalShadowEnabled"), Some(UniformValue::Int(1)));
        assert_eq!(gpu.last_write("directionalShadowMap"), Some(UniformValue::Int(2)));
    }

    #[test]
    fn test_lit_pass_restores_window_viewport() {
        let mut gpu = RecordingGpu::new();
        let pipeline = pipeline(&mut gpu);
        let mut scene = Scene::new(sun(&mut gpu), &mut gpu).unwrap();
        scene.add_point_light(bulb(&mut gpu, 1.0), &mut gpu).unwrap();
        gpu.calls.clear();

        pipeline.render(&mut gpu, &scene, &frame(), &mut Geometry);

        let shadow_viewport = gpu.position_of(&Call::Viewport(2048, 2048)).unwrap();
        let omni_viewport = gpu.position_of(&Call::Viewport(1024, 1024)).unwrap();
        let window_viewport = gpu.position_of(&Call::Viewport(800, 600)).unwrap();
        let lit_clear = gpu.position_of(&Call::Clear(ClearTarget::ColorDepth)).unwrap();
        assert!(shadow_viewport < omni_viewport && omni_viewport < window_viewport);
        assert!(window_viewport < lit_clear);
        assert_eq!(gpu.positions_of(&Call::Clear(ClearTarget::Depth)).len(), 2);
    }

    #[test]
    fn test_omni_passes_clamp_to_max_lights() {
        let mut gpu = RecordingGpu::new();
        let pipeline = pipeline(&mut gpu);
        let mut scene = Scene::new(sun(&mut gpu), &mut gpu).unwrap();
        for i in 0..MAX_POINT_LIGHTS + 2 {
            scene.add_point_light(bulb(&mut gpu, i as f32), &mut gpu).unwrap();
        }
        let extra = scene.point_lights()[MAX_POINT_LIGHTS].shadow_map().unwrap().framebuffer();
        gpu.calls.clear();

        pipeline.render(&mut gpu, &scene, &frame(), &mut Geometry);

        assert_eq!(gpu.positions_of(&Call::UseProgram(OMNI_DEPTH)).len(), MAX_POINT_LIGHTS);
        assert!(gpu.position_of(&Call::BindFramebuffer(extra)).is_none());
        assert_eq!(draws(&gpu, "depth"), 1 + MAX_POINT_LIGHTS);
        assert_eq!(draws(&gpu, "lit"), 1);
        assert_eq!(gpu.last_write("pointLightCount"), Some(UniformValue::Int(MAX_POINT_LIGHTS as i32)));
    }

    #[test]
    fn test_light_without_shadow_map_skips_its_pass() {
        let mut gpu = RecordingGpu::new();
        let pipeline = pipeline(&mut gpu);
        let mut scene = Scene::new(sun(&mut gpu), &mut gpu).unwrap();
        gpu.framebuffer_status = gl::FRAMEBUFFER_INCOMPLETE_ATTACHMENT;
        scene.add_point_light(bulb(&mut gpu, 0.0), &mut gpu).unwrap();
        gpu.framebuffer_status = gl::FRAMEBUFFER_COMPLETE;
        scene.add_point_light(bulb(&mut gpu, 1.0), &mut gpu).unwrap();
        assert!(scene.point_lights()[0].shadow_map().is_none());
        gpu.calls.clear();

        pipeline.render(&mut gpu, &scene, &frame(), &mut Geometry);

        assert_eq!(gpu.positions_of(&Call::UseProgram(OMNI_DEPTH)).len(), 1);
        assert_eq!(gpu.last_write("pointLightCount"), Some(UniformValue::Int(2)));
        assert_eq!(gpu.last_write("omniShadowMaps[0].enabled"), Some(UniformValue::Int(0)));
        assert_eq!(gpu.last_write("omniShadowMaps[1].enabled"), Some(UniformValue::Int(1)));
    }

    #[test]
    fn test_directional_without_shadow_map_is_lit_unshadowed() {
        let mut gpu = RecordingGpu::new();
        let pipeline = pipeline(&mut gpu);
        let sun = Light::directional(LightBase::new(Vec3::ONE, 0.3, 0.7), Vec3::NEG_Y);
        let scene = Scene::new(sun, &mut gpu).unwrap();

        pipeline.render(&mut gpu, &scene, &frame(), &mut Geometry);

        assert!(gpu.position_of(&Call::UseProgram(DIRECTIONAL_DEPTH)).is_none());
        assert_eq!(gpu.last_write("directionalShadowEnabled"), Some(UniformValue::Int(0)));
        assert_eq!(gpu.last_write("directionalLight.base.ambientIntensity"), Some(UniformValue::Float(0.3)));
        assert_eq!(draws(&gpu, "depth"), 0);
    }

    #[test]
    fn test_spot_shadows_follow_point_shadows() {
        let mut gpu = RecordingGpu::new();
        let pipeline = pipeline(&mut gpu);
        let mut scene = Scene::new(sun(&mut gpu), &mut gpu).unwrap();
        scene.add_point_light(bulb(&mut gpu, 0.0), &mut gpu).unwrap();
        scene.add_point_light(bulb(&mut gpu, 1.0), &mut gpu).unwrap();
        scene.add_spot_light(torch(&mut gpu), &mut gpu).unwrap();
        let spot_tex = scene.spot_lights()[0].shadow_map().unwrap().texture();
        gpu.calls.clear();

        pipeline.render(&mut gpu, &scene, &frame(), &mut Geometry);

        let unit = OMNI_SHADOW_UNIT_BASE + 2;
        assert!(gpu
            .position_of(&Call::BindTexture { unit, target: TextureTarget::Cube, texture: spot_tex })
            .is_some());
        assert_eq!(gpu.last_write("omniShadowMaps[2].shadowMap"), Some(UniformValue::Int(unit as i32)));
        assert_eq!(gpu.last_write("omniShadowMaps[2].enabled"), Some(UniformValue::Int(1)));
        assert_eq!(gpu.last_write("spotLightCount"), Some(UniformValue::Int(1)));
    }

    #[test]
    fn test_every_omni_map_unbound_before_lit_pass() {
        let mut gpu = RecordingGpu::new();
        let pipeline = pipeline(&mut gpu);
        let mut scene = Scene::new(sun(&mut gpu), &mut gpu).unwrap();
        scene.add_point_light(bulb(&mut gpu, 0.0), &mut gpu).unwrap();
        scene.add_spot_light(torch(&mut gpu), &mut gpu).unwrap();
        let fbs: Vec<u32> = scene
            .point_lights()
            .iter()
            .chain(scene.spot_lights())
            .filter_map(|l| l.shadow_map().map(|m| m.framebuffer()))
            .collect();
        gpu.calls.clear();

        pipeline.render(&mut gpu, &scene, &frame(), &mut Geometry);

        let lit = gpu.position_of(&Call::UseProgram(LIT)).unwrap();
        for fb in fbs {
            let write = gpu.position_of(&Call::BindFramebuffer(fb)).unwrap();
            assert!(gpu.calls[write + 1..lit].contains(&Call::BindFramebuffer(0)));
        }
    }

    #[test]
    fn test_background_drawn_after_clear_before_lit_program() {
        let mut gpu = RecordingGpu::new();
        let pipeline = pipeline(&mut gpu);
        let scene = Scene::new(sun(&mut gpu), &mut gpu).unwrap();
        gpu.calls.clear();

        pipeline.render(&mut gpu, &scene, &frame(), &mut Geometry);

        let clear = gpu.position_of(&Call::Clear(ClearTarget::ColorDepth)).unwrap();
        let background = gpu.position_of(&Call::Draw("background")).unwrap();
        let lit = gpu.position_of(&Call::UseProgram(LIT)).unwrap();
        assert!(clear < background && background < lit);
        assert_eq!(gpu.calls[background - 1], Call::DepthMask(false));
        assert_eq!(gpu.calls[background + 1], Call::DepthMask(true));
    }

    #[test]
    fn test_lit_pass_uploads_camera() {
        let mut gpu = RecordingGpu::new();
        let pipeline = pipeline(&mut gpu);
        let scene = Scene::new(sun(&mut gpu), &mut gpu).unwrap();
        let frame = frame();

        pipeline.render(&mut gpu, &scene, &frame, &mut Geometry);

        assert_eq!(gpu.last_write("view"), Some(UniformValue::Mat4(frame.view)));
        assert_eq!(gpu.last_write("projection"), Some(UniformValue::Mat4(frame.projection)));
        assert_eq!(gpu.last_write("eyePosition"), Some(UniformValue::Vec3(frame.eye)));
        let transform = scene.directional.light_transform().unwrap();
        assert_eq!(gpu.writes_to("directionalLightTransform"), vec![
            UniformValue::Mat4(transform),
            UniformValue::Mat4(transform)
        ]);
    }
}
