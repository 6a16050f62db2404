pub mod demo;

use glam::Vec3;
use hecs::{Entity, World};

use crate::components::lighting::Light;
use crate::components::material::Material;
use crate::components::{MeshHandle, TextureHandle, Transform};
use crate::config::{MAX_POINT_LIGHTS, MAX_SPOT_LIGHTS};
use crate::error::{RenderError, Result};
use crate::renderer::gpu::Gpu;
use crate::renderer::model::Model;

/// Lights plus the drawables they shine on.
pub struct Scene {
    pub directional: Light,
    point_lights: Vec<Light>,
    spot_lights: Vec<Light>,
    pub world: World,
    flashlight: Option<usize>,
}

impl Scene {
    /// `directional` is expected to be a directional light. Anything else is
    /// rejected, and its shadow map is freed on `gpu`.
    pub fn new(mut directional: Light, gpu: &mut impl Gpu) -> Result<Self> {
        accept_kind(&mut directional, "directional", gpu)?;
        Ok(Self {
            directional,
            point_lights: Vec::new(),
            spot_lights: Vec::new(),
            world: World::new(),
            flashlight: None,
        })
    }

    pub fn add_point_light(&mut self, mut light: Light, gpu: &mut impl Gpu) -> Result<usize> {
        accept_kind(&mut light, "point", gpu)?;
        self.point_lights.push(light);
        if self.point_lights.len() == MAX_POINT_LIGHTS + 1 {
            log::warn!("more than {MAX_POINT_LIGHTS} point lights; extras are not rendered");
        }
        Ok(self.point_lights.len() - 1)
    }

    pub fn add_spot_light(&mut self, mut light: Light, gpu: &mut impl Gpu) -> Result<usize> {
        accept_kind(&mut light, "spot", gpu)?;
        if let Some(spot) = light.spot_params() {
            log::debug!("spot light {}: {:.1} degree cone", self.spot_lights.len(), spot.edge());
        }
        self.spot_lights.push(light);
        if self.spot_lights.len() == MAX_SPOT_LIGHTS + 1 {
            log::warn!("more than {MAX_SPOT_LIGHTS} spot lights; extras are not rendered");
        }
        Ok(self.spot_lights.len() - 1)
    }

    pub fn point_lights(&self) -> &[Light] {
        &self.point_lights
    }

    pub fn spot_lights(&self) -> &[Light] {
        &self.spot_lights
    }

    pub fn spawn_object(
        &mut self,
        mesh: MeshHandle,
        texture: TextureHandle,
        material: Material,
        transform: Transform,
    ) -> Entity {
        self.world.spawn((transform, mesh, texture, material))
    }

    /// Every part of `model` is drawn in each shadow pass and the lit pass.
    pub fn spawn_model(&mut self, model: Model, material: Material, transform: Transform) -> Entity {
        self.world.spawn((transform, model, material))
    }

    /// Make spot light `index` follow the camera.
    pub fn set_flashlight(&mut self, index: usize) {
        if index < self.spot_lights.len() {
            self.flashlight = Some(index);
        } else {
            log::warn!("no spot light {index} to use as flashlight");
        }
    }

    #[cfg(test)]
    pub fn flashlight(&self) -> Option<&Light> {
        self.flashlight.and_then(|i| self.spot_lights.get(i))
    }

    /// Returns the new enabled state, or `None` without a flashlight.
    pub fn toggle_flashlight(&mut self) -> Option<bool> {
        let light = self.spot_lights.get_mut(self.flashlight?)?;
        let enabled = !light.spot_params()?.is_enabled();
        light.set_enabled(enabled);
        log::debug!("flashlight {}", if enabled { "on" } else { "off" });
        Some(enabled)
    }

    pub fn attach_flashlight(&mut self, position: Vec3, direction: Vec3) {
        if let Some(light) = self.flashlight.and_then(|i| self.spot_lights.get_mut(i)) {
            light.set_flash(position, direction);
        }
    }

    /// Free every light's shadow map. Call once before the context goes away.
    pub fn release(&mut self, gpu: &mut impl Gpu) {
        self.directional.release(gpu);
        for light in self.point_lights.iter_mut().chain(self.spot_lights.iter_mut()) {
            light.release(gpu);
        }
    }
}

/// A rejected light is dropped by the caller, so its map goes now.
fn accept_kind(light: &mut Light, expected: &'static str, gpu: &mut impl Gpu) -> Result<()> {
    let found = light.kind.name();
    if found == expected {
        return Ok(());
    }
    light.release(gpu);
    Err(RenderError::LightKindMismatch { expected, found })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::lighting::{Attenuation, LightBase};
    use crate::renderer::gpu::recording::RecordingGpu;

    fn sun() -> Light {
        Light::directional(LightBase::new(Vec3::ONE, 0.2, 0.6), Vec3::new(0.0, -1.0, -1.0))
    }

    fn bulb() -> Light {
        Light::point(LightBase::new(Vec3::ONE, 0.0, 1.0), Vec3::Y, Attenuation::default(), 0.01, 100.0)
    }

    fn torch() -> Light {
        Light::spot(
            LightBase::new(Vec3::ONE, 0.0, 2.0),
            Vec3::ZERO,
            Vec3::NEG_Y,
            Attenuation::default(),
            20.0,
            0.01,
            100.0,
        )
    }

    #[test]
    fn test_wrong_kind_is_rejected() {
        let mut gpu = RecordingGpu::new();
        let mut scene = Scene::new(sun(), &mut gpu).unwrap();
        let err = scene.add_point_light(torch(), &mut gpu).unwrap_err();
        assert!(matches!(err, RenderError::LightKindMismatch { expected: "point", found: "spot" }));
        assert!(scene.add_spot_light(bulb(), &mut gpu).is_err());
        assert!(Scene::new(bulb(), &mut gpu).is_err());
        assert!(scene.point_lights().is_empty());
    }

    #[test]
    fn test_rejected_light_frees_its_shadow_map() {
        let mut gpu = RecordingGpu::new();
        let mut scene = Scene::new(sun(), &mut gpu).unwrap();

        let light = bulb().with_shadow_map(&mut gpu, 128, 128);
        assert_eq!(gpu.live_textures.len(), 1);
        assert!(scene.add_spot_light(light, &mut gpu).is_err());
        assert!(gpu.live_textures.is_empty());
        assert!(gpu.live_framebuffers.is_empty());

        let light = torch().with_shadow_map(&mut gpu, 128, 128);
        assert!(Scene::new(light, &mut gpu).is_err());
        assert!(gpu.live_textures.is_empty());
    }

    #[test]
    fn test_lights_beyond_max_are_kept() {
        let mut gpu = RecordingGpu::new();
        let mut scene = Scene::new(sun(), &mut gpu).unwrap();
        for _ in 0..MAX_POINT_LIGHTS + 2 {
            scene.add_point_light(bulb(), &mut gpu).unwrap();
        }
        assert_eq!(scene.point_lights().len(), MAX_POINT_LIGHTS + 2);
    }

    #[test]
    fn test_toggle_flashlight() {
        let mut gpu = RecordingGpu::new();
        let mut scene = Scene::new(sun(), &mut gpu).unwrap();
        assert_eq!(scene.toggle_flashlight(), None);

        let index = scene.add_spot_light(torch(), &mut gpu).unwrap();
        scene.set_flashlight(index);
        assert_eq!(scene.toggle_flashlight(), Some(false));
        assert!(!scene.flashlight().unwrap().spot_params().unwrap().is_enabled());
        assert_eq!(scene.toggle_flashlight(), Some(true));
    }

    #[test]
    fn test_attach_flashlight_moves_only_the_flashlight() {
        let mut gpu = RecordingGpu::new();
        let mut scene = Scene::new(sun(), &mut gpu).unwrap();
        scene.add_spot_light(torch(), &mut gpu).unwrap();
        let index = scene.add_spot_light(torch(), &mut gpu).unwrap();
        scene.set_flashlight(index);

        scene.attach_flashlight(Vec3::new(1.0, 1.7, 2.0), Vec3::new(0.0, 0.0, -2.0));

        let flash = scene.spot_lights()[1].spot_params().unwrap();
        assert_eq!(flash.point.position, Vec3::new(1.0, 1.7, 2.0));
        assert_eq!(flash.direction(), Vec3::NEG_Z);
        assert_eq!(scene.spot_lights()[0].spot_params().unwrap().point.position, Vec3::ZERO);
    }

    #[test]
    fn test_set_flashlight_out_of_range_is_ignored() {
        let mut gpu = RecordingGpu::new();
        let mut scene = Scene::new(sun(), &mut gpu).unwrap();
        scene.set_flashlight(2);
        assert!(scene.flashlight().is_none());
    }

    #[test]
    fn test_release_frees_every_shadow_map() {
        let mut gpu = RecordingGpu::new();
        let mut scene = Scene::new(sun().with_shadow_map(&mut gpu, 256, 256), &mut gpu).unwrap();
        scene.add_point_light(bulb().with_shadow_map(&mut gpu, 128, 128), &mut gpu).unwrap();
        scene.add_spot_light(torch().with_shadow_map(&mut gpu, 128, 128), &mut gpu).unwrap();
        assert_eq!(gpu.live_textures.len(), 3);

        scene.release(&mut gpu);
        scene.release(&mut gpu);

        assert!(gpu.live_textures.is_empty());
        assert!(gpu.live_framebuffers.is_empty());
        assert!(scene.directional.shadow_map().is_none());
    }
}
