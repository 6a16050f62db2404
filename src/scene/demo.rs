use glam::Vec3;

use crate::components::lighting::{Attenuation, Light, LightBase, DEFAULT_ORTHO_FAR, DEFAULT_ORTHO_NEAR};
use crate::components::material::Material;
use crate::components::Transform;
use crate::config::RenderConfig;
use crate::error::Result;
use crate::renderer::gpu::Gpu;
use crate::renderer::mesh::{create_floor, create_pyramid, create_sphere};
use crate::renderer::model::Model;
use crate::renderer::texture::TextureStore;
use crate::renderer::Renderer;
use crate::scene::Scene;

/// Two pyramids, a sphere and an optional loaded model on a tiled floor,
/// under a sun, three colored point lights and two spot lights. Spot light 0
/// is the flashlight.
pub fn load_demo_scene(gpu: &mut impl Gpu, renderer: &mut Renderer, config: &RenderConfig) -> Result<Scene> {
    let sun = Light::directional_with_extent(
        LightBase::new(Vec3::ONE, 0.1, 0.6),
        Vec3::new(0.0, -15.0, -10.0),
        config.ortho_extent,
        DEFAULT_ORTHO_NEAR,
        DEFAULT_ORTHO_FAR,
    )
    .with_shadow_map(gpu, config.shadow_size, config.shadow_size);
    let mut scene = Scene::new(sun, gpu)?;

    // Lights already added own shadow maps; free them before bailing out
    if let Err(e) = populate(gpu, renderer, config, &mut scene) {
        scene.release(gpu);
        return Err(e);
    }

    log::info!(
        "demo scene: {} point lights, {} spot lights",
        scene.point_lights().len(),
        scene.spot_lights().len()
    );
    Ok(scene)
}

fn populate(gpu: &mut impl Gpu, renderer: &mut Renderer, config: &RenderConfig, scene: &mut Scene) -> Result<()> {
    let shiny = Material::new(1.0, 16.0);
    let dull = Material::new(0.3, 4.0);

    let brick = renderer.textures.load(&config.texture("brick.png"));
    let dirt = renderer.textures.load(&config.texture("dirt.png"));
    let plain = TextureStore::FALLBACK;

    let pyramid = renderer.meshes.add(create_pyramid());
    let floor = renderer.meshes.add(create_floor(10.0, 10.0));
    let sphere = renderer.meshes.add(create_sphere(0.75, 16, 32));

    let omni = config.omni_shadow_size;
    let (near, far) = (config.omni_near, config.omni_far);

    let attenuation = Attenuation::new(0.5, 0.2, 0.1);
    for (color, position) in [
        (Vec3::Y, Vec3::new(-5.0, 0.5, 0.0)),
        (Vec3::X, Vec3::new(5.0, 0.5, 0.0)),
        (Vec3::Z, Vec3::new(0.0, 0.5, -6.0)),
    ] {
        let light = Light::point(LightBase::new(color, 0.1, 0.4), position, attenuation, near, far)
            .with_shadow_map(gpu, omni, omni);
        scene.add_point_light(light, gpu)?;
    }

    let flashlight = Light::spot(
        LightBase::new(Vec3::ONE, 0.0, 2.0),
        Vec3::ZERO,
        Vec3::NEG_Y,
        Attenuation::new(1.0, 0.0, 0.0),
        20.0,
        near,
        far,
    )
    .with_shadow_map(gpu, omni, omni);
    let flashlight = scene.add_spot_light(flashlight, gpu)?;
    scene.set_flashlight(flashlight);

    let lamp = Light::spot(
        LightBase::new(Vec3::new(0.0, 1.0, 1.0), 0.0, 1.0),
        Vec3::new(0.0, 1.5, 0.0),
        Vec3::new(0.0, -1.0, -0.5),
        Attenuation::new(0.3, 0.2, 0.1),
        55.0,
        near,
        far,
    )
    .with_shadow_map(gpu, omni, omni);
    scene.add_spot_light(lamp, gpu)?;

    scene.spawn_object(pyramid, brick, shiny, Transform::new(Vec3::new(-2.0, 0.0, -2.5)));
    scene.spawn_object(pyramid, dirt, dull, Transform::new(Vec3::new(2.0, 0.0, -2.5)));
    scene.spawn_object(sphere, plain, shiny, Transform::new(Vec3::new(0.0, -0.25, 1.5)));
    scene.spawn_object(floor, plain, dull, Transform::new(Vec3::new(0.0, -1.0, 0.0)));

    let texture_dir = config.texture_dir();
    match Model::load(&config.model("statue.obj"), &mut renderer.meshes, &mut renderer.textures, &texture_dir) {
        Ok(model) => {
            let mut transform = Transform::new(Vec3::new(-4.0, -1.0, 2.0));
            transform.scale = Vec3::splat(0.5);
            scene.spawn_model(model, dull, transform);
        }
        Err(e) => log::warn!("{e}; skipping the statue"),
    }

    Ok(())
}
