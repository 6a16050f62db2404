pub mod gpu;
pub mod mesh;
pub mod model;
pub mod pipeline;
pub mod shader;
pub mod shadow_map;
pub mod skybox;
pub mod texture;
pub mod uniforms;

use glam::{Mat4, Vec3};
use hecs::World;

use crate::components::material::Material;
use crate::components::{MeshHandle, TextureHandle, Transform};
use crate::config::{RenderConfig, DIFFUSE_TEXTURE_UNIT};
use crate::error::Result;
use crate::scene::Scene;
use gpu::{GlGpu, Gpu};
use mesh::Mesh;
use model::Model;
use pipeline::{FramePipeline, FrameView, SceneGeometry};
use shader::ShaderProgram;
use skybox::Skybox;
use texture::TextureStore;
use uniforms::{DirectionalShadowUniforms, GeometrySlots, LightingUniforms, OmniShadowUniforms};

const CLEAR_COLOR: Vec3 = Vec3::new(0.0, 0.0, 0.0);

/// Holds all loaded meshes. Entities reference meshes by MeshHandle index.
pub struct MeshStore {
    meshes: Vec<Mesh>,
}

impl MeshStore {
    pub fn new() -> Self {
        Self { meshes: Vec::new() }
    }

    pub fn add(&mut self, mesh: Mesh) -> MeshHandle {
        let handle = MeshHandle(self.meshes.len());
        self.meshes.push(mesh);
        handle
    }

    pub fn get(&self, handle: MeshHandle) -> &Mesh {
        &self.meshes[handle.0]
    }
}

pub struct Renderer {
    // Programs must outlive the uniform tables resolved from them
    _lit_shader: ShaderProgram,
    _directional_shader: ShaderProgram,
    _omni_shader: ShaderProgram,
    pipeline: FramePipeline,
    pub meshes: MeshStore,
    pub textures: TextureStore,
    skybox: Option<Skybox>,
}

impl Renderer {
    /// Compile every program and resolve its uniforms. Any shader failure is
    /// fatal; a missing skybox face only disables the skybox.
    pub fn init(gpu: &mut GlGpu, config: &RenderConfig) -> Result<Self> {
        unsafe {
            gl::Enable(gl::DEPTH_TEST);
            gl::ClearColor(CLEAR_COLOR.x, CLEAR_COLOR.y, CLEAR_COLOR.z, 1.0);
        }

        let lit_shader =
            ShaderProgram::from_files(&config.shader("shader.vert"), &config.shader("shader.frag"), None)?;
        let directional_shader = ShaderProgram::from_files(
            &config.shader("directional_shadow_map.vert"),
            &config.shader("directional_shadow_map.frag"),
            None,
        )?;
        let omni_shader = ShaderProgram::from_files(
            &config.shader("omni_shadow_map.vert"),
            &config.shader("omni_shadow_map.frag"),
            Some(&config.shader("omni_shadow_map.geom")),
        )?;

        let pipeline = FramePipeline::new(
            LightingUniforms::resolve(gpu, lit_shader.id),
            DirectionalShadowUniforms::resolve(gpu, directional_shader.id),
            OmniShadowUniforms::resolve(gpu, omni_shader.id),
        );
        pipeline.prepare(gpu);
        lit_shader.validate();

        let skybox = if config.skybox {
            let shader =
                ShaderProgram::from_files(&config.shader("skybox.vert"), &config.shader("skybox.frag"), None)?;
            match Skybox::new(shader, &config.skybox_faces()) {
                Ok(skybox) => Some(skybox),
                Err(e) => {
                    log::warn!("skybox disabled: {e}");
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            _lit_shader: lit_shader,
            _directional_shader: directional_shader,
            _omni_shader: omni_shader,
            pipeline,
            meshes: MeshStore::new(),
            textures: TextureStore::new(&config.texture("plain.png")),
            skybox,
        })
    }

    pub fn render(&mut self, gpu: &mut GlGpu, scene: &Scene, frame: &FrameView) {
        let mut drawer = SceneDrawer {
            world: &scene.world,
            meshes: &self.meshes,
            textures: &self.textures,
            skybox: self.skybox.as_mut(),
        };
        self.pipeline.render(gpu, scene, frame, &mut drawer);
    }
}

/// Walks the world's drawables for each pass.
struct SceneDrawer<'a> {
    world: &'a World,
    meshes: &'a MeshStore,
    textures: &'a TextureStore,
    skybox: Option<&'a mut Skybox>,
}

impl SceneGeometry<GlGpu> for SceneDrawer<'_> {
    fn draw_geometry(&mut self, gpu: &mut GlGpu, slots: &GeometrySlots) {
        for (_entity, (transform, mesh_handle, texture_handle, material)) in self
            .world
            .query::<(&Transform, &MeshHandle, &TextureHandle, &Material)>()
            .iter()
        {
            gpu.set_mat4(slots.model, &transform.matrix());
            if let Some(material_slots) = &slots.material {
                self.textures.get(*texture_handle).bind(gpu, DIFFUSE_TEXTURE_UNIT);
                material.use_material(gpu, material_slots);
            }
            self.meshes.get(*mesh_handle).draw();
        }

        for (_entity, (transform, model, material)) in
            self.world.query::<(&Transform, &Model, &Material)>().iter()
        {
            gpu.set_mat4(slots.model, &transform.matrix());
            if let Some(material_slots) = &slots.material {
                material.use_material(gpu, material_slots);
            }
            for part in model.parts() {
                if slots.material.is_some() {
                    self.textures.get(part.texture).bind(gpu, DIFFUSE_TEXTURE_UNIT);
                }
                self.meshes.get(part.mesh).draw();
            }
        }
    }

    fn draw_background(&mut self, gpu: &mut GlGpu, view: &Mat4, projection: &Mat4) {
        if let Some(skybox) = self.skybox.as_deref_mut() {
            skybox.draw(gpu, view, projection);
        }
    }
}
