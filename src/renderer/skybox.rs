use gl::types::*;
use glam::{Mat3, Mat4};
use std::path::PathBuf;

use crate::config::SKYBOX_TEXTURE_UNIT;
use crate::error::{RenderError, Result};
use crate::renderer::gpu::{Gpu, TextureTarget};
use crate::renderer::mesh::{create_skybox_cube, Mesh};
use crate::renderer::shader::ShaderProgram;

/// Cube-mapped background drawn before the lit geometry.
pub struct Skybox {
    shader: ShaderProgram,
    mesh: Mesh,
    texture: GLuint,
}

impl Skybox {
    /// `faces` in cube map order (+X, -X, +Y, -Y, +Z, -Z). All six are decoded
    /// before the cube map is created.
    pub fn new(shader: ShaderProgram, faces: &[PathBuf; 6]) -> Result<Self> {
        let images = faces
            .iter()
            .map(|path| {
                image::open(path)
                    .map(|img| img.to_rgb8())
                    .map_err(|source| RenderError::Texture {
                        path: path.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut texture = 0;
        unsafe {
            gl::GenTextures(1, &mut texture);
            gl::BindTexture(gl::TEXTURE_CUBE_MAP, texture);
            for (i, img) in images.iter().enumerate() {
                let (w, h) = img.dimensions();
                gl::TexImage2D(
                    gl::TEXTURE_CUBE_MAP_POSITIVE_X + i as GLenum,
                    0,
                    gl::RGB as GLint,
                    w as GLsizei,
                    h as GLsizei,
                    0,
                    gl::RGB,
                    gl::UNSIGNED_BYTE,
                    img.as_raw().as_ptr() as *const _,
                );
            }
            gl::TexParameteri(gl::TEXTURE_CUBE_MAP, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE as GLint);
            gl::TexParameteri(gl::TEXTURE_CUBE_MAP, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE as GLint);
            gl::TexParameteri(gl::TEXTURE_CUBE_MAP, gl::TEXTURE_WRAP_R, gl::CLAMP_TO_EDGE as GLint);
            gl::TexParameteri(gl::TEXTURE_CUBE_MAP, gl::TEXTURE_MIN_FILTER, gl::LINEAR as GLint);
            gl::TexParameteri(gl::TEXTURE_CUBE_MAP, gl::TEXTURE_MAG_FILTER, gl::LINEAR as GLint);
            gl::BindTexture(gl::TEXTURE_CUBE_MAP, 0);
        }

        let mut skybox = Self {
            shader,
            mesh: create_skybox_cube(),
            texture,
        };
        skybox.shader.bind();
        skybox.shader.set_int("skybox", SKYBOX_TEXTURE_UNIT as i32);
        Ok(skybox)
    }

    /// Draw with depth writes off so the scene always lands in front.
    pub fn draw(&mut self, gpu: &mut impl Gpu, view: &Mat4, projection: &Mat4) {
        // Rotation only: the sky stays centered on the camera
        let view = Mat4::from_mat3(Mat3::from_mat4(*view));

        gpu.depth_mask(false);
        gpu.use_program(self.shader.id);
        self.shader.set_mat4("projection", projection);
        self.shader.set_mat4("view", &view);
        gpu.bind_texture(SKYBOX_TEXTURE_UNIT, TextureTarget::Cube, self.texture);
        self.mesh.draw();
        gpu.depth_mask(true);
    }
}

impl Drop for Skybox {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteTextures(1, &self.texture);
        }
    }
}
