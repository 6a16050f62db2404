use gl::types::*;

use crate::error::{RenderError, Result};
use crate::renderer::gpu::{Gpu, TextureTarget};

/// Depth-only render target: a 2-D depth texture for directional lights or a
/// depth cube map for point and spot lights.
///
/// Owns its framebuffer and texture exclusively and is deliberately not
/// `Clone`. Handles are released through [`ShadowMap::release`], which is
/// safe to call more than once.
#[derive(Debug)]
pub struct ShadowMap {
    target: TextureTarget,
    framebuffer: GLuint,
    texture: GLuint,
    width: u32,
    height: u32,
}

impl ShadowMap {
    /// Allocate and attach the depth target. On an incomplete framebuffer the
    /// partially built resources are released and the window framebuffer is
    /// restored before the error is returned.
    pub fn new(gpu: &mut impl Gpu, target: TextureTarget, width: u32, height: u32) -> Result<Self> {
        if target == TextureTarget::Cube && width != height {
            return Err(RenderError::NonSquareCubeMap { width, height });
        }

        let mut map = Self {
            target,
            framebuffer: gpu.gen_framebuffer(),
            texture: gpu.gen_texture(),
            width,
            height,
        };

        gpu.define_depth_storage(map.texture, target, width, height);
        let status = gpu.attach_depth_texture(map.framebuffer, map.texture, target);
        gpu.bind_framebuffer(0);

        if status != gl::FRAMEBUFFER_COMPLETE {
            log::error!("{target:?} shadow framebuffer incomplete: status 0x{status:04X}");
            map.release(gpu);
            return Err(RenderError::IncompleteFramebuffer { status });
        }

        log::info!("{target:?} shadow map ready ({width}x{height})");
        Ok(map)
    }

    /// Make this the draw target. Everything rasterized until the next
    /// framebuffer bind writes depth here.
    pub fn write(&self, gpu: &mut impl Gpu) {
        gpu.bind_framebuffer(self.framebuffer);
    }

    /// Bind the depth texture to `unit` for sampling.
    pub fn read(&self, gpu: &mut impl Gpu, unit: u32) {
        gpu.bind_texture(unit, self.target, self.texture);
    }

    pub fn release(&mut self, gpu: &mut impl Gpu) {
        if self.framebuffer != 0 {
            gpu.delete_framebuffer(self.framebuffer);
            self.framebuffer = 0;
        }
        if self.texture != 0 {
            gpu.delete_texture(self.texture);
            self.texture = 0;
        }
    }

    #[cfg(test)]
    pub fn framebuffer(&self) -> GLuint {
        self.framebuffer
    }

    #[cfg(test)]
    pub fn texture(&self) -> GLuint {
        self.texture
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[cfg(test)]
    pub fn is_released(&self) -> bool {
        self.framebuffer == 0 && self.texture == 0
    }
}
