use gl::types::*;
use image::RgbaImage;
use std::path::{Path, PathBuf};

use crate::components::TextureHandle;
use crate::error::{RenderError, Result};
use crate::renderer::gpu::{Gpu, TextureTarget};

/// A 2-D color texture. `id` stays 0 until [`Texture::load`] succeeds.
pub struct Texture {
    path: PathBuf,
    id: GLuint,
    width: u32,
    height: u32,
}

impl Texture {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            id: 0,
            width: 0,
            height: 0,
        }
    }

    /// Decode the file and upload it. The image is decoded before any GL
    /// object is created, so a missing or corrupt file allocates nothing.
    pub fn load(&mut self) -> Result<()> {
        let img = image::open(&self.path)
            .map_err(|source| RenderError::Texture {
                path: self.path.clone(),
                source,
            })?
            .to_rgba8();
        self.upload(&img);
        log::debug!("loaded texture {} ({}x{})", self.path.display(), self.width, self.height);
        Ok(())
    }

    /// A 1×1 texture of a single color, used when even the fallback file is
    /// missing.
    pub fn solid(rgba: [u8; 4]) -> Self {
        let mut texture = Self::new("<solid>");
        texture.upload(&RgbaImage::from_pixel(1, 1, image::Rgba(rgba)));
        texture
    }

    fn upload(&mut self, img: &RgbaImage) {
        let (width, height) = img.dimensions();
        unsafe {
            if self.id == 0 {
                gl::GenTextures(1, &mut self.id);
            }
            gl::BindTexture(gl::TEXTURE_2D, self.id);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, gl::REPEAT as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, gl::REPEAT as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::LINEAR_MIPMAP_LINEAR as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::LINEAR as GLint);
            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                gl::RGBA as GLint,
                width as GLsizei,
                height as GLsizei,
                0,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                img.as_raw().as_ptr() as *const _,
            );
            gl::GenerateMipmap(gl::TEXTURE_2D);
            gl::BindTexture(gl::TEXTURE_2D, 0);
        }
        self.width = width;
        self.height = height;
    }

    pub fn bind(&self, gpu: &mut impl Gpu, unit: u32) {
        gpu.bind_texture(unit, TextureTarget::Flat, self.id);
    }

    #[cfg(test)]
    pub fn id(&self) -> GLuint {
        self.id
    }

    #[cfg(test)]
    pub fn is_loaded(&self) -> bool {
        self.id != 0
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        if self.id != 0 {
            unsafe {
                gl::DeleteTextures(1, &self.id);
            }
        }
    }
}

/// Holds all loaded textures. Entities reference them by TextureHandle index.
/// Slot 0 is always the plain fallback.
pub struct TextureStore {
    textures: Vec<Texture>,
}

impl TextureStore {
    pub const FALLBACK: TextureHandle = TextureHandle(0);

    /// `plain` becomes the fallback; if it cannot be loaded a white texel is
    /// used instead.
    pub fn new(plain: &Path) -> Self {
        let mut fallback = Texture::new(plain);
        if let Err(e) = fallback.load() {
            log::warn!("{e}; using a white fallback texture");
            fallback = Texture::solid([255, 255, 255, 255]);
        }
        Self {
            textures: vec![fallback],
        }
    }

    /// A store whose fallback was never uploaded.
    #[cfg(test)]
    pub fn without_gpu() -> Self {
        Self {
            textures: vec![Texture::new("plain.png")],
        }
    }

    /// Load `path`, or hand back the fallback if it fails.
    pub fn load(&mut self, path: &Path) -> TextureHandle {
        let mut texture = Texture::new(path);
        match texture.load() {
            Ok(()) => {
                self.textures.push(texture);
                TextureHandle(self.textures.len() - 1)
            }
            Err(e) => {
                log::warn!("{e}; falling back to the plain texture");
                Self::FALLBACK
            }
        }
    }

    pub fn get(&self, handle: TextureHandle) -> &Texture {
        self.textures.get(handle.0).unwrap_or(&self.textures[Self::FALLBACK.0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_allocates_no_texture() {
        let mut texture = Texture::new("textures/does-not-exist.png");
        let err = texture.load().unwrap_err();
        assert!(matches!(err, RenderError::Texture { ref path, .. } if path.ends_with("does-not-exist.png")));
        assert_eq!(texture.id(), 0);
        assert!(!texture.is_loaded());
    }
}
