//! Error types shared by the renderer.
//!
//! Startup failures (window, context, shaders) propagate to `main` and abort.
//! Shadow-map failures degrade the owning light, texture failures fall back
//! to the plain texture. Nothing is retried.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    /// Window or GL context creation failed.
    #[error("Window system error: {0}")]
    Window(String),

    /// A shader source file could not be read.
    #[error("Failed to read shader source {path}: {source}")]
    ShaderSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Shader source contained an interior nul byte.
    #[error("{stage} shader source contains a nul byte")]
    ShaderNul { stage: &'static str },

    #[error("{stage} shader compile error: {log}")]
    ShaderCompile { stage: &'static str, log: String },

    #[error("Shader link error: {0}")]
    ShaderLink(String),

    /// Framebuffer status after attaching the depth texture was not complete.
    #[error("Framebuffer incomplete (status 0x{status:04X})")]
    IncompleteFramebuffer { status: u32 },

    /// Cube map faces must be square.
    #[error("Cube shadow map must be square, got {width}x{height}")]
    NonSquareCubeMap { width: u32, height: u32 },

    #[error("Failed to load texture {path}: {source}")]
    Texture {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Model file could not be opened or parsed.
    #[error("Failed to load model {path}: {source}")]
    Model {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    /// A light was added to a list holding a different light kind.
    #[error("Expected a {expected} light, got a {found} light")]
    LightKindMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, RenderError>;
