use std::path::PathBuf;

use clap::Parser;

use crate::components::lighting::DEFAULT_ORTHO_EXTENT;

/// Array sizes compiled into `shader.frag`; must match its `#define`s.
pub const MAX_POINT_LIGHTS: usize = 3;
pub const MAX_SPOT_LIGHTS: usize = 3;
pub const MAX_OMNI_SHADOWS: usize = MAX_POINT_LIGHTS + MAX_SPOT_LIGHTS;

// Texture unit contract shared with the shaders.
pub const SKYBOX_TEXTURE_UNIT: u32 = 0;
pub const DIFFUSE_TEXTURE_UNIT: u32 = 1;
pub const DIRECTIONAL_SHADOW_UNIT: u32 = 2;
/// Omni slot `i` samples from unit `OMNI_SHADOW_UNIT_BASE + i`.
pub const OMNI_SHADOW_UNIT_BASE: u32 = 3;

#[derive(Parser, Debug)]
#[command(name = "penumbra", about = "Shadowed multi-light OpenGL demo")]
pub struct Args {
    #[arg(long, default_value_t = 1366)]
    pub width: u32,

    #[arg(long, default_value_t = 768)]
    pub height: u32,

    /// Directory holding the GLSL sources
    #[arg(long, default_value = "shaders")]
    pub shader_dir: PathBuf,

    /// Directory holding textures/, models/ and skybox/
    #[arg(long, default_value = "assets")]
    pub asset_dir: PathBuf,

    /// Directional shadow map resolution (square)
    #[arg(long, default_value_t = 2048)]
    pub shadow_size: u32,

    /// Point/spot cube shadow map face resolution
    #[arg(long, default_value_t = 1024)]
    pub omni_shadow_size: u32,

    #[arg(long, default_value_t = 0.01)]
    pub omni_near: f32,

    #[arg(long, default_value_t = 100.0)]
    pub omni_far: f32,

    /// Half-width of the directional light's orthographic shadow frustum
    #[arg(long, default_value_t = DEFAULT_ORTHO_EXTENT)]
    pub ortho_extent: f32,

    /// Skip the skybox background
    #[arg(long)]
    pub no_skybox: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub verbose: bool,
}

/// Resolved settings the renderer and scene are built from.
#[derive(Clone, Debug)]
pub struct RenderConfig {
    pub window_width: u32,
    pub window_height: u32,
    pub shader_dir: PathBuf,
    pub asset_dir: PathBuf,
    pub shadow_size: u32,
    pub omni_shadow_size: u32,
    pub omni_near: f32,
    pub omni_far: f32,
    pub ortho_extent: f32,
    pub skybox: bool,
}

/// Omni near planes are kept positive, and far planes stay strictly beyond
/// them at any magnitude.
const MIN_NEAR_PLANE: f32 = 0.001;
const FAR_PLANE_MARGIN: f32 = 1.001;

impl From<&Args> for RenderConfig {
    fn from(args: &Args) -> Self {
        let omni_near = args.omni_near.max(MIN_NEAR_PLANE);
        Self {
            window_width: args.width.max(1),
            window_height: args.height.max(1),
            shader_dir: args.shader_dir.clone(),
            asset_dir: args.asset_dir.clone(),
            shadow_size: args.shadow_size.max(1),
            omni_shadow_size: args.omni_shadow_size.max(1),
            omni_near,
            omni_far: args.omni_far.max(omni_near * FAR_PLANE_MARGIN + MIN_NEAR_PLANE),
            ortho_extent: args.ortho_extent,
            skybox: !args.no_skybox,
        }
    }
}

impl RenderConfig {
    pub fn shader(&self, file: &str) -> PathBuf {
        self.shader_dir.join(file)
    }

    pub fn texture_dir(&self) -> PathBuf {
        self.asset_dir.join("textures")
    }

    pub fn texture(&self, file: &str) -> PathBuf {
        self.texture_dir().join(file)
    }

    pub fn model(&self, file: &str) -> PathBuf {
        self.asset_dir.join("models").join(file)
    }

    /// Skybox faces in cube map order: +X, -X, +Y, -Y, +Z, -Z.
    pub fn skybox_faces(&self) -> [PathBuf; 6] {
        ["right", "left", "up", "down", "back", "front"]
            .map(|face| self.asset_dir.join("skybox").join(format!("{face}.jpg")))
    }
}
