use sdl2::video::{GLContext, GLProfile, Window};
use sdl2::Sdl;

use crate::error::{RenderError, Result};

/// SDL window with a current OpenGL 3.3 core context.
pub struct GameWindow {
    _gl_context: GLContext,
    window: Window,
}

impl GameWindow {
    pub fn new(sdl: &Sdl, title: &str, width: u32, height: u32) -> Result<Self> {
        let video = sdl.video().map_err(RenderError::Window)?;

        let gl_attr = video.gl_attr();
        gl_attr.set_context_profile(GLProfile::Core);
        gl_attr.set_context_version(3, 3);
        gl_attr.set_depth_size(24);
        gl_attr.set_double_buffer(true);

        let window = video
            .window(title, width, height)
            .opengl()
            .position_centered()
            .build()
            .map_err(|e| RenderError::Window(e.to_string()))?;

        let gl_context = window.gl_create_context().map_err(RenderError::Window)?;
        gl::load_with(|s| video.gl_get_proc_address(s) as *const _);

        if let Err(e) = video.gl_set_swap_interval(1) {
            log::warn!("vsync unavailable: {e}");
        }
        log::info!("opened {width}x{height} window with an OpenGL 3.3 core context");

        Ok(Self {
            _gl_context: gl_context,
            window,
        })
    }

    pub fn swap(&self) {
        self.window.gl_swap_window();
    }

    /// Drawable size in pixels.
    pub fn size(&self) -> (u32, u32) {
        self.window.drawable_size()
    }

    pub fn aspect_ratio(&self) -> f32 {
        let (w, h) = self.size();
        w as f32 / h.max(1) as f32
    }
}
