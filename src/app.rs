use glam::Vec3;
use sdl2::keyboard::Scancode;
use sdl2::Sdl;

use crate::camera::Camera;
use crate::config::RenderConfig;
use crate::engine::input::InputState;
use crate::engine::time::FrameTimer;
use crate::engine::window::GameWindow;
use crate::error::{RenderError, Result};
use crate::renderer::gpu::GlGpu;
use crate::renderer::pipeline::FrameView;
use crate::renderer::Renderer;
use crate::scene::demo::load_demo_scene;
use crate::scene::Scene;

pub struct DemoApp {
    gpu: GlGpu,
    renderer: Renderer,
    scene: Scene,
    camera: Camera,
}

impl DemoApp {
    /// Needs the window's GL context to be current.
    pub fn new(config: &RenderConfig) -> Result<Self> {
        let mut gpu = GlGpu;
        let mut renderer = Renderer::init(&mut gpu, config)?;
        let scene = load_demo_scene(&mut gpu, &mut renderer, config)?;

        Ok(Self {
            gpu,
            renderer,
            scene,
            camera: Camera::new(Vec3::new(0.0, 1.0, 6.0), -90.0, 0.0),
        })
    }

    pub fn run(&mut self, sdl: &Sdl, window: &GameWindow) -> Result<()> {
        sdl.mouse().set_relative_mouse_mode(true);
        let mut event_pump = sdl.event_pump().map_err(RenderError::Window)?;
        let mut input = InputState::new();
        let mut timer = FrameTimer::new();

        loop {
            timer.tick();
            input.update(&mut event_pump);
            if input.should_quit() {
                break;
            }

            self.handle_input(&input, timer.dt);
            self.render(window);
            window.swap();
        }

        log::info!("closing after {} frames", timer.frames());
        self.scene.release(&mut self.gpu);
        Ok(())
    }

    fn handle_input(&mut self, input: &InputState, dt: f32) {
        if input.was_pressed(Scancode::L) {
            self.scene.toggle_flashlight();
        }

        self.camera.look(input.mouse_dx, input.mouse_dy);
        self.camera.move_keys(input, dt);

        let (position, direction) = self.camera.flashlight_pose();
        self.scene.attach_flashlight(position, direction);
    }

    fn render(&mut self, window: &GameWindow) {
        let (width, height) = window.size();
        let frame = FrameView {
            view: self.camera.view_matrix(),
            projection: self.camera.projection_matrix(window.aspect_ratio()),
            eye: self.camera.position,
            width,
            height,
        };
        self.renderer.render(&mut self.gpu, &self.scene, &frame);
    }
}
