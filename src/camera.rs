use glam::{Mat4, Vec3};
use sdl2::keyboard::Scancode;

use crate::engine::input::InputState;

/// Offset of the flashlight below the eye, so its cone is visible.
const FLASHLIGHT_DROP: f32 = 0.3;

/// Free-flying yaw/pitch camera.
pub struct Camera {
    pub position: Vec3,
    world_up: Vec3,
    /// Degrees; -90 looks down -Z.
    pub yaw: f32,
    pub pitch: f32,
    pub move_speed: f32,
    pub turn_speed: f32,
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        Self {
            position,
            world_up: Vec3::Y,
            yaw,
            pitch: pitch.clamp(-89.0, 89.0),
            move_speed: 5.0,
            turn_speed: 0.1,
            fov: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }

    pub fn look(&mut self, mouse_dx: f32, mouse_dy: f32) {
        self.yaw += mouse_dx * self.turn_speed;
        self.pitch = (self.pitch - mouse_dy * self.turn_speed).clamp(-89.0, 89.0);
    }

    /// WASD moves in the view plane, Q/E straight down/up.
    pub fn move_keys(&mut self, input: &InputState, dt: f32) {
        let front = self.front();
        let right = self.right();
        let velocity = self.move_speed * dt;

        let bindings = [
            (Scancode::W, front),
            (Scancode::S, -front),
            (Scancode::D, right),
            (Scancode::A, -right),
            (Scancode::E, self.world_up),
            (Scancode::Q, -self.world_up),
        ];
        for (key, dir) in bindings {
            if input.is_key_held(key) {
                self.position += dir * velocity;
            }
        }
    }

    pub fn front(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.front().cross(self.world_up).normalize()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front(), self.world_up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov.to_radians(), aspect, self.near, self.far)
    }

    /// Where a hand-held light sits: just below the eye, aimed where we look.
    pub fn flashlight_pose(&self) -> (Vec3, Vec3) {
        (self.position - Vec3::Y * FLASHLIGHT_DROP, self.front())
    }
}
