use sdl2::event::Event;
use sdl2::keyboard::Scancode;
use sdl2::EventPump;
use std::collections::HashSet;

/// Keyboard and mouse state gathered once per frame.
pub struct InputState {
    held: HashSet<Scancode>,
    /// Keys that went down this frame, excluding auto-repeat.
    pressed: Vec<Scancode>,
    pub mouse_dx: f32,
    pub mouse_dy: f32,
    quit: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
            pressed: Vec::new(),
            mouse_dx: 0.0,
            mouse_dy: 0.0,
            quit: false,
        }
    }

    pub fn update(&mut self, event_pump: &mut EventPump) {
        self.begin_frame();
        for event in event_pump.poll_iter() {
            self.handle(event);
        }
    }

    fn begin_frame(&mut self) {
        self.mouse_dx = 0.0;
        self.mouse_dy = 0.0;
        self.pressed.clear();
    }

    fn handle(&mut self, event: Event) {
        match event {
            Event::Quit { .. }
            | Event::KeyDown {
                scancode: Some(Scancode::Escape),
                ..
            } => self.quit = true,
            Event::KeyDown {
                scancode: Some(sc),
                repeat,
                ..
            } => {
                if !repeat {
                    self.pressed.push(sc);
                }
                self.held.insert(sc);
            }
            Event::KeyUp {
                scancode: Some(sc), ..
            } => {
                self.held.remove(&sc);
            }
            Event::MouseMotion { xrel, yrel, .. } => {
                self.mouse_dx += xrel as f32;
                self.mouse_dy += yrel as f32;
            }
            _ => {}
        }
    }

    pub fn is_key_held(&self, sc: Scancode) -> bool {
        self.held.contains(&sc)
    }

    pub fn was_pressed(&self, sc: Scancode) -> bool {
        self.pressed.contains(&sc)
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }
}
