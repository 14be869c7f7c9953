//! Keyboard and mouse state, and the fly camera driven by it.

use std::collections::HashSet;

use glam::{Vec2, Vec3};
use lm3d_core::{Camera, camera::WORLD_UP};
use sdl2::{event::Event, keyboard::Keycode, mouse::MouseButton};

/// Keys held, and keys that went down or up this frame.
#[derive(Default)]
pub struct KeyboardState {
    pub down: HashSet<Keycode>,
    pub pressed: HashSet<Keycode>,
    pub released: HashSet<Keycode>,
}

/// Cursor position and motion, and buttons held or changed this frame.
#[derive(Default)]
pub struct MouseState {
    pub position: Vec2,
    pub delta: Vec2,
    pub down: HashSet<MouseButton>,
    pub pressed: HashSet<MouseButton>,
    pub released: HashSet<MouseButton>,
}

/// Keyboard and mouse together, updated from SDL events.
#[derive(Default)]
pub struct InputState {
    pub keyboard: KeyboardState,
    pub mouse: MouseState,
}

impl InputState {
    /// Clears the per-frame sets. Call before polling events.
    pub fn begin_frame(&mut self) {
        self.mouse.delta = Vec2::ZERO;
        self.keyboard.pressed.clear();
        self.keyboard.released.clear();
        self.mouse.pressed.clear();
        self.mouse.released.clear();
    }

    pub fn handle_event(&mut self, event: &Event) {
        match *event {
            Event::MouseMotion {
                x, y, xrel, yrel, ..
            } => {
                self.mouse.position = Vec2::new(x as f32, y as f32);
                self.mouse.delta += Vec2::new(xrel as f32, yrel as f32);
            }
            Event::MouseButtonDown { mouse_btn, .. } => {
                self.mouse.down.insert(mouse_btn);
                self.mouse.pressed.insert(mouse_btn);
            }
            Event::MouseButtonUp { mouse_btn, .. } => {
                self.mouse.down.remove(&mouse_btn);
                self.mouse.released.insert(mouse_btn);
            }
            Event::KeyDown {
                keycode: Some(keycode),
                repeat: false,
                ..
            } => {
                self.keyboard.down.insert(keycode);
                self.keyboard.pressed.insert(keycode);
            }
            Event::KeyUp {
                keycode: Some(keycode),
                repeat: false,
                ..
            } => {
                self.keyboard.down.remove(&keycode);
                self.keyboard.released.insert(keycode);
            }
            _ => {}
        }
    }

    pub fn move_input(&self) -> MoveInput {
        let down = |key| self.keyboard.down.contains(&key);
        MoveInput {
            forward: down(Keycode::W),
            back: down(Keycode::S),
            left: down(Keycode::A),
            right: down(Keycode::D),
            up: down(Keycode::Space),
            down: down(Keycode::LShift),
            boost: down(Keycode::LCtrl),
        }
    }
}

/// Which movement keys are held this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MoveInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub boost: bool,
}

/// Free-flying camera control: horizontal movement along the view direction, vertical
/// movement along world up and mouse look.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlyController {
    pub speed: f32,
    pub sensitivity: f32,
    pub boost_factor: f32,
    pub pitch_limit: f32,
}

impl FlyController {
    pub fn new(speed: f32, sensitivity: f32) -> Self {
        Self {
            speed,
            sensitivity,
            boost_factor: 4.0,
            pitch_limit: 89.0,
        }
    }

    /// Turns the camera by a mouse motion in pixels. Moving the mouse up looks up.
    pub fn look(&self, camera: &mut Camera, delta: Vec2) {
        if delta == Vec2::ZERO {
            return;
        }
        let mut rotation = camera.rotation();
        rotation.x = (rotation.x - delta.y * self.sensitivity)
            .clamp(-self.pitch_limit, self.pitch_limit);
        rotation.y += delta.x * self.sensitivity;
        camera.set_rotation(rotation);
    }

    /// Moves the camera for a frame that took `delta_time` seconds.
    pub fn fly(&self, camera: &mut Camera, input: MoveInput, delta_time: f32) {
        let mut speed = self.speed * delta_time;
        if input.boost {
            speed *= self.boost_factor;
        }

        let forward = camera.forward().with_y(0.0).normalize_or_zero();
        let right = camera.right();

        let mut offset = Vec3::ZERO;
        if input.forward {
            offset += forward;
        }
        if input.back {
            offset -= forward;
        }
        if input.right {
            offset += right;
        }
        if input.left {
            offset -= right;
        }
        if input.up {
            offset += WORLD_UP;
        }
        if input.down {
            offset -= WORLD_UP;
        }

        if offset != Vec3::ZERO {
            camera.translate(offset * speed);
        }
    }
}
