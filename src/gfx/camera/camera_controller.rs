use winit::{
    event::{DeviceEvent, ElementState, KeyEvent, MouseScrollDelta},
    keyboard::{KeyCode, PhysicalKey},
};

use super::orbit_camera::OrbitCamera;

const LEFT_MOUSE_BUTTON: u32 = 0;

/// Mouse orbit controls: drag rotates, shift-drag pans, wheel zooms.
/// Shift+C puts the camera back where it started.
pub struct CameraController {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    shift: bool,
    dragging: bool,
}

impl CameraController {
    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            pan_speed: 0.01,
            shift: false,
            dragging: false,
        }
    }

    /// Returns true when the camera moved.
    pub fn process_events(&mut self, event: &DeviceEvent, camera: &mut OrbitCamera) -> bool {
        match *event {
            DeviceEvent::Button {
                button: LEFT_MOUSE_BUTTON,
                state,
            } => {
                self.dragging = state == ElementState::Pressed;
                false
            }
            DeviceEvent::MouseWheel { delta } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32,
                };
                camera.zoom(-lines * self.zoom_speed);
                true
            }
            DeviceEvent::MouseMotion { delta: (dx, dy) } if self.dragging => {
                let (dx, dy) = (dx as f32, dy as f32);
                if self.shift {
                    camera.pan(-dx * self.pan_speed, dy * self.pan_speed);
                } else {
                    camera.rotate(-dx * self.rotate_speed, dy * self.rotate_speed);
                }
                true
            }
            _ => false,
        }
    }

    pub fn process_keyed_events(&mut self, event: &KeyEvent, camera: &mut OrbitCamera) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        self.process_key(code, event.state == ElementState::Pressed, camera);
    }

    /// Presses and releases both matter: Shift is held state.
    pub fn process_key(&mut self, code: KeyCode, pressed: bool, camera: &mut OrbitCamera) {
        match code {
            KeyCode::ShiftLeft | KeyCode::ShiftRight => self.shift = pressed,
            KeyCode::KeyC if pressed && self.shift => {
                log::info!("Resetting camera");
                camera.reset();
            }
            _ => (),
        }
    }

    /// Forgets a held button, e.g. once the panel takes the mouse.
    pub fn release(&mut self) {
        self.dragging = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    fn drag(controller: &mut CameraController, camera: &mut OrbitCamera) {
        controller.process_events(
            &DeviceEvent::Button {
                button: LEFT_MOUSE_BUTTON,
                state: ElementState::Pressed,
            },
            camera,
        );
        controller.process_events(&DeviceEvent::MouseMotion { delta: (10.0, 0.0) }, camera);
    }

    #[test]
    fn test_shift_release_ends_panning() {
        let mut controller = CameraController::new(0.005, 0.1);
        let mut camera = OrbitCamera::new(2.0, 0.0, 0.0, Vector3::new(0.0, 0.0, 0.0), 1.0);

        controller.process_key(KeyCode::ShiftLeft, true, &mut camera);
        drag(&mut controller, &mut camera);
        assert_ne!(camera.target, Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(camera.yaw, 0.0);

        controller.process_key(KeyCode::ShiftLeft, false, &mut camera);
        let target = camera.target;
        drag(&mut controller, &mut camera);
        assert_eq!(camera.target, target);
        assert_ne!(camera.yaw, 0.0);
    }

    #[test]
    fn test_shift_c_resets_camera() {
        let mut controller = CameraController::new(0.005, 0.1);
        let mut camera = OrbitCamera::new(2.0, 0.0, 0.0, Vector3::new(0.0, 0.0, 0.0), 1.0);
        camera.rotate(0.5, 0.2);

        controller.process_key(KeyCode::KeyC, true, &mut camera);
        assert_eq!(camera.yaw, 0.5);

        controller.process_key(KeyCode::ShiftRight, true, &mut camera);
        controller.process_key(KeyCode::KeyC, true, &mut camera);
        assert_eq!(camera.yaw, 0.0);
    }
}
