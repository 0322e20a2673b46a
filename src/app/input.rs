use crate::camera::CameraView;
use glam::Vec2;
use winit::event::MouseScrollDelta;
use winit::keyboard::{KeyCode, PhysicalKey};

const PIXELS_PER_WHEEL_LINE: f32 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    None,
    SetView(CameraView),
    Reload,
    GiveUpLoads,
    ToggleVisibility,
    RandomizeColor,
    AdjustTransparency(i16),
    Exit,
}

/// Pointer state tracked between window events.
#[derive(Default, Debug, Clone, Copy)]
pub struct InputState {
    pub cursor: Option<Vec2>,
    pub left_held: bool,
}

impl InputState {
    pub fn handle_key(&mut self, key: PhysicalKey, pressed: bool) -> InputAction {
        if !pressed {
            return InputAction::None;
        }
        match key {
            PhysicalKey::Code(KeyCode::Digit1) => InputAction::SetView(CameraView::Default),
            PhysicalKey::Code(KeyCode::Digit2) => InputAction::SetView(CameraView::Front),
            PhysicalKey::Code(KeyCode::Digit3) => InputAction::SetView(CameraView::Top),
            PhysicalKey::Code(KeyCode::Digit4) => InputAction::SetView(CameraView::Left),
            PhysicalKey::Code(KeyCode::Digit5) => InputAction::SetView(CameraView::Right),
            PhysicalKey::Code(KeyCode::KeyR) => InputAction::Reload,
            PhysicalKey::Code(KeyCode::KeyG) => InputAction::GiveUpLoads,
            PhysicalKey::Code(KeyCode::KeyV) => InputAction::ToggleVisibility,
            PhysicalKey::Code(KeyCode::KeyC) => InputAction::RandomizeColor,
            PhysicalKey::Code(KeyCode::BracketLeft) => InputAction::AdjustTransparency(-10),
            PhysicalKey::Code(KeyCode::BracketRight) => InputAction::AdjustTransparency(10),
            PhysicalKey::Code(KeyCode::Escape) => InputAction::Exit,
            _ => InputAction::None,
        }
    }

    /// Forgets the cursor and any held button, e.g. on focus loss.
    pub fn reset(&mut self) {
        self.cursor = None;
        self.left_held = false;
    }
}

/// Wheel delta in zoom steps; positive zooms in.
pub fn wheel_steps(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_WHEEL_LINE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn digit_keys_select_views() {
        let mut input = InputState::default();
        let views: Vec<InputAction> = [
            KeyCode::Digit1,
            KeyCode::Digit2,
            KeyCode::Digit3,
            KeyCode::Digit4,
            KeyCode::Digit5,
        ]
        .into_iter()
        .map(|code| input.handle_key(PhysicalKey::Code(code), true))
        .collect();
        let expected: Vec<InputAction> = CameraView::ALL
            .into_iter()
            .map(InputAction::SetView)
            .collect();
        assert_eq!(views, expected);
    }

    #[test]
    fn releases_and_unbound_keys_do_nothing() {
        let mut input = InputState::default();
        assert_eq!(
            input.handle_key(PhysicalKey::Code(KeyCode::KeyR), false),
            InputAction::None
        );
        assert_eq!(
            input.handle_key(PhysicalKey::Code(KeyCode::KeyQ), true),
            InputAction::None
        );
        assert_eq!(
            input.handle_key(PhysicalKey::Code(KeyCode::BracketLeft), true),
            InputAction::AdjustTransparency(-10)
        );
    }

    #[test]
    fn wheel_pixels_are_scaled_to_lines() {
        assert_eq!(wheel_steps(MouseScrollDelta::LineDelta(0.0, 2.0)), 2.0);
        let pixels = MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -80.0));
        assert_eq!(wheel_steps(pixels), -2.0);
    }
}
