/// Mouse interaction modes and buttons as the kernel sees them

use winit::event::MouseButton as WindowButton;

/// How camera-motion drags are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseMode {
    /// Middle zooms, right rotates
    #[default]
    ZoomRotate,
    /// Middle zooms, right is reserved for rolling
    ZoomRoll,
    /// Middle dollies along forward, right slides across the screen
    Pan,
    /// Camera motion disabled
    Fixed,
}

impl MouseMode {
    pub fn zoom_allowed(&self) -> bool {
        matches!(self, MouseMode::ZoomRotate | MouseMode::ZoomRoll)
    }

    pub fn spin_allowed(&self) -> bool {
        matches!(self, MouseMode::ZoomRotate)
    }
}

/// Button attached to a camera-motion report.
///
/// `Middle` also stands for the left and right buttons held together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseButton {
    #[default]
    None,
    Left,
    Right,
    Middle,
}

impl From<WindowButton> for MouseButton {
    fn from(button: WindowButton) -> Self {
        match button {
            WindowButton::Left => MouseButton::Left,
            WindowButton::Right => MouseButton::Right,
            WindowButton::Middle => MouseButton::Middle,
            _ => MouseButton::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_buttons_map_to_kernel_buttons() {
        assert_eq!(MouseButton::from(WindowButton::Left), MouseButton::Left);
        assert_eq!(MouseButton::from(WindowButton::Right), MouseButton::Right);
        assert_eq!(MouseButton::from(WindowButton::Middle), MouseButton::Middle);
        assert_eq!(MouseButton::from(WindowButton::Back), MouseButton::None);
    }

    #[test]
    fn test_mode_permissions() {
        assert!(MouseMode::ZoomRotate.zoom_allowed() && MouseMode::ZoomRotate.spin_allowed());
        assert!(MouseMode::ZoomRoll.zoom_allowed() && !MouseMode::ZoomRoll.spin_allowed());
        assert!(!MouseMode::Pan.zoom_allowed() && !MouseMode::Pan.spin_allowed());
        assert!(!MouseMode::Fixed.zoom_allowed());
    }
}
