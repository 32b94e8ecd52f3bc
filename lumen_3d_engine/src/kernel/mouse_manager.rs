/// MouseManager - turns raw button and cursor reports into camera motion
/// and discrete left-button events.
///
/// The window layer reports the complete button state after every change.
/// The right button drives the camera through the kernel (with the left
/// button held too it acts as the middle button); the left button produces
/// press, click, drag, drop and release events queued for the application.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use glam::DVec3;
use crate::error::{Error, Result};
use crate::scene::SharedRenderable;
use super::display_kernel::{DisplayKernel, PickResult};
use super::mouse::MouseButton;

/// Keyboard modifiers held during a mouse report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl From<winit::keyboard::ModifiersState> for Modifiers {
    fn from(state: winit::keyboard::ModifiersState) -> Self {
        Self {
            shift: state.shift_key(),
            ctrl: state.control_key(),
            alt: state.alt_key(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEventKind {
    Press,
    Click,
    Drag,
    Drop,
    Release,
}

/// Mouse state, either current or captured when an event happened
#[derive(Clone, Default)]
pub struct MouseEvent {
    pub kind: Option<MouseEventKind>,
    pub button: MouseButton,
    /// Cursor position in world coordinates
    pub position: DVec3,
    pub camera: DVec3,
    /// Unit direction from the camera through the cursor
    pub ray: DVec3,
    /// Nearest object under the cursor
    pub pick: Option<SharedRenderable>,
    /// Point on `pick` under the cursor
    pub pick_position: DVec3,
    pub modifiers: Modifiers,
}

impl std::fmt::Debug for MouseEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MouseEvent")
            .field("kind", &self.kind)
            .field("button", &self.button)
            .field("position", &self.position)
            .field("camera", &self.camera)
            .field("ray", &self.ray)
            .field("pick", &self.pick.is_some())
            .field("pick_position", &self.pick_position)
            .field("modifiers", &self.modifiers)
            .finish()
    }
}

impl MouseEvent {
    pub fn is_press(&self) -> bool {
        self.kind == Some(MouseEventKind::Press)
    }

    pub fn is_click(&self) -> bool {
        self.kind == Some(MouseEventKind::Click)
    }

    pub fn is_drag(&self) -> bool {
        self.kind == Some(MouseEventKind::Drag)
    }

    pub fn is_drop(&self) -> bool {
        self.kind == Some(MouseEventKind::Drop)
    }

    pub fn is_release(&self) -> bool {
        self.kind == Some(MouseEventKind::Release)
    }

    /// Take position, camera, ray and picked object from a pick
    pub fn set_pick(&mut self, pick: &PickResult) {
        self.position = pick.mouse_position;
        self.camera = pick.camera;
        self.ray = (pick.mouse_position - pick.camera).normalize_or_zero();
        self.pick = pick.object.clone();
        self.pick_position = pick.pick_position;
    }

    /// Intersection of the cursor ray with the plane through `point` with
    /// normal `normal`; `None` when the ray runs parallel to the plane
    pub fn project(&self, normal: DVec3, point: DVec3) -> Option<DVec3> {
        self.project_distance(normal, normal.dot(point))
    }

    /// Intersection of the cursor ray with the plane `normal . p = distance`
    pub fn project_distance(&self, normal: DVec3, distance: f64) -> Option<DVec3> {
        let along_ray = normal.dot(self.ray);
        if along_ray == 0.0 {
            return None;
        }
        let t = -(normal.dot(self.camera) - distance) / along_ray;
        Some(self.camera + self.ray * t)
    }

    fn snapshot(&self, kind: MouseEventKind, button: MouseButton) -> Self {
        Self { kind: Some(kind), button, ..self.clone() }
    }
}

#[derive(Default)]
struct QueueState {
    events: VecDeque<MouseEvent>,
    clicks: usize,
}

/// Left-button events waiting for the application, shared across threads
#[derive(Default)]
pub struct MouseEventQueue {
    state: Mutex<QueueState>,
}

impl MouseEventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, QueueState>> {
        self.state
            .lock()
            .map_err(|_| Error::BackendError("MouseEventQueue lock poisoned".to_string()))
    }

    pub fn push(&self, event: MouseEvent) -> Result<()> {
        let mut state = self.lock()?;
        if event.is_click() {
            state.clicks += 1;
        }
        state.events.push_back(event);
        Ok(())
    }

    /// Oldest queued event
    pub fn pop_event(&self) -> Result<Option<MouseEvent>> {
        let mut state = self.lock()?;
        let event = state.events.pop_front();
        if event.as_ref().is_some_and(MouseEvent::is_click) {
            state.clicks -= 1;
        }
        Ok(event)
    }

    /// Oldest queued click, discarding the events queued before it.
    ///
    /// With no click queued nothing is discarded.
    pub fn pop_click(&self) -> Result<Option<MouseEvent>> {
        let mut state = self.lock()?;
        if state.clicks == 0 {
            return Ok(None);
        }
        while let Some(event) = state.events.pop_front() {
            if event.is_click() {
                state.clicks -= 1;
                return Ok(Some(event));
            }
        }
        Ok(None)
    }

    pub fn num_events(&self) -> Result<usize> {
        Ok(self.lock()?.events.len())
    }

    pub fn num_clicks(&self) -> Result<usize> {
        Ok(self.lock()?.clicks)
    }

    pub fn clear_events(&self) -> Result<()> {
        let mut state = self.lock()?;
        state.events.clear();
        state.clicks = 0;
        Ok(())
    }
}

#[derive(Default)]
pub struct MouseManager {
    mouse: MouseEvent,
    events: Arc<MouseEventQueue>,
    /// Last reported `[left, right]` state
    buttons: [bool; 2],
    px: i32,
    py: i32,
    locked: bool,
    left_down: bool,
    left_dragging: bool,
    /// The cursor moved while the left button was down, so no click is
    /// possible, but no drag started either (the right button may be down)
    left_semidrag: bool,
}

impl MouseManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue shared with the application side
    pub fn events(&self) -> Arc<MouseEventQueue> {
        Arc::clone(&self.events)
    }

    /// Current mouse state
    pub fn mouse(&self) -> &MouseEvent {
        &self.mouse
    }

    /// Update the current mouse state from a pick under the cursor
    pub fn set_pick(&mut self, pick: &PickResult) {
        self.mouse.set_pick(pick);
    }

    /// The cursor is held in place while the camera moves
    pub fn is_mouse_locked(&self) -> bool {
        self.locked
    }

    /// Last cursor position that was not locked
    pub fn position(&self) -> (i32, i32) {
        (self.px, self.py)
    }

    /// Report the full `[left, right]` button state and the cursor position.
    ///
    /// When both buttons changed at once the right button change is applied
    /// first, so event generation only ever sees one change per update.
    /// `can_lock` tells whether the window can hold the cursor still while
    /// the camera moves.
    pub fn report_mouse_state(
        &mut self,
        kernel: &DisplayKernel,
        buttons: [bool; 2],
        x: i32,
        y: i32,
        modifiers: Modifiers,
        can_lock: bool,
    ) -> Result<()> {
        if buttons[0] != self.buttons[0] && buttons[1] != self.buttons[1] {
            let partial = [buttons[0], !buttons[1]];
            self.update(kernel, partial, x, y, modifiers, can_lock)?;
        }
        self.update(kernel, buttons, x, y, modifiers, can_lock)
    }

    fn update(
        &mut self,
        kernel: &DisplayKernel,
        buttons: [bool; 2],
        x: i32,
        y: i32,
        modifiers: Modifiers,
        can_lock: bool,
    ) -> Result<()> {
        let [left, right] = buttons;
        self.mouse.modifiers = modifiers;

        let mode = kernel.mouse_mode()?;
        self.locked = can_lock && ((mode.zoom_allowed() && left && right) || (mode.spin_allowed() && right));
        if right {
            let button = if left { MouseButton::Middle } else { MouseButton::Right };
            kernel.report_mouse_motion((x - self.px) as f64, (y - self.py) as f64, button)?;
        }

        let moved = x != self.px || y != self.py;
        if self.left_down && !self.left_dragging && moved {
            self.left_semidrag = true;
        }
        if !self.left_down {
            self.left_semidrag = false;
        }

        // Left button changes are ignored while the right button is down
        if !right {
            let mut pressed = left;
            if pressed != self.left_down {
                if pressed {
                    if !self.buttons[0] {
                        self.push(MouseEventKind::Press)?;
                    } else {
                        // Releasing the right button of a chord does not press the left
                        pressed = false;
                    }
                } else if self.left_dragging {
                    self.push(MouseEventKind::Drop)?;
                    self.left_dragging = false;
                } else if self.left_semidrag {
                    self.push(MouseEventKind::Release)?;
                } else {
                    self.push(MouseEventKind::Click)?;
                }
            }

            if pressed && self.left_down && moved && !self.left_dragging {
                self.push(MouseEventKind::Drag)?;
                self.left_dragging = true;
            }
            self.left_down = pressed;
        }

        if !self.locked {
            self.px = x;
            self.py = y;
        }
        self.buttons = buttons;
        Ok(())
    }

    fn push(&self, kind: MouseEventKind) -> Result<()> {
        self.events.push(self.mouse.snapshot(kind, MouseButton::Left))
    }
}

#[cfg(test)]
#[path = "mouse_manager_tests.rs"]
mod tests;
