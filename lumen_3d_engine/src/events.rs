//! Input events flowing from the window layer to the display thread
//!
//! The producer side never blocks: the channel is unbounded, so reporting a
//! resize or a mouse move from the windowing thread cannot stall on a slow
//! frame.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;
use winit::dpi::PhysicalSize;
use crate::error::{Error, Result};
use crate::kernel::Modifiers;

/// Message consumed by the display thread
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// The window was resized
    Resized(PhysicalSize<u32>),
    /// Full mouse state after a change: `[left, right]` buttons, cursor in
    /// window pixels (origin top left)
    Mouse {
        buttons: [bool; 2],
        x: i32,
        y: i32,
        modifiers: Modifiers,
        can_lock: bool,
    },
    /// Render a frame now instead of waiting for the next tick
    Redraw,
    /// The platform destroyed the rendering context
    ContextLost,
    /// Stop the display thread
    Close,
}

impl InputEvent {
    /// Mouse report with no modifiers that cannot lock the cursor
    pub fn mouse(buttons: [bool; 2], x: i32, y: i32) -> Self {
        InputEvent::Mouse { buttons, x, y, modifiers: Modifiers::default(), can_lock: false }
    }
}

/// Producer half; cheap to clone
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: Sender<InputEvent>,
}

impl EventSender {
    /// # Errors
    ///
    /// `ChannelClosed` once the display thread has exited.
    pub fn send(&self, event: InputEvent) -> Result<()> {
        self.sender
            .send(event)
            .map_err(|_| Error::ChannelClosed("display thread is no longer receiving events".to_string()))
    }
}

/// Consumer half, owned by the display thread
#[derive(Debug)]
pub struct EventQueue {
    receiver: Receiver<InputEvent>,
    disconnected: bool,
}

impl EventQueue {
    pub fn channel() -> (EventSender, EventQueue) {
        let (sender, receiver) = mpsc::channel();
        (EventSender { sender }, EventQueue { receiver, disconnected: false })
    }

    /// Every event queued so far, oldest first, without blocking
    pub fn drain(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.disconnected = true;
                    break;
                }
            }
        }
        events
    }

    /// Wait up to `timeout` for the next event
    pub fn wait(&mut self, timeout: Duration) -> Option<InputEvent> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                self.disconnected = true;
                None
            }
        }
    }

    /// Every sender has been dropped
    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }
}
