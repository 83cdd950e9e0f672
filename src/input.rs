use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crossbeam_channel::{Receiver, Sender};
use glam::Vec2;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{Key, KeyCode, PhysicalKey};

use crate::pipeline::Viewport;

/// Tracks input state for keyboard and mouse.
#[derive(Default)]
pub struct Input {
    keys_down: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    keys_released: HashSet<KeyCode>,
    /// Lowercased text of logical keys pressed this frame.
    chars_pressed: Vec<String>,
    mouse_buttons_down: HashSet<MouseButton>,
    mouse_position: Vec2,
    mouse_delta: Vec2,
    scroll_delta: Vec2,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call at the end of each frame to reset per-frame state.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.chars_pressed.clear();
        self.mouse_delta = Vec2::ZERO;
        self.scroll_delta = Vec2::ZERO;
    }

    /// Process a window event and update input state.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                match event.state {
                    ElementState::Pressed => {
                        if let PhysicalKey::Code(key) = event.physical_key {
                            if self.keys_down.insert(key) {
                                self.keys_pressed.insert(key);
                            }
                        }
                        if let Key::Character(text) = &event.logical_key {
                            if !event.repeat {
                                self.chars_pressed.push(text.to_lowercase());
                            }
                        }
                    }
                    ElementState::Released => {
                        if let PhysicalKey::Code(key) = event.physical_key {
                            self.keys_down.remove(&key);
                            self.keys_released.insert(key);
                        }
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => {
                    self.mouse_buttons_down.insert(*button);
                }
                ElementState::Released => {
                    self.mouse_buttons_down.remove(button);
                }
            },
            WindowEvent::CursorMoved { position, .. } => {
                let new_pos = Vec2::new(position.x as f32, position.y as f32);
                self.mouse_delta += new_pos - self.mouse_position;
                self.mouse_position = new_pos;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let d = match delta {
                    winit::event::MouseScrollDelta::LineDelta(x, y) => Vec2::new(*x, *y),
                    winit::event::MouseScrollDelta::PixelDelta(pos) => {
                        Vec2::new(pos.x as f32, pos.y as f32) / 120.0
                    }
                };
                self.scroll_delta += d;
            }
            _ => {}
        }
    }

    /// Returns true if the key is currently held down.
    pub fn key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// Returns true if the key was pressed this frame.
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Returns true if the key was released this frame.
    pub fn key_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }

    /// Returns true if a key producing `ch` (either case) was pressed this
    /// frame, regardless of keyboard layout.
    pub fn char_pressed(&self, ch: char) -> bool {
        let wanted = ch.to_lowercase().to_string();
        self.chars_pressed.iter().any(|c| *c == wanted)
    }

    /// Returns true if the mouse button is currently held down.
    pub fn mouse_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons_down.contains(&button)
    }

    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Scroll wheel delta this frame (in "lines").
    pub fn scroll_delta(&self) -> Vec2 {
        self.scroll_delta
    }
}

/// Whether a key's text is the debug overlay toggle (`d` or `D`).
pub fn is_toggle_key(text: &str) -> bool {
    text.eq_ignore_ascii_case("d")
}

/// Events delivered to pipeline components outside the frame closure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlEvent {
    /// Show or hide the debug overlay.
    ToggleDebug,
    /// The drawable surface changed size.
    Resized(Viewport),
}

/// Fan-out of [`ControlEvent`]s to any number of subscribers.
///
/// Each subscriber owns a [`Subscription`]; dropping it disconnects the
/// channel and the bus forgets it on the next publish.
#[derive(Clone, Default)]
pub struct ControlBus {
    subscribers: Arc<Mutex<Vec<Sender<ControlEvent>>>>,
}

impl ControlBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = crossbeam_channel::unbounded();
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(tx);
        }
        Subscription { rx }
    }

    /// Sends `event` to every live subscriber, pruning dropped ones.
    pub fn publish(&self, event: ControlEvent) {
        let Ok(mut subscribers) = self.subscribers.lock() else {
            return;
        };
        subscribers.retain(|tx| tx.send(event).is_ok());
        log::trace!("published {event:?} to {} subscribers", subscribers.len());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }
}

/// Receiving end of a [`ControlBus`] subscription.
pub struct Subscription {
    rx: Receiver<ControlEvent>,
}

impl Subscription {
    /// Drains every event published since the last call, without blocking.
    pub fn drain(&self) -> impl Iterator<Item = ControlEvent> + '_ {
        self.rx.try_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_key_is_case_insensitive() {
        assert!(is_toggle_key("d"));
        assert!(is_toggle_key("D"));
        assert!(!is_toggle_key("e"));
        assert!(!is_toggle_key("dd"));
    }

    #[test]
    fn every_subscriber_sees_each_event() {
        let bus = ControlBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();
        bus.publish(ControlEvent::ToggleDebug);
        bus.publish(ControlEvent::Resized(Viewport::new(640, 480)));

        let got_a: Vec<_> = a.drain().collect();
        let got_b: Vec<_> = b.drain().collect();
        assert_eq!(got_a, got_b);
        assert_eq!(
            got_a,
            vec![
                ControlEvent::ToggleDebug,
                ControlEvent::Resized(Viewport::new(640, 480))
            ]
        );
        assert_eq!(a.drain().count(), 0);
    }

    #[test]
    fn dropped_subscription_is_pruned_on_publish() {
        let bus = ControlBus::new();
        let keep = bus.subscribe();
        let gone = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        drop(gone);
        bus.publish(ControlEvent::ToggleDebug);
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(keep.drain().count(), 1);
    }

    #[test]
    fn cloned_bus_shares_subscribers() {
        let bus = ControlBus::new();
        let sub = bus.subscribe();
        bus.clone().publish(ControlEvent::ToggleDebug);
        assert_eq!(sub.drain().next(), Some(ControlEvent::ToggleDebug));
    }

    #[test]
    fn fresh_input_has_nothing_pressed() {
        let input = Input::new();
        assert!(!input.key_down(KeyCode::KeyD));
        assert!(!input.char_pressed('d'));
        assert_eq!(input.scroll_delta(), Vec2::ZERO);
    }
}
