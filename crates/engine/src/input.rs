use glam::Vec2;

use crate::camera::PinchDelta;

/// Input event types the engine understands.
/// Generic: no tile or puzzle semantics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A touch/click began at screen coordinates (x, y).
    PointerDown { id: u32, x: f32, y: f32 },
    /// A touch/cursor moved to screen coordinates (x, y).
    PointerMove { id: u32, x: f32, y: f32 },
    /// A touch/click ended at screen coordinates (x, y).
    PointerUp { id: u32, x: f32, y: f32 },
    /// The platform took the pointer away (touchcancel, lost capture).
    PointerCancel { id: u32 },
}

// Key codes as delivered by `KeyboardEvent.keyCode`.
pub const KEY_LEFT: u32 = 37;
pub const KEY_UP: u32 = 38;
pub const KEY_RIGHT: u32 = 39;
pub const KEY_DOWN: u32 = 40;

/// A queue of input events.
/// JS writes events into the queue; Rust reads and drains them each frame.
pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(32),
        }
    }

    /// Push a new input event (called from JS via wasm-bindgen).
    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Take all pending events, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns raw pointer events into pinch deltas once exactly two pointers are down.
/// With any other pointer count it stays passive.
#[derive(Debug, Clone, Default)]
pub struct PinchTracker {
    pointers: Vec<(u32, Vec2)>,
    /// Finger distance and midpoint at the previous two-pointer event.
    last: Option<(f32, Vec2)>,
}

impl PinchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_pointers(&self) -> usize {
        self.pointers.len()
    }

    pub fn is_pinching(&self) -> bool {
        self.pointers.len() == 2
    }

    /// Feed one event. Returns a delta only for a move while two pointers are down.
    pub fn handle(&mut self, event: InputEvent) -> Option<PinchDelta> {
        match event {
            InputEvent::PointerDown { id, x, y } => {
                self.pointers.retain(|(p, _)| *p != id);
                self.pointers.push((id, Vec2::new(x, y)));
                self.last = self.measure();
                None
            }
            InputEvent::PointerMove { id, x, y } => {
                let slot = self.pointers.iter_mut().find(|(p, _)| *p == id)?;
                slot.1 = Vec2::new(x, y);
                let (distance, center) = self.measure()?;
                let delta = self.last.map(|(last_distance, last_center)| PinchDelta {
                    scale_factor: if last_distance > 0.0 { distance / last_distance } else { 1.0 },
                    pan: center - last_center,
                });
                self.last = Some((distance, center));
                delta
            }
            InputEvent::PointerUp { id, .. } | InputEvent::PointerCancel { id } => {
                self.pointers.retain(|(p, _)| *p != id);
                self.last = self.measure();
                None
            }
        }
    }

    fn measure(&self) -> Option<(f32, Vec2)> {
        match self.pointers.as_slice() {
            [(_, a), (_, b)] => Some((a.distance(*b), (*a + *b) / 2.0)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_drains_in_order() {
        let mut q = InputQueue::new();
        q.push(InputEvent::PointerDown { id: 1, x: 3.0, y: 4.0 });
        q.push(InputEvent::PointerCancel { id: 1 });
        assert_eq!(q.len(), 2);
        let events = q.drain();
        assert_eq!(events[0], InputEvent::PointerDown { id: 1, x: 3.0, y: 4.0 });
        assert_eq!(events[1], InputEvent::PointerCancel { id: 1 });
        assert!(q.is_empty());
    }

    #[test]
    fn single_pointer_never_pinches() {
        let mut t = PinchTracker::new();
        assert!(t.handle(InputEvent::PointerDown { id: 1, x: 0.0, y: 0.0 }).is_none());
        assert!(t.handle(InputEvent::PointerMove { id: 1, x: 50.0, y: 0.0 }).is_none());
        assert!(!t.is_pinching());
    }

    #[test]
    fn spreading_fingers_zooms_in() {
        let mut t = PinchTracker::new();
        t.handle(InputEvent::PointerDown { id: 1, x: 100.0, y: 100.0 });
        t.handle(InputEvent::PointerDown { id: 2, x: 200.0, y: 100.0 });
        let delta = t
            .handle(InputEvent::PointerMove { id: 2, x: 300.0, y: 100.0 })
            .unwrap();
        assert!((delta.scale_factor - 2.0).abs() < 1e-6);
        assert_eq!(delta.pan, Vec2::new(50.0, 0.0));
    }

    #[test]
    fn lifting_a_finger_ends_pinch() {
        let mut t = PinchTracker::new();
        t.handle(InputEvent::PointerDown { id: 1, x: 0.0, y: 0.0 });
        t.handle(InputEvent::PointerDown { id: 2, x: 10.0, y: 0.0 });
        assert!(t.is_pinching());
        t.handle(InputEvent::PointerUp { id: 2, x: 10.0, y: 0.0 });
        assert!(!t.is_pinching());
        assert!(t.handle(InputEvent::PointerMove { id: 1, x: 5.0, y: 0.0 }).is_none());
    }
}
