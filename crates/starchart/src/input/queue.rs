/// Input events a map understands.
/// Screen coordinates are pixels relative to the container center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Mouse moved by (dx, dy) pixels. `buttons` is the DOM button bitmask.
    PointerMove { dx: f64, dy: f64, buttons: u32 },
    /// A finger touched down at (x, y).
    TouchStart { x: f64, y: f64 },
    /// A finger moved to absolute position (x, y).
    TouchMove { x: f64, y: f64 },
    /// The last finger lifted.
    TouchEnd,
    /// Single click at (x, y).
    Click { x: f64, y: f64 },
    /// Double click at (x, y).
    DoubleClick { x: f64, y: f64 },
    /// Zoom button: +1 in, -1 out. `modifier` is set while shift/ctrl is held.
    Zoom { direction: i32, modifier: bool },
    /// Flip overlay toggle `index`.
    Toggle { index: usize },
    /// Change the simulation time.
    SetTime { time: f64 },
}

/// A queue of input events.
/// JS pushes events as they happen; the map drains them once per frame.
pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(32),
        }
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Drain all pending events. Returns a Vec and clears the queue.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InputEvent> {
        self.events.iter()
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
