use std::ops::AddAssign;

/// Debounce-to-next-frame accumulator.
///
/// Input handlers `push` deltas as they arrive; at most one flush is
/// scheduled per frame, and the scheduled flag is only cleared once the
/// flush has run. Mirrors `FixedTimestep`: accumulate eagerly, apply once.
#[derive(Debug, Clone, Default)]
pub struct FrameBatch<T> {
    pending: T,
    scheduled: bool,
}

impl<T: AddAssign + Default + Copy> FrameBatch<T> {
    pub fn new() -> Self {
        Self {
            pending: T::default(),
            scheduled: false,
        }
    }

    /// Accumulate `delta`. Returns true when the caller must schedule a
    /// flush (i.e. none is pending yet for this frame).
    pub fn push(&mut self, delta: T) -> bool {
        self.pending += delta;
        if self.scheduled {
            false
        } else {
            self.scheduled = true;
            true
        }
    }

    /// Whether a flush is pending.
    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    /// Take the accumulated delta and clear the scheduled flag.
    /// Returns None when nothing was pushed since the last flush.
    pub fn flush(&mut self) -> Option<T> {
        if !self.scheduled {
            return None;
        }
        let total = std::mem::take(&mut self.pending);
        self.scheduled = false;
        Some(total)
    }
}
