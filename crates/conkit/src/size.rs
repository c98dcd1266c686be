// SPDX-License-Identifier: MIT
//
// Console dimensions and resize detection.
//
// The OS only tells us the current size. Whether the window was resized
// since the host last looked is something we track ourselves: the console
// keeps one last-known size and every query compares against it.

/// Console dimensions in character cells, plus a resize flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConsoleSize {
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// Whether these dimensions differ from the previous query's.
    pub changed: bool,
}

/// The single last-known size retained per activation.
///
/// Starts zero-valued, so the first observation of a real terminal always
/// reports `changed = true`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeTracker {
    known: ConsoleSize,
}

impl SizeTracker {
    /// A tracker that has not seen any size yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            known: ConsoleSize {
                width: 0,
                height: 0,
                changed: false,
            },
        }
    }

    /// Record freshly queried dimensions and return the resulting snapshot.
    pub fn observe(&mut self, width: usize, height: usize) -> ConsoleSize {
        let changed = width != self.known.width || height != self.known.height;
        if changed {
            tracing::trace!(
                from_width = self.known.width,
                from_height = self.known.height,
                width,
                height,
                "console resized"
            );
            self.known.width = width;
            self.known.height = height;
        }
        self.known.changed = changed;
        self.known
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_observation_is_a_change() {
        let mut t = SizeTracker::new();
        let s = t.observe(80, 24);
        assert!(s.changed);
        assert_eq!((s.width, s.height), (80, 24));
    }

    #[test]
    fn first_observation_of_zero_is_not_a_change() {
        let mut t = SizeTracker::new();
        assert!(!t.observe(0, 0).changed);
    }

    #[test]
    fn same_size_twice_is_unchanged() {
        let mut t = SizeTracker::new();
        t.observe(80, 24);
        let s = t.observe(80, 24);
        assert!(!s.changed);
        assert_eq!((s.width, s.height), (80, 24));
    }

    #[test]
    fn width_change_detected() {
        let mut t = SizeTracker::new();
        t.observe(80, 24);
        let s = t.observe(100, 24);
        assert!(s.changed);
        assert_eq!(s.width, 100);
    }

    #[test]
    fn height_change_detected() {
        let mut t = SizeTracker::new();
        t.observe(80, 24);
        let s = t.observe(80, 50);
        assert!(s.changed);
        assert_eq!(s.height, 50);
    }

    #[test]
    fn changed_flag_clears_after_settling() {
        let mut t = SizeTracker::new();
        t.observe(80, 24);
        t.observe(120, 40);
        let s = t.observe(120, 40);
        assert!(!s.changed);
        assert_eq!((s.width, s.height), (120, 40));
    }
}
