// SPDX-License-Identifier: MIT
//
// Console configuration.

use crate::frame::{DEFAULT_CAPACITY, DEFAULT_GROWTH_STEP};

/// Frame buffer sizing for a [`Console`](crate::Console).
///
/// # Examples
///
/// ```
/// use conkit::ConsoleConfig;
///
/// let config = ConsoleConfig::default()
///     .with_initial_capacity(16_384)
///     .with_growth_step(4096);
/// assert_eq!(config.initial_capacity, 16_384);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Frame capacity allocated at start. Clamped to at least 1.
    pub initial_capacity: usize,
    /// Bytes added per growth step when a frame outgrows its capacity.
    /// Clamped to at least 1.
    pub growth_step: usize,
}

impl ConsoleConfig {
    /// Set the initial frame capacity.
    #[must_use]
    pub const fn with_initial_capacity(mut self, bytes: usize) -> Self {
        self.initial_capacity = bytes;
        self
    }

    /// Set the growth step.
    #[must_use]
    pub const fn with_growth_step(mut self, bytes: usize) -> Self {
        self.growth_step = bytes;
        self
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_CAPACITY,
            growth_step: DEFAULT_GROWTH_STEP,
        }
    }
}
