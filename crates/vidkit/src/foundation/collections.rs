//! Specialized collection and handle types

use serde::{Deserialize, Serialize};
use std::fmt;

pub use slotmap::{SecondaryMap, SlotMap};

slotmap::new_key_type! {
    /// Stable handle for a window in the window arena
    ///
    /// Handles are never reused for a different window: a destroyed window's
    /// handle simply stops resolving.
    pub struct WindowId;
}

/// Handle-based map using slot map for stable references
pub type HandleMap<K, T> = SlotMap<K, T>;

/// Opaque display identity, stable for the lifetime of the display
///
/// Zero is never handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DisplayId(u32);

impl DisplayId {
    /// Raw numeric value of the id
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic allocator for object identities
///
/// Wraps past `u32::MAX` back to 1; zero is reserved.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    /// Create a new allocator starting at 1
    pub fn new() -> Self {
        Self { next: 1 }
    }

    fn next_raw(&mut self) -> u32 {
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        if self.next == 0 {
            self.next = 1;
        }
        id
    }

    /// Allocate a fresh display identity
    pub fn next_display(&mut self) -> DisplayId {
        DisplayId(self.next_raw())
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator_skips_zero() {
        let mut ids = IdAllocator { next: u32::MAX };
        assert_eq!(ids.next_display().get(), u32::MAX);
        assert_eq!(ids.next_display().get(), 1);
    }
}
