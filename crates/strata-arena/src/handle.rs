//! Buffer handles.
//!
//! A [`BufferHandle`] encodes the physical location of an array's data
//! within an arena. It is generation-scoped: the `generation` field allows
//! O(1) staleness checks after the arena has been reset.

use std::fmt;

/// Physical location of one allocation within an arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct BufferHandle {
    /// Generation of the arena at allocation time.
    pub(crate) generation: u32,
    /// Index into the arena's segment list.
    pub(crate) segment: u16,
    /// Element offset within the segment.
    pub(crate) offset: u32,
    /// Element count.
    pub(crate) len: u32,
}

impl BufferHandle {
    pub(crate) fn new(generation: u32, segment: u16, offset: u32, len: u32) -> Self {
        Self {
            generation,
            segment,
            offset,
            len,
        }
    }

    /// Generation of the arena when this buffer was handed out.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Number of `f32` elements in the buffer.
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Whether the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Display for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BufferHandle(gen={}, seg={}, off={}, len={})",
            self.generation, self.segment, self.offset, self.len
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors() {
        let h = BufferHandle::new(7, 3, 1024, 256);
        assert_eq!(h.generation(), 7);
        assert_eq!(h.len(), 256);
        assert!(!h.is_empty());
        assert!(BufferHandle::new(0, 0, 0, 0).is_empty());
    }

    #[test]
    fn display_lists_location() {
        let h = BufferHandle::new(1, 2, 3, 4);
        assert_eq!(h.to_string(), "BufferHandle(gen=1, seg=2, off=3, len=4)");
    }
}
