//! Bump storage backing a workspace arena.
//!
//! A [`Segment`] is a contiguous `Vec<f32>` with bump allocation.
//! A [`SegmentList`] is a collection of segments that overflow into new
//! segments according to the workspace's growth and over-allocation policy.

use strata_core::{GrowthPolicy, WorkspaceConfig};

use crate::error::ArenaError;

const F32_BYTES: usize = std::mem::size_of::<f32>();

/// One fixed-capacity `f32` buffer handed out front to back.
///
/// Segments are never freed while their arena lives, only reset.
pub struct Segment {
    /// Sized once at creation; never reallocated.
    data: Vec<f32>,
    /// Elements handed out so far.
    cursor: usize,
}

impl Segment {
    /// Create a new zero-filled segment with the given capacity (in f32 elements).
    pub fn new(capacity: u32) -> Self {
        Self {
            data: vec![0.0; capacity as usize],
            cursor: 0,
        }
    }

    /// Reserve `len` elements at the cursor.
    ///
    /// Returns the starting offset, or `None` if there is insufficient
    /// remaining capacity. With `zero` set the region is zero-filled;
    /// otherwise it keeps whatever a previous cycle left there.
    pub fn alloc(&mut self, len: u32, zero: bool) -> Option<u32> {
        let start = self.cursor;
        let end = start.checked_add(len as usize)?;
        let region = self.data.get_mut(start..end)?;
        if zero {
            region.fill(0.0);
        }
        self.cursor = end;
        u32::try_from(start).ok()
    }

    /// View of `len` elements starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset + len` exceeds the segment's capacity.
    pub fn slice(&self, offset: u32, len: u32) -> &[f32] {
        &self.data[offset as usize..][..len as usize]
    }

    /// Mutable view of `len` elements starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset + len` exceeds the segment's capacity.
    pub fn slice_mut(&mut self, offset: u32, len: u32) -> &mut [f32] {
        &mut self.data[offset as usize..][..len as usize]
    }

    /// Rewind the cursor. Contents are left as they are.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Elements handed out since the last reset.
    pub fn used(&self) -> usize {
        self.cursor
    }

    /// Capacity in elements.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Elements still available.
    pub fn remaining(&self) -> usize {
        self.capacity() - self.cursor
    }
}

/// The segments of one arena, filled front to back.
///
/// Allocations never span segment boundaries. When no existing segment can
/// hold a request, a new one is appended if the policy allows it; its size
/// comes from [`WorkspaceConfig::growth_segment_elements`], clamped to the
/// remaining `max_size_bytes` budget.
pub struct SegmentList {
    segments: Vec<Segment>,
    growth: GrowthPolicy,
    max_elements: Option<usize>,
    config: WorkspaceConfig,
    /// Segment that receives the next allocation attempt.
    current: usize,
}

impl SegmentList {
    /// Create a segment list for `config`, pre-allocating the initial segment.
    ///
    /// A zero `initial_size_bytes` starts with no segments at all.
    pub fn new(config: &WorkspaceConfig) -> Self {
        let initial = clamp_u32(config.initial_elements());
        let mut segments = Vec::new();
        if initial > 0 {
            segments.push(Segment::new(initial));
        }
        Self {
            segments,
            growth: config.growth,
            max_elements: config.max_elements(),
            config: config.clone(),
            current: 0,
        }
    }

    /// Bump-allocate `len` f32 elements, growing into a new segment if allowed.
    ///
    /// Returns `(segment_index, offset)` on success, or
    /// `Err(ArenaError::CapacityExceeded)` when the policy forbids growth or
    /// the capacity cap would be exceeded.
    pub fn alloc(&mut self, len: u32, zero: bool) -> Result<(u16, u32), ArenaError> {
        if len == 0 {
            // Zero-length buffers occupy no storage.
            return Ok((self.current as u16, 0));
        }

        // Try the current segment, then any later segment kept from a prior cycle.
        for index in self.current..self.segments.len() {
            if let Some(offset) = self.segments[index].alloc(len, zero) {
                self.current = index;
                return Ok((index as u16, offset));
            }
        }

        let exceeded = ArenaError::CapacityExceeded {
            requested: len as usize * F32_BYTES,
            capacity: self.capacity_bytes(),
        };
        if self.growth == GrowthPolicy::Fail || self.segments.len() >= u16::MAX as usize {
            return Err(exceeded);
        }

        let mut seg_len = self.config.growth_segment_elements(len as usize);
        if let Some(max) = self.max_elements {
            let budget = max.saturating_sub(self.capacity_elements());
            seg_len = seg_len.min(budget);
        }
        let seg_len = clamp_u32(seg_len);
        if seg_len < len {
            return Err(exceeded);
        }

        let mut seg = Segment::new(seg_len);
        // A fresh segment is already zeroed.
        let offset = seg.alloc(len, false).ok_or(exceeded)?;
        self.segments.push(seg);
        self.current = self.segments.len() - 1;
        Ok((self.current as u16, offset))
    }

    /// View of a buffer returned by [`SegmentList::alloc`].
    pub fn slice(&self, segment_index: u16, offset: u32, len: u32) -> &[f32] {
        if len == 0 {
            return &[];
        }
        self.segments[segment_index as usize].slice(offset, len)
    }

    /// Mutable view of a buffer returned by [`SegmentList::alloc`].
    pub fn slice_mut(&mut self, segment_index: u16, offset: u32, len: u32) -> &mut [f32] {
        if len == 0 {
            return &mut [];
        }
        self.segments[segment_index as usize].slice_mut(offset, len)
    }

    /// Rewind every segment, keeping its storage.
    ///
    /// Allocation restarts at the first segment.
    pub fn reset(&mut self) {
        self.segments.iter_mut().for_each(Segment::reset);
        self.current = 0;
    }

    /// Number of segments.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Elements handed out across all segments.
    pub fn total_used(&self) -> usize {
        self.segments.iter().map(Segment::used).sum()
    }

    /// Total capacity across all segments in bytes.
    pub fn capacity_bytes(&self) -> usize {
        self.capacity_elements() * F32_BYTES
    }

    fn capacity_elements(&self) -> usize {
        self.segments.iter().map(Segment::capacity).sum()
    }
}

fn clamp_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
