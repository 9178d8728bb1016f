//! Growing cursors: bit cursors that own their buffer and reallocate on
//! demand.
//!
//! Both variants share the min-reserve policy: the caller declares how many
//! bytes the next write burst may need, calls `validate` before the burst,
//! and the buffer is grown when the remaining headroom is too small. This
//! keeps the per-write hot path free of capacity checks.
//!
//! - [`ResizeCursor`]: fixed reserve declared at construction; call
//!   [`ResizeCursor::validate`] before each burst.
//! - [`InfiniteCursor`]: per-call reservation, plus [`InfiniteCursor::compact`]
//!   to give memory back and [`InfiniteCursor::write_to_stream`] to drain the
//!   filled region into any `io::Write`.
//!
//! Reallocation goes through `Vec::try_reserve_exact`, so allocator failure
//! surfaces as [`Error::Alloc`](crate::error::Error::Alloc) instead of
//! aborting; the buffer is never left partially grown.

use crate::bitio::BitCursor;
use crate::error::Result;
use std::io::Write;
use std::ops::{Deref, DerefMut};

/// A growing cursor with a fixed minimum reserve.
///
/// Dereferences to [`BitCursor`], so all cursor operations are available
/// directly.
pub struct ResizeCursor {
    inner: BitCursor<Vec<u8>>,
    min_reserve: usize,
}

impl ResizeCursor {
    /// Creates a cursor that keeps at least `min_reserve` bytes of headroom
    /// after every `validate`. An `initial_size` of 0 allocates
    /// `2 * min_reserve` bytes up front.
    pub fn new(min_reserve: usize, initial_size: usize) -> Self {
        let size = if initial_size == 0 {
            min_reserve * 2
        } else {
            initial_size
        };
        Self {
            inner: BitCursor::new(vec![0u8; size]),
            min_reserve,
        }
    }

    /// Ensures at least `min_reserve` bytes of headroom past the current
    /// position, growing the buffer to `position + 2 * min_reserve` when
    /// short. Must be called before each write burst.
    pub fn validate(&mut self) -> Result<()> {
        if self.inner.position() + self.min_reserve > self.inner.stream_size() {
            let new_size = self.inner.position() + self.min_reserve * 2;
            self.inner.resize_buffer(new_size)?;
        }
        Ok(())
    }

    /// Consumes the cursor and returns the owned buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.inner.into_bytes()
    }
}

impl Deref for ResizeCursor {
    type Target = BitCursor<Vec<u8>>;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for ResizeCursor {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

/// A growing cursor with a per-call reservation, for streams of unbounded
/// length that are later drained to an `io::Write`.
pub struct InfiniteCursor {
    inner: BitCursor<Vec<u8>>,
    min_reserve: usize,
}

impl InfiniteCursor {
    /// Creates a cursor with `2 * min_reserve` bytes allocated up front.
    pub fn new(min_reserve: usize) -> Self {
        Self {
            inner: BitCursor::new(vec![0u8; min_reserve * 2]),
            min_reserve,
        }
    }

    /// Ensures room for `upcoming_bytes` plus the standing reserve, growing
    /// the buffer to exactly `position + upcoming_bytes + min_reserve` when
    /// short.
    pub fn validate(&mut self, upcoming_bytes: usize) -> Result<()> {
        let needed = self.inner.position() + upcoming_bytes + self.min_reserve;
        if needed > self.inner.stream_size() {
            self.inner.resize_buffer(needed)?;
        }
        Ok(())
    }

    /// Shrinks the buffer to `position + 2 * min_reserve` bytes, releasing
    /// slack left behind by a large burst. Written data is preserved.
    pub fn compact(&mut self) -> Result<()> {
        let target = self.inner.position() + self.min_reserve * 2;
        self.inner.resize_buffer(target)
    }

    /// Rewinds to the beginning for reuse.
    pub fn reset(&mut self) {
        self.inner.set_position(0);
    }

    /// Writes exactly `position()` bytes from the start of the buffer into
    /// `sink`. A partially-filled trailing byte is included.
    pub fn write_to_stream<W: Write>(&self, sink: &mut W) -> Result<()> {
        sink.write_all(&self.inner.buffer()[..self.inner.position()])?;
        Ok(())
    }
}

impl Deref for InfiniteCursor {
    type Target = BitCursor<Vec<u8>>;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for InfiniteCursor {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}
