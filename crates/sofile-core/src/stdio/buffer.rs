//! Single-buffer engine state.
//!
//! One fixed-size buffer per stream, serving either as a read-ahead cache or
//! as a write-coalescing cache depending on the active [`IoMode`]. This type
//! owns the cursor bookkeeping and the logical-offset arithmetic; the stream
//! decides when to refill or drain and talks to the descriptor.
//!
//! Invariants:
//! - Idle: `cursor == 0`, `valid_len == 0`.
//! - Reading: `cursor <= valid_len <= BUFSIZ`; `data[cursor..valid_len]`
//!   are fetched but not yet consumed.
//! - Writing: `valid_len == BUFSIZ`; `data[..cursor]` are dirty.

/// Buffer capacity in bytes.
pub const BUFSIZ: usize = 4096;

/// Which buffering discipline is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum IoMode {
    /// No I/O since open (or since the buffer was last emptied by a switch).
    #[default]
    Idle,
    /// Buffer holds read-ahead.
    Reading,
    /// Buffer holds dirty bytes.
    Writing,
}

/// Cursor and mode bookkeeping over a fixed inline byte array.
#[derive(Debug)]
pub struct StreamBuffer {
    data: [u8; BUFSIZ],
    cursor: usize,
    valid_len: usize,
    mode: IoMode,
}

impl Default for StreamBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamBuffer {
    /// An empty, idle buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: [0u8; BUFSIZ],
            cursor: 0,
            valid_len: 0,
            mode: IoMode::Idle,
        }
    }

    /// Active mode.
    #[must_use]
    pub fn mode(&self) -> IoMode {
        self.mode
    }

    /// Buffer capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        BUFSIZ
    }

    /// Next index to read from (Reading) or write to (Writing).
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Bytes fetched by the last refill (Reading) or the capacity (Writing).
    #[must_use]
    pub fn valid_len(&self) -> usize {
        self.valid_len
    }

    // -----------------------------------------------------------------------
    // Mode transitions
    // -----------------------------------------------------------------------

    /// Switch to Reading with an empty buffer. The caller must have drained
    /// any dirty bytes first.
    pub fn enter_reading(&mut self) {
        debug_assert!(self.mode != IoMode::Writing || self.cursor == 0);
        self.mode = IoMode::Reading;
        self.cursor = 0;
        self.valid_len = 0;
    }

    /// Switch to Writing with an empty buffer. The caller must have
    /// reconciled any unread read-ahead with the descriptor first.
    pub fn enter_writing(&mut self) {
        self.mode = IoMode::Writing;
        self.cursor = 0;
        self.valid_len = BUFSIZ;
    }

    // -----------------------------------------------------------------------
    // Read side
    // -----------------------------------------------------------------------

    /// Consume the next buffered byte, if any.
    pub fn take_byte(&mut self) -> Option<u8> {
        if self.mode != IoMode::Reading || self.cursor >= self.valid_len {
            return None;
        }
        let byte = self.data[self.cursor];
        self.cursor += 1;
        Some(byte)
    }

    /// Bytes fetched from the descriptor but not yet consumed.
    #[must_use]
    pub fn unread(&self) -> usize {
        match self.mode {
            IoMode::Reading => self.valid_len - self.cursor,
            _ => 0,
        }
    }

    /// Whole buffer, as the destination of a refill read.
    pub fn refill_target(&mut self) -> &mut [u8] {
        &mut self.data[..]
    }

    /// Record the outcome of a refill: `n` valid bytes at the front.
    pub fn filled(&mut self, n: usize) {
        self.valid_len = n.min(BUFSIZ);
        self.cursor = 0;
    }

    /// Treat the buffer as empty without touching the descriptor.
    pub fn discard_read_ahead(&mut self) {
        self.cursor = 0;
        self.valid_len = 0;
    }

    // -----------------------------------------------------------------------
    // Write side
    // -----------------------------------------------------------------------

    /// True when no more bytes fit before a drain.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.mode == IoMode::Writing && self.cursor == BUFSIZ
    }

    /// Append one dirty byte. Returns `false` if the buffer is full or not
    /// in Writing mode.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.mode != IoMode::Writing || self.cursor == BUFSIZ {
            return false;
        }
        self.data[self.cursor] = byte;
        self.cursor += 1;
        true
    }

    /// Dirty bytes awaiting a drain.
    #[must_use]
    pub fn pending_write_data(&self) -> &[u8] {
        match self.mode {
            IoMode::Writing => &self.data[..self.cursor],
            _ => &[],
        }
    }

    /// Forget the dirty bytes after a drain (successful or abandoned) and
    /// zero the storage so no stale byte survives a mode switch.
    pub fn mark_flushed(&mut self) {
        self.data.fill(0);
        self.cursor = 0;
    }

    // -----------------------------------------------------------------------
    // Offsets
    // -----------------------------------------------------------------------

    /// Logical stream offset given the descriptor's physical position.
    ///
    /// Reading: the buffer's logical start lies `valid_len` bytes behind the
    /// descriptor, and `cursor` of them are consumed. Writing: dirty bytes
    /// sit ahead of the descriptor.
    #[must_use]
    pub fn logical_offset(&self, physical: i64) -> i64 {
        match self.mode {
            IoMode::Idle => physical,
            IoMode::Reading => physical - self.valid_len as i64 + self.cursor as i64,
            IoMode::Writing => physical + self.cursor as i64,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
