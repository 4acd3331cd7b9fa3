use crate::constants::INPUT_BUFFER_CAPACITY;

/// Fixed-capacity arena holding the frame currently being assembled.
///
/// Bytes are written at the cursor and the cursor advances afterwards. The
/// arena is allocated once and never grows; the detector discards its content
/// before the cursor could reach the last slot, so the cursor always stays
/// below `capacity()`.
pub struct InputBuffer {
    buffer: Box<[u8]>,
    pos: usize,
}

impl Default for InputBuffer {
    fn default() -> Self {
        Self::with_capacity(INPUT_BUFFER_CAPACITY)
    }
}

impl InputBuffer {
    /// # Panics
    ///
    /// Panics if `capacity` is below 2, such an arena could not hold a single byte.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity >= 2, "input buffer needs at least 2 bytes");
        Self {
            buffer: vec![0; capacity].into_boxed_slice(),
            pos: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Current cursor, which is also the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == 0
    }

    /// Returns true if writing at the cursor would run into the last slot of
    /// the arena.
    pub fn is_full(&self) -> bool {
        self.pos + 1 >= self.buffer.len()
    }

    /// Writes `byte` at the cursor and advances it.
    ///
    /// Returns `false`, leaving the arena untouched, when the arena is full.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.is_full() {
            return false;
        }
        self.buffer[self.pos] = byte;
        self.pos += 1;
        true
    }

    /// Rewinds the cursor. Old content is not zeroed, it is simply overwritten
    /// by the next frame.
    pub fn clear(&mut self) {
        self.pos = 0;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer[..self.pos]
    }
}

impl core::ops::Index<usize> for InputBuffer {
    type Output = u8;

    fn index(&self, index: usize) -> &Self::Output {
        if index >= self.pos {
            panic!("Index {} is outside of our length {}", index, self.pos);
        }
        &self.buffer[index]
    }
}

impl core::ops::Index<core::ops::Range<usize>> for InputBuffer {
    type Output = [u8];

    fn index(&self, index: core::ops::Range<usize>) -> &Self::Output {
        if index.end > self.pos {
            panic!("Index {} is outside of our length {}", index.end, self.pos);
        }
        &self.buffer[index]
    }
}
