//! IBLT cell and its XOR accumulators
//!
//! Keys and values have variable length, so each one is XORed in as a frame:
//! a little-endian `u32` length followed by the bytes. Shorter frames are
//! zero-extended. A buffer holding exactly one frame decodes back to the
//! original bytes; anything else either fails to decode or fails the
//! key checksum.

/// Width of the length prefix in a frame.
const LEN_PREFIX: usize = 4;

/// Length prefix for a frame of `len` bytes.
///
/// # Panics
/// Panics if `len` does not fit in the `u32` prefix.
fn frame_prefix(len: usize) -> [u8; LEN_PREFIX] {
    match u32::try_from(len) {
        Ok(len) => len.to_le_bytes(),
        Err(_) => panic!("frame of {} bytes exceeds the u32 length prefix", len),
    }
}

/// Growable XOR accumulator over length-prefixed frames
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct XorSum {
    bytes: Vec<u8>,
}

impl XorSum {
    /// XOR one framed byte string into the accumulator.
    ///
    /// Self-inverse: toggling the same bytes twice restores the prior state
    /// (up to trailing zero padding, which `is_zero`/`decode` ignore).
    ///
    /// # Panics
    /// Panics if `data` is longer than `u32::MAX` bytes.
    pub fn toggle(&mut self, data: &[u8]) {
        let len = frame_prefix(data.len());
        let frame_len = LEN_PREFIX + data.len();
        if self.bytes.len() < frame_len {
            self.bytes.resize(frame_len, 0);
        }

        for (acc, b) in self.bytes.iter_mut().zip(len.iter().chain(data.iter())) {
            *acc ^= *b;
        }
    }

    /// True if no frame is currently superposed here.
    pub fn is_zero(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }

    /// Decode the accumulator as a single frame.
    ///
    /// Returns `None` if the length prefix points past the buffer or any byte
    /// past the declared frame is non-zero.
    pub fn decode(&self) -> Option<Vec<u8>> {
        let mut prefix = [0u8; LEN_PREFIX];
        for (dst, src) in prefix.iter_mut().zip(self.bytes.iter()) {
            *dst = *src;
        }
        let len = u32::from_le_bytes(prefix) as usize;

        let end = LEN_PREFIX.checked_add(len)?;
        if len > 0 && end > self.bytes.len() {
            return None;
        }
        if self.bytes.iter().skip(end).any(|&b| b != 0) {
            return None;
        }

        Some(
            self.bytes
                .get(LEN_PREFIX..end)
                .map(<[u8]>::to_vec)
                .unwrap_or_default(),
        )
    }

    /// XOR another accumulator into this one.
    pub fn merge_xor(&mut self, other: &XorSum) {
        if self.bytes.len() < other.bytes.len() {
            self.bytes.resize(other.bytes.len(), 0);
        }
        for (acc, b) in self.bytes.iter_mut().zip(other.bytes.iter()) {
            *acc ^= *b;
        }
    }

    fn normalized(&self) -> &[u8] {
        let end = self
            .bytes
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |pos| pos + 1);
        &self.bytes[..end]
    }

    /// Equality ignoring trailing zero padding.
    pub fn same_content(&self, other: &XorSum) -> bool {
        self.normalized() == other.normalized()
    }
}

/// One slot of the table
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cell {
    /// Net insertions minus deletions mapped to this cell
    pub count: i64,
    /// XOR of all key frames
    pub key_sum: XorSum,
    /// XOR of all value frames
    pub value_sum: XorSum,
    /// XOR of all key checksums
    pub key_check: u64,
}

impl Cell {
    /// Add (`sign = 1`) or remove (`sign = -1`) one pair's contribution.
    pub fn apply(&mut self, key: &[u8], value: &[u8], check: u64, sign: i64) {
        self.count = self.count.wrapping_add(sign);
        self.key_sum.toggle(key);
        self.value_sum.toggle(value);
        self.key_check ^= check;
    }

    /// Cell-wise difference, used by `Iblt::subtract`.
    pub fn subtract(&mut self, other: &Cell) {
        self.count = self.count.wrapping_sub(other.count);
        self.key_sum.merge_xor(&other.key_sum);
        self.value_sum.merge_xor(&other.value_sum);
        self.key_check ^= other.key_check;
    }

    /// True if nothing is accumulated here.
    pub fn is_empty(&self) -> bool {
        self.count == 0 && self.key_check == 0 && self.key_sum.is_zero() && self.value_sum.is_zero()
    }

    /// Same logical state as `other`, ignoring accumulator padding.
    pub fn same_state(&self, other: &Cell) -> bool {
        self.count == other.count
            && self.key_check == other.key_check
            && self.key_sum.same_content(&other.key_sum)
            && self.value_sum.same_content(&other.value_sum)
    }

    /// Decode the pair held by a pure cell.
    ///
    /// `check` hashes a candidate key; the cell is pure only when its count
    /// is +1 or -1 and the recomputed checksum matches `key_check`.
    pub fn pure_pair<F>(&self, check: F) -> Option<(Vec<u8>, Vec<u8>)>
    where
        F: Fn(&[u8]) -> u64,
    {
        if self.count != 1 && self.count != -1 {
            return None;
        }
        let key = self.key_sum.decode()?;
        if check(&key) != self.key_check {
            return None;
        }
        let value = self.value_sum.decode()?;
        Some((key, value))
    }
}
