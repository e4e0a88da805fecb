//! Hash functions for the IBLT
//!
//! Two independent families are used:
//! - MurmurHash3 x64-128, salted per hash index, maps a key to its cells.
//! - SipHash-2-4, keyed from the table seed, produces the 64-bit key checksum
//!   that tells a pure cell apart from a superposition of several keys.

use std::hash::Hasher;
use std::io::Cursor;

use siphasher::sip::SipHasher24;

/// Odd multiplier used to spread the per-index salt across the seed bits.
const SALT_MULTIPLIER: u32 = 0x9E37_79B1;

/// Second SipHash key half, fixed so the checksum is a pure function of the seed.
const CHECK_KEY: u64 = 0x6962_6c74_5f63_6b73;

/// Hash a key with MurmurHash3 using a per-function salt and the table seed
///
/// Each salt yields an independent function for the same seed.
pub fn murmur_hash(key: &[u8], salt: u32, seed: u32) -> u64 {
    let combined_seed = seed ^ salt.wrapping_add(1).wrapping_mul(SALT_MULTIPLIER);
    let mut cursor = Cursor::new(key);

    // Reading from an in-memory cursor cannot fail
    let hash = murmur3::murmur3_x64_128(&mut cursor, combined_seed).unwrap_or(0);
    hash as u64
}

/// Compute the `hash_count` cell indices for a key
///
/// Index `i` is `murmur_hash(key, i, seed) mod size`. Duplicate indices are
/// possible and intentionally left in place.
pub fn compute_cell_indices(key: &[u8], hash_count: usize, size: usize, seed: u32) -> Vec<usize> {
    (0..hash_count)
        .map(|i| (murmur_hash(key, i as u32, seed) % size as u64) as usize)
        .collect()
}

/// Checksum of a key, XOR-accumulated into `Cell::key_check`
pub fn hash_check(key: &[u8], seed: u32) -> u64 {
    let mut hasher = SipHasher24::new_with_keys(u64::from(seed), CHECK_KEY);
    hasher.write(key);
    hasher.finish()
}
