//! Core IBLT implementation
//!
//! INVARIANTS:
//! - INVARIANT-1: A present pair contributes exactly `hash_count` to the
//!   counts of its mapped cells; insert followed by delete of the same pair
//!   restores every mapped cell.
//! - INVARIANT-2: No false positives. `get` only returns a value read from a
//!   cell whose count is 1, whose checksum matches the queried key and whose
//!   key accumulator decodes to that key.
//! - INVARIANT-3: `list_all` never reports a partial decode as complete.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, trace, warn};

use super::cell::Cell;
use super::config::IbltConfig;
use super::hash_functions::{compute_cell_indices, hash_check};
use super::listing::Listing;
use super::parameters::{load_factor, within_threshold};
use crate::error::IbltError;
use crate::metrics::{MetricsRecorder, NoOpMetrics};

/// Invertible Bloom Lookup Table
///
/// Stores key-value pairs across a fixed array of cells. Point lookups may
/// miss a present key when all of its cells are shared with other keys, but
/// never return a wrong value. Below the load threshold the full content can
/// be listed.
///
/// Keys must be distinct and only inserted pairs may be deleted. Neither
/// precondition is checked: the table does not store pairs, only their
/// accumulated effect.
///
/// The table is single-owner. Sharing it across threads requires external
/// locking around each whole operation.
#[derive(Clone)]
pub struct Iblt {
    cells: Vec<Cell>,
    hash_count: usize,
    seed: u32,
    metrics: Arc<dyn MetricsRecorder>,
}

impl Iblt {
    /// Create a table with `size` zeroed cells
    ///
    /// # Errors
    /// `InvalidConfig` if `size` or `hash_count` is zero.
    pub fn new(size: usize, hash_count: usize, seed: u32) -> Result<Self, IbltError> {
        Self::from_config(&IbltConfig {
            size,
            hash_count,
            seed,
        })
    }

    /// Create a table from a settings record
    pub fn from_config(config: &IbltConfig) -> Result<Self, IbltError> {
        config.validate()?;

        debug!(
            size = config.size,
            hash_count = config.hash_count,
            seed = config.seed,
            "Created IBLT"
        );

        Ok(Self {
            cells: vec![Cell::default(); config.size],
            hash_count: config.hash_count,
            seed: config.seed,
            metrics: Arc::new(NoOpMetrics),
        })
    }

    /// Attach a metrics recorder; the table's creation is recorded on it
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        metrics.record_table_created(self.cells.len(), self.hash_count);
        self.metrics = metrics;
        self
    }

    /// Insert a key-value pair
    ///
    /// Always succeeds; overload only shows up later as reduced decodability.
    ///
    /// # Panics
    /// Panics if `key` or `value` is `u32::MAX` bytes or longer.
    pub fn insert(&mut self, key: &[u8], value: &[u8]) {
        self.apply(key, value, 1);
        self.metrics.record_insert();
        trace!(key_len = key.len(), value_len = value.len(), "IBLT insert");
    }

    /// Delete a previously inserted key-value pair
    ///
    /// Deleting a pair that is not present silently corrupts its cells.
    ///
    /// # Panics
    /// Panics if `key` or `value` is `u32::MAX` bytes or longer.
    pub fn delete(&mut self, key: &[u8], value: &[u8]) {
        self.apply(key, value, -1);
        self.metrics.record_delete();
        trace!(key_len = key.len(), value_len = value.len(), "IBLT delete");
    }

    fn apply(&mut self, key: &[u8], value: &[u8], sign: i64) {
        let check = hash_check(key, self.seed);
        for idx in self.cell_indices(key) {
            self.cells[idx].apply(key, value, check, sign);
        }
    }

    /// Look up the value for `key`
    ///
    /// Returns `None` if the key is absent or if none of its cells is pure.
    /// A returned value is always correct (INVARIANT-2).
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        let start = Instant::now();
        let found = self.lookup(key);
        self.metrics.record_lookup(start.elapsed(), found.is_some());
        found
    }

    fn lookup(&self, key: &[u8]) -> Option<Vec<u8>> {
        let indices = self.cell_indices(key);

        if indices.iter().any(|&idx| self.cells[idx].count == 0) {
            return None;
        }

        let check = hash_check(key, self.seed);
        indices.iter().find_map(|&idx| {
            let cell = &self.cells[idx];
            if cell.count != 1 || cell.key_check != check {
                return None;
            }
            if cell.key_sum.decode().as_deref() != Some(key) {
                return None;
            }
            cell.value_sum.decode()
        })
    }

    /// Decode the full content by peeling pure cells
    ///
    /// Works on a scratch copy; the table is left untouched. Output order
    /// is unspecified.
    pub fn list_all(&self) -> Listing {
        let start = Instant::now();
        let mut cells = self.cells.clone();
        let mut listing = Listing::default();

        let mut queue: VecDeque<usize> = cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| matches!(cell.count, 1 | -1))
            .map(|(idx, _)| idx)
            .collect();

        // A genuine peel empties the popped cell for good, so at most `size` succeed
        let mut peels_left = cells.len();

        while let Some(idx) = queue.pop_front() {
            if peels_left == 0 {
                break;
            }

            let Some((key, value)) = cells[idx].pure_pair(|k| hash_check(k, self.seed)) else {
                continue;
            };
            let indices = self.cell_indices(&key);
            if indices.iter().filter(|&&j| j == idx).count() != 1 {
                // Checksum collision, or a duplicate index whose XOR contribution cancelled
                continue;
            }

            let sign = cells[idx].count;
            let check = hash_check(&key, self.seed);
            for &j in &indices {
                cells[j].apply(&key, &value, check, -sign);
                if matches!(cells[j].count, 1 | -1) {
                    queue.push_back(j);
                }
            }
            peels_left -= 1;

            if sign == 1 {
                listing.entries.push((key, value));
            } else {
                listing.residue.push((key, value));
            }
        }

        listing.undecoded_cells = cells.iter().filter(|cell| !cell.is_empty()).count();
        listing.complete = listing.undecoded_cells == 0;

        if listing.complete {
            debug!(
                entries = listing.entries.len(),
                residue = listing.residue.len(),
                "IBLT decoded completely"
            );
        } else {
            warn!(
                entries = listing.entries.len(),
                undecoded_cells = listing.undecoded_cells,
                size = self.cells.len(),
                hash_count = self.hash_count,
                within_threshold = within_threshold(
                    self.net_count().max(0) as usize,
                    self.cells.len(),
                    self.hash_count
                ),
                "IBLT decode incomplete"
            );
        }

        self.metrics
            .record_decode(start.elapsed(), listing.entries.len(), listing.complete);
        listing
    }

    /// Human-readable listing, `{key=>value, ...}`
    ///
    /// Partial decodes end with `...` inside the braces.
    pub fn render(&self) -> String {
        self.list_all().to_string()
    }

    /// Cell-wise difference `self - other`
    ///
    /// Listing the result yields pairs only in `self` as `entries` and pairs
    /// only in `other` as `residue`.
    ///
    /// # Errors
    /// `IncompatibleTables` if size, hash count or seed differ.
    pub fn subtract(&self, other: &Iblt) -> Result<Iblt, IbltError> {
        if self.cells.len() != other.cells.len()
            || self.hash_count != other.hash_count
            || self.seed != other.seed
        {
            return Err(IbltError::IncompatibleTables {
                size: self.cells.len(),
                hash_count: self.hash_count,
                seed: self.seed,
                other_size: other.cells.len(),
                other_hash_count: other.hash_count,
                other_seed: other.seed,
            });
        }

        let mut diff = self.clone();
        for (cell, theirs) in diff.cells.iter_mut().zip(other.cells.iter()) {
            cell.subtract(theirs);
        }
        Ok(diff)
    }

    /// Cell indices `key` maps to, in hash-function order
    pub fn cell_indices(&self, key: &[u8]) -> Vec<usize> {
        compute_cell_indices(key, self.hash_count, self.cells.len(), self.seed)
    }

    /// Reset every cell to zero
    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }

    /// Net number of pairs (insertions minus deletions)
    pub fn net_count(&self) -> i64 {
        let total: i64 = self
            .cells
            .iter()
            .fold(0i64, |acc, cell| acc.wrapping_add(cell.count));
        total / self.hash_count as i64
    }

    /// Net pairs per cell
    pub fn load_factor(&self) -> f64 {
        load_factor(self.net_count().max(0) as usize, self.cells.len())
    }

    /// True if every cell is zeroed
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Cell::is_empty)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn size(&self) -> usize {
        self.cells.len()
    }

    pub fn hash_count(&self) -> usize {
        self.hash_count
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn config(&self) -> IbltConfig {
        IbltConfig {
            size: self.cells.len(),
            hash_count: self.hash_count,
            seed: self.seed,
        }
    }
}

impl fmt::Debug for Iblt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iblt")
            .field("size", &self.cells.len())
            .field("hash_count", &self.hash_count)
            .field("seed", &self.seed)
            .field("net_count", &self.net_count())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Iblt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.list_all(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: u32 = 0x5eed;

    fn table() -> Iblt {
        Iblt::new(100, 4, SEED).unwrap()
    }

    fn key(i: usize) -> Vec<u8> {
        format!("key_{:05}", i).into_bytes()
    }

    fn value(i: usize) -> Vec<u8> {
        format!("value_{}", i * 7).into_bytes()
    }

    #[test]
    fn test_new_creates_zeroed_table() {
        let t = table();

        assert_eq!(t.size(), 100);
        assert_eq!(t.hash_count(), 4);
        assert_eq!(t.seed(), SEED);
        assert!(t.is_empty());
        assert!(t.cells().iter().all(|c| *c == Cell::default()));
    }

    #[test]
    fn test_new_rejects_invalid_dimensions() {
        assert!(matches!(Iblt::new(0, 4, 1), Err(IbltError::InvalidConfig { .. })));
        assert!(matches!(Iblt::new(100, 0, 1), Err(IbltError::InvalidConfig { .. })));
    }

    #[test]
    fn test_insert_then_get() {
        let mut t = table();
        t.insert(b"key", b"value");

        assert_eq!(t.get(b"key"), Some(b"value".to_vec()));
    }

    #[test]
    fn test_get_missing_key_on_empty_table() {
        assert_eq!(table().get(b"key"), None);
    }

    #[test]
    fn test_delete_then_get() {
        let mut t = table();
        t.insert(b"key", b"value");
        t.delete(b"key", b"value");

        assert_eq!(t.get(b"key"), None);
        assert!(t.is_empty());
    }

    #[test]
    fn test_insert_updates_hash_count_cells() {
        let mut t = table();
        t.insert(b"key", b"value");

        let total: i64 = t.cells().iter().map(|c| c.count).sum();
        assert_eq!(total, 4, "INVARIANT-1: pair contributes hash_count");
        assert_eq!(t.net_count(), 1);
    }

    #[test]
    fn test_delete_restores_exact_cell_state() {
        let mut t = table();
        for i in 0..20 {
            t.insert(&key(i), &value(i));
        }
        let before = t.cells().to_vec();

        t.insert(b"transient", b"pair");
        t.delete(b"transient", b"pair");

        for (now, then) in t.cells().iter().zip(before.iter()) {
            assert!(now.same_state(then), "INVARIANT-1: delete must invert insert");
        }
    }

    #[test]
    fn test_get_never_returns_wrong_value() {
        let mut t = Iblt::new(30, 3, SEED).unwrap();
        for i in 0..60 {
            t.insert(&key(i), &value(i));
        }

        // Heavily overloaded: lookups may miss but never lie
        for i in 0..60 {
            if let Some(v) = t.get(&key(i)) {
                assert_eq!(v, value(i));
            }
        }
        for i in 1000..2000 {
            assert_eq!(t.get(&key(i)), None, "INVARIANT-2: false positive");
        }
    }

    #[test]
    fn test_list_all_empty() {
        let listing = table().list_all();

        assert!(listing.complete);
        assert!(listing.entries.is_empty());
        assert_eq!(table().render(), "{}");
    }

    #[test]
    fn test_list_all_single_entry() {
        let mut t = table();
        t.insert(b"key", b"value");

        let listing = t.list_all();
        assert!(listing.complete);
        assert_eq!(listing.entries, vec![(b"key".to_vec(), b"value".to_vec())]);
        assert_eq!(t.render(), "{key=>value}");
        assert_eq!(t.to_string(), "{key=>value}");
    }

    #[test]
    fn test_list_all_does_not_modify_table() {
        let mut t = table();
        t.insert(b"a", b"1");
        t.insert(b"b", b"2");
        let before = t.cells().to_vec();

        let _ = t.list_all();
        assert_eq!(t.cells(), before.as_slice());
    }

    #[test]
    fn test_list_all_reports_residue_separately() {
        let mut t = table();
        t.insert(b"present", b"yes");
        t.delete(b"ghost", b"never-inserted");

        let listing = t.list_all();
        assert!(listing.complete);
        assert_eq!(listing.entries, vec![(b"present".to_vec(), b"yes".to_vec())]);
        assert_eq!(
            listing.residue,
            vec![(b"ghost".to_vec(), b"never-inserted".to_vec())]
        );
    }

    #[test]
    fn test_list_all_overloaded_is_incomplete() {
        let mut t = Iblt::new(20, 3, SEED).unwrap();
        for i in 0..200 {
            t.insert(&key(i), &value(i));
        }

        let listing = t.list_all();
        assert!(!listing.complete, "INVARIANT-3: overload must not decode as complete");
        assert!(listing.undecoded_cells > 0);
        assert!(t.render().ends_with("...}"));
        assert!(matches!(
            listing.into_complete(),
            Err(IbltError::IncompleteDecode { .. })
        ));
    }

    #[test]
    fn test_empty_key_and_value() {
        let mut t = table();
        t.insert(b"", b"");

        assert_eq!(t.get(b""), Some(Vec::new()));
        let listing = t.list_all();
        assert!(listing.complete);
        assert_eq!(listing.entries, vec![(Vec::new(), Vec::new())]);
    }

    #[test]
    fn test_binary_keys_with_trailing_zeros() {
        let mut t = table();
        t.insert(b"k\0", b"v\0\0");
        t.insert(b"k", b"v");

        assert_eq!(t.get(b"k\0"), Some(b"v\0\0".to_vec()));
        assert_eq!(t.get(b"k"), Some(b"v".to_vec()));
    }

    #[test]
    fn test_subtract_lists_symmetric_difference() {
        let mut ours = Iblt::new(60, 3, SEED).unwrap();
        let mut theirs = Iblt::new(60, 3, SEED).unwrap();
        for i in 0..100 {
            ours.insert(&key(i), &value(i));
            theirs.insert(&key(i), &value(i));
        }
        ours.insert(b"only_ours", b"1");
        theirs.insert(b"only_theirs", b"2");

        let listing = ours.subtract(&theirs).unwrap().list_all();
        assert!(listing.complete);
        assert_eq!(listing.entries, vec![(b"only_ours".to_vec(), b"1".to_vec())]);
        assert_eq!(listing.residue, vec![(b"only_theirs".to_vec(), b"2".to_vec())]);
    }

    #[test]
    fn test_subtract_rejects_incompatible_tables() {
        let a = Iblt::new(60, 3, SEED).unwrap();

        for b in [
            Iblt::new(61, 3, SEED).unwrap(),
            Iblt::new(60, 4, SEED).unwrap(),
            Iblt::new(60, 3, SEED + 1).unwrap(),
        ] {
            assert!(matches!(
                a.subtract(&b),
                Err(IbltError::IncompatibleTables { .. })
            ));
        }
    }

    #[test]
    fn test_clear() {
        let mut t = table();
        t.insert(b"key", b"value");
        t.clear();

        assert!(t.is_empty());
        assert_eq!(t.get(b"key"), None);
    }

    #[test]
    fn test_identical_construction_identical_indices() {
        let a = Iblt::new(512, 5, 77).unwrap();
        let b = Iblt::new(512, 5, 77).unwrap();

        for i in 0..100 {
            assert_eq!(a.cell_indices(&key(i)), b.cell_indices(&key(i)));
        }
    }

    #[test]
    fn test_debug_output() {
        let rendered = format!("{:?}", table());
        assert!(rendered.contains("size: 100"));
        assert!(rendered.contains("hash_count: 4"));
    }

    #[test]
    fn test_load_factor_tracks_net_entries() {
        let mut t = table();
        assert_eq!(t.load_factor(), 0.0);

        for i in 0..25 {
            t.insert(&key(i), &value(i));
        }
        assert_eq!(t.net_count(), 25);
        assert!((t.load_factor() - 0.25).abs() < f64::EPSILON);

        for i in 0..5 {
            t.delete(&key(i), &value(i));
        }
        assert!((t.load_factor() - 0.20).abs() < f64::EPSILON);

        // More deletes than inserts clamps at zero
        let mut empty = table();
        empty.delete(b"ghost", b"v");
        assert_eq!(empty.load_factor(), 0.0);
    }

    /// Per-cell multiplicities of `key`'s indices, largest first
    fn index_shape(t: &Iblt, key: &[u8]) -> Vec<usize> {
        let mut counts = std::collections::BTreeMap::new();
        for idx in t.cell_indices(key) {
            *counts.entry(idx).or_insert(0usize) += 1;
        }
        let mut shape: Vec<usize> = counts.into_values().collect();
        shape.sort_unstable_by(|a, b| b.cmp(a));
        shape
    }

    fn key_with_shape(t: &Iblt, shape: &[usize]) -> Vec<u8> {
        (0..100_000)
            .map(key)
            .find(|k| index_shape(t, k) == shape)
            .expect("small table yields every index shape")
    }

    fn repeated_index(t: &Iblt, key: &[u8]) -> usize {
        let indices = t.cell_indices(key);
        *indices
            .iter()
            .find(|&&idx| indices.iter().filter(|&&j| j == idx).count() == 2)
            .expect("key has a repeated index")
    }

    #[test]
    fn test_duplicate_index_receives_double_update() {
        let mut t = Iblt::new(16, 4, SEED).unwrap();
        let k = key_with_shape(&t, &[2, 1, 1]);
        let shared = repeated_index(&t, &k);

        t.insert(&k, b"dup");
        assert_eq!(t.cells()[shared].count, 2);
        assert!(t.cells()[shared].key_sum.is_zero(), "XOR of the same key twice cancels");
        assert_eq!(t.net_count(), 1);

        t.delete(&k, b"dup");
        assert!(t.is_empty());
    }

    #[test]
    fn test_duplicate_index_key_still_round_trips() {
        let mut t = Iblt::new(16, 4, SEED).unwrap();
        let k = key_with_shape(&t, &[2, 1, 1]);

        t.insert(&k, b"dup");
        assert_eq!(t.get(&k), Some(b"dup".to_vec()));

        let listing = t.list_all();
        assert!(listing.complete);
        assert_eq!(listing.entries, vec![(k.clone(), b"dup".to_vec())]);
    }

    #[test]
    fn test_pairwise_cancelled_key_is_undecodable_alone() {
        let mut t = Iblt::new(16, 4, SEED).unwrap();
        let k = key_with_shape(&t, &[2, 2]);

        t.insert(&k, b"hidden");
        assert_eq!(t.get(&k), None);
        assert!(!t.list_all().complete);

        t.delete(&k, b"hidden");
        assert!(t.is_empty());
    }

    #[test]
    fn test_hash_count_above_size() {
        let mut t = Iblt::new(2, 3, 7).expect("hash_count above size is valid");
        t.insert(b"key", b"value");

        let total: i64 = t.cells().iter().map(|c| c.count).sum();
        assert_eq!(total, 3, "INVARIANT-1: pair contributes hash_count");

        t.delete(b"key", b"value");
        assert!(t.is_empty());
    }

    #[test]
    fn test_insert_delete_restores_tiny_table_for_every_key() {
        let mut t = Iblt::new(4, 4, 7).unwrap();
        for i in 0..200 {
            t.insert(&key(i), &value(i));
            t.delete(&key(i), &value(i));
            assert!(t.is_empty(), "key {} left residue", i);
        }
    }

    #[test]
    fn test_large_hash_count() {
        let mut t = Iblt::new(1000, 33, 7).unwrap();
        t.insert(b"key", b"value");

        assert_eq!(t.cell_indices(b"key").len(), 33);
        assert_eq!(t.get(b"key"), Some(b"value".to_vec()));
    }
}
