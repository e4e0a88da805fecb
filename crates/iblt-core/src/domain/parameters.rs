//! IBLT sizing parameters
//!
//! Peeling succeeds with high probability while the load `n / m` stays below
//! the 2-core threshold of a random `k`-uniform hypergraph:
//!
//! | k | threshold |
//! |---|-----------|
//! | 3 | 0.818     |
//! | 4 | 0.772     |
//! | 5 | 0.702     |
//! | 6 | 0.637     |
//! | 7 | 0.581     |
//!
//! Small tables decode less reliably than the asymptotic figures suggest, so
//! the recommended size adds headroom on top of `n / threshold`.

/// Threshold used for hash counts outside the table above
const FALLBACK_THRESHOLD: f64 = 0.5;

/// Extra cells on top of the asymptotic minimum
const HEADROOM: f64 = 1.5;

/// Absolute floor so tiny tables still peel
const MIN_CELLS: usize = 8;

/// IBLT sizing parameters
#[derive(Clone, Debug, PartialEq)]
pub struct IbltParams {
    /// Number of cells
    pub size: usize,
    /// Number of hash functions
    pub hash_count: usize,
    /// Load `n / size` these parameters give for the expected entries
    pub expected_load: f64,
}

/// Asymptotic peeling threshold (entries per cell) for `hash_count`
pub fn peeling_threshold(hash_count: usize) -> f64 {
    match hash_count {
        3 => 0.818,
        4 => 0.772,
        5 => 0.702,
        6 => 0.637,
        7 => 0.581,
        _ => FALLBACK_THRESHOLD,
    }
}

/// Entries per cell
pub fn load_factor(entries: usize, size: usize) -> f64 {
    if size == 0 {
        return f64::INFINITY;
    }
    entries as f64 / size as f64
}

/// Cell count that should decode `expected_entries` with high probability
///
/// The result is rounded up to a multiple of `hash_count` and is never below
/// `hash_count`.
pub fn recommended_size(expected_entries: usize, hash_count: usize) -> usize {
    let hash_count = hash_count.max(1);
    let raw = (expected_entries as f64 * HEADROOM / peeling_threshold(hash_count)).ceil() as usize;
    let cells = raw.max(MIN_CELLS).max(hash_count);
    cells.div_ceil(hash_count) * hash_count
}

/// Recommended parameters for `expected_entries` with the given hash count
pub fn calculate_parameters(expected_entries: usize, hash_count: usize) -> IbltParams {
    let size = recommended_size(expected_entries, hash_count);
    IbltParams {
        size,
        hash_count: hash_count.max(1),
        expected_load: load_factor(expected_entries, size),
    }
}

/// True if `entries` fits below the peeling threshold for this table shape
pub fn within_threshold(entries: usize, size: usize, hash_count: usize) -> bool {
    load_factor(entries, size) < peeling_threshold(hash_count)
}
