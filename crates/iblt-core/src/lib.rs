//! # IBLT Core
//!
//! Invertible Bloom Lookup Table: a fixed array of cells holding XOR
//! accumulators of keys, values and key checksums. Supports insert, delete,
//! point lookup and, below the load threshold, exact recovery of the full
//! content by peeling.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): Pure logic, no I/O
//!   - `Iblt`: The table
//!   - `Cell`, `XorSum`: Cell layout and accumulators
//!   - `Listing`: Result of a full decode
//!   - `IbltConfig` / `IbltConfigBuilder`: Settings record with validation
//!   - `parameters`: Peeling thresholds and table sizing
//! - **Metrics** (`metrics.rs`): Counters and the `MetricsRecorder` hook
//! - **Errors** (`error.rs`): `IbltError`
//!
//! ## Guarantees
//!
//! - `get` never returns a wrong value; it may miss a present key.
//! - `list_all` flags a stalled decode with `complete == false`.
//! - Keys must be distinct and only present pairs may be deleted. These
//!   preconditions are not checked.
//!
//! ## Usage Example
//!
//! ```
//! use iblt_core::Iblt;
//!
//! let mut table = Iblt::new(100, 4, 42)?;
//! table.insert(b"key", b"value");
//! assert_eq!(table.get(b"key"), Some(b"value".to_vec()));
//! assert_eq!(table.to_string(), "{key=>value}");
//!
//! table.delete(b"key", b"value");
//! assert_eq!(table.get(b"key"), None);
//! assert_eq!(table.to_string(), "{}");
//! # Ok::<(), iblt_core::IbltError>(())
//! ```

pub mod domain;
pub mod error;
pub mod metrics;

// Re-exports for convenience
pub use domain::{Entry, Iblt, IbltConfig, IbltConfigBuilder, Listing};
pub use error::IbltError;
pub use metrics::{Metrics, MetricsRecorder, MetricsSnapshot, NoOpMetrics};
