//! Domain Layer - Pure IBLT logic
//!
//! This layer contains:
//! - Cell layout and XOR accumulators
//! - Hash functions (cell mapping and key checksum)
//! - The table itself (insert, delete, get, list_all, subtract)
//! - Decode results
//! - Configuration and sizing parameters
//!
//! RULES:
//! - No I/O operations
//! - No async code

pub mod cell;
pub mod config;
pub mod hash_functions;
pub mod listing;
pub mod parameters;
pub mod table;

pub use cell::{Cell, XorSum};
pub use config::{IbltConfig, IbltConfigBuilder};
pub use listing::{Entry, Listing};
pub use parameters::{calculate_parameters, peeling_threshold, recommended_size, IbltParams};
pub use table::Iblt;
