//! Error types for the IBLT engine

use thiserror::Error;

/// Errors that can occur when building or decoding an IBLT
///
/// A missing key is not an error: `Iblt::get` returns `None`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IbltError {
    #[error("Invalid IBLT configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Incomplete decode: recovered {recovered} entries, {undecoded_cells} cells left undecoded")]
    IncompleteDecode {
        recovered: usize,
        undecoded_cells: usize,
    },

    #[error(
        "Incompatible tables: ({size}, {hash_count}, {seed}) vs ({other_size}, {other_hash_count}, {other_seed})"
    )]
    IncompatibleTables {
        size: usize,
        hash_count: usize,
        seed: u32,
        other_size: usize,
        other_hash_count: usize,
        other_seed: u32,
    },
}

impl IbltError {
    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}
