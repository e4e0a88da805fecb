//! Result of a full-table decode

use std::fmt;

use crate::error::IbltError;

/// A decoded key-value pair
pub type Entry = (Vec<u8>, Vec<u8>);

/// Output of `Iblt::list_all`
///
/// `complete` is true only when peeling emptied every cell. A partial listing
/// still carries whatever was recovered before peeling stalled.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Listing {
    /// Pairs logically present (peeled from `count == 1` cells)
    pub entries: Vec<Entry>,
    /// Pairs with a net deletion surplus (peeled from `count == -1` cells)
    pub residue: Vec<Entry>,
    /// Whether the table decoded completely
    pub complete: bool,
    /// Cells left non-empty after peeling
    pub undecoded_cells: usize,
}

impl Listing {
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Number of recovered present pairs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Present pairs, or `IncompleteDecode` if peeling stalled
    pub fn into_complete(self) -> Result<Vec<Entry>, IbltError> {
        if self.complete {
            Ok(self.entries)
        } else {
            Err(IbltError::IncompleteDecode {
                recovered: self.entries.len(),
                undecoded_cells: self.undecoded_cells,
            })
        }
    }
}

/// Renders `{key=>value, key2=>value2}`; partial listings end with `...`
impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(
                f,
                "{}=>{}",
                String::from_utf8_lossy(key),
                String::from_utf8_lossy(value)
            )?;
        }
        if !self.complete {
            if !self.entries.is_empty() {
                f.write_str(", ")?;
            }
            f.write_str("...")?;
        }
        f.write_str("}")
    }
}
