//! Memory budgets and per-cell footprint estimates.

use serde::{Deserialize, Serialize};

use crate::error::TileError;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Upper bound on the bytes a single tile may occupy.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryBudget {
    /// Exact byte count.
    Bytes(u64),
    /// Transfer-size limit in megabytes (1 MB = 2^20 bytes).
    TransferLimitMb(f64),
    /// No limit: the whole grid is read as one tile.
    #[default]
    Unlimited,
}

impl MemoryBudget {
    /// Returns the budget in bytes, or `None` when unlimited.
    pub fn bytes(&self) -> Option<u64> {
        match *self {
            Self::Bytes(n) => Some(n),
            Self::TransferLimitMb(mb) => Some((mb * BYTES_PER_MB).floor() as u64),
            Self::Unlimited => None,
        }
    }

    /// Validates the budget.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::InvalidBudget`] for a non-finite or
    /// non-positive transfer limit.
    pub fn validate(&self) -> Result<(), TileError> {
        if let Self::TransferLimitMb(mb) = *self
            && !(mb.is_finite() && mb > 0.0)
        {
            return Err(TileError::InvalidBudget {
                reason: format!("transfer limit must be positive and finite, got {mb}"),
            });
        }
        Ok(())
    }
}

/// Accumulates the bytes one grid cell costs across all variables.
///
/// Each variable contributes `value_size * (study_steps + base_steps)`.
///
/// # Example
///
/// ```
/// use boreas_tile::CellFootprint;
///
/// let footprint = CellFootprint::new()
///     .with_variable(4, 730, 0)
///     .with_variable(8, 730, 1825);
/// assert_eq!(footprint.bytes(), 4 * 730 + 8 * (730 + 1825));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellFootprint {
    bytes: u64,
}

impl CellFootprint {
    /// Creates an empty footprint.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one variable's contribution.
    pub fn with_variable(mut self, value_size: usize, study_steps: usize, base_steps: usize) -> Self {
        let steps = (study_steps + base_steps) as u64;
        self.bytes = self.bytes.saturating_add(value_size as u64 * steps);
        self
    }

    /// Returns the accumulated bytes per cell.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_limit_in_mebibytes() {
        assert_eq!(MemoryBudget::TransferLimitMb(1.0).bytes(), Some(1_048_576));
        assert_eq!(MemoryBudget::TransferLimitMb(0.5).bytes(), Some(524_288));
        assert_eq!(MemoryBudget::Bytes(17).bytes(), Some(17));
        assert_eq!(MemoryBudget::Unlimited.bytes(), None);
    }

    #[test]
    fn validate_rejects_non_positive_limit() {
        assert!(MemoryBudget::TransferLimitMb(0.0).validate().is_err());
        assert!(MemoryBudget::TransferLimitMb(f64::NAN).validate().is_err());
        assert!(MemoryBudget::TransferLimitMb(2.0).validate().is_ok());
        assert!(MemoryBudget::Bytes(0).validate().is_ok());
    }

    #[test]
    fn footprint_sums_variables() {
        let f = CellFootprint::new().with_variable(4, 10, 5).with_variable(8, 10, 0);
        assert_eq!(f.bytes(), 4 * 15 + 8 * 10);
    }
}
