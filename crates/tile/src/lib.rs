//! # boreas-tile
//!
//! Memory-bounded partitioning of a spatial grid into rectangular tiles.
//!
//! ```mermaid
//! graph LR
//!     A["CellFootprint"] -->|"bytes()"| B["TileScheduler::new()"]
//!     M["MemoryBudget"] --> B
//!     B -->|"tiles()"| C["Tile 0..n (row-major)"]
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use boreas_tile::{CellFootprint, MemoryBudget, TileScheduler};
//!
//! let footprint = CellFootprint::new().with_variable(8, 3650, 0);
//! let budget = MemoryBudget::TransferLimitMb(1.0);
//! let scheduler = TileScheduler::new(180, 360, budget, footprint.bytes()).unwrap();
//! let covered: usize = scheduler.tiles().map(|t| t.n_cells()).sum();
//! assert_eq!(covered, 180 * 360);
//! ```

mod budget;
mod error;
mod scheduler;
mod tile;

pub use budget::{CellFootprint, MemoryBudget};
pub use error::TileError;
pub use scheduler::TileScheduler;
pub use tile::Tile;
