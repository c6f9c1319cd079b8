//! # boreas-engine
//!
//! Tiled climate-index computation.
//!
//! A [`ComputeRequest`] names an index, its input variables and the
//! slicing, threshold and percentile options. [`compute`] validates it,
//! splits the grid into tiles that fit the memory budget, reads each tile
//! from a [`DataSource`], evaluates every slice, and hands the assembled
//! [`IndexOutput`] to a [`ResultSink`].
//!
//! Percentile indices estimate their thresholds over the base period.
//! Study years inside the base are bootstrapped: the index is averaged
//! over every pseudo-base in which the study year is replaced by another
//! base year.
//!
//! ```mermaid
//! graph LR
//!     A["ComputeRequest"] -->|"validate()"| B["IndexDef"]
//!     C["DataSource"] -->|"per tile"| D["BoundSeries"]
//!     D --> E["TemporalSlicer"]
//!     D --> F["thresholds + cache"]
//!     E --> G["IndexDef::evaluate() / bootstrap"]
//!     F --> G
//!     B --> G
//!     G --> H["Accumulator"]
//!     H --> I["IndexOutput"]
//!     I --> J["ResultSink"]
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use boreas_calendar::{Calendar, Date, daily_sequence};
//! use boreas_engine::{ComputeRequest, IndexSpec, MemorySource, NoProgress, evaluate};
//! use boreas_series::TimeSeries;
//! use ndarray::Array3;
//!
//! let cal = Calendar::NoLeap;
//! let dates = daily_sequence(Date::new(2001, 1, 1, cal).unwrap(), 730, cal);
//! let tasmax = TimeSeries::new(dates, Array3::from_elem((730, 2, 3), 300.0), 1e20, cal, "K")
//!     .unwrap();
//! let source = MemorySource::new().with_variable("tasmax", tasmax);
//!
//! let request = ComputeRequest::new(IndexSpec::Builtin("SU".to_string()))
//!     .with_variables(vec!["tasmax".to_string()])
//!     .with_sources(vec![vec!["memory".to_string()]]);
//! let out = evaluate(&request, &source, &mut NoProgress).unwrap();
//! assert_eq!(out.shape(), &[2, 2, 3]);
//! assert_eq!(out.value(1, 0, 1, 2), Some(365.0));
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `request` | `ComputeRequest` builder and validation |
//! | `source` | `DataSource` contract and `MemorySource` |
//! | `sink` | `ResultSink` contract and `MemorySink` |
//! | `bound` | Per-variable study and base series of one tile |
//! | `thresholds` | Tile thresholds and the percentile cache store |
//! | `bootstrap` | In-base evaluation and the order-independent mean |
//! | `output` | Output assembly and `IndexOutput` |
//! | `pipeline` | The tile loop, `compute` and `evaluate` |
//! | `progress` | Progress reporting |
//! | `error` | Error types |

mod bootstrap;
mod bound;
mod error;
mod output;
mod pipeline;
mod progress;
mod request;
mod sink;
mod source;
mod thresholds;

pub use bootstrap::OrderIndependentMean;
pub use bound::BoundSeries;
pub use error::EngineError;
pub use output::{IndexOutput, OutputMetadata, event_names};
pub use pipeline::{compute, evaluate, metadata};
pub use progress::{NoProgress, ProgressReporter, ProgressSpan, TracingProgress};
pub use request::{CacheOptions, ComputeRequest, IndexSpec, Transform};
pub use sink::{MemorySink, ResultSink};
pub use source::{DataSource, MemorySource, RawTile, ReadRequest, VariableInfo};
