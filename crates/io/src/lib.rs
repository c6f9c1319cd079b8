//! # boreas-io
//!
//! File formats around the boreas engine: a tile-scoped NetCDF
//! [`DataSource`](boreas_engine::DataSource) and a JSON
//! [`ResultSink`](boreas_engine::ResultSink).
//!
//! | Module | Description |
//! |--------|-------------|
//! | `source` | `NetcdfSource`: multi-file reads, time subsetting, levels |
//! | `netcdf_read` | CF time units, calendars and attribute helpers |
//! | `json_sink` | `JsonSink` and the `JsonDocument` it writes |
//! | `error` | Error types |

mod error;
mod json_sink;
mod netcdf_read;
mod source;

pub use error::IoError;
pub use json_sink::{JsonDocument, JsonEvent, JsonSink};
pub use source::NetcdfSource;
