//! Tile-scoped NetCDF data source.

use std::ops::Range;
use std::path::{Path, PathBuf};

use boreas_calendar::{Calendar, Date, TimeRange};
use boreas_engine::{DataSource, RawTile, ReadRequest, VariableInfo};
use ndarray::Array3;
use tracing::{debug, warn};

use crate::error::IoError;
use crate::netcdf_read;

/// Reads `(time, y, x)` and `(time, level, y, x)` variables from one or more
/// NetCDF files, concatenated along time.
///
/// Every file of a variable must share the grid, calendar and level axis.
/// Files are given in time order; their time axes must not overlap. Packed
/// values (`scale_factor`, `add_offset`) are unpacked; fill cells keep the
/// declared fill value.
#[derive(Debug, Clone)]
pub struct NetcdfSource {
    /// Name of the time coordinate variable.
    time_var: String,
}

impl Default for NetcdfSource {
    fn default() -> Self {
        Self {
            time_var: "time".into(),
        }
    }
}

/// What one file holds for one variable.
#[derive(Debug, Clone)]
struct FileLayout {
    path: PathBuf,
    dates: Vec<Date>,
    calendar: Calendar,
    grid: (usize, usize),
    level_index: Option<usize>,
    fill_value: Option<f64>,
    packing: (f64, f64),
    units: String,
}

impl FileLayout {
    fn rows_in(&self, range: Option<TimeRange>) -> Range<usize> {
        match range {
            None => 0..self.dates.len(),
            Some(r) => {
                let start = self.dates.partition_point(|&d| d < r.start());
                let end = self.dates.partition_point(|&d| d <= r.end());
                start..end.max(start)
            }
        }
    }
}

impl NetcdfSource {
    /// Creates a source reading the `time` coordinate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the time coordinate variable name.
    pub fn with_time_variable(mut self, name: impl Into<String>) -> Self {
        self.time_var = name.into();
        self
    }

    /// Returns the time coordinate variable name.
    pub fn time_variable(&self) -> &str {
        &self.time_var
    }

    fn layout(&self, variable: &str, path: &Path, level: Option<f64>) -> Result<FileLayout, IoError> {
        let file = netcdf_read::open_file(path)?;
        let (dates, calendar) = netcdf_read::read_time_axis(&file, &self.time_var, path)?;
        let var = netcdf_read::variable(&file, variable, path)?;
        let dims = var.dimensions();
        let level_error = |reason: String| IoError::Level {
            variable: variable.to_string(),
            reason,
        };
        let (grid, level_index) = match (dims.len(), level) {
            (3, None) => ((dims[1].len(), dims[2].len()), None),
            (4, Some(level)) => {
                let index = netcdf_read::level_index(&file, variable, &dims[1].name(), level, path)?;
                ((dims[2].len(), dims[3].len()), Some(index))
            }
            (3, Some(level)) => {
                return Err(level_error(format!("level {level} given for a 3-D variable")));
            }
            (4, None) => return Err(level_error("4-D variable needs a level".to_string())),
            (n, _) => {
                return Err(IoError::DimensionMismatch {
                    name: format!("{variable} dimensions"),
                    expected: 3,
                    got: n,
                });
            }
        };
        if dims[0].len() != dates.len() {
            return Err(IoError::DimensionMismatch {
                name: dims[0].name(),
                expected: dates.len(),
                got: dims[0].len(),
            });
        }
        Ok(FileLayout {
            path: path.to_path_buf(),
            dates,
            calendar,
            grid,
            level_index,
            fill_value: netcdf_read::fill_value(&var),
            packing: netcdf_read::packing(&var),
            units: netcdf_read::string_attribute(&var, "units").unwrap_or_default(),
        })
    }

    fn layouts(&self, variable: &str, sources: &[String], level: Option<f64>) -> Result<Vec<FileLayout>, IoError> {
        if sources.is_empty() {
            return Err(IoError::NoSources {
                variable: variable.to_string(),
            });
        }
        let layouts = sources
            .iter()
            .map(|s| self.layout(variable, Path::new(s), level))
            .collect::<Result<Vec<_>, _>>()?;
        let inconsistent = |reason: String| IoError::InconsistentFiles {
            variable: variable.to_string(),
            reason,
        };
        let first = &layouts[0];
        for pair in layouts.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if b.calendar != first.calendar {
                return Err(inconsistent(format!(
                    "{} uses calendar {}, {} uses {}",
                    first.path.display(),
                    first.calendar,
                    b.path.display(),
                    b.calendar
                )));
            }
            if b.grid != first.grid {
                return Err(inconsistent(format!(
                    "{} has grid {:?}, {} has {:?}",
                    first.path.display(),
                    first.grid,
                    b.path.display(),
                    b.grid
                )));
            }
            if let (Some(last), Some(next)) = (a.dates.last(), b.dates.first())
                && next <= last
            {
                return Err(inconsistent(format!(
                    "{} starts at {next}, before the end of {} at {last}",
                    b.path.display(),
                    a.path.display()
                )));
            }
            if b.fill_value != first.fill_value {
                warn!(
                    variable,
                    file = %b.path.display(),
                    "fill value differs from the first file, using the first"
                );
            }
        }
        Ok(layouts)
    }

    fn read_tile(&self, request: &ReadRequest<'_>) -> Result<RawTile, IoError> {
        let layouts = self.layouts(request.variable, request.sources, request.level)?;
        let first = &layouts[0];
        let (rows, cols) = (request.rows.clone(), request.cols.clone());
        for (name, end, size) in [("rows", rows.end, first.grid.0), ("cols", cols.end, first.grid.1)] {
            if end > size {
                return Err(IoError::DimensionMismatch {
                    name: format!("{} {name}", request.variable),
                    expected: size,
                    got: end,
                });
            }
        }
        let fill = first.fill_value;
        let mut dates = Vec::new();
        let mut data = Vec::new();
        for layout in &layouts {
            let time = layout.rows_in(request.time_range);
            if time.is_empty() {
                continue;
            }
            let file = netcdf_read::open_file(&layout.path)?;
            let var = netcdf_read::variable(&file, request.variable, &layout.path)?;
            let mut values = match layout.level_index {
                None => var.get_values::<f64, _>((time.clone(), rows.clone(), cols.clone()))?,
                Some(l) => var.get_values::<f64, _>((time.clone(), l..l + 1, rows.clone(), cols.clone()))?,
            };
            unpack(&mut values, layout.packing, layout.fill_value, fill);
            dates.extend_from_slice(&layout.dates[time.clone()]);
            data.extend(values);
            debug!(
                variable = request.variable,
                file = %layout.path.display(),
                steps = time.len(),
                "slab read"
            );
        }
        let shape = (dates.len(), rows.len(), cols.len());
        let got = data.len();
        let values = Array3::from_shape_vec(shape, data).map_err(|_| IoError::DimensionMismatch {
            name: format!("{} slab", request.variable),
            expected: shape.0 * shape.1 * shape.2,
            got,
        })?;
        Ok(RawTile {
            dates,
            values,
            fill_value: fill,
            calendar: first.calendar,
            units: first.units.clone(),
        })
    }
}

/// Applies CF unpacking in place and maps each file's fill value to `fill`.
fn unpack(values: &mut [f64], (scale, offset): (f64, f64), file_fill: Option<f64>, fill: Option<f64>) {
    let identity = scale == 1.0 && offset == 0.0;
    if identity && file_fill == fill {
        return;
    }
    for v in values.iter_mut() {
        if file_fill.is_some_and(|f| *v == f) || v.is_nan() {
            if let Some(f) = fill {
                *v = f;
            }
        } else if !identity {
            *v = *v * scale + offset;
        }
    }
}

impl DataSource for NetcdfSource {
    type Error = IoError;

    fn describe(
        &self,
        variable: &str,
        sources: &[String],
        time_range: Option<TimeRange>,
        level: Option<f64>,
    ) -> Result<VariableInfo, IoError> {
        let layouts = self.layouts(variable, sources, level)?;
        let time_steps = layouts.iter().map(|l| l.rows_in(time_range).len()).sum();
        Ok(VariableInfo {
            rows: layouts[0].grid.0,
            cols: layouts[0].grid.1,
            time_steps,
            value_size: std::mem::size_of::<f64>(),
            calendar: layouts[0].calendar,
        })
    }

    fn read(&self, request: &ReadRequest<'_>) -> Result<RawTile, IoError> {
        self.read_tile(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpack_scales_and_keeps_fill() {
        let mut v = vec![10.0, -1.0, 20.0];
        unpack(&mut v, (0.5, 100.0), Some(-1.0), Some(-1.0));
        assert_eq!(v, vec![105.0, -1.0, 110.0]);
    }

    #[test]
    fn unpack_maps_other_fill() {
        let mut v = vec![1.0, -9.0, f64::NAN];
        unpack(&mut v, (1.0, 0.0), Some(-9.0), Some(1e20));
        assert_eq!(v, vec![1.0, 1e20, 1e20]);
    }

    #[test]
    fn time_rows_of_range() {
        let cal = Calendar::NoLeap;
        let layout = FileLayout {
            path: PathBuf::from("x.nc"),
            dates: boreas_calendar::daily_sequence(Date::new(2000, 1, 1, cal).unwrap(), 10, cal),
            calendar: cal,
            grid: (1, 1),
            level_index: None,
            fill_value: None,
            packing: (1.0, 0.0),
            units: String::new(),
        };
        let range = TimeRange::new(Date::new(2000, 1, 3, cal).unwrap(), Date::new(2000, 1, 5, cal).unwrap()).unwrap();
        assert_eq!(layout.rows_in(Some(range)), 2..5);
        let later = TimeRange::new(Date::new(2001, 1, 1, cal).unwrap(), Date::new(2001, 2, 1, cal).unwrap()).unwrap();
        assert!(layout.rows_in(Some(later)).is_empty());
    }
}
