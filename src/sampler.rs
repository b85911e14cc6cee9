use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::Result;
use crate::format::DemFormat;
use crate::interp::{interpolate, Interpolation};
use crate::loader::{load_gridded, load_raster};
use crate::model::{ElevationUnit, LonDomain, QueryPoint};
use crate::reconcile::reconcile;
use crate::table::ElevationTable;
use crate::track::TrackSampler;

/// Extraction strategy used by [`read_dem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Load the full grid, then interpolate every query in one batch.
    GridInterpolation,
    /// Read only the pixel window each query needs, straight from disk.
    TrackSampling,
}

impl Method {
    pub const ALL: [Method; 2] = [Method::GridInterpolation, Method::TrackSampling];
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::GridInterpolation => write!(f, "grid-interpolation"),
            Method::TrackSampling => write!(f, "track-sampling"),
        }
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "grid" | "grid-interpolation" => Ok(Method::GridInterpolation),
            "track" | "track-sampling" => Ok(Method::TrackSampling),
            other => Err(format!("unknown sampling method {other:?}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SampleOptions {
    pub interpolation: Interpolation,
    /// Overrides the longitude domain inferred from the DEM.
    pub lon_domain: Option<LonDomain>,
    pub output_unit: ElevationUnit,
    /// Header of the elevation column.
    pub column_name: String,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            interpolation: Interpolation::Linear,
            lon_domain: None,
            output_unit: ElevationUnit::Kilometers,
            column_name: "z".to_string(),
        }
    }
}

/// Samples the DEM at `path` for every point, in `options.output_unit`.
///
/// Returns the result table and the wall-clock time of the whole operation,
/// load included. Points outside the DEM get NaN.
pub fn read_dem(
    path: &Path,
    method: Method,
    points: &[QueryPoint],
    options: &SampleOptions,
) -> Result<(ElevationTable, Duration)> {
    let start = Instant::now();

    let format = DemFormat::from_path(path)?;
    info!(
        "Sampling {} points from {} {:?} using {}",
        points.len(),
        format,
        path,
        method
    );

    if points.is_empty() {
        let table = ElevationTable::new(Vec::new(), Vec::new(), &options.column_name);
        return Ok((table, start.elapsed()));
    }

    let elevations = match method {
        Method::GridInterpolation => sample_grid(path, format, points, options)?,
        Method::TrackSampling => sample_track(path, format, points, options)?,
    };

    let table = ElevationTable::new(points.to_vec(), elevations, &options.column_name);
    let elapsed = start.elapsed();
    debug!("{} finished in {:?}", method, elapsed);

    Ok((table, elapsed))
}

fn sample_grid(
    path: &Path,
    format: DemFormat,
    points: &[QueryPoint],
    options: &SampleOptions,
) -> Result<Vec<f64>> {
    let grid = match format {
        DemFormat::Raster => load_raster(path)?,
        DemFormat::GriddedDataset => load_gridded(path)?,
    };
    let batch = reconcile(points, &grid, options.lon_domain)?;
    let values = interpolate(&grid, &batch, options.interpolation);

    let source = grid.unit().unwrap_or_else(|| format.default_unit());
    Ok(rescale(values, source, options.output_unit))
}

fn sample_track(
    path: &Path,
    format: DemFormat,
    points: &[QueryPoint],
    options: &SampleOptions,
) -> Result<Vec<f64>> {
    let sampler = TrackSampler::open(path)?;
    let values = sampler.sample(points, options.interpolation, options.lon_domain)?;

    let source = sampler.unit().unwrap_or_else(|| format.default_unit());
    Ok(rescale(values, source, options.output_unit))
}

fn rescale(mut values: Vec<f64>, from: ElevationUnit, to: ElevationUnit) -> Vec<f64> {
    let factor = from.factor_to(to);
    if factor != 1.0 {
        debug!("Converting elevations from {} to {}", from, to);
        values.iter_mut().for_each(|v| *v *= factor);
    }
    values
}
