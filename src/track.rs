use std::path::{Path, PathBuf};

use gdal::{Dataset, GeoTransform, Metadata};
use tracing::{debug, info};

use crate::error::{DemError, Result};
use crate::format::DemFormat;
use crate::grid::GridFrame;
use crate::interp::{combine, locate_index, Interpolation, Taps};
use crate::loader::{dataset_frame, parse_unit, SampleDecoder};
use crate::model::{ElevationUnit, LonDomain, QueryPoint};
use crate::reconcile::reconcile_in_frame;

const SUBDATASETS_DOMAIN: &str = "SUBDATASETS";

/// Samples a DEM straight from disk, one small pixel window per point.
///
/// Unlike [`crate::loader::load_grid`] the raster is never read in full, which
/// keeps memory flat for large DEMs and short tracks.
pub struct TrackSampler {
    path: PathBuf,
    format: DemFormat,
    dataset: Dataset,
    geo_transform: GeoTransform,
    size: (usize, usize),
    frame: GridFrame,
    decode: SampleDecoder,
    unit: Option<ElevationUnit>,
}

impl TrackSampler {
    pub fn open(path: &Path) -> Result<Self> {
        let format = DemFormat::from_path(path)?;
        info!("Opening {} for track sampling: {:?}", format, path);

        let dataset = open_raster_view(path)?;
        let geo_transform = dataset
            .geo_transform()
            .map_err(|e| DemError::file_format(path, format!("missing geotransform: {e}")))?;
        if geo_transform[2] != 0.0 || geo_transform[4] != 0.0 {
            return Err(DemError::file_format(path, "rotated geotransforms are not supported"));
        }

        let size = dataset.raster_size();
        let frame = dataset_frame(&dataset, path)?;
        let (decode, unit) = {
            let band = dataset.rasterband(1)?;
            (SampleDecoder::for_band(&band), parse_unit(&band.unit(), path))
        };

        debug!(
            "Track source {}x{}, geotransform {:?}, frame {:?}",
            size.0, size.1, geo_transform, frame
        );

        Ok(Self {
            path: path.to_path_buf(),
            format,
            dataset,
            geo_transform,
            size,
            frame,
            decode,
            unit,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> DemFormat {
        self.format
    }

    pub fn unit(&self) -> Option<ElevationUnit> {
        self.unit
    }

    /// Longitude domain of a geographic source, from its easternmost pixel centre.
    pub fn lon_domain(&self) -> Option<LonDomain> {
        match self.frame {
            GridFrame::Geographic => {
                let gt = &self.geo_transform;
                let first = gt[0] + 0.5 * gt[1];
                let last = gt[0] + (self.size.0 as f64 - 0.5) * gt[1];
                Some(LonDomain::from_axis_max(first.max(last)))
            }
            GridFrame::Projected { .. } => None,
        }
    }

    /// Elevation at each point in the source unit, NaN outside the raster.
    pub fn sample(
        &self,
        points: &[QueryPoint],
        method: Interpolation,
        lon_domain: Option<LonDomain>,
    ) -> Result<Vec<f64>> {
        let domain = lon_domain.or_else(|| self.lon_domain());
        let batch = reconcile_in_frame(points, &self.frame, domain)?;
        let band = self.dataset.rasterband(1)?;
        let (cols, rows) = self.size;
        let gt = &self.geo_transform;

        batch
            .iter()
            .map(|(x, y)| -> Result<f64> {
                // Fractional pixel index, 0.0 at the first pixel centre.
                let px = (x - gt[0]) / gt[1] - 0.5;
                let py = (y - gt[3]) / gt[5] - 0.5;
                let (Some((i, tx)), Some((j, ty))) =
                    (locate_index(px, cols), locate_index(py, rows))
                else {
                    return Ok(f64::NAN);
                };

                let col_taps = Taps::new(method, i, tx, cols);
                let row_taps = Taps::new(method, j, ty, rows);
                let (c0, c1) = col_taps.span();
                let (r0, r1) = row_taps.span();
                let (w, h) = (c1 - c0 + 1, r1 - r0 + 1);

                let window =
                    band.read_as::<f64>((c0 as isize, r0 as isize), (w, h), (w, h), None)?;
                let data = window.data();
                Ok(combine(&col_taps, &row_taps, |col, row| {
                    self.decode.apply(data[(row - r0) * w + (col - c0)])
                }))
            })
            .collect()
    }
}

/// Opens `path` through the classic raster API.
///
/// Multi-variable NetCDF files expose each variable as a subdataset; the
/// elevation variable `z` is preferred, otherwise the first one is used.
fn open_raster_view(path: &Path) -> Result<Dataset> {
    let dataset = Dataset::open(path).map_err(|e| DemError::file_format(path, e.to_string()))?;
    if dataset.raster_count() > 0 {
        return Ok(dataset);
    }

    let subdatasets: Vec<String> = (1..)
        .map_while(|k: usize| {
            dataset.metadata_item(&format!("SUBDATASET_{k}_NAME"), SUBDATASETS_DOMAIN)
        })
        .collect();
    let chosen = subdatasets
        .iter()
        .find(|name| name.ends_with(":z"))
        .or_else(|| subdatasets.first())
        .ok_or_else(|| DemError::file_format(path, "no raster bands or subdatasets"))?;

    debug!("Using subdataset {}", chosen);
    Dataset::open(chosen).map_err(|e| DemError::file_format(path, e.to_string()))
}
