use std::fmt;
use std::path::Path;

use crate::error::{DemError, Result};
use crate::model::ElevationUnit;

/// On-disk DEM layouts understood by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemFormat {
    /// GeoTIFF raster with an embedded CRS.
    Raster,
    /// GRD/NetCDF dataset with named axis variables.
    GriddedDataset,
}

impl DemFormat {
    /// Picks the format from the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "tif" | "tiff" => Ok(DemFormat::Raster),
            "grd" | "nc" => Ok(DemFormat::GriddedDataset),
            "" => Err(DemError::file_format(path, "missing file extension")),
            other => Err(DemError::file_format(
                path,
                format!("extension .{other} is not one of .tif, .tiff, .grd, .nc"),
            )),
        }
    }

    /// Unit assumed for elevations when the file does not record one.
    ///
    /// USGS-style GeoTIFFs are in meters, planetary GRD products in kilometers.
    pub fn default_unit(self) -> ElevationUnit {
        match self {
            DemFormat::Raster => ElevationUnit::Meters,
            DemFormat::GriddedDataset => ElevationUnit::Kilometers,
        }
    }
}

impl fmt::Display for DemFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemFormat::Raster => write!(f, "raster"),
            DemFormat::GriddedDataset => write!(f, "gridded dataset"),
        }
    }
}
