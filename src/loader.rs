use std::path::Path;

use gdal::cpl::CslStringList;
use gdal::raster::{Group, MDArray};
use gdal::{Dataset, DatasetOptions, GdalOpenFlags};
use tracing::{debug, info, warn};

use crate::error::{DemError, Result};
use crate::format::DemFormat;
use crate::grid::{GridField, GridFrame};
use crate::model::ElevationUnit;

/// Axis variable pairs tried in a gridded dataset, in priority order.
///
/// The last pair is the generic naming used by some GMT products (e.g. LDAM);
/// it is renamed to lon/lat on load.
const AXIS_CANDIDATES: [(&str, &str); 3] = [("lon", "lat"), ("longitude", "latitude"), ("x", "y")];

const ELEVATION_VARIABLE: &str = "z";

/// Loads a DEM into memory, choosing the reader from the file extension.
pub fn load_grid(path: &Path) -> Result<GridField> {
    match DemFormat::from_path(path)? {
        DemFormat::Raster => load_raster(path),
        DemFormat::GriddedDataset => load_gridded(path),
    }
}

/// Reads band 1 of a GeoTIFF along with its geotransform and CRS.
pub fn load_raster(path: &Path) -> Result<GridField> {
    info!("Loading raster DEM: {:?}", path);

    let dataset = Dataset::open(path).map_err(|e| DemError::file_format(path, e.to_string()))?;
    let (cols, rows) = dataset.raster_size();
    let gt = dataset
        .geo_transform()
        .map_err(|e| DemError::file_format(path, format!("missing geotransform: {e}")))?;
    if gt[2] != 0.0 || gt[4] != 0.0 {
        return Err(DemError::file_format(path, "rotated geotransforms are not supported"));
    }

    let band = dataset.rasterband(1)?;
    let buffer = band.read_as::<f64>((0, 0), (cols, rows), (cols, rows), None)?;
    let decode = SampleDecoder::for_band(&band);
    let values: Vec<f64> = buffer.data().iter().map(|&v| decode.apply(v)).collect();

    // Pixel centres, matching how the raster is interpolated.
    let x = (0..cols).map(|i| gt[0] + (i as f64 + 0.5) * gt[1]).collect();
    let y = (0..rows).map(|j| gt[3] + (j as f64 + 0.5) * gt[5]).collect();

    let frame = dataset_frame(&dataset, path)?;
    let unit = parse_unit(&band.unit(), path);

    debug!(
        "Raster {}x{} pixels, frame {:?}, unit {:?}",
        cols, rows, frame, unit
    );

    GridField::new(x, y, values, frame, unit).map_err(|e| e.at(path))
}

/// Reads a GRD/NetCDF grid through GDAL's multidimensional API.
pub fn load_gridded(path: &Path) -> Result<GridField> {
    info!("Loading gridded dataset DEM: {:?}", path);

    let options = DatasetOptions {
        open_flags: GdalOpenFlags::GDAL_OF_MULTIDIM_RASTER,
        ..Default::default()
    };
    let dataset =
        Dataset::open_ex(path, options).map_err(|e| DemError::file_format(path, e.to_string()))?;
    let root = dataset
        .root_group()
        .map_err(|e| DemError::file_format(path, e.to_string()))?;

    let names = root.array_names(CslStringList::new());
    let (x_name, y_name) = resolve_axes(&names).ok_or_else(|| {
        DemError::file_format(path, format!("no lon/lat axis variables among {names:?}"))
    })?;
    if x_name == "x" {
        debug!("Renaming generic axes x/y to lon/lat");
    }

    let lon = read_axis(&root, x_name, path)?;
    let lat = read_axis(&root, y_name, path)?;

    let z_name = resolve_elevation(&root, &names, (x_name, y_name)).ok_or_else(|| {
        DemError::file_format(path, format!("no 2D elevation variable among {names:?}"))
    })?;
    let z = root.open_md_array(&z_name, CslStringList::new())?;

    let dims: Vec<(String, usize)> = z
        .dimensions()?
        .iter()
        .map(|d| (d.name(), d.size()))
        .collect();
    let count: Vec<usize> = dims.iter().map(|(_, size)| *size).collect();
    let start = vec![0u64; dims.len()];

    // Squeeze leading singleton dimensions (time, band).
    let spatial = squeeze_leading(&dims);
    let [(d0_name, d0_size), (d1_name, d1_size)] = spatial else {
        return Err(DemError::file_format(
            path,
            format!("variable {z_name} has dimensions {dims:?}, expected two"),
        ));
    };

    let lon_major = d0_name == x_name || d1_name == y_name;
    let expected = if lon_major {
        (lon.len(), lat.len())
    } else {
        (lat.len(), lon.len())
    };
    if (*d0_size, *d1_size) != expected {
        return Err(DemError::file_format(
            path,
            format!(
                "variable {z_name} is {d0_size}x{d1_size}, axes are {} lon by {} lat",
                lon.len(),
                lat.len()
            ),
        ));
    }

    let raw = z.read_as::<f64>(start, count)?;
    let decode = SampleDecoder::for_array(&z);
    debug!("Decoding {} with {:?}", z_name, decode);
    let mut values: Vec<f64> = raw.into_iter().map(|v| decode.apply(v)).collect();
    if lon_major {
        values = transpose(&values, lon.len(), lat.len());
    }

    let unit = parse_unit(&z.unit(), path);
    debug!(
        "Gridded variable {} on {}x{} lon/lat nodes, unit {:?}",
        z_name,
        lon.len(),
        lat.len(),
        unit
    );

    GridField::new(lon, lat, values, GridFrame::Geographic, unit).map_err(|e| e.at(path))
}

/// Frame of a classic GDAL dataset, from its spatial reference.
pub(crate) fn dataset_frame(dataset: &Dataset, path: &Path) -> Result<GridFrame> {
    match dataset.spatial_ref() {
        Ok(srs) if srs.is_geographic() => Ok(GridFrame::Geographic),
        Ok(srs) => {
            let wkt = srs
                .to_wkt()
                .map_err(|e| DemError::CoordinateTransform(e.to_string()))?;
            Ok(GridFrame::Projected { wkt })
        }
        Err(_) => {
            warn!("No CRS in {:?}, assuming geographic lon/lat axes", path);
            Ok(GridFrame::Geographic)
        }
    }
}

pub(crate) fn parse_unit(label: &str, path: &Path) -> Option<ElevationUnit> {
    if label.trim().is_empty() {
        return None;
    }
    let unit = ElevationUnit::from_label(label);
    if unit.is_none() {
        warn!("Unrecognised elevation unit {:?} in {:?}", label, path);
    }
    unit
}

/// Raw-to-physical conversion for stored samples.
///
/// Sentinels are compared against the raw value, before unpacking.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SampleDecoder {
    pub nodata: Option<f64>,
    /// CF `missing_value`, when it differs from `_FillValue`.
    pub missing: Option<f64>,
    pub scale: f64,
    pub offset: f64,
}

impl SampleDecoder {
    pub fn for_band(band: &gdal::raster::RasterBand) -> Self {
        Self {
            nodata: band.no_data_value(),
            missing: None,
            scale: band.scale().unwrap_or(1.0),
            offset: band.offset().unwrap_or(0.0),
        }
    }

    /// CF packing of a multidimensional variable: `_FillValue`,
    /// `missing_value`, `scale_factor` and `add_offset`.
    pub fn for_array(array: &MDArray) -> Self {
        Self {
            nodata: array.no_data_value_as_double(),
            missing: numeric_attribute(array, "missing_value"),
            scale: numeric_attribute(array, "scale_factor").unwrap_or(1.0),
            offset: numeric_attribute(array, "add_offset").unwrap_or(0.0),
        }
    }

    pub fn apply(&self, raw: f64) -> f64 {
        let is_sentinel = |s: Option<f64>| match s {
            Some(s) => raw == s || (s.is_nan() && raw.is_nan()),
            None => false,
        };
        if is_sentinel(self.nodata) || is_sentinel(self.missing) {
            f64::NAN
        } else {
            raw * self.scale + self.offset
        }
    }
}

fn numeric_attribute(array: &MDArray, name: &str) -> Option<f64> {
    array
        .attribute(name)
        .ok()
        .map(|attr| attr.read_as_f64())
        .filter(|v| v.is_finite())
}

fn resolve_axes(names: &[String]) -> Option<(&'static str, &'static str)> {
    AXIS_CANDIDATES
        .into_iter()
        .find(|(x, y)| names.iter().any(|n| n == x) && names.iter().any(|n| n == y))
}

fn resolve_elevation(root: &Group, names: &[String], axes: (&str, &str)) -> Option<String> {
    if names.iter().any(|n| n == ELEVATION_VARIABLE) {
        return Some(ELEVATION_VARIABLE.to_string());
    }

    names
        .iter()
        .filter(|n| n.as_str() != axes.0 && n.as_str() != axes.1)
        .find(|n| match root.open_md_array(n, CslStringList::new()) {
            Ok(array) => array.num_dimensions() >= 2,
            Err(_) => false,
        })
        .cloned()
}

fn read_axis(root: &Group, name: &str, path: &Path) -> Result<Vec<f64>> {
    let array = root.open_md_array(name, CslStringList::new())?;
    if array.num_dimensions() != 1 {
        return Err(DemError::file_format(
            path,
            format!("axis variable {name} is not one-dimensional"),
        ));
    }
    let len = array.num_elements() as usize;
    Ok(array.read_as::<f64>(vec![0], vec![len])?)
}

fn squeeze_leading(dims: &[(String, usize)]) -> &[(String, usize)] {
    let mut dims = dims;
    while dims.len() > 2 && dims[0].1 == 1 {
        dims = &dims[1..];
    }
    dims
}

/// Turns an `[outer][inner]` row-major buffer into `[inner][outer]`.
fn transpose(values: &[f64], outer: usize, inner: usize) -> Vec<f64> {
    let mut out = vec![0.0; values.len()];
    for o in 0..outer {
        for i in 0..inner {
            out[i * outer + o] = values[o * inner + i];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_axes_prefers_canonical_names() {
        assert_eq!(resolve_axes(&names(&["lat", "lon", "z"])), Some(("lon", "lat")));
        assert_eq!(
            resolve_axes(&names(&["x", "y", "latitude", "longitude", "elevation"])),
            Some(("longitude", "latitude"))
        );
        assert_eq!(resolve_axes(&names(&["x", "y", "z"])), Some(("x", "y")));
        assert_eq!(resolve_axes(&names(&["x", "z"])), None);
    }

    #[test]
    fn test_squeeze_leading() {
        let dims = vec![
            ("time".to_string(), 1),
            ("lat".to_string(), 3),
            ("lon".to_string(), 4),
        ];
        let squeezed = squeeze_leading(&dims);
        assert_eq!(squeezed.len(), 2);
        assert_eq!(squeezed[0].0, "lat");

        let dims = vec![("lat".to_string(), 1), ("lon".to_string(), 4)];
        assert_eq!(squeeze_leading(&dims).len(), 2);
    }

    #[test]
    fn test_transpose() {
        // 2 lon columns x 3 lat rows stored lon-major
        let lon_major = [0.0, 1.0, 2.0, 10.0, 11.0, 12.0];
        assert_eq!(
            transpose(&lon_major, 2, 3),
            vec![0.0, 10.0, 1.0, 11.0, 2.0, 12.0]
        );
    }

    #[test]
    fn test_sample_decoder() {
        let decode = SampleDecoder {
            nodata: Some(-9999.0),
            missing: None,
            scale: 0.5,
            offset: 10.0,
        };
        assert!(decode.apply(-9999.0).is_nan());
        assert_eq!(decode.apply(4.0), 12.0);

        let decode = SampleDecoder {
            nodata: None,
            missing: None,
            scale: 1.0,
            offset: 0.0,
        };
        assert_eq!(decode.apply(-9999.0), -9999.0);

        // packed int16 with both CF sentinels
        let decode = SampleDecoder {
            nodata: Some(-32768.0),
            missing: Some(-32767.0),
            scale: 0.001,
            offset: 0.0,
        };
        assert!(decode.apply(-32768.0).is_nan());
        assert!(decode.apply(-32767.0).is_nan());
        assert!((decode.apply(4000.0) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_extension_fails_before_open() {
        let result = load_grid(Path::new("/nonexistent/dem.xyz"));
        assert!(matches!(result, Err(DemError::FileFormat { .. })));
    }
}
