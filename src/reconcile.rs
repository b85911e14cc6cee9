use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use tracing::debug;

use crate::error::{DemError, Result};
use crate::grid::{GridField, GridFrame};
use crate::model::{LonDomain, QueryPoint};

/// Query coordinates in a grid's native frame.
///
/// `xs[k]` and `ys[k]` belong to the k-th query point, so the whole set is
/// interpolated as one batch along a shared query index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryBatch {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
}

impl QueryBatch {
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.xs.iter().copied().zip(self.ys.iter().copied())
    }
}

/// Expresses `points` in the native frame of `grid`.
///
/// `lon_domain` overrides the longitude domain otherwise read from the grid's axis.
pub fn reconcile(
    points: &[QueryPoint],
    grid: &GridField,
    lon_domain: Option<LonDomain>,
) -> Result<QueryBatch> {
    reconcile_in_frame(points, grid.frame(), lon_domain.or_else(|| grid.lon_domain()))
}

/// Expresses `points` in `frame`.
///
/// Geographic frames wrap longitudes into `lon_domain`; projected frames
/// forward-project lon/lat on the CRS's own geographic base, so lunar and
/// other non-Earth grids need no datum shift. Points that cannot be
/// projected come back as NaN.
pub fn reconcile_in_frame(
    points: &[QueryPoint],
    frame: &GridFrame,
    lon_domain: Option<LonDomain>,
) -> Result<QueryBatch> {
    match frame {
        GridFrame::Geographic => Ok(wrap_longitudes(points, lon_domain)),
        GridFrame::Projected { wkt } => project(points, wkt),
    }
}

fn wrap_longitudes(points: &[QueryPoint], lon_domain: Option<LonDomain>) -> QueryBatch {
    let xs = match lon_domain {
        Some(domain) => points.iter().map(|p| domain.normalize(p.lon)).collect(),
        None => points.iter().map(|p| p.lon).collect(),
    };
    let ys = points.iter().map(|p| p.lat).collect();
    QueryBatch { xs, ys }
}

fn project(points: &[QueryPoint], wkt: &str) -> Result<QueryBatch> {
    let transform = lonlat_to(wkt)?;

    let mut xs: Vec<f64> = points.iter().map(|p| p.lon).collect();
    let mut ys: Vec<f64> = points.iter().map(|p| p.lat).collect();

    if let Err(e) = transform.transform_coords(&mut xs, &mut ys, &mut []) {
        debug!("Batch projection failed ({}), projecting points one by one", e);
        for (k, p) in points.iter().enumerate() {
            let mut x = [p.lon];
            let mut y = [p.lat];
            match transform.transform_coords(&mut x, &mut y, &mut []) {
                Ok(()) => {
                    xs[k] = x[0];
                    ys[k] = y[0];
                }
                Err(_) => {
                    xs[k] = f64::NAN;
                    ys[k] = f64::NAN;
                }
            }
        }
    }

    // GDAL flags individual failures with HUGE_VAL.
    for v in xs.iter_mut().chain(ys.iter_mut()) {
        if !v.is_finite() {
            *v = f64::NAN;
        }
    }

    Ok(QueryBatch { xs, ys })
}

/// Forward transform from the geographic base of `wkt` to `wkt` itself.
pub(crate) fn lonlat_to(wkt: &str) -> Result<CoordTransform> {
    let mut target = SpatialRef::from_wkt(wkt)
        .map_err(|e| DemError::CoordinateTransform(format!("invalid grid CRS: {e}")))?;
    target.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);

    let mut source = target
        .geog_cs()
        .map_err(|e| DemError::CoordinateTransform(format!("grid CRS has no GEOGCS: {e}")))?;
    source.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);

    CoordTransform::new(&source, &target).map_err(|e| DemError::CoordinateTransform(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(list: &[(f64, f64)]) -> Vec<QueryPoint> {
        list.iter().copied().map(QueryPoint::from).collect()
    }

    #[test]
    fn test_geographic_wraps_into_grid_domain() {
        let grid = GridField::new(
            vec![0.0, 90.0, 180.0, 270.0, 350.0],
            vec![-10.0, 10.0],
            vec![0.0; 10],
            GridFrame::Geographic,
            None,
        )
        .unwrap();

        let batch = reconcile(&points(&[(-10.0, 1.0), (350.0, 2.0), (10.0, 3.0)]), &grid, None)
            .unwrap();
        assert_eq!(batch.xs, vec![350.0, 350.0, 10.0]);
        assert_eq!(batch.ys, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_domain_override() {
        let grid = GridField::new(
            vec![-180.0, 0.0, 179.0],
            vec![0.0],
            vec![0.0; 3],
            GridFrame::Geographic,
            None,
        )
        .unwrap();

        let batch = reconcile(&points(&[(200.0, 0.0)]), &grid, None).unwrap();
        assert_eq!(batch.xs, vec![-160.0]);

        let batch = reconcile(&points(&[(-10.0, 0.0)]), &grid, Some(LonDomain::Positive)).unwrap();
        assert_eq!(batch.xs, vec![350.0]);
    }

    #[test]
    fn test_projected_forward_transform() {
        let Ok(utm) = SpatialRef::from_epsg(32633) else {
            eprintln!("Skipping test: EPSG database not available");
            return;
        };
        let wkt = utm.to_wkt().unwrap();
        let frame = GridFrame::Projected { wkt };

        let batch = reconcile_in_frame(&points(&[(15.0, 0.0), (15.0, 45.0)]), &frame, None).unwrap();
        assert_eq!(batch.len(), 2);
        // Central meridian of zone 33 maps to the false easting
        assert!((batch.xs[0] - 500_000.0).abs() < 1e-3, "{:?}", batch);
        assert!(batch.ys[0].abs() < 1e-3, "{:?}", batch);
        assert!((batch.xs[1] - 500_000.0).abs() < 1e-3, "{:?}", batch);
        assert!(batch.ys[1] > 4_900_000.0 && batch.ys[1] < 5_000_000.0, "{:?}", batch);
    }

    #[test]
    fn test_lunar_projection_uses_its_own_body() {
        let Ok(moon) = SpatialRef::from_proj4("+proj=eqc +R=1737400 +units=m +no_defs") else {
            eprintln!("Skipping test: PROJ strings not supported");
            return;
        };
        let frame = GridFrame::Projected {
            wkt: moon.to_wkt().unwrap(),
        };

        let batch =
            reconcile_in_frame(&points(&[(0.0, 0.0), (1.0, 0.0), (0.0, -2.0)]), &frame, None)
                .unwrap();
        // one degree of arc on the lunar sphere
        let degree = 1_737_400.0 * std::f64::consts::PI / 180.0;
        assert!(batch.xs[0].abs() < 1e-6 && batch.ys[0].abs() < 1e-6, "{batch:?}");
        assert!((batch.xs[1] - degree).abs() < 1e-3, "{batch:?}");
        assert!((batch.ys[2] + 2.0 * degree).abs() < 1e-3, "{batch:?}");
    }

    #[test]
    fn test_malformed_crs_is_transform_error() {
        let frame = GridFrame::Projected {
            wkt: "PROJCS[nonsense".to_string(),
        };
        let result = reconcile_in_frame(&points(&[(0.0, 0.0)]), &frame, None);
        assert!(matches!(result, Err(DemError::CoordinateTransform(_))));
    }
}
