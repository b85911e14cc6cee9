use std::path::Path;

use crate::error::{DemError, Result};
use crate::model::{ElevationUnit, LonDomain};

/// Native coordinate frame of a loaded grid.
#[derive(Debug, Clone, PartialEq)]
pub enum GridFrame {
    /// Axes are longitude / latitude in degrees.
    Geographic,
    /// Axes are planar coordinates of the given CRS.
    Projected { wkt: String },
}

/// In-memory DEM: a 2D field of samples over two ascending coordinate axes.
///
/// `values` is row-major with `y` as the slow axis, so the sample at
/// `(x[i], y[j])` lives at `values[j * x.len() + i]`. Missing data is NaN.
#[derive(Debug, Clone)]
pub struct GridField {
    x: Vec<f64>,
    y: Vec<f64>,
    values: Vec<f64>,
    frame: GridFrame,
    unit: Option<ElevationUnit>,
}

impl GridField {
    /// Builds a grid from axes in any monotonic order.
    ///
    /// Descending axes (north-up rasters, flipped NetCDF latitudes) are reversed
    /// together with the matching rows or columns of `values`.
    pub fn new(
        mut x: Vec<f64>,
        mut y: Vec<f64>,
        mut values: Vec<f64>,
        frame: GridFrame,
        unit: Option<ElevationUnit>,
    ) -> Result<Self> {
        let (nx, ny) = (x.len(), y.len());
        if nx == 0 || ny == 0 {
            return Err(shape_error(format!("empty axis ({nx} x {ny})")));
        }
        if values.len() != nx * ny {
            return Err(shape_error(format!(
                "{} samples do not fill a {nx} x {ny} grid",
                values.len()
            )));
        }

        if is_descending(&x) {
            x.reverse();
            for row in values.chunks_exact_mut(nx) {
                row.reverse();
            }
        }
        if is_descending(&y) {
            y.reverse();
            let flipped: Vec<f64> = values
                .chunks_exact(nx)
                .rev()
                .flatten()
                .copied()
                .collect();
            values = flipped;
        }

        if !is_strictly_ascending(&x) || !is_strictly_ascending(&y) {
            return Err(shape_error("axis coordinates are not monotonic"));
        }

        Ok(Self {
            x,
            y,
            values,
            frame,
            unit,
        })
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn frame(&self) -> &GridFrame {
        &self.frame
    }

    /// Elevation unit recorded in the source, if any.
    pub fn unit(&self) -> Option<ElevationUnit> {
        self.unit
    }

    /// (columns, rows)
    pub fn shape(&self) -> (usize, usize) {
        (self.x.len(), self.y.len())
    }

    /// Sample at column `i`, row `j`.
    pub fn node(&self, i: usize, j: usize) -> f64 {
        self.values[j * self.x.len() + i]
    }

    /// Longitude domain of a geographic grid, read off its x axis.
    pub fn lon_domain(&self) -> Option<LonDomain> {
        match self.frame {
            GridFrame::Geographic => self.x.last().map(|&max| LonDomain::from_axis_max(max)),
            GridFrame::Projected { .. } => None,
        }
    }
}

fn shape_error(reason: impl Into<String>) -> DemError {
    DemError::file_format(Path::new("<grid>"), reason)
}

fn is_descending(axis: &[f64]) -> bool {
    axis.len() > 1 && axis[0] > axis[axis.len() - 1]
}

fn is_strictly_ascending(axis: &[f64]) -> bool {
    axis.windows(2).all(|w| w[0] < w[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descending_axes_are_flipped() {
        // 3 columns, 2 rows, north-up: first row is the highest latitude
        let grid = GridField::new(
            vec![10.0, 11.0, 12.0],
            vec![5.0, 4.0],
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
            GridFrame::Geographic,
            None,
        )
        .unwrap();

        assert_eq!(grid.y(), &[4.0, 5.0]);
        assert_eq!(grid.node(0, 0), 3.0);
        assert_eq!(grid.node(2, 1), 2.0);

        let grid = GridField::new(
            vec![2.0, 1.0],
            vec![0.0, 1.0],
            vec![0.0, 1.0, 2.0, 3.0],
            GridFrame::Geographic,
            None,
        )
        .unwrap();
        assert_eq!(grid.x(), &[1.0, 2.0]);
        assert_eq!(grid.values(), &[1.0, 0.0, 3.0, 2.0]);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let result = GridField::new(
            vec![0.0, 1.0],
            vec![0.0, 1.0],
            vec![0.0; 3],
            GridFrame::Geographic,
            None,
        );
        assert!(matches!(result, Err(DemError::FileFormat { .. })));

        let result = GridField::new(
            vec![0.0, 2.0, 1.0],
            vec![0.0],
            vec![0.0; 3],
            GridFrame::Geographic,
            None,
        );
        assert!(matches!(result, Err(DemError::FileFormat { .. })));
    }

    #[test]
    fn test_lon_domain() {
        let grid = GridField::new(
            vec![0.0, 180.0, 359.0],
            vec![0.0],
            vec![0.0; 3],
            GridFrame::Geographic,
            None,
        )
        .unwrap();
        assert_eq!(grid.lon_domain(), Some(LonDomain::Positive));

        let grid = GridField::new(
            vec![-1000.0, 1000.0],
            vec![0.0],
            vec![0.0; 2],
            GridFrame::Projected {
                wkt: String::new(),
            },
            None,
        )
        .unwrap();
        assert_eq!(grid.lon_domain(), None);
    }
}
