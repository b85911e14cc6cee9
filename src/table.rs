use std::fmt;

use crate::model::QueryPoint;

/// Rows shown at each end of a long table.
const PREVIEW_ROWS: usize = 5;

/// Sampled elevations, one row per query point, in query order.
///
/// Longitudes and latitudes are the caller's own values, never the wrapped
/// or projected coordinates used for the lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationTable {
    points: Vec<QueryPoint>,
    elevations: Vec<f64>,
    column_name: String,
}

impl ElevationTable {
    /// # Panics
    ///
    /// If `points` and `elevations` differ in length.
    pub fn new(points: Vec<QueryPoint>, elevations: Vec<f64>, column_name: &str) -> Self {
        assert_eq!(
            points.len(),
            elevations.len(),
            "one elevation per query point"
        );
        Self {
            points,
            elevations,
            column_name: column_name.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    pub fn points(&self) -> &[QueryPoint] {
        &self.points
    }

    pub fn elevations(&self) -> &[f64] {
        &self.elevations
    }

    pub fn rows(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.points
            .iter()
            .zip(&self.elevations)
            .map(|(p, &z)| (p.lon, p.lat, z))
    }

    /// Number of rows with a finite elevation.
    pub fn valid_count(&self) -> usize {
        self.elevations.iter().filter(|z| z.is_finite()).count()
    }
}

/// Head/tail preview with a row index and a shape footer.
impl fmt::Display for ElevationTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.len();
        let index_width = n.saturating_sub(1).to_string().len().max(1);

        let cell = |v: f64| format!("{v:.6}");
        let shown: Vec<usize> = if n > 2 * PREVIEW_ROWS {
            (0..PREVIEW_ROWS).chain(n - PREVIEW_ROWS..n).collect()
        } else {
            (0..n).collect()
        };

        let mut widths = [3, 3, self.column_name.len()];
        for &k in &shown {
            let (lon, lat, z) = (self.points[k].lon, self.points[k].lat, self.elevations[k]);
            widths[0] = widths[0].max(cell(lon).len());
            widths[1] = widths[1].max(cell(lat).len());
            widths[2] = widths[2].max(cell(z).len());
        }

        writeln!(
            f,
            "{:iw$}  {:>w0$}  {:>w1$}  {:>w2$}",
            "",
            "lon",
            "lat",
            self.column_name,
            iw = index_width,
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2]
        )?;

        for (pos, &k) in shown.iter().enumerate() {
            if n > 2 * PREVIEW_ROWS && pos == PREVIEW_ROWS {
                writeln!(
                    f,
                    "{:iw$}  {:>w0$}  {:>w1$}  {:>w2$}",
                    "...",
                    "...",
                    "...",
                    "...",
                    iw = index_width,
                    w0 = widths[0],
                    w1 = widths[1],
                    w2 = widths[2]
                )?;
            }
            writeln!(
                f,
                "{:<iw$}  {:>w0$}  {:>w1$}  {:>w2$}",
                k,
                cell(self.points[k].lon),
                cell(self.points[k].lat),
                cell(self.elevations[k]),
                iw = index_width,
                w0 = widths[0],
                w1 = widths[1],
                w2 = widths[2]
            )?;
        }

        write!(f, "\n[{n} rows x 3 columns]")
    }
}
