//! Query point sources for the driver: point files and random global samples.

use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::error::{DemError, Result};
use crate::model::QueryPoint;

/// Parses `lon lat` pairs, one per line, separated by whitespace or a comma.
///
/// Blank lines and `#` comments are ignored. A first data line with no
/// numeric fields is taken as a header and skipped.
pub fn parse_points(text: &str) -> Result<Vec<QueryPoint>> {
    let mut points = Vec::new();
    let mut seen_data = false;

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|f| !f.is_empty())
            .collect();
        let numbers: Vec<Option<f64>> = fields.iter().map(|f| f.parse().ok()).collect();

        match numbers.as_slice() {
            [Some(lon), Some(lat), ..] => points.push(QueryPoint::new(*lon, *lat)),
            _ if !seen_data && numbers.iter().all(Option::is_none) => {
                debug!("Skipping header line {}: {:?}", idx + 1, line);
            }
            _ => {
                return Err(DemError::InvalidPoint {
                    line: idx + 1,
                    content: raw.to_string(),
                })
            }
        }
        seen_data = true;
    }

    Ok(points)
}

pub fn read_points_file(path: &Path) -> Result<Vec<QueryPoint>> {
    let text = fs::read_to_string(path)?;
    let points = parse_points(&text)?;
    info!("Read {} query points from {:?}", points.len(), path);
    Ok(points)
}

/// `n` points uniform in lon [0, 360) and lat [-90, 90).
pub fn random_points(n: usize, seed: Option<u64>) -> Vec<QueryPoint> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    (0..n)
        .map(|_| QueryPoint::new(rng.gen_range(0.0..360.0), rng.gen_range(-90.0..90.0)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_separators() {
        let text = "# track 12\nlon,lat\n10.5, -3\n\n 350   45.25  # waypoint\n0\t0\n";
        let points = parse_points(text).unwrap();
        assert_eq!(
            points,
            vec![
                QueryPoint::new(10.5, -3.0),
                QueryPoint::new(350.0, 45.25),
                QueryPoint::new(0.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let points = parse_points("1 2 3.5\n").unwrap();
        assert_eq!(points, vec![QueryPoint::new(1.0, 2.0)]);
    }

    #[test]
    fn test_malformed_line_reports_position() {
        let err = parse_points("1 2\n3 north\n").unwrap_err();
        match err {
            DemError::InvalidPoint { line, content } => {
                assert_eq!(line, 2);
                assert_eq!(content, "3 north");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_header_only_allowed_first() {
        assert!(parse_points("lon lat\n1 2\n").is_ok());
        assert!(matches!(
            parse_points("1 2\nlon lat\n"),
            Err(DemError::InvalidPoint { line: 2, .. })
        ));
    }

    #[test]
    fn test_random_points_in_range_and_seeded() {
        let a = random_points(1000, Some(42));
        let b = random_points(1000, Some(42));
        assert_eq!(a, b);
        assert_eq!(a.len(), 1000);
        assert!(a
            .iter()
            .all(|p| (0.0..360.0).contains(&p.lon) && (-90.0..90.0).contains(&p.lat)));
    }

    #[test]
    fn test_read_points_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.txt");
        fs::write(&path, "0 0\n-10 5\n").unwrap();

        let points = read_points_file(&path).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1], QueryPoint::new(-10.0, 5.0));

        assert!(matches!(
            read_points_file(&dir.path().join("missing.txt")),
            Err(DemError::Io(_))
        ));
    }
}
