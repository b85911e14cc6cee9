use std::fmt;
use std::str::FromStr;

/// A geographic query location in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryPoint {
    pub lon: f64,
    pub lat: f64,
}

impl QueryPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl From<(f64, f64)> for QueryPoint {
    fn from((lon, lat): (f64, f64)) -> Self {
        Self { lon, lat }
    }
}

/// Vertical unit of elevation samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElevationUnit {
    Meters,
    Kilometers,
    Feet,
}

impl ElevationUnit {
    /// Parses the unit labels found in GeoTIFF band metadata and CF `units` attributes.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "m" | "meter" | "meters" | "metre" | "metres" => Some(ElevationUnit::Meters),
            "km" | "kilometer" | "kilometers" | "kilometre" | "kilometres" => {
                Some(ElevationUnit::Kilometers)
            }
            "ft" | "foot" | "feet" | "us survey foot" => Some(ElevationUnit::Feet),
            _ => None,
        }
    }

    fn meters_per_unit(self) -> f64 {
        match self {
            ElevationUnit::Meters => 1.0,
            ElevationUnit::Kilometers => 1.0e3,
            ElevationUnit::Feet => 0.3048,
        }
    }

    /// Multiplier converting a value in `self` into `target`.
    pub fn factor_to(self, target: ElevationUnit) -> f64 {
        if self == target {
            1.0
        } else {
            self.meters_per_unit() / target.meters_per_unit()
        }
    }
}

impl fmt::Display for ElevationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElevationUnit::Meters => write!(f, "m"),
            ElevationUnit::Kilometers => write!(f, "km"),
            ElevationUnit::Feet => write!(f, "ft"),
        }
    }
}

impl FromStr for ElevationUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ElevationUnit::from_label(s).ok_or_else(|| format!("unknown elevation unit {s:?}"))
    }
}

/// Longitude range a geographic grid is indexed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LonDomain {
    /// [0, 360)
    Positive,
    /// [-180, 180)
    Signed,
}

impl LonDomain {
    /// Resolves the domain from the largest longitude on a grid axis.
    pub fn from_axis_max(max_lon: f64) -> Self {
        if max_lon > 180.0 {
            LonDomain::Positive
        } else {
            LonDomain::Signed
        }
    }

    /// Wraps `lon` into this domain. NaN passes through.
    pub fn normalize(self, lon: f64) -> f64 {
        match self {
            LonDomain::Positive => wrap_360(lon),
            LonDomain::Signed => wrap_360(lon + 180.0) - 180.0,
        }
    }
}

/// `rem_euclid` rounds tiny negatives up to exactly 360.0, which is outside [0, 360).
fn wrap_360(v: f64) -> f64 {
    let wrapped = v.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lon_domain_normalize() {
        assert_eq!(LonDomain::Positive.normalize(-10.0), 350.0);
        assert_eq!(LonDomain::Positive.normalize(350.0), 350.0);
        assert_eq!(LonDomain::Positive.normalize(360.0), 0.0);
        assert_eq!(LonDomain::Positive.normalize(-360.0), 0.0);

        assert_eq!(LonDomain::Signed.normalize(200.0), -160.0);
        assert_eq!(LonDomain::Signed.normalize(-10.0), -10.0);
        assert_eq!(LonDomain::Signed.normalize(180.0), -180.0);
        assert_eq!(LonDomain::Signed.normalize(359.5), -0.5);

        assert!(LonDomain::Positive.normalize(f64::NAN).is_nan());
    }

    #[test]
    fn test_lon_domain_tiny_negative_stays_in_range() {
        assert_eq!(LonDomain::Positive.normalize(-1e-20), 0.0);
        assert_eq!(LonDomain::Signed.normalize(-180.0 - 1e-20), -180.0);
        assert!(LonDomain::Positive.normalize(-1e-12) < 360.0);
    }

    #[test]
    fn test_lon_domain_from_axis() {
        assert_eq!(LonDomain::from_axis_max(359.5), LonDomain::Positive);
        assert_eq!(LonDomain::from_axis_max(180.0), LonDomain::Signed);
        assert_eq!(LonDomain::from_axis_max(-122.0), LonDomain::Signed);
    }

    #[test]
    fn test_unit_factors() {
        assert_eq!(ElevationUnit::Meters.factor_to(ElevationUnit::Kilometers), 1.0e-3);
        assert_eq!(ElevationUnit::Kilometers.factor_to(ElevationUnit::Kilometers), 1.0);
        assert_eq!(ElevationUnit::Kilometers.factor_to(ElevationUnit::Meters), 1.0e3);
        assert!((ElevationUnit::Feet.factor_to(ElevationUnit::Meters) - 0.3048).abs() < 1e-12);
    }

    #[test]
    fn test_unit_labels() {
        assert_eq!(ElevationUnit::from_label("metre"), Some(ElevationUnit::Meters));
        assert_eq!(ElevationUnit::from_label(" KM "), Some(ElevationUnit::Kilometers));
        assert_eq!(ElevationUnit::from_label("ft"), Some(ElevationUnit::Feet));
        assert_eq!(ElevationUnit::from_label(""), None);
        assert_eq!(ElevationUnit::from_label("K"), None);
    }
}
