use crate::{ConfigError, DEFAULT_LAT, DEFAULT_LNG, DRIVER_ID_WIDTH};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl Default for GeoPoint {
    fn default() -> Self {
        Self::new(DEFAULT_LAT, DEFAULT_LNG)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

impl FromStr for GeoPoint {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidPoint(s.to_string());

        let (lat, lng) = s.split_once(',').ok_or_else(invalid)?;
        let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
        let lng: f64 = lng.trim().parse().map_err(|_| invalid())?;

        if !lat.is_finite() || !lng.is_finite() {
            return Err(invalid());
        }

        Ok(Self { lat, lng })
    }
}

/// Opaque synthetic driver identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DriverId(String);

impl DriverId {
    pub fn new(prefix: &str, seq: usize) -> Self {
        Self(format!("{prefix}{seq:0width$}", width = DRIVER_ID_WIDTH))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DriverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse a `;`-separated list of `lat,lng` pairs.
///
/// An empty string yields the single default point.
pub fn parse_points(raw: &str) -> Result<Vec<GeoPoint>, ConfigError> {
    if raw.trim().is_empty() {
        return Ok(vec![GeoPoint::default()]);
    }

    raw.split(';').map(str::parse).collect()
}

/// Build `count` driver ids, numbered from 1.
pub fn build_driver_ids(count: usize, prefix: &str) -> Vec<DriverId> {
    (1..=count).map(|seq| DriverId::new(prefix, seq)).collect()
}

/// Round-robin selection of the driver and point for request `idx`.
///
/// Both slices must be non-empty; configuration validation guarantees this
/// before any phase starts.
pub fn select<'a>(
    idx: u64,
    drivers: &'a [DriverId],
    points: &[GeoPoint],
) -> (&'a DriverId, GeoPoint) {
    let driver = &drivers[(idx % drivers.len() as u64) as usize];
    let point = points[(idx % points.len() as u64) as usize];
    (driver, point)
}

/// The drivers still reporting after dropping `ratio` of them from the end of
/// the list. Never returns an empty set when `drivers` is non-empty.
pub fn remaining_after_drop(drivers: &[DriverId], ratio: f64) -> Vec<DriverId> {
    let drop_count = (drivers.len() as f64 * ratio).floor() as usize;
    let keep = drivers.len().saturating_sub(drop_count).max(1).min(drivers.len());
    drivers[..keep].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_ids_are_zero_padded() {
        let ids = build_driver_ids(3, "d_");
        let ids: Vec<_> = ids.iter().map(DriverId::as_str).collect();
        assert_eq!(ids, ["d_000001", "d_000002", "d_000003"]);
    }

    #[test]
    fn driver_ids_empty() {
        assert!(build_driver_ids(0, "d_").is_empty());
    }

    #[test]
    fn parses_point_list() {
        let points = parse_points("1,2;3,4").unwrap();
        assert_eq!(points, vec![GeoPoint::new(1., 2.), GeoPoint::new(3., 4.)]);
    }

    #[test]
    fn parses_with_whitespace() {
        let points = parse_points(" 37.5 , -122.25 ").unwrap();
        assert_eq!(points, vec![GeoPoint::new(37.5, -122.25)]);
    }

    #[test]
    fn empty_points_default() {
        assert_eq!(parse_points("").unwrap(), vec![GeoPoint::default()]);
        assert_eq!(
            parse_points("").unwrap()[0],
            GeoPoint::new(DEFAULT_LAT, DEFAULT_LNG)
        );
    }

    #[test]
    fn rejects_malformed_points() {
        assert_eq!(
            parse_points("1,2;oops"),
            Err(ConfigError::InvalidPoint("oops".to_string()))
        );
        assert!(parse_points("1,2,3").is_err());
        assert!(parse_points("1,x").is_err());
        assert!(parse_points("1,2;").is_err());
        assert!(parse_points("NaN,2").is_err());
    }

    #[test]
    fn select_cycles() {
        let drivers = build_driver_ids(3, "d_");
        let points = [GeoPoint::new(1., 1.), GeoPoint::new(2., 2.)];

        let picks: Vec<_> = (0..6)
            .map(|i| {
                let (d, p) = select(i, &drivers, &points);
                (d.as_str().to_string(), p.lat)
            })
            .collect();

        assert_eq!(
            picks,
            vec![
                ("d_000001".to_string(), 1.),
                ("d_000002".to_string(), 2.),
                ("d_000003".to_string(), 1.),
                ("d_000001".to_string(), 2.),
                ("d_000002".to_string(), 1.),
                ("d_000003".to_string(), 2.),
            ]
        );
    }

    #[test]
    fn drop_half() {
        let drivers = build_driver_ids(10, "d_");
        let remaining = remaining_after_drop(&drivers, 0.5);
        assert_eq!(remaining.len(), 5);
        assert_eq!(remaining[..], drivers[..5]);
    }

    #[test]
    fn drop_never_reaches_zero() {
        let drivers = build_driver_ids(1, "d_");
        assert_eq!(remaining_after_drop(&drivers, 1.0).len(), 1);

        let drivers = build_driver_ids(10, "d_");
        assert_eq!(remaining_after_drop(&drivers, 1.0).len(), 1);
        assert_eq!(remaining_after_drop(&drivers, 0.0).len(), 10);
    }

    #[test]
    fn drop_floors_count() {
        let drivers = build_driver_ids(7, "d_");
        // floor(7 * 0.5) = 3 dropped
        assert_eq!(remaining_after_drop(&drivers, 0.5).len(), 4);
    }
}
