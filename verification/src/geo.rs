//! Proximity check: is the device inside the venue radius?
//!
//! Credit is binary. A partial score that decays with distance would let a
//! client far away collect credit from many vague fixes; all-or-nothing makes
//! it enter the radius.

use presence_types::{Coordinate, GPS_WEIGHT};
use serde::{Deserialize, Serialize};

use crate::VerificationError;

/// Mean Earth radius (spherical approximation).
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Outcome of a proximity check. Same shape whether or not credit was given.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoCheck {
    /// `None` when the client supplied no fix.
    pub distance_meters: Option<f64>,
    pub within_range: bool,
    pub score: u8,
    pub max_range_meters: f64,
}

/// A device fix as the client sent it: both coordinates or neither.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl LocationFix {
    pub fn resolve(&self) -> Result<Option<Coordinate>, VerificationError> {
        match (self.latitude, self.longitude) {
            (None, None) => Ok(None),
            (Some(lat), Some(lon)) => Ok(Some(Coordinate::new(lat, lon)?)),
            _ => Err(VerificationError::ValidationFailed(
                "latitude and longitude must be given together".into(),
            )),
        }
    }
}

impl From<Coordinate> for LocationFix {
    fn from(c: Coordinate) -> Self {
        Self {
            latitude: Some(c.latitude()),
            longitude: Some(c.longitude()),
        }
    }
}

/// Great-circle distance in meters (haversine).
pub fn haversine_meters(a: Coordinate, b: Coordinate) -> f64 {
    let (lat1, lat2) = (a.latitude().to_radians(), b.latitude().to_radians());
    let d_lat = lat2 - lat1;
    let d_lon = (b.longitude() - a.longitude()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().min(1.0).asin();
    EARTH_RADIUS_METERS * c
}

#[derive(Clone, Copy, Debug)]
pub struct GeoVerifier {
    default_max_range_meters: f64,
}

impl GeoVerifier {
    pub fn new(default_max_range_meters: f64) -> Self {
        Self {
            default_max_range_meters,
        }
    }

    pub fn default_max_range_meters(&self) -> f64 {
        self.default_max_range_meters
    }

    /// Score a location fix against a venue.
    ///
    /// `max_range_meters` falls back to the configured default. The boundary
    /// is inclusive.
    pub fn verify(
        &self,
        user: Option<Coordinate>,
        venue: Coordinate,
        max_range_meters: Option<f64>,
    ) -> Result<GeoCheck, VerificationError> {
        let max_range = max_range_meters.unwrap_or(self.default_max_range_meters);
        if !max_range.is_finite() || max_range <= 0.0 {
            return Err(VerificationError::ValidationFailed(format!(
                "max range must be positive, got {max_range}"
            )));
        }

        let Some(user) = user else {
            return Ok(GeoCheck {
                distance_meters: None,
                within_range: false,
                score: 0,
                max_range_meters: max_range,
            });
        };

        let distance = haversine_meters(user, venue);
        let within_range = distance <= max_range;
        Ok(GeoCheck {
            distance_meters: Some(distance),
            within_range,
            score: if within_range { GPS_WEIGHT } else { 0 },
            max_range_meters: max_range,
        })
    }
}

impl Default for GeoVerifier {
    fn default() -> Self {
        Self::new(100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    /// Point `meters` due north of `origin`.
    fn north_of(origin: Coordinate, meters: f64) -> Coordinate {
        let d_lat = (meters / EARTH_RADIUS_METERS).to_degrees();
        coord(origin.latitude() + d_lat, origin.longitude())
    }

    #[test]
    fn zero_distance_to_self() {
        let p = coord(37.5665, 126.978);
        assert_eq!(haversine_meters(p, p), 0.0);
    }

    #[test]
    fn known_city_distance() {
        // Seoul City Hall to Busan City Hall, roughly 325 km.
        let seoul = coord(37.5663, 126.9779);
        let busan = coord(35.1798, 129.0750);
        let d = haversine_meters(seoul, busan);
        assert!((320_000.0..330_000.0).contains(&d), "{d}");
    }

    #[test]
    fn fifty_meters_scores_full() {
        let venue = coord(37.5665, 126.978);
        let check = GeoVerifier::default()
            .verify(Some(north_of(venue, 50.0)), venue, None)
            .unwrap();
        assert!(check.within_range);
        assert_eq!(check.score, GPS_WEIGHT);
        assert!((check.distance_meters.unwrap() - 50.0).abs() < 0.01);
    }

    #[test]
    fn one_fifty_meters_scores_zero() {
        let venue = coord(37.5665, 126.978);
        let check = GeoVerifier::default()
            .verify(Some(north_of(venue, 150.0)), venue, None)
            .unwrap();
        assert!(!check.within_range);
        assert_eq!(check.score, 0);
    }

    #[test]
    fn missing_fix_is_zero_not_error() {
        let venue = coord(37.5665, 126.978);
        let check = GeoVerifier::default().verify(None, venue, None).unwrap();
        assert_eq!(check.score, 0);
        assert_eq!(check.distance_meters, None);
        assert_eq!(check.max_range_meters, 100.0);
    }

    #[test]
    fn venue_override_applies() {
        let venue = coord(37.5665, 126.978);
        let check = GeoVerifier::default()
            .verify(Some(north_of(venue, 150.0)), venue, Some(200.0))
            .unwrap();
        assert_eq!(check.score, GPS_WEIGHT);
        assert_eq!(check.max_range_meters, 200.0);
    }

    #[test]
    fn half_a_fix_is_invalid() {
        assert!(LocationFix::default().resolve().unwrap().is_none());
        let fix = LocationFix::from(coord(1.0, 2.0));
        assert_eq!(fix.resolve().unwrap(), Some(coord(1.0, 2.0)));
        let half = LocationFix {
            latitude: Some(1.0),
            longitude: None,
        };
        assert!(matches!(half.resolve(), Err(VerificationError::ValidationFailed(_))));
        let out_of_range = LocationFix {
            latitude: Some(91.0),
            longitude: Some(0.0),
        };
        assert!(matches!(
            out_of_range.resolve(),
            Err(VerificationError::ValidationFailed(_))
        ));
    }

    #[test]
    fn non_positive_range_rejected() {
        let venue = coord(0.0, 0.0);
        assert!(matches!(
            GeoVerifier::default().verify(Some(venue), venue, Some(-1.0)),
            Err(VerificationError::ValidationFailed(_))
        ));
    }
}
