use geo::{Distance, Euclidean, Haversine};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct Location {
    lat: f64,
    lon: f64,
}

impl Location {
    pub fn from_lat_lon(lat: f64, lon: f64) -> Self {
        Location { lat, lon }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    pub fn point(&self) -> geo::Point {
        geo::Point::new(self.lon, self.lat)
    }

    /// Planar distance on raw degrees.
    pub fn euclidean_distance(&self, to: &Location) -> f64 {
        Euclidean.distance(self.point(), to.point())
    }

    /// Great-circle distance in meters.
    pub fn haversine_distance(&self, to: &Location) -> f64 {
        Haversine.distance(self.point(), to.point())
    }
}

impl From<&Location> for geo::Point<f64> {
    fn from(location: &Location) -> Self {
        location.point()
    }
}

impl From<&Location> for geo::Coord<f64> {
    fn from(location: &Location) -> Self {
        geo::Coord {
            x: location.lon,
            y: location.lat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_distance() {
        let paris = Location::from_lat_lon(48.8566, 2.3522);
        let lyon = Location::from_lat_lon(45.764, 4.8357);

        let distance = paris.haversine_distance(&lyon);
        assert!((distance - 392_000.0).abs() < 5_000.0);
    }

    #[test]
    fn test_euclidean_distance() {
        let a = Location::from_lat_lon(0.0, 0.0);
        let b = Location::from_lat_lon(3.0, 4.0);

        assert_eq!(a.euclidean_distance(&b), 5.0);
    }
}
