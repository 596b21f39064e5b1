use geo::{ConvexHull, MultiPoint, Polygon};

use crate::problem::location::Location;

/// Convex hull around a set of locations, degenerate for fewer than 3 points.
pub fn convex_hull<'a>(locations: impl IntoIterator<Item = &'a Location>) -> Polygon {
    let points = MultiPoint::from(
        locations
            .into_iter()
            .map(|location| (location.lon(), location.lat()))
            .collect::<Vec<_>>(),
    );

    points.convex_hull()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convex_hull_drops_interior_points() {
        let locations = [
            Location::from_lat_lon(0.0, 0.0),
            Location::from_lat_lon(0.0, 1.0),
            Location::from_lat_lon(1.0, 1.0),
            Location::from_lat_lon(1.0, 0.0),
            Location::from_lat_lon(0.5, 0.5),
        ];

        let hull = convex_hull(&locations);

        // Closed ring: 4 corners plus the repeated first coordinate.
        assert_eq!(hull.exterior().0.len(), 5);
        assert!(
            !hull
                .exterior()
                .points()
                .any(|point| point.x() == 0.5 && point.y() == 0.5)
        );
    }
}
