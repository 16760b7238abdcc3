//! Spherical Mercator projection for drawing schematic line maps.
//!
//! Only the renderer uses this; distances and segment resolution stay on
//! the sphere.

use std::f64::consts::FRAC_PI_4;

use streetcar_delay_transit_models::GeoPoint;

/// Web Mercator sphere radius in meters.
pub const MERCATOR_RADIUS_M: f64 = 6_378_137.0;

/// Latitude limit of the Web Mercator square.
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_59;

/// Projects a point to planar `(x, y)` meters. `x` grows eastwards and `y`
/// grows northwards. Latitudes beyond the Web Mercator limit are clamped.
#[must_use]
pub fn mercator_project(point: GeoPoint) -> (f64, f64) {
    let lat = point
        .latitude
        .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
        .to_radians();
    let x = MERCATOR_RADIUS_M * point.longitude.to_radians();
    let y = MERCATOR_RADIUS_M * (FRAC_PI_4 + lat / 2.0).tan().ln();
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_maps_to_origin() {
        let (x, y) = mercator_project(GeoPoint::from_lat_lng(0.0, 0.0));
        assert!(x.abs() < 1e-9);
        assert!(y.abs() < 1e-9);
    }

    #[test]
    fn axes_point_east_and_north() {
        let west = mercator_project(GeoPoint::from_lat_lng(43.65, -79.44));
        let east = mercator_project(GeoPoint::from_lat_lng(43.65, -79.38));
        assert!(east.0 > west.0);

        let south = mercator_project(GeoPoint::from_lat_lng(43.63, -79.40));
        let north = mercator_project(GeoPoint::from_lat_lng(43.67, -79.40));
        assert!(north.1 > south.1);
    }

    #[test]
    fn poles_are_clamped() {
        let (_, y) = mercator_project(GeoPoint::from_lat_lng(90.0, 0.0));
        assert!(y.is_finite());
        let (_, limit) = mercator_project(GeoPoint::from_lat_lng(MAX_MERCATOR_LATITUDE, 0.0));
        assert!((y - limit).abs() < 1e-6);
    }

    #[test]
    fn web_mercator_edge_is_square() {
        let (x, y) = mercator_project(GeoPoint::from_lat_lng(MAX_MERCATOR_LATITUDE, 180.0));
        assert!((x - y).abs() < 1.0, "x={x} y={y}");
    }
}
