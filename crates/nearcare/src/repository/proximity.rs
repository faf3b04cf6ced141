use std::f64::consts::PI;

use nearcare_data::GeoPoint;
use nearcare_data::schema::{LATITUDE, LONGITUDE};
use polars::prelude::*;

/// Mean equatorial radius used for great-circle distances.
pub const EARTH_RADIUS_METRES: f64 = 6_378_100.0;

const DEG_TO_RAD: f64 = PI / 180.0;

/// Haversine distance in metres from `point` to each row's coordinates.
pub fn haversine_distance(point: GeoPoint) -> Expr {
    let lat = col(LATITUDE) * lit(DEG_TO_RAD);
    let half_d_lat = (col(LATITUDE) - lit(point.latitude)) * lit(DEG_TO_RAD / 2.0);
    let half_d_lon = (col(LONGITUDE) - lit(point.longitude)) * lit(DEG_TO_RAD / 2.0);

    let sin_lat = half_d_lat.sin();
    let sin_lon = half_d_lon.sin();
    let a = sin_lat.clone() * sin_lat
        + lit(point.latitude.to_radians().cos()) * lat.cos() * sin_lon.clone() * sin_lon;

    lit(2.0 * EARTH_RADIUS_METRES) * a.sqrt().arcsin()
}
