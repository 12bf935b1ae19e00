//! Geodesic distance on the WGS84 ellipsoid.
//!
//! Uses Vincenty's inverse formula. Nearly antipodal pairs, where the
//! iteration does not converge, fall back to the great-circle distance on the
//! mean Earth radius; leg matching only needs a consistent ordering there.

use super::Coordinates;

const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);
const MEAN_EARTH_RADIUS_M: f64 = 6_371_008.8;
const MAX_ITERATIONS: usize = 200;
const CONVERGENCE: f64 = 1e-12;

/// Geodesic distance between two points in metres.
///
/// # Examples
/// ```
/// use route_planner::domain::{Coordinates, geodesic_distance_m};
///
/// let d = geodesic_distance_m(
///     Coordinates::new(39.7817, -89.6501),
///     Coordinates::new(39.7817, -89.6501),
/// );
/// assert_eq!(d, 0.0);
/// ```
pub fn geodesic_distance_m(from: Coordinates, to: Coordinates) -> f64 {
    vincenty_inverse(from, to).unwrap_or_else(|| great_circle_m(from, to))
}

fn vincenty_inverse(from: Coordinates, to: Coordinates) -> Option<f64> {
    let l = (to.longitude - from.longitude).to_radians();
    let u1 = ((1.0 - WGS84_F) * from.latitude.to_radians().tan()).atan();
    let u2 = ((1.0 - WGS84_F) * to.latitude.to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    for _ in 0..MAX_ITERATIONS {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
        .sqrt();
        if sin_sigma == 0.0 {
            return Some(0.0);
        }
        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        let sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        // Equatorial lines have cos²α = 0.
        let cos_2sigma_m = if cos_sq_alpha == 0.0 {
            0.0
        } else {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        };
        let c = WGS84_F / 16.0 * cos_sq_alpha * (4.0 + WGS84_F * (4.0 - 3.0 * cos_sq_alpha));
        let previous = lambda;
        lambda = l
            + (1.0 - c)
                * WGS84_F
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m
                            + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

        if (lambda - previous).abs() < CONVERGENCE {
            let u_sq = cos_sq_alpha * (WGS84_A * WGS84_A - WGS84_B * WGS84_B) / (WGS84_B * WGS84_B);
            let a = 1.0 + u_sq / 16_384.0 * (4_096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
            let b = u_sq / 1_024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
            let delta_sigma = b
                * sin_sigma
                * (cos_2sigma_m
                    + b / 4.0
                        * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)
                            - b / 6.0
                                * cos_2sigma_m
                                * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                                * (-3.0 + 4.0 * cos_2sigma_m * cos_2sigma_m)));
            return Some(WGS84_B * a * (sigma - delta_sigma));
        }
    }
    None
}

fn great_circle_m(from: Coordinates, to: Coordinates) -> f64 {
    let phi1 = from.latitude.to_radians();
    let phi2 = to.latitude.to_radians();
    let d_phi = phi2 - phi1;
    let d_lambda = (to.longitude - from.longitude).to_radians();
    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * MEAN_EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected} ± {tolerance}, got {actual}"
        );
    }

    #[rstest]
    fn one_degree_of_longitude_on_the_equator() {
        let d = geodesic_distance_m(Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 1.0));
        assert_close(d, 111_319.491, 0.01);
    }

    #[rstest]
    fn one_degree_of_latitude_at_the_equator() {
        let d = geodesic_distance_m(Coordinates::new(0.0, 0.0), Coordinates::new(1.0, 0.0));
        assert_close(d, 110_574.389, 0.5);
    }

    #[rstest]
    fn flinders_peak_to_buninyong() {
        // Reference pair from Vincenty (1975).
        let d = geodesic_distance_m(
            Coordinates::new(-37.951_033_42, 144.424_867_89),
            Coordinates::new(-37.652_821_14, 143.926_495_53),
        );
        assert_close(d, 54_972.271, 0.01);
    }

    #[rstest]
    fn is_symmetric() {
        let a = Coordinates::new(39.7817, -89.6501);
        let b = Coordinates::new(41.8781, -87.6298);
        assert_close(geodesic_distance_m(a, b), geodesic_distance_m(b, a), 1e-6);
    }

    #[rstest]
    fn antipodal_points_fall_back_to_great_circle() {
        let d = geodesic_distance_m(Coordinates::new(0.0, 0.0), Coordinates::new(0.5, 179.7));
        assert!(d.is_finite());
        assert!(d > 19_000_000.0);
    }
}
