//! Geodesic distance on the WGS84 ellipsoid.
//!
//! Distances are computed with Vincenty's inverse formula, which iterates on
//! the longitude difference on the auxiliary sphere until it converges.
//! Non-convergence is not an error: after [`MAX_ITERATIONS`] refinements the
//! best available estimate is returned, which is accurate to well below the
//! radii used by the stay point detector and the geofence.

/// WGS84 semi-major axis in meters.
pub const WGS84_SEMI_MAJOR_M: f64 = 6_378_137.0;

/// WGS84 semi-minor axis in meters.
pub const WGS84_SEMI_MINOR_M: f64 = 6_356_752.3142;

/// Maximum number of lambda refinements.
pub const MAX_ITERATIONS: usize = 20;

/// Convergence tolerance on the relative lambda update.
pub const CONVERGENCE_TOLERANCE: f64 = 1.0e-12;

/// Anything with a geographic position.
///
/// Implemented by fixes and stay points so they can measure distance to one
/// another without converting through an intermediate type.
pub trait GeoPoint {
    /// Latitude in decimal degrees.
    fn latitude(&self) -> f64;

    /// Longitude in decimal degrees.
    fn longitude(&self) -> f64;

    /// Geodesic distance to another point, in meters.
    fn distance_to<P: GeoPoint + ?Sized>(&self, other: &P) -> f64 {
        distance(
            self.latitude(),
            self.longitude(),
            other.latitude(),
            other.longitude(),
        )
    }
}

/// Geodesic distance between two points, in meters.
///
/// Symmetric, and zero for identical points.
///
/// # Arguments
///
/// * `lat1`, `lon1` - First point in decimal degrees
/// * `lat2`, `lon2` - Second point in decimal degrees
pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let a = WGS84_SEMI_MAJOR_M;
    let b = WGS84_SEMI_MINOR_M;
    let f = (a - b) / a;
    let a_sq_minus_b_sq_over_b_sq = (a * a - b * b) / (b * b);

    let lat1 = lat1.to_radians();
    let lat2 = lat2.to_radians();
    let l = lon2.to_radians() - lon1.to_radians();

    let u1 = ((1.0 - f) * lat1.tan()).atan();
    let u2 = ((1.0 - f) * lat2.tan()).atan();

    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();
    let cos_u1_cos_u2 = cos_u1 * cos_u2;
    let sin_u1_sin_u2 = sin_u1 * sin_u2;

    let mut sigma = 0.0;
    let mut delta_sigma = 0.0;
    let mut big_a = 0.0;
    let mut lambda = l;

    for _ in 0..MAX_ITERATIONS {
        let lambda_orig = lambda;
        let (sin_lambda, cos_lambda) = lambda.sin_cos();

        let t1 = cos_u2 * sin_lambda;
        let t2 = cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda;
        let sin_sigma = (t1 * t1 + t2 * t2).sqrt();
        let cos_sigma = sin_u1_sin_u2 + cos_u1_cos_u2 * cos_lambda;
        sigma = sin_sigma.atan2(cos_sigma);

        // Coincident (or antipodal-on-equator) points: both guards substitute 0
        let sin_alpha = if sin_sigma == 0.0 {
            0.0
        } else {
            cos_u1_cos_u2 * sin_lambda / sin_sigma
        };
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        let cos_2_sigma_m = if cos_sq_alpha == 0.0 {
            0.0
        } else {
            cos_sigma - 2.0 * sin_u1_sin_u2 / cos_sq_alpha
        };

        let u_sq = cos_sq_alpha * a_sq_minus_b_sq_over_b_sq;
        big_a = 1.0
            + (u_sq / 16384.0) * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
        let big_b = (u_sq / 1024.0) * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
        let c = (f / 16.0) * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));

        let cos_2_sigma_m_sq = cos_2_sigma_m * cos_2_sigma_m;
        delta_sigma = big_b
            * sin_sigma
            * (cos_2_sigma_m
                + (big_b / 4.0)
                    * (cos_sigma * (-1.0 + 2.0 * cos_2_sigma_m_sq)
                        - (big_b / 6.0)
                            * cos_2_sigma_m
                            * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                            * (-3.0 + 4.0 * cos_2_sigma_m_sq)));

        lambda = l
            + (1.0 - c)
                * f
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2_sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2_sigma_m_sq)));

        let delta = if lambda != 0.0 {
            (lambda - lambda_orig) / lambda
        } else {
            0.0
        };

        if delta.abs() < CONVERGENCE_TOLERANCE {
            break;
        }
    }

    b * big_a * (sigma - delta_sigma)
}
