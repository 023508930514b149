use crate::domain::{LatLon, PlanePoint};
use crate::error::{Error, Result};
use crate::frame::zones::Zone;

/// Turns geographic positions into plane-rectangular meters for a zone.
pub trait GeodesyProvider: Send + Sync {
    /// Project WGS84 decimal degrees into `zone`. Returns `x` northing, `y` easting.
    fn project(&self, position: LatLon, zone: &Zone) -> Result<PlanePoint>;
}

/// GRS80 semi-major axis.
const GRS80_A: f64 = 6_378_137.0;
/// GRS80 inverse flattening.
const GRS80_INV_F: f64 = 298.257_222_101;
/// Scale factor on the central meridian of every zone.
const SCALE: f64 = 0.9999;

/// Gauss–Krüger transverse Mercator on GRS80 using the Krüger n-series to
/// fifth order, as published for the Japanese plane-rectangular systems.
/// WGS84 and JGD2011 geographic coordinates are treated as identical.
#[derive(Debug, Clone, Copy)]
pub struct GaussKruger {
    n: f64,
    alpha: [f64; 5],
    meridian: [f64; 6],
    a_bar: f64,
}

impl Default for GaussKruger {
    fn default() -> Self {
        Self::new()
    }
}

impl GaussKruger {
    pub fn new() -> Self {
        let n = 1.0 / (2.0 * GRS80_INV_F - 1.0);
        let n2 = n * n;
        let n3 = n2 * n;
        let n4 = n3 * n;
        let n5 = n4 * n;

        let alpha = [
            n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0 + 41.0 * n4 / 180.0 - 127.0 * n5 / 288.0,
            13.0 * n2 / 48.0 - 3.0 * n3 / 5.0 + 557.0 * n4 / 1440.0 + 281.0 * n5 / 630.0,
            61.0 * n3 / 240.0 - 103.0 * n4 / 140.0 + 15061.0 * n5 / 26880.0,
            49561.0 * n4 / 161280.0 - 179.0 * n5 / 168.0,
            34729.0 * n5 / 80640.0,
        ];

        // Meridian arc coefficients A0..A5.
        let meridian = [
            1.0 + n2 / 4.0 + n4 / 64.0,
            -1.5 * (n - n3 / 8.0 - n5 / 64.0),
            15.0 / 16.0 * (n2 - n4 / 4.0),
            -35.0 / 48.0 * (n3 - 5.0 * n5 / 16.0),
            315.0 / 512.0 * n4,
            -693.0 / 1280.0 * n5,
        ];

        let a_bar = SCALE * GRS80_A / (1.0 + n) * meridian[0];

        Self { n, alpha, meridian, a_bar }
    }

    /// Scaled meridian arc length from the equator to `phi` (radians).
    fn meridian_arc(&self, phi: f64) -> f64 {
        let mut sum = self.meridian[0] * phi;
        for (j, a) in self.meridian.iter().enumerate().skip(1) {
            sum += a * (2.0 * j as f64 * phi).sin();
        }
        SCALE * GRS80_A / (1.0 + self.n) * sum
    }
}

impl GeodesyProvider for GaussKruger {
    fn project(&self, position: LatLon, zone: &Zone) -> Result<PlanePoint> {
        let LatLon { lat, lon } = position;
        if !lat.is_finite() || !lon.is_finite() || lat.abs() >= 90.0 || lon.abs() > 180.0 {
            return Err(Error::ProjectionFailed { lat, lon, zone: zone.number });
        }

        let phi = lat.to_radians();
        let d_lambda = (lon - zone.origin_lon).to_radians();
        let phi0 = zone.origin_lat.to_radians();

        let k = 2.0 * self.n.sqrt() / (1.0 + self.n);
        let sin_phi = phi.sin();
        let t = (sin_phi.atanh() - k * (k * sin_phi).atanh()).sinh();
        let t_bar = (1.0 + t * t).sqrt();

        let xi = t.atan2(d_lambda.cos());
        let eta = (d_lambda.sin() / t_bar).atanh();

        let mut x_sum = xi;
        let mut y_sum = eta;
        for (j, a) in self.alpha.iter().enumerate() {
            let m = 2.0 * (j + 1) as f64;
            x_sum += a * (m * xi).sin() * (m * eta).cosh();
            y_sum += a * (m * xi).cos() * (m * eta).sinh();
        }

        let x = self.a_bar * x_sum - self.meridian_arc(phi0);
        let y = self.a_bar * y_sum;

        if !x.is_finite() || !y.is_finite() {
            return Err(Error::ProjectionFailed { lat, lon, zone: zone.number });
        }
        Ok(PlanePoint::new(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::zones::zone;

    fn project(lat: f64, lon: f64, zone_no: u8) -> PlanePoint {
        GaussKruger::new()
            .project(LatLon { lat, lon }, zone(zone_no).unwrap())
            .unwrap()
    }

    #[test]
    fn test_origin_maps_to_zero() {
        for z in 1..=19u8 {
            let zn = zone(z).unwrap();
            let p = project(zn.origin_lat, zn.origin_lon, z);
            assert!(p.x.abs() < 1e-6, "zone {z}: x = {}", p.x);
            assert!(p.y.abs() < 1e-6, "zone {z}: y = {}", p.y);
        }
    }

    #[test]
    fn test_one_degree_north_on_central_meridian() {
        // Zone 9 origin 36N; the meridian arc 36N→37N is ~110.96 km, scaled by 0.9999.
        let p = project(37.0, 139.0 + 50.0 / 60.0, 9);
        assert!(p.x > 110_900.0 && p.x < 111_000.0, "x = {}", p.x);
        assert!(p.y.abs() < 1e-6);
    }

    #[test]
    fn test_east_west_symmetry() {
        let east = project(35.7, 139.0 + 50.0 / 60.0 + 0.3, 9);
        let west = project(35.7, 139.0 + 50.0 / 60.0 - 0.3, 9);
        assert!(east.y > 0.0 && west.y < 0.0);
        assert!((east.y + west.y).abs() < 1e-6);
        assert!((east.x - west.x).abs() < 1e-6);
    }

    #[test]
    fn test_tokyo_station_zone_9() {
        // Tokyo Station is roughly 35.6812N 139.7671E: south-west of the zone 9 origin.
        let p = project(35.6812, 139.7671, 9);
        assert!(p.x < -30_000.0 && p.x > -40_000.0, "x = {}", p.x);
        assert!(p.y < -5_000.0 && p.y > -7_000.0, "y = {}", p.y);
    }

    #[test]
    fn test_projection_is_deterministic() {
        let a = project(35.0, 139.0, 9);
        let b = project(35.0, 139.0, 9);
        assert_eq!(a.distance_to(&b), 0.0);
    }

    #[test]
    fn test_invalid_latitude_rejected() {
        let err = GaussKruger::new()
            .project(LatLon { lat: 91.0, lon: 139.0 }, zone(9).unwrap())
            .unwrap_err();
        assert!(matches!(err, Error::ProjectionFailed { zone: 9, .. }));
    }
}
